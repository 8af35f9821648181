//! Configuration management with environment variable support.
//!
//! # Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `SPECS_REPORT_KIND` | Reporter variant, `steps` or `specs` | `specs` |
//! | `SPECS_REPORT_STEPS_DIR` | Root folder of the steps report | `steps-report` |
//! | `SPECS_REPORT_SPECS_DIR` | Root folder of the specs report | `specs-report` |
//! | `SPECS_REPORT_TEST_DIR` | Test root used for grouping keys | `tests` |
//! | `SPECS_REPORT_STATE_FILE` | Shared state file for multi-instance runs | unset |
//! | `SPECS_REPORT_RUN_ID` | Run id used when the runner supplies none | unset |
//!
//! `REPORTER_TYPE` is still honoured when `SPECS_REPORT_KIND` is unset.
//!
//! # Example
//!
//! ```bash
//! export SPECS_REPORT_KIND=steps
//! export SPECS_REPORT_STATE_FILE=/tmp/specs-report-state.json
//! export SPECS_REPORT_RUN_ID=$CI_PIPELINE_ID
//! ```

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;

use crate::reporter::types::ReporterKind;

// ============================================================================
// Default Values
// ============================================================================

/// Default reporter variant
pub const DEFAULT_KIND: ReporterKind = ReporterKind::Specs;

/// Default root folder of the steps report
pub const DEFAULT_STEPS_DIR: &str = "steps-report";

/// Default root folder of the specs report
pub const DEFAULT_SPECS_DIR: &str = "specs-report";

/// Default test root
pub const DEFAULT_TEST_DIR: &str = "tests";

// ============================================================================
// Environment Variable Names
// ============================================================================

pub const ENV_KIND: &str = "SPECS_REPORT_KIND";

pub const ENV_STEPS_DIR: &str = "SPECS_REPORT_STEPS_DIR";

pub const ENV_SPECS_DIR: &str = "SPECS_REPORT_SPECS_DIR";

pub const ENV_TEST_DIR: &str = "SPECS_REPORT_TEST_DIR";

pub const ENV_STATE_FILE: &str = "SPECS_REPORT_STATE_FILE";

pub const ENV_RUN_ID: &str = "SPECS_REPORT_RUN_ID";

/// Legacy selector for the reporter variant
pub const ENV_KIND_LEGACY: &str = "REPORTER_TYPE";

// ============================================================================
// Configuration Getters (with caching)
// ============================================================================

static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration (initialized from environment on first access)
pub fn get() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

#[derive(Debug, Clone)]
pub struct Config {
    pub reporter: ReporterSettings,
    pub paths: PathSettings,
}

/// Which reporter runs and how it shares state
#[derive(Debug, Clone)]
pub struct ReporterSettings {
    pub kind: ReporterKind,
    /// Load-merge-save persistence is enabled only when set
    pub state_file: Option<PathBuf>,
    /// Instances only share a state file when they agree on this
    pub run_id: Option<String>,
}

/// Report and test roots
#[derive(Debug, Clone)]
pub struct PathSettings {
    pub steps_dir: PathBuf,
    pub specs_dir: PathBuf,
    pub test_dir: PathBuf,
}

impl Config {
    /// Create configuration from environment variables, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            reporter: ReporterSettings::from_env(),
            paths: PathSettings::from_env(),
        }
    }

    /// Create configuration with all defaults (ignoring environment)
    pub fn defaults() -> Self {
        Self {
            reporter: ReporterSettings::defaults(),
            paths: PathSettings::defaults(),
        }
    }

    /// Report root for a reporter variant
    pub fn report_dir(&self, kind: ReporterKind) -> &PathBuf {
        match kind {
            ReporterKind::Steps => &self.paths.steps_dir,
            ReporterKind::Specs => &self.paths.specs_dir,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}

impl ReporterSettings {
    pub fn from_env() -> Self {
        Self::from_vars(|name| env::var(name).ok())
    }

    /// Build settings from any variable source
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> Self {
        let non_blank = |name: &str| var(name).filter(|s| !s.trim().is_empty());
        Self {
            kind: non_blank(ENV_KIND)
                .or_else(|| non_blank(ENV_KIND_LEGACY))
                .and_then(|s| s.parse().ok())
                .unwrap_or(DEFAULT_KIND),
            state_file: non_blank(ENV_STATE_FILE).map(PathBuf::from),
            run_id: non_blank(ENV_RUN_ID).map(|s| s.trim().to_string()),
        }
    }

    pub fn defaults() -> Self {
        Self {
            kind: DEFAULT_KIND,
            state_file: None,
            run_id: None,
        }
    }
}

impl PathSettings {
    pub fn from_env() -> Self {
        let dir = |var: &str, default: &str| {
            PathBuf::from(env::var(var).unwrap_or_else(|_| default.to_string()))
        };
        Self {
            steps_dir: dir(ENV_STEPS_DIR, DEFAULT_STEPS_DIR),
            specs_dir: dir(ENV_SPECS_DIR, DEFAULT_SPECS_DIR),
            test_dir: dir(ENV_TEST_DIR, DEFAULT_TEST_DIR),
        }
    }

    pub fn defaults() -> Self {
        Self {
            steps_dir: PathBuf::from(DEFAULT_STEPS_DIR),
            specs_dir: PathBuf::from(DEFAULT_SPECS_DIR),
            test_dir: PathBuf::from(DEFAULT_TEST_DIR),
        }
    }
}

/// Configured reporter variant (convenience function)
pub fn reporter_kind() -> ReporterKind {
    get().reporter.kind
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings(vars: &[(&str, &str)]) -> ReporterSettings {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ReporterSettings::from_vars(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::defaults();
        assert_eq!(config.reporter.kind, ReporterKind::Specs);
        assert!(config.reporter.state_file.is_none());
        assert_eq!(config.paths.test_dir, PathBuf::from(DEFAULT_TEST_DIR));
    }

    #[test]
    fn test_report_dir_per_kind() {
        let config = Config::defaults();
        assert_eq!(config.report_dir(ReporterKind::Steps), &PathBuf::from("steps-report"));
        assert_eq!(config.report_dir(ReporterKind::Specs), &PathBuf::from("specs-report"));
    }

    #[test]
    fn test_legacy_kind_variable_is_honoured() {
        assert_eq!(settings(&[(ENV_KIND_LEGACY, "steps")]).kind, ReporterKind::Steps);
        assert_eq!(
            settings(&[(ENV_KIND, "specs"), (ENV_KIND_LEGACY, "steps")]).kind,
            ReporterKind::Specs
        );
        assert_eq!(
            settings(&[(ENV_KIND, " "), (ENV_KIND_LEGACY, "steps")]).kind,
            ReporterKind::Steps
        );
        assert_eq!(settings(&[(ENV_KIND_LEGACY, "bogus")]).kind, DEFAULT_KIND);
    }

    #[test]
    fn test_state_file_and_run_id() {
        let reporter = settings(&[(ENV_STATE_FILE, "/tmp/state.json"), (ENV_RUN_ID, " ci-9 ")]);
        assert_eq!(reporter.state_file, Some(PathBuf::from("/tmp/state.json")));
        assert_eq!(reporter.run_id.as_deref(), Some("ci-9"));

        let blank = settings(&[(ENV_STATE_FILE, ""), (ENV_RUN_ID, "  ")]);
        assert_eq!(blank.state_file, None);
        assert_eq!(blank.run_id, None);
    }
}
