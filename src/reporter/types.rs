use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use super::events::{RunStatus, TestStatus};
use crate::error::ReportError;
use crate::tags::NormalizedTag;

/// Placeholder list entry when a test declares no steps
pub const NO_STEPS: &str = "No steps";

/// Placeholder list entry when a test declares no preconditions
pub const NO_PRE_CONDITIONS: &str = "No pre conditions";

/// Placeholder list entry when a test declares no postconditions
pub const NO_POST_CONDITIONS: &str = "No post conditions";

/// Browser name used when the test carries no execution target
pub const NO_BROWSER: &str = "No browser";

/// Error text used when an error object carries no message
pub const NO_ERROR_MESSAGE: &str = "No errors";

/// Which report flavour an aggregator produces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReporterKind {
    /// Relocates attachments as each test ends; writes `summary.html`
    Steps,
    /// Defers relocation to run end; writes `index.html`
    Specs,
}

impl ReporterKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ReporterKind::Steps => "steps",
            ReporterKind::Specs => "specs",
        }
    }

    /// Aggregate page file name under the report root
    pub fn summary_file(self) -> &'static str {
        match self {
            ReporterKind::Steps => "summary.html",
            ReporterKind::Specs => "index.html",
        }
    }

    /// Whether attachment copies wait for the run to end
    pub fn defers_attachments(self) -> bool {
        matches!(self, ReporterKind::Specs)
    }
}

impl FromStr for ReporterKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "steps" => Ok(ReporterKind::Steps),
            "specs" => Ok(ReporterKind::Specs),
            other => Err(ReportError::UnknownReporterKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for ReporterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Attachment shown in the "other attachments" list of a report
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttachmentRef {
    /// Logical name given by the test
    pub name: String,
    /// File name inside the test folder, or the logical name until relocated
    pub path: String,
}

/// The three diagnostic prompts generated for a failed test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptBundle {
    pub full: String,
    pub quick: String,
    pub debug: String,
}

/// Normalized snapshot of one completed test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultRecord {
    /// 1-based, run-scoped sequence number
    pub num: u32,
    pub title: String,
    /// Grouping key: source path relative to the test root, `/`-separated
    pub file_name: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
    /// Raw duration in milliseconds
    pub time_duration: f64,
    pub duration: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub status: TestStatus,
    pub status_icon: String,
    pub browser: String,
    pub tags: Vec<String>,
    #[serde(default)]
    pub tag_meta: Vec<NormalizedTag>,
    pub pre_conditions: Vec<String>,
    pub steps: Vec<String>,
    pub post_conditions: Vec<String>,
    #[serde(default)]
    pub attachments: Vec<AttachmentRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_path: Option<String>,
    #[serde(default)]
    pub screenshot_paths: Vec<String>,
    /// HTML-safe error messages
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompts: Option<PromptBundle>,
}

/// Where the run happened
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentInfo {
    pub os: String,
    #[serde(default)]
    pub hostname: String,
    pub runtime_version: String,
    pub library_version: String,
    pub browsers: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<DateTime<Utc>>,
}

impl EnvironmentInfo {
    pub fn is_empty(&self) -> bool {
        self.os.is_empty()
            && self.hostname.is_empty()
            && self.runtime_version.is_empty()
            && self.library_version.is_empty()
            && self.browsers.is_empty()
    }
}

/// Run-scoped aggregate of every record plus counters
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    /// Formatted overall duration, set at run end
    pub duration: String,
    #[serde(default)]
    pub duration_ms: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RunStatus>,
    pub status_icon: String,
    pub total: u32,
    pub total_passed: u32,
    pub total_failed: u32,
    pub total_flaky: u32,
    pub total_skipped: u32,
    pub grouped_results: BTreeMap<String, Vec<TestResultRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<EnvironmentInfo>,
}

impl RunSummary {
    /// Count one finished test. Timed-out and interrupted tests count as failed
    /// so that `total == passed + failed + skipped` always holds.
    pub fn tally(&mut self, status: TestStatus, flaky: bool) {
        match status {
            TestStatus::Passed => {
                self.total_passed += 1;
                if flaky {
                    self.total_flaky += 1;
                }
            }
            TestStatus::Skipped => self.total_skipped += 1,
            TestStatus::Failed | TestStatus::TimedOut | TestStatus::Interrupted => {
                self.total_failed += 1
            }
        }
        self.total += 1;
    }

    /// Append a record to its file group, creating the group on first use
    pub fn push(&mut self, record: TestResultRecord) {
        self.grouped_results
            .entry(record.file_name.clone())
            .or_default()
            .push(record);
    }

    /// Keep the environment already present unless it is empty
    pub fn merge_environment(&mut self, candidate: Option<EnvironmentInfo>) {
        let current_empty = self.environment.as_ref().is_none_or(EnvironmentInfo::is_empty);
        let candidate = candidate.filter(|env| !env.is_empty());
        if current_empty && candidate.is_some() {
            self.environment = candidate;
        }
    }

    pub fn find_record_mut(&mut self, file_name: &str, num: u32) -> Option<&mut TestResultRecord> {
        self.grouped_results
            .get_mut(file_name)?
            .iter_mut()
            .find(|r| r.num == num)
    }

    pub fn records(&self) -> impl Iterator<Item = &TestResultRecord> {
        self.grouped_results.values().flatten()
    }

    /// `total == passed + failed + skipped` and `flaky <= passed`
    pub fn is_consistent(&self) -> bool {
        self.total == self.total_passed + self.total_failed + self.total_skipped
            && self.total_flaky <= self.total_passed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(os: &str) -> EnvironmentInfo {
        EnvironmentInfo {
            os: os.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_tally_keeps_totals_consistent() {
        let mut summary = RunSummary::default();
        summary.tally(TestStatus::Passed, false);
        summary.tally(TestStatus::Passed, true);
        summary.tally(TestStatus::Failed, false);
        summary.tally(TestStatus::TimedOut, false);
        summary.tally(TestStatus::Skipped, false);
        summary.tally(TestStatus::Interrupted, false);

        assert_eq!(summary.total, 6);
        assert_eq!(summary.total_passed, 2);
        assert_eq!(summary.total_flaky, 1);
        assert_eq!(summary.total_failed, 3);
        assert_eq!(summary.total_skipped, 1);
        assert!(summary.is_consistent());
    }

    #[test]
    fn test_flaky_only_counts_for_passed() {
        let mut summary = RunSummary::default();
        summary.tally(TestStatus::Failed, true);
        assert_eq!(summary.total_flaky, 0);
    }

    #[test]
    fn test_merge_environment_first_non_empty_wins() {
        let mut summary = RunSummary::default();
        summary.merge_environment(Some(EnvironmentInfo::default()));
        assert!(summary.environment.is_none());

        summary.merge_environment(Some(env("Linux")));
        summary.merge_environment(Some(env("macOS")));
        summary.merge_environment(None);
        assert_eq!(summary.environment.as_ref().map(|e| e.os.as_str()), Some("Linux"));
    }

    #[test]
    fn test_reporter_kind_parse() {
        assert_eq!("Steps".parse::<ReporterKind>().unwrap(), ReporterKind::Steps);
        assert_eq!("specs".parse::<ReporterKind>().unwrap(), ReporterKind::Specs);
        assert!("ortoni".parse::<ReporterKind>().is_err());
        assert_eq!(ReporterKind::Steps.summary_file(), "summary.html");
        assert!(ReporterKind::Specs.defers_attachments());
    }
}
