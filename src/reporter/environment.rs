//! Environment descriptor collected once at run start.

use chrono::Utc;

use super::events::RunConfig;
use super::types::EnvironmentInfo;

/// Host platform identifiers and their display names
const OS_NAMES: &[(&str, &str)] = &[
    ("linux", "Linux"),
    ("macos", "macOS"),
    ("darwin", "macOS"),
    ("windows", "Windows"),
    ("win32", "Windows"),
    ("freebsd", "FreeBSD"),
];

/// Substrings of an execution-target name and the browser family they imply.
/// First match wins.
const BROWSER_FAMILIES: &[(&[&str], &str)] = &[
    (&["edge", "msedge"], "Microsoft Edge"),
    (&["firefox"], "Firefox"),
    (&["webkit", "safari"], "Safari/WebKit"),
    (&["chrome", "chromium"], "Chrome/Chromium"),
];

/// Display name for a platform identifier; unknown platforms pass through
pub fn os_display_name(platform: &str) -> String {
    let key = platform.to_lowercase();
    OS_NAMES
        .iter()
        .find(|(id, _)| *id == key)
        .map(|(_, name)| name.to_string())
        .unwrap_or_else(|| platform.to_string())
}

/// Browser family implied by an execution-target name
pub fn browser_family(target: &str) -> Option<&'static str> {
    let name = target.to_lowercase();
    BROWSER_FAMILIES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| name.contains(n)))
        .map(|(_, family)| *family)
}

/// Distinct browser families across execution targets, in first-seen order
pub fn browser_families<'a>(targets: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut families: Vec<String> = Vec::new();
    for family in targets.into_iter().filter_map(browser_family) {
        if !families.iter().any(|f| f == family) {
            families.push(family.to_string());
        }
    }
    families
}

fn host_name() -> String {
    hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Build the environment descriptor for a run
pub fn collect(config: &RunConfig) -> EnvironmentInfo {
    EnvironmentInfo {
        os: os_display_name(std::env::consts::OS),
        hostname: host_name(),
        runtime_version: format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        library_version: config.version.clone().unwrap_or_default(),
        browsers: browser_families(config.projects.iter().map(|p| p.name.as_str())),
        timestamp: Some(Utc::now()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reporter::events::Project;

    #[test]
    fn test_os_display_name() {
        assert_eq!(os_display_name("linux"), "Linux");
        assert_eq!(os_display_name("Darwin"), "macOS");
        assert_eq!(os_display_name("win32"), "Windows");
        assert_eq!(os_display_name("haiku"), "haiku");
    }

    #[test]
    fn test_browser_family_substring_match() {
        assert_eq!(browser_family("rbp-webkit"), Some("Safari/WebKit"));
        assert_eq!(browser_family("Mobile Safari"), Some("Safari/WebKit"));
        assert_eq!(browser_family("rbp-chromium"), Some("Chrome/Chromium"));
        assert_eq!(browser_family("msedge"), Some("Microsoft Edge"));
        assert_eq!(browser_family("api"), None);
    }

    #[test]
    fn test_browser_families_are_distinct() {
        let families = browser_families(["chromium", "webkit", "chrome-beta", "api", "firefox"]);
        assert_eq!(families, vec!["Chrome/Chromium", "Safari/WebKit", "Firefox"]);
    }

    #[test]
    fn test_collect() {
        let config = RunConfig {
            projects: vec![Project {
                name: "rbp-firefox".to_string(),
            }],
            version: Some("1.48.0".to_string()),
            ..Default::default()
        };
        let env = collect(&config);
        assert!(!env.os.is_empty());
        assert_eq!(env.library_version, "1.48.0");
        assert_eq!(env.browsers, vec!["Firefox"]);
        assert!(env.runtime_version.starts_with("specs-report "));
        assert!(!env.is_empty());
    }
}
