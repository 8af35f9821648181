//! Report folder layout.
//!
//! A report root holds one sequence-numbered folder per test plus the
//! aggregate page:
//!
//! ```text
//! specs-report/
//!   .session.json
//!   index.html        (summary.html for the steps variant)
//!   1/index.html
//!   1/<relocated attachments>
//!   2/index.html
//! ```

use std::fs;
use std::path::PathBuf;

use crate::reporter::types::ReporterKind;

/// Per-test page file name
pub const TEST_PAGE: &str = "index.html";

/// Metadata file written at the report root
pub const SESSION_FILE: &str = ".session.json";

/// One report root for one reporter variant
#[derive(Debug, Clone)]
pub struct ReportSession {
    pub root: PathBuf,
    pub kind: ReporterKind,
}

impl ReportSession {
    pub fn new(root: impl Into<PathBuf>, kind: ReporterKind) -> Self {
        Self {
            root: root.into(),
            kind,
        }
    }

    /// Create the root folder and write session metadata
    pub fn init(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.root)?;

        let metadata = serde_json::json!({
            "kind": self.kind.as_str(),
            "created": chrono::Utc::now().to_rfc3339(),
            "summary": self.kind.summary_file(),
            "generator": format!("{} {}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION")),
        });

        let metadata_path = self.root.join(SESSION_FILE);
        fs::write(metadata_path, serde_json::to_string_pretty(&metadata)?)?;

        Ok(())
    }

    /// Folder holding a test's page and relocated attachments
    pub fn test_dir(&self, num: u32) -> PathBuf {
        self.root.join(num.to_string())
    }

    pub fn test_page(&self, num: u32) -> PathBuf {
        self.test_dir(num).join(TEST_PAGE)
    }

    pub fn summary_page(&self) -> PathBuf {
        self.root.join(self.kind.summary_file())
    }

    /// Sequence numbers of every test folder present, ascending
    pub fn list_test_dirs(&self) -> std::io::Result<Vec<u32>> {
        let mut nums = Vec::new();
        if self.root.exists() {
            for entry in fs::read_dir(&self.root)? {
                let entry = entry?;
                if !entry.file_type()?.is_dir() {
                    continue;
                }
                if let Some(num) = entry.file_name().to_str().and_then(|n| n.parse().ok()) {
                    nums.push(num);
                }
            }
        }
        nums.sort_unstable();
        Ok(nums)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout() {
        let session = ReportSession::new("out", ReporterKind::Steps);
        assert_eq!(session.test_page(3), PathBuf::from("out/3/index.html"));
        assert_eq!(session.summary_page(), PathBuf::from("out/summary.html"));

        let session = ReportSession::new("out", ReporterKind::Specs);
        assert_eq!(session.summary_page(), PathBuf::from("out/index.html"));
    }

    #[test]
    fn test_init_and_list() {
        let tmp = TempDir::new().unwrap();
        let session = ReportSession::new(tmp.path().join("report"), ReporterKind::Specs);
        session.init().unwrap();
        assert!(session.root.join(SESSION_FILE).is_file());

        for name in ["10", "2", "assets"] {
            fs::create_dir_all(session.root.join(name)).unwrap();
        }
        assert_eq!(session.list_test_dirs().unwrap(), vec![2, 10]);
    }

    #[test]
    fn test_list_missing_root_is_empty() {
        let session = ReportSession::new("/nonexistent/specs-report", ReporterKind::Specs);
        assert!(session.list_test_dirs().unwrap().is_empty());
    }
}
