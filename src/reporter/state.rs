//! Shared state file for reporters instantiated more than once per run.
//!
//! Each mutation follows load, merge, save. Fields are last-writer-wins except
//! the environment descriptor, which keeps the first non-empty value.
//!
//! A state file only continues the run that wrote it: the loaded run id must
//! match ours and the run must not be finalized. Anything else is left over
//! from another run and is discarded.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

use super::types::RunSummary;
use crate::attachments::PendingRelocation;
use crate::error::ReportResult;

/// Everything a later reporter instance needs to continue the run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedState {
    /// Run the state belongs to; `None` never matches a later instance
    #[serde(default)]
    pub run_id: Option<String>,
    pub summary: RunSummary,
    #[serde(default)]
    pub pending: Vec<PendingRelocation>,
    /// Next sequence number to hand out
    #[serde(default = "first_num")]
    pub next_num: u32,
}

fn first_num() -> u32 {
    1
}

impl Default for PersistedState {
    fn default() -> Self {
        Self {
            run_id: None,
            summary: RunSummary::default(),
            pending: Vec::new(),
            next_num: first_num(),
        }
    }
}

impl PersistedState {
    /// Read the state file. A missing or unreadable file yields `None`.
    pub fn load(path: &Path) -> Option<Self> {
        let contents = match fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read reporter state");
                return None;
            }
        };
        match serde_json::from_str(&contents) {
            Ok(state) => Some(state),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "ignoring corrupt reporter state");
                None
            }
        }
    }

    pub fn save(&self, path: &Path) -> ReportResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        debug!(path = %path.display(), next_num = self.next_num, "saved reporter state");
        Ok(())
    }

    /// Delete the state file; a file that is already gone is fine
    pub fn remove(path: &Path) -> ReportResult<()> {
        match fs::remove_file(path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Whether state loaded from disk belongs to the unfinished run `run_id`
    pub fn continues(&self, run_id: Option<&str>) -> bool {
        run_id.is_some() && self.run_id.as_deref() == run_id && self.summary.status.is_none()
    }

    /// Fold state loaded from disk into this in-memory state.
    ///
    /// The loaded summary and pending list replace ours, the environment stays
    /// first-non-empty-wins and the sequence counter never moves backwards.
    pub fn absorb(&mut self, loaded: PersistedState) {
        let environment = self.summary.environment.take();
        self.summary = loaded.summary;
        self.summary.merge_environment(environment);
        self.pending = loaded.pending;
        self.next_num = self.next_num.max(loaded.next_num);
    }
}
