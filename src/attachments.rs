//! Relocation of test attachments into the report tree.
//!
//! Relocation is a two-phase protocol. While a test ends, the aggregator only
//! records a [`PendingRelocation`] (what to copy, where, under which logical
//! name). At run end, when the automation library has flushed every video and
//! trace, [`relocate`] performs the copies and [`rewrite_references`] patches
//! the already-written HTML from logical names to real file names.
//! Reporters that relocate while a test ends call [`copy_screenshots`],
//! [`copy_video`] and [`copy_others`] directly.
//!
//! Copies are best-effort: a missing or uncopyable source yields an empty
//! result and a log line, never an error.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::format::escape_html;
use crate::reporter::events::Attachment;
use crate::reporter::types::{AttachmentRef, TestResultRecord};

/// Logical name of screenshot attachments
pub const SCREENSHOT: &str = "screenshot";

/// Logical name of the video attachment
pub const VIDEO: &str = "video";

/// How an attachment is presented in a report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentKind {
    Screenshot,
    Video,
    /// Produced by other reporting tools; never shown
    Internal,
    Other,
}

impl AttachmentKind {
    pub fn of(name: &str) -> Self {
        if name == SCREENSHOT {
            AttachmentKind::Screenshot
        } else if name == VIDEO {
            AttachmentKind::Video
        } else if name.to_lowercase().contains("allure") {
            AttachmentKind::Internal
        } else {
            AttachmentKind::Other
        }
    }
}

/// One attachment waiting to be copied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingAttachment {
    pub logical_name: String,
    pub kind: AttachmentKind,
    #[serde(default)]
    pub source: Option<PathBuf>,
}

/// Everything one test needs copied into its report folder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingRelocation {
    pub num: u32,
    /// Grouping key of the owning record
    pub file_name: String,
    pub folder: PathBuf,
    pub attachments: Vec<PendingAttachment>,
}

impl PendingRelocation {
    /// Record intent for every reportable attachment of a result, in order.
    /// Internal attachments are left out.
    pub fn new(num: u32, file_name: &str, folder: &Path, attachments: &[Attachment]) -> Self {
        let attachments = attachments
            .iter()
            .filter_map(|a| {
                let kind = AttachmentKind::of(&a.name);
                (kind != AttachmentKind::Internal).then(|| PendingAttachment {
                    logical_name: a.name.clone(),
                    kind,
                    source: a.path.clone(),
                })
            })
            .collect();

        Self {
            num,
            file_name: file_name.to_string(),
            folder: folder.to_path_buf(),
            attachments,
        }
    }
}

/// Result of copying one attachment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relocation {
    pub logical_name: String,
    pub kind: AttachmentKind,
    /// Base name inside the test folder; empty when the copy failed
    pub file_name: String,
}

impl Relocation {
    pub fn succeeded(&self) -> bool {
        !self.file_name.is_empty()
    }
}

/// Copy `source` into `dest_folder` keeping its base name.
///
/// Returns the base name, or an empty string when the source is blank,
/// missing, or the copy fails. The destination folder is only created once
/// the source is known to exist.
pub fn copy_to_report_folder(dest_folder: &Path, source: &Path) -> String {
    if source.as_os_str().is_empty() || source.to_string_lossy().trim().is_empty() {
        return String::new();
    }
    if !source.is_file() {
        debug!(source = %source.display(), "attachment source not on disk, skipping");
        return String::new();
    }
    let Some(file_name) = source.file_name() else {
        return String::new();
    };

    if let Err(e) = fs::create_dir_all(dest_folder) {
        warn!(folder = %dest_folder.display(), error = %e, "failed to create report folder");
        return String::new();
    }

    let dest = dest_folder.join(file_name);
    match fs::copy(source, &dest) {
        Ok(_) => file_name.to_string_lossy().to_string(),
        Err(e) => {
            warn!(
                source = %source.display(),
                dest = %dest.display(),
                error = %e,
                "failed to copy attachment"
            );
            String::new()
        }
    }
}

fn copy_optional(dest_folder: &Path, source: Option<&Path>) -> String {
    source
        .map(|s| copy_to_report_folder(dest_folder, s))
        .unwrap_or_default()
}

/// Copy `video` attachments in order until one copy succeeds
pub fn copy_video(attachments: &[Attachment], dest_folder: &Path) -> Option<String> {
    attachments
        .iter()
        .filter(|a| a.name == VIDEO)
        .map(|a| copy_optional(dest_folder, a.path.as_deref()))
        .find(|name| !name.is_empty())
}

/// Copy every `screenshot` attachment, dropping the ones that fail
pub fn copy_screenshots(attachments: &[Attachment], dest_folder: &Path) -> Vec<String> {
    attachments
        .iter()
        .filter(|a| a.name == SCREENSHOT)
        .map(|a| copy_optional(dest_folder, a.path.as_deref()))
        .filter(|name| !name.is_empty())
        .collect()
}

/// Copy every attachment shown as a plain link. A failed copy keeps its entry
/// with an empty path.
pub fn copy_others(attachments: &[Attachment], dest_folder: &Path) -> Vec<AttachmentRef> {
    attachments
        .iter()
        .filter(|a| AttachmentKind::of(&a.name) == AttachmentKind::Other)
        .map(|a| AttachmentRef {
            name: a.name.clone(),
            path: copy_optional(dest_folder, a.path.as_deref()),
        })
        .collect()
}

/// Execute the copies recorded in a pending relocation, in order
pub fn relocate(pending: &PendingRelocation) -> Vec<Relocation> {
    pending
        .attachments
        .iter()
        .map(|a| Relocation {
            logical_name: a.logical_name.clone(),
            kind: a.kind,
            file_name: copy_optional(&pending.folder, a.source.as_deref()),
        })
        .collect()
}

/// Replace logical-name references in a rendered page with relocated names.
///
/// Screenshots share one logical name, so each successful screenshot
/// relocation consumes the next `src="screenshot"` occurrence in order.
pub fn rewrite_references(html: &str, relocations: &[Relocation]) -> String {
    let mut html = html.to_string();
    for relocation in relocations.iter().filter(|r| r.succeeded()) {
        let target = escape_html(&relocation.file_name);
        let logical = regex::escape(&escape_html(&relocation.logical_name));

        let (pattern, limit) = match relocation.kind {
            AttachmentKind::Screenshot => (format!(r#"src="{}""#, logical), 1),
            AttachmentKind::Video => (format!(r#"(src|href)="{}""#, logical), 0),
            AttachmentKind::Other => (format!(r#"href="{}""#, logical), 0),
            AttachmentKind::Internal => continue,
        };
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(e) => {
                warn!(name = %relocation.logical_name, error = %e, "unusable attachment name");
                continue;
            }
        };

        html = re
            .replacen(&html, limit, |caps: &regex::Captures| {
                let attr = caps.get(1).map_or(
                    if relocation.kind == AttachmentKind::Screenshot { "src" } else { "href" },
                    |m| m.as_str(),
                );
                format!(r#"{}="{}""#, attr, target)
            })
            .into_owned();
    }
    html
}

/// Update a record's attachment fields from relocation results.
///
/// Failed screenshots and videos are dropped; failed other attachments keep
/// their entry with an empty path.
pub fn apply_to_record(record: &mut TestResultRecord, relocations: &[Relocation]) {
    record.screenshot_paths = relocations
        .iter()
        .filter(|r| r.kind == AttachmentKind::Screenshot && r.succeeded())
        .map(|r| r.file_name.clone())
        .collect();

    record.video_path = relocations
        .iter()
        .find(|r| r.kind == AttachmentKind::Video && r.succeeded())
        .map(|r| r.file_name.clone());

    record.attachments = relocations
        .iter()
        .filter(|r| r.kind == AttachmentKind::Other)
        .map(|r| AttachmentRef {
            name: r.logical_name.clone(),
            path: r.file_name.clone(),
        })
        .collect();
}

/// Placeholder references for a record before relocation has happened
pub fn placeholder_refs(
    attachments: &[Attachment],
) -> (Vec<String>, Option<String>, Vec<AttachmentRef>) {
    let screenshots = attachments
        .iter()
        .filter(|a| AttachmentKind::of(&a.name) == AttachmentKind::Screenshot)
        .map(|a| a.name.clone())
        .collect();
    let video = attachments
        .iter()
        .find(|a| AttachmentKind::of(&a.name) == AttachmentKind::Video)
        .map(|a| a.name.clone());
    let others = attachments
        .iter()
        .filter(|a| AttachmentKind::of(&a.name) == AttachmentKind::Other)
        .map(|a| AttachmentRef {
            name: a.name.clone(),
            path: a.name.clone(),
        })
        .collect();
    (screenshots, video, others)
}

/// Rewrite a written page in place. A missing page is not an error.
pub fn rewrite_page(page: &Path, relocations: &[Relocation]) -> std::io::Result<bool> {
    if !page.is_file() || !relocations.iter().any(Relocation::succeeded) {
        return Ok(false);
    }
    let html = fs::read_to_string(page)?;
    let rewritten = rewrite_references(&html, relocations);
    if rewritten != html {
        fs::write(page, rewritten)?;
    }
    Ok(true)
}
