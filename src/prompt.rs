//! Diagnostic prompt generation for failed tests.
//!
//! Three independent templates are built from the same record:
//! - `full`: everything known about the failure plus a structured analysis request
//! - `quick`: header and first error, for fast triage
//! - `debug`: steps and first error with a debugging-focused request
//!
//! The short forms are separate templates rather than a trimmed `full`, which
//! keeps it obvious which fields each one may omit.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::format::clean_error_message;
use crate::reporter::types::{
    NO_POST_CONDITIONS, NO_PRE_CONDITIONS, NO_STEPS, PromptBundle, TestResultRecord,
};

/// Description value that means "none declared"
const NO_DESCRIPTION: &str = "No Description";

/// Attachment paths of a record, split by what they contain
#[derive(Debug, Default)]
struct AttachmentGroups<'a> {
    screenshots: Vec<&'a str>,
    videos: Vec<&'a str>,
    traces: Vec<&'a str>,
    other: Vec<&'a str>,
}

impl<'a> AttachmentGroups<'a> {
    fn from_record(record: &'a TestResultRecord) -> Self {
        let mut groups = Self {
            screenshots: record
                .screenshot_paths
                .iter()
                .map(String::as_str)
                .filter(|p| !p.is_empty())
                .collect(),
            videos: record
                .video_path
                .as_deref()
                .filter(|p| !p.is_empty())
                .into_iter()
                .collect(),
            ..Default::default()
        };
        for attachment in &record.attachments {
            if attachment.path.is_empty() {
                continue;
            }
            if attachment.name.to_lowercase().contains("trace") {
                groups.traces.push(&attachment.path);
            } else {
                groups.other.push(&attachment.path);
            }
        }
        groups
    }

    fn is_empty(&self) -> bool {
        self.screenshots.is_empty()
            && self.videos.is_empty()
            && self.traces.is_empty()
            && self.other.is_empty()
    }
}

/// Builds prompts; the timestamp is fixed when set, otherwise taken per call
#[derive(Debug, Clone, Default)]
pub struct PromptGenerator {
    timestamp: Option<DateTime<Utc>>,
}

impl PromptGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stamp every prompt with the given time instead of the current time
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// All three prompts for a record
    pub fn bundle(&self, record: &TestResultRecord) -> PromptBundle {
        PromptBundle {
            full: self.generate_full(record),
            quick: self.generate_quick(record),
            debug: self.generate_debug(record),
        }
    }

    pub fn generate_full(&self, record: &TestResultRecord) -> String {
        let timestamp = self
            .timestamp
            .unwrap_or_else(Utc::now)
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        let mut sections: Vec<String> = vec![
            "# Test Failure Analysis".to_string(),
            String::new(),
            format!("**Test:** {}", record.title),
            format!("**Status:** {}", record.status.as_str().to_uppercase()),
            format!("**Browser:** {}", record.browser),
            format!("**Duration:** {}", record.duration),
            format!("**Timestamp:** {}", timestamp),
            String::new(),
        ];

        if let Some(description) = description(record) {
            sections.push("## Test Description".to_string());
            sections.push(description.to_string());
            sections.push(String::new());
        }

        push_numbered(&mut sections, "## Test Steps", declared(&record.steps, NO_STEPS));
        push_numbered(
            &mut sections,
            "## Pre-conditions",
            declared(&record.pre_conditions, NO_PRE_CONDITIONS),
        );
        push_numbered(
            &mut sections,
            "## Post-conditions",
            declared(&record.post_conditions, NO_POST_CONDITIONS),
        );

        let errors: Vec<String> = record
            .errors
            .iter()
            .map(|e| clean_error_message(e))
            .collect();
        if !errors.is_empty() {
            sections.push("## Error Details".to_string());
            for (index, error) in errors.iter().enumerate() {
                sections.push(format!("### Error {}", index + 1));
                push_fenced(&mut sections, error);
                sections.push(String::new());
            }
        }

        sections.push("## Test Location".to_string());
        sections.push(format!("**File:** {}", location(record)));
        sections.push(String::new());

        if !record.tags.is_empty() {
            sections.push("## Tags".to_string());
            sections.push(record.tags.join(", "));
            sections.push(String::new());
        }

        let attachments = AttachmentGroups::from_record(record);
        sections.push("## Available Attachments".to_string());
        if attachments.is_empty() {
            sections.push("No attachments available.".to_string());
            sections.push(String::new());
        } else {
            push_numbered(&mut sections, "### Screenshots", &attachments.screenshots);
            push_numbered(&mut sections, "### Videos", &attachments.videos);
            push_numbered(&mut sections, "### Traces", &attachments.traces);
            push_numbered(&mut sections, "### Other Attachments", &attachments.other);
        }

        sections.extend(
            [
                "## AI Analysis Request",
                "",
                "Please analyze this test failure and provide:",
                "",
                "1. **Root Cause Analysis:** What likely caused this test to fail?",
                "2. **Potential Fixes:** Specific steps to resolve the issue",
                "3. **Prevention Strategies:** How to prevent similar failures in the future",
                "4. **Code Suggestions:** If applicable, provide code examples or modifications",
                "5. **Additional Context:** Any other insights that might be helpful",
                "",
                "Focus on actionable solutions and consider the test steps, error messages, and available attachments when providing your analysis.",
            ]
            .map(String::from),
        );

        sections.join("\n")
    }

    pub fn generate_quick(&self, record: &TestResultRecord) -> String {
        let mut sections = vec![
            format!("# Quick Test Failure Analysis: {}", record.title),
            String::new(),
            format!(
                "**Status:** {} | **Browser:** {} | **Duration:** {}",
                record.status, record.browser, record.duration
            ),
            String::new(),
        ];

        if let Some(error) = record.errors.first() {
            sections.push("## Error".to_string());
            push_fenced(&mut sections, &clean_error_message(error));
            sections.push(String::new());
        }

        sections.push("## Request".to_string());
        sections.push(
            "Please provide a quick analysis of this test failure and suggest the most likely fix."
                .to_string(),
        );
        sections.join("\n")
    }

    pub fn generate_debug(&self, record: &TestResultRecord) -> String {
        let mut sections = vec![
            format!("# Debugging Assistance: {}", record.title),
            String::new(),
            format!("**Test:** {}", record.title),
            format!("**Browser:** {}", record.browser),
            format!("**File:** {}", location(record)),
            String::new(),
        ];

        push_numbered(&mut sections, "## Test Steps", declared(&record.steps, NO_STEPS));

        if let Some(error) = record.errors.first() {
            sections.push("## Error Details".to_string());
            push_fenced(&mut sections, &clean_error_message(error));
            sections.push(String::new());
        }

        sections.extend(
            [
                "## Debugging Request",
                "Help me debug this test failure. Focus on:",
                "- What went wrong and why",
                "- How to reproduce the issue",
                "- Specific debugging steps to take",
                "- What to look for in the screenshots/videos/traces",
            ]
            .map(String::from),
        );
        sections.join("\n")
    }
}

fn description(record: &TestResultRecord) -> Option<&str> {
    record
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty() && *d != NO_DESCRIPTION)
}

/// The list as declared; a lone placeholder entry counts as nothing declared
fn declared<'a>(items: &'a [String], placeholder: &str) -> &'a [String] {
    match items {
        [only] if only == placeholder => &[],
        _ => items,
    }
}

fn location(record: &TestResultRecord) -> String {
    if record.line > 0 {
        format!("{}:{}:{}", record.file_name, record.line, record.column)
    } else {
        record.file_name.clone()
    }
}

/// Heading plus a numbered list and a blank line; nothing when the list is empty
fn push_numbered<S: AsRef<str>>(sections: &mut Vec<String>, heading: &str, items: &[S]) {
    if items.is_empty() {
        return;
    }
    sections.push(heading.to_string());
    for (index, item) in items.iter().enumerate() {
        sections.push(format!("{}. {}", index + 1, item.as_ref()));
    }
    sections.push(String::new());
}

fn push_fenced(sections: &mut Vec<String>, body: &str) {
    sections.push("```".to_string());
    sections.push(body.to_string());
    sections.push("```".to_string());
}
