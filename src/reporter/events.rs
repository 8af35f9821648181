//! Input contract emitted by the external test runner.
//!
//! Field names are camelCase so that a runner-side shim can serialize its
//! own objects straight into these types.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ReportError, ReportResult};

/// Terminal status of a single test attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
    TimedOut,
    Interrupted,
}

impl TestStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TestStatus::Passed => "passed",
            TestStatus::Failed => "failed",
            TestStatus::Skipped => "skipped",
            TestStatus::TimedOut => "timedOut",
            TestStatus::Interrupted => "interrupted",
        }
    }
}

impl std::fmt::Display for TestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Overall status of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Passed,
    Failed,
    #[serde(alias = "timedOut")]
    TimedOut,
    Interrupted,
}

impl RunStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            RunStatus::Passed => "passed",
            RunStatus::Failed => "failed",
            RunStatus::TimedOut => "timedout",
            RunStatus::Interrupted => "interrupted",
        }
    }

    /// Icon token; the run-level `timedout` shares the per-test timeout icon
    pub fn icon(self) -> Option<&'static str> {
        match self {
            RunStatus::TimedOut => crate::format::status_icon(TestStatus::TimedOut.as_str()),
            other => crate::format::status_icon(other.as_str()),
        }
    }
}

/// Kinds of annotation a test can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Precondition,
    PostCondition,
    Description,
    GoTo,
    Step,
    Assert,
    Mock,
    /// Accessibility findings; never listed as steps
    A11y,
}

impl AnnotationKind {
    /// Label used by test suites when declaring the annotation
    pub fn label(self) -> &'static str {
        match self {
            AnnotationKind::Precondition => "Pre Condition",
            AnnotationKind::PostCondition => "Post Condition",
            AnnotationKind::Description => "Description",
            AnnotationKind::GoTo => "Go To",
            AnnotationKind::Step => "Step",
            AnnotationKind::Assert => "Assert",
            AnnotationKind::Mock => "Mock",
            AnnotationKind::A11y => "A11y",
        }
    }

    /// Match a declared annotation type, ignoring case, spaces, hyphens and underscores
    pub fn parse(kind: &str) -> Option<Self> {
        let key: String = kind
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "precondition" => Some(AnnotationKind::Precondition),
            "postcondition" => Some(AnnotationKind::PostCondition),
            "description" => Some(AnnotationKind::Description),
            "goto" => Some(AnnotationKind::GoTo),
            "step" => Some(AnnotationKind::Step),
            "assert" => Some(AnnotationKind::Assert),
            "mock" => Some(AnnotationKind::Mock),
            "a11y" => Some(AnnotationKind::A11y),
            _ => None,
        }
    }
}

/// A typed key/description pair attached to a test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Annotation {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: Option<String>,
}

impl Annotation {
    pub fn new(kind: AnnotationKind, description: impl Into<String>) -> Self {
        Self {
            kind: kind.label().to_string(),
            description: Some(description.into()),
        }
    }

    pub fn parsed_kind(&self) -> Option<AnnotationKind> {
        AnnotationKind::parse(&self.kind)
    }
}

/// Where a test is declared
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file: PathBuf,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub column: u32,
}

/// Status of one earlier attempt of the same test
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptOutcome {
    pub status: TestStatus,
}

/// The test as declared, plus every attempt recorded so far
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    pub title: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    #[serde(default)]
    pub location: SourceLocation,
    /// Execution target (project) the test ran under
    #[serde(default)]
    pub project_name: Option<String>,
    /// All attempts including the current one; more than one means a retry happened
    #[serde(default)]
    pub results: Vec<AttemptOutcome>,
}

/// An error raised by the test body
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestError {
    #[serde(default)]
    pub message: Option<String>,
}

/// A binary artifact recorded by the automation library
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub name: String,
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(default)]
    pub content_type: Option<String>,
}

/// Outcome of the final attempt of a test
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResult {
    pub status: TestStatus,
    /// Milliseconds
    #[serde(default)]
    pub duration: f64,
    #[serde(default)]
    pub errors: Vec<TestError>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    #[serde(default)]
    pub retry: u32,
}

/// One configured execution target
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub name: String,
}

/// Run configuration handed over at run start
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunConfig {
    #[serde(default)]
    pub root_dir: Option<PathBuf>,
    #[serde(default)]
    pub projects: Vec<Project>,
    /// Version of the browser-automation library driving the run
    #[serde(default)]
    pub version: Option<String>,
    /// Identifier shared by every reporter instance of one run
    #[serde(default)]
    pub run_id: Option<String>,
}

/// Outcome of the whole run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullResult {
    pub status: RunStatus,
    /// Milliseconds
    #[serde(default)]
    pub duration: f64,
}

/// One line of a recorded event stream
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum ReporterEvent {
    RunBegin {
        #[serde(default)]
        config: RunConfig,
    },
    TestEnd {
        test: TestCase,
        result: TestResult,
    },
    RunEnd {
        result: FullResult,
    },
}

/// Parse a JSON Lines event stream. Blank lines are skipped.
pub fn parse_event_stream(input: &str) -> ReportResult<Vec<ReporterEvent>> {
    let mut events = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let event = serde_json::from_str(line).map_err(|e| ReportError::InvalidEvent {
            line: index + 1,
            reason: e.to_string(),
        })?;
        events.push(event);
    }
    Ok(events)
}
