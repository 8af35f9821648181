//! Specs Report - browsable HTML reports for end-to-end test runs.
//!
//! This crate provides:
//! - Tag normalization, validation and classification
//! - Duration, status and error-text formatting
//! - Attachment relocation into per-test report folders
//! - Full, quick and debug prompts for failed tests
//! - A run aggregator that groups results by source file and renders the report
//!
//! # Example
//!
//! ```rust,no_run
//! use specs_report::reporter::{
//!     FullResult, ReporterConfig, ReporterKind, RunAggregator, RunConfig, RunStatus,
//! };
//!
//! let config = ReporterConfig::new(ReporterKind::Specs, "specs-report");
//! let mut aggregator = RunAggregator::new(config);
//! aggregator.on_run_begin(&RunConfig::default());
//! // ... on_test_end for every finished test ...
//! let summary = aggregator.on_run_end(&FullResult {
//!     status: RunStatus::Passed,
//!     duration: 1200.0,
//! });
//! println!("report written to {:?}", summary);
//! ```

pub mod attachments;
pub mod config;
pub mod error;
pub mod format;
pub mod logging;
pub mod prompt;
pub mod render;
pub mod reporter;
pub mod session;
pub mod tags;

// Re-export error types
pub use error::{ReportError, ReportResult};

// Re-export the aggregator and its contract
pub use reporter::{
    ReporterConfig, ReporterEvent, ReporterKind, RunAggregator, RunState, RunSummary,
    TestResultRecord, parse_event_stream,
};

// Re-export prompt generation and rendering
pub use prompt::PromptGenerator;
pub use render::{HtmlRenderer, Renderer};

// Re-export session layout
pub use session::ReportSession;

// Re-export formatters
pub use format::{ansi_to_html, format_duration, status_icon};
