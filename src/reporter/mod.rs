//! Run aggregation: the input event contract, the report data model and the
//! state machine that turns one into the other.

pub mod aggregator;
pub mod environment;
pub mod events;
pub mod state;
pub mod types;

pub use aggregator::{ReporterConfig, RunAggregator, RunState, grouping_key};
pub use events::{
    Annotation, AnnotationKind, Attachment, AttemptOutcome, FullResult, Project, ReporterEvent,
    RunConfig, RunStatus, SourceLocation, TestCase, TestError, TestResult, TestStatus,
    parse_event_stream,
};
pub use state::PersistedState;
pub use types::{
    AttachmentRef, EnvironmentInfo, PromptBundle, ReporterKind, RunSummary, TestResultRecord,
};
