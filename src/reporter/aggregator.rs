//! Run aggregator: the reporter state machine.
//!
//! ```text
//! Uninitialized --run begin--> Running --test end--> Running --run end--> Finalized
//! ```
//!
//! Every handler runs to completion and never returns an error. Anything that
//! goes wrong for one test is logged and replaced with a default so the rest
//! of the run is still reported.

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::environment;
use super::events::{
    AnnotationKind, FullResult, ReporterEvent, RunConfig, TestCase, TestResult, TestStatus,
};
use super::state::PersistedState;
use super::types::{
    NO_BROWSER, NO_ERROR_MESSAGE, NO_POST_CONDITIONS, NO_PRE_CONDITIONS, NO_STEPS, ReporterKind,
    RunSummary, TestResultRecord,
};
use crate::attachments::{self, PendingRelocation};
use crate::config;
use crate::format::{ansi_to_html, escape_html, format_duration, status_icon};
use crate::prompt::PromptGenerator;
use crate::render::{HtmlRenderer, Renderer, write_document};
use crate::session::ReportSession;
use crate::tags::{process_tags, tag_warnings};

/// Where the aggregator is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Uninitialized,
    Running,
    Finalized,
}

/// Settings for one aggregator instance
#[derive(Debug, Clone)]
pub struct ReporterConfig {
    pub kind: ReporterKind,
    /// Report root
    pub output_dir: PathBuf,
    /// Test root used for grouping keys when the run config names none
    pub test_dir: PathBuf,
    /// Shared state file; `None` keeps state in memory only
    pub state_file: Option<PathBuf>,
    /// Run id used when the run config carries none
    pub run_id: Option<String>,
}

impl ReporterConfig {
    /// Settings for `kind` taken from the global configuration
    pub fn from_env(kind: ReporterKind) -> Self {
        let config = config::get();
        Self {
            kind,
            output_dir: config.report_dir(kind).clone(),
            test_dir: config.paths.test_dir.clone(),
            state_file: config.reporter.state_file.clone(),
            run_id: config.reporter.run_id.clone(),
        }
    }

    pub fn new(kind: ReporterKind, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            kind,
            output_dir: output_dir.into(),
            test_dir: PathBuf::from(config::DEFAULT_TEST_DIR),
            state_file: None,
            run_id: None,
        }
    }

    pub fn test_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.test_dir = dir.into();
        self
    }

    pub fn state_file(mut self, path: Option<PathBuf>) -> Self {
        self.state_file = path;
        self
    }

    pub fn run_id(mut self, id: Option<String>) -> Self {
        self.run_id = id;
        self
    }
}

/// Accumulates test outcomes into a [`RunSummary`] and writes the report
pub struct RunAggregator<R: Renderer = HtmlRenderer> {
    config: ReporterConfig,
    session: ReportSession,
    renderer: R,
    prompts: PromptGenerator,
    state: RunState,
    test_root: PathBuf,
    data: PersistedState,
}

impl RunAggregator<HtmlRenderer> {
    pub fn new(config: ReporterConfig) -> Self {
        Self::with_renderer(config, HtmlRenderer)
    }
}

impl<R: Renderer> RunAggregator<R> {
    pub fn with_renderer(config: ReporterConfig, renderer: R) -> Self {
        let session = ReportSession::new(&config.output_dir, config.kind);
        let test_root = config.test_dir.clone();
        Self {
            config,
            session,
            renderer,
            prompts: PromptGenerator::new(),
            state: RunState::Uninitialized,
            test_root,
            data: PersistedState::default(),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn summary(&self) -> &RunSummary {
        &self.data.summary
    }

    /// Relocations recorded but not yet executed
    pub fn pending(&self) -> &[PendingRelocation] {
        &self.data.pending
    }

    pub fn session(&self) -> &ReportSession {
        &self.session
    }

    pub fn kind(&self) -> ReporterKind {
        self.config.kind
    }

    /// Route one recorded event to its handler
    pub fn dispatch(&mut self, event: &ReporterEvent) -> Option<PathBuf> {
        match event {
            ReporterEvent::RunBegin { config } => {
                self.on_run_begin(config);
                None
            }
            ReporterEvent::TestEnd { test, result } => {
                self.on_test_end(test, result);
                None
            }
            ReporterEvent::RunEnd { result } => self.on_run_end(result),
        }
    }

    pub fn on_run_begin(&mut self, run: &RunConfig) {
        if self.state != RunState::Uninitialized {
            warn!(state = ?self.state, "run begin received twice, ignoring");
            return;
        }

        if let Some(root) = run.root_dir.as_ref().filter(|r| !r.as_os_str().is_empty()) {
            self.test_root = root.clone();
        }
        self.data.run_id = run
            .run_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string)
            .or_else(|| self.config.run_id.clone());
        self.data
            .summary
            .merge_environment(Some(environment::collect(run)));
        self.sync_from_disk();

        if let Err(e) = self.session.init() {
            warn!(
                root = %self.session.root.display(),
                error = %e,
                "failed to initialise report folder"
            );
        }
        self.persist();

        self.state = RunState::Running;
        info!(
            kind = %self.config.kind,
            root = %self.session.root.display(),
            test_root = %self.test_root.display(),
            "report run started"
        );
    }

    pub fn on_test_end(&mut self, test: &TestCase, result: &TestResult) {
        match self.state {
            RunState::Finalized => {
                warn!(title = %test.title, "test ended after the run was finalised, ignoring");
                return;
            }
            RunState::Uninitialized => {
                warn!(title = %test.title, "test ended before run begin, starting run implicitly");
                self.on_run_begin(&RunConfig::default());
            }
            RunState::Running => {}
        }

        self.sync_from_disk();

        let num = self.data.next_num;
        self.data.next_num += 1;

        let flaky = test.results.len() > 1 && result.status == TestStatus::Passed;
        let mut record = self.build_record(num, test, result, flaky);
        self.data.summary.tally(result.status, flaky);

        if record.status == TestStatus::Failed {
            record.prompts = Some(self.prompts.bundle(&record));
        }

        let folder = self.session.test_dir(num);
        if self.config.kind.defers_attachments() {
            let pending =
                PendingRelocation::new(num, &record.file_name, &folder, &result.attachments);
            if !pending.attachments.is_empty() {
                self.data.pending.push(pending);
            }
        } else {
            record.screenshot_paths = attachments::copy_screenshots(&result.attachments, &folder);
            record.video_path = attachments::copy_video(&result.attachments, &folder);
            record.attachments = attachments::copy_others(&result.attachments, &folder);
        }

        self.render_test(&record);
        debug!(
            num,
            title = %record.title,
            status = %record.status,
            file = %record.file_name,
            "test recorded"
        );

        self.data.summary.push(record);
        self.persist();
    }

    /// Finalise the run. Returns the aggregate page path when it was written.
    pub fn on_run_end(&mut self, result: &FullResult) -> Option<PathBuf> {
        if self.state == RunState::Finalized {
            warn!("run end received twice, ignoring");
            return None;
        }

        self.sync_from_disk();
        self.flush_pending();

        let summary = &mut self.data.summary;
        summary.duration_ms = result.duration;
        summary.duration = format_duration(result.duration);
        summary.status = Some(result.status);
        summary.status_icon = result.status.icon().unwrap_or_default().to_string();

        if !summary.is_consistent() {
            warn!(
                total = summary.total,
                passed = summary.total_passed,
                failed = summary.total_failed,
                skipped = summary.total_skipped,
                flaky = summary.total_flaky,
                "summary counters are inconsistent"
            );
        }

        let page = self.session.summary_page();
        let written = match self
            .renderer
            .render_summary(&self.data.summary)
            .and_then(|html| write_document(&page, &html))
        {
            Ok(()) => Some(page),
            Err(e) => {
                warn!(error = %e, "failed to write summary page");
                None
            }
        };

        if let Some(path) = &self.config.state_file {
            if let Err(e) = PersistedState::remove(path) {
                warn!(path = %path.display(), error = %e, "failed to remove reporter state");
            }
        }

        self.state = RunState::Finalized;
        info!(
            status = result.status.as_str(),
            total = self.data.summary.total,
            passed = self.data.summary.total_passed,
            failed = self.data.summary.total_failed,
            skipped = self.data.summary.total_skipped,
            flaky = self.data.summary.total_flaky,
            duration = %self.data.summary.duration,
            "report run finished"
        );
        written
    }

    /// Execute deferred relocations and patch the pages written earlier
    fn flush_pending(&mut self) {
        let pending = std::mem::take(&mut self.data.pending);
        if pending.is_empty() {
            return;
        }
        debug!(tests = pending.len(), "relocating deferred attachments");

        for intent in &pending {
            let relocations = attachments::relocate(intent);
            let page = self.session.test_page(intent.num);
            if let Err(e) = attachments::rewrite_page(&page, &relocations) {
                warn!(
                    page = %page.display(),
                    error = %e,
                    "failed to rewrite attachment references"
                );
            }
            match self
                .data
                .summary
                .find_record_mut(&intent.file_name, intent.num)
            {
                Some(record) => attachments::apply_to_record(record, &relocations),
                None => warn!(num = intent.num, "no record for deferred attachments"),
            }
        }
    }

    fn render_test(&self, record: &TestResultRecord) {
        let page = self.session.test_page(record.num);
        let outcome = self
            .renderer
            .render_test(record)
            .and_then(|html| write_document(&page, &html));
        if let Err(e) = outcome {
            warn!(num = record.num, title = %record.title, error = %e, "failed to write test page");
        }
    }

    fn build_record(
        &self,
        num: u32,
        test: &TestCase,
        result: &TestResult,
        flaky: bool,
    ) -> TestResultRecord {
        let mut description = None;
        let mut pre_conditions = Vec::new();
        let mut post_conditions = Vec::new();
        let mut steps = Vec::new();

        for annotation in &test.annotations {
            let Some(text) = annotation
                .description
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
            else {
                debug!(
                    kind = %annotation.kind,
                    title = %test.title,
                    "annotation without description"
                );
                continue;
            };
            match annotation.parsed_kind() {
                Some(AnnotationKind::Description) => {
                    description.get_or_insert_with(|| text.to_string());
                }
                Some(AnnotationKind::Precondition) => pre_conditions.push(text.to_string()),
                Some(AnnotationKind::PostCondition) => post_conditions.push(text.to_string()),
                Some(AnnotationKind::A11y) => {}
                _ => steps.push(text.to_string()),
            }
        }

        let tag_meta = process_tags(&test.tags);
        for warning in tag_warnings(&tag_meta) {
            warn!(title = %test.title, "{}", warning);
        }

        let icon_key = if flaky { "flaky" } else { result.status.as_str() };
        let (screenshot_paths, video_path, attachments) =
            attachments::placeholder_refs(&result.attachments);

        TestResultRecord {
            num,
            title: test.title.clone(),
            file_name: grouping_key(&test.location.file, &self.test_root),
            line: test.location.line,
            column: test.location.column,
            time_duration: result.duration,
            duration: format_duration(result.duration),
            description,
            status: result.status,
            status_icon: status_icon(icon_key).unwrap_or_default().to_string(),
            browser: test
                .project_name
                .as_deref()
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .unwrap_or(NO_BROWSER)
                .to_string(),
            tags: tag_meta.iter().map(|t| t.normalized.clone()).collect(),
            tag_meta,
            pre_conditions: or_placeholder(pre_conditions, NO_PRE_CONDITIONS),
            steps: or_placeholder(steps, NO_STEPS),
            post_conditions: or_placeholder(post_conditions, NO_POST_CONDITIONS),
            attachments,
            video_path,
            screenshot_paths,
            errors: result
                .errors
                .iter()
                .map(|e| {
                    let message = e.message.as_deref().unwrap_or(NO_ERROR_MESSAGE);
                    ansi_to_html(&escape_html(message))
                })
                .collect(),
            prompts: None,
        }
    }

    /// Fold in state written by other instances of this reporter for the same run
    fn sync_from_disk(&mut self) {
        let Some(path) = &self.config.state_file else {
            return;
        };
        let Some(loaded) = PersistedState::load(path) else {
            return;
        };
        if loaded.continues(self.data.run_id.as_deref()) {
            self.data.absorb(loaded);
        } else if self.state == RunState::Uninitialized {
            warn!(
                path = %path.display(),
                stale_run = loaded.run_id.as_deref().unwrap_or("-"),
                run = self.data.run_id.as_deref().unwrap_or("-"),
                "discarding reporter state left by another run"
            );
        }
    }

    fn persist(&self) {
        if let Some(path) = &self.config.state_file {
            if let Err(e) = self.data.save(path) {
                warn!(path = %path.display(), error = %e, "failed to save reporter state");
            }
        }
    }
}

fn or_placeholder(items: Vec<String>, placeholder: &str) -> Vec<String> {
    if items.is_empty() {
        vec![placeholder.to_string()]
    } else {
        items
    }
}

fn slashed(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// Grouping key for a test file: its path relative to the test root, with
/// `/` separators whatever the host convention.
pub fn grouping_key(file: &Path, test_root: &Path) -> String {
    let file = slashed(file);
    let root = slashed(test_root);
    let root = root.trim_start_matches("./").trim_end_matches('/');

    let relative = if root.is_empty() {
        file.as_str()
    } else if let Some(rest) = file.strip_prefix(root).and_then(|r| r.strip_prefix('/')) {
        rest
    } else if let Some(index) = file.rfind(&format!("/{}/", root)) {
        &file[index + root.len() + 2..]
    } else {
        file.as_str()
    };
    relative.trim_start_matches("./").to_string()
}
