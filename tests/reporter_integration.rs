//! Integration tests driving the aggregator through complete runs

use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use specs_report::logging::init_test_logging;
use specs_report::reporter::{
    Attachment, AttemptOutcome, FullResult, Project, ReporterConfig, ReporterKind, RunAggregator,
    RunConfig, RunStatus, SourceLocation, TestCase, TestError, TestResult, TestStatus,
    parse_event_stream,
};

fn project(name: &str) -> Project {
    Project {
        name: name.to_string(),
    }
}

fn attempt(status: TestStatus) -> AttemptOutcome {
    AttemptOutcome { status }
}

fn error(message: &str) -> TestError {
    TestError {
        message: Some(message.to_string()),
    }
}

fn run_config(root: &Path) -> RunConfig {
    RunConfig {
        root_dir: Some(root.to_path_buf()),
        projects: vec![project("rbp-chromium"), project("rbp-webkit")],
        version: Some("1.48.0".to_string()),
        ..Default::default()
    }
}

fn test_case(root: &Path, title: &str, tags: &[&str]) -> TestCase {
    TestCase {
        title: title.to_string(),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        annotations: Vec::new(),
        location: SourceLocation {
            file: root.join("booking").join("rooms.spec.ts"),
            line: 12,
            column: 5,
        },
        project_name: Some("chromium".to_string()),
        results: vec![attempt(TestStatus::Passed)],
    }
}

fn result(status: TestStatus, duration: f64) -> TestResult {
    TestResult {
        status,
        duration,
        errors: Vec::new(),
        attachments: Vec::new(),
        retry: 0,
    }
}

fn attachment(name: &str, path: &Path) -> Attachment {
    Attachment {
        name: name.to_string(),
        path: Some(path.to_path_buf()),
        content_type: None,
    }
}

fn run_end(status: RunStatus, duration: f64) -> FullResult {
    FullResult { status, duration }
}

#[test]
fn test_passed_then_failed_run() {
    init_test_logging();
    let tmp = TempDir::new().unwrap();
    let tests_root = tmp.path().join("tests");
    let report = tmp.path().join("specs-report");
    let mut aggregator = RunAggregator::new(ReporterConfig::new(ReporterKind::Specs, &report));

    aggregator.on_run_begin(&run_config(&tests_root));
    aggregator.on_test_end(
        &test_case(&tests_root, "Test A", &["@smoke"]),
        &result(TestStatus::Passed, 2500.0),
    );
    let mut failed = result(TestStatus::Failed, 1200.0);
    failed.errors = vec![error("Error: timeout")];
    aggregator.on_test_end(&test_case(&tests_root, "Test B", &[]), &failed);
    let summary_page = aggregator.on_run_end(&run_end(RunStatus::Failed, 65_500.0));

    let summary = aggregator.summary();
    assert_eq!(summary.total, 2);
    assert_eq!(summary.total_passed, 1);
    assert_eq!(summary.total_failed, 1);
    assert_eq!(summary.total_skipped, 0);
    assert_eq!(summary.duration, "1m 5s 500ms");
    assert_eq!(summary.status, Some(RunStatus::Failed));
    assert_eq!(summary.status_icon, "cancel");

    let records = &summary.grouped_results["booking/rooms.spec.ts"];
    let nums: Vec<u32> = records.iter().map(|r| r.num).collect();
    let titles: Vec<&str> = records.iter().map(|r| r.title.as_str()).collect();
    assert_eq!(nums, vec![1, 2]);
    assert_eq!(titles, vec!["Test A", "Test B"]);

    assert!(records[0].prompts.is_none());
    assert_eq!(records[0].tags, vec!["smoke".to_string()]);
    assert_eq!(records[0].duration, "2s 500ms");
    let prompts = records[1].prompts.as_ref().expect("failed test has prompts");
    assert!(prompts.quick.contains("Error: timeout"));
    assert!(prompts.full.contains("**File:** booking/rooms.spec.ts:12:5"));

    let json = serde_json::to_value(&records[0]).unwrap();
    assert!(json.get("prompts").is_none());

    let env = summary.environment.as_ref().expect("environment collected");
    assert_eq!(env.browsers, vec!["Chrome/Chromium", "Safari/WebKit"]);
    assert_eq!(env.library_version, "1.48.0");

    assert_eq!(summary_page, Some(report.join("index.html")));
    let index = fs::read_to_string(report.join("index.html")).unwrap();
    assert!(index.contains(r#"<a href="1/index.html">Test A</a>"#));
    assert!(index.contains(r#"<a href="2/index.html">Test B</a>"#));

    let page_b = fs::read_to_string(report.join("2").join("index.html")).unwrap();
    assert!(page_b.contains("Copy Prompt"));
    assert!(page_b.contains("Error: timeout"));
}

#[test]
fn test_specs_variant_defers_and_rewrites_attachments() {
    init_test_logging();
    let tmp = TempDir::new().unwrap();
    let tests_root = tmp.path().join("tests");
    let artifacts = tmp.path().join("artifacts");
    fs::create_dir_all(&artifacts).unwrap();
    let report = tmp.path().join("specs-report");
    let mut aggregator = RunAggregator::new(ReporterConfig::new(ReporterKind::Specs, &report));

    aggregator.on_run_begin(&run_config(&tests_root));

    let shot_a = artifacts.join("shot-a.png");
    let shot_b = artifacts.join("shot-b.png");
    let video = artifacts.join("a1b2.webm");
    let trace = artifacts.join("trace.zip");
    fs::write(&shot_a, b"a").unwrap();

    let mut failed = result(TestStatus::Failed, 900.0);
    failed.errors = vec![error("\u{1b}[31mExpected visible\u{1b}[0m")];
    failed.attachments = vec![
        attachment("screenshot", &shot_a),
        attachment("screenshot", &shot_b),
        attachment("video", &video),
        attachment("trace (retry)", &trace),
        attachment("allure-step", &shot_a),
    ];
    aggregator.on_test_end(&test_case(&tests_root, "Book room", &[]), &failed);

    // intent only: nothing copied yet
    let test_dir = report.join("1");
    assert_eq!(aggregator.pending().len(), 1);
    assert!(!test_dir.join("shot-a.png").exists());
    let before = fs::read_to_string(test_dir.join("index.html")).unwrap();
    assert!(before.contains(r#"src="screenshot""#));

    // the automation library flushes the rest after the test ended
    fs::write(&shot_b, b"b").unwrap();
    fs::write(&video, b"webm").unwrap();
    fs::write(&trace, b"zip").unwrap();
    aggregator.on_run_end(&run_end(RunStatus::Failed, 65_500.0));

    for name in ["shot-a.png", "shot-b.png", "a1b2.webm", "trace.zip"] {
        assert!(test_dir.join(name).is_file(), "{} not relocated", name);
    }

    let page = fs::read_to_string(test_dir.join("index.html")).unwrap();
    assert!(page.contains(r#"<img src="shot-a.png""#));
    assert!(page.contains(r#"<img src="shot-b.png""#));
    assert!(page.contains(r#"<video src="a1b2.webm""#));
    assert!(page.contains(r#"<a href="a1b2.webm" download>"#));
    assert!(page.contains(r#"<a href="trace.zip">trace (retry)</a>"#));
    assert!(!page.contains(r#"src="screenshot""#));
    assert!(!page.contains("allure-step"));

    let record = aggregator.summary().records().next().unwrap();
    assert_eq!(record.screenshot_paths, vec!["shot-a.png", "shot-b.png"]);
    assert_eq!(record.video_path.as_deref(), Some("a1b2.webm"));
    assert_eq!(record.attachments.len(), 1);
    assert_eq!(record.attachments[0].path, "trace.zip");
    assert_eq!(
        record.errors,
        vec!["<span style=\"color: red;\">Expected visible</span>".to_string()]
    );
}

#[test]
fn test_steps_variant_relocates_inline() {
    let tmp = TempDir::new().unwrap();
    let tests_root = tmp.path().join("tests");
    let report = tmp.path().join("steps-report");
    let shot = tmp.path().join("step.png");
    fs::write(&shot, b"png").unwrap();

    let mut aggregator = RunAggregator::new(ReporterConfig::new(ReporterKind::Steps, &report));
    aggregator.on_run_begin(&run_config(&tests_root));

    let mut passed = result(TestStatus::Passed, 10.0);
    passed.attachments = vec![
        attachment("screenshot", &shot),
        attachment("video", &tmp.path().join("never-written.webm")),
    ];
    aggregator.on_test_end(&test_case(&tests_root, "Inline", &[]), &passed);

    assert!(aggregator.pending().is_empty());
    assert!(report.join("1").join("step.png").is_file());
    let record = aggregator.summary().records().next().unwrap();
    assert_eq!(record.screenshot_paths, vec!["step.png"]);
    assert_eq!(record.video_path, None);

    let page = fs::read_to_string(report.join("1").join("index.html")).unwrap();
    assert!(page.contains(r#"<img src="step.png""#));
    assert!(!page.contains("<video"));

    let summary_page = aggregator.on_run_end(&run_end(RunStatus::Passed, 10.0));
    assert_eq!(summary_page, Some(report.join("summary.html")));
}

#[test]
fn test_state_file_shared_between_instances() {
    init_test_logging();
    let tmp = TempDir::new().unwrap();
    let tests_root = tmp.path().join("tests");
    let report = tmp.path().join("specs-report");
    let state_file = tmp.path().join("state").join("reporter.json");
    let config = || {
        ReporterConfig::new(ReporterKind::Specs, &report)
            .state_file(Some(state_file.clone()))
            .run_id(Some("ci-42".to_string()))
    };

    let mut first = RunAggregator::new(config());
    first.on_run_begin(&run_config(&tests_root));
    first.on_test_end(
        &test_case(&tests_root, "First", &["@p1"]),
        &result(TestStatus::Passed, 100.0),
    );
    assert!(state_file.is_file());

    let mut second = RunAggregator::new(config());
    second.on_run_begin(&RunConfig::default());
    let mut flaky = test_case(&tests_root, "Second", &[]);
    flaky.results = vec![attempt(TestStatus::Failed), attempt(TestStatus::Passed)];
    second.on_test_end(&flaky, &result(TestStatus::Passed, 200.0));
    second.on_test_end(
        &test_case(&tests_root, "Third", &[]),
        &result(TestStatus::Skipped, 0.0),
    );
    second.on_run_end(&run_end(RunStatus::Passed, 300.0));

    let summary = second.summary();
    assert_eq!(summary.total, 3);
    assert_eq!(summary.total_passed, 2);
    assert_eq!(summary.total_flaky, 1);
    assert_eq!(summary.total_skipped, 1);
    assert!(summary.is_consistent());

    let nums: Vec<u32> = summary.records().map(|r| r.num).collect();
    assert_eq!(nums, vec![1, 2, 3]);

    // first instance collected the environment with both projects
    let env = summary.environment.as_ref().unwrap();
    assert_eq!(env.browsers.len(), 2);

    assert!(!state_file.exists());
}

#[test]
fn test_replay_event_stream() {
    let tmp = TempDir::new().unwrap();
    let report = tmp.path().join("report");
    let stream = r#"
{"event":"runBegin","config":{"rootDir":"e2e","projects":[{"name":"rbp-firefox"}]}}
{"event":"testEnd","test":{"title":"Login works","tags":["@login","@p1"],"annotations":[{"type":"Step","description":"Open login"},{"type":"pre-condition","description":"Admin exists"}],"location":{"file":"e2e\\auth\\login.spec.ts","line":4,"column":1},"projectName":"rbp-firefox","results":[{"status":"passed"}]},"result":{"status":"passed","duration":812}}
{"event":"testEnd","test":{"title":"Logout works","location":{"file":"e2e/auth/login.spec.ts","line":20,"column":1},"results":[{"status":"timedOut"}]},"result":{"status":"timedOut","duration":30000,"errors":[{"message":"Test timeout of 30000ms exceeded."}]}}
{"event":"runEnd","result":{"status":"timedout","duration":31000}}
"#;

    let mut aggregator = RunAggregator::new(ReporterConfig::new(ReporterKind::Steps, &report));
    let mut pages: Vec<PathBuf> = Vec::new();
    for event in parse_event_stream(stream).unwrap() {
        pages.extend(aggregator.dispatch(&event));
    }

    assert_eq!(pages, vec![report.join("summary.html")]);
    let summary = aggregator.summary();
    assert_eq!(summary.grouped_results.keys().collect::<Vec<_>>(), vec!["auth/login.spec.ts"]);
    assert_eq!(summary.total_failed, 1);
    assert_eq!(summary.status_icon, "hourglass_empty");

    let records = &summary.grouped_results["auth/login.spec.ts"];
    assert_eq!(records[0].steps, vec!["Open login".to_string()]);
    assert_eq!(records[0].pre_conditions, vec!["Admin exists".to_string()]);
    assert_eq!(records[1].browser, "No browser");
    assert_eq!(records[1].status_icon, "hourglass_empty");
    assert!(records[1].prompts.is_none());
}
