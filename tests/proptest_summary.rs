//! Property-based tests for run summary counters.
//!
//! Uses proptest to verify that, for any sequence of test outcomes:
//! - `total == passed + failed + skipped`
//! - `flaky <= passed`
//! - Sequence numbers are 1..=n in arrival order

use proptest::prelude::*;
use tempfile::TempDir;

use specs_report::logging::init_test_logging;
use specs_report::reporter::{
    AttemptOutcome, FullResult, ReporterConfig, ReporterKind, RunAggregator, RunConfig,
    RunStatus, RunSummary, SourceLocation, TestCase, TestResult, TestStatus,
};

fn status() -> impl Strategy<Value = TestStatus> {
    prop_oneof![
        Just(TestStatus::Passed),
        Just(TestStatus::Failed),
        Just(TestStatus::Skipped),
        Just(TestStatus::TimedOut),
        Just(TestStatus::Interrupted),
    ]
}

/// Final status plus the statuses of every attempt before it
fn outcome() -> impl Strategy<Value = (TestStatus, Vec<TestStatus>)> {
    (status(), prop::collection::vec(status(), 0..3))
}

fn test_case(index: usize, status: TestStatus, retries: &[TestStatus]) -> TestCase {
    let results = retries
        .iter()
        .chain(std::iter::once(&status))
        .map(|s| AttemptOutcome { status: *s })
        .collect();
    TestCase {
        title: format!("case {index}"),
        tags: vec!["@smoke".to_string()],
        annotations: Vec::new(),
        location: SourceLocation {
            file: format!("tests/group{}.spec.ts", index % 3).into(),
            line: 1,
            column: 1,
        },
        project_name: Some("rbp-chromium".to_string()),
        results,
    }
}

fn test_result(status: TestStatus) -> TestResult {
    TestResult {
        status,
        duration: 10.0,
        errors: Vec::new(),
        attachments: Vec::new(),
        retry: 0,
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..Default::default()
    })]

    /// Property: tallying any outcome sequence keeps the counters consistent
    #[test]
    fn tally_keeps_counters_consistent(
        outcomes in prop::collection::vec((status(), any::<bool>()), 0..64),
    ) {
        let mut summary = RunSummary::default();
        for (status, flaky) in &outcomes {
            summary.tally(*status, *flaky);
        }

        prop_assert_eq!(summary.total as usize, outcomes.len());
        prop_assert_eq!(
            summary.total,
            summary.total_passed + summary.total_failed + summary.total_skipped
        );
        prop_assert!(summary.total_flaky <= summary.total_passed);
        prop_assert!(summary.is_consistent());
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 24,
        ..Default::default()
    })]

    /// Property: a full run keeps counters consistent and numbers tests in order
    #[test]
    fn aggregated_run_keeps_invariants(outcomes in prop::collection::vec(outcome(), 0..12)) {
        init_test_logging();
        let tmp = TempDir::new().unwrap();
        let config = ReporterConfig::new(ReporterKind::Steps, tmp.path().join("report"));
        let mut aggregator = RunAggregator::new(config);

        aggregator.on_run_begin(&RunConfig::default());
        for (index, (status, retries)) in outcomes.iter().enumerate() {
            aggregator.on_test_end(&test_case(index, *status, retries), &test_result(*status));
        }
        aggregator.on_run_end(&FullResult {
            status: RunStatus::Passed,
            duration: 100.0,
        });

        let summary = aggregator.summary();
        prop_assert_eq!(summary.total as usize, outcomes.len());
        prop_assert!(summary.is_consistent());

        let expected_flaky = outcomes
            .iter()
            .filter(|(status, retries)| *status == TestStatus::Passed && !retries.is_empty())
            .count();
        prop_assert_eq!(summary.total_flaky as usize, expected_flaky);

        let mut nums: Vec<u32> = summary.records().map(|r| r.num).collect();
        nums.sort_unstable();
        prop_assert_eq!(nums, (1..=outcomes.len() as u32).collect::<Vec<_>>());

        for record in summary.records() {
            prop_assert_eq!(record.prompts.is_some(), record.status == TestStatus::Failed);
        }
    }
}
