//! Property-based tests for duration formatting.
//!
//! Uses proptest to verify that:
//! - Durations land in the `ms`, `s ms` or `m s ms` bucket by magnitude
//! - Fractional milliseconds are floored
//! - Negative durations mirror their magnitude with one leading `-`

use proptest::prelude::*;
use tracing::debug;

use specs_report::format_duration;
use specs_report::logging::init_test_logging;

fn bucket(total: u64) -> String {
    if total < 1000 {
        format!("{total}ms")
    } else if total < 60_000 {
        format!("{}s {}ms", total / 1000, total % 1000)
    } else {
        format!(
            "{}m {}s {}ms",
            total / 60_000,
            (total % 60_000) / 1000,
            total % 1000
        )
    }
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        ..Default::default()
    })]

    /// Property: whole milliseconds follow the bucket rule
    #[test]
    fn duration_follows_bucket_rule(total in 0u64..10_000_000u64) {
        init_test_logging();
        let formatted = format_duration(total as f64);
        debug!("proptest_duration: total={total} formatted={formatted}");

        prop_assert_eq!(formatted, bucket(total));
    }

    /// Property: the fractional part never changes the output
    #[test]
    fn duration_floors_fractions(total in 0u64..10_000_000u64, fraction in 0.0f64..0.999) {
        let ms = total as f64 + fraction;
        prop_assert_eq!(format_duration(ms), bucket(total));
    }

    /// Property: negative input is the positive form with a leading minus
    #[test]
    fn negative_duration_mirrors_magnitude(total in 1u64..10_000_000u64) {
        let negative = format_duration(-(total as f64));
        prop_assert_eq!(negative, format!("-{}", bucket(total)));
    }

    /// Property: every output names milliseconds last
    #[test]
    fn duration_always_ends_in_ms(ms in -1.0e9f64..1.0e9f64) {
        let formatted = format_duration(ms);
        prop_assert!(formatted.ends_with("ms"), "unexpected format: {formatted}");
    }
}
