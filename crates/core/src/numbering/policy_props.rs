//! Property-based tests for reset boundaries.

use chrono::{DateTime, Duration, TimeZone, Utc};
use proptest::prelude::*;

use crate::numbering::policy::{period_start, reset_due};
use crate::numbering::types::ResetFrequency;

fn arb_instant() -> impl Strategy<Value = DateTime<Utc>> {
    // 2020-01-01 .. 2031-01-01
    (1_577_836_800i64..1_924_991_999).prop_map(|secs| Utc.timestamp_opt(secs, 0).unwrap())
}

fn arb_frequency() -> impl Strategy<Value = ResetFrequency> {
    prop_oneof![
        Just(ResetFrequency::Never),
        Just(ResetFrequency::Yearly),
        Just(ResetFrequency::Monthly),
        Just(ResetFrequency::Daily),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// A reset performed at `now` is never due again at `now`.
    #[test]
    fn prop_not_due_right_after_reset(frequency in arb_frequency(), now in arb_instant()) {
        prop_assert!(!reset_due(frequency, Some(now), now));
    }

    /// A reset is due exactly when the last reset precedes the current period.
    #[test]
    fn prop_due_iff_before_period_start(
        frequency in arb_frequency(),
        now in arb_instant(),
        back_secs in 0i64..(3 * 366 * 86_400),
    ) {
        let last = now - Duration::seconds(back_secs);
        let expected = period_start(frequency, now).is_some_and(|start| last < start);
        prop_assert_eq!(reset_due(frequency, Some(last), now), expected);
    }

    /// A last reset recorded ahead of `now` never triggers another reset.
    #[test]
    fn prop_future_reset_not_due(
        frequency in arb_frequency(),
        now in arb_instant(),
        ahead_secs in 0i64..(3 * 366 * 86_400),
    ) {
        let last = now + Duration::seconds(ahead_secs);
        prop_assert!(!reset_due(frequency, Some(last), now));
    }

    /// Coarser boundaries imply finer ones.
    #[test]
    fn prop_coarser_boundary_implies_finer(
        now in arb_instant(),
        back_secs in 0i64..(3 * 366 * 86_400),
    ) {
        let last = Some(now - Duration::seconds(back_secs));
        if reset_due(ResetFrequency::Yearly, last, now) {
            prop_assert!(reset_due(ResetFrequency::Monthly, last, now));
        }
        if reset_due(ResetFrequency::Monthly, last, now) {
            prop_assert!(reset_due(ResetFrequency::Daily, last, now));
        }
    }

    /// The period start never lies after `now`.
    #[test]
    fn prop_period_start_not_after_now(frequency in arb_frequency(), now in arb_instant()) {
        if let Some(start) = period_start(frequency, now) {
            prop_assert!(start <= now);
        }
    }
}
