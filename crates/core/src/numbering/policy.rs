//! Time-based reset boundaries.
//!
//! Calendar comparisons are made in UTC.

use chrono::{DateTime, Datelike, NaiveDate, TimeZone, Utc};

use crate::numbering::types::ResetFrequency;

/// Returns true if `last_reset_date` falls before the period containing `now`.
///
/// A sequence with a frequency other than `Never` that has never been reset
/// is always due. A `last_reset_date` later than `now` (a peer with a clock
/// ahead of ours) is never due.
#[must_use]
pub fn reset_due(
    frequency: ResetFrequency,
    last_reset_date: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    match (period_start(frequency, now), last_reset_date) {
        (None, _) => false,
        (Some(_), None) => true,
        (Some(start), Some(last)) => last < start,
    }
}

/// Returns the instant the period containing `now` began.
///
/// `None` means the period is unbounded (`Never` sequences share one period
/// for all time).
#[must_use]
pub fn period_start(frequency: ResetFrequency, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let date = match frequency {
        ResetFrequency::Never => return None,
        ResetFrequency::Yearly => NaiveDate::from_ymd_opt(now.year(), 1, 1),
        ResetFrequency::Monthly => NaiveDate::from_ymd_opt(now.year(), now.month(), 1),
        ResetFrequency::Daily => Some(now.date_naive()),
    }?;

    date.and_hms_opt(0, 0, 0)
        .map(|midnight| Utc.from_utc_datetime(&midnight))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn at(y: i32, m: u32, d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, 0, 0).unwrap()
    }

    #[rstest]
    #[case(ResetFrequency::Never, None, false)]
    #[case(ResetFrequency::Never, Some(at(2000, 1, 1, 0)), false)]
    #[case(ResetFrequency::Yearly, None, true)]
    #[case(ResetFrequency::Yearly, Some(at(2025, 12, 31, 23)), true)]
    #[case(ResetFrequency::Yearly, Some(at(2026, 1, 1, 0)), false)]
    #[case(ResetFrequency::Monthly, None, true)]
    #[case(ResetFrequency::Monthly, Some(at(2026, 2, 28, 23)), true)]
    #[case(ResetFrequency::Monthly, Some(at(2025, 3, 10, 0)), true)]
    #[case(ResetFrequency::Monthly, Some(at(2026, 3, 1, 0)), false)]
    #[case(ResetFrequency::Daily, None, true)]
    #[case(ResetFrequency::Daily, Some(at(2026, 3, 9, 23)), true)]
    #[case(ResetFrequency::Daily, Some(at(2026, 3, 10, 0)), false)]
    #[case(ResetFrequency::Daily, Some(at(2026, 3, 11, 0)), false)]
    #[case(ResetFrequency::Monthly, Some(at(2026, 4, 1, 0)), false)]
    #[case(ResetFrequency::Yearly, Some(at(2027, 1, 1, 0)), false)]
    fn test_reset_due(
        #[case] frequency: ResetFrequency,
        #[case] last: Option<DateTime<Utc>>,
        #[case] expected: bool,
    ) {
        assert_eq!(reset_due(frequency, last, at(2026, 3, 10, 12)), expected);
    }

    #[test]
    fn test_period_start() {
        let now = at(2026, 3, 10, 12);
        assert_eq!(period_start(ResetFrequency::Never, now), None);
        assert_eq!(
            period_start(ResetFrequency::Yearly, now),
            Some(at(2026, 1, 1, 0))
        );
        assert_eq!(
            period_start(ResetFrequency::Monthly, now),
            Some(at(2026, 3, 1, 0))
        );
        assert_eq!(
            period_start(ResetFrequency::Daily, now),
            Some(at(2026, 3, 10, 0))
        );
    }
}
