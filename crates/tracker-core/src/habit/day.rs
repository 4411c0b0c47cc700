//! Calendar-day helpers.
//!
//! All comparisons happen on the local date of a timestamp in one fixed
//! offset. Two timestamps a minute apart on either side of midnight are on
//! different days; two timestamps almost 24 hours apart can be the same day.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};

/// Local calendar date of `ts` in `tz`.
pub fn local_date(ts: DateTime<Utc>, tz: FixedOffset) -> NaiveDate {
    ts.with_timezone(&tz).date_naive()
}

/// Monday-based weekday index (0 = Monday .. 6 = Sunday).
pub fn weekday_index(ts: DateTime<Utc>, tz: FixedOffset) -> usize {
    date_weekday_index(local_date(ts, tz))
}

pub fn date_weekday_index(date: NaiveDate) -> usize {
    date.weekday().num_days_from_monday() as usize
}

pub fn is_same_day(a: DateTime<Utc>, b: DateTime<Utc>, tz: FixedOffset) -> bool {
    local_date(a, tz) == local_date(b, tz)
}

/// Whether a habit last completed at `last_completed_at` counts as done on `now`'s day.
pub fn is_completed_today(
    last_completed_at: DateTime<Utc>,
    now: DateTime<Utc>,
    tz: FixedOffset,
) -> bool {
    is_same_day(last_completed_at, now, tz)
}

/// Calendar dates strictly after `from` and strictly before `to`.
pub fn days_between_exclusive(from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    from.iter_days().skip(1).take_while(move |d| *d < to)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn weekday_index_is_monday_based() {
        // 2024-03-04 is a Monday.
        let monday = Utc.with_ymd_and_hms(2024, 3, 4, 12, 0, 0).unwrap();
        assert_eq!(weekday_index(monday, utc()), 0);
        let sunday = Utc.with_ymd_and_hms(2024, 3, 10, 23, 59, 59).unwrap();
        assert_eq!(weekday_index(sunday, utc()), 6);
    }

    #[test]
    fn weekday_index_follows_offset() {
        // Sunday 23:30 UTC is already Monday in UTC+2.
        let ts = Utc.with_ymd_and_hms(2024, 3, 10, 23, 30, 0).unwrap();
        let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
        assert_eq!(weekday_index(ts, utc()), 6);
        assert_eq!(weekday_index(ts, plus_two), 0);
    }

    #[test]
    fn completion_across_midnight_is_a_different_day() {
        let last = Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 2, 0, 1, 0).unwrap();
        assert!(!is_completed_today(last, now, utc()));
    }

    #[test]
    fn completion_early_and_check_late_is_same_day() {
        let last = Utc.with_ymd_and_hms(2024, 5, 1, 0, 1, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 23, 59, 0).unwrap();
        assert!(is_completed_today(last, now, utc()));
    }

    #[test]
    fn same_day_of_year_in_different_years_differs() {
        let last = Utc.with_ymd_and_hms(2023, 5, 1, 10, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap();
        assert!(!is_completed_today(last, now, utc()));
    }

    #[test]
    fn days_between_excludes_both_ends() {
        let from = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 3, 7).unwrap();
        let days: Vec<_> = days_between_exclusive(from, to).collect();
        assert_eq!(
            days,
            vec![
                NaiveDate::from_ymd_opt(2024, 3, 5).unwrap(),
                NaiveDate::from_ymd_opt(2024, 3, 6).unwrap(),
            ]
        );
        assert_eq!(days_between_exclusive(to, from).count(), 0);
        assert_eq!(days_between_exclusive(from, from).count(), 0);
    }
}
