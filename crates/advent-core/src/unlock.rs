//! Unlock policy.
//!
//! A door unlocks at midnight of its calendar date and never re-locks. The
//! predicate is a pure function of config, day, and a caller-supplied `now`,
//! so it is recomputed on every build -- unlock state advances with real
//! time without needing a timer or a reload.
//!
//! `now` is a naive wall-clock instant in the configured frame of reference:
//! [`wall_clock_now`] reads the local clock when `use_local_time` is set and
//! UTC otherwise. Keeping the comparison naive-vs-naive keeps the policy
//! free of ambient state.

use chrono::{Local, NaiveDate, NaiveDateTime, Utc};

use crate::config::CalendarConfig;

/// Midnight of `(year, month_index, day)`.
///
/// An unrepresentable date (month index out of range, day 31 in a 30-day
/// month) saturates to the far future, so a bad config yields a door that
/// never unlocks instead of a panic.
pub fn unlock_instant(config: &CalendarConfig, day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(config.year, config.month_index.saturating_add(1), day)
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .unwrap_or(NaiveDateTime::MAX)
}

/// Whether the door for `day` may be revealed at `now`.
///
/// Monotonic in `now`: once true it stays true for all later instants.
pub fn is_unlocked(config: &CalendarConfig, day: u32, now: NaiveDateTime) -> bool {
    now >= unlock_instant(config, day)
}

/// The current wall-clock instant in the config's frame of reference.
pub fn wall_clock_now(config: &CalendarConfig) -> NaiveDateTime {
    if config.use_local_time {
        Local::now().naive_local()
    } else {
        Utc::now().naive_utc()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn december() -> CalendarConfig {
        CalendarConfig {
            year: 2025,
            month_index: 11,
            ..CalendarConfig::default()
        }
    }

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn unlocks_exactly_at_midnight() {
        let cfg = december();
        let instant = unlock_instant(&cfg, 5);
        assert_eq!(instant, at(2025, 12, 5, 0));

        let just_before = at(2025, 12, 4, 23);
        let exactly = at(2025, 12, 5, 0);
        assert!(!is_unlocked(&cfg, 5, just_before));
        assert!(is_unlocked(&cfg, 5, exactly));
    }

    #[test]
    fn monotonic_in_time() {
        let cfg = december();
        let mut previous = false;
        for hour_offset in 0..72 {
            let now = at(2025, 12, 1, 0) + chrono::Duration::hours(hour_offset);
            let unlocked = is_unlocked(&cfg, 2, now);
            assert!(
                !previous || unlocked,
                "door re-locked at offset {hour_offset}"
            );
            previous = unlocked;
        }
    }

    #[test]
    fn all_doors_unlocked_after_calendar_ends() {
        let cfg = december();
        let january = at(2026, 1, 15, 12);
        for day in cfg.start_day..=cfg.end_day {
            assert!(is_unlocked(&cfg, day, january));
        }
    }

    #[test]
    fn invalid_date_never_unlocks() {
        let cfg = CalendarConfig {
            month_index: 42,
            ..december()
        };
        assert!(!is_unlocked(&cfg, 1, at(9999, 12, 31, 23)));
    }

    #[test]
    fn absurd_month_index_from_document_never_unlocks() {
        // Parses cleanly; must degrade to a door that never opens.
        let cfg =
            CalendarConfig::from_json_str(r#"{ "monthIndex": 4294967295 }"#).unwrap();
        for day in 1..=24 {
            assert!(!is_unlocked(&cfg, day, at(9999, 12, 31, 23)));
        }
    }
}
