use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};

pub const DAY_IN_MILLIS: i64 = 24 * 60 * 60 * 1000;

/// Source of "now" and of the local UTC offset.
///
/// Forecast keys are computed from this, so tests substitute a fixed clock.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;

    /// Milliseconds to add to a UTC instant to get local wall time at that
    /// instant, including any daylight-saving adjustment.
    fn utc_offset_millis(&self, at_millis: i64) -> i64;
}

/// Wall clock in the process's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn utc_offset_millis(&self, at_millis: i64) -> i64 {
        Local
            .timestamp_millis_opt(at_millis)
            .single()
            .map_or(0, |dt| i64::from(dt.offset().local_minus_utc()) * 1000)
    }
}

/// A clock frozen at `now_millis` with a constant offset.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    pub now_millis: i64,
    pub offset_millis: i64,
}

impl FixedClock {
    #[must_use]
    pub fn utc(now_millis: i64) -> Self {
        Self {
            now_millis,
            offset_millis: 0,
        }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.now_millis
    }

    fn utc_offset_millis(&self, _at_millis: i64) -> i64 {
        self.offset_millis
    }
}

/// Floors a UTC timestamp to the day boundary at or before it.
#[must_use]
pub fn normalize(millis: i64) -> i64 {
    millis.div_euclid(DAY_IN_MILLIS) * DAY_IN_MILLIS
}

#[must_use]
pub fn is_normalized(millis: i64) -> bool {
    millis.rem_euclid(DAY_IN_MILLIS) == 0
}

/// The current local calendar day, expressed as UTC midnight of that day.
///
/// This is the key under which today's forecast is stored. It differs from
/// `normalize(now)` whenever the local date and the UTC date disagree.
#[must_use]
pub fn normalized_today(clock: &dyn Clock) -> i64 {
    let now = clock.now_millis();
    normalize(now + clock.utc_offset_millis(now))
}

/// The UTC instant of local midnight for a stored day.
#[must_use]
pub fn local_midnight_from_normalized(clock: &dyn Clock, normalized: i64) -> i64 {
    normalized - clock.utc_offset_millis(normalized)
}

/// Whole days between today's key and the stored day `normalized`.
#[must_use]
pub fn days_from_today(clock: &dyn Clock, normalized: i64) -> i64 {
    let local_midnight = local_midnight_from_normalized(clock, normalized);
    let local_day = normalize(local_midnight + clock.utc_offset_millis(local_midnight));
    (local_day - normalized_today(clock)).div_euclid(DAY_IN_MILLIS)
}

/// Calendar date a stored key stands for.
#[must_use]
pub fn calendar_date(normalized: i64) -> NaiveDate {
    DateTime::from_timestamp_millis(normalize(normalized))
        .unwrap_or_default()
        .date_naive()
}

/// Key for a calendar date.
#[must_use]
pub fn normalized_from_date(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map_or(0, |dt| dt.and_utc().timestamp_millis())
}

/// Words substituted for the nearest two days.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayLabels {
    pub today: String,
    pub tomorrow: String,
}

impl Default for DayLabels {
    fn default() -> Self {
        Self {
            today: "Today".to_string(),
            tomorrow: "Tomorrow".to_string(),
        }
    }
}

/// "Today", "Tomorrow" or the weekday name.
#[must_use]
pub fn day_name(clock: &dyn Clock, labels: &DayLabels, normalized: i64) -> String {
    match days_from_today(clock, normalized) {
        0 => labels.today.clone(),
        1 => labels.tomorrow.clone(),
        _ => calendar_date(normalized).format("%A").to_string(),
    }
}

/// Human-friendly label for a stored day.
///
/// - today, or any day when `show_full_date` is set: "Today, October 14",
///   "Tomorrow, October 15", "Saturday, October 17"
/// - the rest of the coming week: "Tomorrow", "Friday"
/// - further out: "Wed, Oct 28"
///
/// The label is composed from the day name and the date part, so no
/// locale text is ever searched or replaced.
#[must_use]
pub fn friendly_label(
    clock: &dyn Clock,
    labels: &DayLabels,
    normalized: i64,
    show_full_date: bool,
) -> String {
    let days = days_from_today(clock, normalized);
    let date = calendar_date(normalized);

    if days == 0 || show_full_date {
        let name = day_name(clock, labels, normalized);
        format!("{name}, {}", date.format("%B %-d"))
    } else if days < 7 {
        day_name(clock, labels, normalized)
    } else {
        date.format("%a, %b %-d").to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOUR: i64 = 60 * 60 * 1000;

    // 2026-10-14T10:30:00Z, a Wednesday
    const NOW: i64 = 1_791_973_800_000;

    fn day(y: i32, m: u32, d: u32) -> i64 {
        normalized_from_date(NaiveDate::from_ymd_opt(y, m, d).unwrap())
    }

    #[test]
    fn test_normalize_floors_to_day() {
        for t in [0, 1, DAY_IN_MILLIS - 1, DAY_IN_MILLIS, NOW, -1, -DAY_IN_MILLIS - 5] {
            let n = normalize(t);
            assert_eq!(n.rem_euclid(DAY_IN_MILLIS), 0);
            assert!(n <= t && t < n + DAY_IN_MILLIS, "t={t} n={n}");
            assert!(is_normalized(n));
        }
    }

    #[test]
    fn test_normalize_does_not_round_up() {
        assert_eq!(normalize(day(2026, 10, 14) + DAY_IN_MILLIS - 1), day(2026, 10, 14));
    }

    #[test]
    fn test_is_normalized() {
        assert!(is_normalized(day(2026, 10, 14)));
        assert!(!is_normalized(day(2026, 10, 14) + 1));
        assert!(!is_normalized(NOW));
    }

    #[test]
    fn test_normalized_today_utc() {
        let clock = FixedClock::utc(NOW);
        assert_eq!(normalized_today(&clock), day(2026, 10, 14));
    }

    #[test]
    fn test_normalized_today_uses_local_day() {
        // 22:00Z on the 14th is already the 15th at UTC+3
        let clock = FixedClock {
            now_millis: day(2026, 10, 14) + 22 * HOUR,
            offset_millis: 3 * HOUR,
        };
        assert_eq!(normalized_today(&clock), day(2026, 10, 15));
        assert_ne!(normalized_today(&clock), normalize(clock.now_millis));

        // 02:00Z on the 14th is still the 13th at UTC-5
        let clock = FixedClock {
            now_millis: day(2026, 10, 14) + 2 * HOUR,
            offset_millis: -5 * HOUR,
        };
        assert_eq!(normalized_today(&clock), day(2026, 10, 13));
    }

    #[test]
    fn test_local_midnight_from_normalized() {
        let clock = FixedClock {
            now_millis: NOW,
            offset_millis: 2 * HOUR,
        };
        assert_eq!(
            local_midnight_from_normalized(&clock, day(2026, 10, 14)),
            day(2026, 10, 14) - 2 * HOUR
        );
    }

    #[test]
    fn test_days_from_today_with_offsets() {
        for offset in [-11 * HOUR, -5 * HOUR, 0, 2 * HOUR, 9 * HOUR, 14 * HOUR] {
            let clock = FixedClock {
                now_millis: NOW,
                offset_millis: offset,
            };
            let today = normalized_today(&clock);
            assert_eq!(days_from_today(&clock, today), 0, "offset {offset}");
            assert_eq!(days_from_today(&clock, today + DAY_IN_MILLIS), 1);
            assert_eq!(days_from_today(&clock, today + 6 * DAY_IN_MILLIS), 6);
            assert_eq!(days_from_today(&clock, today - DAY_IN_MILLIS), -1);
        }
    }

    #[test]
    fn test_friendly_label_today() {
        let clock = FixedClock::utc(NOW);
        let label = friendly_label(&clock, &DayLabels::default(), day(2026, 10, 14), false);
        assert_eq!(label, "Today, October 14");
        assert!(!label.contains("Wednesday"));
    }

    #[test]
    fn test_friendly_label_upcoming_week() {
        let clock = FixedClock::utc(NOW);
        let labels = DayLabels::default();
        assert_eq!(friendly_label(&clock, &labels, day(2026, 10, 15), false), "Tomorrow");
        assert_eq!(friendly_label(&clock, &labels, day(2026, 10, 16), false), "Friday");
        assert_eq!(friendly_label(&clock, &labels, day(2026, 10, 20), false), "Tuesday");
    }

    #[test]
    fn test_friendly_label_far_future() {
        let clock = FixedClock::utc(NOW);
        let label = friendly_label(&clock, &DayLabels::default(), day(2026, 10, 21), false);
        assert_eq!(label, "Wed, Oct 21");
    }

    #[test]
    fn test_friendly_label_full_date() {
        let clock = FixedClock::utc(NOW);
        let labels = DayLabels::default();
        assert_eq!(
            friendly_label(&clock, &labels, day(2026, 10, 15), true),
            "Tomorrow, October 15"
        );
        assert_eq!(
            friendly_label(&clock, &labels, day(2026, 10, 24), true),
            "Saturday, October 24"
        );
    }

    #[test]
    fn test_friendly_label_localized_words() {
        let clock = FixedClock::utc(NOW);
        let labels = DayLabels {
            today: "Heute".to_string(),
            tomorrow: "Morgen".to_string(),
        };
        assert_eq!(
            friendly_label(&clock, &labels, day(2026, 10, 14), false),
            "Heute, October 14"
        );
        assert_eq!(friendly_label(&clock, &labels, day(2026, 10, 15), false), "Morgen");
    }

    #[test]
    fn test_friendly_label_today_east_of_utc() {
        let clock = FixedClock {
            now_millis: day(2026, 10, 14) + 23 * HOUR,
            offset_millis: 2 * HOUR,
        };
        let today = normalized_today(&clock);
        assert_eq!(today, day(2026, 10, 15));
        assert_eq!(
            friendly_label(&clock, &DayLabels::default(), today, false),
            "Today, October 15"
        );
    }

    #[test]
    fn test_calendar_date_roundtrip() {
        let date = NaiveDate::from_ymd_opt(2026, 2, 28).unwrap();
        assert_eq!(calendar_date(normalized_from_date(date)), date);
        assert_eq!(calendar_date(normalized_from_date(date) + 5 * HOUR), date);
    }
}
