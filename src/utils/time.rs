use chrono::{DateTime, Duration, NaiveDate, SubsecRound, Utc};

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// This is the standard way of converting a date to a string in studytime. The format is fixed
/// width, so keys sort lexicographically in calendar order.
pub fn date_to_key(date: NaiveDate) -> String {
    date.format(DATE_KEY_FORMAT).to_string()
}

pub fn key_to_date(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DATE_KEY_FORMAT)
        .ok()
        // parse_from_str accepts unpadded fields, which would break key ordering
        .filter(|date| date_to_key(*date) == key)
}

/// Returns the calendar day before `date`. Works on dates rather than timestamps so that DST
/// transitions never skip or repeat a day.
pub fn previous_day(date: NaiveDate) -> Option<NaiveDate> {
    date.pred_opt()
}

/// Drops everything below a millisecond. Timestamps are stored in milliseconds, so anything kept
/// in memory has to be cut the same way to survive a save and reload unchanged.
pub fn stored_precision(time: DateTime<Utc>) -> DateTime<Utc> {
    time.trunc_subsecs(3)
}

/// Sum that sticks at [Duration::MAX] instead of overflowing.
pub fn saturating_add(a: Duration, b: Duration) -> Duration {
    a.checked_add(&b).unwrap_or(Duration::MAX)
}

pub fn format_duration(v: Duration) -> String {
    let v = v.max(Duration::zero());
    if v.num_hours() > 0 {
        format!(
            "{}h{:02}m{:02}s",
            v.num_hours(),
            v.num_minutes() % 60,
            v.num_seconds() % 60
        )
    } else if v.num_minutes() > 0 {
        format!("{}m{:02}s", v.num_minutes() % 60, v.num_seconds() % 60)
    } else {
        format!("{}s", v.num_seconds() % 60)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, NaiveDate, TimeZone, Timelike, Utc};

    use super::{
        date_to_key, format_duration, key_to_date, previous_day, saturating_add, stored_precision,
    };

    #[test]
    fn test_date_key_is_zero_padded() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        assert_eq!(date_to_key(date), "2024-03-05");
        assert_eq!(key_to_date("2024-03-05"), Some(date));
    }

    #[test]
    fn test_key_to_date_rejects_loose_formats() {
        assert_eq!(key_to_date("2024-3-5"), None);
        assert_eq!(key_to_date("2024-02-30"), None);
        assert_eq!(key_to_date("yesterday"), None);
        assert_eq!(key_to_date(""), None);
    }

    #[test]
    fn test_previous_day_crosses_year() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        assert_eq!(
            previous_day(date),
            NaiveDate::from_ymd_opt(2024, 12, 31)
        );
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(Duration::seconds(7)), "7s");
        assert_eq!(format_duration(Duration::seconds(65)), "1m05s");
        assert_eq!(format_duration(Duration::seconds(3600 * 2 + 61)), "2h01m01s");
        assert_eq!(format_duration(Duration::seconds(-5)), "0s");
    }

    #[test]
    fn test_stored_precision_drops_sub_milliseconds() {
        let time = Utc.with_ymd_and_hms(2024, 5, 10, 9, 0, 0).unwrap()
            + Duration::microseconds(1_700);
        let cut = stored_precision(time);
        assert_eq!(cut.nanosecond(), 1_000_000);
        assert_eq!(stored_precision(cut), cut);
    }

    #[test]
    fn test_saturating_add() {
        assert_eq!(
            saturating_add(Duration::minutes(1), Duration::seconds(30)),
            Duration::seconds(90)
        );
        assert_eq!(saturating_add(Duration::MAX, Duration::MAX), Duration::MAX);
    }
}
