//! Display strings for instants, rendered at a location's UTC offset.

use chrono::{DateTime, Datelike, FixedOffset, Offset, Utc};

use crate::model::TimeFormat;

/// Out-of-range offsets fall back to UTC.
pub fn offset_from_secs(secs: i32) -> FixedOffset {
    FixedOffset::east_opt(secs).unwrap_or_else(|| Utc.fix())
}

/// `"09:20 AM"` or `"21:20"`.
pub fn format_time(at: DateTime<Utc>, utc_offset_secs: i32, format: TimeFormat) -> String {
    let local = at.with_timezone(&offset_from_secs(utc_offset_secs));
    match format {
        TimeFormat::TwelveHour => local.format("%I:%M %p").to_string(),
        TimeFormat::TwentyFourHour => local.format("%H:%M").to_string(),
    }
}

/// Short weekday and `month/day/year` without zero padding, e.g. `("Fri", "5/19/2023")`.
pub fn forecast_labels(at: DateTime<Utc>, utc_offset_secs: i32) -> (String, String) {
    let local = at.with_timezone(&offset_from_secs(utc_offset_secs));
    let day = local.format("%a").to_string();
    let date = format!("{}/{}/{}", local.month(), local.day(), local.year());
    (day, date)
}

pub fn unix_to_utc(ts: i64) -> Option<DateTime<Utc>> {
    DateTime::<Utc>::from_timestamp(ts, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    // 2023-05-19 21:20:00 UTC, a Friday.
    const TS: i64 = 1_684_531_200;

    #[test]
    fn twelve_and_twenty_four_hour_clock() {
        let at = unix_to_utc(TS).unwrap();
        assert_eq!(format_time(at, 0, TimeFormat::TwelveHour), "09:20 PM");
        assert_eq!(format_time(at, 0, TimeFormat::TwentyFourHour), "21:20");
    }

    #[test]
    fn offset_shifts_clock_and_calendar_day() {
        let at = unix_to_utc(TS).unwrap();
        // UTC+9 pushes the instant past midnight.
        assert_eq!(
            format_time(at, 9 * 3600, TimeFormat::TwentyFourHour),
            "06:20"
        );
        assert_eq!(
            forecast_labels(at, 9 * 3600),
            ("Sat".to_string(), "5/20/2023".to_string())
        );
    }

    #[test]
    fn labels_are_not_zero_padded() {
        let at = unix_to_utc(TS).unwrap();
        assert_eq!(
            forecast_labels(at, 0),
            ("Fri".to_string(), "5/19/2023".to_string())
        );
    }

    #[test]
    fn invalid_offset_falls_back_to_utc() {
        let at = unix_to_utc(TS).unwrap();
        assert_eq!(
            format_time(at, 999_999, TimeFormat::TwentyFourHour),
            "21:20"
        );
    }
}
