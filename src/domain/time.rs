use chrono::{Local, NaiveDate, NaiveDateTime, NaiveTime};

pub const DATE_FMT: &str = "%Y-%m-%d";
pub const TIME_FMT: &str = "%H:%M";

/// Combines a "YYYY-MM-DD" date and an "HH:MM" time into a local timestamp.
/// An empty time means midnight. Returns `None` for malformed input so callers
/// can short-circuit instead of propagating garbage arithmetic.
pub fn parse_date(date: &str, time: &str) -> Option<NaiveDateTime> {
    let date = NaiveDate::parse_from_str(date, DATE_FMT).ok()?;
    let time = if time.is_empty() {
        NaiveTime::from_hms_opt(0, 0, 0)?
    } else {
        NaiveTime::parse_from_str(time, TIME_FMT).ok()?
    };
    Some(date.and_time(time))
}

pub fn date_iso(date: NaiveDate) -> String {
    date.format(DATE_FMT).to_string()
}

pub fn time_iso(at: NaiveDateTime) -> String {
    at.format(TIME_FMT).to_string()
}

pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Formats a duration given in fractional hours, e.g. 1.5 -> "1 hour and 30 minutes".
pub fn format_duration(hours: f64) -> String {
    let whole = hours.floor() as i64;
    let minutes = ((hours - hours.floor()) * 60.0).round() as i64;

    let h = match whole {
        0 => None,
        1 => Some("1 hour".to_string()),
        n => Some(format!("{} hours", n)),
    };
    let m = match minutes {
        0 => None,
        1 => Some("1 minute".to_string()),
        n => Some(format!("{} minutes", n)),
    };

    match (h, m) {
        (Some(h), Some(m)) => format!("{} and {}", h, m),
        (Some(h), None) => h,
        (None, Some(m)) => m,
        (None, None) => "0 minutes".to_string(),
    }
}
