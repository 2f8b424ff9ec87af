use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};

/// Format used by NOW and CURRENT_TIMESTAMP.
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// ISO 8601 with offset, used by FROM_UNIXTIME.
pub const ISO_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%:z";

const NAIVE_DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];

/// Parse a date-time string in local time.
///
/// Accepts RFC 3339, `YYYY-MM-DD[ HH:MM[:SS]]` style strings, and bare
/// `HH:MM:SS` times which are taken to be today.
pub fn parse_datetime(s: &str) -> Option<DateTime<Local>> {
    let s = s.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Local));
    }

    for format in NAIVE_DATETIME_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return Local.from_local_datetime(&naive).earliest();
        }
    }

    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, format) {
            return Local
                .from_local_datetime(&date.and_time(NaiveTime::MIN))
                .earliest();
        }
    }

    if let Ok(time) = NaiveTime::parse_from_str(s, "%H:%M:%S") {
        let today = Local::now().date_naive();
        return Local.from_local_datetime(&today.and_time(time)).earliest();
    }

    None
}
