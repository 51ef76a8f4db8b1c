use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, SecondsFormat, Utc};

/// Format as `YYYY-MM-DDTHH:MM:SSZ`; sub-second precision is truncated.
pub fn format_utc_seconds(time: DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn hours_before(time: DateTime<Utc>, hours: i64) -> DateTime<Utc> {
    time - Duration::hours(hours)
}

/// Parse a vendor timestamp into whole Unix seconds.
///
/// Accepts RFC 3339 with any offset. Values without an offset are read as UTC,
/// and a bare date is UTC midnight.
pub fn parse_unix_seconds(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(millis_to_unix_seconds(parsed.timestamp_millis()));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| millis_to_unix_seconds(naive.and_utc().timestamp_millis()))
}

/// Floor epoch milliseconds to whole seconds, rounding toward negative infinity.
pub fn millis_to_unix_seconds(millis: i64) -> i64 {
    millis.div_euclid(1000)
}
