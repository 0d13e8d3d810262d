// Timestamp helpers.  All clock arithmetic is in UTC: the log lines we ingest carry wall-clock
// times without a zone, and the epoch encoding must come out the same on every host.

use crate::Timestamp;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

pub const NS_PER_SEC: i64 = 1_000_000_000;

/// Parse "YYYY-MM-DD HH:MM:SS", or bare "HH:MM:SS" with the date taken from `today`, into
/// nanoseconds since the epoch.
pub fn parse_clock(text: &str, today: NaiveDate) -> Option<Timestamp> {
    let dt = if let Ok(dt) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        dt
    } else {
        let t = NaiveTime::parse_from_str(text, "%H:%M:%S").ok()?;
        today.and_time(t)
    };
    Some(dt.and_utc().timestamp() * NS_PER_SEC)
}

/// The date substituted for log lines that carry a time of day only.
pub fn current_date() -> NaiveDate {
    Utc::now().date_naive()
}

/// "YYYY-MM-DD HH:MM:SS", for column output.
pub fn human_timestamp(t: Timestamp) -> String {
    utc(t).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// ISO-8601 without a zone suffix, for CSV output.  Subseconds appear only when nonzero, in
/// three-, six-, or nine-digit groups.
pub fn iso_timestamp(t: Timestamp) -> String {
    utc(t).format("%Y-%m-%dT%H:%M:%S%.f").to_string()
}

fn utc(t: Timestamp) -> DateTime<Utc> {
    let secs = t.div_euclid(NS_PER_SEC);
    let nanos = t.rem_euclid(NS_PER_SEC) as u32;
    // Out-of-range timestamps render as the epoch; these helpers are display-only.
    DateTime::from_timestamp(secs, nanos).unwrap_or_default()
}

#[test]
fn test_parse_clock() {
    let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

    // Time of day gets the assumed date; 2024-01-01 12:00:00 UTC is 1704110400.
    assert!(parse_clock("12:00:00", today) == Some(1704110400 * NS_PER_SEC));

    // A full datetime overrides the assumed date.
    assert!(parse_clock("2023-06-05 00:00:00", today) == Some(1685923200 * NS_PER_SEC));

    assert!(parse_clock("12:00", today).is_none());
    assert!(parse_clock("noonish", today).is_none());
    assert!(parse_clock("", today).is_none());
}

#[test]
fn test_render_timestamps() {
    let t = 1704110400 * NS_PER_SEC;
    assert!(human_timestamp(t) == "2024-01-01 12:00:00");
    assert!(iso_timestamp(t) == "2024-01-01T12:00:00");
    // Subseconds come out in whole digit groups.
    assert!(iso_timestamp(t + NS_PER_SEC / 2) == "2024-01-01T12:00:00.500");
    assert!(iso_timestamp(t + 1_500_000) == "2024-01-01T12:00:00.001500");
}
