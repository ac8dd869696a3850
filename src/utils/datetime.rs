//! Timestamp parsing for edge attributes.
//!
//! Citation edges are written by several loaders over the years, so the
//! `date` attribute shows up in more than one textual shape.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Naive datetime layouts tried after RFC 3339, interpreted as UTC.
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Date-only layouts, interpreted as midnight UTC.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y"];

/// Parse a timestamp string into a UTC [`DateTime`].
///
/// Accepts, in order:
/// 1. RFC 3339 with any offset: `"2024-01-15T10:30:00Z"`, `"2024-01-15T10:30:00+05:00"`
/// 2. ISO 8601 without offset, optional fraction: `"2024-01-15T10:30:00.123"`
/// 3. Space-separated SQL style: `"2024-01-15 10:30:00"`
/// 4. Date only: `"2024-01-15"`, `"01/15/2024"`
///
/// Returns `None` for empty or unrecognised input.
pub fn parse_flexible_datetime(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_DATETIME_FORMATS {
        if let Ok(ndt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(Utc.from_utc_datetime(&ndt));
        }
    }

    DATE_FORMATS.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(s, fmt)
            .ok()
            .and_then(|nd| nd.and_hms_opt(0, 0, 0))
            .map(|ndt| Utc.from_utc_datetime(&ndt))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn parses_rfc3339_utc() {
        let dt = parse_flexible_datetime("2024-01-15T10:30:00Z").expect("should parse");
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap());
    }

    #[test]
    fn parses_rfc3339_with_offset() {
        let dt = parse_flexible_datetime("2024-01-15T10:30:00+05:00").expect("should parse");
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 15, 5, 30, 0).unwrap());
    }

    #[test]
    fn parses_naive_iso_with_fraction() {
        let dt = parse_flexible_datetime("2024-06-01T12:00:00.250").expect("should parse");
        assert_eq!(dt.nanosecond(), 250_000_000);
    }

    #[test]
    fn parses_sql_style() {
        let dt = parse_flexible_datetime("2023-03-09 08:15:00").expect("should parse");
        assert_eq!(dt, Utc.with_ymd_and_hms(2023, 3, 9, 8, 15, 0).unwrap());
    }

    #[test]
    fn parses_date_only_formats() {
        let midnight = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
        assert_eq!(parse_flexible_datetime("2024-01-15"), Some(midnight));
        assert_eq!(parse_flexible_datetime("01/15/2024"), Some(midnight));
    }

    #[test]
    fn trims_surrounding_whitespace() {
        assert!(parse_flexible_datetime("  2024-01-15  ").is_some());
    }

    #[test]
    fn rejects_garbage_and_empty() {
        assert!(parse_flexible_datetime("").is_none());
        assert!(parse_flexible_datetime("   ").is_none());
        assert!(parse_flexible_datetime("last tuesday").is_none());
        assert!(parse_flexible_datetime("2024-13-01").is_none());
    }
}
