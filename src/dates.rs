//! Date parsing for transaction rows and the reference date

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M",
];

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Parse a timestamp in any supported form. Naive values are read as UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }

    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(value, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(value, fmt).ok())
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Whole days from `from` to `to`, truncated toward zero.
pub fn days_between(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    (to - from).num_days()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_supported_formats() {
        let expected = Utc.with_ymd_and_hms(2011, 12, 5, 10, 15, 0).unwrap();
        for value in [
            "2011-12-05T10:15:00Z",
            "2011-12-05T11:15:00+01:00",
            "2011-12-05 10:15:00",
            "2011-12-05T10:15:00",
            "2011-12-05 10:15",
            "12/05/2011 10:15",
        ] {
            assert_eq!(parse_timestamp(value), Some(expected), "{value}");
        }

        let midnight = Utc.with_ymd_and_hms(2011, 12, 5, 0, 0, 0).unwrap();
        assert_eq!(parse_timestamp("2011-12-05"), Some(midnight));
        assert_eq!(parse_timestamp(" 12/05/2011 "), Some(midnight));
    }

    #[test]
    fn test_parse_fractional_seconds() {
        let whole = Utc.with_ymd_and_hms(2011, 12, 1, 8, 26, 0).unwrap();
        assert_eq!(parse_timestamp("2011-12-01 08:26:00.000"), Some(whole));

        let half = whole + chrono::Duration::milliseconds(500);
        assert_eq!(parse_timestamp("2011-12-01T08:26:00.5"), Some(half));
        assert_eq!(parse_timestamp("2011-12-01 08:26:00.500"), Some(half));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert_eq!(parse_timestamp("yesterday"), None);
        assert_eq!(parse_timestamp("2011-13-45"), None);
        assert_eq!(parse_timestamp(""), None);
    }

    #[test]
    fn test_days_between_truncates() {
        let from = Utc.with_ymd_and_hms(2011, 12, 1, 18, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2011, 12, 9, 0, 0, 0).unwrap();
        assert_eq!(days_between(from, to), 7);
        assert_eq!(days_between(to, to), 0);
    }
}
