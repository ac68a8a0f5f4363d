//! Compact (`YYYYMMDD`) dates and the UTC windows queried for them

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

use crate::errors::{AppError, Result};

/// Message returned when a compact date does not name a calendar day
pub const DATE_FORMAT_ERROR: &str = "Invalid date format. Use YYYYMMDD.";

const COMPACT_FORMAT: &str = "%Y%m%d";

/// Articles published up to this many hours after midnight still count
/// towards the previous day's digest.
const DIGEST_TAIL_HOURS: i64 = 3;

/// `true` when `value` is exactly eight ASCII digits
pub fn is_compact_date(value: &str) -> bool {
    value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit())
}

/// Parse `YYYYMMDD`
pub fn parse_compact_date(value: &str) -> Result<NaiveDate> {
    if !is_compact_date(value) {
        return Err(AppError::date_parse(DATE_FORMAT_ERROR));
    }
    NaiveDate::parse_from_str(value, COMPACT_FORMAT)
        .map_err(|_| AppError::date_parse(DATE_FORMAT_ERROR))
}

pub fn format_compact_date(date: NaiveDate) -> String {
    date.format(COMPACT_FORMAT).to_string()
}

/// Midnight UTC of `date`
pub fn start_of_day(date: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0).unwrap_or_default())
}

/// `[00:00, next day 00:00)` in UTC
pub fn day_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of_day(date);
    (start, start + Duration::days(1))
}

/// `[00:00, next day 03:00)` in UTC
pub fn digest_window(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = start_of_day(date);
    (
        start,
        start + Duration::days(1) + Duration::hours(DIGEST_TAIL_HOURS),
    )
}

/// 格式化运行时长，例如 `2d 3h`、`5m`
pub fn format_duration_human(from: DateTime<Utc>, to: DateTime<Utc>) -> String {
    let duration = to.signed_duration_since(from);
    let total = duration.num_seconds();

    if total < 0 {
        return "0s".to_string();
    }

    let days = duration.num_days();
    let hours = (total % 86400) / 3600;
    let minutes = (total % 3600) / 60;

    if days > 0 {
        if hours > 0 {
            format!("{}d {}h", days, hours)
        } else {
            format!("{}d", days)
        }
    } else if hours > 0 {
        if minutes > 0 {
            format!("{}h {}m", hours, minutes)
        } else {
            format!("{}h", hours)
        }
    } else if minutes > 0 {
        format!("{}m", minutes)
    } else {
        format!("{}s", total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_compact_date() {
        assert!(is_compact_date("20250131"));
        assert!(is_compact_date("00000000"));
        assert!(!is_compact_date("2025013"));
        assert!(!is_compact_date("2025-01-31"));
        assert!(!is_compact_date("202501311"));
        assert!(!is_compact_date("2025O131"));
        assert!(!is_compact_date("２０２５０１３１"));
    }

    #[test]
    fn test_parse_compact_date() {
        let date = parse_compact_date("20240229").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());

        let err = parse_compact_date("20230229").unwrap_err();
        assert_eq!(err.message(), DATE_FORMAT_ERROR);
        assert!(matches!(err, AppError::DateParse(_)));

        assert!(parse_compact_date("20241301").is_err());
        assert!(parse_compact_date("abc").is_err());
    }

    #[test]
    fn test_day_window_crosses_month_end() {
        let date = NaiveDate::from_ymd_opt(2025, 1, 31).unwrap();
        let (start, end) = day_window(date);
        assert_eq!(start.to_rfc3339(), "2025-01-31T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-02-01T00:00:00+00:00");
    }

    #[test]
    fn test_digest_window_has_tail() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let (start, end) = digest_window(date);
        assert_eq!(start.to_rfc3339(), "2024-12-31T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2025-01-01T03:00:00+00:00");
    }

    #[test]
    fn test_format_compact_date() {
        let date = NaiveDate::from_ymd_opt(2025, 3, 7).unwrap();
        assert_eq!(format_compact_date(date), "20250307");
    }

    #[test]
    fn test_format_duration_human() {
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(format_duration_human(start, start), "0s");
        assert_eq!(
            format_duration_human(start, start + Duration::seconds(42)),
            "42s"
        );
        assert_eq!(
            format_duration_human(start, start + Duration::minutes(5)),
            "5m"
        );
        assert_eq!(
            format_duration_human(start, start + Duration::minutes(125)),
            "2h 5m"
        );
        assert_eq!(
            format_duration_human(start, start + Duration::hours(51)),
            "2d 3h"
        );
        assert_eq!(
            format_duration_human(start, start + Duration::days(3)),
            "3d"
        );
        assert_eq!(
            format_duration_human(start + Duration::seconds(1), start),
            "0s"
        );
    }
}
