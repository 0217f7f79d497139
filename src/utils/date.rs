// Date expression parsing for due dates and message timestamps

use chrono::{DateTime, Duration, Local, NaiveDate, NaiveDateTime, TimeZone};
use crate::error::{CrmError, CrmResult};

fn local_timestamp(datetime: NaiveDateTime) -> CrmResult<i64> {
    Local
        .from_local_datetime(&datetime)
        .earliest()
        .map(|dt| dt.timestamp())
        .ok_or_else(|| CrmError::Validation(format!("Invalid local time: {}", datetime)))
}

/// Parse a date expression relative to `now` and return a Unix timestamp.
///
/// Accepted forms: `YYYY-MM-DD` (local midnight), `YYYY-MM-DDTHH:MM`,
/// `today`, `tomorrow`, `now`, and `+Nd` / `-Nd` day offsets from today.
pub fn parse_date_expr_at(expr: &str, now: DateTime<Local>) -> CrmResult<i64> {
    let expr = expr.trim();

    if let Ok(date) = NaiveDate::parse_from_str(expr, "%Y-%m-%d") {
        return local_timestamp(date.and_time(chrono::NaiveTime::MIN));
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(expr, "%Y-%m-%dT%H:%M") {
        return local_timestamp(datetime);
    }

    let today = now.date_naive();
    let day_offset = match expr.to_lowercase().as_str() {
        "now" => return Ok(now.timestamp()),
        "today" => Some(0),
        "tomorrow" => Some(1),
        other => other
            .strip_suffix('d')
            .filter(|n| n.starts_with('+') || n.starts_with('-'))
            .and_then(|n| n.parse::<i64>().ok()),
    };

    match day_offset {
        Some(days) => local_timestamp((today + Duration::days(days)).and_time(chrono::NaiveTime::MIN)),
        None => Err(CrmError::Validation(format!(
            "Invalid date: '{}'. Use YYYY-MM-DD, YYYY-MM-DDTHH:MM, today, tomorrow or +Nd",
            expr
        ))),
    }
}

/// Parse a date expression relative to the current local time
pub fn parse_date_expr(expr: &str) -> CrmResult<i64> {
    parse_date_expr_at(expr, Local::now())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 20, 15, 30, 0).single().unwrap()
    }

    fn midnight(y: i32, m: u32, d: u32) -> i64 {
        Local.with_ymd_and_hms(y, m, d, 0, 0, 0).single().unwrap().timestamp()
    }

    #[test]
    fn test_absolute_dates() {
        assert_eq!(parse_date_expr_at("2026-01-10", now()).unwrap(), midnight(2026, 1, 10));
        let expected = Local.with_ymd_and_hms(2026, 1, 10, 14, 30, 0).single().unwrap().timestamp();
        assert_eq!(parse_date_expr_at("2026-01-10T14:30", now()).unwrap(), expected);
    }

    #[test]
    fn test_relative_dates() {
        assert_eq!(parse_date_expr_at("today", now()).unwrap(), midnight(2026, 3, 20));
        assert_eq!(parse_date_expr_at("Tomorrow", now()).unwrap(), midnight(2026, 3, 21));
        assert_eq!(parse_date_expr_at("+3d", now()).unwrap(), midnight(2026, 3, 23));
        assert_eq!(parse_date_expr_at("-1d", now()).unwrap(), midnight(2026, 3, 19));
        assert_eq!(parse_date_expr_at("now", now()).unwrap(), now().timestamp());
    }

    #[test]
    fn test_invalid_dates() {
        for expr in ["", "next week", "3d", "2026-13-01"] {
            assert!(matches!(parse_date_expr_at(expr, now()), Err(CrmError::Validation(_))), "{}", expr);
        }
    }
}
