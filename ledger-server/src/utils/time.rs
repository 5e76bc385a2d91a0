//! 时间工具函数 - 业务时区转换
//!
//! 日期边界、"今天"、时间分桶都以配置的业务时区为准；
//! repository 层只接收 `i64` Unix millis 或 `NaiveDate`。

use chrono::{NaiveDate, NaiveDateTime};
use chrono_tz::Tz;

use super::{AppError, AppResult};

/// 解析日期字符串 (YYYY-MM-DD)
pub fn parse_date(date: &str) -> AppResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::validation(format!("Invalid date format: {}", date)))
}

/// 宽松解析：非法或空值视为未提供
pub fn parse_date_opt(date: Option<&str>) -> Option<NaiveDate> {
    date.map(str::trim)
        .filter(|d| !d.is_empty())
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
}

/// 业务时区的今天
pub fn today(tz: Tz) -> NaiveDate {
    chrono::Utc::now().with_timezone(&tz).date_naive()
}

/// 本地时间 → Unix millis (业务时区)
///
/// DST gap fallback: 如果本地时间不存在 (夏令时跳跃)，fallback 到 UTC。
fn local_to_millis(naive: NaiveDateTime, tz: Tz) -> i64 {
    naive
        .and_local_timezone(tz)
        .latest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

/// 日期开始 (00:00:00) → Unix millis (业务时区)
pub fn day_start_millis(date: NaiveDate, tz: Tz) -> i64 {
    local_to_millis(date.and_time(chrono::NaiveTime::MIN), tz)
}

/// 日期结束 → 次日 00:00:00 的 Unix millis (业务时区)
///
/// 返回次日零点时间戳，调用方使用 `< end` (不含) 语义。
pub fn day_end_millis(date: NaiveDate, tz: Tz) -> i64 {
    match date.succ_opt() {
        Some(next_day) => day_start_millis(next_day, tz),
        None => i64::MAX,
    }
}

/// Unix millis → 业务时区日期
pub fn millis_to_date(millis: i64, tz: Tz) -> Option<NaiveDate> {
    chrono::DateTime::from_timestamp_millis(millis).map(|dt| dt.with_timezone(&tz).date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("2026-03-01").unwrap(),
            NaiveDate::from_ymd_opt(2026, 3, 1).unwrap()
        );
        assert!(parse_date("01/03/2026").is_err());
        assert_eq!(parse_date_opt(Some(" ")), None);
        assert_eq!(parse_date_opt(Some("garbage")), None);
        assert!(parse_date_opt(Some("2026-03-01")).is_some());
    }

    #[test]
    fn test_day_bounds_follow_timezone() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let utc_start = day_start_millis(date, Tz::UTC);
        // Asia/Tashkent is UTC+5
        let tashkent_start = day_start_millis(date, chrono_tz::Asia::Tashkent);
        assert_eq!(utc_start - tashkent_start, 5 * 3600 * 1000);
        assert_eq!(day_end_millis(date, Tz::UTC) - utc_start, 24 * 3600 * 1000);
    }

    #[test]
    fn test_millis_to_date() {
        // 2026-03-01T20:00:00Z is already 2026-03-02 in Tashkent
        let ts = chrono::NaiveDate::from_ymd_opt(2026, 3, 1)
            .unwrap()
            .and_hms_opt(20, 0, 0)
            .unwrap()
            .and_utc()
            .timestamp_millis();
        assert_eq!(
            millis_to_date(ts, Tz::UTC),
            NaiveDate::from_ymd_opt(2026, 3, 1)
        );
        assert_eq!(
            millis_to_date(ts, chrono_tz::Asia::Tashkent),
            NaiveDate::from_ymd_opt(2026, 3, 2)
        );
    }
}
