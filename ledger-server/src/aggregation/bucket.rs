//! 时间分桶
//!
//! Every report buckets through [`bucket_key`] in the business timezone.

use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use serde::Serialize;

use crate::utils::time::millis_to_date;

/// Key used when an order or payment carries no usable timestamp
pub const UNKNOWN_BUCKET: &str = "unknown";

/// Bucket width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
    #[default]
    Day,
    Week,
    Month,
}

impl Granularity {
    /// Accepts `day|week|month` and `daily|weekly|monthly`; anything else is a day.
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
            Some("week" | "weekly") => Granularity::Week,
            Some("month" | "monthly") => Granularity::Month,
            _ => Granularity::Day,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Day => "day",
            Granularity::Week => "week",
            Granularity::Month => "month",
        }
    }
}

/// `YYYY-MM-DD`, ISO week `YYYY-Www`, or `YYYY-MM`
pub fn date_bucket(date: NaiveDate, granularity: Granularity) -> String {
    match granularity {
        Granularity::Day => date.format("%Y-%m-%d").to_string(),
        Granularity::Week => {
            let week = date.iso_week();
            format!("{}-W{:02}", week.year(), week.week())
        }
        Granularity::Month => date.format("%Y-%m").to_string(),
    }
}

/// Bucket for a Unix-millis timestamp, converted to the business date first
pub fn bucket_key(millis: Option<i64>, granularity: Granularity, tz: Tz) -> String {
    millis
        .and_then(|m| millis_to_date(m, tz))
        .map(|date| date_bucket(date, granularity))
        .unwrap_or_else(|| UNKNOWN_BUCKET.to_string())
}
