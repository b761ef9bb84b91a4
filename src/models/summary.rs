// Hourly/daily rollups: granularity, bucket keys, per-field statistics.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::timefmt;

/// Truncation unit used to group samples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Hour,
    Day,
}

impl Granularity {
    /// `YYYY-MM-DDTHH:00` for hours, `YYYY-MM-DD` for days. Both sort lexically in time order.
    pub fn bucket_key(&self, t: &NaiveDateTime) -> String {
        match self {
            Granularity::Hour => t.format(timefmt::HOUR_KEY_FORMAT).to_string(),
            Granularity::Day => t.format(timefmt::DAY_KEY_FORMAT).to_string(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Hour => "hour",
            Granularity::Day => "day",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// min/max are exact; avg is rounded to 2 decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UsageStats {
    pub min: f64,
    pub max: f64,
    pub avg: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BucketSummary {
    pub bucket_key: String,
    pub user_usage: UsageStats,
    pub system_usage: UsageStats,
    pub idle_usage: UsageStats,
}
