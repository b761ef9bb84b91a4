// One timestamped CPU reading.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::timefmt;

/// Instantaneous `(user, system, idle)` percentages as produced by a metric reader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CpuReading {
    pub user: f64,
    pub system: f64,
    pub idle: f64,
}

impl CpuReading {
    pub fn new(user: f64, system: f64, idle: f64) -> Self {
        Self { user, system, idle }
    }

    pub fn total(&self) -> f64 {
        self.user + self.system + self.idle
    }
}

/// Stored sample. Each usage value is a percentage in `[0, 100]`; the sum is expected near 100
/// but reader rounding drift is kept as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Sample {
    pub user_usage: f64,
    pub system_usage: f64,
    pub idle_usage: f64,
    #[serde(with = "timefmt::wire")]
    pub recorded_at: NaiveDateTime,
}

impl Sample {
    /// Stamps a reading. `recorded_at` is truncated to whole milliseconds.
    pub fn new(reading: CpuReading, recorded_at: NaiveDateTime) -> Self {
        Self {
            user_usage: reading.user,
            system_usage: reading.system,
            idle_usage: reading.idle,
            recorded_at: timefmt::truncate_to_millis(recorded_at),
        }
    }

    pub fn reading(&self) -> CpuReading {
        CpuReading::new(self.user_usage, self.system_usage, self.idle_usage)
    }
}
