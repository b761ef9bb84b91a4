// Linux /proc/stat reader. Percentages come from jiffy deltas between two reads; the first
// read takes a short baseline, later reads cover the time since the previous tick.

use std::sync::Mutex;
use std::time::Duration;

use super::MetricReader;
use crate::error::ReadError;
use crate::models::CpuReading;
use crate::store::aggregation::round2;

const PROC_STAT: &str = "/proc/stat";
const BASELINE_INTERVAL: Duration = Duration::from_millis(250);

/// Aggregate `cpu ` line counters, in jiffies since boot.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CpuTimes {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
    pub steal: u64,
}

impl CpuTimes {
    /// Finds the aggregate `cpu ` line (not `cpu0`, `cpu1`, ...).
    pub fn parse(content: &str) -> Result<Self, ReadError> {
        let line = content
            .lines()
            .find(|l| l.starts_with("cpu "))
            .ok_or_else(|| ReadError::Malformed("no aggregate cpu line".into()))?;
        let fields: Vec<&str> = line.split_whitespace().skip(1).collect();
        if fields.len() < 4 {
            return Err(ReadError::Malformed(format!(
                "cpu line has {} fields, need at least 4",
                fields.len()
            )));
        }
        let field = |idx: usize, name: &'static str| -> Result<u64, ReadError> {
            match fields.get(idx) {
                None => Ok(0),
                Some(tok) => tok.parse().map_err(|_| ReadError::InvalidNumber {
                    field: name,
                    token: (*tok).to_string(),
                }),
            }
        };
        Ok(Self {
            user: field(0, "user")?,
            nice: field(1, "nice")?,
            system: field(2, "system")?,
            idle: field(3, "idle")?,
            iowait: field(4, "iowait")?,
            irq: field(5, "irq")?,
            softirq: field(6, "softirq")?,
            steal: field(7, "steal")?,
        })
    }

    fn user_time(&self) -> u64 {
        self.user + self.nice
    }

    fn system_time(&self) -> u64 {
        self.system + self.irq + self.softirq + self.steal
    }

    fn idle_time(&self) -> u64 {
        self.idle + self.iowait
    }

    fn total(&self) -> u64 {
        self.user_time() + self.system_time() + self.idle_time()
    }

    /// Usage split between `prev` and `self`. `None` when no time has elapsed.
    pub fn percent_since(&self, prev: &CpuTimes) -> Option<CpuReading> {
        let total = self.total().checked_sub(prev.total())?;
        if total == 0 {
            return None;
        }
        let pct = |now: u64, before: u64| {
            round2(now.saturating_sub(before) as f64 * 100.0 / total as f64)
        };
        Some(CpuReading::new(
            pct(self.user_time(), prev.user_time()),
            pct(self.system_time(), prev.system_time()),
            pct(self.idle_time(), prev.idle_time()),
        ))
    }
}

pub struct ProcStatReader {
    last: Mutex<Option<CpuTimes>>,
}

impl Default for ProcStatReader {
    fn default() -> Self {
        Self::new()
    }
}

impl ProcStatReader {
    pub fn new() -> Self {
        Self {
            last: Mutex::new(None),
        }
    }

    fn snapshot() -> Result<CpuTimes, ReadError> {
        let content = std::fs::read_to_string(PROC_STAT).map_err(|source| ReadError::Io {
            path: PROC_STAT,
            source,
        })?;
        CpuTimes::parse(&content)
    }
}

impl MetricReader for ProcStatReader {
    fn read(&self) -> Result<CpuReading, ReadError> {
        let mut last = self
            .last
            .lock()
            .map_err(|_| ReadError::Malformed("proc_stat reader lock poisoned".into()))?;
        let prev = match *last {
            Some(prev) => prev,
            None => {
                let baseline = Self::snapshot()?;
                std::thread::sleep(BASELINE_INTERVAL);
                baseline
            }
        };
        let now = Self::snapshot()?;
        *last = Some(now);
        now.percent_since(&prev)
            .ok_or_else(|| ReadError::Malformed("no cpu time elapsed between reads".into()))
    }

    fn name(&self) -> &'static str {
        "proc_stat"
    }
}
