// Metric readers: turn an OS facility into instantaneous user/system/idle percentages.

mod command;
mod proc_stat;

pub use command::{CommandReader, DEFAULT_COMMAND, parse_usage_line};
pub use proc_stat::{CpuTimes, ProcStatReader};

use serde::Deserialize;
use std::sync::Arc;

use crate::error::ReadError;
use crate::models::CpuReading;

/// Blocking source of CPU readings. Called from `spawn_blocking` by the collector.
pub trait MetricReader: Send + Sync {
    fn read(&self) -> Result<CpuReading, ReadError>;

    fn name(&self) -> &'static str;
}

/// Which reader the daemon builds from config.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReaderKind {
    ProcStat,
    Command,
}

impl Default for ReaderKind {
    fn default() -> Self {
        if cfg!(target_os = "linux") {
            ReaderKind::ProcStat
        } else {
            ReaderKind::Command
        }
    }
}

pub fn build(kind: ReaderKind, command: &str) -> Arc<dyn MetricReader> {
    match kind {
        ReaderKind::ProcStat => Arc::new(ProcStatReader::new()),
        ReaderKind::Command => Arc::new(CommandReader::new(command)),
    }
}

/// Runs `reader.read()` on the blocking pool.
pub async fn read_blocking(reader: Arc<dyn MetricReader>) -> Result<CpuReading, ReadError> {
    tokio::task::spawn_blocking(move || reader.read())
        .await
        .map_err(|e| ReadError::Join(e.to_string()))?
}
