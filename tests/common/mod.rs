// Shared test helpers: timestamps, samples, scripted readers, fault-injecting store.
#![allow(dead_code)]

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use cpumonitor::error::{ReadError, StorageError};
use cpumonitor::models::{CpuReading, Sample};
use cpumonitor::reader::MetricReader;
use cpumonitor::store::{MemorySampleStore, SampleStore};
use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::time::Duration;

pub fn at(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, mo, d)
        .unwrap()
        .and_hms_opt(h, mi, s)
        .unwrap()
}

pub fn sample(user: f64, system: f64, idle: f64, recorded_at: NaiveDateTime) -> Sample {
    Sample::new(CpuReading::new(user, system, idle), recorded_at)
}

/// Fixed "now" for query default-window tests: 2024-05-08T12:00:00.
pub fn fixed_now() -> NaiveDateTime {
    at(2024, 5, 8, 12, 0, 0)
}

/// Returns queued results in order, then repeats `fallback`.
pub struct ScriptedReader {
    script: Mutex<VecDeque<Result<CpuReading, ReadError>>>,
    fallback: CpuReading,
    pub calls: AtomicU32,
}

impl ScriptedReader {
    pub fn always(reading: CpuReading) -> Self {
        Self::new(vec![], reading)
    }

    pub fn new(script: Vec<Result<CpuReading, ReadError>>, fallback: CpuReading) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicU32::new(0),
        }
    }
}

impl MetricReader for ScriptedReader {
    fn read(&self) -> Result<CpuReading, ReadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Ok(self.fallback))
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

/// Blocks for `delay` on every read and tracks how many reads overlap.
pub struct SlowReader {
    delay: Duration,
    active: AtomicUsize,
    pub max_concurrent: AtomicUsize,
    pub calls: AtomicU32,
}

impl SlowReader {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            active: AtomicUsize::new(0),
            max_concurrent: AtomicUsize::new(0),
            calls: AtomicU32::new(0),
        }
    }
}

impl MetricReader for SlowReader {
    fn read(&self) -> Result<CpuReading, ReadError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now_active = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_concurrent.fetch_max(now_active, Ordering::SeqCst);
        std::thread::sleep(self.delay);
        self.active.fetch_sub(1, Ordering::SeqCst);
        Ok(CpuReading::new(10.0, 10.0, 80.0))
    }

    fn name(&self) -> &'static str {
        "slow"
    }
}

/// In-memory store whose first `fail_appends` appends and every read (when `fail_reads`)
/// return a storage error.
pub struct FaultyStore {
    inner: MemorySampleStore,
    fail_appends: AtomicU32,
    fail_reads: bool,
    pub append_calls: AtomicU32,
}

impl FaultyStore {
    pub fn failing_appends(n: u32) -> Self {
        Self {
            inner: MemorySampleStore::new(),
            fail_appends: AtomicU32::new(n),
            fail_reads: false,
            append_calls: AtomicU32::new(0),
        }
    }

    pub fn failing_reads() -> Self {
        Self {
            inner: MemorySampleStore::new(),
            fail_appends: AtomicU32::new(0),
            fail_reads: true,
            append_calls: AtomicU32::new(0),
        }
    }

    pub fn stored(&self) -> usize {
        self.inner.len()
    }
}

fn injected() -> StorageError {
    StorageError::Io(std::io::Error::other("injected fault"))
}

#[async_trait]
impl SampleStore for FaultyStore {
    async fn append(&self, sample: &Sample) -> Result<(), StorageError> {
        self.append_calls.fetch_add(1, Ordering::SeqCst);
        let remaining = self.fail_appends.load(Ordering::SeqCst);
        if remaining > 0 {
            self.fail_appends.store(remaining - 1, Ordering::SeqCst);
            return Err(injected());
        }
        self.inner.append(sample).await
    }

    async fn range_query(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Sample>, StorageError> {
        if self.fail_reads {
            return Err(injected());
        }
        self.inner.range_query(start, end).await
    }
}
