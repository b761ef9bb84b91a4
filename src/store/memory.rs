// In-process store: a Vec kept sorted by recorded_at behind an RwLock.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use std::sync::RwLock;

use super::SampleStore;
use crate::error::StorageError;
use crate::models::Sample;

#[derive(Default)]
pub struct MemorySampleStore {
    samples: RwLock<Vec<Sample>>,
}

impl MemorySampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.samples
            .read()
            .map(|s| s.len())
            .unwrap_or_else(|e| e.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SampleStore for MemorySampleStore {
    async fn append(&self, sample: &Sample) -> Result<(), StorageError> {
        let mut samples = self.samples.write().map_err(|_| StorageError::Poisoned)?;
        // Equal timestamps keep insertion order.
        let idx = samples.partition_point(|s| s.recorded_at <= sample.recorded_at);
        samples.insert(idx, *sample);
        Ok(())
    }

    async fn range_query(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Sample>, StorageError> {
        if start > end {
            return Ok(Vec::new());
        }
        let samples = self.samples.read().map_err(|_| StorageError::Poisoned)?;
        let from = samples.partition_point(|s| s.recorded_at < start);
        let to = samples.partition_point(|s| s.recorded_at <= end);
        Ok(samples[from..to].to_vec())
    }
}
