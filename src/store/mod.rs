// Sample store: append-only ordered log with range reads and hourly/daily rollups.

pub mod aggregation;
mod memory;
mod sqlite;

pub use memory::MemorySampleStore;
pub use sqlite::SqliteSampleStore;

use async_trait::async_trait;
use chrono::NaiveDateTime;

use crate::error::StorageError;
use crate::models::{BucketSummary, Granularity, Sample};

/// Implementations must make each appended row visible atomically to concurrent readers.
#[async_trait]
pub trait SampleStore: Send + Sync {
    /// Durably records one sample. Not retried by callers.
    async fn append(&self, sample: &Sample) -> Result<(), StorageError>;

    /// Samples with `start <= recorded_at <= end`, ascending by `recorded_at`.
    async fn range_query(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Sample>, StorageError>;

    /// One summary per non-empty bucket in `[start, end]`, ascending by bucket key.
    /// Either the whole window aggregates or the call fails; no partial results.
    async fn aggregate(
        &self,
        granularity: Granularity,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<BucketSummary>, StorageError> {
        let samples = self.range_query(start, end).await?;
        Ok(aggregation::summarize(&samples, granularity))
    }
}
