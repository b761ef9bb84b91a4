// Domain models: samples, rollup summaries, timestamp formats.

mod sample;
mod summary;
pub mod timefmt;

pub use sample::{CpuReading, Sample};
pub use summary::{BucketSummary, Granularity, UsageStats};
