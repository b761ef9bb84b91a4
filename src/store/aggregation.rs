// Pure rollup logic: group samples by truncated time key, then min/max/avg per field.
// DB access stays in the store backends.

use std::collections::BTreeMap;

use crate::models::{BucketSummary, Granularity, Sample, UsageStats};

/// Buckets `samples` by `granularity`. Output is sorted ascending by key (bucket keys sort
/// lexically in time order) and contains no empty buckets. Input order does not matter.
pub fn summarize(samples: &[Sample], granularity: Granularity) -> Vec<BucketSummary> {
    let mut buckets: BTreeMap<String, Bucket> = BTreeMap::new();
    for s in samples {
        buckets
            .entry(granularity.bucket_key(&s.recorded_at))
            .or_default()
            .push(s);
    }
    buckets
        .into_iter()
        .map(|(bucket_key, b)| BucketSummary {
            bucket_key,
            user_usage: b.user.finish(),
            system_usage: b.system.finish(),
            idle_usage: b.idle.finish(),
        })
        .collect()
}

#[derive(Default)]
struct Bucket {
    user: Accumulator,
    system: Accumulator,
    idle: Accumulator,
}

impl Bucket {
    fn push(&mut self, s: &Sample) {
        self.user.push(s.user_usage);
        self.system.push(s.system_usage);
        self.idle.push(s.idle_usage);
    }
}

struct Accumulator {
    count: usize,
    sum: f64,
    min: f64,
    max: f64,
}

impl Default for Accumulator {
    fn default() -> Self {
        Self {
            count: 0,
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        }
    }
}

impl Accumulator {
    fn push(&mut self, v: f64) {
        self.count += 1;
        self.sum += v;
        self.min = self.min.min(v);
        self.max = self.max.max(v);
    }

    /// Only called on non-empty buckets. Rounding can push avg past an exact bound, so it is
    /// clamped back into `[min, max]`. `f64::min`/`max` skip NaN, so a bucket of only NaN
    /// values never moves the bounds; it reports NaN for all three.
    fn finish(&self) -> UsageStats {
        let avg = round2(self.sum / self.count as f64);
        if self.min > self.max {
            return UsageStats {
                min: f64::NAN,
                max: f64::NAN,
                avg: f64::NAN,
            };
        }
        UsageStats {
            min: self.min,
            max: self.max,
            avg: if avg.is_nan() {
                avg
            } else {
                avg.clamp(self.min, self.max)
            },
        }
    }
}

/// Round half away from zero to 2 decimal places.
pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}
