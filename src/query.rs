// Read side: default windows for omitted bounds, delegation to the store, one error type.

use chrono::{Days, Months, NaiveDate, NaiveDateTime, NaiveTime};
use std::sync::Arc;
use tracing::{error, info, instrument};

use crate::error::QueryError;
use crate::models::{BucketSummary, Granularity, Sample, timefmt};
use crate::store::SampleStore;

/// Look-back used when a caller omits either bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultWindows {
    pub minute_days: u64,
    pub hourly_months: u32,
    pub daily_months: u32,
}

impl Default for DefaultWindows {
    fn default() -> Self {
        Self {
            minute_days: 7,
            hourly_months: 3,
            daily_months: 12,
        }
    }
}

pub struct QueryService {
    store: Arc<dyn SampleStore>,
    windows: DefaultWindows,
    clock: fn() -> NaiveDateTime,
}

impl QueryService {
    pub fn new(store: Arc<dyn SampleStore>) -> Self {
        Self::with_windows(store, DefaultWindows::default())
    }

    pub fn with_windows(store: Arc<dyn SampleStore>, windows: DefaultWindows) -> Self {
        Self {
            store,
            windows,
            clock: timefmt::local_now,
        }
    }

    /// Replace the wall clock used for default windows.
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    pub fn windows(&self) -> DefaultWindows {
        self.windows
    }

    /// Raw samples. Missing either bound means `[now - minute_days, now]`.
    #[instrument(skip(self), fields(operation = "get_minute_usage"))]
    pub async fn get_minute_usage(
        &self,
        start: Option<NaiveDateTime>,
        end: Option<NaiveDateTime>,
    ) -> Result<Vec<Sample>, QueryError> {
        let (start, end) = match (start, end) {
            (Some(start), Some(end)) => (start, end),
            _ => {
                let now = (self.clock)();
                let start = now
                    .checked_sub_days(Days::new(self.windows.minute_days))
                    .unwrap_or(NaiveDateTime::MIN);
                (start, now)
            }
        };
        info!(%start, %end, "Fetching minute-level CPU usage data");
        self.store.range_query(start, end).await.map_err(|e| {
            error!(%start, %end, error = %e, "Failed to fetch minute-level CPU usage data");
            QueryError::new("Error occurred while fetching minute CPU usage data", e)
        })
    }

    /// Hourly rollups over whole days `[start_date 00:00, end_date 23:59:59.999]`.
    /// Missing either bound means `[today - hourly_months, today]`.
    #[instrument(skip(self), fields(operation = "get_hourly_usage"))]
    pub async fn get_hourly_usage(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<BucketSummary>, QueryError> {
        let (start, end) = self.date_window(start_date, end_date, self.windows.hourly_months);
        self.aggregate(Granularity::Hour, start, end).await
    }

    /// Daily rollups. Missing either bound means `[today - daily_months, today]`.
    #[instrument(skip(self), fields(operation = "get_daily_usage"))]
    pub async fn get_daily_usage(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<BucketSummary>, QueryError> {
        let (start, end) = self.date_window(start_date, end_date, self.windows.daily_months);
        self.aggregate(Granularity::Day, start, end).await
    }

    async fn aggregate(
        &self,
        granularity: Granularity,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<BucketSummary>, QueryError> {
        info!(%granularity, %start, %end, "Fetching aggregated CPU usage data");
        self.store
            .aggregate(granularity, start, end)
            .await
            .map_err(|e| {
                error!(
                    %granularity, %start, %end, error = %e,
                    "Failed to fetch aggregated CPU usage data"
                );
                let message = match granularity {
                    Granularity::Hour => "Error occurred while fetching hourly CPU usage data",
                    Granularity::Day => "Error occurred while fetching daily CPU usage data",
                };
                QueryError::new(message, e)
            })
    }

    fn date_window(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
        lookback_months: u32,
    ) -> (NaiveDateTime, NaiveDateTime) {
        let (start_date, end_date) = match (start_date, end_date) {
            (Some(s), Some(e)) => (s, e),
            _ => {
                let today = (self.clock)().date();
                let start = today
                    .checked_sub_months(Months::new(lookback_months))
                    .unwrap_or(NaiveDate::MIN);
                (start, today)
            }
        };
        day_bounds(start_date, end_date)
    }
}

/// `[start 00:00:00.000, end 23:59:59.999]`.
pub fn day_bounds(start: NaiveDate, end: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
    let end_of_day = NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN);
    (start.and_time(NaiveTime::MIN), end.and_time(end_of_day))
}
