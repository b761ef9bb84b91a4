// Store maintenance: optional retention prune followed by VACUUM, on a local-time schedule.
// Retention is not part of collection or querying; with no retention set only VACUUM runs.

use chrono::{Days, NaiveDateTime};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::collector::Cadence;
use crate::error::StorageError;
use crate::models::timefmt;
use crate::store::SqliteSampleStore;

/// Runs until the task is aborted.
#[instrument(skip(store, cadence))]
pub async fn run(store: Arc<SqliteSampleStore>, cadence: Cadence, retention_days: Option<u32>) {
    loop {
        let Some(delay) = cadence.next_delay() else {
            warn!("maintenance schedule has no future firings; stopping");
            return;
        };
        tokio::time::sleep(delay).await;
        match run_once(&store, retention_days, timefmt::local_now()).await {
            Ok(pruned) => info!(pruned, "maintenance complete"),
            Err(e) => warn!(error = %e, "maintenance failed"),
        }
    }
}

/// One pass: prune samples older than `now - retention_days` (if set), then VACUUM.
/// Returns the number of pruned rows.
pub async fn run_once(
    store: &SqliteSampleStore,
    retention_days: Option<u32>,
    now: NaiveDateTime,
) -> Result<u64, StorageError> {
    let pruned = match retention_days {
        Some(days) => match now.checked_sub_days(Days::new(u64::from(days))) {
            Some(cutoff) => store.prune_before(cutoff).await?,
            None => 0,
        },
        None => 0,
    };
    store.vacuum().await?;
    Ok(pruned)
}
