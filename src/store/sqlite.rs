// SQLite sample log. One row per sample; recorded_at is stored as epoch millis of the naive
// local timestamp (see models::timefmt) so range scans use the index directly.

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use std::path::Path;
use std::str::FromStr;
use tracing::instrument;

use super::SampleStore;
use crate::error::StorageError;
use crate::models::{Sample, timefmt};

pub struct SqliteSampleStore {
    pool: SqlitePool,
}

impl SqliteSampleStore {
    /// Connect to SQLite at `path`, create parent dir and DB if missing, enable WAL + pragmas.
    pub async fn connect(path: &str, max_pool_size: u32) -> Result<Self, StorageError> {
        if let Some(parent) = Path::new(path).parent() {
            std::fs::create_dir_all(parent)?;
        }
        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}", path))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_secs(5))
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal);
        let pool = SqlitePoolOptions::new()
            .max_connections(max_pool_size)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    /// Private in-memory database. Single connection, since every SQLite connection to
    /// `:memory:` opens its own database.
    pub async fn open_in_memory() -> Result<Self, StorageError> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(opts)
            .await?;
        Ok(Self { pool })
    }

    pub async fn init(&self) -> Result<(), StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS cpu_usage_log (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_usage REAL NOT NULL,
                system_usage REAL NOT NULL,
                idle_usage REAL NOT NULL,
                recorded_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_cpu_usage_recorded_at ON cpu_usage_log(recorded_at)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(repo = "samples", operation = "count"))]
    pub async fn count(&self) -> Result<u64, StorageError> {
        let n = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM cpu_usage_log")
            .fetch_one(&self.pool)
            .await?;
        Ok(n.max(0) as u64)
    }

    /// Delete samples recorded strictly before `cutoff`. Retention maintenance only; the
    /// collection and query paths never delete.
    #[instrument(skip(self), fields(repo = "samples", operation = "prune_before"))]
    pub async fn prune_before(&self, cutoff: NaiveDateTime) -> Result<u64, StorageError> {
        let r = sqlx::query("DELETE FROM cpu_usage_log WHERE recorded_at < $1")
            .bind(timefmt::to_epoch_millis(&cutoff))
            .execute(&self.pool)
            .await?;
        Ok(r.rows_affected())
    }

    /// Reclaim space after deletes (run periodically after pruning).
    #[instrument(skip(self), fields(repo = "samples", operation = "vacuum"))]
    pub async fn vacuum(&self) -> Result<(), StorageError> {
        sqlx::query("VACUUM").execute(&self.pool).await?;
        Ok(())
    }

    fn parse_sample_row(row: &SqliteRow) -> Result<Sample, StorageError> {
        let recorded_ms: i64 = row.try_get("recorded_at")?;
        let recorded_at = timefmt::from_epoch_millis(recorded_ms).ok_or_else(|| {
            StorageError::Corrupt(format!("recorded_at {recorded_ms} out of range"))
        })?;
        Ok(Sample {
            user_usage: row.try_get("user_usage")?,
            system_usage: row.try_get("system_usage")?,
            idle_usage: row.try_get("idle_usage")?,
            recorded_at,
        })
    }
}

#[async_trait]
impl SampleStore for SqliteSampleStore {
    #[instrument(
        skip(self, sample),
        fields(repo = "samples", operation = "append", recorded_at = %sample.recorded_at)
    )]
    async fn append(&self, sample: &Sample) -> Result<(), StorageError> {
        sqlx::query(
            "INSERT INTO cpu_usage_log (user_usage, system_usage, idle_usage, recorded_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(sample.user_usage)
        .bind(sample.system_usage)
        .bind(sample.idle_usage)
        .bind(timefmt::to_epoch_millis(&sample.recorded_at))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(repo = "samples", operation = "range_query"))]
    async fn range_query(
        &self,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Sample>, StorageError> {
        let rows = sqlx::query(
            "SELECT user_usage, system_usage, idle_usage, recorded_at
             FROM cpu_usage_log WHERE recorded_at >= $1 AND recorded_at <= $2
             ORDER BY recorded_at ASC, id ASC",
        )
        .bind(timefmt::to_epoch_millis(&start))
        .bind(timefmt::to_epoch_millis(&end))
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(Self::parse_sample_row(&row)?);
        }
        Ok(out)
    }
}
