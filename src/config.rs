use serde::Deserialize;

use crate::collector::{Cadence, EVERY_MINUTE};
use crate::query::DefaultWindows;
use crate::reader::{DEFAULT_COMMAND, ReaderKind};
use crate::validator::{ValidationMode, Validator};

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub collector: CollectorConfig,
    #[serde(default)]
    pub query: QueryConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
    pub max_pool_size: u32,
    /// Prune samples older than this many days. Unset keeps everything.
    #[serde(default)]
    pub retention_days: Option<u32>,
    /// Cron expression (local time) for prune + VACUUM, e.g. "0 0 3 * * *" = 03:00 daily.
    #[serde(default)]
    pub vacuum_schedule: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollectorConfig {
    /// Cron expression with a seconds field. Default fires at :00 of every minute.
    pub schedule: String,
    pub reader: ReaderKind,
    /// Shell command for the `command` reader.
    pub command: String,
    pub validation: ValidationMode,
    /// Strict mode: allowed |user + system + idle - 100|.
    pub sum_tolerance: f64,
    /// How often to log tick counters at INFO level.
    pub stats_log_interval_secs: u64,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            schedule: EVERY_MINUTE.into(),
            reader: ReaderKind::default(),
            command: DEFAULT_COMMAND.into(),
            validation: ValidationMode::Lenient,
            sum_tolerance: Validator::DEFAULT_SUM_TOLERANCE,
            stats_log_interval_secs: 3600,
        }
    }
}

impl CollectorConfig {
    pub fn validator(&self) -> Validator {
        Validator::new(self.validation, self.sum_tolerance)
    }

    pub fn cadence(&self) -> anyhow::Result<Cadence> {
        Cadence::cron(&self.schedule)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub minute_window_days: u64,
    pub hourly_window_months: u32,
    pub daily_window_months: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        let w = DefaultWindows::default();
        Self {
            minute_window_days: w.minute_days,
            hourly_window_months: w.hourly_months,
            daily_window_months: w.daily_months,
        }
    }
}

impl QueryConfig {
    pub fn windows(&self) -> DefaultWindows {
        DefaultWindows {
            minute_days: self.minute_window_days,
            hourly_months: self.hourly_window_months,
            daily_months: self.daily_window_months,
        }
    }
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.database.path.is_empty(),
            "database.path must be non-empty"
        );
        anyhow::ensure!(
            self.database.max_pool_size > 0,
            "database.max_pool_size must be > 0, got {}",
            self.database.max_pool_size
        );
        if let Some(days) = self.database.retention_days {
            anyhow::ensure!(
                days > 0,
                "database.retention_days must be > 0 when set, got {}",
                days
            );
        }
        if let Some(ref schedule) = self.database.vacuum_schedule {
            Cadence::cron(schedule)
                .map_err(|e| anyhow::anyhow!("database.vacuum_schedule: {}", e))?;
        }
        self.collector
            .cadence()
            .map_err(|e| anyhow::anyhow!("collector.schedule: {}", e))?;
        anyhow::ensure!(
            self.collector.reader != ReaderKind::Command
                || !self.collector.command.trim().is_empty(),
            "collector.command must be non-empty when collector.reader = \"command\""
        );
        anyhow::ensure!(
            self.collector.sum_tolerance.is_finite() && self.collector.sum_tolerance >= 0.0,
            "collector.sum_tolerance must be >= 0, got {}",
            self.collector.sum_tolerance
        );
        anyhow::ensure!(
            self.collector.stats_log_interval_secs > 0,
            "collector.stats_log_interval_secs must be > 0, got {}",
            self.collector.stats_log_interval_secs
        );
        anyhow::ensure!(
            self.query.minute_window_days > 0,
            "query.minute_window_days must be > 0, got {}",
            self.query.minute_window_days
        );
        anyhow::ensure!(
            self.query.hourly_window_months > 0,
            "query.hourly_window_months must be > 0, got {}",
            self.query.hourly_window_months
        );
        anyhow::ensure!(
            self.query.daily_window_months > 0,
            "query.daily_window_months must be > 0, got {}",
            self.query.daily_window_months
        );
        Ok(())
    }
}
