use anyhow::Result;
use cpumonitor::*;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::FormatTime;

use collector::{Collector, CollectorScheduler, SchedulerConfig};
use store::{SampleStore, SqliteSampleStore};

/// Longest wait for an in-flight collection tick on shutdown.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(10);

struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(
            w,
            "{}",
            chrono::Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z")
        )
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_timer(LocalTimer)
        .with_env_filter(filter)
        .init();

    let app_config = config::AppConfig::load()?;

    let host_info = Arc::new(host_info::read_host_info().await?);
    tracing::info!(
        os = %host_info.os_name,
        os_version = %host_info.os_version,
        host = %host_info.host_name,
        cpu = %host_info.cpu_model,
        logical_cores = host_info.logical_cores,
        "host info"
    );

    let sqlite = Arc::new(
        SqliteSampleStore::connect(&app_config.database.path, app_config.database.max_pool_size)
            .await?,
    );
    sqlite.init().await?;
    let store: Arc<dyn SampleStore> = sqlite.clone();

    let reader = reader::build(app_config.collector.reader, &app_config.collector.command);
    let validator = app_config.collector.validator();
    tracing::info!(
        reader = reader.name(),
        validation = ?validator.mode(),
        schedule = %app_config.collector.schedule,
        "starting collector"
    );
    let collector = Arc::new(Collector::new(reader, store.clone(), validator));
    let scheduler = CollectorScheduler::start(
        collector,
        SchedulerConfig {
            cadence: app_config.collector.cadence()?,
            stats_log_interval: Duration::from_secs(app_config.collector.stats_log_interval_secs),
        },
    );

    let maintenance = match app_config.database.vacuum_schedule.as_deref() {
        Some(schedule) => Some(tokio::spawn(maintenance::run(
            sqlite.clone(),
            collector::Cadence::cron(schedule)?,
            app_config.database.retention_days,
        ))),
        None => None,
    };

    let query = Arc::new(query::QueryService::with_windows(
        store,
        app_config.query.windows(),
    ));
    let app = routes::app(query, host_info);
    let addr = format!("{}:{}", app_config.server.host, app_config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Received shutdown signal");
    if let Some(handle) = maintenance {
        handle.abort();
    }
    let stats = scheduler.stop_within(SHUTDOWN_GRACE).await;
    tracing::info!(
        ticks_ok = stats.ticks_ok,
        ticks_failed = stats.ticks_failed,
        ticks_skipped = stats.ticks_skipped,
        "collector stopped"
    );

    Ok(())
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        let mut sigterm =
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(_) => {
                    let _ = tokio::signal::ctrl_c().await;
                    return;
                }
            };
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {}
            _ = sigterm.recv() => {}
        }
    }
    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
    }
}
