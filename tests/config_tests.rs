// Config loading and validation tests

use cpumonitor::collector::EVERY_MINUTE;
use cpumonitor::config::AppConfig;
use cpumonitor::query::DefaultWindows;
use cpumonitor::reader::{DEFAULT_COMMAND, ReaderKind};
use cpumonitor::validator::ValidationMode;

const VALID_CONFIG: &str = r#"
[server]
port = 8081
host = "0.0.0.0"

[database]
path = "data/cpu_usage.db"
max_pool_size = 4
retention_days = 400
vacuum_schedule = "0 0 3 * * *"

[collector]
schedule = "0 * * * * *"
reader = "command"
command = "echo '1% 2% 97%'"
validation = "strict"
sum_tolerance = 0.5
stats_log_interval_secs = 60

[query]
minute_window_days = 2
hourly_window_months = 1
daily_window_months = 6
"#;

const MINIMAL_CONFIG: &str = r#"
[server]
port = 8081
host = "127.0.0.1"

[database]
path = "data/cpu_usage.db"
max_pool_size = 4
"#;

#[test]
fn test_config_loads_from_str() {
    let config = AppConfig::load_from_str(VALID_CONFIG).expect("load_from_str");
    assert_eq!(config.server.port, 8081);
    assert_eq!(config.server.host, "0.0.0.0");
    assert_eq!(config.database.path, "data/cpu_usage.db");
    assert_eq!(config.database.retention_days, Some(400));
    assert_eq!(config.database.vacuum_schedule.as_deref(), Some("0 0 3 * * *"));
    assert_eq!(config.collector.reader, ReaderKind::Command);
    assert_eq!(config.collector.validation, ValidationMode::Strict);
    assert_eq!(config.collector.validator().mode(), ValidationMode::Strict);
    assert_eq!(config.collector.stats_log_interval_secs, 60);
    assert_eq!(
        config.query.windows(),
        DefaultWindows {
            minute_days: 2,
            hourly_months: 1,
            daily_months: 6,
        }
    );
}

#[test]
fn test_optional_sections_take_defaults() {
    let config = AppConfig::load_from_str(MINIMAL_CONFIG).expect("load_from_str");
    assert_eq!(config.database.retention_days, None);
    assert_eq!(config.database.vacuum_schedule, None);
    assert_eq!(config.collector.schedule, EVERY_MINUTE);
    assert_eq!(config.collector.command, DEFAULT_COMMAND);
    assert_eq!(config.collector.reader, ReaderKind::default());
    assert_eq!(config.collector.validation, ValidationMode::Lenient);
    assert_eq!(config.collector.sum_tolerance, 1.0);
    assert_eq!(config.query.windows(), DefaultWindows::default());
    assert!(config.collector.cadence().is_ok());
}

#[test]
fn test_config_validation_rejects_invalid_port() {
    let bad = VALID_CONFIG.replace("port = 8081", "port = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("server.port"));
}

#[test]
fn test_config_validation_rejects_empty_db_path() {
    let bad = VALID_CONFIG.replace("path = \"data/cpu_usage.db\"", "path = \"\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("database.path"));
}

#[test]
fn test_config_validation_rejects_max_pool_size_zero() {
    let bad = VALID_CONFIG.replace("max_pool_size = 4", "max_pool_size = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("max_pool_size"));
}

#[test]
fn test_config_validation_rejects_retention_days_zero() {
    let bad = VALID_CONFIG.replace("retention_days = 400", "retention_days = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("retention_days"));
}

#[test]
fn test_config_validation_rejects_bad_vacuum_schedule() {
    let bad = VALID_CONFIG.replace("\"0 0 3 * * *\"", "\"every night\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("database.vacuum_schedule"));
}

#[test]
fn test_config_validation_rejects_bad_collector_schedule() {
    let bad = VALID_CONFIG.replace("schedule = \"0 * * * * *\"", "schedule = \"* *\"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("collector.schedule"));
}

#[test]
fn test_config_validation_rejects_empty_command_for_command_reader() {
    let bad = VALID_CONFIG.replace("command = \"echo '1% 2% 97%'\"", "command = \"  \"");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("collector.command"));
}

#[test]
fn test_config_validation_rejects_negative_sum_tolerance() {
    let bad = VALID_CONFIG.replace("sum_tolerance = 0.5", "sum_tolerance = -1.0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("sum_tolerance"));
}

#[test]
fn test_config_validation_rejects_stats_log_interval_zero() {
    let bad = VALID_CONFIG.replace("stats_log_interval_secs = 60", "stats_log_interval_secs = 0");
    let err = AppConfig::load_from_str(&bad).unwrap_err();
    assert!(err.to_string().contains("stats_log_interval_secs"));
}

#[test]
fn test_config_validation_rejects_zero_query_windows() {
    for (from, to, field) in [
        ("minute_window_days = 2", "minute_window_days = 0", "minute_window_days"),
        ("hourly_window_months = 1", "hourly_window_months = 0", "hourly_window_months"),
        ("daily_window_months = 6", "daily_window_months = 0", "daily_window_months"),
    ] {
        let bad = VALID_CONFIG.replace(from, to);
        let err = AppConfig::load_from_str(&bad).unwrap_err();
        assert!(err.to_string().contains(field), "{field}: {err}");
    }
}

#[test]
fn test_config_rejects_unknown_reader() {
    let bad = VALID_CONFIG.replace("reader = \"command\"", "reader = \"wmi\"");
    assert!(AppConfig::load_from_str(&bad).is_err());
}
