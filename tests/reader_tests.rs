// Metric reader tests against real shell commands and /proc/stat

use cpumonitor::error::ReadError;
use cpumonitor::models::CpuReading;
use cpumonitor::reader::{self, CommandReader, MetricReader, ReaderKind};
use std::sync::Arc;

#[test]
fn command_reader_parses_first_line() {
    let r = CommandReader::new(r#"echo "5.0% 3.0% 92.0%"; echo "1% 1% 98%""#);
    assert_eq!(r.read().unwrap(), CpuReading::new(5.0, 3.0, 92.0));
    assert_eq!(r.name(), "command");
}

#[test]
fn command_reader_skips_blank_lines() {
    let r = CommandReader::new(r#"echo; echo "  "; echo "12.5% 7.5% 80.0%""#);
    assert_eq!(r.read().unwrap(), CpuReading::new(12.5, 7.5, 80.0));
}

#[test]
fn command_reader_reports_non_zero_exit() {
    let r = CommandReader::new("exit 1");
    assert!(matches!(r.read(), Err(ReadError::CommandFailed { .. })));
}

#[test]
fn command_reader_reports_empty_output() {
    let r = CommandReader::new("true");
    assert!(matches!(r.read(), Err(ReadError::NoOutput)));
}

#[test]
fn command_reader_reports_unparsable_output() {
    let r = CommandReader::new("echo CPU usage unavailable");
    assert!(matches!(r.read(), Err(ReadError::InvalidNumber { .. })));
}

#[test]
fn command_reader_rejects_nan_and_infinite_values() {
    let r = CommandReader::new(r#"echo "NaN% 10% 80%""#);
    assert!(matches!(
        r.read(),
        Err(ReadError::InvalidNumber { field: "user", .. })
    ));
    let r = CommandReader::new(r#"echo "10% inf% 80%""#);
    assert!(matches!(
        r.read(),
        Err(ReadError::InvalidNumber { field: "system", .. })
    ));
}

#[tokio::test]
async fn read_blocking_runs_reader_off_the_runtime() {
    let r: Arc<dyn MetricReader> = Arc::new(CommandReader::new("echo 1% 2% 97%"));
    let reading = reader::read_blocking(r).await.unwrap();
    assert_eq!(reading, CpuReading::new(1.0, 2.0, 97.0));
}

#[test]
fn build_selects_reader_kind() {
    assert_eq!(reader::build(ReaderKind::Command, "true").name(), "command");
    assert_eq!(reader::build(ReaderKind::ProcStat, "").name(), "proc_stat");
}

#[cfg(target_os = "linux")]
#[test]
fn proc_stat_reader_reads_live_percentages() {
    let r = reader::build(ReaderKind::ProcStat, "");
    for _ in 0..2 {
        std::thread::sleep(std::time::Duration::from_millis(100));
        let reading = r.read().unwrap();
        for v in [reading.user, reading.system, reading.idle] {
            assert!((0.0..=100.0).contains(&v), "{:?}", reading);
        }
        assert!((reading.total() - 100.0).abs() < 0.05, "{:?}", reading);
    }
}
