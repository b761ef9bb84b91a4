// Static host identity via sysinfo; read once at startup and served at GET /api/info.

use serde::{Deserialize, Serialize};
use sysinfo::System;
use tracing::instrument;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostInfo {
    pub os_name: String,
    pub os_version: String,
    pub host_name: String,
    pub cpu_model: String,
    pub physical_cores: u32,
    pub logical_cores: u32,
}

#[instrument(fields(operation = "read_host_info"))]
pub async fn read_host_info() -> anyhow::Result<HostInfo> {
    tokio::task::spawn_blocking(|| {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        let cpu_model = read_cpu_model_linux()
            .or_else(|| {
                sys.cpus()
                    .first()
                    .map(|c| c.brand().trim().to_string())
                    .filter(|s| !s.is_empty())
            })
            .unwrap_or_else(|| "Unknown".into());
        HostInfo {
            os_name: System::name().unwrap_or_else(|| std::env::consts::OS.into()),
            os_version: System::os_version().unwrap_or_default(),
            host_name: System::host_name().unwrap_or_default(),
            cpu_model,
            physical_cores: System::physical_core_count().unwrap_or(0) as u32,
            logical_cores: sys.cpus().len() as u32,
        }
    })
    .await
    .map_err(|e| anyhow::anyhow!("host info task join: {}", e))
}

/// First "model name" from /proc/cpuinfo (Linux); sysinfo sometimes reports an empty brand.
fn read_cpu_model_linux() -> Option<String> {
    #[cfg(target_os = "linux")]
    {
        std::fs::read_to_string("/proc/cpuinfo")
            .ok()
            .and_then(|content| parse_cpu_model(&content))
    }
    #[cfg(not(target_os = "linux"))]
    None
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn parse_cpu_model(cpuinfo: &str) -> Option<String> {
    cpuinfo
        .lines()
        .find(|l| l.starts_with("model name"))
        .and_then(|l| l.split_once(':'))
        .map(|(_, v)| v.trim().to_string())
        .filter(|s| !s.is_empty())
}
