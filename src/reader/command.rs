// Shell-command reader: one output line of `value%` tokens for user, system, idle.

use std::process::Command;

use super::MetricReader;
use crate::error::ReadError;
use crate::models::CpuReading;

/// macOS `top` pipeline printing e.g. `5.12% 3.40% 91.47%`.
pub const DEFAULT_COMMAND: &str = r#"top -l 1 | grep -E "^CPU" | awk '{print $3, $5, $7}'"#;

pub struct CommandReader {
    command: String,
}

impl CommandReader {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

impl Default for CommandReader {
    fn default() -> Self {
        Self::new(DEFAULT_COMMAND)
    }
}

impl MetricReader for CommandReader {
    fn read(&self) -> Result<CpuReading, ReadError> {
        let output = Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .output()
            .map_err(|source| ReadError::Spawn {
                command: self.command.clone(),
                source,
            })?;
        if !output.status.success() {
            return Err(ReadError::CommandFailed {
                status: output.status,
            });
        }
        let stdout = String::from_utf8_lossy(&output.stdout);
        let line = stdout
            .lines()
            .find(|l| !l.trim().is_empty())
            .ok_or(ReadError::NoOutput)?;
        parse_usage_line(line)
    }

    fn name(&self) -> &'static str {
        "command"
    }
}

/// Parses `user% system% idle%`. Extra trailing tokens are ignored.
pub fn parse_usage_line(line: &str) -> Result<CpuReading, ReadError> {
    let mut tokens = line.split_whitespace();
    let mut next = |field: &'static str| -> Result<f64, ReadError> {
        let token = tokens.next().ok_or(ReadError::MissingToken { field })?;
        // f64 parsing also accepts `NaN` and `inf`; neither is a usage percentage.
        token
            .trim_end_matches('%')
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite())
            .ok_or_else(|| ReadError::InvalidNumber {
                field,
                token: token.to_string(),
            })
    };
    let user = next("user")?;
    let system = next("system")?;
    let idle = next("idle")?;
    Ok(CpuReading::new(user, system, idle))
}
