//! Monitor configuration

use anyhow::{bail, Context, Result};
use obd_stream::StreamConfig;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;

/// Environment variable prefix, e.g. `OBD_MONITOR__DEVICE=/dev/ttyUSB1`
const ENV_PREFIX: &str = "OBD_MONITOR";

/// Configuration file looked up when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "obd-monitor";

/// Monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Serial port device path
    pub device: String,
    /// Baud rate for serial communication
    pub baud_rate: u32,
    /// Mode 01 PIDs polled round-robin (two hex digits each)
    pub pids: Vec<String>,
    /// AT commands sent once before polling
    pub init_commands: Vec<String>,
    /// Max tracing level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit logs as JSON
    pub log_json: bool,
    /// Prometheus exporter listen address
    pub metrics_addr: Option<SocketAddr>,
    /// Stream parser settings
    pub stream: StreamConfig,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: 38400,
            pids: ["0C", "0D", "05", "04"].map(String::from).to_vec(),
            init_commands: ["ATZ", "ATE0", "ATL0", "ATSP0"].map(String::from).to_vec(),
            log_level: "info".to_string(),
            log_json: false,
            metrics_addr: None,
            stream: StreamConfig::default(),
        }
    }
}

impl MonitorConfig {
    /// Load from an optional file layered under `OBD_MONITOR__*` variables
    pub fn load(path: Option<&str>) -> Result<Self> {
        let file = path.unwrap_or(DEFAULT_CONFIG_FILE);
        let settings = config::Config::builder()
            .add_source(config::File::with_name(file).required(path.is_some()))
            .add_source(environment())
            .build()
            .with_context(|| format!("Failed to read configuration from {}", file))?;

        let config: Self = settings
            .try_deserialize()
            .context("Failed to parse configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Check PIDs, baud rate and parser settings
    pub fn validate(&self) -> Result<()> {
        if self.baud_rate == 0 {
            bail!("baud_rate must be positive");
        }
        if self.pids.is_empty() {
            bail!("at least one PID must be configured");
        }
        for pid in &self.pids {
            if pid.len() != 2 || !pid.chars().all(|c| c.is_ascii_hexdigit()) {
                bail!("PID {:?} is not two hex digits", pid);
            }
        }
        self.stream.validate()?;
        Ok(())
    }
}

/// `OBD_MONITOR__*` variables; list keys take comma separated values
fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("pids")
        .with_list_parse_key("init_commands")
        .try_parsing(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use obd_stream::EmitOrder;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.baud_rate, 38400);
        assert_eq!(config.pids.len(), 4);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_toml() {
        let settings = config::Config::builder()
            .add_source(config::File::from_str(
                r#"
                device = "/dev/ttyACM0"
                pids = ["0c", "11"]

                [stream]
                emit_order = "completion_order"
                "#,
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();
        let config: MonitorConfig = settings.try_deserialize().unwrap();

        assert_eq!(config.device, "/dev/ttyACM0");
        assert_eq!(config.pids, vec!["0c", "11"]);
        assert_eq!(config.baud_rate, 38400);
        assert_eq!(config.stream.emit_order, EmitOrder::CompletionOrder);
        assert_eq!(config.stream.prompt, ">");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_pid() {
        let config = MonitorConfig {
            pids: vec!["0C".to_string(), "RPM".to_string()],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_missing_explicit_file() {
        assert!(MonitorConfig::load(Some("/nonexistent/obd-monitor.toml")).is_err());
    }

    #[test]
    fn test_env_lists() {
        let vars: config::Map<String, String> = [
            ("OBD_MONITOR__PIDS", "0C,11"),
            ("OBD_MONITOR__INIT_COMMANDS", "ATZ,ATE0"),
            ("OBD_MONITOR__BAUD_RATE", "115200"),
            ("OBD_MONITOR__STREAM__EMIT_ORDER", "completion_order"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let settings = config::Config::builder()
            .add_source(environment().source(Some(vars)))
            .build()
            .unwrap();
        let config: MonitorConfig = settings.try_deserialize().unwrap();

        assert_eq!(config.pids, vec!["0C", "11"]);
        assert_eq!(config.init_commands, vec!["ATZ", "ATE0"]);
        assert_eq!(config.baud_rate, 115200);
        assert_eq!(config.stream.emit_order, EmitOrder::CompletionOrder);
        assert!(config.validate().is_ok());
    }
}
