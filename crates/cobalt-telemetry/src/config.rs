//! Telemetry configuration from environment variables.

use serde::Deserialize;
use std::env;

/// Configuration for log output.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Service name attached to startup and shutdown logs
    pub service_name: String,

    /// `EnvFilter` directives (e.g. `info`, `cobalt_consensus=debug`)
    pub log_level: String,

    /// Whether to emit JSON formatted logs
    pub json_logs: bool,

    /// Whether to colour console output
    pub ansi: bool,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            service_name: "cobalt".to_string(),
            log_level: "info".to_string(),
            json_logs: false,
            ansi: true,
        }
    }
}

impl TelemetryConfig {
    /// Create configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `COBALT_SERVICE_NAME`: Service name (default: cobalt)
    /// - `COBALT_LOG_LEVEL` or `RUST_LOG`: Log filter (default: info)
    /// - `COBALT_JSON_LOGS`: Enable JSON logs (default: false)
    pub fn from_env() -> Self {
        Self::default().with_env_overrides()
    }

    /// Apply any telemetry environment variables on top of `self`.
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(name) = env::var("COBALT_SERVICE_NAME") {
            self.service_name = name;
        }
        if let Ok(level) = env::var("COBALT_LOG_LEVEL").or_else(|_| env::var("RUST_LOG")) {
            self.log_level = level;
        }
        if let Ok(json) = env::var("COBALT_JSON_LOGS") {
            self.json_logs = parse_flag(&json);
        }
        self
    }
}

fn parse_flag(value: &str) -> bool {
    value.eq_ignore_ascii_case("true") || value == "1"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = TelemetryConfig::default();
        assert_eq!(config.service_name, "cobalt");
        assert_eq!(config.log_level, "info");
        assert!(!config.json_logs);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TelemetryConfig = toml::from_str("json_logs = true").unwrap();
        assert!(config.json_logs);
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn test_flag_parsing() {
        assert!(parse_flag("TRUE"));
        assert!(parse_flag("1"));
        assert!(!parse_flag("yes"));
        assert!(!parse_flag("0"));
    }
}
