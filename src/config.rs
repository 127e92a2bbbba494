//! # Configuration Module
//!
//! Handles loading and validating configuration from TOML files.

use serde::de::Error;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::Result;
use crate::ltm::decoder::{DecodeOptions, StatusFlagDecoding};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub serial: SerialConfig,

    #[serde(default)]
    pub parser: ParserConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Serial port configuration
#[derive(Debug, Deserialize, Clone)]
pub struct SerialConfig {
    /// Device path; empty means auto-detect
    #[serde(default)]
    pub port: String,

    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

/// Frame decoding configuration
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ParserConfig {
    #[serde(default)]
    pub status_flags: StatusFlagDecoding,
}

/// Telemetry recording configuration
#[derive(Debug, Deserialize, Clone)]
pub struct TelemetryConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub log_dir: String,

    #[serde(default = "default_max_records_per_file")]
    pub max_records_per_file: usize,

    #[serde(default = "default_max_files_to_keep")]
    pub max_files_to_keep: usize,

    #[serde(default = "default_log_format")]
    pub format: String,
}

/// Diagnostic logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for daily rolling log files; stderr only when unset
    #[serde(default)]
    pub directory: Option<String>,
}

// Default value functions
fn default_baud_rate() -> u32 { 9600 }
fn default_timeout_ms() -> u64 { 500 }

fn default_log_dir() -> String { "./telemetry".to_string() }
fn default_max_records_per_file() -> usize { 10000 }
fn default_max_files_to_keep() -> usize { 10 }
fn default_log_format() -> String { "jsonl".to_string() }

fn default_log_level() -> String { "info".to_string() }

/// Baud rates flight controllers offer for an LTM port
const SUPPORTED_BAUD_RATES: [u32; 8] = [1200, 2400, 4800, 9600, 19200, 38400, 57600, 115200];

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: String::new(),
            baud_rate: default_baud_rate(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            log_dir: default_log_dir(),
            max_records_per_file: default_max_records_per_file(),
            max_files_to_keep: default_max_files_to_keep(),
            format: default_log_format(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: None,
        }
    }
}

impl ParserConfig {
    pub fn decode_options(&self) -> DecodeOptions {
        DecodeOptions {
            status_flags: self.status_flags,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the configuration file
    ///
    /// # Returns
    ///
    /// * `Result<Config>` - Loaded and validated configuration
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - File cannot be read
    /// - TOML parsing fails
    /// - Validation fails
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ltm_telemetry::config::Config;
    ///
    /// let config = Config::load("config/default.toml")?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from a TOML string
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    ///
    /// # Errors
    ///
    /// Returns error if any configuration value is out of valid range
    pub fn validate(&self) -> Result<()> {
        if !SUPPORTED_BAUD_RATES.contains(&self.serial.baud_rate) {
            return Err(crate::error::LtmError::Config(
                toml::de::Error::custom(format!(
                    "baud_rate must be one of: {:?}",
                    SUPPORTED_BAUD_RATES
                ))
            ));
        }

        if self.serial.timeout_ms == 0 || self.serial.timeout_ms > 10000 {
            return Err(crate::error::LtmError::Config(
                toml::de::Error::custom("timeout_ms must be between 1 and 10000")
            ));
        }

        if self.telemetry.enabled && self.telemetry.log_dir.is_empty() {
            return Err(crate::error::LtmError::Config(
                toml::de::Error::custom("telemetry log_dir cannot be empty when enabled")
            ));
        }

        if self.telemetry.max_records_per_file == 0 {
            return Err(crate::error::LtmError::Config(
                toml::de::Error::custom("max_records_per_file must be greater than 0")
            ));
        }

        if self.telemetry.max_files_to_keep == 0 {
            return Err(crate::error::LtmError::Config(
                toml::de::Error::custom("max_files_to_keep must be greater than 0")
            ));
        }

        if self.telemetry.format != "jsonl" {
            return Err(crate::error::LtmError::Config(
                toml::de::Error::custom("telemetry format must be 'jsonl' (only supported format)")
            ));
        }

        if !LOG_LEVELS.contains(&self.logging.level.as_str()) {
            return Err(crate::error::LtmError::Config(
                toml::de::Error::custom(format!(
                    "logging level must be one of: {}",
                    LOG_LEVELS.join(", ")
                ))
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::LtmError;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.serial.baud_rate, 9600);
        assert!(config.serial.port.is_empty());
        assert_eq!(config.parser.status_flags, StatusFlagDecoding::Legacy);
        assert!(!config.telemetry.enabled);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = Config::from_toml("").unwrap();
        assert_eq!(config.serial.timeout_ms, 500);
        assert_eq!(config.telemetry.max_records_per_file, 10000);
        assert_eq!(config.telemetry.max_files_to_keep, 10);
    }

    #[test]
    fn test_partial_sections() {
        let toml = r#"
            [serial]
            port = "/dev/ttyUSB1"
            baud_rate = 57600

            [parser]
            status_flags = "corrected"
        "#;

        let config = Config::from_toml(toml).unwrap();
        assert_eq!(config.serial.port, "/dev/ttyUSB1");
        assert_eq!(config.serial.baud_rate, 57600);
        assert_eq!(config.serial.timeout_ms, 500);
        assert_eq!(
            config.parser.decode_options().status_flags,
            StatusFlagDecoding::Corrected
        );
    }

    #[test]
    fn test_invalid_baud_rate() {
        let result = Config::from_toml("[serial]\nbaud_rate = 420000\n");
        assert!(matches!(result, Err(LtmError::Config(_))));
    }

    #[test]
    fn test_invalid_timeout() {
        assert!(Config::from_toml("[serial]\ntimeout_ms = 0\n").is_err());
        assert!(Config::from_toml("[serial]\ntimeout_ms = 10001\n").is_err());
    }

    #[test]
    fn test_invalid_status_flags_value() {
        let result = Config::from_toml("[parser]\nstatus_flags = \"fixed\"\n");
        assert!(matches!(result, Err(LtmError::Config(_))));
    }

    #[test]
    fn test_telemetry_validation() {
        let mut config = Config::default();
        config.telemetry.enabled = true;
        config.telemetry.log_dir = String::new();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.telemetry.max_records_per_file = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.telemetry.max_files_to_keep = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.telemetry.format = "csv".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_log_level() {
        let result = Config::from_toml("[logging]\nlevel = \"verbose\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[telemetry]").unwrap();
        writeln!(file, "enabled = true").unwrap();
        writeln!(file, "log_dir = \"/tmp/ltm\"").unwrap();
        writeln!(file, "max_files_to_keep = 3").unwrap();

        let config = Config::load(file.path()).unwrap();
        assert!(config.telemetry.enabled);
        assert_eq!(config.telemetry.log_dir, "/tmp/ltm");
        assert_eq!(config.telemetry.max_files_to_keep, 3);
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/ltm-telemetry.toml");
        assert!(matches!(result, Err(LtmError::Io(_))));
    }
}
