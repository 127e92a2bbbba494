//! # Serial Communication Module
//!
//! Opens the serial port carrying the LTM downlink.
//!
//! This module handles:
//! - Opening the configured port, or auto-detecting a common device path
//! - 8N1 framing at the configured baud rate
//! - A read timeout, so a silent link does not block shutdown forever
//!
//! Ports are opened through the blocking builder `tokio-serial` re-exports,
//! since the LTM parser reads through `std::io::Read`.

use std::time::Duration;

use tracing::{debug, info, warn};

use crate::config::SerialConfig;
use crate::error::{LtmError, Result};

/// Default device paths to try (in order of preference)
const DEFAULT_DEVICE_PATHS: &[&str] = &[
    "/dev/ttyUSB0", // USB-to-serial adapters
    "/dev/ttyACM0", // USB CDC devices
    "/dev/ttyAMA0", // Raspberry Pi UART
];

/// Serial port receiving LTM telemetry
pub struct LtmSerial {
    /// Serial port handle
    port: Box<dyn tokio_serial::SerialPort>,
    /// Device path (e.g., /dev/ttyUSB0)
    device_path: String,
}

impl std::fmt::Debug for LtmSerial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LtmSerial")
            .field("device_path", &self.device_path)
            .finish_non_exhaustive()
    }
}

impl LtmSerial {
    /// Open the port named in the configuration, or auto-detect one
    ///
    /// # Errors
    ///
    /// Returns error if no candidate device can be opened
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use ltm_telemetry::config::SerialConfig;
    /// use ltm_telemetry::serial::LtmSerial;
    ///
    /// fn main() -> anyhow::Result<()> {
    ///     let serial = LtmSerial::open(&SerialConfig::default())?;
    ///     Ok(())
    /// }
    /// ```
    pub fn open(config: &SerialConfig) -> Result<Self> {
        let timeout = Duration::from_millis(config.timeout_ms);

        if config.port.is_empty() {
            Self::open_with_paths(DEFAULT_DEVICE_PATHS, config.baud_rate, timeout)
        } else {
            Self::open_with_paths(&[config.port.as_str()], config.baud_rate, timeout)
        }
    }

    /// Open the first device in `paths` that accepts the connection
    ///
    /// # Arguments
    ///
    /// * `paths` - Device paths to try (e.g., &["/dev/ttyUSB0"])
    /// * `baud_rate` - Line speed
    /// * `timeout` - Per-read timeout
    pub fn open_with_paths(paths: &[&str], baud_rate: u32, timeout: Duration) -> Result<Self> {
        for path in paths {
            debug!("Trying to open serial port: {}", path);

            match Self::open_port(path, baud_rate, timeout) {
                Ok(port) => {
                    info!("Opened LTM serial port {} at {} baud", path, baud_rate);
                    return Ok(Self {
                        port,
                        device_path: path.to_string(),
                    });
                }
                Err(e) => {
                    warn!("Failed to open {}: {}", path, e);
                    continue;
                }
            }
        }

        Err(LtmError::SerialPortNotFound(paths.join(", ")))
    }

    fn open_port(
        path: &str,
        baud_rate: u32,
        timeout: Duration,
    ) -> Result<Box<dyn tokio_serial::SerialPort>> {
        let port = tokio_serial::new(path, baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .flow_control(tokio_serial::FlowControl::None)
            .timeout(timeout)
            .open()
            .map_err(|e| LtmError::Serial(format!("Failed to open {}: {}", path, e)))?;

        Ok(port)
    }

    /// Get the device path
    pub fn device_path(&self) -> &str {
        &self.device_path
    }

    /// Consume the handle, returning a blocking byte source for the parser
    pub fn into_reader(self) -> Box<dyn tokio_serial::SerialPort> {
        self.port
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_with_invalid_paths_returns_error() {
        let invalid_paths = &["/dev/nonexistent0", "/dev/nonexistent1"];
        let result = LtmSerial::open_with_paths(invalid_paths, 9600, Duration::from_millis(100));

        match result {
            Err(LtmError::SerialPortNotFound(msg)) => {
                assert!(msg.contains("/dev/nonexistent0"));
                assert!(msg.contains("/dev/nonexistent1"));
            }
            other => panic!("Expected SerialPortNotFound error, got: {:?}", other),
        }
    }

    #[test]
    fn test_open_with_empty_paths_returns_error() {
        let empty_paths: &[&str] = &[];
        let result = LtmSerial::open_with_paths(empty_paths, 9600, Duration::from_millis(100));

        assert!(matches!(result, Err(LtmError::SerialPortNotFound(_))));
    }

    #[test]
    fn test_open_port_with_invalid_path_returns_error() {
        let result = LtmSerial::open_port(
            "/dev/nonexistent_serial_device_12345",
            9600,
            Duration::from_millis(100),
        );

        match result {
            Err(LtmError::Serial(msg)) => {
                assert!(msg.contains("/dev/nonexistent_serial_device_12345"));
                assert!(msg.contains("Failed to open"));
            }
            Err(other) => panic!("Expected Serial error, got: {:?}", other),
            Ok(_) => panic!("Expected Serial error, got an open port"),
        }
    }

    #[test]
    fn test_configured_port_is_the_only_candidate() {
        let config = SerialConfig {
            port: "/dev/nonexistent_ltm_port".to_string(),
            ..SerialConfig::default()
        };

        match LtmSerial::open(&config) {
            Err(LtmError::SerialPortNotFound(msg)) => {
                assert_eq!(msg, "/dev/nonexistent_ltm_port");
            }
            other => panic!("Expected SerialPortNotFound error, got: {:?}", other),
        }
    }

    #[test]
    fn test_device_path_order() {
        assert_eq!(DEFAULT_DEVICE_PATHS[0], "/dev/ttyUSB0");
        assert_eq!(DEFAULT_DEVICE_PATHS[1], "/dev/ttyACM0");
        assert_eq!(DEFAULT_DEVICE_PATHS[2], "/dev/ttyAMA0");
    }

    // Only meaningful with a flight controller attached
    #[test]
    #[ignore] // Run with: cargo test -- --ignored
    fn test_open_with_real_hardware() {
        match LtmSerial::open(&SerialConfig::default()) {
            Ok(serial) => println!("Opened LTM device at: {}", serial.device_path()),
            Err(_) => println!("No LTM hardware detected (this is OK for CI/CD)"),
        }
    }
}
