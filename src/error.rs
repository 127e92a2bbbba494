//! # Error Types
//!
//! Custom error types for LTM Telemetry using `thiserror`.

use std::io;
use thiserror::Error;

use crate::ltm::protocol::FrameKind;

/// Main error type for LTM Telemetry
#[derive(Debug, Error)]
pub enum LtmError {
    /// Payload slice shorter than the fixed length of its frame kind
    #[error("{kind} payload too short: expected {expected} bytes, got {actual}")]
    PayloadTooShort {
        kind: FrameKind,
        expected: usize,
        actual: usize,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serial port errors
    #[error("Serial port error: {0}")]
    Serial(String),

    /// None of the candidate serial devices could be opened
    #[error("No LTM serial device found (tried: {0})")]
    SerialPortNotFound(String),

    /// Telemetry record encoding errors
    #[error("Telemetry encoding error: {0}")]
    Json(#[from] serde_json::Error),

    /// Background parse task failed to complete
    #[error("Parse session error: {0}")]
    Session(String),
}

/// Result type alias for LTM Telemetry
pub type Result<T> = std::result::Result<T, LtmError>;

/// Marker error carried by the `io::Error` of a cancelled read
#[derive(Debug, Error)]
#[error("LTM read cancelled")]
pub struct ReadCancelled;

/// Returns true if `err` reports a cancelled read rather than a source failure
pub fn is_cancellation(err: &io::Error) -> bool {
    err.get_ref()
        .map_or(false, |inner| inner.is::<ReadCancelled>())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cancellation_is_identified_by_type() {
        let cancelled = io::Error::new(io::ErrorKind::Other, ReadCancelled);
        assert!(is_cancellation(&cancelled));

        // Same text, different source
        let lookalike = io::Error::new(io::ErrorKind::Other, "LTM read cancelled");
        assert!(!is_cancellation(&lookalike));
        assert!(!is_cancellation(&io::Error::from(io::ErrorKind::UnexpectedEof)));
    }
}
