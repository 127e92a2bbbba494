//! # Telemetry Module
//!
//! Records decoded LTM frames to JSONL files with rotation.
//!
//! This module handles:
//! - Formatting each frame as one JSON object per line (JSON Lines)
//! - Writing to rotating log files (max N records per file)
//! - Retaining only the last M files

pub mod logger;

pub use logger::TelemetryLogger;
