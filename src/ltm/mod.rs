//! # LTM Protocol Module
//!
//! Implementation of the Lightweight Telemetry (LTM) downlink protocol.
//!
//! This module handles:
//! - Frame synchronization on the `$T` preamble
//! - Frame type dispatch by tag byte (fixed payload length per kind)
//! - Per-kind payload decoding with fixed-point conversions
//! - XOR checksum validation

pub mod protocol;
pub mod enums;
pub mod fixed_point;
pub mod checksum;
pub mod decoder;
pub mod parser;

pub use parser::{parse, FrameSink, ParseResult, ParseStats, Parser, StreamEnd};
pub use protocol::{Frame, FrameKind};
