//! # LTM Telemetry Library
//!
//! Decode Lightweight Telemetry (LTM) downlink streams from iNav flight
//! controllers.
//!
//! This library provides the frame decoder for ground-station use: feed it
//! any byte source and get back typed GPS, attitude, status, origin,
//! navigation and GPS extended frames, plus counters for everything that was
//! dropped along the way.

pub mod config;
pub mod error;
pub mod ltm;
pub mod serial;
pub mod session;
pub mod telemetry;
