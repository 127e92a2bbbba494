//! # Fixed-Point Conversions
//!
//! LTM carries physical quantities as scaled integers. These helpers turn
//! the raw wire integers into floating point values in natural units.

/// Degrees × 10^7 (latitude, longitude)
pub const DEGREES_SCALE: f64 = 10_000_000.0;

/// Centimeters per meter (altitude)
pub const ALTITUDE_SCALE: f64 = 100.0;

/// Millivolts per volt (battery voltage)
pub const VOLTAGE_SCALE: f64 = 1000.0;

/// Milliamp-hours per amp-hour (battery consumption)
pub const CONSUMPTION_SCALE: f64 = 1000.0;

/// HDOP is transmitted × 100
pub const HDOP_SCALE: f64 = 100.0;

/// Convert a raw latitude/longitude value (degrees × 10^7) to degrees
pub fn degrees_from_raw(raw: i32) -> f64 {
    raw as f64 / DEGREES_SCALE
}

/// Convert a raw altitude value (centimeters) to meters
pub fn meters_from_centimeters(raw: i32) -> f64 {
    raw as f64 / ALTITUDE_SCALE
}

/// Convert a raw battery voltage (millivolts) to volts
pub fn volts_from_millivolts(raw: u16) -> f64 {
    raw as f64 / VOLTAGE_SCALE
}

/// Convert a raw battery consumption (mAh) to amp-hours
pub fn amp_hours_from_milliamp_hours(raw: u16) -> f64 {
    raw as f64 / CONSUMPTION_SCALE
}

/// Convert a raw HDOP value (× 100) to its dimensionless value
pub fn hdop_from_raw(raw: u16) -> f64 {
    raw as f64 / HDOP_SCALE
}
