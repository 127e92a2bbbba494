//! # LTM Payload Decoder
//!
//! Decodes the fixed-length payloads of each LTM frame kind. All multi-byte
//! fields are little-endian.

use bytes::Buf;
use serde::Deserialize;
use std::io::Read;

use super::checksum::xor_checksum;
use super::enums::{FlightStatus, GpsMode, NavAction, NavError, NavMode};
use super::fixed_point::{amp_hours_from_milliamp_hours, hdop_from_raw, volts_from_millivolts};
use super::protocol::*;
use crate::error::{LtmError, Result};

/// How the packed status byte sets the `armed` and `failsafe` flags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusFlagDecoding {
    /// Reproduce deployed ground-station behaviour: `armed` ends up taken
    /// from bit 1, `failsafe` is never set.
    #[default]
    Legacy,

    /// Bit 0 is armed, bit 1 is failsafe.
    Corrected,
}

/// Options applied while decoding payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DecodeOptions {
    pub status_flags: StatusFlagDecoding,
}

/// A payload read off the wire, along with the checksum computed over it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecodedFrame {
    pub frame: Frame,
    pub checksum: u8,
}

/// Read and decode the payload of a frame of the given kind
///
/// Reads exactly `kind.payload_len()` bytes from `reader`.
///
/// # Errors
///
/// Returns `LtmError::Io` if the reader cannot supply the full payload
/// (`ErrorKind::UnexpectedEof` when the stream ends part way through).
pub fn read_frame<R: Read + ?Sized>(
    kind: FrameKind,
    reader: &mut R,
    options: &DecodeOptions,
) -> Result<DecodedFrame> {
    let mut buffer = [0u8; LTM_MAX_PAYLOAD_SIZE];
    let payload = &mut buffer[..kind.payload_len()];
    reader.read_exact(payload)?;

    let frame = decode_payload(kind, payload, options)?;

    Ok(DecodedFrame {
        frame,
        checksum: xor_checksum(payload),
    })
}

/// Decode a complete payload of the given kind
pub fn decode_payload(kind: FrameKind, payload: &[u8], options: &DecodeOptions) -> Result<Frame> {
    let frame = match kind {
        FrameKind::Gps => Frame::Gps(decode_gps(payload)?),
        FrameKind::Altitude => Frame::Altitude(decode_altitude(payload)?),
        FrameKind::Status => Frame::Status(decode_status(payload, options.status_flags)?),
        FrameKind::Origin => Frame::Origin(decode_origin(payload)?),
        FrameKind::Navigation => Frame::Navigation(decode_navigation(payload)?),
        FrameKind::GpsExtended => Frame::GpsExtended(decode_gps_extended(payload)?),
        FrameKind::Tuning => Frame::Tuning,
    };

    Ok(frame)
}

fn ensure_len(kind: FrameKind, payload: &[u8]) -> Result<()> {
    if payload.len() < kind.payload_len() {
        return Err(LtmError::PayloadTooShort {
            kind,
            expected: kind.payload_len(),
            actual: payload.len(),
        });
    }

    Ok(())
}

/// Decode GPS payload
///
/// Altitude starts at offset 9, after the one byte ground speed. Origin
/// frames pack the same three position fields contiguously instead.
///
/// # Arguments
///
/// * `payload` - GPS payload (14 bytes)
pub fn decode_gps(payload: &[u8]) -> Result<GpsFrame> {
    ensure_len(FrameKind::Gps, payload)?;

    let mut buf = payload;
    let lat = buf.get_i32_le();
    let lon = buf.get_i32_le();
    let ground_speed = buf.get_i8();
    let alt = buf.get_i32_le();
    let packed = buf.get_u8();

    Ok(GpsFrame {
        position: Position::from_raw(lat, lon, alt),
        ground_speed,
        fix: packed & 0x03,
        satellites: packed >> 2,
    })
}

/// Decode altitude (attitude angles) payload
///
/// # Arguments
///
/// * `payload` - Altitude payload (6 bytes)
pub fn decode_altitude(payload: &[u8]) -> Result<AltitudeFrame> {
    ensure_len(FrameKind::Altitude, payload)?;

    let mut buf = payload;

    Ok(AltitudeFrame {
        pitch: buf.get_i16_le(),
        roll: buf.get_i16_le(),
        heading: buf.get_i16_le(),
    })
}

/// Decode status payload
///
/// # Arguments
///
/// * `payload` - Status payload (7 bytes)
/// * `flags` - How to interpret the armed/failsafe bits of the packed byte
pub fn decode_status(payload: &[u8], flags: StatusFlagDecoding) -> Result<StatusFrame> {
    ensure_len(FrameKind::Status, payload)?;

    let mut buf = payload;
    let voltage_mv = buf.get_u16_le();
    let consumption_mah = buf.get_u16_le();
    let rssi = buf.get_u8();
    let airspeed = buf.get_u8();
    let packed = buf.get_u8();

    let (armed, failsafe) = match flags {
        StatusFlagDecoding::Legacy => (packed & 0x02 == 0x02, false),
        StatusFlagDecoding::Corrected => (packed & 0x01 == 0x01, packed & 0x02 == 0x02),
    };

    Ok(StatusFrame {
        battery_voltage: volts_from_millivolts(voltage_mv),
        battery_consumption: amp_hours_from_milliamp_hours(consumption_mah),
        rssi,
        airspeed,
        status: FlightStatus(packed >> 2),
        armed,
        failsafe,
    })
}

/// Decode origin payload
///
/// # Arguments
///
/// * `payload` - Origin payload (14 bytes)
pub fn decode_origin(payload: &[u8]) -> Result<OriginFrame> {
    ensure_len(FrameKind::Origin, payload)?;

    let mut buf = payload;
    let lat = buf.get_i32_le();
    let lon = buf.get_i32_le();
    let alt = buf.get_i32_le();
    let osd = buf.get_u8() & 0x01 == 0x01;
    let fix = buf.get_u8();

    Ok(OriginFrame {
        position: Position::from_raw(lat, lon, alt),
        osd,
        fix,
    })
}

/// Decode navigation payload
///
/// # Arguments
///
/// * `payload` - Navigation payload (6 bytes)
pub fn decode_navigation(payload: &[u8]) -> Result<NavigationFrame> {
    ensure_len(FrameKind::Navigation, payload)?;

    let mut buf = payload;

    Ok(NavigationFrame {
        gps_mode: GpsMode(buf.get_u8()),
        nav_mode: NavMode(buf.get_u8()),
        nav_action: NavAction(buf.get_u8()),
        waypoint_number: buf.get_i8(),
        nav_error: NavError(buf.get_u8()),
        flags: buf.get_u8(),
    })
}

/// Decode GPS extended payload
///
/// # Arguments
///
/// * `payload` - GPS extended payload (6 bytes)
pub fn decode_gps_extended(payload: &[u8]) -> Result<GpsExtendedFrame> {
    ensure_len(FrameKind::GpsExtended, payload)?;

    let mut buf = payload;

    Ok(GpsExtendedFrame {
        hdop: hdop_from_raw(buf.get_u16_le()),
        hardware_status: buf.get_u8(),
        ltm_x_counter: buf.get_u8(),
        disarm_reason: buf.get_u8(),
        unused: buf.get_u8(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, ErrorKind};

    fn gps_payload(lat: i32, lon: i32, speed: i8, alt: i32, packed: u8) -> Vec<u8> {
        let mut payload = Vec::with_capacity(LTM_GPS_PAYLOAD_SIZE);
        payload.extend_from_slice(&lat.to_le_bytes());
        payload.extend_from_slice(&lon.to_le_bytes());
        payload.push(speed as u8);
        payload.extend_from_slice(&alt.to_le_bytes());
        payload.push(packed);
        payload
    }

    #[test]
    fn test_decode_gps() {
        // fix 3, 11 satellites
        let payload = gps_payload(473_123_456, -1_224_194_000, 12, 12_345, (11 << 2) | 3);

        let gps = decode_gps(&payload).unwrap();
        assert!((gps.position.latitude - 47.312_345_6).abs() < 1e-9);
        assert!((gps.position.longitude - (-122.4194)).abs() < 1e-9);
        assert!((gps.position.altitude - 123.45).abs() < 1e-9);
        assert_eq!(gps.ground_speed, 12);
        assert_eq!(gps.fix, 3);
        assert_eq!(gps.satellites, 11);
    }

    #[test]
    fn test_decode_gps_altitude_skips_speed_byte() {
        // A speed byte that would corrupt the altitude if read as part of it
        let payload = gps_payload(0, 0, -1, 100, 0);

        let gps = decode_gps(&payload).unwrap();
        assert_eq!(gps.ground_speed, -1);
        assert!((gps.position.altitude - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_decode_gps_too_short() {
        let payload = vec![0u8; 10];
        let result = decode_gps(&payload);
        assert!(matches!(
            result,
            Err(LtmError::PayloadTooShort { kind: FrameKind::Gps, expected: 14, actual: 10 })
        ));
    }

    #[test]
    fn test_decode_altitude() {
        let payload = [
            0xF6, 0xFF, // pitch: -10
            0x05, 0x00, // roll: 5
            0x68, 0x01, // heading: 360
        ];

        let alt = decode_altitude(&payload).unwrap();
        assert_eq!(alt.pitch, -10);
        assert_eq!(alt.roll, 5);
        assert_eq!(alt.heading, 360);
    }

    #[test]
    fn test_decode_status_legacy_flags() {
        let payload = [0xD8, 0x2E, 0x58, 0x02, 0x5A, 0x14, 0x05];

        let status = decode_status(&payload, StatusFlagDecoding::Legacy).unwrap();
        assert!((status.battery_voltage - 11.992).abs() < 1e-9);
        assert!((status.battery_consumption - 0.6).abs() < 1e-9);
        assert_eq!(status.rssi, 90);
        assert_eq!(status.airspeed, 20);
        assert_eq!(status.status, FlightStatus(1));
        // Bit 0 is set but legacy decoding only looks at bit 1
        assert!(!status.armed);
        assert!(!status.failsafe);
    }

    #[test]
    fn test_decode_status_legacy_bit1_sets_armed() {
        let payload = [0x18, 0x2E, 0x00, 0x00, 0x00, 0x00, 0x02];

        let status = decode_status(&payload, StatusFlagDecoding::Legacy).unwrap();
        assert!((status.battery_voltage - 11.8).abs() < 1e-9);
        assert!(status.armed);
        assert!(!status.failsafe);
    }

    #[test]
    fn test_decode_status_corrected_flags() {
        let armed = [0, 0, 0, 0, 0, 0, 0x01];
        let status = decode_status(&armed, StatusFlagDecoding::Corrected).unwrap();
        assert!(status.armed);
        assert!(!status.failsafe);

        let failsafe = [0, 0, 0, 0, 0, 0, 0x02];
        let status = decode_status(&failsafe, StatusFlagDecoding::Corrected).unwrap();
        assert!(!status.armed);
        assert!(status.failsafe);
    }

    #[test]
    fn test_decode_status_out_of_range_mode() {
        let payload = [0, 0, 0, 0, 0, 0, 22 << 2];

        let status = decode_status(&payload, StatusFlagDecoding::Legacy).unwrap();
        assert_eq!(status.status, FlightStatus(22));
        assert_eq!(status.status.label(), "UNKNOWN");
    }

    #[test]
    fn test_decode_origin() {
        let mut payload = Vec::new();
        payload.extend_from_slice(&473_123_456i32.to_le_bytes());
        payload.extend_from_slice(&85_234_000i32.to_le_bytes());
        payload.extend_from_slice(&12_345i32.to_le_bytes());
        payload.push(0x03); // only bit 0 counts
        payload.push(2);

        let origin = decode_origin(&payload).unwrap();
        assert!((origin.position.latitude - 47.312_345_6).abs() < 1e-9);
        assert!((origin.position.longitude - 8.5234).abs() < 1e-9);
        assert!((origin.position.altitude - 123.45).abs() < 1e-9);
        assert!(origin.osd);
        assert_eq!(origin.fix, 2);
    }

    #[test]
    fn test_decode_navigation() {
        let payload = [2, 5, 1, 0xFD, 4, 0x81];

        let nav = decode_navigation(&payload).unwrap();
        assert_eq!(nav.gps_mode.label(), "RTH");
        assert_eq!(nav.nav_mode.label(), "WP_ENROUTE");
        assert_eq!(nav.nav_action.label(), "WAYPOINT");
        assert_eq!(nav.waypoint_number, -3);
        assert_eq!(nav.nav_error.label(), "Mission Finished");
        assert_eq!(nav.flags, 0x81);
    }

    #[test]
    fn test_decode_gps_extended() {
        let payload = [0x87, 0x00, 0x01, 0x2A, 0x03, 0xEE];

        let gpx = decode_gps_extended(&payload).unwrap();
        assert!((gpx.hdop - 1.35).abs() < 1e-9);
        assert_eq!(gpx.hardware_status, 1);
        assert_eq!(gpx.ltm_x_counter, 42);
        assert_eq!(gpx.disarm_reason, 3);
        assert_eq!(gpx.unused, 0xEE);
    }

    #[test]
    fn test_read_frame_returns_checksum() {
        let mut reader = Cursor::new(vec![0xD8, 0x2E, 0x58, 0x02, 0x5A, 0x14, 0x05, 0xE7]);

        let decoded = read_frame(FrameKind::Status, &mut reader, &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.checksum, 0xE7);
        assert_eq!(decoded.frame.kind(), FrameKind::Status);
        // Checksum byte is left for the caller
        assert_eq!(reader.position(), 7);
    }

    #[test]
    fn test_read_frame_tuning_consumes_nothing() {
        let mut reader = Cursor::new(vec![0x42]);

        let decoded = read_frame(FrameKind::Tuning, &mut reader, &DecodeOptions::default()).unwrap();
        assert_eq!(decoded.frame, Frame::Tuning);
        assert_eq!(decoded.checksum, 0);
        assert_eq!(reader.position(), 0);
    }

    #[test]
    fn test_read_frame_short_payload() {
        let mut reader = Cursor::new(vec![0x00; 3]);

        let result = read_frame(FrameKind::Altitude, &mut reader, &DecodeOptions::default());
        match result {
            Err(LtmError::Io(e)) => assert_eq!(e.kind(), ErrorKind::UnexpectedEof),
            other => panic!("Expected short read error, got: {:?}", other),
        }
    }

    #[test]
    fn test_status_flag_decoding_from_config_string() {
        #[derive(Deserialize)]
        struct Wrapper {
            flags: StatusFlagDecoding,
        }

        let legacy: Wrapper = toml::from_str("flags = \"legacy\"").unwrap();
        assert_eq!(legacy.flags, StatusFlagDecoding::Legacy);

        let corrected: Wrapper = toml::from_str("flags = \"corrected\"").unwrap();
        assert_eq!(corrected.flags, StatusFlagDecoding::Corrected);
    }
}
