//! # LTM Protocol Constants and Types
//!
//! Core protocol definitions for LTM (Lightweight Telemetry).
//!
//! Every frame on the wire looks like:
//!
//! ```text
//! '$' 'T' <tag> <payload: fixed length per tag> <checksum: XOR of payload>
//! ```
//!
//! There is no length field, the tag alone determines the payload length.

use serde::Serialize;
use std::fmt;

use super::enums::{FlightStatus, GpsMode, NavAction, NavError, NavMode};
use super::fixed_point::{degrees_from_raw, meters_from_centimeters};

/// First preamble byte, `'$'`
pub const LTM_SENTINEL: u8 = b'$';

/// Second preamble byte, `'T'`
pub const LTM_HEADER: u8 = b'T';

/// GPS frame tag
pub const LTM_FRAMETYPE_GPS: u8 = b'G';

/// Altitude (attitude angles) frame tag
pub const LTM_FRAMETYPE_ALTITUDE: u8 = b'A';

/// Status frame tag
pub const LTM_FRAMETYPE_STATUS: u8 = b'S';

/// Origin (home position) frame tag
pub const LTM_FRAMETYPE_ORIGIN: u8 = b'O';

/// Navigation frame tag
pub const LTM_FRAMETYPE_NAVIGATION: u8 = b'N';

/// GPS extended frame tag
pub const LTM_FRAMETYPE_GPS_EXTENDED: u8 = b'X';

/// Tuning frame tag (never transmitted in practice)
pub const LTM_FRAMETYPE_TUNING: u8 = b'T';

/// GPS payload size
pub const LTM_GPS_PAYLOAD_SIZE: usize = 14;

/// Altitude payload size
pub const LTM_ALTITUDE_PAYLOAD_SIZE: usize = 6;

/// Status payload size
pub const LTM_STATUS_PAYLOAD_SIZE: usize = 7;

/// Origin payload size
pub const LTM_ORIGIN_PAYLOAD_SIZE: usize = 14;

/// Navigation payload size
pub const LTM_NAVIGATION_PAYLOAD_SIZE: usize = 6;

/// GPS extended payload size
pub const LTM_GPS_EXTENDED_PAYLOAD_SIZE: usize = 6;

/// Tuning payload size
pub const LTM_TUNING_PAYLOAD_SIZE: usize = 0;

/// Largest payload of any known frame kind
pub const LTM_MAX_PAYLOAD_SIZE: usize = 14;

/// Known frame kinds, keyed by their wire tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    Gps,
    Altitude,
    Status,
    Origin,
    Navigation,
    GpsExtended,
    Tuning,
}

impl FrameKind {
    /// Every known kind, in tag table order
    pub const ALL: [FrameKind; 7] = [
        FrameKind::Gps,
        FrameKind::Altitude,
        FrameKind::Status,
        FrameKind::Origin,
        FrameKind::Navigation,
        FrameKind::GpsExtended,
        FrameKind::Tuning,
    ];

    /// Resolve a tag byte to a frame kind
    ///
    /// Returns `None` for tags outside the known set.
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            LTM_FRAMETYPE_GPS => Some(Self::Gps),
            LTM_FRAMETYPE_ALTITUDE => Some(Self::Altitude),
            LTM_FRAMETYPE_STATUS => Some(Self::Status),
            LTM_FRAMETYPE_ORIGIN => Some(Self::Origin),
            LTM_FRAMETYPE_NAVIGATION => Some(Self::Navigation),
            LTM_FRAMETYPE_GPS_EXTENDED => Some(Self::GpsExtended),
            LTM_FRAMETYPE_TUNING => Some(Self::Tuning),
            _ => None,
        }
    }

    /// Wire tag byte
    pub fn tag(self) -> u8 {
        match self {
            Self::Gps => LTM_FRAMETYPE_GPS,
            Self::Altitude => LTM_FRAMETYPE_ALTITUDE,
            Self::Status => LTM_FRAMETYPE_STATUS,
            Self::Origin => LTM_FRAMETYPE_ORIGIN,
            Self::Navigation => LTM_FRAMETYPE_NAVIGATION,
            Self::GpsExtended => LTM_FRAMETYPE_GPS_EXTENDED,
            Self::Tuning => LTM_FRAMETYPE_TUNING,
        }
    }

    /// Fixed payload length in bytes
    pub fn payload_len(self) -> usize {
        match self {
            Self::Gps => LTM_GPS_PAYLOAD_SIZE,
            Self::Altitude => LTM_ALTITUDE_PAYLOAD_SIZE,
            Self::Status => LTM_STATUS_PAYLOAD_SIZE,
            Self::Origin => LTM_ORIGIN_PAYLOAD_SIZE,
            Self::Navigation => LTM_NAVIGATION_PAYLOAD_SIZE,
            Self::GpsExtended => LTM_GPS_EXTENDED_PAYLOAD_SIZE,
            Self::Tuning => LTM_TUNING_PAYLOAD_SIZE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Gps => "GPS",
            Self::Altitude => "Altitude",
            Self::Status => "Status",
            Self::Origin => "Origin",
            Self::Navigation => "Navigation",
            Self::GpsExtended => "GPS extended",
            Self::Tuning => "Tuning",
        }
    }
}

impl fmt::Display for FrameKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Geographic position shared by GPS and origin frames
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Position {
    /// Latitude in degrees
    #[serde(rename = "lat")]
    pub latitude: f64,

    /// Longitude in degrees
    #[serde(rename = "lon")]
    pub longitude: f64,

    /// Altitude in meters
    #[serde(rename = "alt")]
    pub altitude: f64,
}

impl Position {
    /// Build a position from raw wire values (degrees × 10^7, centimeters)
    pub fn from_raw(lat: i32, lon: i32, alt: i32) -> Self {
        Self {
            latitude: degrees_from_raw(lat),
            longitude: degrees_from_raw(lon),
            altitude: meters_from_centimeters(alt),
        }
    }
}

/// GPS frame (`G`)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GpsFrame {
    #[serde(flatten)]
    pub position: Position,

    /// Ground speed in m/s
    #[serde(rename = "spd")]
    pub ground_speed: i8,

    /// Fix type (0-3)
    pub fix: u8,

    /// Number of satellites
    #[serde(rename = "numsat")]
    pub satellites: u8,
}

/// Altitude frame (`A`), carrying the attitude angles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AltitudeFrame {
    /// Pitch in degrees
    #[serde(rename = "angx")]
    pub pitch: i16,

    /// Roll in degrees
    #[serde(rename = "angy")]
    pub roll: i16,

    /// Heading in degrees
    pub heading: i16,
}

/// Status frame (`S`)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct StatusFrame {
    /// Battery voltage in volts
    #[serde(rename = "vbat")]
    pub battery_voltage: f64,

    /// Battery consumption in amp-hours
    #[serde(rename = "vcurr")]
    pub battery_consumption: f64,

    pub rssi: u8,

    /// Airspeed in m/s
    pub airspeed: u8,

    pub status: FlightStatus,

    pub armed: bool,

    pub failsafe: bool,
}

/// Origin frame (`O`), the home position
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct OriginFrame {
    #[serde(flatten)]
    pub position: Position,

    /// OSD on flag
    pub osd: bool,

    pub fix: u8,
}

/// Navigation frame (`N`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NavigationFrame {
    pub gps_mode: GpsMode,

    pub nav_mode: NavMode,

    #[serde(rename = "action")]
    pub nav_action: NavAction,

    #[serde(rename = "wp_number")]
    pub waypoint_number: i8,

    pub nav_error: NavError,

    pub flags: u8,
}

/// GPS extended frame (`X`)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GpsExtendedFrame {
    pub hdop: f64,

    #[serde(rename = "hw_status")]
    pub hardware_status: u8,

    #[serde(rename = "ltm_x_count")]
    pub ltm_x_counter: u8,

    pub disarm_reason: u8,

    #[serde(skip)]
    pub unused: u8,
}

/// A decoded and checksum-validated LTM frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frame {
    Gps(GpsFrame),
    Altitude(AltitudeFrame),
    Status(StatusFrame),
    Origin(OriginFrame),
    Navigation(NavigationFrame),
    GpsExtended(GpsExtendedFrame),
    Tuning,
}

impl Frame {
    pub fn kind(&self) -> FrameKind {
        match self {
            Frame::Gps(_) => FrameKind::Gps,
            Frame::Altitude(_) => FrameKind::Altitude,
            Frame::Status(_) => FrameKind::Status,
            Frame::Origin(_) => FrameKind::Origin,
            Frame::Navigation(_) => FrameKind::Navigation,
            Frame::GpsExtended(_) => FrameKind::GpsExtended,
            Frame::Tuning => FrameKind::Tuning,
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Y"
    } else {
        "N"
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Frame::Gps(gps) => write!(
                f,
                "[GPS] lat: {:.6} lon: {:.6} alt: {:.2} gspd: {}m/s fix: {} sats {}",
                gps.position.latitude,
                gps.position.longitude,
                gps.position.altitude,
                gps.ground_speed,
                gps.fix,
                gps.satellites
            ),
            Frame::Altitude(alt) => write!(
                f,
                "[ALT] pitch: {} roll: {} heading: {}",
                alt.pitch, alt.roll, alt.heading
            ),
            Frame::Status(status) => write!(
                f,
                "[STA] vbat: {:.2}V cons: {:.3}Ah rssi: {} aspd: {}m/s arm: {} fail: {} status: {}",
                status.battery_voltage,
                status.battery_consumption,
                status.rssi,
                status.airspeed,
                yes_no(status.armed),
                yes_no(status.failsafe),
                status.status
            ),
            Frame::Origin(origin) => write!(
                f,
                "[ORI] lat: {:.6} lon: {:.6} alt: {:.2}m fix: {} osd {}",
                origin.position.latitude,
                origin.position.longitude,
                origin.position.altitude,
                origin.fix,
                yes_no(origin.osd)
            ),
            Frame::Navigation(nav) => write!(
                f,
                "[NAV] nav: {} gps: {} act: {} err {} wpt: {}",
                nav.nav_mode, nav.gps_mode, nav.nav_action, nav.nav_error, nav.waypoint_number
            ),
            Frame::GpsExtended(gpx) => write!(
                f,
                "[GPX] hdop: {:.2} hw: 0x{:x} cnt: {} disarm: {}",
                gpx.hdop, gpx.hardware_status, gpx.ltm_x_counter, gpx.disarm_reason
            ),
            Frame::Tuning => f.write_str("[TUN]"),
        }
    }
}
