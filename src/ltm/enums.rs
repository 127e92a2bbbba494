//! # LTM Enumerations
//!
//! Small integer fields with a fixed set of named values. The wire can carry
//! any byte, so every type keeps the raw value and resolves labels with a
//! range check: values past the last known entry map to an unknown label.

use serde::Serialize;
use std::fmt;

/// Label for any out-of-range enumeration value
pub const UNKNOWN_LABEL: &str = "UNKNOWN";

/// Label for an out-of-range navigation error code
pub const UNKNOWN_NAV_ERROR_LABEL: &str = "Unknown navigation error";

fn bounded_label(labels: &[&'static str], value: u8, unknown: &'static str) -> &'static str {
    labels.get(value as usize).copied().unwrap_or(unknown)
}

/// Flight mode reported in the status frame (upper six bits of the packed byte)
///
/// In-range labels carry the firmware's `STATUS_` prefix; out-of-range
/// values still resolve to [`UNKNOWN_LABEL`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct FlightStatus(pub u8);

impl FlightStatus {
    /// Largest known value
    pub const MAX: u8 = 21;

    const LABELS: [&'static str; FlightStatus::MAX as usize + 1] = [
        "STATUS_MANUAL",
        "STATUS_RATE",
        "STATUS_ANGLE",
        "STATUS_HORIZON",
        "STATUS_ACRO",
        "STATUS_STABILISED1",
        "STATUS_STABILISED2",
        "STATUS_STABILISED3",
        "STATUS_ALTITUDE_HOLD",
        "STATUS_GPS_HOLD",
        "STATUS_WAYPOINTS",
        "STATUS_HEAD_FREE",
        "STATUS_CIRCLE",
        "STATUS_RTH",
        "STATUS_FOLLOW_ME",
        "STATUS_LAND",
        "STATUS_FLY_BY_WIREA",
        "STATUS_FLY_BY_WIREB",
        "STATUS_CRUISE",
        "STATUS_UNKNOWN",
        "STATUS_LAUNCH",
        "STATUS_AUTOTUNE",
    ];

    pub fn label(self) -> &'static str {
        bounded_label(&Self::LABELS, self.0, UNKNOWN_LABEL)
    }
}

/// GPS navigation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct GpsMode(pub u8);

impl GpsMode {
    pub const MAX: u8 = 3;

    const LABELS: [&'static str; GpsMode::MAX as usize + 1] = ["NONE", "POSHOLD", "RTH", "MISSION"];

    pub fn label(self) -> &'static str {
        bounded_label(&Self::LABELS, self.0, UNKNOWN_LABEL)
    }
}

/// Navigation state machine mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct NavMode(pub u8);

impl NavMode {
    pub const MAX: u8 = 15;

    const LABELS: [&'static str; NavMode::MAX as usize + 1] = [
        "NONE",
        "RTH_START",
        "RTH_ENROUTE",
        "POSHOLD_INF",
        "POSHOLD_TIMED",
        "WP_ENROUTE",
        "PROCESS_NEXT",
        "JUMP",
        "START_LAND",
        "LANDING_INPROGRESS",
        "LANDED",
        "SETTLING_BEFORE_LANDING",
        "START_DESCENT",
        "HOVER_ABOVE_HOME",
        "EMERGENCY_LANDING",
        "CRITICAL_GPS_FAILURE",
    ];

    pub fn label(self) -> &'static str {
        bounded_label(&Self::LABELS, self.0, UNKNOWN_LABEL)
    }
}

/// Action of the active mission waypoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct NavAction(pub u8);

impl NavAction {
    pub const MAX: u8 = 8;

    const LABELS: [&'static str; NavAction::MAX as usize + 1] = [
        "UNASSIGNED",
        "WAYPOINT",
        "POSHOLD_UNLIM",
        "POSHOLD_TIME",
        "RTH",
        "SET_POI",
        "JUMP",
        "SET_HEAD",
        "LAND",
    ];

    pub fn label(self) -> &'static str {
        bounded_label(&Self::LABELS, self.0, UNKNOWN_LABEL)
    }
}

/// Navigation error code, rendered as a sentence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct NavError(pub u8);

impl NavError {
    pub const MAX: u8 = 11;

    const LABELS: [&'static str; NavError::MAX as usize + 1] = [
        "Navigation system is working",
        "Next waypoint distance is more than the safety limit, aborting mission",
        "GPS reception is compromised - pausing mission",
        "Error while reading next waypoint from memory, aborting mission",
        "Mission Finished",
        "Waiting for timed position hold",
        "Invalid Jump target detected, aborting mission",
        "Invalid Mission Step Action code detected, aborting mission",
        "Waiting to reach return to home altitude",
        "GPS fix lost, mission aborted",
        "Disarmed, navigation engine disabled",
        "Landing is in progress, check attitude",
    ];

    pub fn label(self) -> &'static str {
        bounded_label(&Self::LABELS, self.0, UNKNOWN_NAV_ERROR_LABEL)
    }
}

macro_rules! display_label {
    ($($ty:ty),+) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.label())
                }
            }
        )+
    };
}

display_label!(FlightStatus, GpsMode, NavMode, NavAction, NavError);
