//! Camera waypoints for the location walkthrough.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::geo::Coordinate;

/// Camera range used when a waypoint has no fixed altitude.
pub const DEFAULT_ALTITUDE_M: f64 = 1000.0;

/// What a waypoint represents in the tour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopRole {
    /// Ordinary landmark
    #[default]
    None,
    /// Whole-planet view used as the pre-positioned start
    Global,
    /// Elevated overview of the destination
    Vantage,
}

/// A configured camera target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Fixed camera range in metres; `None` means [`DEFAULT_ALTITUDE_M`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub altitude_m: Option<f64>,
    /// Seconds to hold after the camera settles
    pub dwell_secs: f64,
    #[serde(default)]
    pub role: StopRole,
    /// Text shown in the overlay while this waypoint is on screen
    #[serde(default)]
    pub detail: String,
}

impl Waypoint {
    /// Creates a waypoint with no fixed altitude and no role.
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64, dwell_secs: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            altitude_m: None,
            dwell_secs,
            role: StopRole::None,
            detail: String::new(),
        }
    }

    /// Sets a fixed camera altitude.
    pub fn with_altitude(mut self, altitude_m: f64) -> Self {
        self.altitude_m = Some(altitude_m);
        self
    }

    /// Sets the role.
    pub fn with_role(mut self, role: StopRole) -> Self {
        self.role = role;
        self
    }

    /// Sets the overlay detail text.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = detail.into();
        self
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Camera range, falling back to `default_m` when no altitude is fixed.
    pub fn altitude_or(&self, default_m: f64) -> f64 {
        self.altitude_m.unwrap_or(default_m)
    }

    /// Dwell as a duration. Negative or non-finite values collapse to zero.
    pub fn dwell(&self) -> Duration {
        Duration::try_from_secs_f64(self.dwell_secs).unwrap_or(Duration::ZERO)
    }
}
