//! Geographic primitives.
//!
//! Coordinates are WGS84 degrees. Distances are great-circle metres on a
//! spherical Earth, which is plenty for framing a camera.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Mean Earth radius in metres.
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    /// Creates a new coordinate.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Lifts this coordinate to a position at the given height above the ellipsoid.
    pub fn at_height(self, height_m: f64) -> Position {
        Position {
            coordinate: self,
            height_m,
        }
    }

    /// Arithmetic midpoint in degree space.
    ///
    /// This is where route labels are anchored; it is not the great-circle
    /// midpoint and does not need to be.
    pub fn midpoint(self, other: Coordinate) -> Coordinate {
        Coordinate::new(
            (self.latitude + other.latitude) / 2.0,
            (self.longitude + other.longitude) / 2.0,
        )
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.latitude, self.longitude)
    }
}

/// A coordinate with a height, as placed in the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub coordinate: Coordinate,
    pub height_m: f64,
}

/// Great-circle distance between two coordinates in metres.
pub fn haversine_m(a: Coordinate, b: Coordinate) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Smallest circle (centred on the mean coordinate) containing every point.
///
/// Returns `None` for an empty slice.
pub fn bounding_circle(points: &[Coordinate]) -> Option<(Coordinate, f64)> {
    if points.is_empty() {
        return None;
    }

    let n = points.len() as f64;
    let center = Coordinate::new(
        points.iter().map(|p| p.latitude).sum::<f64>() / n,
        points.iter().map(|p| p.longitude).sum::<f64>() / n,
    );
    let radius = points
        .iter()
        .map(|p| haversine_m(center, *p))
        .fold(0.0_f64, f64::max);

    Some((center, radius))
}
