//! Flight routes drawn during the final phase.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// A named origin/destination pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePath {
    /// Label such as "MIA → LAX"
    pub name: String,
    pub origin: Coordinate,
    pub destination: Coordinate,
}

impl RoutePath {
    pub fn new(name: impl Into<String>, origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            name: name.into(),
            origin,
            destination,
        }
    }

    /// Anchor point for the route label.
    pub fn midpoint(&self) -> Coordinate {
        self.origin.midpoint(self.destination)
    }
}
