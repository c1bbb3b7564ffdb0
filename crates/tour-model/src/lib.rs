//! Shared data types for the guided destination tour.
//!
//! This crate contains pure data structures with no orchestration logic:
//! waypoints, points of interest, routes, the tour phase enum and the
//! catalog that bundles them. It is a dependency for every other crate in
//! the workspace.

pub mod catalog;
pub mod geo;
pub mod phase;
pub mod poi;
pub mod route;
pub mod waypoint;

#[cfg(any(test, feature = "test-fixtures"))]
pub mod fixtures;

pub use catalog::{CatalogError, TourCatalog};
pub use geo::{bounding_circle, haversine_m, Coordinate, Position, EARTH_RADIUS_M};
pub use phase::TourPhase;
pub use poi::PointOfInterest;
pub use route::RoutePath;
pub use waypoint::{StopRole, Waypoint, DEFAULT_ALTITUDE_M};
