//! Small deterministic catalogs for testing.
//!
//! Enable the `test-fixtures` feature to access these helpers from other
//! crates:
//!
//! ```ignore
//! // [dev-dependencies]
//! // tour-model = { path = "../tour-model", features = ["test-fixtures"] }
//!
//! use tour_model::fixtures;
//!
//! let stops = fixtures::two_stop_tour();
//! ```

use crate::{Coordinate, PointOfInterest, RoutePath, TourCatalog, Waypoint};

/// Two waypoints, A (dwell 1s) and B (dwell 2s).
pub fn two_stop_tour() -> Vec<Waypoint> {
    vec![
        Waypoint::new("A", 25.0, -80.0, 1.0).with_detail("First stop"),
        Waypoint::new("B", 26.0, -81.0, 2.0).with_detail("Second stop"),
    ]
}

/// `n` waypoints with one-second dwell, spaced along a meridian.
pub fn waypoints(n: usize) -> Vec<Waypoint> {
    (0..n)
        .map(|i| Waypoint::new(format!("wp_{i}"), 20.0 + i as f64, -80.0, 1.0))
        .collect()
}

/// `n` hotels clustered a few hundred metres apart.
pub fn points_of_interest(n: usize) -> Vec<PointOfInterest> {
    (0..n)
        .map(|i| {
            let mut poi =
                PointOfInterest::new(format!("Hotel {i}"), 25.76 + i as f64 * 0.003, -80.19);
            poi.rating = 4.5;
            poi.price_label = "$300".to_string();
            poi
        })
        .collect()
}

/// `n` routes out of the same origin.
pub fn routes(n: usize) -> Vec<RoutePath> {
    let origin = Coordinate::new(25.7959, -80.2870);
    (0..n)
        .map(|i| {
            RoutePath::new(
                format!("MIA → R{i}"),
                origin,
                Coordinate::new(30.0 + i as f64, -90.0 - i as f64),
            )
        })
        .collect()
}

/// A catalog whose first waypoint is a global view, followed by the two-stop tour.
pub fn small_catalog() -> TourCatalog {
    let mut waypoints = vec![Waypoint::new("Global", 0.0, 0.0, 5.0)
        .with_altitude(80_000_000.0)
        .with_role(crate::StopRole::Global)];
    waypoints.extend(two_stop_tour());

    TourCatalog {
        waypoints,
        points_of_interest: points_of_interest(2),
        routes: routes(2),
    }
}
