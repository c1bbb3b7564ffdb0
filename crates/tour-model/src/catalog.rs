//! Static tour content: the location walkthrough, hotels and flight routes.
//!
//! A catalog is supplied once at startup and never mutated afterwards.

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::geo::Coordinate;
use crate::poi::PointOfInterest;
use crate::route::RoutePath;
use crate::waypoint::{StopRole, Waypoint};

/// Errors that can occur while loading a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Everything the tour shows, per phase.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TourCatalog {
    /// Ordered camera stops for the location phase
    #[serde(default)]
    pub waypoints: Vec<Waypoint>,
    /// Hotels for the lodging phase
    #[serde(default)]
    pub points_of_interest: Vec<PointOfInterest>,
    /// Flight routes for the final phase
    #[serde(default)]
    pub routes: Vec<RoutePath>,
}

impl TourCatalog {
    /// Loads a catalog from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self, CatalogError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Parses a catalog from a JSON string.
    pub fn from_json_str(content: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(content)?)
    }

    /// Serializes the catalog as pretty JSON.
    pub fn to_json(&self) -> Result<String, CatalogError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// The built-in Miami tour.
    pub fn miami() -> Self {
        Self {
            waypoints: miami_waypoints(),
            points_of_interest: miami_hotels(),
            routes: miami_routes(),
        }
    }
}

fn miami_waypoints() -> Vec<Waypoint> {
    vec![
        Waypoint::new("Global Earth View", 0.0, 0.0, 5.0)
            .with_altitude(80_000_000.0)
            .with_role(StopRole::Global)
            .with_detail("The starting point from a global perspective."),
        Waypoint::new("Miami Vantage", 25.761681, -80.191788, 6.0)
            .with_altitude(1000.0)
            .with_role(StopRole::Vantage)
            .with_detail("A breathtaking closer overview of Miami's skyline."),
        Waypoint::new("FTX Arena", 25.7814, -80.1870, 6.0)
            .with_altitude(1000.0)
            .with_detail("Home to the Miami Heat and a vibrant downtown destination."),
        Waypoint::new("South Beach", 25.790654, -80.1300455, 6.0)
            .with_altitude(1000.0)
            .with_detail("Famous for sandy beaches, lively nightlife, and iconic architecture."),
    ]
}

#[allow(clippy::too_many_arguments)]
fn hotel(
    name: &str,
    latitude: f64,
    longitude: f64,
    rating: f32,
    price: &str,
    description: &str,
    amenities: [&str; 4],
    image: &str,
    phone: &str,
    address: &str,
) -> PointOfInterest {
    PointOfInterest {
        name: name.to_string(),
        latitude,
        longitude,
        rating,
        price_label: price.to_string(),
        description: description.to_string(),
        amenities: amenities.iter().map(|a| a.to_string()).collect(),
        image_ref: image.to_string(),
        website_ref: "https://example.com".to_string(),
        phone: phone.to_string(),
        address: address.to_string(),
    }
}

fn miami_hotels() -> Vec<PointOfInterest> {
    vec![
        hotel(
            "Celestial Heights Resort",
            25.7814,
            -80.1870,
            4.8,
            "$450",
            "Ultra-modern luxury hotel with panoramic ocean views and AI-powered room automation",
            ["Infinity Pool", "Smart Rooms", "Spa", "Rooftop Restaurant"],
            "https://images.unsplash.com/photo-1582719478250-c89cae4dc85b?auto=format&fit=crop&w=800&q=80",
            "+1 (305) 555-0123",
            "100 Ocean Drive, Miami Beach, FL 33139",
        ),
        hotel(
            "Nova Marina Bay",
            25.790654,
            -80.1300455,
            4.9,
            "$580",
            "Boutique smart hotel featuring cutting-edge technology and personalized experiences",
            ["Private Beach", "Virtual Concierge", "Wellness Center", "Gourmet Dining"],
            "https://images.unsplash.com/photo-1571003123894-1f0594d2b5d9?auto=format&fit=crop&w=800&q=80",
            "+1 (305) 555-0124",
            "200 Collins Avenue, Miami Beach, FL 33139",
        ),
        hotel(
            "Digital Oasis Resort",
            25.761681,
            -80.191788,
            4.7,
            "$420",
            "Tech-forward accommodation with immersive entertainment and smart amenities",
            ["AR Experiences", "Smart Workspace", "Infinity Pool", "24/7 Robot Service"],
            "https://images.unsplash.com/photo-1566073771259-6a8506099945?auto=format&fit=crop&w=800&q=80",
            "+1 (305) 555-0125",
            "300 Brickell Avenue, Miami, FL 33131",
        ),
    ]
}

fn miami_routes() -> Vec<RoutePath> {
    let mia = Coordinate::new(25.7959, -80.2870);
    vec![
        RoutePath::new("MIA → LAX", mia, Coordinate::new(33.9416, -118.4085)),
        RoutePath::new("MIA → JFK", mia, Coordinate::new(40.6413, -73.7781)),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_miami_catalog_shape() {
        let catalog = TourCatalog::miami();
        assert_eq!(catalog.waypoints.len(), 4);
        assert_eq!(catalog.points_of_interest.len(), 3);
        assert_eq!(catalog.routes.len(), 2);

        assert_eq!(catalog.waypoints[0].role, StopRole::Global);
        assert_eq!(catalog.waypoints[1].role, StopRole::Vantage);
    }

    #[test]
    fn test_catalog_json_round_trip() {
        let catalog = TourCatalog::miami();
        let json = catalog.to_json().unwrap();
        let parsed = TourCatalog::from_json_str(&json).unwrap();
        assert_eq!(parsed, catalog);
    }

    #[test]
    fn test_partial_catalog_defaults_to_empty_lists() {
        let catalog = TourCatalog::from_json_str(r#"{"routes": []}"#).unwrap();
        assert!(catalog.waypoints.is_empty());
        assert!(catalog.points_of_interest.is_empty());
    }

    #[test]
    fn test_catalog_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{}", TourCatalog::miami().to_json().unwrap()).unwrap();

        let catalog = TourCatalog::from_file(file.path()).unwrap();
        assert_eq!(catalog.routes[0].name, "MIA → LAX");
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = TourCatalog::from_json_str("{ not json").unwrap_err();
        assert!(matches!(err, CatalogError::Json(_)));
    }
}
