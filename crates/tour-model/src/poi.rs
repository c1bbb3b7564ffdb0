//! Points of interest (hotels) shown during the lodging phase.

use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Immutable reference data for a place worth showing on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointOfInterest {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub rating: f32,
    /// Display string, e.g. "$450"
    pub price_label: String,
    pub description: String,
    #[serde(default)]
    pub amenities: Vec<String>,
    #[serde(default)]
    pub image_ref: String,
    #[serde(default)]
    pub website_ref: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

impl PointOfInterest {
    /// Creates a point of interest with only the fields the map needs.
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            name: name.into(),
            latitude,
            longitude,
            rating: 0.0,
            price_label: String::new(),
            description: String::new(),
            amenities: Vec::new(),
            image_ref: String::new(),
            website_ref: String::new(),
            phone: String::new(),
            address: String::new(),
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}
