//! Configuration loading for the tour director.
//!
//! All timing, framing and styling values are loaded from a TOML file.
//! Every section is optional; missing keys fall back to the defaults below.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tour_model::Coordinate;

use crate::viewport::Color;

/// Complete tour configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TourConfig {
    /// Location walkthrough settings
    #[serde(default)]
    pub location: LocationConfig,
    /// Hotel markers and walkthrough settings
    #[serde(default)]
    pub lodging: LodgingConfig,
    /// Flight route settings
    #[serde(default)]
    pub routes: RoutesConfig,
    /// Entity colors and fonts
    #[serde(default)]
    pub style: StyleConfig,
    /// Status lines posted to the conversation
    #[serde(default)]
    pub messages: MessagesConfig,
}

impl TourConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    /// Parses and validates configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes this configuration as a TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Checks that every duration and distance is finite and non-negative
    /// and that every color parses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let non_negative = [
            ("location.flight_duration_secs", self.location.flight_duration_secs),
            ("location.enter_delay_secs", self.location.enter_delay_secs),
            ("location.default_range_m", self.location.default_range_m),
            ("location.target_radius_m", self.location.target_radius_m),
            ("lodging.marker_elevation_m", self.lodging.marker_elevation_m),
            ("lodging.overview_duration_secs", self.lodging.overview_duration_secs),
            ("lodging.overview_min_radius_m", self.lodging.overview_min_radius_m),
            ("lodging.overview_range_m", self.lodging.overview_range_m),
            ("lodging.flight_duration_secs", self.lodging.flight_duration_secs),
            ("lodging.view_duration_secs", self.lodging.view_duration_secs),
            ("lodging.enter_delay_secs", self.lodging.enter_delay_secs),
            ("lodging.stop_radius_m", self.lodging.stop_radius_m),
            ("lodging.stop_range_m", self.lodging.stop_range_m),
            ("routes.line_elevation_m", self.routes.line_elevation_m),
            ("routes.label_elevation_m", self.routes.label_elevation_m),
            ("routes.line_width", self.routes.line_width),
            ("routes.overview_radius_m", self.routes.overview_radius_m),
            ("routes.overview_range_m", self.routes.overview_range_m),
            ("routes.overview_duration_secs", self.routes.overview_duration_secs),
            ("style.label_background_alpha", self.style.label_background_alpha),
            ("style.route_alpha", self.style.route_alpha),
            ("style.route_outline_width", self.style.route_outline_width),
        ];
        for (field, value) in non_negative {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("must be a finite, non-negative number (got {value})"),
                });
            }
        }

        if !self.location.pitch_deg.is_finite() {
            return Err(ConfigError::Invalid {
                field: "location.pitch_deg",
                reason: "must be finite".to_string(),
            });
        }

        let colors = [
            ("style.marker_color", &self.style.marker_color),
            ("style.marker_core_color", &self.style.marker_core_color),
            ("style.label_color", &self.style.label_color),
            ("style.label_background", &self.style.label_background),
            ("style.route_color", &self.style.route_color),
            ("style.route_outline_color", &self.style.route_outline_color),
        ];
        for (field, hex) in colors {
            if Color::from_hex(hex).is_none() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: format!("'{hex}' is not a #RRGGBB color"),
                });
            }
        }

        Ok(())
    }
}

/// Converts configured seconds to a duration, collapsing invalid values to zero.
pub(crate) fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}

/// Location walkthrough configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationConfig {
    /// First waypoint flown to; earlier entries are treated as pre-positioned
    pub start_index: usize,
    /// Duration of each camera flight
    pub flight_duration_secs: f64,
    /// Delay between issuing a flight and labeling it in the overlay
    pub enter_delay_secs: f64,
    /// Camera range for waypoints without a fixed altitude
    pub default_range_m: f64,
    /// Camera pitch for every flight in the tour
    pub pitch_deg: f64,
    /// Radius of the region framed around each waypoint
    pub target_radius_m: f64,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            start_index: 1,
            flight_duration_secs: 8.0,
            enter_delay_secs: 1.0,
            default_range_m: tour_model::DEFAULT_ALTITUDE_M,
            pitch_deg: -45.0,
            target_radius_m: 1.0,
        }
    }
}

impl LocationConfig {
    pub fn flight_duration(&self) -> Duration {
        secs(self.flight_duration_secs)
    }

    pub fn enter_delay(&self) -> Duration {
        secs(self.enter_delay_secs)
    }

    pub fn pitch_rad(&self) -> f64 {
        self.pitch_deg.to_radians()
    }
}

/// Hotel markers and walkthrough configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LodgingConfig {
    /// Height of hotel markers and labels above the ground
    pub marker_elevation_m: f64,
    /// Duration of the recenter flight over all hotels
    pub overview_duration_secs: f64,
    /// Lower bound on the radius framed by the recenter flight
    pub overview_min_radius_m: f64,
    /// Camera range for the recenter flight
    pub overview_range_m: f64,
    /// Duration of each flight between hotels
    pub flight_duration_secs: f64,
    /// How long each hotel stays on screen once the camera settles
    pub view_duration_secs: f64,
    /// Delay between issuing a flight and showing the hotel overlay
    pub enter_delay_secs: f64,
    /// Radius of the region framed around each hotel
    pub stop_radius_m: f64,
    /// Camera range at each hotel
    pub stop_range_m: f64,
}

impl Default for LodgingConfig {
    fn default() -> Self {
        Self {
            marker_elevation_m: 200.0,
            overview_duration_secs: 3.0,
            overview_min_radius_m: 5000.0,
            overview_range_m: 800.0,
            flight_duration_secs: 4.0,
            view_duration_secs: 3.0,
            enter_delay_secs: 1.0,
            stop_radius_m: 50.0,
            stop_range_m: 300.0,
        }
    }
}

impl LodgingConfig {
    pub fn overview_duration(&self) -> Duration {
        secs(self.overview_duration_secs)
    }

    pub fn flight_duration(&self) -> Duration {
        secs(self.flight_duration_secs)
    }

    pub fn view_duration(&self) -> Duration {
        secs(self.view_duration_secs)
    }

    pub fn enter_delay(&self) -> Duration {
        secs(self.enter_delay_secs)
    }
}

/// Flight route configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Height at which route lines are drawn
    pub line_elevation_m: f64,
    /// Height of the route name label
    pub label_elevation_m: f64,
    /// Route line width in pixels
    pub line_width: f64,
    /// Center of the fixed continental view
    pub overview_center: Coordinate,
    pub overview_radius_m: f64,
    pub overview_range_m: f64,
    pub overview_duration_secs: f64,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            line_elevation_m: 2000.0,
            label_elevation_m: 2700.0,
            line_width: 5.0,
            overview_center: Coordinate::new(37.0, -96.0),
            overview_radius_m: 4_000_000.0,
            overview_range_m: 6_000_000.0,
            overview_duration_secs: 3.0,
        }
    }
}

impl RoutesConfig {
    pub fn overview_duration(&self) -> Duration {
        secs(self.overview_duration_secs)
    }
}

/// Entity styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StyleConfig {
    pub marker_color: String,
    pub marker_core_color: String,
    pub label_font: String,
    pub label_color: String,
    pub label_background: String,
    pub label_background_alpha: f64,
    pub route_color: String,
    pub route_alpha: f64,
    pub route_outline_color: String,
    pub route_outline_width: f64,
    pub route_label_font: String,
}

impl Default for StyleConfig {
    fn default() -> Self {
        Self {
            marker_color: "#F7B500".to_string(),
            marker_core_color: "#000000".to_string(),
            label_font: "16px Poppins".to_string(),
            label_color: "#F7B500".to_string(),
            label_background: "#000000".to_string(),
            label_background_alpha: 0.7,
            route_color: "#00FFFF".to_string(),
            route_alpha: 0.7,
            route_outline_color: "#0000FF".to_string(),
            route_outline_width: 2.0,
            route_label_font: "18px Poppins".to_string(),
        }
    }
}

/// Status lines posted when a phase begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessagesConfig {
    pub lodging: String,
    pub routes: String,
}

impl Default for MessagesConfig {
    fn default() -> Self {
        Self {
            lodging: "Here are some excellent hotels in the area! Click on any marker or watch the tour."
                .to_string(),
            routes: "Check out these flights. You'll see clear and sleek flight paths above the earth."
                .to_string(),
        }
    }
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error reading config file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Error parsing TOML config
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    /// Error serializing TOML config
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    /// A value parsed but is out of range
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Generates a default configuration file content.
pub fn default_config_toml() -> String {
    r##"# Tour Director Configuration

[location]
start_index = 1
flight_duration_secs = 8.0
enter_delay_secs = 1.0
default_range_m = 1000.0
pitch_deg = -45.0
target_radius_m = 1.0

[lodging]
marker_elevation_m = 200.0
overview_duration_secs = 3.0
overview_min_radius_m = 5000.0
overview_range_m = 800.0
flight_duration_secs = 4.0
view_duration_secs = 3.0
enter_delay_secs = 1.0
stop_radius_m = 50.0
stop_range_m = 300.0

[routes]
line_elevation_m = 2000.0
label_elevation_m = 2700.0
line_width = 5.0
overview_center = { latitude = 37.0, longitude = -96.0 }
overview_radius_m = 4000000.0
overview_range_m = 6000000.0
overview_duration_secs = 3.0

[style]
marker_color = "#F7B500"
marker_core_color = "#000000"
label_font = "16px Poppins"
label_color = "#F7B500"
label_background = "#000000"
label_background_alpha = 0.7
route_color = "#00FFFF"
route_alpha = 0.7
route_outline_color = "#0000FF"
route_outline_width = 2.0
route_label_font = "18px Poppins"

[messages]
lodging = "Here are some excellent hotels in the area! Click on any marker or watch the tour."
routes = "Check out these flights. You'll see clear and sleek flight paths above the earth."
"##
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = TourConfig::default();

        assert_eq!(config.location.start_index, 1);
        assert_eq!(config.location.flight_duration(), Duration::from_secs(8));
        assert_eq!(config.lodging.flight_duration(), Duration::from_secs(4));
        assert_eq!(config.lodging.view_duration(), Duration::from_secs(3));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_config_toml_matches_defaults() {
        let config = TourConfig::from_str(&default_config_toml()).unwrap();
        assert_eq!(config, TourConfig::default());
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let toml = r#"
            [location]
            flight_duration_secs = 2.5
        "#;

        let config = TourConfig::from_str(toml).unwrap();

        // Specified value
        assert_eq!(config.location.flight_duration(), Duration::from_millis(2500));
        // Default values
        assert_eq!(config.location.start_index, 1);
        assert_eq!(config.lodging.stop_range_m, 300.0);
        assert_eq!(config.routes.overview_center, Coordinate::new(37.0, -96.0));
    }

    #[test]
    fn test_negative_duration_rejected() {
        let toml = r#"
            [lodging]
            view_duration_secs = -1.0
        "#;

        let err = TourConfig::from_str(toml).unwrap_err();
        assert!(
            matches!(err, ConfigError::Invalid { field: "lodging.view_duration_secs", .. }),
            "unexpected error: {err}"
        );
    }

    #[test]
    fn test_bad_color_rejected() {
        let toml = r#"
            [style]
            route_color = "cyan"
        "#;

        let err = TourConfig::from_str(toml).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "style.route_color", .. }));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = TourConfig::from_str("[location\nstart_index = ").unwrap_err();
        assert!(matches!(err, ConfigError::Toml(_)));
    }

    #[test]
    fn test_config_to_toml_round_trip() {
        let config = TourConfig::default();
        let toml = config.to_toml().unwrap();

        assert!(toml.contains("[location]"));
        assert!(toml.contains("[messages]"));
        assert_eq!(TourConfig::from_str(&toml).unwrap(), config);
    }

    #[test]
    fn test_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[location]\nstart_index = 0").unwrap();

        let config = TourConfig::from_file(file.path()).unwrap();
        assert_eq!(config.location.start_index, 0);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = TourConfig::from_file(Path::new("/definitely/not/here.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
