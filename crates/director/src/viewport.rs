//! The viewport capability the director drives.
//!
//! The director never talks to a renderer directly. It issues camera flights
//! and entity edits through [`Viewport`], reached via a [`ViewportSlot`] that
//! may be attached or detached at any time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::sync::oneshot;
use tour_model::{Coordinate, Position};

/// Resolves once when the camera settles at the end of a flight.
///
/// A viewport that drops the sender without sending has abandoned the flight.
pub type FlightCompletion = oneshot::Receiver<()>;

/// Identifier the viewport assigns to an added entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ent_{:05}", self.0)
    }
}

/// A sphere the camera should frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetRegion {
    pub center: Position,
    pub radius_m: f64,
}

impl TargetRegion {
    /// Region centred on a ground-level coordinate.
    pub fn around(coordinate: Coordinate, radius_m: f64) -> Self {
        Self {
            center: coordinate.at_height(0.0),
            radius_m,
        }
    }
}

/// Camera offset from the framed region's center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeadingPitchRange {
    pub heading_rad: f64,
    pub pitch_rad: f64,
    pub range_m: f64,
}

impl HeadingPitchRange {
    /// North-up view at the given pitch and range.
    pub fn north_up(pitch_rad: f64, range_m: f64) -> Self {
        Self {
            heading_rad: 0.0,
            pitch_rad,
            range_m,
        }
    }
}

/// A complete flight command.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Flight {
    pub target: TargetRegion,
    pub offset: HeadingPitchRange,
    pub duration: Duration,
}

/// RGBA color with components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Parses `#RRGGBB`.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let digits = hex.strip_prefix('#')?;
        if digits.len() != 6 || !digits.is_ascii() {
            return None;
        }
        let channel = |i: usize| {
            u8::from_str_radix(&digits[i..i + 2], 16)
                .ok()
                .map(|v| f32::from(v) / 255.0)
        };
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha.clamp(0.0, 1.0);
        self
    }
}

/// Concentric-ring marker glyph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RingGlyph {
    pub outer: Color,
    pub inner: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelStyle {
    pub font: String,
    pub fill: Color,
    pub outline: Color,
    pub outline_width: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background: Option<Color>,
    /// Screen-space offset in pixels (x, y)
    pub pixel_offset: (f32, f32),
}

/// Rendering attributes of a single entity. Descriptors carry no behavior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntityDescriptor {
    Marker {
        position: Position,
        glyph: RingGlyph,
        scale: f32,
    },
    Label {
        position: Position,
        text: String,
        style: LabelStyle,
    },
    Polyline {
        positions: Vec<Position>,
        width: f32,
        color: Color,
        outline_color: Color,
        outline_width: f32,
    },
}

impl EntityDescriptor {
    /// Label text, if this is a label.
    pub fn text(&self) -> Option<&str> {
        match self {
            EntityDescriptor::Label { text, .. } => Some(text),
            _ => None,
        }
    }

    pub fn is_marker(&self) -> bool {
        matches!(self, EntityDescriptor::Marker { .. })
    }

    pub fn is_label(&self) -> bool {
        matches!(self, EntityDescriptor::Label { .. })
    }

    pub fn is_polyline(&self) -> bool {
        matches!(self, EntityDescriptor::Polyline { .. })
    }
}

/// A 3D scene that can fly its camera and draw point/line entities.
pub trait Viewport: Send + Sync {
    /// Starts a camera flight. The returned completion fires once when the
    /// camera settles.
    fn fly_to(
        &self,
        target: TargetRegion,
        offset: HeadingPitchRange,
        duration: Duration,
    ) -> FlightCompletion;

    /// Adds an entity to the entity layer.
    fn add_entity(&self, descriptor: EntityDescriptor) -> EntityId;

    /// Removes every entity from the entity layer.
    fn clear_entities(&self);
}

/// Shared attach/detach holder for the one viewport instance.
///
/// Cloning a slot shares it; every component constructed from the same slot
/// sees the same attachment state.
#[derive(Clone, Default)]
pub struct ViewportSlot {
    inner: Arc<RwLock<Option<Arc<dyn Viewport>>>>,
}

impl ViewportSlot {
    /// Creates an empty (detached) slot.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Creates a slot with the viewport already attached.
    pub fn attached(viewport: Arc<dyn Viewport>) -> Self {
        let slot = Self::default();
        slot.attach(viewport);
        slot
    }

    /// Attaches a viewport, replacing any previous one.
    pub fn attach(&self, viewport: Arc<dyn Viewport>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(viewport);
    }

    /// Detaches the viewport. Returns true if one was attached.
    pub fn detach(&self) -> bool {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
    }

    pub fn is_attached(&self) -> bool {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Returns the attached viewport, if any.
    pub fn current(&self) -> Option<Arc<dyn Viewport>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl fmt::Debug for ViewportSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewportSlot")
            .field("attached", &self.is_attached())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::HeadlessViewport;

    #[test]
    fn test_color_from_hex() {
        let gold = Color::from_hex("#F7B500").unwrap();
        assert!((gold.r - 247.0 / 255.0).abs() < 1e-6);
        assert!((gold.g - 181.0 / 255.0).abs() < 1e-6);
        assert_eq!(gold.b, 0.0);
        assert_eq!(gold.a, 1.0);

        assert_eq!(Color::from_hex("#000000"), Some(Color::BLACK));
        assert_eq!(Color::from_hex("#ffffff"), Some(Color::WHITE));
    }

    #[test]
    fn test_color_from_hex_rejects_garbage() {
        assert!(Color::from_hex("F7B500").is_none());
        assert!(Color::from_hex("#F7B5").is_none());
        assert!(Color::from_hex("#GGGGGG").is_none());
        assert!(Color::from_hex("#ÄÄÄ").is_none());
    }

    #[test]
    fn test_with_alpha_clamps() {
        assert_eq!(Color::WHITE.with_alpha(0.7).a, 0.7);
        assert_eq!(Color::WHITE.with_alpha(3.0).a, 1.0);
    }

    #[test]
    fn test_slot_attach_detach() {
        let slot = ViewportSlot::detached();
        assert!(!slot.is_attached());
        assert!(slot.current().is_none());

        slot.attach(Arc::new(HeadlessViewport::new()));
        assert!(slot.is_attached());

        // Clones share attachment state
        let clone = slot.clone();
        assert!(clone.detach());
        assert!(!slot.is_attached());
        assert!(!clone.detach());
    }

    #[test]
    fn test_descriptor_serialization_is_tagged() {
        let label = EntityDescriptor::Label {
            position: Coordinate::new(1.0, 2.0).at_height(3.0),
            text: "Hotel".to_string(),
            style: LabelStyle {
                font: "16px Poppins".to_string(),
                fill: Color::WHITE,
                outline: Color::BLACK,
                outline_width: 2.0,
                background: None,
                pixel_offset: (0.0, -30.0),
            },
        };
        let json = serde_json::to_string(&label).unwrap();
        assert!(json.contains(r#""kind":"label""#));
        assert_eq!(label.text(), Some("Hotel"));
        assert!(label.is_label());
    }
}
