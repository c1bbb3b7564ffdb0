//! Tour director: camera sequencing and phase control for a guided tour.
//!
//! The director sits between the conversation and the 3D viewport. It watches
//! the count of user messages, and as each threshold is crossed it stages the
//! next part of the tour: a camera walkthrough of the destination, hotel
//! markers with a walkthrough of each hotel, and finally flight routes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  trigger count  ┌─────────────────┐   fly_to / entities   ┌──────────┐
//! │ conversation │ ──────────────▶ │ PhaseController │ ────────────────────▶ │ viewport │
//! └──────────────┘ ◀────────────── └─────────────────┘                       └──────────┘
//!                   status lines     │    │       │
//!                                    ▼    ▼       ▼
//!                            sequencer  overlay  entities
//! ```
//!
//! # Modules
//!
//! - [`phase`]: Trigger-count state machine
//! - [`sequencer`]: Cancellable camera runs over an ordered list of stops
//! - [`overlay`]: The single "now viewing" overlay
//! - [`entities`]: Hotel markers and route lines
//! - [`viewport`]: The viewport capability and its attach/detach slot
//! - [`headless`]: A journaling viewport with no renderer
//! - [`conversation`]: Status-line sink
//! - [`config`]: TOML configuration

pub mod config;
pub mod conversation;
pub mod entities;
pub mod headless;
pub mod overlay;
pub mod phase;
pub mod sequencer;
pub mod viewport;

// Re-export config types
pub use config::{
    default_config_toml, ConfigError, LocationConfig, LodgingConfig, MessagesConfig,
    RoutesConfig, StyleConfig, TourConfig,
};

// Re-export engine types
pub use conversation::{Conversation, SystemMessage, Transcript};
pub use entities::EntityRenderer;
pub use headless::{FlightRecord, HeadlessViewport, ViewportCommand};
pub use overlay::{OverlayHooks, OverlayRecord, OverlayScheduler, OverlayState};
pub use phase::PhaseController;
pub use sequencer::{
    CameraSequencer, RunHandle, RunOutcome, SequenceHooks, SequencePlan, TourStop,
    DEFAULT_ENTER_DELAY,
};
pub use viewport::{
    Color, EntityDescriptor, EntityId, Flight, FlightCompletion, HeadingPitchRange, LabelStyle,
    RingGlyph, TargetRegion, Viewport, ViewportSlot,
};
