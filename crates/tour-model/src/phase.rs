//! Tour phases.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stage of the guided tour.
///
/// Phases are ordered; a tour only ever moves forward through them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum TourPhase {
    /// Nothing has been triggered yet
    #[default]
    Idle,
    /// Camera walkthrough of the destination's landmarks
    Location,
    /// Hotel markers plus a walkthrough of each hotel
    Hotels,
    /// Flight route lines over a continental view
    Flights,
}

impl TourPhase {
    /// Returns the phase entered when the user-message count reaches `count`.
    pub fn for_trigger(count: u32) -> Option<Self> {
        match count {
            1 => Some(TourPhase::Location),
            2 => Some(TourPhase::Hotels),
            3 => Some(TourPhase::Flights),
            _ => None,
        }
    }

    /// Returns true once the final phase has been reached.
    pub fn is_final(self) -> bool {
        matches!(self, TourPhase::Flights)
    }
}

impl fmt::Display for TourPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TourPhase::Idle => write!(f, "idle"),
            TourPhase::Location => write!(f, "location"),
            TourPhase::Hotels => write!(f, "hotels"),
            TourPhase::Flights => write!(f, "flights"),
        }
    }
}
