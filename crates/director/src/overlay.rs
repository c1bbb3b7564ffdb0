//! The "now viewing" overlay.
//!
//! At most one record is active at a time. The overlay is shown shortly after
//! a flight starts (driven by the sequencer's enter callback) and hidden when
//! the stop's dwell ends or the run is cancelled.

use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tour_model::{PointOfInterest, Waypoint};
use tracing::trace;

use crate::sequencer::{SequenceHooks, TourStop};

/// What the overlay describes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OverlayRecord {
    Waypoint(Waypoint),
    PointOfInterest(PointOfInterest),
}

impl OverlayRecord {
    /// Heading shown in the overlay.
    pub fn title(&self) -> &str {
        match self {
            OverlayRecord::Waypoint(wp) => &wp.name,
            OverlayRecord::PointOfInterest(poi) => &poi.name,
        }
    }
}

/// Current overlay contents.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct OverlayState {
    /// Last record shown; kept after hiding
    pub active: Option<OverlayRecord>,
    pub visible: bool,
    /// Incremented on every show or hide
    pub revision: u64,
}

/// Owner of the single overlay. Cheap to clone; clones share state.
#[derive(Debug, Clone)]
pub struct OverlayScheduler {
    state: Arc<watch::Sender<OverlayState>>,
}

impl OverlayScheduler {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(OverlayState::default());
        Self {
            state: Arc::new(tx),
        }
    }

    /// Shows `record`, hiding whatever was visible first.
    pub fn show(&self, record: OverlayRecord) {
        self.hide();
        trace!(title = record.title(), "overlay shown");
        self.state.send_modify(|state| {
            state.active = Some(record);
            state.visible = true;
            state.revision += 1;
        });
    }

    /// Hides the overlay. Returns false if it was already hidden.
    pub fn hide(&self) -> bool {
        self.state.send_if_modified(|state| {
            if !state.visible {
                return false;
            }
            state.visible = false;
            state.revision += 1;
            true
        })
    }

    pub fn is_visible(&self) -> bool {
        self.state.borrow().visible
    }

    /// The record currently on screen, if the overlay is visible.
    pub fn visible_record(&self) -> Option<OverlayRecord> {
        let state = self.state.borrow();
        if state.visible {
            state.active.clone()
        } else {
            None
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state.borrow().clone()
    }

    /// Observes overlay changes.
    pub fn subscribe(&self) -> watch::Receiver<OverlayState> {
        self.state.subscribe()
    }

    /// Sequence hooks that drive this overlay.
    pub fn hooks(&self) -> Arc<dyn SequenceHooks> {
        Arc::new(OverlayHooks {
            overlay: self.clone(),
        })
    }
}

impl Default for OverlayScheduler {
    fn default() -> Self {
        Self::new()
    }
}

/// Shows each stop's record on enter and hides it when its dwell ends.
#[derive(Debug, Clone)]
pub struct OverlayHooks {
    overlay: OverlayScheduler,
}

impl SequenceHooks for OverlayHooks {
    fn on_enter(&self, stop: &TourStop) {
        self.overlay.show(stop.record.clone());
    }

    fn on_dwell_elapsed(&self, _stop: &TourStop) {
        self.overlay.hide();
    }

    fn on_cancelled(&self) {
        // A cancelled run must not leave its overlay stuck on screen.
        self.overlay.hide();
    }

    fn on_finished(&self) {
        self.overlay.hide();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spot(name: &str) -> OverlayRecord {
        OverlayRecord::Waypoint(Waypoint::new(name, 0.0, 0.0, 1.0))
    }

    #[test]
    fn test_show_and_hide() {
        let overlay = OverlayScheduler::new();
        assert!(!overlay.is_visible());

        overlay.show(spot("A"));
        assert!(overlay.is_visible());
        assert_eq!(overlay.visible_record().unwrap().title(), "A");

        assert!(overlay.hide());
        assert!(!overlay.is_visible());
        assert!(overlay.visible_record().is_none());
        // Last record is kept
        assert_eq!(overlay.state().active.unwrap().title(), "A");
    }

    #[test]
    fn test_hide_when_hidden_is_noop() {
        let overlay = OverlayScheduler::new();
        assert!(!overlay.hide());
        assert_eq!(overlay.state().revision, 0);
    }

    #[test]
    fn test_show_replaces_previous() {
        let overlay = OverlayScheduler::new();
        overlay.show(spot("A"));
        overlay.show(spot("B"));

        let state = overlay.state();
        assert!(state.visible);
        assert_eq!(state.active.unwrap().title(), "B");
        // show A, hide A, show B
        assert_eq!(state.revision, 3);
    }

    #[test]
    fn test_clones_share_state() {
        let overlay = OverlayScheduler::new();
        let clone = overlay.clone();
        clone.show(spot("A"));
        assert!(overlay.is_visible());
    }

    #[test]
    fn test_subscriber_sees_changes() {
        let overlay = OverlayScheduler::new();
        let mut rx = overlay.subscribe();
        assert!(!rx.has_changed().unwrap());

        overlay.show(OverlayRecord::PointOfInterest(PointOfInterest::new(
            "Nova Marina Bay",
            25.79,
            -80.13,
        )));
        assert!(rx.has_changed().unwrap());
        let state = rx.borrow_and_update();
        assert_eq!(state.active.as_ref().unwrap().title(), "Nova Marina Bay");
    }

    #[test]
    fn test_hooks_follow_stop_lifecycle() {
        let overlay = OverlayScheduler::new();
        let hooks = overlay.hooks();
        let stop = TourStop::from_waypoint(
            &Waypoint::new("Pier", 25.0, -80.0, 2.0),
            &crate::config::LocationConfig::default(),
        );

        hooks.on_enter(&stop);
        assert_eq!(overlay.visible_record().unwrap().title(), "Pier");
        hooks.on_settled(&stop);
        assert!(overlay.is_visible());
        hooks.on_dwell_elapsed(&stop);
        assert!(!overlay.is_visible());

        hooks.on_enter(&stop);
        hooks.on_cancelled();
        assert!(!overlay.is_visible());
    }
}
