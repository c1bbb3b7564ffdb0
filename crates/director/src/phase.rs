//! Tour phase state machine.

use std::sync::Arc;
use tokio::sync::watch;
use tour_model::{TourCatalog, TourPhase};
use tracing::{debug, info, warn};

use crate::config::TourConfig;
use crate::conversation::{Conversation, SystemMessage};
use crate::entities::EntityRenderer;
use crate::overlay::OverlayScheduler;
use crate::sequencer::{CameraSequencer, RunHandle, SequencePlan, TourStop};
use crate::viewport::ViewportSlot;

/// Advances the tour as the user-message count grows.
///
/// The controller owns the sequencer, the entity renderer and the overlay,
/// and is the only component that starts camera runs. Each phase's setup
/// fires exactly once: a count only acts when it exceeds every count seen so
/// far and names a phase beyond the current one.
pub struct PhaseController {
    /// Timing, framing and styling
    config: Arc<TourConfig>,
    /// Waypoints, hotels and routes to present
    catalog: Arc<TourCatalog>,
    /// Shared viewport attachment
    viewport: ViewportSlot,
    /// Where status lines go
    conversation: Arc<dyn Conversation>,
    sequencer: CameraSequencer,
    renderer: EntityRenderer,
    overlay: OverlayScheduler,
    /// Highest trigger count observed
    last_trigger: u32,
    /// Current phase, published to observers
    phase: watch::Sender<TourPhase>,
    /// Handle of the most recent camera run
    live_run: Option<RunHandle>,
}

impl PhaseController {
    /// Creates a controller in [`TourPhase::Idle`].
    pub fn new(
        config: impl Into<Arc<TourConfig>>,
        catalog: impl Into<Arc<TourCatalog>>,
        viewport: ViewportSlot,
        conversation: Arc<dyn Conversation>,
    ) -> Self {
        let config = config.into();
        let (phase, _) = watch::channel(TourPhase::Idle);
        Self {
            sequencer: CameraSequencer::new(viewport.clone()),
            renderer: EntityRenderer::new(viewport.clone(), config.clone()),
            overlay: OverlayScheduler::new(),
            config,
            catalog: catalog.into(),
            viewport,
            conversation,
            last_trigger: 0,
            phase,
            live_run: None,
        }
    }

    /// Creates a controller for the built-in Miami tour with default settings.
    pub fn with_defaults(viewport: ViewportSlot, conversation: Arc<dyn Conversation>) -> Self {
        Self::new(
            TourConfig::default(),
            TourCatalog::miami(),
            viewport,
            conversation,
        )
    }

    /// Reacts to a new user-message count.
    ///
    /// Returns the phase entered, or `None` when the count is stale, repeats
    /// an earlier one, or names no phase ahead of the current one.
    pub fn on_trigger_count_changed(&mut self, count: u32) -> Option<TourPhase> {
        if count <= self.last_trigger {
            debug!(count, last = self.last_trigger, "trigger count not new");
            return None;
        }
        self.last_trigger = count;

        let next = TourPhase::for_trigger(count)?;
        let current = self.phase();
        if next <= current {
            return None;
        }

        info!(from = %current, to = %next, count, "tour phase advanced");
        self.phase.send_replace(next);
        self.stage(next);

        let text = match next {
            TourPhase::Hotels => Some(&self.config.messages.lodging),
            TourPhase::Flights => Some(&self.config.messages.routes),
            TourPhase::Idle | TourPhase::Location => None,
        };
        if let Some(text) = text {
            self.conversation
                .append_system_message(SystemMessage::new(text.clone(), next));
        }
        Some(next)
    }

    /// Re-runs the current phase's camera and entity work.
    ///
    /// The phase does not change and no status message is posted. Returns
    /// false in [`TourPhase::Idle`].
    pub fn restart_phase(&mut self) -> bool {
        let phase = self.phase();
        if phase == TourPhase::Idle {
            return false;
        }
        info!(%phase, "restarting tour phase");
        self.stage(phase);
        true
    }

    /// Cancels the outgoing run, then starts `phase`'s work.
    fn stage(&mut self, phase: TourPhase) {
        self.preempt();
        if !self.viewport.is_attached() {
            warn!(%phase, "viewport detached; phase staging skipped");
            return;
        }

        match phase {
            TourPhase::Idle => {}
            TourPhase::Location => {
                let stops = self
                    .catalog
                    .waypoints
                    .iter()
                    .map(|wp| TourStop::from_waypoint(wp, &self.config.location))
                    .collect();
                let plan = SequencePlan::location(&self.config.location);
                self.live_run = Some(self.sequencer.run(stops, plan, self.overlay.hooks()));
            }
            TourPhase::Hotels => {
                self.live_run = Some(self.renderer.render_points_of_interest(
                    &self.catalog.points_of_interest,
                    &self.sequencer,
                    self.overlay.hooks(),
                ));
            }
            TourPhase::Flights => {
                self.renderer.render_routes(&self.catalog.routes);
            }
        }
    }

    fn preempt(&mut self) {
        if self.sequencer.cancel_live() {
            debug!("outgoing camera run cancelled");
        }
        self.overlay.hide();
        self.live_run = None;
    }

    pub fn phase(&self) -> TourPhase {
        *self.phase.borrow()
    }

    pub fn last_trigger(&self) -> u32 {
        self.last_trigger
    }

    /// Observes phase changes.
    pub fn subscribe_phase(&self) -> watch::Receiver<TourPhase> {
        self.phase.subscribe()
    }

    pub fn overlay(&self) -> &OverlayScheduler {
        &self.overlay
    }

    /// Handle of the current phase's camera run, if it started one.
    pub fn live_run(&self) -> Option<RunHandle> {
        self.live_run.clone()
    }
}

impl std::fmt::Debug for PhaseController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PhaseController")
            .field("phase", &self.phase())
            .field("last_trigger", &self.last_trigger)
            .field("viewport", &self.viewport)
            .field("live_run", &self.live_run)
            .finish()
    }
}
