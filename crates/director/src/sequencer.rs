//! Camera sequencing.
//!
//! A run flies the camera through an ordered list of stops, one flight at a
//! time: issue the flight, label the stop after a short delay, wait for the
//! camera to settle, hold for the stop's dwell, then move on. Only one run is
//! live at a time. Every continuation captures its run token and re-checks it
//! under the gate lock before touching the viewport or calling a hook, so a
//! superseded run can never act again. Settling a run also cancels its
//! [`CancellationToken`], which wakes the task out of any pending flight or
//! dwell so it exits immediately.

use serde::Serialize;
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tour_model::{PointOfInterest, Waypoint};
use tracing::{debug, warn};

use crate::config::{LocationConfig, LodgingConfig};
use crate::overlay::OverlayRecord;
use crate::viewport::{Flight, FlightCompletion, HeadingPitchRange, TargetRegion, ViewportSlot};

/// Default delay between issuing a flight and the enter callback.
pub const DEFAULT_ENTER_DELAY: Duration = Duration::from_secs(1);

/// One stop of a camera run.
#[derive(Debug, Clone, PartialEq)]
pub struct TourStop {
    pub label: String,
    pub target: TargetRegion,
    pub offset: HeadingPitchRange,
    /// Hold time after the camera settles
    pub dwell: Duration,
    /// Shown in the overlay while this stop is on screen
    pub record: OverlayRecord,
}

impl TourStop {
    /// Stop for a location waypoint. Range is the waypoint's fixed altitude,
    /// or the configured default.
    pub fn from_waypoint(waypoint: &Waypoint, config: &LocationConfig) -> Self {
        Self {
            label: waypoint.name.clone(),
            target: TargetRegion::around(waypoint.coordinate(), config.target_radius_m),
            offset: HeadingPitchRange::north_up(
                config.pitch_rad(),
                waypoint.altitude_or(config.default_range_m),
            ),
            dwell: waypoint.dwell(),
            record: OverlayRecord::Waypoint(waypoint.clone()),
        }
    }

    /// Stop for a hotel walkthrough; every hotel gets the same view duration.
    pub fn from_point_of_interest(
        poi: &PointOfInterest,
        config: &LodgingConfig,
        pitch_rad: f64,
    ) -> Self {
        Self {
            label: poi.name.clone(),
            target: TargetRegion::around(poi.coordinate(), config.stop_radius_m),
            offset: HeadingPitchRange::north_up(pitch_rad, config.stop_range_m),
            dwell: config.view_duration(),
            record: OverlayRecord::PointOfInterest(poi.clone()),
        }
    }
}

/// Timing for a run.
#[derive(Debug, Clone, PartialEq)]
pub struct SequencePlan {
    /// Stops before this index are skipped
    pub start_index: usize,
    pub flight_duration: Duration,
    pub enter_delay: Duration,
    /// Flight to complete before the first stop
    pub lead_in: Option<Flight>,
}

impl SequencePlan {
    pub fn new(flight_duration: Duration) -> Self {
        Self {
            start_index: 0,
            flight_duration,
            enter_delay: DEFAULT_ENTER_DELAY,
            lead_in: None,
        }
    }

    /// Plan for the location walkthrough.
    pub fn location(config: &LocationConfig) -> Self {
        Self::new(config.flight_duration())
            .with_start_index(config.start_index)
            .with_enter_delay(config.enter_delay())
    }

    /// Plan for the hotel walkthrough.
    pub fn walkthrough(config: &LodgingConfig) -> Self {
        Self::new(config.flight_duration()).with_enter_delay(config.enter_delay())
    }

    pub fn with_start_index(mut self, start_index: usize) -> Self {
        self.start_index = start_index;
        self
    }

    pub fn with_enter_delay(mut self, enter_delay: Duration) -> Self {
        self.enter_delay = enter_delay;
        self
    }

    pub fn with_lead_in(mut self, lead_in: Flight) -> Self {
        self.lead_in = Some(lead_in);
        self
    }

    fn is_empty_for(&self, stops: &[TourStop]) -> bool {
        self.lead_in.is_none() && self.start_index >= stops.len()
    }
}

/// Callbacks a run makes as it progresses.
///
/// Hooks are called while the run gate is held: they must not start or
/// cancel runs themselves.
pub trait SequenceHooks: Send + Sync {
    /// The stop's flight has been underway for the plan's enter delay.
    fn on_enter(&self, stop: &TourStop);

    /// The camera has settled on the stop.
    fn on_settled(&self, _stop: &TourStop) {}

    /// The stop's dwell has elapsed; the next flight follows immediately.
    fn on_dwell_elapsed(&self, _stop: &TourStop) {}

    /// The run was superseded, cancelled or cut short.
    fn on_cancelled(&self) {}

    /// Every stop has been visited.
    fn on_finished(&self) {}
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunOutcome {
    /// Every stop was visited
    Completed,
    /// Superseded by a newer run or cancelled explicitly
    Cancelled,
    /// Never started: no viewport or no async runtime
    Skipped,
    /// The viewport abandoned a flight
    Interrupted,
    /// The viewport was detached mid-run
    ViewportDetached,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunOutcome::Completed => "completed",
            RunOutcome::Cancelled => "cancelled",
            RunOutcome::Skipped => "skipped",
            RunOutcome::Interrupted => "interrupted",
            RunOutcome::ViewportDetached => "viewport_detached",
        };
        f.write_str(name)
    }
}

struct LiveRun {
    token: u64,
    hooks: Arc<dyn SequenceHooks>,
    outcome: watch::Sender<Option<RunOutcome>>,
    cancel: CancellationToken,
}

impl LiveRun {
    fn settle(self, outcome: RunOutcome) {
        self.cancel.cancel();
        match outcome {
            RunOutcome::Completed => self.hooks.on_finished(),
            _ => self.hooks.on_cancelled(),
        }
        debug!(token = self.token, %outcome, "camera run ended");
        self.outcome.send_replace(Some(outcome));
    }
}

#[derive(Default)]
struct GateState {
    last_token: u64,
    live: Option<LiveRun>,
}

/// Serializes run tokens and the continuations that check them.
#[derive(Default)]
struct RunGate {
    state: Mutex<GateState>,
}

impl RunGate {
    fn lock(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Issues a new token and makes it live. Returns the run it superseded.
    fn begin(
        &self,
        hooks: Arc<dyn SequenceHooks>,
        outcome: watch::Sender<Option<RunOutcome>>,
        cancel: CancellationToken,
    ) -> (u64, Option<LiveRun>) {
        let mut state = self.lock();
        state.last_token += 1;
        let token = state.last_token;
        let superseded = state.live.replace(LiveRun {
            token,
            hooks,
            outcome,
            cancel,
        });
        (token, superseded)
    }

    fn is_live(&self, token: u64) -> bool {
        self.lock().live.as_ref().is_some_and(|live| live.token == token)
    }

    /// Runs `f` only if `token` is still live, holding the gate throughout.
    fn run_if_live<R>(&self, token: u64, f: impl FnOnce() -> R) -> Option<R> {
        let state = self.lock();
        if state.live.as_ref().is_some_and(|live| live.token == token) {
            Some(f())
        } else {
            None
        }
    }

    /// Removes the live run if it carries `token`.
    fn take(&self, token: u64) -> Option<LiveRun> {
        let mut state = self.lock();
        if state.live.as_ref().is_some_and(|live| live.token == token) {
            state.live.take()
        } else {
            None
        }
    }

    fn take_any(&self) -> Option<LiveRun> {
        self.lock().live.take()
    }
}

/// Handle to a started run. Cheap to clone.
#[derive(Clone)]
pub struct RunHandle {
    token: u64,
    gate: Option<Arc<RunGate>>,
    outcome: watch::Receiver<Option<RunOutcome>>,
}

impl RunHandle {
    /// A handle for a run that ended before it began.
    fn settled(outcome: RunOutcome) -> Self {
        let (_tx, rx) = watch::channel(Some(outcome));
        Self {
            token: 0,
            gate: None,
            outcome: rx,
        }
    }

    /// Token of this run; zero for runs that never started.
    pub fn token(&self) -> u64 {
        self.token
    }

    /// True while this run may still issue commands or call hooks.
    pub fn is_live(&self) -> bool {
        self.gate.as_ref().is_some_and(|gate| gate.is_live(self.token))
    }

    /// The outcome, if the run has ended.
    pub fn outcome(&self) -> Option<RunOutcome> {
        *self.outcome.borrow()
    }

    /// Waits for the run to end.
    pub async fn finished(&self) -> RunOutcome {
        let mut rx = self.outcome.clone();
        let outcome = match rx.wait_for(Option::is_some).await {
            Ok(outcome) => *outcome,
            // The sequencer went away with the run still live.
            Err(_) => None,
        };
        outcome.unwrap_or(RunOutcome::Cancelled)
    }
}

impl fmt::Debug for RunHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunHandle")
            .field("token", &self.token)
            .field("live", &self.is_live())
            .field("outcome", &self.outcome())
            .finish()
    }
}

/// Drives camera runs through the viewport, one live run at a time.
#[derive(Clone)]
pub struct CameraSequencer {
    viewport: ViewportSlot,
    gate: Arc<RunGate>,
}

impl CameraSequencer {
    pub fn new(viewport: ViewportSlot) -> Self {
        Self {
            viewport,
            gate: Arc::new(RunGate::default()),
        }
    }

    /// Starts a run and returns immediately.
    ///
    /// Any live run is cancelled first. With no viewport attached, or when
    /// called outside a Tokio runtime, nothing is issued and the handle
    /// reports [`RunOutcome::Skipped`].
    pub fn run(
        &self,
        stops: Vec<TourStop>,
        plan: SequencePlan,
        hooks: Arc<dyn SequenceHooks>,
    ) -> RunHandle {
        if !self.viewport.is_attached() {
            self.cancel_live();
            warn!(stops = stops.len(), "viewport detached; camera run skipped");
            return RunHandle::settled(RunOutcome::Skipped);
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.cancel_live();
            warn!("no async runtime; camera run skipped");
            return RunHandle::settled(RunOutcome::Skipped);
        };

        let (tx, rx) = watch::channel(None);
        let cancel = CancellationToken::new();
        let (token, superseded) = self.gate.begin(hooks.clone(), tx, cancel.clone());
        if let Some(previous) = superseded {
            debug!(token = previous.token, "camera run superseded");
            previous.settle(RunOutcome::Cancelled);
        }
        let handle = RunHandle {
            token,
            gate: Some(self.gate.clone()),
            outcome: rx,
        };

        if plan.is_empty_for(&stops) {
            debug!(token, "nothing to fly to");
            if let Some(live) = self.gate.take(token) {
                live.settle(RunOutcome::Completed);
            }
            return handle;
        }

        debug!(token, stops = stops.len(), start = plan.start_index, "camera run started");
        runtime.spawn(drive(
            self.viewport.clone(),
            self.gate.clone(),
            token,
            cancel,
            stops,
            plan,
            hooks,
        ));
        handle
    }

    /// Cancels the run behind `handle` if it is still live.
    pub fn cancel(&self, handle: &RunHandle) -> bool {
        match self.gate.take(handle.token) {
            Some(live) => {
                live.settle(RunOutcome::Cancelled);
                true
            }
            None => false,
        }
    }

    /// Cancels whatever run is live.
    pub fn cancel_live(&self) -> bool {
        match self.gate.take_any() {
            Some(live) => {
                live.settle(RunOutcome::Cancelled);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.gate.lock().live.is_some()
    }
}

impl fmt::Debug for CameraSequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CameraSequencer")
            .field("viewport", &self.viewport)
            .field("running", &self.is_running())
            .finish()
    }
}

async fn drive(
    viewport: ViewportSlot,
    gate: Arc<RunGate>,
    token: u64,
    cancel: CancellationToken,
    stops: Vec<TourStop>,
    plan: SequencePlan,
    hooks: Arc<dyn SequenceHooks>,
) {
    let run = RunContext {
        gate: &gate,
        token,
        cancel: &cancel,
    };
    let outcome = fly_stops(&viewport, run, &stops, &plan, hooks.as_ref()).await;
    if outcome == RunOutcome::Cancelled {
        debug!(token, "stale continuation dropped");
        return;
    }
    if outcome != RunOutcome::Completed {
        warn!(token, %outcome, "camera run cut short");
    }
    if let Some(live) = gate.take(token) {
        live.settle(outcome);
    }
}

/// What a run's continuations check before acting.
#[derive(Clone, Copy)]
struct RunContext<'a> {
    gate: &'a RunGate,
    token: u64,
    cancel: &'a CancellationToken,
}

impl RunContext<'_> {
    fn run_if_live<R>(&self, f: impl FnOnce() -> R) -> Option<R> {
        self.gate.run_if_live(self.token, f)
    }

    /// Awaits `fut` unless the run is cancelled first.
    async fn until_cancelled<F: Future>(&self, fut: F) -> Option<F::Output> {
        tokio::select! {
            _ = self.cancel.cancelled() => None,
            output = fut => Some(output),
        }
    }

    /// `outcome` for a live run; a superseded run is simply cancelled.
    fn cut_short(&self, outcome: RunOutcome) -> RunOutcome {
        if self.gate.is_live(self.token) {
            outcome
        } else {
            RunOutcome::Cancelled
        }
    }
}

async fn fly_stops(
    viewport: &ViewportSlot,
    run: RunContext<'_>,
    stops: &[TourStop],
    plan: &SequencePlan,
    hooks: &dyn SequenceHooks,
) -> RunOutcome {
    if let Some(lead_in) = &plan.lead_in {
        let completion = match issue(viewport, run, lead_in) {
            Ok(completion) => completion,
            Err(outcome) => return outcome,
        };
        match run.until_cancelled(completion).await {
            None => return RunOutcome::Cancelled,
            Some(Err(_)) => return run.cut_short(RunOutcome::Interrupted),
            Some(Ok(())) => {}
        }
        if !run.gate.is_live(run.token) {
            return RunOutcome::Cancelled;
        }
    }

    for (index, stop) in stops.iter().enumerate().skip(plan.start_index) {
        let flight = Flight {
            target: stop.target,
            offset: stop.offset,
            duration: plan.flight_duration,
        };
        let completion = match issue(viewport, run, &flight) {
            Ok(completion) => completion,
            Err(outcome) => return outcome,
        };
        debug!(token = run.token, index, stop = %stop.label, "flying to stop");

        let enter = async {
            tokio::time::sleep(plan.enter_delay).await;
            run.run_if_live(|| hooks.on_enter(stop)).is_some()
        };
        let Some((entered, landed)) = run
            .until_cancelled(async { tokio::join!(enter, completion) })
            .await
        else {
            return RunOutcome::Cancelled;
        };
        if !entered {
            return RunOutcome::Cancelled;
        }
        if landed.is_err() {
            return run.cut_short(RunOutcome::Interrupted);
        }

        if run.run_if_live(|| hooks.on_settled(stop)).is_none() {
            return RunOutcome::Cancelled;
        }
        if run
            .until_cancelled(tokio::time::sleep(stop.dwell))
            .await
            .is_none()
        {
            return RunOutcome::Cancelled;
        }
        if run.run_if_live(|| hooks.on_dwell_elapsed(stop)).is_none() {
            return RunOutcome::Cancelled;
        }
    }

    RunOutcome::Completed
}

/// Issues a flight on behalf of a live run.
fn issue(
    viewport: &ViewportSlot,
    run: RunContext<'_>,
    flight: &Flight,
) -> Result<FlightCompletion, RunOutcome> {
    let Some(vp) = viewport.current() else {
        return Err(run.cut_short(RunOutcome::ViewportDetached));
    };
    run.run_if_live(|| vp.fly_to(flight.target, flight.offset, flight.duration))
        .ok_or(RunOutcome::Cancelled)
}
