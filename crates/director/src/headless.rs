//! In-process viewport with no renderer behind it.
//!
//! Flights complete after their duration on the tokio clock, the entity layer
//! is kept in memory, and every command is journaled with the time it was
//! issued. The runner uses it to log a tour; tests use it with a paused clock.

use serde::Serialize;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::time::Instant;
use tracing::{debug, info};

use crate::viewport::{
    EntityDescriptor, EntityId, FlightCompletion, HeadingPitchRange, TargetRegion, Viewport,
};

/// A flight as the viewport received it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlightRecord {
    /// Time since the viewport was created
    pub at: Duration,
    pub target: TargetRegion,
    pub offset: HeadingPitchRange,
    pub duration: Duration,
}

/// One journaled viewport command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ViewportCommand {
    FlyTo(FlightRecord),
    AddEntity {
        at: Duration,
        id: EntityId,
        descriptor: EntityDescriptor,
    },
    ClearEntities {
        at: Duration,
        removed: usize,
    },
}

impl ViewportCommand {
    pub fn at(&self) -> Duration {
        match self {
            ViewportCommand::FlyTo(flight) => flight.at,
            ViewportCommand::AddEntity { at, .. } | ViewportCommand::ClearEntities { at, .. } => {
                *at
            }
        }
    }
}

#[derive(Default)]
struct HeadlessState {
    next_id: u64,
    entities: Vec<(EntityId, EntityDescriptor)>,
    journal: Vec<ViewportCommand>,
    hold_flights: bool,
    held: Vec<oneshot::Sender<()>>,
}

/// A [`Viewport`] that simulates the camera instead of rendering.
pub struct HeadlessViewport {
    origin: Instant,
    state: Mutex<HeadlessState>,
}

impl HeadlessViewport {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
            state: Mutex::new(HeadlessState::default()),
        }
    }

    /// Creates a viewport whose flights never settle on their own; call
    /// [`release_flights`](Self::release_flights) to complete them.
    pub fn holding_flights() -> Self {
        let viewport = Self::new();
        viewport.lock().hold_flights = true;
        viewport
    }

    /// Completes every held flight. Returns how many were released.
    pub fn release_flights(&self) -> usize {
        let held = std::mem::take(&mut self.lock().held);
        let count = held.len();
        for tx in held {
            let _ = tx.send(());
        }
        count
    }

    /// Drops every held flight without completing it.
    pub fn abandon_flights(&self) -> usize {
        let held = std::mem::take(&mut self.lock().held);
        held.len()
    }

    pub fn commands(&self) -> Vec<ViewportCommand> {
        self.lock().journal.clone()
    }

    pub fn flights(&self) -> Vec<FlightRecord> {
        self.lock()
            .journal
            .iter()
            .filter_map(|c| match c {
                ViewportCommand::FlyTo(flight) => Some(flight.clone()),
                _ => None,
            })
            .collect()
    }

    /// Entities currently in the layer, in insertion order.
    pub fn entities(&self) -> Vec<EntityDescriptor> {
        self.lock().entities.iter().map(|(_, d)| d.clone()).collect()
    }

    pub fn entity_count(&self) -> usize {
        self.lock().entities.len()
    }

    /// The command journal as pretty JSON.
    pub fn journal_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(&self.lock().journal)
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn elapsed(&self) -> Duration {
        Instant::now().saturating_duration_since(self.origin)
    }
}

impl Default for HeadlessViewport {
    fn default() -> Self {
        Self::new()
    }
}

impl Viewport for HeadlessViewport {
    fn fly_to(
        &self,
        target: TargetRegion,
        offset: HeadingPitchRange,
        duration: Duration,
    ) -> FlightCompletion {
        let (tx, rx) = oneshot::channel();
        let at = self.elapsed();
        info!(
            at_secs = at.as_secs_f64(),
            lat = target.center.coordinate.latitude,
            lon = target.center.coordinate.longitude,
            range_m = offset.range_m,
            duration_secs = duration.as_secs_f64(),
            "camera flight"
        );

        let mut state = self.lock();
        state.journal.push(ViewportCommand::FlyTo(FlightRecord {
            at,
            target,
            offset,
            duration,
        }));

        if state.hold_flights {
            state.held.push(tx);
        } else if let Ok(runtime) = tokio::runtime::Handle::try_current() {
            runtime.spawn(async move {
                tokio::time::sleep(duration).await;
                let _ = tx.send(());
            });
        } else {
            // No clock to wait on; settle at once.
            let _ = tx.send(());
        }
        rx
    }

    fn add_entity(&self, descriptor: EntityDescriptor) -> EntityId {
        let at = self.elapsed();
        let mut state = self.lock();
        state.next_id += 1;
        let id = EntityId(state.next_id);
        debug!(%id, label = descriptor.text().unwrap_or(""), "entity added");
        state.journal.push(ViewportCommand::AddEntity {
            at,
            id,
            descriptor: descriptor.clone(),
        });
        state.entities.push((id, descriptor));
        id
    }

    fn clear_entities(&self) {
        let at = self.elapsed();
        let mut state = self.lock();
        let removed = state.entities.len();
        state.entities.clear();
        debug!(removed, "entity layer cleared");
        state.journal.push(ViewportCommand::ClearEntities { at, removed });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::viewport::{Color, RingGlyph};
    use tour_model::Coordinate;

    fn marker() -> EntityDescriptor {
        EntityDescriptor::Marker {
            position: Coordinate::new(25.0, -80.0).at_height(200.0),
            glyph: RingGlyph {
                outer: Color::WHITE,
                inner: Color::BLACK,
            },
            scale: 1.0,
        }
    }

    fn region() -> TargetRegion {
        TargetRegion::around(Coordinate::new(25.0, -80.0), 1.0)
    }

    #[test]
    fn test_entity_layer_add_and_clear() {
        let viewport = HeadlessViewport::new();
        let a = viewport.add_entity(marker());
        let b = viewport.add_entity(marker());
        assert_ne!(a, b);
        assert_eq!(viewport.entity_count(), 2);

        viewport.clear_entities();
        assert_eq!(viewport.entity_count(), 0);

        let commands = viewport.commands();
        assert_eq!(commands.len(), 3);
        assert!(matches!(
            commands[2],
            ViewportCommand::ClearEntities { removed: 2, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_flight_completes_after_duration() {
        let viewport = HeadlessViewport::new();
        let start = Instant::now();

        let completion = viewport.fly_to(
            region(),
            HeadingPitchRange::north_up(-0.78, 1000.0),
            Duration::from_secs(8),
        );
        completion.await.unwrap();

        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(8) && elapsed < Duration::from_millis(8010));
        assert_eq!(viewport.flights().len(), 1);
        assert_eq!(viewport.flights()[0].duration, Duration::from_secs(8));
    }

    #[tokio::test(start_paused = true)]
    async fn test_held_flights_wait_for_release() {
        let viewport = HeadlessViewport::holding_flights();
        let mut completion = viewport.fly_to(
            region(),
            HeadingPitchRange::north_up(0.0, 100.0),
            Duration::from_secs(1),
        );

        tokio::time::sleep(Duration::from_secs(60)).await;
        assert!(completion.try_recv().is_err());

        assert_eq!(viewport.release_flights(), 1);
        completion.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_abandoned_flight_reports_error() {
        let viewport = HeadlessViewport::holding_flights();
        let completion = viewport.fly_to(
            region(),
            HeadingPitchRange::north_up(0.0, 100.0),
            Duration::from_secs(1),
        );

        assert_eq!(viewport.abandon_flights(), 1);
        assert!(completion.await.is_err());
    }

    #[test]
    fn test_journal_json() {
        let viewport = HeadlessViewport::new();
        viewport.add_entity(marker());
        let json = viewport.journal_json().unwrap();
        assert!(json.contains(r#""command": "add_entity""#));
    }
}
