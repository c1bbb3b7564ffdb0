//! Entity layer management.
//!
//! [`EntityRenderer`] is the only writer of the viewport's entity layer. Every
//! batch starts by clearing the layer, so a phase's markers never linger into
//! the next one.

use std::sync::Arc;
use tour_model::{bounding_circle, PointOfInterest, RoutePath};
use tracing::{debug, warn};

use crate::config::TourConfig;
use crate::sequencer::{CameraSequencer, RunHandle, SequenceHooks, SequencePlan, TourStop};
use crate::viewport::{
    Color, EntityDescriptor, EntityId, Flight, HeadingPitchRange, LabelStyle, RingGlyph,
    TargetRegion, Viewport, ViewportSlot,
};

/// Extra room around the hotel cluster in the overview shot.
const OVERVIEW_PADDING: f64 = 1.25;

/// Marker label sits above the glyph.
const MARKER_LABEL_OFFSET: (f32, f32) = (0.0, -30.0);
const ROUTE_LABEL_OFFSET: (f32, f32) = (0.0, -50.0);
const MARKER_LABEL_OUTLINE: f32 = 2.0;
const ROUTE_LABEL_OUTLINE: f32 = 3.0;

/// Draws hotels and routes into the viewport.
#[derive(Debug, Clone)]
pub struct EntityRenderer {
    viewport: ViewportSlot,
    config: Arc<TourConfig>,
}

impl EntityRenderer {
    pub fn new(viewport: ViewportSlot, config: impl Into<Arc<TourConfig>>) -> Self {
        Self {
            viewport,
            config: config.into(),
        }
    }

    /// Replaces the entity layer with one marker and one label per point.
    ///
    /// Returns the ids of the added entities; empty when no viewport is
    /// attached.
    pub fn draw_points_of_interest(&self, points: &[PointOfInterest]) -> Vec<EntityId> {
        let Some(viewport) = self.viewport.current() else {
            warn!(points = points.len(), "viewport detached; hotel markers skipped");
            return Vec::new();
        };
        viewport.clear_entities();

        let elevation = self.config.lodging.marker_elevation_m;
        let glyph = self.marker_glyph();
        let style = self.marker_label_style();
        let mut ids = Vec::with_capacity(points.len() * 2);
        for poi in points {
            let position = poi.coordinate().at_height(elevation);
            ids.push(viewport.add_entity(EntityDescriptor::Marker {
                position,
                glyph: glyph.clone(),
                scale: 1.0,
            }));
            ids.push(viewport.add_entity(EntityDescriptor::Label {
                position,
                text: poi.name.clone(),
                style: style.clone(),
            }));
        }
        debug!(entities = ids.len(), "hotel markers drawn");
        ids
    }

    /// The recenter flight framing every point, or `None` for an empty list.
    pub fn overview_flight(&self, points: &[PointOfInterest]) -> Option<Flight> {
        let coordinates: Vec<_> = points.iter().map(PointOfInterest::coordinate).collect();
        let (center, radius_m) = bounding_circle(&coordinates)?;
        let lodging = &self.config.lodging;
        Some(Flight {
            target: TargetRegion::around(
                center,
                (radius_m * OVERVIEW_PADDING).max(lodging.overview_min_radius_m),
            ),
            offset: HeadingPitchRange::north_up(
                self.config.location.pitch_rad(),
                lodging.overview_range_m,
            ),
            duration: lodging.overview_duration(),
        })
    }

    /// Draws the hotels, recenters on them, then walks the camera through
    /// each one.
    ///
    /// Any live run is cancelled before the layer is touched. The recenter
    /// flight is the walkthrough's lead-in, so cancelling the returned run
    /// also abandons the recenter.
    pub fn render_points_of_interest(
        &self,
        points: &[PointOfInterest],
        sequencer: &CameraSequencer,
        hooks: Arc<dyn SequenceHooks>,
    ) -> RunHandle {
        sequencer.cancel_live();
        self.draw_points_of_interest(points);

        let pitch = self.config.location.pitch_rad();
        let stops: Vec<TourStop> = points
            .iter()
            .map(|poi| TourStop::from_point_of_interest(poi, &self.config.lodging, pitch))
            .collect();
        let mut plan = SequencePlan::walkthrough(&self.config.lodging);
        if let Some(overview) = self.overview_flight(points) {
            plan = plan.with_lead_in(overview);
        }
        sequencer.run(stops, plan, hooks)
    }

    /// Replaces the entity layer with one line and one midpoint label per
    /// route, then recenters on the fixed continental view.
    ///
    /// An empty list clears the layer and issues no flight.
    pub fn render_routes(&self, routes: &[RoutePath]) -> Vec<EntityId> {
        let Some(viewport) = self.viewport.current() else {
            warn!(routes = routes.len(), "viewport detached; routes skipped");
            return Vec::new();
        };
        viewport.clear_entities();

        let cfg = &self.config.routes;
        let line_color = self.route_color();
        let outline_color = self.color(
            &self.config.style.route_outline_color,
            Color::rgb(0.0, 0.0, 1.0),
        );
        let label_style = self.route_label_style();
        let mut ids = Vec::with_capacity(routes.len() * 2);
        for route in routes {
            ids.push(viewport.add_entity(EntityDescriptor::Polyline {
                positions: vec![
                    route.origin.at_height(cfg.line_elevation_m),
                    route.destination.at_height(cfg.line_elevation_m),
                ],
                width: cfg.line_width as f32,
                color: line_color,
                outline_color,
                outline_width: self.config.style.route_outline_width as f32,
            }));
            ids.push(viewport.add_entity(EntityDescriptor::Label {
                position: route.midpoint().at_height(cfg.label_elevation_m),
                text: route.name.clone(),
                style: label_style.clone(),
            }));
        }

        if !routes.is_empty() {
            recenter(viewport.as_ref(), self.routes_overview());
        }
        debug!(entities = ids.len(), "routes drawn");
        ids
    }

    fn routes_overview(&self) -> Flight {
        let cfg = &self.config.routes;
        Flight {
            target: TargetRegion::around(cfg.overview_center, cfg.overview_radius_m),
            offset: HeadingPitchRange::north_up(
                self.config.location.pitch_rad(),
                cfg.overview_range_m,
            ),
            duration: cfg.overview_duration(),
        }
    }

    fn color(&self, hex: &str, fallback: Color) -> Color {
        Color::from_hex(hex).unwrap_or(fallback)
    }

    fn marker_glyph(&self) -> RingGlyph {
        let style = &self.config.style;
        RingGlyph {
            outer: self.color(&style.marker_color, Color::WHITE),
            inner: self.color(&style.marker_core_color, Color::BLACK),
        }
    }

    fn marker_label_style(&self) -> LabelStyle {
        let style = &self.config.style;
        LabelStyle {
            font: style.label_font.clone(),
            fill: self.color(&style.label_color, Color::WHITE),
            outline: Color::BLACK,
            outline_width: MARKER_LABEL_OUTLINE,
            background: Some(
                self.color(&style.label_background, Color::BLACK)
                    .with_alpha(style.label_background_alpha as f32),
            ),
            pixel_offset: MARKER_LABEL_OFFSET,
        }
    }

    fn route_color(&self) -> Color {
        let style = &self.config.style;
        self.color(&style.route_color, Color::WHITE)
            .with_alpha(style.route_alpha as f32)
    }

    fn route_label_style(&self) -> LabelStyle {
        LabelStyle {
            font: self.config.style.route_label_font.clone(),
            fill: self.color(&self.config.style.route_color, Color::WHITE),
            outline: Color::BLACK,
            outline_width: ROUTE_LABEL_OUTLINE,
            background: None,
            pixel_offset: ROUTE_LABEL_OFFSET,
        }
    }
}

/// Fire-and-forget flight; nothing waits on the routes overview.
fn recenter(viewport: &dyn Viewport, flight: Flight) {
    drop(viewport.fly_to(flight.target, flight.offset, flight.duration));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessViewport, ViewportCommand};
    use crate::overlay::OverlayScheduler;
    use crate::sequencer::RunOutcome;
    use tour_model::{fixtures, Coordinate};

    fn renderer() -> (Arc<HeadlessViewport>, ViewportSlot, EntityRenderer) {
        let viewport = Arc::new(HeadlessViewport::new());
        let slot = ViewportSlot::attached(viewport.clone());
        let renderer = EntityRenderer::new(slot.clone(), TourConfig::default());
        (viewport, slot, renderer)
    }

    #[test]
    fn test_draw_points_of_interest_adds_marker_and_label() {
        let (viewport, _slot, renderer) = renderer();

        let ids = renderer.draw_points_of_interest(&fixtures::points_of_interest(3));

        assert_eq!(ids.len(), 6);
        let entities = viewport.entities();
        assert_eq!(entities.len(), 6);
        assert!(entities[0].is_marker());
        assert_eq!(entities[1].text(), Some("Hotel 0"));
        assert_eq!(entities[5].text(), Some("Hotel 2"));
        match &entities[0] {
            EntityDescriptor::Marker { position, .. } => assert_eq!(position.height_m, 200.0),
            other => panic!("expected marker, got {other:?}"),
        }
        match &entities[1] {
            EntityDescriptor::Label { style, .. } => {
                assert_eq!(style.pixel_offset, (0.0, -30.0));
                assert!(style.background.is_some());
            }
            other => panic!("expected label, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicates_are_drawn_twice() {
        let (viewport, _slot, renderer) = renderer();
        let hotel = PointOfInterest::new("Twin", 25.0, -80.0);

        renderer.draw_points_of_interest(&[hotel.clone(), hotel]);

        assert_eq!(viewport.entity_count(), 4);
    }

    #[test]
    fn test_routes_replace_hotels() {
        let (viewport, _slot, renderer) = renderer();

        renderer.draw_points_of_interest(&fixtures::points_of_interest(4));
        assert_eq!(viewport.entity_count(), 8);
        renderer.render_routes(&fixtures::routes(2));

        let entities = viewport.entities();
        assert_eq!(entities.len(), 4);
        assert!(entities.iter().all(|e| !e.is_marker()));
        assert_eq!(entities.iter().filter(|e| e.is_polyline()).count(), 2);
    }

    #[test]
    fn test_route_label_at_midpoint() {
        let (viewport, _slot, renderer) = renderer();
        let route = RoutePath::new("X", Coordinate::new(10.0, 20.0), Coordinate::new(30.0, 40.0));

        renderer.render_routes(&[route]);

        match &viewport.entities()[1] {
            EntityDescriptor::Label { position, text, style } => {
                assert_eq!(text, "X");
                assert_eq!(position.coordinate, Coordinate::new(20.0, 30.0));
                assert_eq!(position.height_m, 2700.0);
                assert_eq!(style.pixel_offset, (0.0, -50.0));
            }
            other => panic!("expected label, got {other:?}"),
        }
    }

    #[test]
    fn test_render_routes_issues_single_overview() {
        let (viewport, _slot, renderer) = renderer();

        renderer.render_routes(&fixtures::routes(3));

        let flights = viewport.flights();
        assert_eq!(flights.len(), 1);
        assert_eq!(flights[0].target.radius_m, 4_000_000.0);
        assert_eq!(flights[0].offset.range_m, 6_000_000.0);
    }

    #[test]
    fn test_render_empty_routes_only_clears() {
        let (viewport, _slot, renderer) = renderer();
        renderer.draw_points_of_interest(&fixtures::points_of_interest(2));

        let ids = renderer.render_routes(&[]);

        assert!(ids.is_empty());
        assert_eq!(viewport.entity_count(), 0);
        assert!(viewport.flights().is_empty());
        assert!(matches!(
            viewport.commands().last(),
            Some(ViewportCommand::ClearEntities { removed: 4, .. })
        ));
    }

    #[test]
    fn test_detached_renderer_is_noop() {
        let renderer = EntityRenderer::new(ViewportSlot::detached(), TourConfig::default());

        assert!(renderer.draw_points_of_interest(&fixtures::points_of_interest(2)).is_empty());
        assert!(renderer.render_routes(&fixtures::routes(2)).is_empty());
    }

    #[test]
    fn test_overview_flight_never_smaller_than_minimum() {
        let (_viewport, _slot, renderer) = renderer();

        let single = renderer
            .overview_flight(&fixtures::points_of_interest(1))
            .unwrap();
        assert_eq!(single.target.radius_m, 5000.0);
        assert_eq!(single.offset.range_m, 800.0);

        let spread = vec![
            PointOfInterest::new("West", 25.0, -81.0),
            PointOfInterest::new("East", 25.0, -79.0),
        ];
        let wide = renderer.overview_flight(&spread).unwrap();
        assert!(wide.target.radius_m > 100_000.0);

        assert!(renderer.overview_flight(&[]).is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_points_of_interest_walks_each_hotel() {
        let (viewport, slot, renderer) = renderer();
        let sequencer = CameraSequencer::new(slot);
        let overlay = OverlayScheduler::new();

        let handle = renderer.render_points_of_interest(
            &fixtures::points_of_interest(2),
            &sequencer,
            overlay.hooks(),
        );
        assert_eq!(handle.finished().await, RunOutcome::Completed);

        // Overview plus one flight per hotel
        let flights = viewport.flights();
        assert_eq!(flights.len(), 3);
        assert_eq!(flights[0].target.radius_m, 5000.0);
        assert_eq!(flights[1].target.radius_m, 50.0);
        assert_eq!(flights[1].offset.range_m, 300.0);
        assert_eq!(viewport.entity_count(), 4);
        assert!(!overlay.is_visible());
        let last = overlay.state().active.map(|r| r.title().to_string());
        assert_eq!(last.as_deref(), Some("Hotel 1"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_render_empty_points_skips_recenter() {
        let (viewport, slot, renderer) = renderer();
        let sequencer = CameraSequencer::new(slot);

        let handle =
            renderer.render_points_of_interest(&[], &sequencer, OverlayScheduler::new().hooks());

        assert_eq!(handle.outcome(), Some(RunOutcome::Completed));
        assert_eq!(viewport.entity_count(), 0);
        assert!(viewport.flights().is_empty());
    }
}
