// Deterministic candidate-ring placement for small inputs. Also the fallback
// whenever the force path fails.

use tracing::trace;

use super::geometry::{clamp_label_center, distance, polar_offset};
use super::grid::SpatialGrid;
use super::initial::initial_for;
use super::types::{Anchor, BoundingRect, DEFAULT_LABEL_RADIUS, Obstacle, PlacementResult, Point};
use crate::config::PlacementConfig;

/// Tried in this order so labels lean up and to the right.
const RING_ANGLES_DEG: [f32; 8] = [-45.0, 0.0, -90.0, 45.0, 90.0, 135.0, 180.0, -135.0];
const RING_SCALES: [f32; 4] = [1.0, 1.5, 2.0, 3.0];
const FALLBACK_SCALE: f32 = 1.5;

struct Occupied {
    center: Point,
    radius: f32,
    /// Set for anchor markers; a label never collides with its own marker.
    marker_of: Option<usize>,
}

struct Occupancy {
    circles: Vec<Occupied>,
    grid: SpatialGrid,
    buffer: f32,
}

impl Occupancy {
    fn new(config: &PlacementConfig) -> Self {
        Self {
            circles: Vec::new(),
            grid: SpatialGrid::new(config.spatial_grid_size),
            buffer: config.collision_buffer,
        }
    }

    fn add(&mut self, center: Point, radius: f32, marker_of: Option<usize>) {
        let idx = self.circles.len();
        self.circles.push(Occupied {
            center,
            radius,
            marker_of,
        });
        self.grid.insert(idx, center, radius);
    }

    fn collides(&self, candidate: Point, radius: f32, owner: usize) -> bool {
        self.grid
            .query(candidate, radius + self.buffer)
            .map(|idx| &self.circles[idx])
            .filter(|circle| circle.marker_of != Some(owner))
            .any(|circle| distance(candidate, circle.center) < radius + circle.radius + self.buffer)
    }
}

/// Place every anchor in input order, first fit wins.
///
/// Each label tries its initial position, then a ring of fixed angles at
/// growing distances from the anchor, and finally a fixed up-right offset that
/// is accepted even if it collides. Never fails: a non-finite or negative
/// radius is placed and reported as [`DEFAULT_LABEL_RADIUS`].
pub fn place<P: Clone>(
    anchors: &[Anchor<P>],
    bounds: &BoundingRect,
    obstacles: &[Obstacle],
    config: &PlacementConfig,
) -> Vec<PlacementResult<P>> {
    let mut occupancy = Occupancy::new(config);
    for obstacle in obstacles {
        occupancy.add(obstacle.position(), obstacle.radius, None);
        if let Some(marker) = obstacle.anchor {
            occupancy.add(marker, config.anchor_marker_radius, None);
        }
    }
    for (idx, anchor) in anchors.iter().enumerate() {
        occupancy.add(anchor.position(), config.anchor_marker_radius, Some(idx));
    }

    let mut results = Vec::with_capacity(anchors.len());
    for (idx, anchor) in anchors.iter().enumerate() {
        let radius = usable_radius(anchor.radius);
        let label = choose_position(anchors, idx, radius, bounds, &occupancy, config);
        occupancy.add(label, radius, None);
        results.push(PlacementResult {
            index: idx,
            anchor_x: anchor.x,
            anchor_y: anchor.y,
            label_x: label.x,
            label_y: label.y,
            radius,
            payload: anchor.payload.clone(),
        });
    }
    results
}

fn usable_radius(radius: f32) -> f32 {
    if radius.is_finite() && radius >= 0.0 {
        radius
    } else {
        DEFAULT_LABEL_RADIUS
    }
}

fn choose_position<P>(
    anchors: &[Anchor<P>],
    idx: usize,
    radius: f32,
    bounds: &BoundingRect,
    occupancy: &Occupancy,
    config: &PlacementConfig,
) -> Point {
    let anchor = &anchors[idx];
    let origin = anchor.position();
    let offset = config.offset_distance;
    let clamp = |p: Point| clamp_label_center(p, radius, config.boundary_padding, bounds);

    let initial = clamp(initial_for(anchors, idx, config.neighbour_radius(), offset));
    if !occupancy.collides(initial, radius, idx) {
        return initial;
    }

    for scale in RING_SCALES {
        for degrees in RING_ANGLES_DEG {
            let candidate = clamp(polar_offset(origin, degrees.to_radians(), offset * scale));
            if !occupancy.collides(candidate, radius, idx) {
                return candidate;
            }
        }
    }

    trace!(anchor = idx, "no free candidate, using fixed fallback offset");
    clamp(Point::new(
        origin.x + offset * FALLBACK_SCALE,
        origin.y - offset * FALLBACK_SCALE,
    ))
}
