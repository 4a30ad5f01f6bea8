// Starting positions: away from the local crowd, top-right when alone.

use std::f32::consts::FRAC_PI_4;

use super::geometry::{centroid, distance, polar_offset};
use super::types::{Anchor, Point};

/// Up and to the right in screen coordinates (+y points down).
pub const PREFERRED_ANGLE: f32 = -FRAC_PI_4;

/// Positions of every other anchor within `radius` of `anchors[target]`.
pub fn neighbours<P>(anchors: &[Anchor<P>], target: usize, radius: f32) -> Vec<Point> {
    let origin = anchors[target].position();
    anchors
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != target)
        .map(|(_, anchor)| anchor.position())
        .filter(|pos| distance(*pos, origin) <= radius)
        .collect()
}

/// Initial label centre for an anchor at `origin` given its neighbours.
///
/// Without neighbours the label sits `offset` away along [`PREFERRED_ANGLE`].
/// Otherwise it points from the centroid of the anchor and its neighbours
/// through the anchor, pushing the label out of the cluster.
pub fn initial_position(origin: Point, neighbours: &[Point], offset: f32) -> Point {
    if neighbours.is_empty() {
        return polar_offset(origin, PREFERRED_ANGLE, offset);
    }
    let mut group = Vec::with_capacity(neighbours.len() + 1);
    group.push(origin);
    group.extend_from_slice(neighbours);
    let angle = match centroid(&group) {
        Some(mean) => (origin.y - mean.y).atan2(origin.x - mean.x),
        None => PREFERRED_ANGLE,
    };
    polar_offset(origin, angle, offset)
}

/// Convenience wrapper: neighbour lookup plus initial position for one anchor.
pub fn initial_for<P>(anchors: &[Anchor<P>], target: usize, radius: f32, offset: f32) -> Point {
    let near = neighbours(anchors, target, radius);
    initial_position(anchors[target].position(), &near, offset)
}
