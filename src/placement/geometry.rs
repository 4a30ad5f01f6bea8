// Plain geometry shared by the placement strategies.

use super::types::{BoundingRect, Point};

const PARALLEL_EPS: f32 = 1e-10;

pub fn distance(a: Point, b: Point) -> f32 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    (dx * dx + dy * dy).sqrt()
}

/// Parametric segment intersection test. Parallel and collinear segments are
/// reported as not intersecting, even when they overlap.
pub fn segments_intersect(a: (Point, Point), b: (Point, Point)) -> bool {
    let (p1, p2) = a;
    let (p3, p4) = b;
    let denom = (p1.x - p2.x) * (p3.y - p4.y) - (p1.y - p2.y) * (p3.x - p4.x);
    if denom.abs() < PARALLEL_EPS {
        return false;
    }
    let t = ((p1.x - p3.x) * (p3.y - p4.y) - (p1.y - p3.y) * (p3.x - p4.x)) / denom;
    let u = -((p1.x - p2.x) * (p1.y - p3.y) - (p1.y - p2.y) * (p1.x - p3.x)) / denom;
    (0.0..=1.0).contains(&t) && (0.0..=1.0).contains(&u)
}

/// Arithmetic mean of `points`, `None` for an empty slice.
pub fn centroid(points: &[Point]) -> Option<Point> {
    if points.is_empty() {
        return None;
    }
    let (sx, sy) = points
        .iter()
        .fold((0.0f32, 0.0f32), |(sx, sy), p| (sx + p.x, sy + p.y));
    let n = points.len() as f32;
    Some(Point::new(sx / n, sy / n))
}

/// Point at `dist` along `angle` (radians, +y down) from `origin`.
pub fn polar_offset(origin: Point, angle: f32, dist: f32) -> Point {
    Point::new(origin.x + angle.cos() * dist, origin.y + angle.sin() * dist)
}

/// Keep a label of `radius` inside `bounds`, preferring an extra `padding`
/// from the edges. Falls back to the bare radius and then to the rect centre
/// when the rect is too small.
pub fn clamp_label_center(center: Point, radius: f32, padding: f32, bounds: &BoundingRect) -> Point {
    for margin in [radius + padding, radius] {
        let inner = bounds.inset(margin);
        if !inner.is_inverted() {
            return Point::new(
                center.x.clamp(inner.min_x, inner.max_x),
                center.y.clamp(inner.min_y, inner.max_y),
            );
        }
    }
    let mid = bounds.center();
    if mid.is_finite() { mid } else { center }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(ax: f32, ay: f32, bx: f32, by: f32) -> (Point, Point) {
        (Point::new(ax, ay), Point::new(bx, by))
    }

    #[test]
    fn distance_is_euclidean() {
        assert_eq!(distance(Point::new(0.0, 0.0), Point::new(3.0, 4.0)), 5.0);
    }

    #[test]
    fn crossing_segments_intersect() {
        assert!(segments_intersect(
            seg(0.0, 0.0, 10.0, 10.0),
            seg(0.0, 10.0, 10.0, 0.0)
        ));
    }

    #[test]
    fn disjoint_segments_do_not_intersect() {
        assert!(!segments_intersect(
            seg(0.0, 0.0, 1.0, 1.0),
            seg(5.0, 0.0, 6.0, -3.0)
        ));
    }

    #[test]
    fn collinear_overlap_counts_as_no_crossing() {
        assert!(!segments_intersect(
            seg(0.0, 0.0, 10.0, 0.0),
            seg(5.0, 0.0, 15.0, 0.0)
        ));
    }

    #[test]
    fn touching_endpoints_intersect() {
        assert!(segments_intersect(
            seg(0.0, 0.0, 10.0, 0.0),
            seg(10.0, 0.0, 10.0, 10.0)
        ));
    }

    #[test]
    fn centroid_of_empty_is_none() {
        assert_eq!(centroid(&[]), None);
    }

    #[test]
    fn centroid_averages() {
        let c = centroid(&[Point::new(0.0, 0.0), Point::new(4.0, 2.0)]).unwrap();
        assert_eq!(c, Point::new(2.0, 1.0));
    }

    #[test]
    fn clamp_keeps_padding_when_possible() {
        let bounds = BoundingRect::new(0.0, 0.0, 200.0, 200.0);
        let p = clamp_label_center(Point::new(-50.0, 500.0), 12.0, 10.0, &bounds);
        assert_eq!(p, Point::new(22.0, 178.0));
    }

    #[test]
    fn clamp_drops_padding_for_tight_rects() {
        let bounds = BoundingRect::new(0.0, 0.0, 30.0, 30.0);
        let p = clamp_label_center(Point::new(0.0, 0.0), 12.0, 10.0, &bounds);
        assert_eq!(p, Point::new(12.0, 12.0));
    }

    #[test]
    fn clamp_leaves_points_alone_in_nan_bounds() {
        let bounds = BoundingRect::new(f32::NAN, 0.0, 100.0, 100.0);
        assert!(bounds.is_inverted());
        let p = clamp_label_center(Point::new(30.0, 40.0), 12.0, 10.0, &bounds);
        assert_eq!(p, Point::new(30.0, 40.0));
    }

    #[test]
    fn clamp_collapses_to_center_of_degenerate_rect() {
        let bounds = BoundingRect::new(40.0, 60.0, 40.0, 60.0);
        let p = clamp_label_center(Point::new(0.0, 0.0), 12.0, 10.0, &bounds);
        assert_eq!(p, Point::new(40.0, 60.0));
    }
}
