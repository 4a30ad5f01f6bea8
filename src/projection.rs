use std::f32::consts::PI;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::placement::{BoundingRect, Point};

static VIEWBOX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"viewBox\s*=\s*["']\s*([-+0-9.eE]+)[\s,]+([-+0-9.eE]+)[\s,]+([-+0-9.eE]+)[\s,]+([-+0-9.eE]+)\s*["']"#)
        .unwrap()
});

/// Geographic extent in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub north: f32,
    pub south: f32,
    pub east: f32,
    pub west: f32,
}

impl GeoBounds {
    pub const GERMANY: GeoBounds = GeoBounds {
        north: 55.1,
        south: 47.3,
        east: 15.0,
        west: 5.9,
    };
}

impl Default for GeoBounds {
    fn default() -> Self {
        Self::GERMANY
    }
}

fn mercator(lat: f32) -> f32 {
    (PI / 4.0 + lat * PI / 360.0).tan().ln()
}

/// Mercator projection of a geographic box onto a screen rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MercatorProjection {
    pub geo: GeoBounds,
    pub screen: BoundingRect,
}

impl MercatorProjection {
    pub fn new(geo: GeoBounds, screen: BoundingRect) -> Self {
        Self { geo, screen }
    }

    pub fn germany(screen: BoundingRect) -> Self {
        Self::new(GeoBounds::GERMANY, screen)
    }

    pub fn project(&self, latitude: f32, longitude: f32) -> Point {
        let geo = &self.geo;
        let nx = (longitude - geo.west) / (geo.east - geo.west);
        let south = mercator(geo.south);
        let ny = 1.0 - (mercator(latitude) - south) / (mercator(geo.north) - south);
        Point::new(
            self.screen.min_x + nx * self.screen.width(),
            self.screen.min_y + ny * self.screen.height(),
        )
    }
}

/// Screen bounds from an SVG document's `viewBox` attribute.
pub fn viewbox_bounds(svg: &str) -> Option<BoundingRect> {
    let caps = VIEWBOX_RE.captures(svg)?;
    let mut values = [0.0f32; 4];
    for (slot, idx) in values.iter_mut().zip(1..=4) {
        *slot = caps.get(idx)?.as_str().parse().ok()?;
    }
    let [min_x, min_y, width, height] = values;
    if !(width > 0.0 && height > 0.0) {
        return None;
    }
    Some(BoundingRect::new(min_x, min_y, min_x + width, min_y + height))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screen() -> BoundingRect {
        BoundingRect::new(0.0, 0.0, 1000.0, 1000.0)
    }

    #[test]
    fn corners_map_to_screen_corners() {
        let projection = MercatorProjection::germany(screen());
        let nw = projection.project(55.1, 5.9);
        let se = projection.project(47.3, 15.0);
        assert!(nw.x.abs() < 1e-3 && nw.y.abs() < 1e-3);
        assert!((se.x - 1000.0).abs() < 1e-2 && (se.y - 1000.0).abs() < 1e-2);
    }

    #[test]
    fn northern_cities_sit_higher_on_screen() {
        let projection = MercatorProjection::germany(screen());
        let hamburg = projection.project(53.55, 9.99);
        let munich = projection.project(48.14, 11.58);
        assert!(hamburg.y < munich.y);
        assert!(hamburg.x < munich.x);
    }

    #[test]
    fn mercator_stretches_the_north() {
        // Equal latitude steps cover more screen space further north.
        let projection = MercatorProjection::germany(screen());
        let south_step = projection.project(48.0, 10.0).y - projection.project(49.0, 10.0).y;
        let north_step = projection.project(53.0, 10.0).y - projection.project(54.0, 10.0).y;
        assert!(north_step > south_step);
    }

    #[test]
    fn reads_viewbox() {
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="10 20 300 400"><path d="M0 0"/></svg>"#;
        assert_eq!(
            viewbox_bounds(svg),
            Some(BoundingRect::new(10.0, 20.0, 310.0, 420.0))
        );
    }

    #[test]
    fn missing_or_empty_viewbox_is_none() {
        assert_eq!(viewbox_bounds("<svg width=\"10\"></svg>"), None);
        assert_eq!(viewbox_bounds("<svg viewBox=\"0 0 0 100\"></svg>"), None);
    }
}
