use serde::{Deserialize, Serialize};

/// Label radius used when an input record does not carry one.
pub const DEFAULT_LABEL_RADIUS: f32 = 20.0;

fn default_label_radius() -> f32 {
    DEFAULT_LABEL_RADIUS
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f32, f32)> for Point {
    fn from((x, y): (f32, f32)) -> Self {
        Self { x, y }
    }
}

/// A fixed point that wants a label: a city marker on the map.
///
/// The payload is carried through placement untouched and handed back on the
/// matching [`PlacementResult`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anchor<P> {
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_label_radius")]
    pub radius: f32,
    pub payload: P,
}

impl<P> Anchor<P> {
    pub fn new(x: f32, y: f32, radius: f32, payload: P) -> Self {
        Self {
            x,
            y,
            radius,
            payload,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub(crate) fn is_well_formed(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.radius.is_finite() && self.radius >= 0.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoundingRect {
    pub min_x: f32,
    pub min_y: f32,
    pub max_x: f32,
    pub max_y: f32,
}

impl BoundingRect {
    pub const fn new(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_size(width: f32, height: f32) -> Self {
        Self::new(0.0, 0.0, width, height)
    }

    pub fn width(&self) -> f32 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f32 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) * 0.5,
            (self.min_y + self.max_y) * 0.5,
        )
    }

    /// True when the rect has no interior (zero or negative extent on an axis).
    pub fn is_degenerate(&self) -> bool {
        !(self.width() > 0.0 && self.height() > 0.0)
    }

    /// Shrink every side by `margin`. The result may be inverted; check with
    /// [`BoundingRect::is_inverted`].
    pub fn inset(&self, margin: f32) -> Self {
        Self::new(
            self.min_x + margin,
            self.min_y + margin,
            self.max_x - margin,
            self.max_y - margin,
        )
    }

    /// True when max lies below min on an axis, or any edge is NaN.
    pub fn is_inverted(&self) -> bool {
        !(self.min_x <= self.max_x && self.min_y <= self.max_y)
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.min_x && point.x <= self.max_x && point.y >= self.min_y && point.y <= self.max_y
    }
}

/// Something already on the map that new labels must stay clear of, usually a
/// label placed by an earlier batch.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub x: f32,
    pub y: f32,
    #[serde(default = "default_label_radius")]
    pub radius: f32,
    /// Marker the obstacle's label belongs to, if any.
    #[serde(default)]
    pub anchor: Option<Point>,
}

impl Obstacle {
    pub fn new(x: f32, y: f32, radius: f32) -> Self {
        Self {
            x,
            y,
            radius,
            anchor: None,
        }
    }

    pub fn with_anchor(mut self, anchor: Point) -> Self {
        self.anchor = Some(anchor);
        self
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Mutable per-label state while the force simulation runs.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacementNode {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    /// Marker this label is tied to. Obstacles without a marker have `None`.
    pub anchor: Option<Point>,
    pub radius: f32,
    /// Pinned nodes take part in every force but never move.
    pub fixed: bool,
    /// Input index for movable nodes.
    pub index: Option<usize>,
}

impl PlacementNode {
    pub fn movable(index: usize, position: Point, anchor: Point, radius: f32) -> Self {
        Self {
            x: position.x,
            y: position.y,
            vx: 0.0,
            vy: 0.0,
            anchor: Some(anchor),
            radius,
            fixed: false,
            index: Some(index),
        }
    }

    pub fn pinned(obstacle: &Obstacle) -> Self {
        Self {
            x: obstacle.x,
            y: obstacle.y,
            vx: 0.0,
            vy: 0.0,
            anchor: obstacle.anchor,
            radius: obstacle.radius,
            fixed: true,
            index: None,
        }
    }

    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementResult<P> {
    /// Position of the anchor in the input slice.
    pub index: usize,
    pub anchor_x: f32,
    pub anchor_y: f32,
    pub label_x: f32,
    pub label_y: f32,
    pub radius: f32,
    pub payload: P,
}

impl<P> PlacementResult<P> {
    pub fn anchor(&self) -> Point {
        Point::new(self.anchor_x, self.anchor_y)
    }

    pub fn label(&self) -> Point {
        Point::new(self.label_x, self.label_y)
    }

    /// The placed label as an obstacle for a later batch, marker included.
    pub fn to_obstacle(&self) -> Obstacle {
        Obstacle::new(self.label_x, self.label_y, self.radius).with_anchor(self.anchor())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Algorithm {
    Greedy,
    ForceSimulation,
    Clustered,
}

impl Algorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            Algorithm::Greedy => "greedy",
            Algorithm::ForceSimulation => "force-simulation",
            Algorithm::Clustered => "clustered",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementMetrics {
    pub algorithm: Option<Algorithm>,
    pub anchors: usize,
    /// Simulation ticks, summed over clusters. Zero for greedy runs.
    pub iterations: usize,
    pub convergence_reached: bool,
    pub clusters: usize,
}
