// Force relaxation for medium inputs.
//
// Follows d3-force tick semantics: forces add to velocity scaled by a cooling
// alpha, velocity decays, positions integrate. Pinned nodes join every force
// as sources but are never moved.

use tracing::trace;

use super::CancelToken;
use super::error::PlacementError;
use super::geometry::{clamp_label_center, distance, segments_intersect};
use super::initial::initial_for;
use super::types::{Anchor, BoundingRect, Obstacle, PlacementNode, PlacementResult, Point};
use crate::config::PlacementConfig;

const ALPHA_DECAY: f32 = 0.02;
const ALPHA_MIN: f32 = 0.001;
/// Fraction of velocity removed every tick.
const VELOCITY_DECAY: f32 = 0.3;
const CONVERGENCE_SAMPLE_TICKS: usize = 10;
/// Bias target sits this fraction of the offset up and right of the anchor.
const BIAS_OFFSET_FRACTION: f32 = 0.3;
const BIAS_DAMPING: f32 = 0.5;
const COLLIDE_STRENGTH: f32 = 0.7;
const COLLIDE_ITERATIONS: usize = 2;
/// Many-body interactions stop beyond this many offsets.
const REPULSION_RANGE_OFFSETS: f32 = 4.0;
/// Own-marker avoidance is twice as strong as avoidance of other markers.
const OWN_ANCHOR_AVOIDANCE: f32 = 2.0;
const OTHER_ANCHOR_AVOIDANCE: f32 = 1.0;
const LINE_CROSSING_STRENGTH: f32 = 50.0;

/// Small deterministic nudge for coincident points, never zero.
fn jiggle(seed: usize) -> f32 {
    ((seed % 7) as f32 - 2.5) * 1e-6
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimulationStatus {
    Running,
    Converged,
    /// Iteration cap or minimum alpha reached without converging.
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationOutcome {
    pub iterations: usize,
    pub converged: bool,
    /// Average movement measured at the last convergence sample.
    pub last_movement: Option<f32>,
}

pub struct ForceSimulation<'a> {
    config: &'a PlacementConfig,
    bounds: BoundingRect,
    nodes: Vec<PlacementNode>,
    alpha: f32,
    iterations: usize,
    last_sample: Vec<Point>,
    last_movement: Option<f32>,
    status: SimulationStatus,
}

impl<'a> ForceSimulation<'a> {
    /// Build one movable node per anchor at its initial position, plus one
    /// pinned node per obstacle.
    pub fn new<P>(
        anchors: &[Anchor<P>],
        bounds: BoundingRect,
        obstacles: &[Obstacle],
        config: &'a PlacementConfig,
    ) -> Result<Self, PlacementError> {
        for (index, anchor) in anchors.iter().enumerate() {
            if !anchor.is_well_formed() {
                return Err(PlacementError::InvalidAnchor {
                    index,
                    reason: format!(
                        "expected finite coordinates and a non-negative radius, got ({}, {}) r={}",
                        anchor.x, anchor.y, anchor.radius
                    ),
                });
            }
        }

        let neighbour_radius = config.neighbour_radius();
        let mut nodes = Vec::with_capacity(anchors.len() + obstacles.len());
        for (index, anchor) in anchors.iter().enumerate() {
            let start = initial_for(anchors, index, neighbour_radius, config.offset_distance);
            nodes.push(PlacementNode::movable(
                index,
                start,
                anchor.position(),
                anchor.radius,
            ));
        }
        nodes.extend(
            obstacles
                .iter()
                .filter(|obstacle| obstacle.position().is_finite())
                .map(PlacementNode::pinned),
        );

        let last_sample = nodes.iter().map(PlacementNode::position).collect();
        Ok(Self {
            config,
            bounds,
            nodes,
            alpha: 1.0,
            iterations: 0,
            last_sample,
            last_movement: None,
            status: SimulationStatus::Running,
        })
    }

    pub fn nodes(&self) -> &[PlacementNode] {
        &self.nodes
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }

    pub fn status(&self) -> SimulationStatus {
        self.status
    }

    fn movable_count(&self) -> usize {
        self.nodes.iter().filter(|node| !node.fixed).count()
    }

    /// Advance one tick and update the termination status.
    pub fn step(&mut self) -> SimulationStatus {
        if self.status != SimulationStatus::Running {
            return self.status;
        }
        if self.iterations >= self.config.simulation_iterations || self.movable_count() == 0 {
            self.status = if self.movable_count() == 0 {
                SimulationStatus::Converged
            } else {
                SimulationStatus::Exhausted
            };
            return self.status;
        }

        self.tick();

        if self.iterations % CONVERGENCE_SAMPLE_TICKS == 0 {
            let movement = self.sample_movement();
            trace!(
                iteration = self.iterations,
                alpha = self.alpha,
                movement,
                "force simulation sample"
            );
            if movement < self.config.convergence_threshold {
                self.status = SimulationStatus::Converged;
                return self.status;
            }
        }
        if self.iterations >= self.config.simulation_iterations || self.alpha < ALPHA_MIN {
            self.status = SimulationStatus::Exhausted;
        }
        self.status
    }

    /// Run until converged, exhausted, or cancelled.
    pub fn run(&mut self, cancel: &CancelToken) -> Result<SimulationOutcome, PlacementError> {
        loop {
            if cancel.is_cancelled() {
                return Err(PlacementError::Cancelled);
            }
            match self.step() {
                SimulationStatus::Running => continue,
                status => {
                    return Ok(SimulationOutcome {
                        iterations: self.iterations,
                        converged: status == SimulationStatus::Converged,
                        last_movement: self.last_movement,
                    });
                }
            }
        }
    }

    /// Final label positions of the movable nodes, clamped into the bounds,
    /// in input order.
    pub fn results<P: Clone>(&self, anchors: &[Anchor<P>]) -> Vec<PlacementResult<P>> {
        self.nodes
            .iter()
            .filter(|node| !node.fixed)
            .filter_map(|node| {
                let index = node.index?;
                let anchor = anchors.get(index)?;
                let label = clamp_label_center(
                    node.position(),
                    node.radius,
                    self.config.boundary_padding,
                    &self.bounds,
                );
                Some(PlacementResult {
                    index,
                    anchor_x: anchor.x,
                    anchor_y: anchor.y,
                    label_x: label.x,
                    label_y: label.y,
                    radius: anchor.radius,
                    payload: anchor.payload.clone(),
                })
            })
            .collect()
    }

    fn sample_movement(&mut self) -> f32 {
        let mut total = 0.0;
        let mut movable = 0usize;
        for (node, last) in self.nodes.iter().zip(&self.last_sample) {
            if node.fixed {
                continue;
            }
            total += distance(node.position(), *last);
            movable += 1;
        }
        self.last_sample = self.nodes.iter().map(PlacementNode::position).collect();
        let movement = if movable == 0 {
            0.0
        } else {
            total / movable as f32
        };
        self.last_movement = Some(movement);
        movement
    }

    fn tick(&mut self) {
        self.alpha += (0.0 - self.alpha) * ALPHA_DECAY;
        let alpha = self.alpha;

        self.apply_attraction(alpha);
        self.apply_repulsion(alpha);
        self.apply_bias(alpha);
        self.apply_boundary(alpha);
        self.apply_collision();
        self.apply_anchor_avoidance(alpha);
        self.apply_line_crossing(alpha);

        for node in &mut self.nodes {
            if node.fixed {
                node.vx = 0.0;
                node.vy = 0.0;
                continue;
            }
            node.vx *= 1.0 - VELOCITY_DECAY;
            node.vy *= 1.0 - VELOCITY_DECAY;
            node.x += node.vx;
            node.y += node.vy;
        }
        self.iterations += 1;
    }

    /// Spring toward a ring of radius `offset_distance` around the own anchor.
    fn apply_attraction(&mut self, alpha: f32) {
        let target = self.config.offset_distance;
        let strength = self.config.attraction_strength;
        for node in &mut self.nodes {
            let Some(anchor) = node.anchor.filter(|_| !node.fixed) else {
                continue;
            };
            let dx = anchor.x - node.x;
            let dy = anchor.y - node.y;
            let dist = (dx * dx + dy * dy).sqrt();
            if dist > 0.0 {
                let force = (dist - target) * strength * alpha;
                node.vx += dx / dist * force;
                node.vy += dy / dist * force;
            }
        }
    }

    /// Pairwise many-body force with distance clamping.
    fn apply_repulsion(&mut self, alpha: f32) {
        let strength = self.config.repulsion_strength;
        let min2 = self.config.min_distance * self.config.min_distance;
        let max = self.config.offset_distance * REPULSION_RANGE_OFFSETS;
        let max2 = max * max;
        let count = self.nodes.len();
        for i in 0..count {
            if self.nodes[i].fixed {
                continue;
            }
            let (xi, yi) = (self.nodes[i].x, self.nodes[i].y);
            let (mut dvx, mut dvy) = (0.0, 0.0);
            for j in 0..count {
                if i == j {
                    continue;
                }
                let mut dx = self.nodes[j].x - xi;
                let mut dy = self.nodes[j].y - yi;
                let mut l = dx * dx + dy * dy;
                if l >= max2 {
                    continue;
                }
                if l < min2 {
                    if dx == 0.0 {
                        dx = jiggle(i + j);
                        l += dx * dx;
                    }
                    if dy == 0.0 {
                        dy = jiggle(i * 3 + j);
                        l += dy * dy;
                    }
                    l = (min2 * l).sqrt();
                }
                if l <= 0.0 {
                    continue;
                }
                let w = strength * alpha / l;
                dvx += dx * w;
                dvy += dy * w;
            }
            self.nodes[i].vx += dvx;
            self.nodes[i].vy += dvy;
        }
    }

    /// Soft pull toward a point up and right of the anchor.
    fn apply_bias(&mut self, alpha: f32) {
        let shift = self.config.offset_distance * BIAS_OFFSET_FRACTION;
        let strength = self.config.bias_strength * alpha * BIAS_DAMPING;
        for node in &mut self.nodes {
            let Some(anchor) = node.anchor.filter(|_| !node.fixed) else {
                continue;
            };
            let target_x = anchor.x + shift;
            let target_y = anchor.y - shift;
            node.vx += (target_x - node.x) * strength;
            node.vy += (target_y - node.y) * strength;
        }
    }

    fn apply_boundary(&mut self, alpha: f32) {
        let bounds = self.bounds;
        let strength = self.config.boundary_strength * alpha;
        let padding = self.config.boundary_padding;
        for node in &mut self.nodes {
            if node.fixed {
                continue;
            }
            let margin = node.radius + padding;
            if node.x < bounds.min_x + margin {
                node.vx += (bounds.min_x + margin - node.x) * strength;
            }
            if node.x > bounds.max_x - margin {
                node.vx += (bounds.max_x - margin - node.x) * strength;
            }
            if node.y < bounds.min_y + margin {
                node.vy += (bounds.min_y + margin - node.y) * strength;
            }
            if node.y > bounds.max_y - margin {
                node.vy += (bounds.max_y - margin - node.y) * strength;
            }
        }
    }

    /// Minimum separation on predicted positions, split by squared radius.
    fn apply_collision(&mut self) {
        let buffer = self.config.collision_buffer;
        let count = self.nodes.len();
        for _ in 0..COLLIDE_ITERATIONS {
            for i in 0..count {
                let ri = self.nodes[i].radius + buffer;
                let xi = self.nodes[i].x + self.nodes[i].vx;
                let yi = self.nodes[i].y + self.nodes[i].vy;
                for j in (i + 1)..count {
                    if self.nodes[i].fixed && self.nodes[j].fixed {
                        continue;
                    }
                    let rj = self.nodes[j].radius + buffer;
                    let r = ri + rj;
                    let mut x = xi - self.nodes[j].x - self.nodes[j].vx;
                    let mut y = yi - self.nodes[j].y - self.nodes[j].vy;
                    let mut l = x * x + y * y;
                    if l >= r * r {
                        continue;
                    }
                    if x == 0.0 {
                        x = jiggle(i + 2 * j);
                        l += x * x;
                    }
                    if y == 0.0 {
                        y = jiggle(2 * i + j);
                        l += y * y;
                    }
                    let len = l.sqrt();
                    let push = (r - len) / len * COLLIDE_STRENGTH;
                    x *= push;
                    y *= push;
                    let share_i = match (self.nodes[i].fixed, self.nodes[j].fixed) {
                        (false, true) => 1.0,
                        (true, false) => 0.0,
                        _ => {
                            let rj2 = rj * rj;
                            rj2 / (ri * ri + rj2)
                        }
                    };
                    self.nodes[i].vx += x * share_i;
                    self.nodes[i].vy += y * share_i;
                    self.nodes[j].vx -= x * (1.0 - share_i);
                    self.nodes[j].vy -= y * (1.0 - share_i);
                }
            }
        }
    }

    /// Short-range push away from every anchor marker, strongest for the own
    /// marker.
    fn apply_anchor_avoidance(&mut self, alpha: f32) {
        let markers: Vec<(usize, Point)> = self
            .nodes
            .iter()
            .enumerate()
            .filter_map(|(idx, node)| node.anchor.map(|anchor| (idx, anchor)))
            .collect();
        let reach = self.config.anchor_marker_radius + self.config.collision_buffer;
        for (idx, node) in self.nodes.iter_mut().enumerate() {
            if node.fixed {
                continue;
            }
            let min = node.radius + reach;
            for &(owner, marker) in &markers {
                let dx = node.x - marker.x;
                let dy = node.y - marker.y;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist >= min || dist <= 0.0 {
                    continue;
                }
                let scale = if owner == idx {
                    OWN_ANCHOR_AVOIDANCE
                } else {
                    OTHER_ANCHOR_AVOIDANCE
                };
                let force = (min - dist) * scale * alpha;
                node.vx += dx / dist * force;
                node.vy += dy / dist * force;
            }
        }
    }

    /// When two connector lines cross, push both labels apart along the line
    /// between them.
    fn apply_line_crossing(&mut self, alpha: f32) {
        let count = self.nodes.len();
        for i in 0..count {
            let Some(anchor_a) = self.nodes[i].anchor.filter(|_| !self.nodes[i].fixed) else {
                continue;
            };
            for j in (i + 1)..count {
                let Some(anchor_b) = self.nodes[j].anchor.filter(|_| !self.nodes[j].fixed) else {
                    continue;
                };
                let label_a = self.nodes[i].position();
                let label_b = self.nodes[j].position();
                if !segments_intersect((anchor_a, label_a), (anchor_b, label_b)) {
                    continue;
                }
                let dx = label_a.x - label_b.x;
                let dy = label_a.y - label_b.y;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist <= 0.0 {
                    continue;
                }
                let force = LINE_CROSSING_STRENGTH * alpha / (dist + 1.0);
                let (ux, uy) = (dx / dist * force, dy / dist * force);
                self.nodes[i].vx += ux;
                self.nodes[i].vy += uy;
                self.nodes[j].vx -= ux;
                self.nodes[j].vy -= uy;
            }
        }
    }
}

/// Run a full relaxation over `anchors` and return one result per anchor.
pub fn relax<P: Clone>(
    anchors: &[Anchor<P>],
    bounds: &BoundingRect,
    obstacles: &[Obstacle],
    config: &PlacementConfig,
    cancel: &CancelToken,
) -> Result<(Vec<PlacementResult<P>>, SimulationOutcome), PlacementError> {
    let mut simulation = ForceSimulation::new(anchors, *bounds, obstacles, config)?;
    let outcome = simulation.run(cancel)?;
    Ok((simulation.results(anchors), outcome))
}
