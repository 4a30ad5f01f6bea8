//! Label placement engine for map markers.
//!
//! [`LabelPlacer`] picks a strategy by input size: greedy ring search for
//! small inputs, force relaxation for medium ones, and clustered batches of
//! force relaxation above that. [`place_with_fallback`] wraps it with the
//! greedy fallback that map rendering relies on.

mod cluster;
mod error;
pub mod force;
pub mod geometry;
pub mod greedy;
mod grid;
pub mod initial;
pub(crate) mod types;

pub use cluster::spatial_clusters;
pub use error::PlacementError;
pub use types::*;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};

use tracing::{debug, warn};

use crate::config::PlacementConfig;

/// Cooperative cancellation flag shared with a running placement.
///
/// A child token also observes its parent, so cancelling a placer reaches
/// every task spawned from it while a task can still be cancelled alone.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
    parent: Option<Arc<AtomicBool>>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn child(&self) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(false)),
            parent: Some(Arc::clone(&self.flag)),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
            || self
                .parent
                .as_ref()
                .is_some_and(|parent| parent.load(Ordering::SeqCst))
    }
}

pub fn select_algorithm(config: &PlacementConfig, anchor_count: usize) -> Algorithm {
    if anchor_count <= config.small_dataset_threshold {
        Algorithm::Greedy
    } else if anchor_count <= config.large_dataset_threshold {
        Algorithm::ForceSimulation
    } else {
        Algorithm::Clustered
    }
}

/// Run one placement with an explicit strategy.
///
/// Always returns exactly one result per anchor, sorted by input index, or an
/// error. Greedy never fails; the force strategies reject malformed anchors
/// and honour `cancel`.
pub fn run_placement<P: Clone>(
    config: &PlacementConfig,
    algorithm: Algorithm,
    anchors: &[Anchor<P>],
    bounds: &BoundingRect,
    obstacles: &[Obstacle],
    cancel: &CancelToken,
) -> Result<(Vec<PlacementResult<P>>, PlacementMetrics), PlacementError> {
    let mut metrics = PlacementMetrics {
        algorithm: Some(algorithm),
        anchors: anchors.len(),
        ..PlacementMetrics::default()
    };
    if anchors.is_empty() {
        metrics.convergence_reached = true;
        return Ok((Vec::new(), metrics));
    }

    let results = match algorithm {
        Algorithm::Greedy => {
            metrics.convergence_reached = true;
            metrics.clusters = 1;
            greedy::place(anchors, bounds, obstacles, config)
        }
        Algorithm::ForceSimulation => {
            let (results, outcome) = force::relax(anchors, bounds, obstacles, config, cancel)?;
            metrics.iterations = outcome.iterations;
            metrics.convergence_reached = outcome.converged;
            metrics.clusters = 1;
            results
        }
        Algorithm::Clustered => {
            let clusters = spatial_clusters(anchors, config.batch_link_distance());
            metrics.clusters = clusters.len();
            metrics.convergence_reached = true;
            let mut placed = obstacles.to_vec();
            let mut results = Vec::with_capacity(anchors.len());
            for members in &clusters {
                if cancel.is_cancelled() {
                    return Err(PlacementError::Cancelled);
                }
                let batch: Vec<Anchor<P>> = members.iter().map(|&i| anchors[i].clone()).collect();
                let (batch_results, outcome) = force::relax(&batch, bounds, &placed, config, cancel)?;
                metrics.iterations += outcome.iterations;
                metrics.convergence_reached &= outcome.converged;
                for mut result in batch_results {
                    result.index = members[result.index];
                    placed.push(result.to_obstacle());
                    results.push(result);
                }
            }
            results.sort_by_key(|result| result.index);
            results
        }
    };

    if results.len() != anchors.len() {
        return Err(PlacementError::ResultMismatch {
            expected: anchors.len(),
            actual: results.len(),
        });
    }
    Ok((results, metrics))
}

/// An explicitly owned placement engine. One per map view.
#[derive(Debug, Default)]
pub struct LabelPlacer {
    config: PlacementConfig,
    metrics: PlacementMetrics,
    cancel: CancelToken,
}

impl LabelPlacer {
    pub fn new(config: PlacementConfig) -> Self {
        Self {
            config,
            metrics: PlacementMetrics::default(),
            cancel: CancelToken::new(),
        }
    }

    pub fn config(&self) -> &PlacementConfig {
        &self.config
    }

    /// Metrics of the most recent synchronous placement.
    pub fn last_metrics(&self) -> &PlacementMetrics {
        &self.metrics
    }

    pub fn select_algorithm(&self, anchor_count: usize) -> Algorithm {
        select_algorithm(&self.config, anchor_count)
    }

    /// Place labels for `anchors`, choosing the strategy by input size.
    pub fn calculate_optimal_positions<P: Clone>(
        &mut self,
        anchors: &[Anchor<P>],
        bounds: &BoundingRect,
        obstacles: &[Obstacle],
    ) -> Result<Vec<PlacementResult<P>>, PlacementError> {
        let algorithm = self.select_algorithm(anchors.len());
        self.calculate_with(algorithm, anchors, bounds, obstacles)
    }

    /// Place labels with a caller-chosen strategy.
    pub fn calculate_with<P: Clone>(
        &mut self,
        algorithm: Algorithm,
        anchors: &[Anchor<P>],
        bounds: &BoundingRect,
        obstacles: &[Obstacle],
    ) -> Result<Vec<PlacementResult<P>>, PlacementError> {
        self.config.validate()?;
        debug!(
            anchors = anchors.len(),
            obstacles = obstacles.len(),
            algorithm = algorithm.as_str(),
            "placing labels"
        );
        let cancel = self.cancel.child();
        let (results, metrics) =
            run_placement(&self.config, algorithm, anchors, bounds, obstacles, &cancel)?;
        debug!(
            iterations = metrics.iterations,
            converged = metrics.convergence_reached,
            clusters = metrics.clusters,
            "labels placed"
        );
        self.metrics = metrics;
        Ok(results)
    }

    /// Run a placement on a worker thread so the caller's loop stays free.
    ///
    /// The task stops early when it or this placer is cancelled.
    pub fn spawn<P>(
        &self,
        anchors: Vec<Anchor<P>>,
        bounds: BoundingRect,
        obstacles: Vec<Obstacle>,
    ) -> Result<PlacementTask<P>, PlacementError>
    where
        P: Clone + Send + 'static,
    {
        self.config.validate()?;
        let config = self.config.clone();
        let algorithm = self.select_algorithm(anchors.len());
        let cancel = self.cancel.child();
        let worker_cancel = cancel.clone();
        let handle = thread::Builder::new()
            .name("label-placement".to_string())
            .spawn(move || {
                run_placement(
                    &config,
                    algorithm,
                    &anchors,
                    &bounds,
                    &obstacles,
                    &worker_cancel,
                )
            })
            .map_err(|err| PlacementError::Worker(err.to_string()))?;
        Ok(PlacementTask {
            handle: Some(handle),
            cancel,
        })
    }

    /// Stop any in-flight task and forget per-run state. Safe to call twice.
    pub fn destroy(&mut self) {
        self.cancel.cancel();
        self.cancel = CancelToken::new();
        self.metrics = PlacementMetrics::default();
    }

    pub(crate) fn record_fallback(&mut self, anchor_count: usize) {
        self.metrics = PlacementMetrics {
            algorithm: Some(Algorithm::Greedy),
            anchors: anchor_count,
            iterations: 0,
            convergence_reached: true,
            clusters: 1,
        };
    }
}

type TaskOutput<P> = Result<(Vec<PlacementResult<P>>, PlacementMetrics), PlacementError>;

/// Handle to a placement running on a worker thread.
///
/// Dropping the handle without joining cancels the run.
pub struct PlacementTask<P> {
    handle: Option<JoinHandle<TaskOutput<P>>>,
    cancel: CancelToken,
}

impl<P> PlacementTask<P> {
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.as_ref().is_none_or(JoinHandle::is_finished)
    }

    pub fn join(mut self) -> TaskOutput<P> {
        let handle = self
            .handle
            .take()
            .ok_or_else(|| PlacementError::Worker("placement task already joined".to_string()))?;
        handle
            .join()
            .map_err(|_| PlacementError::Worker("placement thread panicked".to_string()))?
    }
}

impl<P> Drop for PlacementTask<P> {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cancel.cancel();
        }
    }
}

/// Results of [`place_with_fallback`].
#[derive(Debug, Clone)]
pub struct Placement<P> {
    pub results: Vec<PlacementResult<P>>,
    /// Set when the chosen strategy failed and greedy results were used.
    pub fallback: Option<PlacementError>,
}

/// Place labels, falling back to greedy placement on any failure.
///
/// Map rendering must never fail because of label layout, so errors and
/// miscounted results are logged and replaced rather than returned.
pub fn place_with_fallback<P: Clone>(
    placer: &mut LabelPlacer,
    anchors: &[Anchor<P>],
    bounds: &BoundingRect,
    obstacles: &[Obstacle],
) -> Placement<P> {
    place_with_fallback_as(placer, None, anchors, bounds, obstacles)
}

/// [`place_with_fallback`] with an optional forced strategy. `None` picks by
/// input size.
pub fn place_with_fallback_as<P: Clone>(
    placer: &mut LabelPlacer,
    algorithm: Option<Algorithm>,
    anchors: &[Anchor<P>],
    bounds: &BoundingRect,
    obstacles: &[Obstacle],
) -> Placement<P> {
    let algorithm = algorithm.unwrap_or_else(|| placer.select_algorithm(anchors.len()));
    let failure = match placer.calculate_with(algorithm, anchors, bounds, obstacles) {
        Ok(results) if results.len() == anchors.len() => {
            return Placement {
                results,
                fallback: None,
            };
        }
        Ok(results) => PlacementError::ResultMismatch {
            expected: anchors.len(),
            actual: results.len(),
        },
        Err(err) => err,
    };

    warn!(error = %failure, "label placement failed, falling back to greedy placement");
    let results = greedy::place(anchors, bounds, obstacles, placer.config());
    placer.record_fallback(anchors.len());
    Placement {
        results,
        fallback: Some(failure),
    }
}
