//! Input documents accepted by the command line and the wasm wrapper.

use serde::Deserialize;
use serde_json::{Map, Value};

use crate::config::Config;
use crate::map::{CityMarker, Concert, MapScene, MapView, Venue, aggregate_city_stats, city_slug};
use crate::placement::{
    Algorithm, Anchor, BoundingRect, DEFAULT_LABEL_RADIUS, LabelPlacer, Obstacle, PlacementError,
    place_with_fallback_as,
};
use crate::projection::MercatorProjection;
use crate::scene_dump::PlacementDump;

/// A raw anchor: coordinates plus any other fields, which become its payload.
#[derive(Debug, Clone, Deserialize)]
pub struct AnchorRecord {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub radius: Option<f32>,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum InputDocument {
    /// Concert dataset laid out on the map of Germany.
    Dataset {
        venues: Vec<Venue>,
        concerts: Vec<Concert>,
        #[serde(default)]
        bounds: Option<BoundingRect>,
    },
    /// Screen-space anchors placed as given.
    Anchors {
        anchors: Vec<AnchorRecord>,
        #[serde(default)]
        bounds: Option<BoundingRect>,
        #[serde(default)]
        obstacles: Vec<Obstacle>,
    },
}

pub fn parse_document(input: &str) -> serde_json::Result<InputDocument> {
    serde_json::from_str(input)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Strategy {
    #[default]
    Auto,
    Greedy,
    Force,
}

impl Strategy {
    pub fn algorithm(self) -> Option<Algorithm> {
        match self {
            Strategy::Auto => None,
            Strategy::Greedy => Some(Algorithm::Greedy),
            Strategy::Force => Some(Algorithm::ForceSimulation),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Overrides the document's bounds.
    pub bounds: Option<BoundingRect>,
    pub strategy: Strategy,
}

pub struct Processed {
    pub scene: MapScene,
    pub dump: PlacementDump,
}

/// Place every label in `document`. Placement itself falls back to greedy on
/// failure; only an invalid configuration is reported.
pub fn process(
    document: InputDocument,
    config: &Config,
    options: &RunOptions,
) -> Result<Processed, PlacementError> {
    config.placement.validate()?;
    let default_bounds = BoundingRect::from_size(config.render.width, config.render.height);

    match document {
        InputDocument::Dataset {
            venues,
            concerts,
            bounds,
        } => {
            let screen = options.bounds.or(bounds).unwrap_or(default_bounds);
            let mut view = MapView::new(
                MercatorProjection::germany(screen),
                config.placement.clone(),
                config.map.clone(),
            );
            view.set_algorithm(options.strategy.algorithm());
            let stats = aggregate_city_stats(&venues, &concerts);
            let scene = view.render(&stats).clone();
            let dump = PlacementDump::from_scene(&scene);
            Ok(Processed { scene, dump })
        }
        InputDocument::Anchors {
            anchors,
            bounds,
            obstacles,
        } => {
            let bounds = options.bounds.or(bounds).unwrap_or(default_bounds);
            let anchors: Vec<Anchor<Value>> = anchors
                .into_iter()
                .map(|record| {
                    Anchor::new(
                        record.x,
                        record.y,
                        record.radius.unwrap_or(DEFAULT_LABEL_RADIUS),
                        Value::Object(record.fields),
                    )
                })
                .collect();

            let mut placer = LabelPlacer::new(config.placement.clone());
            let placement = place_with_fallback_as(
                &mut placer,
                options.strategy.algorithm(),
                &anchors,
                &bounds,
                &obstacles,
            );
            let metrics = placer.last_metrics().clone();
            let fallback_used = placement.fallback.is_some();

            let markers = placement
                .results
                .iter()
                .map(|result| {
                    let name = result
                        .payload
                        .get("name")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .unwrap_or_else(|| format!("#{}", result.index));
                    let count = result
                        .payload
                        .get("count")
                        .and_then(Value::as_u64)
                        .unwrap_or(0) as usize;
                    CityMarker {
                        slug: city_slug(&name),
                        tooltip: vec![name.clone()],
                        name,
                        count,
                        anchor: result.anchor(),
                        label: result.label(),
                        badge_radius: result.radius,
                    }
                })
                .collect();

            let scene = MapScene {
                bounds,
                markers,
                metrics: metrics.clone(),
                fallback_used,
                highlighted: None,
            };
            let dump = PlacementDump {
                bounds,
                labels: placement.results,
                metrics,
                fallback_used,
            };
            Ok(Processed { scene, dump })
        }
    }
}
