use crate::map::MapScene;
use crate::placement::{BoundingRect, PlacementMetrics, PlacementResult};
use serde::Serialize;
use serde_json::{Value, json};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// Machine-readable placement output: one entry per label plus run metrics.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacementDump {
    pub bounds: BoundingRect,
    pub labels: Vec<PlacementResult<Value>>,
    pub metrics: PlacementMetrics,
    pub fallback_used: bool,
}

impl PlacementDump {
    pub fn from_scene(scene: &MapScene) -> Self {
        let labels = scene
            .markers
            .iter()
            .enumerate()
            .map(|(index, marker)| PlacementResult {
                index,
                anchor_x: marker.anchor.x,
                anchor_y: marker.anchor.y,
                label_x: marker.label.x,
                label_y: marker.label.y,
                radius: marker.badge_radius,
                payload: json!({
                    "name": marker.name,
                    "slug": marker.slug,
                    "count": marker.count,
                }),
            })
            .collect();

        PlacementDump {
            bounds: scene.bounds,
            labels,
            metrics: scene.metrics.clone(),
            fallback_used: scene.fallback_used,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

pub fn write_placement_dump(path: Option<&Path>, dump: &PlacementDump) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let file = File::create(path)?;
            let writer = BufWriter::new(file);
            serde_json::to_writer_pretty(writer, dump)?;
        }
        None => println!("{}", dump.to_json()?),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::{CityMarker, MapScene};
    use crate::placement::{Algorithm, Point};

    #[test]
    fn dump_uses_camel_case_fields() {
        let scene = MapScene {
            bounds: BoundingRect::new(0.0, 0.0, 100.0, 100.0),
            markers: vec![CityMarker {
                name: "Köln".to_string(),
                slug: "koeln".to_string(),
                count: 4,
                tooltip: vec!["Köln".to_string()],
                anchor: Point::new(10.0, 20.0),
                label: Point::new(30.0, 5.0),
                badge_radius: 12.0,
            }],
            metrics: PlacementMetrics {
                algorithm: Some(Algorithm::Greedy),
                anchors: 1,
                iterations: 0,
                convergence_reached: true,
                clusters: 1,
            },
            fallback_used: false,
            highlighted: None,
        };
        let value = serde_json::to_value(PlacementDump::from_scene(&scene)).unwrap();
        assert_eq!(value["labels"][0]["labelX"], 30.0);
        assert_eq!(value["labels"][0]["payload"]["slug"], "koeln");
        assert_eq!(value["metrics"]["algorithm"], "greedy");
        assert_eq!(value["metrics"]["convergenceReached"], true);
        assert_eq!(value["fallbackUsed"], false);
        assert_eq!(value["bounds"]["maxX"], 100.0);
    }
}
