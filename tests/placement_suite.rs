use std::path::Path;

use map_labels::placement::geometry::{distance, segments_intersect};
use map_labels::{
    Algorithm, Anchor, BoundingRect, Config, LabelPlacer, PlacementConfig, PlacementError,
    RunOptions, parse_document, place_with_fallback, process, render_svg,
};

fn fixture(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name);
    std::fs::read_to_string(&path).unwrap_or_else(|err| panic!("fixture {name}: {err}"))
}

fn assert_contained(label_x: f32, label_y: f32, radius: f32, bounds: &BoundingRect, what: &str) {
    let eps = 1e-3;
    assert!(
        label_x >= bounds.min_x + radius - eps && label_x <= bounds.max_x - radius + eps,
        "{what}: x {label_x} escapes {bounds:?}"
    );
    assert!(
        label_y >= bounds.min_y + radius - eps && label_y <= bounds.max_y - radius + eps,
        "{what}: y {label_y} escapes {bounds:?}"
    );
}

#[test]
fn single_anchor_sits_on_the_diagonal() {
    let mut placer = LabelPlacer::new(PlacementConfig::default());
    let anchors = vec![Anchor::new(100.0, 100.0, 20.0, "Kassel")];
    let bounds = BoundingRect::new(0.0, 0.0, 1000.0, 1000.0);
    let results = placer
        .calculate_optimal_positions(&anchors, &bounds, &[])
        .unwrap();
    assert_eq!(results.len(), 1);
    let step = 40.0 * std::f32::consts::FRAC_1_SQRT_2;
    assert!((results[0].label_x - (100.0 + step)).abs() < 1e-3);
    assert!((results[0].label_y - (100.0 - step)).abs() < 1e-3);
    assert_eq!(results[0].payload, "Kassel");
    assert_eq!(placer.last_metrics().algorithm, Some(Algorithm::Greedy));
}

#[test]
fn near_coincident_anchors_clear_each_others_marker() {
    let config = PlacementConfig::default();
    let marker_gap = 20.0 + config.anchor_marker_radius + config.collision_buffer;
    let mut placer = LabelPlacer::new(config);
    let anchors = vec![
        Anchor::new(500.0, 500.0, 20.0, 0),
        Anchor::new(510.0, 500.0, 20.0, 1),
    ];
    let bounds = BoundingRect::new(0.0, 0.0, 1000.0, 1000.0);
    let results = placer
        .calculate_optimal_positions(&anchors, &bounds, &[])
        .unwrap();
    assert!(distance(results[0].label(), anchors[1].position()) >= marker_gap);
    assert!(distance(results[1].label(), anchors[0].position()) >= marker_gap);
}

#[test]
fn large_grid_is_placed_in_clusters_without_overlap() {
    let mut placer = LabelPlacer::new(PlacementConfig::default());
    let anchors: Vec<Anchor<usize>> = (0..60)
        .map(|i| Anchor::new(100.0 + (i % 10) as f32 * 200.0, 100.0 + (i / 10) as f32 * 200.0, 20.0, i))
        .collect();
    let bounds = BoundingRect::new(0.0, 0.0, 2000.0, 1300.0);
    let results = placer
        .calculate_optimal_positions(&anchors, &bounds, &[])
        .unwrap();

    assert_eq!(results.len(), 60);
    let metrics = placer.last_metrics();
    assert_eq!(metrics.algorithm, Some(Algorithm::Clustered));
    assert_eq!(metrics.clusters, 60);
    for (i, a) in results.iter().enumerate() {
        assert_eq!(a.payload, i);
        for b in &results[i + 1..] {
            let gap = distance(a.label(), b.label());
            assert!(gap >= a.radius + b.radius, "labels {} and {} overlap ({gap})", a.index, b.index);
        }
    }
}

#[test]
fn degenerate_bounds_pin_labels_to_the_point() {
    let bounds = BoundingRect::new(100.0, 100.0, 100.0, 100.0);
    let anchors = vec![Anchor::new(100.0, 100.0, 20.0, ())];
    for algorithm in [Algorithm::Greedy, Algorithm::ForceSimulation] {
        let mut placer = LabelPlacer::new(PlacementConfig::default());
        let results = placer
            .calculate_with(algorithm, &anchors, &bounds, &[])
            .unwrap();
        assert_eq!(results.len(), 1);
        assert_eq!((results[0].label_x, results[0].label_y), (100.0, 100.0));
    }
}

#[test]
fn failing_force_run_falls_back_to_greedy() {
    let mut placer = LabelPlacer::new(PlacementConfig::default());
    let mut anchors: Vec<Anchor<usize>> = (0..20)
        .map(|i| Anchor::new(80.0 + i as f32 * 40.0, 300.0, 12.0, i))
        .collect();
    anchors[4].radius = -1.0;
    let bounds = BoundingRect::new(0.0, 0.0, 1000.0, 600.0);
    let placement = place_with_fallback(&mut placer, &anchors, &bounds, &[]);
    assert_eq!(placement.results.len(), 20);
    assert!(matches!(
        placement.fallback,
        Some(PlacementError::InvalidAnchor { index: 4, .. })
    ));
    let mut payloads: Vec<usize> = placement.results.iter().map(|r| r.payload).collect();
    payloads.sort_unstable();
    assert_eq!(payloads, (0..20).collect::<Vec<_>>());
}

#[test]
fn spread_out_force_run_keeps_labels_apart() {
    let config = PlacementConfig::default();
    let buffer = config.collision_buffer;
    let mut placer = LabelPlacer::new(config);
    let anchors: Vec<Anchor<usize>> = (0..20)
        .map(|i| Anchor::new(150.0 + (i % 5) as f32 * 150.0, 150.0 + (i / 5) as f32 * 150.0, 12.0, i))
        .collect();
    let bounds = BoundingRect::new(0.0, 0.0, 1000.0, 1000.0);
    let results = placer
        .calculate_optimal_positions(&anchors, &bounds, &[])
        .unwrap();
    assert_eq!(placer.last_metrics().algorithm, Some(Algorithm::ForceSimulation));

    let mut pairs = 0usize;
    let mut separated = 0usize;
    for (i, a) in results.iter().enumerate() {
        for b in &results[i + 1..] {
            pairs += 1;
            if distance(a.label(), b.label()) >= a.radius + b.radius + buffer {
                separated += 1;
            }
        }
    }
    assert!(separated * 100 >= pairs * 95, "{separated}/{pairs} pairs separated");
}

#[test]
fn staggered_rows_keep_connectors_uncrossed() {
    let mut placer = LabelPlacer::new(PlacementConfig::default());
    let anchors: Vec<Anchor<usize>> = (0..16)
        .map(|i| {
            let row = (i % 2) as f32;
            let col = (i / 2) as f32;
            Anchor::new(100.0 + col * 120.0 + row * 60.0, 300.0 + row * 80.0, 12.0, i)
        })
        .collect();
    let bounds = BoundingRect::new(0.0, 0.0, 1200.0, 700.0);
    let results = placer
        .calculate_optimal_positions(&anchors, &bounds, &[])
        .unwrap();
    assert_eq!(placer.last_metrics().algorithm, Some(Algorithm::ForceSimulation));

    let mut crossings = Vec::new();
    for (i, a) in results.iter().enumerate() {
        for b in &results[i + 1..] {
            if segments_intersect((a.anchor(), a.label()), (b.anchor(), b.label())) {
                crossings.push((a.index, b.index));
            }
        }
    }
    assert!(crossings.is_empty(), "crossing connectors: {crossings:?}");
}

#[test]
fn german_concert_dataset_renders() {
    let document = parse_document(&fixture("german_concerts.json")).expect("dataset parses");
    let config = Config::default();
    let processed = process(document, &config, &RunOptions::default()).unwrap();
    let scene = &processed.scene;

    assert_eq!(scene.markers.len(), 39);
    assert!(!scene.fallback_used);
    assert_eq!(scene.metrics.algorithm, Some(Algorithm::ForceSimulation));
    assert!(scene.metrics.iterations <= config.placement.simulation_iterations);

    let total: usize = scene.markers.iter().map(|m| m.count).sum();
    assert_eq!(total, 128);
    let frankfurt = scene.marker("Frankfurt").expect("Frankfurt has concerts");
    assert_eq!(frankfurt.slug, "frankfurt");
    for marker in &scene.markers {
        assert_contained(marker.label.x, marker.label.y, marker.badge_radius, &scene.bounds, &marker.name);
    }

    let svg = render_svg(scene, &config.theme, &config.map);
    assert!(svg.contains("<svg") && svg.ends_with("</svg>"));
    assert_eq!(svg.matches("class=\"count-circle\"").count(), 39);
}

#[test]
fn dense_anchor_fixture_uses_batches() {
    let document = parse_document(&fixture("dense_anchors.json")).unwrap();
    let processed = process(document, &Config::default(), &RunOptions::default()).unwrap();
    let dump = &processed.dump;

    assert_eq!(dump.labels.len(), 64);
    assert_eq!(dump.metrics.algorithm, Some(Algorithm::Clustered));
    assert!(dump.metrics.clusters > 1);
    for (i, label) in dump.labels.iter().enumerate() {
        assert_eq!(label.index, i);
        assert_eq!(label.payload["name"], format!("city-{i:02}"));
        assert_contained(label.label_x, label.label_y, label.radius, &dump.bounds, "dense");
    }
}

#[test]
fn small_anchor_fixture_respects_obstacles_and_bounds() {
    let document = parse_document(&fixture("small_anchors.json")).unwrap();
    let processed = process(document, &Config::default(), &RunOptions::default()).unwrap();
    let labels = &processed.dump.labels;

    assert_eq!(labels.len(), 4);
    assert_eq!(processed.dump.metrics.algorithm, Some(Algorithm::Greedy));
    let gap = 20.0 + 8.0 + 8.0;
    assert!(distance(labels[0].label(), labels[1].anchor()) >= gap);
    assert!(distance(labels[1].label(), labels[0].anchor()) >= gap);
    for label in labels {
        assert_contained(label.label_x, label.label_y, label.radius, &processed.dump.bounds, "small");
    }
}
