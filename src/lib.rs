#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod document;
pub mod map;
pub mod placement;
pub mod projection;
pub mod render;
pub mod scene_dump;
pub mod theme;

#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{Config, MapStyle, PlacementConfig, RenderConfig, load_config, parse_config};
pub use document::{InputDocument, Processed, RunOptions, Strategy, parse_document, process};
pub use map::{CityStat, MapObserver, MapScene, MapView, aggregate_city_stats};
pub use placement::{
    Algorithm, Anchor, BoundingRect, LabelPlacer, Obstacle, PlacementError, PlacementResult,
    place_with_fallback,
};
pub use projection::{GeoBounds, MercatorProjection};
pub use render::render_svg;
pub use scene_dump::PlacementDump;
