use crate::placement::PlacementError;
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Tuning for the label placement engine. Distances are in map units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacementConfig {
    /// Preferred distance between a marker and its label.
    pub offset_distance: f32,
    /// Separations below this are clamped in the many-body repulsion.
    pub min_distance: f32,
    pub simulation_iterations: usize,
    /// Average per-label movement (per 10 ticks) below which the run is done.
    pub convergence_threshold: f32,
    pub attraction_strength: f32,
    /// Negative values repel.
    pub repulsion_strength: f32,
    pub bias_strength: f32,
    pub boundary_strength: f32,
    pub collision_buffer: f32,
    pub small_dataset_threshold: usize,
    pub large_dataset_threshold: usize,
    pub spatial_grid_size: f32,
    /// Neighbour radius for initial placement; `None` means twice the offset.
    pub cluster_radius: Option<f32>,
    pub anchor_marker_radius: f32,
    /// Extra gap kept between a label and the map edge.
    pub boundary_padding: f32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            offset_distance: 40.0,
            min_distance: 50.0,
            simulation_iterations: 300,
            convergence_threshold: 0.1,
            attraction_strength: 0.3,
            repulsion_strength: -30.0,
            bias_strength: 0.1,
            boundary_strength: 0.5,
            collision_buffer: 15.0,
            small_dataset_threshold: 10,
            large_dataset_threshold: 50,
            spatial_grid_size: 50.0,
            cluster_radius: None,
            anchor_marker_radius: 8.0,
            boundary_padding: 10.0,
        }
    }
}

impl PlacementConfig {
    /// Tighter, faster settings used by the German concert map.
    pub fn german_map() -> Self {
        Self {
            offset_distance: 25.0,
            min_distance: 25.0,
            simulation_iterations: 50,
            convergence_threshold: 0.2,
            attraction_strength: 0.25,
            repulsion_strength: -20.0,
            bias_strength: 0.15,
            boundary_strength: 0.5,
            collision_buffer: 8.0,
            ..Self::default()
        }
    }

    pub fn neighbour_radius(&self) -> f32 {
        self.cluster_radius.unwrap_or(self.offset_distance * 2.0)
    }

    /// Link distance for splitting large inputs into batches.
    pub fn batch_link_distance(&self) -> f32 {
        self.offset_distance * 3.0
    }

    pub fn validate(&self) -> Result<(), PlacementError> {
        let finite = [
            self.offset_distance,
            self.min_distance,
            self.convergence_threshold,
            self.attraction_strength,
            self.repulsion_strength,
            self.bias_strength,
            self.boundary_strength,
            self.collision_buffer,
            self.spatial_grid_size,
            self.anchor_marker_radius,
            self.boundary_padding,
        ];
        if finite.iter().any(|value| !value.is_finite()) {
            return Err(PlacementError::InvalidConfig(
                "placement settings must be finite numbers".to_string(),
            ));
        }
        if self.offset_distance <= 0.0 {
            return Err(PlacementError::InvalidConfig(format!(
                "offsetDistance must be positive, got {}",
                self.offset_distance
            )));
        }
        if self.collision_buffer < 0.0 || self.min_distance < 0.0 {
            return Err(PlacementError::InvalidConfig(
                "collisionBuffer and minDistance must not be negative".to_string(),
            ));
        }
        if self.small_dataset_threshold > self.large_dataset_threshold {
            return Err(PlacementError::InvalidConfig(format!(
                "smallDatasetThreshold ({}) exceeds largeDatasetThreshold ({})",
                self.small_dataset_threshold, self.large_dataset_threshold
            )));
        }
        if let Some(radius) = self.cluster_radius {
            if !radius.is_finite() || radius < 0.0 {
                return Err(PlacementError::InvalidConfig(format!(
                    "clusterRadius must be a non-negative number, got {radius}"
                )));
            }
        }
        Ok(())
    }
}

/// Visual sizes of the map elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapStyle {
    pub city_dot_radius: f32,
    pub count_circle_radius: f32,
    pub line_stroke_width: f32,
    /// Marker growth factor while hovered.
    pub hover_scale: f32,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self {
            city_dot_radius: 4.0,
            count_circle_radius: 12.0,
            line_stroke_width: 3.0,
            hover_scale: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    pub width: f32,
    pub height: f32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            width: 1000.0,
            height: 1000.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub theme: Theme,
    pub placement: PlacementConfig,
    pub map: MapStyle,
    pub render: RenderConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            theme: Theme::dashboard(),
            placement: PlacementConfig::german_map(),
            map: MapStyle::default(),
            render: RenderConfig::default(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct PlacementConfigFile {
    offset_distance: Option<f32>,
    min_distance: Option<f32>,
    simulation_iterations: Option<usize>,
    convergence_threshold: Option<f32>,
    attraction_strength: Option<f32>,
    repulsion_strength: Option<f32>,
    bias_strength: Option<f32>,
    boundary_strength: Option<f32>,
    collision_buffer: Option<f32>,
    small_dataset_threshold: Option<usize>,
    large_dataset_threshold: Option<usize>,
    spatial_grid_size: Option<f32>,
    cluster_radius: Option<f32>,
    anchor_marker_radius: Option<f32>,
    boundary_padding: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct MapStyleFile {
    city_dot_radius: Option<f32>,
    count_circle_radius: Option<f32>,
    line_stroke_width: Option<f32>,
    hover_scale: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ThemeFile {
    background: Option<String>,
    map_fill: Option<String>,
    map_border: Option<String>,
    city_dot: Option<String>,
    count_circle: Option<String>,
    connecting_line: Option<String>,
    count_text: Option<String>,
    highlight_stroke: Option<String>,
    font_family: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct RenderConfigFile {
    width: Option<f32>,
    height: Option<f32>,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    /// Named starting point for placement tuning: "germanMap" or "default".
    preset: Option<String>,
    theme: Option<String>,
    theme_variables: Option<ThemeFile>,
    placement: Option<PlacementConfigFile>,
    map: Option<MapStyleFile>,
    render: Option<RenderConfigFile>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = json5::from_str(&contents)?;
    apply_config_file(&mut config, parsed)?;
    Ok(config)
}

/// Parse JSON5 config text and layer it over the defaults.
pub fn parse_config(contents: &str) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let parsed: ConfigFile = json5::from_str(contents)?;
    apply_config_file(&mut config, parsed)?;
    Ok(config)
}

fn apply_config_file(config: &mut Config, parsed: ConfigFile) -> anyhow::Result<()> {
    match parsed.preset.as_deref() {
        None | Some("germanMap") | Some("german-map") => {}
        Some("default") => config.placement = PlacementConfig::default(),
        Some(other) => return Err(anyhow::anyhow!("unknown placement preset: {other}")),
    }

    if let Some(theme_name) = parsed.theme.as_deref() {
        if theme_name == "light" {
            config.theme = Theme::light();
        } else if theme_name == "dashboard" || theme_name == "default" {
            config.theme = Theme::dashboard();
        }
    }

    if let Some(vars) = parsed.theme_variables {
        if let Some(v) = vars.background {
            config.theme.background = v;
        }
        if let Some(v) = vars.map_fill {
            config.theme.map_fill = v;
        }
        if let Some(v) = vars.map_border {
            config.theme.map_border = v;
        }
        if let Some(v) = vars.city_dot {
            config.theme.city_dot = v;
        }
        if let Some(v) = vars.count_circle {
            config.theme.count_circle = v;
        }
        if let Some(v) = vars.connecting_line {
            config.theme.connecting_line = v;
        }
        if let Some(v) = vars.count_text {
            config.theme.count_text = v;
        }
        if let Some(v) = vars.highlight_stroke {
            config.theme.highlight_stroke = v;
        }
        if let Some(v) = vars.font_family {
            config.theme.font_family = v;
        }
    }

    if let Some(p) = parsed.placement {
        let target = &mut config.placement;
        if let Some(v) = p.offset_distance {
            target.offset_distance = v;
        }
        if let Some(v) = p.min_distance {
            target.min_distance = v;
        }
        if let Some(v) = p.simulation_iterations {
            target.simulation_iterations = v;
        }
        if let Some(v) = p.convergence_threshold {
            target.convergence_threshold = v;
        }
        if let Some(v) = p.attraction_strength {
            target.attraction_strength = v;
        }
        if let Some(v) = p.repulsion_strength {
            target.repulsion_strength = v;
        }
        if let Some(v) = p.bias_strength {
            target.bias_strength = v;
        }
        if let Some(v) = p.boundary_strength {
            target.boundary_strength = v;
        }
        if let Some(v) = p.collision_buffer {
            target.collision_buffer = v;
        }
        if let Some(v) = p.small_dataset_threshold {
            target.small_dataset_threshold = v;
        }
        if let Some(v) = p.large_dataset_threshold {
            target.large_dataset_threshold = v;
        }
        if let Some(v) = p.spatial_grid_size {
            target.spatial_grid_size = v;
        }
        if let Some(v) = p.cluster_radius {
            target.cluster_radius = Some(v);
        }
        if let Some(v) = p.anchor_marker_radius {
            target.anchor_marker_radius = v;
        }
        if let Some(v) = p.boundary_padding {
            target.boundary_padding = v;
        }
    }

    if let Some(m) = parsed.map {
        if let Some(v) = m.city_dot_radius {
            config.map.city_dot_radius = v;
        }
        if let Some(v) = m.count_circle_radius {
            config.map.count_circle_radius = v;
        }
        if let Some(v) = m.line_stroke_width {
            config.map.line_stroke_width = v;
        }
        if let Some(v) = m.hover_scale {
            config.map.hover_scale = v;
        }
    }

    if let Some(r) = parsed.render {
        if let Some(v) = r.width {
            config.render.width = v;
        }
        if let Some(v) = r.height {
            config.render.height = v;
        }
    }

    config.placement.validate()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_tuning() {
        let config = PlacementConfig::default();
        assert_eq!(config.offset_distance, 40.0);
        assert_eq!(config.simulation_iterations, 300);
        assert_eq!(config.repulsion_strength, -30.0);
        assert_eq!(config.small_dataset_threshold, 10);
        assert_eq!(config.large_dataset_threshold, 50);
        assert_eq!(config.neighbour_radius(), 80.0);
        assert_eq!(config.batch_link_distance(), 120.0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn json5_file_overrides_selected_fields() {
        let config = parse_config(
            r#"{
                // map tuned for a small viewport
                preset: "default",
                theme: "light",
                placement: { offsetDistance: 30, simulationIterations: 120 },
                map: { countCircleRadius: 10 },
            }"#,
        )
        .expect("config should parse");
        assert_eq!(config.placement.offset_distance, 30.0);
        assert_eq!(config.placement.simulation_iterations, 120);
        assert_eq!(config.placement.collision_buffer, 15.0);
        assert_eq!(config.map.count_circle_radius, 10.0);
        assert_eq!(config.theme.background, Theme::light().background);
    }

    #[test]
    fn inverted_thresholds_are_rejected() {
        let err = parse_config(
            r#"{ placement: { smallDatasetThreshold: 60, largeDatasetThreshold: 20 } }"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("smallDatasetThreshold"));
    }

    #[test]
    fn unknown_preset_is_an_error() {
        assert!(parse_config(r#"{ preset: "mystery" }"#).is_err());
    }
}
