use map_labels::{
    BoundingRect, Config, RunOptions, Strategy, parse_config, parse_document, process, render_svg,
};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PlaceLabelsOptions {
    algorithm: Option<Strategy>,
    bounds: Option<BoundingRect>,
    /// JSON5 config text, same shape as the CLI config file.
    config: Option<String>,
}

fn build_options(options_json: Option<&str>) -> Result<(Config, RunOptions), String> {
    let options = match options_json {
        Some(raw) => serde_json::from_str::<PlaceLabelsOptions>(raw).map_err(|error| error.to_string())?,
        None => PlaceLabelsOptions::default(),
    };
    let config = match options.config.as_deref() {
        Some(raw) => parse_config(raw).map_err(|error| error.to_string())?,
        None => Config::default(),
    };
    let run = RunOptions {
        bounds: options.bounds,
        strategy: options.algorithm.unwrap_or_default(),
    };
    Ok((config, run))
}

fn place(input_json: &str, options_json: Option<&str>) -> Result<String, String> {
    let (config, run) = build_options(options_json)?;
    let document = parse_document(input_json).map_err(|error| error.to_string())?;
    let processed = process(document, &config, &run).map_err(|error| error.to_string())?;
    processed.dump.to_json().map_err(|error| error.to_string())
}

fn render(input_json: &str, options_json: Option<&str>) -> Result<String, String> {
    let (config, run) = build_options(options_json)?;
    let document = parse_document(input_json).map_err(|error| error.to_string())?;
    let processed = process(document, &config, &run).map_err(|error| error.to_string())?;
    Ok(render_svg(&processed.scene, &config.theme, &config.map))
}

/// Place labels and return the JSON placement dump.
#[wasm_bindgen]
pub fn place_labels(input_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    place(input_json, options_json.as_deref()).map_err(|error| JsValue::from_str(&error))
}

/// Place labels and return the rendered marker SVG.
#[wasm_bindgen]
pub fn render_labels_svg(input_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    render(input_json, options_json.as_deref()).map_err(|error| JsValue::from_str(&error))
}

#[cfg(test)]
mod tests {
    use crate::{place, render};

    const INPUT: &str = r#"{
        "anchors": [
            {"x": 120, "y": 140, "radius": 12, "name": "Kassel", "count": 2},
            {"x": 130, "y": 150, "radius": 12, "name": "Göttingen", "count": 5}
        ],
        "bounds": {"minX": 0, "minY": 0, "maxX": 400, "maxY": 400}
    }"#;

    #[test]
    fn places_anchor_document() {
        let json = place(INPUT, None).expect("anchors should place");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["labels"].as_array().unwrap().len(), 2);
        assert_eq!(value["labels"][1]["payload"]["name"], "Göttingen");
        assert_eq!(value["metrics"]["algorithm"], "greedy");
    }

    #[test]
    fn options_choose_strategy_and_config() {
        let options = r#"{"algorithm": "force", "config": "{ placement: { offsetDistance: 30 } }"}"#;
        let json = place(INPUT, Some(options)).expect("options should apply");
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["metrics"]["algorithm"], "force-simulation");
    }

    #[test]
    fn renders_svg_and_reports_bad_input() {
        let svg = render(INPUT, None).unwrap();
        assert!(svg.contains("data-city=\"Kassel\""));
        assert!(place("{\"nope\": 1}", None).is_err());
        assert!(place(INPUT, Some("{\"algorithm\": \"sideways\"}")).is_err());
    }
}
