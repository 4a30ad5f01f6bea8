use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Theme {
    pub font_family: String,
    pub background: String,
    pub map_fill: String,
    pub map_border: String,
    pub city_dot: String,
    pub count_circle: String,
    pub connecting_line: String,
    pub count_text: String,
    pub highlight_stroke: String,
}

impl Theme {
    /// Dark dashboard palette: black states, red markers, dark red badges.
    pub fn dashboard() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            background: "#000000".to_string(),
            map_fill: "#000000".to_string(),
            map_border: "#828282".to_string(),
            city_dot: "#c80000".to_string(),
            count_circle: "#640000".to_string(),
            connecting_line: "#640000".to_string(),
            count_text: "#ffffff".to_string(),
            highlight_stroke: "#ffffff".to_string(),
        }
    }

    pub fn light() -> Self {
        Self {
            font_family: "Inter, Segoe UI, system-ui, -apple-system, sans-serif".to_string(),
            background: "#ffffff".to_string(),
            map_fill: "#f2f2f2".to_string(),
            map_border: "#828282".to_string(),
            city_dot: "#c80000".to_string(),
            count_circle: "#640000".to_string(),
            connecting_line: "#323232".to_string(),
            count_text: "#ffffff".to_string(),
            highlight_stroke: "#323232".to_string(),
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dashboard()
    }
}
