use crate::config::{MapStyle, RenderConfig};
use crate::map::{CityMarker, MapScene};
use crate::theme::Theme;
use anyhow::Result;
use std::path::Path;

/// Render a map scene as a standalone SVG document.
///
/// Connector lines go first, then city dots, then count badges, so badges
/// always sit on top.
pub fn render_svg(scene: &MapScene, theme: &Theme, style: &MapStyle) -> String {
    let mut svg = String::new();
    let bounds = scene.bounds;
    let width = bounds.width().max(1.0);
    let height = bounds.height().max(1.0);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width}\" height=\"{height}\" viewBox=\"{} {} {width} {height}\">",
        bounds.min_x, bounds.min_y
    ));
    svg.push_str(&format!(
        "<rect x=\"{}\" y=\"{}\" width=\"100%\" height=\"100%\" fill=\"{}\"/>",
        bounds.min_x, bounds.min_y, theme.background
    ));

    svg.push_str(&render_markers(scene, theme, style));
    svg.push_str("</svg>");
    svg
}

/// Marker layers alone (lines, dots, badges) as SVG groups.
pub fn render_markers(scene: &MapScene, theme: &Theme, style: &MapStyle) -> String {
    let mut out = String::new();
    out.push_str("<g class=\"connecting-lines-group\">");
    for marker in &scene.markers {
        out.push_str(&format!(
            "<line class=\"connecting-line\" data-city=\"{}\" x1=\"{:.2}\" y1=\"{:.2}\" x2=\"{:.2}\" y2=\"{:.2}\" stroke=\"{}\" stroke-width=\"{}\"/>",
            escape_xml(&marker.name),
            marker.anchor.x,
            marker.anchor.y,
            marker.label.x,
            marker.label.y,
            theme.connecting_line,
            style.line_stroke_width
        ));
    }
    out.push_str("</g>");

    out.push_str("<g class=\"city-dots-group\">");
    for marker in &scene.markers {
        let radius = if scene.is_highlighted(&marker.name) {
            style.city_dot_radius * style.hover_scale
        } else {
            style.city_dot_radius
        };
        out.push_str(&format!(
            "<circle class=\"city-dot\" data-city=\"{}\" data-count=\"{}\" cx=\"{:.2}\" cy=\"{:.2}\" r=\"{radius}\" fill=\"{}\">{}</circle>",
            escape_xml(&marker.name),
            marker.count,
            marker.anchor.x,
            marker.anchor.y,
            theme.city_dot,
            title_svg(marker)
        ));
    }
    out.push_str("</g>");

    out.push_str("<g class=\"count-circles-group\">");
    for marker in &scene.markers {
        out.push_str(&badge_svg(marker, scene.is_highlighted(&marker.name), theme));
    }
    out.push_str("</g>");

    out
}

/// Draw the markers on top of an existing map SVG. Returns `None` when the
/// document has no closing `</svg>` tag.
pub fn overlay_svg(map_svg: &str, scene: &MapScene, theme: &Theme, style: &MapStyle) -> Option<String> {
    let close = map_svg.rfind("</svg>")?;
    let mut svg = String::with_capacity(map_svg.len() + 4096);
    svg.push_str(&map_svg[..close]);
    svg.push_str(&render_markers(scene, theme, style));
    svg.push_str(&map_svg[close..]);
    Some(svg)
}

fn badge_svg(marker: &CityMarker, highlighted: bool, theme: &Theme) -> String {
    let stroke = if highlighted {
        format!(" stroke=\"{}\" stroke-width=\"2\"", theme.highlight_stroke)
    } else {
        String::new()
    };
    let font_size = (marker.badge_radius * 0.6).max(12.0);
    format!(
        "<g class=\"count-circle-group\" data-city=\"{name}\">{title}<circle class=\"count-circle\" cx=\"{x:.2}\" cy=\"{y:.2}\" r=\"{r}\" fill=\"{fill}\"{stroke}/><text class=\"count-text\" x=\"{x:.2}\" y=\"{y:.2}\" text-anchor=\"middle\" dominant-baseline=\"central\" font-family=\"{font}\" font-size=\"{font_size}\" font-weight=\"bold\" fill=\"{text}\">{count}</text></g>",
        name = escape_xml(&marker.name),
        title = title_svg(marker),
        x = marker.label.x,
        y = marker.label.y,
        r = marker.badge_radius,
        fill = theme.count_circle,
        font = escape_xml(&theme.font_family),
        text = theme.count_text,
        count = marker.count,
    )
}

fn title_svg(marker: &CityMarker) -> String {
    format!("<title>{}</title>", escape_xml(&marker.tooltip.join("\n")))
}

pub fn write_output_svg(svg: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, svg)?;
        }
        None => {
            print!("{}", svg);
        }
    }
    Ok(())
}

#[cfg(feature = "png")]
pub fn write_output_png(svg: &str, output: &Path, render_cfg: &RenderConfig, theme: &Theme) -> Result<()> {
    let mut opt = usvg::Options::default();
    opt.font_family = theme
        .font_family
        .split(',')
        .next()
        .unwrap_or("Inter")
        .trim()
        .to_string();
    opt.default_size = usvg::Size::from_wh(render_cfg.width, render_cfg.height)
        .ok_or_else(|| anyhow::anyhow!("Invalid render size {}x{}", render_cfg.width, render_cfg.height))?;

    let tree = usvg::Tree::from_str(svg, &opt)?;
    let size = tree.size().to_int_size();
    let mut pixmap = resvg::tiny_skia::Pixmap::new(size.width(), size.height())
        .ok_or_else(|| anyhow::anyhow!("Failed to allocate pixmap"))?;

    let mut pixmap_mut = pixmap.as_mut();
    resvg::render(&tree, resvg::tiny_skia::Transform::default(), &mut pixmap_mut);
    pixmap.save_png(output)?;
    Ok(())
}

#[cfg(not(feature = "png"))]
pub fn write_output_png(_svg: &str, _output: &Path, _render_cfg: &RenderConfig, _theme: &Theme) -> Result<()> {
    Err(anyhow::anyhow!("PNG output requires the `png` feature"))
}

fn escape_xml(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}
