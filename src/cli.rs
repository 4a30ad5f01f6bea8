use crate::config::load_config;
use crate::document::{RunOptions, Strategy, parse_document, process};
use crate::placement::BoundingRect;
use crate::projection::viewbox_bounds;
use crate::render::{overlay_svg, render_svg, write_output_png, write_output_svg};
use crate::scene_dump::write_placement_dump;
use anyhow::Result;
use clap::{Parser, ValueEnum};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "maplabels", version, about = "Place count badges next to map markers")]
pub struct Args {
    /// Input JSON (anchors or a venue/concert dataset) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file. Defaults to stdout for SVG and JSON.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Output format
    #[arg(short = 'e', long = "outputFormat", value_enum, default_value = "svg")]
    pub output_format: OutputFormat,

    /// Config file (JSON5)
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Map SVG: its viewBox gives the bounds and markers are drawn on top of it
    #[arg(long = "map")]
    pub map: Option<PathBuf>,

    /// Placement bounds as minX,minY,maxX,maxY
    #[arg(long = "bounds", value_parser = parse_bounds)]
    pub bounds: Option<BoundingRect>,

    /// Placement strategy
    #[arg(long = "algorithm", value_enum, default_value = "auto")]
    pub algorithm: AlgorithmArg,

    /// Width
    #[arg(short = 'w', long = "width")]
    pub width: Option<f32>,

    /// Height
    #[arg(short = 'H', long = "height")]
    pub height: Option<f32>,

    /// Log placement decisions to stderr
    #[arg(short = 'v', long = "verbose")]
    pub verbose: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum OutputFormat {
    Svg,
    Png,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy)]
pub enum AlgorithmArg {
    Auto,
    Greedy,
    Force,
}

impl From<AlgorithmArg> for Strategy {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Auto => Strategy::Auto,
            AlgorithmArg::Greedy => Strategy::Greedy,
            AlgorithmArg::Force => Strategy::Force,
        }
    }
}

pub fn run() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);

    let mut config = load_config(args.config.as_deref())?;
    if let Some(width) = args.width {
        config.render.width = width;
    }
    if let Some(height) = args.height {
        config.render.height = height;
    }

    let map_svg = match args.map.as_deref() {
        Some(path) => Some(std::fs::read_to_string(path)?),
        None => None,
    };
    let mut bounds = args.bounds;
    if bounds.is_none() {
        if let Some(svg) = map_svg.as_deref() {
            bounds = Some(
                viewbox_bounds(svg).ok_or_else(|| anyhow::anyhow!("Map SVG has no usable viewBox"))?,
            );
        }
    }

    let input = read_input(args.input.as_deref())?;
    let document =
        parse_document(&input).map_err(|err| anyhow::anyhow!("Invalid input document: {err}"))?;
    let options = RunOptions {
        bounds,
        strategy: args.algorithm.into(),
    };

    let started = Instant::now();
    let processed = process(document, &config, &options)?;
    info!(
        labels = processed.dump.labels.len(),
        algorithm = processed
            .dump
            .metrics
            .algorithm
            .map(|a| a.as_str())
            .unwrap_or("none"),
        iterations = processed.dump.metrics.iterations,
        fallback = processed.dump.fallback_used,
        elapsed_ms = started.elapsed().as_secs_f64() * 1000.0,
        "placement complete"
    );

    let svg = || match map_svg.as_deref() {
        Some(map) => overlay_svg(map, &processed.scene, &config.theme, &config.map)
            .ok_or_else(|| anyhow::anyhow!("Map SVG has no closing </svg> tag")),
        None => Ok(render_svg(&processed.scene, &config.theme, &config.map)),
    };
    match args.output_format {
        OutputFormat::Svg => write_output_svg(&svg()?, args.output.as_deref())?,
        OutputFormat::Png => {
            let output = ensure_output(&args.output, "png")?;
            write_output_png(&svg()?, &output, &config.render, &config.theme)?;
        }
        OutputFormat::Json => write_placement_dump(args.output.as_deref(), &processed.dump)?,
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn parse_bounds(raw: &str) -> Result<BoundingRect, String> {
    let values: Vec<f32> = raw
        .split(',')
        .map(|part| part.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|err| format!("invalid number in bounds: {err}"))?;
    let [min_x, min_y, max_x, max_y] = values[..] else {
        return Err(format!("expected minX,minY,maxX,maxY, got {} values", values.len()));
    };
    if !values.iter().all(|v| v.is_finite()) {
        return Err("bounds must be finite numbers".to_string());
    }
    let rect = BoundingRect::new(min_x, min_y, max_x, max_y);
    if rect.is_inverted() {
        return Err("bounds max must not be below min".to_string());
    }
    Ok(rect)
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path {
        if path != Path::new("-") {
            return Ok(std::fs::read_to_string(path)?);
        }
    }

    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

fn ensure_output(output: &Option<PathBuf>, ext: &str) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.clone());
    }
    Err(anyhow::anyhow!("Output path required for {} output", ext))
}
