//! # Collage - headless collage editor
//!
//! Replays an edit script against the editor core and prints the resulting
//! document.
//!
//! ## Quick Start
//!
//! ```bash
//! # List built-in layouts, filters, mirror modes and AI effects
//! cargo run -- --list-presets
//!
//! # Replay a script on a 600x600 canvas
//! cargo run -- --canvas 600x600 script.json
//!
//! # Continue editing a saved document
//! cargo run -- --input collage.json --output out.json script.json
//! ```

mod script;

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use collage_core::{Config, Editor};
use collage_document::{AiEffect, CanvasSize, CollageDocument, presets};
use collage_services::mock_services;

/// Collage - a headless collage editor
#[derive(Parser, Debug)]
#[command(name = "collage")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Edit script to replay
    #[arg(value_name = "SCRIPT")]
    script: Option<PathBuf>,

    /// Config file (defaults to the user config directory)
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Document to start from
    #[arg(short, long, value_name = "DOC")]
    input: Option<PathBuf>,

    /// Write the final document here instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Canvas size in pixels, e.g. 600x400
    #[arg(long, value_name = "WxH", value_parser = parse_canvas)]
    canvas: Option<CanvasSize>,

    /// Print the built-in presets and exit
    #[arg(long)]
    list_presets: bool,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,

    /// Verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn parse_canvas(s: &str) -> Result<CanvasSize, String> {
    let (w, h) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WxH, got {s:?}"))?;
    let width: f64 = w.trim().parse().map_err(|_| format!("bad width {w:?}"))?;
    let height: f64 = h.trim().parse().map_err(|_| format!("bad height {h:?}"))?;
    if width <= 0.0 || height <= 0.0 || !width.is_finite() || !height.is_finite() {
        return Err(format!("canvas must be positive, got {s:?}"));
    }
    Ok(CanvasSize::new(width, height))
}

fn print_presets() {
    println!("Layouts:");
    for layout in presets::grid_layouts() {
        println!("  {:<8} {} ({}x{})", layout.id, layout.name, layout.rows, layout.cols);
    }
    println!("Mirror modes:");
    for mode in presets::mirror_modes() {
        println!("  {} / {}", mode.axis, mode.part_count);
    }
    println!("Filters:");
    for filter in presets::filters() {
        println!("  {:<9} {}", filter.id, filter.name);
    }
    println!("AI effects:");
    for effect in AiEffect::ALL {
        println!("  {:<5} {} - {}", effect.id(), effect.name(), effect.description());
    }
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(Config::load()),
    }
}

fn load_document(path: &Path) -> anyhow::Result<CollageDocument> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("Invalid document {}", path.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting Collage v{}", env!("CARGO_PKG_VERSION"));

    if args.list_presets {
        print_presets();
        return Ok(());
    }

    let config = load_config(args.config.as_deref())?;
    if args.print_config {
        print!("{}", toml::to_string_pretty(&config)?);
        return Ok(());
    }

    let services = mock_services(&config.services);
    let mut editor = Editor::new(config, services);

    if let Some(canvas) = args.canvas {
        editor.store_mut().set_canvas_size(canvas);
    }

    if let Some(input) = &args.input {
        let document = load_document(input)?;
        editor.store_mut().load(document)?;
        tracing::info!("Loaded {}", input.display());
    }

    if let Some(path) = &args.script {
        let steps = script::load(path)?;
        let summary = script::run(&mut editor, &steps).await?;
        tracing::info!("{:?}", summary);
    }

    let json = serde_json::to_string_pretty(editor.document())?;
    match &args.output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{json}"),
    }

    Ok(())
}
