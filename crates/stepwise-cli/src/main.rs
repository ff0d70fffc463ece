//! Stepwise - Main entry point
//!
//! Loads a scene manifest, builds the assembly sequencer and drives it
//! from the terminal.

mod config;
mod console;
mod highlight;

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use stepwise_core::{
    find_model_root, find_path, model_base, IndicatorSet, RecordingStage, SceneManifest, SceneTree,
    Sequencer,
};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use crate::console::Session;
use crate::highlight::PulseHighlighter;

#[derive(Parser, Debug)]
#[command(name = "stepwise")]
#[command(about = "Step-by-step exploded-view assembly guide")]
#[command(version)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "stepwise.toml")]
    config: PathBuf,

    /// Scene manifest, overrides the configured one
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Comma-separated commands to run instead of the interactive prompt
    #[arg(short, long)]
    script: Option<String>,

    /// Write a default configuration file and exit
    #[arg(long)]
    init: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Stepwise v{}", env!("CARGO_PKG_VERSION"));

    if args.init {
        config::save_default_config(&args.config)?;
        info!(path = %args.config.display(), "Wrote default configuration");
        return Ok(());
    }

    let mut config = config::load_config(&args.config)?;
    if let Some(manifest) = args.manifest {
        config.model.manifest = manifest.display().to_string();
    }

    info!(
        manifest = %config.model.manifest,
        root = %config.model.root,
        step_prefix = %config.naming.step_prefix,
        "Configuration loaded"
    );

    let manifest = SceneManifest::from_file(config.model.manifest.as_ref())
        .with_context(|| format!("Failed to load scene manifest {}", config.model.manifest))?;
    let tree = SceneTree::from_manifest(&manifest);

    let sequencer = Sequencer::from_hierarchy(&tree, tree.root(), &config.model.root, &config.naming)?;

    let model_root = find_model_root(&tree, tree.root(), &config.model.root)?;
    let scene_base = model_base(&tree, model_root);
    let indicators = match find_path(&tree, scene_base, &config.naming.indicators_path) {
        Some(container) => IndicatorSet::discover(&tree, container, &config.naming.step_prefix),
        None => {
            warn!(path = %config.naming.indicators_path, "No step indicators in scene");
            IndicatorSet::default()
        }
    };

    let highlighter = PulseHighlighter::new(
        &indicators,
        config.highlight.pulse,
        Duration::from_millis(config.highlight.tick_ms.max(1)),
    );
    let board = highlighter.board();
    let sequencer = sequencer.with_highlighter(Box::new(highlighter));
    let stage = RecordingStage::from_parts(sequencer.parts());

    let mut session = Session {
        sequencer,
        stage,
        board: Some(board),
        step_texts: config.guide.step_texts,
    };

    match args.script {
        Some(script) => console::run_script(&mut session, &script)?,
        None => console::run_interactive(&mut session).await?,
    }

    Ok(())
}
