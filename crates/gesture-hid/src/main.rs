//! Gesture-HID entry point.
//!
//! Loads the configuration, builds the frame source, pose estimator, gesture
//! source and bridge transport it names, and runs the pipeline until Ctrl-C.
//!
//! # Usage
//!
//! ```text
//! gesture-hid [OPTIONS] [COMMAND]
//!
//! Commands:
//!   run       Run the pipeline (default)
//!   release   Release every key and mouse button on the bridge, then exit
//!   init      Write the default config.toml
//!
//! Options:
//!   --config <PATH>        Config file [env: GESTURE_HID_CONFIG]
//!   --bridge-host <HOST>   Override [bridge].host [env: GESTURE_HID_BRIDGE_HOST]
//!   --bridge-port <PORT>   Override [bridge].port [env: GESTURE_HID_BRIDGE_PORT]
//!   --mode <MODE>          serial | async
//! ```
//!
//! # Architecture
//!
//! ```text
//! main()
//!  └─ load_config()            -- TOML, defaults when missing
//!  └─ run()
//!       ├─ gesture reload task  (Tokio task)
//!       ├─ Ctrl-C handler       (Tokio task)
//!       └─ Pipeline             (blocking thread)
//!            └─ capture thread  (async mode only)
//! ```

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use gesture_hid::application::pipeline::{Pipeline, PipelineControl};
use gesture_hid::application::sources::{ConfigSource, GestureConfig, StaticConfigSource};
use gesture_hid::application::synthesize::CommandSynthesizer;
use gesture_hid::infrastructure::camera::create_frame_source;
use gesture_hid::infrastructure::estimator::create_estimator;
use gesture_hid::infrastructure::storage::config::{
    config_file_path, load_config, write_default_config, AppConfig, PipelineMode,
};
use gesture_hid::infrastructure::storage::gestures::{spawn_reload_task, FileConfigSource};
use gesture_hid::infrastructure::transport::{TcpLink, TcpTransport};

// ── CLI argument definitions ──────────────────────────────────────────────────

/// Turns body poses seen by a camera into keyboard and mouse input sent to a
/// USB HID bridge.
#[derive(Debug, Parser)]
#[command(name = "gesture-hid", version)]
struct Cli {
    /// Path of the TOML config file.  Defaults to the platform config directory.
    #[arg(long, env = "GESTURE_HID_CONFIG")]
    config: Option<PathBuf>,

    /// Hostname or IP address of the bridge.
    #[arg(long, env = "GESTURE_HID_BRIDGE_HOST")]
    bridge_host: Option<String>,

    /// TCP port of the bridge.
    #[arg(long, env = "GESTURE_HID_BRIDGE_PORT")]
    bridge_port: Option<u16>,

    /// Pipeline scheduling: `serial` or `async`.
    #[arg(long)]
    mode: Option<PipelineMode>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Run the gesture pipeline until Ctrl-C.
    Run,
    /// Send the release-all keyboard and mouse packets, then exit.
    Release,
    /// Write the default configuration to `--config` or the platform path.
    Init {
        /// Replace an existing file.
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Applies command-line overrides on top of the file config.
    fn apply_overrides(&self, config: &mut AppConfig) {
        if let Some(host) = &self.bridge_host {
            config.bridge.host = host.clone();
        }
        if let Some(port) = self.bridge_port {
            config.bridge.port = port;
        }
        if let Some(mode) = self.mode {
            config.pipeline.mode = mode;
        }
    }
}

/// `RUST_LOG` wins, then the configured level, then `info`.
fn log_filter(config_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config_level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(Command::Init { force }) = cli.command {
        tracing_subscriber::fmt().with_env_filter(log_filter("info")).init();
        return init(cli.config.as_deref(), force);
    }

    let (mut config, config_path) =
        load_config(cli.config.as_deref()).context("failed to load configuration")?;
    cli.apply_overrides(&mut config);

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(&config.pipeline.log_level))
        .init();

    info!("Gesture-HID starting, config {}", config_path.display());

    let transport = TcpTransport::new(TcpLink::from_config(&config.bridge));
    match cli.command.unwrap_or(Command::Run) {
        Command::Release => tokio::task::spawn_blocking(move || release(transport))
            .await
            .context("release task panicked")?,
        Command::Run => run(config, transport).await,
        Command::Init { force } => init(cli.config.as_deref(), force),
    }
}

/// Writes the default config without reading any existing one.
fn init(explicit: Option<&Path>, force: bool) -> anyhow::Result<()> {
    let path = match explicit {
        Some(path) => path.to_path_buf(),
        None => config_file_path().context("no --config given and no platform config directory")?,
    };
    write_default_config(&path, force)
        .with_context(|| format!("failed to write {}", path.display()))?;
    info!("edit {} and run `gesture-hid run`", path.display());
    Ok(())
}

/// Sends both release packets, ignoring any dedup state.
fn release(mut transport: TcpTransport) -> anyhow::Result<()> {
    let target = transport.link().target();
    let sent = CommandSynthesizer::new().release_all(&mut transport);
    if sent.len() < 2 {
        anyhow::bail!("bridge at {target} did not accept the release packets");
    }
    info!("released all keys and mouse buttons on {target}");
    Ok(())
}

async fn run(config: AppConfig, transport: TcpTransport) -> anyhow::Result<()> {
    let control = PipelineControl::new(config.pipeline.send_commands);

    let estimator =
        create_estimator(&config.estimator).context("failed to start pose estimator")?;
    let source = create_frame_source(&config.camera).context("failed to set up camera")?;

    // ── Gesture templates ─────────────────────────────────────────────────────
    let (gestures, reload_task): (Arc<dyn ConfigSource>, _) = match &config.gestures.path {
        Some(path) => {
            let file = Arc::new(
                FileConfigSource::open(path)
                    .with_context(|| format!("failed to load gestures from {}", path.display()))?,
            );
            let task = config
                .gestures
                .reload_interval()
                .map(|every| spawn_reload_task(Arc::clone(&file), every, control.running_flag()));
            (file as Arc<dyn ConfigSource>, task)
        }
        None => {
            warn!("no gesture file configured, nothing will be recognised");
            (
                Arc::new(StaticConfigSource::new(GestureConfig::empty())) as Arc<dyn ConfigSource>,
                None,
            )
        }
    };

    let mut pipeline = Pipeline::new(
        config.pipeline_settings(),
        control.clone(),
        estimator,
        gestures,
        Box::new(transport),
    );

    // ── Ctrl-C handler ────────────────────────────────────────────────────────
    let ctrl_c = control.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received Ctrl+C, stopping pipeline");
                ctrl_c.stop();
            }
            Err(e) => error!("failed to listen for Ctrl+C signal: {e}"),
        }
    });

    info!(
        "Gesture-HID ready, bridge {}:{}, {:?} mode.  Press Ctrl-C to exit.",
        config.bridge.host, config.bridge.port, config.pipeline.mode
    );

    // ── Pipeline ──────────────────────────────────────────────────────────────
    let mode = config.pipeline.mode;
    let stats = tokio::task::spawn_blocking(move || match mode {
        PipelineMode::Serial => {
            let mut source = source;
            Ok(pipeline.run_serial(source.as_mut()))
        }
        PipelineMode::Async => pipeline.run_async(source),
    })
    .await
    .context("pipeline thread panicked")?
    .context("pipeline failed to start")?;

    control.stop();
    if let Some(task) = reload_task {
        if let Err(e) = task.await {
            warn!("gesture reload task ended abnormally: {e}");
        }
    }

    info!(
        "Gesture-HID stopped after {} frames, {} poses, {} packets",
        stats.frames_processed, stats.poses_detected, stats.commands_sent
    );
    Ok(())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
