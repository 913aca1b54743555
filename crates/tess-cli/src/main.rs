mod render;
mod server;
mod watch;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rand::SeedableRng;
use rand::rngs::SmallRng;
use tess_config::{EngineConfig, resolve_config_path};
use tess_core::{Engine, FixedTicks, RotationState, SignalCell, export_json};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::render::{Published, drive, run_field, spawn_stdin_reader};
use crate::watch::telemetry_line;

#[derive(Parser)]
#[command(name = "tess", about = "Tesseract projection engine CLI and HTTP surface")]
struct Cli {
    /// Config file (default: $TESS_CONFIG, then $TESS_HOME/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose debug output
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Inputs shared by every command that builds an engine.
#[derive(clap::Args, Clone, Debug, Default)]
struct EngineArgs {
    /// Coherence in [0, 1] (overrides config; clamped)
    #[arg(long, allow_negative_numbers = true)]
    coherence: Option<f64>,

    /// Rotation speed in radians per tick (overrides config; clamped)
    #[arg(long, allow_negative_numbers = true)]
    speed: Option<f64>,

    /// Seed a random starting orientation and the coherence field
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Step the engine without a clock and print the last frame as JSON
    Frame {
        #[command(flatten)]
        engine: EngineArgs,

        /// Number of ticks to run
        #[arg(long, default_value_t = 1)]
        ticks: u64,
    },

    /// Run the render loop, printing one telemetry line per tick
    Run {
        #[command(flatten)]
        engine: EngineArgs,

        /// Stop after this many ticks (default: until interrupted)
        #[arg(long)]
        ticks: Option<u64>,

        /// Drive coherence from the synthetic field generator
        #[arg(long, conflicts_with = "stdin")]
        field: bool,

        /// Read coherence values from stdin, one per line
        #[arg(long)]
        stdin: bool,
    },

    /// Run the render loop behind an HTTP surface
    Serve {
        #[command(flatten)]
        engine: EngineArgs,

        /// Listen address
        #[arg(long, default_value = "127.0.0.1:7878")]
        addr: String,

        /// Drive coherence from the synthetic field generator
        #[arg(long)]
        field: bool,
    },

    /// Follow a running server's frame stream
    Watch {
        /// Server base URL
        #[arg(long, default_value = "http://127.0.0.1:7878")]
        url: String,

        /// Stop after this many frames
        #[arg(long)]
        count: Option<u64>,
    },

    /// Print the resolved configuration as TOML
    Config,
}

fn init_tracing(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(tracing::Level::WARN.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Frame { engine, ticks } => cmd_frame(&cli, engine, *ticks),
        Commands::Run {
            engine,
            ticks,
            field,
            stdin,
        } => cmd_run(&cli, engine, *ticks, *field, *stdin).await,
        Commands::Serve {
            engine,
            addr,
            field,
        } => cmd_serve(&cli, engine, addr, *field).await,
        Commands::Watch { url, count } => cmd_watch(url, *count).await,
        Commands::Config => cmd_config(&cli),
    }
}

fn config_path(cli: &Cli) -> PathBuf {
    resolve_config_path(cli.config.as_deref())
}

fn load_config(cli: &Cli) -> Result<EngineConfig> {
    let path = config_path(cli);
    EngineConfig::load(&path).with_context(|| format!("failed to load config {}", path.display()))
}

fn build_engine(config: &EngineConfig, args: &EngineArgs) -> Result<Engine> {
    let mut settings = config.engine_settings();
    if let Some(c) = args.coherence {
        settings.initial_coherence = c;
    }
    if let Some(s) = args.speed {
        settings.rotation_speed = s;
    }

    let mut engine = Engine::new(settings).context("failed to build hypercube topology")?;
    if let Some(seed) = args.seed {
        let mut rng = SmallRng::seed_from_u64(seed);
        let rotation =
            RotationState::random(&mut rng).with_second_plane_ratio(settings.second_plane_ratio);
        engine = engine.with_rotation(rotation);
    }

    if engine.coherence() != settings.initial_coherence {
        tracing::debug!(
            "coherence {} clamped to {}",
            settings.initial_coherence,
            engine.coherence()
        );
    }
    if engine.rotation_speed() != settings.rotation_speed {
        tracing::debug!(
            "rotation speed {} clamped to {}",
            settings.rotation_speed,
            engine.rotation_speed()
        );
    }
    Ok(engine)
}

/// Cancel `token` on Ctrl-C.
fn cancel_on_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("interrupt received, stopping");
            token.cancel();
        }
    });
}

fn cmd_frame(cli: &Cli, args: &EngineArgs, ticks: u64) -> Result<()> {
    let config = load_config(cli)?;
    let mut engine = build_engine(&config, args)?;

    let mut last = None;
    engine.run(&mut FixedTicks(ticks), |frame| last = Some(frame.clone()));

    match last {
        Some(frame) => {
            let json = export_json(&frame).context("failed to serialize frame")?;
            println!("{json}");
        }
        None => {
            let json = serde_json::to_string_pretty(&engine.status())
                .context("failed to serialize status")?;
            println!("{json}");
        }
    }
    Ok(())
}

async fn cmd_run(
    cli: &Cli,
    args: &EngineArgs,
    ticks: Option<u64>,
    field: bool,
    stdin: bool,
) -> Result<()> {
    let config = load_config(cli)?;
    let coherence = SignalCell::new();
    let engine = build_engine(&config, args)?.with_coherence_source(coherence.clone());

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());
    let tracker = TaskTracker::new();

    if field {
        tracker.spawn(run_field(
            coherence.clone(),
            engine.coherence(),
            config.field_interval(),
            args.seed,
            cancel.clone(),
        ));
    }
    if stdin {
        spawn_stdin_reader(coherence.clone()).context("failed to start stdin reader")?;
    }

    let (tx, _rx) = tokio::sync::watch::channel(Published::idle(&engine));
    drive(
        engine,
        config.tick_interval(),
        ticks,
        cancel.clone(),
        tx,
        |frame| println!("{}", telemetry_line(frame)),
    )
    .await;

    cancel.cancel();
    tracker.close();
    tracker.wait().await;
    Ok(())
}

async fn cmd_serve(cli: &Cli, args: &EngineArgs, addr: &str, field: bool) -> Result<()> {
    let config = load_config(cli)?;
    let coherence = SignalCell::new();
    let speed = SignalCell::new();
    let engine = build_engine(&config, args)?
        .with_coherence_source(coherence.clone())
        .with_speed_source(speed.clone());

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    let local = listener.local_addr().context("failed to read local address")?;

    let cancel = CancellationToken::new();
    cancel_on_interrupt(cancel.clone());
    let tracker = TaskTracker::new();

    let (tx, rx) = tokio::sync::watch::channel(Published::idle(&engine));
    if field {
        tracker.spawn(run_field(
            coherence.clone(),
            engine.coherence(),
            config.field_interval(),
            args.seed,
            cancel.clone(),
        ));
    }
    tracker.spawn(drive(
        engine,
        config.tick_interval(),
        None,
        cancel.clone(),
        tx,
        |_| {},
    ));

    let app = server::router(server::AppState {
        coherence,
        speed,
        published: rx,
    });

    tracing::info!("serving on http://{local}");
    println!("listening on http://{local}");

    let shutdown = cancel.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
        .context("HTTP server failed")?;

    cancel.cancel();
    tracker.close();
    tracker.wait().await;
    Ok(())
}

async fn cmd_watch(url: &str, count: Option<u64>) -> Result<()> {
    let received = watch::follow(url, count).await?;
    tracing::info!("received {received} frames");
    Ok(())
}

fn cmd_config(cli: &Cli) -> Result<()> {
    let path = config_path(cli);
    let config = load_config(cli)?;
    let text = config
        .to_toml_string()
        .context("failed to serialize config")?;
    println!("# resolved from {}", display_source(&path));
    print!("{text}");
    Ok(())
}

fn display_source(path: &Path) -> String {
    if path.exists() {
        path.display().to_string()
    } else {
        format!("{} (not found, defaults)", path.display())
    }
}
