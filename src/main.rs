//! Tracker entry point.
//!
//! # Startup sequence
//!
//! 1. Parse CLI flags.
//! 2. Initialise logging.
//! 3. Load [`AppConfig`] from disk (returns default on first run).
//! 4. Build the collaborator set — hardware backends when compiled in,
//!    otherwise the no-hardware stand-ins so the control core still runs
//!    end to end on a dev machine.
//! 5. Create the tokio runtime and hand everything to the
//!    [`Orchestrator`]; Ctrl-C requests cooperative shutdown.

use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, ValueEnum};

use pan_tracker::{
    config::{AppConfig, ControllerKind},
    motor::NullServo,
    orchestrator::{Collaborators, Orchestrator},
    perception::NullDetector,
    voice::{LogPlayer, NullResponse, NullSpeech},
};

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum ControllerArg {
    /// Proportional-only controller.
    P,
    /// PID controller.
    Pid,
}

/// Pan-axis person-tracking camera with voice control.
#[derive(Debug, Parser)]
#[command(name = "tracker", version)]
struct Cli {
    /// Path to an explicit settings.toml (defaults to the platform config
    /// directory).
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Enable debug output.
    #[arg(long)]
    debug: bool,

    /// Override the configured controller variant.
    #[arg(long, value_enum)]
    controller: Option<ControllerArg>,
}

// ---------------------------------------------------------------------------
// main
// ---------------------------------------------------------------------------

fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. Logging
    let default_filter = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    log::info!("pan tracker starting up");

    // 2. Configuration
    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path)?,
        None => AppConfig::load().unwrap_or_else(|e| {
            log::warn!("failed to load config ({e}); using defaults");
            AppConfig::default()
        }),
    };

    if let Some(kind) = cli.controller {
        config.controller.kind = match kind {
            ControllerArg::P => ControllerKind::Proportional,
            ControllerArg::Pid => ControllerKind::Pid,
        };
    }
    log::info!("controller: {:?}", config.controller.kind);

    // 3. Collaborators — no hardware backends are compiled into this
    //    build, so every boundary gets its logging stand-in.  The control
    //    core runs exactly as it does on the robot.
    log::warn!("no camera backend available — detector will report no target");
    log::warn!("no microphone available — voice commands are inactive");
    let collaborators = Collaborators {
        servo: Box::new(NullServo::new(config.servo.clone())),
        detector: Arc::new(NullDetector::new(30)),
        speech: Arc::new(NullSpeech::new(1.0)),
        player: Arc::new(LogPlayer),
        response: Arc::new(NullResponse),
    };

    // 4. Runtime: one worker for the timers/orchestration, the rest of
    //    the blocking work (detector, speech) lands on the blocking pool.
    let rt = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .expect("failed to create tokio runtime");

    rt.block_on(async move {
        let orchestrator = Orchestrator::new(config);

        // Ctrl-C → cooperative shutdown; the orchestrator handles the
        // home-and-release sequence.
        let flags = orchestrator.flags();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::info!("interrupt received, requesting shutdown");
                flags.request_shutdown();
            }
        });

        orchestrator.run(collaborators).await
    })
}
