//! `simulate` command handler
//!
//! Plays a game against [`SimulatedWorld`] on the async driver. Removals
//! reported by the world are confirmed back into the session so the
//! attribution line is printed, and with `--interactive` stdin lines are
//! run as admin commands.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::admin::{AdminCommand, USAGE};
use crate::cli::args::{OutputFormat, SimulateArgs};
use crate::config::loader::ConfigLoader;
use crate::config::schema::{Corner, GameConfig, RegionConfig};
use crate::config::{FileConfigSource, StaticConfigSource};
use crate::driver::{DriverHandle, GameDriver};
use crate::engine::{GameSession, SessionStatus};
use crate::error::RedlightError;
use crate::observability::events::EventEmitter;
use crate::observability::metrics;
use crate::region::{Vec3, WorldId};
use crate::sim::{DEFAULT_DISCONNECT_PROBABILITY, Death, SimConfig, SimSummary, SimulatedWorld};

/// World name used when the configuration does not name one.
const DEFAULT_WORLD: &str = "arena";

/// Run a game against a simulated world.
///
/// # Errors
///
/// Returns a config error if the configuration cannot be loaded, a game
/// error if the game cannot start, or an I/O error if the events file or
/// metrics endpoint cannot be opened.
pub async fn run(args: &SimulateArgs, cancel: CancellationToken) -> Result<(), RedlightError> {
    if let Some(port) = args.metrics_port {
        crate::observability::init_metrics(Some(port))?;
        tracing::info!(port, "Prometheus metrics endpoint started");
    }

    let config = if let Some(ref path) = args.config {
        tracing::info!(config = %path.display(), "loading configuration");
        let load_result = ConfigLoader::with_defaults().load(path)?;
        for warning in &load_result.warnings {
            tracing::warn!(
                location = warning.location.as_deref().unwrap_or("<unknown>"),
                "{}",
                warning.message
            );
        }
        GameConfig::clone(&load_result.config)
    } else {
        tracing::info!("no configuration given, playing in the built-in arena");
        arena_config()
    };

    let world_id = WorldId::new(config.world_name().unwrap_or(DEFAULT_WORLD));
    let seed = args.seed.unwrap_or_else(rand::random);
    tracing::info!(seed, bots = args.bots, world = %world_id, "spawning simulated world");

    let (death_tx, death_rx) = mpsc::unbounded_channel();
    let world = SimulatedWorld::new(&SimConfig {
        world: world_id.clone(),
        spawn: config.region_in(world_id),
        bots: args.bots,
        seed,
        careless_ratio: args.careless,
        disconnect_probability: DEFAULT_DISCONNECT_PROBABILITY,
    })
    .with_death_reports(death_tx);

    let events = if let Some(ref path) = args.events_file {
        EventEmitter::from_file(path)?
    } else {
        EventEmitter::noop()
    };

    // The file source re-reads the configuration at every start.
    let mut session = match args.config {
        Some(ref path) => GameSession::new(world, FileConfigSource::new(path.clone())),
        None => GameSession::new(world, StaticConfigSource::new(config.clone())),
    }
    .with_events(Arc::new(events));
    session.set_debug(args.debug || config.debug);

    let driver_cancel = cancel.child_token();
    let (driver, handle) = GameDriver::new(session, driver_cancel.clone());
    let driver_task = tokio::spawn(driver.run());
    let attribution = tokio::spawn(confirm_removals(handle.clone(), death_rx));
    let console = args.interactive.then(|| spawn_console(handle.clone()));

    let outcome = play(args, &handle, &cancel).await;
    let status = handle.status().await;

    driver_cancel.cancel();
    let session = driver_task.await.map_err(std::io::Error::other)?;
    if let Some(console) = console {
        console.abort();
    }
    let summary = session.host().summary();

    // Dropping the world closes the death channel.
    drop(session);
    let _ = attribution.await;

    outcome?;
    print_summary(args.format, &summary, status.ok().as_ref())
}

async fn play(
    args: &SimulateArgs,
    handle: &DriverHandle,
    cancel: &CancellationToken,
) -> Result<(), RedlightError> {
    let world = handle.start().await?;
    tracing::info!(world = %world, "game started");

    let deadline = async {
        if args.seconds == 0 {
            std::future::pending::<()>().await;
        } else {
            tokio::time::sleep(Duration::from_secs(args.seconds)).await;
        }
    };

    tokio::select! {
        () = cancel.cancelled() => tracing::info!("simulation interrupted"),
        () = deadline => tracing::info!(seconds = args.seconds, "simulation finished"),
    }
    Ok(())
}

/// Confirms each reported removal and prints its attribution line.
async fn confirm_removals(handle: DriverHandle, mut deaths: mpsc::UnboundedReceiver<Death>) {
    while let Some(death) = deaths.recv().await {
        match handle.confirm_removal(death.entity, death.name).await {
            Ok(Some(attribution)) => println!("{attribution}"),
            Ok(None) => {}
            Err(_) => break,
        }
    }
}

fn spawn_console(handle: DriverHandle) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line.eq_ignore_ascii_case("status") {
                let Ok(status) = handle.status().await else {
                    break;
                };
                match serde_json::to_string(&status) {
                    Ok(json) => println!("{json}"),
                    Err(err) => tracing::warn!(%err, "failed to render status"),
                }
                continue;
            }
            match AdminCommand::parse(line) {
                Ok(command) => match handle.execute(command).await {
                    Ok(reply) => println!("{reply}"),
                    Err(_) => break,
                },
                Err(err) => {
                    metrics::record_rejected_command("unparsable");
                    println!("{err}\n{USAGE}");
                }
            }
        }
    })
}

fn print_summary(
    format: OutputFormat,
    summary: &SimSummary,
    status: Option<&SessionStatus>,
) -> Result<(), RedlightError> {
    let cycles = status.map_or(0, |s| s.cycles);
    match format {
        OutputFormat::Human => {
            println!(
                "{} bots over {cycles} cycle(s): {} alive, {} eliminated, {} disconnected",
                summary.bots, summary.alive, summary.eliminated, summary.disconnected
            );
            if summary.debug_notices > 0 {
                println!("{} debug notice(s) sent", summary.debug_notices);
            }
        }
        OutputFormat::Json => {
            let report = serde_json::json!({ "summary": summary, "status": status });
            println!("{}", serde_json::to_string(&report)?);
        }
    }
    Ok(())
}

/// 33x33 arena used when no configuration file is given.
fn arena_config() -> GameConfig {
    GameConfig {
        world: Some(DEFAULT_WORLD.to_string()),
        region: RegionConfig {
            first: Corner(Vec3::new(-16.0, 1.0, -16.0)),
            second: Corner(Vec3::new(16.0, 8.0, 16.0)),
        },
        ..GameConfig::default()
    }
}
