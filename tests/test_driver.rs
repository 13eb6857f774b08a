mod common;

use std::time::Duration;

use common::{INSIDE, RecordingHost, arena_session};
use redlight::admin::AdminCommand;
use redlight::config::StaticConfigSource;
use redlight::config::schema::{Corner, GameConfig, RegionConfig};
use redlight::driver::GameDriver;
use redlight::engine::{GamePhase, GameSession};
use redlight::error::GameError;
use redlight::region::{Vec3, WorldId};
use redlight::sim::{SimConfig, SimulatedWorld};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

// Tick 0 may run before or after `start` lands, which shifts every
// boundary by one tick; checks stay clear of both candidates.

#[tokio::test(start_paused = true)]
async fn clock_drives_phases_at_fifty_millis() {
    let mut host = RecordingHost::new();
    host.spawn(1, INSIDE);
    let cancel = CancellationToken::new();
    let (driver, handle) = GameDriver::new(arena_session(host), cancel.clone());
    let task = tokio::spawn(driver.run());

    handle.start().await.unwrap();

    tokio::time::sleep(Duration::from_millis(2_975)).await;
    assert_eq!(handle.status().await.unwrap().phase, GamePhase::Green);

    // red lands at 3000 or 3050 ms
    tokio::time::sleep(Duration::from_millis(125)).await;
    assert_eq!(handle.status().await.unwrap().phase, GamePhase::RedWarning);

    tokio::time::sleep(Duration::from_millis(500)).await;
    let status = handle.status().await.unwrap();
    assert_eq!(status.phase, GamePhase::RedArmed);
    assert!(status.tracking);

    cancel.cancel();
    let session = task.await.unwrap();
    assert!(!session.is_running(), "shutdown stops the game");
}

#[tokio::test(start_paused = true)]
async fn commands_are_serialized_with_ticks() {
    let cancel = CancellationToken::new();
    let (driver, handle) = GameDriver::new(arena_session(RecordingHost::new()), cancel.clone());
    let task = tokio::spawn(driver.run());

    let reply = handle.execute(AdminCommand::Start).await.unwrap();
    assert!(reply.success);
    assert_eq!(
        reply.text,
        "Red Light, Green Light game started in world 'arena'!"
    );
    assert!(matches!(handle.start().await, Err(GameError::AlreadyRunning)));
    assert!(matches!(
        handle.set_tracking(true).await,
        Err(GameError::ControlledByGameLoop)
    ));

    handle.set_debug(true).await.unwrap();
    assert!(handle.status().await.unwrap().debug);

    handle.stop().await.unwrap();
    assert!(matches!(handle.stop().await, Err(GameError::NotRunning)));
    assert_eq!(handle.status().await.unwrap().phase, GamePhase::Idle);

    cancel.cancel();
    task.await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn handle_fails_once_the_driver_exits() {
    let cancel = CancellationToken::new();
    let (driver, handle) = GameDriver::new(arena_session(RecordingHost::new()), cancel.clone());
    let task = tokio::spawn(driver.run());

    cancel.cancel();
    task.await.unwrap();

    assert!(matches!(
        handle.status().await,
        Err(GameError::DriverStopped)
    ));
    assert!(matches!(
        handle.confirm_removal(redlight::host::EntityId::from_u128(1), "Alex").await,
        Err(GameError::DriverStopped)
    ));
}

#[tokio::test(start_paused = true)]
async fn clock_keeps_pace_over_a_minute() {
    let cancel = CancellationToken::new();
    let (driver, handle) = GameDriver::new(arena_session(RecordingHost::new()), cancel.clone());
    let task = tokio::spawn(driver.run());

    tokio::time::sleep(Duration::from_millis(60_025)).await;
    // ticks at 0, 50, ..., 60000
    assert_eq!(handle.status().await.unwrap().tick, 1_201);

    cancel.cancel();
    task.await.unwrap();
}

// ============================================================================
// Simulated world
// ============================================================================

#[tokio::test(start_paused = true)]
async fn simulated_bots_get_caught_and_attributed() {
    let world_id = WorldId::new("arena");
    let config = GameConfig {
        world: Some("arena".to_string()),
        region: RegionConfig {
            first: Corner(Vec3::new(-30.0, 0.0, -30.0)),
            second: Corner(Vec3::new(30.0, 10.0, 30.0)),
        },
        ..GameConfig::default()
    };
    let (deaths_tx, mut deaths_rx) = mpsc::unbounded_channel();
    let world = SimulatedWorld::new(&SimConfig {
        world: world_id.clone(),
        spawn: config.region_in(world_id),
        bots: 16,
        seed: 2024,
        careless_ratio: 1.0,
        disconnect_probability: 0.0,
    })
    .with_death_reports(deaths_tx);

    let session = GameSession::new(world, StaticConfigSource::new(config));
    let cancel = CancellationToken::new();
    let (driver, handle) = GameDriver::new(session, cancel.clone());
    let task = tokio::spawn(driver.run());

    handle.start().await.unwrap();
    // two full cycles, then into the third green
    tokio::time::sleep(Duration::from_secs(17)).await;

    let mut attributions = Vec::new();
    while let Ok(death) = deaths_rx.try_recv() {
        let name = death.name.clone();
        let text = handle.confirm_removal(death.entity, death.name).await.unwrap();
        assert_eq!(text, Some(format!("{name} was eliminated for moving!")));
        attributions.push(name);
    }
    assert!(!attributions.is_empty(), "someone should have been caught");
    assert_eq!(handle.status().await.unwrap().pending_eliminations, 0);

    cancel.cancel();
    let session = task.await.unwrap();
    let summary = session.host().summary();
    assert_eq!(summary.eliminated, attributions.len());
    assert_eq!(summary.alive + summary.eliminated, 16);
}
