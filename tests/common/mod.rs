//! Shared integration-test harness: a scripted host world that records
//! every side effect the engine asks of it, plus a helper for spawning
//! the `redlight` binary.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::Output;

use redlight::config::StaticConfigSource;
use redlight::config::schema::{Corner, GameConfig, RegionConfig};
use redlight::engine::GameSession;
use redlight::host::{Cue, EntityId, EntitySnapshot, Host, Timestamp};
use redlight::region::{Position, Vec3, WorldId};

/// Tick the first red cue lands on with the default timings.
pub const RED_WARNING_TICK: u64 = 60;

/// Tick detection arms on with the default timings.
pub const RED_ARMED_TICK: u64 = 70;

/// Tick the second cycle starts on with the default timings.
pub const NEXT_GREEN_TICK: u64 = 160;

/// A point well inside [`arena_config`]'s region.
pub const INSIDE: Vec3 = Vec3::new(0.0, 1.0, 0.0);

/// A point outside [`arena_config`]'s region.
pub const OUTSIDE: Vec3 = Vec3::new(50.0, 1.0, 50.0);

/// A side effect recorded by [`RecordingHost`].
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Feedback(EntityId, Cue),
    Notice(EntityId, String),
    Vitality(EntityId, f64),
}

/// Host world driven by a per-tick movement script.
///
/// `on_tick(t)` applies every move scripted for tick `t` and advances the
/// clock to `t * 50` ms. Every effect is stored with the tick it happened on;
/// effects from calls made between ticks land on the upcoming tick.
pub struct RecordingHost {
    pub world: WorldId,
    pub default_world: Option<WorldId>,
    pub entities: Vec<EntitySnapshot>,
    pub effects: Vec<(u64, Effect)>,
    script: BTreeMap<u64, Vec<(EntityId, Vec3)>>,
    tick: u64,
}

impl RecordingHost {
    pub fn new() -> Self {
        let world = WorldId::new("arena");
        Self {
            default_world: Some(world.clone()),
            world,
            entities: Vec::new(),
            effects: Vec::new(),
            script: BTreeMap::new(),
            tick: 0,
        }
    }

    /// Moves the clock to `tick` without applying any scripted moves.
    pub fn sync_clock(&mut self, tick: u64) {
        self.tick = tick;
    }

    /// Host that cannot offer any world.
    pub fn without_default_world() -> Self {
        Self {
            default_world: None,
            ..Self::new()
        }
    }

    pub fn spawn(&mut self, id: u128, point: Vec3) -> EntityId {
        let id = EntityId::from_u128(id);
        self.entities.push(EntitySnapshot {
            id,
            position: Position::new(self.world.clone(), point),
            incapacitated: false,
        });
        id
    }

    /// Moves `id` to `point` at the start of `tick`.
    pub fn move_at(&mut self, tick: u64, id: EntityId, point: Vec3) {
        self.script.entry(tick).or_default().push((id, point));
    }

    /// Shifts `id` along x at the start of `tick`, relative to wherever the
    /// script has it by then.
    pub fn nudge_at(&mut self, tick: u64, id: EntityId, dx: f64) {
        let base = self.scripted_position(tick, id);
        self.move_at(tick, id, Vec3::new(base.x + dx, base.y, base.z));
    }

    pub fn despawn(&mut self, id: EntityId) {
        self.entities.retain(|e| e.id != id);
    }

    pub fn feedback(&self, cue: Cue) -> Vec<(u64, EntityId)> {
        self.effects
            .iter()
            .filter_map(|(tick, effect)| match effect {
                Effect::Feedback(id, c) if *c == cue => Some((*tick, *id)),
                _ => None,
            })
            .collect()
    }

    pub fn notices(&self) -> Vec<(u64, EntityId, String)> {
        self.effects
            .iter()
            .filter_map(|(tick, effect)| match effect {
                Effect::Notice(id, text) => Some((*tick, *id, text.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn vitality(&self) -> Vec<(u64, EntityId, f64)> {
        self.effects
            .iter()
            .filter_map(|(tick, effect)| match effect {
                Effect::Vitality(id, value) => Some((*tick, *id, *value)),
                _ => None,
            })
            .collect()
    }

    fn scripted_position(&self, tick: u64, id: EntityId) -> Vec3 {
        self.script
            .range(..=tick)
            .flat_map(|(_, moves)| moves.iter())
            .filter(|(moved, _)| *moved == id)
            .map(|(_, point)| *point)
            .last()
            .or_else(|| {
                self.entities
                    .iter()
                    .find(|e| e.id == id)
                    .map(|e| e.position.point)
            })
            .unwrap_or(Vec3::ORIGIN)
    }
}

impl Host for RecordingHost {
    fn default_world(&self) -> Option<WorldId> {
        self.default_world.clone()
    }

    fn resolve_world(&self, name: &str) -> Option<WorldId> {
        (name == self.world.as_str()).then(|| self.world.clone())
    }

    fn list_observable_entities(&self, world: &WorldId) -> Vec<EntitySnapshot> {
        self.entities
            .iter()
            .filter(|e| &e.position.world == world)
            .cloned()
            .collect()
    }

    fn entity(&self, id: EntityId) -> Option<EntitySnapshot> {
        self.entities.iter().find(|e| e.id == id).cloned()
    }

    fn send_feedback(&mut self, id: EntityId, cue: Cue) {
        self.effects.push((self.tick, Effect::Feedback(id, cue)));
    }

    fn send_notice(&mut self, id: EntityId, text: &str) {
        self.effects
            .push((self.tick, Effect::Notice(id, text.to_string())));
    }

    fn set_vitality(&mut self, id: EntityId, value: f64) {
        self.effects.push((self.tick, Effect::Vitality(id, value)));
        if value <= 0.0
            && let Some(entity) = self.entities.iter_mut().find(|e| e.id == id)
        {
            entity.incapacitated = true;
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.tick * 50)
    }

    fn on_tick(&mut self, tick: u64) {
        self.tick = tick;
        if let Some(moves) = self.script.remove(&tick) {
            for (id, point) in moves {
                if let Some(entity) = self.entities.iter_mut().find(|e| e.id == id) {
                    entity.position.point = point;
                }
            }
        }
    }
}

/// Default timings with a 20 x 10 x 20 region around [`INSIDE`].
pub fn arena_config() -> GameConfig {
    GameConfig {
        world: Some("arena".to_string()),
        region: RegionConfig {
            first: Corner(Vec3::new(-10.0, 0.0, -10.0)),
            second: Corner(Vec3::new(10.0, 10.0, 10.0)),
        },
        ..GameConfig::default()
    }
}

pub fn session_with(host: RecordingHost, config: GameConfig) -> GameSession<RecordingHost> {
    GameSession::new(host, StaticConfigSource::new(config))
}

pub fn arena_session(host: RecordingHost) -> GameSession<RecordingHost> {
    session_with(host, arena_config())
}

/// Runs ticks until the session clock reaches `tick`.
pub fn run_until(session: &mut GameSession<RecordingHost>, tick: u64) {
    let now = session.current_tick();
    assert!(tick >= now, "clock is already at {now}");
    session.run_ticks(tick - now);
    session.host_mut().sync_clock(tick);
}

/// Path to a fixture under `tests/fixtures/`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Runs the `redlight` binary to completion.
pub fn run_redlight(args: &[&str]) -> Output {
    std::process::Command::new(env!("CARGO_BIN_EXE_redlight"))
        .args(args)
        .env_remove("REDLIGHT_CONFIG")
        .env_remove("REDLIGHT_LOG_LEVEL")
        .output()
        .expect("failed to run redlight")
}
