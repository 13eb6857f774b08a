//! In-memory simulated host.
//!
//! A seeded population of bots that wander while the light is green and
//! freeze a per-bot reaction time after they see the red cue. Slow and
//! careless bots get caught; eliminated bots are reported on a channel so
//! the caller can confirm the removal back into the session.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::engine::elimination::DEBUG_NOTICE;
use crate::engine::scheduler::TICK;
use crate::host::{Cue, EntityId, EntitySnapshot, Host, Timestamp};
use crate::region::{Position, Region, Vec3, WorldId};

/// Longest reaction time a bot can draw, in ticks.
const MAX_REACTION_TICKS: u32 = 16;

/// Per-tick probability that a careless bot twitches during red.
const TWITCH_PROBABILITY: f64 = 0.02;

/// Default per-tick probability that a bot disconnects.
pub const DEFAULT_DISCONNECT_PROBABILITY: f64 = 0.0002;

/// A bot removed by the game, reported for attribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Death {
    /// Removed entity
    pub entity: EntityId,
    /// Display name
    pub name: String,
}

/// Simulation parameters.
#[derive(Debug, Clone)]
pub struct SimConfig {
    /// World the bots live in
    pub world: WorldId,
    /// Volume bots spawn in
    pub spawn: Region,
    /// Number of bots
    pub bots: usize,
    /// RNG seed
    pub seed: u64,
    /// Fraction of bots that sometimes move during red
    pub careless_ratio: f64,
    /// Per-tick probability that a bot disconnects
    pub disconnect_probability: f64,
}

#[derive(Debug, Clone)]
struct Bot {
    id: EntityId,
    name: String,
    position: Vec3,
    alive: bool,
    online: bool,
    careless: bool,
    reaction_ticks: u32,
    countdown: u32,
    light: Option<Cue>,
    heading: (f64, f64),
}

impl Bot {
    fn is_walking(&self) -> bool {
        match self.light {
            Some(Cue::GreenLight) => true,
            Some(Cue::RedLight) => self.countdown > 0,
            _ => false,
        }
    }
}

/// Counters describing what happened in a simulation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SimSummary {
    /// Bots spawned
    pub bots: usize,
    /// Bots still alive and online
    pub alive: usize,
    /// Bots whose vitality was set to zero
    pub eliminated: usize,
    /// Bots that disconnected
    pub disconnected: usize,
    /// Debug notices delivered
    pub debug_notices: usize,
}

/// Simulated host world.
#[derive(Debug)]
pub struct SimulatedWorld {
    world: WorldId,
    rng: StdRng,
    bots: Vec<Bot>,
    clock_ms: u64,
    deaths: Option<mpsc::UnboundedSender<Death>>,
    disconnect_probability: f64,
    summary: SimSummary,
}

impl SimulatedWorld {
    /// Spawns `config.bots` bots at random points of the spawn volume.
    #[must_use]
    pub fn new(config: &SimConfig) -> Self {
        let mut rng = StdRng::seed_from_u64(config.seed);
        let (min, max) = (config.spawn.min(), config.spawn.max());
        let careless_ratio = config.careless_ratio.clamp(0.0, 1.0);

        let bots = (0..config.bots)
            .map(|i| {
                let position = Vec3::new(
                    sample_axis(&mut rng, min.x, max.x),
                    min.y,
                    sample_axis(&mut rng, min.z, max.z),
                );
                let angle = rng.random_range(0.0..std::f64::consts::TAU);
                Bot {
                    id: EntityId::from_u128(rng.random()),
                    name: format!("bot-{i:02}"),
                    position,
                    alive: true,
                    online: true,
                    careless: rng.random_bool(careless_ratio),
                    reaction_ticks: rng.random_range(2..=MAX_REACTION_TICKS),
                    countdown: 0,
                    light: None,
                    heading: (angle.cos(), angle.sin()),
                }
            })
            .collect();

        Self {
            world: config.world.clone(),
            rng,
            bots,
            clock_ms: 0,
            deaths: None,
            disconnect_probability: config.disconnect_probability.clamp(0.0, 1.0),
            summary: SimSummary {
                bots: config.bots,
                ..SimSummary::default()
            },
        }
    }

    /// Reports every removal on `sender`.
    #[must_use]
    pub fn with_death_reports(mut self, sender: mpsc::UnboundedSender<Death>) -> Self {
        self.deaths = Some(sender);
        self
    }

    /// Bot ids in spawn order.
    #[must_use]
    pub fn bot_ids(&self) -> Vec<EntityId> {
        self.bots.iter().map(|b| b.id).collect()
    }

    /// Display name of a bot.
    #[must_use]
    pub fn name_of(&self, id: EntityId) -> Option<&str> {
        self.bot(id).map(|b| b.name.as_str())
    }

    /// Takes a bot offline.
    pub fn disconnect(&mut self, id: EntityId) {
        if let Some(bot) = self.bot_mut(id)
            && bot.online
        {
            bot.online = false;
            self.summary.disconnected += 1;
        }
    }

    /// What happened so far.
    #[must_use]
    pub fn summary(&self) -> SimSummary {
        SimSummary {
            alive: self.bots.iter().filter(|b| b.alive && b.online).count(),
            ..self.summary
        }
    }

    fn bot(&self, id: EntityId) -> Option<&Bot> {
        self.bots.iter().find(|b| b.id == id)
    }

    fn bot_mut(&mut self, id: EntityId) -> Option<&mut Bot> {
        self.bots.iter_mut().find(|b| b.id == id)
    }

    fn snapshot(&self, bot: &Bot) -> EntitySnapshot {
        EntitySnapshot {
            id: bot.id,
            position: Position::new(self.world.clone(), bot.position),
            incapacitated: !bot.alive,
        }
    }
}

fn sample_axis(rng: &mut StdRng, min: f64, max: f64) -> f64 {
    if max > min {
        rng.random_range(min..=max)
    } else {
        min
    }
}

impl Host for SimulatedWorld {
    fn default_world(&self) -> Option<WorldId> {
        Some(self.world.clone())
    }

    fn resolve_world(&self, name: &str) -> Option<WorldId> {
        (self.world.as_str() == name).then(|| self.world.clone())
    }

    fn list_observable_entities(&self, world: &WorldId) -> Vec<EntitySnapshot> {
        if *world != self.world {
            return Vec::new();
        }
        self.bots
            .iter()
            .filter(|b| b.online)
            .map(|b| self.snapshot(b))
            .collect()
    }

    fn entity(&self, id: EntityId) -> Option<EntitySnapshot> {
        self.bot(id).filter(|b| b.online).map(|b| self.snapshot(b))
    }

    fn send_feedback(&mut self, id: EntityId, cue: Cue) {
        let Some(bot) = self.bot_mut(id) else {
            return;
        };
        match cue {
            Cue::GreenLight => bot.light = Some(cue),
            Cue::RedLight => {
                bot.light = Some(cue);
                bot.countdown = bot.reaction_ticks;
            }
            Cue::Elimination => trace!(bot = %bot.name, "shot"),
        }
    }

    fn send_notice(&mut self, id: EntityId, text: &str) {
        if text == DEBUG_NOTICE {
            self.summary.debug_notices += 1;
        }
        if let Some(bot) = self.bot(id) {
            debug!(bot = %bot.name, notice = text, "notice delivered");
        }
    }

    fn set_vitality(&mut self, id: EntityId, value: f64) {
        let Some(bot) = self.bot_mut(id) else {
            return;
        };
        if value > 0.0 || !bot.alive {
            return;
        }
        bot.alive = false;
        let death = Death {
            entity: bot.id,
            name: bot.name.clone(),
        };
        self.summary.eliminated += 1;
        if let Some(tx) = &self.deaths {
            let _ = tx.send(death);
        }
    }

    fn now(&self) -> Timestamp {
        Timestamp::from_millis(self.clock_ms)
    }

    fn on_tick(&mut self, tick: u64) {
        self.clock_ms = tick * u64::try_from(TICK.as_millis()).unwrap_or(50);

        for i in 0..self.bots.len() {
            if !self.bots[i].alive || !self.bots[i].online {
                continue;
            }
            if self.rng.random_bool(self.disconnect_probability) {
                self.bots[i].online = false;
                self.summary.disconnected += 1;
                continue;
            }

            let twitch = self.bots[i].careless
                && self.bots[i].light == Some(Cue::RedLight)
                && self.rng.random_bool(TWITCH_PROBABILITY);
            let turn = self.rng.random_range(-0.3..0.3);
            let stride = self.rng.random_range(0.05..0.25);

            let bot = &mut self.bots[i];
            if bot.light == Some(Cue::RedLight) && bot.countdown > 0 {
                bot.countdown -= 1;
            }
            if bot.is_walking() || twitch {
                let (hx, hz) = bot.heading;
                let (sin, cos) = f64::sin_cos(turn);
                bot.heading = (hx.mul_add(cos, -hz * sin), hx.mul_add(sin, hz * cos));
                bot.position.x += bot.heading.0 * stride;
                bot.position.z += bot.heading.1 * stride;
            }
        }
    }
}
