//! Host world collaborator interface.
//!
//! The host owns entities, positions, messaging, sound and vitality. The
//! rule engine consumes it only through [`Host`]; every side-effecting call
//! is fire-and-forget and no return value is consulted.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::region::{Position, WorldId};

/// Stable entity identifier assigned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub Uuid);

impl EntityId {
    /// Creates a random identifier.
    #[must_use]
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a deterministic identifier, convenient for hosts with
    /// numeric ids.
    #[must_use]
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wall-clock timestamp in milliseconds.
///
/// The epoch is whatever the host chooses; only differences matter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Timestamp(pub u64);

impl Timestamp {
    /// Creates a timestamp from milliseconds.
    #[must_use]
    pub const fn from_millis(millis: u64) -> Self {
        Self(millis)
    }

    /// Milliseconds value.
    #[must_use]
    pub const fn as_millis(self) -> u64 {
        self.0
    }

    /// Milliseconds elapsed since `earlier`, saturating at zero if the
    /// clock went backwards.
    #[must_use]
    pub const fn millis_since(self, earlier: Self) -> u64 {
        self.0.saturating_sub(earlier.0)
    }
}

/// Audio/visual cue kinds the engine asks the host to play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cue {
    /// "Green Light!" title and sound
    GreenLight,
    /// "Red Light!" title and sound
    RedLight,
    /// Shot sound played to an eliminated entity
    Elimination,
}

impl Cue {
    /// Title text shown with the cue, if any.
    #[must_use]
    pub const fn title(self) -> Option<&'static str> {
        match self {
            Self::GreenLight => Some("Green Light!"),
            Self::RedLight => Some("Red Light!"),
            Self::Elimination => None,
        }
    }
}

/// What the host reports about one observable entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySnapshot {
    /// Entity identifier
    pub id: EntityId,
    /// Current position
    pub position: Position,
    /// Whether the entity is already dead or otherwise incapacitated
    pub incapacitated: bool,
}

/// Collaborator contract the rule engine needs from the host world.
///
/// Entities may disappear between any two calls; the engine tolerates
/// `None` from [`entity`](Host::entity) silently.
pub trait Host {
    /// World used when the configuration names none, or names one the host
    /// cannot resolve.
    fn default_world(&self) -> Option<WorldId>;

    /// Resolves a configured world name.
    fn resolve_world(&self, name: &str) -> Option<WorldId>;

    /// All entities currently observable in `world`.
    fn list_observable_entities(&self, world: &WorldId) -> Vec<EntitySnapshot>;

    /// Fresh state of a single entity, or `None` if it vanished.
    fn entity(&self, id: EntityId) -> Option<EntitySnapshot>;

    /// Plays a cue to one entity. Best effort.
    fn send_feedback(&mut self, id: EntityId, cue: Cue);

    /// Shows a text notice to one entity. Best effort.
    fn send_notice(&mut self, id: EntityId, text: &str);

    /// Sets an entity's vitality; zero incapacitates it.
    fn set_vitality(&mut self, id: EntityId, value: f64);

    /// Current wall-clock time.
    fn now(&self) -> Timestamp;

    /// Called at the start of every world tick, before any rule runs.
    fn on_tick(&mut self, _tick: u64) {}
}
