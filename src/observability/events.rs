//! Structured game event stream.
//!
//! Discrete, typed events emitted as the game runs, serialized as
//! newline-delimited JSON (JSONL) with a monotonically increasing sequence
//! number for ordering.

use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::engine::phase::GamePhase;
use crate::host::EntityId;

/// A discrete event emitted during a game.
///
/// Tagged with `"type"` when serialized so consumers can dispatch on the
/// event kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum Event {
    /// A game was started.
    GameStarted {
        /// When the game started.
        timestamp: DateTime<Utc>,
        /// World the game runs in.
        world: String,
        /// Green phase length in seconds.
        green_light_seconds: u32,
        /// Red phase length in seconds.
        red_light_seconds: u32,
        /// Whether debug mode was on at start.
        debug: bool,
    },

    /// A game was stopped.
    GameStopped {
        /// When the game stopped.
        timestamp: DateTime<Utc>,
        /// Why it stopped (`"command"`, `"shutdown"`).
        reason: String,
        /// Green phases entered during the run.
        cycles: u64,
    },

    /// A phase was entered.
    PhaseEntered {
        /// When the transition occurred.
        timestamp: DateTime<Utc>,
        /// Phase entered.
        phase: GamePhase,
        /// Clock tick of the transition.
        tick: u64,
        /// Cycle number the phase belongs to.
        cycle: u64,
    },

    /// The sampler classified an entity as moving.
    MovementDetected {
        /// When the sample was taken.
        timestamp: DateTime<Utc>,
        /// Entity that moved.
        entity: EntityId,
        /// Squared horizontal displacement.
        horizontal_sq: f64,
        /// Absolute vertical displacement.
        vertical: f64,
        /// Whether the entity was inside the region.
        in_region: bool,
        /// Whether the entity was still cooling down.
        cooling_down: bool,
        /// Whether this detection counted as a violation.
        violation: bool,
    },

    /// The elimination sequence ran for an entity.
    EntityEliminated {
        /// When the sequence ran.
        timestamp: DateTime<Utc>,
        /// Entity eliminated.
        entity: EntityId,
        /// Debug mode: notice only, no removal.
        debug: bool,
    },

    /// The host confirmed an eliminated entity's removal.
    EliminationConfirmed {
        /// When the removal was confirmed.
        timestamp: DateTime<Utc>,
        /// Entity removed.
        entity: EntityId,
        /// Display name used in the attribution text.
        name: String,
    },
}

/// Wraps an [`Event`] with a sequence number.
#[derive(Debug, Serialize)]
struct EventEnvelope {
    sequence: u64,
    #[serde(flatten)]
    event: Event,
}

/// Thread-safe, buffered JSONL event writer.
///
/// Serialization or I/O failures are dropped; the game never stops because
/// an event could not be written.
pub struct EventEmitter {
    writer: Mutex<BufWriter<Box<dyn Write + Send>>>,
    sequence: AtomicU64,
}

impl std::fmt::Debug for EventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventEmitter")
            .field("sequence", &self.sequence.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl EventEmitter {
    /// Creates an emitter that writes to the given writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(BufWriter::new(writer)),
            sequence: AtomicU64::new(0),
        }
    }

    /// Creates an emitter that writes to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(Box::new(std::io::stdout()))
    }

    /// Creates an emitter that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self::new(Box::new(std::io::stderr()))
    }

    /// Creates an emitter that discards all events.
    #[must_use]
    pub fn noop() -> Self {
        Self::new(Box::new(std::io::sink()))
    }

    /// Creates an emitter that writes to a file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an I/O error if the file cannot be created.
    pub fn from_file(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::new(Box::new(file)))
    }

    /// Emits an event as a single JSONL line.
    pub fn emit(&self, event: Event) {
        let seq = self.sequence.fetch_add(1, Ordering::SeqCst);
        let envelope = EventEnvelope {
            sequence: seq,
            event,
        };

        if let Ok(mut w) = self.writer.lock()
            && let Ok(line) = serde_json::to_string(&envelope)
        {
            let _ = writeln!(w, "{line}");
            let _ = w.flush();
        }
    }

    /// Number of events emitted so far.
    #[must_use]
    pub fn event_count(&self) -> u64 {
        self.sequence.load(Ordering::Relaxed)
    }
}

impl Default for EventEmitter {
    fn default() -> Self {
        Self::noop()
    }
}
