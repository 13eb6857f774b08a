//! Rule engine: phase scheduling, motion sampling and elimination.

pub mod cooldown;
pub mod elimination;
pub mod phase;
pub mod sampler;
pub mod scheduler;
pub mod session;

pub use cooldown::CooldownGate;
pub use elimination::{EliminationOutcome, EliminationProtocol, RemovalOutcome};
pub use phase::{GamePhase, PhaseTimings};
pub use sampler::{Detection, MotionSampler, MovementThresholds, SamplingTarget};
pub use scheduler::{TICK, TICKS_PER_SECOND, TickScheduler};
pub use session::{GameSession, GameSettings, SessionStatus};
