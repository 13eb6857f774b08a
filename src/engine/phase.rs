//! Green/red phase state machine.
//!
//! ```text
//! Idle -> [start] -> Green
//! Green --(green ticks)--> RedWarning
//! RedWarning --(arming delay)--> RedArmed
//! RedArmed --(cycle elapsed since Green began)--> Green
//! any --[stop]--> Idle
//! ```
//!
//! Every scheduled transition carries the session generation and the cycle
//! number it was scheduled in. Stopping bumps the generation; entering
//! Green bumps the cycle. An event whose tokens no longer match is stale
//! and discarded, so a transition racing a stop can never resurrect the
//! game, and a late arming event can never arm the next green phase.

use serde::Serialize;
use tracing::debug;

use super::scheduler::{TaskHandle, TickScheduler, seconds_to_ticks};

/// Game phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// No game running
    #[default]
    Idle,
    /// Free movement
    Green,
    /// Red cue shown, detection not armed yet
    RedWarning,
    /// Movement detection armed
    RedArmed,
}

impl GamePhase {
    /// Stable lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Green => "green",
            Self::RedWarning => "red_warning",
            Self::RedArmed => "red_armed",
        }
    }

    /// Whether a game is running in this phase.
    #[must_use]
    pub const fn is_running(self) -> bool {
        !matches!(self, Self::Idle)
    }
}

impl std::fmt::Display for GamePhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Phase durations in ticks, frozen for one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseTimings {
    /// Length of the green phase
    pub green_ticks: u64,
    /// Length of the red phase (warning plus armed)
    pub red_ticks: u64,
    /// Ticks between the red cue and arming
    pub arming_delay_ticks: u64,
}

impl PhaseTimings {
    /// Builds timings from configured seconds and arming delay ticks.
    #[must_use]
    pub const fn from_seconds(green_seconds: u32, red_seconds: u32, arming_delay_ticks: u32) -> Self {
        Self {
            green_ticks: seconds_to_ticks(green_seconds),
            red_ticks: seconds_to_ticks(red_seconds),
            arming_delay_ticks: arming_delay_ticks as u64,
        }
    }

    /// Full cycle length: green plus red.
    #[must_use]
    pub const fn cycle_ticks(&self) -> u64 {
        self.green_ticks + self.red_ticks
    }
}

/// A scheduled phase transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseEvent {
    /// Phase to enter
    pub target: GamePhase,
    /// Session generation at scheduling time
    pub generation: u64,
    /// Cycle number at scheduling time
    pub cycle: u64,
}

/// Owns the phase state and the outstanding transition handles.
#[derive(Debug, Default)]
pub struct PhaseScheduler {
    phase: GamePhase,
    generation: u64,
    cycle: u64,
    timings: Option<PhaseTimings>,
    entered_at: u64,
    handles: Vec<TaskHandle>,
}

impl PhaseScheduler {
    /// Creates an idle scheduler.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    /// Whether a game is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.phase.is_running()
    }

    /// Session generation; bumped on every start and stop.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Cycles entered since the scheduler was created.
    #[must_use]
    pub const fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Timings of the running game.
    #[must_use]
    pub const fn timings(&self) -> Option<PhaseTimings> {
        self.timings
    }

    /// Tick the current phase was entered on.
    #[must_use]
    pub const fn entered_at(&self) -> u64 {
        self.entered_at
    }

    /// Starts a run, entering Green on the current tick.
    ///
    /// Returns `None` if a run is already in progress.
    pub fn start<E: From<PhaseEvent>>(
        &mut self,
        timings: PhaseTimings,
        scheduler: &mut TickScheduler<E>,
    ) -> Option<GamePhase> {
        if self.is_running() {
            return None;
        }
        self.generation += 1;
        self.timings = Some(timings);
        Some(self.enter(GamePhase::Green, scheduler))
    }

    /// Stops the run and cancels every outstanding transition.
    ///
    /// Returns `false` if no run was in progress.
    pub fn stop<E>(&mut self, scheduler: &mut TickScheduler<E>) -> bool {
        if !self.is_running() {
            return false;
        }
        for handle in self.handles.drain(..) {
            scheduler.cancel(handle);
        }
        self.generation += 1;
        self.phase = GamePhase::Idle;
        self.timings = None;
        self.entered_at = scheduler.current_tick();
        true
    }

    /// Applies a due transition.
    ///
    /// Returns the phase entered, or `None` when the event is stale.
    pub fn handle<E: From<PhaseEvent>>(
        &mut self,
        event: PhaseEvent,
        scheduler: &mut TickScheduler<E>,
    ) -> Option<GamePhase> {
        if !self.is_running() || event.generation != self.generation || event.cycle != self.cycle {
            debug!(
                target_phase = %event.target,
                event_generation = event.generation,
                event_cycle = event.cycle,
                "discarding stale phase transition"
            );
            return None;
        }
        Some(self.enter(event.target, scheduler))
    }

    fn enter<E: From<PhaseEvent>>(
        &mut self,
        target: GamePhase,
        scheduler: &mut TickScheduler<E>,
    ) -> GamePhase {
        let Some(timings) = self.timings else {
            return self.phase;
        };
        self.handles.retain(|h| scheduler.is_scheduled(*h));
        if target == GamePhase::Green {
            self.cycle += 1;
        }
        self.phase = target;
        self.entered_at = scheduler.current_tick();

        match target {
            GamePhase::Green => {
                self.schedule(scheduler, timings.green_ticks, GamePhase::RedWarning);
                self.schedule(scheduler, timings.cycle_ticks(), GamePhase::Green);
            }
            GamePhase::RedWarning => {
                self.schedule(scheduler, timings.arming_delay_ticks, GamePhase::RedArmed);
            }
            GamePhase::RedArmed | GamePhase::Idle => {}
        }
        target
    }

    fn schedule<E: From<PhaseEvent>>(
        &mut self,
        scheduler: &mut TickScheduler<E>,
        delay: u64,
        target: GamePhase,
    ) {
        let event = PhaseEvent {
            target,
            generation: self.generation,
            cycle: self.cycle,
        };
        self.handles.push(scheduler.schedule_after(delay, event.into()));
    }
}
