//! The game session: one game per world, driven by one clock.
//!
//! [`GameSession`] owns every piece of game state and is the only thing
//! that mutates it. The administrative entry points ([`start`], [`stop`],
//! [`set_debug`], [`set_tracking`]) and [`tick`] all take `&mut self`, so the
//! caller decides how they are serialized; [`crate::driver`] runs them on a
//! single task.
//!
//! Within one tick the order is fixed:
//! 1. host world update ([`Host::on_tick`])
//! 2. due scheduled events, in schedule order (phase transitions, deferred
//!    removals)
//! 3. one sampling pass, if the sampler is active
//!
//! [`start`]: GameSession::start
//! [`stop`]: GameSession::stop
//! [`set_debug`]: GameSession::set_debug
//! [`set_tracking`]: GameSession::set_tracking
//! [`tick`]: GameSession::tick

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::{ConfigSource, Validator};
use crate::error::GameError;
use crate::host::{Cue, EntityId, Host};
use crate::observability::events::{Event, EventEmitter};
use crate::observability::metrics;
use crate::region::{Region, WorldId};

use super::elimination::{EliminationOutcome, EliminationProtocol, REMOVAL_DELAY_TICKS};
use super::phase::{GamePhase, PhaseEvent, PhaseScheduler, PhaseTimings};
use super::sampler::{Detection, MotionSampler, SamplingTarget};
use super::scheduler::TickScheduler;

/// Events queued on the session clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Phase transition
    Phase(PhaseEvent),
    /// Deferred removal of an eliminated entity
    Removal {
        /// Entity to remove
        entity: EntityId,
    },
}

impl From<PhaseEvent> for SessionEvent {
    fn from(event: PhaseEvent) -> Self {
        Self::Phase(event)
    }
}

/// Configuration snapshot resolved against the host, frozen for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSettings {
    /// Resolved world
    pub world: WorldId,
    /// Region in that world
    pub region: Region,
    /// Phase timings
    pub timings: PhaseTimings,
    /// Configured seconds, kept for reporting
    pub green_light_seconds: u32,
    /// Configured seconds, kept for reporting
    pub red_light_seconds: u32,
}

/// Point-in-time summary of a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionStatus {
    /// Current phase
    pub phase: GamePhase,
    /// Debug mode
    pub debug: bool,
    /// Whether the motion sampler is active
    pub tracking: bool,
    /// Whether the sampler was started manually
    pub tracking_override: bool,
    /// Clock tick
    pub tick: u64,
    /// Cycles entered in the current run
    pub cycles: u64,
    /// Eliminations awaiting removal confirmation
    pub pending_eliminations: usize,
    /// World of the running game
    #[serde(skip_serializing_if = "Option::is_none")]
    pub world: Option<String>,
}

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StopReason {
    Command,
    Shutdown,
}

impl StopReason {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Command => "command",
            Self::Shutdown => "shutdown",
        }
    }
}

/// One game instance bound to a host world.
pub struct GameSession<H: Host> {
    host: H,
    config: Box<dyn ConfigSource + Send>,
    clock: TickScheduler<SessionEvent>,
    phases: PhaseScheduler,
    sampler: MotionSampler,
    protocol: EliminationProtocol,
    settings: Option<GameSettings>,
    run_start_cycle: u64,
    tracking_override: bool,
    debug: bool,
    events: Arc<EventEmitter>,
}

impl<H: Host> std::fmt::Debug for GameSession<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameSession")
            .field("phase", &self.phases.phase())
            .field("tick", &self.clock.current_tick())
            .field("debug", &self.debug)
            .field("tracking_override", &self.tracking_override)
            .finish_non_exhaustive()
    }
}

impl<H: Host> GameSession<H> {
    /// Creates an idle session.
    pub fn new(host: H, config: impl ConfigSource + Send + 'static) -> Self {
        Self {
            host,
            config: Box::new(config),
            clock: TickScheduler::new(),
            phases: PhaseScheduler::new(),
            sampler: MotionSampler::default(),
            protocol: EliminationProtocol::new(),
            settings: None,
            run_start_cycle: 0,
            tracking_override: false,
            debug: false,
            events: Arc::new(EventEmitter::noop()),
        }
    }

    /// Routes structured events to `events`.
    #[must_use]
    pub fn with_events(mut self, events: Arc<EventEmitter>) -> Self {
        self.events = events;
        self
    }

    /// Replaces the motion sampler (custom thresholds or cooldown).
    #[must_use]
    pub fn with_sampler(mut self, sampler: MotionSampler) -> Self {
        self.sampler = sampler;
        self
    }

    // ========================================================================
    // Administrative entry points
    // ========================================================================

    /// Starts a game.
    ///
    /// Configuration is re-read and the region re-validated on every call.
    /// Returns the world the game runs in.
    ///
    /// # Errors
    ///
    /// - [`GameError::AlreadyRunning`] if a game is in progress
    /// - [`GameError::Config`] if the configuration cannot be loaded
    /// - [`GameError::ConfigurationInvalid`] if no world resolves or the
    ///   region is unset or degenerate
    pub fn start(&mut self) -> Result<WorldId, GameError> {
        if self.phases.is_running() {
            return Err(rejected(GameError::AlreadyRunning));
        }
        let settings = self.resolve_settings().map_err(rejected)?;
        if !settings.region.is_set() {
            return Err(rejected(GameError::ConfigurationInvalid {
                reason: format!("the region is not set in world '{}'", settings.world),
            }));
        }

        if self.tracking_override {
            self.tracking_override = false;
            self.sampler.stop();
        }

        let world = settings.world.clone();
        self.run_start_cycle = self.phases.cycle();
        self.settings = Some(settings.clone());
        info!(
            world = %world,
            region = %settings.region,
            green_ticks = settings.timings.green_ticks,
            red_ticks = settings.timings.red_ticks,
            arming_delay_ticks = settings.timings.arming_delay_ticks,
            "game started"
        );
        self.events.emit(Event::GameStarted {
            timestamp: Utc::now(),
            world: world.to_string(),
            green_light_seconds: settings.green_light_seconds,
            red_light_seconds: settings.red_light_seconds,
            debug: self.debug,
        });

        if let Some(phase) = self.phases.start(settings.timings, &mut self.clock) {
            self.on_phase_entered(phase);
        }
        Ok(world)
    }

    /// Stops the running game.
    ///
    /// Outstanding phase transitions are cancelled and the sampler is
    /// stopped. Deferred removals already scheduled still run.
    ///
    /// # Errors
    ///
    /// [`GameError::NotRunning`] if no game is in progress.
    pub fn stop(&mut self) -> Result<(), GameError> {
        if !self.phases.is_running() {
            return Err(rejected(GameError::NotRunning));
        }
        self.end_run(StopReason::Command);
        Ok(())
    }

    /// Turns debug mode on or off; takes effect on the next violation.
    pub fn set_debug(&mut self, enabled: bool) {
        if self.debug != enabled {
            info!(debug = enabled, "debug mode changed");
        }
        self.debug = enabled;
    }

    /// Manually starts or stops movement tracking while no game runs.
    ///
    /// Enabling re-reads the configuration. Returns whether the sampler
    /// changed state.
    ///
    /// # Errors
    ///
    /// - [`GameError::ControlledByGameLoop`] while a game is running
    /// - configuration errors as for [`start`](Self::start) when enabling
    pub fn set_tracking(&mut self, enabled: bool) -> Result<bool, GameError> {
        if self.phases.is_running() {
            return Err(rejected(GameError::ControlledByGameLoop));
        }
        if !enabled {
            self.tracking_override = false;
            return Ok(self.sampler.stop());
        }
        if self.sampler.is_active() {
            return Ok(false);
        }

        let settings = self.resolve_settings().map_err(rejected)?;
        let region = settings.region.is_set().then_some(settings.region);
        if region.is_none() {
            warn!(world = %settings.world, "tracking without a region; no entity will be penalized");
        }
        self.tracking_override = true;
        Ok(self.sampler.start(SamplingTarget {
            world: settings.world,
            region,
        }))
    }

    /// Consumes the pending-elimination marker for a removed entity.
    ///
    /// The host calls this when an entity dies. Returns the attribution
    /// text if this session eliminated it.
    pub fn confirm_removal(&mut self, entity: EntityId, display_name: &str) -> Option<String> {
        let attribution = self.protocol.confirm_removal(entity, display_name)?;
        info!(entity = %entity, name = display_name, "elimination confirmed");
        self.events.emit(Event::EliminationConfirmed {
            timestamp: Utc::now(),
            entity,
            name: display_name.to_string(),
        });
        Some(attribution)
    }

    /// Stops any running game and any manual tracking.
    pub fn shutdown(&mut self) {
        if self.phases.is_running() {
            self.end_run(StopReason::Shutdown);
        }
        self.tracking_override = false;
        self.sampler.stop();
    }

    // ========================================================================
    // Clock
    // ========================================================================

    /// Advances the session by one tick.
    pub fn tick(&mut self) {
        let tick = self.clock.current_tick();
        self.host.on_tick(tick);

        while let Some(event) = self.clock.pop_due() {
            match event {
                SessionEvent::Phase(event) => {
                    if let Some(phase) = self.phases.handle(event, &mut self.clock) {
                        self.on_phase_entered(phase);
                    }
                }
                SessionEvent::Removal { entity } => {
                    let outcome = self.protocol.complete_removal(&mut self.host, entity);
                    debug!(entity = %entity, ?outcome, "deferred removal");
                }
            }
        }

        if self.sampler.is_active() {
            self.sample();
        }

        self.clock.advance();
    }

    /// Runs `ticks` ticks back to back.
    pub fn run_ticks(&mut self, ticks: u64) {
        for _ in 0..ticks {
            self.tick();
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phases.phase()
    }

    /// Whether a game is running.
    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.phases.is_running()
    }

    /// Debug mode.
    #[must_use]
    pub const fn is_debug(&self) -> bool {
        self.debug
    }

    /// Whether the motion sampler is active.
    #[must_use]
    pub const fn is_tracking(&self) -> bool {
        self.sampler.is_active()
    }

    /// Tick the next call to [`tick`](Self::tick) will run.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.clock.current_tick()
    }

    /// Settings of the running game.
    #[must_use]
    pub const fn settings(&self) -> Option<&GameSettings> {
        self.settings.as_ref()
    }

    /// The motion sampler.
    #[must_use]
    pub const fn sampler(&self) -> &MotionSampler {
        &self.sampler
    }

    /// Whether `entity` awaits removal confirmation.
    #[must_use]
    pub fn is_pending(&self, entity: EntityId) -> bool {
        self.protocol.is_pending(entity)
    }

    /// The host.
    #[must_use]
    pub const fn host(&self) -> &H {
        &self.host
    }

    /// The host, mutably.
    pub const fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Point-in-time summary.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            phase: self.phases.phase(),
            debug: self.debug,
            tracking: self.sampler.is_active(),
            tracking_override: self.tracking_override,
            tick: self.clock.current_tick(),
            cycles: self.run_cycles(),
            pending_eliminations: self.protocol.pending_count(),
            world: self.settings.as_ref().map(|s| s.world.to_string()),
        }
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn run_cycles(&self) -> u64 {
        if self.phases.is_running() {
            self.phases.cycle() - self.run_start_cycle
        } else {
            0
        }
    }

    fn resolve_settings(&mut self) -> Result<GameSettings, GameError> {
        let config = self.config.load()?;

        let validation = Validator::new().validate(&config);
        if validation.has_errors() {
            let reason = validation
                .errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(GameError::ConfigurationInvalid { reason });
        }

        let world = match config.world_name() {
            Some(name) => self.host.resolve_world(name).or_else(|| {
                warn!(world = name, "world not found, falling back to the default world");
                self.host.default_world()
            }),
            None => self.host.default_world(),
        }
        .ok_or_else(|| GameError::ConfigurationInvalid {
            reason: "no world is available".to_string(),
        })?;

        Ok(GameSettings {
            region: config.region_in(world.clone()),
            world,
            timings: config.timings(),
            green_light_seconds: config.green_light_seconds,
            red_light_seconds: config.red_light_seconds,
        })
    }

    fn end_run(&mut self, reason: StopReason) {
        let cycles = self.run_cycles();
        self.phases.stop(&mut self.clock);
        self.sampler.stop();
        self.settings = None;
        info!(reason = reason.as_str(), cycles, "game stopped");
        metrics::set_current_phase(GamePhase::Idle);
        self.events.emit(Event::GameStopped {
            timestamp: Utc::now(),
            reason: reason.as_str().to_string(),
            cycles,
        });
    }

    fn on_phase_entered(&mut self, phase: GamePhase) {
        let Some(settings) = self.settings.as_ref() else {
            return;
        };
        let world = settings.world.clone();

        match phase {
            GamePhase::Green => {
                self.sampler.stop();
                self.broadcast(&world, Cue::GreenLight);
            }
            GamePhase::RedWarning => self.broadcast(&world, Cue::RedLight),
            GamePhase::RedArmed => {
                let region = Some(settings.region.clone());
                self.sampler.start(SamplingTarget { world, region });
            }
            GamePhase::Idle => {}
        }

        let tick = self.clock.current_tick();
        let cycle = self.run_cycles();
        info!(phase = %phase, tick, cycle, "phase entered");
        metrics::record_phase_transition(phase);
        metrics::set_current_phase(phase);
        self.events.emit(Event::PhaseEntered {
            timestamp: Utc::now(),
            phase,
            tick,
            cycle,
        });
    }

    fn broadcast(&mut self, world: &WorldId, cue: Cue) {
        for snapshot in self.host.list_observable_entities(world) {
            self.host.send_feedback(snapshot.id, cue);
        }
    }

    fn sample(&mut self) {
        let started = Instant::now();
        let now = self.host.now();
        let detections = self.sampler.sample(&self.host, now);

        for detection in detections {
            self.report_detection(&detection);
            if detection.violation {
                self.eliminate(detection.entity);
            }
        }

        metrics::record_sampling_tick(self.sampler.tracked_count(), started.elapsed());
    }

    fn report_detection(&self, detection: &Detection) {
        if self.debug {
            info!(
                entity = %detection.entity,
                horizontal_sq = detection.delta.horizontal_sq,
                vertical = detection.delta.vertical,
                in_region = detection.in_region,
                "entity moved"
            );
        }
        metrics::record_detection(
            detection.in_region,
            detection.cooling_down,
            detection.violation,
        );
        if detection.in_region {
            self.events.emit(Event::MovementDetected {
                timestamp: Utc::now(),
                entity: detection.entity,
                horizontal_sq: detection.delta.horizontal_sq,
                vertical: detection.delta.vertical,
                in_region: detection.in_region,
                cooling_down: detection.cooling_down,
                violation: detection.violation,
            });
        }
    }

    fn eliminate(&mut self, entity: EntityId) {
        let outcome = self.protocol.execute(&mut self.host, entity, self.debug);
        metrics::record_elimination(self.debug);
        self.events.emit(Event::EntityEliminated {
            timestamp: Utc::now(),
            entity,
            debug: self.debug,
        });
        if outcome == EliminationOutcome::RemovalPending {
            self.clock
                .schedule_after(REMOVAL_DELAY_TICKS, SessionEvent::Removal { entity });
        }
    }
}

/// Logs and counts a rejected administrative operation.
fn rejected(error: GameError) -> GameError {
    warn!(kind = error.kind(), "{error}");
    metrics::record_rejected_command(error.kind());
    error
}
