//! Async game driver.
//!
//! [`GameDriver`] owns a [`GameSession`] on one task. A 50 ms interval
//! drives [`GameSession::tick`] and administrative calls arrive over a
//! channel, so every mutation of game state happens on the clock's task
//! and never interleaves with a tick.

use tokio::sync::{mpsc, oneshot};
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::admin::{AdminCommand, Reply};
use crate::engine::scheduler::TICK;
use crate::engine::{GameSession, SessionStatus};
use crate::error::GameError;
use crate::host::{EntityId, Host};
use crate::region::WorldId;

/// Capacity of the command channel.
const COMMAND_BUFFER: usize = 32;

enum Command {
    Start(oneshot::Sender<Result<WorldId, GameError>>),
    Stop(oneshot::Sender<Result<(), GameError>>),
    SetDebug(bool, oneshot::Sender<()>),
    SetTracking(bool, oneshot::Sender<Result<bool, GameError>>),
    ConfirmRemoval {
        entity: EntityId,
        name: String,
        reply: oneshot::Sender<Option<String>>,
    },
    Admin(AdminCommand, oneshot::Sender<Reply>),
    Status(oneshot::Sender<SessionStatus>),
}

/// Cloneable handle for calling into a running [`GameDriver`].
///
/// Every method fails with [`GameError::DriverStopped`] once the driver
/// has exited.
#[derive(Debug, Clone)]
pub struct DriverHandle {
    commands: mpsc::Sender<Command>,
}

impl DriverHandle {
    async fn call<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> Command,
    ) -> Result<T, GameError> {
        let (tx, rx) = oneshot::channel();
        self.commands
            .send(build(tx))
            .await
            .map_err(|_| GameError::DriverStopped)?;
        rx.await.map_err(|_| GameError::DriverStopped)
    }

    /// Starts a game. See [`GameSession::start`].
    ///
    /// # Errors
    ///
    /// Any rejection from the session, or [`GameError::DriverStopped`].
    pub async fn start(&self) -> Result<WorldId, GameError> {
        self.call(Command::Start).await?
    }

    /// Stops the game. See [`GameSession::stop`].
    ///
    /// # Errors
    ///
    /// Any rejection from the session, or [`GameError::DriverStopped`].
    pub async fn stop(&self) -> Result<(), GameError> {
        self.call(Command::Stop).await?
    }

    /// Sets debug mode.
    ///
    /// # Errors
    ///
    /// [`GameError::DriverStopped`] if the driver has exited.
    pub async fn set_debug(&self, enabled: bool) -> Result<(), GameError> {
        self.call(|tx| Command::SetDebug(enabled, tx)).await
    }

    /// Toggles manual tracking. See [`GameSession::set_tracking`].
    ///
    /// # Errors
    ///
    /// Any rejection from the session, or [`GameError::DriverStopped`].
    pub async fn set_tracking(&self, enabled: bool) -> Result<bool, GameError> {
        self.call(|tx| Command::SetTracking(enabled, tx)).await?
    }

    /// Reports a removed entity and returns the attribution text, if any.
    ///
    /// # Errors
    ///
    /// [`GameError::DriverStopped`] if the driver has exited.
    pub async fn confirm_removal(
        &self,
        entity: EntityId,
        name: impl Into<String>,
    ) -> Result<Option<String>, GameError> {
        let name = name.into();
        self.call(|reply| Command::ConfirmRemoval {
            entity,
            name,
            reply,
        })
        .await
    }

    /// Runs a parsed administrative command and returns the reply text.
    ///
    /// # Errors
    ///
    /// [`GameError::DriverStopped`] if the driver has exited.
    pub async fn execute(&self, command: AdminCommand) -> Result<Reply, GameError> {
        self.call(|tx| Command::Admin(command, tx)).await
    }

    /// Current session status.
    ///
    /// # Errors
    ///
    /// [`GameError::DriverStopped`] if the driver has exited.
    pub async fn status(&self) -> Result<SessionStatus, GameError> {
        self.call(Command::Status).await
    }
}

/// Runs a session on a fixed-rate clock until cancelled.
pub struct GameDriver<H: Host> {
    session: GameSession<H>,
    commands: mpsc::Receiver<Command>,
    cancel: CancellationToken,
}

impl<H: Host> GameDriver<H> {
    /// Wraps `session`; the returned handle talks to the driver once
    /// [`run`](Self::run) is polled.
    #[must_use]
    pub fn new(session: GameSession<H>, cancel: CancellationToken) -> (Self, DriverHandle) {
        let (tx, rx) = mpsc::channel(COMMAND_BUFFER);
        (
            Self {
                session,
                commands: rx,
                cancel,
            },
            DriverHandle { commands: tx },
        )
    }

    /// Drives the session until the token is cancelled.
    ///
    /// Stops any running game before returning the session.
    pub async fn run(mut self) -> GameSession<H> {
        let mut interval = tokio::time::interval(TICK);
        interval.set_missed_tick_behavior(MissedTickBehavior::Burst);
        info!(tick_ms = TICK.as_millis(), "game driver started");

        loop {
            tokio::select! {
                biased;
                () = self.cancel.cancelled() => {
                    debug!("game driver cancelled");
                    break;
                }
                Some(command) = self.commands.recv() => self.apply(command),
                _ = interval.tick() => self.session.tick(),
            }
        }

        self.session.shutdown();
        info!(ticks = self.session.current_tick(), "game driver stopped");
        self.session
    }

    fn apply(&mut self, command: Command) {
        // A dropped reply receiver just means the caller stopped waiting.
        match command {
            Command::Start(reply) => {
                let _ = reply.send(self.session.start());
            }
            Command::Stop(reply) => {
                let _ = reply.send(self.session.stop());
            }
            Command::SetDebug(enabled, reply) => {
                self.session.set_debug(enabled);
                let _ = reply.send(());
            }
            Command::SetTracking(enabled, reply) => {
                let _ = reply.send(self.session.set_tracking(enabled));
            }
            Command::ConfirmRemoval {
                entity,
                name,
                reply,
            } => {
                let _ = reply.send(self.session.confirm_removal(entity, &name));
            }
            Command::Admin(command, reply) => {
                let _ = reply.send(command.execute(&mut self.session));
            }
            Command::Status(reply) => {
                let _ = reply.send(self.session.status());
            }
        }
    }
}
