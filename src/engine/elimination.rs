//! Elimination protocol.
//!
//! A confirmed violation plays a shot cue, marks the entity as pending
//! elimination, shows a notice, and leaves the actual removal to a deferred
//! step one tick later so the feedback lands first and no vitality changes
//! while the sampler is iterating. Debug mode replaces all of that with a
//! diagnostic notice.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::host::{Cue, EntityId, Host};

/// Notice shown to an eliminated entity.
pub const ELIMINATION_NOTICE: &str = "You have been eliminated";

/// Notice shown instead of eliminating while debug mode is on.
pub const DEBUG_NOTICE: &str = "[DEBUG] You would have been eliminated!";

/// Ticks between the violation and the removal.
pub const REMOVAL_DELAY_TICKS: u64 = 1;

/// What [`EliminationProtocol::execute`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EliminationOutcome {
    /// Entity marked; the caller must schedule the deferred removal
    RemovalPending,
    /// Debug mode: diagnostic notice only
    DebugNotice,
}

/// What the deferred removal step did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// Vitality set to zero
    Removed,
    /// Entity was no longer observable; marker dropped
    Vanished,
    /// Entity was already incapacitated; nothing to do
    AlreadyIncapacitated,
}

/// Side-effecting elimination sequence plus the pending-elimination set.
#[derive(Debug, Default)]
pub struct EliminationProtocol {
    pending: HashSet<EntityId>,
}

impl EliminationProtocol {
    /// Creates a protocol with no pending eliminations.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs the immediate part of the sequence for a confirmed violation.
    pub fn execute<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        id: EntityId,
        debug: bool,
    ) -> EliminationOutcome {
        if debug {
            host.send_notice(id, DEBUG_NOTICE);
            return EliminationOutcome::DebugNotice;
        }
        host.send_feedback(id, Cue::Elimination);
        self.pending.insert(id);
        host.send_notice(id, ELIMINATION_NOTICE);
        info!(entity = %id, "entity eliminated for moving");
        EliminationOutcome::RemovalPending
    }

    /// Deferred removal step.
    ///
    /// Skips entities that vanished or are already incapacitated so an
    /// entity is never removed twice.
    pub fn complete_removal<H: Host + ?Sized>(&mut self, host: &mut H, id: EntityId) -> RemovalOutcome {
        match host.entity(id) {
            None => {
                debug!(entity = %id, "eliminated entity vanished before removal");
                self.pending.remove(&id);
                RemovalOutcome::Vanished
            }
            Some(snapshot) if snapshot.incapacitated => RemovalOutcome::AlreadyIncapacitated,
            Some(_) => {
                host.set_vitality(id, 0.0);
                RemovalOutcome::Removed
            }
        }
    }

    /// Consumes the pending marker for a removed entity.
    ///
    /// Returns the attribution text when the removal was ours, `None` when
    /// the entity died for an unrelated reason.
    pub fn confirm_removal(&mut self, id: EntityId, display_name: &str) -> Option<String> {
        self.pending
            .remove(&id)
            .then(|| format!("{display_name} was eliminated for moving!"))
    }

    /// Whether `id` is waiting for removal confirmation.
    #[must_use]
    pub fn is_pending(&self, id: EntityId) -> bool {
        self.pending.contains(&id)
    }

    /// Number of pending eliminations.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}
