//! Per-entity detection debounce.
//!
//! The gate is a pure predicate over the last detection timestamp kept by
//! the motion sampler. It guarantees at most one counted violation per
//! entity per window regardless of sampling rate, without a timer per
//! entity.

use std::time::Duration;

use crate::host::Timestamp;

/// Default minimum time between two counted violations of one entity.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_millis(1000);

/// Timestamp-comparison debounce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CooldownGate {
    window_ms: u64,
}

impl CooldownGate {
    /// Creates a gate with the given window.
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            window_ms: u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
        }
    }

    /// Window length.
    #[must_use]
    pub const fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// Returns `true` while `now` is inside the window opened by
    /// `last_detection`.
    #[must_use]
    pub const fn is_cooling_down(&self, last_detection: Option<Timestamp>, now: Timestamp) -> bool {
        match last_detection {
            Some(last) => now.millis_since(last) < self.window_ms,
            None => false,
        }
    }
}

impl Default for CooldownGate {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}
