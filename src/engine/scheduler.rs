//! Tick-aligned deferred event queue.
//!
//! All waits in the engine are expressed as events scheduled a number of
//! ticks into the future, never as blocking sleeps. Events due in the
//! current tick are drained in the order they were scheduled, including
//! zero-delay events scheduled while draining.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

/// Length of one world tick.
pub const TICK: Duration = Duration::from_millis(50);

/// Number of ticks in one second.
pub const TICKS_PER_SECOND: u64 = 20;

/// Converts whole seconds into ticks.
#[must_use]
pub const fn seconds_to_ticks(seconds: u32) -> u64 {
    seconds as u64 * TICKS_PER_SECOND
}

/// Handle to a scheduled event, used to cancel it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskHandle(u64);

/// Deferred event queue keyed on tick numbers.
///
/// Cancellation is lazy: cancelled entries stay in the heap until they
/// surface and are then skipped.
pub struct TickScheduler<E> {
    current: u64,
    next_id: u64,
    queue: BinaryHeap<Reverse<(u64, u64)>>,
    pending: HashMap<u64, E>,
}

impl<E> TickScheduler<E> {
    /// Creates an empty scheduler at tick 0.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: 0,
            next_id: 0,
            queue: BinaryHeap::new(),
            pending: HashMap::new(),
        }
    }

    /// The tick currently being processed.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.current
    }

    /// Schedules `event` to fire `delay` ticks from the current tick.
    ///
    /// A delay of zero fires later in the current tick's drain.
    pub fn schedule_after(&mut self, delay: u64, event: E) -> TaskHandle {
        let id = self.next_id;
        self.next_id += 1;
        let due = self.current.saturating_add(delay);
        self.queue.push(Reverse((due, id)));
        self.pending.insert(id, event);
        TaskHandle(id)
    }

    /// Cancels a scheduled event. Returns `false` if it already fired or
    /// was already cancelled.
    pub fn cancel(&mut self, handle: TaskHandle) -> bool {
        self.pending.remove(&handle.0).is_some()
    }

    /// Returns `true` if the event behind `handle` is still pending.
    #[must_use]
    pub fn is_scheduled(&self, handle: TaskHandle) -> bool {
        self.pending.contains_key(&handle.0)
    }

    /// Number of events still pending.
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Pops the next event due at or before the current tick.
    pub fn pop_due(&mut self) -> Option<E> {
        while let Some(&Reverse((due, id))) = self.queue.peek() {
            if due > self.current {
                return None;
            }
            self.queue.pop();
            if let Some(event) = self.pending.remove(&id) {
                return Some(event);
            }
        }
        None
    }

    /// Moves the clock to the next tick.
    pub const fn advance(&mut self) {
        self.current += 1;
    }
}

impl<E> Default for TickScheduler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E> std::fmt::Debug for TickScheduler<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickScheduler")
            .field("current", &self.current)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}
