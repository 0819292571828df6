//! Timer service for state machines.
//!
//! Translates `SetTimer`/`UnsetTimer` actions into queue entries. Each timer
//! id owns at most one live entry; re-arming an id cancels its old entry.

use crate::event_queue::{EventKey, EventQueue};
use cranesim_core::TimerId;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, warn};

/// What the controller's queue holds.
#[derive(Debug, Clone, PartialEq)]
pub enum QueuedAction<I> {
    /// Raise an external input.
    Input(I),
    /// A timer expired; raise "time elapsed" for `id`.
    Timer {
        id: TimerId,
        /// Re-arm interval for periodic timers.
        period: Option<Duration>,
    },
}

/// One live queue entry per timer id.
#[derive(Debug, Default)]
pub struct TimerService {
    slots: HashMap<TimerId, EventKey>,
}

impl TimerService {
    /// Create a timer service with no live timers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `id` to expire `duration` after the current simulated time.
    ///
    /// Any live timer with the same id is canceled first.
    pub fn set_timer<I>(
        &mut self,
        queue: &mut EventQueue<QueuedAction<I>>,
        id: TimerId,
        duration: Duration,
        periodic: bool,
    ) {
        self.unset_timer(queue, id);

        let period = if periodic && duration.is_zero() {
            warn!(timer = %id, "Zero-length periodic timer armed as one-shot");
            None
        } else {
            periodic.then_some(duration)
        };

        let due = queue.now() + duration;
        debug!(timer = %id, due = %due, periodic = period.is_some(), "Timer set");
        let key = queue.schedule(due, QueuedAction::Timer { id, period }, id.to_string());
        self.slots.insert(id, key);
    }

    /// Disarm `id`. Does nothing if it is not live.
    pub fn unset_timer<I>(&mut self, queue: &mut EventQueue<QueuedAction<I>>, id: TimerId) {
        if let Some(key) = self.slots.remove(&id) {
            if queue.cancel(key) {
                debug!(timer = %id, "Timer unset");
            }
        }
    }

    /// Bookkeeping for a timer entry that was just popped.
    ///
    /// One-shot timers free their slot. Periodic timers re-arm one period
    /// after the time they were due, so they do not drift.
    pub fn on_fired<I>(
        &mut self,
        queue: &mut EventQueue<QueuedAction<I>>,
        id: TimerId,
        period: Option<Duration>,
    ) {
        match period {
            Some(period) => {
                let due = queue.now() + period;
                let action = QueuedAction::Timer {
                    id,
                    period: Some(period),
                };
                let key = queue.schedule(due, action, id.to_string());
                self.slots.insert(id, key);
            }
            None => {
                self.slots.remove(&id);
            }
        }
    }

    /// Check if `id` has a live timer.
    pub fn is_armed(&self, id: TimerId) -> bool {
        self.slots.contains_key(&id)
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if no timer is live.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
