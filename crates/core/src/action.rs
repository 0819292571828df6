//! Actions returned by state machines.

use crate::TimerId;
use std::time::Duration;

/// Something a state machine asks its runner to do.
///
/// State machines never touch the event queue or the clock. They return
/// actions, and the runner applies them in order at the current virtual time.
#[derive(Debug, Clone, PartialEq)]
pub enum Action<O> {
    // ═══════════════════════════════════════════════════════════════════════
    // Outputs
    // ═══════════════════════════════════════════════════════════════════════
    /// Emit an output event to every subscriber of its channel.
    Emit(O),

    // ═══════════════════════════════════════════════════════════════════════
    // Timers
    // ═══════════════════════════════════════════════════════════════════════
    /// Arm a timer. Replaces any live timer with the same id.
    ///
    /// When it expires, the machine receives its "time elapsed" input
    /// carrying `id`. Periodic timers re-arm every `duration` until unset.
    SetTimer {
        id: TimerId,
        duration: Duration,
        periodic: bool,
    },

    /// Disarm a timer. Disarming a timer that is not live is a no-op.
    UnsetTimer { id: TimerId },
}

impl<O> Action<O> {
    /// Arm a one-shot timer.
    pub fn timer(id: TimerId, duration: Duration) -> Self {
        Action::SetTimer {
            id,
            duration,
            periodic: false,
        }
    }

    /// Get a human-readable name for this action type.
    pub fn type_name(&self) -> &'static str {
        match self {
            Action::Emit(_) => "Emit",
            Action::SetTimer { .. } => "SetTimer",
            Action::UnsetTimer { .. } => "UnsetTimer",
        }
    }
}
