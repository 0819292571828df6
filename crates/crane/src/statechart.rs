//! Reference crane controller.
//!
//! A gantry crane with an electromagnet carries loads between columns.
//! Every move is a fixed cycle driven by the crane's `done_moving` replies
//! and by settle delays:
//!
//! ```text
//!            make_move                 done_moving          500 ms
//!   Idle ─────────────► Traversing ──────────────► settle ─────────┐
//!    ▲                                                             ▼
//!    │ 500 ms                done_moving                         Lowering
//!   settle ◄──────── Raising ◄──── Gripping ◄──── settle ◄─────────┘
//!                            500 ms         500 ms     done_moving
//! ```
//!
//! Gripping toggles the magnet: a move that starts with the magnet off
//! picks a load up, one that starts with it on drops the load.
//!
//! The emergency button stops everything. Resuming waits two seconds, then
//! re-enters the phase that was active when the stop was pressed. Pressing
//! stop during those two seconds cancels the resume.
//!
//! Horizontal moves lag one move behind the scheduler: `make_move` drives
//! the crane to the column of the previous move, and the target column only
//! becomes the crane's column for the next move. The golden scenarios were
//! recorded against this behaviour.

use crate::events::{CraneInput, CraneOutput};
use cranesim_core::{Action, StateMachine, TimerId};
use std::time::Duration;
use tracing::{debug, trace};

/// Delay between a motion completing and the next step.
pub const SETTLE_DELAY: Duration = Duration::from_millis(500);

/// Delay between pressing resume and the crane moving again.
pub const RESUME_DELAY: Duration = Duration::from_secs(2);

/// Column the crane starts at.
pub const INITIAL_COLUMN: f64 = -1.0;

/// Height the crane raises to between moves.
pub const SAFE_HEIGHT: f64 = 100.0;

pub const TRAVERSE_SETTLE_TIMER: TimerId = TimerId(0);
pub const LOWER_SETTLE_TIMER: TimerId = TimerId(1);
pub const GRIP_TIMER: TimerId = TimerId(2);
pub const RAISE_SETTLE_TIMER: TimerId = TimerId(3);
pub const RESUME_TIMER: TimerId = TimerId(4);

/// Step of the move cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Traversing,
    TraverseSettle,
    Lowering,
    LowerSettle,
    Gripping,
    Raising,
    RaiseSettle,
}

impl Phase {
    /// Timer owned by this phase, armed on entry.
    fn timer(self) -> Option<TimerId> {
        match self {
            Phase::TraverseSettle => Some(TRAVERSE_SETTLE_TIMER),
            Phase::LowerSettle => Some(LOWER_SETTLE_TIMER),
            Phase::Gripping => Some(GRIP_TIMER),
            Phase::RaiseSettle => Some(RAISE_SETTLE_TIMER),
            _ => None,
        }
    }
}

/// Emergency mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Operating,
    Stopped,
    /// Resume pressed, waiting for [`RESUME_DELAY`].
    ResumePending,
}

/// Reference crane controller state machine.
#[derive(Debug, Clone)]
pub struct CraneController {
    mode: Mode,
    /// Active phase while operating, the phase to resume otherwise.
    phase: Phase,
    magnet_on: bool,

    target_x: f64,
    target_y: f64,
    /// Column the crane moves to on the next `make_move`.
    column: f64,
    commanded_x: f64,
    commanded_y: f64,
    picking_up: bool,
}

impl Default for CraneController {
    fn default() -> Self {
        Self::new()
    }
}

impl CraneController {
    pub fn new() -> Self {
        Self {
            mode: Mode::Operating,
            phase: Phase::Idle,
            magnet_on: false,
            target_x: 0.0,
            target_y: 0.0,
            column: INITIAL_COLUMN,
            commanded_x: INITIAL_COLUMN,
            commanded_y: SAFE_HEIGHT,
            picking_up: false,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn magnet_on(&self) -> bool {
        self.magnet_on
    }

    fn magnet_output(&self) -> CraneOutput {
        if self.magnet_on {
            CraneOutput::MagnetOn
        } else {
            CraneOutput::MagnetOff
        }
    }

    /// Switch to `phase` and run its entry actions.
    fn enter_phase(&mut self, phase: Phase, actions: &mut Vec<Action<CraneOutput>>) {
        trace!(from = ?self.phase, to = ?phase, "Phase transition");
        self.phase = phase;
        match phase {
            Phase::Idle => actions.push(Action::Emit(CraneOutput::Ready)),
            Phase::Traversing => actions.push(Action::Emit(CraneOutput::Move(self.commanded_x))),
            Phase::Lowering => actions.push(Action::Emit(CraneOutput::Hoist(self.commanded_y))),
            Phase::Gripping => {
                if self.magnet_on != self.picking_up {
                    self.magnet_on = self.picking_up;
                    actions.push(Action::Emit(self.magnet_output()));
                }
            }
            Phase::Raising => actions.push(Action::Emit(CraneOutput::Hoist(SAFE_HEIGHT))),
            Phase::TraverseSettle | Phase::LowerSettle | Phase::RaiseSettle => {}
        }
        if let Some(timer) = phase.timer() {
            actions.push(Action::timer(timer, SETTLE_DELAY));
        }
    }

    /// Leave the active phase, disarming its timer.
    fn exit_phase(&self, actions: &mut Vec<Action<CraneOutput>>) {
        if let Some(id) = self.phase.timer() {
            actions.push(Action::UnsetTimer { id });
        }
    }

    fn transition(&mut self, to: Phase) -> Vec<Action<CraneOutput>> {
        let mut actions = Vec::new();
        self.exit_phase(&mut actions);
        self.enter_phase(to, &mut actions);
        actions
    }

    fn handle_operating(&mut self, input: CraneInput) -> Vec<Action<CraneOutput>> {
        match (self.phase, input) {
            (Phase::Idle, CraneInput::MakeMove) => {
                self.commanded_x = self.column;
                self.column = self.target_x;
                self.commanded_y = self.target_y;
                self.picking_up = !self.magnet_on;
                debug!(
                    x = self.commanded_x,
                    y = self.commanded_y,
                    picking_up = self.picking_up,
                    "Starting move"
                );
                self.transition(Phase::Traversing)
            }

            (Phase::Traversing, CraneInput::DoneMoving) => self.transition(Phase::TraverseSettle),
            (Phase::Lowering, CraneInput::DoneMoving) => self.transition(Phase::LowerSettle),
            (Phase::Raising, CraneInput::DoneMoving) => self.transition(Phase::RaiseSettle),

            (Phase::TraverseSettle, CraneInput::TimeElapsed(TRAVERSE_SETTLE_TIMER)) => {
                self.transition(Phase::Lowering)
            }
            (Phase::LowerSettle, CraneInput::TimeElapsed(LOWER_SETTLE_TIMER)) => {
                self.transition(Phase::Gripping)
            }
            (Phase::Gripping, CraneInput::TimeElapsed(GRIP_TIMER)) => {
                self.transition(Phase::Raising)
            }
            (Phase::RaiseSettle, CraneInput::TimeElapsed(RAISE_SETTLE_TIMER)) => {
                self.transition(Phase::Idle)
            }

            (_, CraneInput::EmergencyStop) => {
                let mut actions = Vec::new();
                self.exit_phase(&mut actions);
                actions.push(Action::Emit(CraneOutput::StopAllMovement));
                self.mode = Mode::Stopped;
                debug!(phase = ?self.phase, "Emergency stop");
                actions
            }

            (phase, input) => {
                trace!(?phase, ?input, "Input ignored");
                vec![]
            }
        }
    }

    fn handle_stopped(&mut self, input: CraneInput) -> Vec<Action<CraneOutput>> {
        match (self.mode, input) {
            (Mode::Stopped, CraneInput::EmergencyResume) => {
                self.mode = Mode::ResumePending;
                debug!("Resume requested");
                vec![Action::timer(RESUME_TIMER, RESUME_DELAY)]
            }
            (Mode::ResumePending, CraneInput::EmergencyStop) => {
                self.mode = Mode::Stopped;
                debug!("Resume canceled");
                vec![Action::UnsetTimer { id: RESUME_TIMER }]
            }
            (Mode::ResumePending, CraneInput::TimeElapsed(RESUME_TIMER)) => {
                self.mode = Mode::Operating;
                debug!(phase = ?self.phase, "Resuming");
                let mut actions = Vec::new();
                self.enter_phase(self.phase, &mut actions);
                actions.push(Action::Emit(self.magnet_output()));
                actions
            }
            (mode, input) => {
                trace!(?mode, ?input, "Input ignored");
                vec![]
            }
        }
    }
}

impl StateMachine for CraneController {
    type Input = CraneInput;
    type Output = CraneOutput;

    fn enter(&mut self) -> Vec<Action<CraneOutput>> {
        let mut actions = Vec::new();
        self.enter_phase(Phase::Idle, &mut actions);
        actions.push(Action::Emit(self.magnet_output()));
        actions
    }

    fn handle(&mut self, input: CraneInput) -> Vec<Action<CraneOutput>> {
        match input {
            // Targets are latched in every mode
            CraneInput::SetTargetX(x) => {
                self.target_x = x;
                vec![]
            }
            CraneInput::SetTargetY(y) => {
                self.target_y = y;
                vec![]
            }
            input => match self.mode {
                Mode::Operating => self.handle_operating(input),
                Mode::Stopped | Mode::ResumePending => self.handle_stopped(input),
            },
        }
    }
}
