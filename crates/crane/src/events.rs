//! Crane controller input and output events.

use cranesim_core::{
    expect_no_payload, expect_numeric, EventError, InputEvent, OutputEvent, Payload, TimerId,
};

/// Inputs of the crane controller.
#[derive(Debug, Clone, PartialEq)]
pub enum CraneInput {
    // ═══════════════════════════════════════════════════════════════════════
    // Scheduler
    // ═══════════════════════════════════════════════════════════════════════
    /// Column to move to on the next `make_move`.
    SetTargetX(f64),
    /// Height to lower to on the next `make_move`.
    SetTargetY(f64),
    /// Start the move to the current target.
    MakeMove,

    // ═══════════════════════════════════════════════════════════════════════
    // Crane hardware
    // ═══════════════════════════════════════════════════════════════════════
    /// The last move, hoist or stop request completed.
    DoneMoving,

    // ═══════════════════════════════════════════════════════════════════════
    // Emergency button
    // ═══════════════════════════════════════════════════════════════════════
    EmergencyStop,
    EmergencyResume,

    // ═══════════════════════════════════════════════════════════════════════
    // Timers
    // ═══════════════════════════════════════════════════════════════════════
    TimeElapsed(TimerId),
}

impl InputEvent for CraneInput {
    fn time_elapsed(timer: TimerId) -> Self {
        CraneInput::TimeElapsed(timer)
    }

    fn timer_id(&self) -> Option<TimerId> {
        match self {
            CraneInput::TimeElapsed(id) => Some(*id),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            CraneInput::SetTargetX(_) => "scheduler.set_target_x",
            CraneInput::SetTargetY(_) => "scheduler.set_target_y",
            CraneInput::MakeMove => "scheduler.make_move",
            CraneInput::DoneMoving => "crane_control.done_moving",
            CraneInput::EmergencyStop => "emergency.stop",
            CraneInput::EmergencyResume => "emergency.resume",
            CraneInput::TimeElapsed(_) => "time_elapsed",
        }
    }

    fn payload(&self) -> Payload {
        match self {
            CraneInput::SetTargetX(x) => Some(*x),
            CraneInput::SetTargetY(y) => Some(*y),
            CraneInput::TimeElapsed(id) => Some(f64::from(id.0)),
            _ => None,
        }
    }

    fn from_name(name: &str, payload: Payload) -> Result<Self, EventError> {
        let input = match name {
            "scheduler.set_target_x" => CraneInput::SetTargetX(expect_numeric(name, payload)?),
            "scheduler.set_target_y" => CraneInput::SetTargetY(expect_numeric(name, payload)?),
            "scheduler.make_move" => CraneInput::MakeMove,
            "crane_control.done_moving" => CraneInput::DoneMoving,
            "emergency.stop" => CraneInput::EmergencyStop,
            "emergency.resume" => CraneInput::EmergencyResume,
            _ => return Err(EventError::UnknownInput(name.to_string())),
        };
        if input.payload().is_none() {
            expect_no_payload(name, payload)?;
        }
        Ok(input)
    }
}

/// Outputs of the crane controller.
#[derive(Debug, Clone, PartialEq)]
pub enum CraneOutput {
    /// Ready for the next move.
    Ready,
    /// Move horizontally to a column.
    Move(f64),
    /// Move vertically to a height.
    Hoist(f64),
    MagnetOn,
    MagnetOff,
    StopAllMovement,
}

impl CraneOutput {
    pub const READY: &'static str = "scheduler.ready";
    pub const MOVE: &'static str = "crane_control.move";
    pub const HOIST: &'static str = "crane_control.hoist";
    pub const MAGNET_ON: &'static str = "crane_control.magnet_on";
    pub const MAGNET_OFF: &'static str = "crane_control.magnet_off";
    pub const STOP_ALL_MOVEMENT: &'static str = "crane_control.stop_all_movement";
}

impl OutputEvent for CraneOutput {
    const NAMES: &'static [&'static str] = &[
        Self::READY,
        Self::MOVE,
        Self::HOIST,
        Self::MAGNET_ON,
        Self::MAGNET_OFF,
        Self::STOP_ALL_MOVEMENT,
    ];

    fn name(&self) -> &'static str {
        match self {
            CraneOutput::Ready => Self::READY,
            CraneOutput::Move(_) => Self::MOVE,
            CraneOutput::Hoist(_) => Self::HOIST,
            CraneOutput::MagnetOn => Self::MAGNET_ON,
            CraneOutput::MagnetOff => Self::MAGNET_OFF,
            CraneOutput::StopAllMovement => Self::STOP_ALL_MOVEMENT,
        }
    }

    fn payload(&self) -> Payload {
        match self {
            CraneOutput::Move(x) => Some(*x),
            CraneOutput::Hoist(y) => Some(*y),
            _ => None,
        }
    }
}
