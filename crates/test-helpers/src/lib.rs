//! Test helpers for the crane simulator.
//!
//! Provides [`Metronome`], a small timer-driven state machine used by the
//! kernel and runner tests so they do not depend on the crane controller.
//!
//! | Input              | Behaviour                                        |
//! |--------------------|--------------------------------------------------|
//! | `metronome.start`  | arm the tick timer, emit nothing                 |
//! | `metronome.stop`   | disarm the tick timer, emit `metronome.stopped`  |
//! | `metronome.ping x` | emit `metronome.pong x`                          |
//! | timer expiry       | emit `metronome.tick n` (n counts from 1)        |
//!
//! On entry it emits `metronome.ready`.

use cranesim_core::{
    expect_no_payload, expect_numeric, Action, EventError, InputEvent, OutputEvent, Payload,
    StateMachine, TimerId,
};
use std::time::Duration;

/// Timer used for ticks.
pub const TICK_TIMER: TimerId = TimerId(0);

/// Inputs accepted by [`Metronome`].
#[derive(Debug, Clone, PartialEq)]
pub enum MetronomeInput {
    Start,
    Stop,
    Ping(f64),
    TimeElapsed(TimerId),
}

impl InputEvent for MetronomeInput {
    fn time_elapsed(timer: TimerId) -> Self {
        MetronomeInput::TimeElapsed(timer)
    }

    fn timer_id(&self) -> Option<TimerId> {
        match self {
            MetronomeInput::TimeElapsed(id) => Some(*id),
            _ => None,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            MetronomeInput::Start => "metronome.start",
            MetronomeInput::Stop => "metronome.stop",
            MetronomeInput::Ping(_) => "metronome.ping",
            MetronomeInput::TimeElapsed(_) => "time_elapsed",
        }
    }

    fn payload(&self) -> Payload {
        match self {
            MetronomeInput::Ping(value) => Some(*value),
            MetronomeInput::TimeElapsed(id) => Some(id.0 as f64),
            _ => None,
        }
    }

    fn from_name(name: &str, payload: Payload) -> Result<Self, EventError> {
        match name {
            "metronome.start" => expect_no_payload(name, payload).map(|_| MetronomeInput::Start),
            "metronome.stop" => expect_no_payload(name, payload).map(|_| MetronomeInput::Stop),
            "metronome.ping" => expect_numeric(name, payload).map(MetronomeInput::Ping),
            _ => Err(EventError::UnknownInput(name.to_string())),
        }
    }
}

/// Outputs emitted by [`Metronome`].
#[derive(Debug, Clone, PartialEq)]
pub enum MetronomeOutput {
    Ready,
    Tick(u32),
    Pong(f64),
    Stopped,
}

impl OutputEvent for MetronomeOutput {
    const NAMES: &'static [&'static str] = &[
        "metronome.ready",
        "metronome.tick",
        "metronome.pong",
        "metronome.stopped",
    ];

    fn name(&self) -> &'static str {
        match self {
            MetronomeOutput::Ready => "metronome.ready",
            MetronomeOutput::Tick(_) => "metronome.tick",
            MetronomeOutput::Pong(_) => "metronome.pong",
            MetronomeOutput::Stopped => "metronome.stopped",
        }
    }

    fn payload(&self) -> Payload {
        match self {
            MetronomeOutput::Tick(count) => Some(*count as f64),
            MetronomeOutput::Pong(value) => Some(*value),
            _ => None,
        }
    }
}

/// Emits a tick every `interval` between `start` and `stop`.
#[derive(Debug, Clone)]
pub struct Metronome {
    interval: Duration,
    /// Arm a periodic timer instead of re-arming a one-shot on every tick.
    periodic: bool,
    ticks: u32,
}

impl Metronome {
    /// Metronome re-arming a one-shot timer on every tick.
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            periodic: false,
            ticks: 0,
        }
    }

    /// Metronome using a single periodic timer.
    pub fn periodic(interval: Duration) -> Self {
        Self {
            periodic: true,
            ..Self::new(interval)
        }
    }

    /// Ticks emitted so far.
    pub fn ticks(&self) -> u32 {
        self.ticks
    }

    fn arm(&self) -> Action<MetronomeOutput> {
        Action::SetTimer {
            id: TICK_TIMER,
            duration: self.interval,
            periodic: self.periodic,
        }
    }
}

impl StateMachine for Metronome {
    type Input = MetronomeInput;
    type Output = MetronomeOutput;

    fn enter(&mut self) -> Vec<Action<MetronomeOutput>> {
        vec![Action::Emit(MetronomeOutput::Ready)]
    }

    fn handle(&mut self, input: MetronomeInput) -> Vec<Action<MetronomeOutput>> {
        match input {
            MetronomeInput::Start => vec![self.arm()],
            MetronomeInput::Stop => vec![
                Action::UnsetTimer { id: TICK_TIMER },
                Action::Emit(MetronomeOutput::Stopped),
            ],
            MetronomeInput::Ping(value) => vec![Action::Emit(MetronomeOutput::Pong(value))],
            MetronomeInput::TimeElapsed(TICK_TIMER) => {
                self.ticks += 1;
                let mut actions = vec![Action::Emit(MetronomeOutput::Tick(self.ticks))];
                if !self.periodic {
                    actions.push(self.arm());
                }
                actions
            }
            MetronomeInput::TimeElapsed(_) => vec![],
        }
    }
}
