//! Stand-in peers for headless runs.
//!
//! These answer the controller's outputs the way the real move scheduler and
//! crane hardware would, closely enough to drive a run end to end:
//!
//! - the scheduler answers `ready` with the next scripted move, 100 ms later
//! - the actuator reports `done_moving` after `sqrt(distance) / 10` seconds
//! - the stopper reports `done_moving` 500 ms after `stop_all_movement`

use crate::events::{CraneInput, CraneOutput};
use crate::statechart::{CraneController, SAFE_HEIGHT};
use cranesim_core::{EventError, Payload, SimTime};
use cranesim_simulation::{Controller, Scheduler};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

/// Receives human-readable status lines (terminal, GUI label, ...).
pub type StatusCallback = Box<dyn FnMut(String) + Send>;

/// Moves made by the stand-in scheduler, as `(x, y)`.
pub const MOVES: [(f64, f64); 4] = [
    (0.0, 2.0),    // pickup
    (1000.0, 3.0), // drop
    (0.0, 2.0),    // pickup
    (1000.0, 4.0), // drop
];

/// Delay between `ready` and the scheduler's answer.
///
/// Timer expiries are not recorded, so an answer in the same instant as the
/// expiry that caused `ready` could not be ordered against it on replay.
pub const SCHEDULER_REPLY_DELAY: Duration = Duration::from_millis(100);

/// Time the stand-in stopper takes to halt the crane.
pub const STOP_DURATION: Duration = Duration::from_millis(500);

/// Set once the stand-in scheduler has run out of moves.
#[derive(Debug, Clone, Default)]
pub struct SchedulerDone(Arc<AtomicBool>);

impl SchedulerDone {
    pub fn is_done(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn set(&self) {
        self.0.store(true, Ordering::Release);
    }
}

/// Format a virtual duration as seconds with millisecond precision.
pub fn pretty_duration(duration: Duration) -> String {
    SimTime::from_duration(duration).to_string()
}

/// Time the stand-in actuator takes to travel `distance`.
pub fn travel_time(distance: f64) -> Duration {
    // f64 -> u64 truncates
    Duration::from_nanos((distance.abs().sqrt() / 10.0 * 1e9) as u64)
}

/// Answers `ready` with the next move from [`MOVES`].
///
/// Returns the flag that is set once every move has been handed out.
pub fn setup_stand_in_scheduler(
    controller: &mut Controller<CraneController>,
    mut status: StatusCallback,
) -> Result<SchedulerDone, EventError> {
    let done = SchedulerDone::default();
    let flag = done.clone();
    let mut next_move = 0;

    controller.subscribe(
        CraneOutput::READY,
        Box::new(move |scheduler, _| match MOVES.get(next_move) {
            Some(&(x, y)) => {
                for input in [
                    CraneInput::SetTargetX(x),
                    CraneInput::SetTargetY(y),
                    CraneInput::MakeMove,
                ] {
                    scheduler.add_input_relative(SCHEDULER_REPLY_DELAY, input);
                }
                status(format!("making move {next_move}"));
                next_move += 1;
            }
            None => {
                status("done (made all hardcoded moves)".to_string());
                flag.set();
            }
        }),
    )?;
    Ok(done)
}

/// Direction of a stand-in actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Horizontal => f.write_str("horizontally"),
            Axis::Vertical => f.write_str("vertically"),
        }
    }
}

/// Tracks one axis of the crane and reports when a move completes.
struct Actuator {
    axis: Axis,
    position: f64,
}

impl Actuator {
    fn on_request(
        &mut self,
        scheduler: &mut Scheduler<'_, CraneInput>,
        target: Payload,
        status: &mut dyn FnMut(String),
    ) {
        let Some(target) = target else {
            warn!(axis = %self.axis, "Move request without a target, ignored");
            return;
        };
        let duration = travel_time(self.position - target);
        status(format!(
            "moving {} from {} to {} which will take {}",
            self.axis,
            self.position,
            target,
            pretty_duration(duration)
        ));
        scheduler.add_input_relative(duration, CraneInput::DoneMoving);
        self.position = target;
    }
}

/// Answers `move`, `hoist` and `stop_all_movement` with `done_moving`.
///
/// The horizontal axis starts at column 0, the vertical one at the safe
/// height.
pub fn setup_stand_in_crane(
    controller: &mut Controller<CraneController>,
    status: impl FnMut(String) + Clone + Send + 'static,
) -> Result<(), EventError> {
    let axes = [
        (CraneOutput::MOVE, Axis::Horizontal, 0.0),
        (CraneOutput::HOIST, Axis::Vertical, SAFE_HEIGHT),
    ];
    for (channel, axis, position) in axes {
        let mut actuator = Actuator { axis, position };
        let mut status = status.clone();
        controller.subscribe(
            channel,
            Box::new(move |scheduler, payload| {
                actuator.on_request(scheduler, payload, &mut status)
            }),
        )?;
    }

    let mut status = status;
    controller.subscribe(
        CraneOutput::STOP_ALL_MOVEMENT,
        Box::new(move |scheduler, _| {
            status("stopping all movement...".to_string());
            scheduler.add_input_relative(STOP_DURATION, CraneInput::DoneMoving);
        }),
    )
}
