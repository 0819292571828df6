//! Reference crane controller for the simulator.
//!
//! - [`CraneController`]: the state machine
//! - [`stand_ins`]: scripted scheduler and fake crane hardware for headless runs
//! - [`scenarios`]: golden input/output traces and how to compare them
//!
//! [`setup`] builds a recording controller, the starting point of every run.

mod events;
pub mod scenarios;
pub mod stand_ins;
mod statechart;

pub use events::{CraneInput, CraneOutput};
pub use statechart::{
    CraneController, Mode, Phase, GRIP_TIMER, INITIAL_COLUMN, LOWER_SETTLE_TIMER,
    RAISE_SETTLE_TIMER, RESUME_DELAY, RESUME_TIMER, SAFE_HEIGHT, SETTLE_DELAY,
    TRAVERSE_SETTLE_TIMER,
};

use cranesim_simulation::Controller;

/// A fresh crane controller that records its trace. Not entered yet.
pub fn setup() -> Controller<CraneController> {
    Controller::new(CraneController::new()).with_recorder()
}
