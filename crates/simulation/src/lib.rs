//! Discrete-event simulation kernel.
//!
//! Executes a [`StateMachine`](cranesim_core::StateMachine) against
//! time-stamped events in virtual time. Nothing here reads the wall clock:
//! the real-time runners in `cranesim-realtime` decide how far to drain.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                      Controller                         │
//! │                                                         │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │   EventQueue (BTreeMap<EventKey, ScheduledEntry>)  │ │
//! │  │   Ordered by: time, insertion sequence             │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │ pop_due(limit)              │
//! │                           ▼                             │
//! │  ┌────────────────────────────────────────────────────┐ │
//! │  │   StateMachine::handle(input) -> Vec<Action>       │ │
//! │  └────────────────────────┬───────────────────────────┘ │
//! │                           │                             │
//! │              ┌────────────┼──────────────┐              │
//! │              ▼            ▼              ▼              │
//! │        TimerService  subscribers   TraceRecorder        │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! [`scenario`] replays recorded input traces and compares the outputs.

mod controller;
mod event_queue;
pub mod scenario;
mod timers;
mod trace;

pub use controller::{Controller, InputObserver, OutputCallback, Scheduler};
pub use event_queue::{EventKey, EventQueue};
pub use scenario::{
    replay, run_scenario, run_scenarios, ComparisonRules, Mismatch, Scenario, ScenarioError,
    ScenarioOutcome, ScenarioReport,
};
pub use timers::{QueuedAction, TimerService};
pub use trace::{Trace, TraceRecorder};
