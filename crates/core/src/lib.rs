//! Core types for the crane simulator.
//!
//! This crate defines the vocabulary shared by the simulation kernel, the
//! real-time runners and the state machines they drive:
//!
//! - [`SimTime`]: virtual time in integer nanoseconds since simulation start
//! - [`InputEvent`] / [`OutputEvent`]: closed, compile-time checked event sets
//! - [`Action`]: what a state machine asks its runner to do
//! - [`StateMachine`]: the synchronous, deterministic machine being simulated
//!
//! # Architecture
//!
//! ```text
//! ┌────────────┐  Input   ┌──────────────┐  Vec<Action>  ┌────────────┐
//! │   Runner   │ ───────► │ StateMachine │ ────────────► │   Runner   │
//! │ (queue +   │          │  (no I/O,    │               │ emit/timer │
//! │  timers)   │ ◄─────── │  no clock)   │               │            │
//! └────────────┘ TimeElapsed(TimerId)    └───────────────┴────────────┘
//! ```

mod action;
mod error;
mod event;
mod time;
mod trace;
mod traits;

pub use action::Action;
pub use error::EventError;
pub use event::{expect_no_payload, expect_numeric, InputEvent, OutputEvent, Payload, TimerId};
pub use time::SimTime;
pub use trace::TraceEvent;
pub use traits::StateMachine;
