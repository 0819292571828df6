//! Real-time runners for the simulation kernel.
//!
//! The kernel in `cranesim-simulation` only knows virtual time. This crate
//! maps virtual time onto the wall clock ([`WallClock`]) and keeps a
//! controller drained up to "now" using one of two strategies:
//!
//! | Strategy                | Owns a thread | Woken by                       |
//! |-------------------------|---------------|--------------------------------|
//! | [`ThreadedRealtime`]    | yes           | condvar deadline or [`Injector`] |
//! | [`EventLoopRealtime`]   | no            | [`HostLoop`] wake-ups            |
//!
//! [`TokioHostLoop`] plugs the second strategy into a tokio `LocalSet`.

mod config;
mod event_loop;
mod threaded;
mod tokio_loop;
mod wall_clock;

pub use config::{parse_time_scale, RealtimeConfig};
pub use event_loop::{EventLoopRealtime, HostCallback, HostLoop};
pub use threaded::{Injector, TerminationCondition, ThreadedRealtime};
pub use tokio_loop::{RemoteInjector, TokioHostLoop};
pub use wall_clock::WallClock;
