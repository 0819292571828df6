//! Error types for event resolution.

use thiserror::Error;

/// Errors resolving named events into typed events.
///
/// Event names only exist at the edges (fixtures, command lines, transports).
/// Everything past those edges works with closed enums, so these errors are
/// contract violations and are propagated rather than tolerated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EventError {
    /// No input event with this qualified name.
    #[error("Unknown input event: {0}")]
    UnknownInput(String),

    /// No output event with this qualified name.
    #[error("Unknown output event: {0}")]
    UnknownOutput(String),

    /// The event carries a numeric value but none was given.
    #[error("Event {name} requires a numeric payload")]
    MissingPayload { name: String },

    /// The event carries no value but one was given.
    #[error("Event {name} takes no payload, got {payload}")]
    UnexpectedPayload { name: String, payload: f64 },
}
