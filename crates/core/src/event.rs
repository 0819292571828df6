//! Input and output event traits.

use crate::EventError;
use std::fmt;

/// Event payload: a number, or nothing.
pub type Payload = Option<f64>;

/// Identifier of a state machine timer.
///
/// The runner keeps at most one live timer per id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimerId(pub u32);

impl fmt::Display for TimerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer{}", self.0)
    }
}

/// The closed set of inputs a state machine accepts.
///
/// Implemented by an enum with one variant per input event, plus one variant
/// for "time elapsed" which the runner raises when a timer expires.
pub trait InputEvent: Clone + fmt::Debug + Send + 'static {
    /// Build the "time elapsed" input for a timer.
    fn time_elapsed(timer: TimerId) -> Self;

    /// The timer this input reports, if it is a "time elapsed" input.
    fn timer_id(&self) -> Option<TimerId>;

    /// Qualified name, e.g. `"scheduler.make_move"`.
    fn name(&self) -> &'static str;

    /// Numeric payload, if the event carries one.
    fn payload(&self) -> Payload;

    /// Resolve a qualified name and payload into an input.
    ///
    /// Fails on unknown names and on payloads of the wrong shape.
    fn from_name(name: &str, payload: Payload) -> Result<Self, EventError>;
}

/// The closed set of outputs a state machine emits.
pub trait OutputEvent: Clone + fmt::Debug + Send + 'static {
    /// Qualified names of every output channel.
    const NAMES: &'static [&'static str];

    /// Qualified name, e.g. `"crane_control.hoist"`.
    fn name(&self) -> &'static str;

    /// Numeric payload, if the event carries one.
    fn payload(&self) -> Payload;
}

/// Require a numeric payload for `name`.
pub fn expect_numeric(name: &str, payload: Payload) -> Result<f64, EventError> {
    payload.ok_or_else(|| EventError::MissingPayload {
        name: name.to_string(),
    })
}

/// Require that `name` carries no payload.
pub fn expect_no_payload(name: &str, payload: Payload) -> Result<(), EventError> {
    match payload {
        None => Ok(()),
        Some(payload) => Err(EventError::UnexpectedPayload {
            name: name.to_string(),
            payload,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_checks() {
        assert_eq!(expect_numeric("a.b", Some(2.0)), Ok(2.0));
        assert_eq!(
            expect_numeric("a.b", None),
            Err(EventError::MissingPayload {
                name: "a.b".to_string()
            })
        );
        assert!(expect_no_payload("a.c", None).is_ok());
        assert!(matches!(
            expect_no_payload("a.c", Some(1.0)),
            Err(EventError::UnexpectedPayload { payload, .. }) if payload == 1.0
        ));
    }

    #[test]
    fn test_timer_id_display() {
        assert_eq!(TimerId(3).to_string(), "timer3");
    }
}
