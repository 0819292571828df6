//! Trace entries.

use crate::{Payload, SimTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One recorded event: `(timestamp, qualified name, payload)`.
///
/// Serialized as a 3-element array so recorded traces read the same way as
/// hand-written fixtures: `[1371070726, "emergency.stop", null]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(
    from = "(SimTime, String, Payload)",
    into = "(SimTime, String, Payload)"
)]
pub struct TraceEvent {
    pub time: SimTime,
    pub name: String,
    pub payload: Payload,
}

impl TraceEvent {
    pub fn new(time: SimTime, name: impl Into<String>, payload: Payload) -> Self {
        Self {
            time,
            name: name.into(),
            payload,
        }
    }

    /// Shorthand for fixtures written in raw nanoseconds.
    pub fn at(nanos: u64, name: impl Into<String>, payload: Payload) -> Self {
        Self::new(SimTime::from_nanos(nanos), name, payload)
    }
}

impl From<(SimTime, String, Payload)> for TraceEvent {
    fn from((time, name, payload): (SimTime, String, Payload)) -> Self {
        Self {
            time,
            name,
            payload,
        }
    }
}

impl From<TraceEvent> for (SimTime, String, Payload) {
    fn from(event: TraceEvent) -> Self {
        (event.time, event.name, event.payload)
    }
}

impl fmt::Display for TraceEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.payload {
            Some(value) => write!(f, "({}, {:?}, {:?})", self.time.as_nanos(), self.name, value),
            None => write!(f, "({}, {:?}, None)", self.time.as_nanos(), self.name),
        }
    }
}
