//! Input/output trace recording.

use cranesim_core::{Payload, SimTime, TraceEvent};
use serde::{Deserialize, Serialize};

/// Everything a run accepted and emitted, in order.
///
/// The serialized form is the scenario fixture format, so a recorded trace
/// can be pasted into a fixture file as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    pub input_events: Vec<TraceEvent>,
    pub output_events: Vec<TraceEvent>,
}

impl Trace {
    /// Render as JSON with one event per line.
    pub fn to_fixture_json(&self) -> Result<String, serde_json::Error> {
        let mut out = String::from("{\n");
        write_events(&mut out, "input_events", &self.input_events)?;
        out.push_str(",\n");
        write_events(&mut out, "output_events", &self.output_events)?;
        out.push_str("\n}\n");
        Ok(out)
    }
}

fn write_events(out: &mut String, key: &str, events: &[TraceEvent]) -> Result<(), serde_json::Error> {
    out.push_str(&format!("    \"{key}\": ["));
    for (i, event) in events.iter().enumerate() {
        let separator = if i + 1 < events.len() { "," } else { "" };
        out.push_str(&format!("\n        {}{separator}", serde_json::to_string(event)?));
    }
    if !events.is_empty() {
        out.push_str("\n    ");
    }
    out.push(']');
    Ok(())
}

/// Passive recorder of accepted inputs and emitted outputs.
///
/// Owned by the controller it is attached to. Recording is a plain append,
/// so it cannot block or fail, and nested calls from inside a drain are fine.
#[derive(Debug, Default)]
pub struct TraceRecorder {
    trace: Trace,
}

impl TraceRecorder {
    /// Create an empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an accepted input.
    pub fn record_input(&mut self, time: SimTime, name: &str, payload: Payload) {
        self.trace
            .input_events
            .push(TraceEvent::new(time, name, payload));
    }

    /// Record an emitted output.
    pub fn record_output(&mut self, time: SimTime, name: &str, payload: Payload) {
        self.trace
            .output_events
            .push(TraceEvent::new(time, name, payload));
    }

    /// The trace recorded so far.
    pub fn trace(&self) -> &Trace {
        &self.trace
    }

    /// Finish recording.
    pub fn into_trace(self) -> Trace {
        self.trace
    }
}
