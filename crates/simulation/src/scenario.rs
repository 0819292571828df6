//! Scenario replay and trace comparison.
//!
//! A scenario is a literal input trace plus the output trace it must
//! produce. Replaying builds a fresh controller, feeds it the inputs at their
//! literal timestamps and compares what comes out.
//!
//! Comparison is not plain equality. Some outputs describe a level rather
//! than an edge ("magnet on", "hoist to 100"), and emitting them twice with
//! the same value means nothing. [`ComparisonRules`] names those outputs and
//! the values assumed to have been emitted before the run started.

use crate::controller::Controller;
use crate::trace::Trace;
use cranesim_core::{EventError, InputEvent, Payload, StateMachine, TraceEvent};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors loading or replaying a scenario.
#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("Failed to decode scenario: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Scenario {scenario:?}: {source}")]
    Event {
        scenario: String,
        #[source]
        source: EventError,
    },
}

/// Literal input trace and the output trace it must produce.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub name: String,
    pub input_events: Vec<TraceEvent>,
    pub output_events: Vec<TraceEvent>,
}

impl Scenario {
    /// Parse a scenario from its JSON fixture.
    pub fn from_json(json: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Turn a recorded trace into a scenario.
    pub fn from_trace(name: impl Into<String>, trace: Trace) -> Self {
        Self {
            name: name.into(),
            input_events: trace.input_events,
            output_events: trace.output_events,
        }
    }
}

/// How produced and expected output traces are compared.
#[derive(Debug, Clone, Default)]
pub struct ComparisonRules {
    /// Outputs assumed to have happened before the run, in order.
    initial: Vec<(String, Payload)>,
    /// Outputs whose repetition with an unchanged payload is ignored.
    idempotent: Vec<String>,
}

impl ComparisonRules {
    /// Exact comparison: no initial outputs, nothing idempotent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Assume `name` was emitted with `payload` before the run.
    pub fn with_initial(mut self, name: impl Into<String>, payload: Payload) -> Self {
        self.initial.push((name.into(), payload));
        self
    }

    /// Declare outputs idempotent.
    pub fn with_idempotent<S: Into<String>>(mut self, names: impl IntoIterator<Item = S>) -> Self {
        self.idempotent.extend(names.into_iter().map(Into::into));
        self
    }

    fn is_idempotent(&self, name: &str) -> bool {
        self.idempotent.iter().any(|n| n == name)
    }

    /// Drop idempotent outputs that repeat the output right before them.
    ///
    /// The trace is read as if the initial outputs came first, so an
    /// idempotent output repeating the last initial one is dropped too.
    pub fn normalize(&self, events: &[TraceEvent]) -> Vec<TraceEvent> {
        let mut previous: Option<(&str, Payload)> = self
            .initial
            .last()
            .map(|(name, payload)| (name.as_str(), *payload));

        let mut kept = Vec::with_capacity(events.len());
        for event in events {
            let current = (event.name.as_str(), event.payload);
            if self.is_idempotent(current.0) && previous == Some(current) {
                continue;
            }
            previous = Some(current);
            kept.push(event.clone());
        }
        kept
    }

    /// Compare two output traces. Returns the first difference, if any.
    pub fn compare(&self, expected: &[TraceEvent], actual: &[TraceEvent]) -> Option<Mismatch> {
        let expected = self.normalize(expected);
        let actual = self.normalize(actual);

        let len = expected.len().max(actual.len());
        (0..len).find_map(|index| {
            let (e, a) = (expected.get(index), actual.get(index));
            (e != a).then(|| Mismatch {
                index,
                expected: e.cloned(),
                actual: a.cloned(),
            })
        })
    }
}

/// First position where normalized traces differ.
#[derive(Debug, Clone, PartialEq)]
pub struct Mismatch {
    pub index: usize,
    /// `None` when the expected trace ended first.
    pub expected: Option<TraceEvent>,
    /// `None` when the produced trace ended first.
    pub actual: Option<TraceEvent>,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let show = |event: &Option<TraceEvent>| match event {
            Some(event) => event.to_string(),
            None => "<end of trace>".to_string(),
        };
        write!(
            f,
            "at #{}: expected {}, got {}",
            self.index,
            show(&self.expected),
            show(&self.actual)
        )
    }
}

/// Result of replaying one scenario.
#[derive(Debug, Clone)]
pub struct ScenarioOutcome {
    pub name: String,
    pub expected: Vec<TraceEvent>,
    pub actual: Vec<TraceEvent>,
    pub mismatch: Option<Mismatch>,
}

impl ScenarioOutcome {
    pub fn passed(&self) -> bool {
        self.mismatch.is_none()
    }
}

impl fmt::Display for ScenarioOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(mismatch) = &self.mismatch else {
            return write!(f, "Scenario {:?}: passed", self.name);
        };
        writeln!(f, "Scenario {:?}: FAILED {mismatch}", self.name)?;
        writeln!(f, "  Expected:")?;
        for event in &self.expected {
            writeln!(f, "    {event}")?;
        }
        writeln!(f, "  Actual:")?;
        for event in &self.actual {
            writeln!(f, "    {event}")?;
        }
        Ok(())
    }
}

/// Outcomes of a batch of scenarios, in input order.
#[derive(Debug, Clone, Default)]
pub struct ScenarioReport {
    pub outcomes: Vec<ScenarioOutcome>,
}

impl ScenarioReport {
    pub fn all_passed(&self) -> bool {
        self.outcomes.iter().all(ScenarioOutcome::passed)
    }

    /// Number of failed scenarios.
    pub fn failures(&self) -> usize {
        self.outcomes.iter().filter(|o| !o.passed()).count()
    }
}

/// Feed literal inputs into an entered controller and run it dry.
///
/// Inputs are stably sorted by timestamp. Before each input is scheduled the
/// controller is drained up to its timestamp, so timer expiries due at the
/// same instant are handled first, exactly as they were when the inputs were
/// injected live.
pub fn replay<M: StateMachine>(
    controller: &mut Controller<M>,
    inputs: &[TraceEvent],
) -> Result<(), EventError> {
    let mut resolved = inputs
        .iter()
        .map(|event| Ok((event.time, M::Input::from_name(&event.name, event.payload)?)))
        .collect::<Result<Vec<_>, EventError>>()?;
    resolved.sort_by_key(|(time, _)| *time);

    for (time, input) in resolved {
        controller.run_until(time);
        controller.add_input(time, input);
    }
    controller.run_to_completion();
    Ok(())
}

/// Replay one scenario on a fresh controller built by `setup`.
///
/// `setup` must return a controller that records its trace and that has not
/// been entered.
pub fn run_scenario<M, F>(
    scenario: &Scenario,
    setup: F,
    rules: &ComparisonRules,
) -> Result<ScenarioOutcome, ScenarioError>
where
    M: StateMachine,
    F: FnOnce() -> Controller<M>,
{
    debug!(scenario = %scenario.name, inputs = scenario.input_events.len(), "Replaying scenario");

    let mut controller = setup();
    controller.enter();
    replay(&mut controller, &scenario.input_events).map_err(|source| ScenarioError::Event {
        scenario: scenario.name.clone(),
        source,
    })?;

    let actual = controller.take_trace().unwrap_or_else(|| {
        warn!(scenario = %scenario.name, "Controller was not recording, comparing against an empty trace");
        Trace::default()
    });
    let mismatch = rules.compare(&scenario.output_events, &actual.output_events);

    let outcome = ScenarioOutcome {
        name: scenario.name.clone(),
        expected: scenario.output_events.clone(),
        actual: actual.output_events,
        mismatch,
    };
    if outcome.passed() {
        info!(scenario = %outcome.name, "Scenario passed");
    } else {
        warn!(scenario = %outcome.name, "Scenario failed");
    }
    Ok(outcome)
}

/// Replay every scenario in parallel, each on its own fresh controller.
///
/// A failing scenario does not stop the others. An input that cannot be
/// resolved is an error for the whole batch.
pub fn run_scenarios<M, F>(
    scenarios: &[Scenario],
    setup: F,
    rules: &ComparisonRules,
) -> Result<ScenarioReport, ScenarioError>
where
    M: StateMachine,
    F: Fn() -> Controller<M> + Sync,
{
    let outcomes = scenarios
        .par_iter()
        .map(|scenario| run_scenario(scenario, &setup, rules))
        .collect::<Result<Vec<_>, _>>()?;

    let report = ScenarioReport { outcomes };
    info!(
        scenarios = report.outcomes.len(),
        failures = report.failures(),
        "Scenario run complete"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranesim_core::SimTime;
    use cranesim_test_helpers::{Metronome, MetronomeInput};
    use std::time::Duration;
    use tracing_test::traced_test;

    fn ready_rules() -> ComparisonRules {
        ComparisonRules::new().with_idempotent(["metronome.ready", "metronome.stopped"])
    }

    fn metronome() -> Controller<Metronome> {
        Controller::new(Metronome::new(Duration::from_millis(10))).with_recorder()
    }

    #[test]
    fn test_idempotent_duplicate_collapses() {
        let actual = vec![
            TraceEvent::at(0, "metronome.ready", None),
            TraceEvent::at(0, "metronome.ready", None),
        ];
        let expected = vec![TraceEvent::at(0, "metronome.ready", None)];
        assert_eq!(ready_rules().compare(&expected, &actual), None);
    }

    #[test]
    fn test_non_idempotent_duplicate_mismatches() {
        let actual = vec![
            TraceEvent::at(0, "metronome.pong", Some(1.0)),
            TraceEvent::at(0, "metronome.pong", Some(1.0)),
        ];
        let expected = vec![TraceEvent::at(0, "metronome.pong", Some(1.0))];
        let mismatch = ready_rules().compare(&expected, &actual).unwrap();
        assert_eq!(mismatch.index, 1);
        assert_eq!(mismatch.expected, None);
        assert_eq!(
            mismatch.actual,
            Some(TraceEvent::at(0, "metronome.pong", Some(1.0)))
        );
    }

    #[test]
    fn test_initial_outputs_seed_comparison() {
        let rules = ComparisonRules::new()
            .with_idempotent(["crane_control.hoist"])
            .with_initial("crane_control.hoist", Some(100.0));

        // Hoisting to where the crane already is does not count, and
        // neither does hoisting to the same height twice in a row
        let normalized = rules.normalize(&[
            TraceEvent::at(0, "crane_control.hoist", Some(100.0)),
            TraceEvent::at(5, "crane_control.hoist", Some(2.0)),
            TraceEvent::at(9, "crane_control.hoist", Some(2.0)),
            TraceEvent::at(12, "crane_control.hoist", Some(100.0)),
        ]);
        assert_eq!(
            normalized,
            vec![
                TraceEvent::at(5, "crane_control.hoist", Some(2.0)),
                TraceEvent::at(12, "crane_control.hoist", Some(100.0)),
            ]
        );
    }

    #[test]
    fn test_only_adjacent_repeats_collapse() {
        let rules = ready_rules();
        let events = vec![
            TraceEvent::at(0, "metronome.ready", None),
            TraceEvent::at(1, "metronome.pong", Some(1.0)),
            TraceEvent::at(2, "metronome.ready", None),
            TraceEvent::at(2, "metronome.ready", None),
        ];
        assert_eq!(rules.normalize(&events), events[..3].to_vec());
    }

    #[test]
    fn test_mismatch_reports_timestamp_difference() {
        let expected = vec![TraceEvent::at(10, "metronome.stopped", None)];
        let actual = vec![TraceEvent::at(11, "metronome.stopped", None)];
        let mismatch = ComparisonRules::new().compare(&expected, &actual).unwrap();
        assert_eq!(mismatch.index, 0);
        assert!(mismatch.to_string().contains("expected (10, \"metronome.stopped\", None)"));
    }

    #[traced_test]
    #[test]
    fn test_recorded_trace_replays_as_scenario() {
        let mut live = metronome();
        live.enter();
        live.add_input(SimTime::from_nanos(0), MetronomeInput::Start);
        live.add_input(SimTime::from_nanos(25_000_000), MetronomeInput::Ping(4.0));
        live.add_input(SimTime::from_nanos(32_000_000), MetronomeInput::Stop);
        live.run_to_completion();

        let json = live.take_trace().unwrap().to_fixture_json().unwrap();
        let trace: Trace = serde_json::from_str(&json).unwrap();
        let scenario = Scenario::from_trace("metronome", trace);

        let outcome = run_scenario(&scenario, metronome, &ComparisonRules::new()).unwrap();
        assert!(outcome.passed(), "{outcome}");
        assert_eq!(outcome.actual.len(), 6);
    }

    #[traced_test]
    #[test]
    fn test_replay_sorts_and_drains_before_injecting() {
        // Listed out of order; the stop at 20 ms must come after the tick due then
        let scenario = Scenario::from_json(
            r#"{
                "name": "late stop",
                "input_events": [
                    [20000000, "metronome.stop", null],
                    [0, "metronome.start", null]
                ],
                "output_events": [
                    [0, "metronome.ready", null],
                    [10000000, "metronome.tick", 1],
                    [20000000, "metronome.tick", 2],
                    [20000000, "metronome.stopped", null]
                ]
            }"#,
        )
        .unwrap();

        let outcome = run_scenario(&scenario, metronome, &ComparisonRules::new()).unwrap();
        assert!(outcome.passed(), "{outcome}");
    }

    #[traced_test]
    #[test]
    fn test_unknown_input_is_an_error() {
        let scenario = Scenario {
            name: "bad".to_string(),
            input_events: vec![TraceEvent::at(0, "metronome.explode", None)],
            output_events: vec![],
        };
        let err = run_scenario(&scenario, metronome, &ComparisonRules::new()).unwrap_err();
        assert!(matches!(
            err,
            ScenarioError::Event { source: EventError::UnknownInput(_), .. }
        ));
    }

    #[traced_test]
    #[test]
    fn test_failures_do_not_stop_the_batch() {
        let passing = Scenario {
            name: "ready".to_string(),
            input_events: vec![],
            output_events: vec![TraceEvent::at(0, "metronome.ready", None)],
        };
        let failing = Scenario {
            name: "silent".to_string(),
            input_events: vec![],
            output_events: vec![],
        };

        let report = run_scenarios(
            &[failing, passing],
            metronome,
            &ComparisonRules::new(),
        )
        .unwrap();
        assert!(!report.all_passed());
        assert_eq!(report.failures(), 1);
        assert_eq!(report.outcomes[0].name, "silent");
        assert!(report.outcomes[1].passed());
    }

    #[test]
    fn test_malformed_fixture_is_decode_error() {
        assert!(matches!(
            Scenario::from_json("{\"name\": 3}"),
            Err(ScenarioError::Decode(_))
        ));
    }
}
