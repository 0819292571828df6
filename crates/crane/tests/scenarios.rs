//! Golden scenario replays against the reference crane controller.

use cranesim_core::{SimTime, TraceEvent};
use cranesim_crane::scenarios::{comparison_rules, scenarios};
use cranesim_crane::stand_ins::{setup_stand_in_crane, setup_stand_in_scheduler};
use cranesim_crane::{setup, CraneInput, CraneOutput};
use cranesim_simulation::{run_scenario, run_scenarios, ComparisonRules, Scenario};
use tracing_test::traced_test;

fn scenario(name: &str) -> Scenario {
    scenarios()
        .unwrap()
        .into_iter()
        .find(|s| s.name == name)
        .unwrap()
}

#[traced_test]
#[test]
fn test_two_pickups_two_dropoffs() {
    let scenario = scenario("2 pickups, 2 drop-offs");
    let outcome = run_scenario(&scenario, setup, &comparison_rules()).unwrap();
    assert!(outcome.passed(), "{outcome}");
    assert_eq!(
        outcome.actual.last(),
        Some(&TraceEvent::at(22_413_716_646, CraneOutput::READY, None))
    );
}

#[traced_test]
#[test]
fn test_emergency_stop() {
    let scenario = scenario("Emergency stop");
    let outcome = run_scenario(&scenario, setup, &comparison_rules()).unwrap();
    assert!(outcome.passed(), "{outcome}");

    // One stop_all_movement only: the second stop hits a crane that is
    // already stopped and cancels the pending resume instead
    let stops: Vec<_> = outcome
        .actual
        .iter()
        .filter(|e| e.name == CraneOutput::STOP_ALL_MOVEMENT)
        .collect();
    assert_eq!(stops.len(), 1);
    assert_eq!(stops[0].time, SimTime::from_nanos(1_371_070_726));

    // Nothing moves between the stop and the real resume two seconds after
    // the second resume press
    assert!(outcome.actual.iter().all(|e| {
        e.time <= SimTime::from_nanos(1_371_070_726) || e.time >= SimTime::from_nanos(8_535_260_132)
    }));
}

#[traced_test]
#[test]
fn test_all_scenarios_pass_in_parallel() {
    let report = run_scenarios(&scenarios().unwrap(), setup, &comparison_rules()).unwrap();
    assert_eq!(report.outcomes.len(), 2);
    assert!(report.all_passed());
}

#[traced_test]
#[test]
fn test_wrong_expectation_is_reported() {
    let mut scenario = scenario("2 pickups, 2 drop-offs");
    // Expect the last ready a nanosecond late
    let last = scenario.output_events.len() - 1;
    scenario.output_events[last].time = SimTime::from_nanos(22_413_716_647);

    let outcome = run_scenario(&scenario, setup, &comparison_rules()).unwrap();
    assert!(!outcome.passed());
    let mismatch = outcome.mismatch.as_ref().unwrap();
    assert_eq!(mismatch.actual.as_ref().unwrap().time, SimTime::from_nanos(22_413_716_646));
    assert!(outcome.to_string().contains("FAILED"));
}

#[traced_test]
#[test]
fn test_exact_comparison_still_passes() {
    // The reference controller emits no redundant outputs in these scenarios
    for scenario in scenarios().unwrap() {
        let outcome = run_scenario(&scenario, setup, &ComparisonRules::new()).unwrap();
        assert!(outcome.passed(), "{outcome}");
    }
}

#[traced_test]
#[test]
fn test_recorded_live_run_replays() {
    // Record a headless run driven by the stand-ins, then replay its inputs
    // without them
    let mut live = setup();
    let done = setup_stand_in_scheduler(&mut live, Box::new(|_| {})).unwrap();
    setup_stand_in_crane(&mut live, |_| {}).unwrap();
    live.enter();
    live.add_input(SimTime::from_nanos(1_000_000_000), CraneInput::EmergencyStop);
    live.add_input(SimTime::from_nanos(1_500_000_000), CraneInput::EmergencyResume);
    live.run_to_completion();
    assert!(done.is_done());

    let scenario = Scenario::from_trace("recorded", live.take_trace().unwrap());
    let outcome = run_scenario(&scenario, setup, &comparison_rules()).unwrap();
    assert!(outcome.passed(), "{outcome}");
}
