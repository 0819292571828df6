//! Golden scenarios for the crane controller.

use crate::events::CraneOutput;
use cranesim_simulation::{ComparisonRules, Scenario, ScenarioError};

const TWO_PICKUPS_TWO_DROPOFFS: &str = include_str!("../scenarios/two_pickups_two_dropoffs.json");
// The hand-written list this fixture was transcribed from ends before the
// trailing `hoist 3.0`. That output answers the last input (`done_moving` at
// 11.125 s) once the settle delay expires, so it is part of the expected run.
const EMERGENCY_STOP: &str = include_str!("../scenarios/emergency_stop.json");

/// Outputs that may repeat with an unchanged payload.
pub const IDEMPOTENT_OUTPUTS: [&str; 5] = [
    CraneOutput::READY,
    CraneOutput::MAGNET_ON,
    CraneOutput::MAGNET_OFF,
    CraneOutput::HOIST,
    CraneOutput::MOVE,
];

/// Comparison rules for crane traces.
///
/// Before a run the magnet is off, the crane is at the safe height and at
/// column 0.
pub fn comparison_rules() -> ComparisonRules {
    ComparisonRules::new()
        .with_initial(CraneOutput::MAGNET_OFF, None)
        .with_initial(CraneOutput::HOIST, Some(100.0))
        .with_initial(CraneOutput::MOVE, Some(0.0))
        .with_idempotent(IDEMPOTENT_OUTPUTS)
}

/// Every golden scenario.
pub fn scenarios() -> Result<Vec<Scenario>, ScenarioError> {
    [TWO_PICKUPS_TWO_DROPOFFS, EMERGENCY_STOP]
        .into_iter()
        .map(Scenario::from_json)
        .collect()
}
