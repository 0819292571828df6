//! Replay golden scenarios against the crane controller.
//!
//! Without arguments the built-in scenarios are replayed. Otherwise every
//! argument is a JSON file holding either a scenario or a trace printed by
//! one of the other runners.

use clap::Parser;
use cranesim_crane::scenarios::{comparison_rules, scenarios};
use cranesim_crane::setup;
use cranesim_runner::init_tracing;
use cranesim_simulation::{run_scenarios, Scenario, Trace};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "crane-scenarios")]
#[command(about = "Replay input traces and compare the outputs")]
#[command(version)]
struct Cli {
    /// Scenario or trace files (defaults to the built-in scenarios)
    files: Vec<PathBuf>,
}

fn load(path: &Path) -> Result<Scenario, Box<dyn std::error::Error>> {
    let json = std::fs::read_to_string(path)?;
    if let Ok(scenario) = Scenario::from_json(&json) {
        return Ok(scenario);
    }
    let trace: Trace = serde_json::from_str(&json)?;
    Ok(Scenario::from_trace(path.display().to_string(), trace))
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let scenarios = if cli.files.is_empty() {
        scenarios()?
    } else {
        cli.files
            .iter()
            .map(|path| load(path))
            .collect::<Result<Vec<_>, _>>()?
    };

    let report = run_scenarios(&scenarios, setup, &comparison_rules())?;
    for outcome in &report.outcomes {
        println!("{outcome}");
    }

    if report.all_passed() {
        println!("All scenarios passed.");
        Ok(ExitCode::SUCCESS)
    } else {
        println!("{} of {} scenarios failed.", report.failures(), report.outcomes.len());
        Ok(ExitCode::FAILURE)
    }
}
