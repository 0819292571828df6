//! Headless crane simulation, as fast as possible.
//!
//! Runs the stand-in scheduler's moves to completion in virtual time and
//! prints the recorded trace, ready to be used as a scenario fixture.

use clap::Parser;
use cranesim_runner::{init_tracing, print_trace, setup_headless};
use tracing::info;

#[derive(Parser)]
#[command(name = "crane-fast")]
#[command(about = "Run the crane simulation as fast as possible")]
#[command(version)]
struct Cli {}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    Cli::parse();
    init_tracing();

    let (mut controller, _done) = setup_headless()?;
    controller.enter();
    // Returns once the queue is empty
    controller.run_to_completion();
    info!(time = %controller.now(), "Simulation finished");

    print_trace(controller.take_trace())?;
    Ok(())
}
