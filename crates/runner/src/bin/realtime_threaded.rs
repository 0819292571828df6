//! Headless real-time crane simulation on a worker thread.
//!
//! Ends once the stand-in scheduler has made all its moves.

use clap::Parser;
use cranesim_realtime::{ThreadedRealtime, WallClock};
use cranesim_runner::{init_tracing, print_trace, setup_headless, TimeScaleArgs};
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "crane-realtime-threaded")]
#[command(about = "Run the crane simulation in real time on a worker thread")]
#[command(version)]
struct Cli {
    #[command(flatten)]
    args: TimeScaleArgs,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing();

    let config = cli.args.config();
    println!("TIME SCALE is {}", config.time_scale);

    let (controller, done) = setup_headless()?;
    let clock = Arc::new(WallClock::new(config.time_scale));
    let runner = ThreadedRealtime::new(controller, clock)
        .with_termination(move |_| done.is_done());

    let mut controller = runner
        .spawn()?
        .join()
        .map_err(|_| "simulation thread panicked")?;
    info!(time = %controller.now(), "Simulation finished");

    print_trace(controller.take_trace())?;
    Ok(())
}
