//! Interactive real-time crane simulation on a tokio event loop.
//!
//! The console stands in for the emergency buttons: its lines are read on
//! another thread and raised on the loop through a remote injector.

use clap::Parser;
use cranesim_realtime::{EventLoopRealtime, TokioHostLoop, WallClock};
use cranesim_runner::console::{spawn_stdin_reader, HELP};
use cranesim_runner::{init_tracing, print_trace, setup_headless, TimeScaleArgs};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::LocalSet;
use tracing::info;

#[derive(Parser)]
#[command(name = "crane-realtime-eventloop")]
#[command(about = "Run the crane simulation in real time on an event loop")]
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

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let local = LocalSet::new();

    let trace = local.block_on(&runtime, async move {
        let (controller, done) = setup_headless()?;
        let clock = Arc::new(WallClock::new(config.time_scale));
        let sim = EventLoopRealtime::new(controller, TokioHostLoop, clock);

        let injector = sim.remote_injector();
        let (quit_tx, mut quit_rx) = mpsc::unbounded_channel();
        println!("{HELP}");
        spawn_stdin_reader(move |command| match command.input() {
            Some(input) => {
                injector.add_input_now(input);
            }
            None => {
                let _ = quit_tx.send(());
            }
        })?;

        sim.start();

        let mut poll = tokio::time::interval(Duration::from_millis(50));
        loop {
            tokio::select! {
                _ = quit_rx.recv() => {
                    info!("Quit requested");
                    break;
                }
                _ = poll.tick() => {
                    if done.is_done() {
                        info!("Scheduler made all moves");
                        break;
                    }
                }
            }
        }

        let trace = sim.with_controller(|c| {
            info!(time = %c.now(), "Simulation finished");
            c.take_trace()
        });
        Ok::<_, Box<dyn std::error::Error>>(trace)
    })?;

    print_trace(trace)?;
    // The console thread may still be blocked on stdin
    std::process::exit(0);
}

