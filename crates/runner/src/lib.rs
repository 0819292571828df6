//! Shared plumbing for the crane simulator binaries.
//!
//! | Binary                     | Pacing            | Ends when                  |
//! |----------------------------|-------------------|----------------------------|
//! | `crane-fast`               | as fast as possible | queue empty              |
//! | `crane-realtime-threaded`  | wall clock, worker thread | scheduler out of moves |
//! | `crane-realtime-eventloop` | wall clock, tokio `LocalSet` | scheduler done or `q` |
//! | `crane-scenarios`          | as fast as possible | every scenario replayed  |

pub mod console;

use cranesim_crane::stand_ins::{setup_stand_in_crane, setup_stand_in_scheduler, SchedulerDone};
use cranesim_crane::CraneController;
use clap::Args;
use cranesim_core::EventError;
use cranesim_realtime::RealtimeConfig;
use cranesim_simulation::{Controller, Trace};
use tracing_subscriber::EnvFilter;

/// Arguments of the real-time runners.
///
/// Never rejected: a missing, malformed or negative scale runs in real time,
/// and anything after the scale is ignored.
#[derive(Args, Debug)]
pub struct TimeScaleArgs {
    /// Virtual seconds per wall-clock second (falls back to 1.0)
    #[arg(allow_hyphen_values = true)]
    pub time_scale: Option<String>,

    #[arg(trailing_var_arg = true, allow_hyphen_values = true, hide = true)]
    pub ignored: Vec<String>,
}

impl TimeScaleArgs {
    pub fn config(&self) -> RealtimeConfig {
        RealtimeConfig::from_arg(self.time_scale.as_deref())
    }
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr so stdout only carries status lines and the trace.
/// `RUST_LOG` overrides the default `info` level.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Recording crane controller wired to the stand-in scheduler and crane.
///
/// Status lines from both stand-ins are printed to stdout.
pub fn setup_headless() -> Result<(Controller<CraneController>, SchedulerDone), EventError> {
    let mut controller = cranesim_crane::setup();
    let done = setup_stand_in_scheduler(
        &mut controller,
        Box::new(|status| println!("scheduler: {status}")),
    )?;
    setup_stand_in_crane(&mut controller, |status| println!("crane: {status}"))?;
    Ok((controller, done))
}

/// Print the end-of-run trace as fixture JSON.
pub fn print_trace(trace: Option<Trace>) -> Result<(), serde_json::Error> {
    let trace = trace.unwrap_or_default();
    println!("End of simulation. Full I/O trace:");
    print!("{}", trace.to_fixture_json()?);
    Ok(())
}
