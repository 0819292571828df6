//! Line-based console standing in for the emergency buttons.

use cranesim_crane::CraneInput;
use std::io::{self, BufRead};
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// What a console line asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Press the emergency stop button.
    Stop,
    /// Press the resume button.
    Resume,
    /// End the run. Also sent on end of input.
    Quit,
}

impl ConsoleCommand {
    /// Parse one line: `s`, `r` or `q`, case-insensitive.
    pub fn parse(line: &str) -> Option<Self> {
        match line.trim().to_ascii_lowercase().as_str() {
            "s" | "stop" => Some(ConsoleCommand::Stop),
            "r" | "resume" => Some(ConsoleCommand::Resume),
            "q" | "quit" => Some(ConsoleCommand::Quit),
            _ => None,
        }
    }

    /// The crane input this command raises, if any.
    pub fn input(self) -> Option<CraneInput> {
        match self {
            ConsoleCommand::Stop => Some(CraneInput::EmergencyStop),
            ConsoleCommand::Resume => Some(CraneInput::EmergencyResume),
            ConsoleCommand::Quit => None,
        }
    }
}

pub const HELP: &str = "Type s + enter for emergency stop, r + enter to resume, q + enter to quit";

/// Read commands from stdin on a background thread.
///
/// `on_command` runs on that thread. The thread ends after `Quit`, which is
/// also sent when stdin closes.
pub fn spawn_stdin_reader(
    mut on_command: impl FnMut(ConsoleCommand) + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("cranesim-console".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let line = match line {
                    Ok(line) => line,
                    Err(error) => {
                        warn!(%error, "Failed to read console input");
                        break;
                    }
                };
                match ConsoleCommand::parse(&line) {
                    Some(ConsoleCommand::Quit) => break,
                    Some(command) => {
                        debug!(?command, "Console command");
                        on_command(command);
                    }
                    None => println!("{HELP}"),
                }
            }
            on_command(ConsoleCommand::Quit);
        })
}
