//! Core traits for state machines.

use crate::{Action, InputEvent, OutputEvent};

/// A reactive state machine driven by the simulation kernel.
///
/// This is the only way the kernel talks to the machine under test:
///
/// - **Synchronous**: No async, no `.await`, no blocking
/// - **Deterministic**: Same state + input = same actions
/// - **Clockless**: The machine never reads time; it asks for timers
///   and is told when they expire
///
/// # Example
///
/// ```ignore
/// impl StateMachine for CraneController {
///     type Input = CraneInput;
///     type Output = CraneOutput;
///
///     fn enter(&mut self) -> Vec<Action<CraneOutput>> {
///         vec![Action::Emit(CraneOutput::Ready)]
///     }
///
///     fn handle(&mut self, input: CraneInput) -> Vec<Action<CraneOutput>> {
///         match input {
///             CraneInput::MakeMove => self.on_make_move(),
///             CraneInput::TimeElapsed(id) => self.on_timer(id),
///             // ... etc
///         }
///     }
/// }
/// ```
pub trait StateMachine {
    /// Inputs accepted by the machine, including "time elapsed".
    type Input: InputEvent;

    /// Outputs emitted by the machine.
    type Output: OutputEvent;

    /// Enter the default state(s), returning the entry actions.
    ///
    /// Called once, at the current virtual time, before any input.
    fn enter(&mut self) -> Vec<Action<Self::Output>>;

    /// Process one input to completion, returning actions to perform.
    ///
    /// # Guarantees
    ///
    /// - **Run to completion**: the input is fully processed before returning
    /// - **No I/O**: outputs and timers are applied by the runner, in order
    fn handle(&mut self, input: Self::Input) -> Vec<Action<Self::Output>>;
}
