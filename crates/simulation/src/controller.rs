//! Controller: drives a state machine from the event queue.
//!
//! The controller owns the machine, the queue, the timer service, the output
//! subscriptions and the optional trace recorder. Popped entries are turned
//! into machine inputs, and the actions the machine returns are applied at
//! the current virtual time:
//!
//! ```text
//!   add_input ──► EventQueue ──pop──► StateMachine::handle
//!                    ▲                     │ Vec<Action>
//!                    │                     ▼
//!         Scheduler ─┴── subscribers ◄── Emit / SetTimer / UnsetTimer
//! ```
//!
//! Subscribers receive a [`Scheduler`] so they can answer an output with
//! future inputs (a stand-in actuator reporting `done_moving` later, say)
//! without holding a reference to the controller.

use crate::event_queue::{EventKey, EventQueue};
use crate::timers::{QueuedAction, TimerService};
use crate::trace::{Trace, TraceRecorder};
use cranesim_core::{Action, EventError, InputEvent, OutputEvent, Payload, SimTime, StateMachine};
use indexmap::IndexMap;
use std::time::Duration;
use tracing::{debug, info, trace};

/// Scheduling context handed to output subscribers.
pub struct Scheduler<'a, I> {
    queue: &'a mut EventQueue<QueuedAction<I>>,
}

impl<'a, I: InputEvent> Scheduler<'a, I> {
    pub(crate) fn new(queue: &'a mut EventQueue<QueuedAction<I>>) -> Self {
        Self { queue }
    }

    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        self.queue.now()
    }

    /// Schedule `input` at absolute simulated time `at`.
    pub fn add_input(&mut self, at: SimTime, input: I) -> EventKey {
        debug!(at = %at, input = input.name(), "Input scheduled");
        let label = input.name();
        self.queue.schedule(at, QueuedAction::Input(input), label)
    }

    /// Schedule `input` at `offset` after the current simulated time.
    pub fn add_input_relative(&mut self, offset: Duration, input: I) -> EventKey {
        let at = self.queue.now() + offset;
        self.add_input(at, input)
    }

    /// Withdraw a previously scheduled input.
    pub fn cancel(&mut self, key: EventKey) -> bool {
        self.queue.cancel(key)
    }
}

/// Callback subscribed to one output channel.
pub type OutputCallback<I> = Box<dyn FnMut(&mut Scheduler<'_, I>, Payload) + Send>;

/// Observer of accepted external inputs.
pub type InputObserver = Box<dyn FnMut(SimTime, &str, Payload) + Send>;

/// Drives a [`StateMachine`] from a virtual-time event queue.
pub struct Controller<M: StateMachine> {
    machine: M,
    queue: EventQueue<QueuedAction<M::Input>>,
    timers: TimerService,
    subscriptions: IndexMap<&'static str, Vec<OutputCallback<M::Input>>>,
    input_observers: Vec<InputObserver>,
    recorder: Option<TraceRecorder>,
    entered: bool,
}

impl<M: StateMachine> Controller<M> {
    /// Create a controller for `machine` with the clock at zero.
    pub fn new(machine: M) -> Self {
        Self {
            machine,
            queue: EventQueue::new(),
            timers: TimerService::new(),
            subscriptions: IndexMap::new(),
            input_observers: Vec::new(),
            recorder: None,
            entered: false,
        }
    }

    /// Record every accepted input and emitted output.
    pub fn with_recorder(mut self) -> Self {
        self.recorder = Some(TraceRecorder::new());
        self
    }

    /// Subscribe `callback` to the output channel `name`.
    ///
    /// A channel may have any number of subscribers; they are called in
    /// subscription order. Fails if the machine has no such output.
    pub fn subscribe(
        &mut self,
        name: &str,
        callback: OutputCallback<M::Input>,
    ) -> Result<(), EventError> {
        let name = M::Output::NAMES
            .iter()
            .copied()
            .find(|known| *known == name)
            .ok_or_else(|| EventError::UnknownOutput(name.to_string()))?;
        self.subscriptions.entry(name).or_default().push(callback);
        Ok(())
    }

    /// Observe every accepted external input.
    pub fn observe_inputs(&mut self, observer: InputObserver) {
        self.input_observers.push(observer);
    }

    /// Enter the machine's initial state. Only the first call has an effect.
    pub fn enter(&mut self) {
        if self.entered {
            return;
        }
        self.entered = true;
        info!(time = %self.queue.now(), "Entering state machine");
        let actions = self.machine.enter();
        self.apply(actions);
    }

    /// Check if [`Controller::enter`] was called.
    pub fn is_entered(&self) -> bool {
        self.entered
    }

    /// Schedule `input` at absolute simulated time `at`.
    pub fn add_input(&mut self, at: SimTime, input: M::Input) -> EventKey {
        self.scheduler().add_input(at, input)
    }

    /// Schedule `input` at `offset` after the current simulated time.
    pub fn add_input_relative(&mut self, offset: Duration, input: M::Input) -> EventKey {
        self.scheduler().add_input_relative(offset, input)
    }

    /// Scheduling context over this controller's queue.
    pub fn scheduler(&mut self) -> Scheduler<'_, M::Input> {
        Scheduler::new(&mut self.queue)
    }

    /// Process every entry due at or before `limit`.
    ///
    /// Entries scheduled while processing run within the same call when they
    /// are due by `limit`.
    pub fn run_until(&mut self, limit: SimTime) {
        while let Some(action) = self.queue.pop_due(limit) {
            self.dispatch(action);
        }
    }

    /// Process entries until the queue is empty.
    ///
    /// Does not return while a periodic timer is armed.
    pub fn run_to_completion(&mut self) {
        self.run_until(SimTime::MAX);
    }

    /// Current simulated time.
    pub fn now(&self) -> SimTime {
        self.queue.now()
    }

    /// Check if any entry is pending.
    pub fn has_pending(&self) -> bool {
        self.queue.has_pending()
    }

    /// Time of the earliest pending entry.
    pub fn earliest(&self) -> Option<SimTime> {
        self.queue.earliest()
    }

    pub fn machine(&self) -> &M {
        &self.machine
    }

    /// The trace recorded so far, if recording.
    pub fn trace(&self) -> Option<&Trace> {
        self.recorder.as_ref().map(TraceRecorder::trace)
    }

    /// Stop recording and return the trace.
    pub fn take_trace(&mut self) -> Option<Trace> {
        self.recorder.take().map(TraceRecorder::into_trace)
    }

    fn dispatch(&mut self, action: QueuedAction<M::Input>) {
        let now = self.queue.now();
        let input = match action {
            QueuedAction::Input(input) => {
                let (name, payload) = (input.name(), input.payload());
                if let Some(recorder) = &mut self.recorder {
                    recorder.record_input(now, name, payload);
                }
                for observer in &mut self.input_observers {
                    observer(now, name, payload);
                }
                input
            }
            // Periodic timers re-arm before the handler runs so it can unset them
            QueuedAction::Timer { id, period } => {
                self.timers.on_fired(&mut self.queue, id, period);
                M::Input::time_elapsed(id)
            }
        };
        let actions = self.machine.handle(input);
        self.apply(actions);
    }

    fn apply(&mut self, actions: Vec<Action<M::Output>>) {
        for action in actions {
            trace!(time = %self.queue.now(), action = action.type_name(), "Applying action");
            match action {
                Action::Emit(output) => self.emit(output),
                Action::SetTimer {
                    id,
                    duration,
                    periodic,
                } => self.timers.set_timer(&mut self.queue, id, duration, periodic),
                Action::UnsetTimer { id } => self.timers.unset_timer(&mut self.queue, id),
            }
        }
    }

    fn emit(&mut self, output: M::Output) {
        let (name, payload) = (output.name(), output.payload());
        if let Some(recorder) = &mut self.recorder {
            recorder.record_output(self.queue.now(), name, payload);
        }
        if let Some(callbacks) = self.subscriptions.get_mut(name) {
            let mut scheduler = Scheduler::new(&mut self.queue);
            for callback in callbacks.iter_mut() {
                callback(&mut scheduler, payload);
            }
        }
    }
}

impl<M: StateMachine + std::fmt::Debug> std::fmt::Debug for Controller<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Controller")
            .field("machine", &self.machine)
            .field("now", &self.queue.now())
            .field("pending", &self.queue.len())
            .field("timers", &self.timers.len())
            .field("channels", &self.subscriptions.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranesim_core::TraceEvent;
    use cranesim_test_helpers::{Metronome, MetronomeInput};
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tracing_test::traced_test;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn at_ms(n: u64) -> SimTime {
        SimTime::from_duration(ms(n))
    }

    fn outputs(controller: &Controller<Metronome>) -> Vec<TraceEvent> {
        controller.trace().unwrap().output_events.clone()
    }

    #[traced_test]
    #[test]
    fn test_enter_runs_once() {
        let mut controller = Controller::new(Metronome::new(ms(10))).with_recorder();
        controller.enter();
        controller.enter();
        assert!(controller.is_entered());
        assert_eq!(
            outputs(&controller),
            vec![TraceEvent::at(0, "metronome.ready", None)]
        );
    }

    #[traced_test]
    #[test]
    fn test_one_shot_ticks_until_stopped() {
        let mut controller = Controller::new(Metronome::new(ms(10))).with_recorder();
        controller.enter();
        controller.add_input(at_ms(5), MetronomeInput::Start);
        controller.add_input(at_ms(40), MetronomeInput::Stop);
        controller.run_to_completion();

        let ticks: Vec<_> = outputs(&controller)
            .into_iter()
            .filter(|e| e.name == "metronome.tick")
            .map(|e| (e.time, e.payload))
            .collect();
        assert_eq!(
            ticks,
            vec![
                (at_ms(15), Some(1.0)),
                (at_ms(25), Some(2.0)),
                (at_ms(35), Some(3.0)),
            ]
        );
        assert_eq!(controller.machine().ticks(), 3);
        assert!(!controller.has_pending());
    }

    #[traced_test]
    #[test]
    fn test_periodic_timer_and_run_until() {
        let mut controller = Controller::new(Metronome::periodic(ms(10))).with_recorder();
        controller.enter();
        controller.add_input(SimTime::ZERO, MetronomeInput::Start);

        controller.run_until(at_ms(35));
        assert_eq!(controller.machine().ticks(), 3);
        assert_eq!(controller.now(), at_ms(30));
        assert_eq!(controller.earliest(), Some(at_ms(40)));

        controller.add_input(at_ms(45), MetronomeInput::Stop);
        controller.run_to_completion();
        assert_eq!(controller.machine().ticks(), 4);
        assert!(!controller.has_pending());
    }

    #[traced_test]
    #[test]
    fn test_timer_inputs_are_not_recorded() {
        let mut controller = Controller::new(Metronome::new(ms(10))).with_recorder();
        controller.enter();
        controller.add_input(SimTime::ZERO, MetronomeInput::Start);
        controller.add_input(at_ms(15), MetronomeInput::Stop);
        controller.run_to_completion();

        let trace = controller.take_trace().unwrap();
        assert_eq!(
            trace.input_events,
            vec![
                TraceEvent::at(0, "metronome.start", None),
                TraceEvent::new(at_ms(15), "metronome.stop", None),
            ]
        );
        assert!(controller.trace().is_none());
    }

    #[traced_test]
    #[test]
    fn test_subscribers_schedule_follow_up_inputs() {
        let mut controller = Controller::new(Metronome::new(ms(10))).with_recorder();
        let pongs = Arc::new(Mutex::new(Vec::new()));

        // Answer ready with a ping 3 ms later
        controller
            .subscribe(
                "metronome.ready",
                Box::new(|scheduler, _| {
                    scheduler.add_input_relative(ms(3), MetronomeInput::Ping(7.0));
                }),
            )
            .unwrap();
        let seen = pongs.clone();
        controller
            .subscribe(
                "metronome.pong",
                Box::new(move |scheduler, payload| seen.lock().push((scheduler.now(), payload))),
            )
            .unwrap();
        // Second subscriber on the same channel
        let count = Arc::new(Mutex::new(0));
        let counter = count.clone();
        controller
            .subscribe("metronome.pong", Box::new(move |_, _| *counter.lock() += 1))
            .unwrap();

        controller.enter();
        controller.run_to_completion();

        assert_eq!(*pongs.lock(), vec![(at_ms(3), Some(7.0))]);
        assert_eq!(*count.lock(), 1);
    }

    #[test]
    fn test_subscribe_unknown_channel_fails() {
        let mut controller = Controller::new(Metronome::new(ms(10)));
        let result = controller.subscribe("metronome.bogus", Box::new(|_, _| {}));
        assert_eq!(
            result,
            Err(EventError::UnknownOutput("metronome.bogus".to_string()))
        );
    }

    #[traced_test]
    #[test]
    fn test_input_observers_see_accepted_inputs() {
        let mut controller = Controller::new(Metronome::new(ms(10)));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        controller.observe_inputs(Box::new(move |time, name, payload| {
            sink.lock().push((time, name.to_string(), payload))
        }));

        controller.enter();
        let key = controller.add_input(at_ms(1), MetronomeInput::Ping(1.0));
        controller.add_input(at_ms(2), MetronomeInput::Ping(2.0));
        assert!(controller.scheduler().cancel(key));
        controller.run_to_completion();

        assert_eq!(
            *seen.lock(),
            vec![(at_ms(2), "metronome.ping".to_string(), Some(2.0))]
        );
    }
}
