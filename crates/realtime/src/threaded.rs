//! Real-time runner on a dedicated worker thread.
//!
//! The worker owns the controller. It drains the queue up to the current
//! virtual time, then sleeps on a condition variable until the next entry is
//! due. Other threads never touch the queue: they push inputs into a mailbox
//! through an [`Injector`] and notify the condition variable.
//!
//! ```text
//!   Injector ──push──► Mailbox ──notify──► Condvar
//!                                             │ wakes
//!                                             ▼
//!   worker:  loop { run_until(now); terminate?; wait_until(next due) }
//! ```

use crate::wall_clock::WallClock;
use cranesim_core::StateMachine;
use cranesim_simulation::Controller;
use parking_lot::{Condvar, Mutex};
use std::io;
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, info, trace};

/// Termination predicate checked after every drain.
pub type TerminationCondition<M> = Box<dyn FnMut(&Controller<M>) -> bool + Send>;

struct Mailbox<I> {
    inputs: Vec<I>,
    poked: bool,
    shutdown: bool,
}

impl<I> Mailbox<I> {
    fn has_news(&self) -> bool {
        !self.inputs.is_empty() || self.poked || self.shutdown
    }
}

struct Shared<I> {
    mailbox: Mutex<Mailbox<I>>,
    wakeup: Condvar,
}

/// Handle for injecting inputs into a running worker from any thread.
pub struct Injector<I> {
    shared: Arc<Shared<I>>,
}

impl<I> Clone for Injector<I> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<I> Injector<I> {
    /// Raise `input` at the worker's current virtual time.
    pub fn add_input_now(&self, input: I) {
        self.shared.mailbox.lock().inputs.push(input);
        self.shared.wakeup.notify_one();
    }

    /// Wake the worker so it re-checks its queue and termination condition.
    pub fn poke(&self) {
        self.shared.mailbox.lock().poked = true;
        self.shared.wakeup.notify_one();
    }

    /// Ask the worker to stop after its current drain.
    pub fn shutdown(&self) {
        self.shared.mailbox.lock().shutdown = true;
        self.shared.wakeup.notify_one();
    }
}

/// Runs a controller in real time on its own thread.
pub struct ThreadedRealtime<M: StateMachine> {
    controller: Controller<M>,
    clock: Arc<WallClock>,
    shared: Arc<Shared<M::Input>>,
    termination: Option<TerminationCondition<M>>,
}

impl<M: StateMachine> ThreadedRealtime<M> {
    /// Create a runner. The controller is entered when the run starts, if it
    /// was not entered already.
    pub fn new(controller: Controller<M>, clock: Arc<WallClock>) -> Self {
        Self {
            controller,
            clock,
            shared: Arc::new(Shared {
                mailbox: Mutex::new(Mailbox {
                    inputs: Vec::new(),
                    poked: false,
                    shutdown: false,
                }),
                wakeup: Condvar::new(),
            }),
            termination: None,
        }
    }

    /// Stop the run once `condition` holds after a drain.
    ///
    /// Without a condition the run only ends through [`Injector::shutdown`].
    pub fn with_termination(
        mut self,
        condition: impl FnMut(&Controller<M>) -> bool + Send + 'static,
    ) -> Self {
        self.termination = Some(Box::new(condition));
        self
    }

    /// Handle for injecting inputs from other threads.
    pub fn injector(&self) -> Injector<M::Input> {
        Injector {
            shared: self.shared.clone(),
        }
    }

    /// Run on a new thread. Joining yields the controller back.
    pub fn spawn(self) -> io::Result<JoinHandle<Controller<M>>>
    where
        M: Send + 'static,
    {
        std::thread::Builder::new()
            .name("cranesim-realtime".to_string())
            .spawn(move || self.run())
    }

    /// Run on the calling thread until terminated.
    pub fn run(mut self) -> Controller<M> {
        self.controller.enter();
        self.clock.record_start_time();
        info!(time_scale = self.clock.scale(), "Real-time run started");

        loop {
            let now = self.clock.now();
            self.controller.run_until(now);

            if self.should_terminate() {
                info!(time = %self.controller.now(), "Termination condition met");
                break;
            }

            let (inputs, shutdown) = self.wait_for_news();
            if shutdown {
                info!(time = %self.controller.now(), "Shutdown requested");
                break;
            }
            for input in inputs {
                self.add_input_now(input);
            }
        }

        self.controller
    }

    /// Drain to now, then schedule `input` at now.
    fn add_input_now(&mut self, input: M::Input) {
        let now = self.clock.now();
        self.controller.run_until(now);
        self.controller.add_input(now, input);
    }

    fn should_terminate(&mut self) -> bool {
        match &mut self.termination {
            Some(condition) => condition(&self.controller),
            None => false,
        }
    }

    /// Sleep until the next entry is due or the mailbox has news.
    fn wait_for_news(&self) -> (Vec<M::Input>, bool) {
        let deadline = self
            .controller
            .earliest()
            .and_then(|next| self.clock.to_wall(next));

        let mut mailbox = self.shared.mailbox.lock();
        if !mailbox.has_news() {
            match deadline {
                Some(deadline) => {
                    trace!(?deadline, "Sleeping until next entry");
                    self.shared.wakeup.wait_until(&mut mailbox, deadline);
                }
                None => {
                    debug!("Queue empty, sleeping until woken");
                    self.shared.wakeup.wait(&mut mailbox);
                }
            }
        }
        mailbox.poked = false;
        (std::mem::take(&mut mailbox.inputs), mailbox.shutdown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cranesim_core::SimTime;
    use cranesim_test_helpers::{Metronome, MetronomeInput};
    use std::time::Duration;
    use tracing_test::traced_test;

    fn has_output(controller: &Controller<Metronome>, name: &str) -> bool {
        controller
            .trace()
            .is_some_and(|t| t.output_events.iter().any(|e| e.name == name))
    }

    #[traced_test]
    #[test]
    fn test_worker_runs_timers_until_terminated() {
        let controller = Controller::new(Metronome::periodic(Duration::from_millis(5))).with_recorder();
        let runner = ThreadedRealtime::new(controller, Arc::new(WallClock::new(1.0)))
            .with_termination(|c| c.machine().ticks() >= 3);
        runner.injector().add_input_now(MetronomeInput::Start);

        let controller = runner.spawn().unwrap().join().unwrap();
        assert!(controller.machine().ticks() >= 3);
        assert!(controller.now() >= SimTime::from_duration(Duration::from_millis(15)));
    }

    #[traced_test]
    #[test]
    fn test_injection_wakes_idle_worker() {
        let controller = Controller::new(Metronome::new(Duration::from_secs(60))).with_recorder();
        let runner = ThreadedRealtime::new(controller, Arc::new(WallClock::new(1.0)))
            .with_termination(|c| has_output(c, "metronome.pong"));
        let injector = runner.injector();
        let handle = runner.spawn().unwrap();

        // Worker is asleep with an empty queue by now
        std::thread::sleep(Duration::from_millis(20));
        injector.add_input_now(MetronomeInput::Ping(3.0));

        let controller = handle.join().unwrap();
        let trace = controller.trace().unwrap();
        assert_eq!(trace.input_events.len(), 1);
        assert_eq!(trace.input_events[0].name, "metronome.ping");
        assert!(has_output(&controller, "metronome.ready"));
    }

    #[traced_test]
    #[test]
    fn test_shutdown_ends_run() {
        let controller = Controller::new(Metronome::new(Duration::from_secs(60)));
        let runner = ThreadedRealtime::new(controller, Arc::new(WallClock::new(1.0)));
        let injector = runner.injector();
        let handle = runner.spawn().unwrap();

        injector.poke();
        injector.shutdown();
        let controller = handle.join().unwrap();
        assert!(controller.is_entered());
    }
}
