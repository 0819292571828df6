//! Real-time runner on a host event loop.
//!
//! No thread is owned. The runner registers one-shot wake-ups with the host
//! loop (a GUI toolkit, a tokio `LocalSet`, ...) through [`HostLoop`]. Each
//! wake-up drains the queue up to the current virtual time and registers
//! the next one for the earliest pending entry. At most one wake-up is
//! pending at any time.

use crate::wall_clock::WallClock;
use cranesim_core::StateMachine;
use cranesim_simulation::Controller;
use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, trace};

/// Callback run by the host loop.
pub type HostCallback = Box<dyn FnOnce()>;

/// One-shot scheduling capability of a host event loop.
///
/// Callbacks must run later from the loop itself, never from inside
/// `call_at` or `call_soon`.
pub trait HostLoop {
    /// Handle for canceling a registered wake-up.
    type Wakeup;

    /// Run `callback` at or after `deadline`.
    fn call_at(&self, deadline: Instant, callback: HostCallback) -> Self::Wakeup;

    /// Run `callback` as soon as possible.
    fn call_soon(&self, callback: HostCallback) -> Self::Wakeup;

    /// Cancel a wake-up. Canceling one that already ran does nothing.
    fn cancel(&self, wakeup: Self::Wakeup);
}

struct Shared<M: StateMachine, H: HostLoop> {
    host: H,
    clock: Arc<WallClock>,
    state: RefCell<State<M, H::Wakeup>>,
}

struct State<M: StateMachine, W> {
    controller: Controller<M>,
    pending: Option<W>,
}

/// Runs a controller in real time on a host event loop.
///
/// Cheap to clone; clones drive the same controller. Must be used from the
/// host loop's thread. Other threads go through the host loop's own
/// cross-thread mechanism, see [`crate::RemoteInjector`] for tokio.
pub struct EventLoopRealtime<M: StateMachine, H: HostLoop> {
    shared: Rc<Shared<M, H>>,
}

impl<M: StateMachine, H: HostLoop> Clone for EventLoopRealtime<M, H> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<M, H> EventLoopRealtime<M, H>
where
    M: StateMachine + 'static,
    H: HostLoop + 'static,
{
    pub fn new(controller: Controller<M>, host: H, clock: Arc<WallClock>) -> Self {
        Self {
            shared: Rc::new(Shared {
                host,
                clock,
                state: RefCell::new(State {
                    controller,
                    pending: None,
                }),
            }),
        }
    }

    /// Enter the controller, record the wall-clock origin and wake up.
    pub fn start(&self) {
        self.shared.state.borrow_mut().controller.enter();
        self.shared.clock.record_start_time();
        debug!(time_scale = self.shared.clock.scale(), "Event-loop run started");
        self.poke();
    }

    /// Replace the pending wake-up with one that runs as soon as possible.
    pub fn poke(&self) {
        let mut state = self.shared.state.borrow_mut();
        if let Some(old) = state.pending.take() {
            self.shared.host.cancel(old);
        }
        let callback = wake_callback(Rc::downgrade(&self.shared));
        state.pending = Some(self.shared.host.call_soon(callback));
    }

    /// Drain to now, raise `input` at now, then re-arm the wake-up.
    ///
    /// Not callable from inside an output subscriber; subscribers schedule
    /// through the [`Scheduler`](cranesim_simulation::Scheduler) they get.
    pub fn add_input_now(&self, input: M::Input) {
        {
            let mut state = self.shared.state.borrow_mut();
            let now = self.shared.clock.now();
            state.controller.run_until(now);
            state.controller.add_input(now, input);
            state.controller.run_until(now);
        }
        self.shared.rearm();
    }

    /// Borrow the controller, e.g. to read its trace.
    pub fn with_controller<R>(&self, f: impl FnOnce(&mut Controller<M>) -> R) -> R {
        f(&mut self.shared.state.borrow_mut().controller)
    }

    /// Check if a wake-up is registered with the host loop.
    pub fn has_pending_wakeup(&self) -> bool {
        self.shared.state.borrow().pending.is_some()
    }
}

fn wake_callback<M, H>(shared: Weak<Shared<M, H>>) -> HostCallback
where
    M: StateMachine + 'static,
    H: HostLoop + 'static,
{
    Box::new(move || {
        // The runner was dropped; nothing left to drive
        let Some(shared) = shared.upgrade() else {
            return;
        };
        shared.wake();
    })
}

impl<M, H> Shared<M, H>
where
    M: StateMachine + 'static,
    H: HostLoop + 'static,
{
    fn wake(self: &Rc<Self>) {
        {
            let mut state = self.state.borrow_mut();
            // This wake-up is the pending one, and it has now run
            state.pending = None;
            let now = self.clock.now();
            trace!(time = %now, "Host loop wake-up");
            state.controller.run_until(now);
        }
        self.rearm();
    }

    /// Register a wake-up for the earliest pending entry, replacing any
    /// registered one.
    fn rearm(self: &Rc<Self>) {
        let mut state = self.state.borrow_mut();
        if let Some(old) = state.pending.take() {
            self.host.cancel(old);
        }
        let Some(next) = state.controller.earliest() else {
            trace!("Queue empty, no wake-up registered");
            return;
        };
        let Some(deadline) = self.clock.to_wall(next) else {
            debug!(time = %next, "Next entry unreachable, no wake-up registered");
            return;
        };
        let callback = wake_callback(Rc::downgrade(self));
        state.pending = Some(self.host.call_at(deadline, callback));
    }
}
