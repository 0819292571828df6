//! [`HostLoop`] over a tokio `LocalSet`.
//!
//! Wake-ups are local tasks sleeping until their deadline; canceling one
//! aborts its task. Everything must run inside a `LocalSet`.

use crate::event_loop::{EventLoopRealtime, HostCallback, HostLoop};
use cranesim_core::StateMachine;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio::task::{self, JoinHandle};
use tracing::debug;

/// Host loop backed by `tokio::task::spawn_local`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioHostLoop;

impl HostLoop for TokioHostLoop {
    type Wakeup = JoinHandle<()>;

    fn call_at(&self, deadline: Instant, callback: HostCallback) -> JoinHandle<()> {
        task::spawn_local(async move {
            tokio::time::sleep_until(tokio::time::Instant::from_std(deadline)).await;
            callback();
        })
    }

    fn call_soon(&self, callback: HostCallback) -> JoinHandle<()> {
        task::spawn_local(async move { callback() })
    }

    fn cancel(&self, wakeup: JoinHandle<()>) {
        wakeup.abort();
    }
}

/// Injects inputs into an [`EventLoopRealtime`] from any thread.
///
/// Inputs travel over an unbounded channel to a local forwarding task that
/// calls `add_input_now` on the loop's thread.
pub struct RemoteInjector<I> {
    sender: mpsc::UnboundedSender<I>,
}

impl<I> Clone for RemoteInjector<I> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<I> RemoteInjector<I> {
    /// Raise `input` at the loop's current virtual time.
    ///
    /// Returns `false` if the loop is gone.
    pub fn add_input_now(&self, input: I) -> bool {
        self.sender.send(input).is_ok()
    }
}

impl<M: StateMachine + 'static> EventLoopRealtime<M, TokioHostLoop> {
    /// Create a cross-thread injector. Must be called inside a `LocalSet`.
    ///
    /// The forwarding task ends once every injector is dropped.
    pub fn remote_injector(&self) -> RemoteInjector<M::Input> {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let sim = self.clone();
        task::spawn_local(async move {
            while let Some(input) = receiver.recv().await {
                sim.add_input_now(input);
            }
            debug!("All remote injectors dropped");
        });
        RemoteInjector { sender }
    }
}
