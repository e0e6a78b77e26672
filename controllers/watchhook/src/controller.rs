//! Main controller implementation.
//!
//! This module contains the `Controller` struct that owns the dispatch
//! pipeline: one task consuming the watch stream into a bounded hand-off
//! queue, one worker running the hook for each queued event, and the
//! control path that reacts to the first terminal condition (watch ended,
//! worker failed, or interrupt) and drains the queue before returning.

use crate::dispatcher::dispatch_events;
use crate::error::ControllerError;
use crate::hook::Hook;
use crate::watcher::forward_events;
use cluster_client::{ResourceWatcher, WatchTarget};
use std::future::Future;
use std::io;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::JoinError;
use tracing::{info, warn};

/// Capacity of the hand-off queue between the watch stream and the worker.
pub const QUEUE_CAPACITY: usize = 100;

/// Lifecycle of the dispatch pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    /// Events are being read and dispatched
    Running,
    /// No new events are accepted; the worker empties the queue
    Draining,
    /// The worker has returned
    Stopped,
}

/// Why the pipeline stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Shutdown was requested by a signal
    Interrupted,
    /// The single watched object was deleted
    ObjectDeleted,
    /// The worker closed the queue; its own result decides the outcome
    WorkerStopped,
}

/// Watch-to-command dispatch pipeline for one target.
pub struct Controller<W, H: ?Sized> {
    watcher: W,
    hook: Arc<H>,
    target: WatchTarget,
    state: watch::Sender<PipelineState>,
}

/// The first thing to happen once the pipeline is running.
enum FirstExit {
    Producer(Result<Result<Termination, ControllerError>, JoinError>),
    Worker(Result<Result<usize, ControllerError>, JoinError>),
    Interrupted,
}

impl<W, H> Controller<W, H>
where
    W: ResourceWatcher,
    H: Hook + ?Sized + 'static,
{
    /// Creates a new controller instance.
    pub fn new(watcher: W, hook: Arc<H>, target: WatchTarget) -> Self {
        let (state, _) = watch::channel(PipelineState::Running);
        Self {
            watcher,
            hook,
            target,
            state,
        }
    }

    /// Observes state transitions.
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// Runs the pipeline until a terminal condition, then drains the queue.
    ///
    /// `shutdown` resolving is treated like a graceful end of the watch:
    /// queued events are still dispatched, nothing new is accepted, and an
    /// in-flight hook is left to finish.
    pub async fn run<S>(self, shutdown: S) -> Result<Termination, ControllerError>
    where
        S: Future<Output = ()>,
    {
        let events = self.watcher.watch(self.target.name.as_deref()).await?;
        info!(
            "Watching {} in namespace {}{}",
            self.target.resource_ref,
            self.target.namespace,
            self.target
                .name
                .as_deref()
                .map(|name| format!(" (object {name})"))
                .unwrap_or_default()
        );

        let (queue_tx, queue_rx) = mpsc::channel(QUEUE_CAPACITY);
        let (stop_tx, stop_rx) = oneshot::channel();

        let mut worker = tokio::spawn(dispatch_events(queue_rx, self.hook.clone()));
        let mut producer = tokio::spawn(forward_events(
            events,
            queue_tx,
            self.target.is_single_object(),
            stop_rx,
        ));

        tokio::pin!(shutdown);
        let first = tokio::select! {
            res = &mut producer => FirstExit::Producer(res),
            res = &mut worker => FirstExit::Worker(res),
            () = &mut shutdown => FirstExit::Interrupted,
        };

        let (produced, worker_result) = match first {
            FirstExit::Producer(produced) => {
                self.set_state(PipelineState::Draining);
                (produced, worker.await)
            }
            FirstExit::Worker(worker_result) => {
                let _ = stop_tx.send(());
                let produced = producer.await;
                self.set_state(PipelineState::Draining);
                (produced, worker_result)
            }
            FirstExit::Interrupted => {
                info!("Interrupted, draining queued events");
                let _ = stop_tx.send(());
                let produced = producer.await;
                self.set_state(PipelineState::Draining);
                (produced, worker.await)
            }
        };
        self.set_state(PipelineState::Stopped);

        let dispatched = worker_result??;
        let termination = produced?.inspect_err(|e| warn!("Watch ended: {}", e))?;

        info!("Stopped after {} events ({:?})", dispatched, termination);
        Ok(termination)
    }

    fn set_state(&self, state: PipelineState) {
        self.state.send_replace(state);
    }
}

/// Installs the SIGINT and SIGTERM listeners and returns a future that
/// resolves on the first of them.
///
/// Signals arriving between this call and the first poll are not lost, so
/// the listeners can be set up before any cluster access.
#[cfg(unix)]
pub fn shutdown_signal() -> io::Result<impl Future<Output = ()>> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut interrupt = signal(SignalKind::interrupt())?;
    let mut terminate = signal(SignalKind::terminate())?;
    Ok(async move {
        tokio::select! {
            _ = interrupt.recv() => info!("Received SIGINT"),
            _ = terminate.recv() => info!("Received SIGTERM"),
        }
    })
}

/// Installs the Ctrl-C listener and returns a future that resolves on it.
#[cfg(not(unix))]
pub fn shutdown_signal() -> io::Result<impl Future<Output = ()>> {
    let mut ctrl_c = tokio::signal::windows::ctrl_c()?;
    Ok(async move {
        ctrl_c.recv().await;
        info!("Received Ctrl-C");
    })
}
