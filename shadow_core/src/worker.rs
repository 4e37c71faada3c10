//! Worker threads for parallel mode.
//!
//! Each worker exclusively owns a disjoint set of nodes. The coordinator
//! drives it one window at a time:
//!
//! ```text
//! Coordinator                               Worker
//!     |-- RunWindow(start, until, inbound) --->|  queue inbound, run nodes < until
//!     |<---------------------- WindowOutcome --|  outbound packets, next event time
//!     |      (wait for every worker)           |
//!     |-- RunWindow(...) --------------------->|
//!     |-- Finish ----------------------------->|  hand nodes back on join
//! ```
//!
//! A panic while running a window is caught on the worker and reported as
//! a failed outcome, so the coordinator never waits on a dead worker.

use crate::event::Event;
use crate::node::Node;
use crate::topology::Topology;
use crossbeam::channel::{self, Receiver, Sender};
use shadow_env::{NodeId, SimulationTime};
use std::any::Any;
use std::collections::HashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{error, trace, warn};

/// Instruction from the coordinator.
#[derive(Debug)]
pub(crate) enum WorkerCommand {
    /// Deliver `inbound`, then run every owned node up to `until` (exclusive)
    RunWindow {
        start: SimulationTime,
        until: SimulationTime,
        inbound: Vec<Event>,
    },

    /// Stop and return the owned nodes
    Finish,
}

/// What a worker tells the coordinator when it reaches the barrier.
#[derive(Debug)]
pub(crate) struct WindowReport {
    pub worker: usize,

    /// Packets for nodes owned by any worker, held until the window closes
    pub outbound: Vec<Event>,

    /// Earliest pending event over the worker's nodes
    pub next_event_time: Option<SimulationTime>,

    pub processed: u64,

    /// Inbound events timestamped before the window they were delivered in
    pub late_events: u64,
}

/// A finished window, or why the worker stopped.
pub(crate) type WindowOutcome = Result<WindowReport, String>;

/// The per-window work a worker thread executes.
pub(crate) trait WindowRunner: Send + 'static {
    /// Delivers `inbound`, then executes everything due before `until`.
    fn run_window(
        &mut self,
        worker: usize,
        start: SimulationTime,
        until: SimulationTime,
        inbound: Vec<Event>,
    ) -> WindowReport;

    /// Gives the owned nodes back.
    fn into_nodes(self) -> Vec<Node>;
}

/// The nodes owned by one worker.
pub(crate) struct NodeSet {
    nodes: Vec<Node>,
    slots: HashMap<NodeId, usize>,
    topology: Arc<Topology>,
}

impl NodeSet {
    pub fn new(nodes: Vec<Node>, topology: Arc<Topology>) -> Self {
        let slots = nodes
            .iter()
            .enumerate()
            .map(|(slot, node)| (node.id(), slot))
            .collect();
        Self {
            nodes,
            slots,
            topology,
        }
    }
}

impl WindowRunner for NodeSet {
    fn run_window(
        &mut self,
        worker: usize,
        start: SimulationTime,
        until: SimulationTime,
        inbound: Vec<Event>,
    ) -> WindowReport {
        let mut late_events = 0;
        for event in inbound {
            let Some(&slot) = self.slots.get(&event.target) else {
                warn!(worker, node = %event.target, "event for a node this worker does not own");
                continue;
            };
            let time = event.time;
            let behind_clock = !self.nodes[slot].push_event(event);
            if behind_clock || time < start {
                late_events += 1;
            }
        }
        if late_events > 0 {
            warn!(
                worker,
                late_events, "events arrived after their window; run-ahead exceeds path latency"
            );
        }

        let mut outbound = Vec::new();
        let mut processed = 0;
        for node in self.nodes.iter_mut() {
            processed += node.process_until(until, &self.topology, &mut outbound);
        }
        let next_event_time = self.nodes.iter().filter_map(Node::next_event_time).min();

        trace!(
            worker,
            processed,
            outbound = outbound.len(),
            pending = self.nodes.iter().map(Node::pending_events).sum::<usize>(),
            "window done"
        );

        WindowReport {
            worker,
            outbound,
            next_event_time,
            processed,
            late_events,
        }
    }

    fn into_nodes(self) -> Vec<Node> {
        self.nodes
    }
}

/// A worker that could not be started, with the runner it was given.
pub(crate) struct SpawnError<S> {
    pub reason: String,
    pub runner: S,
}

/// Coordinator-side handle to a worker thread.
pub(crate) struct WorkerHandle {
    index: usize,
    commands: Sender<WorkerCommand>,
    thread: JoinHandle<Vec<Node>>,
}

impl WorkerHandle {
    /// Starts a worker executing `runner`.
    ///
    /// The runner is handed over only once the thread exists, so a failed
    /// spawn gives it back untouched.
    pub fn spawn<S: WindowRunner>(
        index: usize,
        runner: S,
        reports: Sender<WindowOutcome>,
    ) -> Result<Self, SpawnError<S>> {
        let (commands, inbox) = channel::unbounded();
        let (handoff, adopt) = channel::bounded::<S>(1);

        let spawned = std::thread::Builder::new()
            .name(format!("shadow-worker-{}", index))
            .spawn(move || match adopt.recv() {
                Ok(runner) => worker_loop(index, runner, inbox, reports),
                Err(_) => Vec::new(),
            });
        let thread = match spawned {
            Ok(thread) => thread,
            Err(e) => {
                return Err(SpawnError {
                    reason: format!("failed to spawn worker {}: {}", index, e),
                    runner,
                })
            }
        };

        if let Err(channel::SendError(runner)) = handoff.send(runner) {
            let _ = thread.join();
            return Err(SpawnError {
                reason: format!("worker {} exited before starting", index),
                runner,
            });
        }

        Ok(Self {
            index,
            commands,
            thread,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Sends the next window. Fails if the worker thread is gone.
    pub fn run_window(
        &self,
        start: SimulationTime,
        until: SimulationTime,
        inbound: Vec<Event>,
    ) -> Result<(), String> {
        self.commands
            .send(WorkerCommand::RunWindow {
                start,
                until,
                inbound,
            })
            .map_err(|_| format!("worker {} stopped accepting windows", self.index))
    }

    /// Stops the worker and takes its nodes back.
    pub fn finish(self) -> Result<Vec<Node>, String> {
        // A worker that already exited is fine; join reports panics
        let _ = self.commands.send(WorkerCommand::Finish);
        self.thread
            .join()
            .map_err(|_| format!("worker {} panicked", self.index))
    }
}

fn worker_loop<S: WindowRunner>(
    index: usize,
    mut runner: S,
    inbox: Receiver<WorkerCommand>,
    reports: Sender<WindowOutcome>,
) -> Vec<Node> {
    while let Ok(command) = inbox.recv() {
        let (start, until, inbound) = match command {
            WorkerCommand::RunWindow {
                start,
                until,
                inbound,
            } => (start, until, inbound),
            WorkerCommand::Finish => break,
        };

        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            runner.run_window(index, start, until, inbound)
        }))
        .map_err(|payload| {
            let reason = format!("worker {} panicked: {}", index, panic_message(payload.as_ref()));
            error!("{}", reason);
            reason
        });

        // A failed worker stops taking windows but still hands its nodes back
        let failed = outcome.is_err();
        if reports.send(outcome).is_err() || failed {
            break;
        }
    }

    runner.into_nodes()
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        *msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.as_str()
    } else {
        "unknown panic"
    }
}
