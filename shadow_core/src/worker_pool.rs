//! Worker-pool coordinator.
//!
//! The pool is the setup target for bootstrapping actions (networks, paths,
//! nodes, applications) and then executes the simulation in one of two
//! modes on the master's behalf:
//!
//! - **Serial**: the calling thread runs every event in global timestamp
//!   order inside a single unbounded window.
//! - **Parallel**: nodes are split over worker threads; each window runs to
//!   a full barrier, cross-node packets are held until the barrier, and the
//!   window is advanced only through [`Master::advance_window`].

use crate::error::{MasterError, SetupError, TopologyError};
use crate::event::Event;
use crate::master::Master;
use crate::node::{Application, Node};
use crate::path::Path;
use crate::report::{PathReport, RunMode, RunReport};
use crate::topology::Topology;
use crate::worker::{NodeSet, WindowOutcome, WindowRunner, WorkerHandle};
use crossbeam::channel::{self, Receiver};
use shadow_env::{NodeId, SimulationTime, VertexId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Application parameters as given by a setup action.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationSpec {
    /// Name of the node receiving the traffic
    pub peer: String,
    pub start_time: SimulationTime,
    pub packets: u64,
    pub interval: SimulationTime,
    pub echo: bool,
}

#[derive(Debug, Default)]
struct WindowStats {
    windows: u64,
    events_processed: u64,
    late_events: u64,
}

/// Owns the nodes and topology of a run and schedules their execution.
pub struct WorkerPool {
    seed: u64,
    topology: Topology,

    /// Indexed by `NodeId`
    nodes: Vec<Node>,

    names: HashMap<String, NodeId>,
    kill_time: Option<SimulationTime>,
}

impl WorkerPool {
    /// Creates an empty pool. `seed` roots every node's random stream.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            topology: Topology::new(),
            nodes: Vec::new(),
            names: HashMap::new(),
            kill_time: None,
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.names.get(name).copied()
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.index())
    }

    /// Kill time requested by the scenario, if any.
    pub fn kill_time(&self) -> Option<SimulationTime> {
        self.kill_time
    }

    /// Adds a virtual network. Returns false if it already existed.
    pub fn create_network(&mut self, id: VertexId) -> bool {
        self.topology.add_vertex(id)
    }

    /// Adds a directed path between two existing networks.
    pub fn connect(
        &mut self,
        src: VertexId,
        dst: VertexId,
        latency_ms: f64,
        reliability: f64,
    ) -> Result<Arc<Path>, SetupError> {
        let path = Path::new(src, dst, latency_ms, reliability)?;
        Ok(self.topology.connect(path)?)
    }

    /// Creates a node attached to `network`.
    pub fn create_node(&mut self, name: &str, network: VertexId) -> Result<NodeId, SetupError> {
        if !self.topology.contains_vertex(network) {
            return Err(TopologyError::UnknownVertex(network).into());
        }
        if self.names.contains_key(name) {
            return Err(SetupError::DuplicateNode(name.to_string()));
        }

        let id = next_node_id(self.nodes.len())?;
        self.nodes.push(Node::new(id, name, network, self.seed));
        self.names.insert(name.to_string(), id);
        debug!(%id, name, network, "created node");
        Ok(id)
    }

    /// Attaches an application to the named node and schedules its start.
    pub fn create_application(
        &mut self,
        node: &str,
        spec: ApplicationSpec,
    ) -> Result<usize, SetupError> {
        let host = self
            .node_id(node)
            .ok_or_else(|| SetupError::UnknownNode(node.to_string()))?;
        let peer = self
            .node_id(&spec.peer)
            .ok_or_else(|| SetupError::UnknownNode(spec.peer.clone()))?;
        let peer_vertex = self.nodes[peer.index()].vertex();

        let app = Application {
            peer,
            peer_vertex,
            start_time: spec.start_time,
            packets: spec.packets,
            interval: spec.interval,
            echo: spec.echo,
        };
        Ok(self.nodes[host.index()].add_application(app))
    }

    /// Records the scenario's end time.
    pub fn set_kill_time(&mut self, time: SimulationTime) {
        self.kill_time = Some(time);
    }

    /// Runs every event on the calling thread in global timestamp order.
    ///
    /// Cross-node packets go straight into the destination queue; with a
    /// single executor there is nothing to race against. The shutdown flag
    /// is checked between events.
    pub fn run_serial(&mut self, master: &mut Master) -> Result<RunReport, MasterError> {
        let mut stats = WindowStats {
            windows: 1,
            ..Default::default()
        };
        let mut outbox: Vec<Event> = Vec::new();

        loop {
            if master.poll_shutdown() {
                break;
            }
            let until = master.execute_window_end().min(master.end_time());

            let next = self
                .nodes
                .iter()
                .enumerate()
                .filter_map(|(slot, node)| node.peek_key().map(|key| (key, slot)))
                .min();
            let Some(((time, _, _), slot)) = next else {
                break;
            };
            if time >= until {
                break;
            }

            self.nodes[slot].step(until, &self.topology, &mut outbox);
            stats.events_processed += 1;

            for event in outbox.drain(..) {
                let target = event.target;
                match self.nodes.get_mut(target.index()) {
                    Some(node) => {
                        if !node.push_event(event) {
                            stats.late_events += 1;
                        }
                    }
                    None => warn!(node = %target, "packet for unknown node discarded"),
                }
            }
        }

        Ok(self.report(RunMode::Serial, master.end_time(), stats))
    }

    /// Runs the simulation on `master.config().workers` threads.
    ///
    /// The master's window must already be set to `[0, min_time_jump)`.
    /// Nodes and topology are back in the pool when this returns, whether
    /// the run succeeded or not.
    pub fn run_parallel(&mut self, master: &mut Master) -> Result<RunReport, MasterError> {
        self.run_parallel_with(master, |_, nodes, topology| NodeSet::new(nodes, topology))
    }

    fn run_parallel_with<S, F>(
        &mut self,
        master: &mut Master,
        mut make_runner: F,
    ) -> Result<RunReport, MasterError>
    where
        S: WindowRunner,
        F: FnMut(usize, Vec<Node>, Arc<Topology>) -> S,
    {
        let worker_count = master.config().workers.max(1);
        let topology = Arc::new(std::mem::take(&mut self.topology));
        let (report_tx, report_rx) = channel::unbounded();

        let mut buckets: Vec<Vec<Node>> = (0..worker_count).map(|_| Vec::new()).collect();
        for node in self.nodes.drain(..) {
            buckets[node.id().index() % worker_count].push(node);
        }

        let mut workers = Vec::with_capacity(worker_count);
        let mut reclaimed: Vec<Node> = Vec::with_capacity(self.names.len());
        let mut spawn_error = None;
        for (index, nodes) in buckets.into_iter().enumerate() {
            if spawn_error.is_some() {
                reclaimed.extend(nodes);
                continue;
            }
            let runner = make_runner(index, nodes, Arc::clone(&topology));
            match WorkerHandle::spawn(index, runner, report_tx.clone()) {
                Ok(handle) => workers.push(handle),
                Err(failure) => {
                    error!("{}", failure.reason);
                    reclaimed.extend(failure.runner.into_nodes());
                    spawn_error = Some(MasterError::Worker(failure.reason));
                }
            }
        }
        drop(report_tx);

        let outcome = match spawn_error {
            Some(err) => Err(err),
            None => {
                info!("started {} worker threads", workers.len());
                drive_windows(master, &workers, &report_rx)
            }
        };

        let mut join_error = None;
        for handle in workers {
            let index = handle.index();
            match handle.finish() {
                Ok(owned) => {
                    debug!(worker = index, nodes = owned.len(), "worker joined");
                    reclaimed.extend(owned);
                }
                Err(reason) => {
                    error!("{}", reason);
                    join_error = Some(MasterError::Worker(reason));
                }
            }
        }
        reclaimed.sort_by_key(Node::id);
        self.nodes = reclaimed;
        self.topology = Arc::try_unwrap(topology).unwrap_or_else(|shared| (*shared).clone());

        let stats = outcome?;
        if let Some(err) = join_error {
            return Err(err);
        }
        Ok(self.report(
            RunMode::Parallel {
                workers: worker_count,
            },
            master.end_time(),
            stats,
        ))
    }

    fn report(&self, mode: RunMode, end_time: SimulationTime, stats: WindowStats) -> RunReport {
        RunReport {
            mode,
            windows: stats.windows,
            events_processed: stats.events_processed,
            late_events: stats.late_events,
            end_time,
            nodes: self.nodes.iter().map(Node::report).collect(),
            paths: self
                .topology
                .paths()
                .map(|path| PathReport {
                    src: path.src_vertex_index(),
                    dst: path.dst_vertex_index(),
                    latency_ms: path.latency(),
                    reliability: path.reliability(),
                    packet_count: path.packet_count(),
                })
                .collect(),
        }
    }
}

/// Runs windows until no event is left before the end time or the master
/// is killed.
fn drive_windows(
    master: &mut Master,
    workers: &[WorkerHandle],
    reports: &Receiver<WindowOutcome>,
) -> Result<WindowStats, MasterError> {
    let worker_count = workers.len();
    let mut pending: Vec<Vec<Event>> = (0..worker_count).map(|_| Vec::new()).collect();
    let mut stats = WindowStats::default();

    loop {
        let until = master.execute_window_end().min(master.end_time());
        debug!(
            start = master.execute_window_start(),
            end = until,
            "running window"
        );

        for (worker, inbound) in workers.iter().zip(pending.iter_mut()) {
            worker
                .run_window(master.execute_window_start(), until, std::mem::take(inbound))
                .map_err(MasterError::Worker)?;
        }

        // Barrier: nothing moves on until every worker has reported
        let mut next_event: Option<SimulationTime> = None;
        for _ in 0..worker_count {
            let report = reports
                .recv()
                .map_err(|_| MasterError::Worker("worker exited before reporting".to_string()))?
                .map_err(MasterError::Worker)?;

            trace!(
                worker = report.worker,
                processed = report.processed,
                "worker reached barrier"
            );
            stats.events_processed += report.processed;
            stats.late_events += report.late_events;
            next_event = earliest(next_event, report.next_event_time);

            for event in report.outbound {
                next_event = earliest(next_event, Some(event.time));
                pending[event.target.index() % worker_count].push(event);
            }
        }
        stats.windows += 1;

        if master.poll_shutdown() {
            break;
        }
        match next_event {
            Some(time) if time < master.end_time() => {}
            _ => break,
        }
        master.advance_window()?;
    }

    Ok(stats)
}

fn next_node_id(count: usize) -> Result<NodeId, SetupError> {
    u32::try_from(count)
        .map(NodeId)
        .map_err(|_| SetupError::TooManyNodes(count))
}

fn earliest(a: Option<SimulationTime>, b: Option<SimulationTime>) -> Option<SimulationTime> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}
