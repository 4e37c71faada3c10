//! Simulated nodes and their event queues.
//!
//! A node owns a min-heap of pending events and a private random stream.
//! Workers call [`Node::process_until`] with the current window bound; any
//! packet the node sends to another node is handed back through an outbox
//! instead of being pushed into the destination queue directly, which is
//! what lets the coordinator hold cross-node traffic until the window closes.

use crate::event::{Event, EventKind, Packet};
use crate::random::Random;
use crate::topology::Topology;
use serde::{Deserialize, Serialize};
use shadow_env::{NodeId, SimulationTime, VertexId};
use std::cmp::Reverse;
use std::collections::hash_map::DefaultHasher;
use std::collections::BinaryHeap;
use std::hash::{Hash, Hasher};
use tracing::trace;

/// Built-in traffic generator attached to a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Application {
    /// Node receiving the traffic
    pub peer: NodeId,

    /// Vertex the peer is attached to
    pub peer_vertex: VertexId,

    /// When the first packet goes out
    pub start_time: SimulationTime,

    /// Total packets to send
    pub packets: u64,

    /// Gap between consecutive packets
    pub interval: SimulationTime,

    /// Ask the peer to reply to every packet
    pub echo: bool,
}

/// Per-node counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeStats {
    pub events_processed: u64,
    pub packets_sent: u64,
    pub packets_received: u64,
    pub echoes_sent: u64,

    /// Lost to path reliability
    pub packets_dropped: u64,

    /// No path between the two vertices
    pub packets_unroutable: u64,
}

/// Final state of a node after a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeReport {
    pub id: NodeId,
    pub name: String,
    pub vertex: VertexId,

    /// Time of the last executed event
    pub clock: SimulationTime,

    pub stats: NodeStats,

    /// Hash over the keys of every executed event, in execution order
    pub history_digest: u64,
}

#[derive(Debug, Clone)]
struct AppState {
    app: Application,
    sent: u64,
}

/// A simulated host.
#[derive(Debug, Clone)]
pub struct Node {
    id: NodeId,
    name: String,
    vertex: VertexId,
    random: Random,
    queue: BinaryHeap<Reverse<Event>>,
    applications: Vec<AppState>,
    next_sequence: u64,
    clock: SimulationTime,
    stats: NodeStats,
    history: DefaultHasher,
}

impl Node {
    /// Creates a node attached to `vertex`.
    ///
    /// The node's random stream is derived from the pool seed and the node
    /// id only, so it does not depend on which worker runs the node.
    pub fn new(id: NodeId, name: impl Into<String>, vertex: VertexId, pool_seed: u64) -> Self {
        Self {
            id,
            name: name.into(),
            vertex,
            random: Random::derive(pool_seed, u64::from(id.0)),
            queue: BinaryHeap::new(),
            applications: Vec::new(),
            next_sequence: 0,
            clock: 0,
            stats: NodeStats::default(),
            history: DefaultHasher::new(),
        }
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertex(&self) -> VertexId {
        self.vertex
    }

    /// Time of the last executed event.
    pub fn clock(&self) -> SimulationTime {
        self.clock
    }

    pub fn stats(&self) -> &NodeStats {
        &self.stats
    }

    /// Attaches an application and schedules its start event.
    pub fn add_application(&mut self, app: Application) -> usize {
        let index = self.applications.len();
        let start = app.start_time;
        self.applications.push(AppState { app, sent: 0 });

        let event = self.create_event(start, self.id, EventKind::StartApplication { app: index });
        self.queue.push(Reverse(event));
        index
    }

    /// Queues an event created by another node.
    ///
    /// Returns false if the event is timestamped before this node's clock,
    /// i.e. it arrived too late to be executed in order.
    pub fn push_event(&mut self, event: Event) -> bool {
        let in_order = event.time >= self.clock;
        self.queue.push(Reverse(event));
        in_order
    }

    /// Returns the ordering key of the next pending event.
    pub fn peek_key(&self) -> Option<(SimulationTime, NodeId, u64)> {
        self.queue.peek().map(|Reverse(event)| event.key())
    }

    /// Returns the time of the next pending event.
    pub fn next_event_time(&self) -> Option<SimulationTime> {
        self.queue.peek().map(|Reverse(event)| event.time)
    }

    pub fn pending_events(&self) -> usize {
        self.queue.len()
    }

    /// Executes the next event if it is due strictly before `until`.
    ///
    /// Packets for other nodes are appended to `outbox`.
    pub fn step(
        &mut self,
        until: SimulationTime,
        topology: &Topology,
        outbox: &mut Vec<Event>,
    ) -> bool {
        match self.queue.peek() {
            Some(Reverse(event)) if event.time < until => {}
            _ => return false,
        }
        let Some(Reverse(event)) = self.queue.pop() else {
            return false;
        };

        self.clock = event.time;
        self.stats.events_processed += 1;
        event.key().hash(&mut self.history);

        match event.kind {
            EventKind::StartApplication { app } | EventKind::SendTick { app } => {
                self.send_next(app, topology, outbox);
            }
            EventKind::PacketArrival(packet) => {
                self.stats.packets_received += 1;
                trace!(
                    node = %self.id,
                    from = %packet.source,
                    number = packet.number,
                    "packet arrived"
                );

                if packet.wants_echo {
                    let reply = Packet {
                        source: self.id,
                        source_vertex: self.vertex,
                        destination: packet.source,
                        number: packet.number,
                        wants_echo: false,
                    };
                    if self.transmit(reply, packet.source_vertex, topology, outbox) {
                        self.stats.echoes_sent += 1;
                    }
                }
            }
        }

        true
    }

    /// Executes every event due strictly before `until`.
    ///
    /// Returns the number of events executed.
    pub fn process_until(
        &mut self,
        until: SimulationTime,
        topology: &Topology,
        outbox: &mut Vec<Event>,
    ) -> u64 {
        let mut processed = 0;
        while self.step(until, topology, outbox) {
            processed += 1;
        }
        processed
    }

    /// Captures the node's final state.
    pub fn report(&self) -> NodeReport {
        NodeReport {
            id: self.id,
            name: self.name.clone(),
            vertex: self.vertex,
            clock: self.clock,
            stats: self.stats.clone(),
            history_digest: self.history.finish(),
        }
    }

    fn send_next(&mut self, index: usize, topology: &Topology, outbox: &mut Vec<Event>) {
        let Some(state) = self.applications.get_mut(index) else {
            return;
        };
        if state.sent >= state.app.packets {
            return;
        }

        state.sent += 1;
        let packet = Packet {
            source: self.id,
            source_vertex: self.vertex,
            destination: state.app.peer,
            number: state.sent,
            wants_echo: state.app.echo,
        };
        let peer_vertex = state.app.peer_vertex;
        let more = state.sent < state.app.packets;
        let interval = state.app.interval;

        self.transmit(packet, peer_vertex, topology, outbox);

        if more {
            let tick = self.create_event(
                self.clock.saturating_add(interval),
                self.id,
                EventKind::SendTick { app: index },
            );
            self.queue.push(Reverse(tick));
        }
    }

    /// Routes a packet over the path to `destination_vertex`.
    ///
    /// Returns true if the packet was put on the wire (not dropped).
    fn transmit(
        &mut self,
        packet: Packet,
        destination_vertex: VertexId,
        topology: &Topology,
        outbox: &mut Vec<Event>,
    ) -> bool {
        let Some(path) = topology.path(self.vertex, destination_vertex) else {
            self.stats.packets_unroutable += 1;
            trace!(node = %self.id, to = destination_vertex, "no path, packet discarded");
            return false;
        };

        path.increment_packet_count();
        if self.random.next_double() >= path.reliability() {
            self.stats.packets_dropped += 1;
            return false;
        }

        self.stats.packets_sent += 1;
        let target = packet.destination;
        let arrival = self.clock.saturating_add(path.latency_simtime());
        let event = self.create_event(arrival, target, EventKind::PacketArrival(packet));

        if event.is_remote() {
            outbox.push(event);
        } else {
            self.queue.push(Reverse(event));
        }
        true
    }

    fn create_event(&mut self, time: SimulationTime, target: NodeId, kind: EventKind) -> Event {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        Event {
            time,
            source: self.id,
            sequence,
            target,
            kind,
        }
    }
}
