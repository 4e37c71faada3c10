//! Simulation events and their total order.

use shadow_env::{NodeId, SimulationTime, VertexId};
use std::cmp::Ordering;

/// A packet in flight between two nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub source: NodeId,

    /// Vertex the sender is attached to (for replies)
    pub source_vertex: VertexId,

    pub destination: NodeId,

    /// Sender-local packet number
    pub number: u64,

    /// The receiver should answer with one reply
    pub wants_echo: bool,
}

/// What an event does when it fires.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Boots the application at this index on the node
    StartApplication { app: usize },

    /// Application timer: send the next packet
    SendTick { app: usize },

    /// A packet reaches its destination node
    PacketArrival(Packet),
}

/// A timestamped event targeted at one node.
///
/// Events are ordered by `(time, source, sequence)`. The key is unique
/// (every node numbers the events it creates) and does not depend on which
/// thread produced the event, so every execution mode sees the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub time: SimulationTime,

    /// Node that created the event
    pub source: NodeId,

    /// Creation number, local to `source`
    pub sequence: u64,

    /// Node whose queue executes the event
    pub target: NodeId,

    pub kind: EventKind,
}

impl Event {
    /// Returns the ordering key.
    pub fn key(&self) -> (SimulationTime, NodeId, u64) {
        (self.time, self.source, self.sequence)
    }

    /// Returns true if the event crosses from one node to another.
    pub fn is_remote(&self) -> bool {
        self.source != self.target
    }
}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}
