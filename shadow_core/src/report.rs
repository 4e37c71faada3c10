//! Run summaries.

use crate::node::NodeReport;
use serde::{Deserialize, Serialize};
use shadow_env::{SimulationTime, VertexId};

/// Concurrency mode a run executed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum RunMode {
    Serial,
    Parallel { workers: usize },
}

/// Final traffic count of one topology edge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathReport {
    pub src: VertexId,
    pub dst: VertexId,
    pub latency_ms: f64,
    pub reliability: f64,
    pub packet_count: u64,
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub mode: RunMode,

    /// Execution windows scheduled (1 in serial mode)
    pub windows: u64,

    pub events_processed: u64,

    /// Cross-node events delivered after the window their timestamp falls in
    pub late_events: u64,

    /// Simulation time the run was bounded by
    pub end_time: SimulationTime,

    /// Per-node final state, ordered by node id
    pub nodes: Vec<NodeReport>,

    /// Per-path counters, ordered by (src, dst)
    pub paths: Vec<PathReport>,
}

impl RunReport {
    /// Returns true if both runs ended in the same simulated state.
    ///
    /// Ignores how the run was scheduled (mode, window count).
    pub fn same_final_state(&self, other: &RunReport) -> bool {
        self.events_processed == other.events_processed
            && self.nodes == other.nodes
            && self.paths == other.paths
    }

    /// Total packets received over all nodes.
    pub fn packets_received(&self) -> u64 {
        self.nodes.iter().map(|n| n.stats.packets_received).sum()
    }
}
