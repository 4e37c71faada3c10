//! Error types for the scheduler, topology and setup.

use shadow_env::{EnvError, SimulationTime, VertexId};
use thiserror::Error;

/// Contract violations when building the topology.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// Latency must be finite and non-negative
    #[error("Invalid latency {0}: must be finite and >= 0")]
    InvalidLatency(f64),

    /// Reliability must lie in [0, 1]
    #[error("Invalid reliability {0}: must be within [0.0, 1.0]")]
    InvalidReliability(f64),

    /// A path endpoint references a vertex that was never created
    #[error("Unknown vertex {0}")]
    UnknownVertex(VertexId),

    /// A path between the two vertices already exists
    #[error("Duplicate path {src} -> {dst}")]
    DuplicatePath { src: VertexId, dst: VertexId },
}

/// Errors raised while running setup actions against the worker pool.
#[derive(Debug, Error)]
pub enum SetupError {
    /// An action references a node name that does not exist
    #[error("Unknown node '{0}'")]
    UnknownNode(String),

    /// A node with this name was already created
    #[error("Duplicate node '{0}'")]
    DuplicateNode(String),

    /// Node ids are 32-bit
    #[error("Cannot create node #{0}: node id space exhausted")]
    TooManyNodes(usize),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Violations of the execution-window protocol.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SchedulerError {
    /// A window start was placed after its end
    #[error("Window out of order: start {start} > end {end}")]
    WindowOrder {
        start: SimulationTime,
        end: SimulationTime,
    },

    /// The scheduler is in teardown and accepts no more windows
    #[error("Scheduler already killed")]
    Killed,

    /// Parallel execution needs a non-zero window
    #[error("Run-ahead of 0ms cannot drive parallel windows")]
    ZeroRunAhead,
}

/// Errors that abort a simulation run.
#[derive(Debug, Error)]
pub enum MasterError {
    /// Scenario input failed to parse; nothing was bootstrapped
    #[error("Error parsing {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: EnvError,
    },

    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// The configured run-ahead is larger than the fastest path
    #[error("Run-ahead {jump}ns exceeds minimum path latency {min_latency}ns")]
    RunAhead {
        jump: SimulationTime,
        min_latency: SimulationTime,
    },

    /// A worker thread failed or disconnected mid-run
    #[error("Worker failure: {0}")]
    Worker(String),
}
