//! Shadow Core - Master Scheduler for Parallel Discrete-Event Network Simulation
//!
//! This library drives a pool of simulation workers through synchronized,
//! time-bounded execution windows:
//! 1. **Causality**: cross-node packets are held until the window they were
//!    sent in has closed on every worker
//! 2. **Determinism**: every random stream derives from one seed, and event
//!    order never depends on thread timing, so serial and parallel runs of a
//!    scenario end in the same state
//! 3. **Topology**: weighted [`Path`]s between virtual networks supply the
//!    latency that bounds how wide a window may safely be
//!
//! # Usage
//!
//! ```ignore
//! use shadow_core::{Configuration, JsonScenarioParser, Master};
//!
//! let mut master = Master::new(Configuration {
//!     workers: 4,
//!     run_file_example: true,
//!     ..Default::default()
//! });
//! let report = master.run(&mut JsonScenarioParser::new())?;
//! ```

pub mod actions;
pub mod config;
pub mod error;
pub mod event;
pub mod example;
pub mod master;
pub mod node;
pub mod path;
pub mod random;
pub mod report;
pub mod scenario;
pub mod shutdown;
pub mod topology;
mod worker;
pub mod worker_pool;

// Re-export key types for convenience
pub use actions::ActionSpec;
pub use config::{Configuration, LogLevel};
pub use error::{MasterError, SchedulerError, SetupError, TopologyError};
pub use master::{Master, Phase, VERSION};
pub use node::{NodeReport, NodeStats};
pub use path::Path;
pub use random::Random;
pub use report::{PathReport, RunMode, RunReport};
pub use scenario::JsonScenarioParser;
pub use shutdown::ShutdownHandle;
pub use topology::Topology;
pub use worker_pool::{ApplicationSpec, WorkerPool};
