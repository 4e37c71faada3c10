//! Shadow Environment Layer
//!
//! This crate holds the seams between the master scheduler and the
//! collaborators it drives, so that the scheduler never depends on a
//! concrete parser, action set or clock representation.
//!
//! # Core Concept: Setup Then Run
//!
//! A simulation run is split into two halves:
//! - **Setup**: scenario text is parsed into an ordered queue of [`Action`]s,
//!   which are executed once, first to last, against a context
//! - **Run**: the scheduler advances [`SimulationTime`] window by window
//!
//! The context type is a parameter of both [`Action`] and
//! [`ScenarioParser`], so the same seams work for the real worker pool and
//! for test doubles.
//!
//! # Example
//!
//! ```ignore
//! use shadow_env::{ActionQueue, ScenarioParser};
//!
//! let mut actions = ActionQueue::new();
//! parser.parse_contents(text, &mut actions)?;
//! let executed = actions.run_all(&mut pool);
//! ```

mod action;
mod error;
mod parser;
mod time;
mod types;

pub use action::{Action, ActionQueue};
pub use error::EnvError;
pub use parser::ScenarioParser;
pub use time::{
    millis_f64_to_simtime, millis_to_simtime, simtime_to_millis_f64, SimulationTime,
    SIMTIME_MAX, SIMTIME_ONE_MICROSECOND, SIMTIME_ONE_MILLISECOND, SIMTIME_ONE_NANOSECOND,
    SIMTIME_ONE_SECOND,
};
pub use types::{NodeId, VertexId};
