//! The master scheduler.
//!
//! One [`Master`] exists per simulation run. It owns the configuration, the
//! global random source and the wall-clock timer, and it is the single
//! writer of the execution window that bounds how far workers may run
//! ahead:
//!
//! ```text
//! Constructed ─► Parsing ─► Bootstrapping ─► Running ─► Killed
//!                   │
//!                   └─ parse error: run fails, nothing is bootstrapped
//! ```
//!
//! In parallel mode every window is `[start, start + min_time_jump)`. No
//! cross-node event is delivered before its window has closed on every
//! worker, which is sound as long as `min_time_jump` does not exceed the
//! smallest path latency.

use crate::config::Configuration;
use crate::error::{MasterError, SchedulerError};
use crate::example;
use crate::random::Random;
use crate::report::RunReport;
use crate::shutdown::ShutdownHandle;
use crate::topology::Topology;
use crate::worker_pool::WorkerPool;
use shadow_env::{
    millis_to_simtime, simtime_to_millis_f64, ActionQueue, ScenarioParser, SimulationTime,
    SIMTIME_MAX,
};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Crate version, reported in start-up and shut-down messages.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Lifecycle phase of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Constructed,
    Parsing,
    Bootstrapping,
    Running,
    Killed,
}

/// Scheduler state for one simulation run.
pub struct Master {
    /// General configuration options for the simulation
    config: Configuration,

    /// Tracks overall wall-clock runtime
    run_timer: Instant,

    /// Global random source from which all node random sources originate
    random: Random,

    /// Minimum allowed time jump when sending events between nodes
    min_time_jump: SimulationTime,

    /// Start of the current window of execution
    execute_window_start: SimulationTime,

    /// End of the current window of execution
    execute_window_end: SimulationTime,

    /// The simulation ends once no event is left before this time
    end_time: SimulationTime,

    /// True once no more events will run
    killed: bool,

    phase: Phase,
    shutdown: ShutdownHandle,
}

impl Master {
    /// Creates the master for a run.
    ///
    /// Emits no log output: the caller may still be wiring up logging.
    pub fn new(config: Configuration) -> Self {
        let random = Random::new(config.random_seed);
        let min_time_jump = millis_to_simtime(config.min_run_ahead);

        Self {
            config,
            run_timer: Instant::now(),
            random,
            min_time_jump,
            execute_window_start: 0,
            execute_window_end: 0,
            end_time: SIMTIME_MAX,
            killed: false,
            phase: Phase::Constructed,
            shutdown: ShutdownHandle::new(),
        }
    }

    /// Parses the configured scenario, bootstraps it and runs it to the end.
    ///
    /// # Errors
    /// - [`MasterError::Parse`] if any input fails to parse; later files are
    ///   not read and no action is executed
    /// - [`MasterError::RunAhead`] if strict run-ahead checking is on and
    ///   the window is wider than the fastest path
    /// - [`MasterError::Worker`] if a worker thread fails
    pub fn run<P>(&mut self, parser: &mut P) -> Result<RunReport, MasterError>
    where
        P: ScenarioParser<WorkerPool>,
    {
        let pool_seed = u64::from(self.random.next_u32());
        let mut pool = WorkerPool::new(pool_seed);

        info!(
            "shadow v{} initialized (seed={}, log level={})",
            VERSION,
            self.random.seed(),
            self.config.log_level
        );

        self.phase = Phase::Parsing;
        let mut actions = ActionQueue::new();
        if let Err(err) = self.parse_input(parser, &mut actions) {
            error!("error parsing input: {}", err);
            return Err(err);
        }
        info!("successfully parsed input ({} actions)", actions.len());

        // Creates every network, node and application, and queues each
        // application's start event
        self.phase = Phase::Bootstrapping;
        let executed = actions.run_all(&mut pool);
        debug!(
            executed,
            pool_seed = pool.seed(),
            nodes = pool.node_count(),
            networks = pool.topology().vertex_count(),
            paths = pool.topology().path_count(),
            "bootstrapping complete"
        );
        if let Some(kill_time) = pool.kill_time() {
            self.set_kill_time(kill_time);
        }

        self.phase = Phase::Running;
        let workers = self.config.workers;
        debug!(
            "starting {}-threaded engine (main + {} workers)",
            workers + 1,
            workers
        );
        let result = self.run_engine(&mut pool);

        debug!("engine finished, cleaning up...");
        self.killed = true;
        self.phase = Phase::Killed;
        drop(pool);

        if let Ok(report) = &result {
            info!(
                "simulation finished: {} events in {} windows, {:.3}s wall-clock",
                report.events_processed,
                report.windows,
                self.elapsed().as_secs_f64()
            );
        }
        result
    }

    fn parse_input<P>(
        &self,
        parser: &mut P,
        actions: &mut ActionQueue<WorkerPool>,
    ) -> Result<(), MasterError>
    where
        P: ScenarioParser<WorkerPool>,
    {
        if self.config.run_file_example {
            return parser
                .parse_contents(example::file_example_contents(), actions)
                .map_err(|source| MasterError::Parse {
                    origin: "built-in example".to_string(),
                    source,
                });
        }

        if self.config.input_files.is_empty() {
            warn!("no input files given, nothing to simulate");
        }
        for path in &self.config.input_files {
            debug!("parsing {}", path.display());
            parser
                .parse_file(path, actions)
                .map_err(|source| MasterError::Parse {
                    origin: path.display().to_string(),
                    source,
                })?;
        }
        Ok(())
    }

    fn run_engine(&mut self, pool: &mut WorkerPool) -> Result<RunReport, MasterError> {
        if self.config.workers > 0 {
            self.check_run_ahead(pool.topology())?;
            self.start_window()?;
            pool.run_parallel(self)
        } else {
            self.start_window()?;
            pool.run_serial(self)
        }
    }

    /// Compares the window size against the fastest path in the topology.
    fn check_run_ahead(&self, topology: &Topology) -> Result<(), MasterError> {
        let Some(min_latency) = topology.min_latency() else {
            return Ok(());
        };
        if self.min_time_jump <= min_latency {
            return Ok(());
        }
        if self.config.strict_run_ahead {
            return Err(MasterError::RunAhead {
                jump: self.min_time_jump,
                min_latency,
            });
        }

        warn!(
            "run-ahead of {:.3}ms exceeds the fastest path ({:.3}ms); cross-node events may arrive late",
            simtime_to_millis_f64(self.min_time_jump),
            simtime_to_millis_f64(min_latency)
        );
        Ok(())
    }

    /// Opens the first execution window for the configured mode.
    ///
    /// Parallel: `[0, min_time_jump)`. Serial: `[0, SIMTIME_MAX)`.
    pub fn start_window(&mut self) -> Result<(), SchedulerError> {
        if self.killed {
            return Err(SchedulerError::Killed);
        }

        self.execute_window_start = 0;
        if self.config.workers > 0 {
            if self.min_time_jump == 0 {
                return Err(SchedulerError::ZeroRunAhead);
            }
            self.execute_window_end = self.min_time_jump.min(self.end_time);
        } else {
            self.execute_window_end = SIMTIME_MAX;
        }
        Ok(())
    }

    /// Moves to the next window once every worker has finished the current one.
    ///
    /// The new window starts where the old one ended and is `min_time_jump`
    /// wide, except that it never extends past the end time.
    pub fn advance_window(&mut self) -> Result<(), SchedulerError> {
        if self.killed {
            return Err(SchedulerError::Killed);
        }
        if self.min_time_jump == 0 {
            return Err(SchedulerError::ZeroRunAhead);
        }

        let start = self.execute_window_end;
        let end = start
            .saturating_add(self.min_time_jump)
            .min(self.end_time)
            .max(start);

        self.set_execute_window_end(end)?;
        self.set_execute_window_start(start)
    }

    /// Observes a pending shutdown request.
    ///
    /// Called at window boundaries. On a request the end time drops to 0
    /// and the master is killed. Returns whether the master is killed.
    pub fn poll_shutdown(&mut self) -> bool {
        if !self.killed && self.shutdown.is_requested() {
            info!("shutdown requested, stopping after the current window");
            self.end_time = 0;
            self.killed = true;
        }
        self.killed
    }

    /// Returns a handle that can request shutdown from any thread.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn config(&self) -> &Configuration {
        &self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn min_time_jump(&self) -> SimulationTime {
        self.min_time_jump
    }

    /// Bound no worker may run past in the current window.
    pub fn execution_barrier(&self) -> SimulationTime {
        self.execute_window_end
    }

    pub fn execute_window_start(&self) -> SimulationTime {
        self.execute_window_start
    }

    pub fn execute_window_end(&self) -> SimulationTime {
        self.execute_window_end
    }

    /// Rejects a start placed after the current end.
    pub fn set_execute_window_start(&mut self, start: SimulationTime) -> Result<(), SchedulerError> {
        if start > self.execute_window_end {
            return Err(SchedulerError::WindowOrder {
                start,
                end: self.execute_window_end,
            });
        }
        self.execute_window_start = start;
        Ok(())
    }

    /// Rejects an end placed before the current start.
    pub fn set_execute_window_end(&mut self, end: SimulationTime) -> Result<(), SchedulerError> {
        if end < self.execute_window_start {
            return Err(SchedulerError::WindowOrder {
                start: self.execute_window_start,
                end,
            });
        }
        self.execute_window_end = end;
        Ok(())
    }

    pub fn run_timer(&self) -> Instant {
        self.run_timer
    }

    /// Wall-clock time since the master was created.
    pub fn elapsed(&self) -> Duration {
        self.run_timer.elapsed()
    }

    pub fn end_time(&self) -> SimulationTime {
        self.end_time
    }

    pub fn set_kill_time(&mut self, end_time: SimulationTime) {
        self.end_time = end_time;
    }

    pub fn is_killed(&self) -> bool {
        self.killed
    }

    pub fn set_killed(&mut self, killed: bool) {
        self.killed = killed;
    }
}

impl Drop for Master {
    fn drop(&mut self) {
        self.killed = true;
        info!(
            "shadow v{} shut down cleanly after {:.3}s",
            VERSION,
            self.elapsed().as_secs_f64()
        );
    }
}
