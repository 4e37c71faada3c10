//! Simulation time units.

/// Simulated time in nanoseconds since the start of the run.
pub type SimulationTime = u64;

/// One nanosecond of simulated time.
pub const SIMTIME_ONE_NANOSECOND: SimulationTime = 1;

/// One microsecond of simulated time.
pub const SIMTIME_ONE_MICROSECOND: SimulationTime = 1_000;

/// One millisecond of simulated time.
pub const SIMTIME_ONE_MILLISECOND: SimulationTime = 1_000_000;

/// One second of simulated time.
pub const SIMTIME_ONE_SECOND: SimulationTime = 1_000_000_000;

/// The largest representable simulation time.
///
/// Used as the upper window bound in single-worker mode and as the
/// "never" end time before a kill time is configured.
pub const SIMTIME_MAX: SimulationTime = u64::MAX;

/// Converts whole milliseconds to simulation time, saturating at [`SIMTIME_MAX`].
pub fn millis_to_simtime(millis: u64) -> SimulationTime {
    millis.saturating_mul(SIMTIME_ONE_MILLISECOND)
}

/// Converts fractional milliseconds (e.g. a path latency) to simulation time.
///
/// Rounds to the nearest nanosecond. Negative and NaN inputs map to 0.
pub fn millis_f64_to_simtime(millis: f64) -> SimulationTime {
    // `as` saturates for floats, so huge values clamp to SIMTIME_MAX
    (millis * SIMTIME_ONE_MILLISECOND as f64).round() as SimulationTime
}

/// Converts simulation time to fractional milliseconds.
pub fn simtime_to_millis_f64(time: SimulationTime) -> f64 {
    time as f64 / SIMTIME_ONE_MILLISECOND as f64
}
