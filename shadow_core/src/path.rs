//! Topology edges.
//!
//! A [`Path`] is the weighted connection between two topology vertices. It
//! supplies the latency and reliability used when a packet crosses from one
//! virtual network to another, and counts how many packets were routed over
//! it. The counter is the only mutable field and may be bumped concurrently
//! by every worker thread that routes traffic across the edge.

use crate::error::TopologyError;
use shadow_env::{millis_f64_to_simtime, SimulationTime, VertexId};
use std::sync::atomic::{AtomicU64, Ordering};

/// A directed, weighted edge between two topology vertices.
#[derive(Debug)]
pub struct Path {
    src_vertex_index: VertexId,
    dst_vertex_index: VertexId,

    /// Milliseconds of simulated time per traversal
    latency: f64,

    /// Probability in [0, 1] that a packet survives the traversal
    reliability: f64,

    packet_count: AtomicU64,
}

impl Path {
    /// Creates a new edge with a zero packet count.
    ///
    /// # Errors
    /// Rejects negative or non-finite latency and reliability outside
    /// [0, 1]. These are bugs in whoever builds the topology, so they are
    /// reported instead of clamped.
    pub fn new(
        src_vertex_index: VertexId,
        dst_vertex_index: VertexId,
        latency: f64,
        reliability: f64,
    ) -> Result<Self, TopologyError> {
        Self::check(latency, reliability)?;

        Ok(Self {
            src_vertex_index,
            dst_vertex_index,
            latency,
            reliability,
            packet_count: AtomicU64::new(0),
        })
    }

    /// Validates edge weights without building a path.
    pub fn check(latency: f64, reliability: f64) -> Result<(), TopologyError> {
        if !latency.is_finite() || latency < 0.0 {
            return Err(TopologyError::InvalidLatency(latency));
        }
        if !(0.0..=1.0).contains(&reliability) {
            return Err(TopologyError::InvalidReliability(reliability));
        }
        Ok(())
    }

    pub fn src_vertex_index(&self) -> VertexId {
        self.src_vertex_index
    }

    pub fn dst_vertex_index(&self) -> VertexId {
        self.dst_vertex_index
    }

    /// Returns the latency in milliseconds.
    pub fn latency(&self) -> f64 {
        self.latency
    }

    /// Returns the latency converted to simulation time.
    pub fn latency_simtime(&self) -> SimulationTime {
        millis_f64_to_simtime(self.latency)
    }

    pub fn reliability(&self) -> f64 {
        self.reliability
    }

    /// Records one packet traversal. Safe to call from any thread.
    pub fn increment_packet_count(&self) {
        self.packet_count.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the number of traversals recorded so far.
    pub fn packet_count(&self) -> u64 {
        self.packet_count.load(Ordering::Relaxed)
    }
}

impl std::fmt::Display for Path {
    /// Diagnostic snapshot; the counter may move while this is formatted.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "SourceIndex={} DestinationIndex={} Latency={:.6} Reliability={:.6} PacketCount={}",
            self.src_vertex_index,
            self.dst_vertex_index,
            self.latency,
            self.reliability,
            self.packet_count(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;
    use shadow_env::SIMTIME_ONE_MILLISECOND;
    use std::sync::Arc;

    #[test]
    fn test_path_accessors() {
        let path = Path::new(1, 2, 5.0, 0.99).unwrap();

        assert_eq!(path.src_vertex_index(), 1);
        assert_eq!(path.dst_vertex_index(), 2);
        assert_relative_eq!(path.latency(), 5.0);
        assert_relative_eq!(path.reliability(), 0.99);
        assert_eq!(path.packet_count(), 0);
        assert_eq!(path.latency_simtime(), 5 * SIMTIME_ONE_MILLISECOND);
    }

    #[test]
    fn test_path_rejects_bad_weights() {
        assert!(matches!(
            Path::new(1, 2, -0.5, 0.5),
            Err(TopologyError::InvalidLatency(_))
        ));
        assert!(matches!(
            Path::new(1, 2, f64::INFINITY, 0.5),
            Err(TopologyError::InvalidLatency(_))
        ));
        assert!(matches!(
            Path::new(1, 2, 1.0, 1.01),
            Err(TopologyError::InvalidReliability(_))
        ));
        assert!(matches!(
            Path::new(1, 2, 1.0, f64::NAN),
            Err(TopologyError::InvalidReliability(_))
        ));

        // Boundaries are valid
        assert!(Path::new(1, 2, 0.0, 0.0).is_ok());
        assert!(Path::new(1, 2, 0.0, 1.0).is_ok());
    }

    #[test]
    fn test_path_display() {
        let path = Path::new(-1, 7, 5.0, 0.5).unwrap();
        path.increment_packet_count();
        path.increment_packet_count();

        assert_eq!(
            path.to_string(),
            "SourceIndex=-1 DestinationIndex=7 Latency=5.000000 Reliability=0.500000 PacketCount=2"
        );
    }

    #[test]
    fn test_concurrent_increments_are_not_lost() {
        let path = Arc::new(Path::new(1, 2, 5.0, 0.99).unwrap());

        std::thread::scope(|scope| {
            for _ in 0..4 {
                let path = Arc::clone(&path);
                scope.spawn(move || {
                    for _ in 0..250 {
                        path.increment_packet_count();
                    }
                });
            }
        });

        assert_eq!(path.packet_count(), 1000);
    }

    proptest! {
        #[test]
        fn prop_valid_weights_survive_construction(
            latency in 0.0f64..1e6,
            reliability in 0.0f64..=1.0,
        ) {
            let path = Path::new(0, 1, latency, reliability).unwrap();
            prop_assert!(path.latency() >= 0.0);
            prop_assert!((0.0..=1.0).contains(&path.reliability()));
        }

        #[test]
        fn prop_counter_matches_increments(n in 0u64..500) {
            let path = Path::new(0, 1, 1.0, 1.0).unwrap();
            let mut last = 0;
            for _ in 0..n {
                path.increment_packet_count();
                let now = path.packet_count();
                prop_assert!(now > last);
                last = now;
            }
            prop_assert_eq!(path.packet_count(), n);
        }
    }
}
