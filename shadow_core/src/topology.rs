//! Read-only topology index shared by every worker.

use crate::error::TopologyError;
use crate::path::Path;
use shadow_env::{SimulationTime, VertexId};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

/// Virtual networks (vertices) and the paths between them.
///
/// Built during bootstrapping, then wrapped in an `Arc` and shared
/// read-only for the rest of the run. Only the per-path packet counters
/// change after that point.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    vertices: BTreeSet<VertexId>,
    paths: HashMap<(VertexId, VertexId), Arc<Path>>,
}

impl Topology {
    /// Creates an empty topology.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a vertex. Returns false if it already existed.
    pub fn add_vertex(&mut self, vertex: VertexId) -> bool {
        self.vertices.insert(vertex)
    }

    pub fn contains_vertex(&self, vertex: VertexId) -> bool {
        self.vertices.contains(&vertex)
    }

    /// Inserts a path between two existing vertices.
    pub fn connect(&mut self, path: Path) -> Result<Arc<Path>, TopologyError> {
        let src = path.src_vertex_index();
        let dst = path.dst_vertex_index();

        for vertex in [src, dst] {
            if !self.contains_vertex(vertex) {
                return Err(TopologyError::UnknownVertex(vertex));
            }
        }
        if self.paths.contains_key(&(src, dst)) {
            return Err(TopologyError::DuplicatePath { src, dst });
        }

        let path = Arc::new(path);
        self.paths.insert((src, dst), Arc::clone(&path));
        Ok(path)
    }

    /// Looks up the path packets take from `src` to `dst`.
    pub fn path(&self, src: VertexId, dst: VertexId) -> Option<&Arc<Path>> {
        self.paths.get(&(src, dst))
    }

    /// Iterates all paths ordered by (source, destination).
    pub fn paths(&self) -> impl Iterator<Item = &Arc<Path>> {
        let mut keys: Vec<_> = self.paths.keys().collect();
        keys.sort();
        keys.into_iter().filter_map(move |key| self.paths.get(key))
    }

    /// Returns the smallest latency of any path, in simulation time.
    ///
    /// This bounds how large an execution window may safely be.
    pub fn min_latency(&self) -> Option<SimulationTime> {
        self.paths.values().map(|p| p.latency_simtime()).min()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn path_count(&self) -> usize {
        self.paths.len()
    }
}
