//! Common identifier types shared by the scheduler and its collaborators.

use serde::{Deserialize, Serialize};

/// Index of a vertex (a virtual network) in the simulated topology.
pub type VertexId = i64;

/// Identifier of a simulated node.
///
/// Ids are handed out sequentially in creation order, so a run that creates
/// the same nodes in the same order always assigns the same ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Returns the id as a vector index.
    pub fn index(&self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "node-{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_id_ordering_follows_creation() {
        let a = NodeId(0);
        let b = NodeId(1);
        assert!(a < b);
        assert_eq!(b.index(), 1);
        assert_eq!(a.to_string(), "node-0");
    }
}
