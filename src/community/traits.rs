//! Community detection traits.

use crate::error::Result;
use crate::graph::{EdgeWeight, NodeId};
use crate::partition::Partition;
use petgraph::graph::UnGraph;

/// Trait for overlapping community detection algorithms.
pub trait OverlappingDetection {
    /// Detect communities in a weighted graph.
    ///
    /// Returns an ordered list of communities over the graph's node
    /// identifiers; a node may belong to several communities or to none.
    fn detect<N: NodeId, E: EdgeWeight>(&self, graph: &UnGraph<N, E>) -> Result<Partition<N>>;
}
