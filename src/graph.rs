//! Graph inputs and the index-based adjacency every algorithm runs on.
//!
//! Callers hand in a `petgraph` [`UnGraph<N, E>`] where the node weight `N`
//! is the node identifier and `E` is anything implementing [`EdgeWeight`].
//! Algorithms never walk the petgraph structure directly: they build an
//! [`Adjacency`] once and share it read-only.
//!
//! ## Edge weights
//!
//! | `E` | weight |
//! |-----|--------|
//! | `f64`, `f32` | the value itself |
//! | `Option<f64>`, `Option<f32>` | the value, or `0.0` when absent |
//!
//! A zero weight keeps the edge in the neighbourhood but gives it no
//! influence in weighted votes.

use crate::error::{Error, Result};
use petgraph::graph::UnGraph;
use petgraph::visit::EdgeRef;
use std::collections::HashMap;
use std::fmt::Debug;
use std::hash::Hash;

/// Guard added to the min–max denominator in [`normalize_weights`].
pub const WEIGHT_EPSILON: f64 = 1e-9;

/// Identifier carried by every graph node.
///
/// Blanket-implemented for any type with the listed bounds (`usize`,
/// `u64`, `String`, `&'static str`, ...).
pub trait NodeId: Clone + Eq + Hash + Debug + Send + Sync {}

impl<T> NodeId for T where T: Clone + Eq + Hash + Debug + Send + Sync {}

/// Numeric view of an edge payload.
pub trait EdgeWeight {
    /// Weight of the edge; absent weights read as `0.0`.
    fn weight(&self) -> f64;
}

impl EdgeWeight for f64 {
    fn weight(&self) -> f64 {
        *self
    }
}

impl EdgeWeight for f32 {
    fn weight(&self) -> f64 {
        f64::from(*self)
    }
}

impl EdgeWeight for Option<f64> {
    fn weight(&self) -> f64 {
        self.unwrap_or(0.0)
    }
}

impl EdgeWeight for Option<f32> {
    fn weight(&self) -> f64 {
        self.map(f64::from).unwrap_or(0.0)
    }
}

/// Read-only adjacency in node-index space.
#[derive(Debug, Clone)]
pub(crate) struct Adjacency {
    /// node -> [(neighbor, weight)], in edge insertion order.
    pub(crate) neighbors: Vec<Vec<(usize, f64)>>,
    /// node -> neighbor -> (edge multiplicity, summed weight).
    lookup: Vec<HashMap<usize, (usize, f64)>>,
    /// Unweighted degree; self-loops count twice.
    pub(crate) degrees: Vec<f64>,
    /// Weighted degree; self-loops count twice.
    pub(crate) strengths: Vec<f64>,
    /// Number of edges (m).
    pub(crate) edge_count: usize,
    /// Sum of edge weights.
    pub(crate) total_weight: f64,
}

impl Adjacency {
    /// Build from a petgraph graph, rejecting negative or non-finite weights.
    pub(crate) fn from_graph<N, E: EdgeWeight>(graph: &UnGraph<N, E>) -> Result<Self> {
        let n = graph.node_count();
        let mut neighbors = vec![Vec::new(); n];
        let mut lookup = vec![HashMap::new(); n];
        let mut degrees = vec![0.0; n];
        let mut strengths = vec![0.0; n];
        let mut total_weight = 0.0;

        for edge in graph.edge_references() {
            let w = edge.weight().weight();
            if !w.is_finite() || w < 0.0 {
                return Err(Error::InvalidWeight {
                    edge: edge.id().index(),
                    weight: w,
                });
            }

            let i = edge.source().index();
            let j = edge.target().index();

            neighbors[i].push((j, w));
            if i != j {
                neighbors[j].push((i, w));
            }

            for (a, b) in [(i, j), (j, i)] {
                let entry = lookup[a].entry(b).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += w;
                if i == j {
                    break;
                }
            }

            degrees[i] += 1.0;
            degrees[j] += 1.0;
            strengths[i] += w;
            strengths[j] += w;
            total_weight += w;
        }

        Ok(Self {
            neighbors,
            lookup,
            degrees,
            strengths,
            edge_count: graph.edge_count(),
            total_weight,
        })
    }

    pub(crate) fn node_count(&self) -> usize {
        self.neighbors.len()
    }

    /// Adjacency entry `A_ij`: 1.0 if at least one edge joins `i` and `j`,
    /// else 0.0. A self-loop reads as 2.0, matching its two degree endpoints.
    pub(crate) fn indicator(&self, i: usize, j: usize) -> f64 {
        match self.lookup[i].get(&j) {
            None => 0.0,
            Some(_) if i == j => 2.0,
            Some(_) => 1.0,
        }
    }

    /// Summed weight of the edges joining `i` and `j`; self-loops count twice.
    pub(crate) fn weight_between(&self, i: usize, j: usize) -> f64 {
        self.lookup[i]
            .get(&j)
            .map_or(0.0, |&(_, w)| if i == j { 2.0 * w } else { w })
    }

    /// Number of edges joining `i` and `j`.
    #[cfg(test)]
    pub(crate) fn multiplicity(&self, i: usize, j: usize) -> usize {
        self.lookup[i].get(&j).map_or(0, |&(count, _)| count)
    }
}

/// Map node identifiers to their index in `graph`.
pub(crate) fn index_nodes<N: NodeId, E>(graph: &UnGraph<N, E>) -> HashMap<&N, usize> {
    graph
        .node_indices()
        .map(|idx| (&graph[idx], idx.index()))
        .collect()
}

/// Min–max rescale edge weights into `[0, 1]`.
///
/// ```text
/// w' = (w - min) / (max - min + 1e-9)
/// ```
///
/// The epsilon keeps graphs whose weights are all equal well-defined (every
/// weight becomes 0). A graph without edges is returned unchanged.
///
/// # Example
///
/// ```rust
/// use petgraph::graph::UnGraph;
/// use overlap::normalize_weights;
///
/// let mut graph = UnGraph::<u32, f64>::new_undirected();
/// let a = graph.add_node(0);
/// let b = graph.add_node(1);
/// let c = graph.add_node(2);
/// graph.add_edge(a, b, 2.0);
/// graph.add_edge(b, c, 4.0);
///
/// let normalized = normalize_weights(&graph);
/// let weights: Vec<f64> = normalized.edge_weights().copied().collect();
/// assert!(weights[0].abs() < 1e-12);
/// assert!((weights[1] - 1.0).abs() < 1e-6);
/// ```
pub fn normalize_weights<N: Clone>(graph: &UnGraph<N, f64>) -> UnGraph<N, f64> {
    let (min_w, max_w) = graph
        .edge_weights()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &w| {
            (lo.min(w), hi.max(w))
        });

    if graph.edge_count() == 0 {
        return graph.clone();
    }

    let span = max_w - min_w + WEIGHT_EPSILON;
    graph.map(|_, n| n.clone(), |_, &w| (w - min_w) / span)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adjacency_degrees_and_lookup() {
        let mut graph = UnGraph::<usize, f64>::new_undirected();
        let a = graph.add_node(0);
        let b = graph.add_node(1);
        let c = graph.add_node(2);
        let _ = graph.add_edge(a, b, 0.5);
        let _ = graph.add_edge(b, c, 2.0);

        let adj = Adjacency::from_graph(&graph).unwrap();
        assert_eq!(adj.node_count(), 3);
        assert_eq!(adj.edge_count, 2);
        assert!((adj.total_weight - 2.5).abs() < 1e-12);
        assert_eq!(adj.degrees, vec![1.0, 2.0, 1.0]);
        assert_eq!(adj.strengths, vec![0.5, 2.5, 2.0]);
        assert_eq!(adj.indicator(0, 1), 1.0);
        assert_eq!(adj.indicator(0, 2), 0.0);
        assert!((adj.weight_between(2, 1) - 2.0).abs() < 1e-12);
        assert_eq!(adj.multiplicity(1, 0), 1);
    }

    #[test]
    fn test_adjacency_neighbor_order_follows_insertion() {
        let mut graph = UnGraph::<usize, f64>::new_undirected();
        let nodes: Vec<_> = (0..4).map(|i| graph.add_node(i)).collect();
        let _ = graph.add_edge(nodes[0], nodes[3], 1.0);
        let _ = graph.add_edge(nodes[0], nodes[1], 1.0);
        let _ = graph.add_edge(nodes[2], nodes[0], 1.0);

        let adj = Adjacency::from_graph(&graph).unwrap();
        let order: Vec<usize> = adj.neighbors[0].iter().map(|&(j, _)| j).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn test_self_loop_counts_twice_in_degree() {
        let mut graph = UnGraph::<usize, f64>::new_undirected();
        let a = graph.add_node(0);
        let _ = graph.add_edge(a, a, 1.0);

        let adj = Adjacency::from_graph(&graph).unwrap();
        assert_eq!(adj.degrees[0], 2.0);
        assert_eq!(adj.neighbors[0].len(), 1);
        assert_eq!(adj.multiplicity(0, 0), 1);
        assert_eq!(adj.indicator(0, 0), 2.0);
        assert_eq!(adj.weight_between(0, 0), 2.0);
    }

    #[test]
    fn test_absent_weight_reads_as_zero() {
        let mut graph = UnGraph::<usize, Option<f64>>::new_undirected();
        let a = graph.add_node(0);
        let b = graph.add_node(1);
        let _ = graph.add_edge(a, b, None);

        let adj = Adjacency::from_graph(&graph).unwrap();
        assert_eq!(adj.neighbors[0], vec![(1, 0.0)]);
        assert_eq!(adj.total_weight, 0.0);
    }

    #[test]
    fn test_negative_weight_rejected() {
        let mut graph = UnGraph::<usize, f64>::new_undirected();
        let a = graph.add_node(0);
        let b = graph.add_node(1);
        let _ = graph.add_edge(a, b, -1.0);

        assert!(matches!(
            Adjacency::from_graph(&graph),
            Err(Error::InvalidWeight { edge: 0, .. })
        ));
    }

    #[test]
    fn test_normalize_equal_weights_uses_epsilon() {
        let mut graph = UnGraph::<usize, f64>::new_undirected();
        let a = graph.add_node(0);
        let b = graph.add_node(1);
        let c = graph.add_node(2);
        let _ = graph.add_edge(a, b, 0.7);
        let _ = graph.add_edge(b, c, 0.7);

        let normalized = normalize_weights(&graph);
        assert!(normalized.edge_weights().all(|w| w.is_finite() && *w == 0.0));
        assert_eq!(normalized[a], 0);
    }

    #[test]
    fn test_normalize_edgeless_graph_unchanged() {
        let mut graph = UnGraph::<usize, f64>::new_undirected();
        let _ = graph.add_node(7);
        let normalized = normalize_weights(&graph);
        assert_eq!(normalized.node_count(), 1);
        assert_eq!(normalized.edge_count(), 0);
    }
}
