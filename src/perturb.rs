//! Random graph perturbations for robustness experiments.
//!
//! Both helpers sample uniformly without replacement, return a fresh graph
//! and keep node identifiers (node weights) intact, so partitions computed
//! on the perturbed graph stay comparable with the original.

use crate::error::{Error, Result};
use petgraph::graph::UnGraph;
use rand::prelude::*;
use rand::seq::index;
use std::collections::HashSet;
use tracing::debug;

/// Remove `floor(fraction × edge_count)` randomly chosen edges.
///
/// # Example
///
/// ```rust
/// use petgraph::graph::UnGraph;
/// use overlap::perturb::remove_edges;
///
/// let mut graph = UnGraph::<u32, f64>::new_undirected();
/// let n: Vec<_> = (0..5).map(|i| graph.add_node(i)).collect();
/// for w in n.windows(2) {
///     graph.add_edge(w[0], w[1], 1.0);
/// }
///
/// let thinned = remove_edges(&graph, 0.5, 42).unwrap();
/// assert_eq!(thinned.edge_count(), 2);
/// assert_eq!(thinned.node_count(), 5);
/// ```
pub fn remove_edges<N: Clone, E: Clone>(
    graph: &UnGraph<N, E>,
    fraction: f64,
    seed: u64,
) -> Result<UnGraph<N, E>> {
    let removed = sample(graph.edge_count(), fraction, seed)?;
    debug!(removed = removed.len(), of = graph.edge_count(), "removing edges");

    Ok(graph.filter_map(
        |_, n| Some(n.clone()),
        |e, w| (!removed.contains(&e.index())).then(|| w.clone()),
    ))
}

/// Remove `floor(fraction × node_count)` randomly chosen nodes and every
/// edge touching them.
pub fn remove_nodes<N: Clone, E: Clone>(
    graph: &UnGraph<N, E>,
    fraction: f64,
    seed: u64,
) -> Result<UnGraph<N, E>> {
    let removed = sample(graph.node_count(), fraction, seed)?;
    debug!(removed = removed.len(), of = graph.node_count(), "removing nodes");

    Ok(graph.filter_map(
        |v, n| (!removed.contains(&v.index())).then(|| n.clone()),
        |_, w| Some(w.clone()),
    ))
}

fn sample(len: usize, fraction: f64, seed: u64) -> Result<HashSet<usize>> {
    if !(0.0..=1.0).contains(&fraction) {
        return Err(Error::InvalidParameter {
            name: "fraction",
            message: "must be in [0, 1]",
        });
    }
    if len == 0 {
        return Err(Error::EmptyInput);
    }

    let amount = (fraction * len as f64).floor() as usize;
    let mut rng = StdRng::seed_from_u64(seed);
    Ok(index::sample(&mut rng, len, amount).into_iter().collect())
}
