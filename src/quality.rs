//! Partition quality: overlapping modularity, modularity and conductance.
//!
//! ## Overlapping modularity
//!
//! Newman–Girvan modularity generalised to fractional membership. A node in
//! `k` communities contributes `α = 1/k` to each of them:
//!
//! ```text
//! Q = (1/2m) × Σ_c Σ_{i,j ∈ c} [A_ij - k_i k_j / 2m] × α_i × α_j
//! ```
//!
//! The inner sum runs over **ordered** pairs and includes `i = j`, so every
//! member adds its own `-k_i²/2m × α_i²` term (plus `A_ii = 2` if it has a
//! self-loop, since the loop also adds 2 to `k_i`). On a disjoint partition all `α` are 1 and the expression is
//! exactly ordinary modularity.
//!
//! Each community's double sum is independent and O(|c|²), so communities
//! are scored on a dedicated worker pool. Partial sums are collected in
//! community order and added sequentially, which makes the result
//! independent of the order in which workers finish.
//!
//! ## Conductance
//!
//! Fraction of a community's edge endpoints that leave it:
//!
//! ```text
//! φ(c) = cut(c) / (2 × internal(c) + cut(c))
//! ```
//!
//! ## References
//!
//! - Newman & Girvan (2004). "Finding and evaluating community structure in networks."
//! - Shen, Cheng, Cai, Hu (2009). "Detect overlapping and hierarchical
//!   community structure in networks."

use crate::error::{Error, Result};
use crate::graph::{index_nodes, Adjacency, EdgeWeight, NodeId};
use crate::partition::{Overlap, Partition};
use crate::pool::worker_pool;
use petgraph::graph::UnGraph;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How edges enter the modularity formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeWeighting {
    /// `A_ij ∈ {0, 1}`, `k_i` = edge count, `m` = number of edges.
    #[default]
    Unweighted,
    /// `A_ij` = summed weight, `k_i` = strength, `m` = total weight.
    Weighted,
}

/// Overlapping modularity evaluator.
#[derive(Debug, Clone)]
pub struct OverlappingModularity {
    /// Worker threads.
    workers: usize,
    /// Edge interpretation.
    weighting: EdgeWeighting,
}

impl OverlappingModularity {
    /// Create an evaluator running on `workers` threads.
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            weighting: EdgeWeighting::Unweighted,
        }
    }

    /// Set edge weighting.
    pub fn with_weighting(mut self, weighting: EdgeWeighting) -> Self {
        self.weighting = weighting;
        self
    }

    /// Score `partition` on `graph`.
    pub fn evaluate<N: NodeId, E: EdgeWeight>(
        &self,
        graph: &UnGraph<N, E>,
        partition: &Partition<N>,
    ) -> Result<f64> {
        let pool = worker_pool(self.workers)?;
        let adj = Adjacency::from_graph(graph)?;
        let two_m = 2.0 * total_size(&adj, self.weighting);
        if two_m == 0.0 {
            return Ok(0.0);
        }

        let members = resolve_members(graph, partition)?;
        let alpha = alpha_weights(adj.node_count(), &members);

        debug!(
            communities = members.len(),
            workers = self.workers,
            weighting = ?self.weighting,
            "scoring overlapping modularity"
        );

        let ctx = ModularityContext {
            adj: &adj,
            alpha: &alpha,
            two_m,
            weighting: self.weighting,
        };
        let partials: Vec<f64> = pool.install(|| {
            members
                .par_iter()
                .map(|community| ctx.community_term(community))
                .collect()
        });

        Ok(partials.iter().sum::<f64>() / two_m)
    }
}

/// Overlapping modularity of `partition` computed on `workers` threads.
///
/// Returns `0.0` for graphs without edges. `workers == 0` is rejected
/// before anything else is checked.
///
/// # Example
///
/// ```rust
/// use petgraph::graph::UnGraph;
/// use overlap::{overlapping_modularity, Partition};
///
/// let mut graph = UnGraph::<u32, f64>::new_undirected();
/// let n: Vec<_> = (0..4).map(|i| graph.add_node(i)).collect();
/// graph.add_edge(n[0], n[1], 1.0);
/// graph.add_edge(n[2], n[3], 1.0);
///
/// let partition = Partition::overlapping(vec![vec![0, 1], vec![2, 3]]);
/// let q = overlapping_modularity(&graph, &partition, 2).unwrap();
/// assert!((q - 0.5).abs() < 1e-9);
/// ```
pub fn overlapping_modularity<N: NodeId, E: EdgeWeight>(
    graph: &UnGraph<N, E>,
    partition: &Partition<N>,
    workers: usize,
) -> Result<f64> {
    OverlappingModularity::new(workers).evaluate(graph, partition)
}

/// Ordinary Newman–Girvan modularity of a disjoint partition.
///
/// Nodes outside every community contribute nothing. Fails with
/// [`Error::OverlapNotSupported`] unless the partition is tagged
/// [`Overlap::Disjoint`].
pub fn modularity<N: NodeId, E: EdgeWeight>(
    graph: &UnGraph<N, E>,
    partition: &Partition<N>,
) -> Result<f64> {
    if partition.overlap() != Overlap::Disjoint {
        return Err(Error::OverlapNotSupported);
    }

    let adj = Adjacency::from_graph(graph)?;
    let m = adj.edge_count as f64;
    if m == 0.0 {
        return Ok(0.0);
    }

    let members = resolve_members(graph, partition)?;

    // Intra-community edges minus expected edges, per community.
    let mut q = 0.0;
    for community in &members {
        let mut internal = 0.0;
        let mut volume = 0.0;
        for &i in community {
            volume += adj.degrees[i];
            for &j in community {
                internal += adj.indicator(i, j);
            }
        }
        q += internal / (2.0 * m) - (volume / (2.0 * m)).powi(2);
    }

    Ok(q)
}

/// Min/max/mean/std of a per-community score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FitnessSummary {
    /// Smallest community score.
    pub min: f64,
    /// Largest community score.
    pub max: f64,
    /// Mean community score.
    pub score: f64,
    /// Population standard deviation.
    pub std: f64,
}

impl FitnessSummary {
    fn from_scores(scores: &[f64]) -> Self {
        if scores.is_empty() {
            return Self {
                min: 0.0,
                max: 0.0,
                score: 0.0,
                std: 0.0,
            };
        }

        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let var = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;
        Self {
            min: scores.iter().copied().fold(f64::INFINITY, f64::min),
            max: scores.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            score: mean,
            std: var.sqrt(),
        }
    }
}

/// Conductance of every community, summarised.
///
/// Uses unweighted edge counts. A community with no incident edges scores 0.
pub fn conductance<N: NodeId, E: EdgeWeight>(
    graph: &UnGraph<N, E>,
    partition: &Partition<N>,
    workers: usize,
) -> Result<FitnessSummary> {
    let pool = worker_pool(workers)?;
    let adj = Adjacency::from_graph(graph)?;
    let members = resolve_members(graph, partition)?;

    let scores: Vec<f64> = pool.install(|| {
        members
            .par_iter()
            .map(|community| community_conductance(&adj, community))
            .collect()
    });

    Ok(FitnessSummary::from_scores(&scores))
}

fn community_conductance(adj: &Adjacency, community: &[usize]) -> f64 {
    let mut inside = vec![false; adj.node_count()];
    for &i in community {
        inside[i] = true;
    }

    let mut internal = 0usize;
    let mut cut = 0usize;
    for &i in community {
        for &(j, _) in &adj.neighbors[i] {
            if !inside[j] {
                cut += 1;
            } else if i <= j {
                // Internal edges show up from both ends; count once.
                internal += 1;
            }
        }
    }

    let denom = 2 * internal + cut;
    if denom == 0 {
        0.0
    } else {
        cut as f64 / denom as f64
    }
}

/// Read-only state shared by modularity workers.
struct ModularityContext<'a> {
    adj: &'a Adjacency,
    alpha: &'a [f64],
    two_m: f64,
    weighting: EdgeWeighting,
}

impl ModularityContext<'_> {
    fn community_term(&self, community: &[usize]) -> f64 {
        let mut sum = 0.0;
        for &i in community {
            let ki = self.degree(i);
            for &j in community {
                let a_ij = match self.weighting {
                    EdgeWeighting::Unweighted => self.adj.indicator(i, j),
                    EdgeWeighting::Weighted => self.adj.weight_between(i, j),
                };
                let expected = ki * self.degree(j) / self.two_m;
                sum += (a_ij - expected) * self.alpha[i] * self.alpha[j];
            }
        }
        sum
    }

    fn degree(&self, i: usize) -> f64 {
        match self.weighting {
            EdgeWeighting::Unweighted => self.adj.degrees[i],
            EdgeWeighting::Weighted => self.adj.strengths[i],
        }
    }
}

fn total_size(adj: &Adjacency, weighting: EdgeWeighting) -> f64 {
    match weighting {
        EdgeWeighting::Unweighted => adj.edge_count as f64,
        EdgeWeighting::Weighted => adj.total_weight,
    }
}

/// 1 / (number of communities containing the node); 0 for uncovered nodes.
fn alpha_weights(n: usize, members: &[Vec<usize>]) -> Vec<f64> {
    let mut counts = vec![0usize; n];
    for &i in members.iter().flatten() {
        counts[i] += 1;
    }
    counts
        .into_iter()
        .map(|c| if c == 0 { 0.0 } else { 1.0 / c as f64 })
        .collect()
}

/// Translate community members to node indices.
fn resolve_members<N: NodeId, E>(
    graph: &UnGraph<N, E>,
    partition: &Partition<N>,
) -> Result<Vec<Vec<usize>>> {
    let index = index_nodes(graph);
    partition
        .communities()
        .iter()
        .map(|community| {
            community
                .iter()
                .map(|node| {
                    index
                        .get(node)
                        .copied()
                        .ok_or_else(|| Error::UnknownNode(format!("{node:?}")))
                })
                .collect::<Result<Vec<usize>>>()
        })
        .collect()
}
