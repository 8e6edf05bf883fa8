//! Weighted Speaker-Listener Label Propagation (SLPA).
//!
//! Overlapping community detection where every node keeps a *memory* of
//! labels instead of a single label.
//!
//! ## One round
//!
//! 1. Shuffle the nodes (a fresh permutation every round).
//! 2. Each node in turn acts as **listener**. Every neighbour (**speaker**)
//!    proposes one label drawn uniformly from its current memory.
//! 3. Proposals are weighted by the edge weight and summed per label.
//! 4. The listener appends the label with the greatest total. Ties go to the
//!    label proposed first, in neighbour order (edge insertion order).
//! 5. Nodes without neighbours append nothing.
//!
//! Updates are applied in place, so a listener late in the round hears
//! labels appended earlier in the same round.
//!
//! ## Post-processing
//!
//! After `t` rounds each label's frequency in a node's memory is
//! `count / memory_len`. Labels with frequency `>= r` are kept, and every
//! kept label becomes one community made of all nodes that kept it.
//!
//! ```text
//! memory(v) = [v, l_1, l_2, ..., l_t]      |memory(v)| = t + 1
//! keep l  <=>  count(l) / (t + 1) >= r
//! ```
//!
//! An isolated node only ever remembers itself, so it forms a singleton
//! community.
//!
//! ## References
//!
//! Xie, Szymanski, Liu (2011). "SLPA: Uncovering Overlapping Communities in
//! Social Networks via a Speaker-Listener Interaction Dynamic Process."

use super::traits::OverlappingDetection;
use crate::config::SlpaConfig;
use crate::error::{Error, Result};
use crate::graph::{Adjacency, EdgeWeight, NodeId};
use crate::partition::Partition;
use petgraph::graph::UnGraph;
use rand::prelude::*;
use std::collections::HashMap;
use tracing::{debug, trace};

/// Weighted SLPA detector.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSlpa {
    /// Number of propagation rounds (t).
    iterations: usize,
    /// Minimum label frequency kept in the final assignment (r).
    threshold: f64,
    /// Random seed.
    seed: Option<u64>,
}

impl WeightedSlpa {
    /// Create a detector with `t = 20`, `r = 0.1` and no fixed seed.
    pub fn new() -> Self {
        Self::from_config(&SlpaConfig::default())
    }

    /// Create a detector from a config record.
    pub fn from_config(config: &SlpaConfig) -> Self {
        Self {
            iterations: config.iterations,
            threshold: config.threshold,
            seed: config.seed,
        }
    }

    /// Set the number of propagation rounds.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set the frequency threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Number of propagation rounds.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// Frequency threshold.
    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Random seed, if fixed.
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// Settings as a config record.
    pub fn config(&self) -> SlpaConfig {
        SlpaConfig {
            iterations: self.iterations,
            threshold: self.threshold,
            seed: self.seed,
        }
    }

    pub(crate) fn validate(&self) -> Result<()> {
        self.config().validate()
    }

    /// Run the propagation only and return every node's label memory.
    pub fn propagate<N: NodeId, E: EdgeWeight>(
        &self,
        graph: &UnGraph<N, E>,
    ) -> Result<LabelMemory<N>> {
        self.validate()?;
        let adj = Adjacency::from_graph(graph)?;
        let nodes = graph.node_weights().cloned().collect();
        Ok(self.propagate_indexed(&adj, nodes))
    }

    /// Propagation on a prebuilt adjacency; `nodes[i]` names node `i`.
    ///
    /// Parameters must already be validated.
    pub(crate) fn propagate_indexed<N: NodeId>(
        &self,
        adj: &Adjacency,
        nodes: Vec<N>,
    ) -> LabelMemory<N> {
        let n = adj.node_count();
        debug!(
            nodes = n,
            edges = adj.edge_count,
            iterations = self.iterations,
            seed = ?self.seed,
            "running weighted SLPA"
        );

        let mut rng: Box<dyn RngCore> = match self.seed {
            Some(s) => Box::new(StdRng::seed_from_u64(s)),
            None => Box::new(rand::rng()),
        };

        // Each node starts out remembering itself.
        let mut memory: Vec<Vec<usize>> = (0..n)
            .map(|node| {
                let mut labels = Vec::with_capacity(self.iterations + 1);
                labels.push(node);
                labels
            })
            .collect();

        let mut order: Vec<usize> = (0..n).collect();
        let mut votes: Vec<(usize, f64)> = Vec::new();
        let mut slot: HashMap<usize, usize> = HashMap::new();

        for _round in 0..self.iterations {
            order.shuffle(&mut rng);

            for &listener in &order {
                votes.clear();
                slot.clear();

                for &(speaker, weight) in &adj.neighbors[listener] {
                    // Memories are never empty: each holds at least the seed label.
                    let Some(&label) = memory[speaker].choose(&mut rng) else {
                        continue;
                    };
                    match slot.get(&label) {
                        Some(&pos) => votes[pos].1 += weight,
                        None => {
                            let _ = slot.insert(label, votes.len());
                            votes.push((label, weight));
                        }
                    }
                }

                if let Some(label) = first_max(&votes) {
                    memory[listener].push(label);
                }
            }
        }

        LabelMemory { nodes, memory }
    }
}

impl Default for WeightedSlpa {
    fn default() -> Self {
        Self::new()
    }
}

impl OverlappingDetection for WeightedSlpa {
    fn detect<N: NodeId, E: EdgeWeight>(&self, graph: &UnGraph<N, E>) -> Result<Partition<N>> {
        self.propagate(graph)?.partition(self.threshold)
    }
}

/// Run weighted SLPA with `t` rounds and frequency threshold `r`.
///
/// # Example
///
/// ```rust
/// use petgraph::graph::UnGraph;
/// use overlap::run_weighted_slpa;
///
/// let mut graph = UnGraph::<&str, f64>::new_undirected();
/// let a = graph.add_node("a");
/// let b = graph.add_node("b");
/// graph.add_edge(a, b, 1.0);
///
/// let partition = run_weighted_slpa(&graph, 20, 0.1, Some(42)).unwrap();
/// assert!(!partition.is_empty());
/// ```
pub fn run_weighted_slpa<N: NodeId, E: EdgeWeight>(
    graph: &UnGraph<N, E>,
    t: usize,
    r: f64,
    seed: Option<u64>,
) -> Result<Partition<N>> {
    let mut slpa = WeightedSlpa::new().with_iterations(t).with_threshold(r);
    slpa.seed = seed;
    slpa.detect(graph)
}

/// Strictly greatest total wins; earlier entries win ties.
fn first_max(votes: &[(usize, f64)]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for &(label, weight) in votes {
        match best {
            Some((_, w)) if weight <= w => {}
            _ => best = Some((label, weight)),
        }
    }
    best.map(|(label, _)| label)
}

pub(crate) fn validate_threshold(r: f64) -> Result<()> {
    if r > 0.0 && r <= 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidParameter {
            name: "threshold",
            message: "must be in (0, 1]",
        })
    }
}

/// Label memories left behind by one SLPA run.
///
/// Labels are node indices into the source graph; [`LabelMemory::node`]
/// maps them back to identifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelMemory<N> {
    nodes: Vec<N>,
    memory: Vec<Vec<usize>>,
}

impl<N: NodeId> LabelMemory<N> {
    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if the graph had no nodes.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Identifier of node `index`.
    pub fn node(&self, index: usize) -> Option<&N> {
        self.nodes.get(index)
    }

    /// Labels remembered by node `index`, oldest first.
    pub fn labels(&self, index: usize) -> &[usize] {
        self.memory.get(index).map_or(&[], Vec::as_slice)
    }

    /// `(label, frequency)` pairs of node `index`, in first-seen order.
    pub fn label_frequencies(&self, index: usize) -> Vec<(usize, f64)> {
        let labels = self.labels(index);
        let total = labels.len() as f64;

        let mut counts: Vec<(usize, usize)> = Vec::new();
        let mut slot: HashMap<usize, usize> = HashMap::new();
        for &label in labels {
            match slot.get(&label) {
                Some(&pos) => counts[pos].1 += 1,
                None => {
                    let _ = slot.insert(label, counts.len());
                    counts.push((label, 1));
                }
            }
        }

        counts
            .into_iter()
            .map(|(label, count)| (label, count as f64 / total))
            .collect()
    }

    /// Every `(node, label)` frequency, node by node.
    ///
    /// Purely diagnostic: useful for choosing `r` from a histogram.
    pub fn frequency_distribution(&self) -> Vec<f64> {
        (0..self.len())
            .flat_map(|node| self.label_frequencies(node).into_iter().map(|(_, f)| f))
            .collect()
    }

    /// Communities keyed by label, as node indices.
    ///
    /// Ordered by the first node (in graph order) that keeps the label.
    pub fn communities_by_label(&self, r: f64) -> Vec<(usize, Vec<usize>)> {
        let mut communities: Vec<(usize, Vec<usize>)> = Vec::new();
        let mut slot: HashMap<usize, usize> = HashMap::new();

        for node in 0..self.len() {
            for (label, freq) in self.label_frequencies(node) {
                if freq < r {
                    continue;
                }
                match slot.get(&label) {
                    Some(&pos) => communities[pos].1.push(node),
                    None => {
                        let _ = slot.insert(label, communities.len());
                        communities.push((label, vec![node]));
                    }
                }
            }
        }

        communities
    }

    /// Overlapping partition obtained with frequency threshold `r`.
    pub fn partition(&self, r: f64) -> Result<Partition<N>> {
        validate_threshold(r)?;
        trace!(distribution = ?self.frequency_distribution(), r, "label frequencies");

        let communities = self
            .communities_by_label(r)
            .into_iter()
            .map(|(_, members)| members.into_iter().map(|i| self.nodes[i].clone()).collect())
            .collect();

        Ok(Partition::overlapping(communities))
    }
}
