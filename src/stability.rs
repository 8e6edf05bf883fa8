//! Robustness of overlapping partitions under reseeding and perturbation.
//!
//! A baseline partition is compared against repeated runs, each produced
//! by weighted SLPA under a different seed and, optionally, on a perturbed
//! copy of the graph. Only nodes covered by **both** partitions are compared
//! (and, under [`PerturbationMode::NodeRemoval`], only nodes that survive in
//! the perturbed graph).
//!
//! ## Metrics per run
//!
//! | Metric | Meaning |
//! |--------|---------|
//! | Jaccard | mean over nodes of `|B ∩ R| / |B ∪ R|` on community-index sets |
//! | Omega | fraction of node pairs on which "share a community" agrees |
//! | percent changed | % of nodes whose community-index set differs |
//! | ARI / NMI | on disjoint projections (lowest community index per node) |
//!
//! Jaccard and percent-changed compare community *indices*, so they are only
//! meaningful when runs number their communities comparably; Omega is
//! index-free. ARI/NMI discard overlap entirely and are reported as a
//! coarser supplementary signal.
//!
//! ## Complexity
//!
//! Omega looks at every unordered pair of compared nodes: O(n²) in the size
//! of the comparison set. The outer loop runs in parallel, but very large
//! graphs should compare a sample of nodes instead.

use crate::community::{OverlappingDetection, WeightedSlpa};
use crate::error::Result;
use crate::graph::{Adjacency, EdgeWeight, NodeId};
use crate::metrics::{ari, nmi};
use crate::partition::{Membership, Partition};
use crate::pool::worker_pool;
use petgraph::graph::UnGraph;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use tracing::{debug, warn};

/// How the graph behind the repeated runs differs from the baseline graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PerturbationMode {
    /// Same graph, different seed.
    #[default]
    Reseed,
    /// A fraction of edges was removed.
    EdgeRemoval,
    /// A fraction of nodes (and their edges) was removed.
    NodeRemoval,
    /// The graph was rebuilt from noisy features.
    FeatureNoise,
}

/// One repeated run to compare against the baseline.
#[derive(Debug, Clone)]
pub struct Candidate<N> {
    /// Seed or perturbation identifier.
    pub run_id: u64,
    /// Partition found by the run.
    pub partition: Partition<N>,
    /// Nodes of the graph the run was computed on, if known.
    pub surviving: Option<HashSet<N>>,
}

impl<N: NodeId> Candidate<N> {
    /// Candidate without node-survival information.
    pub fn new(run_id: u64, partition: Partition<N>) -> Self {
        Self {
            run_id,
            partition,
            surviving: None,
        }
    }

    /// Restrict comparisons to these nodes under node removal.
    pub fn with_surviving_nodes(mut self, nodes: impl IntoIterator<Item = N>) -> Self {
        self.surviving = Some(nodes.into_iter().collect());
        self
    }
}

/// Agreement between the baseline and one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StabilityRecord {
    /// Seed or perturbation identifier.
    pub run_id: u64,
    /// Perturbation applied.
    pub mode: PerturbationMode,
    /// Number of nodes compared.
    pub compared_nodes: usize,
    /// Mean per-node Jaccard similarity.
    pub jaccard: f64,
    /// Omega index (0 when fewer than two nodes were compared).
    pub omega: f64,
    /// Percentage (0–100) of compared nodes whose membership changed.
    pub percent_changed: f64,
    /// ARI on disjoint projections.
    pub ari: Option<f64>,
    /// NMI on disjoint projections.
    pub nmi: Option<f64>,
}

/// `|a ∩ b| / |a ∪ b|`, defined as 0 when both sets are empty.
pub fn jaccard_similarity(a: &BTreeSet<usize>, b: &BTreeSet<usize>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Pairwise co-membership agreement over `nodes`.
///
/// A pair agrees when "shares at least one community" has the same answer
/// in both snapshots. Fewer than two nodes leave no pair to compare and
/// score 0, even when a snapshot is compared with itself; read that 0 as
/// "undefined", not as disagreement.
pub fn omega_index<N: NodeId>(baseline: &Membership<N>, run: &Membership<N>, nodes: &[&N]) -> f64 {
    let n = nodes.len();
    if n < 2 {
        return 0.0;
    }

    let empty = BTreeSet::new();
    let sets = |m: &Membership<N>| -> Vec<BTreeSet<usize>> {
        nodes
            .iter()
            .map(|node| m.get(node).unwrap_or(&empty).clone())
            .collect()
    };
    let base = sets(baseline);
    let other = sets(run);

    let agree: usize = (0..n)
        .into_par_iter()
        .map(|u| {
            ((u + 1)..n)
                .filter(|&v| shares(&base[u], &base[v]) == shares(&other[u], &other[v]))
                .count()
        })
        .sum();

    agree as f64 / (n * (n - 1) / 2) as f64
}

fn shares(a: &BTreeSet<usize>, b: &BTreeSet<usize>) -> bool {
    a.intersection(b).next().is_some()
}

/// Lowest community index of each node (`None` if it has none).
pub fn disjointify<N: NodeId>(membership: &Membership<N>, nodes: &[&N]) -> Vec<Option<usize>> {
    nodes
        .iter()
        .map(|node| membership.get(node).and_then(|c| c.first().copied()))
        .collect()
}

/// Compare `baseline` against every candidate.
///
/// One record per candidate, in candidate order.
pub fn partition_stability<N: NodeId>(
    baseline: &Partition<N>,
    candidates: &[Candidate<N>],
    mode: PerturbationMode,
) -> Vec<StabilityRecord> {
    let base = baseline.membership();
    candidates
        .iter()
        .map(|candidate| compare(&base, candidate, mode, true))
        .collect()
}

fn compare<N: NodeId>(
    base: &Membership<N>,
    candidate: &Candidate<N>,
    mode: PerturbationMode,
    disjoint_metrics: bool,
) -> StabilityRecord {
    let run = candidate.partition.membership();
    let restrict = match (mode, &candidate.surviving) {
        (PerturbationMode::NodeRemoval, Some(nodes)) => Some(nodes),
        _ => None,
    };

    let nodes: Vec<&N> = base
        .nodes()
        .filter(|node| run.contains(node))
        .filter(|node| restrict.map_or(true, |keep| keep.contains(*node)))
        .collect();

    if nodes.is_empty() {
        warn!(run_id = candidate.run_id, "run shares no nodes with the baseline");
        return StabilityRecord {
            run_id: candidate.run_id,
            mode,
            compared_nodes: 0,
            jaccard: 0.0,
            omega: 0.0,
            percent_changed: 0.0,
            ari: None,
            nmi: None,
        };
    }

    let empty = BTreeSet::new();
    let mut jaccard_sum = 0.0;
    let mut changed = 0usize;
    for node in &nodes {
        let a = base.get(node).unwrap_or(&empty);
        let b = run.get(node).unwrap_or(&empty);
        jaccard_sum += jaccard_similarity(a, b);
        if a != b {
            changed += 1;
        }
    }

    let total = nodes.len() as f64;
    let (ari_score, nmi_score) = if disjoint_metrics {
        let base_labels = disjointify(base, &nodes);
        let run_labels = disjointify(&run, &nodes);
        (
            Some(ari(&base_labels, &run_labels)),
            Some(nmi(&base_labels, &run_labels)),
        )
    } else {
        (None, None)
    };

    let record = StabilityRecord {
        run_id: candidate.run_id,
        mode,
        compared_nodes: nodes.len(),
        jaccard: jaccard_sum / total,
        omega: omega_index(base, &run, &nodes),
        percent_changed: 100.0 * changed as f64 / total,
        ari: ari_score,
        nmi: nmi_score,
    };
    debug!(?record, "stability run compared");
    record
}

/// Repeats weighted SLPA over several seeds and compares each run to a
/// baseline.
#[derive(Debug, Clone)]
pub struct StabilityAnalyzer {
    /// Detector template; its seed is replaced per run.
    slpa: WeightedSlpa,
    /// One run per seed.
    seeds: Vec<u64>,
    /// Perturbation applied to the graph handed to [`Self::run`].
    mode: PerturbationMode,
    /// Report ARI/NMI as well.
    disjoint_metrics: bool,
    /// Threads shared by the seed runs and the comparisons.
    workers: usize,
}

impl StabilityAnalyzer {
    /// Create an analyzer with the default seeds `[42, 101, 202, 303, 404]`.
    pub fn new(slpa: WeightedSlpa) -> Self {
        Self {
            slpa,
            seeds: crate::config::DEFAULT_SEEDS.to_vec(),
            mode: PerturbationMode::Reseed,
            disjoint_metrics: true,
            workers: rayon::current_num_threads(),
        }
    }

    /// Set the seeds, one run each.
    pub fn with_seeds(mut self, seeds: impl IntoIterator<Item = u64>) -> Self {
        self.seeds = seeds.into_iter().collect();
        self
    }

    /// Set the perturbation mode.
    pub fn with_mode(mut self, mode: PerturbationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Enable or disable ARI/NMI.
    pub fn with_disjoint_metrics(mut self, enabled: bool) -> Self {
        self.disjoint_metrics = enabled;
        self
    }

    /// Set the number of worker threads (default: rayon's pool size).
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    /// Run SLPA on `graph` once per seed (in parallel on `workers` threads)
    /// and compare each result with `baseline`.
    ///
    /// Records come back in seed order with `run_id` set to the seed.
    pub fn run<N, E>(&self, graph: &UnGraph<N, E>, baseline: &Partition<N>) -> Result<Vec<StabilityRecord>>
    where
        N: NodeId,
        E: EdgeWeight,
    {
        self.slpa.validate()?;
        let pool = worker_pool(self.workers)?;
        let adj = Adjacency::from_graph(graph)?;
        let nodes: Vec<N> = graph.node_weights().cloned().collect();
        let threshold = self.slpa.threshold();

        debug!(
            runs = self.seeds.len(),
            mode = ?self.mode,
            workers = self.workers,
            "starting stability runs"
        );

        let partitions: Vec<Partition<N>> = pool.install(|| {
            self.seeds
                .par_iter()
                .map(|&seed| {
                    self.slpa
                        .clone()
                        .with_seed(seed)
                        .propagate_indexed(&adj, nodes.clone())
                        .partition(threshold)
                })
                .collect::<Result<_>>()
        })?;

        let base = baseline.membership();
        Ok(pool.install(|| {
            self.seeds
                .iter()
                .zip(partitions)
                .map(|(&seed, partition)| {
                    let mut candidate = Candidate::new(seed, partition);
                    if self.mode == PerturbationMode::NodeRemoval {
                        candidate = candidate.with_surviving_nodes(nodes.iter().cloned());
                    }
                    compare(&base, &candidate, self.mode, self.disjoint_metrics)
                })
                .collect()
        }))
    }

    /// Run with the analyzer's own detector to produce the baseline first.
    pub fn run_against_self<N, E>(&self, graph: &UnGraph<N, E>) -> Result<(Partition<N>, Vec<StabilityRecord>)>
    where
        N: NodeId,
        E: EdgeWeight,
    {
        let baseline = self.slpa.detect(graph)?;
        let records = self.run(graph, &baseline)?;
        Ok((baseline, records))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, unused_results)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn set(items: &[usize]) -> BTreeSet<usize> {
        items.iter().copied().collect()
    }

    fn triangles() -> Partition<usize> {
        Partition::overlapping(vec![vec![0, 1, 2], vec![3, 4, 5]])
    }

    #[test]
    fn test_jaccard() {
        assert_eq!(jaccard_similarity(&set(&[0, 1]), &set(&[1, 2])), 1.0 / 3.0);
        assert_eq!(jaccard_similarity(&set(&[4]), &set(&[4])), 1.0);
        assert_eq!(jaccard_similarity(&set(&[]), &set(&[])), 0.0);
    }

    #[test]
    fn test_self_comparison_is_perfect() {
        let baseline = Partition::overlapping(vec![vec![0, 1, 2], vec![2, 3, 4, 5]]);
        let records = partition_stability(
            &baseline,
            &[Candidate::new(42, baseline.clone())],
            PerturbationMode::Reseed,
        );
        let r = &records[0];
        assert_eq!(r.run_id, 42);
        assert_eq!(r.compared_nodes, 6);
        assert_eq!(r.jaccard, 1.0);
        assert_eq!(r.omega, 1.0);
        assert_eq!(r.percent_changed, 0.0);
        assert!((r.ari.unwrap() - 1.0).abs() < 1e-9);
        assert!((r.nmi.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_relabelled_communities_keep_omega() {
        // Same grouping, swapped indices: Omega sees no difference, the
        // index-based metrics see every node change.
        let baseline = triangles();
        let run = Partition::overlapping(vec![vec![3, 4, 5], vec![0, 1, 2]]);
        let r = &partition_stability(&baseline, &[Candidate::new(1, run)], PerturbationMode::Reseed)[0];
        assert_eq!(r.omega, 1.0);
        assert_eq!(r.jaccard, 0.0);
        assert_eq!(r.percent_changed, 100.0);
        assert!((r.ari.unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_bridge_straddle_changes_only_bridge_node() {
        // Baseline: bridge node 2 straddles both triangles. After removing the
        // bridge edge it sits in its own triangle only.
        let baseline = Partition::overlapping(vec![vec![0, 1, 2], vec![2, 3, 4, 5]]);
        let run = triangles();
        let r = &partition_stability(&baseline, &[Candidate::new(7, run)], PerturbationMode::EdgeRemoval)[0];

        assert_eq!(r.mode, PerturbationMode::EdgeRemoval);
        assert!((r.percent_changed - 100.0 / 6.0).abs() < 1e-9);
        assert!((r.jaccard - (5.0 + 0.5) / 6.0).abs() < 1e-9);
        // Pairs (2,3), (2,4), (2,5) flip from "shared" to "not shared".
        assert!((r.omega - 12.0 / 15.0).abs() < 1e-9);
    }

    #[test]
    fn test_disconnected_triangles_omega_unchanged() {
        let baseline = triangles();
        let run = triangles();
        let r = &partition_stability(&baseline, &[Candidate::new(0, run)], PerturbationMode::EdgeRemoval)[0];
        assert_eq!(r.omega, 1.0);
        assert_eq!(r.percent_changed, 0.0);
    }

    #[test]
    fn test_node_removal_restricts_domain() {
        let baseline = triangles();
        // Node 5 was deleted; the run still lists it (stale input) but the
        // surviving set excludes it.
        let run = triangles();
        let candidate = Candidate::new(3, run).with_surviving_nodes([0, 1, 2, 3, 4]);

        let r = &partition_stability(&baseline, &[candidate.clone()], PerturbationMode::NodeRemoval)[0];
        assert_eq!(r.compared_nodes, 5);

        // Other modes ignore the surviving set.
        let r = &partition_stability(&baseline, &[candidate], PerturbationMode::Reseed)[0];
        assert_eq!(r.compared_nodes, 6);
    }

    #[test]
    fn test_disjoint_runs_share_nothing() {
        let baseline = Partition::overlapping(vec![vec![0, 1]]);
        let run = Partition::overlapping(vec![vec![2, 3]]);
        let r = &partition_stability(&baseline, &[Candidate::new(9, run)], PerturbationMode::Reseed)[0];
        assert_eq!(r.compared_nodes, 0);
        assert_eq!(r.jaccard, 0.0);
        assert!(r.ari.is_none());
    }

    #[test]
    fn test_disjointify_takes_lowest_index() {
        let p = Partition::overlapping(vec![vec![0], vec![0, 1], vec![1]]);
        let m = p.membership();
        assert_eq!(disjointify(&m, &[&0, &1, &2]), vec![Some(0), Some(1), None]);
    }

    #[test]
    fn test_analyzer_reseeds_in_seed_order() {
        let mut graph = UnGraph::<usize, f64>::new_undirected();
        let n: Vec<_> = (0..4).map(|i| graph.add_node(i)).collect();
        graph.add_edge(n[0], n[1], 1.0);
        graph.add_edge(n[2], n[3], 1.0);

        let analyzer = StabilityAnalyzer::new(WeightedSlpa::new().with_threshold(0.3).with_seed(5))
            .with_seeds([5, 6, 7])
            .with_disjoint_metrics(false);
        let (baseline, records) = analyzer.run_against_self(&graph).unwrap();

        assert_eq!(records.iter().map(|r| r.run_id).collect::<Vec<_>>(), vec![5, 6, 7]);
        assert!(records.iter().all(|r| r.ari.is_none() && r.nmi.is_none()));
        // Seed 5 reproduces the baseline exactly.
        assert_eq!(records[0].jaccard, 1.0);
        assert_eq!(records[0].percent_changed, 0.0);
        // Labels never cross components, so co-membership can only differ
        // within an edge; cross-component pairs always agree.
        assert!(records.iter().all(|r| r.omega >= 4.0 / 6.0));
        assert!(!baseline.is_empty());
    }

    #[test]
    fn test_single_node_self_comparison() {
        // No pair to compare: Omega falls back to 0 while Jaccard is exact.
        let baseline = Partition::overlapping(vec![vec![7]]);
        let r = &partition_stability(
            &baseline,
            &[Candidate::new(1, baseline.clone())],
            PerturbationMode::Reseed,
        )[0];
        assert_eq!(r.compared_nodes, 1);
        assert_eq!(r.jaccard, 1.0);
        assert_eq!(r.percent_changed, 0.0);
        assert_eq!(r.omega, 0.0);
    }

    #[test]
    fn test_analyzer_rejects_zero_workers() {
        let mut graph = UnGraph::<usize, f64>::new_undirected();
        let n: Vec<_> = (0..2).map(|i| graph.add_node(i)).collect();
        graph.add_edge(n[0], n[1], 1.0);

        let analyzer = StabilityAnalyzer::new(WeightedSlpa::new()).with_workers(0);
        assert!(matches!(
            analyzer.run(&graph, &triangles()),
            Err(crate::Error::InvalidParameter { name: "workers", .. })
        ));
    }

    #[test]
    fn test_analyzer_worker_count_does_not_change_records() {
        let mut graph = UnGraph::<usize, f64>::new_undirected();
        let n: Vec<_> = (0..6).map(|i| graph.add_node(i)).collect();
        for &(a, b) in &[(0, 1), (1, 2), (0, 2), (3, 4), (4, 5), (3, 5), (2, 3)] {
            graph.add_edge(n[a], n[b], 1.0);
        }

        let analyzer = StabilityAnalyzer::new(WeightedSlpa::new().with_threshold(0.3))
            .with_seeds([42, 101, 202]);
        let one = analyzer.clone().with_workers(1).run(&graph, &triangles()).unwrap();
        let three = analyzer.with_workers(3).run(&graph, &triangles()).unwrap();
        for (a, b) in one.iter().zip(&three) {
            assert_eq!(a.run_id, b.run_id);
            assert_eq!(a.jaccard, b.jaccard);
            assert_eq!(a.omega, b.omega);
            assert_eq!(a.percent_changed, b.percent_changed);
            assert!((a.ari.unwrap() - b.ari.unwrap()).abs() < 1e-12);
            assert!((a.nmi.unwrap() - b.nmi.unwrap()).abs() < 1e-12);
        }
        assert_eq!(one.len(), 3);
    }

    #[test]
    fn test_analyzer_rejects_invalid_detector() {
        let graph = UnGraph::<usize, f64>::new_undirected();
        let analyzer = StabilityAnalyzer::new(WeightedSlpa::new().with_iterations(0));
        assert!(analyzer.run(&graph, &triangles()).is_err());
    }

    fn arbitrary_partition() -> impl Strategy<Value = Partition<usize>> {
        proptest::collection::vec(proptest::collection::vec(0usize..20, 1..8), 1..6)
            .prop_map(Partition::overlapping)
    }

    proptest! {
        #[test]
        fn self_comparison_identities(partition in arbitrary_partition()) {
            let m = partition.membership();
            let nodes: Vec<&usize> = m.nodes().collect();
            for node in &nodes {
                let c = m.get(node).unwrap();
                prop_assert_eq!(jaccard_similarity(c, c), 1.0);
            }
            if nodes.len() >= 2 {
                prop_assert_eq!(omega_index(&m, &m, &nodes), 1.0);
            }
        }
    }
}
