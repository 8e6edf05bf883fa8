//! End-to-end analysis driven by an [`AnalysisConfig`].
//!
//! ```text
//! graph ─▶ (normalise) ─▶ weighted SLPA ─▶ partition ─┬─▶ quality
//!                                                     └─▶ baseline
//! perturbed graph ─▶ SLPA × seeds ─▶ compare with baseline ─▶ records
//! ```

use crate::community::{OverlappingDetection, WeightedSlpa};
use crate::config::AnalysisConfig;
use crate::error::Result;
use crate::graph::{normalize_weights, NodeId};
use crate::partition::{Partition, PartitionSummary};
use crate::quality::{conductance, modularity, overlapping_modularity, FitnessSummary};
use crate::stability::{StabilityAnalyzer, StabilityRecord};
use petgraph::graph::UnGraph;
use std::borrow::Cow;
use tracing::info;

/// Result of a baseline detection.
#[derive(Debug, Clone)]
pub struct DetectionReport<N> {
    /// Communities found.
    pub partition: Partition<N>,
    /// Overlapping modularity.
    pub overlapping_modularity: f64,
    /// Ordinary modularity, when the partition happens to be disjoint.
    pub modularity: Option<f64>,
    /// Conductance summary.
    pub conductance: FitnessSummary,
    /// Size and overlap statistics.
    pub summary: PartitionSummary<N>,
}

/// Detection and robustness analysis with one configuration.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: AnalysisConfig,
}

impl Pipeline {
    /// Validate `config` and build a pipeline.
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// Configuration in use.
    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    fn detector(&self) -> WeightedSlpa {
        WeightedSlpa::from_config(&self.config.slpa)
    }

    fn prepare<'g, N: NodeId>(&self, graph: &'g UnGraph<N, f64>) -> Cow<'g, UnGraph<N, f64>> {
        if self.config.normalize_weights {
            Cow::Owned(normalize_weights(graph))
        } else {
            Cow::Borrowed(graph)
        }
    }

    /// Run the baseline detection on `graph` and score it.
    pub fn detect<N: NodeId>(&self, graph: &UnGraph<N, f64>) -> Result<DetectionReport<N>> {
        let prepared = self.prepare(graph);
        let graph: &UnGraph<N, f64> = &prepared;
        let partition = self.detector().detect(graph)?;

        let workers = self.config.workers;
        let q_overlap = overlapping_modularity(graph, &partition, workers)?;
        let q = if partition.is_disjoint() {
            let disjoint = partition.clone().into_disjoint()?;
            Some(modularity(graph, &disjoint)?)
        } else {
            None
        };
        let phi = conductance(graph, &partition, workers)?;
        let summary = partition.summary(graph.node_count());

        info!(
            communities = summary.num_communities,
            covered = summary.num_nodes_covered,
            overlapping = summary.overlapping_nodes.len(),
            overlapping_modularity = q_overlap,
            "weighted SLPA detection finished"
        );

        Ok(DetectionReport {
            partition,
            overlapping_modularity: q_overlap,
            modularity: q,
            conductance: phi,
            summary,
        })
    }

    /// Re-run detection on `graph` (usually a perturbed copy) for every
    /// configured seed and compare each run with `baseline`.
    pub fn robustness<N: NodeId>(
        &self,
        graph: &UnGraph<N, f64>,
        baseline: &Partition<N>,
    ) -> Result<Vec<StabilityRecord>> {
        let prepared = self.prepare(graph);
        let graph: &UnGraph<N, f64> = &prepared;
        StabilityAnalyzer::new(self.detector())
            .with_seeds(self.config.seeds.iter().copied())
            .with_mode(self.config.mode)
            .with_disjoint_metrics(self.config.disjoint_metrics)
            .with_workers(self.config.workers)
            .run(graph, baseline)
    }
}
