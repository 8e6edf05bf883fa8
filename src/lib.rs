//! # overlap
//!
//! Overlapping community detection and its evaluation:
//!
//! - [`WeightedSlpa`]: weighted Speaker-Listener Label Propagation, producing
//!   node sets that may share members.
//! - [`overlapping_modularity`]: modularity with fractional (1/k) membership,
//!   scored in parallel across communities.
//! - [`StabilityAnalyzer`] / [`partition_stability`]: Jaccard, Omega and
//!   disjoint ARI/NMI between a baseline partition and repeated runs under
//!   reseeding or graph perturbation.
//!
//! Graphs are `petgraph` undirected graphs whose node weights are the node
//! identifiers. The crate does no I/O of its own beyond the CSV helpers in
//! [`io`]; logging goes through `tracing`.

pub mod community;
pub mod config;
/// Error types used across `overlap`.
pub mod error;
pub mod graph;
pub mod io;
pub mod metrics;
pub mod partition;
pub mod perturb;
pub mod pipeline;
mod pool;
pub mod quality;
pub mod stability;


pub use community::{run_weighted_slpa, LabelMemory, OverlappingDetection, WeightedSlpa};
pub use config::{AnalysisConfig, SlpaConfig};
pub use error::{Error, Result};
pub use graph::{normalize_weights, EdgeWeight, NodeId, WEIGHT_EPSILON};
pub use metrics::{ari, nmi};
pub use partition::{Membership, Overlap, Partition, PartitionSummary};
pub use pipeline::{DetectionReport, Pipeline};
pub use quality::{
    conductance, modularity, overlapping_modularity, EdgeWeighting, FitnessSummary,
    OverlappingModularity,
};
pub use stability::{
    partition_stability, Candidate, PerturbationMode, StabilityAnalyzer, StabilityRecord,
};
