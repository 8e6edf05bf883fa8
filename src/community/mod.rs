//! Overlapping community detection.
//!
//! Disjoint methods (Louvain, Leiden, plain label propagation) give every
//! node exactly one community. Real networks often don't work that way: a
//! patient can sit between two clinical profiles, an entity can belong to
//! several topical clusters. Overlapping methods return a list of node sets
//! that may share members.
//!
//! ## Speaker-Listener Label Propagation
//!
//! Plain label propagation keeps one label per node and overwrites it.
//! SLPA instead keeps a growing **memory** of every label a node has
//! adopted. Labels that show up often in a node's memory are its
//! communities, so one node can end up with several.
//!
//! The weighted variant here scales each proposed label by the weight of
//! the edge it travelled along, so strong ties dominate weak ones.
//!
//! ## Usage
//!
//! ```rust
//! use petgraph::graph::UnGraph;
//! use overlap::community::{OverlappingDetection, WeightedSlpa};
//!
//! let mut graph = UnGraph::<u32, f64>::new_undirected();
//! let a = graph.add_node(0);
//! let b = graph.add_node(1);
//! let c = graph.add_node(2);
//! graph.add_edge(a, b, 1.0);
//! graph.add_edge(b, c, 0.5);
//!
//! let slpa = WeightedSlpa::new().with_iterations(20).with_threshold(0.1).with_seed(42);
//! let partition = slpa.detect(&graph).unwrap();
//! // partition.communities()[i] = members of community i
//! ```
//!
//! ## References
//!
//! - Xie, Szymanski, Liu (2011). "SLPA: Uncovering Overlapping Communities
//!   in Social Networks via a Speaker-Listener Interaction Dynamic Process."
//! - Raghavan, Albert, Kumara (2007). "Near linear time algorithm to detect
//!   community structures in large-scale networks."

pub(crate) mod slpa;
mod traits;

pub use slpa::{run_weighted_slpa, LabelMemory, WeightedSlpa};
pub use traits::OverlappingDetection;
