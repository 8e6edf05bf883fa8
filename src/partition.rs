//! Community sets shared by detection, evaluation and stability analysis.
//!
//! A [`Partition`] is an ordered list of communities, each a set of node
//! identifiers, plus an explicit [`Overlap`] tag. The tag decides which
//! evaluation formulas apply: disjoint-only measures such as
//! [`modularity`](crate::quality::modularity) refuse overlapping input
//! instead of silently giving a wrong answer.

use crate::error::{Error, Result};
use crate::graph::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Whether a partition may place a node in more than one community.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Overlap {
    /// Nodes may belong to zero, one or many communities.
    Overlapping,
    /// Every node belongs to at most one community.
    Disjoint,
}

/// Ordered list of (possibly overlapping) communities.
#[derive(Debug, Clone, PartialEq)]
pub struct Partition<N> {
    communities: Vec<Vec<N>>,
    overlap: Overlap,
}

impl<N: NodeId> Partition<N> {
    /// Build a partition whose communities may overlap.
    ///
    /// Duplicate members inside one community are dropped (first occurrence
    /// wins) and empty communities are omitted.
    pub fn overlapping(communities: Vec<Vec<N>>) -> Self {
        Self {
            communities: normalize(communities),
            overlap: Overlap::Overlapping,
        }
    }

    /// Build a partition that is guaranteed disjoint.
    ///
    /// Fails with [`Error::OverlappingMembers`] if any node is listed in two
    /// communities.
    pub fn disjoint(communities: Vec<Vec<N>>) -> Result<Self> {
        let communities = normalize(communities);
        let mut seen = HashSet::new();
        for node in communities.iter().flatten() {
            if !seen.insert(node) {
                return Err(Error::OverlappingMembers(format!("{node:?}")));
            }
        }
        Ok(Self {
            communities,
            overlap: Overlap::Disjoint,
        })
    }

    /// Build a partition with the given tag, validating disjointness when
    /// the tag demands it.
    pub fn with_overlap(communities: Vec<Vec<N>>, overlap: Overlap) -> Result<Self> {
        match overlap {
            Overlap::Overlapping => Ok(Self::overlapping(communities)),
            Overlap::Disjoint => Self::disjoint(communities),
        }
    }

    /// Partition with no communities.
    pub fn empty(overlap: Overlap) -> Self {
        Self {
            communities: Vec::new(),
            overlap,
        }
    }

    /// Build a disjoint partition from one label per node.
    ///
    /// Communities are ordered by first appearance of their label.
    pub fn from_labels<L: Eq + std::hash::Hash>(
        assignments: impl IntoIterator<Item = (N, L)>,
    ) -> Result<Self> {
        let mut slot: HashMap<L, usize> = HashMap::new();
        let mut communities: Vec<Vec<N>> = Vec::new();
        for (node, label) in assignments {
            let next = communities.len();
            let idx = *slot.entry(label).or_insert(next);
            if idx == next {
                communities.push(Vec::new());
            }
            communities[idx].push(node);
        }
        Self::disjoint(communities)
    }

    /// Communities in order.
    pub fn communities(&self) -> &[Vec<N>] {
        &self.communities
    }

    /// Consume into the plain community list.
    pub fn into_communities(self) -> Vec<Vec<N>> {
        self.communities
    }

    /// Overlap tag.
    pub fn overlap(&self) -> Overlap {
        self.overlap
    }

    /// Number of communities.
    pub fn len(&self) -> usize {
        self.communities.len()
    }

    /// True if there are no communities.
    pub fn is_empty(&self) -> bool {
        self.communities.is_empty()
    }

    /// True if no node appears in two communities, whatever the tag says.
    pub fn is_disjoint(&self) -> bool {
        let mut seen = HashSet::new();
        self.communities.iter().flatten().all(|node| seen.insert(node))
    }

    /// Re-tag an overlapping partition as disjoint if it actually is.
    pub fn into_disjoint(self) -> Result<Self> {
        Self::disjoint(self.communities)
    }

    /// Distinct nodes covered by at least one community, in first-seen order.
    pub fn nodes(&self) -> Vec<&N> {
        let mut seen = HashSet::new();
        self.communities
            .iter()
            .flatten()
            .filter(|node| seen.insert(*node))
            .collect()
    }

    /// Node -> community-index snapshot.
    pub fn membership(&self) -> Membership<N> {
        let mut order = Vec::new();
        let mut map: HashMap<N, BTreeSet<usize>> = HashMap::new();
        for (idx, community) in self.communities.iter().enumerate() {
            for node in community {
                let entry = map.entry(node.clone()).or_insert_with(|| {
                    order.push(node.clone());
                    BTreeSet::new()
                });
                let _ = entry.insert(idx);
            }
        }
        Membership { order, map }
    }

    /// Descriptive statistics; `node_count` is the size of the graph the
    /// partition was computed on.
    pub fn summary(&self, node_count: usize) -> PartitionSummary<N> {
        let sizes: Vec<usize> = self.communities.iter().map(Vec::len).collect();
        let membership = self.membership();

        let overlapping_nodes: Vec<(N, Vec<usize>)> = membership
            .nodes()
            .filter_map(|node| {
                let comms = membership.get(node)?;
                (comms.len() > 1).then(|| (node.clone(), comms.iter().copied().collect()))
            })
            .collect();

        let percent_overlapping = if node_count > 0 {
            100.0 * overlapping_nodes.len() as f64 / node_count as f64
        } else {
            0.0
        };

        PartitionSummary {
            num_communities: sizes.len(),
            num_nodes_covered: membership.len(),
            avg_size: if sizes.is_empty() {
                0.0
            } else {
                sizes.iter().sum::<usize>() as f64 / sizes.len() as f64
            },
            min_size: sizes.iter().copied().min().unwrap_or(0),
            max_size: sizes.iter().copied().max().unwrap_or(0),
            overlapping_nodes,
            percent_overlapping,
        }
    }
}

fn normalize<N: NodeId>(communities: Vec<Vec<N>>) -> Vec<Vec<N>> {
    communities
        .into_iter()
        .map(|community| {
            let mut seen = HashSet::new();
            community
                .into_iter()
                .filter(|node| seen.insert(node.clone()))
                .collect::<Vec<N>>()
        })
        .filter(|community| !community.is_empty())
        .collect()
}

/// Node -> set of community indices for one partition.
///
/// Nodes outside every community are absent. Iteration follows the order in
/// which nodes first appear in the partition.
#[derive(Debug, Clone)]
pub struct Membership<N> {
    order: Vec<N>,
    map: HashMap<N, BTreeSet<usize>>,
}

impl<N: NodeId> PartialEq for Membership<N> {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order && self.map == other.map
    }
}

impl<N: NodeId> Membership<N> {
    /// Community indices of `node`, if it belongs to any.
    pub fn get(&self, node: &N) -> Option<&BTreeSet<usize>> {
        self.map.get(node)
    }

    /// True if `node` belongs to at least one community.
    pub fn contains(&self, node: &N) -> bool {
        self.map.contains_key(node)
    }

    /// Covered nodes in first-seen order.
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        self.order.iter()
    }

    /// Number of covered nodes.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    /// True if no node is covered.
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Size and overlap statistics of a partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartitionSummary<N> {
    /// Number of communities.
    pub num_communities: usize,
    /// Distinct nodes in at least one community.
    pub num_nodes_covered: usize,
    /// Mean community size.
    pub avg_size: f64,
    /// Smallest community size (0 when there are none).
    pub min_size: usize,
    /// Largest community size (0 when there are none).
    pub max_size: usize,
    /// Nodes in more than one community, with their community indices.
    pub overlapping_nodes: Vec<(N, Vec<usize>)>,
    /// Overlapping nodes as a percentage of the graph's node count.
    pub percent_overlapping: f64,
}
