//! Flat-table persistence.
//!
//! A partition is stored as one CSV row per membership:
//!
//! ```text
//! nodeId,communityId
//! 0,0
//! 1,0
//! 2,0
//! 2,1
//! 3,1
//! ```
//!
//! A node in several communities simply has several rows, so overlaps
//! round-trip exactly. Community ids in a file need not be contiguous; on
//! read, communities are numbered by first appearance.

use crate::error::Result;
use crate::graph::NodeId;
use crate::partition::{Overlap, Partition};
use crate::stability::StabilityRecord;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::io::{Read, Write};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssignmentRow<N> {
    node_id: N,
    community_id: u64,
}

/// Write `partition` as `nodeId,communityId` rows with a header.
pub fn write_assignments<N, W>(partition: &Partition<N>, writer: W) -> Result<()>
where
    N: NodeId + Serialize,
    W: Write,
{
    let mut out = csv::Writer::from_writer(writer);
    for (idx, community) in partition.communities().iter().enumerate() {
        for node in community {
            out.serialize(AssignmentRow {
                node_id: node,
                community_id: idx as u64,
            })?;
        }
    }
    out.flush()?;
    Ok(())
}

/// Read `nodeId,communityId` rows back into a partition tagged `overlap`.
///
/// Fails with [`Error::OverlappingMembers`](crate::Error::OverlappingMembers)
/// if `overlap` is [`Overlap::Disjoint`] but a node has several rows.
pub fn read_assignments<N, R>(reader: R, overlap: Overlap) -> Result<Partition<N>>
where
    N: NodeId + DeserializeOwned,
    R: Read,
{
    let mut input = csv::Reader::from_reader(reader);
    let mut slot: HashMap<u64, usize> = HashMap::new();
    let mut communities: Vec<Vec<N>> = Vec::new();

    for row in input.deserialize() {
        let row: AssignmentRow<N> = row?;
        let next = communities.len();
        let idx = *slot.entry(row.community_id).or_insert(next);
        if idx == next {
            communities.push(Vec::new());
        }
        communities[idx].push(row.node_id);
    }

    Partition::with_overlap(communities, overlap)
}

/// Write stability records, one row per run.
pub fn write_stability_records<W: Write>(records: &[StabilityRecord], writer: W) -> Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for record in records {
        out.serialize(record)?;
    }
    out.flush()?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::stability::PerturbationMode;

    #[test]
    fn test_write_format() {
        let partition = Partition::overlapping(vec![vec![0u32, 1, 2], vec![2, 3]]);
        let mut buf = Vec::new();
        write_assignments(&partition, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "nodeId,communityId\n0,0\n1,0\n2,0\n2,1\n3,1\n");
    }

    #[test]
    fn test_overlap_survives_round_trip() {
        let partition = Partition::overlapping(vec![
            vec!["p1".to_string(), "p2".to_string()],
            vec!["p2".to_string(), "p3".to_string()],
        ]);
        let mut buf = Vec::new();
        write_assignments(&partition, &mut buf).unwrap();

        let back: Partition<String> = read_assignments(buf.as_slice(), Overlap::Overlapping).unwrap();
        assert_eq!(back, partition);
        assert_eq!(back.membership(), partition.membership());
    }

    #[test]
    fn test_read_groups_by_first_appearance() {
        let text = "nodeId,communityId\n5,9\n6,2\n7,9\n";
        let p: Partition<u32> = read_assignments(text.as_bytes(), Overlap::Disjoint).unwrap();
        assert_eq!(p.communities(), &[vec![5, 7], vec![6]]);
    }

    #[test]
    fn test_read_disjoint_rejects_overlap() {
        let text = "nodeId,communityId\n1,0\n1,1\n";
        let result: Result<Partition<u32>> = read_assignments(text.as_bytes(), Overlap::Disjoint);
        assert!(matches!(result, Err(Error::OverlappingMembers(_))));
    }

    #[test]
    fn test_read_malformed_row() {
        let text = "nodeId,communityId\n1,abc\n";
        let result: Result<Partition<u32>> = read_assignments(text.as_bytes(), Overlap::Overlapping);
        assert!(matches!(result, Err(Error::Csv(_))));
    }

    #[test]
    fn test_write_stability_records() {
        let records = vec![StabilityRecord {
            run_id: 42,
            mode: PerturbationMode::EdgeRemoval,
            compared_nodes: 3,
            jaccard: 1.0,
            omega: 0.5,
            percent_changed: 0.0,
            ari: None,
            nmi: Some(1.0),
        }];
        let mut buf = Vec::new();
        write_stability_records(&records, &mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let mut lines = text.lines();
        assert_eq!(
            lines.next(),
            Some("run_id,mode,compared_nodes,jaccard,omega,percent_changed,ari,nmi")
        );
        assert_eq!(lines.next(), Some("42,edge_removal,3,1.0,0.5,0.0,,1.0"));
    }
}
