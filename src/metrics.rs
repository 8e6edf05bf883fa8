//! Agreement between two flat (one label per node) assignments.
//!
//! Used by the stability analysis on *disjoint projections* of overlapping
//! partitions, where each node keeps only its lowest-indexed community.
//! That projection throws overlap away, so these scores are a coarse,
//! secondary signal next to Jaccard and Omega.
//!
//! | Metric | Range | Best |
//! |--------|-------|------|
//! | [`nmi`] | [0, 1] | 1 |
//! | [`ari`] | [-1, 1] | 1 |
//!
//! # Example
//!
//! ```rust
//! use overlap::metrics::{ari, nmi};
//!
//! let pred = [0, 0, 1, 1, 2, 2];
//! let truth = [0, 0, 0, 1, 1, 1];
//!
//! let nmi_score = nmi(&pred, &truth);
//! let ari_score = ari(&pred, &truth);
//! assert!(nmi_score < 1.0 && ari_score < 1.0);
//! ```
//!
//! # References
//!
//! - Hubert & Arabie (1985). "Comparing partitions" (ARI)
//! - Strehl & Ghosh (2002). "Cluster ensembles" (NMI)

use std::collections::HashMap;
use std::hash::Hash;

/// Normalized Mutual Information between two assignments.
///
/// ```text
/// NMI(U, V) = 2 * I(U; V) / (H(U) + H(V))
/// ```
///
/// Two constant assignments agree perfectly (1.0). Mismatched lengths or
/// empty input score 0.0.
///
/// ```rust
/// use overlap::metrics::nmi;
///
/// let pred = [1, 1, 0, 0];
/// let truth = [0, 0, 1, 1];
/// assert!((nmi(&pred, &truth) - 1.0).abs() < 1e-9);
/// ```
pub fn nmi<L: Eq + Hash + Copy>(pred: &[L], truth: &[L]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let n = pred.len() as f64;
    let joint = contingency(pred, truth);
    let p_pred = counts(pred);
    let p_truth = counts(truth);

    let mut mi = 0.0;
    for (&(p, t), &count) in &joint {
        let p_joint = count as f64 / n;
        let p_p = p_pred[&p] as f64 / n;
        let p_t = p_truth[&t] as f64 / n;
        mi += p_joint * (p_joint / (p_p * p_t)).ln();
    }

    let denom = entropy(&p_pred, n) + entropy(&p_truth, n);
    if denom > 0.0 {
        (2.0 * mi / denom).clamp(0.0, 1.0)
    } else {
        1.0
    }
}

/// Adjusted Rand Index between two assignments.
///
/// 0 for chance-level agreement, 1 for identical groupings. Mismatched
/// lengths or empty input score 0.0.
pub fn ari<L: Eq + Hash + Copy>(pred: &[L], truth: &[L]) -> f64 {
    if pred.len() != truth.len() || pred.is_empty() {
        return 0.0;
    }

    let joint = contingency(pred, truth);
    let sum_comb_ij: f64 = joint.values().map(|&c| comb2(c)).sum();
    let sum_comb_a: f64 = counts(pred).values().map(|&a| comb2(a)).sum();
    let sum_comb_b: f64 = counts(truth).values().map(|&b| comb2(b)).sum();
    let comb_n = comb2(pred.len());

    if comb_n == 0.0 {
        return 1.0;
    }

    let expected = sum_comb_a * sum_comb_b / comb_n;
    let max_index = (sum_comb_a + sum_comb_b) / 2.0;

    let denom = max_index - expected;
    if denom.abs() < 1e-10 {
        return 1.0;
    }

    (sum_comb_ij - expected) / denom
}

fn contingency<L: Eq + Hash + Copy>(pred: &[L], truth: &[L]) -> HashMap<(L, L), usize> {
    let mut table = HashMap::new();
    for (&p, &t) in pred.iter().zip(truth) {
        *table.entry((p, t)).or_insert(0) += 1;
    }
    table
}

fn counts<L: Eq + Hash + Copy>(labels: &[L]) -> HashMap<L, usize> {
    let mut out = HashMap::new();
    for &l in labels {
        *out.entry(l).or_insert(0) += 1;
    }
    out
}

fn entropy<L>(counts: &HashMap<L, usize>, n: f64) -> f64 {
    counts
        .values()
        .map(|&c| {
            let p = c as f64 / n;
            if p > 0.0 {
                -p * p.ln()
            } else {
                0.0
            }
        })
        .sum()
}

fn comb2(n: usize) -> f64 {
    if n < 2 {
        0.0
    } else {
        (n * (n - 1) / 2) as f64
    }
}
