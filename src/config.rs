//! Plain configuration records.
//!
//! Algorithms are configured through their builders
//! ([`WeightedSlpa::with_iterations`](crate::WeightedSlpa::with_iterations)
//! and friends); the records here are the serde-friendly form of the same
//! settings, so a whole analysis can be described in one TOML document:
//!
//! ```toml
//! workers = 8
//! seeds = [42, 101, 202]
//! mode = "edge_removal"
//!
//! [slpa]
//! iterations = 20
//! threshold = 0.1
//! seed = 42
//! ```

use crate::community::slpa::validate_threshold;
use crate::error::{Error, Result};
use crate::stability::PerturbationMode;
use serde::{Deserialize, Serialize};

/// Seeds used for repeated runs when none are configured.
pub const DEFAULT_SEEDS: [u64; 5] = [42, 101, 202, 303, 404];

/// Weighted SLPA settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SlpaConfig {
    /// Number of propagation rounds (t, default: 20).
    pub iterations: usize,
    /// Minimum label frequency kept (r, default: 0.1).
    pub threshold: f64,
    /// Random seed (default: none).
    pub seed: Option<u64>,
}

impl Default for SlpaConfig {
    fn default() -> Self {
        Self {
            iterations: 20,
            threshold: 0.1,
            seed: None,
        }
    }
}

impl SlpaConfig {
    /// Reject `t < 1` and `r` outside `(0, 1]`.
    pub fn validate(&self) -> Result<()> {
        if self.iterations < 1 {
            return Err(Error::InvalidParameter {
                name: "iterations",
                message: "must be at least 1",
            });
        }
        validate_threshold(self.threshold)
    }
}

/// Settings for a full detection + robustness analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Baseline detector settings.
    pub slpa: SlpaConfig,
    /// Worker threads for parallel evaluation (default: rayon's pool size).
    pub workers: usize,
    /// Seeds for the repeated runs of the stability analysis.
    pub seeds: Vec<u64>,
    /// How the graph used for repeated runs was perturbed.
    pub mode: PerturbationMode,
    /// Min–max normalise edge weights before detection (default: true).
    pub normalize_weights: bool,
    /// Also report ARI/NMI on disjoint projections (default: true).
    pub disjoint_metrics: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            slpa: SlpaConfig::default(),
            workers: rayon::current_num_threads(),
            seeds: DEFAULT_SEEDS.to_vec(),
            mode: PerturbationMode::Reseed,
            normalize_weights: true,
            disjoint_metrics: true,
        }
    }
}

impl AnalysisConfig {
    /// Parse and validate a TOML document. Missing keys take defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject invalid SLPA settings and a zero worker count.
    pub fn validate(&self) -> Result<()> {
        self.slpa.validate()?;
        if self.workers == 0 {
            return Err(Error::InvalidParameter {
                name: "workers",
                message: "must be at least 1",
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.slpa.iterations, 20);
        assert!((config.slpa.threshold - 0.1).abs() < 1e-12);
        assert_eq!(config.seeds, vec![42, 101, 202, 303, 404]);
        assert!(config.workers >= 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = AnalysisConfig::from_toml_str(
            r#"
            workers = 2
            mode = "node_removal"

            [slpa]
            threshold = 0.3
            seed = 42
            "#,
        )
        .unwrap();
        assert_eq!(config.workers, 2);
        assert_eq!(config.mode, PerturbationMode::NodeRemoval);
        assert_eq!(config.slpa.iterations, 20);
        assert_eq!(config.slpa.seed, Some(42));
        assert!(config.normalize_weights);
    }

    #[test]
    fn test_from_toml_rejects_invalid_values() {
        assert!(matches!(
            AnalysisConfig::from_toml_str("workers = 0"),
            Err(Error::InvalidParameter { name: "workers", .. })
        ));
        assert!(matches!(
            AnalysisConfig::from_toml_str("[slpa]\nthreshold = 1.5"),
            Err(Error::InvalidParameter { name: "threshold", .. })
        ));
        assert!(matches!(
            AnalysisConfig::from_toml_str("[slpa]\niterations = 0"),
            Err(Error::InvalidParameter { name: "iterations", .. })
        ));
        assert!(matches!(
            AnalysisConfig::from_toml_str("workers = \"many\""),
            Err(Error::Config(_))
        ));
    }
}
