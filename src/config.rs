//! Configuration for STIR fitting.

use crate::error::StirError;

/// Distance used to rank neighbors in the min-max scaled space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DistanceMetric {
    /// Straight-line distance. This is what STIR is defined with.
    #[default]
    Euclidean,
    Manhattan,
    /// `(Σ |a - b|^p)^(1/p)`; p must be in `1..=i32::MAX`.
    Minkowski { p: u32 },
}

/// Configuration for a STIR fit.
///
/// # Example
///
/// ```
/// use stir_selection::{DistanceMetric, StirConfig};
///
/// let config = StirConfig::new(5)
///     .with_k(2)
///     .with_metric(DistanceMetric::Euclidean);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default, deny_unknown_fields))]
pub struct StirConfig {
    /// Maximum number of features kept by the selection.
    n_features_to_keep: usize,
    /// Number of nearest hits and nearest misses per sample.
    k: usize,
    /// Stand-in range for constant features.
    range_epsilon: f64,
    metric: DistanceMetric,
}

impl StirConfig {
    pub const DEFAULT_N_FEATURES_TO_KEEP: usize = 10;
    pub const DEFAULT_RANGE_EPSILON: f64 = 1e-14;

    /// Creates a configuration keeping at most `n_features_to_keep` features.
    ///
    /// Defaults: `k = 1`, `range_epsilon = 1e-14`, `metric = Euclidean`.
    pub fn new(n_features_to_keep: usize) -> Self {
        Self {
            n_features_to_keep,
            k: 1,
            range_epsilon: Self::DEFAULT_RANGE_EPSILON,
            metric: DistanceMetric::Euclidean,
        }
    }

    pub fn with_k(mut self, k: usize) -> Self {
        self.k = k;
        self
    }

    pub fn with_metric(mut self, metric: DistanceMetric) -> Self {
        self.metric = metric;
        self
    }

    pub fn with_range_epsilon(mut self, range_epsilon: f64) -> Self {
        self.range_epsilon = range_epsilon;
        self
    }

    pub fn n_features_to_keep(&self) -> usize {
        self.n_features_to_keep
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn range_epsilon(&self) -> f64 {
        self.range_epsilon
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    /// Validates this configuration.
    ///
    /// Checks, in order: `n_features_to_keep >= 1`, `k >= 1`, a finite positive
    /// epsilon, and a Minkowski order in `1..=i32::MAX`.
    pub fn validate(&self) -> Result<(), StirError> {
        if self.n_features_to_keep < 1 {
            return Err(StirError::InvalidFeaturesToKeep {
                n: self.n_features_to_keep,
            });
        }
        if self.k < 1 {
            return Err(StirError::InvalidK { k: self.k });
        }
        if !self.range_epsilon.is_finite() || self.range_epsilon <= 0.0 {
            return Err(StirError::InvalidEpsilon {
                epsilon: self.range_epsilon,
            });
        }
        if let DistanceMetric::Minkowski { p } = self.metric {
            if p < 1 || i32::try_from(p).is_err() {
                return Err(StirError::InvalidMinkowskiP { p });
            }
        }
        Ok(())
    }
}

impl Default for StirConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_N_FEATURES_TO_KEEP)
    }
}
