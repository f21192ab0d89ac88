//! Error types for STIR feature selection.

use std::fmt;

/// Which side of the neighbor partition ran short.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NeighborKind {
    /// Same-label neighbors.
    Hit,
    /// Different-label neighbors.
    Miss,
}

impl fmt::Display for NeighborKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NeighborKind::Hit => f.write_str("hit"),
            NeighborKind::Miss => f.write_str("miss"),
        }
    }
}

/// Error type for all fallible operations in this crate.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StirError {
    /// Returned when the matrix has fewer than two rows.
    #[error("at least 2 samples are required, got {n_samples}")]
    InsufficientSamples {
        /// Number of rows supplied.
        n_samples: usize,
    },

    /// Returned when the matrix has no columns.
    #[error("feature matrix has no features")]
    NoFeatures,

    /// Returned when a row's length differs from the first row's.
    #[error("row {row} has {len} values, expected {expected}")]
    RaggedRows {
        /// Index of the offending row.
        row: usize,
        /// Its length.
        len: usize,
        /// Length of the first row.
        expected: usize,
    },

    /// Returned when a flat buffer does not match the declared shape.
    #[error("buffer of length {len} does not match shape {n_samples}x{n_features}")]
    ShapeMismatch {
        /// Length of the buffer.
        len: usize,
        /// Declared row count.
        n_samples: usize,
        /// Declared column count.
        n_features: usize,
    },

    /// Returned when the label count differs from the row count.
    #[error("got {labels} labels for {n_samples} samples")]
    LabelLengthMismatch {
        /// Number of labels.
        labels: usize,
        /// Number of rows.
        n_samples: usize,
    },

    /// Returned when the feature-name count differs from the column count.
    #[error("got {names} feature names for {n_features} features")]
    FeatureNamesMismatch {
        /// Number of names.
        names: usize,
        /// Number of columns.
        n_features: usize,
    },

    /// Returned when the matrix contains NaN or infinity.
    #[error("non-finite value at row {row}, column {column}")]
    NonFiniteInput {
        /// Row of the first non-finite value.
        row: usize,
        /// Column of the first non-finite value.
        column: usize,
    },

    /// Returned when a column's `max - min` overflows to infinity.
    #[error("range of column {column} overflows f64")]
    RangeOverflow {
        /// First column whose range is not finite.
        column: usize,
    },

    /// Returned when k is zero.
    #[error("k must be >= 1, got {k}")]
    InvalidK {
        /// The invalid k value.
        k: usize,
    },

    /// Returned when the selection size is zero.
    #[error("n_features_to_keep must be >= 1, got {n}")]
    InvalidFeaturesToKeep {
        /// The invalid selection size.
        n: usize,
    },

    /// Returned when the constant-feature epsilon is non-finite or non-positive.
    #[error("range epsilon must be finite and positive, got {epsilon}")]
    InvalidEpsilon {
        /// The invalid epsilon value.
        epsilon: f64,
    },

    /// Returned when a Minkowski order is zero or does not fit in an `i32`.
    #[error("Minkowski order p must be in 1..=2147483647, got {p}")]
    InvalidMinkowskiP {
        /// The invalid order.
        p: u32,
    },

    /// Returned when a sample cannot find k hits or k misses.
    #[error("sample {sample} has only {available} {kind} neighbors available, k = {k}")]
    InsufficientNeighbors {
        /// First sample that ran short.
        sample: usize,
        /// Which side ran short.
        kind: NeighborKind,
        /// How many candidates of that kind exist.
        available: usize,
        /// The requested k.
        k: usize,
    },

    /// Returned when `transform` receives a matrix of the wrong width.
    #[error("model was fitted on {expected} features, got {got}")]
    FeatureCountMismatch {
        /// Column count seen during fit.
        expected: usize,
        /// Column count supplied.
        got: usize,
    },

    /// Returned when `transform` is called before `fit`.
    #[error("model is not fitted, call fit() first")]
    NotFitted,
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, StirError>;
