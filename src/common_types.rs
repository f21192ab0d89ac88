//! This module contains the dense feature matrix shared by every stage of the pipeline.

use num_traits::AsPrimitive;

use crate::error::{Result, StirError};

/// A dense, row-major `n_samples x n_features` matrix.
///
/// - `F`: The type of the features (e.g., `f64`, `i32`). Scoring promotes every
///   value to `f64`, so any primitive numeric type works.
///
/// Feature names are optional and purely descriptive: they follow their columns
/// through [`FeatureMatrix::select_columns`] but never influence scoring.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureMatrix<F> {
    data: Vec<F>,
    n_samples: usize,
    n_features: usize,
    feature_names: Option<Vec<String>>,
}

impl<F> FeatureMatrix<F> {
    /// Wraps a row-major buffer of `n_samples * n_features` values.
    pub fn new(data: Vec<F>, n_samples: usize, n_features: usize) -> Result<Self> {
        if data.len() != n_samples * n_features {
            return Err(StirError::ShapeMismatch {
                len: data.len(),
                n_samples,
                n_features,
            });
        }
        Ok(FeatureMatrix {
            data,
            n_samples,
            n_features,
            feature_names: None,
        })
    }

    /// Builds a matrix from a list of rows. All rows must have the same length.
    ///
    /// An empty list yields a `0 x 0` matrix; fitting rejects it later.
    pub fn from_rows(rows: Vec<Vec<F>>) -> Result<Self> {
        let n_samples = rows.len();
        let n_features = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_samples * n_features);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != n_features {
                return Err(StirError::RaggedRows {
                    row,
                    len: values.len(),
                    expected: n_features,
                });
            }
            data.extend(values);
        }
        Ok(FeatureMatrix {
            data,
            n_samples,
            n_features,
            feature_names: None,
        })
    }

    /// Assembles a matrix whose shape the caller has already established.
    pub(crate) fn from_parts(
        data: Vec<F>,
        n_samples: usize,
        n_features: usize,
        feature_names: Option<Vec<String>>,
    ) -> Self {
        debug_assert_eq!(data.len(), n_samples * n_features);
        FeatureMatrix {
            data,
            n_samples,
            n_features,
            feature_names,
        }
    }

    /// Attaches one display name per column.
    pub fn with_feature_names(mut self, names: Vec<String>) -> Result<Self> {
        if names.len() != self.n_features {
            return Err(StirError::FeatureNamesMismatch {
                names: names.len(),
                n_features: self.n_features,
            });
        }
        self.feature_names = Some(names);
        Ok(self)
    }

    pub fn n_samples(&self) -> usize {
        self.n_samples
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// `(n_samples, n_features)`
    pub fn shape(&self) -> (usize, usize) {
        (self.n_samples, self.n_features)
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Returns row `i` as a slice.
    ///
    /// # Panics
    /// Panics if `i >= n_samples`.
    pub fn row(&self, i: usize) -> &[F] {
        &self.data[i * self.n_features..(i + 1) * self.n_features]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[F]> {
        // chunks_exact(0) panics; a zero-width matrix has an empty buffer and yields nothing
        self.data.chunks_exact(self.n_features.max(1))
    }

    /// Iterates over column `j` from top to bottom.
    pub fn column(&self, j: usize) -> impl Iterator<Item = &F> {
        self.data.iter().skip(j).step_by(self.n_features.max(1))
    }

    pub fn as_slice(&self) -> &[F] {
        &self.data
    }

    pub fn into_rows(self) -> Vec<Vec<F>>
    where
        F: Clone,
    {
        self.rows().map(<[F]>::to_vec).collect()
    }
}

impl<F: Clone> FeatureMatrix<F> {
    /// Projects the matrix onto `columns`, in the order given.
    ///
    /// Feature names, when present, are projected the same way.
    ///
    /// # Panics
    /// Panics if any index is `>= n_features`.
    pub fn select_columns(&self, columns: &[usize]) -> FeatureMatrix<F> {
        let mut data = Vec::with_capacity(self.n_samples * columns.len());
        for row in self.rows() {
            data.extend(columns.iter().map(|&j| row[j].clone()));
        }
        let feature_names = self
            .feature_names
            .as_ref()
            .map(|names| columns.iter().map(|&j| names[j].clone()).collect());
        FeatureMatrix {
            data,
            n_samples: self.n_samples,
            n_features: columns.len(),
            feature_names,
        }
    }
}

impl<F> FeatureMatrix<F>
where
    F: AsPrimitive<f64>,
{
    /// Promotes every value to `f64`, keeping names.
    pub fn to_f64(&self) -> FeatureMatrix<f64> {
        FeatureMatrix {
            data: self.data.iter().map(|&v| v.as_()).collect(),
            n_samples: self.n_samples,
            n_features: self.n_features,
            feature_names: self.feature_names.clone(),
        }
    }
}

impl FeatureMatrix<f64> {
    /// Returns `(row, column)` of the first NaN or infinite value, if any.
    pub fn first_non_finite(&self) -> Option<(usize, usize)> {
        self.data
            .iter()
            .position(|v| !v.is_finite())
            .map(|pos| (pos / self.n_features, pos % self.n_features))
    }
}
