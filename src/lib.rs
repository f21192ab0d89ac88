//! STIR (STatistical Inference Relief) feature selection.
//!
//! Scores each feature of a labeled matrix by how much more it differs between
//! a sample and its nearest *misses* (other class) than between the sample and
//! its nearest *hits* (same class), then keeps the top-scoring features.
//!
//! # Quick start
//!
//! ```
//! use stir_selection::{FeatureMatrix, Stir};
//!
//! // column 1 follows the label, column 0 does not
//! let x = FeatureMatrix::from_rows(vec![
//!     vec![0.0, 1.0],
//!     vec![1.0, 1.0],
//!     vec![0.0, 0.0],
//!     vec![1.0, 0.0],
//! ])
//! .unwrap();
//! let y = [1, 1, -1, -1];
//!
//! let fitted = Stir::new(1).fit(&x, &y).unwrap();
//! assert_eq!(fitted.selected_features(), &[1]);
//! assert_eq!(fitted.transform(&x).unwrap().shape(), (4, 1));
//! ```
//!
//! With the `python` feature the crate also builds a Python extension module
//! exposing a `STIR` class with `fit` / `transform` / `fit_transform`.

pub mod common_types;
pub mod config;
pub mod error;
pub mod stir;

pub use common_types::FeatureMatrix;
pub use config::{DistanceMetric, StirConfig};
pub use error::{NeighborKind, Result, StirError};
pub use stir::distance::{DistanceMatrix, Normalization, compute_distances};
pub use stir::neighbors::{NeighborSet, find_neighbors};
pub use stir::weights::{compute_scores, rank_features};
pub use stir::{FittedStir, Stir, StirSelector};

#[cfg(feature = "python")]
mod python {
    use pyo3::exceptions::{PyRuntimeError, PyValueError};
    use pyo3::prelude::*;

    use crate::{FeatureMatrix, StirError, StirSelector};

    impl From<StirError> for PyErr {
        fn from(err: StirError) -> PyErr {
            match err {
                StirError::NotFitted => PyRuntimeError::new_err(err.to_string()),
                other => PyValueError::new_err(other.to_string()),
            }
        }
    }

    /// Class labels as they arrive from Python; only equality is used.
    #[derive(FromPyObject, Debug, Clone, PartialEq)]
    enum PyLabel {
        Int(i64),
        Float(f64),
        Str(String),
    }

    /// 2^63, exact in f64.
    const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

    impl PyLabel {
        /// Integral floats become `Int`, so `1` and `1.0` share a class as they
        /// do in Python.
        fn canonical(self) -> Self {
            match self {
                PyLabel::Float(v) if v.fract() == 0.0 && (-I64_BOUND..I64_BOUND).contains(&v) => {
                    PyLabel::Int(v as i64)
                }
                other => other,
            }
        }
    }

    fn canonical_labels(y: Vec<PyLabel>) -> Vec<PyLabel> {
        y.into_iter().map(PyLabel::canonical).collect()
    }

    fn build_matrix(
        x: Vec<Vec<f64>>,
        feature_names: Option<Vec<String>>,
    ) -> PyResult<FeatureMatrix<f64>> {
        let matrix = FeatureMatrix::from_rows(x)?;
        Ok(match feature_names {
            Some(names) => matrix.with_feature_names(names)?,
            None => matrix,
        })
    }

    #[pyclass(name = "STIR")]
    struct PyStir {
        selector: StirSelector,
    }

    #[pymethods]
    impl PyStir {
        #[new]
        #[pyo3(signature = (n_features_to_keep = 10))]
        fn new(n_features_to_keep: usize) -> Self {
            PyStir {
                selector: StirSelector::new(n_features_to_keep),
            }
        }

        #[pyo3(signature = (x, y, feature_names = None, k = 1))]
        fn fit(
            &mut self,
            x: Vec<Vec<f64>>,
            y: Vec<PyLabel>,
            feature_names: Option<Vec<String>>,
            k: usize,
        ) -> PyResult<()> {
            let matrix = build_matrix(x, feature_names)?;
            let config = self.selector.config().clone().with_k(k);
            self.selector
                .fit_with_config(config, &matrix, &canonical_labels(y))?;
            Ok(())
        }

        fn transform(&self, x: Vec<Vec<f64>>) -> PyResult<Vec<Vec<f64>>> {
            Ok(self.selector.fitted()?.transform_rows(&x)?)
        }

        #[pyo3(signature = (x, y, feature_names = None, k = 1))]
        fn fit_transform(
            &mut self,
            x: Vec<Vec<f64>>,
            y: Vec<PyLabel>,
            feature_names: Option<Vec<String>>,
            k: usize,
        ) -> PyResult<Vec<Vec<f64>>> {
            let matrix = build_matrix(x, feature_names)?;
            let config = self.selector.config().clone().with_k(k);
            self.selector
                .fit_with_config(config, &matrix, &canonical_labels(y))?;
            Ok(self.selector.transform(&matrix)?.into_rows())
        }

        #[getter]
        fn n_features_to_keep(&self) -> usize {
            self.selector.config().n_features_to_keep()
        }

        /// `None` until fitted.
        #[getter]
        fn feature_scores(&self) -> Option<Vec<f64>> {
            self.selector.feature_scores().map(<[f64]>::to_vec)
        }

        #[getter]
        fn selected_features(&self) -> Option<Vec<usize>> {
            self.selector.selected_features().map(<[usize]>::to_vec)
        }

        /// Display name of every fitted feature, index order.
        #[getter]
        fn feature_names(&self) -> Option<Vec<String>> {
            let fitted = self.selector.fitted().ok()?;
            Some((0..fitted.n_features()).map(|f| fitted.feature_name(f)).collect())
        }
    }

    #[pymodule]
    fn stir_selection(m: &Bound<'_, PyModule>) -> PyResult<()> {
        m.add_class::<PyStir>()?;
        Ok(())
    }

}
