//! STIR (STatistical Inference Relief) feature selection.
//!
//! `fit` runs the pipeline once:
//!
//! ```text
//! raw matrix
//!   ├─ Normalization::from_matrix()   per-feature min / range   (distance.rs)
//!   ├─ compute_distances()            pairwise, on [0,1] scale  (distance.rs)
//!   ├─ find_neighbors()               k hits + k misses         (neighbors.rs)
//!   ├─ compute_scores()               mu_miss - mu_hit          (weights.rs)
//!   └─ rank_features()                top n_features_to_keep    (weights.rs)
//! ```

pub mod distance;
pub mod heap_utils;
pub mod neighbors;
pub mod weights;

use num_traits::AsPrimitive;
use tracing::{debug, trace};

use crate::common_types::FeatureMatrix;
use crate::config::StirConfig;
use crate::error::{Result, StirError};
use distance::{Normalization, compute_distances};
use neighbors::find_neighbors;
use weights::{compute_scores, rank_features};

/// Unfitted STIR estimator. Holds configuration only; [`Stir::fit`] produces an
/// immutable [`FittedStir`].
#[derive(Debug, Clone, Default)]
pub struct Stir {
    config: StirConfig,
}

impl Stir {
    /// Keeps at most `n_features_to_keep` features, with `k = 1`.
    pub fn new(n_features_to_keep: usize) -> Self {
        Self::with_config(StirConfig::new(n_features_to_keep))
    }

    pub fn with_config(config: StirConfig) -> Self {
        Stir { config }
    }

    pub fn config(&self) -> &StirConfig {
        &self.config
    }

    /// Scores every feature of `x` against labels `y` and selects the best ones.
    ///
    /// Requires at least two samples and one feature, one label per sample,
    /// finite values whose per-column range fits in an `f64`, and for every sample at least `k` other samples sharing
    /// its label plus `k` samples with a different label.
    pub fn fit<F, L>(&self, x: &FeatureMatrix<F>, y: &[L]) -> Result<FittedStir>
    where
        F: AsPrimitive<f64>,
        L: PartialEq,
    {
        self.config.validate()?;
        let (n_samples, n_features) = x.shape();
        if n_samples < 2 {
            return Err(StirError::InsufficientSamples { n_samples });
        }
        if n_features == 0 {
            return Err(StirError::NoFeatures);
        }
        if y.len() != n_samples {
            return Err(StirError::LabelLengthMismatch {
                labels: y.len(),
                n_samples,
            });
        }

        let k = self.config.k();
        debug!(n_samples, n_features, k, "fitting STIR");

        let x = x.to_f64();
        if let Some((row, column)) = x.first_non_finite() {
            return Err(StirError::NonFiniteInput { row, column });
        }

        let normalization = Normalization::from_matrix(&x, self.config.range_epsilon());
        if let Some(column) = normalization.first_non_finite_range() {
            return Err(StirError::RangeOverflow { column });
        }
        let distances = compute_distances(&normalization.scale(&x), self.config.metric());
        trace!(n_samples, "distance matrix built");

        let neighbors = find_neighbors(&distances, y, k)?;
        let scores = compute_scores(&x, &neighbors, &normalization);
        let ranking = rank_features(&scores);
        let n_keep = self.config.n_features_to_keep().min(n_features);
        let selected = ranking[..n_keep].to_vec();

        debug!(?selected, "STIR fit complete");
        Ok(FittedStir {
            config: self.config.clone(),
            n_features,
            scores,
            ranking,
            selected,
            feature_names: x.feature_names().map(<[String]>::to_vec),
        })
    }

    /// `fit` followed by `transform` on the same matrix.
    pub fn fit_transform<F, L>(&self, x: &FeatureMatrix<F>, y: &[L]) -> Result<FeatureMatrix<F>>
    where
        F: AsPrimitive<f64>,
        L: PartialEq,
    {
        self.fit(x, y)?.transform(x)
    }
}

/// Result of a successful STIR fit. Immutable; refit to change it.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedStir {
    config: StirConfig,
    n_features: usize,
    scores: Vec<f64>,
    ranking: Vec<usize>,
    selected: Vec<usize>,
    feature_names: Option<Vec<String>>,
}

impl FittedStir {
    pub fn config(&self) -> &StirConfig {
        &self.config
    }

    /// Number of columns the model was fitted on.
    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// One score per feature, in column order. Higher is more discriminative.
    pub fn feature_scores(&self) -> &[f64] {
        &self.scores
    }

    /// Every feature index, best first.
    pub fn ranking(&self) -> &[usize] {
        &self.ranking
    }

    /// The kept feature indices, best first.
    pub fn selected_features(&self) -> &[usize] {
        &self.selected
    }

    pub fn feature_names(&self) -> Option<&[String]> {
        self.feature_names.as_deref()
    }

    /// Display name of a feature: its attached name, or its index.
    pub fn feature_name(&self, feature: usize) -> String {
        self.feature_names
            .as_ref()
            .and_then(|names| names.get(feature).cloned())
            .unwrap_or_else(|| feature.to_string())
    }

    /// Display names of the kept features, best first.
    pub fn selected_feature_names(&self) -> Vec<String> {
        self.selected.iter().map(|&f| self.feature_name(f)).collect()
    }

    /// Keeps the selected columns of `x`, best first.
    pub fn transform<F: Clone>(&self, x: &FeatureMatrix<F>) -> Result<FeatureMatrix<F>> {
        if x.n_features() != self.n_features {
            return Err(StirError::FeatureCountMismatch {
                expected: self.n_features,
                got: x.n_features(),
            });
        }
        Ok(x.select_columns(&self.selected))
    }

    /// Like [`FittedStir::transform`] for plain row vectors.
    pub fn transform_rows<F: Clone>(&self, rows: &[Vec<F>]) -> Result<Vec<Vec<F>>> {
        rows.iter()
            .map(|row| {
                if row.len() != self.n_features {
                    return Err(StirError::FeatureCountMismatch {
                        expected: self.n_features,
                        got: row.len(),
                    });
                }
                Ok(self.selected.iter().map(|&j| row[j].clone()).collect())
            })
            .collect()
    }
}

/// Stateful wrapper with the classic `fit` / `transform` object interface.
///
/// Starts unfitted. A successful `fit` replaces the whole fitted state at
/// once; a failed `fit` leaves the previous state in place.
#[derive(Debug, Clone, Default)]
pub struct StirSelector {
    stir: Stir,
    fitted: Option<FittedStir>,
}

impl StirSelector {
    pub fn new(n_features_to_keep: usize) -> Self {
        Self::with_config(StirConfig::new(n_features_to_keep))
    }

    pub fn with_config(config: StirConfig) -> Self {
        StirSelector {
            stir: Stir::with_config(config),
            fitted: None,
        }
    }

    pub fn config(&self) -> &StirConfig {
        self.stir.config()
    }

    /// Replaces the configuration used by the next `fit`. The current fitted
    /// state, if any, is kept.
    pub fn set_config(&mut self, config: StirConfig) {
        self.stir = Stir::with_config(config);
    }

    pub fn fit<F, L>(&mut self, x: &FeatureMatrix<F>, y: &[L]) -> Result<()>
    where
        F: AsPrimitive<f64>,
        L: PartialEq,
    {
        let fitted = self.stir.fit(x, y)?;
        self.fitted = Some(fitted);
        Ok(())
    }

    /// Fits with `config` and adopts it only if the fit succeeds. On error both
    /// the configuration and the fitted state stay as they were.
    pub fn fit_with_config<F, L>(
        &mut self,
        config: StirConfig,
        x: &FeatureMatrix<F>,
        y: &[L],
    ) -> Result<()>
    where
        F: AsPrimitive<f64>,
        L: PartialEq,
    {
        let stir = Stir::with_config(config);
        let fitted = stir.fit(x, y)?;
        self.stir = stir;
        self.fitted = Some(fitted);
        Ok(())
    }

    pub fn transform<F: Clone>(&self, x: &FeatureMatrix<F>) -> Result<FeatureMatrix<F>> {
        self.fitted()?.transform(x)
    }

    pub fn fit_transform<F, L>(&mut self, x: &FeatureMatrix<F>, y: &[L]) -> Result<FeatureMatrix<F>>
    where
        F: AsPrimitive<f64>,
        L: PartialEq,
    {
        self.fit(x, y)?;
        self.transform(x)
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    /// The current fitted state, or [`StirError::NotFitted`].
    pub fn fitted(&self) -> Result<&FittedStir> {
        self.fitted.as_ref().ok_or(StirError::NotFitted)
    }

    pub fn feature_scores(&self) -> Option<&[f64]> {
        self.fitted.as_ref().map(FittedStir::feature_scores)
    }

    pub fn selected_features(&self) -> Option<&[usize]> {
        self.fitted.as_ref().map(FittedStir::selected_features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NeighborKind;

    fn square() -> (FeatureMatrix<i32>, Vec<i32>) {
        let x = FeatureMatrix::from_rows(vec![vec![0, 1], vec![1, 1], vec![0, 0], vec![1, 0]])
            .unwrap();
        (x, vec![1, 1, -1, -1])
    }

    #[test]
    fn test_fit_square_selects_label_column() {
        let (x, y) = square();
        let fitted = Stir::new(1).fit(&x, &y).unwrap();
        assert_eq!(fitted.feature_scores().len(), 2);
        assert!(fitted.feature_scores()[1] > fitted.feature_scores()[0]);
        assert_eq!(fitted.selected_features(), &[1]);
        assert_eq!(fitted.ranking(), &[1, 0]);
    }

    #[test]
    fn test_transform_keeps_rank_order() {
        let (x, y) = square();
        let fitted = Stir::new(10).fit(&x, &y).unwrap();
        let out = fitted.transform(&x).unwrap();
        assert_eq!(out.shape(), (4, 2));
        assert_eq!(out.row(0), &[1, 0]);
        assert_eq!(out.row(3), &[0, 1]);
    }

    #[test]
    fn test_transform_rows_matches_transform() {
        let (x, y) = square();
        let fitted = Stir::new(1).fit(&x, &y).unwrap();
        let rows = x.clone().into_rows();
        assert_eq!(
            fitted.transform_rows(&rows).unwrap(),
            fitted.transform(&x).unwrap().into_rows()
        );
        assert_eq!(
            fitted.transform_rows(&[vec![1, 2, 3]]).unwrap_err(),
            StirError::FeatureCountMismatch {
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn test_feature_names_follow_selection() {
        let (x, y) = square();
        let x = x
            .with_feature_names(vec!["noise".into(), "signal".into()])
            .unwrap();
        let fitted = Stir::new(1).fit(&x, &y).unwrap();
        assert_eq!(fitted.selected_feature_names(), vec!["signal".to_string()]);
        let out = fitted.transform(&x).unwrap();
        assert_eq!(out.feature_names(), Some(&["signal".to_string()][..]));
    }

    #[test]
    fn test_feature_name_falls_back_to_index() {
        let (x, y) = square();
        let fitted = Stir::new(2).fit(&x, &y).unwrap();
        assert_eq!(fitted.feature_names(), None);
        assert_eq!(fitted.selected_feature_names(), vec!["1".to_string(), "0".to_string()]);
    }

    #[test]
    fn test_fit_rejects_bad_input() {
        let (x, y) = square();
        assert_eq!(
            Stir::new(1).fit(&x, &y[..3]).unwrap_err(),
            StirError::LabelLengthMismatch {
                labels: 3,
                n_samples: 4
            }
        );

        let one = FeatureMatrix::from_rows(vec![vec![1.0, 2.0]]).unwrap();
        assert_eq!(
            Stir::new(1).fit(&one, &[0]).unwrap_err(),
            StirError::InsufficientSamples { n_samples: 1 }
        );

        let empty = FeatureMatrix::<f64>::from_rows(vec![]).unwrap();
        assert_eq!(
            Stir::new(1).fit(&empty, &[] as &[i32]).unwrap_err(),
            StirError::InsufficientSamples { n_samples: 0 }
        );

        let no_features = FeatureMatrix::<f64>::new(vec![], 3, 0).unwrap();
        assert_eq!(
            Stir::new(1).fit(&no_features, &[0, 0, 1]).unwrap_err(),
            StirError::NoFeatures
        );

        let nan = FeatureMatrix::from_rows(vec![vec![0.0], vec![f64::NAN]]).unwrap();
        assert_eq!(
            Stir::new(1).fit(&nan, &[0, 1]).unwrap_err(),
            StirError::NonFiniteInput { row: 1, column: 0 }
        );

        assert_eq!(
            Stir::new(0).fit(&x, &y).unwrap_err(),
            StirError::InvalidFeaturesToKeep { n: 0 }
        );
    }

    #[test]
    fn test_fit_rejects_overflowing_range() {
        let x = FeatureMatrix::from_rows(vec![
            vec![0.0, -1e308],
            vec![0.1, 1e308],
            vec![1.0, -1e308],
            vec![0.9, 1e308],
        ])
        .unwrap();
        assert_eq!(
            Stir::new(1).fit(&x, &[0, 0, 1, 1]).unwrap_err(),
            StirError::RangeOverflow { column: 1 }
        );

        // half the magnitude fits, and every score stays finite
        let x = FeatureMatrix::from_rows(vec![
            vec![0.0, -5e307],
            vec![0.1, 5e307],
            vec![1.0, -5e307],
            vec![0.9, 5e307],
        ])
        .unwrap();
        let fitted = Stir::new(1).fit(&x, &[0, 0, 1, 1]).unwrap();
        assert!(fitted.feature_scores().iter().all(|s| s.is_finite()));
        assert_eq!(fitted.selected_features(), &[0]);
    }

    #[test]
    fn test_fit_rejects_k_too_large() {
        let (x, y) = square();
        let err = Stir::with_config(StirConfig::new(1).with_k(2))
            .fit(&x, &y)
            .unwrap_err();
        assert!(matches!(
            err,
            StirError::InsufficientNeighbors {
                kind: NeighborKind::Hit,
                k: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_transform_rejects_wrong_width() {
        let (x, y) = square();
        let fitted = Stir::new(1).fit(&x, &y).unwrap();
        let wide = FeatureMatrix::new(vec![0; 6], 2, 3).unwrap();
        assert_eq!(
            fitted.transform(&wide).unwrap_err(),
            StirError::FeatureCountMismatch {
                expected: 2,
                got: 3
            }
        );
    }

    #[test]
    fn test_selector_lifecycle() {
        let (x, y) = square();
        let mut selector = StirSelector::new(1);
        assert!(!selector.is_fitted());
        assert_eq!(selector.transform(&x).unwrap_err(), StirError::NotFitted);
        assert_eq!(selector.feature_scores(), None);

        selector.fit(&x, &y).unwrap();
        assert!(selector.is_fitted());
        assert_eq!(selector.selected_features(), Some(&[1][..]));
        assert_eq!(selector.transform(&x).unwrap().shape(), (4, 1));
    }

    #[test]
    fn test_selector_failed_refit_keeps_previous_state() {
        let (x, y) = square();
        let mut selector = StirSelector::new(1);
        selector.fit(&x, &y).unwrap();
        let before = selector.fitted().unwrap().clone();

        assert!(selector.fit(&x, &[1, 1, 1, 1]).is_err());
        assert_eq!(selector.fitted().unwrap(), &before);
    }

    #[test]
    fn test_selector_fit_with_config_adopts_config_only_on_success() {
        let (x, y) = square();
        let mut selector = StirSelector::new(1);
        selector.fit(&x, &y).unwrap();
        let before = selector.fitted().unwrap().clone();

        let too_large_k = selector.config().clone().with_k(2);
        assert!(selector.fit_with_config(too_large_k, &x, &y).is_err());
        assert_eq!(selector.config().k(), 1);
        assert_eq!(selector.fitted().unwrap(), &before);

        let keep_both = StirConfig::new(2);
        selector.fit_with_config(keep_both.clone(), &x, &y).unwrap();
        assert_eq!(selector.config(), &keep_both);
        assert_eq!(selector.selected_features(), Some(&[1, 0][..]));

        // set_config alone only affects the next fit
        selector.set_config(StirConfig::new(1));
        assert_eq!(selector.selected_features(), Some(&[1, 0][..]));
        selector.fit(&x, &y).unwrap();
        assert_eq!(selector.selected_features(), Some(&[1][..]));
    }

    #[test]
    fn test_selector_refit_replaces_state() {
        let (x, y) = square();
        let mut selector = StirSelector::new(1);
        selector.fit(&x, &y).unwrap();
        assert_eq!(selector.selected_features(), Some(&[1][..]));

        // relabel so that column 0 carries the class
        selector.fit(&x, &[1, -1, 1, -1]).unwrap();
        assert_eq!(selector.selected_features(), Some(&[0][..]));
    }
}
