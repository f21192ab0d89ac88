//! Relief-style weight aggregation and feature ranking.

use std::cmp::Ordering;

use ordered_float::OrderedFloat;
#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::distance::Normalization;
use super::neighbors::NeighborSet;
use crate::common_types::FeatureMatrix;

/// Output scale of STIR scores. Kept for compatibility with published STIR
/// numbers; it carries no statistical meaning.
pub const SCORE_SCALE: f64 = 1000.0;

/// Mean range-normalized difference over a stream of `(sample, neighbor)` pairs.
///
/// The sum is divided by the number of samples, not the number of pairs.
fn mean_pair_difference(
    x: &FeatureMatrix<f64>,
    pairs: &[(usize, usize)],
    feature: usize,
    one_over_range: f64,
) -> f64 {
    let total: f64 = pairs
        .iter()
        .map(|&(sample, neighbor)| {
            (x.row(neighbor)[feature] - x.row(sample)[feature]).abs() * one_over_range
        })
        .sum();
    total / x.n_samples() as f64
}

/// Scores every feature of `x`, the raw (unscaled) training matrix.
///
/// `score[f] = (mu_miss[f] - mu_hit[f]) / n_samples * 1000`, where `mu_*` is the
/// per-sample mean of `|x[s, f] - x[neighbor, f]| / range[f]`. The ranges must
/// be the ones the distance matrix was built with.
pub fn compute_scores(
    x: &FeatureMatrix<f64>,
    neighbors: &NeighborSet,
    normalization: &Normalization,
) -> Vec<f64> {
    let n_samples = x.n_samples();
    if n_samples == 0 {
        return vec![0.0; x.n_features()];
    }
    let one_over_m = 1.0 / n_samples as f64;
    let score_feature = |feature: usize| {
        let one_over_range = 1.0 / normalization.ranges()[feature];
        let mu_hits = mean_pair_difference(x, neighbors.hits(), feature, one_over_range);
        let mu_misses = mean_pair_difference(x, neighbors.misses(), feature, one_over_range);
        (mu_misses - mu_hits) * one_over_m * SCORE_SCALE
    };

    #[cfg(feature = "parallel")]
    let scores: Vec<f64> = (0..x.n_features()).into_par_iter().map(score_feature).collect();
    #[cfg(not(feature = "parallel"))]
    let scores: Vec<f64> = (0..x.n_features()).map(score_feature).collect();

    scores
}

/// Feature indices ordered by score, highest first; equal scores keep
/// ascending index order.
pub fn rank_features(scores: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    // stable sort on the reversed key keeps equal scores in index order
    order.sort_by(|&a, &b| match OrderedFloat(scores[b]).cmp(&OrderedFloat(scores[a])) {
        Ordering::Equal => a.cmp(&b),
        other => other,
    });
    order
}
