//! Min-max normalization and the pairwise distance matrix.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::common_types::FeatureMatrix;
use crate::config::DistanceMetric;

/// Per-feature minimum and range of a training matrix.
///
/// Constant features get `epsilon` as their range so that scaling maps them to
/// all zeros instead of NaN. The same ranges are reused when aggregating
/// feature weights.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalization {
    mins: Vec<f64>,
    ranges: Vec<f64>,
}

impl Normalization {
    /// Computes column minima and ranges. An empty matrix yields empty vectors.
    pub fn from_matrix(x: &FeatureMatrix<f64>, epsilon: f64) -> Self {
        let n_features = x.n_features();
        let mut mins = vec![f64::INFINITY; n_features];
        let mut maxs = vec![f64::NEG_INFINITY; n_features];
        for row in x.rows() {
            for (j, &v) in row.iter().enumerate() {
                mins[j] = mins[j].min(v);
                maxs[j] = maxs[j].max(v);
            }
        }
        if x.n_samples() == 0 {
            mins.fill(0.0);
            maxs.fill(0.0);
        }
        let ranges = mins
            .iter()
            .zip(&maxs)
            .map(|(&lo, &hi)| {
                let range = hi - lo;
                if range == 0.0 { epsilon } else { range }
            })
            .collect();
        Normalization { mins, ranges }
    }

    pub fn mins(&self) -> &[f64] {
        &self.mins
    }

    /// The range vector, already guarded against zero.
    pub fn ranges(&self) -> &[f64] {
        &self.ranges
    }

    /// First column whose `max - min` overflowed, if any.
    pub fn first_non_finite_range(&self) -> Option<usize> {
        self.ranges.iter().position(|r| !r.is_finite())
    }

    /// Rescales every column to `[0, 1]`: `(x - min) / range`.
    pub fn scale(&self, x: &FeatureMatrix<f64>) -> FeatureMatrix<f64> {
        let data: Vec<f64> = x
            .rows()
            .flat_map(|row| {
                row.iter()
                    .zip(self.mins.iter().zip(&self.ranges))
                    .map(|(&v, (&lo, &range))| (v - lo) / range)
            })
            .collect();
        FeatureMatrix::from_parts(
            data,
            x.n_samples(),
            x.n_features(),
            x.feature_names().map(<[String]>::to_vec),
        )
    }
}

/// Symmetric `n x n` matrix of pairwise distances with a zero diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    n: usize,
    data: Vec<f64>,
}

impl DistanceMatrix {
    /// Number of samples (rows and columns).
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.n + j]
    }

    /// Distances from sample `i` to every sample, itself included.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.n..(i + 1) * self.n]
    }
}

pub fn minkowski_distance(a: &[f64], b: &[f64], p: u32) -> f64 {
    let power = |d: f64| match i32::try_from(p) {
        Ok(exp) => d.powi(exp),
        Err(_) => d.powf(f64::from(p)),
    };
    let sum_of_powers: f64 = a.iter().zip(b).map(|(x, y)| power((x - y).abs())).sum();
    sum_of_powers.powf(1.0 / f64::from(p))
}

pub fn euclidean_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| {
            let diff = x - y;
            diff * diff
        })
        .sum::<f64>()
        .sqrt()
}

pub fn manhattan_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| (x - y).abs()).sum()
}

impl DistanceMetric {
    /// Distance between two rows of equal length.
    pub fn distance(&self, a: &[f64], b: &[f64]) -> f64 {
        debug_assert_eq!(a.len(), b.len());
        match *self {
            DistanceMetric::Euclidean => euclidean_distance(a, b),
            DistanceMetric::Manhattan => manhattan_distance(a, b),
            DistanceMetric::Minkowski { p } => minkowski_distance(a, b, p),
        }
    }
}

/// Computes all pairwise distances between the rows of an already scaled matrix.
///
/// Every entry is computed independently; `d(a, b)` and `d(b, a)` accumulate
/// the same terms in the same order, so the result is exactly symmetric.
pub fn compute_distances(x_scaled: &FeatureMatrix<f64>, metric: DistanceMetric) -> DistanceMatrix {
    let n = x_scaled.n_samples();
    let mut data = vec![0.0; n * n];
    let fill_row = |(i, out): (usize, &mut [f64])| {
        let a = x_scaled.row(i);
        for (j, slot) in out.iter_mut().enumerate() {
            if i != j {
                *slot = metric.distance(a, x_scaled.row(j));
            }
        }
    };

    if n > 0 {
        #[cfg(feature = "parallel")]
        data.par_chunks_mut(n).enumerate().for_each(fill_row);
        #[cfg(not(feature = "parallel"))]
        data.chunks_mut(n).enumerate().for_each(fill_row);
    }

    DistanceMatrix { n, data }
}
