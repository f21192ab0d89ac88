//! Nearest-hit / nearest-miss search over a distance matrix.

use tracing::trace;

use super::distance::DistanceMatrix;
use super::heap_utils::KNearest;
use crate::error::{NeighborKind, Result, StirError};

/// The k nearest hits and k nearest misses of every sample.
///
/// Both streams hold `(sample_index, neighbor_index)` pairs, `k` per sample,
/// grouped by sample in ascending order and nearest neighbor first within a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NeighborSet {
    k: usize,
    hits: Vec<(usize, usize)>,
    misses: Vec<(usize, usize)>,
}

impl NeighborSet {
    pub fn k(&self) -> usize {
        self.k
    }

    pub fn n_samples(&self) -> usize {
        if self.k == 0 { 0 } else { self.hits.len() / self.k }
    }

    /// All `(sample, hit)` pairs.
    pub fn hits(&self) -> &[(usize, usize)] {
        &self.hits
    }

    /// All `(sample, miss)` pairs.
    pub fn misses(&self) -> &[(usize, usize)] {
        &self.misses
    }

    /// Hit indices of one sample, nearest first.
    pub fn hits_of(&self, sample: usize) -> impl Iterator<Item = usize> + '_ {
        self.hits[sample * self.k..(sample + 1) * self.k]
            .iter()
            .map(|&(_, neighbor)| neighbor)
    }

    /// Miss indices of one sample, nearest first.
    pub fn misses_of(&self, sample: usize) -> impl Iterator<Item = usize> + '_ {
        self.misses[sample * self.k..(sample + 1) * self.k]
            .iter()
            .map(|&(_, neighbor)| neighbor)
    }
}

/// Checks that every sample can find `k` hits and `k` misses.
///
/// A sample needs `k` other members of its own class and `k` samples of any
/// other class. Reports the first sample (in index order) that falls short.
pub fn validate_class_sizes<L: PartialEq>(y: &[L], k: usize) -> Result<()> {
    // Distinct labels with their counts; equality is all we can rely on for L.
    let mut classes: Vec<(&L, usize)> = Vec::new();
    for label in y {
        match classes.iter_mut().find(|(seen, _)| *seen == label) {
            Some((_, count)) => *count += 1,
            None => classes.push((label, 1)),
        }
    }

    for (sample, label) in y.iter().enumerate() {
        let same = classes
            .iter()
            .find(|(seen, _)| *seen == label)
            .map_or(0, |&(_, count)| count);
        let available_hits = same.saturating_sub(1);
        if available_hits < k {
            return Err(StirError::InsufficientNeighbors {
                sample,
                kind: NeighborKind::Hit,
                available: available_hits,
                k,
            });
        }
        let available_misses = y.len() - same;
        if available_misses < k {
            return Err(StirError::InsufficientNeighbors {
                sample,
                kind: NeighborKind::Miss,
                available: available_misses,
                k,
            });
        }
    }
    Ok(())
}

/// Finds the `k` nearest hits and misses of every sample.
///
/// Sample `i`'s own label `y[i]` decides hit versus miss, and `i` itself is never
/// its own neighbor. Candidates are ranked by distance, ties by lower index.
pub fn find_neighbors<L: PartialEq>(
    distances: &DistanceMatrix,
    y: &[L],
    k: usize,
) -> Result<NeighborSet> {
    let n_samples = distances.len();
    if y.len() != n_samples {
        return Err(StirError::LabelLengthMismatch {
            labels: y.len(),
            n_samples,
        });
    }
    if k < 1 {
        return Err(StirError::InvalidK { k });
    }
    validate_class_sizes(y, k)?;

    let mut hits = Vec::with_capacity(n_samples * k);
    let mut misses = Vec::with_capacity(n_samples * k);

    for (i, reference) in y.iter().enumerate() {
        let mut nearest_hits = KNearest::new(k);
        let mut nearest_misses = KNearest::new(k);
        for (j, &distance) in distances.row(i).iter().enumerate() {
            if j == i {
                continue;
            }
            if y[j] == *reference {
                nearest_hits.add(distance, j);
            } else {
                nearest_misses.add(distance, j);
            }
        }

        // validate_class_sizes guarantees both are full; re-check so a bad
        // PartialEq (non-reflexive labels such as NaN) cannot misalign the streams
        if nearest_hits.len() < k {
            return Err(StirError::InsufficientNeighbors {
                sample: i,
                kind: NeighborKind::Hit,
                available: nearest_hits.len(),
                k,
            });
        }
        if nearest_misses.len() < k {
            return Err(StirError::InsufficientNeighbors {
                sample: i,
                kind: NeighborKind::Miss,
                available: nearest_misses.len(),
                k,
            });
        }

        hits.extend(nearest_hits.into_sorted_indices().map(|j| (i, j)));
        misses.extend(nearest_misses.into_sorted_indices().map(|j| (i, j)));
    }

    trace!(n_samples, k, "neighbor set built");
    Ok(NeighborSet { k, hits, misses })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common_types::FeatureMatrix;
    use crate::config::DistanceMetric;
    use crate::stir::distance::compute_distances;

    fn distances(rows: Vec<Vec<f64>>) -> DistanceMatrix {
        compute_distances(&FeatureMatrix::from_rows(rows).unwrap(), DistanceMetric::Euclidean)
    }

    fn square() -> DistanceMatrix {
        distances(vec![
            vec![0.0, 1.0],
            vec![1.0, 1.0],
            vec![0.0, 0.0],
            vec![1.0, 0.0],
        ])
    }

    #[test]
    fn test_square_hits_and_misses() {
        let set = find_neighbors(&square(), &[1, 1, -1, -1], 1).unwrap();
        assert_eq!(set.hits(), &[(0, 1), (1, 0), (2, 3), (3, 2)]);
        assert_eq!(set.misses(), &[(0, 2), (1, 3), (2, 0), (3, 1)]);
        assert_eq!(set.n_samples(), 4);
    }

    #[test]
    fn test_hits_and_misses_are_disjoint_and_exclude_self() {
        let d = distances(vec![
            vec![0.0],
            vec![0.1],
            vec![0.2],
            vec![0.9],
            vec![1.0],
            vec![0.95],
        ]);
        let y = ["a", "a", "b", "b", "a", "b"];
        let set = find_neighbors(&d, &y, 2).unwrap();
        for i in 0..y.len() {
            let hits: Vec<_> = set.hits_of(i).collect();
            let misses: Vec<_> = set.misses_of(i).collect();
            assert_eq!(hits.len(), 2);
            assert_eq!(misses.len(), 2);
            assert!(!hits.contains(&i));
            assert!(!misses.contains(&i));
            assert!(hits.iter().all(|h| !misses.contains(h)));
            assert!(hits.iter().all(|&h| y[h] == y[i]));
            assert!(misses.iter().all(|&m| y[m] != y[i]));
        }
        // sample 0 at 0.0: hits 1 (0.1) then 4 (1.0); misses 2 (0.2) then 3 (0.9)
        assert_eq!(set.hits_of(0).collect::<Vec<_>>(), vec![1, 4]);
        assert_eq!(set.misses_of(0).collect::<Vec<_>>(), vec![2, 3]);
    }

    #[test]
    fn test_equal_distances_break_ties_by_index() {
        // samples 1 to 4 all sit at distance 1 from sample 0
        let d = distances(vec![
            vec![0.0, 0.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.0, 1.0],
        ]);
        let set = find_neighbors(&d, &[0, 0, 1, 0, 1], 1).unwrap();
        assert_eq!(set.hits_of(0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(set.misses_of(0).collect::<Vec<_>>(), vec![2]);
        // sample 3 duplicates sample 1, which beats sample 0
        assert_eq!(set.hits_of(3).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_duplicate_rows_are_still_neighbors() {
        let d = distances(vec![vec![0.5], vec![0.5], vec![0.0], vec![1.0]]);
        let set = find_neighbors(&d, &[1, 1, 2, 2], 1).unwrap();
        assert_eq!(set.hits_of(1).collect::<Vec<_>>(), vec![0]);
        assert_eq!(set.hits_of(0).collect::<Vec<_>>(), vec![1]);
    }

    #[test]
    fn test_single_class_has_no_misses() {
        let err = find_neighbors(&square(), &[7, 7, 7, 7], 1).unwrap_err();
        assert_eq!(
            err,
            StirError::InsufficientNeighbors {
                sample: 0,
                kind: NeighborKind::Miss,
                available: 0,
                k: 1
            }
        );
    }

    #[test]
    fn test_k_larger_than_class() {
        let err = find_neighbors(&square(), &[1, 1, -1, -1], 2).unwrap_err();
        assert_eq!(
            err,
            StirError::InsufficientNeighbors {
                sample: 0,
                kind: NeighborKind::Hit,
                available: 1,
                k: 2
            }
        );
    }

    #[test]
    fn test_all_labels_distinct() {
        let err = find_neighbors(&square(), &[1, 2, 3, 4], 1).unwrap_err();
        assert!(matches!(
            err,
            StirError::InsufficientNeighbors {
                kind: NeighborKind::Hit,
                available: 0,
                ..
            }
        ));
    }

    #[test]
    fn test_label_length_and_k_checked() {
        assert_eq!(
            find_neighbors(&square(), &[1, 1, -1], 1).unwrap_err(),
            StirError::LabelLengthMismatch {
                labels: 3,
                n_samples: 4
            }
        );
        assert_eq!(
            find_neighbors(&square(), &[1, 1, -1, -1], 0).unwrap_err(),
            StirError::InvalidK { k: 0 }
        );
    }

    #[test]
    fn test_multiclass_misses_span_classes() {
        let d = distances(vec![
            vec![0.0],
            vec![0.05],
            vec![0.5],
            vec![0.55],
            vec![1.0],
            vec![0.9],
        ]);
        let set = find_neighbors(&d, &['x', 'x', 'y', 'y', 'z', 'z'], 1).unwrap();
        assert_eq!(set.misses_of(0).collect::<Vec<_>>(), vec![2]);
        assert_eq!(set.misses_of(3).collect::<Vec<_>>(), vec![5]);
    }
}
