//! Bounded max-heap that keeps the k nearest samples seen so far.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use ordered_float::OrderedFloat; // For using f64 in BinaryHeap

/// A candidate neighbor, ordered by distance and then by sample index.
///
/// The index tie-break makes the retained set identical to the first k entries
/// of a stable sort by distance.
#[derive(Debug, Clone, Copy)]
pub struct HeapElement {
    pub distance: OrderedFloat<f64>,
    pub index: usize,
}

impl PartialEq for HeapElement {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for HeapElement {}

impl PartialOrd for HeapElement {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapElement {
    fn cmp(&self, other: &Self) -> Ordering {
        // BinaryHeap is a max-heap, so the farthest retained candidate sits on top
        self.distance
            .cmp(&other.distance)
            .then_with(|| self.index.cmp(&other.index))
    }
}

/// Collects the `capacity` nearest sample indices offered to it.
#[derive(Debug)]
pub struct KNearest {
    capacity: usize,
    heap: BinaryHeap<HeapElement>,
}

impl KNearest {
    pub fn new(capacity: usize) -> Self {
        KNearest {
            capacity,
            heap: BinaryHeap::with_capacity(capacity + 1),
        }
    }

    pub fn add(&mut self, distance: f64, index: usize) {
        if self.capacity == 0 {
            return;
        }
        let item = HeapElement {
            distance: OrderedFloat(distance),
            index,
        };
        if self.heap.len() < self.capacity {
            self.heap.push(item);
        } else if let Some(mut farthest) = self.heap.peek_mut() {
            if item < *farthest {
                *farthest = item;
            }
        }
    }

    /// Number of candidates currently retained.
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Retained indices, nearest first.
    pub fn into_sorted_indices(self) -> impl Iterator<Item = usize> {
        self.heap.into_sorted_vec().into_iter().map(|elem| elem.index)
    }
}
