use crate::domain::model::{City, RankedEntry};
use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;

/// Heap wrapper giving entries a total order: higher score ranks higher,
/// equal scores fall back to the smaller city id ranking higher.
#[derive(Debug)]
struct Ranked(RankedEntry);

impl Ord for Ranked {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0
            .score
            .total_cmp(&other.0.score)
            .then_with(|| other.0.city.id.cmp(&self.0.city.id))
    }
}

impl PartialOrd for Ranked {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Ranked {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Ranked {}

/// Keeps the `n` highest-ranked entries seen in a single pass.
///
/// Backed by a min-heap of at most `n` entries, so each [`offer`] costs
/// O(log n). The heap grows as entries arrive, so `n` may far exceed the
/// number of entries actually offered. Ties on score are broken by city id
/// ascending, which makes the result independent of the order entries are
/// offered in.
///
/// [`offer`]: TopNSelector::offer
#[derive(Debug)]
pub struct TopNSelector {
    n: usize,
    heap: BinaryHeap<Reverse<Ranked>>,
}

impl TopNSelector {
    pub fn new(n: usize) -> Self {
        Self {
            n,
            heap: BinaryHeap::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.n
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Offers a scored city. Returns `true` if it is now held.
    ///
    /// Once `n` entries are held, the newcomer evicts the current minimum only
    /// if it ranks strictly above it. A strictly greater score always wins; on
    /// an equal score the smaller city id wins, so a full selector may swap
    /// one tied entry for another. `-0.0` is held as `0.0`.
    pub fn offer(&mut self, score: f64, city: City) -> bool {
        if self.n == 0 {
            return false;
        }

        let score = if score == 0.0 { 0.0 } else { score };
        let candidate = Ranked(RankedEntry { city, score });

        if self.heap.len() < self.n {
            self.heap.push(Reverse(candidate));
            return true;
        }

        match self.heap.peek_mut() {
            Some(mut worst) if candidate > worst.0 => {
                // PeekMut restores the heap property on drop.
                *worst = Reverse(candidate);
                true
            }
            _ => false,
        }
    }

    /// Held entries, best first.
    pub fn finalize(self) -> Vec<RankedEntry> {
        self.heap
            .into_sorted_vec()
            .into_iter()
            .map(|Reverse(Ranked(entry))| entry)
            .collect()
    }
}
