//! Bounded random-replacement history of paired samples.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::Entry;

/// Default number of slots in a history buffer.
pub const DEFAULT_POOL_SIZE: usize = 50;

/// Draws above this value replay history instead of passing through.
const REPLACE_THRESHOLD: f64 = 0.5;

/// A fixed-capacity history of [`Entry`] pairs.
///
/// While fewer than `capacity` entries are stored, every submission is kept
/// and echoed back. Once full, each submission either passes through
/// unchanged or has its two halves swapped into two independently chosen
/// slots, returning the halves that were stored there.
///
/// A capacity of zero turns the buffer into a permanent pass-through.
///
/// The random source is injected so replacement decisions can be reproduced.
#[derive(Debug, Clone)]
pub struct HistoryBuffer<T, R = StdRng> {
    capacity: usize,
    slots: Vec<Entry<T>>,
    rng: R,
}

impl<T> HistoryBuffer<T, StdRng> {
    /// Create a buffer seeded from the operating system.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self::with_rng(capacity, StdRng::from_os_rng())
    }

    /// Create a buffer with a reproducible random source.
    #[must_use]
    pub fn seeded(capacity: usize, seed: u64) -> Self {
        Self::with_rng(capacity, StdRng::seed_from_u64(seed))
    }
}

impl<T> Default for HistoryBuffer<T, StdRng> {
    fn default() -> Self {
        Self::new(DEFAULT_POOL_SIZE)
    }
}

impl<T, R> HistoryBuffer<T, R> {
    /// Create a buffer drawing its replacement decisions from `rng`.
    #[must_use]
    pub fn with_rng(capacity: usize, rng: R) -> Self {
        Self {
            capacity,
            slots: Vec::with_capacity(capacity),
            rng,
        }
    }

    /// Maximum number of stored entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Whether nothing has been stored yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Whether the buffer has left the fill phase.
    ///
    /// A zero-capacity buffer is never full; it never stores anything.
    #[must_use]
    pub fn is_full(&self) -> bool {
        self.capacity > 0 && self.slots.len() == self.capacity
    }

    /// Stored entries, addressed by slot index.
    #[must_use]
    pub fn slots(&self) -> &[Entry<T>] {
        &self.slots
    }

    /// Iterate over stored entries in slot order.
    pub fn iter(&self) -> std::slice::Iter<'_, Entry<T>> {
        self.slots.iter()
    }

    /// Drop all stored entries, returning the buffer to its fill phase.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}

impl<T: Clone, R: Rng> HistoryBuffer<T, R> {
    /// Offer a new entry and get back the entry to use downstream.
    ///
    /// - capacity zero: `entry` is returned as is.
    /// - fill phase: `entry` is stored and returned as is.
    /// - full: with probability one half, `entry.a` replaces the A half of a
    ///   random slot and `entry.b` the B half of another independently drawn
    ///   slot (possibly the same one); the displaced halves are returned.
    ///   Otherwise `entry` is returned and nothing is stored.
    pub fn submit(&mut self, entry: Entry<T>) -> Entry<T> {
        if self.capacity == 0 {
            return entry;
        }

        if self.slots.len() < self.capacity {
            self.slots.push(entry.clone());
            if self.slots.len() == self.capacity {
                tracing::debug!(capacity = self.capacity, "history buffer filled");
            }
            return entry;
        }

        let r: f64 = self.rng.random();
        if r <= REPLACE_THRESHOLD {
            return entry;
        }

        let (a, b) = entry.into_parts();

        let idx_a = self.draw_slot();
        let out_a = std::mem::replace(&mut self.slots[idx_a].a, a);

        let idx_b = self.draw_slot();
        let out_b = std::mem::replace(&mut self.slots[idx_b].b, b);

        tracing::trace!(idx_a, idx_b, "replayed history halves");

        Entry::new(out_a, out_b)
    }

    /// Uniform slot index in `[0, capacity)`.
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    fn draw_slot(&mut self) -> usize {
        let u: f64 = self.rng.random();
        // u < 1, but the product can round up to capacity for huge capacities
        ((u * self.capacity as f64) as usize).min(self.capacity - 1)
    }
}

impl<'a, T, R> IntoIterator for &'a HistoryBuffer<T, R> {
    type Item = &'a Entry<T>;
    type IntoIter = std::slice::Iter<'a, Entry<T>>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{arr1, Array1};

    fn entry(a: i32, b: i32) -> Entry<Array1<i32>> {
        Entry::new(arr1(&[a]), arr1(&[b]))
    }

    #[test]
    fn test_zero_capacity_passes_through() {
        let mut pool = HistoryBuffer::seeded(0, 7);

        for i in 0..20 {
            let e = entry(i, i * 10);
            assert_eq!(pool.submit(e.clone()), e);
            assert_eq!(pool.len(), 0);
        }
        assert!(!pool.is_full());
    }

    #[test]
    fn test_fill_phase_echoes_and_counts() {
        let mut pool = HistoryBuffer::seeded(4, 1);

        for k in 1..=4 {
            let e = entry(k, k * 10);
            assert_eq!(pool.submit(e.clone()), e);
            assert_eq!(pool.len(), usize::try_from(k).unwrap());
        }
        assert!(pool.is_full());
        assert_eq!(pool.slots()[2], entry(3, 30));
    }

    #[test]
    fn test_length_fixed_once_full() {
        let mut pool = HistoryBuffer::seeded(5, 42);

        for i in 0..200 {
            pool.submit(entry(i, -i));
            assert!(pool.len() <= pool.capacity());
        }
        assert_eq!(pool.len(), 5);
    }

    #[test]
    fn test_returned_halves_come_from_history_or_input() {
        let mut pool = HistoryBuffer::seeded(3, 9);
        for i in 0..3 {
            pool.submit(entry(i, 100 + i));
        }

        let mut replayed = 0;
        for i in 3..100 {
            let a_before: Vec<i32> = pool.iter().map(|e| e.a()[0]).collect();
            let b_before: Vec<i32> = pool.iter().map(|e| e.b()[0]).collect();

            let out = pool.submit(entry(i, 100 + i));
            if out == entry(i, 100 + i) {
                continue;
            }

            replayed += 1;
            assert!(a_before.contains(&out.a()[0]));
            assert!(b_before.contains(&out.b()[0]));
            assert!(pool.iter().any(|e| e.a()[0] == i));
            assert!(pool.iter().any(|e| e.b()[0] == 100 + i));
        }

        // roughly half of 97 draws replay history
        assert!(replayed > 20 && replayed < 80, "replayed {replayed}");
    }

    #[test]
    fn test_same_seed_same_history() {
        let mut left = HistoryBuffer::seeded(4, 1234);
        let mut right = HistoryBuffer::seeded(4, 1234);

        for i in 0..50 {
            assert_eq!(left.submit(entry(i, i + 1)), right.submit(entry(i, i + 1)));
        }
        assert_eq!(left.slots(), right.slots());
    }

    #[test]
    fn test_clear_restarts_fill_phase() {
        let mut pool = HistoryBuffer::seeded(2, 3);
        pool.submit(entry(1, 10));
        pool.submit(entry(2, 20));
        assert!(pool.is_full());

        pool.clear();

        assert!(pool.is_empty());
        assert_eq!(pool.capacity(), 2);
        let e = entry(5, 50);
        assert_eq!(pool.submit(e.clone()), e);
        assert_eq!(pool.len(), 1);
    }

    #[test]
    fn test_default_capacity() {
        let pool: HistoryBuffer<Array1<i32>> = HistoryBuffer::default();
        assert_eq!(pool.capacity(), DEFAULT_POOL_SIZE);
        assert!(pool.is_empty());
    }
}
