//! Fold the contributions of a batch into a single encrypted mean.
//!
//! Homomorphic division does not exist, so the sum is scaled by a fixed-point reciprocal of the
//! contribution count instead. The revealed value is the mean with [PRECISION] fractional bits,
//! rounded down. Because the reciprocal is itself truncated, the revealed value `v` of a batch of
//! `n` contributions summing to `s` satisfies `s * 2^PRECISION / n - s < v <= s * 2^PRECISION / n`.
//! Capping `n` at [MAX_CONTRIBUTIONS] bounds the relative error of the mean by `2^-16`.

use crate::{BatchId, Ciphertext};
use std::collections::BTreeMap;

/// Number of fractional bits in an aggregate.
pub const PRECISION: u32 = 32;

/// Maximum number of contributions a batch may hold.
pub const MAX_CONTRIBUTIONS: u64 = 1 << 16;

/// Returns the fixed-point reciprocal of `count` (`floor(2^PRECISION / count)`).
///
/// `count` must be non-zero.
pub fn inverse(count: u64) -> u64 {
    (1u64 << PRECISION) / count
}

/// Append-only store of the [Ciphertext]s submitted to each batch, in insertion order.
pub struct Accumulator<C: Ciphertext> {
    contributions: BTreeMap<BatchId, Vec<C>>,
}

impl<C: Ciphertext> Default for Accumulator<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Ciphertext> Accumulator<C> {
    pub fn new() -> Self {
        Self {
            contributions: BTreeMap::new(),
        }
    }

    /// Append `contribution` to `batch`.
    pub(crate) fn append(&mut self, batch: BatchId, contribution: C) {
        self.contributions
            .entry(batch)
            .or_default()
            .push(contribution);
    }

    /// Returns the contributions of `batch`, in insertion order.
    pub fn contributions(&self, batch: BatchId) -> &[C] {
        self.contributions
            .get(&batch)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Compute the encrypted mean of `batch`.
    ///
    /// Contributions are always visited in insertion order, so repeated calls over the same
    /// contributions produce the same [crate::Handle]. Returns `None` if `batch` has no
    /// contributions or more than [MAX_CONTRIBUTIONS].
    pub fn aggregate(&self, batch: BatchId) -> Option<C> {
        let contributions = self.contributions(batch);
        let count = contributions.len() as u64;
        if count > MAX_CONTRIBUTIONS {
            return None;
        }
        let (first, rest) = contributions.split_first()?;
        let sum = rest.iter().fold(first.clone(), |sum, c| sum.add(c));
        Some(sum.scalar_multiply(inverse(count)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{Key, Masked};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    #[test]
    fn test_inverse() {
        assert_eq!(inverse(1), 1 << PRECISION);
        assert_eq!(inverse(2), 1 << (PRECISION - 1));
        assert_eq!(inverse(3), 1_431_655_765);
        assert_eq!(inverse(MAX_CONTRIBUTIONS), 1 << (PRECISION - 16));
    }

    #[test]
    fn test_empty_batch() {
        let accumulator = Accumulator::<Masked>::new();
        assert!(accumulator.aggregate(1).is_none());
        assert!(accumulator.contributions(1).is_empty());
    }

    #[test]
    fn test_mean() {
        let key = Key::new(7);
        let mut accumulator = Accumulator::new();
        for value in [10, 20, 30, 40] {
            accumulator.append(1, key.encrypt(value));
        }
        accumulator.append(2, key.encrypt(5));

        let mean = key.decrypt(&accumulator.aggregate(1).unwrap());
        assert_eq!(mean, 25 << PRECISION);
        let single = key.decrypt(&accumulator.aggregate(2).unwrap());
        assert_eq!(single, 5 << PRECISION);
    }

    #[test]
    fn test_truncated_mean() {
        let key = Key::new(7);
        let mut accumulator = Accumulator::new();
        for value in [1, 2, 2] {
            accumulator.append(1, key.encrypt(value));
        }

        // 5 * floor(2^32 / 3)
        let mean = key.decrypt(&accumulator.aggregate(1).unwrap());
        assert_eq!(mean, 5 * 1_431_655_765);
    }

    #[test]
    fn test_large_batches() {
        let key = Key::new(7);
        let contribution = key.encrypt(100);
        let exact = 100 << PRECISION;
        let mut accumulator = Accumulator::new();
        for (batch, count) in [(1, 1_000), (2, 40_000), (3, MAX_CONTRIBUTIONS)] {
            for _ in 0..count {
                accumulator.append(batch, contribution);
            }
            let mean = key.decrypt(&accumulator.aggregate(batch).unwrap());
            assert!(mean <= exact, "count={count} mean={mean}");
            assert!(exact - mean < exact >> 16, "count={count} mean={mean}");
        }

        // Power-of-two counts divide exactly
        assert_eq!(key.decrypt(&accumulator.aggregate(3).unwrap()), exact);

        // Past the cap there is no aggregate at all
        accumulator.append(3, contribution);
        assert!(accumulator.aggregate(3).is_none());
    }

    #[test]
    fn test_deterministic() {
        let key = Key::new(11);
        let mut rng = StdRng::seed_from_u64(0);
        let mut accumulator = Accumulator::new();
        for _ in 0..32 {
            accumulator.append(1, key.encrypt(rng.gen_range(0..1_000_000)));
        }
        let first = accumulator.aggregate(1).unwrap().handle();
        let second = accumulator.aggregate(1).unwrap().handle();
        assert_eq!(first, second);

        // Any new contribution changes the aggregate
        accumulator.append(1, key.encrypt(1));
        assert_ne!(accumulator.aggregate(1).unwrap().handle(), first);
    }
}
