//! Lifecycle of batches: exactly one open batch, sealed in strictly increasing id order.

use crate::{accumulator::MAX_CONTRIBUTIONS, BatchId, Error};
use std::collections::BTreeMap;

/// A group of contributions processed together for one aggregate decryption.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    pub id: BatchId,
    pub open: bool,
    pub items: u64,
}

/// Owns every [Batch] and the id of the currently open one.
///
/// Batches only move from open to closed, and a batch's item count only grows while it is open.
pub struct Batches {
    current: BatchId,
    batches: BTreeMap<BatchId, Batch>,
}

impl Default for Batches {
    fn default() -> Self {
        Self::new()
    }
}

impl Batches {
    /// Create a new [Batches] with batch 1 open.
    pub fn new() -> Self {
        let mut batches = BTreeMap::new();
        batches.insert(
            1,
            Batch {
                id: 1,
                open: true,
                items: 0,
            },
        );
        Self {
            current: 1,
            batches,
        }
    }

    /// Returns the id of the open batch.
    pub fn current(&self) -> BatchId {
        self.current
    }

    pub fn get(&self, id: BatchId) -> Option<&Batch> {
        self.batches.get(&id)
    }

    /// Close the current batch and open `current + 1`.
    ///
    /// Returns the closed batch (`None` if it was already closed) and the id of the newly
    /// opened one.
    pub fn open_next(&mut self) -> (Option<Batch>, BatchId) {
        let closed = self.batches.get_mut(&self.current).and_then(|batch| {
            if !batch.open {
                return None;
            }
            batch.open = false;
            Some(batch.clone())
        });
        self.current += 1;
        self.batches.insert(
            self.current,
            Batch {
                id: self.current,
                open: true,
                items: 0,
            },
        );
        (closed, self.current)
    }

    /// Fails with [Error::BatchClosedOrInvalid] unless `id` is the open batch.
    pub fn ensure_open(&self, id: BatchId) -> Result<(), Error> {
        match self.batches.get(&id) {
            Some(batch) if batch.open && id == self.current => Ok(()),
            _ => Err(Error::BatchClosedOrInvalid),
        }
    }

    /// Count one more contribution in the open batch `id`, returning its sequence number
    /// (starting at 1).
    ///
    /// An open batch that already holds [MAX_CONTRIBUTIONS] items accepts no more.
    pub fn record_contribution(&mut self, id: BatchId) -> Result<u64, Error> {
        self.ensure_open(id)?;
        let batch = self
            .batches
            .get_mut(&id)
            .ok_or(Error::BatchClosedOrInvalid)?;
        if batch.items >= MAX_CONTRIBUTIONS {
            return Err(Error::BatchClosedOrInvalid);
        }
        batch.items += 1;
        Ok(batch.items)
    }

    /// Returns whether `id` is sealed and holds at least one contribution.
    pub fn is_valid_for_analysis(&self, id: BatchId) -> bool {
        if id == 0 || id > self.current {
            return false;
        }
        self.batches
            .get(&id)
            .is_some_and(|batch| !batch.open && batch.items > 0)
    }

    /// Iterate over all batches in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Batch> {
        self.batches.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_single_open(batches: &Batches) {
        let open: Vec<_> = batches.iter().filter(|b| b.open).collect();
        assert_eq!(open.len(), 1);
        assert_eq!(open[0].id, batches.current());
    }

    #[test]
    fn test_genesis() {
        let batches = Batches::new();
        assert_eq!(batches.current(), 1);
        assert_eq!(
            batches.get(1),
            Some(&Batch {
                id: 1,
                open: true,
                items: 0
            })
        );
        assert!(batches.get(0).is_none());
        assert_single_open(&batches);
    }

    #[test]
    fn test_open_next() {
        let mut batches = Batches::new();
        batches.record_contribution(1).unwrap();
        let (closed, next) = batches.open_next();
        assert_eq!(
            closed,
            Some(Batch {
                id: 1,
                open: false,
                items: 1
            })
        );
        assert_eq!(next, 2);
        assert_eq!(batches.current(), 2);
        assert_single_open(&batches);

        let (closed, next) = batches.open_next();
        assert_eq!(closed.map(|b| b.id), Some(2));
        assert_eq!(next, 3);
        assert_single_open(&batches);
    }

    #[test]
    fn test_record_only_open() {
        let mut batches = Batches::new();
        assert_eq!(batches.record_contribution(1), Ok(1));
        assert_eq!(batches.record_contribution(1), Ok(2));
        assert_eq!(batches.record_contribution(2), Err(Error::BatchClosedOrInvalid));
        assert_eq!(batches.record_contribution(0), Err(Error::BatchClosedOrInvalid));
        batches.open_next();

        // Frozen once closed
        assert_eq!(batches.record_contribution(1), Err(Error::BatchClosedOrInvalid));
        assert_eq!(batches.get(1).unwrap().items, 2);
        assert_eq!(batches.record_contribution(2), Ok(1));
    }

    #[test]
    fn test_full_batch() {
        let mut batches = Batches::new();
        for _ in 0..MAX_CONTRIBUTIONS {
            batches.record_contribution(1).unwrap();
        }
        assert_eq!(batches.record_contribution(1), Err(Error::BatchClosedOrInvalid));
        assert_eq!(batches.get(1).unwrap().items, MAX_CONTRIBUTIONS);

        // The next batch starts empty
        batches.open_next();
        assert!(batches.is_valid_for_analysis(1));
        assert_eq!(batches.record_contribution(2), Ok(1));
    }

    #[test]
    fn test_valid_for_analysis() {
        let mut batches = Batches::new();
        batches.record_contribution(1).unwrap();

        // Open batch
        assert!(!batches.is_valid_for_analysis(1));
        batches.open_next();
        assert!(batches.is_valid_for_analysis(1));

        // Closed but empty
        batches.open_next();
        assert!(!batches.is_valid_for_analysis(2));

        // Out of range
        assert!(!batches.is_valid_for_analysis(0));
        assert!(!batches.is_valid_for_analysis(3));
        assert!(!batches.is_valid_for_analysis(4));
    }
}
