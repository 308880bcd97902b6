//! Bind decryption requests to the data they cover and consume them exactly once.

use crate::{BatchId, Ciphertext, Error, RequestId};
use commonware_cryptography::sha256::{self, Digest};
use commonware_utils::union_unique;
use std::collections::BTreeMap;

/// Digest binding a decryption request to the aggregate it covers.
pub type Commitment = Digest;

/// Compute the [Commitment] of `aggregate` for the coordinator identified by `identity`.
///
/// Including `identity` prevents an answer meant for one coordinator from being replayed
/// against another.
pub fn commitment<C: Ciphertext>(identity: &[u8], aggregate: &C) -> Commitment {
    let handle = aggregate.handle();
    sha256::hash(&union_unique(identity, handle.as_ref()))
}

/// A registered decryption request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Request {
    pub batch: BatchId,
    pub commitment: Commitment,
    pub fulfilled: bool,
}

/// Table of every decryption request ever registered.
///
/// Requests are never removed: an unanswered request stays pending forever and a fulfilled one
/// remains as a tombstone so that replays can be detected.
#[derive(Default)]
pub struct Requests {
    requests: BTreeMap<RequestId, Request>,
    pending: usize,
}

impl Requests {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: RequestId) -> Option<&Request> {
        self.requests.get(&id)
    }

    /// Returns the number of requests not yet fulfilled.
    pub fn pending(&self) -> usize {
        self.pending
    }

    /// Fails with [Error::DuplicateRequest] if `id` was already registered.
    pub fn ensure_unused(&self, id: RequestId) -> Result<(), Error> {
        if self.requests.contains_key(&id) {
            return Err(Error::DuplicateRequest(id));
        }
        Ok(())
    }

    /// Register a pending request.
    pub fn insert(
        &mut self,
        id: RequestId,
        batch: BatchId,
        commitment: Commitment,
    ) -> Result<(), Error> {
        self.ensure_unused(id)?;
        self.requests.insert(
            id,
            Request {
                batch,
                commitment,
                fulfilled: false,
            },
        );
        self.pending += 1;
        Ok(())
    }

    /// Returns the pending request `id`.
    ///
    /// Fails with [Error::UnknownRequest] if it was never registered and with
    /// [Error::ReplayAttempt] if it was already fulfilled.
    pub fn pending_request(&self, id: RequestId) -> Result<&Request, Error> {
        let request = self.requests.get(&id).ok_or(Error::UnknownRequest(id))?;
        if request.fulfilled {
            return Err(Error::ReplayAttempt(id));
        }
        Ok(request)
    }

    /// Mark request `id` as fulfilled.
    pub fn fulfill(&mut self, id: RequestId) -> Result<(), Error> {
        self.pending_request(id)?;
        if let Some(request) = self.requests.get_mut(&id) {
            request.fulfilled = true;
            self.pending -= 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::Key;

    #[test]
    fn test_commitment_binds_identity_and_aggregate() {
        let key = Key::new(3);
        let a = key.encrypt(1);
        let b = key.encrypt(2);
        assert_eq!(commitment(b"alpha", &a), commitment(b"alpha", &a));
        assert_ne!(commitment(b"alpha", &a), commitment(b"alpha", &b));
        assert_ne!(commitment(b"alpha", &a), commitment(b"beta", &a));
    }

    #[test]
    fn test_lifecycle() {
        let mut requests = Requests::new();
        let c = sha256::hash(b"commitment");
        assert_eq!(requests.pending_request(1), Err(Error::UnknownRequest(1)));

        requests.insert(1, 7, c).unwrap();
        assert_eq!(requests.pending(), 1);
        assert_eq!(
            requests.pending_request(1),
            Ok(&Request {
                batch: 7,
                commitment: c,
                fulfilled: false
            })
        );
        assert_eq!(requests.insert(1, 8, c), Err(Error::DuplicateRequest(1)));

        requests.fulfill(1).unwrap();
        assert_eq!(requests.pending(), 0);
        assert!(requests.get(1).unwrap().fulfilled);
        assert_eq!(requests.fulfill(1), Err(Error::ReplayAttempt(1)));
        assert_eq!(requests.pending_request(1), Err(Error::ReplayAttempt(1)));
        assert_eq!(requests.fulfill(2), Err(Error::UnknownRequest(2)));
    }
}
