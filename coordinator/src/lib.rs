//! Seal encrypted contributions into batches and coordinate verified aggregate decryption.
//!
//! # Overview
//!
//! Authorized providers submit opaque [Ciphertext]s. Contributions accumulate in the single open
//! batch until the owner seals it (opening the next one). Anyone may then ask an external,
//! untrusted [Oracle] to reveal the batch mean: the [ledger::Ledger] folds the sealed
//! contributions into one aggregate, binds the request to a [decryption::commitment] over that
//! aggregate, and hands the aggregate's [Handle] to the oracle.
//!
//! The oracle answers later, on a separate entry point, with a cleartext and a proof. The answer
//! is only accepted if the request is known and unconsumed, the commitment recomputed at callback
//! time still matches the one stored at request time, and the oracle vouches for the proof.
//! A request is consumable exactly once.
//!
//! Every operation is all-or-nothing: preconditions are checked before the first mutation, so a
//! rejected call leaves no state change and emits no [event::Event].
//!
//! # Hosting
//!
//! [ledger::Ledger] is a synchronous state machine. [sequencer::Engine] hosts one inside a task,
//! totally ordering the transactions of many callers (and the oracle's callbacks) that arrive on
//! its [sequencer::Mailbox].
//!
//! # Status
//!
//! `sealbatch-coordinator` is **ALPHA** software and is not yet recommended for production use.
//! Developers should expect breaking changes and occasional instability.

use commonware_cryptography::sha256::Digest;
use std::future::Future;
use thiserror::Error;

pub mod access;
pub mod accumulator;
pub mod batch;
pub mod decryption;
pub mod event;
pub mod ledger;
pub mod mocks;
pub mod rate;
pub mod sequencer;

/// Identifier of a batch (starting at 1).
pub type BatchId = u64;

/// Correlation identifier assigned by the [Oracle] to a decryption request.
pub type RequestId = u64;

/// Opaque reference to a [Ciphertext] understood by the [Oracle].
pub type Handle = Digest;

/// Errors that can occur when interacting with a [ledger::Ledger].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("unauthorized")]
    Unauthorized,
    #[error("paused")]
    Paused,
    #[error("cooldown active")]
    CooldownActive,
    #[error("batch closed or invalid")]
    BatchClosedOrInvalid,
    #[error("invalid cooldown")]
    InvalidCooldown,
    #[error("unknown request: {0}")]
    UnknownRequest(RequestId),
    #[error("replay attempt: {0}")]
    ReplayAttempt(RequestId),
    #[error("state mismatch: {0}")]
    StateMismatch(RequestId),
    #[error("invalid proof: {0}")]
    InvalidProof(RequestId),
    #[error("invalid cleartext: {0}")]
    InvalidCleartext(RequestId),
    #[error("duplicate request: {0}")]
    DuplicateRequest(RequestId),
    #[error("oracle unavailable")]
    OracleUnavailable,
    #[error("closed")]
    Closed,
}

/// Rate-limited action classes, each with its own cooldown series per actor.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    /// Submitting a contribution.
    Submit,
    /// Requesting decryption of a sealed batch.
    Request,
}

/// A homomorphically encrypted value produced by an external encryption scheme.
///
/// Implementations must be deterministic: the same operations over the same inputs
/// must always produce a value with the same [Handle]. `add` must be commutative and
/// associative.
pub trait Ciphertext: Clone + Send + Sync + 'static {
    /// Add two encrypted values.
    fn add(&self, other: &Self) -> Self;

    /// Multiply an encrypted value by a cleartext scalar.
    fn scalar_multiply(&self, scalar: u64) -> Self;

    /// Return the opaque handle the [Oracle] uses to locate this value.
    fn handle(&self) -> Handle;
}

/// An external decryption service.
///
/// [Oracle::submit] only registers intent: the cleartext and its proof are delivered later
/// (and possibly never) through a separate callback, correlated by the returned [RequestId].
pub trait Oracle: Send + 'static {
    /// Ask for `handles` to be decrypted, returning a fresh, globally unique [RequestId].
    ///
    /// The ordering of `handles` is preserved by the oracle.
    fn submit(&mut self, handles: Vec<Handle>) -> Result<RequestId, Error>;

    /// Returns whether `proof` authenticates `cleartext` as the decryption of `handles`
    /// submitted under `request`.
    ///
    /// The proof must bind `handles`, not only `request`: a correlation id alone does not
    /// identify what was decrypted.
    fn verify(
        &self,
        request: RequestId,
        handles: &[Handle],
        cleartext: &[u8],
        proof: &[u8],
    ) -> bool;
}

/// A [Reporter] receives the events committed by a [sequencer::Engine], in order.
pub trait Reporter: Clone + Send + 'static {
    /// The identity of actors referenced by events.
    type PublicKey: commonware_cryptography::PublicKey;

    /// Called once per committed event.
    fn report(
        &mut self,
        event: event::Event<Self::PublicKey>,
    ) -> impl Future<Output = ()> + Send;
}
