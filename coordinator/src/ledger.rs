//! Atomic transactions over the complete coordinator state.
//!
//! Every entry point checks all of its preconditions before performing its first mutation. A
//! call that returns an error has therefore changed nothing: no table, no counter, no event.

use crate::{
    access::Roles,
    accumulator::Accumulator,
    batch::{Batch, Batches},
    decryption::{commitment, Request, Requests},
    event::Event,
    rate::RateGate,
    Action, BatchId, Ciphertext, Error, Oracle, RequestId,
};
use commonware_codec::DecodeExt;
use commonware_cryptography::PublicKey;
use tracing::{debug, info, warn};

/// Configuration for a [Ledger].
#[derive(Clone)]
pub struct Config<P: PublicKey> {
    /// Initial owner (and first provider).
    pub owner: P,

    /// Minimum number of seconds between two rate-limited actions of the same class by the same
    /// actor. Must be non-zero.
    pub cooldown: u64,

    /// Identity of this coordinator, bound into every decryption commitment.
    pub identity: Vec<u8>,
}

/// The state of a coordinator and the transactions that mutate it.
pub struct Ledger<P: PublicKey, C: Ciphertext, O: Oracle> {
    identity: Vec<u8>,
    paused: bool,

    roles: Roles<P>,
    rate: RateGate<P>,
    batches: Batches,
    accumulator: Accumulator<C>,
    requests: Requests,
    oracle: O,

    events: Vec<Event<P>>,
}

impl<P: PublicKey, C: Ciphertext, O: Oracle> Ledger<P, C, O> {
    /// Create a new [Ledger] with batch 1 open.
    pub fn new(cfg: Config<P>, oracle: O) -> Result<Self, Error> {
        Ok(Self {
            identity: cfg.identity,
            paused: false,
            roles: Roles::new(cfg.owner),
            rate: RateGate::new(cfg.cooldown)?,
            batches: Batches::new(),
            accumulator: Accumulator::new(),
            requests: Requests::new(),
            oracle,
            events: Vec::new(),
        })
    }

    pub fn owner(&self) -> &P {
        self.roles.owner()
    }

    pub fn is_owner(&self, actor: &P) -> bool {
        self.roles.is_owner(actor)
    }

    pub fn is_provider(&self, actor: &P) -> bool {
        self.roles.is_provider(actor)
    }

    pub fn paused(&self) -> bool {
        self.paused
    }

    pub fn cooldown(&self) -> u64 {
        self.rate.cooldown()
    }

    /// Returns the last admitted time of `action` by `actor`.
    pub fn last(&self, actor: &P, action: Action) -> Option<u64> {
        self.rate.last(actor, action)
    }

    /// Returns the id of the open batch.
    pub fn current_batch(&self) -> BatchId {
        self.batches.current()
    }

    pub fn batch(&self, id: BatchId) -> Option<&Batch> {
        self.batches.get(id)
    }

    pub fn batches(&self) -> impl Iterator<Item = &Batch> {
        self.batches.iter()
    }

    pub fn is_valid_for_analysis(&self, id: BatchId) -> bool {
        self.batches.is_valid_for_analysis(id)
    }

    /// Returns the contributions submitted to batch `id`, in submission order.
    pub fn contributions(&self, id: BatchId) -> &[C] {
        self.accumulator.contributions(id)
    }

    /// Returns the encrypted mean of batch `id`.
    pub fn aggregate(&self, id: BatchId) -> Option<C> {
        self.accumulator.aggregate(id)
    }

    pub fn request(&self, id: RequestId) -> Option<&Request> {
        self.requests.get(id)
    }

    /// Returns the number of decryption requests awaiting fulfillment.
    pub fn pending(&self) -> usize {
        self.requests.pending()
    }

    /// Returns the events committed since the last [Ledger::take_events], oldest first.
    pub fn events(&self) -> &[Event<P>] {
        &self.events
    }

    /// Remove and return the events committed since the last call, oldest first.
    pub fn take_events(&mut self) -> Vec<Event<P>> {
        std::mem::take(&mut self.events)
    }

    /// Reassign ownership to `owner`.
    pub fn transfer_ownership(&mut self, caller: &P, owner: P) -> Result<(), Error> {
        let previous = self.roles.transfer_ownership(caller, owner.clone())?;
        info!(?previous, ?owner, "ownership transferred");
        self.events.push(Event::OwnershipTransferred { previous, owner });
        Ok(())
    }

    /// Allow `provider` to submit contributions. Returns whether anything changed.
    pub fn add_provider(&mut self, caller: &P, provider: P) -> Result<bool, Error> {
        let added = self.roles.add_provider(caller, provider.clone())?;
        if added {
            debug!(?provider, "provider added");
            self.events.push(Event::ProviderAdded(provider));
        }
        Ok(added)
    }

    /// Prevent `provider` from submitting contributions. Returns whether anything changed.
    pub fn remove_provider(&mut self, caller: &P, provider: &P) -> Result<bool, Error> {
        let removed = self.roles.remove_provider(caller, provider)?;
        if removed {
            debug!(?provider, "provider removed");
            self.events.push(Event::ProviderRemoved(provider.clone()));
        }
        Ok(removed)
    }

    /// Block (or unblock) submissions and batch rotation.
    ///
    /// Setting the current value again is a no-op.
    pub fn set_paused(&mut self, caller: &P, paused: bool) -> Result<(), Error> {
        self.roles.ensure_owner(caller)?;
        if self.paused == paused {
            return Ok(());
        }
        self.paused = paused;
        info!(paused, "pause toggled");
        self.events.push(Event::PauseToggled(paused));
        Ok(())
    }

    /// Replace the cooldown applied to every rate-limited action.
    pub fn set_cooldown(&mut self, caller: &P, seconds: u64) -> Result<(), Error> {
        self.roles.ensure_owner(caller)?;
        self.rate.set_cooldown(seconds)?;
        debug!(seconds, "cooldown changed");
        self.events.push(Event::CooldownChanged(seconds));
        Ok(())
    }

    /// Add `contribution` to the open batch at time `now`.
    ///
    /// Returns the batch it landed in and its sequence number within that batch.
    pub fn submit(
        &mut self,
        caller: &P,
        contribution: C,
        now: u64,
    ) -> Result<(BatchId, u64), Error> {
        self.roles.ensure_provider(caller)?;
        if self.paused {
            return Err(Error::Paused);
        }
        self.rate.check(caller, Action::Submit, now)?;

        let batch = self.batches.current();
        let sequence = self.batches.record_contribution(batch)?;
        self.rate.record(caller, Action::Submit, now);
        let handle = contribution.handle();
        self.accumulator.append(batch, contribution);
        debug!(?caller, batch, sequence, "contribution recorded");
        self.events.push(Event::ContributionRecorded {
            provider: caller.clone(),
            batch,
            sequence,
            handle,
        });
        Ok((batch, sequence))
    }

    /// Seal the open batch and open the next one, returning the id of the new batch.
    pub fn open_next(&mut self, caller: &P) -> Result<BatchId, Error> {
        self.roles.ensure_owner(caller)?;
        if self.paused {
            return Err(Error::Paused);
        }

        let (closed, opened) = self.batches.open_next();
        if let Some(closed) = closed {
            info!(batch = closed.id, items = closed.items, "batch closed");
            self.events.push(Event::BatchClosed {
                batch: closed.id,
                items: closed.items,
            });
        }
        self.events.push(Event::BatchOpened(opened));
        Ok(opened)
    }

    /// Ask the [Oracle] to reveal the mean of sealed batch `batch`.
    ///
    /// Returns as soon as the request is registered: the answer arrives later through
    /// [Ledger::fulfill], correlated by the returned [RequestId].
    pub fn request_aggregate(
        &mut self,
        caller: &P,
        batch: BatchId,
        now: u64,
    ) -> Result<RequestId, Error> {
        self.rate.check(caller, Action::Request, now)?;
        if !self.batches.is_valid_for_analysis(batch) {
            return Err(Error::BatchClosedOrInvalid);
        }
        let aggregate = self
            .accumulator
            .aggregate(batch)
            .ok_or(Error::BatchClosedOrInvalid)?;
        let commitment = commitment(&self.identity, &aggregate);

        let request = self.oracle.submit(vec![aggregate.handle()])?;
        self.requests.insert(request, batch, commitment)?;
        self.rate.record(caller, Action::Request, now);
        info!(request, batch, ?commitment, "decryption requested");
        self.events.push(Event::DecryptionRequested { request, batch });
        Ok(request)
    }

    /// Accept the [Oracle]'s answer to `request`, returning the revealed value.
    ///
    /// The answer is only accepted once, only if the batch still aggregates to what was
    /// committed to at request time, and only if `proof` authenticates `cleartext` as the
    /// decryption of that aggregate.
    pub fn fulfill(
        &mut self,
        request: RequestId,
        cleartext: &[u8],
        proof: &[u8],
    ) -> Result<u64, Error> {
        let pending = match self.requests.pending_request(request) {
            Ok(pending) => pending,
            Err(err @ Error::ReplayAttempt(_)) => {
                warn!(request, "replayed fulfillment");
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        let batch = pending.batch;

        let aggregate = self.accumulator.aggregate(batch);
        let recomputed = aggregate
            .as_ref()
            .map(|aggregate| commitment(&self.identity, aggregate));
        let Some(aggregate) = aggregate.filter(|_| recomputed == Some(pending.commitment)) else {
            warn!(request, batch, expected = ?pending.commitment, ?recomputed, "state mismatch");
            return Err(Error::StateMismatch(request));
        };
        let handles = [aggregate.handle()];
        if !self.oracle.verify(request, &handles, cleartext, proof) {
            warn!(request, batch, "invalid proof");
            return Err(Error::InvalidProof(request));
        }
        let value = u64::decode(cleartext).map_err(|err| {
            debug!(request, ?err, "invalid cleartext");
            Error::InvalidCleartext(request)
        })?;

        self.requests.fulfill(request)?;
        info!(request, batch, value, "decryption completed");
        self.events.push(Event::DecryptionCompleted {
            request,
            batch,
            value,
        });
        Ok(value)
    }
}
