//! Two-tier authorization: a single owner and a set of providers.

use crate::Error;
use commonware_cryptography::PublicKey;
use std::collections::BTreeSet;

/// Tracks the owner and the set of actors allowed to submit contributions.
///
/// The owner is a provider at genesis but may later be removed like any other provider.
pub struct Roles<P: PublicKey> {
    owner: P,
    providers: BTreeSet<P>,
}

impl<P: PublicKey> Roles<P> {
    /// Create a new [Roles] with `owner` as both owner and sole provider.
    pub fn new(owner: P) -> Self {
        let mut providers = BTreeSet::new();
        providers.insert(owner.clone());
        Self { owner, providers }
    }

    /// Returns the current owner.
    pub fn owner(&self) -> &P {
        &self.owner
    }

    pub fn is_owner(&self, actor: &P) -> bool {
        &self.owner == actor
    }

    pub fn is_provider(&self, actor: &P) -> bool {
        self.providers.contains(actor)
    }

    /// Fails with [Error::Unauthorized] unless `caller` is the owner.
    pub fn ensure_owner(&self, caller: &P) -> Result<(), Error> {
        if !self.is_owner(caller) {
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    /// Fails with [Error::Unauthorized] unless `caller` is a provider.
    pub fn ensure_provider(&self, caller: &P) -> Result<(), Error> {
        if !self.is_provider(caller) {
            return Err(Error::Unauthorized);
        }
        Ok(())
    }

    /// Reassign ownership to `owner`, returning the previous owner.
    pub fn transfer_ownership(&mut self, caller: &P, owner: P) -> Result<P, Error> {
        self.ensure_owner(caller)?;
        Ok(std::mem::replace(&mut self.owner, owner))
    }

    /// Grant provider capability to `provider`.
    ///
    /// Returns `false` (and changes nothing) if `provider` already has it.
    pub fn add_provider(&mut self, caller: &P, provider: P) -> Result<bool, Error> {
        self.ensure_owner(caller)?;
        Ok(self.providers.insert(provider))
    }

    /// Revoke provider capability from `provider`.
    ///
    /// Returns `false` (and changes nothing) if `provider` did not have it.
    pub fn remove_provider(&mut self, caller: &P, provider: &P) -> Result<bool, Error> {
        self.ensure_owner(caller)?;
        Ok(self.providers.remove(provider))
    }
}
