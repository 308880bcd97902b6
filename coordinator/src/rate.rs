//! Per-actor cooldown enforcement.

use crate::{Action, Error};
use commonware_cryptography::PublicKey;
use std::collections::HashMap;

/// Enforces a minimum interval (in seconds) between two actions of the same class by the same
/// actor.
///
/// Timestamps are supplied by the caller and only ever move forward for a given actor and class.
pub struct RateGate<P: PublicKey> {
    cooldown: u64,
    submissions: HashMap<P, u64>,
    requests: HashMap<P, u64>,
}

impl<P: PublicKey> RateGate<P> {
    /// Create a new [RateGate] with the given cooldown.
    pub fn new(cooldown: u64) -> Result<Self, Error> {
        if cooldown == 0 {
            return Err(Error::InvalidCooldown);
        }
        Ok(Self {
            cooldown,
            submissions: HashMap::new(),
            requests: HashMap::new(),
        })
    }

    pub fn cooldown(&self) -> u64 {
        self.cooldown
    }

    /// Replace the cooldown. Fails with [Error::InvalidCooldown] if `seconds` is zero.
    pub fn set_cooldown(&mut self, seconds: u64) -> Result<(), Error> {
        if seconds == 0 {
            return Err(Error::InvalidCooldown);
        }
        self.cooldown = seconds;
        Ok(())
    }

    /// Returns the last admitted time of `action` by `actor`, if any.
    pub fn last(&self, actor: &P, action: Action) -> Option<u64> {
        self.series(action).get(actor).copied()
    }

    /// Fails with [Error::CooldownActive] if `actor` may not perform `action` at `now`.
    ///
    /// The boundary is inclusive: `now == last + cooldown` is admitted.
    pub fn check(&self, actor: &P, action: Action, now: u64) -> Result<(), Error> {
        let Some(last) = self.last(actor, action) else {
            return Ok(());
        };
        if now < last.saturating_add(self.cooldown) {
            return Err(Error::CooldownActive);
        }
        Ok(())
    }

    /// Record that `actor` performed `action` at `now`.
    ///
    /// Must only be called after [RateGate::check] admitted the same arguments.
    pub fn record(&mut self, actor: &P, action: Action, now: u64) {
        let series = match action {
            Action::Submit => &mut self.submissions,
            Action::Request => &mut self.requests,
        };
        let last = series.entry(actor.clone()).or_insert(now);
        *last = (*last).max(now);
    }

    /// [RateGate::check] and, if admitted, [RateGate::record].
    pub fn check_and_record(&mut self, actor: &P, action: Action, now: u64) -> Result<(), Error> {
        self.check(actor, action, now)?;
        self.record(actor, action, now);
        Ok(())
    }

    fn series(&self, action: Action) -> &HashMap<P, u64> {
        match action {
            Action::Submit => &self.submissions,
            Action::Request => &self.requests,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use commonware_cryptography::{ed25519, PrivateKeyExt, Signer};

    fn key(seed: u64) -> ed25519::PublicKey {
        ed25519::PrivateKey::from_seed(seed).public_key()
    }

    #[test]
    fn test_zero_cooldown_rejected() {
        assert!(matches!(
            RateGate::<ed25519::PublicKey>::new(0),
            Err(Error::InvalidCooldown)
        ));
        let mut gate = RateGate::<ed25519::PublicKey>::new(10).unwrap();
        assert_eq!(gate.set_cooldown(0), Err(Error::InvalidCooldown));
        assert_eq!(gate.cooldown(), 10);
        gate.set_cooldown(5).unwrap();
        assert_eq!(gate.cooldown(), 5);
    }

    #[test]
    fn test_boundary_inclusive() {
        let mut gate = RateGate::new(60).unwrap();
        let actor = key(0);
        gate.check_and_record(&actor, Action::Submit, 0).unwrap();
        assert_eq!(
            gate.check_and_record(&actor, Action::Submit, 30),
            Err(Error::CooldownActive)
        );
        assert_eq!(
            gate.check_and_record(&actor, Action::Submit, 59),
            Err(Error::CooldownActive)
        );
        assert_eq!(gate.last(&actor, Action::Submit), Some(0));
        gate.check_and_record(&actor, Action::Submit, 60).unwrap();
        assert_eq!(gate.last(&actor, Action::Submit), Some(60));
    }

    #[test]
    fn test_classes_and_actors_independent() {
        let mut gate = RateGate::new(60).unwrap();
        gate.check_and_record(&key(0), Action::Submit, 100).unwrap();
        gate.check_and_record(&key(0), Action::Request, 100).unwrap();
        gate.check_and_record(&key(1), Action::Submit, 100).unwrap();
        assert_eq!(
            gate.check(&key(0), Action::Request, 120),
            Err(Error::CooldownActive)
        );
        assert_eq!(gate.last(&key(1), Action::Request), None);
    }

    #[test]
    fn test_check_does_not_record() {
        let mut gate = RateGate::new(60).unwrap();
        gate.check(&key(0), Action::Submit, 10).unwrap();
        assert_eq!(gate.last(&key(0), Action::Submit), None);
        gate.record(&key(0), Action::Submit, 10);
        assert_eq!(gate.check(&key(0), Action::Submit, 69), Err(Error::CooldownActive));
    }

    #[test]
    fn test_cooldown_change_applies_to_existing_records() {
        let mut gate = RateGate::new(60).unwrap();
        gate.check_and_record(&key(0), Action::Submit, 0).unwrap();
        gate.set_cooldown(10).unwrap();
        gate.check(&key(0), Action::Submit, 10).unwrap();
    }
}
