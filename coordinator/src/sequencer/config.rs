use crate::{ledger, Reporter};
use commonware_cryptography::PublicKey;

/// Configuration for the [`Engine`](super::Engine).
pub struct Config<P: PublicKey, R: Reporter<PublicKey = P>> {
    /// Configuration of the hosted [`Ledger`](crate::ledger::Ledger).
    pub ledger: ledger::Config<P>,

    /// Receives every committed event, in order.
    pub reporter: R,

    /// The maximum size of the mailbox backlog.
    pub mailbox_size: usize,
}
