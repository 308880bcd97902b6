//! Totally order the transactions of many callers against a single [Ledger](crate::ledger::Ledger).
//!
//! # Design
//!
//! The [Engine] owns the ledger and processes one [Message] at a time from its [Mailbox].
//! Callers (providers, the owner, anyone requesting a decryption) hold clones of the mailbox
//! and await the outcome of their transaction. Time is read from the runtime [Clock](commonware_runtime::Clock)
//! when a transaction is dequeued.
//!
//! The [Oracle](crate::Oracle) is never awaited. A decryption request returns as soon as it is
//! registered, and the oracle delivers its answer later through [Mailbox::fulfill], which is
//! ordered like any other transaction. After each transaction, newly committed events are
//! handed to the configured [Reporter](crate::Reporter).

mod config;
pub use config::Config;
mod engine;
pub use engine::Engine;
mod ingress;
pub use ingress::{Mailbox, Message};
mod metrics;
