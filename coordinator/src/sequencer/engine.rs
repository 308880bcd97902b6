use super::{
    ingress::{Mailbox, Message},
    metrics::Metrics,
    Config,
};
use crate::{ledger::Ledger, Ciphertext, Error, Oracle, Reporter};
use commonware_cryptography::PublicKey;
use commonware_runtime::{Clock, Handle, Metrics as RuntimeMetrics, Spawner};
use commonware_utils::SystemTimeExt;
use futures::{
    channel::{mpsc, oneshot},
    StreamExt,
};
use tracing::{debug, trace};

/// Hosts a [Ledger], applying the transactions received on its [Mailbox] one at a time.
///
/// The order in which messages are dequeued is the total order of transactions. Oracle
/// callbacks arrive on the same [Mailbox], so they are serialized with everything else.
pub struct Engine<
    E: Clock + Spawner + RuntimeMetrics,
    P: PublicKey,
    C: Ciphertext,
    O: Oracle,
    R: Reporter<PublicKey = P>,
> {
    context: E,
    ledger: Ledger<P, C, O>,
    reporter: R,
    mailbox: mpsc::Receiver<Message<P, C>>,

    metrics: Metrics,
}

impl<
        E: Clock + Spawner + RuntimeMetrics,
        P: PublicKey,
        C: Ciphertext,
        O: Oracle,
        R: Reporter<PublicKey = P>,
    > Engine<E, P, C, O, R>
{
    /// Create a new engine hosting a fresh [Ledger] that uses `oracle`.
    ///
    /// Returns the engine and a mailbox for sending it transactions.
    pub fn new(
        context: E,
        cfg: Config<P, R>,
        oracle: O,
    ) -> Result<(Self, Mailbox<P, C>), Error> {
        let ledger = Ledger::new(cfg.ledger, oracle)?;
        let (sender, mailbox) = mpsc::channel(cfg.mailbox_size);
        let metrics = Metrics::init(context.clone());
        metrics.batch.set(ledger.current_batch() as i64);

        Ok((
            Self {
                context,
                ledger,
                reporter: cfg.reporter,
                mailbox,
                metrics,
            },
            Mailbox::new(sender),
        ))
    }

    /// Start the engine.
    ///
    /// The engine stops once every [Mailbox] has been dropped.
    pub fn start(self) -> Handle<()> {
        self.context.clone().spawn(|_| self.run())
    }

    async fn run(mut self) {
        while let Some(message) = self.mailbox.next().await {
            // Seconds since the epoch
            let now = self.context.current().epoch_millis() / 1_000;
            self.handle(message, now);

            // Forward committed events
            for event in self.ledger.take_events() {
                self.reporter.report(event).await;
            }
            self.metrics.batch.set(self.ledger.current_batch() as i64);
            self.metrics.pending.set(self.ledger.pending() as i64);
        }
        debug!("mailbox closed");
    }

    fn handle(&mut self, message: Message<P, C>, now: u64) {
        match message {
            Message::TransferOwnership {
                caller,
                owner,
                responder,
            } => {
                trace!("mailbox: transfer ownership");
                let result = self.ledger.transfer_ownership(&caller, owner);
                self.respond(responder, result);
            }
            Message::AddProvider {
                caller,
                provider,
                responder,
            } => {
                trace!("mailbox: add provider");
                let result = self.ledger.add_provider(&caller, provider);
                self.respond(responder, result);
            }
            Message::RemoveProvider {
                caller,
                provider,
                responder,
            } => {
                trace!("mailbox: remove provider");
                let result = self.ledger.remove_provider(&caller, &provider);
                self.respond(responder, result);
            }
            Message::SetPaused {
                caller,
                paused,
                responder,
            } => {
                trace!("mailbox: set paused");
                let result = self.ledger.set_paused(&caller, paused);
                self.respond(responder, result);
            }
            Message::SetCooldown {
                caller,
                seconds,
                responder,
            } => {
                trace!("mailbox: set cooldown");
                let result = self.ledger.set_cooldown(&caller, seconds);
                self.respond(responder, result);
            }
            Message::Submit {
                caller,
                contribution,
                responder,
            } => {
                trace!("mailbox: submit");
                let result = self.ledger.submit(&caller, contribution, now);
                if result.is_ok() {
                    self.metrics.contributions.inc();
                }
                self.respond(responder, result);
            }
            Message::OpenNext { caller, responder } => {
                trace!("mailbox: open next");
                let result = self.ledger.open_next(&caller);
                self.respond(responder, result);
            }
            Message::Request {
                caller,
                batch,
                responder,
            } => {
                trace!("mailbox: request");
                let result = self.ledger.request_aggregate(&caller, batch, now);
                if result.is_ok() {
                    self.metrics.requests.inc();
                }
                self.respond(responder, result);
            }
            Message::Fulfill {
                request,
                cleartext,
                proof,
                responder,
            } => {
                trace!("mailbox: fulfill");
                let result = self.ledger.fulfill(request, &cleartext, &proof);
                if result.is_ok() {
                    self.metrics.fulfilled.inc();
                }
                self.respond(responder, result);
            }
        }
    }

    fn respond<T>(&self, responder: oneshot::Sender<Result<T, Error>>, result: Result<T, Error>) {
        if let Err(err) = &result {
            debug!(?err, "transaction rejected");
            self.metrics.rejected.inc();
        }
        let _ = responder.send(result);
    }
}
