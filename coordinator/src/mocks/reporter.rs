use crate::event::Event;
use commonware_cryptography::PublicKey;
use futures::channel::mpsc;

/// A mock [crate::Reporter] that forwards every event to a channel.
#[derive(Clone)]
pub struct Reporter<P: PublicKey> {
    sender: mpsc::UnboundedSender<Event<P>>,
}

impl<P: PublicKey> Reporter<P> {
    /// Create a new [Reporter] and the receiving end of its events.
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Event<P>>) {
        let (sender, receiver) = mpsc::unbounded();
        (Self { sender }, receiver)
    }
}

impl<P: PublicKey> crate::Reporter for Reporter<P> {
    type PublicKey = P;

    async fn report(&mut self, event: Event<P>) {
        let _ = self.sender.unbounded_send(event);
    }
}
