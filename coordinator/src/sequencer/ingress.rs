use crate::{BatchId, Ciphertext, Error, RequestId};
use bytes::Bytes;
use commonware_cryptography::PublicKey;
use futures::{
    channel::{mpsc, oneshot},
    SinkExt,
};

/// Transactions that can be sent to the [`Engine`](super::Engine).
pub enum Message<P: PublicKey, C: Ciphertext> {
    TransferOwnership {
        caller: P,
        owner: P,
        responder: oneshot::Sender<Result<(), Error>>,
    },
    AddProvider {
        caller: P,
        provider: P,
        responder: oneshot::Sender<Result<bool, Error>>,
    },
    RemoveProvider {
        caller: P,
        provider: P,
        responder: oneshot::Sender<Result<bool, Error>>,
    },
    SetPaused {
        caller: P,
        paused: bool,
        responder: oneshot::Sender<Result<(), Error>>,
    },
    SetCooldown {
        caller: P,
        seconds: u64,
        responder: oneshot::Sender<Result<(), Error>>,
    },
    Submit {
        caller: P,
        contribution: C,
        responder: oneshot::Sender<Result<(BatchId, u64), Error>>,
    },
    OpenNext {
        caller: P,
        responder: oneshot::Sender<Result<BatchId, Error>>,
    },
    Request {
        caller: P,
        batch: BatchId,
        responder: oneshot::Sender<Result<RequestId, Error>>,
    },

    /// Callback from the [crate::Oracle].
    Fulfill {
        request: RequestId,
        cleartext: Bytes,
        proof: Bytes,
        responder: oneshot::Sender<Result<u64, Error>>,
    },
}

/// Ingress mailbox for the [`Engine`](super::Engine).
///
/// Every method resolves once the transaction has been committed or rejected. If the engine has
/// stopped, [Error::Closed] is returned.
#[derive(Clone)]
pub struct Mailbox<P: PublicKey, C: Ciphertext> {
    sender: mpsc::Sender<Message<P, C>>,
}

impl<P: PublicKey, C: Ciphertext> Mailbox<P, C> {
    pub(super) fn new(sender: mpsc::Sender<Message<P, C>>) -> Self {
        Self { sender }
    }

    async fn call<T>(
        &mut self,
        message: impl FnOnce(oneshot::Sender<Result<T, Error>>) -> Message<P, C>,
    ) -> Result<T, Error> {
        let (responder, receiver) = oneshot::channel();
        self.sender
            .send(message(responder))
            .await
            .map_err(|_| Error::Closed)?;
        receiver.await.map_err(|_| Error::Closed)?
    }

    pub async fn transfer_ownership(&mut self, caller: P, owner: P) -> Result<(), Error> {
        self.call(|responder| Message::TransferOwnership {
            caller,
            owner,
            responder,
        })
        .await
    }

    pub async fn add_provider(&mut self, caller: P, provider: P) -> Result<bool, Error> {
        self.call(|responder| Message::AddProvider {
            caller,
            provider,
            responder,
        })
        .await
    }

    pub async fn remove_provider(&mut self, caller: P, provider: P) -> Result<bool, Error> {
        self.call(|responder| Message::RemoveProvider {
            caller,
            provider,
            responder,
        })
        .await
    }

    pub async fn set_paused(&mut self, caller: P, paused: bool) -> Result<(), Error> {
        self.call(|responder| Message::SetPaused {
            caller,
            paused,
            responder,
        })
        .await
    }

    pub async fn set_cooldown(&mut self, caller: P, seconds: u64) -> Result<(), Error> {
        self.call(|responder| Message::SetCooldown {
            caller,
            seconds,
            responder,
        })
        .await
    }

    /// Submit `contribution` to the open batch.
    pub async fn submit(&mut self, caller: P, contribution: C) -> Result<(BatchId, u64), Error> {
        self.call(|responder| Message::Submit {
            caller,
            contribution,
            responder,
        })
        .await
    }

    /// Seal the open batch and open the next one.
    pub async fn open_next(&mut self, caller: P) -> Result<BatchId, Error> {
        self.call(|responder| Message::OpenNext { caller, responder }).await
    }

    /// Ask for the mean of sealed batch `batch` to be revealed.
    pub async fn request(&mut self, caller: P, batch: BatchId) -> Result<RequestId, Error> {
        self.call(|responder| Message::Request {
            caller,
            batch,
            responder,
        })
        .await
    }

    /// Deliver the oracle's answer to `request`.
    pub async fn fulfill(
        &mut self,
        request: RequestId,
        cleartext: Bytes,
        proof: Bytes,
    ) -> Result<u64, Error> {
        self.call(|responder| Message::Fulfill {
            request,
            cleartext,
            proof,
            responder,
        })
        .await
    }
}
