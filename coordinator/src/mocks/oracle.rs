use super::{Key, Masked};
use crate::{sequencer::Mailbox, Ciphertext, Error, Handle, RequestId};
use bytes::{BufMut, Bytes, BytesMut};
use commonware_codec::{DecodeExt, FixedSize};
use commonware_cryptography::{ed25519, PublicKey, Signer, Verifier};
use futures::{channel::mpsc, StreamExt};
use tracing::debug;

/// Namespace of the signatures produced by a [Decryptor].
pub const NAMESPACE: &[u8] = b"_SEALBATCH_ORACLE";

/// A decryption registered with a mock [Oracle].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Submission {
    pub request: RequestId,
    pub handles: Vec<Handle>,
}

/// An answer to a [Submission].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Fulfillment {
    pub request: RequestId,
    pub cleartext: Bytes,
    pub proof: Bytes,
}

/// The message a [Decryptor] signs to vouch for `cleartext` as the decryption of `handles`
/// submitted under `request`.
fn message(request: RequestId, handles: &[Handle], cleartext: &[u8]) -> Vec<u8> {
    let mut message = Vec::with_capacity(8 + Handle::SIZE * handles.len() + cleartext.len());
    message.extend_from_slice(&request.to_be_bytes());
    for handle in handles {
        message.extend_from_slice(handle.as_ref());
    }
    message.extend_from_slice(cleartext);
    message
}

/// A mock [crate::Oracle] that queues submissions for a [Decryptor] and trusts its signatures.
pub struct Oracle {
    identity: ed25519::PublicKey,
    next: RequestId,
    sender: mpsc::UnboundedSender<Submission>,
}

impl Oracle {
    /// Create a new [Oracle] trusting `identity`, along with the queue of submissions.
    pub fn new(identity: ed25519::PublicKey) -> (Self, mpsc::UnboundedReceiver<Submission>) {
        let (sender, receiver) = mpsc::unbounded();
        (
            Self {
                identity,
                next: 1,
                sender,
            },
            receiver,
        )
    }
}

impl crate::Oracle for Oracle {
    fn submit(&mut self, handles: Vec<Handle>) -> Result<RequestId, Error> {
        let request = self.next;
        self.sender
            .unbounded_send(Submission { request, handles })
            .map_err(|_| Error::OracleUnavailable)?;
        self.next += 1;
        Ok(request)
    }

    fn verify(
        &self,
        request: RequestId,
        handles: &[Handle],
        cleartext: &[u8],
        proof: &[u8],
    ) -> bool {
        let Ok(signature) = ed25519::Signature::decode(proof) else {
            return false;
        };
        let message = message(request, handles, cleartext);
        self.identity.verify(Some(NAMESPACE), &message, &signature)
    }
}

/// Answers [Submission]s by unmasking each handle with a [Key] and signing the result.
#[derive(Clone)]
pub struct Decryptor {
    signer: ed25519::PrivateKey,
    key: Key,
}

impl Decryptor {
    pub fn new(signer: ed25519::PrivateKey, key: Key) -> Self {
        Self { signer, key }
    }

    /// Returns the identity an [Oracle] should trust.
    pub fn public_key(&self) -> ed25519::PublicKey {
        self.signer.public_key()
    }

    /// Sign `cleartext` as the decryption of `handles` submitted under `request`.
    pub fn prove(&self, request: RequestId, handles: &[Handle], cleartext: &[u8]) -> Bytes {
        let message = message(request, handles, cleartext);
        let signature = self.signer.sign(Some(NAMESPACE), &message);
        Bytes::copy_from_slice(signature.as_ref())
    }

    /// Decrypt every handle of `submission` (as big-endian `u64`s, in order).
    ///
    /// Returns `None` if any handle does not reference a [Masked] value.
    pub fn decrypt(&self, submission: &Submission) -> Option<Fulfillment> {
        let mut cleartext = BytesMut::with_capacity(8 * submission.handles.len());
        for handle in &submission.handles {
            let ciphertext = Masked::from_handle(handle)?;
            cleartext.put_u64(self.key.decrypt(&ciphertext));
        }
        let cleartext = cleartext.freeze();
        let proof = self.prove(submission.request, &submission.handles, &cleartext);
        Some(Fulfillment {
            request: submission.request,
            cleartext,
            proof,
        })
    }

    /// Answer every submission through `mailbox` until `submissions` is closed.
    pub async fn run<P: PublicKey, C: Ciphertext>(
        self,
        mut submissions: mpsc::UnboundedReceiver<Submission>,
        mut mailbox: Mailbox<P, C>,
    ) {
        while let Some(submission) = submissions.next().await {
            let Some(fulfillment) = self.decrypt(&submission) else {
                debug!(request = submission.request, "unable to decrypt submission");
                continue;
            };
            let result = mailbox
                .fulfill(
                    fulfillment.request,
                    fulfillment.cleartext,
                    fulfillment.proof,
                )
                .await;
            debug!(request = submission.request, ?result, "fulfilled submission");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Oracle as _;
    use commonware_cryptography::PrivateKeyExt;

    #[test]
    fn test_submit_and_verify() {
        let decryptor = Decryptor::new(ed25519::PrivateKey::from_seed(0), Key::new(5));
        let (mut oracle, mut submissions) = Oracle::new(decryptor.public_key());
        let handle = Key::new(5).encrypt(77).handle();
        assert_eq!(oracle.submit(vec![handle]), Ok(1));
        assert_eq!(oracle.submit(vec![handle]), Ok(2));

        let submission = submissions.try_next().unwrap().unwrap();
        assert_eq!(submission.request, 1);
        let fulfillment = decryptor.decrypt(&submission).unwrap();
        let cleartext = &fulfillment.cleartext;
        let proof = &fulfillment.proof;
        assert_eq!(cleartext.as_ref(), &77u64.to_be_bytes());
        assert!(oracle.verify(1, &[handle], cleartext, proof));

        // Bound to the request, the handles and the cleartext
        let other = Key::new(5).encrypt(78).handle();
        assert!(!oracle.verify(2, &[handle], cleartext, proof));
        assert!(!oracle.verify(1, &[other], cleartext, proof));
        assert!(!oracle.verify(1, &[handle, handle], cleartext, proof));
        assert!(!oracle.verify(1, &[], cleartext, proof));
        assert!(!oracle.verify(1, &[handle], &78u64.to_be_bytes(), proof));
        assert!(!oracle.verify(1, &[handle], cleartext, b"garbage"));
    }

    #[test]
    fn test_untrusted_signer() {
        let decryptor = Decryptor::new(ed25519::PrivateKey::from_seed(0), Key::new(5));
        let impostor = Decryptor::new(ed25519::PrivateKey::from_seed(1), Key::new(5));
        let (oracle, _) = Oracle::new(decryptor.public_key());
        let handle = Key::new(5).encrypt(1).handle();
        let proof = impostor.prove(1, &[handle], b"cleartext");
        assert!(!oracle.verify(1, &[handle], b"cleartext", &proof));
    }

    #[test]
    fn test_unavailable() {
        let identity = ed25519::PrivateKey::from_seed(0).public_key();
        let (mut oracle, submissions) = Oracle::new(identity);
        drop(submissions);
        assert_eq!(oracle.submit(Vec::new()), Err(Error::OracleUnavailable));
    }
}
