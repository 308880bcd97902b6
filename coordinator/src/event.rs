//! Externally observable events appended by committed transactions.

use crate::{BatchId, Handle, RequestId};
use bytes::{Buf, BufMut};
use commonware_codec::{EncodeSize, Error, Read, ReadExt, Write};
use commonware_cryptography::PublicKey;

/// An entry in the append-only event stream of a [crate::ledger::Ledger].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event<P: PublicKey> {
    OwnershipTransferred {
        previous: P,
        owner: P,
    },
    ProviderAdded(P),
    ProviderRemoved(P),
    PauseToggled(bool),
    CooldownChanged(u64),
    BatchOpened(BatchId),
    BatchClosed {
        batch: BatchId,
        items: u64,
    },
    ContributionRecorded {
        provider: P,
        batch: BatchId,
        sequence: u64,
        handle: Handle,
    },
    DecryptionRequested {
        request: RequestId,
        batch: BatchId,
    },
    DecryptionCompleted {
        request: RequestId,
        batch: BatchId,
        value: u64,
    },
}

impl<P: PublicKey> Write for Event<P> {
    fn write(&self, buf: &mut impl BufMut) {
        match self {
            Event::OwnershipTransferred { previous, owner } => {
                buf.put_u8(0);
                previous.write(buf);
                owner.write(buf);
            }
            Event::ProviderAdded(provider) => {
                buf.put_u8(1);
                provider.write(buf);
            }
            Event::ProviderRemoved(provider) => {
                buf.put_u8(2);
                provider.write(buf);
            }
            Event::PauseToggled(paused) => {
                buf.put_u8(3);
                paused.write(buf);
            }
            Event::CooldownChanged(seconds) => {
                buf.put_u8(4);
                seconds.write(buf);
            }
            Event::BatchOpened(batch) => {
                buf.put_u8(5);
                batch.write(buf);
            }
            Event::BatchClosed { batch, items } => {
                buf.put_u8(6);
                batch.write(buf);
                items.write(buf);
            }
            Event::ContributionRecorded {
                provider,
                batch,
                sequence,
                handle,
            } => {
                buf.put_u8(7);
                provider.write(buf);
                batch.write(buf);
                sequence.write(buf);
                handle.write(buf);
            }
            Event::DecryptionRequested { request, batch } => {
                buf.put_u8(8);
                request.write(buf);
                batch.write(buf);
            }
            Event::DecryptionCompleted {
                request,
                batch,
                value,
            } => {
                buf.put_u8(9);
                request.write(buf);
                batch.write(buf);
                value.write(buf);
            }
        }
    }
}

impl<P: PublicKey> EncodeSize for Event<P> {
    fn encode_size(&self) -> usize {
        1 + match self {
            Event::OwnershipTransferred { previous, owner } => {
                previous.encode_size() + owner.encode_size()
            }
            Event::ProviderAdded(provider) | Event::ProviderRemoved(provider) => {
                provider.encode_size()
            }
            Event::PauseToggled(paused) => paused.encode_size(),
            Event::CooldownChanged(seconds) => seconds.encode_size(),
            Event::BatchOpened(batch) => batch.encode_size(),
            Event::BatchClosed { batch, items } => batch.encode_size() + items.encode_size(),
            Event::ContributionRecorded {
                provider,
                batch,
                sequence,
                handle,
            } => {
                provider.encode_size()
                    + batch.encode_size()
                    + sequence.encode_size()
                    + handle.encode_size()
            }
            Event::DecryptionRequested { request, batch } => {
                request.encode_size() + batch.encode_size()
            }
            Event::DecryptionCompleted {
                request,
                batch,
                value,
            } => request.encode_size() + batch.encode_size() + value.encode_size(),
        }
    }
}

impl<P: PublicKey> Read for Event<P> {
    type Cfg = ();

    fn read_cfg(buf: &mut impl Buf, _: &()) -> Result<Self, Error> {
        let tag = u8::read(buf)?;
        let event = match tag {
            0 => Event::OwnershipTransferred {
                previous: P::read(buf)?,
                owner: P::read(buf)?,
            },
            1 => Event::ProviderAdded(P::read(buf)?),
            2 => Event::ProviderRemoved(P::read(buf)?),
            3 => Event::PauseToggled(bool::read(buf)?),
            4 => Event::CooldownChanged(u64::read(buf)?),
            5 => Event::BatchOpened(u64::read(buf)?),
            6 => Event::BatchClosed {
                batch: u64::read(buf)?,
                items: u64::read(buf)?,
            },
            7 => Event::ContributionRecorded {
                provider: P::read(buf)?,
                batch: u64::read(buf)?,
                sequence: u64::read(buf)?,
                handle: Handle::read(buf)?,
            },
            8 => Event::DecryptionRequested {
                request: u64::read(buf)?,
                batch: u64::read(buf)?,
            },
            9 => Event::DecryptionCompleted {
                request: u64::read(buf)?,
                batch: u64::read(buf)?,
                value: u64::read(buf)?,
            },
            _ => return Err(Error::Invalid("Event", "Invalid event type")),
        };
        Ok(event)
    }
}
