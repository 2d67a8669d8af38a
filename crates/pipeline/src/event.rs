//! Dispatch events and the source-side emitter
//!
//! Sources, injectors and (indirectly) worker results all feed the
//! dispatch loop through queues; [`Event`] is the unit on the
//! source/injection queue. The queue is the only ordering authority:
//! per-producer FIFO in, per-producer FIFO into the chain.

use crossfire::{MAsyncTx, TrySendError};
use thiserror::Error;

use ferry_protocol::{ChainId, Message};

use crate::error::InjectError;

/// A message entering the dispatch loop, tagged with its chain
#[derive(Debug)]
pub struct Event {
    /// Chain the message belongs to
    pub chain: ChainId,

    /// The message itself
    pub message: Message,
}

/// The dispatch queue has shut down
///
/// Sources treat this as their signal to exit.
#[derive(Debug, Error)]
#[error("dispatch loop has shut down")]
pub struct EmitError;

/// Handle a source uses to push messages into its chain
///
/// Cloneable; each emit awaits queue capacity, so a full dispatch queue
/// backpressures the source instead of dropping messages.
#[derive(Clone)]
pub struct Emitter {
    chain: ChainId,
    tx: MAsyncTx<Event>,
}

impl Emitter {
    pub(crate) fn new(chain: ChainId, tx: MAsyncTx<Event>) -> Self {
        Self { chain, tx }
    }

    /// The chain this emitter feeds
    #[inline]
    pub fn chain(&self) -> ChainId {
        self.chain
    }

    /// Emit a message, waiting for queue capacity
    pub async fn emit(&self, message: Message) -> Result<(), EmitError> {
        self.tx
            .send(Event {
                chain: self.chain,
                message,
            })
            .await
            .map_err(|_| EmitError)
    }

    /// Emit without waiting; fails when the queue is full or closed
    pub fn try_emit(&self, message: Message) -> Result<(), InjectError> {
        self.tx
            .try_send(Event {
                chain: self.chain,
                message,
            })
            .map_err(|err| match err {
                TrySendError::Full(event) => InjectError::Full(event.message),
                TrySendError::Disconnected(event) => InjectError::Closed(event.message),
            })
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter").field("chain", &self.chain).finish()
    }
}
