//! Component contracts: Source, Filter, Sink
//!
//! The three capability interfaces a chain is assembled from. All
//! `apply`/`consume` calls are made by the single dispatch task, so
//! implementations take `&mut self` and need no internal locking.
//!
//! # Blocking work
//!
//! Filter and sink logic must not block. A component with a blocking
//! step wraps it in an [`OffloadCall`] and returns
//! [`Verdict::Offload`] / [`SinkAck::Offload`]; the dispatch loop hands
//! the call to the worker pool and resumes the message when the result
//! comes back. When the pool's queue is full the rejection is routed
//! back to the submitting component through its `overloaded` hook, so
//! the component - not the loop - decides between dropping, retrying
//! and forwarding a substitute. A component that blocks in place
//! starves every chain - that hazard is documented, not prevented.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use ferry_protocol::Message;

use crate::error::{FilterError, JobError};
use crate::event::Emitter;

/// Function executed on a worker thread
///
/// Takes ownership of the message and produces a new one (or an error).
/// Must be pure with respect to chain state: it runs outside the
/// dispatch task and must not touch anything the loop owns.
pub type JobFn = Box<dyn FnOnce(Message) -> std::result::Result<Message, JobError> + Send>;

/// A blocking step handed to the worker pool
pub struct OffloadCall {
    /// The message the job operates on
    pub message: Message,

    /// The work to run off the dispatch thread
    pub work: JobFn,
}

impl OffloadCall {
    /// Bundle a message with its blocking work function
    pub fn new(
        message: Message,
        work: impl FnOnce(Message) -> std::result::Result<Message, JobError> + Send + 'static,
    ) -> Self {
        Self {
            message,
            work: Box::new(work),
        }
    }
}

impl std::fmt::Debug for OffloadCall {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OffloadCall")
            .field("message", &self.message)
            .finish_non_exhaustive()
    }
}

/// Outcome of a filter's `apply`
///
/// The per-message state machine: a received message is either
/// forwarded (possibly transformed, possibly multiplied) or dropped.
#[derive(Debug)]
pub enum Verdict {
    /// Pass this message to the next stage
    Forward(Message),

    /// Terminate this message's path silently
    Drop,

    /// Emit zero or more independent messages to the next stage,
    /// delivered in vector order
    FanOut(Vec<Message>),

    /// Run blocking work on the pool; its result re-enters the chain
    /// at the next stage
    Offload(OffloadCall),
}

/// Acknowledgement from a sink's `consume`
#[derive(Debug)]
pub enum SinkAck {
    /// Message fully handled
    Done,

    /// Terminal blocking work; the result is counted and discarded on
    /// success, reported on failure
    Offload(OffloadCall),
}

/// A message producer
///
/// `run` is spawned as its own task by `Pipeline::start` and should emit
/// messages through the [`Emitter`] until cancelled. Per-source emit
/// order is the order messages reach the chain's first hop.
pub trait Source: Send {
    /// Drive the source until cancellation
    fn run<'a>(
        &'a mut self,
        emitter: Emitter,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

    /// Component type name for logging
    fn name(&self) -> &'static str;
}

/// A consumer that is also a producer
///
/// Must return promptly: the dispatch loop delivers every message in
/// the process synchronously through `apply`.
pub trait Filter: Send {
    /// Consume one message and decide its fate
    fn apply(&mut self, message: Message) -> std::result::Result<Verdict, FilterError>;

    /// Called when a [`Verdict::Offload`] this filter returned was
    /// rejected because the worker queue was at capacity
    ///
    /// The message is handed back and the returned verdict decides its
    /// fate: drop it, forward something downstream instead (an error
    /// marker, a degraded result), or return another `Offload` to retry
    /// the submission once - if the queue is still full after the
    /// retry, the message is dropped.
    ///
    /// The default drops the message.
    fn overloaded(&mut self, message: Message) -> std::result::Result<Verdict, FilterError> {
        let _ = message;
        Ok(Verdict::Drop)
    }

    /// Component type name for logging
    fn name(&self) -> &'static str;
}

/// A terminal consumer
pub trait Sink: Send {
    /// Consume one message
    fn consume(&mut self, message: Message) -> std::result::Result<SinkAck, FilterError>;

    /// Called when a [`SinkAck::Offload`] this sink returned was
    /// rejected because the worker queue was at capacity
    ///
    /// The message is handed back; `None` drops it,
    /// `Some(SinkAck::Done)` means the sink handled it inline, and
    /// `Some(SinkAck::Offload)` retries the submission once (dropping
    /// the message if the queue is still full).
    ///
    /// The default drops the message.
    fn overloaded(
        &mut self,
        message: Message,
    ) -> std::result::Result<Option<SinkAck>, FilterError> {
        let _ = message;
        Ok(None)
    }

    /// Component type name for logging
    fn name(&self) -> &'static str;

    /// Flush and release resources during graceful shutdown
    ///
    /// Default implementation is a no-op.
    fn close(&mut self) -> std::result::Result<(), FilterError> {
        Ok(())
    }
}

impl std::fmt::Debug for dyn Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Source").field("name", &self.name()).finish()
    }
}

impl std::fmt::Debug for dyn Filter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Filter").field("name", &self.name()).finish()
    }
}

impl std::fmt::Debug for dyn Sink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sink").field("name", &self.name()).finish()
    }
}
