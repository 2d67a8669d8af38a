//! Synchronous injection adapter
//!
//! Lets a conventional blocking caller hand a message to a running
//! pipeline without joining the dispatch loop's scheduling context. The
//! handle performs a non-blocking enqueue onto the same queue the loop
//! polls for source events; it never waits for the message to be
//! processed.

use ferry_protocol::{ChainId, Message};

use crate::error::InjectError;
use crate::event::Emitter;

/// Thread-safe, non-blocking entry point into a running chain
///
/// Obtained from `PipelineHandle::injector`. Safe to clone and call
/// concurrently from any thread: each call is a lock-free `try_send`.
///
/// # Ordering
///
/// Messages injected by one caller reach the chain in injection order.
/// Interleaving across distinct callers is unspecified.
///
/// # Example
///
/// ```ignore
/// let injector = handle.injector("events_in").unwrap();
/// std::thread::spawn(move || {
///     injector.inject(Message::from_text("from a blocking thread")).unwrap();
/// });
/// ```
#[derive(Clone, Debug)]
pub struct InjectHandle {
    emitter: Emitter,
}

impl InjectHandle {
    pub(crate) fn new(emitter: Emitter) -> Self {
        Self { emitter }
    }

    /// The chain this handle injects into
    #[inline]
    pub fn chain(&self) -> ChainId {
        self.emitter.chain()
    }

    /// Inject a message without blocking
    ///
    /// Fails with [`InjectError::Full`] when the dispatch queue is at
    /// capacity (the caller decides whether to retry or drop) and
    /// [`InjectError::Closed`] once the pipeline has shut down. The
    /// rejected message is returned inside the error.
    pub fn inject(&self, message: Message) -> Result<(), InjectError> {
        self.emitter.try_emit(message)
    }
}
