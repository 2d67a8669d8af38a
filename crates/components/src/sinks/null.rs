//! Discarding sink
//!
//! Accepts and discards every message, keeping only a count. Useful for
//! load tests and as a fan-in target when only metrics matter.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use ferry_pipeline::{ConstructionError, FilterError, Sink, SinkAck, SinkFactory};
use ferry_protocol::Message;
use ferry_topology::ComponentConfig;

pub struct NullSink {
    consumed: Arc<AtomicU64>,
}

impl NullSink {
    pub fn new() -> Self {
        Self {
            consumed: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared counter of consumed messages
    pub fn counter(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.consumed)
    }
}

impl Default for NullSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Sink for NullSink {
    fn consume(&mut self, _message: Message) -> Result<SinkAck, FilterError> {
        self.consumed.fetch_add(1, Ordering::Relaxed);
        Ok(SinkAck::Done)
    }

    fn name(&self) -> &'static str {
        "null"
    }

    fn close(&mut self) -> Result<(), FilterError> {
        tracing::debug!(
            consumed = self.consumed.load(Ordering::Relaxed),
            "null sink closed"
        );
        Ok(())
    }
}

pub struct NullSinkFactory;

impl SinkFactory for NullSinkFactory {
    fn type_name(&self) -> &'static str {
        "null"
    }

    fn create(&self, _config: &ComponentConfig) -> Result<Box<dyn Sink>, ConstructionError> {
        Ok(Box::new(NullSink::new()))
    }
}
