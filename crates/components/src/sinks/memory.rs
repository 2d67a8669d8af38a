//! In-memory collecting sink
//!
//! Stores every consumed message in a shared buffer, observable through
//! a [`MemoryHandle`]. This is the sink integration tests assert
//! against; it is registered like any other type so TOML-described
//! pipelines can use it too.

use std::sync::Arc;

use parking_lot::Mutex;

use ferry_pipeline::{ConstructionError, FilterError, Sink, SinkAck, SinkFactory};
use ferry_protocol::Message;
use ferry_topology::ComponentConfig;

type Buffer = Arc<Mutex<Vec<Message>>>;

/// Read side of a [`MemorySink`]'s buffer
#[derive(Clone, Default)]
pub struct MemoryHandle {
    buffer: Buffer,
}

impl MemoryHandle {
    /// Copy of everything consumed so far, in consumption order
    pub fn messages(&self) -> Vec<Message> {
        self.buffer.lock().clone()
    }

    /// Payload texts of everything consumed so far
    ///
    /// Binary payloads appear as empty strings.
    pub fn texts(&self) -> Vec<String> {
        self.buffer
            .lock()
            .iter()
            .map(|m| m.text().unwrap_or_default().to_string())
            .collect()
    }

    /// Number of consumed messages
    pub fn len(&self) -> usize {
        self.buffer.lock().len()
    }

    /// Whether nothing has been consumed yet
    pub fn is_empty(&self) -> bool {
        self.buffer.lock().is_empty()
    }

    /// Discard the collected messages
    pub fn clear(&self) {
        self.buffer.lock().clear();
    }
}

pub struct MemorySink {
    buffer: Buffer,
}

impl MemorySink {
    /// Create a sink and the handle observing it
    pub fn new() -> (Self, MemoryHandle) {
        let handle = MemoryHandle::default();
        (
            Self {
                buffer: Arc::clone(&handle.buffer),
            },
            handle,
        )
    }
}

impl Sink for MemorySink {
    fn consume(&mut self, message: Message) -> Result<SinkAck, FilterError> {
        self.buffer.lock().push(message);
        Ok(SinkAck::Done)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

/// Factory whose every sink shares one buffer
///
/// Keep the handle returned by [`MemorySinkFactory::new`] to observe
/// whatever the pipeline delivers.
pub struct MemorySinkFactory {
    handle: MemoryHandle,
}

impl MemorySinkFactory {
    pub fn new() -> (Self, MemoryHandle) {
        let handle = MemoryHandle::default();
        (
            Self {
                handle: handle.clone(),
            },
            handle,
        )
    }
}

impl SinkFactory for MemorySinkFactory {
    fn type_name(&self) -> &'static str {
        "memory"
    }

    fn create(&self, _config: &ComponentConfig) -> Result<Box<dyn Sink>, ConstructionError> {
        Ok(Box::new(MemorySink {
            buffer: Arc::clone(&self.handle.buffer),
        }))
    }
}
