//! Built-in sinks

mod memory;
mod null;
mod stdout;

pub use memory::{MemoryHandle, MemorySink, MemorySinkFactory};
pub use null::{NullSink, NullSinkFactory};
pub use stdout::{StdoutSink, StdoutSinkFactory};
