//! Built-in sources

mod inject;
mod tick;

pub use inject::{InjectSource, InjectSourceFactory};
pub use tick::{TickSource, TickSourceFactory};
