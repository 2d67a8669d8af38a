//! Built-in ferry components
//!
//! The stock sources, filters and sinks, plus [`default_registry`] to
//! get them all registered at once. Embedders extend the returned
//! registry with their own factories before building a pipeline.
//!
//! | kind   | type     | what it does                              |
//! |--------|----------|-------------------------------------------|
//! | source | `tick`   | emits a numbered message on an interval   |
//! | source | `inject` | emits nothing; fed via injection handles  |
//! | filter | `noop`   | forwards unchanged                        |
//! | filter | `grep`   | keeps (or drops) regex matches            |
//! | filter | `split`  | fans a payload out into segments          |
//! | filter | `digest` | SHA-256 digest, hashed on the worker pool |
//! | sink   | `null`   | counts and discards                       |
//! | sink   | `stdout` | prints one line per message               |
//!
//! The `memory` sink is not part of the default set: its factory hands
//! out an observer handle, so callers construct a
//! [`sinks::MemorySinkFactory`] themselves and register it alongside.

pub mod filters;
pub mod sinks;
pub mod sources;

use ferry_pipeline::ComponentRegistry;

/// Registry with every built-in component type registered
pub fn default_registry() -> ComponentRegistry {
    let mut registry = ComponentRegistry::new();

    registry.register_source(Box::new(sources::TickSourceFactory));
    registry.register_source(Box::new(sources::InjectSourceFactory));

    registry.register_filter(Box::new(filters::NoopFilterFactory));
    registry.register_filter(Box::new(filters::GrepFilterFactory));
    registry.register_filter(Box::new(filters::SplitFilterFactory));
    registry.register_filter(Box::new(filters::DigestFilterFactory));

    registry.register_sink(Box::new(sinks::NullSinkFactory));
    registry.register_sink(Box::new(sinks::StdoutSinkFactory));

    registry
}
