//! Component factories and the registry
//!
//! The builder never constructs components directly: each node names a
//! component type, and the registry maps type names to factories. This
//! keeps the runtime crate free of any concrete component and lets
//! embedders register their own types next to the built-ins.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = ComponentRegistry::new();
//! registry.register_filter(Box::new(GrepFilterFactory));
//! let filter = registry.create_filter("grep", &config)?;
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use ferry_topology::ComponentConfig;

use crate::component::{Filter, Sink, Source};
use crate::error::ConstructionError;

#[cfg(test)]
#[path = "registry_test.rs"]
mod tests;

/// Factory for a named source type
pub trait SourceFactory: Send + Sync {
    /// Type name nodes use to select this factory
    fn type_name(&self) -> &'static str;

    /// Build a source instance from node configuration
    fn create(&self, config: &ComponentConfig) -> Result<Box<dyn Source>, ConstructionError>;
}

/// Factory for a named filter type
pub trait FilterFactory: Send + Sync {
    /// Type name nodes use to select this factory
    fn type_name(&self) -> &'static str;

    /// Build a filter instance from node configuration
    fn create(&self, config: &ComponentConfig) -> Result<Box<dyn Filter>, ConstructionError>;
}

/// Factory for a named sink type
pub trait SinkFactory: Send + Sync {
    /// Type name nodes use to select this factory
    fn type_name(&self) -> &'static str;

    /// Build a sink instance from node configuration
    ///
    /// Called once per sink node, not once per chain: a shared sink
    /// produces a single instance that every terminating chain writes
    /// to.
    fn create(&self, config: &ComponentConfig) -> Result<Box<dyn Sink>, ConstructionError>;
}

/// Registry of component factories keyed by type name
#[derive(Default)]
pub struct ComponentRegistry {
    sources: BTreeMap<&'static str, Box<dyn SourceFactory>>,
    filters: BTreeMap<&'static str, Box<dyn FilterFactory>>,
    sinks: BTreeMap<&'static str, Box<dyn SinkFactory>>,
}

impl ComponentRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a source factory
    ///
    /// # Panics
    ///
    /// Panics if a source factory with the same type name is already
    /// registered. Registration happens at startup; a duplicate is a
    /// programming error, not a runtime condition.
    pub fn register_source(&mut self, factory: Box<dyn SourceFactory>) {
        let name = factory.type_name();
        if self.sources.insert(name, factory).is_some() {
            panic!("duplicate source type '{name}'");
        }
    }

    /// Register a filter factory
    ///
    /// # Panics
    ///
    /// Panics if a filter factory with the same type name is already
    /// registered.
    pub fn register_filter(&mut self, factory: Box<dyn FilterFactory>) {
        let name = factory.type_name();
        if self.filters.insert(name, factory).is_some() {
            panic!("duplicate filter type '{name}'");
        }
    }

    /// Register a sink factory
    ///
    /// # Panics
    ///
    /// Panics if a sink factory with the same type name is already
    /// registered.
    pub fn register_sink(&mut self, factory: Box<dyn SinkFactory>) {
        let name = factory.type_name();
        if self.sinks.insert(name, factory).is_some() {
            panic!("duplicate sink type '{name}'");
        }
    }

    /// Build a source of the given type
    pub fn create_source(
        &self,
        type_name: &str,
        config: &ComponentConfig,
    ) -> Result<Box<dyn Source>, ConstructionError> {
        match self.sources.get(type_name) {
            Some(factory) => factory.create(config),
            None => Err(unknown("source", type_name, self.sources.keys())),
        }
    }

    /// Build a filter of the given type
    pub fn create_filter(
        &self,
        type_name: &str,
        config: &ComponentConfig,
    ) -> Result<Box<dyn Filter>, ConstructionError> {
        match self.filters.get(type_name) {
            Some(factory) => factory.create(config),
            None => Err(unknown("filter", type_name, self.filters.keys())),
        }
    }

    /// Build a sink of the given type
    pub fn create_sink(
        &self,
        type_name: &str,
        config: &ComponentConfig,
    ) -> Result<Box<dyn Sink>, ConstructionError> {
        match self.sinks.get(type_name) {
            Some(factory) => factory.create(config),
            None => Err(unknown("sink", type_name, self.sinks.keys())),
        }
    }

    /// Registered source type names, sorted
    pub fn source_types(&self) -> Vec<&'static str> {
        self.sources.keys().copied().collect()
    }

    /// Registered filter type names, sorted
    pub fn filter_types(&self) -> Vec<&'static str> {
        self.filters.keys().copied().collect()
    }

    /// Registered sink type names, sorted
    pub fn sink_types(&self) -> Vec<&'static str> {
        self.sinks.keys().copied().collect()
    }
}

impl std::fmt::Debug for ComponentRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ComponentRegistry")
            .field("sources", &self.source_types())
            .field("filters", &self.filter_types())
            .field("sinks", &self.sink_types())
            .finish()
    }
}

fn unknown<'a>(
    kind: &'static str,
    type_name: &str,
    available: impl Iterator<Item = &'a &'static str>,
) -> ConstructionError {
    ConstructionError::UnknownType {
        kind,
        type_name: type_name.to_string(),
        available: available.copied().collect::<Vec<_>>().join(", "),
    }
}

/// Typed accessors over a node's raw config map
///
/// Factories read their settings through these instead of matching on
/// `toml::Value` by hand, so a wrong type always produces the same
/// error shape.
pub trait ConfigExt {
    /// Read an optional string field
    fn get_str(&self, field: &'static str) -> Result<Option<&str>, ConstructionError>;

    /// Read an optional integer field
    fn get_int(&self, field: &'static str) -> Result<Option<i64>, ConstructionError>;

    /// Read an optional boolean field
    fn get_bool(&self, field: &'static str) -> Result<Option<bool>, ConstructionError>;

    /// Read an optional non-negative integer field as a millisecond
    /// duration
    fn get_duration_ms(&self, field: &'static str) -> Result<Option<Duration>, ConstructionError>;

    /// Read a mandatory string field
    fn require_str(&self, field: &'static str) -> Result<&str, ConstructionError>;
}

impl ConfigExt for ComponentConfig {
    fn get_str(&self, field: &'static str) -> Result<Option<&str>, ConstructionError> {
        match self.get(field) {
            None => Ok(None),
            Some(value) => value
                .as_str()
                .map(Some)
                .ok_or_else(|| ConstructionError::invalid_config(field, "expected a string")),
        }
    }

    fn get_int(&self, field: &'static str) -> Result<Option<i64>, ConstructionError> {
        match self.get(field) {
            None => Ok(None),
            Some(value) => value
                .as_integer()
                .map(Some)
                .ok_or_else(|| ConstructionError::invalid_config(field, "expected an integer")),
        }
    }

    fn get_bool(&self, field: &'static str) -> Result<Option<bool>, ConstructionError> {
        match self.get(field) {
            None => Ok(None),
            Some(value) => value
                .as_bool()
                .map(Some)
                .ok_or_else(|| ConstructionError::invalid_config(field, "expected a boolean")),
        }
    }

    fn get_duration_ms(&self, field: &'static str) -> Result<Option<Duration>, ConstructionError> {
        match self.get_int(field)? {
            None => Ok(None),
            Some(ms) if ms >= 0 => Ok(Some(Duration::from_millis(ms as u64))),
            Some(_) => Err(ConstructionError::invalid_config(
                field,
                "expected a non-negative integer",
            )),
        }
    }

    fn require_str(&self, field: &'static str) -> Result<&str, ConstructionError> {
        self.get_str(field)?
            .ok_or(ConstructionError::MissingField { field })
    }
}
