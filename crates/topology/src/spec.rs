//! Node descriptors and the topology mapping
//!
//! The descriptor model mirrors what the config collaborator hands us: a
//! named mapping where each entry declares a kind, a component type name
//! for factory lookup, an opaque config map and an optional forward
//! target. Descriptors are immutable once the topology is assembled.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::error::TopologyError;
use crate::plan::PipelinePlan;

/// Configuration map passed to component factories
///
/// A generic key-value map that factories interpret according to their
/// specific needs.
pub type ComponentConfig = BTreeMap<String, toml::Value>;

/// The three component kinds a node can declare
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// Produces messages, forwards each to one consumer
    Source,
    /// Consumes and produces: transform, drop or fan out
    Filter,
    /// Terminal consumer, no further output
    Sink,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Source => write!(f, "source"),
            NodeKind::Filter => write!(f, "filter"),
            NodeKind::Sink => write!(f, "sink"),
        }
    }
}

/// Descriptor for a single component node
///
/// # TOML shape
///
/// ```toml
/// [nodes.keep_errors]
/// kind = "filter"
/// type = "grep"
/// forward_to = "out"
///
/// [nodes.keep_errors.config]
/// pattern = "ERROR"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NodeSpec {
    /// Component kind (source, filter, sink)
    pub kind: NodeKind,

    /// Component type name, resolved against the registry at build time
    #[serde(rename = "type")]
    pub type_name: String,

    /// Name of the downstream node (required for sources and filters)
    #[serde(default)]
    pub forward_to: Option<String>,

    /// Marks a sink as a fan-in target shared by multiple chains
    #[serde(default)]
    pub shared: bool,

    /// Opaque configuration handed to the component factory
    #[serde(default)]
    pub config: ComponentConfig,
}

impl NodeSpec {
    fn new(kind: NodeKind, type_name: impl Into<String>) -> Self {
        Self {
            kind,
            type_name: type_name.into(),
            forward_to: None,
            shared: false,
            config: ComponentConfig::new(),
        }
    }

    /// Describe a source node of the given component type
    pub fn source(type_name: impl Into<String>) -> Self {
        Self::new(NodeKind::Source, type_name)
    }

    /// Describe a filter node of the given component type
    pub fn filter(type_name: impl Into<String>) -> Self {
        Self::new(NodeKind::Filter, type_name)
    }

    /// Describe a sink node of the given component type
    pub fn sink(type_name: impl Into<String>) -> Self {
        Self::new(NodeKind::Sink, type_name)
    }

    /// Set the forward target
    pub fn forward_to(mut self, target: impl Into<String>) -> Self {
        self.forward_to = Some(target.into());
        self
    }

    /// Mark this sink as shared (fan-in target for multiple chains)
    pub fn shared(mut self) -> Self {
        self.shared = true;
        self
    }

    /// Add a config entry
    pub fn with(mut self, key: impl Into<String>, value: impl Into<toml::Value>) -> Self {
        self.config.insert(key.into(), value.into());
        self
    }
}

/// A named mapping of component descriptors
///
/// Node order is deterministic (sorted by name), which makes chain and
/// sink id assignment reproducible across runs of the same description.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Topology {
    /// Node name → descriptor
    #[serde(default)]
    pub nodes: BTreeMap<String, NodeSpec>,
}

impl Topology {
    /// Create an empty topology
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node (builder style, replaces an existing entry)
    pub fn node(mut self, name: impl Into<String>, spec: NodeSpec) -> Self {
        self.nodes.insert(name.into(), spec);
        self
    }

    /// Parse a topology from a TOML string
    pub fn from_toml(input: &str) -> Result<Self, TopologyError> {
        Ok(toml::from_str(input)?)
    }

    /// Load and parse a topology from a TOML file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, TopologyError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| TopologyError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&input)
    }

    /// Get a node descriptor by name
    pub fn get(&self, name: &str) -> Option<&NodeSpec> {
        self.nodes.get(name)
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the topology has no nodes
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Validate the topology against all structural rules
    ///
    /// See [`crate::TopologyError`] for the rule catalogue. Validation is
    /// pure and instantiates nothing.
    pub fn validate(&self) -> Result<(), TopologyError> {
        crate::validate::validate(self)
    }

    /// Validate and compile into an executable plan
    pub fn compile(&self) -> Result<PipelinePlan, TopologyError> {
        crate::plan::compile(self)
    }
}
