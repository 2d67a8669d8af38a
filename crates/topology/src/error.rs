//! Topology error types
//!
//! Every validation failure names the offending node so a bad config can
//! be fixed without reading the runtime's source.

use thiserror::Error;

use crate::spec::NodeKind;

/// Errors raised while parsing, validating or compiling a topology
///
/// All variants are fatal: the pipeline does not start, and no component
/// is instantiated.
#[derive(Debug, Error)]
pub enum TopologyError {
    /// A forward target references a node that does not exist
    #[error("node '{node}' forwards to unknown node '{target}'")]
    UnknownTarget {
        /// Node holding the dangling reference
        node: String,
        /// The missing target name
        target: String,
    },

    /// A source or filter has no forward target
    #[error("{kind} node '{node}' must have a forward target")]
    MissingForward {
        /// The offending node
        node: String,
        /// Its declared kind
        kind: NodeKind,
    },

    /// A sink declares a forward target
    #[error("sink node '{node}' must not have a forward target")]
    SinkForwards {
        /// The offending node
        node: String,
    },

    /// A source is referenced as someone's forward target
    #[error("source node '{node}' must not have inbound edges (referenced by [{from}])")]
    SourceHasInbound {
        /// The offending node
        node: String,
        /// Comma-separated referencing nodes
        from: String,
    },

    /// More than one node forwards into a node that is not a shared sink
    #[error("node '{node}' is forwarded to by [{from}] but is not marked as a shared sink")]
    FanInNotShared {
        /// The offending node
        node: String,
        /// Comma-separated referencing nodes
        from: String,
    },

    /// `shared` set on a node that is not a sink
    #[error("'shared' is only valid on sink nodes, found on {kind} node '{node}'")]
    SharedNotSink {
        /// The offending node
        node: String,
        /// Its declared kind
        kind: NodeKind,
    },

    /// Following forward targets from a source revisits a node
    #[error("cycle detected: walking forward targets from source '{start}' revisits '{node}'")]
    Cycle {
        /// Source the walk started from
        start: String,
        /// First node seen twice
        node: String,
    },

    /// A filter or sink no source path reaches
    #[error("node '{node}' is not reachable from any source")]
    Unreachable {
        /// The offending node
        node: String,
    },

    /// Topology contains no source nodes
    #[error("topology has no source nodes")]
    NoSources,

    /// Failed to read a topology file
    #[error("failed to read topology file '{path}': {source}")]
    Io {
        /// Path to the file
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("failed to parse topology: {0}")]
    Parse(#[from] toml::de::Error),
}

impl TopologyError {
    /// Create an UnknownTarget error
    pub fn unknown_target(node: impl Into<String>, target: impl Into<String>) -> Self {
        Self::UnknownTarget {
            node: node.into(),
            target: target.into(),
        }
    }

    /// Create an Unreachable error
    pub fn unreachable(node: impl Into<String>) -> Self {
        Self::Unreachable { node: node.into() }
    }

    /// Create a Cycle error
    pub fn cycle(start: impl Into<String>, node: impl Into<String>) -> Self {
        Self::Cycle {
            start: start.into(),
            node: node.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_target_display() {
        let err = TopologyError::unknown_target("filter_a", "missing");
        assert!(err.to_string().contains("filter_a"));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_cycle_display() {
        let err = TopologyError::cycle("src", "filter_b");
        assert!(err.to_string().contains("src"));
        assert!(err.to_string().contains("filter_b"));
    }

    #[test]
    fn test_missing_forward_names_kind() {
        let err = TopologyError::MissingForward {
            node: "f".into(),
            kind: NodeKind::Filter,
        };
        assert!(err.to_string().contains("filter"));
        assert!(err.to_string().contains("'f'"));
    }

    #[test]
    fn test_no_sources_display() {
        assert!(TopologyError::NoSources.to_string().contains("no source"));
    }
}
