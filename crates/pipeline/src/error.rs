//! Pipeline error types
//!
//! The runtime taxonomy: construction-time errors are fatal and stop the
//! pipeline from starting; per-message errors are caught by the dispatch
//! loop, logged and counted, and never unwind it.

use thiserror::Error;

use ferry_protocol::Message;
use ferry_topology::TopologyError;

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Top-level pipeline errors
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Topology validation or compilation failed
    #[error(transparent)]
    Topology(#[from] TopologyError),

    /// A component factory rejected its configuration
    #[error("failed to construct node '{node}': {source}")]
    Construction {
        /// The topology node being built
        node: String,
        /// Factory error
        #[source]
        source: ConstructionError,
    },

    /// Graceful stop did not drain before the deadline
    #[error("graceful stop timed out with {abandoned} outstanding worker job(s)")]
    StopTimeout {
        /// Jobs still running or queued when the deadline passed
        abandoned: usize,
    },

    /// The dispatch loop task ended abnormally
    #[error("dispatch loop terminated unexpectedly")]
    LoopTerminated,
}

/// Errors raised by component factories
///
/// Fatal to the build: a pipeline with one bad node never starts.
#[derive(Debug, Error)]
pub enum ConstructionError {
    /// Component type not present in the registry
    #[error("unknown {kind} type '{type_name}', available: [{available}]")]
    UnknownType {
        /// Component kind ("source", "filter", "sink")
        kind: &'static str,
        /// The requested type name
        type_name: String,
        /// Comma-separated registered type names
        available: String,
    },

    /// A required config field is absent
    #[error("missing required field '{field}'")]
    MissingField {
        /// Field name
        field: &'static str,
    },

    /// A config field has an unusable value
    #[error("invalid value for '{field}': {message}")]
    InvalidConfig {
        /// Field name
        field: &'static str,
        /// What was wrong with it
        message: String,
    },

    /// Anything else the factory could not do
    #[error("{0}")]
    Failed(String),
}

impl ConstructionError {
    /// Create a MissingField error
    pub fn missing_field(field: &'static str) -> Self {
        Self::MissingField { field }
    }

    /// Create an InvalidConfig error
    pub fn invalid_config(field: &'static str, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            message: message.into(),
        }
    }

    /// Create a Failed error
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors raised by filter and sink logic during `consume`
///
/// Caught per message by the dispatch loop: the message's path
/// terminates, sibling chains are unaffected.
#[derive(Debug, Error)]
pub enum FilterError {
    /// Component logic rejected the message
    #[error("{0}")]
    Failed(String),

    /// Wrapped error from component internals
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FilterError {
    /// Create a Failed error
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors raised inside a worker job
///
/// Delivered back to the dispatch loop as a failed-result event. A
/// panicking job is captured; the worker itself keeps running.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    /// The job function returned an error
    #[error("job failed: {0}")]
    Failed(String),

    /// The job function panicked
    #[error("job panicked: {0}")]
    Panicked(String),
}

impl JobError {
    /// Create a Failed error
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Create a Panicked error
    pub fn panicked(message: impl Into<String>) -> Self {
        Self::Panicked(message.into())
    }
}

/// Error returned by a non-blocking injection attempt
///
/// Carries the message back so the caller can retry or drop it.
#[derive(Debug, Error)]
pub enum InjectError {
    /// The dispatch event queue is at capacity
    #[error("injection queue full")]
    Full(Message),

    /// The pipeline has shut down
    #[error("pipeline is shut down")]
    Closed(Message),
}

impl InjectError {
    /// Recover the message that could not be injected
    pub fn into_message(self) -> Message {
        match self {
            Self::Full(message) | Self::Closed(message) => message,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stop_timeout_display() {
        let err = PipelineError::StopTimeout { abandoned: 3 };
        assert!(err.to_string().contains("3 outstanding"));
    }

    #[test]
    fn test_construction_unknown_type_display() {
        let err = ConstructionError::UnknownType {
            kind: "filter",
            type_name: "gerp".into(),
            available: "grep, noop".into(),
        };
        let text = err.to_string();
        assert!(text.contains("gerp"));
        assert!(text.contains("grep, noop"));
    }

    #[test]
    fn test_construction_wrapped_in_pipeline_error() {
        let err = PipelineError::Construction {
            node: "keep_errors".into(),
            source: ConstructionError::missing_field("pattern"),
        };
        let text = err.to_string();
        assert!(text.contains("keep_errors"));
        assert!(text.contains("pattern"));
    }

    #[test]
    fn test_job_error_display() {
        assert!(JobError::failed("boom").to_string().contains("boom"));
        assert!(JobError::panicked("at 'x'").to_string().contains("panicked"));
    }

    #[test]
    fn test_inject_error_returns_message() {
        let err = InjectError::Full(Message::from_text("try again"));
        assert_eq!(err.into_message().text(), Some("try again"));
    }
}
