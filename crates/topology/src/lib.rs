//! Ferry - Topology
//!
//! Declarative chain description, validation and compilation.
//!
//! # Overview
//!
//! A [`Topology`] is a mapping of node names to [`NodeSpec`] descriptors
//! (kind, component type, config, forward target). It is produced by an
//! external collaborator - a config file, a DSL frontend, or test code -
//! and consumed here in two phases:
//!
//! 1. [`Topology::validate`] checks every structural rule (dangling
//!    forward targets, cycles, fan-in into non-shared nodes, kind/arity
//!    consistency) and fails with a [`TopologyError`] naming the
//!    offending node. No component is instantiated on failure.
//! 2. [`Topology::compile`] turns a valid topology into a
//!    [`PipelinePlan`]: sink plans in first-use order with dense
//!    [`SinkId`]s (shared sinks deduplicated) and one [`ChainPlan`] per
//!    source in deterministic name order.
//!
//! Construction of live components from the plan happens in
//! `ferry-pipeline`; this crate is pure data and performs no I/O beyond
//! the optional [`Topology::from_path`] helper.
//!
//! # Example
//!
//! ```
//! use ferry_topology::{NodeSpec, Topology};
//!
//! let topology = Topology::new()
//!     .node("ticker", NodeSpec::source("tick").forward_to("keep_errors"))
//!     .node("keep_errors", NodeSpec::filter("grep")
//!         .with("pattern", "ERROR")
//!         .forward_to("out"))
//!     .node("out", NodeSpec::sink("null"));
//!
//! let plan = topology.compile().expect("valid topology");
//! assert_eq!(plan.chains.len(), 1);
//! assert_eq!(plan.sinks.len(), 1);
//! ```

mod error;
mod plan;
mod spec;
mod validate;

pub use error::TopologyError;
pub use plan::{ChainPlan, NodePlan, PipelinePlan};
pub use spec::{ComponentConfig, NodeKind, NodeSpec, Topology};

pub use ferry_protocol::{ChainId, SinkId};

/// Result type for topology operations
pub type Result<T> = std::result::Result<T, TopologyError>;
