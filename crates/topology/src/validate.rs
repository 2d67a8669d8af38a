//! Structural validation of a topology
//!
//! Rules enforced here, each failing with an error that names the
//! offending node:
//!
//! - every `forward_to` target must exist
//! - sources and filters forward, sinks do not
//! - sources have no inbound edge; only sinks marked `shared` may have
//!   more than one
//! - walking forward targets from any source terminates (each node has
//!   at most one outbound edge, so a revisit within the node-count bound
//!   is a cycle)
//! - every filter and sink is reachable from a source
//!
//! Validation is pure: nothing is constructed, so a rejected topology
//! has no side effects to unwind.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::TopologyError;
use crate::spec::{NodeKind, Topology};

#[cfg(test)]
#[path = "validate_test.rs"]
mod tests;

pub(crate) fn validate(topology: &Topology) -> Result<(), TopologyError> {
    let nodes = &topology.nodes;

    if !nodes.values().any(|n| n.kind == NodeKind::Source) {
        return Err(TopologyError::NoSources);
    }

    // Per-node edge rules.
    for (name, spec) in nodes {
        match spec.kind {
            NodeKind::Source | NodeKind::Filter => {
                if spec.forward_to.is_none() {
                    return Err(TopologyError::MissingForward {
                        node: name.clone(),
                        kind: spec.kind,
                    });
                }
            }
            NodeKind::Sink => {
                if spec.forward_to.is_some() {
                    return Err(TopologyError::SinkForwards { node: name.clone() });
                }
            }
        }

        if spec.shared && spec.kind != NodeKind::Sink {
            return Err(TopologyError::SharedNotSink {
                node: name.clone(),
                kind: spec.kind,
            });
        }

        if let Some(target) = &spec.forward_to {
            if !nodes.contains_key(target) {
                return Err(TopologyError::unknown_target(name, target));
            }
        }
    }

    // Walk forward edges from each source. Every node has at most one
    // outbound edge, so the walk is linear and the on-path set bounds it
    // by the total node count. This runs before the inbound counts so a
    // loop reports as a cycle, not as fan-in on its re-entry node.
    let mut reached: BTreeSet<&str> = BTreeSet::new();
    for (name, spec) in nodes {
        if spec.kind != NodeKind::Source {
            continue;
        }

        let mut on_path: BTreeSet<&str> = BTreeSet::new();
        on_path.insert(name.as_str());

        let mut current = spec;
        while let Some(target) = &current.forward_to {
            if !on_path.insert(target.as_str()) {
                return Err(TopologyError::cycle(name, target));
            }
            reached.insert(target.as_str());
            // Target existence checked above.
            current = &nodes[target];
        }
    }

    // Inbound edge counts.
    let mut inbound: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (name, spec) in nodes {
        if let Some(target) = &spec.forward_to {
            inbound.entry(target.as_str()).or_default().push(name);
        }
    }

    for (name, spec) in nodes {
        let from = inbound.get(name.as_str()).map(Vec::as_slice).unwrap_or(&[]);
        match spec.kind {
            NodeKind::Source => {
                if !from.is_empty() {
                    return Err(TopologyError::SourceHasInbound {
                        node: name.clone(),
                        from: from.join(", "),
                    });
                }
            }
            NodeKind::Filter | NodeKind::Sink => {
                let fan_in_allowed = spec.kind == NodeKind::Sink && spec.shared;
                if from.len() > 1 && !fan_in_allowed {
                    return Err(TopologyError::FanInNotShared {
                        node: name.clone(),
                        from: from.join(", "),
                    });
                }
            }
        }
    }

    for (name, spec) in nodes {
        if spec.kind != NodeKind::Source && !reached.contains(name.as_str()) {
            return Err(TopologyError::unreachable(name));
        }
    }

    Ok(())
}
