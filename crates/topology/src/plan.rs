//! Compilation of a validated topology into an executable plan
//!
//! The plan is the topology flattened into what the runtime actually
//! needs: sink descriptors in first-use order with dense [`SinkId`]s
//! (one per sink node, however many chains terminate there), and one
//! [`ChainPlan`] per source in deterministic name order. All id
//! assignment happens here - the dispatch loop only ever does `Vec`
//! indexing.

use std::collections::BTreeMap;

use ferry_protocol::{ChainId, SinkId};

use crate::error::TopologyError;
use crate::spec::{ComponentConfig, NodeKind, Topology};

#[cfg(test)]
#[path = "plan_test.rs"]
mod tests;

/// A node flattened out of the topology mapping
#[derive(Debug, Clone)]
pub struct NodePlan {
    /// Node name from the topology
    pub name: String,

    /// Component type name for factory lookup
    pub type_name: String,

    /// Opaque factory configuration
    pub config: ComponentConfig,
}

/// One assembled path: source, ordered filters, terminal sink
#[derive(Debug, Clone)]
pub struct ChainPlan {
    /// Chain id, assigned in source-name order
    pub id: ChainId,

    /// The producing node
    pub source: NodePlan,

    /// Filter nodes in delivery order
    pub filters: Vec<NodePlan>,

    /// Terminal sink (index into [`PipelinePlan::sinks`])
    pub sink: SinkId,
}

/// The full compiled pipeline
#[derive(Debug, Clone)]
pub struct PipelinePlan {
    /// Deduplicated sink plans, indexed by [`SinkId`]
    pub sinks: Vec<NodePlan>,

    /// Chain plans, indexed by [`ChainId`]
    pub chains: Vec<ChainPlan>,
}

impl PipelinePlan {
    /// Find the chain produced by the given source node
    pub fn chain_for_source(&self, source_node: &str) -> Option<&ChainPlan> {
        self.chains.iter().find(|c| c.source.name == source_node)
    }

    /// Number of chains
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Number of distinct sink instances
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }
}

fn node_plan(name: &str, topology: &Topology) -> NodePlan {
    let spec = &topology.nodes[name];
    NodePlan {
        name: name.to_string(),
        type_name: spec.type_name.clone(),
        config: spec.config.clone(),
    }
}

pub(crate) fn compile(topology: &Topology) -> Result<PipelinePlan, TopologyError> {
    topology.validate()?;

    let mut sinks: Vec<NodePlan> = Vec::new();
    let mut sink_ids: BTreeMap<&str, SinkId> = BTreeMap::new();
    let mut chains: Vec<ChainPlan> = Vec::new();

    for (name, spec) in &topology.nodes {
        if spec.kind != NodeKind::Source {
            continue;
        }

        let mut filters = Vec::new();
        let mut current = spec;
        let sink_name = loop {
            // Validation guarantees the walk is acyclic and every
            // non-sink node forwards.
            let target = current.forward_to.as_deref().expect("validated");
            let target_spec = &topology.nodes[target];
            match target_spec.kind {
                NodeKind::Filter => filters.push(node_plan(target, topology)),
                NodeKind::Sink => break target,
                NodeKind::Source => unreachable!("sources have no inbound edges"),
            }
            current = target_spec;
        };

        let sink = *sink_ids.entry(sink_name).or_insert_with(|| {
            let id = SinkId::new(sinks.len() as u16);
            sinks.push(node_plan(sink_name, topology));
            id
        });

        chains.push(ChainPlan {
            id: ChainId::new(chains.len() as u32),
            source: node_plan(name, topology),
            filters,
            sink,
        });
    }

    tracing::debug!(
        chains = chains.len(),
        sinks = sinks.len(),
        "compiled topology"
    );

    Ok(PipelinePlan { sinks, chains })
}
