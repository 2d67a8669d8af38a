//! Tests for topology validation

use crate::{NodeSpec, Topology, TopologyError};

fn linear() -> Topology {
    Topology::new()
        .node("s", NodeSpec::source("tick").forward_to("f"))
        .node("f", NodeSpec::filter("noop").forward_to("k"))
        .node("k", NodeSpec::sink("null"))
}

#[test]
fn test_valid_linear_chain() {
    assert!(linear().validate().is_ok());
}

#[test]
fn test_valid_source_direct_to_sink() {
    let topology = Topology::new()
        .node("s", NodeSpec::source("tick").forward_to("k"))
        .node("k", NodeSpec::sink("null"));
    assert!(topology.validate().is_ok());
}

#[test]
fn test_valid_fan_in_to_shared_sink() {
    let topology = Topology::new()
        .node("a", NodeSpec::source("tick").forward_to("k"))
        .node("b", NodeSpec::source("tick").forward_to("k"))
        .node("k", NodeSpec::sink("null").shared());
    assert!(topology.validate().is_ok());
}

#[test]
fn test_fan_in_without_shared_flag_rejected() {
    let topology = Topology::new()
        .node("a", NodeSpec::source("tick").forward_to("k"))
        .node("b", NodeSpec::source("tick").forward_to("k"))
        .node("k", NodeSpec::sink("null"));

    let err = topology.validate().unwrap_err();
    match err {
        TopologyError::FanInNotShared { node, from } => {
            assert_eq!(node, "k");
            assert!(from.contains("a"));
            assert!(from.contains("b"));
        }
        other => panic!("expected FanInNotShared, got {other}"),
    }
}

#[test]
fn test_fan_in_to_filter_always_rejected() {
    // Filters can never be shared, even with the flag absent and only
    // two producers.
    let topology = Topology::new()
        .node("a", NodeSpec::source("tick").forward_to("f"))
        .node("b", NodeSpec::source("tick").forward_to("f"))
        .node("f", NodeSpec::filter("noop").forward_to("k"))
        .node("k", NodeSpec::sink("null"));

    assert!(matches!(
        topology.validate(),
        Err(TopologyError::FanInNotShared { .. })
    ));
}

#[test]
fn test_shared_flag_on_filter_rejected() {
    let topology = Topology::new()
        .node("s", NodeSpec::source("tick").forward_to("f"))
        .node("f", NodeSpec::filter("noop").shared().forward_to("k"))
        .node("k", NodeSpec::sink("null"));

    assert!(matches!(
        topology.validate(),
        Err(TopologyError::SharedNotSink { .. })
    ));
}

#[test]
fn test_unknown_forward_target() {
    let topology = Topology::new()
        .node("s", NodeSpec::source("tick").forward_to("ghost"))
        .node("k", NodeSpec::sink("null"));

    match topology.validate().unwrap_err() {
        TopologyError::UnknownTarget { node, target } => {
            assert_eq!(node, "s");
            assert_eq!(target, "ghost");
        }
        other => panic!("expected UnknownTarget, got {other}"),
    }
}

#[test]
fn test_cycle_between_filters_rejected() {
    let topology = Topology::new()
        .node("s", NodeSpec::source("tick").forward_to("f1"))
        .node("f1", NodeSpec::filter("noop").forward_to("f2"))
        .node("f2", NodeSpec::filter("noop").forward_to("f1"))
        .node("k", NodeSpec::sink("null"));

    assert!(matches!(topology.validate(), Err(TopologyError::Cycle { .. })));
}

#[test]
fn test_detached_cycle_rejected_as_unreachable() {
    // A filter loop no source feeds never trips the walk, but the
    // reachability pass still refuses it.
    let topology = Topology::new()
        .node("s", NodeSpec::source("tick").forward_to("k"))
        .node("k", NodeSpec::sink("null"))
        .node("f1", NodeSpec::filter("noop").forward_to("f2"))
        .node("f2", NodeSpec::filter("noop").forward_to("f1"));

    let err = topology.validate().unwrap_err();
    assert!(
        matches!(err, TopologyError::Unreachable { .. } | TopologyError::FanInNotShared { .. }),
        "got {err}"
    );
}

#[test]
fn test_source_with_inbound_edge_rejected() {
    let topology = Topology::new()
        .node("a", NodeSpec::source("tick").forward_to("b"))
        .node("b", NodeSpec::source("tick").forward_to("k"))
        .node("k", NodeSpec::sink("null"));

    assert!(matches!(
        topology.validate(),
        Err(TopologyError::SourceHasInbound { .. })
    ));
}

#[test]
fn test_sink_with_forward_target_rejected() {
    let topology = Topology::new()
        .node("s", NodeSpec::source("tick").forward_to("k"))
        .node("k", NodeSpec::sink("null").forward_to("s"));

    assert!(matches!(
        topology.validate(),
        Err(TopologyError::SinkForwards { .. })
    ));
}

#[test]
fn test_filter_without_forward_rejected() {
    let topology = Topology::new()
        .node("s", NodeSpec::source("tick").forward_to("f"))
        .node("f", NodeSpec::filter("noop"))
        .node("k", NodeSpec::sink("null"));

    assert!(matches!(
        topology.validate(),
        Err(TopologyError::MissingForward { .. })
    ));
}

#[test]
fn test_unreachable_sink_rejected() {
    let topology = Topology::new()
        .node("s", NodeSpec::source("tick").forward_to("k"))
        .node("k", NodeSpec::sink("null"))
        .node("orphan", NodeSpec::sink("null"));

    match topology.validate().unwrap_err() {
        TopologyError::Unreachable { node } => assert_eq!(node, "orphan"),
        other => panic!("expected Unreachable, got {other}"),
    }
}

#[test]
fn test_empty_topology_rejected() {
    assert!(matches!(
        Topology::new().validate(),
        Err(TopologyError::NoSources)
    ));
}

#[test]
fn test_sinks_only_rejected() {
    let topology = Topology::new().node("k", NodeSpec::sink("null"));
    assert!(matches!(topology.validate(), Err(TopologyError::NoSources)));
}
