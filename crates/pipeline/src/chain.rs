//! Runtime chain state owned by the dispatch loop

use ferry_protocol::{ChainId, SinkId};

use crate::component::{Filter, Sink};

/// A constructed filter together with its topology node name
///
/// The node name is what operators recognize in logs; `Filter::name`
/// only identifies the component type.
pub(crate) struct NamedFilter {
    pub node: String,
    pub filter: Box<dyn Filter>,
}

/// A constructed sink together with its topology node name
pub(crate) struct NamedSink {
    pub node: String,
    pub sink: Box<dyn Sink>,
}

/// One runnable chain: the filters between a source and its sink
///
/// The source itself runs as its own task and is not stored here; the
/// loop only needs what it calls synchronously.
pub(crate) struct RuntimeChain {
    pub id: ChainId,
    pub source_node: String,
    pub filters: Vec<NamedFilter>,
    pub sink: SinkId,
}
