//! Pass-through filter
//!
//! Forwards every message unchanged. Handy as a placeholder while
//! shaping a topology.

use ferry_pipeline::{ConstructionError, Filter, FilterError, FilterFactory, Verdict};
use ferry_protocol::Message;
use ferry_topology::ComponentConfig;

pub struct NoopFilter;

impl Filter for NoopFilter {
    fn apply(&mut self, message: Message) -> Result<Verdict, FilterError> {
        Ok(Verdict::Forward(message))
    }

    fn name(&self) -> &'static str {
        "noop"
    }
}

pub struct NoopFilterFactory;

impl FilterFactory for NoopFilterFactory {
    fn type_name(&self) -> &'static str {
        "noop"
    }

    fn create(&self, _config: &ComponentConfig) -> Result<Box<dyn Filter>, ConstructionError> {
        Ok(Box::new(NoopFilter))
    }
}
