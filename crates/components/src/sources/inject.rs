//! Injection-only source
//!
//! Produces nothing on its own; it exists so a chain can be fed
//! exclusively through `PipelineHandle::injector`. The task parks until
//! cancellation.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

use ferry_pipeline::{ConstructionError, Emitter, Source, SourceFactory};
use ferry_topology::ComponentConfig;

pub struct InjectSource;

impl Source for InjectSource {
    fn run<'a>(
        &'a mut self,
        _emitter: Emitter,
        cancel: CancellationToken,
    ) -> Pin<Box<dyn Future<Output = ()> + Send + 'a>> {
        Box::pin(async move { cancel.cancelled().await })
    }

    fn name(&self) -> &'static str {
        "inject"
    }
}

pub struct InjectSourceFactory;

impl SourceFactory for InjectSourceFactory {
    fn type_name(&self) -> &'static str {
        "inject"
    }

    fn create(&self, _config: &ComponentConfig) -> Result<Box<dyn Source>, ConstructionError> {
        Ok(Box::new(InjectSource))
    }
}
