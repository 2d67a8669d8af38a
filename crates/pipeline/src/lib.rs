//! Ferry pipeline runtime
//!
//! Executes compiled chain plans: a single-task dispatch loop that owns
//! all chain state, a worker pool for blocking work, and the adapters
//! that feed messages in from sources and from synchronous callers.
//!
//! # Design
//!
//! - **One consumer.** Every filter `apply` and sink `consume` runs on
//!   the dispatch task. Components take `&mut self` and never lock.
//! - **Queues at the seams.** Sources and injectors push onto one
//!   bounded event queue; worker results come back on their own
//!   channel. The loop multiplexes the two, results first.
//! - **Blocking work leaves the loop.** A filter or sink that must
//!   block returns an offload verdict; the job runs on a worker thread
//!   and its result re-enters the chain where it left off.
//! - **Errors stay small.** A failing message terminates that message;
//!   a failing job fails that job; only construction errors are fatal.
//!
//! # Example
//!
//! ```ignore
//! use ferry_pipeline::{ComponentRegistry, PipelineBuilder};
//! use ferry_topology::Topology;
//!
//! let topology = Topology::from_path("pipeline.toml")?;
//! let pipeline = PipelineBuilder::new().build(&topology, &registry)?;
//! let handle = pipeline.start();
//!
//! let injector = handle.injector("requests_in").unwrap();
//! injector.inject("hello".into())?;
//!
//! handle.stop().await?;
//! ```

mod builder;
mod chain;
mod component;
mod dispatch;
mod error;
mod event;
mod inject;
mod metrics;
mod registry;
mod worker;

pub use builder::{Pipeline, PipelineBuilder, PipelineHandle};
pub use component::{Filter, JobFn, OffloadCall, Sink, SinkAck, Source, Verdict};
pub use error::{
    ConstructionError, FilterError, InjectError, JobError, PipelineError, Result,
};
pub use event::{EmitError, Emitter};
pub use inject::InjectHandle;
pub use metrics::{MetricsSnapshot, PipelineMetricsHandle};
pub use registry::{
    ComponentRegistry, ConfigExt, FilterFactory, SinkFactory, SourceFactory,
};
