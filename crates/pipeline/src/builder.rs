//! Pipeline assembly and lifecycle
//!
//! [`PipelineBuilder`] turns a compiled topology plan into live
//! component instances; [`Pipeline::start`] wires them to the dispatch
//! loop and spawns the tasks. Construction is all-or-nothing: one
//! misconfigured node and nothing starts.
//!
//! # Example
//!
//! ```ignore
//! let topology = Topology::from_path("pipeline.toml")?;
//! let pipeline = PipelineBuilder::new()
//!     .workers(8)
//!     .build(&topology, &registry)?;
//! let handle = pipeline.start();
//! // ...
//! handle.stop().await?;
//! ```

use std::collections::BTreeMap;
use std::time::Duration;

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crossfire::MAsyncTx;

use ferry_protocol::ChainId;
use ferry_topology::Topology;

use crate::chain::{NamedFilter, NamedSink, RuntimeChain};
use crate::component::Source;
use crate::dispatch::{DispatchLoop, DrainReport};
use crate::error::{PipelineError, Result};
use crate::event::{Emitter, Event};
use crate::inject::InjectHandle;
use crate::metrics::{PipelineMetrics, PipelineMetricsHandle};
use crate::registry::ComponentRegistry;
use crate::worker::{JobResult, WorkerPool};

#[cfg(test)]
#[path = "builder_test.rs"]
mod tests;

const DEFAULT_EVENT_CAPACITY: usize = 1024;
const DEFAULT_WORKERS: usize = 4;
const DEFAULT_JOB_QUEUE_CAPACITY: usize = 256;
const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

/// Configures and constructs a [`Pipeline`]
#[derive(Debug, Clone)]
pub struct PipelineBuilder {
    event_capacity: usize,
    workers: usize,
    job_queue_capacity: usize,
    stop_timeout: Duration,
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self {
            event_capacity: DEFAULT_EVENT_CAPACITY,
            workers: DEFAULT_WORKERS,
            job_queue_capacity: DEFAULT_JOB_QUEUE_CAPACITY,
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }
}

impl PipelineBuilder {
    /// Create a builder with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Capacity of the dispatch event queue (sources and injectors)
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity.max(1);
        self
    }

    /// Number of worker threads for offloaded jobs
    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    /// Bound of the worker job queue; submissions past it are rejected
    pub fn job_queue_capacity(mut self, capacity: usize) -> Self {
        self.job_queue_capacity = capacity.max(1);
        self
    }

    /// How long `stop` waits for outstanding worker jobs
    pub fn stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Compile the topology and construct every component
    ///
    /// Sinks are built first (one instance per sink node, shared or
    /// not), then each chain's filters and source in delivery order.
    pub fn build(self, topology: &Topology, registry: &ComponentRegistry) -> Result<Pipeline> {
        let plan = topology.compile()?;

        let mut sinks = Vec::with_capacity(plan.sinks.len());
        for node in &plan.sinks {
            let sink = registry
                .create_sink(&node.type_name, &node.config)
                .map_err(|source| PipelineError::Construction {
                    node: node.name.clone(),
                    source,
                })?;
            sinks.push(NamedSink {
                node: node.name.clone(),
                sink,
            });
        }

        let mut chains = Vec::with_capacity(plan.chains.len());
        let mut sources = Vec::with_capacity(plan.chains.len());
        for chain_plan in &plan.chains {
            let mut filters = Vec::with_capacity(chain_plan.filters.len());
            for node in &chain_plan.filters {
                let filter = registry
                    .create_filter(&node.type_name, &node.config)
                    .map_err(|source| PipelineError::Construction {
                        node: node.name.clone(),
                        source,
                    })?;
                filters.push(NamedFilter {
                    node: node.name.clone(),
                    filter,
                });
            }

            let source = registry
                .create_source(&chain_plan.source.type_name, &chain_plan.source.config)
                .map_err(|source| PipelineError::Construction {
                    node: chain_plan.source.name.clone(),
                    source,
                })?;
            sources.push((chain_plan.id, chain_plan.source.name.clone(), source));

            chains.push(RuntimeChain {
                id: chain_plan.id,
                source_node: chain_plan.source.name.clone(),
                filters,
                sink: chain_plan.sink,
            });
        }

        tracing::info!(
            chains = chains.len(),
            sinks = sinks.len(),
            workers = self.workers,
            "pipeline built"
        );

        Ok(Pipeline {
            chains,
            sinks,
            sources,
            event_capacity: self.event_capacity,
            workers: self.workers,
            job_queue_capacity: self.job_queue_capacity,
            stop_timeout: self.stop_timeout,
        })
    }
}

/// A fully constructed, not yet running pipeline
pub struct Pipeline {
    chains: Vec<RuntimeChain>,
    sinks: Vec<NamedSink>,
    sources: Vec<(ChainId, String, Box<dyn Source>)>,
    event_capacity: usize,
    workers: usize,
    job_queue_capacity: usize,
    stop_timeout: Duration,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("chains", &self.chains.len())
            .field("sinks", &self.sinks.len())
            .field("sources", &self.sources.len())
            .field("event_capacity", &self.event_capacity)
            .field("workers", &self.workers)
            .field("job_queue_capacity", &self.job_queue_capacity)
            .field("stop_timeout", &self.stop_timeout)
            .finish()
    }
}

impl Pipeline {
    /// Number of chains
    pub fn chain_count(&self) -> usize {
        self.chains.len()
    }

    /// Number of distinct sink instances
    pub fn sink_count(&self) -> usize {
        self.sinks.len()
    }

    /// Spawn the dispatch loop and every source task
    ///
    /// Must be called from within a tokio runtime. The returned handle
    /// is the only way to stop the pipeline gracefully.
    pub fn start(self) -> PipelineHandle {
        let (event_tx, event_rx) = crossfire::mpsc::bounded_async::<Event>(self.event_capacity);
        let (result_tx, result_rx) =
            mpsc::channel::<JobResult>(self.job_queue_capacity + self.workers);

        let metrics = Arc::new(PipelineMetrics::new());
        let cancel = CancellationToken::new();
        let pool = WorkerPool::spawn(self.workers, self.job_queue_capacity, result_tx);

        let mut chains_by_source = BTreeMap::new();
        let mut source_tasks = Vec::with_capacity(self.sources.len());
        for (chain, node, mut source) in self.sources {
            chains_by_source.insert(node.clone(), chain);
            let emitter = Emitter::new(chain, event_tx.clone());
            let child = cancel.child_token();
            source_tasks.push(tokio::spawn(async move {
                tracing::debug!(node = %node, chain = %chain, "source started");
                source.run(emitter, child).await;
                tracing::debug!(node = %node, chain = %chain, "source finished");
            }));
        }

        let dispatch = DispatchLoop::new(
            self.chains,
            self.sinks,
            event_rx,
            result_rx,
            pool,
            Arc::clone(&metrics),
            cancel.clone(),
            self.stop_timeout,
        );
        let loop_task = tokio::spawn(dispatch.run());

        PipelineHandle {
            cancel,
            event_tx,
            chains_by_source,
            source_tasks,
            loop_task,
            metrics: PipelineMetricsHandle::new(metrics),
        }
    }
}

/// Control handle for a running pipeline
pub struct PipelineHandle {
    cancel: CancellationToken,
    event_tx: MAsyncTx<Event>,
    chains_by_source: BTreeMap<String, ChainId>,
    source_tasks: Vec<JoinHandle<()>>,
    loop_task: JoinHandle<DrainReport>,
    metrics: PipelineMetricsHandle,
}

impl PipelineHandle {
    /// Get an injection handle for the chain fed by the given source
    /// node
    ///
    /// Returns `None` if no source node with that name exists. The
    /// handle can be moved to any thread and outlives nothing: after
    /// `stop`, injections fail with `InjectError::Closed`.
    pub fn injector(&self, source_node: &str) -> Option<InjectHandle> {
        let chain = *self.chains_by_source.get(source_node)?;
        Some(InjectHandle::new(Emitter::new(chain, self.event_tx.clone())))
    }

    /// Metrics for the running pipeline
    pub fn metrics(&self) -> PipelineMetricsHandle {
        self.metrics.clone()
    }

    /// Stop gracefully: cancel sources, drain worker jobs, close sinks
    ///
    /// Messages queued but not yet dispatched are discarded. Returns
    /// [`PipelineError::StopTimeout`] when outstanding jobs had to be
    /// abandoned at the deadline, [`PipelineError::LoopTerminated`] if
    /// the dispatch task had already died.
    pub async fn stop(self) -> Result<()> {
        tracing::info!("stopping pipeline");
        self.cancel.cancel();

        for mut task in self.source_tasks {
            // A source that ignores cancellation is a bug in the
            // component; abort rather than hang shutdown on it.
            if tokio::time::timeout(Duration::from_secs(1), &mut task)
                .await
                .is_err()
            {
                tracing::warn!("source task did not stop in time, aborting");
                task.abort();
            }
        }

        // Dropping the last emitter after sources exit lets the loop
        // observe a closed event queue even if cancellation raced.
        drop(self.event_tx);

        match self.loop_task.await {
            Ok(DrainReport { abandoned: 0 }) => Ok(()),
            Ok(DrainReport { abandoned }) => Err(PipelineError::StopTimeout { abandoned }),
            Err(err) => {
                tracing::error!(error = %err, "dispatch loop task failed");
                Err(PipelineError::LoopTerminated)
            }
        }
    }
}
