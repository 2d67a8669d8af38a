//! The dispatch loop
//!
//! A single task owns every chain's filters and every sink, and is the
//! only code that ever calls `apply`/`consume`. It multiplexes two
//! inbound queues - source/injection events and worker results - and
//! walks each message through its chain synchronously. Because there is
//! exactly one consumer, chain state needs no locks and per-producer
//! FIFO order is preserved end to end.
//!
//! # Delivery walk
//!
//! A message enters at a stage index (0 for fresh events, the ticket's
//! resume stage for offload results). Stages `0..filters.len()` are
//! filter applications; the stage past the last filter is the sink.
//! Fan-out pushes its messages onto a FIFO work queue, so siblings
//! reach the sink in vector order.
//!
//! # Overload
//!
//! When the worker pool rejects an offload, the message goes back to the
//! component that asked for the work through its `overloaded` hook. The
//! component chooses: drop, forward a substitute downstream, or retry
//! the submission once.
//!
//! # Shutdown
//!
//! Cancellation stops event intake immediately; messages still queued
//! are discarded with the queue. Outstanding worker jobs are drained
//! until done or until the stop deadline, whichever comes first. Jobs
//! still outstanding at the deadline are abandoned and counted.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

use crossfire::AsyncRx;
use tokio::sync::mpsc;
use tokio::time::{Instant, timeout_at};
use tokio_util::sync::CancellationToken;

use ferry_protocol::{ChainId, Message};

use crate::chain::{NamedSink, RuntimeChain};
use crate::component::{OffloadCall, SinkAck, Verdict};
use crate::event::Event;
use crate::metrics::PipelineMetrics;
use crate::worker::{JobResult, OffloadJob, Resume, Ticket, WorkerPool};

/// What the loop left behind when it stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DrainReport {
    /// Worker jobs still outstanding when the stop deadline passed
    pub abandoned: usize,
}

pub(crate) struct DispatchLoop {
    chains: Vec<RuntimeChain>,
    sinks: Vec<NamedSink>,
    events: AsyncRx<Event>,
    results: mpsc::Receiver<JobResult>,
    pool: WorkerPool,
    outstanding: usize,
    metrics: Arc<PipelineMetrics>,
    cancel: CancellationToken,
    stop_timeout: Duration,
}

impl DispatchLoop {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        chains: Vec<RuntimeChain>,
        sinks: Vec<NamedSink>,
        events: AsyncRx<Event>,
        results: mpsc::Receiver<JobResult>,
        pool: WorkerPool,
        metrics: Arc<PipelineMetrics>,
        cancel: CancellationToken,
        stop_timeout: Duration,
    ) -> Self {
        Self {
            chains,
            sinks,
            events,
            results,
            pool,
            outstanding: 0,
            metrics,
            cancel,
            stop_timeout,
        }
    }

    /// Run until cancelled, then drain and close
    pub(crate) async fn run(mut self) -> DrainReport {
        for chain in &self.chains {
            tracing::debug!(
                chain = %chain.id,
                source = %chain.source_node,
                filters = chain.filters.len(),
                sink = %chain.sink,
                "chain ready"
            );
        }
        tracing::debug!(
            chains = self.chains.len(),
            sinks = self.sinks.len(),
            "dispatch loop running"
        );

        enum Step {
            Cancelled,
            Result(JobResult),
            Event(Option<Event>),
        }

        loop {
            let step = tokio::select! {
                // Results before events keeps outstanding bounded under
                // load; cancellation wins over both.
                biased;

                _ = self.cancel.cancelled() => Step::Cancelled,

                Some(result) = self.results.recv() => Step::Result(result),

                event = self.events.recv() => Step::Event(event.ok()),
            };

            match step {
                Step::Cancelled => break,
                Step::Result(result) => self.on_result(result),
                Step::Event(Some(event)) => self.on_event(event),
                // Every emitter is gone; nothing more can arrive.
                Step::Event(None) => break,
            }
        }

        let report = self.drain().await;
        self.close_sinks();

        let s = self.metrics.snapshot();
        tracing::info!(
            produced = s.produced,
            delivered = s.delivered,
            dropped = s.dropped,
            filter_errors = s.filter_errors,
            jobs_submitted = s.jobs_submitted,
            jobs_failed = s.jobs_failed,
            overloads = s.overloads,
            abandoned = s.abandoned,
            "dispatch loop stopped"
        );
        report
    }

    fn on_event(&mut self, event: Event) {
        self.metrics.record_produced();
        self.deliver(event.chain, 0, event.message);
    }

    fn on_result(&mut self, result: JobResult) {
        self.outstanding = self.outstanding.saturating_sub(1);
        let Ticket { chain, resume } = result.ticket;
        match result.outcome {
            Ok(message) => {
                self.metrics.record_job_completed();
                match resume {
                    Resume::Stage(stage) => self.deliver(chain, stage, message),
                    Resume::Terminal => self.metrics.record_delivered(),
                }
            }
            Err(err) => {
                self.metrics.record_job_failed();
                tracing::warn!(chain = %chain, error = %err, "worker job failed");
            }
        }
    }

    /// Walk one message (and everything it fans out into) through the
    /// chain, starting at `start`
    fn deliver(&mut self, chain: ChainId, start: usize, message: Message) {
        let idx = chain.as_usize();
        if idx >= self.chains.len() {
            // Tickets and events only carry ids this loop assigned.
            tracing::error!(chain = %chain, "message for unknown chain discarded");
            return;
        }

        let mut work: VecDeque<(usize, Message)> = VecDeque::new();
        work.push_back((start, message));

        while let Some((stage, message)) = work.pop_front() {
            let filter_count = self.chains[idx].filters.len();

            if stage >= filter_count {
                self.consume(chain, message);
                continue;
            }

            let verdict = self.chains[idx].filters[stage].filter.apply(message);
            match verdict {
                Ok(Verdict::Forward(message)) => work.push_back((stage + 1, message)),
                Ok(Verdict::Drop) => self.metrics.record_dropped(),
                Ok(Verdict::FanOut(messages)) => {
                    if messages.is_empty() {
                        self.metrics.record_dropped();
                    }
                    for message in messages {
                        work.push_back((stage + 1, message));
                    }
                }
                Ok(Verdict::Offload(call)) => self.submit(chain, Resume::Stage(stage + 1), call),
                Err(err) => {
                    self.metrics.record_filter_error();
                    tracing::warn!(
                        chain = %chain,
                        node = %self.chains[idx].filters[stage].node,
                        error = %err,
                        "filter failed, message terminated"
                    );
                }
            }
        }
    }

    fn consume(&mut self, chain: ChainId, message: Message) {
        let sink_id = self.chains[chain.as_usize()].sink;
        let named = &mut self.sinks[sink_id.as_usize()];
        match named.sink.consume(message) {
            Ok(SinkAck::Done) => self.metrics.record_delivered(),
            Ok(SinkAck::Offload(call)) => self.submit(chain, Resume::Terminal, call),
            Err(err) => {
                self.metrics.record_filter_error();
                tracing::warn!(
                    chain = %chain,
                    node = %self.sinks[sink_id.as_usize()].node,
                    error = %err,
                    "sink failed, message terminated"
                );
            }
        }
    }

    fn submit(&mut self, chain: ChainId, resume: Resume, call: OffloadCall) {
        let job = OffloadJob {
            ticket: Ticket { chain, resume },
            call,
        };
        match self.pool.submit(job) {
            Ok(()) => {
                self.outstanding += 1;
                self.metrics.record_job_submitted();
            }
            Err(err) => {
                self.metrics.record_overload();
                let job = err.into_job();
                self.on_overload(chain, resume, job.call.message);
            }
        }
    }

    /// Hand a rejected offload back to the component that requested it
    ///
    /// The component's `overloaded` hook decides the message's fate.
    /// Another `Offload` retries the submission once via [`resubmit`];
    /// anything it forwards re-enters the chain at the stage the job
    /// would have resumed at.
    ///
    /// [`resubmit`]: DispatchLoop::resubmit
    fn on_overload(&mut self, chain: ChainId, resume: Resume, message: Message) {
        let idx = chain.as_usize();
        match resume {
            Resume::Stage(next) => {
                // Resume::Stage(next) was built from Offload at stage
                // next - 1, so the rejected filter is next - 1.
                let stage = next - 1;
                let verdict = self.chains[idx].filters[stage].filter.overloaded(message);
                match verdict {
                    Ok(Verdict::Drop) => self.metrics.record_dropped(),
                    Ok(Verdict::Forward(message)) => self.deliver(chain, next, message),
                    Ok(Verdict::FanOut(messages)) => {
                        if messages.is_empty() {
                            self.metrics.record_dropped();
                        }
                        for message in messages {
                            self.deliver(chain, next, message);
                        }
                    }
                    Ok(Verdict::Offload(call)) => self.resubmit(chain, resume, call),
                    Err(err) => {
                        self.metrics.record_filter_error();
                        tracing::warn!(
                            chain = %chain,
                            node = %self.chains[idx].filters[stage].node,
                            error = %err,
                            "overload handler failed, message terminated"
                        );
                    }
                }
            }
            Resume::Terminal => {
                let sink_id = self.chains[idx].sink;
                let ack = self.sinks[sink_id.as_usize()].sink.overloaded(message);
                match ack {
                    Ok(None) => self.metrics.record_dropped(),
                    Ok(Some(SinkAck::Done)) => self.metrics.record_delivered(),
                    Ok(Some(SinkAck::Offload(call))) => self.resubmit(chain, resume, call),
                    Err(err) => {
                        self.metrics.record_filter_error();
                        tracing::warn!(
                            chain = %chain,
                            node = %self.sinks[sink_id.as_usize()].node,
                            error = %err,
                            "overload handler failed, message terminated"
                        );
                    }
                }
            }
        }
    }

    /// Second submission attempt after an overload notification
    ///
    /// The message is dropped if the queue is still full; there is no
    /// third attempt.
    fn resubmit(&mut self, chain: ChainId, resume: Resume, call: OffloadCall) {
        let job = OffloadJob {
            ticket: Ticket { chain, resume },
            call,
        };
        match self.pool.submit(job) {
            Ok(()) => {
                self.outstanding += 1;
                self.metrics.record_job_submitted();
            }
            Err(err) => {
                self.metrics.record_overload();
                self.metrics.record_dropped();
                let job = err.into_job();
                tracing::warn!(
                    chain = %chain,
                    message = ?job.call.message,
                    "worker queue still full, message dropped"
                );
            }
        }
    }

    /// Wait for outstanding jobs until done or the stop deadline
    async fn drain(&mut self) -> DrainReport {
        if self.outstanding == 0 {
            return DrainReport { abandoned: 0 };
        }

        tracing::debug!(outstanding = self.outstanding, "draining worker jobs");
        let deadline = Instant::now() + self.stop_timeout;
        while self.outstanding > 0 {
            match timeout_at(deadline, self.results.recv()).await {
                Ok(Some(result)) => self.on_result(result),
                Ok(None) | Err(_) => break,
            }
        }

        let abandoned = self.outstanding;
        if abandoned > 0 {
            self.metrics.record_abandoned(abandoned as u64);
            tracing::warn!(abandoned, "stop deadline passed with jobs outstanding");
        }
        DrainReport { abandoned }
    }

    fn close_sinks(&mut self) {
        for named in &mut self.sinks {
            if let Err(err) = named.sink.close() {
                tracing::warn!(node = %named.node, error = %err, "sink close failed");
            }
        }
    }
}
