//! Worker pool bridge
//!
//! Executes blocking work off the dispatch thread. Jobs are pulled FIFO
//! from one shared bounded queue by a fixed set of worker threads;
//! exactly one worker runs a given job. Results are never executed on
//! the worker's stack - they are pushed onto a channel the dispatch
//! loop drains on its next iteration, preserving the single-writer
//! invariant over chain state.
//!
//! # Backpressure
//!
//! `submit` is non-blocking. When the queue is at capacity it fails with
//! [`OverloadError`], returning the job to the caller.
//!
//! # Failure isolation
//!
//! A job that returns an error or panics produces a failed-result
//! event; the worker that ran it keeps pulling jobs.
//!
//! # Shutdown
//!
//! Workers exit once the pool (and with it the queue sender) is dropped
//! and the queue is empty. They are detached rather than joined, so a
//! job that never completes occupies one worker slot forever but cannot
//! block shutdown; its eventual result is discarded when the loop's
//! result receiver is gone.

use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};

use crossbeam_channel::TrySendError;
use tokio::sync::mpsc;

use ferry_protocol::{ChainId, Message};

use crate::component::OffloadCall;
use crate::error::JobError;

#[cfg(test)]
#[path = "worker_test.rs"]
mod tests;

/// Where a job's result re-enters its chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resume {
    /// Continue delivery at this stage index
    Stage(usize),

    /// The job was terminal (sink offload); count and discard
    Terminal,
}

/// Routing tag carried by a job from submission to result delivery
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    /// Chain the message belongs to
    pub chain: ChainId,

    /// Where the result resumes
    pub resume: Resume,
}

/// A queued unit of blocking work
pub struct OffloadJob {
    /// Routing tag for the result
    pub ticket: Ticket,

    /// Message and work function
    pub call: OffloadCall,
}

impl fmt::Debug for OffloadJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OffloadJob")
            .field("ticket", &self.ticket)
            .field("message", &self.call.message)
            .finish_non_exhaustive()
    }
}

/// Result of a finished job, delivered back to the dispatch loop
#[derive(Debug)]
pub struct JobResult {
    /// Routing tag from the submitted job
    pub ticket: Ticket,

    /// Value or captured failure
    pub outcome: Result<Message, JobError>,
}

/// `submit` failed because the queue bound was exceeded (or the pool is
/// gone); carries the job back to the caller
pub struct OverloadError {
    job: OffloadJob,
    capacity: usize,
    closed: bool,
}

impl OverloadError {
    /// Recover the rejected job
    pub fn into_job(self) -> OffloadJob {
        self.job
    }

    /// Whether the rejection was shutdown rather than backpressure
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl fmt::Display for OverloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.closed {
            write!(f, "worker pool has shut down")
        } else {
            write!(f, "worker queue full (capacity {})", self.capacity)
        }
    }
}

impl fmt::Debug for OverloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverloadError")
            .field("capacity", &self.capacity)
            .field("closed", &self.closed)
            .finish_non_exhaustive()
    }
}

impl std::error::Error for OverloadError {}

/// Fixed pool of worker threads with a shared FIFO job queue
pub struct WorkerPool {
    job_tx: crossbeam_channel::Sender<OffloadJob>,
    capacity: usize,
    workers: usize,
}

impl WorkerPool {
    /// Spawn `workers` threads pulling from a queue bounded at
    /// `capacity`, delivering results through `results`
    pub fn spawn(workers: usize, capacity: usize, results: mpsc::Sender<JobResult>) -> Self {
        let workers = workers.max(1);
        let (job_tx, job_rx) = crossbeam_channel::bounded::<OffloadJob>(capacity);

        for id in 0..workers {
            let rx = job_rx.clone();
            let tx = results.clone();
            std::thread::Builder::new()
                .name(format!("ferry-worker-{id}"))
                .spawn(move || worker_loop(id, rx, tx))
                .expect("failed to spawn worker thread");
        }

        tracing::debug!(workers, capacity, "worker pool started");

        Self {
            job_tx,
            capacity,
            workers,
        }
    }

    /// Enqueue a job without blocking
    pub fn submit(&self, job: OffloadJob) -> Result<(), OverloadError> {
        self.job_tx.try_send(job).map_err(|err| match err {
            TrySendError::Full(job) => OverloadError {
                job,
                capacity: self.capacity,
                closed: false,
            },
            TrySendError::Disconnected(job) => OverloadError {
                job,
                capacity: self.capacity,
                closed: true,
            },
        })
    }

    /// Queue bound configured at construction
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of worker threads
    #[inline]
    pub fn workers(&self) -> usize {
        self.workers
    }
}

fn worker_loop(
    id: usize,
    jobs: crossbeam_channel::Receiver<OffloadJob>,
    results: mpsc::Sender<JobResult>,
) {
    while let Ok(job) = jobs.recv() {
        let OffloadJob { ticket, call } = job;
        let OffloadCall { message, work } = call;

        let outcome = match catch_unwind(AssertUnwindSafe(move || work(message))) {
            Ok(result) => result,
            Err(panic) => Err(JobError::panicked(panic_message(panic.as_ref()))),
        };

        if results.blocking_send(JobResult { ticket, outcome }).is_err() {
            // Loop is gone; late results are discarded by contract.
            tracing::trace!(worker = id, chain = %ticket.chain, "result discarded after shutdown");
        }
    }

    tracing::debug!(worker = id, "worker exiting");
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
