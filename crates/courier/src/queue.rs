//! Execution contexts for task continuations
//!
//! Every continuation in a request pipeline names where it runs:
//!
//! - [`Background`]: the runtime's blocking pool, any thread will do.
//! - [`SerialQueue`]: one dedicated worker thread, jobs run one at a time in
//!   submission order.
//! - [`MainQueue`]: jobs run on whichever thread drives the paired
//!   [`MainLoop`], typically the UI thread of the host application.
//!
//! All of them carry a runtime [`Handle`] used to drive the glue between
//! pipeline stages.

use std::fmt::Debug;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use std::thread;

use tokio::runtime::Handle;

use crate::error::Error;

/// Unit of work submitted to an [`Executor`]
pub type Job = Box<dyn FnOnce() + Send + 'static>;

/// Somewhere a [`Job`] can run
pub trait Executor: Send + Sync + Debug {
    /// Submit a job. Jobs are never run inline on the caller's stack.
    fn execute(&self, job: Job);

    /// Runtime driving the futures that lead to this executor
    fn runtime(&self) -> &Handle;
}

fn run_guarded(label: &str, job: Job) {
    if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
        tracing::error!("Job on `{label}` panicked");
    }
}

/// Runtime blocking pool
#[derive(Debug, Clone)]
pub struct Background {
    runtime: Handle,
}

impl Background {
    /// Create a new [`Background`] executor on `runtime`
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Use the runtime of the calling context
    pub fn current() -> Result<Self, Error> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|err| Error::Runtime(err.to_string()))
    }
}

impl Executor for Background {
    fn execute(&self, job: Job) {
        drop(self.runtime.spawn_blocking(job));
    }

    fn runtime(&self) -> &Handle {
        &self.runtime
    }
}

/// Dedicated FIFO worker thread
///
/// The worker exits once every handle to the queue has been dropped and the
/// backlog is drained.
#[derive(Debug, Clone)]
pub struct SerialQueue {
    label: Arc<str>,
    sender: Sender<Job>,
    runtime: Handle,
}

impl SerialQueue {
    /// Spawn the worker thread, named after `label`
    pub fn new(label: &str, runtime: Handle) -> Result<Self, Error> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let label: Arc<str> = Arc::from(label);

        let worker_label = Arc::clone(&label);
        thread::Builder::new()
            .name(label.to_string())
            .spawn(move || {
                while let Ok(job) = receiver.recv() {
                    run_guarded(&worker_label, job);
                }
                tracing::trace!("Serial queue `{worker_label}` stopped");
            })?;

        Ok(Self {
            label,
            sender,
            runtime,
        })
    }

    /// Queue label, also the worker thread name
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Executor for SerialQueue {
    fn execute(&self, job: Job) {
        if self.sender.send(job).is_err() {
            tracing::warn!("Serial queue `{}` is gone, job dropped", self.label);
        }
    }

    fn runtime(&self) -> &Handle {
        &self.runtime
    }
}

/// Main-thread equivalent queue
///
/// Posting never blocks. Jobs run when the paired [`MainLoop`] is driven.
#[derive(Debug, Clone)]
pub struct MainQueue {
    sender: Sender<Job>,
    runtime: Handle,
}

/// Receiving end of a [`MainQueue`]
#[derive(Debug)]
pub struct MainLoop {
    receiver: Receiver<Job>,
}

impl MainQueue {
    /// Create a queue and the loop that drains it
    pub fn new(runtime: Handle) -> (Self, MainLoop) {
        let (sender, receiver) = mpsc::channel();
        (Self { sender, runtime }, MainLoop { receiver })
    }
}

impl Executor for MainQueue {
    fn execute(&self, job: Job) {
        if self.sender.send(job).is_err() {
            tracing::warn!("Main loop is gone, job dropped");
        }
    }

    fn runtime(&self) -> &Handle {
        &self.runtime
    }
}

impl MainLoop {
    /// Run every job already posted, without blocking. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let mut ran = 0;
        while let Ok(job) = self.receiver.try_recv() {
            run_guarded("main", job);
            ran += 1;
        }
        ran
    }

    /// Block until one job is available and run it
    ///
    /// Returns `false` once every [`MainQueue`] handle is dropped.
    pub fn run_once(&self) -> bool {
        match self.receiver.recv() {
            Ok(job) => {
                run_guarded("main", job);
                true
            }
            Err(_) => false,
        }
    }

    /// Run jobs until every [`MainQueue`] handle is dropped
    pub fn run(&self) {
        while self.run_once() {}
    }
}
