//! Upload progress reporting

use std::sync::Arc;

use tokio::sync::watch;

use crate::task::{Deferred, Task};

/// Live view of an upload's progress
///
/// `total` is fixed once the upload body is known; `completed` advances as
/// bytes are handed to the network.
#[derive(Debug, Clone)]
pub struct Progress {
    total: u64,
    completed: watch::Receiver<u64>,
}

impl Progress {
    /// Progress of an upload that never started
    ///
    /// Nothing is left to send, so it is finished, but its
    /// [`Progress::fraction`] stays at `0.0`.
    pub fn empty() -> Self {
        let (_, completed) = watch::channel(0);
        Self {
            total: 0,
            completed,
        }
    }

    /// Total bytes
    pub fn total(&self) -> u64 {
        self.total
    }

    /// Bytes sent so far
    pub fn completed(&self) -> u64 {
        *self.completed.borrow()
    }

    /// Completed fraction between `0.0` and `1.0`, `0.0` for an empty upload
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.completed() as f64 / self.total as f64).min(1.0)
    }

    /// Whether every byte has been sent
    pub fn is_finished(&self) -> bool {
        self.completed() >= self.total
    }

    /// Wait for the next change
    ///
    /// Returns `false` once the upload is over and no further change will come.
    pub async fn changed(&mut self) -> bool {
        self.completed.changed().await.is_ok()
    }
}

/// Producer side, held by the transport until the body size is known
#[derive(Debug)]
pub struct ProgressReporter {
    deferred: Option<Deferred<Progress>>,
}

impl ProgressReporter {
    /// Reporter and the task resolving to its [`Progress`]
    ///
    /// If the reporter is dropped before [`ProgressReporter::begin`], the task
    /// resolves to [`Progress::empty`].
    pub fn new() -> (Self, Task<Progress>) {
        let (deferred, task) = Task::deferred();
        (
            Self {
                deferred: Some(deferred),
            },
            task,
        )
    }

    /// Publish the total and start counting
    pub fn begin(mut self, total: u64) -> ProgressCounter {
        let (sender, completed) = watch::channel(0);
        if let Some(deferred) = self.deferred.take() {
            deferred.fill(Ok(Progress { total, completed }));
        }
        ProgressCounter {
            sender: Arc::new(sender),
        }
    }
}

impl Drop for ProgressReporter {
    fn drop(&mut self) {
        if let Some(deferred) = self.deferred.take() {
            tracing::debug!("Upload never started, progress left empty");
            deferred.fill(Ok(Progress::empty()));
        }
    }
}

/// Counts bytes as they are sent
#[derive(Debug, Clone)]
pub struct ProgressCounter {
    sender: Arc<watch::Sender<u64>>,
}

impl ProgressCounter {
    /// Record `bytes` more sent
    pub fn advance(&self, bytes: u64) {
        self.sender.send_modify(|completed| *completed += bytes);
    }
}
