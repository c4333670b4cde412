//! Background refresh jobs and the runners that execute them.
//!
//! When a served entry is past `update_time`, the orchestrator wraps the
//! refresh in a [`RefreshJob`] and hands it to a [`RefreshDispatcher`].
//! Dispatch is acknowledgement only: the caller never waits for the job.
//!
//! Two dispatchers are bundled:
//!
//! - [`TokioDispatcher`] spawns each job on the current tokio runtime.
//! - [`ChannelDispatcher`] pushes jobs into a bounded queue drained by a
//!   [`RefreshWorker`], for callers who want back-pressure or a dedicated
//!   worker task.

use crate::error::{Error, Result};
use futures::future::BoxFuture;
use std::fmt;
use tokio::runtime::Handle;
use tokio::sync::mpsc;

/// A self-contained refresh: recompute one key and write it back.
pub struct RefreshJob {
    key: String,
    task: BoxFuture<'static, Result<()>>,
}

impl RefreshJob {
    pub fn new(key: impl Into<String>, task: BoxFuture<'static, Result<()>>) -> Self {
        RefreshJob {
            key: key.into(),
            task,
        }
    }

    /// Storage key of the entry being refreshed.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Run the refresh to completion.
    ///
    /// # Errors
    /// Whatever the recompute returned, typically `Error::ComputeError`.
    pub async fn run(self) -> Result<()> {
        self.task.await
    }

    /// Run and log the outcome. Used by the bundled runners.
    pub async fn run_logged(self) {
        let key = self.key.clone();
        match self.run().await {
            Ok(()) => debug!("Background refresh of {} completed", key),
            Err(e) => warn!("Background refresh of {} failed: {}", key, e),
        }
    }
}

impl fmt::Debug for RefreshJob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshJob").field("key", &self.key).finish()
    }
}

/// Hands refresh jobs to whatever executes them.
pub trait RefreshDispatcher: Send + Sync + 'static {
    /// Accept a job for later execution. Must not block on the job itself.
    ///
    /// # Errors
    /// `Error::DispatchError` if the runner cannot take the job.
    fn dispatch(&self, job: RefreshJob) -> Result<()>;
}

/// Spawns each job on a tokio runtime.
#[derive(Clone, Debug, Default)]
pub struct TokioDispatcher {
    handle: Option<Handle>,
}

impl TokioDispatcher {
    /// Spawn on whichever runtime is current at dispatch time.
    pub fn new() -> Self {
        Self::default()
    }

    /// Spawn on a specific runtime.
    pub fn with_handle(handle: Handle) -> Self {
        TokioDispatcher {
            handle: Some(handle),
        }
    }
}

impl RefreshDispatcher for TokioDispatcher {
    fn dispatch(&self, job: RefreshJob) -> Result<()> {
        let handle = match &self.handle {
            Some(handle) => handle.clone(),
            None => Handle::try_current()
                .map_err(|e| Error::DispatchError(format!("No tokio runtime: {}", e)))?,
        };

        trace!("Spawning refresh job for {}", job.key());
        handle.spawn(job.run_logged());
        Ok(())
    }
}

/// Bounded queue of refresh jobs.
#[derive(Clone)]
pub struct ChannelDispatcher {
    sender: mpsc::Sender<RefreshJob>,
}

impl ChannelDispatcher {
    /// Create a dispatcher holding at most `capacity` pending jobs, and the
    /// worker that drains it.
    pub fn bounded(capacity: usize) -> (Self, RefreshWorker) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (ChannelDispatcher { sender }, RefreshWorker { receiver })
    }
}

impl RefreshDispatcher for ChannelDispatcher {
    fn dispatch(&self, job: RefreshJob) -> Result<()> {
        self.sender.try_send(job).map_err(|e| match e {
            mpsc::error::TrySendError::Full(job) => {
                Error::DispatchError(format!("Refresh queue full, dropping {}", job.key()))
            }
            mpsc::error::TrySendError::Closed(job) => {
                Error::DispatchError(format!("Refresh queue closed, dropping {}", job.key()))
            }
        })
    }
}

/// Drains a [`ChannelDispatcher`] queue, one job at a time.
pub struct RefreshWorker {
    receiver: mpsc::Receiver<RefreshJob>,
}

impl RefreshWorker {
    /// Run until every dispatcher handle is dropped. Returns the number of
    /// jobs executed.
    pub async fn run(mut self) -> usize {
        let mut executed = 0;
        while let Some(job) = self.receiver.recv().await {
            job.run_logged().await;
            executed += 1;
        }
        info!("Refresh worker stopped after {} jobs", executed);
        executed
    }

    /// Execute the jobs already queued, without waiting for more.
    pub async fn run_pending(&mut self) -> usize {
        let mut executed = 0;
        while let Ok(job) = self.receiver.try_recv() {
            job.run_logged().await;
            executed += 1;
        }
        executed
    }
}
