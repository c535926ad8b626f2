//! Supervision for detached work that outlives the request that started it.

use std::{any::Any, future::Future, panic::AssertUnwindSafe};

use {
    futures::FutureExt,
    tokio::task::JoinHandle,
    tokio_util::task::TaskTracker,
    tracing::{debug, error},
};

#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("background tasks are shutting down, refusing to launch {label}")]
    ShuttingDown { label: String },
}

/// Tracks detached tasks so shutdown can wait for them.
///
/// A task's error or panic is logged at the task boundary and never reaches
/// the code that launched it.
#[derive(Clone, Default)]
pub struct BackgroundTasks {
    tracker: TaskTracker,
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        *s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "non-string panic payload"
    }
}

impl BackgroundTasks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `task` without waiting for it.
    pub fn launch<F, E>(&self, label: &str, sender_id: &str, task: F) -> Result<(), LaunchError>
    where
        F: Future<Output = Result<(), E>> + Send + 'static,
        E: std::fmt::Display + Send + 'static,
    {
        if self.tracker.is_closed() {
            return Err(LaunchError::ShuttingDown {
                label: label.to_string(),
            });
        }

        let label = label.to_string();
        let sender_id = sender_id.to_string();
        self.tracker.spawn(async move {
            match AssertUnwindSafe(task).catch_unwind().await {
                Ok(Ok(())) => debug!(task = %label, %sender_id, "background task finished"),
                Ok(Err(e)) => {
                    error!(task = %label, %sender_id, error = %e, "background task failed")
                },
                Err(payload) => error!(
                    task = %label,
                    %sender_id,
                    panic = panic_message(payload.as_ref()),
                    "background task panicked"
                ),
            }
        });
        Ok(())
    }

    /// Run `task` on its own tracked task and return its handle.
    ///
    /// Dropping the handle does not cancel the task, and shutdown waits for
    /// it like any launched task. Unlike [`BackgroundTasks::launch`], the
    /// tracker accepts it even while shutting down.
    pub fn track<F>(&self, task: F) -> JoinHandle<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        self.tracker.spawn(task)
    }

    /// Number of tasks still running.
    pub fn len(&self) -> usize {
        self.tracker.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracker.is_empty()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.tracker.is_closed()
    }

    /// Refuse new launches and wait for running tasks to finish.
    pub async fn shutdown(&self) {
        self.tracker.close();
        if !self.tracker.is_empty() {
            debug!(in_flight = self.tracker.len(), "waiting for background tasks");
        }
        self.tracker.wait().await;
    }
}
