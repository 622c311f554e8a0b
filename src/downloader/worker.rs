//! Download worker: pops work items and transfers them until shut down.

use std::path::Path;
use std::sync::{Arc, Mutex, PoisonError};

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result, StoreError};
use crate::progress::ProgressTracker;
use crate::store::ObjectStore;
use crate::types::WorkItem;

use super::paths::LocalLayout;
use super::queue::{QueueMessage, WorkQueue};

/// State shared by every worker of one run
pub(crate) struct WorkerContext {
    pub(crate) store: Arc<dyn ObjectStore>,
    pub(crate) queue: WorkQueue,
    pub(crate) layout: LocalLayout,
    pub(crate) progress: ProgressTracker,
    /// Cancelled on the first failure
    pub(crate) cancel_token: CancellationToken,
    /// First failure of the run; later failures are only logged
    failure: Mutex<Option<Error>>,
}

impl WorkerContext {
    pub(crate) fn new(
        store: Arc<dyn ObjectStore>,
        layout: LocalLayout,
        progress: ProgressTracker,
    ) -> Self {
        Self {
            store,
            queue: WorkQueue::new(),
            layout,
            progress,
            cancel_token: CancellationToken::new(),
            failure: Mutex::new(None),
        }
    }

    /// Record a failure and stop the run.
    ///
    /// Only the first failure is kept. The queue is closed so idle workers
    /// wake up and exit instead of picking up more work.
    pub(crate) fn fail(&self, error: Error) {
        {
            let mut failure = self.failure.lock().unwrap_or_else(PoisonError::into_inner);
            if failure.is_none() {
                *failure = Some(error);
            } else {
                tracing::debug!(error = %error, "Ignoring failure after the run was aborted");
            }
        }
        self.cancel_token.cancel();
        self.queue.close();
    }

    /// Take the recorded failure, if any
    pub(crate) fn take_failure(&self) -> Option<Error> {
        self.failure
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
    }
}

/// Worker loop.
///
/// Exits on a shutdown sentinel, when the queue is closed, or when the run is
/// cancelled. Every item is marked done only after its transfer succeeded and
/// progress was recorded; a failed item is never marked done, so `join` can
/// only resolve for a fully successful run.
pub(crate) async fn run_worker(worker_id: usize, ctx: Arc<WorkerContext>) {
    tracing::debug!(worker_id, "Worker started");

    loop {
        let message = tokio::select! {
            biased;
            _ = ctx.cancel_token.cancelled() => break,
            message = ctx.queue.pop() => message,
        };

        let item = match message {
            Some(QueueMessage::Item(item)) => item,
            Some(QueueMessage::Shutdown) | None => break,
        };

        match transfer(&ctx, &item).await {
            Ok(()) => {
                ctx.progress.record_completion(item.category);
                ctx.queue.task_done();
            }
            Err(e) => {
                tracing::error!(worker_id, key = %item.key, error = %e, "Transfer failed");
                ctx.fail(e);
                break;
            }
        }
    }

    tracing::debug!(worker_id, "Worker stopped");
}

/// Download one item to its local path, creating parent directories first.
///
/// Folder-marker keys (ending in `/`) only create their directory.
async fn transfer(ctx: &WorkerContext, item: &WorkItem) -> Result<()> {
    let dest = ctx.layout.resolve(item)?;

    if item.is_directory_marker() {
        return create_dir(item, &dest).await;
    }

    if let Some(parent) = dest.parent() {
        create_dir(item, parent).await?;
    }

    ctx.store
        .fetch(&item.key, &dest)
        .await
        .map_err(|source| Error::Transfer {
            key: item.key.clone(),
            source,
        })?;

    tracing::trace!(key = %item.key, path = %dest.display(), "Object saved");
    Ok(())
}

// create_dir_all tolerates other workers creating the same tree concurrently
async fn create_dir(item: &WorkItem, dir: &Path) -> Result<()> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|source| Error::Transfer {
            key: item.key.clone(),
            source: StoreError::Io {
                path: dir.to_path_buf(),
                source,
            },
        })
}
