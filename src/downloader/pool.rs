//! Fixed-size worker pool over the shared work queue.

use std::sync::Arc;

use futures::StreamExt;
use futures::stream::FuturesUnordered;
use tokio::task::JoinHandle;

use crate::config::MAX_WORKERS;
use crate::error::{Error, Result};
use crate::types::WorkItem;

use super::queue::QueueMessage;
use super::worker::{WorkerContext, run_worker};

/// Number of workers for `total` items: never more than [`MAX_WORKERS`]
/// and never more than there is work for
pub(crate) fn worker_count(max_workers: usize, total: usize) -> usize {
    max_workers.min(MAX_WORKERS).min(total)
}

/// Download every item with up to `max_workers` concurrent workers.
///
/// All items are queued before any worker starts. The pool waits until every
/// item is marked done, then sends one shutdown sentinel per worker and waits
/// for them to exit. The first failure aborts the run: remaining workers are
/// cancelled and that failure is returned.
///
/// # Arguments
///
/// * `ctx` - Shared worker state; its queue must be empty
/// * `items` - Every object to transfer
/// * `max_workers` - Requested concurrency, capped at [`MAX_WORKERS`]
///
/// # Returns
///
/// The number of workers started (zero when there is nothing to do).
///
/// # Errors
///
/// Returns the first transfer failure, or [`Error::WorkerFailed`] if a worker
/// panicked or the progress counters disagree with the queue after the run.
pub(crate) async fn download_all(
    ctx: Arc<WorkerContext>,
    items: Vec<WorkItem>,
    max_workers: usize,
) -> Result<usize> {
    let workers = worker_count(max_workers, items.len());
    for item in items {
        ctx.queue.push(QueueMessage::Item(item));
    }

    if workers == 0 {
        tracing::debug!("Nothing to download, no workers started");
        return Ok(0);
    }

    tracing::info!(workers, queued = ctx.queue.len(), "Starting download workers");

    let mut running: FuturesUnordered<JoinHandle<()>> = (0..workers)
        .map(|worker_id| tokio::spawn(run_worker(worker_id, Arc::clone(&ctx))))
        .collect();

    {
        let drained = ctx.queue.join();
        tokio::pin!(drained);

        loop {
            tokio::select! {
                biased;
                _ = ctx.cancel_token.cancelled() => break,
                _ = &mut drained => break,
                finished = running.next() => match finished {
                    Some(Ok(())) => {}
                    Some(Err(e)) => {
                        tracing::error!(error = %e, "Download worker died");
                        ctx.fail(Error::WorkerFailed(e.to_string()));
                        break;
                    }
                    None => break,
                },
            }
        }
    }

    if let Some(error) = ctx.take_failure() {
        abort_all(&mut running).await;
        return Err(error);
    }

    let outstanding = ctx.queue.unfinished();
    if outstanding > 0 {
        // Every worker exited without a recorded failure
        abort_all(&mut running).await;
        return Err(Error::WorkerFailed(format!(
            "workers stopped with {outstanding} items outstanding"
        )));
    }

    for _ in 0..workers {
        ctx.queue.push(QueueMessage::Shutdown);
    }
    while let Some(finished) = running.next().await {
        if let Err(e) = finished {
            return Err(Error::WorkerFailed(e.to_string()));
        }
    }

    if !ctx.progress.counters().is_drained() {
        return Err(Error::WorkerFailed(
            "queue drained but progress counters still show remaining files".to_string(),
        ));
    }

    tracing::debug!(workers, "All download workers stopped");
    Ok(workers)
}

async fn abort_all(running: &mut FuturesUnordered<JoinHandle<()>>) {
    for handle in running.iter() {
        handle.abort();
    }
    // Drain so no worker outlives the run
    while running.next().await.is_some() {}
}
