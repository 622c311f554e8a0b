//! Shared FIFO work queue with done-accounting and sentinel shutdown.
//!
//! Every item pushed must be marked done with [`WorkQueue::task_done`];
//! [`WorkQueue::join`] resolves once all of them are. Shutdown sentinels are
//! not counted. Closing the queue makes every pending and future `pop`
//! return `None`.

use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use tokio::sync::{Semaphore, watch};

use crate::types::WorkItem;

/// Message delivered to a worker
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) enum QueueMessage {
    /// Object to download
    Item(WorkItem),
    /// Stop after this message
    Shutdown,
}

/// Unbounded multi-consumer FIFO
pub(crate) struct WorkQueue {
    messages: Mutex<VecDeque<QueueMessage>>,
    /// One permit per queued message
    available: Semaphore,
    /// Items pushed but not yet marked done
    unfinished: watch::Sender<usize>,
}

impl Default for WorkQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkQueue {
    pub(crate) fn new() -> Self {
        let (unfinished, _) = watch::channel(0);
        Self {
            messages: Mutex::new(VecDeque::new()),
            available: Semaphore::new(0),
            unfinished,
        }
    }

    /// Append a message
    pub(crate) fn push(&self, message: QueueMessage) {
        if matches!(message, QueueMessage::Item(_)) {
            self.unfinished.send_modify(|n| *n += 1);
        }
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(message);
        self.available.add_permits(1);
    }

    /// Wait for the next message; `None` once the queue is closed
    pub(crate) async fn pop(&self) -> Option<QueueMessage> {
        let permit = self.available.acquire().await.ok()?;
        permit.forget();
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Mark one popped item as fully processed
    pub(crate) fn task_done(&self) {
        self.unfinished.send_modify(|n| *n = n.saturating_sub(1));
    }

    /// Resolve once every pushed item has been marked done
    pub(crate) async fn join(&self) {
        let mut unfinished = self.unfinished.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = unfinished.wait_for(|n| *n == 0).await;
    }

    /// Stop handing out messages; pending pops return `None`
    pub(crate) fn close(&self) {
        self.available.close();
    }

    /// Messages waiting to be popped
    pub(crate) fn len(&self) -> usize {
        self.messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Items pushed but not yet marked done
    pub(crate) fn unfinished(&self) -> usize {
        *self.unfinished.borrow()
    }
}
