//! In-memory object store.
//!
//! Keys are kept sorted like S3 lists them. Pages are cut at a configurable
//! size and continuation tokens are the last key of the previous page
//! (`start-after` semantics). Fetch failures and per-fetch latency can be
//! injected, and fetch concurrency is recorded so callers can observe how
//! many transfers overlapped.

use std::collections::{BTreeMap, HashSet};
use std::ops::Bound;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use futures::StreamExt;
use futures::stream;

use super::{KeyPages, ObjectStore};
use crate::error::{StoreError, StoreResult};

/// Default page size, matching S3's ListObjectsV2 limit
const DEFAULT_PAGE_SIZE: usize = 1000;

/// In-memory [`ObjectStore`]
#[derive(Debug)]
pub struct MemoryStore {
    objects: BTreeMap<String, Vec<u8>>,
    page_size: usize,
    failing: HashSet<String>,
    fetch_delay: Option<Duration>,
    list_calls: AtomicUsize,
    fetched: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            objects: BTreeMap::new(),
            page_size: DEFAULT_PAGE_SIZE,
            failing: HashSet::new(),
            fetch_delay: None,
            list_calls: AtomicUsize::new(0),
            fetched: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Cut listings into pages of `page_size` keys (minimum 1)
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Add an object
    pub fn with_object(mut self, key: impl Into<String>, body: impl Into<Vec<u8>>) -> Self {
        self.insert(key, body);
        self
    }

    /// Make every fetch of `key` fail
    pub fn fail_on(mut self, key: impl Into<String>) -> Self {
        self.failing.insert(key.into());
        self
    }

    /// Sleep this long inside every fetch
    pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
        self.fetch_delay = Some(delay);
        self
    }

    /// Add or replace an object
    pub fn insert(&mut self, key: impl Into<String>, body: impl Into<Vec<u8>>) {
        self.objects.insert(key.into(), body.into());
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    /// Whether the store holds no objects
    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Number of listing pages served
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    /// Number of successful fetches
    pub fn fetched(&self) -> usize {
        self.fetched.load(Ordering::SeqCst)
    }

    /// Highest number of fetches that were in progress at the same time
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    /// Keys of the page after `after` (or the first page), plus the token of the next one
    fn page(&self, prefix: &str, after: Option<&str>) -> (Vec<String>, Option<String>) {
        self.list_calls.fetch_add(1, Ordering::SeqCst);

        let start = match after {
            Some(token) => Bound::Excluded(token),
            None => Bound::Included(prefix),
        };
        let mut keys: Vec<String> = self
            .objects
            .range::<str, _>((start, Bound::Unbounded))
            .map(|(key, _)| key)
            .take_while(|key| key.starts_with(prefix))
            .take(self.page_size + 1)
            .cloned()
            .collect();

        let next = if keys.len() > self.page_size {
            keys.truncate(self.page_size);
            keys.last().cloned()
        } else {
            None
        };
        (keys, next)
    }
}

/// Decrements the in-flight counter however the fetch ends
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ObjectStore for MemoryStore {
    fn list_pages<'a>(&'a self, prefix: &'a str) -> KeyPages<'a> {
        // State: `None` once exhausted, `Some(token)` while pages remain
        stream::unfold(Some(None::<String>), move |state| async move {
            let after = state?;
            let (keys, next) = self.page(prefix, after.as_deref());
            Some((Ok::<_, StoreError>(keys), next.map(Some)))
        })
        .boxed()
    }

    async fn fetch(&self, key: &str, dest: &Path) -> StoreResult<()> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        let _guard = InFlight(&self.in_flight);
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);

        if let Some(delay) = self.fetch_delay {
            tokio::time::sleep(delay).await;
        }

        if self.failing.contains(key) {
            return Err(StoreError::Unavailable(format!("injected failure for {key}")));
        }
        let body = self
            .objects
            .get(key)
            .ok_or_else(|| StoreError::NotFound(key.to_string()))?;

        tokio::fs::write(dest, body)
            .await
            .map_err(|source| StoreError::Io {
                path: dest.to_path_buf(),
                source,
            })?;
        self.fetched.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
