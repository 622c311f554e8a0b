//! Object store capability consumed by the downloader.
//!
//! - [`s3`] - anonymous S3 client built on `aws-sdk-s3`
//! - [`memory`] - in-memory store for tests and embedding

pub mod memory;
pub mod s3;

pub use memory::MemoryStore;
pub use s3::S3Store;

use std::path::Path;

use futures::TryStreamExt;
use futures::stream::BoxStream;

use crate::error::StoreResult;

/// Listing of one prefix, one item per page; each page holds its keys in store order
pub type KeyPages<'a> = BoxStream<'a, StoreResult<Vec<String>>>;

/// Abstraction over the remote bucket, enabling testability.
///
/// Implementations must be shareable across worker tasks. `fetch` writes the
/// object to `dest`, whose parent directory already exists.
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every key under `prefix`, page by page.
    ///
    /// An empty prefix still yields one (empty) page. The stream ends after
    /// the last page or after the first error.
    fn list_pages<'a>(&'a self, prefix: &'a str) -> KeyPages<'a>;

    /// Whether at least one key exists under `prefix`
    async fn exists(&self, prefix: &str) -> StoreResult<bool> {
        let mut pages = self.list_pages(prefix);
        while let Some(page) = pages.try_next().await? {
            if !page.is_empty() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Download `key` into the local file `dest`, overwriting it
    async fn fetch(&self, key: &str, dest: &Path) -> StoreResult<()>;
}
