//! Docket download pipeline split into focused submodules.
//!
//! The [`DocketDownloader`] composes the stages of one run:
//! - [`crate::planner`] - Prefix planning and preconditions
//! - [`crate::enumerator`] - Up-front listing of every key
//! - [`paths`] - Remote key to local path mapping
//! - [`queue`] - Shared FIFO with done-accounting
//! - [`worker`] - Per-item transfer loop
//! - [`pool`] - Worker pool and fatal-on-first-error handling

pub mod paths;
mod pool;
mod queue;
mod worker;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;

use std::sync::Arc;
use std::time::Instant;

use crate::config::Config;
use crate::enumerator::enumerate;
use crate::error::Result;
use crate::planner::plan;
use crate::progress::{Console, ProgressTracker};
use crate::store::{ObjectStore, S3Store};
use crate::types::{Dataset, DownloadSummary, GroupTally};

use paths::LocalLayout;
use worker::WorkerContext;

/// Downloads whole dockets from an object store to the local filesystem
#[derive(Clone)]
pub struct DocketDownloader {
    /// Where objects are listed and fetched from
    store: Arc<dyn ObjectStore>,
    /// Run configuration
    config: Arc<Config>,
    /// User-facing output (progress line and summary)
    console: Console,
}

impl std::fmt::Debug for DocketDownloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocketDownloader")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl DocketDownloader {
    /// Create a downloader for the S3 bucket named in the configuration.
    ///
    /// # Arguments
    ///
    /// * `config` - Run configuration; `config.store` selects the bucket
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::error::Error::Config) if the
    /// configuration fails validation.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let store = S3Store::new(&config.store).await?;
        Ok(Self::with_store(config, Arc::new(store)))
    }

    /// Create a downloader over any object store
    pub fn with_store(config: Config, store: Arc<dyn ObjectStore>) -> Self {
        Self {
            store,
            config: Arc::new(config),
            console: Console::stdout(),
        }
    }

    /// Send progress and summary output to `console` instead of stdout
    pub fn with_console(mut self, console: Console) -> Self {
        self.console = console;
        self
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Download every object of a docket.
    ///
    /// Fails without touching the filesystem when a precondition does not
    /// hold. Any single transfer failure aborts the whole run; files already
    /// written are left in place.
    ///
    /// # Arguments
    ///
    /// * `dataset` - Agency and docket to download
    ///
    /// # Returns
    ///
    /// Per-group tallies, the absolute docket folder and the run duration.
    ///
    /// # Errors
    ///
    /// - [`Error::Precondition`](crate::error::Error::Precondition) - the docket, its text or its derived tree is missing
    /// - [`Error::Listing`](crate::error::Error::Listing) - enumeration failed
    /// - [`Error::Transfer`](crate::error::Error::Transfer) - the first object that failed to download
    /// - [`Error::InvalidKey`](crate::error::Error::InvalidKey) - a key cannot be mapped to a local path
    pub async fn download(&self, dataset: &Dataset) -> Result<DownloadSummary> {
        let started = Instant::now();
        let download = &self.config.download;

        tracing::info!(
            agency = %dataset.agency,
            docket_id = %dataset.docket_id,
            include_binary = download.include_binary,
            "Starting docket download"
        );

        let plan = plan(self.store.as_ref(), dataset, download.include_binary).await?;
        let lists = enumerate(self.store.as_ref(), &plan, &self.console).await?;

        let layout = LocalLayout::new(&download.output_folder, &plan);
        let output_dir = layout.docket_dir().to_path_buf();
        let progress = ProgressTracker::new(
            &lists.totals(),
            self.console.clone(),
            self.config.progress.line_width,
        );
        let ctx = Arc::new(WorkerContext::new(
            Arc::clone(&self.store),
            layout,
            progress,
        ));

        let workers =
            pool::download_all(Arc::clone(&ctx), lists.into_work_items(), download.max_workers)
                .await?;

        let snapshot = ctx.progress.snapshot();
        let summary = DownloadSummary {
            docket_id: dataset.docket_id.clone(),
            output_dir: std::path::absolute(&output_dir).unwrap_or(output_dir),
            text: snapshot.text,
            binary: snapshot.binary.map(|(tally, _)| tally),
            workers,
            elapsed: started.elapsed(),
        };

        self.console.line("");
        self.console.line(&finished_line(summary.text, summary.binary));
        self.console.line(&format!(
            "All files for docket {} have been downloaded to {}",
            summary.docket_id,
            summary.output_dir.display()
        ));

        tracing::info!(
            docket_id = %summary.docket_id,
            files = summary.files(),
            workers,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Docket download complete"
        );

        Ok(summary)
    }
}

fn finished_line(text: GroupTally, binary: Option<GroupTally>) -> String {
    let mut line = format!("Download finished. Text: {}/{}", text.done, text.total);
    if let Some(binary) = binary {
        line.push_str(&format!(" | Bin: {}/{}", binary.done, binary.total));
    }
    line
}
