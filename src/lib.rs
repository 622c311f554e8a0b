//! # docket-dl
//!
//! Concurrent bulk downloader for regulatory dockets mirrored in a public
//! S3 bucket.
//!
//! ## Design Philosophy
//!
//! docket-dl is designed to be:
//! - **All-or-nothing** - The first failed transfer aborts the whole run
//! - **Sensible defaults** - Works against the public mirror with zero configuration
//! - **Store-agnostic** - Any [`ObjectStore`] can stand in for S3
//!
//! ## Quick Start
//!
//! ```no_run
//! use docket_dl::{Config, Dataset, DocketDownloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut config = Config::default();
//!     config.download.output_folder = "./dockets".into();
//!     config.download.include_binary = true;
//!
//!     let downloader = DocketDownloader::new(config).await?;
//!     let dataset = Dataset::new("EPA", "EPA-HQ-OW-2020-0001")?;
//!     let summary = downloader.download(&dataset).await?;
//!
//!     println!("{} files in {}", summary.files(), summary.output_dir.display());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Command-line arguments
pub mod cli;
/// Configuration types
pub mod config;
/// Docket download pipeline (decomposed into focused submodules)
pub mod downloader;
/// Key enumeration
pub mod enumerator;
/// Error types
pub mod error;
/// Prefix planning and preconditions
pub mod planner;
/// Progress counters and status line
pub mod progress;
/// Object store backends
pub mod store;
/// Core types
pub mod types;

// Re-export commonly used types
pub use cli::Cli;
pub use config::{Config, DownloadConfig, ProgressConfig, StoreConfig};
pub use downloader::DocketDownloader;
pub use error::{Error, PreconditionError, Result, StoreError, ToExitCode};
pub use progress::{Console, ProgressTracker};
pub use store::{MemoryStore, ObjectStore, S3Store};
pub use types::{Category, Dataset, DownloadSummary, GroupTally, WorkItem};
