//! Error types for docket-dl
//!
//! Every error in this crate is fatal to the run. The taxonomy exists so the
//! binary can print a precise message and so embedders can tell a missing
//! docket apart from a failed transfer:
//! - [`PreconditionError`] - the docket (or one of its mandatory trees) is absent
//! - [`Error::Transfer`] - a single object could not be fetched
//! - [`StoreError`] - the object store capability itself failed

use std::path::PathBuf;

use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Error;
use aws_sdk_s3::primitives::ByteStreamError;
use thiserror::Error;

/// Result type alias for docket-dl operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for object store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// SDK failure of a `ListObjectsV2` request
pub type ListObjectsSdkError = SdkError<ListObjectsV2Error, HttpResponse>;

/// SDK failure of a `GetObject` request
pub type GetObjectSdkError = SdkError<GetObjectError, HttpResponse>;

/// Main error type for docket-dl
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "download.max_workers")
        key: Option<String>,
    },

    /// The docket cannot be downloaded at all; nothing was attempted
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// A single object failed to transfer; the whole run is aborted
    #[error("Error downloading {key}: {source}")]
    Transfer {
        /// Remote key of the object that failed
        key: String,
        /// Underlying store failure
        #[source]
        source: StoreError,
    },

    /// Listing a prefix failed while building the download lists
    #[error("Error listing {prefix}: {source}")]
    Listing {
        /// Prefix that was being enumerated
        prefix: String,
        /// Underlying store failure
        #[source]
        source: StoreError,
    },

    /// A remote key cannot be mapped to a local path
    #[error("invalid key {key}: {reason}")]
    InvalidKey {
        /// The offending remote key
        key: String,
        /// Why the key was rejected
        reason: String,
    },

    /// A worker task died without reporting a transfer result
    #[error("download worker failed: {0}")]
    WorkerFailed(String),
}

/// Preconditions checked before any download begins
#[derive(Debug, Error)]
pub enum PreconditionError {
    /// Nothing exists under `raw-data/<agency>/<docket>/`
    #[error("Docket {docket_id} for agency {agency} not found in S3 bucket.")]
    DocketNotFound {
        /// Agency identifier (e.g., "EPA")
        agency: String,
        /// Docket identifier
        docket_id: String,
    },

    /// Nothing exists under the docket's `text-<docket>/` tree
    #[error("Text data for docket {docket_id} not found.")]
    TextDataNotFound {
        /// Docket identifier
        docket_id: String,
    },

    /// Nothing exists under `derived-data/<agency>/<docket>/`
    #[error("Derived data for docket {docket_id} not found.")]
    DerivedDataNotFound {
        /// Docket identifier
        docket_id: String,
    },

    /// An identifier cannot be used as a key or path segment
    #[error("invalid {field} {value:?}: {reason}")]
    InvalidIdentifier {
        /// Which identifier was rejected ("agency" or "docket id")
        field: &'static str,
        /// The rejected value
        value: String,
        /// Why it was rejected
        reason: &'static str,
    },
}

/// Failures of the object store capability (listing, existence checks, fetches)
#[derive(Debug, Error)]
pub enum StoreError {
    /// A `ListObjectsV2` request failed
    #[error("list request failed: {}", DisplayErrorContext(.0.as_ref()))]
    ListObjects(#[source] Box<ListObjectsSdkError>),

    /// A `GetObject` request failed for a reason other than a missing key
    #[error("get request failed: {}", DisplayErrorContext(.0.as_ref()))]
    GetObject(#[source] Box<GetObjectSdkError>),

    /// The object body stream broke off mid-transfer
    #[error("body stream failed: {0}")]
    Body(#[from] ByteStreamError),

    /// Writing the fetched object to disk failed
    #[error("failed to write {path}: {source}")]
    Io {
        /// Local destination path
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The requested object does not exist
    #[error("object not found: {0}")]
    NotFound(String),

    /// The store refused or could not serve the request
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Maps errors to process exit codes for the command-line front end
pub trait ToExitCode {
    /// Get the process exit code for this error
    fn exit_code(&self) -> u8;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToExitCode for Error {
    fn exit_code(&self) -> u8 {
        // All-or-nothing batch: every failure is the same exit status.
        1
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Precondition(PreconditionError::InvalidIdentifier { .. }) => {
                "invalid_identifier"
            }
            Error::Precondition(_) => "precondition_failed",
            Error::Transfer { .. } => "transfer_failed",
            Error::Listing { .. } => "listing_failed",
            Error::InvalidKey { .. } => "invalid_key",
            Error::WorkerFailed(_) => "worker_failed",
        }
    }
}

impl Error {
    /// Whether this error interrupted an in-progress status line
    ///
    /// Listing, transfer and worker failures happen while a count or progress
    /// line is being redrawn in place, so the caller should break the line
    /// before printing.
    pub fn interrupts_progress(&self) -> bool {
        matches!(
            self,
            Error::Transfer { .. }
                | Error::Listing { .. }
                | Error::InvalidKey { .. }
                | Error::WorkerFailed(_)
        )
    }
}
