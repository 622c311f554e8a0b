//! Core types for docket-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::PreconditionError;

/// Local directory under the docket folder for raw (as-published) data
pub const RAW_DATA_DIR: &str = "raw-data";

/// Local directory under the docket folder for derived data
pub const DERIVED_DATA_DIR: &str = "derived-data";

/// Kind of object being downloaded
///
/// Every category has its own remote listing prefix and its own base prefix
/// from which local relative paths are computed (see
/// [`DocketPrefixes`](crate::planner::DocketPrefixes)).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Docket-level metadata records
    Docket,
    /// Document records
    Documents,
    /// Public comment records
    Comments,
    /// Derived (post-processed) data
    Derived,
    /// Binary attachments
    Binary,
}

impl Category {
    /// All categories in the order they are listed and queued
    pub const ALL: [Category; 5] = [
        Category::Docket,
        Category::Documents,
        Category::Comments,
        Category::Derived,
        Category::Binary,
    ];

    /// Lowercase label used in listing output
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Docket => "docket",
            Category::Documents => "documents",
            Category::Comments => "comments",
            Category::Derived => "derived",
            Category::Binary => "binary",
        }
    }

    /// Whether this category counts towards the combined "text" progress group
    pub fn is_text(&self) -> bool {
        !matches!(self, Category::Binary)
    }

    /// Directory under the docket folder that receives this category
    pub fn local_root(&self) -> &'static str {
        match self {
            Category::Derived => DERIVED_DATA_DIR,
            _ => RAW_DATA_DIR,
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifies a docket: the agency that owns it and its docket id
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dataset {
    /// Agency identifier (e.g., "EPA")
    pub agency: String,
    /// Docket identifier (e.g., "EPA-HQ-OW-2020-0001")
    pub docket_id: String,
}

impl Dataset {
    /// Create a dataset identifier, rejecting values that cannot be used as
    /// a single key segment and a single local directory name.
    pub fn new(
        agency: impl Into<String>,
        docket_id: impl Into<String>,
    ) -> Result<Self, PreconditionError> {
        let agency = agency.into();
        let docket_id = docket_id.into();
        validate_identifier("agency", &agency)?;
        validate_identifier("docket id", &docket_id)?;
        Ok(Self { agency, docket_id })
    }
}

fn validate_identifier(field: &'static str, value: &str) -> Result<(), PreconditionError> {
    let reason = if value.trim().is_empty() {
        Some("must not be empty")
    } else if value.contains(['/', '\\']) {
        Some("must not contain path separators")
    } else if value == "." || value == ".." {
        Some("must not be a relative path component")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(PreconditionError::InvalidIdentifier {
            field,
            value: value.to_string(),
            reason,
        }),
        None => Ok(()),
    }
}

/// A single object to download
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkItem {
    /// Remote object key
    pub key: String,
    /// Category the key was listed under
    pub category: Category,
}

impl WorkItem {
    /// Create a work item
    pub fn new(key: impl Into<String>, category: Category) -> Self {
        Self {
            key: key.into(),
            category,
        }
    }

    /// Keys ending in `/` are zero-byte "folder" markers rather than files
    pub fn is_directory_marker(&self) -> bool {
        self.key.ends_with('/')
    }
}

/// Completed/total pair for one progress group
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupTally {
    /// Items finished
    pub done: u64,
    /// Items scheduled
    pub total: u64,
}

/// Outcome of a successful run
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DownloadSummary {
    /// Docket that was downloaded
    pub docket_id: String,
    /// Absolute path of `<output>/<docket>`
    pub output_dir: PathBuf,
    /// docket + documents + comments + derived
    pub text: GroupTally,
    /// Binary attachments, when they were included
    pub binary: Option<GroupTally>,
    /// Number of workers started
    pub workers: usize,
    /// Wall time of the download phase
    pub elapsed: Duration,
}

impl DownloadSummary {
    /// Total number of files written
    pub fn files(&self) -> u64 {
        self.text.done + self.binary.map_or(0, |b| b.done)
    }
}
