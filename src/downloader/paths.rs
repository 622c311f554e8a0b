//! Mapping of remote keys to local destination paths.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::planner::{DocketPrefixes, DownloadPlan};
use crate::types::WorkItem;

/// Local layout of one docket:
/// `<output>/<docket>/{raw-data,derived-data}/<key relative to its base prefix>`
#[derive(Clone, Debug)]
pub struct LocalLayout {
    docket_dir: PathBuf,
    prefixes: DocketPrefixes,
}

impl LocalLayout {
    /// Layout for a plan under `output_folder`
    pub fn new(output_folder: &Path, plan: &DownloadPlan) -> Self {
        Self {
            docket_dir: output_folder.join(&plan.dataset.docket_id),
            prefixes: plan.prefixes.clone(),
        }
    }

    /// `<output>/<docket>`
    pub fn docket_dir(&self) -> &Path {
        &self.docket_dir
    }

    /// Destination of a work item.
    ///
    /// The key minus its category's base prefix is split on `/` and each
    /// segment becomes one path component. Empty, `.` and `..` segments are
    /// rejected, so distinct keys never share a path and nothing lands
    /// outside the docket folder. A folder marker drops its one trailing `/`;
    /// a marker for the base prefix itself resolves to the local root.
    pub fn resolve(&self, item: &WorkItem) -> Result<PathBuf> {
        let base = self.prefixes.base_prefix(item.category);
        let mut relative = item
            .key
            .strip_prefix(base)
            .ok_or_else(|| invalid(item, format!("not under {base}")))?;
        if item.is_directory_marker() {
            relative = relative.strip_suffix('/').unwrap_or(relative);
        }

        let mut path = self.docket_dir.join(item.category.local_root());
        if relative.is_empty() {
            return Ok(path);
        }
        for segment in relative.split('/') {
            match segment {
                "" => return Err(invalid(item, "contains an empty segment".to_string())),
                "." | ".." => {
                    return Err(invalid(item, format!("contains a {segment:?} segment")));
                }
                segment => path.push(segment),
            }
        }
        Ok(path)
    }
}

fn invalid(item: &WorkItem, reason: String) -> Error {
    Error::InvalidKey {
        key: item.key.clone(),
        reason,
    }
}
