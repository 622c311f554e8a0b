//! Remote prefix planning and dataset preconditions.
//!
//! Bucket layout for a docket `D` of agency `A`:
//!
//! ```text
//! raw-data/A/D/                 docket root
//! raw-data/A/D/text-D/          text root (docket/, documents/, comments/)
//! raw-data/A/D/binary-D/        binary attachments
//! derived-data/A/D/             derived data
//! ```

use crate::error::{Error, PreconditionError, Result};
use crate::store::ObjectStore;
use crate::types::{Category, Dataset};

const RAW_DATA_PREFIX: &str = "raw-data";
const DERIVED_DATA_PREFIX: &str = "derived-data";

/// Remote prefixes of one docket
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocketPrefixes {
    /// `raw-data/<agency>/<docket>/`
    pub docket_root: String,
    /// `raw-data/<agency>/<docket>/text-<docket>/`
    pub text_root: String,
    /// `raw-data/<agency>/<docket>/binary-<docket>/`
    pub binary_root: String,
    /// `derived-data/<agency>/<docket>/`
    pub derived_root: String,
}

impl DocketPrefixes {
    /// Compute the prefixes for a dataset
    pub fn new(dataset: &Dataset) -> Self {
        let Dataset { agency, docket_id } = dataset;
        let docket_root = format!("{RAW_DATA_PREFIX}/{agency}/{docket_id}/");
        Self {
            text_root: format!("{docket_root}text-{docket_id}/"),
            binary_root: format!("{docket_root}binary-{docket_id}/"),
            derived_root: format!("{DERIVED_DATA_PREFIX}/{agency}/{docket_id}/"),
            docket_root,
        }
    }

    /// Prefix enumerated to find a category's objects
    pub fn listing_prefix(&self, category: Category) -> String {
        match category {
            Category::Docket | Category::Documents | Category::Comments => {
                format!("{}{}/", self.text_root, category.as_str())
            }
            Category::Derived => self.derived_root.clone(),
            Category::Binary => self.binary_root.clone(),
        }
    }

    /// Prefix stripped from a key to get its path below the local root
    ///
    /// Text categories keep their `docket/`, `documents/`, `comments/`
    /// folder; binary keeps its `binary-<docket>/` folder.
    pub fn base_prefix(&self, category: Category) -> &str {
        match category {
            Category::Docket | Category::Documents | Category::Comments => &self.text_root,
            Category::Derived => &self.derived_root,
            Category::Binary => &self.docket_root,
        }
    }
}

/// Validated set of categories to download
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadPlan {
    /// Dataset being downloaded
    pub dataset: Dataset,
    /// Its remote prefixes
    pub prefixes: DocketPrefixes,
    /// Categories to enumerate, in queue order
    pub categories: Vec<Category>,
}

impl DownloadPlan {
    /// Whether binary attachments are part of this run
    pub fn includes_binary(&self) -> bool {
        self.categories.contains(&Category::Binary)
    }
}

/// Verify the docket exists and decide which categories to download.
///
/// The docket root, the text root, and the derived root must each hold at
/// least one key. Binary attachments are included only when requested and
/// present; a requested-but-absent binary tree is silently dropped.
///
/// # Arguments
///
/// * `store` - Store holding the docket
/// * `dataset` - Agency and docket to plan for
/// * `include_binary` - Whether binary attachments were requested
///
/// # Errors
///
/// Returns a [`PreconditionError`](crate::error::PreconditionError) naming the
/// first missing tree, checked in order docket, text, derived. A store
/// failure during a check is returned as [`Error::Listing`](crate::error::Error::Listing).
pub async fn plan(
    store: &dyn ObjectStore,
    dataset: &Dataset,
    include_binary: bool,
) -> Result<DownloadPlan> {
    let prefixes = DocketPrefixes::new(dataset);

    require(store, &prefixes.docket_root, || {
        PreconditionError::DocketNotFound {
            agency: dataset.agency.clone(),
            docket_id: dataset.docket_id.clone(),
        }
    })
    .await?;
    require(store, &prefixes.text_root, || PreconditionError::TextDataNotFound {
        docket_id: dataset.docket_id.clone(),
    })
    .await?;
    require(store, &prefixes.derived_root, || {
        PreconditionError::DerivedDataNotFound {
            docket_id: dataset.docket_id.clone(),
        }
    })
    .await?;

    let mut categories = vec![
        Category::Docket,
        Category::Documents,
        Category::Comments,
        Category::Derived,
    ];
    if include_binary {
        if exists(store, &prefixes.binary_root).await? {
            categories.push(Category::Binary);
        } else {
            tracing::info!(
                docket_id = %dataset.docket_id,
                prefix = %prefixes.binary_root,
                "No binary data for docket, skipping attachments"
            );
        }
    }

    tracing::debug!(
        docket_id = %dataset.docket_id,
        categories = ?categories,
        "Download plan ready"
    );

    Ok(DownloadPlan {
        dataset: dataset.clone(),
        prefixes,
        categories,
    })
}

async fn require(
    store: &dyn ObjectStore,
    prefix: &str,
    missing: impl FnOnce() -> PreconditionError,
) -> Result<()> {
    if exists(store, prefix).await? {
        Ok(())
    } else {
        Err(missing().into())
    }
}

async fn exists(store: &dyn ObjectStore, prefix: &str) -> Result<bool> {
    store.exists(prefix).await.map_err(|source| Error::Listing {
        prefix: prefix.to_string(),
        source,
    })
}
