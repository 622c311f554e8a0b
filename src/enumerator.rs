//! Up-front enumeration of every object to download.

use futures::StreamExt;

use crate::error::{Error, Result};
use crate::planner::DownloadPlan;
use crate::progress::Console;
use crate::store::ObjectStore;
use crate::types::{Category, WorkItem};

/// List every key under `prefix`, page by page.
///
/// Keys come back in store order, without reordering or deduplication.
/// With a `label`, the running count is redrawn after each page and a final
/// `"<label>: <count>"` line is written when the listing is exhausted.
///
/// # Arguments
///
/// * `store` - Store to list
/// * `prefix` - Key prefix, usually ending in `/`
/// * `label` - Category whose running count is shown, or `None` to list silently
/// * `console` - Where the count line is drawn
///
/// # Errors
///
/// Returns [`Error::Listing`] for the first page the store fails to deliver.
pub async fn list_keys(
    store: &dyn ObjectStore,
    prefix: &str,
    label: Option<Category>,
    console: &Console,
) -> Result<Vec<String>> {
    let mut keys = Vec::new();
    let mut pages = 0usize;

    let mut listing = store.list_pages(prefix);
    while let Some(page) = listing.next().await {
        let page = page.map_err(|source| Error::Listing {
            prefix: prefix.to_string(),
            source,
        })?;
        pages += 1;
        keys.extend(page);

        if let Some(label) = label {
            console.carriage(&format!("{}: {}", label, keys.len()));
        }
    }

    if let Some(label) = label {
        console.line(&format!("{}: {}", label, keys.len()));
    }

    tracing::debug!(prefix, pages, count = keys.len(), "Listing complete");

    Ok(keys)
}

/// Keys listed for each planned category, in plan order
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FileLists {
    lists: Vec<(Category, Vec<String>)>,
}

impl FileLists {
    /// Number of keys listed for a category (0 if it was not planned)
    pub fn count(&self, category: Category) -> u64 {
        self.lists
            .iter()
            .find(|(c, _)| *c == category)
            .map_or(0, |(_, keys)| keys.len() as u64)
    }

    /// Listed totals per planned category
    pub fn totals(&self) -> Vec<(Category, u64)> {
        self.lists
            .iter()
            .map(|(c, keys)| (*c, keys.len() as u64))
            .collect()
    }

    /// Total number of keys across all categories
    pub fn len(&self) -> usize {
        self.lists.iter().map(|(_, keys)| keys.len()).sum()
    }

    /// Whether nothing was listed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Work items in queue order: category by category, keys in store order
    pub fn into_work_items(self) -> Vec<WorkItem> {
        self.lists
            .into_iter()
            .flat_map(|(category, keys)| {
                keys.into_iter().map(move |key| WorkItem { key, category })
            })
            .collect()
    }
}

/// Enumerate every planned category.
///
/// Prints `Preparing download lists...` and then one count line per
/// category, in plan order.
///
/// # Returns
///
/// The listed keys of each planned category.
///
/// # Errors
///
/// Returns [`Error::Listing`] if any category's listing fails; nothing is
/// downloaded in that case.
pub async fn enumerate(
    store: &dyn ObjectStore,
    plan: &DownloadPlan,
    console: &Console,
) -> Result<FileLists> {
    console.line("Preparing download lists...");

    let mut lists = Vec::with_capacity(plan.categories.len());
    for &category in &plan.categories {
        let prefix = plan.prefixes.listing_prefix(category);
        let keys = list_keys(store, &prefix, Some(category), console).await?;
        tracing::info!(category = %category, count = keys.len(), "Enumerated category");
        lists.push((category, keys));
    }

    Ok(FileLists { lists })
}
