//! Per-collection download protocol.

use std::collections::HashSet;
use std::path::PathBuf;

use crate::db::NewCollection;
use crate::error::{Error, Result};
use crate::types::{
    Collection, CollectionId, CollectionOutcome, DownloadSummary, Event, ItemId, ItemOutcome,
    SkipReason,
};
use crate::utils::{collection_url, create_collection_dir, create_internet_shortcut};
use crate::verifier::verify_collection;

use super::Downloader;

/// Reason reported when the first item's metadata cannot be fetched
pub(crate) const FIRST_ITEM_UNREACHABLE: &str = "first item unreachable";

impl Downloader {
    /// Download every item of a collection that is not yet on disk
    ///
    /// Returns `Skipped` for unknown or empty collections and `Failed` when
    /// the first item (needed for attribution) cannot be fetched. Per-item
    /// failures do not fail the collection; they are listed in the
    /// [`DownloadSummary`].
    ///
    /// # Errors
    ///
    /// Ledger errors, malformed metadata, filesystem errors while preparing
    /// the directory, and shutdown abort the collection.
    pub async fn download_collection(&self, id: CollectionId) -> Result<CollectionOutcome> {
        let outcome = self.run_collection(id).await;

        let (downloaded, failed) = match &outcome {
            Ok(CollectionOutcome::Completed(summary)) => {
                (summary.downloaded.len(), summary.failed.len())
            }
            _ => (0, 0),
        };
        self.emit_event(Event::CollectionFinished {
            id,
            downloaded,
            failed,
        });

        outcome
    }

    async fn run_collection(&self, id: CollectionId) -> Result<CollectionOutcome> {
        tracing::info!(collection_id = id.0, "Processing collection");

        let Some(collection) = self.fetch_collection(id).await? else {
            tracing::warn!(collection_id = id.0, "Collection not found, skipping");
            return Ok(CollectionOutcome::Skipped(SkipReason::NotFound));
        };

        let Some(&first_id) = collection.item_ids.first() else {
            tracing::warn!(collection_id = id.0, name = %collection.name, "Collection has no items, skipping");
            return Ok(CollectionOutcome::Skipped(SkipReason::Empty));
        };

        let Some(first_item) = self.fetch_item(first_id).await? else {
            tracing::error!(
                collection_id = id.0,
                item_id = first_id.0,
                "Could not fetch first item, cannot determine artist"
            );
            return Ok(CollectionOutcome::Failed(FIRST_ITEM_UNREACHABLE.to_string()));
        };
        let artist = first_item.attribution();

        let directory = self.resolve_directory(&collection, &artist).await?;

        self.db
            .save_collection(&NewCollection {
                id,
                name: collection.name.clone(),
                artist: Some(artist.clone()),
                folder_path: directory.clone(),
                item_count: collection.item_count,
            })
            .await?;

        let (work, healed) = self.plan(&collection).await?;

        let mut summary = DownloadSummary {
            collection_id: id,
            name: collection.name.clone(),
            directory: directory.clone(),
            downloaded: Vec::new(),
            failed: Vec::new(),
            healed,
        };

        if work.is_empty() {
            tracing::info!(
                collection_id = id.0,
                name = %collection.name,
                "All items already downloaded"
            );
            return Ok(CollectionOutcome::Completed(summary));
        }

        tracing::info!(
            collection_id = id.0,
            name = %collection.name,
            artist = %artist,
            planned = work.len(),
            total = collection.item_ids.len(),
            "Downloading items"
        );
        self.emit_event(Event::CollectionStarted {
            id,
            name: collection.name.clone(),
            planned: work.len(),
        });

        for outcome in self.download_items(id, &directory, work).await? {
            match outcome {
                ItemOutcome::Downloaded(item_id) => summary.downloaded.push(item_id),
                ItemOutcome::Failed(item_id) => summary.failed.push(item_id),
            }
        }

        tracing::info!(
            collection_id = id.0,
            downloaded = summary.downloaded.len(),
            failed = summary.failed.len(),
            "Collection complete"
        );
        Ok(CollectionOutcome::Completed(summary))
    }

    /// Reuse the recorded directory if it still exists, otherwise create one
    async fn resolve_directory(&self, collection: &Collection, artist: &str) -> Result<PathBuf> {
        if let Some(record) = self.db.get_collection(collection.id).await? {
            let exists = tokio::fs::try_exists(&record.folder_path)
                .await
                .map_err(|e| Error::filesystem(&record.folder_path, e))?;
            if exists {
                tracing::info!(
                    collection_id = collection.id.0,
                    path = %record.folder_path.display(),
                    "Using existing directory"
                );
                return Ok(record.folder_path);
            }
            tracing::warn!(
                collection_id = collection.id.0,
                path = %record.folder_path.display(),
                "Recorded directory no longer exists, creating a new one"
            );
        }

        let directory = create_collection_dir(self.db.base_dir(), &collection.name, artist).await?;
        let url = collection_url(&self.config.api.base_url, collection.id);
        create_internet_shortcut(&url, &directory).await?;
        Ok(directory)
    }

    /// Items to dispatch as `(position, id)` in collection order, plus the
    /// number of stale records healed by verification
    async fn plan(&self, collection: &Collection) -> Result<(Vec<(usize, ItemId)>, usize)> {
        let ordered = first_occurrences(&collection.item_ids);

        if !self.config.download.skip_existing {
            tracing::info!(collection_id = collection.id.0, "Force mode, planning every item");
            return Ok((ordered, 0));
        }

        let report = verify_collection(&self.db, collection.id).await?;
        let missing = self
            .db
            .missing_items(collection.id, &collection.item_ids)
            .await?;

        let work = ordered
            .into_iter()
            .filter(|(_, item_id)| missing.contains(item_id))
            .collect();
        Ok((work, report.removed.len()))
    }
}

/// Pair each distinct ID with the index of its first occurrence
fn first_occurrences(item_ids: &[ItemId]) -> Vec<(usize, ItemId)> {
    let mut seen = HashSet::new();
    item_ids
        .iter()
        .enumerate()
        .filter(|(_, id)| seen.insert(**id))
        .map(|(position, id)| (position, *id))
        .collect()
}
