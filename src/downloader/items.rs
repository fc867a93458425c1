//! Concurrent item dispatch.
//!
//! Items of one collection run through `buffer_unordered`, bounded by
//! `download.max_concurrent_items`. Metadata fetches still pass the shared
//! rate limiter one at a time; payload writes overlap freely.

use std::path::{Path, PathBuf};

use futures::stream::{self, StreamExt};

use crate::error::{Error, ErrorClass, Result};
use crate::types::{CollectionId, Event, ItemId, ItemOutcome};

use super::Downloader;

impl Downloader {
    /// Dispatch every `(position, id)` of `work` and collect the outcomes
    ///
    /// Item failures are reported as [`ItemOutcome::Failed`]. A ledger error
    /// or a malformed item document fails the whole collection, but only once
    /// every dispatched item has settled.
    pub(super) async fn download_items(
        &self,
        collection_id: CollectionId,
        directory: &Path,
        work: Vec<(usize, ItemId)>,
    ) -> Result<Vec<ItemOutcome>> {
        let concurrency = self.config.download.max_concurrent_items.max(1);

        let results: Vec<Result<ItemOutcome>> = stream::iter(work)
            .map(|(position, item_id)| self.download_item(collection_id, item_id, position, directory))
            .buffer_unordered(concurrency)
            .collect()
            .await;

        results.into_iter().collect()
    }

    async fn download_item(
        &self,
        collection_id: CollectionId,
        item_id: ItemId,
        position: usize,
        directory: &Path,
    ) -> Result<ItemOutcome> {
        match self.write_item(collection_id, item_id, position, directory).await {
            Ok(path) => {
                self.emit_event(Event::ItemDownloaded {
                    collection_id,
                    item_id,
                    path,
                });
                Ok(ItemOutcome::Downloaded(item_id))
            }
            Err(e) if matches!(e.class(), ErrorClass::Store | ErrorClass::DataShape) => {
                tracing::error!(
                    collection_id = collection_id.0,
                    item_id = item_id.0,
                    error = %e,
                    "Item error aborts collection"
                );
                Err(e)
            }
            Err(e) => {
                tracing::warn!(
                    collection_id = collection_id.0,
                    item_id = item_id.0,
                    position,
                    error = %e,
                    "Item failed"
                );
                self.emit_event(Event::ItemFailed {
                    collection_id,
                    item_id,
                    error: e.to_string(),
                });
                Ok(ItemOutcome::Failed(item_id))
            }
        }
    }

    /// Fetch, write and record one item; the record is only made after the
    /// payload is on disk
    async fn write_item(
        &self,
        collection_id: CollectionId,
        item_id: ItemId,
        position: usize,
        directory: &Path,
    ) -> Result<PathBuf> {
        let item = self
            .fetch_item(item_id)
            .await?
            .ok_or_else(|| Error::ItemUnavailable {
                id: item_id.0,
                reason: "metadata unavailable".to_string(),
            })?;

        let path = self
            .writer
            .write(&item, position, directory, &self.cancel)
            .await?;
        self.db
            .mark_item_downloaded(item_id, collection_id, &path, position)
            .await?;
        Ok(path)
    }
}
