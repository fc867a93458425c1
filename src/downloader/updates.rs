//! Update detection against the live collection.

use crate::error::Result;
use crate::types::{CollectionId, UpdateCheck};

use super::Downloader;

impl Downloader {
    /// Compare a collection's live item count with the ledger
    ///
    /// Never modifies the ledger. Returns `Ok(None)` when the live metadata
    /// cannot be fetched. A collection with no ledger record always has
    /// updates (stored count 0).
    pub async fn check_for_updates(&self, id: CollectionId) -> Result<Option<UpdateCheck>> {
        let Some(live) = self.fetch_collection(id).await? else {
            tracing::warn!(collection_id = id.0, "Collection not found, cannot check for updates");
            return Ok(None);
        };

        let stored = self.db.get_collection(id).await?;
        let old_count = stored.as_ref().map_or(0, |record| record.item_count);
        let new_count = live.item_count;

        let has_updates = stored.is_none() || new_count > old_count;
        let new_item_count = if has_updates {
            self.db.missing_items(id, &live.item_ids).await?.len()
        } else {
            0
        };

        if has_updates {
            tracing::info!(
                collection_id = id.0,
                old_count,
                new_count,
                new_item_count,
                "Collection has updates"
            );
        } else {
            tracing::debug!(collection_id = id.0, count = new_count, "Collection is up to date");
        }

        Ok(Some(UpdateCheck {
            collection_id: id,
            has_updates,
            old_count,
            new_count,
            new_item_count,
        }))
    }
}
