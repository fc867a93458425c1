//! Drivers that run the collection protocol over many collections.

use crate::error::Result;
use crate::types::{CollectionId, CollectionOutcome, UpdateCheck};

use super::Downloader;

impl Downloader {
    /// Download collections one after another
    ///
    /// A collection that errors is reported as [`CollectionOutcome::Failed`]
    /// and the batch moves on. Once shutdown is requested no further
    /// collections are started.
    pub async fn download_collections(
        &self,
        ids: &[CollectionId],
    ) -> Vec<(CollectionId, CollectionOutcome)> {
        let mut results = Vec::with_capacity(ids.len());

        for &id in ids {
            if self.is_shutting_down() {
                tracing::warn!(
                    remaining = ids.len() - results.len(),
                    "Shutdown requested, not starting remaining collections"
                );
                break;
            }

            let outcome = match self.download_collection(id).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    tracing::error!(
                        collection_id = id.0,
                        error = %e,
                        error_code = e.error_code(),
                        "Collection failed"
                    );
                    CollectionOutcome::Failed(e.to_string())
                }
            };
            results.push((id, outcome));
        }

        results
    }

    /// Check every collection in the ledger for updates
    ///
    /// Collections that can no longer be fetched are left out.
    pub async fn check_all_for_updates(&self) -> Result<Vec<UpdateCheck>> {
        let records = self.db.list_all_collections().await?;
        let mut checks = Vec::with_capacity(records.len());

        for record in records {
            match self.check_for_updates(record.id).await {
                Ok(Some(check)) => checks.push(check),
                Ok(None) => {}
                Err(e) if e.class() == crate::error::ErrorClass::Cancelled => return Err(e),
                Err(e) => {
                    tracing::warn!(collection_id = record.id.0, error = %e, "Update check failed");
                }
            }
        }

        Ok(checks)
    }

    /// Download every ledger collection whose live item count grew
    pub async fn update_all(&self) -> Result<Vec<(CollectionId, CollectionOutcome)>> {
        let updated: Vec<CollectionId> = self
            .check_all_for_updates()
            .await?
            .into_iter()
            .filter(|check| check.has_updates)
            .map(|check| check.collection_id)
            .collect();

        tracing::info!(collections = updated.len(), "Collections with updates");
        Ok(self.download_collections(&updated).await)
    }
}
