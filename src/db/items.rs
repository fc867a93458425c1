//! Item record CRUD operations and missing-item computation.

use std::collections::HashSet;
use std::path::Path;

use crate::error::DatabaseError;
use crate::types::{CollectionId, ItemId};
use crate::{Error, Result};

use super::{Database, ItemRecord, ItemRow};

impl Database {
    /// IDs of every item recorded as downloaded for a collection
    pub async fn get_downloaded_item_ids(
        &self,
        collection_id: CollectionId,
    ) -> Result<HashSet<ItemId>> {
        let ids: Vec<ItemId> =
            sqlx::query_scalar("SELECT post_id FROM downloaded_posts WHERE pool_id = ?")
                .bind(collection_id)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to get downloaded posts: {}",
                        e
                    )))
                })?;

        Ok(ids.into_iter().collect())
    }

    /// Record that an item's file has been written
    ///
    /// Replaces any previous record for the same (item, collection) pair.
    /// Must only be called once the file is completely on disk.
    pub async fn mark_item_downloaded(
        &self,
        item_id: ItemId,
        collection_id: CollectionId,
        file_path: &Path,
        position: usize,
    ) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let stored = self.to_stored_path(file_path).await;

        sqlx::query(
            r#"
            INSERT INTO downloaded_posts (post_id, pool_id, file_path, position, downloaded_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(post_id, pool_id) DO UPDATE SET
                file_path = excluded.file_path,
                position = excluded.position,
                downloaded_at = excluded.downloaded_at
            "#,
        )
        .bind(item_id)
        .bind(collection_id)
        .bind(&stored)
        .bind(position as i64)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to mark post downloaded: {}",
                e
            )))
        })?;

        tracing::debug!(
            item_id = item_id.0,
            collection_id = collection_id.0,
            file_path = %stored,
            "Item marked as downloaded"
        );
        Ok(())
    }

    /// Items of `all_item_ids` that have no download record
    ///
    /// The result is a set; callers needing collection order must derive it
    /// from `all_item_ids`.
    pub async fn missing_items(
        &self,
        collection_id: CollectionId,
        all_item_ids: &[ItemId],
    ) -> Result<HashSet<ItemId>> {
        let downloaded = self.get_downloaded_item_ids(collection_id).await?;
        Ok(all_item_ids
            .iter()
            .filter(|id| !downloaded.contains(id))
            .copied()
            .collect())
    }

    /// Every item record of a collection, ordered by position
    pub async fn list_items(&self, collection_id: CollectionId) -> Result<Vec<ItemRecord>> {
        let rows = sqlx::query_as::<_, ItemRow>(
            r#"
            SELECT post_id, pool_id, file_path, position, downloaded_at
            FROM downloaded_posts
            WHERE pool_id = ?
            ORDER BY position ASC, post_id ASC
            "#,
        )
        .bind(collection_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list downloaded posts: {}",
                e
            )))
        })?;

        Ok(rows.into_iter().map(|row| self.item_from_row(row)).collect())
    }

    /// Delete the record of one item; returns false if there was none
    pub async fn remove_item(&self, item_id: ItemId, collection_id: CollectionId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM downloaded_posts WHERE post_id = ? AND pool_id = ?")
            .bind(item_id)
            .bind(collection_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to remove downloaded post: {}",
                    e
                )))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
