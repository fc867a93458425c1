//! Collection record CRUD operations.

use crate::error::DatabaseError;
use crate::types::CollectionId;
use crate::{Error, Result};

use super::{CollectionRecord, CollectionRow, Database, NewCollection};

impl Database {
    /// Get a collection record by ID
    pub async fn get_collection(&self, id: CollectionId) -> Result<Option<CollectionRecord>> {
        let row = sqlx::query_as::<_, CollectionRow>(
            r#"
            SELECT id, name, artist, folder_path, post_count, last_updated
            FROM pools
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get pool: {}",
                e
            )))
        })?;

        Ok(row.map(|row| self.collection_from_row(row)))
    }

    /// Insert or replace a collection record
    ///
    /// Every field is overwritten and the timestamp refreshed.
    pub async fn save_collection(&self, collection: &NewCollection) -> Result<()> {
        let now = chrono::Utc::now().timestamp_millis();
        let folder_path = self.to_stored_path(&collection.folder_path).await;

        sqlx::query(
            r#"
            INSERT INTO pools (id, name, artist, folder_path, post_count, last_updated)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                artist = excluded.artist,
                folder_path = excluded.folder_path,
                post_count = excluded.post_count,
                last_updated = excluded.last_updated
            "#,
        )
        .bind(collection.id)
        .bind(&collection.name)
        .bind(&collection.artist)
        .bind(&folder_path)
        .bind(collection.item_count)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to save pool: {}",
                e
            )))
        })?;

        tracing::debug!(
            collection_id = collection.id.0,
            folder_path = %folder_path,
            "Collection saved to ledger"
        );
        Ok(())
    }

    /// List every collection, most recently updated first
    pub async fn list_all_collections(&self) -> Result<Vec<CollectionRecord>> {
        let rows = sqlx::query_as::<_, CollectionRow>(
            r#"
            SELECT id, name, artist, folder_path, post_count, last_updated
            FROM pools
            ORDER BY last_updated DESC, id DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list pools: {}",
                e
            )))
        })?;

        Ok(rows
            .into_iter()
            .map(|row| self.collection_from_row(row))
            .collect())
    }

    /// Item count stored for a collection (0 if the collection is unknown)
    pub async fn stored_item_count(&self, id: CollectionId) -> Result<i64> {
        let count: Option<i64> = sqlx::query_scalar("SELECT post_count FROM pools WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get pool post count: {}",
                    e
                )))
            })?;

        Ok(count.unwrap_or(0))
    }

    /// Update only the stored item count (and timestamp) of a collection
    ///
    /// Returns false if no record exists for `id`.
    pub async fn update_collection_item_count(
        &self,
        id: CollectionId,
        item_count: i64,
    ) -> Result<bool> {
        let now = chrono::Utc::now().timestamp_millis();
        let result = sqlx::query("UPDATE pools SET post_count = ?, last_updated = ? WHERE id = ?")
            .bind(item_count)
            .bind(now)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to update pool post count: {}",
                    e
                )))
            })?;

        Ok(result.rows_affected() > 0)
    }
}
