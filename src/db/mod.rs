//! Download ledger for pool-dl
//!
//! Handles SQLite persistence of collection records and per-item download
//! records. The ledger is the single source of truth for what has already
//! been downloaded.
//!
//! ## Submodules
//!
//! Methods on [`Database`] are organized by domain:
//! - [`migrations`] — Database lifecycle, schema migrations
//! - [`paths`] — Conversion between stored (base-relative) and absolute paths
//! - [`collections`] — Collection record CRUD
//! - [`items`] — Item record CRUD and missing-item computation
//!
//! Every path handed to the ledger is stored relative to the base download
//! directory when it lies underneath it; every path handed back is absolute.
//! Callers never see the stored strings.
//!
//! Rows are last-write-wins: a second write for the same key replaces the
//! first without any merge or version check.

use crate::types::{CollectionId, ItemId};
use sqlx::{FromRow, sqlite::SqlitePool};
use std::path::PathBuf;

mod collections;
mod items;
mod migrations;
mod paths;

/// Collection record to be saved into the ledger
#[derive(Debug, Clone)]
pub struct NewCollection {
    /// Collection ID
    pub id: CollectionId,
    /// Display name
    pub name: String,
    /// Derived attribution (directory owner)
    pub artist: Option<String>,
    /// Directory holding the collection's files
    pub folder_path: PathBuf,
    /// Item count at the time of saving
    pub item_count: i64,
}

/// Collection record read from the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionRecord {
    /// Collection ID
    pub id: CollectionId,
    /// Display name
    pub name: String,
    /// Derived attribution (directory owner)
    pub artist: Option<String>,
    /// Absolute directory holding the collection's files
    pub folder_path: PathBuf,
    /// Item count stored at the last save
    pub item_count: i64,
    /// Unix timestamp (milliseconds) of the last save
    pub last_updated: i64,
}

/// Item record read from the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemRecord {
    /// Item ID
    pub item_id: ItemId,
    /// Collection the item was downloaded for
    pub collection_id: CollectionId,
    /// Absolute path of the written file
    pub file_path: PathBuf,
    /// Zero-based position within the collection at download time
    pub position: i64,
    /// Unix timestamp (milliseconds) of the download
    pub downloaded_at: i64,
}

/// Collection row as stored (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
struct CollectionRow {
    id: CollectionId,
    name: String,
    artist: Option<String>,
    folder_path: String,
    post_count: i64,
    last_updated: i64,
}

/// Item row as stored (raw from SQLite)
#[derive(Debug, Clone, FromRow)]
struct ItemRow {
    post_id: ItemId,
    pool_id: CollectionId,
    file_path: String,
    position: i64,
    downloaded_at: i64,
}

/// Ledger handle for pool-dl
pub struct Database {
    pool: SqlitePool,
    /// Canonical base download directory
    base_dir: PathBuf,
}

impl Database {
    fn collection_from_row(&self, row: CollectionRow) -> CollectionRecord {
        CollectionRecord {
            id: row.id,
            name: row.name,
            artist: row.artist,
            folder_path: self.to_absolute_path(&row.folder_path),
            item_count: row.post_count,
            last_updated: row.last_updated,
        }
    }

    fn item_from_row(&self, row: ItemRow) -> ItemRecord {
        ItemRecord {
            item_id: row.post_id,
            collection_id: row.pool_id,
            file_path: self.to_absolute_path(&row.file_path),
            position: row.position,
            downloaded_at: row.downloaded_at,
        }
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;
