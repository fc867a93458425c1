//! Ledger/filesystem reconciliation
//!
//! Before planning which items of a collection still need downloading, the
//! ledger is checked against the collection directory:
//! - a record whose file is gone is deleted, so the item is planned again
//! - a file with no record ("orphan") is counted and logged, nothing more
//!
//! Orphans are reported only. The ledger is not modified for them and they
//! do not influence the work set.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::db::Database;
use crate::error::Result;
use crate::types::{CollectionId, ItemId};
use crate::utils::SHORTCUT_EXTENSION;

/// Outcome of verifying one collection
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VerifyReport {
    /// Items whose record was deleted because the file was missing
    pub removed: HashSet<ItemId>,
    /// Files in the collection directory with no matching record
    pub orphaned: Vec<PathBuf>,
    /// Records whose file was found
    pub intact: usize,
}

/// Reconcile the ledger rows of `collection_id` with the filesystem
pub async fn verify_collection(db: &Database, collection_id: CollectionId) -> Result<VerifyReport> {
    let Some(collection) = db.get_collection(collection_id).await? else {
        tracing::warn!(
            collection_id = collection_id.0,
            "Collection not in ledger, cannot verify files"
        );
        return Ok(VerifyReport::default());
    };

    let records = db.list_items(collection_id).await?;
    tracing::info!(
        collection_id = collection_id.0,
        records = records.len(),
        folder = %collection.folder_path.display(),
        "Checking ledger records against filesystem"
    );

    let mut report = VerifyReport::default();
    let mut known = HashSet::new();

    for record in records {
        if tokio::fs::try_exists(&record.file_path).await? {
            known.insert(case_folded(&resolve(&record.file_path).await));
            report.intact += 1;
        } else {
            db.remove_item(record.item_id, collection_id).await?;
            tracing::info!(
                collection_id = collection_id.0,
                item_id = record.item_id.0,
                expected = %record.file_path.display(),
                "Removed record of missing file"
            );
            report.removed.insert(record.item_id);
        }
    }

    report.orphaned = find_orphans(&collection.folder_path, &known).await?;

    if report.removed.is_empty() {
        tracing::info!(
            collection_id = collection_id.0,
            records = report.intact,
            "All ledger records have corresponding files"
        );
    } else {
        tracing::info!(
            collection_id = collection_id.0,
            removed = report.removed.len(),
            "Ledger cleanup complete"
        );
    }
    if !report.orphaned.is_empty() {
        tracing::info!(
            collection_id = collection_id.0,
            orphaned = report.orphaned.len(),
            "Found files that exist but are not tracked in the ledger"
        );
    }

    Ok(report)
}

/// Regular files in `folder` whose case-folded path is not in `known`
async fn find_orphans(folder: &Path, known: &HashSet<String>) -> Result<Vec<PathBuf>> {
    let mut orphans = Vec::new();
    if !tokio::fs::try_exists(folder).await? {
        return Ok(orphans);
    }

    let mut entries = tokio::fs::read_dir(folder).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let path = entry.path();
        let is_shortcut = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(SHORTCUT_EXTENSION));
        if is_shortcut {
            continue;
        }
        if !known.contains(&case_folded(&resolve(&path).await)) {
            tracing::info!(file = %path.display(), "Found orphaned file");
            orphans.push(path);
        }
    }

    orphans.sort();
    Ok(orphans)
}

async fn resolve(path: &Path) -> PathBuf {
    tokio::fs::canonicalize(path)
        .await
        .unwrap_or_else(|_| path.to_path_buf())
}

fn case_folded(path: &Path) -> String {
    path.to_string_lossy().to_lowercase()
}
