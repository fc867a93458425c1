use crate::db::*;
use crate::types::CollectionId;
use std::path::PathBuf;
use tempfile::TempDir;


/// Ledger in a fresh temp directory; base directory is `<tmp>/downloads`.
/// The TempDir must be kept alive for the duration of the test.
async fn test_db() -> (Database, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::new(
        &temp_dir.path().join("ledger.db"),
        &temp_dir.path().join("downloads"),
    )
    .await
    .unwrap();
    (db, temp_dir)
}

/// Collection record whose folder lives under the ledger's base directory
fn new_collection(db: &Database, id: i64, name: &str) -> NewCollection {
    NewCollection {
        id: CollectionId(id),
        name: name.to_string(),
        artist: Some("artistA".to_string()),
        folder_path: collection_dir(db, name),
        item_count: 3,
    }
}

fn collection_dir(db: &Database, name: &str) -> PathBuf {
    let dir = db.base_dir().join(format!("{} by artistA", name));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}
