use super::*;
use crate::types::{ItemId, UpdateCheck};

const POOL: CollectionId = CollectionId(7);

fn ids(range: std::ops::RangeInclusive<i64>) -> Vec<i64> {
    range.collect()
}

#[tokio::test]
async fn unknown_collection_has_updates_for_every_item() {
    let api = FakeApi::new();
    api.add_pool(POOL.0, "Pool", &ids(1..=4), &["artistA"]);
    let (downloader, _temp_dir) = create_test_downloader(api, FakeWriter::new()).await;

    let check = downloader.check_for_updates(POOL).await.unwrap().unwrap();

    assert_eq!(
        check,
        UpdateCheck {
            collection_id: POOL,
            has_updates: true,
            old_count: 0,
            new_count: 4,
            new_item_count: 4,
        }
    );
    assert!(downloader.db.get_collection(POOL).await.unwrap().is_none());

    downloader.db.close().await;
}

#[tokio::test]
async fn grown_collection_reports_items_missing_from_ledger() {
    let api = FakeApi::new();
    api.add_pool(POOL.0, "Pool", &ids(1..=10), &["artistA"]);
    let writer = FakeWriter::new();
    writer.fail_item(3);
    let (downloader, _temp_dir) = create_test_downloader(api.clone(), writer).await;
    completed(downloader.download_collection(POOL).await.unwrap());

    api.add_pool(POOL.0, "Pool", &ids(1..=12), &["artistA"]);
    let check = downloader.check_for_updates(POOL).await.unwrap().unwrap();

    assert!(check.has_updates);
    assert_eq!(check.old_count, 10);
    assert_eq!(check.new_count, 12);
    // 11 and 12 are new, 3 never made it into the ledger
    assert_eq!(check.new_item_count, 3);

    downloader.db.close().await;
}

#[tokio::test]
async fn unchanged_or_shrunk_collection_has_no_updates() {
    let api = FakeApi::new();
    api.add_pool(POOL.0, "Pool", &ids(1..=5), &["artistA"]);
    let (downloader, _temp_dir) = create_test_downloader(api.clone(), FakeWriter::new()).await;
    completed(downloader.download_collection(POOL).await.unwrap());

    let same = downloader.check_for_updates(POOL).await.unwrap().unwrap();
    assert!(!same.has_updates);
    assert_eq!(same.new_item_count, 0);

    api.add_pool(POOL.0, "Pool", &ids(1..=3), &["artistA"]);
    let shrunk = downloader.check_for_updates(POOL).await.unwrap().unwrap();
    assert!(!shrunk.has_updates);
    assert_eq!(shrunk.old_count, 5);
    assert_eq!(shrunk.new_count, 3);

    downloader.db.close().await;
}

#[tokio::test]
async fn check_leaves_ledger_untouched() {
    let api = FakeApi::new();
    api.add_pool(POOL.0, "Pool", &ids(1..=3), &["artistA"]);
    let (downloader, _temp_dir) = create_test_downloader(api.clone(), FakeWriter::new()).await;
    let summary = completed(downloader.download_collection(POOL).await.unwrap());
    std::fs::remove_file(summary.directory.join("1.png")).unwrap();
    let before = downloader.db.get_collection(POOL).await.unwrap().unwrap();

    api.add_pool(POOL.0, "Pool", &ids(1..=6), &["artistA"]);
    api.clear_requests();
    downloader.check_for_updates(POOL).await.unwrap().unwrap();

    let after = downloader.db.get_collection(POOL).await.unwrap().unwrap();
    assert_eq!(before, after);
    assert!(
        downloader
            .db
            .get_downloaded_item_ids(POOL)
            .await
            .unwrap()
            .contains(&ItemId(1))
    );
    assert!(api.post_requests().is_empty());

    downloader.db.close().await;
}

#[tokio::test]
async fn unreachable_collection_cannot_be_checked() {
    let (downloader, _temp_dir) = create_test_downloader(FakeApi::new(), FakeWriter::new()).await;

    assert_eq!(downloader.check_for_updates(POOL).await.unwrap(), None);

    downloader.db.close().await;
}
