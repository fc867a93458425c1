//! End-to-end download runs against a mocked API and payload host.

mod common;

use common::{config_for, mount_pool, mount_post, payload, request_count};
use pool_dl::{CollectionId, CollectionOutcome, Downloader, ItemId, SkipReason};
use wiremock::MockServer;

const POOL: CollectionId = CollectionId(5);

async fn serve_sample_pool(server: &MockServer) {
    mount_pool(server, POOL.0, "Sample_Pool", &[101, 102, 103]).await;
    for id in [101, 102, 103] {
        mount_post(server, id, &["artistA"]).await;
    }
}

#[tokio::test]
async fn second_run_downloads_nothing() {
    let server = MockServer::start().await;
    serve_sample_pool(&server).await;
    let root = tempfile::tempdir().unwrap();
    let downloader = Downloader::new(config_for(&server, root.path()))
        .await
        .unwrap();

    let first = downloader.download_collections(&[POOL]).await;
    let CollectionOutcome::Completed(summary) = &first[0].1 else {
        panic!("first run did not complete: {:?}", first);
    };
    assert_eq!(summary.downloaded.len(), 3);
    assert!(summary.directory.ends_with("Sample Pool by artistA"));
    for (ordinal, id) in [(1, 101), (2, 102), (3, 103)] {
        let bytes = std::fs::read(summary.directory.join(format!("{}.jpg", ordinal))).unwrap();
        assert_eq!(bytes, payload(id));
    }
    assert_eq!(request_count(&server, "/posts/").await, 4);
    assert_eq!(request_count(&server, "/data/").await, 3);

    let second = downloader.download_collections(&[POOL]).await;
    let CollectionOutcome::Completed(again) = &second[0].1 else {
        panic!("second run did not complete: {:?}", second);
    };
    assert!(again.downloaded.is_empty());
    assert_eq!(again.directory, summary.directory);
    // only the attribution lookup of the first item
    assert_eq!(request_count(&server, "/posts/").await, 5);
    assert_eq!(request_count(&server, "/data/").await, 3);

    downloader.db.close().await;
}

#[tokio::test]
async fn relocated_tree_is_still_recognised() {
    let server = MockServer::start().await;
    serve_sample_pool(&server).await;
    let root = tempfile::tempdir().unwrap();
    let original = root.path().join("original");
    let moved = root.path().join("moved");

    let downloader = Downloader::new(config_for(&server, &original))
        .await
        .unwrap();
    downloader.download_collections(&[POOL]).await;
    downloader.db.close().await;
    drop(downloader);

    std::fs::rename(&original, &moved).unwrap();

    let downloader = Downloader::new(config_for(&server, &moved)).await.unwrap();
    let record = downloader.db.get_collection(POOL).await.unwrap().unwrap();
    assert!(record.folder_path.starts_with(downloader.db.base_dir()));

    let results = downloader.download_collections(&[POOL]).await;
    let CollectionOutcome::Completed(summary) = &results[0].1 else {
        panic!("run after move did not complete: {:?}", results);
    };
    assert!(summary.downloaded.is_empty());
    assert_eq!(summary.healed, 0);
    assert_eq!(request_count(&server, "/data/").await, 3);

    downloader.db.close().await;
}

#[tokio::test]
async fn missing_file_is_fetched_again() {
    let server = MockServer::start().await;
    serve_sample_pool(&server).await;
    let root = tempfile::tempdir().unwrap();
    let downloader = Downloader::new(config_for(&server, root.path()))
        .await
        .unwrap();

    let first = downloader.download_collections(&[POOL]).await;
    let CollectionOutcome::Completed(summary) = &first[0].1 else {
        panic!("first run did not complete: {:?}", first);
    };
    std::fs::remove_file(summary.directory.join("3.jpg")).unwrap();

    let second = downloader.download_collections(&[POOL]).await;
    let CollectionOutcome::Completed(again) = &second[0].1 else {
        panic!("second run did not complete: {:?}", second);
    };
    assert_eq!(again.downloaded, vec![ItemId(103)]);
    assert_eq!(again.healed, 1);
    assert_eq!(
        std::fs::read(summary.directory.join("3.jpg")).unwrap(),
        payload(103)
    );
    assert_eq!(request_count(&server, "/data/").await, 4);

    downloader.db.close().await;
}

#[tokio::test]
async fn unknown_pool_is_skipped() {
    let server = MockServer::start().await;
    let root = tempfile::tempdir().unwrap();
    let downloader = Downloader::new(config_for(&server, root.path()))
        .await
        .unwrap();

    let results = downloader.download_collections(&[CollectionId(404)]).await;

    assert_eq!(
        results,
        vec![(
            CollectionId(404),
            CollectionOutcome::Skipped(SkipReason::NotFound)
        )]
    );

    downloader.db.close().await;
}
