//! Shared test helpers: in-memory API and payload writer doubles.

use crate::api::ApiClient;
use crate::config::Config;
use crate::downloader::Downloader;
use crate::error::{Error, Result};
use crate::types::{CollectionId, Item, ItemId};
use crate::writer::{ItemWriter, payload_file_name, payload_url};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

/// Pool document in the shape the API returns
pub(crate) fn pool_json(id: i64, name: &str, post_ids: &[i64]) -> Value {
    json!({
        "id": id,
        "name": name,
        "post_ids": post_ids,
        "creator_name": "creator",
        "post_count": post_ids.len(),
    })
}

/// Post document with a payload URL
pub(crate) fn post_json(id: i64, artists: &[&str]) -> Value {
    json!({
        "post": {
            "id": id,
            "tags": { "artist": artists },
            "flags": { "deleted": false },
            "file": { "url": format!("https://static.test/{}.png", id), "ext": "png" },
        }
    })
}

/// API double serving documents from memory and counting requests
#[derive(Default)]
pub(crate) struct FakeApi {
    pools: Mutex<HashMap<CollectionId, Value>>,
    posts: Mutex<HashMap<ItemId, Value>>,
    pool_requests: Mutex<Vec<CollectionId>>,
    post_requests: Mutex<Vec<ItemId>>,
}

impl FakeApi {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Register a pool and a post document for each of its items
    pub(crate) fn add_pool(&self, id: i64, name: &str, post_ids: &[i64], artists: &[&str]) {
        self.set_pool_document(id, pool_json(id, name, post_ids));
        for &post_id in post_ids {
            self.set_post_document(post_id, post_json(post_id, artists));
        }
    }

    pub(crate) fn set_pool_document(&self, id: i64, document: Value) {
        self.pools
            .lock()
            .unwrap()
            .insert(CollectionId(id), document);
    }

    pub(crate) fn set_post_document(&self, id: i64, document: Value) {
        self.posts.lock().unwrap().insert(ItemId(id), document);
    }

    pub(crate) fn remove_post(&self, id: i64) {
        self.posts.lock().unwrap().remove(&ItemId(id));
    }

    pub(crate) fn pool_requests(&self) -> Vec<CollectionId> {
        self.pool_requests.lock().unwrap().clone()
    }

    pub(crate) fn post_requests(&self) -> Vec<ItemId> {
        self.post_requests.lock().unwrap().clone()
    }

    pub(crate) fn clear_requests(&self) {
        self.pool_requests.lock().unwrap().clear();
        self.post_requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl ApiClient for FakeApi {
    async fn fetch_collection(&self, id: CollectionId) -> Option<Value> {
        self.pool_requests.lock().unwrap().push(id);
        self.pools.lock().unwrap().get(&id).cloned()
    }

    async fn fetch_item(&self, id: ItemId) -> Option<Value> {
        self.post_requests.lock().unwrap().push(id);
        self.posts.lock().unwrap().get(&id).cloned()
    }
}

/// Writer double: writes the item ID as the payload, fails chosen items and
/// holds chosen items until cancellation
#[derive(Default)]
pub(crate) struct FakeWriter {
    failing: Mutex<HashSet<ItemId>>,
    stalling: Mutex<HashSet<ItemId>>,
    stalled: Mutex<Vec<ItemId>>,
    written: Mutex<Vec<(ItemId, usize)>>,
}

impl FakeWriter {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn fail_item(&self, id: i64) {
        self.failing.lock().unwrap().insert(ItemId(id));
    }

    /// Make writes of `id` hang until the downloader shuts down
    pub(crate) fn stall_item(&self, id: i64) {
        self.stalling.lock().unwrap().insert(ItemId(id));
    }

    /// Items currently parked in a stalled write
    pub(crate) fn stalled(&self) -> Vec<ItemId> {
        self.stalled.lock().unwrap().clone()
    }

    /// `(item, position)` of every successful write, in completion order
    pub(crate) fn written(&self) -> Vec<(ItemId, usize)> {
        self.written.lock().unwrap().clone()
    }
}

#[async_trait]
impl ItemWriter for FakeWriter {
    async fn write(
        &self,
        item: &Item,
        position: usize,
        directory: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        payload_url(item)?;
        if self.stalling.lock().unwrap().contains(&item.id) {
            self.stalled.lock().unwrap().push(item.id);
            cancel.cancelled().await;
            return Err(Error::ShuttingDown);
        }
        if self.failing.lock().unwrap().contains(&item.id) {
            return Err(Error::ItemUnavailable {
                id: item.id.0,
                reason: "HTTP 500".to_string(),
            });
        }

        let path = directory.join(payload_file_name(item, position));
        tokio::fs::write(&path, item.id.to_string())
            .await
            .map_err(|e| Error::filesystem(&path, e))?;
        self.written.lock().unwrap().push((item.id, position));
        Ok(path)
    }
}

/// Config rooted in `temp_dir` with no request spacing
pub(crate) fn test_config(temp_dir: &TempDir) -> Config {
    let mut config = Config::default();
    config.api.base_url = "https://e621.test".to_string();
    config.api.request_interval = Duration::ZERO;
    config.download.download_dir = temp_dir.path().join("downloads");
    config.persistence.database_path = temp_dir.path().join("ledger.db");
    config
}

/// Downloader wired to the given doubles. The TempDir must outlive it.
pub(crate) async fn create_test_downloader(
    api: Arc<FakeApi>,
    writer: Arc<FakeWriter>,
) -> (Downloader, TempDir) {
    let temp_dir = tempfile::tempdir().unwrap();
    let downloader = downloader_with_config(test_config(&temp_dir), api, writer).await;
    (downloader, temp_dir)
}

pub(crate) async fn downloader_with_config(
    config: Config,
    api: Arc<FakeApi>,
    writer: Arc<FakeWriter>,
) -> Downloader {
    Downloader::with_collaborators(config, api, writer)
        .await
        .unwrap()
}
