//! Shared helpers for integration tests: a wiremock server that plays the
//! role of the remote API and the payload host.

#![allow(dead_code)]

use pool_dl::Config;
use serde_json::json;
use std::path::Path;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serve `/pools/{id}.json` for a pool with the given posts
pub async fn mount_pool(server: &MockServer, id: i64, name: &str, post_ids: &[i64]) {
    Mock::given(method("GET"))
        .and(path(format!("/pools/{}.json", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": id,
            "name": name,
            "post_ids": post_ids,
            "creator_name": "creator",
            "post_count": post_ids.len(),
        })))
        .mount(server)
        .await;
}

/// Serve `/posts/{id}.json` and the payload it points at
pub async fn mount_post(server: &MockServer, id: i64, artists: &[&str]) {
    mount_post_with_delay(server, id, artists, Duration::ZERO).await;
}

/// Like [`mount_post`], but the payload response is held back by `delay`
pub async fn mount_post_with_delay(
    server: &MockServer,
    id: i64,
    artists: &[&str],
    delay: Duration,
) {
    Mock::given(method("GET"))
        .and(path(format!("/posts/{}.json", id)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "post": {
                "id": id,
                "tags": { "artist": artists },
                "flags": { "deleted": false },
                "file": {
                    "url": format!("{}/data/{}.jpg", server.uri(), id),
                    "ext": "jpg",
                },
            }
        })))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path(format!("/data/{}.jpg", id)))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(payload(id))
                .set_delay(delay),
        )
        .mount(server)
        .await;
}

/// Payload bytes served for an item
pub fn payload(id: i64) -> Vec<u8> {
    format!("JPEG-{}", id).into_bytes()
}

/// Number of received requests whose path starts with `prefix`
pub async fn request_count(server: &MockServer, prefix: &str) -> usize {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .iter()
        .filter(|request| request.url.path().starts_with(prefix))
        .count()
}

/// Config pointing at `server`, storing everything under `root`
pub fn config_for(server: &MockServer, root: &Path) -> Config {
    let mut config = Config::default();
    config.api.base_url = server.uri();
    config.api.user_agent = "pool-dl-tests/1.0".to_string();
    config.api.request_interval = Duration::from_millis(5);
    config.download.download_dir = root.join("downloads");
    config.persistence.database_path = root.join("ledger.db");
    config
}
