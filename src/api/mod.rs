//! Remote API access
//!
//! The orchestrator only talks to the API through [`ApiClient`]. An
//! implementation returns `None` for any failure (transport error, timeout,
//! non-success status, undecodable body); it never surfaces an error.
//!
//! - [`http`] — reqwest-backed client for the e621 JSON API

use async_trait::async_trait;

use crate::types::{CollectionId, ItemId};

mod http;

pub use http::HttpApiClient;

/// Source of collection and item metadata documents
#[async_trait]
pub trait ApiClient: Send + Sync {
    /// Fetch the metadata document of a collection
    async fn fetch_collection(&self, id: CollectionId) -> Option<serde_json::Value>;

    /// Fetch the metadata document of an item
    async fn fetch_item(&self, id: ItemId) -> Option<serde_json::Value>;
}

/// Whether a document carries no content (`null`, `{}` or `[]`)
pub(crate) fn is_empty_document(value: &serde_json::Value) -> bool {
    match value {
        serde_json::Value::Null => true,
        serde_json::Value::Object(map) => map.is_empty(),
        serde_json::Value::Array(items) => items.is_empty(),
        _ => false,
    }
}
