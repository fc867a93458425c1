//! reqwest-backed [`ApiClient`](super::ApiClient).

use async_trait::async_trait;

use crate::config::ApiConfig;
use crate::error::Result;
use crate::types::{CollectionId, ItemId};

use super::ApiClient;

/// HTTP client for the e621 JSON API
#[derive(Clone)]
pub struct HttpApiClient {
    client: reqwest::Client,
    base_url: String,
}

impl HttpApiClient {
    /// Build a client from configuration (User-Agent, timeout, base URL)
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.request_timeout)
            .build()?;

        tracing::debug!(base_url = %config.base_url, "API client initialized");

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Base URL requests are sent to
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// GET `url` and decode the JSON body, mapping every failure to `None`
    async fn make_request(&self, url: &str) -> Option<serde_json::Value> {
        tracing::debug!(url, "Making API request");

        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(url, error = %e, "API request failed");
                return None;
            }
        };

        let status = response.status();
        if status != reqwest::StatusCode::OK {
            tracing::error!(url, status = status.as_u16(), "API request returned error status");
            return None;
        }

        match response.json::<serde_json::Value>().await {
            Ok(body) => {
                tracing::debug!(url, "API request successful");
                Some(body)
            }
            Err(e) => {
                tracing::error!(url, error = %e, "API response was not valid JSON");
                None
            }
        }
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn fetch_collection(&self, id: CollectionId) -> Option<serde_json::Value> {
        let url = format!("{}/pools/{}.json", self.base_url, id);
        self.make_request(&url).await
    }

    async fn fetch_item(&self, id: ItemId) -> Option<serde_json::Value> {
        let url = format!("{}/posts/{}.json", self.base_url, id);
        self.make_request(&url).await
    }
}
