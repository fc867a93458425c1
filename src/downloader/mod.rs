//! Collection download orchestration, split into focused submodules.
//!
//! The [`Downloader`] struct and its methods are organized by step:
//! - [`pool`] - Per-collection protocol (fetch, attribute, directory, plan)
//! - [`items`] - Concurrent item dispatch and recording
//! - [`updates`] - Read-only update detection
//! - [`batch`] - Multi-collection drivers
//! - [`lifecycle`] - Shutdown coordination

mod batch;
mod items;
mod lifecycle;
mod pool;
mod updates;

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
pub(crate) mod test_helpers;
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

pub use lifecycle::run_with_shutdown;

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::api::{ApiClient, HttpApiClient, is_empty_document};
use crate::config::Config;
use crate::db::Database;
use crate::error::Result;
use crate::rate_limiter::RateLimiter;
use crate::types::{Collection, CollectionId, Event, Item, ItemId};
use crate::writer::{HttpItemWriter, ItemWriter};

/// Capacity of the event channel; slow subscribers lag rather than block
const EVENT_CHANNEL_CAPACITY: usize = 1000;

/// Downloads collections into the configured directory, tracking progress
/// in the ledger.
///
/// Cloning is cheap: every clone shares the ledger, the API client, the
/// rate limiter and the shutdown token.
#[derive(Clone)]
pub struct Downloader {
    /// Download ledger (public for integration tests)
    pub db: Arc<Database>,
    pub(crate) api: Arc<dyn ApiClient>,
    pub(crate) writer: Arc<dyn ItemWriter>,
    /// Gate shared by every metadata request
    pub(crate) rate_limiter: RateLimiter,
    pub(crate) config: Arc<Config>,
    pub(crate) event_tx: broadcast::Sender<Event>,
    pub(crate) cancel: CancellationToken,
}

impl Downloader {
    /// Create a downloader talking to the configured HTTP API
    ///
    /// Validates the configuration, creates the download directory and
    /// opens (or creates) the ledger database.
    ///
    /// # Errors
    ///
    /// Fails if the configuration is invalid, the HTTP clients cannot be
    /// built or the database cannot be opened.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let api = Arc::new(HttpApiClient::new(&config.api)?);
        let writer = Arc::new(HttpItemWriter::new(
            &config.api.user_agent,
            config.download.payload_timeout,
        )?);
        Self::with_collaborators(config, api, writer).await
    }

    /// Create a downloader with caller-provided API and payload writer
    pub async fn with_collaborators(
        config: Config,
        api: Arc<dyn ApiClient>,
        writer: Arc<dyn ItemWriter>,
    ) -> Result<Self> {
        config.validate()?;

        let db = Database::new(
            &config.persistence.database_path,
            &config.download.download_dir,
        )
        .await?;

        let (event_tx, _rx) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        let cancel = CancellationToken::new();
        let rate_limiter = RateLimiter::new(config.api.request_interval, cancel.clone());

        tracing::info!(
            download_dir = %db.base_dir().display(),
            database = %config.persistence.database_path.display(),
            interval_ms = config.api.request_interval.as_millis() as u64,
            max_concurrent_items = config.download.max_concurrent_items,
            "Downloader initialized"
        );

        Ok(Self {
            db: Arc::new(db),
            api,
            writer,
            rate_limiter,
            config: Arc::new(config),
            event_tx,
            cancel,
        })
    }

    /// Subscribe to download events
    ///
    /// Each subscriber gets its own copy of every event sent after it
    /// subscribed. Events are dropped when nobody is listening.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    pub(crate) fn emit_event(&self, event: Event) {
        // send() only fails without receivers
        self.event_tx.send(event).ok();
    }

    /// Rate-limited fetch of a collection's metadata
    ///
    /// `Ok(None)` when the API returned nothing usable or an empty document.
    pub(crate) async fn fetch_collection(&self, id: CollectionId) -> Result<Option<Collection>> {
        let api = Arc::clone(&self.api);
        let document = self
            .rate_limiter
            .acquire_and_run(|| async move { api.fetch_collection(id).await })
            .await?;

        match document {
            Some(value) if !is_empty_document(&value) => Collection::from_json(value).map(Some),
            _ => Ok(None),
        }
    }

    /// Rate-limited fetch of an item's metadata
    pub(crate) async fn fetch_item(&self, id: ItemId) -> Result<Option<Item>> {
        let api = Arc::clone(&self.api);
        let document = self
            .rate_limiter
            .acquire_and_run(|| async move { api.fetch_item(id).await })
            .await?;

        match document {
            Some(value) if !is_empty_document(&value) => Item::from_json(value).map(Some),
            _ => Ok(None),
        }
    }
}
