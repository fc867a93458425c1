//! Payload writing
//!
//! An [`ItemWriter`] turns item metadata into a file named
//! `<position + 1>.<ext>` inside the collection directory. The returned path
//! is only produced once the file is completely on disk; the ledger is
//! updated with it afterwards.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::types::{Item, validate_extension};

/// Suffix of a payload that is still being written
const PARTIAL_SUFFIX: &str = "part";

/// Writes an item's payload into a collection directory
#[async_trait]
pub trait ItemWriter: Send + Sync {
    /// Write `item` as `<position + 1>.<ext>` under `directory`
    ///
    /// Fails with [`Error::ItemUnavailable`] for items deleted upstream or
    /// without a payload URL, and with [`Error::ShuttingDown`] once `cancel`
    /// fires before the payload is complete. Nothing is left on disk in
    /// either case.
    async fn write(
        &self,
        item: &Item,
        position: usize,
        directory: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf>;
}

/// File name of an item's payload for a zero-based `position`
#[must_use]
pub fn payload_file_name(item: &Item, position: usize) -> String {
    format!("{}.{}", position + 1, item.file_ext)
}

/// Reject items that have nothing to download or whose extension cannot be
/// used as a file name; returns the payload URL
pub(crate) fn payload_url(item: &Item) -> Result<&str> {
    if item.is_deleted {
        return Err(Error::ItemUnavailable {
            id: item.id.0,
            reason: "deleted upstream".to_string(),
        });
    }
    validate_extension(&item.file_ext)?;
    item.file_url.as_deref().ok_or_else(|| Error::ItemUnavailable {
        id: item.id.0,
        reason: "no file URL".to_string(),
    })
}

/// Downloads payloads over HTTP
#[derive(Clone)]
pub struct HttpItemWriter {
    client: reqwest::Client,
}

impl HttpItemWriter {
    /// Create a writer sending `user_agent` with every payload request
    ///
    /// A transfer taking longer than `timeout` fails as a network error.
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }

    async fn fetch(&self, item: &Item, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if status != reqwest::StatusCode::OK {
            return Err(Error::ItemUnavailable {
                id: item.id.0,
                reason: format!("HTTP {}", status.as_u16()),
            });
        }
        Ok(response.bytes().await?.to_vec())
    }

    async fn store(&self, body: &[u8], partial_path: &Path, final_path: &Path) -> Result<()> {
        tokio::fs::write(partial_path, body)
            .await
            .map_err(|e| Error::filesystem(partial_path, e))?;
        tokio::fs::rename(partial_path, final_path)
            .await
            .map_err(|e| Error::filesystem(final_path, e))
    }
}

#[async_trait]
impl ItemWriter for HttpItemWriter {
    async fn write(
        &self,
        item: &Item,
        position: usize,
        directory: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf> {
        let url = match payload_url(item) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(item_id = item.id.0, error = %e, "Skipping item");
                return Err(e);
            }
        };

        let file_name = payload_file_name(item, position);
        let final_path = directory.join(&file_name);
        let partial_path = directory.join(format!("{}.{}", file_name, PARTIAL_SUFFIX));

        let transfer = async {
            let body = self.fetch(item, url).await.inspect_err(|e| {
                tracing::warn!(item_id = item.id.0, url, error = %e, "Failed to download payload");
            })?;
            self.store(&body, &partial_path, &final_path).await
        };

        let result = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::info!(item_id = item.id.0, "Payload transfer interrupted by shutdown");
                Err(Error::ShuttingDown)
            }
            result = transfer => result,
        };

        if let Err(e) = result {
            let _ = tokio::fs::remove_file(&partial_path).await;
            return Err(e);
        }

        tracing::info!(item_id = item.id.0, path = %final_path.display(), "Downloaded");
        Ok(final_path)
    }
}
