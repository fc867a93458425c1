//! # pool-dl
//!
//! Downloads ordered image collections ("pools") from an e621-style JSON API
//! into per-collection directories, keeping a SQLite ledger so repeated runs
//! only fetch what is missing.
//!
//! ## Design Philosophy
//!
//! - **Idempotent** - Re-running a collection downloads only items absent
//!   from the ledger, after reconciling the ledger with the filesystem
//! - **Polite** - Every metadata request goes through one shared,
//!   process-wide rate limiter
//! - **Library-first** - The CLI is a thin wrapper around [`Downloader`]
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use pool_dl::{CollectionId, Config, Downloader};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let downloader = Downloader::new(Config::default()).await?;
//!
//!     let mut events = downloader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let outcome = downloader.download_collection(CollectionId(1234)).await?;
//!     println!("{:?}", outcome);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Remote metadata API
pub mod api;
/// Configuration types
pub mod config;
/// Download ledger persistence layer
pub mod db;
/// Collection download orchestration
pub mod downloader;
/// Error types
pub mod error;
/// Process-wide request spacing
pub mod rate_limiter;
/// Core types and events
pub mod types;
/// Utility functions
pub mod utils;
/// Ledger/filesystem reconciliation
pub mod verifier;
/// Payload writing
pub mod writer;

// Re-export commonly used types
pub use api::{ApiClient, HttpApiClient};
pub use config::Config;
pub use db::Database;
pub use downloader::{Downloader, run_with_shutdown};
pub use error::{DatabaseError, Error, ErrorClass, Result};
pub use rate_limiter::RateLimiter;
pub use types::{
    Collection, CollectionId, CollectionOutcome, DownloadSummary, Event, Item, ItemId,
    SkipReason, UpdateCheck,
};
pub use writer::{HttpItemWriter, ItemWriter};
