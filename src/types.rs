//! Core types for pool-dl

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Tag that marks a restricted artist entry; never used as a folder owner
pub const RESTRICTED_ARTIST_TAG: &str = "conditional_dnp";

/// Attribution used when a post carries no usable artist tag
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Get the inner i64 value
            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i64 {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
                Ok(Self(s.parse()?))
            }
        }

        impl sqlx::Type<sqlx::Sqlite> for $name {
            fn type_info() -> sqlx::sqlite::SqliteTypeInfo {
                <i64 as sqlx::Type<sqlx::Sqlite>>::type_info()
            }

            fn compatible(ty: &sqlx::sqlite::SqliteTypeInfo) -> bool {
                <i64 as sqlx::Type<sqlx::Sqlite>>::compatible(ty)
            }
        }

        impl<'q> sqlx::Encode<'q, sqlx::Sqlite> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut Vec<sqlx::sqlite::SqliteArgumentValue<'q>>,
            ) -> std::result::Result<sqlx::encode::IsNull, Box<dyn std::error::Error + Send + Sync>>
            {
                sqlx::Encode::<sqlx::Sqlite>::encode_by_ref(&self.0, buf)
            }
        }

        impl<'r> sqlx::Decode<'r, sqlx::Sqlite> for $name {
            fn decode(
                value: sqlx::sqlite::SqliteValueRef<'r>,
            ) -> std::result::Result<Self, sqlx::error::BoxDynError> {
                let id = <i64 as sqlx::Decode<sqlx::Sqlite>>::decode(value)?;
                Ok(Self(id))
            }
        }
    };
}

id_type!(
    /// Identifier of a collection (an e621 pool)
    CollectionId
);

id_type!(
    /// Identifier of an item (an e621 post)
    ItemId
);

#[derive(Deserialize)]
struct PoolDocument {
    id: i64,
    name: String,
    post_ids: Vec<i64>,
    creator_name: String,
    post_count: i64,
}

#[derive(Deserialize)]
struct PostEnvelope {
    post: PostDocument,
}

#[derive(Deserialize)]
struct PostDocument {
    id: i64,
    tags: PostTags,
    flags: PostFlags,
    file: PostFile,
}

#[derive(Deserialize)]
struct PostTags {
    artist: Vec<String>,
}

#[derive(Deserialize)]
struct PostFlags {
    deleted: bool,
}

#[derive(Deserialize)]
struct PostFile {
    url: Option<String>,
    ext: String,
}

/// Collection metadata as returned by the API
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Collection {
    /// Collection ID
    pub id: CollectionId,
    /// Display name (underscores replaced by spaces)
    pub name: String,
    /// Item IDs in declared order
    pub item_ids: Vec<ItemId>,
    /// Name of the user that created the pool
    pub creator_name: String,
    /// Item count as reported by the API
    pub item_count: i64,
}

impl Collection {
    /// Parse a pool document
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let doc: PoolDocument =
            serde_json::from_value(value).map_err(|e| Error::InvalidMetadata {
                entity: "pool",
                reason: e.to_string(),
            })?;
        Ok(Self {
            id: CollectionId(doc.id),
            name: doc.name.replace('_', " "),
            item_ids: doc.post_ids.into_iter().map(ItemId).collect(),
            creator_name: doc.creator_name,
            item_count: doc.post_count,
        })
    }
}

/// Reject a payload extension that is not a single alphanumeric token
///
/// The extension becomes part of a file name inside the collection
/// directory, so separators and dots must never reach the filesystem.
pub(crate) fn validate_extension(ext: &str) -> Result<()> {
    if ext.is_empty() || !ext.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::InvalidMetadata {
            entity: "post",
            reason: format!("unusable file extension {:?}", ext),
        });
    }
    Ok(())
}

/// Item metadata as returned by the API
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Item {
    /// Item ID
    pub id: ItemId,
    /// Artist tags in API order
    pub artists: Vec<String>,
    /// Whether the item was deleted upstream
    pub is_deleted: bool,
    /// Payload URL, absent when the API withholds it
    pub file_url: Option<String>,
    /// Payload file extension
    pub file_ext: String,
}

impl Item {
    /// Parse a post document (`{"post": {...}}`)
    pub fn from_json(value: serde_json::Value) -> Result<Self> {
        let doc: PostEnvelope =
            serde_json::from_value(value).map_err(|e| Error::InvalidMetadata {
                entity: "post",
                reason: e.to_string(),
            })?;
        let post = doc.post;
        validate_extension(&post.file.ext)?;
        Ok(Self {
            id: ItemId(post.id),
            artists: post.tags.artist,
            is_deleted: post.flags.deleted,
            file_url: post.file.url,
            file_ext: post.file.ext,
        })
    }

    /// Owner label used to name the collection directory
    ///
    /// A leading [`RESTRICTED_ARTIST_TAG`] is skipped when a second artist
    /// exists; with no usable artist the result is [`UNKNOWN_ARTIST`].
    pub fn attribution(&self) -> String {
        match self.artists.as_slice() {
            [first, second, ..] if first == RESTRICTED_ARTIST_TAG => second.clone(),
            [first] if first == RESTRICTED_ARTIST_TAG => UNKNOWN_ARTIST.to_string(),
            [first, ..] => first.clone(),
            [] => UNKNOWN_ARTIST.to_string(),
        }
    }
}

/// Why a collection was skipped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The API returned no document for the collection
    NotFound,
    /// The collection has no items
    Empty,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkipReason::NotFound => write!(f, "not found"),
            SkipReason::Empty => write!(f, "no items"),
        }
    }
}

/// Terminal state of one collection run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CollectionOutcome {
    /// The protocol ran to completion (individual items may still have failed)
    Completed(DownloadSummary),
    /// Nothing was done
    Skipped(SkipReason),
    /// The protocol aborted before dispatching items
    Failed(String),
}

/// Per-collection result of a completed run
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadSummary {
    /// Collection ID
    pub collection_id: CollectionId,
    /// Collection display name
    pub name: String,
    /// Directory the items were written to
    pub directory: PathBuf,
    /// Items written during this run
    pub downloaded: Vec<ItemId>,
    /// Items that could not be written
    pub failed: Vec<ItemId>,
    /// Ledger rows dropped because their file had disappeared
    pub healed: usize,
}

/// Result of downloading a single item
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ItemOutcome {
    /// The payload was written and recorded
    Downloaded(ItemId),
    /// The payload could not be written
    Failed(ItemId),
}

/// Result of comparing a collection's live item count with the ledger
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct UpdateCheck {
    /// Collection ID
    pub collection_id: CollectionId,
    /// Whether new items are available
    pub has_updates: bool,
    /// Item count stored in the ledger (0 when unknown)
    pub old_count: i64,
    /// Item count reported by the API
    pub new_count: i64,
    /// Number of items not present in the ledger
    pub new_item_count: usize,
}

/// Event emitted while collections are processed
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// A collection's items are about to be dispatched
    CollectionStarted {
        /// Collection ID
        id: CollectionId,
        /// Collection name
        name: String,
        /// Number of items planned for this run
        planned: usize,
    },

    /// An item was written and recorded
    ItemDownloaded {
        /// Collection ID
        collection_id: CollectionId,
        /// Item ID
        item_id: ItemId,
        /// Where the payload was written
        path: PathBuf,
    },

    /// An item could not be written
    ItemFailed {
        /// Collection ID
        collection_id: CollectionId,
        /// Item ID
        item_id: ItemId,
        /// Failure description
        error: String,
    },

    /// A collection finished (completed, skipped or failed)
    CollectionFinished {
        /// Collection ID
        id: CollectionId,
        /// Items downloaded during the run
        downloaded: usize,
        /// Items that failed during the run
        failed: usize,
    },
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item_with_artists(artists: &[&str]) -> Item {
        Item {
            id: ItemId(1),
            artists: artists.iter().map(|a| a.to_string()).collect(),
            is_deleted: false,
            file_url: None,
            file_ext: "png".to_string(),
        }
    }

    #[test]
    fn attribution_skips_restricted_tag_when_second_artist_exists() {
        let item = item_with_artists(&["conditional_dnp", "artistA"]);
        assert_eq!(item.attribution(), "artistA");
    }

    #[test]
    fn attribution_falls_back_to_placeholder() {
        assert_eq!(
            item_with_artists(&["conditional_dnp"]).attribution(),
            UNKNOWN_ARTIST
        );
        assert_eq!(item_with_artists(&[]).attribution(), UNKNOWN_ARTIST);
    }

    #[test]
    fn attribution_uses_single_artist() {
        assert_eq!(item_with_artists(&["soloArtist"]).attribution(), "soloArtist");
        assert_eq!(
            item_with_artists(&["first", "conditional_dnp"]).attribution(),
            "first"
        );
    }

    #[test]
    fn pool_document_parses_and_normalises_name() {
        let pool = Collection::from_json(json!({
            "id": 42,
            "name": "Some_Pool_Name",
            "post_ids": [3, 1, 2],
            "creator_name": "someone",
            "post_count": 3,
            "is_active": true
        }))
        .unwrap();
        assert_eq!(pool.id, CollectionId(42));
        assert_eq!(pool.name, "Some Pool Name");
        assert_eq!(pool.item_ids, vec![ItemId(3), ItemId(1), ItemId(2)]);
        assert_eq!(pool.item_count, 3);
    }

    #[test]
    fn pool_document_missing_fields_is_data_shape_error() {
        let err = Collection::from_json(json!({ "id": 42, "name": "x" })).unwrap_err();
        assert!(matches!(err, Error::InvalidMetadata { entity: "pool", .. }));
    }

    #[test]
    fn post_document_parses_nested_fields() {
        let item = Item::from_json(json!({
            "post": {
                "id": 7,
                "tags": { "artist": ["conditional_dnp", "artistA"], "general": ["x"] },
                "flags": { "deleted": false },
                "file": { "url": "https://static.example/7.png", "ext": "png" }
            }
        }))
        .unwrap();
        assert_eq!(item.id, ItemId(7));
        assert_eq!(item.file_url.as_deref(), Some("https://static.example/7.png"));
        assert_eq!(item.attribution(), "artistA");
    }

    #[test]
    fn post_document_allows_null_url() {
        let item = Item::from_json(json!({
            "post": {
                "id": 8,
                "tags": { "artist": [] },
                "flags": { "deleted": true },
                "file": { "url": null, "ext": "jpg" }
            }
        }))
        .unwrap();
        assert!(item.is_deleted);
        assert!(item.file_url.is_none());
    }

    #[test]
    fn post_document_with_path_like_extension_is_rejected() {
        for ext in ["../x", "png/evil", "", "tar.gz", "p\\ng"] {
            let err = Item::from_json(json!({
                "post": {
                    "id": 9,
                    "tags": { "artist": ["artistA"] },
                    "flags": { "deleted": false },
                    "file": { "url": "https://static.example/9.png", "ext": ext }
                }
            }))
            .unwrap_err();
            assert!(
                matches!(err, Error::InvalidMetadata { entity: "post", .. }),
                "{:?} accepted",
                ext
            );
        }
    }

    #[test]
    fn ids_parse_from_strings() {
        assert_eq!("1234".parse::<CollectionId>().unwrap(), CollectionId(1234));
        assert!("abc".parse::<ItemId>().is_err());
    }
}
