//! Utility functions for directory layout and identifier parsing

use crate::error::{Error, Result};
use crate::types::CollectionId;
use std::path::{Path, PathBuf};

/// Extension of the collection shortcut file (skipped by orphan detection)
pub const SHORTCUT_EXTENSION: &str = "url";

/// Characters that are not allowed in directory names on common filesystems
const FORBIDDEN_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '?', '*', '|'];

/// Remove characters that are illegal in file and directory names
///
/// # Examples
///
/// ```
/// use pool_dl::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("What? A/B: \"test\""), "What AB test");
/// assert_eq!(sanitize_filename("plain name"), "plain name");
/// ```
#[must_use]
pub fn sanitize_filename(name: &str) -> String {
    name.chars().filter(|c| !FORBIDDEN_CHARS.contains(c)).collect()
}

/// Directory name for a collection: `"<name> by <attribution>"`, sanitized
#[must_use]
pub fn collection_dir_name(name: &str, attribution: &str) -> String {
    sanitize_filename(&format!("{} by {}", name, attribution))
}

/// Create `<base_dir>/<collection_dir_name>` (if missing) and return its path
pub async fn create_collection_dir(base_dir: &Path, name: &str, attribution: &str) -> Result<PathBuf> {
    let dir_name = collection_dir_name(name, attribution);
    let full_path = base_dir.join(&dir_name);

    if tokio::fs::try_exists(&full_path)
        .await
        .map_err(|e| Error::filesystem(&full_path, e))?
    {
        tracing::info!(path = %full_path.display(), "Directory already exists");
    } else {
        tokio::fs::create_dir_all(&full_path)
            .await
            .map_err(|e| Error::filesystem(&full_path, e))?;
        tracing::info!(path = %full_path.display(), "Directory created");
    }

    Ok(full_path)
}

/// Write an internet shortcut pointing at `url` into `directory`
///
/// The file is named after the directory itself, e.g.
/// `Pool by artist/Pool by artist.url`.
pub async fn create_internet_shortcut(url: &str, directory: &Path) -> Result<PathBuf> {
    let stem = directory
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "collection".to_string());
    let shortcut_path = directory.join(format!("{}.{}", stem, SHORTCUT_EXTENSION));
    let contents = format!("[InternetShortcut]\nURL={}", url);

    tokio::fs::write(&shortcut_path, contents)
        .await
        .map_err(|e| Error::filesystem(&shortcut_path, e))?;
    tracing::debug!(path = %shortcut_path.display(), "Internet shortcut created");

    Ok(shortcut_path)
}

/// Web page URL of a collection
#[must_use]
pub fn collection_url(base_url: &str, id: CollectionId) -> String {
    format!("{}/pools/{}", base_url.trim_end_matches('/'), id)
}

/// Extract a collection ID from a bare number or a URL ending in one
///
/// # Examples
///
/// ```
/// use pool_dl::utils::parse_collection_id;
/// use pool_dl::CollectionId;
///
/// assert_eq!(parse_collection_id("1234"), Some(CollectionId(1234)));
/// assert_eq!(parse_collection_id("https://e621.net/pools/1234"), Some(CollectionId(1234)));
/// assert_eq!(parse_collection_id("https://e621.net/pools/abc"), None);
/// ```
#[must_use]
pub fn parse_collection_id(input: &str) -> Option<CollectionId> {
    let input = input.trim();
    let last_segment = match url::Url::parse(input) {
        Ok(url) if url.has_host() => url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).next_back())
            .map(str::to_string)?,
        _ => input
            .trim_end_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    if last_segment.is_empty() || !last_segment.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    last_segment.parse().ok()
}

/// Parse every input, dropping (and logging) the ones that are not identifiers
pub fn parse_collection_ids<S: AsRef<str>>(inputs: &[S]) -> Vec<CollectionId> {
    inputs
        .iter()
        .filter_map(|raw| {
            let parsed = parse_collection_id(raw.as_ref());
            if parsed.is_none() {
                tracing::warn!(input = raw.as_ref(), "Ignoring input that is not a pool ID or URL");
            }
            parsed
        })
        .collect()
}
