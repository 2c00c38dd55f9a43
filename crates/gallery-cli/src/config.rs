//! Startup configuration for the `gallery` binary.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{bail, Context};
use serde::Deserialize;

use gallery_client::ClientConfig;
use gallery_core::{defaults, RemoteFileRecord};

/// Everything the binary reads from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub client: ClientConfig,
    /// Fixed gallery entries shown alongside stored files.
    pub static_entries: Vec<RemoteFileRecord>,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Default | Description |
    /// |----------|---------|-------------|
    /// | `GALLERY_API_URL` | `http://localhost:8787` | Upload API base URL |
    /// | `GALLERY_API_KEY` | (none) | Shared upload secret |
    /// | `GALLERY_AUTH_HEADER` | `X-Upload-Key` | Header carrying the secret |
    /// | `GALLERY_TIMEOUT_SECS` | `60` | Request timeout |
    /// | `GALLERY_STATIC_ENTRIES` | (none) | JSON file of fixed gallery entries |
    pub fn from_env() -> anyhow::Result<Self> {
        let client = ClientConfig::from_env();
        let static_entries = match std::env::var(defaults::ENV_STATIC_ENTRIES) {
            Ok(path) if !path.trim().is_empty() => load_static_entries(Path::new(path.trim()))?,
            _ => Vec::new(),
        };
        Ok(Self {
            client,
            static_entries,
        })
    }
}

/// One fixed entry as written in the static entries file.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StaticEntry {
    key: String,
    url: String,
    #[serde(default)]
    thumbnail_url: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    categories: Vec<String>,
}

impl From<StaticEntry> for RemoteFileRecord {
    fn from(entry: StaticEntry) -> Self {
        let mut record = RemoteFileRecord::immutable(entry.key, entry.url);
        if let Some(thumb) = entry.thumbnail_url.filter(|t| !t.is_empty()) {
            record.thumbnail_url = thumb;
        }
        record.original_name = entry.name;
        record.categories = entry.categories;
        record
    }
}

/// Read fixed gallery entries from a JSON array file.
///
/// ```json
/// [{"key": "static/hero.jpg", "url": "/images/hero.jpg", "name": "Hero"}]
/// ```
pub fn load_static_entries(path: &Path) -> anyhow::Result<Vec<RemoteFileRecord>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read static entries from {}", path.display()))?;
    let entries: Vec<StaticEntry> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid static entries file {}", path.display()))?;

    let mut seen = HashSet::new();
    for entry in &entries {
        if entry.key.trim().is_empty() {
            bail!("Static entry with empty key in {}", path.display());
        }
        if !seen.insert(entry.key.as_str()) {
            bail!("Duplicate static entry key '{}' in {}", entry.key, path.display());
        }
    }

    Ok(entries.into_iter().map(RemoteFileRecord::from).collect())
}
