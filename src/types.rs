use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A single entry from a channel listing, as returned by the listing API.
/// Descriptive fields are a best-effort snapshot taken at listing time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDescriptor {
    pub item_id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: Option<DateTime<Utc>>,
    /// Thumbnail variants keyed by resolution name ("default", "high", "maxres", ...).
    pub thumbnail_urls: BTreeMap<String, String>,
    pub tags: Vec<String>,
    pub category_id: Option<String>,
    /// ISO 8601 duration from the video details, e.g. "PT4M13S".
    pub duration: Option<String>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub live_status: Option<String>,
    pub privacy_status: Option<String>,
    pub made_for_kids: Option<bool>,
}

impl ItemDescriptor {
    /// Best available thumbnail URL, preferring maxres over high over default.
    pub fn best_thumbnail_url(&self) -> Option<&str> {
        for resolution in ["maxres", "high", "medium", "default"] {
            if let Some(url) = self.thumbnail_urls.get(resolution) {
                return Some(url.as_str());
            }
        }
        None
    }
}

/// The durable per-item record persisted by the metadata store. One file per
/// item; field order below is the on-disk order. The `downloaded` flag is the
/// only field consulted for skip/process decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemRecord {
    pub item_id: String,
    pub title: String,
    pub description: String,
    pub channel_id: String,
    pub channel_title: String,
    pub published_at: Option<DateTime<Utc>>,
    pub canonical_url: String,
    pub asset_path: String,
    pub thumbnail_path: Option<String>,
    pub thumbnail_url: Option<String>,
    pub tags: Vec<String>,
    pub category_id: Option<String>,
    pub duration: Option<String>,
    pub view_count: Option<u64>,
    pub like_count: Option<u64>,
    pub comment_count: Option<u64>,
    pub live_status: Option<String>,
    pub privacy_status: Option<String>,
    pub made_for_kids: Option<bool>,
    pub downloaded: bool,
    /// Open status map for later additions (transcoded, uploaded, ...) merged
    /// in via `MetadataStore::merge_update` without schema changes.
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_yaml::Value>,
}

impl ItemRecord {
    /// Build the full record snapshot for a successfully downloaded item.
    pub fn from_download(descriptor: &ItemDescriptor, artifacts: &DownloadArtifacts) -> Self {
        Self {
            item_id: descriptor.item_id.clone(),
            title: descriptor.title.clone(),
            description: descriptor.description.clone(),
            channel_id: descriptor.channel_id.clone(),
            channel_title: descriptor.channel_title.clone(),
            published_at: descriptor.published_at,
            canonical_url: artifacts.canonical_url.clone(),
            asset_path: artifacts.asset_path.to_string_lossy().into_owned(),
            thumbnail_path: artifacts
                .thumbnail_path
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            thumbnail_url: descriptor.best_thumbnail_url().map(|s| s.to_string()),
            tags: descriptor.tags.clone(),
            category_id: descriptor.category_id.clone(),
            duration: descriptor.duration.clone(),
            view_count: descriptor.view_count,
            like_count: descriptor.like_count,
            comment_count: descriptor.comment_count,
            live_status: descriptor.live_status.clone(),
            privacy_status: descriptor.privacy_status.clone(),
            made_for_kids: descriptor.made_for_kids,
            downloaded: true,
            extra: BTreeMap::new(),
        }
    }
}

/// Locations produced by a successful media download.
#[derive(Debug, Clone)]
pub struct DownloadArtifacts {
    pub asset_path: PathBuf,
    pub thumbnail_path: Option<PathBuf>,
    pub canonical_url: String,
}

/// Summary of one successfully processed item, returned by the processor.
#[derive(Debug, Clone)]
pub struct ProcessedItem {
    pub item_id: String,
    pub title: String,
    pub asset_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Listing failed for channel {channel_id}: {message}")]
    Listing { channel_id: String, message: String },

    #[error("Download failed for item {item_id}: {message}")]
    Download { item_id: String, message: String },

    #[error("No metadata record found for item {item_id}")]
    RecordNotFound { item_id: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
