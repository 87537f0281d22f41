use crate::types::{ItemDescriptor, MonitorError, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

const API_BASE: &str = "https://www.googleapis.com/youtube/v3";
const USER_AGENT: &str = "channel-monitor/0.1";

/// Source of channel listings. The monitor only depends on this trait, so
/// tests substitute an in-memory implementation.
#[async_trait]
pub trait ListingClient: Send + Sync {
    /// Fetch the most recent item descriptors for a channel, newest first.
    /// Any transport or quota failure surfaces as `MonitorError::Listing`
    /// and is treated by the caller as per-channel skippable.
    async fn list_recent_items(
        &self,
        api_key: &str,
        channel_id: &str,
        max_results: u32,
    ) -> Result<Vec<ItemDescriptor>>;
}

/// Listing client backed by the YouTube Data API v3. Recent video ids come
/// from the `search` endpoint (ordered by date); a follow-up `videos` call
/// fills in tags, statistics and status, which search results do not carry.
pub struct YouTubeListingClient {
    client: Client,
}

impl YouTubeListingClient {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(30))
            .build()?;
        Ok(Self { client })
    }

    async fn search_recent(
        &self,
        api_key: &str,
        channel_id: &str,
        max_results: u32,
    ) -> Result<SearchResponse> {
        let max_results = max_results.to_string();
        let response = self
            .client
            .get(format!("{API_BASE}/search"))
            .query(&[
                ("key", api_key),
                ("channelId", channel_id),
                ("part", "snippet,id"),
                ("order", "date"),
                ("type", "video"),
                ("maxResults", max_results.as_str()),
            ])
            .send()
            .await
            .map_err(|e| listing_error(channel_id, &e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| listing_error(channel_id, &e))?;
        if !status.is_success() {
            return Err(MonitorError::Listing {
                channel_id: channel_id.to_string(),
                message: format!(
                    "search returned HTTP {}: {}",
                    status,
                    String::from_utf8_lossy(&body)
                ),
            });
        }

        serde_json::from_slice(&body).map_err(|e| listing_error(channel_id, &e))
    }

    async fn fetch_details(
        &self,
        api_key: &str,
        channel_id: &str,
        video_ids: &[String],
    ) -> Result<VideosResponse> {
        let ids = video_ids.join(",");
        let response = self
            .client
            .get(format!("{API_BASE}/videos"))
            .query(&[
                ("key", api_key),
                ("id", ids.as_str()),
                ("part", "snippet,contentDetails,statistics,status"),
            ])
            .send()
            .await
            .map_err(|e| listing_error(channel_id, &e))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| listing_error(channel_id, &e))?;
        if !status.is_success() {
            return Err(MonitorError::Listing {
                channel_id: channel_id.to_string(),
                message: format!(
                    "videos returned HTTP {}: {}",
                    status,
                    String::from_utf8_lossy(&body)
                ),
            });
        }

        serde_json::from_slice(&body).map_err(|e| listing_error(channel_id, &e))
    }
}

#[async_trait]
impl ListingClient for YouTubeListingClient {
    async fn list_recent_items(
        &self,
        api_key: &str,
        channel_id: &str,
        max_results: u32,
    ) -> Result<Vec<ItemDescriptor>> {
        let search = self.search_recent(api_key, channel_id, max_results).await?;

        let video_ids: Vec<String> = search
            .items
            .iter()
            .filter_map(|item| item.id.video_id.clone())
            .collect();

        if video_ids.is_empty() {
            debug!("No videos listed for channel {}", channel_id);
            return Ok(Vec::new());
        }

        let details = self.fetch_details(api_key, channel_id, &video_ids).await?;

        // Preserve search order; details come back keyed by id.
        let mut by_id: BTreeMap<String, VideoResource> = details
            .items
            .into_iter()
            .map(|v| (v.id.clone(), v))
            .collect();

        let descriptors = video_ids
            .iter()
            .filter_map(|id| by_id.remove(id).map(|v| v.into_descriptor()))
            .collect();

        Ok(descriptors)
    }
}

fn listing_error(channel_id: &str, error: &dyn std::fmt::Display) -> MonitorError {
    MonitorError::Listing {
        channel_id: channel_id.to_string(),
        message: error.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    id: SearchItemId,
}

#[derive(Debug, Deserialize)]
struct SearchItemId {
    #[serde(rename = "videoId")]
    video_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VideosResponse {
    #[serde(default)]
    items: Vec<VideoResource>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoResource {
    id: String,
    snippet: Option<VideoSnippet>,
    content_details: Option<VideoContentDetails>,
    statistics: Option<VideoStatistics>,
    status: Option<VideoStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoSnippet {
    #[serde(default)]
    title: String,
    #[serde(default)]
    description: String,
    #[serde(default)]
    channel_id: String,
    #[serde(default)]
    channel_title: String,
    published_at: Option<DateTime<Utc>>,
    #[serde(default)]
    thumbnails: BTreeMap<String, Thumbnail>,
    #[serde(default)]
    tags: Vec<String>,
    category_id: Option<String>,
    live_broadcast_content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Thumbnail {
    url: String,
}

#[derive(Debug, Default, Deserialize)]
struct VideoContentDetails {
    duration: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatistics {
    view_count: Option<String>,
    like_count: Option<String>,
    comment_count: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct VideoStatus {
    privacy_status: Option<String>,
    made_for_kids: Option<bool>,
}

impl VideoResource {
    fn into_descriptor(self) -> ItemDescriptor {
        let snippet = self.snippet.unwrap_or_default();
        let content_details = self.content_details.unwrap_or_default();
        let statistics = self.statistics.unwrap_or_default();
        let status = self.status.unwrap_or_default();

        ItemDescriptor {
            item_id: self.id,
            title: snippet.title,
            description: snippet.description,
            channel_id: snippet.channel_id,
            channel_title: snippet.channel_title,
            published_at: snippet.published_at,
            thumbnail_urls: snippet
                .thumbnails
                .into_iter()
                .map(|(resolution, thumb)| (resolution, thumb.url))
                .collect(),
            tags: snippet.tags,
            category_id: snippet.category_id,
            duration: content_details.duration,
            view_count: parse_count(statistics.view_count),
            like_count: parse_count(statistics.like_count),
            comment_count: parse_count(statistics.comment_count),
            live_status: snippet.live_broadcast_content,
            privacy_status: status.privacy_status,
            made_for_kids: status.made_for_kids,
        }
    }
}

// The API returns counters as decimal strings.
fn parse_count(raw: Option<String>) -> Option<u64> {
    raw.and_then(|s| s.parse().ok())
}
