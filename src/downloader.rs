use crate::types::{DownloadArtifacts, ItemDescriptor, MonitorError, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};
use url::Url;

/// Media fetcher invoked by the item processor. Tests substitute an
/// in-memory implementation that records which ids were requested.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Fetch the media for one item, returning the stored artifact
    /// locations. Any failure surfaces as `MonitorError::Download`; the
    /// caller skips the item and it is retried on the next poll cycle.
    async fn download(&self, descriptor: &ItemDescriptor) -> Result<DownloadArtifacts>;
}

/// Downloader that shells out to `yt-dlp` for the video and fetches the best
/// thumbnail variant over HTTP. Artifacts land in a flat output directory
/// named by item id.
pub struct YtDlpDownloader {
    output_dir: PathBuf,
    client: Client,
}

impl YtDlpDownloader {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        let client = Client::builder()
            .user_agent("channel-monitor/0.1")
            .timeout(Duration::from_secs(60))
            .build()?;
        Ok(Self { output_dir, client })
    }

    async fn fetch_thumbnail(&self, descriptor: &ItemDescriptor) -> Option<PathBuf> {
        let url = descriptor.best_thumbnail_url()?;
        let extension = thumbnail_extension(url);
        let path = self
            .output_dir
            .join(format!("{}.{}", descriptor.item_id, extension));

        let result = async {
            let response = self.client.get(url).send().await?.error_for_status()?;
            let bytes = response.bytes().await?;
            tokio::fs::write(&path, &bytes).await?;
            Ok::<_, anyhow::Error>(())
        }
        .await;

        match result {
            Ok(()) => Some(path),
            Err(e) => {
                // A missing thumbnail is not worth failing the item over.
                warn!("Thumbnail fetch failed for {}: {}", descriptor.item_id, e);
                None
            }
        }
    }

    /// yt-dlp picks the container extension, so locate the written file by
    /// its id prefix after the run.
    fn locate_asset(&self, item_id: &str) -> Result<PathBuf> {
        let prefix = format!("{item_id}.");
        for entry in std::fs::read_dir(&self.output_dir)? {
            let path = entry?.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
                let is_thumbnail = name.ends_with(".jpg") || name.ends_with(".png") || name.ends_with(".webp");
                if name.starts_with(&prefix) && !name.ends_with(".part") && !is_thumbnail {
                    return Ok(path);
                }
            }
        }
        Err(MonitorError::Download {
            item_id: item_id.to_string(),
            message: "yt-dlp reported success but no output file was found".to_string(),
        })
    }
}

#[async_trait]
impl Downloader for YtDlpDownloader {
    async fn download(&self, descriptor: &ItemDescriptor) -> Result<DownloadArtifacts> {
        let item_id = &descriptor.item_id;
        let canonical_url = format!("https://www.youtube.com/watch?v={item_id}");
        let output_template = self.output_dir.join(format!("{item_id}.%(ext)s"));

        debug!("Invoking yt-dlp for {}", item_id);
        let output = Command::new("yt-dlp")
            .arg("--no-progress")
            .arg("-o")
            .arg(&output_template)
            .arg(&canonical_url)
            .output()
            .await
            .map_err(|e| MonitorError::Download {
                item_id: item_id.clone(),
                message: format!("failed to run yt-dlp: {}", e),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(MonitorError::Download {
                item_id: item_id.clone(),
                message: format!("yt-dlp exited with {}: {}", output.status, stderr.trim()),
            });
        }

        let asset_path = self.locate_asset(item_id)?;
        let thumbnail_path = self.fetch_thumbnail(descriptor).await;

        Ok(DownloadArtifacts {
            asset_path,
            thumbnail_path,
            canonical_url,
        })
    }
}

fn thumbnail_extension(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|u| {
            Path::new(u.path())
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_string())
        })
        .unwrap_or_else(|| "jpg".to_string())
}
