use crate::downloader::Downloader;
use crate::store::MetadataStore;
use crate::types::{ItemDescriptor, ItemRecord, ProcessedItem, Result};
use std::sync::Arc;
use tracing::info;

/// Orchestrates the unit of idempotency for one new item: download the media,
/// build the full record snapshot, commit it to the store. The committed
/// record is what marks the item processed; there is no separate
/// mark-as-downloaded step.
pub struct ItemProcessor {
    downloader: Arc<dyn Downloader>,
    store: Arc<MetadataStore>,
}

impl ItemProcessor {
    pub fn new(downloader: Arc<dyn Downloader>, store: Arc<MetadataStore>) -> Self {
        Self { downloader, store }
    }

    /// Process a single unseen item. If the download fails, no record is
    /// written: the item stays fully absent from the store and is retried on
    /// the next poll cycle.
    pub async fn process(&self, descriptor: &ItemDescriptor) -> Result<ProcessedItem> {
        let artifacts = self.downloader.download(descriptor).await?;

        let record = ItemRecord::from_download(descriptor, &artifacts);
        self.store.create_or_replace(&descriptor.item_id, &record)?;

        info!(
            "Downloaded '{}' ({}) to {}",
            descriptor.title,
            descriptor.item_id,
            artifacts.asset_path.display()
        );

        Ok(ProcessedItem {
            item_id: descriptor.item_id.clone(),
            title: descriptor.title.clone(),
            asset_path: artifacts.asset_path,
        })
    }
}
