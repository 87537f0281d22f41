use crate::config::{ChannelSettings, Config};
use crate::delta;
use crate::listing::ListingClient;
use crate::processor::ItemProcessor;
use crate::store::MetadataStore;
use crate::types::Result;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

/// Drives the poll cycle: for every configured channel, fetch its listing,
/// diff against the processed set, and hand each new item to the processor
/// strictly in listing order. One channel's failure never aborts the cycle.
pub struct ChannelMonitor {
    config_path: PathBuf,
    listing: Arc<dyn ListingClient>,
    processor: ItemProcessor,
    store: Arc<MetadataStore>,
}

impl ChannelMonitor {
    pub fn new(
        config_path: impl Into<PathBuf>,
        listing: Arc<dyn ListingClient>,
        processor: ItemProcessor,
        store: Arc<MetadataStore>,
    ) -> Self {
        Self {
            config_path: config_path.into(),
            listing,
            processor,
            store,
        }
    }

    /// Run poll cycles until the shutdown channel fires. The configuration is
    /// re-read before every cycle so channel edits take effect without a
    /// restart; a failed re-read keeps the last good configuration. The sleep
    /// between cycles is interrupted promptly by shutdown.
    pub async fn run(&self, initial_config: Config, mut shutdown: watch::Receiver<bool>) {
        let mut config = initial_config;

        loop {
            match self.run_cycle(&config).await {
                Ok(new_items) => {
                    info!(
                        "Cycle complete: {} new item(s); next check in {}s",
                        new_items, config.poll_interval_seconds
                    );
                }
                Err(e) => error!("Cycle failed: {}", e),
            }

            tokio::select! {
                _ = tokio::time::sleep(Duration::from_secs(config.poll_interval_seconds)) => {}
                _ = shutdown.changed() => {
                    info!("Shutdown requested, stopping monitor");
                    return;
                }
            }

            match Config::load(&self.config_path) {
                Ok(reloaded) => config = reloaded,
                Err(e) => error!("Config reload failed, keeping previous: {}", e),
            }
        }
    }

    /// Run one poll cycle over all configured channels. Returns the number of
    /// newly processed items. Fails only if the processed-id scan itself
    /// fails; per-channel and per-item errors are logged and skipped.
    pub async fn run_cycle(&self, config: &Config) -> Result<usize> {
        let mut processed = self.store.processed_ids()?;
        let mut new_items = 0;

        for (channel_id, settings) in &config.channels {
            let label = settings.name.as_deref().unwrap_or(channel_id.as_str());
            info!("Checking channel: {}", label);

            match self
                .poll_channel(config, channel_id, settings, &mut processed)
                .await
            {
                Ok(count) => new_items += count,
                Err(e) => error!("Error while processing channel {}: {}", channel_id, e),
            }
        }

        Ok(new_items)
    }

    async fn poll_channel(
        &self,
        config: &Config,
        channel_id: &str,
        settings: &ChannelSettings,
        processed: &mut HashSet<String>,
    ) -> Result<usize> {
        let listing = self
            .listing
            .list_recent_items(&config.api_key, channel_id, settings.max_results)
            .await?;

        let unseen = delta::diff(&listing, processed);
        let mut count = 0;

        for descriptor in unseen {
            info!("New item found: {}", descriptor.title);
            match self.processor.process(descriptor).await {
                Ok(item) => {
                    // Guards against the same id appearing in another
                    // channel's listing later in this cycle.
                    processed.insert(item.item_id);
                    count += 1;
                }
                Err(e) => error!("Skipping item {}: {}", descriptor.item_id, e),
            }
        }

        Ok(count)
    }
}
