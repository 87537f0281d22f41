use async_trait::async_trait;
use channel_monitor::types::{DownloadArtifacts, ItemDescriptor, MonitorError, Result};
use channel_monitor::{
    ChannelMonitor, ChannelSettings, Config, Downloader, ItemProcessor, ListingClient,
    MetadataStore,
};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

fn descriptor(item_id: &str, channel_id: &str, title: &str) -> ItemDescriptor {
    ItemDescriptor {
        item_id: item_id.to_string(),
        title: title.to_string(),
        description: String::new(),
        channel_id: channel_id.to_string(),
        channel_title: format!("Channel {channel_id}"),
        published_at: None,
        thumbnail_urls: BTreeMap::new(),
        tags: Vec::new(),
        category_id: None,
        duration: None,
        view_count: None,
        like_count: None,
        comment_count: None,
        live_status: None,
        privacy_status: None,
        made_for_kids: None,
    }
}

/// In-memory listing source with per-channel failure injection.
struct MockListingClient {
    listings: HashMap<String, Vec<ItemDescriptor>>,
    failing_channels: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl MockListingClient {
    fn new(listings: HashMap<String, Vec<ItemDescriptor>>) -> Self {
        Self {
            listings,
            failing_channels: Mutex::new(HashSet::new()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn fail_channel(&self, channel_id: &str) {
        self.failing_channels
            .lock()
            .unwrap()
            .insert(channel_id.to_string());
    }
}

#[async_trait]
impl ListingClient for MockListingClient {
    async fn list_recent_items(
        &self,
        _api_key: &str,
        channel_id: &str,
        _max_results: u32,
    ) -> Result<Vec<ItemDescriptor>> {
        self.calls.lock().unwrap().push(channel_id.to_string());
        if self.failing_channels.lock().unwrap().contains(channel_id) {
            return Err(MonitorError::Listing {
                channel_id: channel_id.to_string(),
                message: "quota exceeded".to_string(),
            });
        }
        Ok(self.listings.get(channel_id).cloned().unwrap_or_default())
    }
}

/// Downloader double that records requested ids and can fail per item.
struct MockDownloader {
    calls: Mutex<Vec<String>>,
    failing_items: Mutex<HashSet<String>>,
}

impl MockDownloader {
    fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            failing_items: Mutex::new(HashSet::new()),
        }
    }

    fn fail_item(&self, item_id: &str) {
        self.failing_items
            .lock()
            .unwrap()
            .insert(item_id.to_string());
    }

    fn clear_failures(&self) {
        self.failing_items.lock().unwrap().clear();
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    async fn download(&self, descriptor: &ItemDescriptor) -> Result<DownloadArtifacts> {
        self.calls
            .lock()
            .unwrap()
            .push(descriptor.item_id.clone());
        if self
            .failing_items
            .lock()
            .unwrap()
            .contains(&descriptor.item_id)
        {
            return Err(MonitorError::Download {
                item_id: descriptor.item_id.clone(),
                message: "network unreachable".to_string(),
            });
        }
        Ok(DownloadArtifacts {
            asset_path: PathBuf::from(format!("/downloads/{}.mp4", descriptor.item_id)),
            thumbnail_path: None,
            canonical_url: format!("https://www.youtube.com/watch?v={}", descriptor.item_id),
        })
    }
}

struct Harness {
    _dir: TempDir,
    store: Arc<MetadataStore>,
    listing: Arc<MockListingClient>,
    downloader: Arc<MockDownloader>,
    monitor: ChannelMonitor,
    config: Config,
}

fn harness(listings: HashMap<String, Vec<ItemDescriptor>>) -> Harness {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(MetadataStore::new(dir.path().join("metadata")).unwrap());
    let listing = Arc::new(MockListingClient::new(listings));
    let downloader = Arc::new(MockDownloader::new());
    let processor = ItemProcessor::new(downloader.clone(), store.clone());
    let monitor = ChannelMonitor::new(
        dir.path().join("config.yaml"),
        listing.clone(),
        processor,
        store.clone(),
    );

    let channel_ids: Vec<String> = listing.listings.keys().cloned().collect();
    let config = Config {
        api_key: "test-key".to_string(),
        channels: channel_ids
            .into_iter()
            .map(|id| (id, ChannelSettings::default()))
            .collect(),
        poll_interval_seconds: 3600,
        metadata_dir: dir.path().join("metadata").to_string_lossy().into_owned(),
        download_dir: dir.path().join("downloads").to_string_lossy().into_owned(),
    };

    Harness {
        _dir: dir,
        store,
        listing,
        downloader,
        monitor,
        config,
    }
}

#[tokio::test]
async fn first_cycle_downloads_new_items_in_listing_order() {
    let listings = HashMap::from([(
        "UCabc".to_string(),
        vec![
            descriptor("v1", "UCabc", "First video"),
            descriptor("v2", "UCabc", "Second video"),
        ],
    )]);
    let h = harness(listings);

    let new_items = h.monitor.run_cycle(&h.config).await.unwrap();

    assert_eq!(new_items, 2);
    assert_eq!(h.downloader.calls(), vec!["v1", "v2"]);
    assert!(h.store.read_record("v1").unwrap().downloaded);
    assert!(h.store.read_record("v2").unwrap().downloaded);
}

#[tokio::test]
async fn second_cycle_is_idempotent() {
    let listings = HashMap::from([(
        "UCabc".to_string(),
        vec![
            descriptor("v1", "UCabc", "First video"),
            descriptor("v2", "UCabc", "Second video"),
        ],
    )]);
    let h = harness(listings);

    h.monitor.run_cycle(&h.config).await.unwrap();
    assert_eq!(h.downloader.calls().len(), 2);

    let new_items = h.monitor.run_cycle(&h.config).await.unwrap();
    assert_eq!(new_items, 0, "Re-polling must not process recorded items");
    assert_eq!(
        h.downloader.calls().len(),
        2,
        "Downloader must not run again for recorded ids"
    );
}

#[tokio::test]
async fn failed_download_leaves_no_record_and_is_retried_next_cycle() {
    let listings = HashMap::from([(
        "UCabc".to_string(),
        vec![
            descriptor("v1", "UCabc", "First video"),
            descriptor("v2", "UCabc", "Second video"),
        ],
    )]);
    let h = harness(listings);
    h.downloader.fail_item("v2");

    let new_items = h.monitor.run_cycle(&h.config).await.unwrap();
    assert_eq!(new_items, 1);
    assert!(h.store.record_exists("v1"));
    assert!(
        !h.store.record_exists("v2"),
        "A failed item must stay fully absent from the store"
    );

    h.downloader.clear_failures();
    let new_items = h.monitor.run_cycle(&h.config).await.unwrap();
    assert_eq!(new_items, 1);
    assert_eq!(h.downloader.calls(), vec!["v1", "v2", "v2"]);
    assert!(h.store.record_exists("v2"));
}

#[tokio::test]
async fn one_failing_channel_does_not_abort_the_cycle() {
    let listings = HashMap::from([
        (
            "UCaaa".to_string(),
            vec![descriptor("a1", "UCaaa", "From channel A")],
        ),
        (
            "UCbbb".to_string(),
            vec![descriptor("b1", "UCbbb", "From channel B")],
        ),
    ]);
    let h = harness(listings);
    h.listing.fail_channel("UCaaa");

    let new_items = h.monitor.run_cycle(&h.config).await.unwrap();

    assert_eq!(new_items, 1);
    assert!(!h.store.record_exists("a1"));
    assert!(h.store.record_exists("b1"));

    let listing_calls = h.listing.calls.lock().unwrap().clone();
    assert!(listing_calls.contains(&"UCaaa".to_string()));
    assert!(listing_calls.contains(&"UCbbb".to_string()));
}

#[tokio::test]
async fn duplicate_id_across_channels_is_downloaded_once() {
    let shared = descriptor("dup", "UCaaa", "Cross-posted video");
    let listings = HashMap::from([
        ("UCaaa".to_string(), vec![shared.clone()]),
        ("UCbbb".to_string(), vec![shared]),
    ]);
    let h = harness(listings);

    let new_items = h.monitor.run_cycle(&h.config).await.unwrap();

    assert_eq!(new_items, 1);
    assert_eq!(h.downloader.calls(), vec!["dup"]);
}
