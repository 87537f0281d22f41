pub mod config;
pub mod delta;
pub mod downloader;
pub mod listing;
pub mod monitor;
pub mod processor;
pub mod store;
pub mod types;

pub use config::{ChannelSettings, Config};
pub use downloader::{Downloader, YtDlpDownloader};
pub use listing::{ListingClient, YouTubeListingClient};
pub use monitor::ChannelMonitor;
pub use processor::ItemProcessor;
pub use store::MetadataStore;
pub use types::*;
