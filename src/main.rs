use channel_monitor::{
    ChannelMonitor, Config, ItemProcessor, MetadataStore, YouTubeListingClient, YtDlpDownloader,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::info;

#[derive(Parser)]
#[command(name = "channel-monitor")]
#[command(about = "Polls YouTube channels for new videos and downloads each one once")]
struct Args {
    /// Path to the YAML configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Run a single poll cycle and exit instead of looping
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    // A bad config at startup is fatal; later reload failures are not.
    let config = Config::load(&args.config)?;

    info!("Channel monitor started");
    info!(
        "Watching {} channel(s), checking every {}s",
        config.channels.len(),
        config.poll_interval_seconds
    );

    let store = Arc::new(MetadataStore::new(&config.metadata_dir)?);
    let listing = Arc::new(YouTubeListingClient::new()?);
    let downloader = Arc::new(YtDlpDownloader::new(&config.download_dir)?);
    let processor = ItemProcessor::new(downloader, store.clone());
    let monitor = ChannelMonitor::new(&args.config, listing, processor, store);

    if args.once {
        let new_items = monitor.run_cycle(&config).await?;
        info!("Single cycle complete: {} new item(s)", new_items);
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    monitor.run(config, shutdown_rx).await;
    info!("Channel monitor stopped");
    Ok(())
}
