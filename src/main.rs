mod config;
mod error;
mod models;
mod scrapers;
mod session;
mod store;

use anyhow::Context;
use clap::Parser;
use config::{Cli, Config};
use scrapers::{ChromeDriver, ListingCollector};
use session::{export_records, Session};
use std::sync::Arc;
use store::{InMemoryListingStore, ListingStore, PostgresListingStore};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(cli.log_filter()));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let config = Config::from_env(&cli)?;
    let started = std::time::Instant::now();

    info!("🏠 Fotocasa listing collector");
    info!("Visiting up to {} index pages", config.collector.max_pages);

    // Collector first: a setup failure then only has the browser to release.
    let driver = ChromeDriver::launch(&config.browser)?;
    let collector = ListingCollector::new(driver, config.collector.clone())
        .context("Failed to set up listing collector")?;

    let store: Arc<dyn ListingStore> = match &config.database_url {
        Some(url) => match PostgresListingStore::connect(url).await {
            Ok(store) => Arc::new(store),
            Err(e) => {
                collector.into_driver().quit();
                return Err(e);
            }
        },
        None => {
            warn!("Dry run: results are kept in memory only");
            Arc::new(InMemoryListingStore::new())
        }
    };

    let mut session = Session::new(collector, store);

    let result = session.run(config.recheck_limit).await;
    session.close().await.quit();

    let summary = result?;
    if let Some(path) = &config.export {
        export_records(path, &summary.records).await?;
    }

    info!("✅ Done in {:.1?}", started.elapsed());
    Ok(())
}
