use crate::error::ScrapeError;
use crate::models::ListingRecord;
use crate::scrapers::{ListingCollector, Liveness, PageDriver};
use crate::store::{upsert, ListingStore, Reconciliation};
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Counters for one run, plus the records extracted during it
#[derive(Debug, Default)]
pub struct RunSummary {
    pub pages_visited: u32,
    pub discovered: usize,
    pub inserted: usize,
    pub marked_inactive: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub failed: usize,
    pub rechecked: usize,
    pub records: Vec<ListingRecord>,
}

impl RunSummary {
    fn log(&self) {
        info!(
            pages = self.pages_visited,
            discovered = self.discovered,
            inserted = self.inserted,
            marked_inactive = self.marked_inactive,
            unchanged = self.unchanged,
            skipped = self.skipped,
            failed = self.failed,
            rechecked = self.rechecked,
            "Run summary"
        );
    }

    fn count(&mut self, outcome: Reconciliation) {
        match outcome {
            Reconciliation::Inserted => self.inserted += 1,
            Reconciliation::MarkedInactive => self.marked_inactive += 1,
            Reconciliation::Unchanged => self.unchanged += 1,
            Reconciliation::Failed => self.failed += 1,
        }
    }
}

/// One browser and one store connection, held for a whole run
pub struct Session<D> {
    collector: ListingCollector<D>,
    store: Arc<dyn ListingStore>,
}

impl<D: PageDriver> Session<D> {
    pub fn new(collector: ListingCollector<D>, store: Arc<dyn ListingStore>) -> Self {
        Self { collector, store }
    }

    /// Collect, then re-check up to `recheck_limit` stored active listings.
    ///
    /// A block page aborts the run with [`ScrapeError::Blocked`]; whatever was
    /// written before stays written.
    pub async fn run(&mut self, recheck_limit: i64) -> Result<RunSummary> {
        let mut summary = RunSummary::default();

        let result = async {
            self.collect(&mut summary).await?;
            if recheck_limit > 0 {
                self.recheck(recheck_limit, &mut summary).await?;
            }
            Ok::<_, anyhow::Error>(())
        }
        .await;

        summary.log();
        result.map(|()| summary)
    }

    /// Enumerate every listing url first, then extract and reconcile each one
    pub async fn collect(&mut self, summary: &mut RunSummary) -> Result<()> {
        let max_pages = self.collector.options().max_pages;
        let urls = self
            .collector
            .enumerate(max_pages)
            .collect::<Result<Vec<String>, ScrapeError>>();
        summary.pages_visited = self.collector.pages_visited();
        let urls = urls?;

        summary.discovered = urls.len();
        info!("Found {} listings on {} pages", urls.len(), summary.pages_visited);

        for (i, url) in urls.iter().enumerate() {
            info!("Processing listing {} of {}", i + 1, urls.len());

            let record = match self.collector.extract(url, i == 0) {
                Ok(Some(record)) => record,
                Ok(None) => {
                    summary.skipped += 1;
                    continue;
                }
                Err(e) if e.is_blocked() => return Err(e.into()),
                Err(e) => {
                    warn!("Failed to extract {}: {}", url, e);
                    summary.failed += 1;
                    continue;
                }
            };

            summary.count(upsert(self.store.as_ref(), &record).await);
            summary.records.push(record);
        }

        Ok(())
    }

    /// Revisit the oldest stored active listings and flag the removed ones
    pub async fn recheck(&mut self, limit: i64, summary: &mut RunSummary) -> Result<()> {
        let listings = self.store.active_listings(limit).await?;
        info!("Re-checking {} active listings", listings.len());

        for (i, listing) in listings.iter().enumerate() {
            match self.collector.probe(&listing.url, i == 0) {
                Ok(Liveness::Active) => {}
                Ok(Liveness::Removed) => match self.store.mark_inactive(&listing.id).await {
                    Ok(()) => {
                        info!("Listing {} marked inactive", listing.id);
                        summary.marked_inactive += 1;
                    }
                    Err(e) => {
                        error!("Error updating listing {}: {:#}", listing.id, e);
                        summary.failed += 1;
                    }
                },
                Err(e) if e.is_blocked() => return Err(e.into()),
                Err(e) => {
                    warn!("Failed to re-check {}: {}", listing.url, e);
                    summary.failed += 1;
                }
            }
            summary.rechecked += 1;
        }

        Ok(())
    }

    /// Release the store connection and hand the driver back for shutdown
    pub async fn close(self) -> D {
        self.store.close().await;
        self.collector.into_driver()
    }
}

/// Write `records` as a pretty-printed JSON array
pub async fn export_records(path: &Path, records: &[ListingRecord]) -> Result<()> {
    let json = serde_json::to_string_pretty(records)?;
    tokio::fs::write(path, json)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Saved {} listings to {}", records.len(), path.display());
    Ok(())
}
