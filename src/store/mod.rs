use crate::models::{ActiveListing, ListingRecord};
use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, error, info};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryListingStore;
pub use postgres::PostgresListingStore;

/// Table of every listing ever observed, one row per id
#[async_trait]
pub trait ListingStore: Send + Sync {
    /// Stored `active` flag of `id`, `None` when the id was never inserted
    async fn stored_active(&self, id: &str) -> Result<Option<bool>>;

    async fn exists(&self, id: &str) -> Result<bool> {
        Ok(self.stored_active(id).await?.is_some())
    }

    /// Insert a full record. Inserting an id that already exists is a no-op.
    async fn insert(&self, record: &ListingRecord) -> Result<()>;

    /// Flip `active` to false and stamp `last_updated`; no other column changes
    async fn mark_inactive(&self, id: &str) -> Result<()>;

    /// Active listings, oldest observation first
    async fn active_listings(&self, limit: i64) -> Result<Vec<ActiveListing>>;

    /// Release the underlying connection
    async fn close(&self) {}
}

/// What [`upsert`] did with a record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciliation {
    Inserted,
    MarkedInactive,
    Unchanged,
    Failed,
}

/// Reconcile a freshly observed record with the store.
///
/// New ids are inserted in full. A known id is only written when it was stored
/// active and is now observed inactive. Listings that stay active keep the
/// data of their first insert. Store errors are logged and reported as
/// [`Reconciliation::Failed`] rather than returned.
pub async fn upsert(store: &dyn ListingStore, record: &ListingRecord) -> Reconciliation {
    let stored = match store.stored_active(&record.id).await {
        Ok(stored) => stored,
        Err(e) => {
            error!("Error looking up listing {}: {:#}", record.id, e);
            return Reconciliation::Failed;
        }
    };

    match stored {
        None => match store.insert(record).await {
            Ok(()) => {
                info!("Listing {} inserted", record.id);
                Reconciliation::Inserted
            }
            Err(e) => {
                error!("Error inserting listing {}: {:#}", record.id, e);
                Reconciliation::Failed
            }
        },
        Some(true) if !record.active => match store.mark_inactive(&record.id).await {
            Ok(()) => {
                info!("Listing {} marked inactive", record.id);
                Reconciliation::MarkedInactive
            }
            Err(e) => {
                error!("Error updating listing {}: {:#}", record.id, e);
                Reconciliation::Failed
            }
        },
        Some(_) => {
            debug!("Listing {} already stored, nothing to write", record.id);
            Reconciliation::Unchanged
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(id: &str, active: bool, price: Option<i64>) -> ListingRecord {
        let mut record = ListingRecord::inactive(
            id.to_string(),
            format!("https://www.fotocasa.es/es/alquiler/vivienda/x/y/{id}/d"),
            Utc::now(),
        );
        record.active = active;
        record.price = price;
        record.city = "Barcelona".to_string();
        record
    }

    #[tokio::test]
    async fn new_listing_is_inserted() {
        let store = InMemoryListingStore::new();

        let outcome = upsert(&store, &record("1", true, Some(900))).await;
        assert_eq!(outcome, Reconciliation::Inserted);
        assert!(store.exists("1").await.unwrap());
        assert_eq!(store.writes(), 1);
    }

    #[tokio::test]
    async fn known_active_listing_is_not_written() {
        let store = InMemoryListingStore::new();
        upsert(&store, &record("1", true, Some(900))).await;
        let before = store.writes();

        let outcome = upsert(&store, &record("1", true, Some(1100))).await;
        assert_eq!(outcome, Reconciliation::Unchanged);
        assert_eq!(store.writes(), before);
        assert_eq!(store.get("1").unwrap().record.price, Some(900));
    }

    #[tokio::test]
    async fn newly_inactive_listing_flips_only_active() {
        let store = InMemoryListingStore::new();
        let first_seen = record("1", true, Some(900));
        upsert(&store, &first_seen).await;

        let outcome = upsert(&store, &record("1", false, None)).await;
        assert_eq!(outcome, Reconciliation::MarkedInactive);

        let stored = store.get("1").unwrap();
        assert!(!stored.record.active);
        assert!(stored.last_updated.is_some());
        assert_eq!(
            ListingRecord {
                active: true,
                ..stored.record
            },
            first_seen
        );
    }

    #[tokio::test]
    async fn already_inactive_listing_is_not_written() {
        let store = InMemoryListingStore::new();
        upsert(&store, &record("1", false, None)).await;
        let before = store.writes();

        let outcome = upsert(&store, &record("1", false, None)).await;
        assert_eq!(outcome, Reconciliation::Unchanged);
        assert_eq!(store.writes(), before);
    }

    #[tokio::test]
    async fn store_errors_are_isolated() {
        let store = InMemoryListingStore::new();
        store.fail_writes(true);

        let outcome = upsert(&store, &record("1", true, Some(900))).await;
        assert_eq!(outcome, Reconciliation::Failed);
        assert!(!store.exists("1").await.unwrap());

        store.fail_writes(false);
        let outcome = upsert(&store, &record("2", true, Some(900))).await;
        assert_eq!(outcome, Reconciliation::Inserted);
    }
}
