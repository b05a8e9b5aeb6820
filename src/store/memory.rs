use super::ListingStore;
use crate::models::{ActiveListing, ListingRecord};
use anyhow::{anyhow, bail, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

/// A stored row
#[derive(Debug, Clone, PartialEq)]
pub struct StoredListing {
    pub record: ListingRecord,
    pub last_updated: Option<DateTime<Utc>>,
}

/// Process-local store, used for dry runs
#[derive(Debug, Default)]
pub struct InMemoryListingStore {
    rows: Mutex<HashMap<String, StoredListing>>,
    writes: AtomicUsize,
    fail_writes: AtomicBool,
}

impl InMemoryListingStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn get(&self, id: &str) -> Option<StoredListing> {
        self.rows.lock().ok()?.get(id).cloned()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rows.lock().map(|rows| rows.len()).unwrap_or(0)
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of successful inserts and updates
    #[cfg(test)]
    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Make every following write fail, as a broken connection would
    #[cfg(test)]
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn rows(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, StoredListing>>> {
        self.rows.lock().map_err(|_| anyhow!("listing store lock poisoned"))
    }

    fn check_writable(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("store unavailable");
        }
        Ok(())
    }
}

#[async_trait]
impl ListingStore for InMemoryListingStore {
    async fn stored_active(&self, id: &str) -> Result<Option<bool>> {
        Ok(self.rows()?.get(id).map(|row| row.record.active))
    }

    async fn insert(&self, record: &ListingRecord) -> Result<()> {
        self.check_writable()?;
        let mut rows = self.rows()?;
        if !rows.contains_key(&record.id) {
            rows.insert(
                record.id.clone(),
                StoredListing {
                    record: record.clone(),
                    last_updated: None,
                },
            );
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn mark_inactive(&self, id: &str) -> Result<()> {
        self.check_writable()?;
        let mut rows = self.rows()?;
        if let Some(row) = rows.get_mut(id).filter(|row| row.record.active) {
            row.record.active = false;
            row.last_updated = Some(Utc::now());
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
        Ok(())
    }

    async fn active_listings(&self, limit: i64) -> Result<Vec<ActiveListing>> {
        let rows = self.rows()?;
        let mut active: Vec<&StoredListing> = rows.values().filter(|row| row.record.active).collect();
        active.sort_by_key(|row| row.record.observed_at);

        Ok(active
            .into_iter()
            .take(usize::try_from(limit).unwrap_or(0))
            .map(|row| ActiveListing {
                id: row.record.id.clone(),
                url: row.record.url.clone(),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn active(id: &str, age_minutes: i64) -> ListingRecord {
        let mut record = ListingRecord::inactive(
            id.to_string(),
            format!("https://www.fotocasa.es/a/{id}/d"),
            Utc::now() - Duration::minutes(age_minutes),
        );
        record.active = true;
        record
    }

    #[tokio::test]
    async fn active_listings_oldest_first() {
        let store = InMemoryListingStore::new();
        store.insert(&active("new", 1)).await.unwrap();
        store.insert(&active("old", 60)).await.unwrap();
        store.insert(&active("mid", 30)).await.unwrap();
        store.mark_inactive("mid").await.unwrap();

        let ids: Vec<String> = store
            .active_listings(10)
            .await
            .unwrap()
            .into_iter()
            .map(|l| l.id)
            .collect();
        assert_eq!(ids, vec!["old".to_string(), "new".to_string()]);

        assert_eq!(store.active_listings(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn duplicate_insert_keeps_first_row() {
        let store = InMemoryListingStore::new();
        let mut first = active("1", 5);
        first.price = Some(800);
        let mut second = active("1", 0);
        second.price = Some(950);

        assert!(store.is_empty());
        store.insert(&first).await.unwrap();
        store.insert(&second).await.unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.writes(), 1);
        assert_eq!(store.get("1").unwrap().record.price, Some(800));
    }
}
