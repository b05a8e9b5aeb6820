use super::ListingStore;
use crate::models::{ActiveListing, ListingRecord};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use tracing::info;

/// `observed_listings` table in PostgreSQL
pub struct PostgresListingStore {
    pool: PgPool,
}

impl PostgresListingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a single-connection pool and bring the schema up to date
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(1)
            .connect(database_url)
            .await
            .context("Failed to connect to database")?;
        info!("DB connection set");

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("Failed to run database migrations")?;

        Ok(Self::new(pool))
    }
}

#[async_trait]
impl ListingStore for PostgresListingStore {
    async fn stored_active(&self, id: &str) -> Result<Option<bool>> {
        sqlx::query_scalar::<_, bool>("SELECT active FROM observed_listings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .context("Failed to look up listing")
    }

    async fn insert(&self, record: &ListingRecord) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            INSERT INTO observed_listings (
                id, url, active, price, rooms, bathrooms, surface,
                street_name, city, full_address, features, observed_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(&record.id)
        .bind(&record.url)
        .bind(record.active)
        .bind(record.price)
        .bind(record.rooms)
        .bind(record.bathrooms)
        .bind(record.surface)
        .bind(&record.street_name)
        .bind(&record.city)
        .bind(&record.full_address)
        .bind(serde_json::to_value(&record.features)?)
        .bind(record.observed_at)
        .execute(&mut *tx)
        .await
        .context("Failed to insert listing")?;

        // An early return above drops `tx`, which rolls it back.
        tx.commit().await.context("Failed to commit listing insert")?;
        Ok(())
    }

    async fn mark_inactive(&self, id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        sqlx::query(
            r#"
            UPDATE observed_listings
            SET active = false, last_updated = NOW()
            WHERE id = $1 AND active
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .context("Failed to mark listing inactive")?;

        tx.commit().await.context("Failed to commit listing update")?;
        Ok(())
    }

    async fn active_listings(&self, limit: i64) -> Result<Vec<ActiveListing>> {
        let rows = sqlx::query(
            r#"
            SELECT id, url
            FROM observed_listings
            WHERE active
            ORDER BY observed_at ASC
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list active listings")?;

        Ok(rows
            .into_iter()
            .map(|r| ActiveListing {
                id: r.get("id"),
                url: r.get("url"),
            })
            .collect())
    }

    async fn close(&self) {
        self.pool.close().await;
        info!("DB connection closed");
    }
}
