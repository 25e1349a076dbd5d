use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use std::time::Duration;
use thiserror::Error;

use crate::models::{ComparableListing, ComparableQuery};

/// Errors from a comparable store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    Api(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

/// Read-only query capability over the comparable-listings collection.
///
/// The engine and routes depend only on this trait; whether comparables
/// come from Postgres or the mining service API is a deployment choice.
#[async_trait]
pub trait ComparableStore: Send + Sync {
    /// Fetch candidates matching the coarse pre-filter. Implementations
    /// may over-approximate; the engine re-applies selection. Never
    /// mutates the underlying collection.
    async fn find_comparables(
        &self,
        query: &ComparableQuery,
    ) -> Result<Vec<ComparableListing>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}

/// PostgreSQL-backed comparable store
///
/// Reads the `comparable_listings` table maintained by the ingestion
/// pipeline. Coordinate-less rows are admitted by district/neighborhood
/// match so the engine can place them textually.
pub struct PostgresListingStore {
    pool: PgPool,
}

impl PostgresListingStore {
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(5))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL listings store");

        Self::new(url, max_connections.unwrap_or(10), min_connections.unwrap_or(1)).await
    }

    fn row_to_listing(row: &sqlx::postgres::PgRow) -> Option<ComparableListing> {
        let id: String = row.get("id");
        let category: String = row.get("category");
        let transaction_type: String = row.get("transaction_type");

        let category = match category.parse() {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!("Skipping listing {}: {}", id, e);
                return None;
            }
        };
        let transaction_type = match transaction_type.parse() {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("Skipping listing {}: {}", id, e);
                return None;
            }
        };

        let small = |name: &str| -> Option<u8> {
            row.get::<Option<i16>, _>(name)
                .and_then(|v| u8::try_from(v).ok())
        };

        Some(ComparableListing {
            id,
            category,
            transaction_type,
            latitude: row.get("latitude"),
            longitude: row.get("longitude"),
            district: row.get("district"),
            neighborhood: row.get("neighborhood"),
            area: row.get("area"),
            price: row.get("price"),
            crawled_at: row.get("crawled_at"),
            room_count: small("room_count"),
            building_age: small("building_age"),
            floor: row.get("floor"),
            has_elevator: row.get("has_elevator"),
            has_parking: row.get("has_parking"),
            has_balcony: row.get("has_balcony"),
        })
    }
}

#[async_trait]
impl ComparableStore for PostgresListingStore {
    async fn find_comparables(
        &self,
        query: &ComparableQuery,
    ) -> Result<Vec<ComparableListing>, StoreError> {
        let sql = r#"
            SELECT id, category, transaction_type, latitude, longitude,
                   district, neighborhood, area, price, crawled_at,
                   room_count, building_age, floor,
                   has_elevator, has_parking, has_balcony
            FROM comparable_listings
            WHERE category = $1
              AND ($2::text IS NULL OR transaction_type = $2)
              AND (
                (latitude BETWEEN $3 AND $4 AND longitude BETWEEN $5 AND $6)
                OR (
                  latitude IS NULL
                  AND (
                    ($7::text IS NOT NULL AND lower(district) = lower($7))
                    OR ($8::text IS NOT NULL AND lower(neighborhood) = lower($8))
                  )
                )
              )
            ORDER BY crawled_at DESC
            LIMIT $9
        "#;

        let rows = sqlx::query(sql)
            .bind(query.category.to_string())
            .bind(query.transaction_type.map(|t| t.to_string()))
            .bind(query.bounding_box.min_lat)
            .bind(query.bounding_box.max_lat)
            .bind(query.bounding_box.min_lon)
            .bind(query.bounding_box.max_lon)
            .bind(query.district.as_deref())
            .bind(query.neighborhood.as_deref())
            .bind(query.limit as i64)
            .fetch_all(&self.pool)
            .await?;

        let listings: Vec<ComparableListing> =
            rows.iter().filter_map(Self::row_to_listing).collect();

        tracing::debug!(
            "Fetched {} comparable listings for category {}",
            listings.len(),
            query.category
        );

        Ok(listings)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
