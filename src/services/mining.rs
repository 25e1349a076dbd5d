use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

use crate::models::{ComparableListing, ComparableQuery};
use crate::services::listings::{ComparableStore, StoreError};

/// HTTP client for the crawler/mining service
///
/// Alternative comparable source for deployments where listings are
/// served by the mining API rather than replicated into Postgres. The
/// service is treated as an opaque read-only collection.
pub struct MiningClient {
    base_url: String,
    api_key: String,
    client: Client,
}

impl MiningClient {
    pub fn new(base_url: String, api_key: String) -> Result<Self, StoreError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            base_url,
            api_key,
            client,
        })
    }

    /// Build the search query string. Attribute filters go in the
    /// `filters` array; geography is expressed as bounding-box params
    /// plus optional `district`/`neighborhood`, which the mining service
    /// unions: coordinates inside the box, or no coordinates and a
    /// matching district/neighborhood. Restricting on latitude in the
    /// filter array would drop every coordinate-less listing.
    fn build_search_query(query: &ComparableQuery) -> Result<String, StoreError> {
        let mut filters = vec![format!("equal(\"category\", \"{}\")", query.category)];

        if let Some(tt) = query.transaction_type {
            filters.push(format!("equal(\"transactionType\", \"{}\")", tt));
        }

        let filters_json = serde_json::to_string(&filters)
            .map_err(|e| StoreError::InvalidResponse(e.to_string()))?;

        let bbox = &query.bounding_box;
        let mut qs = format!(
            "filters={}&minLat={}&maxLat={}&minLng={}&maxLng={}&limit={}",
            urlencoding::encode(&filters_json),
            bbox.min_lat,
            bbox.max_lat,
            bbox.min_lon,
            bbox.max_lon,
            query.limit
        );

        if let Some(district) = &query.district {
            qs.push_str(&format!("&district={}", urlencoding::encode(district)));
        }
        if let Some(neighborhood) = &query.neighborhood {
            qs.push_str(&format!("&neighborhood={}", urlencoding::encode(neighborhood)));
        }

        Ok(qs)
    }
}

#[async_trait]
impl ComparableStore for MiningClient {
    async fn find_comparables(
        &self,
        query: &ComparableQuery,
    ) -> Result<Vec<ComparableListing>, StoreError> {
        let url = format!(
            "{}/listings/search?{}",
            self.base_url.trim_end_matches('/'),
            Self::build_search_query(query)?
        );

        tracing::debug!("Querying mining service: {}", url);

        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(StoreError::Api(format!(
                "Failed to query comparables: {}",
                response.status()
            )));
        }

        let json: Value = response.json().await?;

        let total = json.get("total").and_then(|t| t.as_u64()).unwrap_or(0);

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| StoreError::InvalidResponse("Missing documents array".into()))?;

        // Tolerate malformed records; the crawler occasionally emits
        // partial documents and one bad row must not sink a valuation.
        let listings: Vec<ComparableListing> = documents
            .iter()
            .filter_map(|doc| match serde_json::from_value(doc.clone()) {
                Ok(listing) => Some(listing),
                Err(e) => {
                    tracing::warn!("Skipping malformed mining document: {}", e);
                    None
                }
            })
            .collect();

        tracing::debug!("Mining service returned {} listings (total: {})", listings.len(), total);

        Ok(listings)
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        let url = format!("{}/health", self.base_url.trim_end_matches('/'));
        let response = self
            .client
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;

        Ok(response.status().is_success())
    }
}
