use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use validator::Validate;

/// Property category. Valuations never compare across categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    Residential,
    Land,
    Commercial,
    Industrial,
    Agricultural,
}

impl std::fmt::Display for PropertyType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PropertyType::Residential => "residential",
            PropertyType::Land => "land",
            PropertyType::Commercial => "commercial",
            PropertyType::Industrial => "industrial",
            PropertyType::Agricultural => "agricultural",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for PropertyType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "residential" => Ok(PropertyType::Residential),
            "land" => Ok(PropertyType::Land),
            "commercial" => Ok(PropertyType::Commercial),
            "industrial" => Ok(PropertyType::Industrial),
            "agricultural" => Ok(PropertyType::Agricultural),
            other => Err(format!("unknown property type: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    Sale,
    Rent,
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionType::Sale => write!(f, "sale"),
            TransactionType::Rent => write!(f, "rent"),
        }
    }
}

impl FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sale" => Ok(TransactionType::Sale),
            "rent" => Ok(TransactionType::Rent),
            other => Err(format!("unknown transaction type: {}", other)),
        }
    }
}

/// Geographic input for a valuation. The textual fields let the engine
/// place comparables that were crawled without coordinates.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct LocationPoint {
    #[validate(range(min = -90.0, max = 90.0))]
    pub lat: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub lng: f64,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
}

/// Category-specific attributes, tagged by property type on the wire.
///
/// Only residential properties carry attributes that feed the similarity
/// scorer; the remaining categories are valued on area, distance and
/// recency alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "propertyType", rename_all = "lowercase")]
pub enum PropertyDetails {
    Residential {
        #[serde(rename = "roomCount", default)]
        room_count: Option<u8>,
        #[serde(rename = "buildingAge", default)]
        building_age: Option<u8>,
        #[serde(default)]
        floor: Option<i16>,
        #[serde(rename = "totalFloors", default)]
        total_floors: Option<u8>,
        #[serde(rename = "hasElevator", default)]
        has_elevator: Option<bool>,
        #[serde(rename = "hasParking", default)]
        has_parking: Option<bool>,
        #[serde(rename = "hasBalcony", default)]
        has_balcony: Option<bool>,
        #[serde(default)]
        heating: Option<String>,
        #[serde(default)]
        furnished: Option<bool>,
    },
    Land {},
    Commercial {},
    Industrial {},
    Agricultural {},
}

impl PropertyDetails {
    pub fn category(&self) -> PropertyType {
        match self {
            PropertyDetails::Residential { .. } => PropertyType::Residential,
            PropertyDetails::Land {} => PropertyType::Land,
            PropertyDetails::Commercial {} => PropertyType::Commercial,
            PropertyDetails::Industrial {} => PropertyType::Industrial,
            PropertyDetails::Agricultural {} => PropertyType::Agricultural,
        }
    }
}

/// Target property description supplied by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyFeatures {
    pub area: f64,
    #[serde(rename = "transactionType", default)]
    pub transaction_type: Option<TransactionType>,
    #[serde(flatten)]
    pub details: PropertyDetails,
}

impl PropertyFeatures {
    pub fn category(&self) -> PropertyType {
        self.details.category()
    }
}

/// A crawled listing used as valuation evidence. Read-only for the engine;
/// the listings store owns these records.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComparableListing {
    pub id: String,
    pub category: PropertyType,
    #[serde(rename = "transactionType")]
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub district: Option<String>,
    #[serde(default)]
    pub neighborhood: Option<String>,
    pub area: f64,
    pub price: f64,
    #[serde(rename = "crawledAt")]
    pub crawled_at: DateTime<Utc>,
    #[serde(rename = "roomCount", default)]
    pub room_count: Option<u8>,
    #[serde(rename = "buildingAge", default)]
    pub building_age: Option<u8>,
    #[serde(default)]
    pub floor: Option<i16>,
    #[serde(rename = "hasElevator", default)]
    pub has_elevator: Option<bool>,
    #[serde(rename = "hasParking", default)]
    pub has_parking: Option<bool>,
    #[serde(rename = "hasBalcony", default)]
    pub has_balcony: Option<bool>,
}

impl ComparableListing {
    /// Price per square meter, or None for listings with a non-positive
    /// area. Such listings never enter the aggregation.
    pub fn unit_price(&self) -> Option<f64> {
        if self.area > 0.0 {
            Some(self.price / self.area)
        } else {
            None
        }
    }

    pub fn coordinates(&self) -> Option<(f64, f64)> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some((lat, lng)),
            _ => None,
        }
    }

    /// Listing age in days relative to `now`, floored at zero.
    pub fn age_days(&self, now: DateTime<Utc>) -> f64 {
        let days = (now - self.crawled_at).num_seconds() as f64 / 86_400.0;
        days.max(0.0)
    }
}

/// A comparable retained in the result, paired with the evidence metrics
/// the engine derived for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredComparable {
    pub listing: ComparableListing,
    #[serde(rename = "unitPrice")]
    pub unit_price: f64,
    #[serde(rename = "distanceKm")]
    pub distance_km: f64,
    /// False when the distance came from district/neighborhood overlap
    /// rather than coordinates.
    #[serde(rename = "preciseLocation")]
    pub precise_location: bool,
    pub similarity: f64,
    /// Normalized weight; sums to 1.0 across the retained comparables.
    pub weight: f64,
}

/// Aggregate statistics over the comparables that backed an estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSummary {
    #[serde(rename = "sampleSize")]
    pub sample_size: usize,
    #[serde(rename = "meanUnitPrice")]
    pub mean_unit_price: f64,
    #[serde(rename = "unitPriceStdDev")]
    pub unit_price_std_dev: f64,
    #[serde(rename = "searchRadiusKm")]
    pub search_radius_km: f64,
}

/// Outcome of a successful valuation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationResult {
    #[serde(rename = "estimatedValue")]
    pub estimated_value: f64,
    #[serde(rename = "minValue")]
    pub min_value: f64,
    #[serde(rename = "maxValue")]
    pub max_value: f64,
    #[serde(rename = "pricePerSqm")]
    pub price_per_sqm: f64,
    #[serde(rename = "confidenceScore")]
    pub confidence_score: f64,
    /// Set when fewer usable comparables than the configured minimum
    /// backed the estimate. Confidence is capped while this is true.
    #[serde(rename = "lowConfidence")]
    pub low_confidence: bool,
    #[serde(rename = "comparableProperties")]
    pub comparables: Vec<ScoredComparable>,
    #[serde(rename = "marketAnalysis")]
    pub market: MarketSummary,
}

/// Geospatial bounding box
#[derive(Debug, Clone, Copy)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

/// Store query for candidate comparables
#[derive(Debug, Clone)]
pub struct ComparableQuery {
    pub category: PropertyType,
    pub transaction_type: Option<TransactionType>,
    pub bounding_box: BoundingBox,
    pub district: Option<String>,
    pub neighborhood: Option<String>,
    pub limit: usize,
}

/// Similarity component weights
#[derive(Debug, Clone, Copy)]
pub struct SimilarityWeights {
    pub area: f64,
    pub features: f64,
    pub recency: f64,
}

impl Default for SimilarityWeights {
    fn default() -> Self {
        Self {
            area: 0.45,
            features: 0.30,
            recency: 0.25,
        }
    }
}
