use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::core::distance::{calculate_bounding_box, comparable_distance};
use crate::core::scoring::{calculate_similarity, raw_weight};
use crate::core::selector::select_candidates;
use crate::models::{
    ComparableListing, ComparableQuery, LocationPoint, MarketSummary, PropertyFeatures,
    ScoredComparable, SimilarityWeights, ValuationResult,
};

/// Errors produced by the valuation engine
#[derive(Debug, Error)]
pub enum ValuationError {
    /// Bad input shape or range; nothing was computed.
    #[error("invalid input: {0}")]
    Validation(String),

    /// Too few usable comparables to estimate. A business outcome, not a
    /// computational failure; callers may retry with a wider radius.
    #[error("insufficient comparable data: {found} usable comparables within {radius_km} km")]
    InsufficientData {
        found: usize,
        radius_km: f64,
        suggested_radius_km: f64,
    },

    /// The comparable store failed or was unreachable. Retryable.
    #[error("comparable data source unavailable: {0}")]
    DataSource(String),
}

/// Engine parameters. All of these are tunable configuration; the
/// defaults are starting points meant to be calibrated against closed
/// sales, not constants of the algorithm.
#[derive(Debug, Clone, Copy)]
pub struct ValuationParams {
    /// Coarse pre-filter radius around the target, in kilometers.
    pub search_radius_km: f64,
    /// Top-K cap on comparables entering the aggregation and the result.
    pub max_comparables: usize,
    /// Below this many usable comparables the result is flagged
    /// low-confidence and capped.
    pub min_comparables: usize,
    /// Confidence ceiling applied to low-confidence results.
    pub low_confidence_cap: f64,
    /// Comparable count at which the count component of confidence
    /// saturates.
    pub full_evidence_count: usize,
    /// Listing age at which recency weight halves, in days.
    pub recency_half_life_days: f64,
    /// Weight multiplier for comparables placed by address text instead
    /// of coordinates.
    pub textual_distance_penalty: f64,
    /// Relative half-width of the value band when only one comparable
    /// is available.
    pub single_comparable_band: f64,
}

impl Default for ValuationParams {
    fn default() -> Self {
        Self {
            search_radius_km: 5.0,
            max_comparables: 15,
            min_comparables: 3,
            low_confidence_cap: 40.0,
            full_evidence_count: 10,
            recency_half_life_days: 90.0,
            textual_distance_penalty: 0.75,
            single_comparable_band: 0.15,
        }
    }
}

/// Main valuation orchestrator
///
/// # Pipeline stages
/// 1. Input validation
/// 2. Candidate selection (category, transaction, search area, usability)
/// 3. Per-candidate distance, similarity and weight
/// 4. Ranked weighted aggregation into an estimate, band and confidence
#[derive(Debug, Clone)]
pub struct ValuationEngine {
    weights: SimilarityWeights,
    params: ValuationParams,
}

impl ValuationEngine {
    pub fn new(weights: SimilarityWeights, params: ValuationParams) -> Self {
        Self { weights, params }
    }

    pub fn with_defaults() -> Self {
        Self {
            weights: SimilarityWeights::default(),
            params: ValuationParams::default(),
        }
    }

    pub fn params(&self) -> &ValuationParams {
        &self.params
    }

    /// Validate the caller's input before any computation.
    pub fn validate_input(
        location: &LocationPoint,
        features: &PropertyFeatures,
    ) -> Result<(), ValuationError> {
        if !location.lat.is_finite() || location.lat < -90.0 || location.lat > 90.0 {
            return Err(ValuationError::Validation(format!(
                "latitude {} out of range [-90, 90]",
                location.lat
            )));
        }
        if !location.lng.is_finite() || location.lng < -180.0 || location.lng > 180.0 {
            return Err(ValuationError::Validation(format!(
                "longitude {} out of range [-180, 180]",
                location.lng
            )));
        }
        if !features.area.is_finite() || features.area <= 0.0 {
            return Err(ValuationError::Validation(format!(
                "area must be positive, got {}",
                features.area
            )));
        }
        Ok(())
    }

    /// Build the store query for a valuation request.
    pub fn candidate_query(
        &self,
        location: &LocationPoint,
        features: &PropertyFeatures,
        radius_km: Option<f64>,
    ) -> Result<ComparableQuery, ValuationError> {
        Self::validate_input(location, features)?;
        let radius = self.effective_radius(radius_km)?;

        Ok(ComparableQuery {
            category: features.category(),
            transaction_type: features.transaction_type,
            bounding_box: calculate_bounding_box(location.lat, location.lng, radius),
            district: location.district.clone(),
            neighborhood: location.neighborhood.clone(),
            limit: self.params.max_comparables * 10,
        })
    }

    /// Estimate the market value of the target from the given candidates.
    ///
    /// Candidates may be broader than the search area (e.g. a coarse SQL
    /// pre-filter); selection is re-applied here so the engine is correct
    /// regardless of how well the store filtered. Pure: same inputs and
    /// `now` produce the same result.
    pub fn appraise(
        &self,
        location: &LocationPoint,
        features: &PropertyFeatures,
        candidates: Vec<ComparableListing>,
        radius_km: Option<f64>,
        now: DateTime<Utc>,
    ) -> Result<ValuationResult, ValuationError> {
        Self::validate_input(location, features)?;
        let radius = self.effective_radius(radius_km)?;
        let query = self.candidate_query(location, features, Some(radius))?;

        let usable = select_candidates(candidates, &query, location, features);

        let mut scored: Vec<ScoredComparable> = usable
            .into_iter()
            .filter_map(|listing| {
                let distance = comparable_distance(location, &listing)?;
                if distance.km > radius {
                    return None;
                }

                let unit_price = listing.unit_price()?;
                let similarity = calculate_similarity(
                    &listing,
                    features,
                    &self.weights,
                    self.params.recency_half_life_days,
                    now,
                );
                let weight =
                    raw_weight(similarity, distance, self.params.textual_distance_penalty);

                Some(ScoredComparable {
                    listing,
                    unit_price,
                    distance_km: distance.km,
                    precise_location: distance.precise,
                    similarity,
                    weight,
                })
            })
            .collect();

        if scored.is_empty() {
            return Err(ValuationError::InsufficientData {
                found: 0,
                radius_km: radius,
                suggested_radius_km: radius * 2.0,
            });
        }

        // Rank by weight; ties go to the more recent listing, then to the
        // smaller area difference.
        scored.sort_by(|a, b| {
            b.weight
                .partial_cmp(&a.weight)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.listing.crawled_at.cmp(&a.listing.crawled_at))
                .then_with(|| {
                    let da = (a.listing.area - features.area).abs();
                    let db = (b.listing.area - features.area).abs();
                    da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
                })
        });
        scored.truncate(self.params.max_comparables);

        let count = scored.len();
        let raw_total: f64 = scored.iter().map(|c| c.weight).sum();
        let mean_raw_weight = raw_total / count as f64;

        // Sum-normalize so the retained weights add up to 1.0.
        if raw_total > 0.0 {
            for comp in &mut scored {
                comp.weight /= raw_total;
            }
        } else {
            let uniform = 1.0 / count as f64;
            for comp in &mut scored {
                comp.weight = uniform;
            }
        }

        let mean_unit_price: f64 = scored.iter().map(|c| c.weight * c.unit_price).sum();
        let variance: f64 = scored
            .iter()
            .map(|c| c.weight * (c.unit_price - mean_unit_price).powi(2))
            .sum();
        let std_dev = variance.sqrt();

        let band = if count == 1 {
            mean_unit_price * self.params.single_comparable_band
        } else {
            std_dev
        };

        let estimated_value = mean_unit_price * features.area;
        let min_value = ((mean_unit_price - band).max(0.0)) * features.area;
        let max_value = (mean_unit_price + band) * features.area;

        let low_confidence = count < self.params.min_comparables;
        let confidence_score = self.confidence(count, mean_raw_weight, mean_unit_price, std_dev);
        let confidence_score = if low_confidence {
            confidence_score.min(self.params.low_confidence_cap)
        } else {
            confidence_score
        };

        Ok(ValuationResult {
            estimated_value,
            min_value,
            max_value,
            price_per_sqm: mean_unit_price,
            confidence_score,
            low_confidence,
            comparables: scored,
            market: MarketSummary {
                sample_size: count,
                mean_unit_price,
                unit_price_std_dev: std_dev,
                search_radius_km: radius,
            },
        })
    }

    fn effective_radius(&self, radius_km: Option<f64>) -> Result<f64, ValuationError> {
        let radius = radius_km.unwrap_or(self.params.search_radius_km);
        if !radius.is_finite() || radius <= 0.0 {
            return Err(ValuationError::Validation(format!(
                "search radius must be positive, got {}",
                radius
            )));
        }
        Ok(radius)
    }

    /// Confidence (0-100) from evidence count, weight concentration and
    /// unit-price dispersion. More, closer and more similar comparables
    /// with tighter prices score higher.
    fn confidence(&self, count: usize, mean_raw_weight: f64, mean: f64, std_dev: f64) -> f64 {
        let count_score =
            (count as f64 / self.params.full_evidence_count.max(1) as f64).min(1.0);
        let quality_score = mean_raw_weight.clamp(0.0, 1.0);
        let dispersion_score = if mean > 0.0 {
            1.0 / (1.0 + std_dev / mean)
        } else {
            0.0
        };

        (100.0 * (0.40 * count_score + 0.35 * quality_score + 0.25 * dispersion_score))
            .clamp(0.0, 100.0)
    }
}

impl Default for ValuationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}
