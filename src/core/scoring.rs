use chrono::{DateTime, Utc};

use crate::core::distance::DistanceEstimate;
use crate::models::{ComparableListing, PropertyDetails, PropertyFeatures, SimilarityWeights};

/// Calculate area proximity score (0-1)
///
/// Smaller relative deviation from the target area scores higher; a
/// candidate twice (or half) the target size scores zero.
#[inline]
pub fn area_proximity_score(candidate_area: f64, target_area: f64) -> f64 {
    if target_area <= 0.0 || candidate_area <= 0.0 {
        return 0.0;
    }

    let deviation = (candidate_area - target_area).abs() / target_area;
    1.0 - deviation.min(1.0)
}

/// Calculate residential feature overlap (0-1)
///
/// Each attribute present on both sides contributes a bounded increment;
/// the total is normalized by the attributes that were actually
/// comparable. Returns None when the target is not residential or no
/// attribute overlaps, in which case the similarity falls back to area
/// and recency alone.
pub fn feature_overlap_score(
    listing: &ComparableListing,
    details: &PropertyDetails,
) -> Option<f64> {
    let PropertyDetails::Residential {
        room_count,
        building_age,
        floor,
        has_elevator,
        has_parking,
        has_balcony,
        ..
    } = details
    else {
        return None;
    };

    let mut score = 0.0;
    let mut max_score = 0.0;

    if let (Some(target), Some(candidate)) = (room_count, listing.room_count) {
        max_score += 1.0;
        let diff = target.abs_diff(candidate);
        score += match diff {
            0 => 1.0,
            1 => 0.5,
            _ => 0.0,
        };
    }

    if let (Some(target), Some(candidate)) = (building_age, listing.building_age) {
        max_score += 1.0;
        // A 20-year age gap exhausts the increment
        let deviation = f64::from(target.abs_diff(candidate)) / 20.0;
        score += 1.0 - deviation.min(1.0);
    }

    if let (Some(target), Some(candidate)) = (floor, listing.floor) {
        max_score += 1.0;
        let diff = (i32::from(*target) - i32::from(candidate)).abs();
        score += match diff {
            0 => 1.0,
            1 | 2 => 0.5,
            _ => 0.0,
        };
    }

    for (target, candidate) in [
        (has_elevator, listing.has_elevator),
        (has_parking, listing.has_parking),
        (has_balcony, listing.has_balcony),
    ] {
        if let (Some(t), Some(c)) = (target, candidate) {
            max_score += 0.5;
            if *t == c {
                score += 0.5;
            }
        }
    }

    if max_score > 0.0 {
        Some(score / max_score)
    } else {
        None
    }
}

/// Calculate recency score (0-1)
///
/// Exponential decay: a listing as old as the half-life weighs half as
/// much as one crawled today.
#[inline]
pub fn recency_score(age_days: f64, half_life_days: f64) -> f64 {
    if half_life_days <= 0.0 {
        return 1.0;
    }
    0.5_f64.powf(age_days.max(0.0) / half_life_days)
}

/// Calculate the composite similarity (0-1) of one comparable
///
/// Weighted combination of area proximity, feature overlap and recency.
/// Components without evidence are dropped and the remaining weights are
/// renormalized, so a land comparable is not penalized for having no
/// room count.
pub fn calculate_similarity(
    listing: &ComparableListing,
    features: &PropertyFeatures,
    weights: &SimilarityWeights,
    half_life_days: f64,
    now: DateTime<Utc>,
) -> f64 {
    let mut weighted = weights.area * area_proximity_score(listing.area, features.area);
    let mut total_weight = weights.area;

    if let Some(overlap) = feature_overlap_score(listing, &features.details) {
        weighted += weights.features * overlap;
        total_weight += weights.features;
    }

    weighted += weights.recency * recency_score(listing.age_days(now), half_life_days);
    total_weight += weights.recency;

    if total_weight > 0.0 {
        (weighted / total_weight).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

/// Combine similarity and distance into a single raw weight
///
/// Inverse-distance damping keeps nearby evidence dominant; imprecise
/// (textually placed) comparables are damped further by the configured
/// penalty. Raw weights are sum-normalized by the estimator.
#[inline]
pub fn raw_weight(similarity: f64, distance: DistanceEstimate, textual_penalty: f64) -> f64 {
    let base = similarity / (1.0 + distance.km.max(0.0));
    if distance.precise {
        base
    } else {
        base * textual_penalty.clamp(0.0, 1.0)
    }
}
