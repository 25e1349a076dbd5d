use std::collections::HashSet;

use crate::core::distance::is_within_bounding_box;
use crate::models::{ComparableListing, ComparableQuery, LocationPoint, PropertyFeatures};

/// Check if a listing belongs to the same category as the target.
///
/// Exact match only; cross-category evidence is never admitted.
#[inline]
pub fn matches_category(listing: &ComparableListing, features: &PropertyFeatures) -> bool {
    listing.category == features.category()
}

/// Check the transaction type when the caller specified one.
#[inline]
pub fn matches_transaction(listing: &ComparableListing, features: &PropertyFeatures) -> bool {
    match features.transaction_type {
        Some(tt) => listing.transaction_type == tt,
        None => true,
    }
}

/// Check if a listing lies inside the search area.
///
/// Located listings must fall inside the bounding box. Coordinate-less
/// listings are admitted on district or neighborhood overlap with the
/// target so the textual distance proxy can place them later.
#[inline]
pub fn within_search_area(
    listing: &ComparableListing,
    query: &ComparableQuery,
    target: &LocationPoint,
) -> bool {
    if let Some((lat, lng)) = listing.coordinates() {
        return is_within_bounding_box(lat, lng, &query.bounding_box);
    }

    let same = |a: Option<&str>, b: Option<&str>| match (a, b) {
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => false,
    };

    same(listing.neighborhood.as_deref(), target.neighborhood.as_deref())
        || same(listing.district.as_deref(), target.district.as_deref())
}

/// Check that a listing can contribute a unit price.
#[inline]
pub fn is_usable(listing: &ComparableListing) -> bool {
    listing.area > 0.0 && listing.price > 0.0
}

/// Narrow raw candidates to the usable comparable set.
///
/// Applies category, transaction, search-area and usability predicates and
/// drops duplicate ids, keeping the first occurrence. Returning an empty
/// vector is a valid outcome; the estimator decides what to do with it.
pub fn select_candidates(
    candidates: Vec<ComparableListing>,
    query: &ComparableQuery,
    target: &LocationPoint,
    features: &PropertyFeatures,
) -> Vec<ComparableListing> {
    let mut seen_ids: HashSet<String> = HashSet::new();

    candidates
        .into_iter()
        .filter(|listing| matches_category(listing, features))
        .filter(|listing| matches_transaction(listing, features))
        .filter(|listing| within_search_area(listing, query, target))
        .filter(|listing| is_usable(listing))
        .filter(|listing| seen_ids.insert(listing.id.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::distance::calculate_bounding_box;
    use crate::models::{PropertyDetails, PropertyType, TransactionType};
    use chrono::Utc;

    fn listing(id: &str, category: PropertyType, lat: f64, lng: f64) -> ComparableListing {
        ComparableListing {
            id: id.to_string(),
            category,
            transaction_type: TransactionType::Sale,
            latitude: Some(lat),
            longitude: Some(lng),
            district: None,
            neighborhood: None,
            area: 100.0,
            price: 800_000.0,
            crawled_at: Utc::now(),
            room_count: None,
            building_age: None,
            floor: None,
            has_elevator: None,
            has_parking: None,
            has_balcony: None,
        }
    }

    fn residential_features() -> PropertyFeatures {
        PropertyFeatures {
            area: 120.0,
            transaction_type: Some(TransactionType::Sale),
            details: PropertyDetails::Residential {
                room_count: Some(3),
                building_age: Some(5),
                floor: Some(2),
                total_floors: Some(6),
                has_elevator: Some(true),
                has_parking: Some(false),
                has_balcony: Some(true),
                heating: None,
                furnished: None,
            },
        }
    }

    fn istanbul() -> LocationPoint {
        LocationPoint {
            lat: 41.0082,
            lng: 28.9784,
            address: None,
            district: Some("Kadikoy".to_string()),
            neighborhood: None,
        }
    }

    fn query(target: &LocationPoint) -> ComparableQuery {
        ComparableQuery {
            category: PropertyType::Residential,
            transaction_type: Some(TransactionType::Sale),
            bounding_box: calculate_bounding_box(target.lat, target.lng, 5.0),
            district: target.district.clone(),
            neighborhood: target.neighborhood.clone(),
            limit: 100,
        }
    }

    #[test]
    fn test_category_exact_match() {
        let features = residential_features();

        assert!(matches_category(&listing("1", PropertyType::Residential, 41.0, 29.0), &features));
        assert!(!matches_category(&listing("2", PropertyType::Land, 41.0, 29.0), &features));
        assert!(!matches_category(&listing("3", PropertyType::Commercial, 41.0, 29.0), &features));
    }

    #[test]
    fn test_transaction_type_optional() {
        let mut features = residential_features();
        let rent = {
            let mut l = listing("1", PropertyType::Residential, 41.0, 29.0);
            l.transaction_type = TransactionType::Rent;
            l
        };

        assert!(!matches_transaction(&rent, &features));

        features.transaction_type = None;
        assert!(matches_transaction(&rent, &features));
    }

    #[test]
    fn test_select_filters_far_and_cross_category() {
        let target = istanbul();
        let features = residential_features();
        let q = query(&target);

        let candidates = vec![
            listing("near", PropertyType::Residential, 41.01, 28.98),
            listing("far", PropertyType::Residential, 39.93, 32.86), // Ankara
            listing("land", PropertyType::Land, 41.01, 28.98),
        ];

        let selected = select_candidates(candidates, &q, &target, &features);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "near");
    }

    #[test]
    fn test_select_drops_zero_area_and_duplicates() {
        let target = istanbul();
        let features = residential_features();
        let q = query(&target);

        let mut zero_area = listing("z", PropertyType::Residential, 41.01, 28.98);
        zero_area.area = 0.0;

        let candidates = vec![
            listing("a", PropertyType::Residential, 41.01, 28.98),
            listing("a", PropertyType::Residential, 41.01, 28.98),
            zero_area,
        ];

        let selected = select_candidates(candidates, &q, &target, &features);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].id, "a");
    }

    #[test]
    fn test_textual_listing_admitted_by_district() {
        let target = istanbul();
        let features = residential_features();
        let q = query(&target);

        let mut textual = listing("t", PropertyType::Residential, 0.0, 0.0);
        textual.latitude = None;
        textual.longitude = None;
        textual.district = Some("Kadikoy".to_string());

        let selected = select_candidates(vec![textual], &q, &target, &features);
        assert_eq!(selected.len(), 1);
    }

    #[test]
    fn test_empty_candidate_set_is_valid() {
        let target = istanbul();
        let features = residential_features();
        let q = query(&target);

        let selected = select_candidates(vec![], &q, &target, &features);
        assert!(selected.is_empty());
    }
}
