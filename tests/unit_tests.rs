// Unit tests for Emlak Algo

use chrono::{Duration, Utc};
use emlak_algo::core::{
    distance::{calculate_bounding_box, comparable_distance, haversine_distance, is_within_bounding_box},
    scoring::{area_proximity_score, calculate_similarity, recency_score},
    selector::{is_usable, matches_category, matches_transaction},
};
use emlak_algo::models::{
    ComparableListing, LocationPoint, PropertyDetails, PropertyFeatures, PropertyType,
    SimilarityWeights, TransactionType,
};

fn listing(id: &str, lat: f64, lng: f64, area: f64, price: f64) -> ComparableListing {
    ComparableListing {
        id: id.to_string(),
        category: PropertyType::Residential,
        transaction_type: TransactionType::Sale,
        latitude: Some(lat),
        longitude: Some(lng),
        district: None,
        neighborhood: None,
        area,
        price,
        crawled_at: Utc::now(),
        room_count: Some(3),
        building_age: Some(5),
        floor: Some(2),
        has_elevator: Some(true),
        has_parking: Some(false),
        has_balcony: Some(true),
    }
}

fn residential(area: f64) -> PropertyFeatures {
    PropertyFeatures {
        area,
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

#[test]
fn test_haversine_distance_zero() {
    let distance = haversine_distance(41.0082, 28.9784, 41.0082, 28.9784);
    assert!(distance < 0.01);
}

#[test]
fn test_haversine_distance_istanbul_neighborhoods() {
    // Kadikoy to Besiktas across the Bosphorus, roughly 6-10 km
    let distance = haversine_distance(40.9905, 29.0250, 41.0430, 29.0094);
    assert!(distance > 4.0 && distance < 12.0);
}

#[test]
fn test_haversine_symmetry() {
    let d1 = haversine_distance(41.0082, 28.9784, 39.9334, 32.8597);
    let d2 = haversine_distance(39.9334, 32.8597, 41.0082, 28.9784);
    assert!((d1 - d2).abs() < 1e-9);
}

#[test]
fn test_bounding_box_creation() {
    let bbox = calculate_bounding_box(41.0082, 28.9784, 10.0);

    assert!(bbox.min_lat < 41.0082);
    assert!(bbox.max_lat > 41.0082);
    assert!(bbox.min_lon < 28.9784);
    assert!(bbox.max_lon > 28.9784);

    // 20km span / 111km per degree = ~0.18 degrees of latitude
    let lat_span = bbox.max_lat - bbox.min_lat;
    assert!((lat_span - 0.18).abs() < 0.02);
}

#[test]
fn test_point_within_bbox() {
    let bbox = calculate_bounding_box(41.0082, 28.9784, 10.0);

    assert!(is_within_bounding_box(41.0082, 28.9784, &bbox));
    assert!(is_within_bounding_box(41.01, 28.98, &bbox));
    assert!(!is_within_bounding_box(39.93, 32.86, &bbox));
    assert!(!is_within_bounding_box(bbox.max_lat + 0.01, 28.98, &bbox));
}

#[test]
fn test_textual_distance_is_flagged_imprecise() {
    let target = LocationPoint {
        lat: 41.0082,
        lng: 28.9784,
        address: None,
        district: Some("Kadikoy".to_string()),
        neighborhood: Some("Moda".to_string()),
    };

    let mut textual = listing("t", 0.0, 0.0, 100.0, 800_000.0);
    textual.latitude = None;
    textual.longitude = None;
    textual.district = Some("Kadikoy".to_string());

    let estimate = comparable_distance(&target, &textual).unwrap();
    assert!(!estimate.precise);
    assert!(estimate.km > 0.0);
}

#[test]
fn test_category_must_match_exactly() {
    let features = residential(120.0);

    let mut land = listing("l", 41.0, 29.0, 500.0, 2_000_000.0);
    land.category = PropertyType::Land;

    assert!(matches_category(&listing("r", 41.0, 29.0, 120.0, 960_000.0), &features));
    assert!(!matches_category(&land, &features));
}

#[test]
fn test_transaction_filter_skipped_when_unspecified() {
    let mut features = residential(120.0);
    features.transaction_type = None;

    let mut rent = listing("r", 41.0, 29.0, 120.0, 25_000.0);
    rent.transaction_type = TransactionType::Rent;

    assert!(matches_transaction(&rent, &features));
}

#[test]
fn test_unusable_listings_rejected() {
    let mut zero_area = listing("z", 41.0, 29.0, 0.0, 800_000.0);
    assert!(!is_usable(&zero_area));

    zero_area.area = 100.0;
    zero_area.price = 0.0;
    assert!(!is_usable(&zero_area));

    assert!(is_usable(&listing("ok", 41.0, 29.0, 100.0, 800_000.0)));
}

#[test]
fn test_area_score_peaks_at_target() {
    let exact = area_proximity_score(120.0, 120.0);
    let near = area_proximity_score(110.0, 120.0);
    let far = area_proximity_score(60.0, 120.0);

    assert_eq!(exact, 1.0);
    assert!(near > far);
    assert!(far > 0.0);
}

#[test]
fn test_recency_decays_exponentially() {
    let fresh = recency_score(0.0, 90.0);
    let one_half_life = recency_score(90.0, 90.0);
    let two_half_lives = recency_score(180.0, 90.0);

    assert_eq!(fresh, 1.0);
    assert!((one_half_life - 0.5).abs() < 1e-9);
    assert!((two_half_lives - 0.25).abs() < 1e-9);
}

#[test]
fn test_similarity_penalizes_stale_listings() {
    let weights = SimilarityWeights::default();
    let now = Utc::now();
    let features = residential(120.0);

    let fresh = listing("f", 41.0, 29.0, 120.0, 960_000.0);
    let mut stale = listing("s", 41.0, 29.0, 120.0, 960_000.0);
    stale.crawled_at = now - Duration::days(400);

    let fresh_sim = calculate_similarity(&fresh, &features, &weights, 90.0, now);
    let stale_sim = calculate_similarity(&stale, &features, &weights, 90.0, now);

    assert!(fresh_sim > stale_sim);
}
