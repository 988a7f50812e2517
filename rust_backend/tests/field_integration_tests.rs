//! Integration tests for photometry-driven field evaluation.
//!
//! Covers IES text through the parser into shared fixtures and the grid
//! evaluator, plus property tests for field statistics and interpolation.

use proptest::prelude::*;
use std::sync::Arc;

use ppfd_rust::algorithms::illuminance;
use ppfd_rust::cache::{ContributionCache, LocalContributionCache, SharedContributionCache};
use ppfd_rust::core::{GrowArea, LightSource, Point};
use ppfd_rust::models::{PhotometricData, PhotometricFile};
use ppfd_rust::parsing::{generate_ies, parse_ies};
use ppfd_rust::services::{annotate_fixtures, GridEvaluator};

const LINEAR_FALLOFF_IES: &str = "IESNA:LM-63-2002
[TEST] linear falloff
[MANUFAC] Example Horticulture
TILT=NONE
1 -1 1 10 1 1 2 0.6 0.6 0.1
1 1 300
0 10 20 30 40 50 60 70 80 90
0
1000 888.889 777.778 666.667 555.556 444.444 333.333 222.222 111.111 0
";

fn shared_photometry() -> Arc<PhotometricFile> {
    Arc::new(parse_ies(LINEAR_FALLOFF_IES).unwrap())
}

// ==================== IES End to End ====================

#[test]
fn test_ies_fixture_nadir_ppfd() {
    let photometry = shared_photometry();
    let fixture = LightSource::new(1, Point::new(2.5, 2.5), 3.0, 500.0).with_photometry(photometry);
    let field = GridEvaluator::new(GrowArea::new(5.0, 5.0), 1.0).unwrap().evaluate(&[fixture]);

    let nadir = field.value_at(2, 2).unwrap();
    assert!((nadir - 500.0 / 9.0).abs() < 0.1, "nadir {}", nadir);
    assert_eq!(field.statistics().max, nadir);
}

#[test]
fn test_ies_fixtures_share_one_table() {
    let photometry = shared_photometry();
    let fixtures: Vec<LightSource> = (0..4)
        .map(|i| {
            LightSource::new(i + 1, Point::new(1.0 + 2.0 * i as f64, 2.0), 2.0, 700.0)
                .with_photometry(Arc::clone(&photometry))
        })
        .collect();
    assert_eq!(Arc::strong_count(&photometry), 5);

    let evaluator = GridEvaluator::new(GrowArea::new(8.0, 4.0), 0.5).unwrap();
    let mut cache = LocalContributionCache::new();
    let cached = evaluator.evaluate_cached(&fixtures, &mut cache);
    assert_eq!(cached.values(), evaluator.evaluate(&fixtures).values());
    assert_eq!(cache.len(), 4 * cached.values().len());
}

#[test]
fn test_regenerated_file_evaluates_identically() {
    let original = shared_photometry();
    let regenerated = Arc::new(parse_ies(&generate_ies(&original)).unwrap());

    let at = Point::new(3.3, 1.7);
    let a = LightSource::new(1, Point::new(2.0, 2.0), 2.5, 900.0).with_photometry(original);
    let b = LightSource::new(1, Point::new(2.0, 2.0), 2.5, 900.0).with_photometry(regenerated);
    assert!((illuminance::contribution(&a, at) - illuminance::contribution(&b, at)).abs() < 1e-9);
}

#[test]
fn test_linear_fixture_peak_below_point_source() {
    let evaluator = GridEvaluator::new(GrowArea::new(12.0, 4.0), 0.25).unwrap();
    let point = LightSource::new(1, Point::new(6.0, 2.0), 1.5, 800.0);
    let linear = point.clone().with_length(8.0, 0.0);
    assert!(illuminance::segment_count(8.0) >= 16);

    let point_field = evaluator.evaluate(&[point]);
    let linear_field = evaluator.evaluate(&[linear]);
    assert!(linear_field.statistics().max < point_field.statistics().max);
    assert!(linear_field.statistics().uniformity > point_field.statistics().uniformity);
}

#[test]
fn test_moving_one_fixture_needs_no_clear() {
    let evaluator = GridEvaluator::new(GrowArea::new(6.0, 6.0), 1.0).unwrap();
    let mut fixtures = vec![
        LightSource::new(1, Point::new(1.5, 1.5), 2.0, 800.0),
        LightSource::new(2, Point::new(4.5, 4.5), 2.0, 800.0),
    ];
    let mut cache = SharedContributionCache::new();
    evaluator.evaluate_cached(&fixtures, &mut cache);

    fixtures[1].position = Point::new(4.5, 1.5);
    let moved = evaluator.evaluate_cached(&fixtures, &mut cache);
    assert_eq!(moved.values(), evaluator.evaluate(&fixtures).values());
    assert_eq!(cache.stats().hits, 36);
}

#[test]
fn test_annotations_report_overlap() {
    let spec = *GridEvaluator::new(GrowArea::new(6.0, 3.0), 0.5).unwrap().spec();
    let fixtures = vec![
        LightSource::new(1, Point::new(2.0, 1.5), 2.0, 800.0),
        LightSource::new(2, Point::new(4.0, 1.5), 2.0, 800.0),
    ];
    let notes = annotate_fixtures(&spec, &fixtures);
    let own = illuminance::contribution(&fixtures[0], fixtures[0].position);
    assert!(notes[0].nadir_ppfd > own);
    assert!((notes[0].mean_contribution - notes[1].mean_contribution).abs() < 1e-9);
}

// ==================== Properties ====================

fn fixture_strategy() -> impl Strategy<Value = LightSource> {
    (
        0.0..10.0f64,
        0.0..8.0f64,
        0.5..5.0f64,
        100.0..2000.0f64,
        0.0..=1.0f64,
        30.0..150.0f64,
    )
        .prop_map(|(x, y, height, ppf, dimming, beam)| {
            LightSource::new(1, Point::new(x, y), height, ppf)
                .with_dimming(dimming)
                .with_beam_angle(beam)
        })
}

proptest! {
    #[test]
    fn prop_field_statistics_bounds(fixtures in prop::collection::vec(fixture_strategy(), 1..6)) {
        let evaluator = GridEvaluator::new(GrowArea::new(10.0, 8.0), 1.0).unwrap();
        let field = evaluator.evaluate(&fixtures);
        let stats = field.statistics();

        prop_assert!(stats.uniformity >= 0.0 && stats.uniformity <= 1.0);
        prop_assert!(stats.coefficient_of_variation >= 0.0);
        prop_assert!(stats.min <= stats.mean + 1e-9 && stats.mean <= stats.max + 1e-9);
        if stats.min == stats.max {
            prop_assert_eq!(stats.uniformity, 1.0);
        } else {
            prop_assert!(stats.uniformity < 1.0);
        }

        let again = evaluator.evaluate(&fixtures);
        prop_assert_eq!(field.values(), again.values());
    }

    #[test]
    fn prop_interpolation_stays_within_table(
        vertical in -30.0..200.0f64,
        horizontal in -90.0..450.0f64,
    ) {
        let file = parse_ies(LINEAR_FALLOFF_IES).unwrap();
        let value = file.interpolate_candela(vertical, horizontal);
        prop_assert!(value >= 0.0 && value <= file.max_candela());
    }

    #[test]
    fn prop_interpolation_exact_at_table_angles(v_index in 0usize..7, h_index in 0usize..4) {
        let vertical: Vec<f64> = (0..7).map(|i| i as f64 * 15.0).collect();
        let horizontal = vec![0.0, 90.0, 180.0, 270.0];
        let candela: Vec<Vec<f64>> = (0..4)
            .map(|h| (0..7).map(|v| 100.0 * (h + 1) as f64 + 7.0 * v as f64).collect())
            .collect();
        let table =
            PhotometricData::from_table(vertical.clone(), horizontal.clone(), candela.clone());
        let file = PhotometricFile::new(table).unwrap();

        prop_assert_eq!(
            file.interpolate_candela(vertical[v_index], horizontal[h_index]),
            candela[h_index][v_index]
        );
    }
}
