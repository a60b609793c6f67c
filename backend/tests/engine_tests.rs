mod support;

use std::sync::Arc;

use approx::assert_abs_diff_eq;
use ephemeris::algorithms::reference::{angular_distance, observed_offsets};
use ephemeris::db::{configuration_fingerprint, LocalStore, ReferenceStore};
use ephemeris::services::RecalibrationOutcome;
use ephemeris::{BodyId, Ephemeris, EphemerisError};

use support::{build_engine, fixture_config, fixture_engine, test_settings, DAY, EPOCH, HOUR, RANGE};

#[test]
fn test_construction_persists_solved_reference_positions() {
    let (store, engine) = fixture_engine();
    let stored = store.load_bodies().unwrap();
    assert_eq!(stored, engine.body_config());

    let offsets = observed_offsets(&stored).unwrap();
    for (i, body) in BodyId::ORBITING.into_iter().enumerate() {
        let expected = stored.get(body).ref_offset;
        assert!(
            angular_distance(offsets[i], expected) < 1e-6,
            "{body}: observed {} expected {}",
            offsets[i],
            expected
        );
    }
}

#[test]
fn test_scroll_cache_opens_at_start_and_is_strictly_ordered() {
    let (_, engine) = fixture_engine();
    let cache = engine.scroll_cache();
    let events = cache.events();

    assert!(events.len() > 10, "expected a busy fixture, got {}", events.len());
    assert_eq!(events[0].timestamp, RANGE.0);
    assert!(events.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    assert!(events.iter().all(|e| e.timestamp < RANGE.1));
}

#[test]
fn test_shadow_never_glows_and_white_goes_dark() {
    let (_, engine) = fixture_engine();
    let cache = engine.scroll_cache();

    assert!(cache
        .events()
        .iter()
        .all(|e| !e.payload.new_glows.contains(&BodyId::Shadow)));
    assert!(cache
        .events()
        .iter()
        .any(|e| e.payload.new_darks.contains(&BodyId::White)));
}

#[test]
fn test_scroll_query_is_inclusive_on_both_ends() {
    let (_, engine) = fixture_engine();
    let all = engine.scroll_cache().events().to_vec();
    let (a, b) = (all[3].timestamp, all[6].timestamp);

    let hits = engine.query_scroll_events(a, b);
    assert_eq!(hits, all[3..=6].to_vec());
    assert_eq!(engine.query_scroll_events(a + 1, b - 1), all[4..6].to_vec());
    assert!(engine.query_scroll_events(b, a).is_empty());
}

#[test]
fn test_lookup_reports_exhaustion_at_the_horizon() {
    let (_, engine) = fixture_engine();
    let horizon = engine.scroll_cache().horizon().unwrap();

    assert!(engine.lookup_scroll_events(RANGE.0, horizon - 1).is_ok());
    assert_eq!(engine.lookup_scroll_events(RANGE.0, horizon), Err(Some(horizon)));
    assert_eq!(
        engine.lookup_scroll_events(horizon + DAY, horizon + 2 * DAY),
        Err(Some(horizon))
    );
}

#[test]
fn test_caches_carry_the_configuration_fingerprint() {
    let (_, engine) = fixture_engine();
    let expected = configuration_fingerprint(&engine.body_config()).unwrap();
    assert_eq!(engine.scroll_cache().fingerprint(), expected);
    assert_eq!(engine.lunar_cache().fingerprint(), expected);
}

#[test]
fn test_rebuild_without_candidates_reproduces_the_cache() {
    let (_, engine) = fixture_engine();
    let before = engine.scroll_cache();

    let outcome = engine.rebuild_scroll_cache(RANGE.0, RANGE.1).unwrap();
    assert_eq!(outcome, RecalibrationOutcome::default());

    let after = engine.scroll_cache();
    assert!(!Arc::ptr_eq(&before, &after));
    assert_eq!(before.events(), after.events());
}

#[test]
fn test_rebuild_swaps_in_a_new_range() {
    let (_, engine) = fixture_engine();
    let old = engine.scroll_cache();

    engine.rebuild_scroll_cache(RANGE.0 + DAY, RANGE.1 + DAY).unwrap();
    let new = engine.scroll_cache();
    assert_eq!(new.events()[0].timestamp, RANGE.0 + DAY);
    assert!(new.horizon() > old.horizon());

    // A snapshot taken before the swap is unaffected.
    assert_eq!(old.events()[0].timestamp, RANGE.0);
}

#[test]
fn test_inverted_rebuild_range_is_rejected_before_recalibrating() {
    let (store, engine) = fixture_engine();
    let before = engine.scroll_cache();
    let config = engine.body_config();

    let mut candidates = ephemeris::services::CandidateMap::new();
    candidates.insert(BodyId::Red, [RANGE.0 + HOUR, RANGE.0]);
    engine.ingest_candidate_reference_times(candidates).unwrap();

    let err = engine.rebuild_scroll_cache(RANGE.1, RANGE.0).unwrap_err();
    assert!(
        matches!(err, EphemerisError::InvalidRange { start, stop } if start == RANGE.1 && stop == RANGE.0),
        "{err:?}"
    );
    assert!(Arc::ptr_eq(&before, &engine.scroll_cache()));
    assert_eq!(engine.body_config(), config);
    assert_eq!(store.load_bodies().unwrap(), config);

    let err = Ephemeris::new(store, test_settings(), RANGE.1, RANGE.0, 1)
        .err()
        .expect("construction must fail");
    assert!(matches!(err, EphemerisError::InvalidRange { .. }), "{err:?}");
}

#[test]
fn test_refresh_rebuilds_both_caches_around_now() {
    let (_, engine) = fixture_engine();
    let now = EPOCH + 10 * DAY;
    engine.refresh(now).unwrap();

    let (start, stop) = engine.settings().refresh_window(now);
    let scroll = engine.scroll_cache();
    assert_eq!(scroll.events()[0].timestamp, start);
    assert!(scroll.horizon().unwrap() < stop);
    assert_eq!(
        engine.lunar_cache().len(),
        engine.settings().cache.moon_cycles * 10
    );
}

#[test]
fn test_lunar_query_is_inclusive() {
    let (_, engine) = fixture_engine();
    let lunar = engine.lunar_cache();
    assert_eq!(lunar.len(), 20);

    let first = lunar.events()[0].timestamp;
    let last = lunar.horizon().unwrap();
    assert_eq!(engine.query_lunar_events(first, last).len(), 20);
    assert!(engine.query_lunar_events(last + 1, last + DAY).is_empty());
}

#[test]
fn test_empty_store_is_fatal() {
    let store = Arc::new(LocalStore::new());
    let err = Ephemeris::new(store, test_settings(), RANGE.0, RANGE.1, 1)
        .err()
        .expect("construction must fail");
    assert!(matches!(err, EphemerisError::Storage(_)), "{err:?}");
}

#[test]
fn test_zero_period_is_fatal() {
    let mut config = fixture_config();
    config.get_mut(BodyId::Cyan).period = 0;
    let store = Arc::new(LocalStore::with_bodies(config));
    let err = Ephemeris::new(store, test_settings(), RANGE.0, RANGE.1, 1)
        .err()
        .expect("construction must fail");
    match err {
        EphemerisError::Configuration(msg) => assert!(msg.contains("cyan"), "{msg}"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_invalid_settings_are_fatal() {
    let mut settings = test_settings();
    settings.scan.fine_step_ms = settings.scan.coarse_step_ms * 2;
    let store = Arc::new(LocalStore::with_bodies(fixture_config()));
    assert!(matches!(
        Ephemeris::new(store, settings, RANGE.0, RANGE.1, 1),
        Err(EphemerisError::Configuration(_))
    ));
}

#[test]
fn test_white_reference_lines_up_with_the_shadow() {
    let (_, engine) = fixture_engine();
    let config = engine.body_config();
    let white = config.get(BodyId::White);
    let model = ephemeris::algorithms::OrbitalModel::from_config(&config).unwrap();

    let raw = model.relative_positions(white.ref_time);
    let shadow = model.shadow_position(white.ref_time);
    assert_abs_diff_eq!(angular_distance(raw[0], shadow), 0.0, epsilon = 1e-6);
}

#[test]
fn test_build_engine_helper_uses_requested_settings() {
    let mut settings = test_settings();
    settings.scan.coarse_step_ms = 30_000;
    let (_, engine) = build_engine(fixture_config(), settings);
    assert_eq!(engine.settings().scan.coarse_step_ms, 30_000);
}
