#![allow(dead_code)]

use std::collections::{BTreeMap, HashSet};
use std::sync::{Arc, Mutex};

use ephemeris::db::LocalStore;
use ephemeris::models::time::MS_PER_DAY;
use ephemeris::{BodyConfig, BodyId, BodyRecord, Ephemeris, EphemerisSettings};

pub const DAY: i64 = MS_PER_DAY;
pub const HOUR: i64 = 3_600_000;

/// 2023-11-14T22:13:20Z; every fixture reference time is a whole hour after it.
pub const EPOCH: i64 = 1_700_000_000_000;

/// Range the fixture engines cache.
pub const RANGE: (i64, i64) = (EPOCH, EPOCH + 4 * DAY);

static ENV_LOCK: Mutex<()> = Mutex::new(());

/// Runs `f` with environment variables temporarily modified.
///
/// This is panic-safe (restores variables on unwind) and also serializes access to
/// process-global env vars to avoid flaky tests when Rust runs tests in parallel.
///
/// `changes` is a list of `(key, value)` pairs:
/// - `Some(v)` sets the variable to `v`
/// - `None` removes the variable
pub fn with_scoped_env<F, R>(changes: &[(&str, Option<&str>)], f: F) -> R
where
    F: FnOnce() -> R,
{
    let _lock = ENV_LOCK.lock().unwrap_or_else(|e| e.into_inner());
    let _guard = ScopedEnv::new(changes);
    f()
}

struct ScopedEnv {
    snapshot: Vec<(String, Option<String>)>,
}

impl ScopedEnv {
    fn new(changes: &[(&str, Option<&str>)]) -> Self {
        let keys: HashSet<&str> = changes.iter().map(|(k, _)| *k).collect();
        let snapshot = keys
            .into_iter()
            .map(|k| (k.to_string(), std::env::var(k).ok()))
            .collect::<Vec<_>>();

        for (k, v) in changes {
            match v {
                Some(val) => std::env::set_var(k, val),
                None => std::env::remove_var(k),
            }
        }

        Self { snapshot }
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (k, v) in self.snapshot.drain(..) {
            match v {
                Some(val) => std::env::set_var(&k, val),
                None => std::env::remove_var(&k),
            }
        }
    }
}

/// `(period days, radius, refOffset)` per body, in slot order.
const FIXTURE: [(BodyId, i64, f64, f64); 9] = [
    (BodyId::Shadow, 28, 1.0, 0.0),
    (BodyId::White, 2, 1.0, 0.0),
    (BodyId::Black, 5, 1.5, 180.0),
    (BodyId::Green, 7, 2.0, 0.0),
    (BodyId::Red, 9, 2.5, 0.0),
    (BodyId::Purple, 11, 3.0, 180.0),
    (BodyId::Yellow, 13, 3.5, 0.0),
    (BodyId::Cyan, 17, 4.5, 0.0),
    (BodyId::Blue, 19, 6.0, 180.0),
];

/// Unsolved fixture configuration: fast White, so both glow and dark events occur
/// within a few days. Body `i` was observed aligned at `EPOCH + i hours`.
pub fn fixture_config() -> BodyConfig {
    let records: BTreeMap<String, BodyRecord> = FIXTURE
        .iter()
        .enumerate()
        .map(|(i, &(body, days, radius, offset))| {
            (
                body.key().to_string(),
                BodyRecord::new(days * DAY, radius, EPOCH + i as i64 * HOUR, offset),
            )
        })
        .collect();
    BodyConfig::from_records(records).expect("fixture configuration is valid")
}

/// Fixture with a slow White observed a week before the epoch, giving a
/// month-like shadow/White separation cycle.
pub fn lunar_config() -> BodyConfig {
    let mut config = fixture_config();
    let white = config.get_mut(BodyId::White);
    white.period = 365 * DAY;
    white.ref_time = EPOCH - 7 * DAY;
    config
}

/// Default settings with the lunar day anchored at the epoch.
pub fn test_settings() -> EphemerisSettings {
    let mut settings = EphemerisSettings::default();
    settings.lunar.reference_noon_ms = EPOCH;
    settings
}

/// Engine over [`RANGE`] with two moon cycles, backed by an in-memory store.
pub fn build_engine(config: BodyConfig, settings: EphemerisSettings) -> (Arc<LocalStore>, Ephemeris) {
    let store = Arc::new(LocalStore::with_bodies(config));
    let engine = Ephemeris::new(store.clone(), settings, RANGE.0, RANGE.1, 2)
        .expect("fixture engine builds");
    (store, engine)
}

/// Fixture engine with default test settings.
pub fn fixture_engine() -> (Arc<LocalStore>, Ephemeris) {
    build_engine(fixture_config(), test_settings())
}
