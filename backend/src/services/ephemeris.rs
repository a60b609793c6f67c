//! The ephemeris engine.
//!
//! Owns the body configuration and the two event caches. Readers take cheap
//! `Arc` snapshots; a rebuild computes the new cache without holding any lock
//! readers need and swaps it in whole. Rebuilds themselves are serialized.

use std::sync::Arc;

use log::{info, warn};
use parking_lot::{Mutex, RwLock};

use crate::algorithms::lunar::build_lunar_calendar;
use crate::algorithms::orbit::OrbitalModel;
use crate::algorithms::reference::solve_reference_positions;
use crate::algorithms::scan::{check_step_assumption, EventRangeBuilder};
use crate::db::checksum::configuration_fingerprint;
use crate::db::repository::ReferenceStore;
use crate::error::{EphemerisError, EphemerisResult};
use crate::models::time::describe;
use crate::models::{BodyConfig, BodyId, LunarEvent, LunarPayload, ScrollEvent, ScrollPayload};
use crate::services::cache::{CacheLookup, EventCache};
use crate::services::parallel::ParallelOrchestrator;
use crate::services::recalibration::{CandidateMap, RecalibrationOutcome, Recalibrator};
use crate::settings::EphemerisSettings;

pub type ScrollCache = EventCache<ScrollPayload>;
pub type LunarCache = EventCache<LunarPayload>;

/// An inverted build range is a caller error; `start == stop` is an empty range.
fn check_range(start: i64, stop: i64) -> EphemerisResult<()> {
    if start > stop {
        return Err(EphemerisError::InvalidRange { start, stop });
    }
    Ok(())
}

/// Alignment and lunar event engine.
pub struct Ephemeris {
    store: Arc<dyn ReferenceStore>,
    settings: EphemerisSettings,
    config: RwLock<BodyConfig>,
    scroll: RwLock<Arc<ScrollCache>>,
    lunar: RwLock<Arc<LunarCache>>,
    rebuild: Mutex<()>,
    ingest: Mutex<()>,
}

impl Ephemeris {
    /// Load the configuration, derive reference positions and build both caches.
    ///
    /// The scroll cache covers `[start, stop)`; the lunar cache starts at the day
    /// containing `start` and holds `num_moon_cycles` cycles. Any configuration
    /// or storage problem is fatal.
    pub fn new(
        store: Arc<dyn ReferenceStore>,
        settings: EphemerisSettings,
        start: i64,
        stop: i64,
        num_moon_cycles: usize,
    ) -> EphemerisResult<Self> {
        check_range(start, stop)?;
        settings.validate()?;
        let mut config = store.load_bodies()?;
        config.validate()?;
        solve_reference_positions(&mut config);
        store.save_bodies(&config)?;

        let model = OrbitalModel::from_config(&config)?;
        check_step_assumption(&model, &settings.scan);

        let engine = Self {
            store,
            settings,
            config: RwLock::new(config),
            scroll: RwLock::new(Arc::new(EventCache::empty())),
            lunar: RwLock::new(Arc::new(EventCache::empty())),
            rebuild: Mutex::new(()),
            ingest: Mutex::new(()),
        };

        let config = engine.body_config();
        let scroll = engine.build_scroll_cache(&config, start, stop)?;
        let lunar = engine.build_lunar_cache(&config, start, num_moon_cycles)?;
        *engine.scroll.write() = Arc::new(scroll);
        *engine.lunar.write() = Arc::new(lunar);
        Ok(engine)
    }

    pub fn settings(&self) -> &EphemerisSettings {
        &self.settings
    }

    /// Snapshot of the current body configuration.
    pub fn body_config(&self) -> BodyConfig {
        self.config.read().clone()
    }

    /// Snapshot of the alignment cache.
    pub fn scroll_cache(&self) -> Arc<ScrollCache> {
        Arc::clone(&self.scroll.read())
    }

    /// Snapshot of the lunar cache.
    pub fn lunar_cache(&self) -> Arc<LunarCache> {
        Arc::clone(&self.lunar.read())
    }

    /// Alignment events with `start <= timestamp <= end`.
    ///
    /// Returns what is cached; use [`Self::lookup_scroll_events`] to detect a range
    /// that runs past the cache.
    pub fn query_scroll_events(&self, start: i64, end: i64) -> Vec<ScrollEvent> {
        self.scroll_cache().query(start, end).to_vec()
    }

    /// Alignment events in `[start, end]`, or the cache horizon if `end` is past it.
    pub fn lookup_scroll_events(
        &self,
        start: i64,
        end: i64,
    ) -> Result<Vec<ScrollEvent>, Option<i64>> {
        match self.scroll_cache().lookup(start, end) {
            CacheLookup::Hit(events) => Ok(events.to_vec()),
            CacheLookup::Exhausted { horizon } => Err(horizon),
        }
    }

    /// Lunar events with `start <= timestamp <= end`.
    pub fn query_lunar_events(&self, start: i64, end: i64) -> Vec<LunarEvent> {
        self.lunar_cache().query(start, end).to_vec()
    }

    /// Recalibrate, then rebuild the alignment cache over `[start, stop)`.
    ///
    /// Fails with [`EphemerisError::InvalidRange`] before recalibrating if `start > stop`.
    pub fn rebuild_scroll_cache(
        &self,
        start: i64,
        stop: i64,
    ) -> EphemerisResult<RecalibrationOutcome> {
        check_range(start, stop)?;
        let _guard = self.rebuild.lock();
        let outcome = self.recalibrate_locked()?;
        let config = self.body_config();
        let cache = self.build_scroll_cache(&config, start, stop)?;
        *self.scroll.write() = Arc::new(cache);
        Ok(outcome)
    }

    /// Recalibrate, then rebuild the lunar cache from `start`.
    pub fn rebuild_lunar_cache(
        &self,
        start: i64,
        num_cycles: usize,
    ) -> EphemerisResult<RecalibrationOutcome> {
        let _guard = self.rebuild.lock();
        let outcome = self.recalibrate_locked()?;
        let config = self.body_config();
        let cache = self.build_lunar_cache(&config, start, num_cycles)?;
        *self.lunar.write() = Arc::new(cache);
        Ok(outcome)
    }

    /// Recalibrate and rebuild both caches over the configured window around `now`.
    pub fn refresh(&self, now: i64) -> EphemerisResult<RecalibrationOutcome> {
        let _guard = self.rebuild.lock();
        let outcome = self.recalibrate_locked()?;
        let (start, stop) = self.settings.refresh_window(now);
        let config = self.body_config();
        let scroll = self.build_scroll_cache(&config, start, stop)?;
        let lunar = self.build_lunar_cache(&config, start, self.settings.cache.moon_cycles)?;
        *self.scroll.write() = Arc::new(scroll);
        *self.lunar.write() = Arc::new(lunar);
        info!("refreshed caches for [{}, {})", describe(start), describe(stop));
        Ok(outcome)
    }

    /// Apply pending candidates without rebuilding any cache.
    pub fn recalibrate(&self) -> EphemerisResult<RecalibrationOutcome> {
        let _guard = self.rebuild.lock();
        self.recalibrate_locked()
    }

    /// Record candidate reference times for the next recalibration.
    ///
    /// Merged over any candidates already pending; the shadow cannot be recalibrated.
    pub fn ingest_candidate_reference_times(
        &self,
        candidates: CandidateMap,
    ) -> EphemerisResult<()> {
        if candidates.contains_key(&BodyId::Shadow) {
            return Err(EphemerisError::configuration(
                "the shadow's reference time cannot be recalibrated",
            ));
        }
        let _guard = self.ingest.lock();
        let mut pending = self.store.load_candidates()?;
        pending.extend(candidates);
        self.store.store_candidates(&pending)?;
        Ok(())
    }

    fn recalibrate_locked(&self) -> EphemerisResult<RecalibrationOutcome> {
        let candidates = self.store.load_candidates()?;
        if candidates.is_empty() {
            return Ok(RecalibrationOutcome::default());
        }

        let mut config = self.body_config();
        let recalibrator = Recalibrator::from_settings(&self.settings.recalibration);
        let outcome = recalibrator.recalibrate(&mut config, &candidates, &self.scroll_cache())?;
        if outcome.changed() {
            self.store.save_bodies(&config)?;
        }
        *self.config.write() = config;
        Ok(outcome)
    }

    fn build_scroll_cache(
        &self,
        config: &BodyConfig,
        start: i64,
        stop: i64,
    ) -> EphemerisResult<ScrollCache> {
        if start >= stop {
            warn!("scroll cache requested for empty range [{}, {})", start, stop);
        }
        let model = OrbitalModel::from_config(config)?;
        let builder = EventRangeBuilder::new(model, &self.settings.scan);
        let events = if self.settings.parallel.enabled {
            ParallelOrchestrator::from_settings(&self.settings.parallel)
                .build(&builder, start, stop)?
        } else {
            builder.build(start, stop)?
        };

        let cache = EventCache::new(events, configuration_fingerprint(config)?);
        info!(
            "scroll cache: {} events over [{}, {})",
            cache.len(),
            describe(start),
            describe(stop)
        );
        if let Some(path) = &self.settings.storage.cache_path {
            cache.save_json(path)?;
        }
        Ok(cache)
    }

    fn build_lunar_cache(
        &self,
        config: &BodyConfig,
        start: i64,
        num_cycles: usize,
    ) -> EphemerisResult<LunarCache> {
        let model = OrbitalModel::from_config(config)?;
        let events = build_lunar_calendar(&model, &self.settings.lunar, start, num_cycles)?;
        let cache = EventCache::new(events, configuration_fingerprint(config)?);
        info!("lunar cache: {} events from {}", cache.len(), describe(start));
        Ok(cache)
    }
}
