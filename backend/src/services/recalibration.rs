//! Reference-time recalibration.
//!
//! Observers report two raw timestamps per body: when an alignment began and
//! when it ended. Their average, minus a fixed reporting skew, becomes the
//! body's new reference time, but only if the current alignment cache agrees
//! that the body started and stopped aligning around those instants.
//! Rejected candidates are dropped quietly.

use std::collections::BTreeMap;

use log::{debug, info};

use crate::algorithms::orbit::OrbitalModel;
use crate::algorithms::reference::{relative_angle, solve_reference_positions};
use crate::error::{EphemerisError, EphemerisResult};
use crate::models::{BodyConfig, BodyId, ScrollPayload};
use crate::services::cache::EventCache;
use crate::settings::RecalibrationSettings;

/// Raw candidate timestamps per body.
pub type CandidateMap = BTreeMap<BodyId, [i64; 2]>;

/// Parse name-keyed candidates, rejecting unknown names and the shadow.
pub fn candidates_from_records(
    records: BTreeMap<String, [i64; 2]>,
) -> EphemerisResult<CandidateMap> {
    let mut candidates = CandidateMap::new();
    for (name, times) in records {
        let body: BodyId = name.parse().map_err(EphemerisError::Configuration)?;
        if body == BodyId::Shadow {
            return Err(EphemerisError::configuration(
                "the shadow's reference time cannot be recalibrated",
            ));
        }
        candidates.insert(body, times);
    }
    Ok(candidates)
}

/// Name-keyed form of a candidate map.
pub fn candidates_to_records(candidates: &CandidateMap) -> BTreeMap<String, [i64; 2]> {
    candidates
        .iter()
        .map(|(body, times)| (body.key().to_string(), *times))
        .collect()
}

/// Average of the two raw timestamps minus the skew, rounded to the millisecond.
pub fn candidate_time(raw: [i64; 2], skew_ms: i64) -> i64 {
    let mean = (raw[0] as f64 + raw[1] as f64) / 2.0;
    mean.round() as i64 - skew_ms
}

/// Same-side or opposite-side offset closest to `angle`.
///
/// Candidates are tried in the order 0, 180, 360 and the first closest wins, so
/// 90 resolves to 0 and 270 to 180. 360 folds back to 0.
pub fn reference_offset(angle: f64) -> f64 {
    let closest = [0.0_f64, 180.0, 360.0]
        .into_iter()
        .min_by(|a, b| (a - angle).abs().total_cmp(&(b - angle).abs()))
        .unwrap_or(0.0);
    if closest == 360.0 {
        0.0
    } else {
        closest
    }
}

/// What a recalibration pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecalibrationOutcome {
    pub committed: Vec<BodyId>,
    /// Candidates that failed validation.
    pub rejected: Vec<BodyId>,
    /// Candidates equal to the stored reference time.
    pub unchanged: Vec<BodyId>,
}

impl RecalibrationOutcome {
    pub fn changed(&self) -> bool {
        !self.committed.is_empty()
    }
}

/// Validates and applies candidate reference times.
#[derive(Debug, Clone, Copy)]
pub struct Recalibrator {
    skew_ms: i64,
    window_ms: i64,
}

impl Recalibrator {
    pub fn new(skew_ms: i64, window_ms: i64) -> Self {
        Self { skew_ms, window_ms }
    }

    pub fn from_settings(settings: &RecalibrationSettings) -> Self {
        Self::new(settings.skew_ms, settings.validation_window_ms)
    }

    /// Whether the cache confirms `body` aligned near the earlier raw timestamp and
    /// returned to normal near the later one.
    ///
    /// White is confirmed through dark events, everything else through glows. A
    /// window the cache does not fully cover fails.
    pub fn validate(&self, cache: &EventCache<ScrollPayload>, body: BodyId, raw: [i64; 2]) -> bool {
        let (earlier, later) = (raw[0].min(raw[1]), raw[0].max(raw[1]));
        let first = match cache.events().first() {
            Some(event) => event.timestamp,
            None => return false,
        };
        if earlier - self.window_ms < first || !cache.covers(later + self.window_ms) {
            return false;
        }

        let began = cache
            .query(earlier - self.window_ms, earlier + self.window_ms)
            .iter()
            .any(|e| match body {
                BodyId::White => e.payload.new_darks.contains(&body),
                _ => e.payload.new_glows.contains(&body),
            });
        let ended = cache
            .query(later - self.window_ms, later + self.window_ms)
            .iter()
            .any(|e| e.payload.returned_to_normal.contains(&body));

        began && ended
    }

    /// Apply every valid candidate to `config`, then re-derive reference positions.
    pub fn recalibrate(
        &self,
        config: &mut BodyConfig,
        candidates: &CandidateMap,
        cache: &EventCache<ScrollPayload>,
    ) -> EphemerisResult<RecalibrationOutcome> {
        let model = OrbitalModel::from_config(config)?;
        let mut outcome = RecalibrationOutcome::default();

        for (&body, &raw) in candidates {
            if body == BodyId::Shadow {
                outcome.rejected.push(body);
                continue;
            }
            let candidate = candidate_time(raw, self.skew_ms);
            if candidate == config.get(body).ref_time {
                outcome.unchanged.push(body);
                continue;
            }
            if !self.validate(cache, body, raw) {
                debug!("skipping recalibration of {}: candidate {} not confirmed", body, candidate);
                outcome.rejected.push(body);
                continue;
            }

            let offset = reference_offset(relative_angle(&model, body, candidate));
            let record = config.get_mut(body);
            record.ref_time = candidate;
            record.ref_offset = offset;
            info!("recalibrated {}: refTime={} refOffset={}", body, candidate, offset);
            outcome.committed.push(body);
        }

        solve_reference_positions(config);
        Ok(outcome)
    }
}
