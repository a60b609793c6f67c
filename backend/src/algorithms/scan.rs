//! Event range builder.
//!
//! Walks a time range on a coarse grid anchored at the range start. When the
//! alignment state at a grid point differs from the last reported state, the
//! interval since the previous grid point is rescanned at the fine step and an
//! event is emitted at every fine instant where the state changes.
//!
//! After each grid point the builder's last state equals the state at that point,
//! so a range can be split on grid points and built piecewise with identical
//! results (see [`crate::services::parallel`]).

use log::{debug, warn};

use super::alignment::{AlignmentDetector, AlignmentState, UNALIGNED};
use super::orbit::OrbitalModel;
use crate::error::EphemerisResult;
use crate::models::{BodyId, Event, ScrollEvent, ScrollPayload};
use crate::settings::ScanSettings;

/// Split a transition into `(new_glows, new_darks, returned_to_normal)`.
///
/// Bodies that became aligned go dark when the shadow takes part, either by
/// becoming aligned itself or by still being aligned. When the shadow joins a
/// cluster that was already aligned, the whole cluster goes dark with it. When the
/// shadow leaves, everything still aligned glows again. Bodies that lost alignment
/// are always reported as returned to normal.
pub fn classify(
    previous: &AlignmentState,
    current: &AlignmentState,
) -> (Vec<BodyId>, Vec<BodyId>, Vec<BodyId>) {
    let mut aligned = Vec::new();
    let mut returned = Vec::new();
    let mut still_aligned = Vec::new();

    for (slot, body) in BodyId::ALL.into_iter().enumerate() {
        match (previous[slot], current[slot]) {
            (false, true) => aligned.push(body),
            (true, false) => returned.push(body),
            (true, true) => still_aligned.push(body),
            (false, false) => {}
        }
    }

    let mut glows = Vec::new();
    let mut darks = Vec::new();

    if !aligned.is_empty() && (led_by_shadow(&aligned) || led_by_shadow(&still_aligned)) {
        darks.extend_from_slice(&aligned);
        if !still_aligned.is_empty() && !previous[BodyId::Shadow.slot()] {
            darks.extend_from_slice(&still_aligned);
        }
    } else if led_by_shadow(&returned) {
        glows.extend_from_slice(&aligned);
        glows.extend_from_slice(&still_aligned);
    } else {
        glows.extend_from_slice(&aligned);
    }

    (glows, darks, returned)
}

fn led_by_shadow(list: &[BodyId]) -> bool {
    list.first() == Some(&BodyId::Shadow)
}

/// Event for the transition `previous -> current` at `timestamp`.
pub fn transition_event(
    timestamp: i64,
    previous: &AlignmentState,
    current: &AlignmentState,
) -> ScrollEvent {
    let (glows, darks, returned) = classify(previous, current);
    Event::new(timestamp, ScrollPayload::new(timestamp, glows, darks, returned))
}

/// Scanning position carried across grid points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanCursor {
    /// The grid point before the next one to examine.
    pub previous_point: i64,
    /// State at `previous_point` (the last reported state).
    pub last_state: AlignmentState,
}

/// Builds alignment events over a time range.
#[derive(Debug, Clone, Copy)]
pub struct EventRangeBuilder {
    model: OrbitalModel,
    detector: AlignmentDetector,
    coarse_step: i64,
    fine_step: i64,
}

impl EventRangeBuilder {
    pub fn new(model: OrbitalModel, settings: &ScanSettings) -> Self {
        Self {
            model,
            detector: AlignmentDetector::from_settings(settings),
            coarse_step: settings.coarse_step_ms,
            fine_step: settings.fine_step_ms,
        }
    }

    pub fn model(&self) -> &OrbitalModel {
        &self.model
    }

    pub fn coarse_step(&self) -> i64 {
        self.coarse_step
    }

    /// Alignment state at `t`.
    pub fn state_at(&self, t: i64) -> EphemerisResult<AlignmentState> {
        self.detector.state_at(&self.model, t)
    }

    /// Every event in `[start, stop)`, starting with the state at `start`.
    ///
    /// A range with `start >= stop` yields only the initial event.
    pub fn build(&self, start: i64, stop: i64) -> EphemerisResult<Vec<ScrollEvent>> {
        if start >= stop {
            warn!("empty scroll range: start={} stop={}", start, stop);
        }
        let (mut events, cursor) = self.initial(start)?;
        self.scan_segment(start, stop, cursor, &mut events)?;
        debug!("built {} scroll events over [{}, {})", events.len(), start, stop);
        Ok(events)
    }

    /// The opening event at `start` and the cursor to continue from.
    pub fn initial(&self, start: i64) -> EphemerisResult<(Vec<ScrollEvent>, ScanCursor)> {
        let state = self.state_at(start)?;
        let events = vec![transition_event(start, &UNALIGNED, &state)];
        Ok((
            events,
            ScanCursor {
                previous_point: start - self.coarse_step,
                last_state: state,
            },
        ))
    }

    /// Cursor for a segment starting at grid point `first_point`, as a serial scan
    /// would hold it on arrival.
    pub fn cursor_before(&self, first_point: i64) -> EphemerisResult<ScanCursor> {
        let previous_point = first_point - self.coarse_step;
        Ok(ScanCursor {
            previous_point,
            last_state: self.state_at(previous_point)?,
        })
    }

    /// Examine grid points `first_point, first_point + step, ...` below `stop`.
    pub fn scan_segment(
        &self,
        first_point: i64,
        stop: i64,
        mut cursor: ScanCursor,
        events: &mut Vec<ScrollEvent>,
    ) -> EphemerisResult<ScanCursor> {
        let mut point = first_point;
        while point < stop {
            let state = self.state_at(point)?;
            if state != cursor.last_state {
                cursor.last_state =
                    self.refine(cursor.previous_point, point, cursor.last_state, events)?;
            }
            cursor.previous_point = point;
            point += self.coarse_step;
        }
        Ok(cursor)
    }

    /// Fine scan of `(from, to]`; returns the state at `to`.
    fn refine(
        &self,
        from: i64,
        to: i64,
        mut last: AlignmentState,
        events: &mut Vec<ScrollEvent>,
    ) -> EphemerisResult<AlignmentState> {
        let mut t = from;
        while t < to {
            t = (t + self.fine_step).min(to);
            let state = self.state_at(t)?;
            if state != last {
                events.push(transition_event(t, &last, &state));
                last = state;
            }
        }
        Ok(last)
    }
}

/// Whether the coarse step is short enough to see every alignment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepAssumption {
    /// Lower bound on how long any alignment lasts, in milliseconds.
    pub shortest_alignment_ms: f64,
    pub coarse_step_ms: i64,
}

impl StepAssumption {
    pub fn holds(&self) -> bool {
        self.shortest_alignment_ms >= self.coarse_step_ms as f64
    }
}

/// Bound the fastest apparent motion of every slot and check the coarse step against it.
///
/// A body at radius `r` around White, seen from the candle proxy at unit distance,
/// moves at most `(r|ω| + |ω_white|) / |r - 1|` degrees per ms. A pair stays within
/// `threshold` of each other for at least `2 * threshold / (rate_i + rate_j)`.
pub fn check_step_assumption(model: &OrbitalModel, settings: &ScanSettings) -> StepAssumption {
    let white_rate = model.orbit(BodyId::White).rate.abs();
    let rates: Vec<f64> = BodyId::ALL
        .into_iter()
        .map(|body| match body {
            BodyId::Shadow | BodyId::White => model.orbit(body).rate.abs(),
            _ => {
                let r = model.radius(body);
                let gap = (r - 1.0).abs();
                if gap == 0.0 {
                    f64::INFINITY
                } else {
                    (r * model.orbit(body).rate.abs() + white_rate) / gap
                }
            }
        })
        .collect();

    let mut shortest = f64::INFINITY;
    for i in 0..rates.len() - 1 {
        let threshold = if i == 0 {
            settings.dark_threshold_deg.value()
        } else {
            settings.glow_threshold_deg.value()
        };
        for j in i + 1..rates.len() {
            let duration = 2.0 * threshold / (rates[i] + rates[j]);
            shortest = shortest.min(duration);
        }
    }

    let assumption = StepAssumption {
        shortest_alignment_ms: shortest,
        coarse_step_ms: settings.coarse_step_ms,
    };
    if !assumption.holds() {
        warn!(
            "coarse step {} ms may skip alignments as short as {:.0} ms",
            settings.coarse_step_ms, shortest
        );
    }
    assumption
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BodyConfig, BodyRecord};
    use std::collections::BTreeMap;

    fn state(aligned: &[BodyId]) -> AlignmentState {
        let mut s = UNALIGNED;
        for b in aligned {
            s[b.slot()] = true;
        }
        s
    }

    #[test]
    fn test_plain_glow() {
        let (glows, darks, returned) = classify(&UNALIGNED, &state(&[BodyId::Red, BodyId::Blue]));
        assert_eq!(glows, vec![BodyId::Red, BodyId::Blue]);
        assert!(darks.is_empty());
        assert!(returned.is_empty());
    }

    #[test]
    fn test_shadow_joins_existing_cluster() {
        let before = state(&[BodyId::Green, BodyId::Red]);
        let after = state(&[BodyId::Shadow, BodyId::Green, BodyId::Red]);
        let (glows, darks, returned) = classify(&before, &after);
        assert!(glows.is_empty());
        assert_eq!(darks, vec![BodyId::Shadow, BodyId::Green, BodyId::Red]);
        assert!(returned.is_empty());

        let event = transition_event(0, &before, &after);
        assert_eq!(
            event.payload.visible_darks().collect::<Vec<_>>(),
            vec![BodyId::Green, BodyId::Red]
        );
    }

    #[test]
    fn test_body_joins_dark_cluster() {
        let before = state(&[BodyId::Shadow, BodyId::White]);
        let after = state(&[BodyId::Shadow, BodyId::White, BodyId::Cyan]);
        let (glows, darks, _) = classify(&before, &after);
        assert!(glows.is_empty());
        // shadow was already aligned, so only the newcomer goes dark
        assert_eq!(darks, vec![BodyId::Cyan]);
    }

    #[test]
    fn test_shadow_leaves_cluster() {
        let before = state(&[BodyId::Shadow, BodyId::Black, BodyId::Purple]);
        let after = state(&[BodyId::Black, BodyId::Purple]);
        let (glows, darks, returned) = classify(&before, &after);
        assert_eq!(glows, vec![BodyId::Black, BodyId::Purple]);
        assert!(darks.is_empty());
        assert_eq!(returned, vec![BodyId::Shadow]);
    }

    #[test]
    fn test_returned_always_reported() {
        let before = state(&[BodyId::Yellow, BodyId::Cyan]);
        let (glows, darks, returned) = classify(&before, &UNALIGNED);
        assert!(glows.is_empty() && darks.is_empty());
        assert_eq!(returned, vec![BodyId::Yellow, BodyId::Cyan]);
    }

    #[test]
    fn test_no_change_yields_empty_lists() {
        let s = state(&[BodyId::Red, BodyId::Blue]);
        let (glows, darks, returned) = classify(&s, &s);
        assert!(glows.is_empty() && darks.is_empty() && returned.is_empty());
    }

    fn slow_config() -> BodyConfig {
        let records: BTreeMap<String, BodyRecord> = BodyId::ALL
            .into_iter()
            .enumerate()
            .map(|(i, b)| {
                let radius = if b == BodyId::White { 1.0 } else { 2.0 + i as f64 };
                (
                    b.key().to_string(),
                    BodyRecord::new(86_400_000 * (10 + i as i64), radius, 0, 0.0),
                )
            })
            .collect();
        BodyConfig::from_records(records).unwrap()
    }

    #[test]
    fn test_step_assumption_for_slow_bodies() {
        let model = OrbitalModel::from_config(&slow_config()).unwrap();
        let assumption = check_step_assumption(&model, &ScanSettings::default());
        assert!(assumption.holds(), "{:?}", assumption);
    }

    #[test]
    fn test_step_assumption_fails_for_huge_step() {
        let model = OrbitalModel::from_config(&slow_config()).unwrap();
        let settings = ScanSettings {
            coarse_step_ms: 86_400_000,
            ..ScanSettings::default()
        };
        assert!(!check_step_assumption(&model, &settings).holds());
    }

    #[test]
    fn test_build_events_are_ordered_and_open_with_start() {
        let model = OrbitalModel::from_config(&slow_config()).unwrap();
        let builder = EventRangeBuilder::new(model, &ScanSettings::default());
        let start = 1_000_000;
        let events = builder.build(start, start + 20 * 86_400_000).unwrap();
        assert_eq!(events[0].timestamp, start);
        assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    }

    #[test]
    fn test_empty_range_yields_initial_event_only() {
        let model = OrbitalModel::from_config(&slow_config()).unwrap();
        let builder = EventRangeBuilder::new(model, &ScanSettings::default());
        let events = builder.build(500, 500).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].timestamp, 500);
    }
}
