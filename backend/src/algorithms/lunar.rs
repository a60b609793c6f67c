//! Lunar phase calendar.
//!
//! The phase is read from the separation between the shadow and White. Days are
//! walked one at a time from a reference noon; the four primary phases are found
//! where the separation crosses a threshold during a day, and each is followed by
//! its intermediate phase a fixed number of days later.

use log::debug;

use super::orbit::OrbitalModel;
use crate::error::{EphemerisError, EphemerisResult};
use crate::models::{Event, LunarEvent, LunarPayload, LunarPhase};
use crate::settings::LunarSettings;

/// Events produced per requested cycle.
pub const EVENTS_PER_CYCLE: usize = 10;

/// Days walked without any crossing before the configuration is declared unusable.
const MAX_DAYS_WITHOUT_CROSSING: i64 = 10_000;

/// Separation that marks each primary phase (new is the wrap through 0).
const QUARTER_THRESHOLDS: [(LunarPhase, f64); 3] = [
    (LunarPhase::FirstQuarter, 90.0),
    (LunarPhase::Full, 180.0),
    (LunarPhase::ThirdQuarter, 270.0),
];

/// Shadow-to-White separation at `t`, in `[0, 360)`.
pub fn separation(model: &OrbitalModel, t: i64) -> f64 {
    (model.shadow_position(t) - model.relative_positions(t)[0] + 360.0) % 360.0
}

/// Primary phase whose threshold lies in `(from, to]`, if any.
///
/// A drop in separation is a wrap through 0 degrees and marks a new moon.
pub fn primary_crossing(from: f64, to: f64) -> Option<LunarPhase> {
    if from > to {
        return (from - to > 180.0).then_some(LunarPhase::New);
    }
    QUARTER_THRESHOLDS
        .iter()
        .find(|(_, threshold)| from < *threshold && *threshold <= to)
        .map(|(phase, _)| *phase)
}

/// Day boundary at or before `t`.
pub fn day_start(t: i64, settings: &LunarSettings) -> i64 {
    let noon = settings.reference_noon_ms;
    let day = settings.day_length_ms;
    noon + (t - noon).div_euclid(day) * day
}

/// Build the lunar calendar from the day containing `start`.
///
/// Produces `num_cycles * 10` events in chronological order.
pub fn build_lunar_calendar(
    model: &OrbitalModel,
    settings: &LunarSettings,
    start: i64,
    num_cycles: usize,
) -> EphemerisResult<Vec<LunarEvent>> {
    let target = num_cycles * EVENTS_PER_CYCLE;
    let day = settings.day_length_ms;
    let almost_offset = settings.almost_phase_offset_days * day;

    let mut events = Vec::with_capacity(target);
    let mut cursor = day_start(start, settings);
    let mut quiet_days = 0;

    while events.len() < target {
        let from = separation(model, cursor);
        let to = separation(model, cursor + day);

        match primary_crossing(from, to) {
            Some(phase) => {
                events.push(Event::new(cursor, LunarPayload::new(cursor, phase)));
                cursor += almost_offset;
                if events.len() < target {
                    events.push(Event::new(cursor, LunarPayload::new(cursor, phase.next())));
                }
                quiet_days = 0;
            }
            None => {
                cursor += day;
                quiet_days += 1;
                if quiet_days > MAX_DAYS_WITHOUT_CROSSING {
                    return Err(EphemerisError::configuration(format!(
                        "shadow/white separation crossed no phase threshold in {} days",
                        MAX_DAYS_WITHOUT_CROSSING
                    )));
                }
            }
        }
    }

    debug!("built {} lunar events from {}", events.len(), start);
    Ok(events)
}
