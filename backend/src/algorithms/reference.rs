//! Reference position solver.
//!
//! Observers record the instant a body lined up with its reference (White with
//! the shadow, everything else with White) together with the side it lined up on.
//! From those samples we derive each body's `refPos`, the angle the position model
//! starts from, so that evaluating the model at a body's own `refTime`
//! reproduces its `refOffset`.

use super::orbit::{wrap_degrees, OrbitalModel};
use crate::error::EphemerisResult;
use crate::models::{BodyConfig, BodyId, NUM_ORBITING};

/// Derive `refPos` for every orbiting body in place.
///
/// The shadow record is authoritative and left untouched. Depends only on
/// periods, reference times and offsets, so re-running it is a no-op.
pub fn solve_reference_positions(config: &mut BodyConfig) {
    let shadow = config.shadow;
    let shadow_rate = 360.0 / shadow.period as f64;

    let white = config.get(BodyId::White);
    let white_ref_time = white.ref_time;
    let white_rate = 360.0 / white.period as f64;
    let white_ref_pos = wrap_degrees(
        shadow_rate * (white_ref_time - shadow.ref_time) as f64
            + shadow.ref_offset
            + white.ref_offset,
    );
    config.get_mut(BodyId::White).ref_pos = white_ref_pos;

    for body in BodyId::ORBITING.into_iter().skip(1) {
        let record = config.get_mut(body);
        record.ref_pos = wrap_degrees(
            white_rate * (record.ref_time - white_ref_time) as f64
                + white_ref_pos
                + record.ref_offset,
        );
    }
}

/// Angle of `body` relative to the thing it is calibrated against, at `t`.
///
/// White is measured against the shadow, every other orbiting body against White.
/// Returns a value in `[0, 360)`; the shadow has no reference and yields 0.
pub fn relative_angle(model: &OrbitalModel, body: BodyId, t: i64) -> f64 {
    let raw = model.relative_positions(t);
    match body.orbit_index() {
        None => 0.0,
        Some(0) => wrap_degrees(raw[0] - model.shadow_position(t)),
        Some(i) => wrap_degrees(raw[i] - raw[0]),
    }
}

/// Offset each orbiting body shows at its own `refTime` under `config`.
///
/// With solved reference positions this equals the configured `refOffset` for
/// every body, up to floating-point error.
pub fn observed_offsets(config: &BodyConfig) -> EphemerisResult<[f64; NUM_ORBITING]> {
    let model = OrbitalModel::from_config(config)?;
    let mut offsets = [0.0; NUM_ORBITING];
    for (i, body) in BodyId::ORBITING.into_iter().enumerate() {
        offsets[i] = relative_angle(&model, body, config.get(body).ref_time);
    }
    Ok(offsets)
}

/// Smallest distance between two angles, in `[0, 180]`.
pub fn angular_distance(a: f64, b: f64) -> f64 {
    let d = wrap_degrees(a - b);
    d.min(360.0 - d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BodyRecord;
    use approx::assert_abs_diff_eq;
    use std::collections::BTreeMap;

    const MINUTE: i64 = 60_000;

    fn unsolved() -> BodyConfig {
        let records: BTreeMap<String, BodyRecord> = BodyId::ALL
            .into_iter()
            .enumerate()
            .map(|(i, b)| {
                let period = 7_000_000 + 1_234_567 * i as i64;
                let ref_time = 1_700_000_000_000 + 13 * MINUTE * i as i64;
                let ref_offset = match b {
                    BodyId::Shadow => 37.5,
                    _ if i % 2 == 0 => 180.0,
                    _ => 0.0,
                };
                (b.key().to_string(), BodyRecord::new(period, 1.0 + 0.3 * i as f64, ref_time, ref_offset))
            })
            .collect();
        BodyConfig::from_records(records).unwrap()
    }

    #[test]
    fn test_round_trip_reproduces_offsets() {
        let mut config = unsolved();
        solve_reference_positions(&mut config);

        let offsets = observed_offsets(&config).unwrap();
        for (i, body) in BodyId::ORBITING.into_iter().enumerate() {
            let expected = config.get(body).ref_offset;
            assert!(
                angular_distance(offsets[i], expected) < 1e-6,
                "{body}: observed {} expected {}",
                offsets[i],
                expected
            );
        }
    }

    #[test]
    fn test_solver_is_idempotent() {
        let mut once = unsolved();
        solve_reference_positions(&mut once);
        let mut twice = once.clone();
        solve_reference_positions(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_shadow_is_not_derived() {
        let before = unsolved();
        let mut after = before.clone();
        solve_reference_positions(&mut after);
        assert_eq!(before.shadow, after.shadow);
    }

    #[test]
    fn test_white_ref_pos_tracks_shadow() {
        let mut config = unsolved();
        config.shadow.ref_time = config.get(BodyId::White).ref_time;
        config.get_mut(BodyId::White).ref_offset = 0.0;
        solve_reference_positions(&mut config);
        assert_abs_diff_eq!(config.get(BodyId::White).ref_pos, 37.5, epsilon = 1e-9);
    }

    #[test]
    fn test_angular_distance_wraps() {
        assert_abs_diff_eq!(angular_distance(359.0, 1.0), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(angular_distance(10.0, 190.0), 180.0, epsilon = 1e-12);
    }
}
