//! Closed-form orbital position model.
//!
//! Every body moves at a constant angular rate: `angle(t) = (360 / period) * (t - refTime) + ref`.
//! Positions are evaluated fresh for every instant and never stored.

use qtty::Degrees;

use crate::error::{EphemerisError, EphemerisResult};
use crate::models::{BodyConfig, BodyId, BodyRecord, NUM_ORBITING, NUM_SLOTS};

/// Raw positions of the orbiting bodies, White first.
///
/// Slot 0 is White's angle as seen from the candle proxy; slots 1..8 are the
/// other bodies' angles around White.
pub type PositionVector = [f64; NUM_ORBITING];

/// Positions as seen from the candle proxy, in alignment-slot order (shadow first).
pub type CandlePositions = [f64; NUM_SLOTS];

/// Normalize an angle into `[0, 360)`.
pub fn wrap_degrees(angle: f64) -> f64 {
    let wrapped = Degrees::new(angle).wrap_pos().value();
    // rem_euclid can round a tiny negative input up to exactly 360
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Uniform circular motion of one body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    /// Degrees per millisecond.
    pub rate: f64,
    pub ref_time: i64,
    /// Angle at `ref_time`, in degrees.
    pub ref_angle: f64,
}

impl Orbit {
    fn new(body: BodyId, period: i64, ref_time: i64, ref_angle: f64) -> EphemerisResult<Self> {
        if period <= 0 {
            return Err(EphemerisError::configuration(format!(
                "{}: period must be positive, got {}",
                body.key(),
                period
            )));
        }
        Ok(Self {
            rate: 360.0 / period as f64,
            ref_time,
            ref_angle,
        })
    }

    /// Angle at `t`, normalized into `[0, 360)`.
    #[inline]
    pub fn angle_at(&self, t: i64) -> f64 {
        wrap_degrees(self.rate * (t - self.ref_time) as f64 + self.ref_angle)
    }
}

/// Immutable snapshot of every body's motion.
///
/// Cheap to copy; each parallel chunk gets its own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OrbitalModel {
    shadow: Orbit,
    orbits: [Orbit; NUM_ORBITING],
    radii: [f64; NUM_ORBITING],
}

impl OrbitalModel {
    /// Build from a configuration whose reference positions have been solved.
    ///
    /// The shadow's `refOffset` is its reference angle; every other body uses `refPos`.
    pub fn from_config(config: &BodyConfig) -> EphemerisResult<Self> {
        let shadow: &BodyRecord = &config.shadow;
        let shadow = Orbit::new(BodyId::Shadow, shadow.period, shadow.ref_time, shadow.ref_offset)?;

        let mut orbits = [shadow; NUM_ORBITING];
        let mut radii = [1.0; NUM_ORBITING];
        for (i, body) in BodyId::ORBITING.into_iter().enumerate() {
            let record = config.get(body);
            orbits[i] = Orbit::new(body, record.period, record.ref_time, record.ref_pos)?;
            radii[i] = record.radius;
        }

        Ok(Self {
            shadow,
            orbits,
            radii,
        })
    }

    /// Motion of any body.
    pub fn orbit(&self, body: BodyId) -> &Orbit {
        match body.orbit_index() {
            None => &self.shadow,
            Some(i) => &self.orbits[i],
        }
    }

    pub fn radius(&self, body: BodyId) -> f64 {
        match body.orbit_index() {
            None => 1.0,
            Some(i) => self.radii[i],
        }
    }

    /// Shadow angle at `t`.
    pub fn shadow_position(&self, t: i64) -> f64 {
        self.shadow.angle_at(t)
    }

    /// Raw orbiting-body positions at `t`.
    pub fn relative_positions(&self, t: i64) -> PositionVector {
        let mut positions = [0.0; NUM_ORBITING];
        for (pos, orbit) in positions.iter_mut().zip(self.orbits.iter()) {
            *pos = orbit.angle_at(t);
        }
        positions
    }

    /// Positions of all nine slots as seen from the candle proxy at `t`.
    ///
    /// The candle proxy sits opposite White, so each remaining body's offset is
    /// `radius * (cos θ, sin θ) - (cos φ, sin φ)` with `φ = white + 180`.
    pub fn candle_relative_positions(&self, t: i64) -> CandlePositions {
        let raw = self.relative_positions(t);
        let candle = (raw[0] + 180.0).to_radians();
        let (candle_sin, candle_cos) = candle.sin_cos();

        let mut out = [0.0; NUM_SLOTS];
        out[0] = self.shadow_position(t);
        out[1] = raw[0];
        for k in 1..NUM_ORBITING {
            let (sin, cos) = raw[k].to_radians().sin_cos();
            let x = self.radii[k] * cos - candle_cos;
            let y = self.radii[k] * sin - candle_sin;
            out[k + 1] = wrap_degrees(y.atan2(x).to_degrees());
        }
        out
    }
}
