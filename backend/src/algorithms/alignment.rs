//! Alignment state detection.
//!
//! Two bodies are aligned when they sit on the same line through the candle
//! proxy, on either side of it. Alignments involving the shadow ("dark") use a
//! wider threshold than alignments between the other bodies ("glow").

use super::orbit::{CandlePositions, OrbitalModel};
use crate::error::{EphemerisError, EphemerisResult};
use crate::models::NUM_SLOTS;
use crate::settings::ScanSettings;

/// One flag per slot: is this body aligned with any other body.
pub type AlignmentState = [bool; NUM_SLOTS];

/// Baseline the first event of every range is reported against.
pub const UNALIGNED: AlignmentState = [false; NUM_SLOTS];

/// Line distance between two directions, in `[0, 90]`.
///
/// Opposite directions lie on the same line, so angles are compared modulo 180.
pub fn folded_difference(a: f64, b: f64) -> f64 {
    let d = (a.rem_euclid(180.0) - b.rem_euclid(180.0)).abs();
    if d > 90.0 {
        180.0 - d
    } else {
        d
    }
}

/// Classifies every slot as aligned or not.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignmentDetector {
    glow_threshold: f64,
    dark_threshold: f64,
}

impl AlignmentDetector {
    pub fn new(glow_threshold: f64, dark_threshold: f64) -> Self {
        Self {
            glow_threshold,
            dark_threshold,
        }
    }

    pub fn from_settings(settings: &ScanSettings) -> Self {
        Self::new(
            settings.glow_threshold_deg.value(),
            settings.dark_threshold_deg.value(),
        )
    }

    /// Alignment state for a set of candle-relative positions.
    ///
    /// Every slot is compared with each later slot; pairs involving slot 0 (the
    /// shadow) use the dark threshold. A pair under its threshold marks both members.
    pub fn detect(&self, positions: &CandlePositions) -> AlignmentState {
        let mut state = UNALIGNED;
        for i in 0..NUM_SLOTS - 1 {
            let threshold = if i == 0 {
                self.dark_threshold
            } else {
                self.glow_threshold
            };
            for j in i + 1..NUM_SLOTS {
                if folded_difference(positions[i], positions[j]) < threshold {
                    state[i] = true;
                    state[j] = true;
                }
            }
        }
        state
    }

    /// Alignment state at `t`.
    pub fn state_at(&self, model: &OrbitalModel, t: i64) -> EphemerisResult<AlignmentState> {
        let positions = model.candle_relative_positions(t);
        if let Some(slot) = positions.iter().position(|p| !p.is_finite()) {
            return Err(EphemerisError::NumericalFault {
                timestamp: t,
                message: format!("non-finite position in slot {}", slot),
            });
        }
        Ok(self.detect(&positions))
    }
}
