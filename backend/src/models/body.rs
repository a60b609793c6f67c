//! Body identifiers and per-body reference configuration.
//!
//! Slot order is load-bearing: index 0 is always the shadow body and index 1 is
//! always White, the reference body every other relative position is measured from.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{EphemerisError, EphemerisResult};

/// Number of slots in an alignment state vector (shadow + eight orbiting bodies).
pub const NUM_SLOTS: usize = 9;

/// Number of orbiting bodies (everything except the shadow).
pub const NUM_ORBITING: usize = 8;

/// One of the nine tracked bodies, in slot order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BodyId {
    Shadow,
    White,
    Black,
    Green,
    Red,
    Purple,
    Yellow,
    Cyan,
    Blue,
}

impl BodyId {
    /// All bodies in slot order.
    pub const ALL: [BodyId; NUM_SLOTS] = [
        BodyId::Shadow,
        BodyId::White,
        BodyId::Black,
        BodyId::Green,
        BodyId::Red,
        BodyId::Purple,
        BodyId::Yellow,
        BodyId::Cyan,
        BodyId::Blue,
    ];

    /// Orbiting bodies in position-vector order (White first).
    pub const ORBITING: [BodyId; NUM_ORBITING] = [
        BodyId::White,
        BodyId::Black,
        BodyId::Green,
        BodyId::Red,
        BodyId::Purple,
        BodyId::Yellow,
        BodyId::Cyan,
        BodyId::Blue,
    ];

    /// Slot in an alignment state vector.
    pub const fn slot(self) -> usize {
        self as usize
    }

    /// Index into a [`crate::algorithms::orbit::PositionVector`], `None` for the shadow.
    pub const fn orbit_index(self) -> Option<usize> {
        match self {
            BodyId::Shadow => None,
            other => Some(other as usize - 1),
        }
    }

    /// Body at a given alignment slot.
    pub fn from_slot(slot: usize) -> Option<BodyId> {
        Self::ALL.get(slot).copied()
    }

    /// Persisted configuration key.
    pub const fn key(self) -> &'static str {
        match self {
            BodyId::Shadow => "shadow",
            BodyId::White => "white",
            BodyId::Black => "black",
            BodyId::Green => "green",
            BodyId::Red => "red",
            BodyId::Purple => "purple",
            BodyId::Yellow => "yellow",
            BodyId::Cyan => "cyan",
            BodyId::Blue => "blue",
        }
    }

    /// Display name used in event payloads.
    pub const fn display_name(self) -> &'static str {
        match self {
            BodyId::Shadow => "Shadow",
            BodyId::White => "White",
            BodyId::Black => "Black",
            BodyId::Green => "Green",
            BodyId::Red => "Red",
            BodyId::Purple => "Purple",
            BodyId::Yellow => "Yellow",
            BodyId::Cyan => "Cyan",
            BodyId::Blue => "Blue",
        }
    }
}

impl fmt::Display for BodyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for BodyId {
    type Err = String;

    /// Parse a body from its configuration key or display name.
    ///
    /// `candle` is accepted for White: older configuration files store the
    /// reference body's orbit under the candle proxy's name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "shadow" => Ok(BodyId::Shadow),
            "white" | "candle" => Ok(BodyId::White),
            "black" => Ok(BodyId::Black),
            "green" => Ok(BodyId::Green),
            "red" => Ok(BodyId::Red),
            "purple" => Ok(BodyId::Purple),
            "yellow" => Ok(BodyId::Yellow),
            "cyan" => Ok(BodyId::Cyan),
            "blue" => Ok(BodyId::Blue),
            _ => Err(format!("Unknown body: {}", s)),
        }
    }
}

/// Persisted configuration of a single body.
///
/// `ref_pos` is derived by the reference solver for every body except the shadow,
/// whose `ref_offset` is the authoritative reference angle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyRecord {
    /// Orbital period in milliseconds.
    pub period: i64,
    /// Orbital radius relative to the candle proxy's radius of 1.
    #[serde(default = "default_radius")]
    pub radius: f64,
    /// Epoch-ms instant of an observed alignment.
    pub ref_time: i64,
    /// 0 (same side) or 180 (opposite side) at `ref_time`, in degrees.
    #[serde(default)]
    pub ref_offset: f64,
    /// Derived angular position at `ref_time`, in degrees.
    #[serde(default)]
    pub ref_pos: f64,
}

fn default_radius() -> f64 {
    1.0
}

impl BodyRecord {
    /// Create a record with no derived position yet.
    pub fn new(period: i64, radius: f64, ref_time: i64, ref_offset: f64) -> Self {
        Self {
            period,
            radius,
            ref_time,
            ref_offset,
            ref_pos: 0.0,
        }
    }

    fn validate(&self, body: BodyId) -> EphemerisResult<()> {
        if self.period <= 0 {
            return Err(EphemerisError::configuration(format!(
                "{}: period must be positive, got {}",
                body.key(),
                self.period
            )));
        }
        if !self.radius.is_finite() || self.radius < 0.0 {
            return Err(EphemerisError::configuration(format!(
                "{}: radius must be finite and non-negative, got {}",
                body.key(),
                self.radius
            )));
        }
        if !self.ref_offset.is_finite() || !self.ref_pos.is_finite() {
            return Err(EphemerisError::configuration(format!(
                "{}: reference angles must be finite",
                body.key()
            )));
        }
        if !(0.0..360.0).contains(&self.ref_offset) {
            return Err(EphemerisError::configuration(format!(
                "{}: refOffset must be in [0, 360), got {}",
                body.key(),
                self.ref_offset
            )));
        }
        Ok(())
    }
}

/// Reference configuration for all nine bodies.
#[derive(Debug, Clone, PartialEq)]
pub struct BodyConfig {
    /// The shadow body; never derived from the others.
    pub shadow: BodyRecord,
    /// Orbiting bodies in [`BodyId::ORBITING`] order.
    pub orbiting: [BodyRecord; NUM_ORBITING],
}

impl BodyConfig {
    /// Record for any body.
    pub fn get(&self, body: BodyId) -> &BodyRecord {
        match body.orbit_index() {
            None => &self.shadow,
            Some(i) => &self.orbiting[i],
        }
    }

    /// Mutable record for any body.
    pub fn get_mut(&mut self, body: BodyId) -> &mut BodyRecord {
        match body.orbit_index() {
            None => &mut self.shadow,
            Some(i) => &mut self.orbiting[i],
        }
    }

    /// Check every record; a failure here is fatal at construction.
    pub fn validate(&self) -> EphemerisResult<()> {
        for body in BodyId::ALL {
            self.get(body).validate(body)?;
        }
        Ok(())
    }

    /// Build from a name-keyed map, requiring every body exactly once.
    pub fn from_records(records: BTreeMap<String, BodyRecord>) -> EphemerisResult<Self> {
        let mut slots: [Option<BodyRecord>; NUM_SLOTS] = [None; NUM_SLOTS];
        for (name, record) in records {
            let body: BodyId = name.parse().map_err(EphemerisError::Configuration)?;
            if slots[body.slot()].replace(record).is_some() {
                return Err(EphemerisError::configuration(format!(
                    "duplicate record for {}",
                    body.key()
                )));
            }
        }

        let mut take = |body: BodyId| {
            slots[body.slot()].take().ok_or_else(|| {
                EphemerisError::configuration(format!("missing record for {}", body.key()))
            })
        };

        let shadow = take(BodyId::Shadow)?;
        let mut orbiting = [BodyRecord::new(1, 1.0, 0, 0.0); NUM_ORBITING];
        for (i, body) in BodyId::ORBITING.into_iter().enumerate() {
            orbiting[i] = take(body)?;
        }

        let config = Self { shadow, orbiting };
        config.validate()?;
        Ok(config)
    }

    /// Name-keyed map for persistence.
    pub fn to_records(&self) -> BTreeMap<String, BodyRecord> {
        BodyId::ALL
            .into_iter()
            .map(|body| (body.key().to_string(), *self.get(body)))
            .collect()
    }
}

impl Serialize for BodyConfig {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_records().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for BodyConfig {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let records = BTreeMap::<String, BodyRecord>::deserialize(deserializer)?;
        BodyConfig::from_records(records).map_err(serde::de::Error::custom)
    }
}
