//! Cached event types.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::body::BodyId;
use super::time::display_timestamp;

/// An immutable `(timestamp, payload)` pair held by an event cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event<P> {
    /// Epoch milliseconds.
    pub timestamp: i64,
    pub payload: P,
}

impl<P> Event<P> {
    pub fn new(timestamp: i64, payload: P) -> Self {
        Self { timestamp, payload }
    }
}

/// Alignment ("scroll") event payload.
///
/// Lists keep slot order. The shadow appears in `new_darks` and
/// `returned_to_normal` when it takes part in a transition; use the
/// `visible_*` accessors for display lists without it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollPayload {
    /// Bodies that began to glow.
    pub new_glows: Vec<BodyId>,
    /// Bodies that went dark (aligned with the shadow).
    pub new_darks: Vec<BodyId>,
    /// Bodies that lost alignment.
    pub returned_to_normal: Vec<BodyId>,
    pub display_timestamp: String,
}

impl ScrollPayload {
    pub fn new(
        timestamp: i64,
        new_glows: Vec<BodyId>,
        new_darks: Vec<BodyId>,
        returned_to_normal: Vec<BodyId>,
    ) -> Self {
        Self {
            new_glows,
            new_darks,
            returned_to_normal,
            display_timestamp: display_timestamp(timestamp),
        }
    }

    /// Dark list without the shadow itself.
    pub fn visible_darks(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.new_darks.iter().copied().filter(|b| *b != BodyId::Shadow)
    }

    /// Returned-to-normal list without the shadow itself.
    pub fn visible_returned(&self) -> impl Iterator<Item = BodyId> + '_ {
        self.returned_to_normal
            .iter()
            .copied()
            .filter(|b| *b != BodyId::Shadow)
    }

    /// Whether `body` appears in any category.
    pub fn involves(&self, body: BodyId) -> bool {
        self.new_glows.contains(&body)
            || self.new_darks.contains(&body)
            || self.returned_to_normal.contains(&body)
    }
}

/// Keep only events that involve at least one of `bodies`; an empty filter keeps everything.
pub fn filter_by_bodies<'a>(
    events: &'a [Event<ScrollPayload>],
    bodies: &'a [BodyId],
) -> impl Iterator<Item = &'a Event<ScrollPayload>> + 'a {
    events
        .iter()
        .filter(move |e| bodies.is_empty() || bodies.iter().any(|b| e.payload.involves(*b)))
}

/// The eight lunar phases in cycle order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LunarPhase {
    New,
    WaxingCrescent,
    FirstQuarter,
    WaxingGibbous,
    Full,
    WaningGibbous,
    ThirdQuarter,
    WaningCrescent,
}

impl LunarPhase {
    /// All phases in cycle order, starting at new.
    pub const CYCLE: [LunarPhase; 8] = [
        LunarPhase::New,
        LunarPhase::WaxingCrescent,
        LunarPhase::FirstQuarter,
        LunarPhase::WaxingGibbous,
        LunarPhase::Full,
        LunarPhase::WaningGibbous,
        LunarPhase::ThirdQuarter,
        LunarPhase::WaningCrescent,
    ];

    /// Phase that follows this one.
    pub fn next(self) -> Self {
        Self::CYCLE[(self as usize + 1) % 8]
    }

    /// Phase that precedes this one.
    pub fn previous(self) -> Self {
        Self::CYCLE[(self as usize + 7) % 8]
    }

    /// Whether this phase is found by threshold crossing (the other four are synthesized).
    pub fn is_primary(self) -> bool {
        matches!(
            self,
            LunarPhase::New | LunarPhase::FirstQuarter | LunarPhase::Full | LunarPhase::ThirdQuarter
        )
    }

    pub const fn key(self) -> &'static str {
        match self {
            LunarPhase::New => "new",
            LunarPhase::WaxingCrescent => "waxing_crescent",
            LunarPhase::FirstQuarter => "first_quarter",
            LunarPhase::WaxingGibbous => "waxing_gibbous",
            LunarPhase::Full => "full",
            LunarPhase::WaningGibbous => "waning_gibbous",
            LunarPhase::ThirdQuarter => "third_quarter",
            LunarPhase::WaningCrescent => "waning_crescent",
        }
    }
}

impl fmt::Display for LunarPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for LunarPhase {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::CYCLE
            .into_iter()
            .find(|p| p.key() == s.to_lowercase())
            .ok_or_else(|| format!("Unknown lunar phase: {}", s))
    }
}

/// Lunar event payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LunarPayload {
    pub phase: LunarPhase,
    pub display_timestamp: String,
}

impl LunarPayload {
    pub fn new(timestamp: i64, phase: LunarPhase) -> Self {
        Self {
            phase,
            display_timestamp: display_timestamp(timestamp),
        }
    }
}

pub type ScrollEvent = Event<ScrollPayload>;
pub type LunarEvent = Event<LunarPayload>;
