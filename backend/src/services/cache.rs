//! Time-sorted event caches with inclusive range queries.
//!
//! A cache is built once and never patched: a rebuild produces a new cache that
//! replaces the old one whole.

use std::fs;
use std::path::Path;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::EphemerisResult;
use crate::models::{Event, LunarEvent, LunarPayload, LunarPhase};

/// Result of a range lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum CacheLookup<'a, P> {
    /// The cache covers the range.
    Hit(&'a [Event<P>]),
    /// The range runs to or past the last cached event; rebuild before relying on it.
    Exhausted { horizon: Option<i64> },
}

/// Chronologically ordered events plus the configuration they were built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCache<P> {
    events: Vec<Event<P>>,
    fingerprint: String,
}

impl<P> EventCache<P> {
    /// Wrap already-sorted events.
    pub fn new(events: Vec<Event<P>>, fingerprint: impl Into<String>) -> Self {
        debug_assert!(events.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
        Self {
            events,
            fingerprint: fingerprint.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), String::new())
    }

    pub fn events(&self) -> &[Event<P>] {
        &self.events
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Fingerprint of the body configuration the cache was built from.
    pub fn fingerprint(&self) -> &str {
        &self.fingerprint
    }

    /// Timestamp of the last cached event.
    pub fn horizon(&self) -> Option<i64> {
        self.events.last().map(|e| e.timestamp)
    }

    /// Whether `end` lies strictly before the last cached event.
    pub fn covers(&self, end: i64) -> bool {
        self.horizon().is_some_and(|h| end < h)
    }

    /// Events with `start <= timestamp <= end`, in order.
    pub fn query(&self, start: i64, end: i64) -> &[Event<P>] {
        if start > end {
            warn!("rejected inverted range query: start={} end={}", start, end);
            return &[];
        }
        let lo = self.events.partition_point(|e| e.timestamp < start);
        let hi = self.events.partition_point(|e| e.timestamp <= end);
        &self.events[lo..hi]
    }

    /// Like [`Self::query`], but reports ranges the cache cannot vouch for.
    pub fn lookup(&self, start: i64, end: i64) -> CacheLookup<'_, P> {
        if self.covers(end) {
            CacheLookup::Hit(self.query(start, end))
        } else {
            CacheLookup::Exhausted {
                horizon: self.horizon(),
            }
        }
    }
}

impl<P: Serialize> EventCache<P> {
    /// Dump the events as JSON.
    pub fn save_json(&self, path: impl AsRef<Path>) -> EphemerisResult<()> {
        let content = serde_json::to_string_pretty(&self.events)?;
        fs::write(path, content)?;
        Ok(())
    }
}

/// The phase in effect at some instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPhase {
    pub phase: LunarPhase,
    /// Start of the next phase, if cached.
    pub until: Option<i64>,
}

impl EventCache<LunarPayload> {
    /// Phase in effect at `now`.
    ///
    /// Before the first cached event the phase is the one preceding it.
    pub fn current_phase(&self, now: i64) -> Option<CurrentPhase> {
        let first = self.events.first()?;
        let idx = self.events.partition_point(|e| e.timestamp <= now);
        if idx == 0 {
            return Some(CurrentPhase {
                phase: first.payload.phase.previous(),
                until: Some(first.timestamp),
            });
        }
        Some(CurrentPhase {
            phase: self.events[idx - 1].payload.phase,
            until: self.events.get(idx).map(|e| e.timestamp),
        })
    }

    /// Next occurrence of `phase` strictly after `now`.
    pub fn next_phase(&self, now: i64, phase: LunarPhase) -> Option<&LunarEvent> {
        let idx = self.events.partition_point(|e| e.timestamp <= now);
        self.events[idx..].iter().find(|e| e.payload.phase == phase)
    }

    /// Events after `now`, optionally restricted to some phases.
    pub fn upcoming<'a>(
        &'a self,
        now: i64,
        phases: &'a [LunarPhase],
    ) -> impl Iterator<Item = &'a LunarEvent> + 'a {
        let idx = self.events.partition_point(|e| e.timestamp <= now);
        self.events[idx..]
            .iter()
            .filter(move |e| phases.is_empty() || phases.contains(&e.payload.phase))
    }
}
