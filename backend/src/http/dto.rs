//! Data Transfer Objects for the HTTP API.
//!
//! Event payloads are served as the engine caches them; these types only wrap
//! them with query metadata.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::models::{LunarEvent, LunarPhase, ScrollEvent};

/// Body of `POST /update-variables`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateVariablesRequest {
    /// Two raw observation timestamps per body name
    pub vars: BTreeMap<String, [i64; 2]>,
}

/// Response for an accepted update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateVariablesResponse {
    /// Always `"success"`
    pub status: String,
    pub message: String,
    /// Bodies whose candidates were stored
    pub bodies: Vec<String>,
}

/// Query parameters for the scroll events endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollEventsQuery {
    /// Inclusive range start, epoch ms
    pub start: i64,
    /// Inclusive range end, epoch ms
    pub end: i64,
    /// Comma-separated body names; keeps events involving any of them
    #[serde(default)]
    pub bodies: Option<String>,
}

/// Scroll events response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrollEventsResponse {
    pub events: Vec<ScrollEvent>,
    pub total: usize,
    /// Fingerprint of the configuration the cache was built from
    pub fingerprint: String,
}

/// Query parameters for the lunar events endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LunarEventsQuery {
    /// Only events after this instant (default: now)
    #[serde(default)]
    pub from: Option<i64>,
    /// Maximum number of events (default: 8)
    #[serde(default)]
    pub limit: Option<usize>,
    /// Comma-separated phase names, e.g. `full,new`
    #[serde(default)]
    pub phases: Option<String>,
}

/// Lunar events response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LunarEventsResponse {
    pub events: Vec<LunarEvent>,
    pub total: usize,
}

/// Query parameters for the current phase endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CurrentPhaseQuery {
    /// Instant to evaluate (default: now)
    #[serde(default)]
    pub at: Option<i64>,
}

/// Phase in effect at an instant.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentPhaseResponse {
    pub at: i64,
    pub phase: LunarPhase,
    /// Start of the next phase, if cached
    pub until: Option<i64>,
    pub next_full: Option<i64>,
    pub next_new: Option<i64>,
}

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    /// Status of the service
    pub status: String,
    /// Version of the API
    pub version: String,
    pub scroll_events: usize,
    pub lunar_events: usize,
    /// Last cached alignment event
    pub scroll_horizon: Option<i64>,
    pub fingerprint: String,
}
