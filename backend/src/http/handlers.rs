//! HTTP handlers for the REST API.
//!
//! Read endpoints work on cache snapshots and never trigger a rebuild. The update
//! endpoint only records candidates; they are applied by the next refresh.

use axum::{
    body::Bytes,
    extract::{Query, State},
    http::{header::AUTHORIZATION, HeaderMap},
    Json,
};
use std::sync::Arc;
use tracing::{info, warn};

use super::dto::{
    CurrentPhaseQuery, CurrentPhaseResponse, HealthResponse, LunarEventsQuery,
    LunarEventsResponse, ScrollEventsQuery, ScrollEventsResponse, UpdateVariablesRequest,
    UpdateVariablesResponse,
};
use super::error::AppError;
use super::state::AppState;
use crate::models::time::now_ms;
use crate::models::{filter_by_bodies, BodyId, LunarPhase};
use crate::services::cache::CacheLookup;
use crate::services::recalibration::candidates_from_records;

/// Result type for handlers.
pub type HandlerResult<T> = Result<Json<T>, AppError>;

/// Default number of lunar events returned.
const DEFAULT_LUNAR_LIMIT: usize = 8;

// =============================================================================
// Health Check
// =============================================================================

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> HandlerResult<HealthResponse> {
    let scroll = state.engine.scroll_cache();
    let lunar = state.engine.lunar_cache();

    Ok(Json(HealthResponse {
        status: "ok".to_string(),
        version: "v1".to_string(),
        scroll_events: scroll.len(),
        lunar_events: lunar.len(),
        scroll_horizon: scroll.horizon(),
        fingerprint: scroll.fingerprint().to_string(),
    }))
}

// =============================================================================
// Calibration
// =============================================================================

/// POST /update-variables
///
/// Store candidate reference times. Requires the update key in `Authorization`.
pub async fn update_variables(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> HandlerResult<UpdateVariablesResponse> {
    let given = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if !state.authorizes(given) {
        warn!("rejected update-variables request with missing or wrong key");
        return Err(AppError::Unauthorized);
    }

    let request: UpdateVariablesRequest =
        serde_json::from_slice(&body).map_err(|e| AppError::BadPayload(e.to_string()))?;
    let candidates =
        candidates_from_records(request.vars).map_err(|e| AppError::BadPayload(e.to_string()))?;
    let bodies: Vec<String> = candidates.keys().map(|b| b.key().to_string()).collect();

    let engine = Arc::clone(&state.engine);
    tokio::task::spawn_blocking(move || engine.ingest_candidate_reference_times(candidates))
        .await??;

    info!("stored candidate reference times for {:?}", bodies);
    Ok(Json(UpdateVariablesResponse {
        status: "success".to_string(),
        message: "Variables updated".to_string(),
        bodies,
    }))
}

// =============================================================================
// Alignment Events
// =============================================================================

/// GET /v1/scroll-events?start=&end=&bodies=
///
/// Events in `[start, end]`. A range reaching the last cached event is refused with
/// 409 and the cache horizon.
pub async fn get_scroll_events(
    State(state): State<AppState>,
    Query(query): Query<ScrollEventsQuery>,
) -> HandlerResult<ScrollEventsResponse> {
    if query.start > query.end {
        return Err(AppError::BadRequest(format!(
            "start ({}) is after end ({})",
            query.start, query.end
        )));
    }
    let bodies = parse_list::<BodyId>(query.bodies.as_deref())?;

    let cache = state.engine.scroll_cache();
    let events = match cache.lookup(query.start, query.end) {
        CacheLookup::Hit(events) => events,
        CacheLookup::Exhausted { horizon } => return Err(AppError::Exhausted { horizon }),
    };
    let events: Vec<_> = filter_by_bodies(events, &bodies).cloned().collect();

    Ok(Json(ScrollEventsResponse {
        total: events.len(),
        events,
        fingerprint: cache.fingerprint().to_string(),
    }))
}

// =============================================================================
// Lunar Calendar
// =============================================================================

/// GET /v1/lunar-events?from=&limit=&phases=
pub async fn get_lunar_events(
    State(state): State<AppState>,
    Query(query): Query<LunarEventsQuery>,
) -> HandlerResult<LunarEventsResponse> {
    let phases = parse_list::<LunarPhase>(query.phases.as_deref())?;
    let from = query.from.unwrap_or_else(now_ms);
    let limit = query.limit.unwrap_or(DEFAULT_LUNAR_LIMIT);

    let cache = state.engine.lunar_cache();
    let events: Vec<_> = cache.upcoming(from, &phases).take(limit).cloned().collect();

    Ok(Json(LunarEventsResponse {
        total: events.len(),
        events,
    }))
}

/// GET /v1/lunar/current?at=
pub async fn get_current_phase(
    State(state): State<AppState>,
    Query(query): Query<CurrentPhaseQuery>,
) -> HandlerResult<CurrentPhaseResponse> {
    let at = query.at.unwrap_or_else(now_ms);
    let cache = state.engine.lunar_cache();
    let current = cache
        .current_phase(at)
        .ok_or_else(|| AppError::NotFound("no lunar events cached".to_string()))?;

    Ok(Json(CurrentPhaseResponse {
        at,
        phase: current.phase,
        until: current.until,
        next_full: cache.next_phase(at, LunarPhase::Full).map(|e| e.timestamp),
        next_new: cache.next_phase(at, LunarPhase::New).map(|e| e.timestamp),
    }))
}

/// Parse a comma-separated list; an absent or empty parameter yields an empty list.
fn parse_list<T>(raw: Option<&str>) -> Result<Vec<T>, AppError>
where
    T: std::str::FromStr<Err = String>,
{
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(AppError::BadRequest))
        .collect()
}
