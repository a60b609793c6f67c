//! Ephemeris HTTP Server Binary
//!
//! Loads the engine settings and body configuration, builds both event caches,
//! keeps them fresh on a timer and serves them over HTTP.
//!
//! # Usage
//!
//! ```bash
//! # Run against variables.json in the working directory
//! UPDATE_KEY=secret cargo run --bin ephemeris-server
//!
//! # Explicit settings file
//! EPHEMERIS_CONFIG=/etc/ephemeris.toml cargo run --bin ephemeris-server
//! ```
//!
//! # Environment Variables
//!
//! - `HOST`: Server host (default: 0.0.0.0)
//! - `PORT`: Server port (default: 8080)
//! - `EPHEMERIS_CONFIG`: Settings file (default: search for `ephemeris.toml`)
//! - `EPHEMERIS_STORE`: `json` (default) or `local` (in-memory copy of the body file;
//!   recalibrations and candidates are lost on restart)
//! - `UPDATE_KEY`: Secret required by `POST /update-variables`
//! - `RUST_LOG`: Log level (default: info)

use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

use ephemeris::db::{StoreFactory, StoreType};
use ephemeris::http::{create_router, AppState};
use ephemeris::models::time::{describe, now_ms};
use ephemeris::{Ephemeris, EphemerisSettings};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    FmtSubscriber::builder()
        .with_max_level(
            env::var("RUST_LOG")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(Level::INFO),
        )
        .with_target(true)
        .with_thread_ids(true)
        .init();

    info!("Starting Ephemeris HTTP Server");

    let settings = load_settings()?;
    let store_type = StoreType::from_env();
    let store = StoreFactory::create(store_type, &settings.storage)?;
    info!("Store initialized: {:?}", store_type);

    let now = now_ms();
    let (start, stop) = settings.refresh_window(now);
    let moon_cycles = settings.cache.moon_cycles;
    info!("Building caches for [{}, {})", describe(start), describe(stop));
    let engine = tokio::task::spawn_blocking(move || {
        Ephemeris::new(store, settings, start, stop, moon_cycles)
    })
    .await??;
    let engine = Arc::new(engine);
    info!(
        "Engine ready: {} alignment events, {} lunar events",
        engine.scroll_cache().len(),
        engine.lunar_cache().len()
    );

    spawn_refresh_task(Arc::clone(&engine));

    let mut state = AppState::new(engine);
    match env::var("UPDATE_KEY") {
        Ok(key) if !key.is_empty() => state = state.with_update_key(key),
        _ => warn!("UPDATE_KEY not set; /update-variables will refuse every request"),
    }

    let app = create_router(state);

    let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(8080);
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;

    info!("Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Settings from `EPHEMERIS_CONFIG`, else the default search path, else built-in defaults.
fn load_settings() -> anyhow::Result<EphemerisSettings> {
    if let Ok(path) = env::var("EPHEMERIS_CONFIG") {
        info!("Loading settings from {}", path);
        return Ok(EphemerisSettings::from_file(&path)?);
    }
    match EphemerisSettings::from_default_location() {
        Ok(settings) => Ok(settings),
        Err(e) => {
            warn!("No settings file loaded ({}); using defaults", e);
            Ok(EphemerisSettings::default())
        }
    }
}

/// Recalibrate and rebuild both caches every `refresh_interval_secs`.
///
/// A failed refresh keeps serving the previous caches.
fn spawn_refresh_task(engine: Arc<Ephemeris>) {
    let period = Duration::from_secs(engine.settings().cache.refresh_interval_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        // The first tick completes immediately; the caches were just built.
        interval.tick().await;
        loop {
            interval.tick().await;
            let engine = Arc::clone(&engine);
            match tokio::task::spawn_blocking(move || engine.refresh(now_ms())).await {
                Ok(Ok(outcome)) => info!(
                    "Refresh complete: committed={:?} rejected={:?}",
                    outcome.committed, outcome.rejected
                ),
                Ok(Err(e)) => error!("Refresh failed: {}", e),
                Err(e) => error!("Refresh task panicked: {}", e),
            }
        }
    });
}
