//! Application state for the HTTP server.

use std::sync::Arc;

use crate::services::Ephemeris;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Engine serving cached events
    pub engine: Arc<Ephemeris>,
    /// Secret expected in the `Authorization` header of update requests.
    /// Without one, every update is refused.
    pub update_key: Option<Arc<str>>,
}

impl AppState {
    pub fn new(engine: Arc<Ephemeris>) -> Self {
        Self {
            engine,
            update_key: None,
        }
    }

    pub fn with_update_key(mut self, key: impl Into<Arc<str>>) -> Self {
        self.update_key = Some(key.into());
        self
    }

    /// Whether `header` carries the configured update key.
    pub fn authorizes(&self, header: Option<&str>) -> bool {
        match (&self.update_key, header) {
            (Some(key), Some(given)) => key.as_ref() == given,
            _ => false,
        }
    }
}
