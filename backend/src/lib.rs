//! # Ephemeris
//!
//! Deterministic alignment and lunar-phase event engine.
//!
//! A closed-form orbital model (eight bodies plus a shadow, each on a fixed period
//! around a common center) is sampled over a time window; every change in which
//! bodies line up becomes an alignment ("scroll") event, and the angular separation
//! of the shadow and White drives a parallel lunar-phase calendar. Both event lists
//! are cached and served by inclusive range queries.
//!
//! ## Architecture
//!
//! - [`models`]: bodies, events and epoch-millisecond helpers
//! - [`algorithms`]: orbital positions, reference solving, alignment detection,
//!   the coarse/fine event scan and the lunar calendar
//! - [`services`]: event caches, parallel chunked builds, recalibration and the
//!   [`Ephemeris`] engine facade
//! - [`db`]: persistence of the body configuration and candidate reference times
//! - [`settings`]: `ephemeris.toml` engine settings
//! - [`http`]: axum web surface (feature `http-server`)

// RepositoryError carries rich context for debugging
#![allow(clippy::result_large_err)]

pub mod algorithms;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod settings;

#[cfg(feature = "http-server")]
pub mod http;

pub use error::{EphemerisError, EphemerisResult};
pub use models::{BodyConfig, BodyId, BodyRecord, LunarEvent, LunarPhase, ScrollEvent};
pub use services::Ephemeris;
pub use settings::EphemerisSettings;
