//! Reference-store trait.
//!
//! The engine never touches files directly: body configuration and the raw
//! recalibration candidates go through a [`ReferenceStore`], so tests can run
//! against [`crate::db::LocalStore`] and the server against
//! [`crate::db::JsonFileStore`].

pub mod error;

pub use error::{ErrorContext, RepositoryError, RepositoryResult};

use crate::models::BodyConfig;
use crate::services::recalibration::CandidateMap;

/// Persistence for body configuration and recalibration candidates.
///
/// # Thread Safety
/// Implementations must be `Send + Sync`; the store is shared between the
/// request handlers and the periodic refresh task.
pub trait ReferenceStore: Send + Sync {
    /// Load the current body configuration.
    ///
    /// # Returns
    /// * `Ok(BodyConfig)` - Validated configuration for all nine bodies
    /// * `Err(RepositoryError::NotFound)` - If nothing has been stored
    fn load_bodies(&self) -> RepositoryResult<BodyConfig>;

    /// Replace the stored body configuration.
    fn save_bodies(&self, config: &BodyConfig) -> RepositoryResult<()>;

    /// Load pending candidate reference times. An empty map if none are stored.
    fn load_candidates(&self) -> RepositoryResult<CandidateMap>;

    /// Replace the pending candidate reference times.
    fn store_candidates(&self, candidates: &CandidateMap) -> RepositoryResult<()>;
}
