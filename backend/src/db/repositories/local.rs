//! In-memory reference store for tests and ephemeral engines.

use parking_lot::RwLock;

use crate::db::repository::{ReferenceStore, RepositoryError, RepositoryResult};
use crate::models::BodyConfig;
use crate::services::recalibration::CandidateMap;

/// Reference store held entirely in memory.
#[derive(Debug, Default)]
pub struct LocalStore {
    bodies: RwLock<Option<BodyConfig>>,
    candidates: RwLock<CandidateMap>,
}

impl LocalStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a body configuration.
    pub fn with_bodies(config: BodyConfig) -> Self {
        Self {
            bodies: RwLock::new(Some(config)),
            candidates: RwLock::new(CandidateMap::new()),
        }
    }
}

impl ReferenceStore for LocalStore {
    fn load_bodies(&self) -> RepositoryResult<BodyConfig> {
        self.bodies
            .read()
            .clone()
            .ok_or_else(|| RepositoryError::not_found("no body configuration stored"))
    }

    fn save_bodies(&self, config: &BodyConfig) -> RepositoryResult<()> {
        *self.bodies.write() = Some(config.clone());
        Ok(())
    }

    fn load_candidates(&self) -> RepositoryResult<CandidateMap> {
        Ok(self.candidates.read().clone())
    }

    fn store_candidates(&self, candidates: &CandidateMap) -> RepositoryResult<()> {
        *self.candidates.write() = candidates.clone();
        Ok(())
    }
}
