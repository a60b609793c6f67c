//! Reference-store factory.
//!
//! Picks a [`ReferenceStore`] implementation from runtime configuration.

use std::str::FromStr;
use std::sync::Arc;

use super::repositories::{JsonFileStore, LocalStore};
use super::repository::{ReferenceStore, RepositoryResult};
use crate::settings::StorageSettings;

/// Store type configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreType {
    /// JSON files on disk
    JsonFile,
    /// In-memory store, seeded from the body file when it exists
    Local,
}

impl FromStr for StoreType {
    type Err = String;

    /// Parse store type from string ("json", "file", "local").
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" | "file" | "json_file" => Ok(Self::JsonFile),
            "local" | "memory" => Ok(Self::Local),
            _ => Err(format!("Unknown store type: {}", s)),
        }
    }
}

impl StoreType {
    /// Read `EPHEMERIS_STORE`, defaulting to JSON files.
    pub fn from_env() -> Self {
        std::env::var("EPHEMERIS_STORE")
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or(Self::JsonFile)
    }
}

/// Factory for reference stores.
pub struct StoreFactory;

impl StoreFactory {
    /// Create a store of the given type.
    ///
    /// A local store copies the body configuration at `bodies_path` into memory if
    /// the file is there; solved positions and candidates are never written back.
    pub fn create(
        store_type: StoreType,
        settings: &StorageSettings,
    ) -> RepositoryResult<Arc<dyn ReferenceStore>> {
        match store_type {
            StoreType::JsonFile => Ok(Arc::new(JsonFileStore::from_settings(settings))),
            StoreType::Local => {
                let seed = JsonFileStore::from_settings(settings);
                if !seed.bodies_path().exists() {
                    return Ok(Arc::new(LocalStore::new()));
                }
                let config = seed.load_bodies()?;
                Ok(Arc::new(LocalStore::with_bodies(config)))
            }
        }
    }
}
