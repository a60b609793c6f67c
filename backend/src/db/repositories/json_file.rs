//! Reference store backed by two JSON files.
//!
//! The body file is a map keyed by body name (`{"shadow": {...}, "white": {...}}`);
//! the candidate file maps body names to two raw epoch-ms timestamps.

use std::collections::BTreeMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::db::repository::{ErrorContext, ReferenceStore, RepositoryError, RepositoryResult};
use crate::models::{BodyConfig, BodyRecord};
use crate::services::recalibration::{candidates_from_records, candidates_to_records, CandidateMap};
use crate::settings::StorageSettings;

/// File-backed reference store.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    bodies_path: PathBuf,
    candidates_path: PathBuf,
}

impl JsonFileStore {
    pub fn new(bodies_path: impl Into<PathBuf>, candidates_path: impl Into<PathBuf>) -> Self {
        Self {
            bodies_path: bodies_path.into(),
            candidates_path: candidates_path.into(),
        }
    }

    pub fn from_settings(settings: &StorageSettings) -> Self {
        Self::new(&settings.bodies_path, &settings.candidates_path)
    }

    pub fn bodies_path(&self) -> &Path {
        &self.bodies_path
    }

    pub fn candidates_path(&self) -> &Path {
        &self.candidates_path
    }
}

fn read_json<T: DeserializeOwned>(path: &Path, operation: &str) -> RepositoryResult<Option<T>> {
    let context = || ErrorContext::new(operation).with_location(path.display());
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(RepositoryError::io(e.to_string(), context())),
    };
    serde_json::from_str(&content)
        .map(Some)
        .map_err(|e| RepositoryError::serialization(e.to_string(), context()))
}

/// Write through a uniquely named temp file in the same directory, then rename it
/// over `path`, so readers never see a half-written document.
fn write_json<T: Serialize>(path: &Path, value: &T, operation: &str) -> RepositoryResult<()> {
    let context = || ErrorContext::new(operation).with_location(path.display());
    let content = serde_json::to_string_pretty(value)
        .map_err(|e| RepositoryError::serialization(e.to_string(), context()))?;

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)
        .map_err(|e| RepositoryError::io(e.to_string(), context()))?;
    tmp.write_all(content.as_bytes())
        .map_err(|e| RepositoryError::io(e.to_string(), context()))?;
    tmp.persist(path)
        .map_err(|e| RepositoryError::io(e.error.to_string(), context()))?;
    debug!("wrote {}", path.display());
    Ok(())
}

impl ReferenceStore for JsonFileStore {
    fn load_bodies(&self) -> RepositoryResult<BodyConfig> {
        let records: BTreeMap<String, BodyRecord> =
            read_json(&self.bodies_path, "load_bodies")?.ok_or_else(|| {
                RepositoryError::not_found(format!(
                    "body configuration file {} does not exist",
                    self.bodies_path.display()
                ))
                .with_operation("load_bodies")
            })?;
        BodyConfig::from_records(records)
            .map_err(|e| RepositoryError::validation(e.to_string()).with_operation("load_bodies"))
    }

    fn save_bodies(&self, config: &BodyConfig) -> RepositoryResult<()> {
        write_json(&self.bodies_path, &config.to_records(), "save_bodies")
    }

    fn load_candidates(&self) -> RepositoryResult<CandidateMap> {
        let records: BTreeMap<String, [i64; 2]> =
            read_json(&self.candidates_path, "load_candidates")?.unwrap_or_default();
        candidates_from_records(records).map_err(|e| {
            RepositoryError::validation(e.to_string()).with_operation("load_candidates")
        })
    }

    fn store_candidates(&self, candidates: &CandidateMap) -> RepositoryResult<()> {
        write_json(
            &self.candidates_path,
            &candidates_to_records(candidates),
            "store_candidates",
        )
    }
}
