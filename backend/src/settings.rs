//! Engine settings file support.
//!
//! Settings are read from an `ephemeris.toml` file. Every field has a default, so
//! an empty file (or no file at all) yields the stock engine.

use qtty::Degrees;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{EphemerisError, EphemerisResult};
use crate::models::time::MS_PER_DAY;

/// Engine settings from file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EphemerisSettings {
    #[serde(default)]
    pub scan: ScanSettings,
    #[serde(default)]
    pub parallel: ParallelSettings,
    #[serde(default)]
    pub lunar: LunarSettings,
    #[serde(default)]
    pub recalibration: RecalibrationSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Alignment detection and time stepping.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanSettings {
    /// Body-to-body alignment threshold.
    #[serde(default = "default_glow_threshold")]
    pub glow_threshold_deg: Degrees,
    /// Shadow alignment threshold.
    #[serde(default = "default_dark_threshold")]
    pub dark_threshold_deg: Degrees,
    #[serde(default = "default_coarse_step_ms")]
    pub coarse_step_ms: i64,
    #[serde(default = "default_fine_step_ms")]
    pub fine_step_ms: i64,
}

/// Chunked range builds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParallelSettings {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Whole-batch attempts before a build fails.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

/// Lunar calendar anchoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LunarSettings {
    /// An instant known to be a day boundary ("noon").
    #[serde(default)]
    pub reference_noon_ms: i64,
    /// Length of one in-world day.
    #[serde(default = "default_day_length_ms")]
    pub day_length_ms: i64,
    /// Days between a primary phase and the intermediate phase that follows it.
    #[serde(default = "default_almost_phase_offset_days")]
    pub almost_phase_offset_days: i64,
}

/// Reference-time recalibration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalibrationSettings {
    /// Subtracted from averaged candidates to compensate for reporting latency.
    #[serde(default = "default_skew_ms")]
    pub skew_ms: i64,
    /// Half-width of the cache windows checked around each raw candidate.
    #[serde(default = "default_validation_window_ms")]
    pub validation_window_ms: i64,
}

/// Cache window used by periodic refreshes, relative to "now".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_start_offset_days")]
    pub start_offset_days: i64,
    #[serde(default = "default_end_offset_days")]
    pub end_offset_days: i64,
    #[serde(default = "default_moon_cycles")]
    pub moon_cycles: usize,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
}

/// File locations for the JSON store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_bodies_path")]
    pub bodies_path: PathBuf,
    #[serde(default = "default_candidates_path")]
    pub candidates_path: PathBuf,
    /// Optional JSON dump of the alignment cache after each rebuild.
    #[serde(default)]
    pub cache_path: Option<PathBuf>,
}

fn default_glow_threshold() -> Degrees {
    Degrees::new(0.5)
}

fn default_dark_threshold() -> Degrees {
    Degrees::new(1.0)
}

fn default_coarse_step_ms() -> i64 {
    60 * 1000
}

fn default_fine_step_ms() -> i64 {
    1000
}

fn default_workers() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_max_attempts() -> u32 {
    3
}

fn default_day_length_ms() -> i64 {
    MS_PER_DAY
}

fn default_almost_phase_offset_days() -> i64 {
    5
}

fn default_skew_ms() -> i64 {
    500
}

fn default_validation_window_ms() -> i64 {
    15_000
}

fn default_start_offset_days() -> i64 {
    -4
}

fn default_end_offset_days() -> i64 {
    35
}

fn default_moon_cycles() -> usize {
    8
}

fn default_refresh_interval_secs() -> u64 {
    60 * 60 * 12
}

fn default_bodies_path() -> PathBuf {
    PathBuf::from("variables.json")
}

fn default_candidates_path() -> PathBuf {
    PathBuf::from("newRefTimes.json")
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            glow_threshold_deg: default_glow_threshold(),
            dark_threshold_deg: default_dark_threshold(),
            coarse_step_ms: default_coarse_step_ms(),
            fine_step_ms: default_fine_step_ms(),
        }
    }
}

impl Default for ParallelSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            workers: default_workers(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl Default for LunarSettings {
    fn default() -> Self {
        Self {
            reference_noon_ms: 0,
            day_length_ms: default_day_length_ms(),
            almost_phase_offset_days: default_almost_phase_offset_days(),
        }
    }
}

impl Default for RecalibrationSettings {
    fn default() -> Self {
        Self {
            skew_ms: default_skew_ms(),
            validation_window_ms: default_validation_window_ms(),
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            start_offset_days: default_start_offset_days(),
            end_offset_days: default_end_offset_days(),
            moon_cycles: default_moon_cycles(),
            refresh_interval_secs: default_refresh_interval_secs(),
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            bodies_path: default_bodies_path(),
            candidates_path: default_candidates_path(),
            cache_path: None,
        }
    }
}

impl EphemerisSettings {
    /// Load settings from a TOML file.
    ///
    /// # Arguments
    /// * `path` - Path to the settings file
    ///
    /// # Returns
    /// * `Ok(EphemerisSettings)` if the file parses and validates
    /// * `Err(EphemerisError::Configuration)` otherwise
    pub fn from_file<P: AsRef<Path>>(path: P) -> EphemerisResult<Self> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            EphemerisError::configuration(format!("Failed to read settings file: {}", e))
        })?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> EphemerisResult<Self> {
        let settings: EphemerisSettings = toml::from_str(content).map_err(|e| {
            EphemerisError::configuration(format!("Failed to parse settings file: {}", e))
        })?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from the default location.
    ///
    /// Searches for `ephemeris.toml` in:
    /// 1. Current directory
    /// 2. `backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> EphemerisResult<Self> {
        let search_paths = [
            PathBuf::from("ephemeris.toml"),
            PathBuf::from("backend/ephemeris.toml"),
            PathBuf::from("../ephemeris.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(EphemerisError::configuration(
            "No ephemeris.toml found in standard locations",
        ))
    }

    /// Reject settings the engine cannot run with.
    pub fn validate(&self) -> EphemerisResult<()> {
        let scan = &self.scan;
        if scan.coarse_step_ms <= 0 || scan.fine_step_ms <= 0 {
            return Err(EphemerisError::configuration(
                "scan steps must be positive",
            ));
        }
        if scan.fine_step_ms > scan.coarse_step_ms {
            return Err(EphemerisError::configuration(
                "fine_step_ms must not exceed coarse_step_ms",
            ));
        }
        if scan.glow_threshold_deg.value() <= 0.0 || scan.dark_threshold_deg.value() <= 0.0 {
            return Err(EphemerisError::configuration(
                "alignment thresholds must be positive",
            ));
        }
        if self.parallel.workers == 0 || self.parallel.max_attempts == 0 {
            return Err(EphemerisError::configuration(
                "parallel.workers and parallel.max_attempts must be at least 1",
            ));
        }
        if self.lunar.day_length_ms <= 0 || self.lunar.almost_phase_offset_days <= 0 {
            return Err(EphemerisError::configuration(
                "lunar.day_length_ms and lunar.almost_phase_offset_days must be positive",
            ));
        }
        if self.cache.start_offset_days >= self.cache.end_offset_days {
            return Err(EphemerisError::configuration(
                "cache.start_offset_days must be before cache.end_offset_days",
            ));
        }
        Ok(())
    }

    /// Cache window `[start, stop)` around `now` for periodic refreshes.
    pub fn refresh_window(&self, now_ms: i64) -> (i64, i64) {
        (
            now_ms + self.cache.start_offset_days * MS_PER_DAY,
            now_ms + self.cache.end_offset_days * MS_PER_DAY,
        )
    }
}
