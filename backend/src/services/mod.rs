//! Service layer: caching, parallel builds, recalibration and the engine facade.

pub mod cache;
pub mod ephemeris;
pub mod parallel;
pub mod recalibration;

pub use cache::{CacheLookup, CurrentPhase, EventCache};
pub use ephemeris::{Ephemeris, LunarCache, ScrollCache};
pub use parallel::{ChunkPlan, ParallelOrchestrator};
pub use recalibration::{CandidateMap, RecalibrationOutcome, Recalibrator};
