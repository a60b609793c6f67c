//! Persistence for body configuration and recalibration candidates.
//!
//! The engine talks to storage through the [`ReferenceStore`] trait so backends
//! can be swapped:
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  Ephemeris facade / HTTP handlers            │
//! └───────────────────┬──────────────────────────┘
//!                     │
//! ┌───────────────────▼──────────────────────────┐
//! │  ReferenceStore trait (repository/)          │
//! └───────────┬──────────────────────┬───────────┘
//!             │                      │
//!     ┌───────▼───────┐      ┌───────▼────────┐
//!     │  LocalStore   │      │ JsonFileStore  │
//!     │  (in-memory)  │      │ (two files)    │
//!     └───────────────┘      └────────────────┘
//! ```

pub mod checksum;
pub mod factory;
pub mod repositories;
pub mod repository;

pub use checksum::{calculate_checksum, configuration_fingerprint};
pub use factory::{StoreFactory, StoreType};
pub use repositories::{JsonFileStore, LocalStore};
pub use repository::{ErrorContext, ReferenceStore, RepositoryError, RepositoryResult};
