//! Reference-store implementations:
//! - `local`: In-memory store for unit testing and ephemeral engines
//! - `json_file`: JSON files on disk, used by the server
pub mod json_file;
pub mod local;

pub use json_file::JsonFileStore;
pub use local::LocalStore;
