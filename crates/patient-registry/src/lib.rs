//! `patient-registry` - A small durable patient register
//!
//! This library provides the record store behind the `ptreg` command: patient
//! records kept in memory, mirrored as one JSON document to a durable
//! key-value slot, and searched by case-insensitive substring within a scope.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod patient;
pub mod registry;
pub mod search;
pub mod storage;
pub mod view;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use patient::{PatientFields, PatientId, PatientRecord};
pub use registry::{Registry, RegistryOptions, SyncState};
pub use search::{SearchQuery, SearchScope};
pub use storage::{MemoryStore, SlotStore, SqliteStore, StorageStats};
pub use view::{SearchView, Summary};
