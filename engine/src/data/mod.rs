//! Data layer
//!
//! - `types` - typed input contract for every analysis flavor
//! - `storage` - decision event persistence (HTTP and in-memory)
//! - `telemetry` - batched, best-effort execution telemetry
//! - `error` - collaborator error types

pub mod error;
pub mod storage;
pub mod telemetry;
pub mod types;

pub use error::{StorageError, TelemetryError};
pub use storage::{DecisionEventQuery, HttpStorageAdapter, InMemoryStorage, StorageAdapter};
pub use telemetry::{TelemetryEmitter, TelemetryEvent, TelemetryHandle};
