//! gz_store — persistence and wire I/O for the graze engine.
//!
//! - `store`: in-memory record tables with the structural indexes the
//!   engine's invariants lean on (one allocation per parent-area per day,
//!   insertion-ordered events per rotation).
//! - `canonical_json`: sorted-key compact JSON bytes and atomic file writes.
//! - `hasher`: SHA-256 digests over canonical bytes.
//! - `snapshot`: versioned export/import of the whole store with
//!   cross-reference checks (the bulk-import path).

#![forbid(unsafe_code)]

use thiserror::Error;

use gz_core::clock::DayStamp;
use gz_core::ids::{AllocationId, PaddockId, RotationId};

pub mod canonical_json;
pub mod hasher;
pub mod snapshot;
pub mod store;

pub use snapshot::{load_snapshot, save_snapshot, Snapshot, SNAPSHOT_VERSION};
pub use store::MemoryStore;

/// Unified error for the store layer.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("parent area not found: {0}")]
    AreaNotFound(PaddockId),

    #[error("allocation not found: {0}")]
    AllocationNotFound(AllocationId),

    #[error("rotation not found: {0}")]
    RotationNotFound(RotationId),

    #[error("parent area already registered: {0}")]
    DuplicateArea(PaddockId),

    #[error("record id already in use: {0}")]
    DuplicateId(String),

    #[error("allocation already exists for {area} on {date}")]
    DuplicateDayAllocation { area: PaddockId, date: DayStamp },

    #[error("event sequence for {rotation} must be {expected}, got {got}")]
    EventSequence {
        rotation: RotationId,
        expected: u32,
        got: u32,
    },

    /// Filesystem / path errors (create_dir_all, rename, fsync, ...).
    #[error("io/path error: {0}")]
    Path(String),

    #[error("json error: {0}")]
    Json(String),

    /// Snapshot structure or cross-reference failures.
    #[error("snapshot invalid: {0}")]
    Snapshot(String),

    /// Generic record-level invariant violations.
    #[error("invalid: {0}")]
    Invalid(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<std::io::Error> for StoreError {
    fn from(e: std::io::Error) -> Self {
        StoreError::Path(e.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Json(e.to_string())
    }
}
