//! gz_engine — orchestration of the grazing-allocation engine.
//!
//! One call into this crate is one atomic operation against the store:
//! every fallible read and computation happens before the first write, so a
//! hard error leaves all prior state untouched. Idempotency, not locking,
//! is the concurrency tool — the daily-upsert key and the rotation's
//! monotonic counters make retried calls converge instead of double-count.
//!
//! Stages:
//! - `propose_allocation`: normalize → clip → resolve overlaps → resolve
//!   confidence → daily upsert (one allocation per parent-area per day).
//! - `approve_allocation`: status transition plus the rotation tracker
//!   (sequence numbers, cumulative area/percentage, completion).
//! - `reject_allocation` / `record_feedback`: status mutations.

#![forbid(unsafe_code)]

use thiserror::Error;

use gz_core::clock::{Clock, DayStamp};
use gz_core::entities::{ParentArea, RotationDefaults};
use gz_core::geometry::RawGeometry;
use gz_core::ids::{AllocationId, PaddockId};
use gz_core::variables::{Params, ThresholdOverrides};
use gz_geom::GeomError;
use gz_store::{MemoryStore, StoreError};

pub mod approve;
pub mod confidence;
pub mod propose;
pub mod status;

pub use approve::{Approval, ApprovalOutcome};
pub use confidence::{resolve_confidence, ResolvedConfidence};
pub use propose::{GeometryDisposition, ProposalOutcome, ProposalRequest, SkippedAreaReport};

/// Single error surface for the engine. Lower-layer errors are mapped onto
/// the public taxonomy; only genuinely store-internal failures stay in the
/// `Store` bucket.
#[derive(Debug, Error)]
pub enum EngineError {
    /// An allocation must always carry a geometry; animals graze somewhere
    /// every day.
    #[error("allocation geometry is required")]
    MissingGeometry,

    #[error("invalid geometry: {0}")]
    InvalidGeometry(String),

    #[error("unsupported geometry shape: {0}")]
    UnsupportedGeometryShape(String),

    #[error("section geometry is completely outside the parent boundary")]
    OutsideBoundary,

    #[error(
        "section overlaps allocation from {prior_date} by {overlap_pct:.0}% and could not be adjusted"
    )]
    IrreconcilableOverlap {
        prior_date: DayStamp,
        overlap_pct: f64,
    },

    #[error("parent area not found: {0}")]
    ParentAreaNotFound(PaddockId),

    #[error("allocation not found: {0}")]
    AllocationNotFound(AllocationId),

    #[error("allocation {id} cannot be approved from status \"{status}\"")]
    AllocationNotApprovable { id: AllocationId, status: &'static str },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(StoreError),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl From<GeomError> for EngineError {
    fn from(e: GeomError) -> Self {
        match e {
            GeomError::InvalidGeometry(k) => EngineError::InvalidGeometry(k.to_string()),
            GeomError::UnsupportedShape(k) => EngineError::UnsupportedGeometryShape(k.to_string()),
            GeomError::OutsideBoundary => EngineError::OutsideBoundary,
            GeomError::IrreconcilableOverlap {
                prior_date,
                overlap_pct,
            } => EngineError::IrreconcilableOverlap {
                prior_date,
                overlap_pct,
            },
        }
    }
}

impl From<StoreError> for EngineError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::AreaNotFound(id) => EngineError::ParentAreaNotFound(id),
            StoreError::AllocationNotFound(id) => EngineError::AllocationNotFound(id),
            other => EngineError::Store(other),
        }
    }
}

/// The engine: store, global parameters, and an injected clock.
pub struct Engine<C: Clock> {
    store: MemoryStore,
    params: Params,
    clock: C,
}

impl<C: Clock> Engine<C> {
    pub fn new(store: MemoryStore, params: Params, clock: C) -> EngineResult<Self> {
        params
            .validate_domains()
            .map_err(|e| EngineError::Config(e.to_string()))?;
        Ok(Engine {
            store,
            params,
            clock,
        })
    }

    #[inline]
    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    #[inline]
    pub fn store_mut(&mut self) -> &mut MemoryStore {
        &mut self.store
    }

    #[inline]
    pub fn params(&self) -> &Params {
        &self.params
    }

    #[inline]
    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    #[inline]
    pub(crate) fn today(&self) -> DayStamp {
        self.clock.today()
    }

    /// Registers a parent area, normalizing the boundary the same way
    /// candidate geometry is normalized.
    pub fn register_parent_area(
        &mut self,
        id: PaddockId,
        name: impl Into<String>,
        boundary: &RawGeometry,
        area_hectares: f64,
        rotation_defaults: RotationDefaults,
        overrides: ThresholdOverrides,
    ) -> EngineResult<()> {
        let boundary = gz_geom::normalize(boundary)?;
        if !area_hectares.is_finite() || area_hectares <= 0.0 {
            return Err(EngineError::Config(format!(
                "declared area must be positive, got {area_hectares}"
            )));
        }
        self.store.register_area(ParentArea {
            id,
            name: name.into(),
            boundary,
            area_hectares,
            rotation_defaults,
            overrides,
        })?;
        Ok(())
    }

    /// Effective thresholds for one parent area (overrides shadow globals).
    pub(crate) fn effective_params(&self, area: &ParentArea) -> Params {
        self.params.resolve(&area.overrides)
    }
}
