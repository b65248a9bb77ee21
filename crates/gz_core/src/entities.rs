//! crates/gz_core/src/entities.rs
//! Domain entities: parent areas, daily allocations, rotations and the
//! append-only section events that evidence rotation progress.
//!
//! These are plain data records; all invariant-bearing logic lives in
//! `gz_geom` (geometry) and `gz_engine` (orchestration). The store in
//! `gz_store` enforces the structural uniqueness of `(parent_area, date)`.

use crate::clock::DayStamp;
use crate::geometry::{Polygon, Position};
use crate::ids::{AllocationId, EventId, PaddockId, RotationId};
use crate::variables::{serde_enum, CornerTag, Pct, ProgressionDirection, ThresholdOverrides};

serde_enum!(
    /// Allocation lifecycle. `Rejected` allocations drop out of overlap
    /// history; `Modified` marks farmer feedback on a proposal.
    AllocationStatus => {
        Pending = "pending",
        Approved = "approved",
        Rejected = "rejected",
        Modified = "modified",
        Executed = "executed",
    }
);

serde_enum!(
    /// Rotation lifecycle; `Completed` is terminal.
    RotationStatus => {
        Active = "active",
        Completed = "completed",
    }
);

/// Where a fresh rotation starts and how it sweeps the paddock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RotationDefaults {
    pub starting_corner: CornerTag,
    pub direction: ProgressionDirection,
}

impl Default for RotationDefaults {
    fn default() -> Self {
        RotationDefaults {
            starting_corner: CornerTag::NorthWest,
            direction: ProgressionDirection::Horizontal,
        }
    }
}

/// The bounded region (paddock) daily allocations are carved out of.
/// Read-only from the engine's perspective once registered.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParentArea {
    pub id: PaddockId,
    pub name: String,
    pub boundary: Polygon,
    /// Declared size in hectares; the denominator for grazed percentage.
    pub area_hectares: f64,
    pub rotation_defaults: RotationDefaults,
    #[cfg_attr(feature = "serde", serde(default))]
    pub overrides: ThresholdOverrides,
}

/// Rotation linkage on an allocation. The quadrant hint and reclaim flag
/// arrive with the proposal; rotation id and sequence are stamped when the
/// allocation is approved and joins a rotation.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ProgressContext {
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub rotation: Option<RotationId>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub sequence: Option<u32>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub quadrant: Option<String>,
    /// True when this allocation re-covers an area skipped earlier in the
    /// rotation.
    pub reclaims_skipped: bool,
}

/// A reported skipped/ungrazed patch, carried on the rotation verbatim.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkippedArea {
    pub centroid: Position,
    pub area_hectares: f64,
    pub reason: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub vegetation_signal: Option<f64>,
    pub noted_on: DayStamp,
}

/// One day's grazing plan for a parent area. Exactly one non-deleted record
/// exists per `(parent_area, date)`; later edits on the same day patch this
/// record rather than inserting a second one.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Allocation {
    pub id: AllocationId,
    pub parent_area: PaddockId,
    pub date: DayStamp,
    /// Absent only until the first valid geometry is accepted.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub geometry: Option<Polygon>,
    /// Hectares, recomputed from the final (possibly clipped) geometry.
    pub area_hectares: f64,
    pub confidence: Pct,
    pub reasoning: Vec<String>,
    pub status: AllocationStatus,
    pub justification: String,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub centroid: Option<Position>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub vegetation_signal: Option<f64>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub adjacent_to_previous: Option<bool>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub progress: Option<ProgressContext>,
    /// Skipped-area report waiting to be appended to the rotation on
    /// approval.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub skipped_area: Option<SkippedArea>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub approved_by: Option<String>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub approved_on: Option<DayStamp>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub feedback: Option<String>,
    pub created_on: DayStamp,
    pub updated_on: DayStamp,
}

/// Multi-day progression through one parent area until it is fully grazed.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Rotation {
    pub id: RotationId,
    pub parent_area: PaddockId,
    pub status: RotationStatus,
    pub started_on: DayStamp,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub ended_on: Option<DayStamp>,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub days_in_rotation: Option<i64>,
    pub starting_corner: CornerTag,
    pub direction: ProgressionDirection,
    pub sections_grazed: u32,
    pub area_grazed_hectares: f64,
    /// 0..=100, monotonic non-decreasing, capped at 100.
    pub grazed_percent: f64,
    /// Append-only; never deduplicated or pruned here. Carried forward from
    /// the previous rotation on creation. Retention is deliberately
    /// unbounded until reporting defines a pruning policy.
    pub ungrazed_areas: Vec<SkippedArea>,
}

impl Rotation {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == RotationStatus::Active
    }
}

/// Immutable evidence record of one approved allocation's contribution to a
/// rotation. Never created from a pending or rejected allocation.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SectionEvent {
    pub id: EventId,
    pub parent_area: PaddockId,
    pub rotation: RotationId,
    pub allocation: AllocationId,
    pub date: DayStamp,
    /// Strictly increasing 1..N within one rotation, never reused.
    pub sequence: u32,
    pub geometry: Polygon,
    pub area_hectares: f64,
    pub centroid: Position,
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub vegetation_signal: Option<f64>,
    pub adjacent_to_previous: bool,
    /// Rotation totals at the time this event was recorded.
    pub cumulative_area_hectares: f64,
    pub cumulative_percent: f64,
    /// Lowercase hex SHA-256 of the canonical geometry bytes.
    pub geometry_digest: String,
}

// === Tests ===
