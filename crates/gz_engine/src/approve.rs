//! crates/gz_engine/src/approve.rs
//! Approval path and the rotation tracker. Approval is the only trigger for
//! rotation progress: it resolves (or creates) the active rotation, assigns
//! the next sequence number, appends an immutable section event, advances
//! the rotation's monotonic cumulative counters, and completes the rotation
//! the first time the threshold is reached.

use log::info;

use gz_core::clock::Clock;
use gz_core::entities::{
    Allocation, AllocationStatus, ProgressContext, Rotation, RotationStatus,
};
use gz_core::entities::SectionEvent;
use gz_core::ids::{AllocationId, RotationId};
use gz_geom::vertex_centroid;
use gz_store::hasher::polygon_digest;
use gz_store::StoreError;

use crate::{Engine, EngineError, EngineResult};

/// Approval event from a collaborator.
#[derive(Debug, Clone)]
pub struct Approval {
    pub allocation: AllocationId,
    pub approver: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ApprovalOutcome {
    pub allocation: AllocationId,
    pub rotation: RotationId,
    pub sequence: u32,
    pub cumulative_area_hectares: f64,
    pub cumulative_percent: f64,
    pub rotation_completed: bool,
    /// True when the allocation was already approved and the recorded
    /// outcome was returned without a second event.
    pub replayed: bool,
}

impl<C: Clock> Engine<C> {
    /// Approves an allocation and advances its rotation.
    ///
    /// Re-approving an approved (or executed) allocation is an idempotent
    /// replay; approving a rejected allocation is a hard error.
    pub fn approve_allocation(&mut self, approval: Approval) -> EngineResult<ApprovalOutcome> {
        let allocation = self.store().allocation(&approval.allocation)?.clone();

        match allocation.status {
            AllocationStatus::Approved | AllocationStatus::Executed => {
                return self.replay_approval(&allocation);
            }
            AllocationStatus::Rejected => {
                return Err(EngineError::AllocationNotApprovable {
                    id: allocation.id,
                    status: allocation.status.token(),
                });
            }
            AllocationStatus::Pending | AllocationStatus::Modified => {}
        }

        let geometry = allocation
            .geometry
            .clone()
            .ok_or(EngineError::MissingGeometry)?;
        let today = self.today();
        let area = self.store().area(&allocation.parent_area)?.clone();
        let params = self.effective_params(&area);

        // Rotation resolution: the allocation's own rotation reference wins
        // if it still names an active rotation, then the area's active
        // rotation, then a fresh one.
        let (mut rotation, rotation_is_new) = self.resolve_rotation(&allocation, today)?;

        let sequence = self.store().event_count(&rotation.id) + 1;
        let cumulative_area = rotation.area_grazed_hectares + allocation.area_hectares;
        let raw_percent = (cumulative_area / area.area_hectares * 100.0).min(100.0);
        // Monotonic: never steps backward even if inputs would.
        let cumulative_percent = raw_percent.max(rotation.grazed_percent);

        let event_id = self.store_mut().new_event_id();
        let event = SectionEvent {
            id: event_id,
            parent_area: allocation.parent_area.clone(),
            rotation: rotation.id.clone(),
            allocation: allocation.id.clone(),
            date: today,
            sequence,
            centroid: vertex_centroid(&geometry),
            geometry_digest: polygon_digest(&geometry)?,
            geometry,
            area_hectares: allocation.area_hectares,
            vegetation_signal: allocation.vegetation_signal,
            adjacent_to_previous: allocation.adjacent_to_previous.unwrap_or(false),
            cumulative_area_hectares: cumulative_area,
            cumulative_percent,
        };

        rotation.sections_grazed += 1;
        rotation.area_grazed_hectares = cumulative_area;
        rotation.grazed_percent = cumulative_percent;
        if let Some(skipped) = &allocation.skipped_area {
            // Appended verbatim; the log is never deduplicated or pruned
            // here.
            rotation.ungrazed_areas.push(skipped.clone());
        }

        let completed_now = rotation.status == RotationStatus::Active
            && cumulative_percent >= params.completion_threshold_pct.as_f64();
        if completed_now {
            rotation.status = RotationStatus::Completed;
            rotation.ended_on = Some(today);
            rotation.days_in_rotation = Some(today.days_since(rotation.started_on));
            info!(
                "{}: rotation {} completed at {cumulative_percent:.1}% after {} day(s)",
                rotation.parent_area,
                rotation.id,
                rotation.days_in_rotation.unwrap_or(0)
            );
        }

        let mut approved = allocation;
        approved.status = AllocationStatus::Approved;
        approved.approved_by = Some(approval.approver);
        approved.approved_on = Some(today);
        {
            let progress = approved.progress.get_or_insert_with(ProgressContext::default);
            progress.rotation = Some(rotation.id.clone());
            progress.sequence = Some(sequence);
        }
        approved.updated_on = today;

        // Commit. Everything fallible above is done; these writes only fail
        // on structural corruption, which would mean a bug, not bad input.
        let rotation_id = rotation.id.clone();
        if rotation_is_new {
            // Inserted already carrying this approval's counters.
            self.store_mut().insert_rotation(rotation)?;
        } else {
            self.store_mut().update_rotation(rotation)?;
        }
        self.store_mut().append_event(event)?;
        self.store_mut().update_allocation(approved)?;

        Ok(ApprovalOutcome {
            allocation: approval.allocation,
            rotation: rotation_id,
            sequence,
            cumulative_area_hectares: cumulative_area,
            cumulative_percent,
            rotation_completed: completed_now,
            replayed: false,
        })
    }

    /// Resolve the rotation this approval belongs to, creating one if the
    /// area has no active rotation. A fresh rotation carries forward the
    /// ungrazed-area notes of the area's most recent rotation.
    fn resolve_rotation(
        &mut self,
        allocation: &Allocation,
        today: gz_core::clock::DayStamp,
    ) -> EngineResult<(Rotation, bool)> {
        if let Some(rid) = allocation.progress.as_ref().and_then(|p| p.rotation.as_ref()) {
            if let Ok(rotation) = self.store().rotation(rid) {
                if rotation.is_active() {
                    return Ok((rotation.clone(), false));
                }
            }
        }
        if let Some(rotation) = self.store().active_rotation(&allocation.parent_area) {
            return Ok((rotation.clone(), false));
        }

        let area = self.store().area(&allocation.parent_area)?;
        let defaults = area.rotation_defaults;
        let carried = self
            .store()
            .latest_rotation(&allocation.parent_area)
            .map(|r| r.ungrazed_areas.clone())
            .unwrap_or_default();
        let id = self.store_mut().new_rotation_id();
        Ok((
            Rotation {
                id,
                parent_area: allocation.parent_area.clone(),
                status: RotationStatus::Active,
                started_on: today,
                ended_on: None,
                days_in_rotation: None,
                starting_corner: defaults.starting_corner,
                direction: defaults.direction,
                sections_grazed: 0,
                area_grazed_hectares: 0.0,
                grazed_percent: 0.0,
                ungrazed_areas: carried,
            },
            true,
        ))
    }

    /// Reconstructs the outcome of an earlier approval from the recorded
    /// event; appends nothing and moves no counters.
    fn replay_approval(&self, allocation: &Allocation) -> EngineResult<ApprovalOutcome> {
        let rotation_id = allocation
            .progress
            .as_ref()
            .and_then(|p| p.rotation.clone())
            .ok_or_else(|| {
                EngineError::Store(StoreError::Invalid(format!(
                    "approved allocation {} has no rotation reference",
                    allocation.id
                )))
            })?;
        let rotation = self.store().rotation(&rotation_id)?;
        let event = self
            .store()
            .events_for_rotation(&rotation_id)
            .into_iter()
            .find(|e| e.allocation == allocation.id)
            .ok_or_else(|| {
                EngineError::Store(StoreError::Invalid(format!(
                    "approved allocation {} has no section event",
                    allocation.id
                )))
            })?;

        Ok(ApprovalOutcome {
            allocation: allocation.id.clone(),
            rotation: rotation_id,
            sequence: event.sequence,
            cumulative_area_hectares: event.cumulative_area_hectares,
            cumulative_percent: event.cumulative_percent,
            rotation_completed: rotation.status == RotationStatus::Completed,
            replayed: true,
        })
    }
}
