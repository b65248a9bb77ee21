//! crates/gz_store/src/store.rs
//! In-memory record store. Tables are `BTreeMap`s keyed by typed ids, so
//! iteration order is deterministic. The two indexes the engine's
//! invariants lean on are maintained here, not in business logic:
//!
//! - `day_index`: at most one allocation per `(parent_area, date)`;
//! - `rotation_events`: event ids per rotation in insertion order, which
//!   makes sequence numbers `1..N` checkable at append time.
//!
//! Writers are expected to compute first and commit last (all reads and
//! fallible work before the first mutation), so a hard error upstream
//! leaves the store untouched.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use gz_core::clock::DayStamp;
use gz_core::entities::{Allocation, ParentArea, Rotation, RotationStatus, SectionEvent};
use gz_core::ids::{AllocationId, EventId, PaddockId, RotationId};

use crate::{StoreError, StoreResult};

/// Monotonic per-table id counters (1-based; 0 means nothing issued yet).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Counters {
    pub allocation: u64,
    pub rotation: u64,
    pub event: u64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    areas: BTreeMap<PaddockId, ParentArea>,
    allocations: BTreeMap<AllocationId, Allocation>,
    rotations: BTreeMap<RotationId, Rotation>,
    events: BTreeMap<EventId, SectionEvent>,

    day_index: BTreeMap<PaddockId, BTreeMap<DayStamp, AllocationId>>,
    rotation_events: BTreeMap<RotationId, Vec<EventId>>,

    counters: Counters,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn counters(&self) -> Counters {
        self.counters
    }

    /* ---------------- parent areas ---------------- */

    pub fn register_area(&mut self, area: ParentArea) -> StoreResult<()> {
        if self.areas.contains_key(&area.id) {
            return Err(StoreError::DuplicateArea(area.id));
        }
        self.areas.insert(area.id.clone(), area);
        Ok(())
    }

    pub fn area(&self, id: &PaddockId) -> StoreResult<&ParentArea> {
        self.areas
            .get(id)
            .ok_or_else(|| StoreError::AreaNotFound(id.clone()))
    }

    pub fn areas(&self) -> impl Iterator<Item = &ParentArea> {
        self.areas.values()
    }

    /* ---------------- allocations ---------------- */

    /// Issues the next allocation id. Callers insert the built record in the
    /// same logical operation; ids are never reused either way.
    pub fn new_allocation_id(&mut self) -> AllocationId {
        self.counters.allocation += 1;
        AllocationId::from_counter(self.counters.allocation)
    }

    pub fn insert_allocation(&mut self, allocation: Allocation) -> StoreResult<()> {
        if self.allocations.contains_key(&allocation.id) {
            return Err(StoreError::DuplicateId(allocation.id.to_string()));
        }
        let days = self.day_index.entry(allocation.parent_area.clone()).or_default();
        if days.contains_key(&allocation.date) {
            return Err(StoreError::DuplicateDayAllocation {
                area: allocation.parent_area.clone(),
                date: allocation.date,
            });
        }
        days.insert(allocation.date, allocation.id.clone());
        self.allocations.insert(allocation.id.clone(), allocation);
        Ok(())
    }

    /// Replaces an existing allocation record. The `(parent_area, date)` key
    /// is immutable; edits that would move the record to another day slot
    /// are rejected.
    pub fn update_allocation(&mut self, allocation: Allocation) -> StoreResult<()> {
        let existing = self
            .allocations
            .get(&allocation.id)
            .ok_or_else(|| StoreError::AllocationNotFound(allocation.id.clone()))?;
        if existing.parent_area != allocation.parent_area || existing.date != allocation.date {
            return Err(StoreError::Invalid(format!(
                "allocation {} cannot change its (parent_area, date) key",
                allocation.id
            )));
        }
        self.allocations.insert(allocation.id.clone(), allocation);
        Ok(())
    }

    pub fn allocation(&self, id: &AllocationId) -> StoreResult<&Allocation> {
        self.allocations
            .get(id)
            .ok_or_else(|| StoreError::AllocationNotFound(id.clone()))
    }

    /// The one allocation for `(area, date)`, if recorded.
    pub fn allocation_for_day(&self, area: &PaddockId, date: DayStamp) -> Option<&Allocation> {
        let id = self.day_index.get(area)?.get(&date)?;
        self.allocations.get(id)
    }

    /// All allocations for one parent area, date ascending.
    pub fn allocations_for_area(&self, area: &PaddockId) -> Vec<&Allocation> {
        match self.day_index.get(area) {
            Some(days) => days
                .values()
                .filter_map(|id| self.allocations.get(id))
                .collect(),
            None => Vec::new(),
        }
    }

    /* ---------------- rotations ---------------- */

    pub fn new_rotation_id(&mut self) -> RotationId {
        self.counters.rotation += 1;
        RotationId::from_counter(self.counters.rotation)
    }

    pub fn insert_rotation(&mut self, rotation: Rotation) -> StoreResult<()> {
        if self.rotations.contains_key(&rotation.id) {
            return Err(StoreError::DuplicateId(rotation.id.to_string()));
        }
        self.rotation_events.insert(rotation.id.clone(), Vec::new());
        self.rotations.insert(rotation.id.clone(), rotation);
        Ok(())
    }

    pub fn update_rotation(&mut self, rotation: Rotation) -> StoreResult<()> {
        if !self.rotations.contains_key(&rotation.id) {
            return Err(StoreError::RotationNotFound(rotation.id));
        }
        self.rotations.insert(rotation.id.clone(), rotation);
        Ok(())
    }

    pub fn rotation(&self, id: &RotationId) -> StoreResult<&Rotation> {
        self.rotations
            .get(id)
            .ok_or_else(|| StoreError::RotationNotFound(id.clone()))
    }

    /// The active rotation for a parent area, if one exists. Ids are
    /// monotonic, so the last match is the newest.
    pub fn active_rotation(&self, area: &PaddockId) -> Option<&Rotation> {
        self.rotations
            .values()
            .filter(|r| &r.parent_area == area && r.status == RotationStatus::Active)
            .last()
    }

    /// The most recent rotation for a parent area regardless of status
    /// (source of carried-forward ungrazed notes).
    pub fn latest_rotation(&self, area: &PaddockId) -> Option<&Rotation> {
        self.rotations
            .values()
            .filter(|r| &r.parent_area == area)
            .last()
    }

    /* ---------------- section events ---------------- */

    pub fn new_event_id(&mut self) -> EventId {
        self.counters.event += 1;
        EventId::from_counter(self.counters.event)
    }

    /// Appends an immutable event. The sequence number must be exactly
    /// `count(existing events for the rotation) + 1`.
    pub fn append_event(&mut self, event: SectionEvent) -> StoreResult<()> {
        if self.events.contains_key(&event.id) {
            return Err(StoreError::DuplicateId(event.id.to_string()));
        }
        if !self.rotations.contains_key(&event.rotation) {
            return Err(StoreError::RotationNotFound(event.rotation));
        }
        let ids = self.rotation_events.entry(event.rotation.clone()).or_default();
        let expected = ids.len() as u32 + 1;
        if event.sequence != expected {
            return Err(StoreError::EventSequence {
                rotation: event.rotation.clone(),
                expected,
                got: event.sequence,
            });
        }
        ids.push(event.id.clone());
        self.events.insert(event.id.clone(), event);
        Ok(())
    }

    /// Events for one rotation in sequence order.
    pub fn events_for_rotation(&self, rotation: &RotationId) -> Vec<&SectionEvent> {
        match self.rotation_events.get(rotation) {
            Some(ids) => ids.iter().filter_map(|id| self.events.get(id)).collect(),
            None => Vec::new(),
        }
    }

    pub fn event_count(&self, rotation: &RotationId) -> u32 {
        self.rotation_events
            .get(rotation)
            .map_or(0, |ids| ids.len() as u32)
    }

    /* ---------------- snapshot support ---------------- */

    pub(crate) fn export_tables(
        &self,
    ) -> (
        Vec<ParentArea>,
        Vec<Allocation>,
        Vec<Rotation>,
        Vec<SectionEvent>,
    ) {
        (
            self.areas.values().cloned().collect(),
            self.allocations.values().cloned().collect(),
            self.rotations.values().cloned().collect(),
            self.events.values().cloned().collect(),
        )
    }

    pub(crate) fn set_counters(&mut self, counters: Counters) {
        self.counters = counters;
    }
}

// === Tests ===

#[cfg(test)]
mod tests {
    use super::*;
    use gz_core::entities::{AllocationStatus, RotationDefaults};
    use gz_core::geometry::{Polygon, Ring};
    use gz_core::variables::{Pct, ThresholdOverrides};

    fn square() -> Polygon {
        Polygon::new(
            Ring::close(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]).unwrap(),
        )
    }

    fn day(s: &str) -> DayStamp {
        s.parse().unwrap()
    }

    fn area(token: &str) -> ParentArea {
        ParentArea {
            id: PaddockId::from_token(token).unwrap(),
            name: token.to_string(),
            boundary: square(),
            area_hectares: 12.0,
            rotation_defaults: RotationDefaults::default(),
            overrides: ThresholdOverrides::default(),
        }
    }

    fn allocation(store: &mut MemoryStore, pid: &PaddockId, date: DayStamp) -> Allocation {
        Allocation {
            id: store.new_allocation_id(),
            parent_area: pid.clone(),
            date,
            geometry: Some(square()),
            area_hectares: 1.5,
            confidence: Pct::new(50).unwrap(),
            reasoning: vec![],
            status: AllocationStatus::Pending,
            justification: String::new(),
            centroid: None,
            vegetation_signal: None,
            adjacent_to_previous: None,
            progress: None,
            skipped_area: None,
            approved_by: None,
            approved_on: None,
            feedback: None,
            created_on: date,
            updated_on: date,
        }
    }

    #[test]
    fn one_allocation_per_area_day() {
        let mut store = MemoryStore::new();
        let a = area("north");
        let pid = a.id.clone();
        store.register_area(a).unwrap();

        let d = day("2025-05-01");
        let first = allocation(&mut store, &pid, d);
        let first_id = first.id.clone();
        store.insert_allocation(first).unwrap();

        let second = allocation(&mut store, &pid, d);
        assert!(matches!(
            store.insert_allocation(second),
            Err(StoreError::DuplicateDayAllocation { .. })
        ));

        assert_eq!(store.allocation_for_day(&pid, d).unwrap().id, first_id);
        // A different day is fine.
        let next = allocation(&mut store, &pid, day("2025-05-02"));
        store.insert_allocation(next).unwrap();
        assert_eq!(store.allocations_for_area(&pid).len(), 2);
    }

    #[test]
    fn update_cannot_move_day_slot() {
        let mut store = MemoryStore::new();
        let a = area("north");
        let pid = a.id.clone();
        store.register_area(a).unwrap();

        let alloc = allocation(&mut store, &pid, day("2025-05-01"));
        store.insert_allocation(alloc.clone()).unwrap();

        let mut moved = alloc;
        moved.date = day("2025-05-03");
        assert!(matches!(
            store.update_allocation(moved),
            Err(StoreError::Invalid(_))
        ));
    }

    #[test]
    fn event_sequence_enforced() {
        let mut store = MemoryStore::new();
        let a = area("north");
        let pid = a.id.clone();
        store.register_area(a).unwrap();

        let rotation = Rotation {
            id: store.new_rotation_id(),
            parent_area: pid.clone(),
            status: RotationStatus::Active,
            started_on: day("2025-05-01"),
            ended_on: None,
            days_in_rotation: None,
            starting_corner: RotationDefaults::default().starting_corner,
            direction: RotationDefaults::default().direction,
            sections_grazed: 0,
            area_grazed_hectares: 0.0,
            grazed_percent: 0.0,
            ungrazed_areas: vec![],
        };
        let rid = rotation.id.clone();
        store.insert_rotation(rotation).unwrap();

        let alloc = allocation(&mut store, &pid, day("2025-05-01"));
        let aid = alloc.id.clone();
        store.insert_allocation(alloc).unwrap();

        let event = |store: &mut MemoryStore, seq: u32| SectionEvent {
            id: store.new_event_id(),
            parent_area: pid.clone(),
            rotation: rid.clone(),
            allocation: aid.clone(),
            date: day("2025-05-01"),
            sequence: seq,
            geometry: square(),
            area_hectares: 1.5,
            centroid: [0.5, 0.5],
            vegetation_signal: None,
            adjacent_to_previous: false,
            cumulative_area_hectares: 1.5,
            cumulative_percent: 12.5,
            geometry_digest: "d".repeat(64),
        };

        let skip_ahead = event(&mut store, 2);
        assert!(matches!(
            store.append_event(skip_ahead),
            Err(StoreError::EventSequence { expected: 1, got: 2, .. })
        ));

        let e1 = event(&mut store, 1);
        store.append_event(e1).unwrap();
        let e2 = event(&mut store, 2);
        store.append_event(e2).unwrap();
        assert_eq!(store.event_count(&rid), 2);

        let repeat = event(&mut store, 2);
        assert!(store.append_event(repeat).is_err());
    }

    #[test]
    fn active_and_latest_rotation_lookups() {
        let mut store = MemoryStore::new();
        let a = area("north");
        let pid = a.id.clone();
        store.register_area(a).unwrap();

        let mut r1 = Rotation {
            id: store.new_rotation_id(),
            parent_area: pid.clone(),
            status: RotationStatus::Active,
            started_on: day("2025-01-01"),
            ended_on: None,
            days_in_rotation: None,
            starting_corner: RotationDefaults::default().starting_corner,
            direction: RotationDefaults::default().direction,
            sections_grazed: 0,
            area_grazed_hectares: 0.0,
            grazed_percent: 0.0,
            ungrazed_areas: vec![],
        };
        store.insert_rotation(r1.clone()).unwrap();
        assert!(store.active_rotation(&pid).is_some());

        r1.status = RotationStatus::Completed;
        store.update_rotation(r1.clone()).unwrap();
        assert!(store.active_rotation(&pid).is_none());
        assert_eq!(store.latest_rotation(&pid).unwrap().id, r1.id);
    }
}
