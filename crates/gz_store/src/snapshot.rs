//! crates/gz_store/src/snapshot.rs
//! Versioned export/import of the whole store as one canonical JSON
//! document. Import rebuilds the store through the normal insert paths, so
//! the structural indexes are re-established and re-checked, and verifies
//! cross-references before committing anything. This is the bulk-import
//! path that pairs with the engine's overlap-validation bypass flag.

use camino::Utf8Path;
use log::info;
use serde::{Deserialize, Serialize};

use gz_core::entities::{Allocation, ParentArea, Rotation, SectionEvent};

use crate::canonical_json::{to_canonical_json_bytes, write_canonical_file};
use crate::hasher::sha256_hex;
use crate::store::{Counters, MemoryStore};
use crate::{StoreError, StoreResult};

pub const SNAPSHOT_VERSION: u32 = 1;

/// Wire form of a full store export. Tables are in id order; events are in
/// creation order, so per-rotation sequences replay 1..N.
#[derive(Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: u32,
    pub areas: Vec<ParentArea>,
    pub allocations: Vec<Allocation>,
    pub rotations: Vec<Rotation>,
    pub events: Vec<SectionEvent>,
    pub counters: Counters,
}

impl Snapshot {
    pub fn of(store: &MemoryStore) -> Self {
        let (areas, allocations, rotations, events) = store.export_tables();
        Snapshot {
            version: SNAPSHOT_VERSION,
            areas,
            allocations,
            rotations,
            events,
            counters: store.counters(),
        }
    }

    /// Rebuilds a store, re-enforcing indexes and cross-references.
    pub fn restore(self) -> StoreResult<MemoryStore> {
        if self.version != SNAPSHOT_VERSION {
            return Err(StoreError::Snapshot(format!(
                "unsupported snapshot version {}",
                self.version
            )));
        }
        self.check_references()?;
        self.check_counters()?;

        let mut store = MemoryStore::new();
        for area in self.areas {
            store.register_area(area)?;
        }
        for rotation in self.rotations {
            store.insert_rotation(rotation)?;
        }
        for allocation in self.allocations {
            store.insert_allocation(allocation)?;
        }
        for event in self.events {
            store.append_event(event)?;
        }
        store.set_counters(self.counters);
        Ok(store)
    }

    fn check_references(&self) -> StoreResult<()> {
        let has_area = |id| self.areas.iter().any(|a| &a.id == id);
        let has_rotation = |id| self.rotations.iter().any(|r| &r.id == id);
        let has_allocation = |id| self.allocations.iter().any(|a| &a.id == id);

        for allocation in &self.allocations {
            if !has_area(&allocation.parent_area) {
                return Err(StoreError::Snapshot(format!(
                    "allocation {} references unknown parent area {}",
                    allocation.id, allocation.parent_area
                )));
            }
            if let Some(rid) = allocation.progress.as_ref().and_then(|p| p.rotation.as_ref()) {
                if !has_rotation(rid) {
                    return Err(StoreError::Snapshot(format!(
                        "allocation {} references unknown rotation {rid}",
                        allocation.id
                    )));
                }
            }
        }
        for rotation in &self.rotations {
            if !has_area(&rotation.parent_area) {
                return Err(StoreError::Snapshot(format!(
                    "rotation {} references unknown parent area {}",
                    rotation.id, rotation.parent_area
                )));
            }
        }
        for event in &self.events {
            if !has_rotation(&event.rotation) {
                return Err(StoreError::Snapshot(format!(
                    "event {} references unknown rotation {}",
                    event.id, event.rotation
                )));
            }
            if !has_allocation(&event.allocation) {
                return Err(StoreError::Snapshot(format!(
                    "event {} references unknown allocation {}",
                    event.id, event.allocation
                )));
            }
        }
        Ok(())
    }

    fn check_counters(&self) -> StoreResult<()> {
        let max_alloc = self.allocations.iter().map(|a| a.id.counter()).max();
        let max_rot = self.rotations.iter().map(|r| r.id.counter()).max();
        let max_evt = self.events.iter().map(|e| e.id.counter()).max();
        let checks = [
            ("allocation", max_alloc, self.counters.allocation),
            ("rotation", max_rot, self.counters.rotation),
            ("event", max_evt, self.counters.event),
        ];
        for (table, max_seen, counter) in checks {
            if let Some(max_seen) = max_seen {
                if counter < max_seen {
                    return Err(StoreError::Snapshot(format!(
                        "{table} counter {counter} behind max issued id {max_seen}"
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Writes the store to `path` atomically; returns the snapshot digest.
pub fn save_snapshot(store: &MemoryStore, path: &Utf8Path) -> StoreResult<String> {
    let snapshot = Snapshot::of(store);
    let value = serde_json::to_value(&snapshot)?;
    let digest = sha256_hex(&to_canonical_json_bytes(&value));
    write_canonical_file(path, &value)?;
    info!("snapshot written to {path} ({digest})");
    Ok(digest)
}

/// Loads and verifies a snapshot; returns the store and the input digest.
pub fn load_snapshot(path: &Utf8Path) -> StoreResult<(MemoryStore, String)> {
    let bytes = std::fs::read(path.as_std_path())?;
    let digest = sha256_hex(&bytes);
    let snapshot: Snapshot = serde_json::from_slice(&bytes)?;
    let store = snapshot.restore()?;
    info!("snapshot loaded from {path} ({digest})");
    Ok((store, digest))
}

// === Tests ===

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use gz_core::entities::{AllocationStatus, RotationDefaults, RotationStatus};
    use gz_core::geometry::{Polygon, Ring};
    use gz_core::ids::PaddockId;
    use gz_core::variables::{Pct, ThresholdOverrides};

    fn square() -> Polygon {
        Polygon::new(
            Ring::close(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]).unwrap(),
        )
    }

    fn seeded_store() -> MemoryStore {
        let mut store = MemoryStore::new();
        let pid = PaddockId::from_token("north-40").unwrap();
        store
            .register_area(ParentArea {
                id: pid.clone(),
                name: "North 40".to_string(),
                boundary: square(),
                area_hectares: 40.0,
                rotation_defaults: RotationDefaults::default(),
                overrides: ThresholdOverrides::default(),
            })
            .unwrap();

        let date = "2025-05-01".parse().unwrap();
        let alloc = Allocation {
            id: store.new_allocation_id(),
            parent_area: pid.clone(),
            date,
            geometry: Some(square()),
            area_hectares: 2.0,
            confidence: Pct::new(70).unwrap(),
            reasoning: vec!["fresh regrowth".to_string()],
            status: AllocationStatus::Approved,
            justification: "good cover".to_string(),
            centroid: Some([0.5, 0.5]),
            vegetation_signal: Some(0.61),
            adjacent_to_previous: Some(false),
            progress: None,
            skipped_area: None,
            approved_by: Some("farmer-1".to_string()),
            approved_on: Some(date),
            feedback: None,
            created_on: date,
            updated_on: date,
        };
        let aid = alloc.id.clone();
        store.insert_allocation(alloc).unwrap();

        let rotation = Rotation {
            id: store.new_rotation_id(),
            parent_area: pid.clone(),
            status: RotationStatus::Active,
            started_on: date,
            ended_on: None,
            days_in_rotation: None,
            starting_corner: RotationDefaults::default().starting_corner,
            direction: RotationDefaults::default().direction,
            sections_grazed: 1,
            area_grazed_hectares: 2.0,
            grazed_percent: 5.0,
            ungrazed_areas: vec![],
        };
        let rid = rotation.id.clone();
        store.insert_rotation(rotation).unwrap();

        let eid = store.new_event_id();
        store
            .append_event(SectionEvent {
                id: eid,
                parent_area: pid,
                rotation: rid,
                allocation: aid,
                date,
                sequence: 1,
                geometry: square(),
                area_hectares: 2.0,
                centroid: [0.5, 0.5],
                vegetation_signal: Some(0.61),
                adjacent_to_previous: false,
                cumulative_area_hectares: 2.0,
                cumulative_percent: 5.0,
                geometry_digest: crate::hasher::polygon_digest(&square()).unwrap(),
            })
            .unwrap();
        store
    }

    #[test]
    fn round_trip_is_lossless() {
        let store = seeded_store();
        let dir = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(dir.path().join("graze.json")).unwrap();

        let saved = save_snapshot(&store, &path).unwrap();
        let (restored, loaded) = load_snapshot(&path).unwrap();
        assert_eq!(saved, loaded);

        assert_eq!(
            Snapshot::of(&store).allocations,
            Snapshot::of(&restored).allocations
        );
        assert_eq!(
            Snapshot::of(&store).rotations,
            Snapshot::of(&restored).rotations
        );
        assert_eq!(Snapshot::of(&store).events, Snapshot::of(&restored).events);
        assert_eq!(store.counters(), restored.counters());
    }

    #[test]
    fn dangling_reference_rejected() {
        let store = seeded_store();
        let mut snapshot = Snapshot::of(&store);
        snapshot.areas.clear();
        assert!(matches!(
            snapshot.restore(),
            Err(StoreError::Snapshot(_))
        ));
    }

    #[test]
    fn stale_counter_rejected() {
        let store = seeded_store();
        let mut snapshot = Snapshot::of(&store);
        snapshot.counters.event = 0;
        assert!(matches!(
            snapshot.restore(),
            Err(StoreError::Snapshot(_))
        ));
    }
}
