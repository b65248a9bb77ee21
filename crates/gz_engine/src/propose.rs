//! crates/gz_engine/src/propose.rs
//! Proposal path: normalize → clip → resolve overlaps → resolve confidence
//! → daily upsert. Exactly one allocation record exists per parent area per
//! calendar day; re-proposing on the same day patches the existing record
//! (last-write-wins on provided fields, omitted fields left unchanged).

use log::{debug, warn};

use gz_core::clock::Clock;
use gz_core::entities::{Allocation, AllocationStatus, ProgressContext, SkippedArea};
use gz_core::geometry::{Polygon, Position, RawGeometry};
use gz_core::ids::{AllocationId, PaddockId};
use gz_core::variables::Pct;
use gz_geom::{clip_to_boundary, normalize, resolve_overlaps, ClipOutcome, PriorSection};

use crate::confidence::resolve_confidence;
use crate::{Engine, EngineResult};

/// Candidate allocation as received from the recommendation producer.
/// Coordinates carry no precision guarantees; everything here is
/// re-validated.
#[derive(Debug, Clone)]
pub struct ProposalRequest {
    pub parent_area: PaddockId,
    pub geometry: Option<RawGeometry>,
    /// Caller-declared hectares; untrusted and ignored — the stored area is
    /// always recomputed from the final geometry.
    pub area_hectares: Option<f64>,
    pub centroid: Option<Position>,
    pub vegetation_signal: Option<f64>,
    pub confidence: Option<f64>,
    pub justification: String,
    pub reasoning: Vec<String>,
    pub progression_quadrant: Option<String>,
    pub adjacent_to_previous: Option<bool>,
    pub reclaims_skipped: bool,
    /// Skipped/ungrazed patch reported alongside this proposal; appended to
    /// the rotation's log on approval.
    pub skipped_area: Option<SkippedAreaReport>,
    /// Migration/bulk-import escape hatch: sections already known to be
    /// pre-validated skip the overlap resolver entirely.
    pub skip_overlap_validation: bool,
}

impl ProposalRequest {
    /// A minimal request; optional fields start unset.
    pub fn new(parent_area: PaddockId, geometry: RawGeometry, justification: impl Into<String>) -> Self {
        ProposalRequest {
            parent_area,
            geometry: Some(geometry),
            area_hectares: None,
            centroid: None,
            vegetation_signal: None,
            confidence: None,
            justification: justification.into(),
            reasoning: Vec::new(),
            progression_quadrant: None,
            adjacent_to_previous: None,
            reclaims_skipped: false,
            skipped_area: None,
            skip_overlap_validation: false,
        }
    }
}

/// Skipped-area report as proposed (the engine stamps the date).
#[derive(Debug, Clone, PartialEq)]
pub struct SkippedAreaReport {
    pub centroid: Position,
    pub area_hectares: f64,
    pub reason: String,
    pub vegetation_signal: Option<f64>,
}

/// What happened to the candidate geometry on the way in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GeometryDisposition {
    /// Contained within the boundary (at or above the containment
    /// threshold); stored unchanged.
    Accepted,
    /// Replaced by the intersection with the boundary.
    Clipped,
    /// Coordinates clamped into the boundary bbox (null-intersection edge
    /// case).
    Clamped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProposalOutcome {
    pub allocation: AllocationId,
    /// False when an existing record for the same day was patched.
    pub created: bool,
    pub geometry: GeometryDisposition,
    /// True when excess overlap with prior allocations was subtracted.
    pub overlap_adjusted: bool,
    /// Hectares of the stored (final) geometry.
    pub area_hectares: f64,
    pub confidence: Pct,
}

impl<C: Clock> Engine<C> {
    /// Validates and persists today's allocation for a parent area.
    ///
    /// All geometry work and confidence resolution happen before the first
    /// write; any hard error leaves the store untouched.
    pub fn propose_allocation(&mut self, request: ProposalRequest) -> EngineResult<ProposalOutcome> {
        let today = self.today();
        let area = self.store().area(&request.parent_area)?;
        let boundary = area.boundary.clone();
        let params = self.effective_params(area);

        let raw = request.geometry.as_ref().ok_or(crate::EngineError::MissingGeometry)?;
        let candidate = normalize(raw)?;

        let (final_geometry, disposition) =
            match clip_to_boundary(&candidate, &boundary, params.containment_accept_pct)? {
                ClipOutcome::Accepted => (candidate, GeometryDisposition::Accepted),
                ClipOutcome::Clipped(p) => (p, GeometryDisposition::Clipped),
                ClipOutcome::Clamped(p) => {
                    warn!(
                        "{}: null intersection with overlapping bboxes; clamped candidate into boundary bbox",
                        request.parent_area
                    );
                    (p, GeometryDisposition::Clamped)
                }
            };

        let (final_geometry, overlap_adjusted) = if request.skip_overlap_validation {
            (final_geometry, false)
        } else {
            let priors = self.prior_sections(&request.parent_area, today);
            let resolution =
                resolve_overlaps(&final_geometry, &priors, params.overlap_tolerance_pct)?;
            for (date, pct) in &resolution.tolerated {
                debug!(
                    "{}: allowing {pct:.1}% overlap with {date} (within {} tolerance)",
                    request.parent_area,
                    params.overlap_tolerance_pct
                );
            }
            (resolution.geometry, resolution.adjusted)
        };

        let resolved = resolve_confidence(
            request.confidence,
            &request.justification,
            params.confidence_default,
        );
        let area_hectares = gz_geom::area_hectares(&final_geometry);

        let outcome = self.upsert_for_day(today, request, final_geometry, resolved, area_hectares)?;
        Ok(ProposalOutcome {
            geometry: disposition,
            overlap_adjusted,
            ..outcome
        })
    }

    /// Prior allocations that participate in overlap resolution: same
    /// parent area, other days, not rejected, geometry present. Date
    /// ascending.
    fn prior_sections(&self, area: &PaddockId, today: gz_core::clock::DayStamp) -> Vec<PriorSection> {
        self.store()
            .allocations_for_area(area)
            .into_iter()
            .filter(|a| a.date != today && a.status != AllocationStatus::Rejected)
            .filter_map(|a| {
                a.geometry.as_ref().map(|g| PriorSection {
                    date: a.date,
                    geometry: g.clone(),
                })
            })
            .collect()
    }

    fn upsert_for_day(
        &mut self,
        today: gz_core::clock::DayStamp,
        request: ProposalRequest,
        geometry: Polygon,
        resolved: crate::confidence::ResolvedConfidence,
        area_hectares: f64,
    ) -> EngineResult<ProposalOutcome> {
        let confidence = resolved.confidence;
        let skipped = request.skipped_area.map(|r| SkippedArea {
            centroid: r.centroid,
            area_hectares: r.area_hectares,
            reason: r.reason,
            vegetation_signal: r.vegetation_signal,
            noted_on: today,
        });
        let progress_hint = if request.progression_quadrant.is_some() || request.reclaims_skipped {
            Some(ProgressContext {
                rotation: None,
                sequence: None,
                quadrant: request.progression_quadrant.clone(),
                reclaims_skipped: request.reclaims_skipped,
            })
        } else {
            None
        };

        if let Some(existing) = self.store().allocation_for_day(&request.parent_area, today) {
            // Patch mutable fields only; omitted optional fields keep their
            // recorded values.
            let mut patched = existing.clone();
            patched.geometry = Some(geometry);
            patched.area_hectares = area_hectares;
            patched.confidence = confidence;
            patched.reasoning = request.reasoning;
            if !resolved.justification.is_empty() {
                patched.justification = resolved.justification;
            }
            if request.centroid.is_some() {
                patched.centroid = request.centroid;
            }
            if request.vegetation_signal.is_some() {
                patched.vegetation_signal = request.vegetation_signal;
            }
            if request.adjacent_to_previous.is_some() {
                patched.adjacent_to_previous = request.adjacent_to_previous;
            }
            if let Some(hint) = progress_hint {
                let slot = patched.progress.get_or_insert_with(ProgressContext::default);
                slot.quadrant = hint.quadrant;
                slot.reclaims_skipped = hint.reclaims_skipped;
            }
            if skipped.is_some() {
                patched.skipped_area = skipped;
            }
            patched.updated_on = today;

            let id = patched.id.clone();
            self.store_mut().update_allocation(patched)?;
            Ok(ProposalOutcome {
                allocation: id,
                created: false,
                geometry: GeometryDisposition::Accepted, // overwritten by caller
                overlap_adjusted: false,                 // overwritten by caller
                area_hectares,
                confidence,
            })
        } else {
            let id = self.store_mut().new_allocation_id();
            let allocation = Allocation {
                id: id.clone(),
                parent_area: request.parent_area,
                date: today,
                geometry: Some(geometry),
                area_hectares,
                confidence,
                reasoning: request.reasoning,
                status: AllocationStatus::Pending,
                justification: resolved.justification,
                centroid: request.centroid,
                vegetation_signal: request.vegetation_signal,
                adjacent_to_previous: request.adjacent_to_previous,
                progress: progress_hint,
                skipped_area: skipped,
                approved_by: None,
                approved_on: None,
                feedback: None,
                created_on: today,
                updated_on: today,
            };
            self.store_mut().insert_allocation(allocation)?;
            Ok(ProposalOutcome {
                allocation: id,
                created: true,
                geometry: GeometryDisposition::Accepted,
                overlap_adjusted: false,
                area_hectares,
                confidence,
            })
        }
    }
}
