//! crates/gz_geom/src/clip.rs
//! Containment of a candidate polygon within its parent boundary.
//!
//! Decision ladder: disjoint bounding boxes are a hard `OutsideBoundary`;
//! a non-empty intersection either accepts the candidate unchanged (total
//! intersection area over candidate area at or above the containment
//! threshold) or replaces it with the largest intersection fragment; an
//! empty intersection under overlapping boxes is the known geometry-library
//! edge case and falls back to clamping the coordinates into the boundary's
//! bounding box.

use geo::BooleanOps as _;

use gz_core::geometry::{Polygon, Ring};
use gz_core::variables::Pct;

use crate::measure::{area_hectares, from_geo, geo_area_hectares, largest_polygon, to_geo, BBox};
use crate::GeomError;

/// Outcome of clipping a candidate against the parent boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum ClipOutcome {
    /// Containment ratio met the threshold; the candidate stands as-is.
    Accepted,
    /// Candidate replaced by the largest intersection fragment.
    Clipped(Polygon),
    /// Empty intersection despite overlapping bounding boxes; coordinates
    /// clamped into the boundary bbox. Callers log this at warn level.
    Clamped(Polygon),
}

impl ClipOutcome {
    /// The final polygon, given the original candidate for the
    /// accepted-unchanged case.
    pub fn into_polygon(self, original: &Polygon) -> Polygon {
        match self {
            ClipOutcome::Accepted => original.clone(),
            ClipOutcome::Clipped(p) | ClipOutcome::Clamped(p) => p,
        }
    }
}

/// Clips `candidate` against `boundary`; `containment_accept` is the
/// area-ratio percentage at which the candidate is accepted unchanged.
pub fn clip_to_boundary(
    candidate: &Polygon,
    boundary: &Polygon,
    containment_accept: Pct,
) -> Result<ClipOutcome, GeomError> {
    let candidate_area = area_hectares(candidate);
    if candidate_area <= 0.0 {
        return Err(GeomError::InvalidGeometry("zero-area candidate"));
    }

    let candidate_bbox = BBox::of(candidate);
    let boundary_bbox = BBox::of(boundary);
    if !candidate_bbox.intersects(&boundary_bbox) {
        return Err(GeomError::OutsideBoundary);
    }

    let intersection = to_geo(candidate).intersection(&to_geo(boundary));
    match largest_polygon(&intersection) {
        None => {
            // Overlapping bboxes but a null intersection: numerical or
            // topology edge case. Clamp rather than fail.
            Ok(ClipOutcome::Clamped(clamp_into(candidate, &boundary_bbox)?))
        }
        Some(largest) => {
            // The ratio counts the whole intersection; a concave boundary
            // can split it into disjoint fragments that together contain
            // the candidate.
            let intersection_area: f64 = intersection.iter().map(geo_area_hectares).sum();
            let contained_pct =
                intersection_area.min(candidate_area) / candidate_area * 100.0;
            if contained_pct >= containment_accept.as_f64() {
                Ok(ClipOutcome::Accepted)
            } else {
                Ok(ClipOutcome::Clipped(from_geo(largest)?))
            }
        }
    }
}

fn clamp_into(candidate: &Polygon, bbox: &BBox) -> Result<Polygon, GeomError> {
    let clamped: Vec<_> = candidate
        .exterior()
        .positions()
        .iter()
        .map(|&p| bbox.clamp(p))
        .collect();
    let ring = Ring::close(clamped)?;
    Ok(Polygon::new(ring))
}

// === Tests ===
