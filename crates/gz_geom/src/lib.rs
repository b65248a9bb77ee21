//! gz_geom — planar geometry for the graze engine.
//!
//! Pure functions only: no I/O, no logging, no RNG. The pipeline is
//! normalize → clip → resolve overlaps; each stage returns a structured
//! error or a possibly-adjusted polygon. All computation is planar lon/lat
//! (consistent with the rest of the system); hectares come from the
//! shoelace area scaled at 111,320 m per degree on both axes.

#![forbid(unsafe_code)]

use core::fmt;

use gz_core::clock::DayStamp;

pub mod clip;
pub mod measure;
pub mod normalize;
pub mod overlap;

pub use clip::{clip_to_boundary, ClipOutcome};
pub use measure::{area_hectares, largest_polygon, vertex_centroid, BBox};
pub use normalize::normalize;
pub use overlap::{resolve_overlaps, OverlapResolution, PriorSection};

/// Geometry-stage errors. All are hard failures; tolerated imprecision
/// (ring auto-closing, small overlap, bbox clamping) never surfaces here.
#[derive(Debug, Clone, PartialEq)]
pub enum GeomError {
    /// Ring too short, non-finite coordinate, or zero-area shape.
    InvalidGeometry(&'static str),
    /// Input structure not recognized as a polygon (or a single Feature
    /// envelope around one).
    UnsupportedShape(&'static str),
    /// Candidate shares no area at all with the parent boundary.
    OutsideBoundary,
    /// After subtracting excess overlap no valid remaining area exists:
    /// the proposed area is essentially already grazed.
    IrreconcilableOverlap {
        prior_date: DayStamp,
        overlap_pct: f64,
    },
}

impl fmt::Display for GeomError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeomError::InvalidGeometry(k) => write!(f, "invalid geometry: {k}"),
            GeomError::UnsupportedShape(k) => write!(f, "unsupported geometry shape: {k}"),
            GeomError::OutsideBoundary => write!(f, "geometry lies outside the parent boundary"),
            GeomError::IrreconcilableOverlap {
                prior_date,
                overlap_pct,
            } => write!(
                f,
                "overlaps allocation from {prior_date} by {overlap_pct:.0}% and could not be adjusted"
            ),
        }
    }
}

impl std::error::Error for GeomError {}

impl From<gz_core::CoreError> for GeomError {
    fn from(e: gz_core::CoreError) -> Self {
        match e {
            gz_core::CoreError::InvalidRing(k) => GeomError::InvalidGeometry(k),
            _ => GeomError::InvalidGeometry("core validation failed"),
        }
    }
}
