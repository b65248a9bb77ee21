//! crates/gz_geom/src/overlap.rs
//! Reconciliation of a candidate polygon against previously recorded
//! allocations for the same parent area.
//!
//! Small overlaps (at or under the tolerance) pass unchanged; larger ones
//! are removed by geometric subtraction, keeping the largest remaining
//! fragment and continuing against the rest of the history with the
//! reduced shape.

use geo::BooleanOps as _;

use gz_core::clock::DayStamp;
use gz_core::geometry::Polygon;
use gz_core::variables::Pct;

use crate::measure::{from_geo, geo_area_hectares, largest_polygon, to_geo};
use crate::GeomError;

/// A prior allocation's geometry, ordered by date ascending by the caller.
#[derive(Debug, Clone)]
pub struct PriorSection {
    pub date: DayStamp,
    pub geometry: Polygon,
}

/// Result of overlap resolution.
#[derive(Debug, Clone)]
pub struct OverlapResolution {
    /// Possibly-reduced polygon to store.
    pub geometry: Polygon,
    /// True when at least one subtraction happened.
    pub adjusted: bool,
    /// Overlaps that were within tolerance and allowed unchanged, for
    /// caller-side debug logging: `(prior date, overlap percent)`.
    pub tolerated: Vec<(DayStamp, f64)>,
}

/// Resolves `current` against `priors`. `tolerance` is the pairwise overlap
/// percentage allowed without subtraction.
pub fn resolve_overlaps(
    current: &Polygon,
    priors: &[PriorSection],
    tolerance: Pct,
) -> Result<OverlapResolution, GeomError> {
    let mut shape = to_geo(current);
    let mut adjusted = false;
    let mut tolerated = Vec::new();

    for prior in priors {
        let prior_shape = to_geo(&prior.geometry);
        let overlap = shape.intersection(&prior_shape);
        let overlap_area: f64 = overlap.iter().map(geo_area_hectares).sum();
        if overlap_area <= 0.0 {
            continue;
        }

        let current_area = geo_area_hectares(&shape);
        let overlap_pct = overlap_area / current_area * 100.0;
        if overlap_pct <= tolerance.as_f64() {
            tolerated.push((prior.date, overlap_pct));
            continue;
        }

        let difference = shape.difference(&prior_shape);
        let remainder = largest_polygon(&difference).ok_or(GeomError::IrreconcilableOverlap {
            prior_date: prior.date,
            overlap_pct,
        })?;
        let remainder_area = geo_area_hectares(remainder);
        if !remainder_area.is_finite() || remainder_area <= 0.0 {
            return Err(GeomError::IrreconcilableOverlap {
                prior_date: prior.date,
                overlap_pct,
            });
        }

        shape = remainder.clone();
        adjusted = true;
    }

    let geometry = if adjusted {
        from_geo(&shape)?
    } else {
        current.clone()
    };
    Ok(OverlapResolution {
        geometry,
        adjusted,
        tolerated,
    })
}

// === Tests ===

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::area_hectares;
    use gz_core::geometry::Ring;

    fn poly(coords: Vec<[f64; 2]>) -> Polygon {
        Polygon::new(Ring::close(coords).unwrap())
    }

    fn day(s: &str) -> DayStamp {
        s.parse().unwrap()
    }

    fn tolerance() -> Pct {
        Pct::new(5).unwrap()
    }

    #[test]
    fn no_priors_no_change() {
        let current = poly(vec![[0.0, 0.0], [4.0, 0.0], [4.0, 4.0], [0.0, 4.0]]);
        let res = resolve_overlaps(&current, &[], tolerance()).unwrap();
        assert!(!res.adjusted);
        assert_eq!(res.geometry, current);
    }

    #[test]
    fn small_overlap_tolerated() {
        // 10x10 current; prior covers a 10x0.4 strip = 4% overlap.
        let current = poly(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]);
        let prior = poly(vec![[0.0, 9.6], [10.0, 9.6], [10.0, 12.0], [0.0, 12.0]]);
        let priors = [PriorSection {
            date: day("2025-04-01"),
            geometry: prior,
        }];
        let res = resolve_overlaps(&current, &priors, tolerance()).unwrap();
        assert!(!res.adjusted);
        assert_eq!(res.geometry, current);
        assert_eq!(res.tolerated.len(), 1);
        assert!((res.tolerated[0].1 - 4.0).abs() < 1e-9);
    }

    #[test]
    fn excess_overlap_subtracted_keeping_largest_fragment() {
        // Prior covers the left 20% of the current square.
        let current = poly(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]);
        let prior = poly(vec![[-2.0, 0.0], [2.0, 0.0], [2.0, 10.0], [-2.0, 10.0]]);
        let priors = [PriorSection {
            date: day("2025-04-02"),
            geometry: prior,
        }];
        let res = resolve_overlaps(&current, &priors, tolerance()).unwrap();
        assert!(res.adjusted);
        let kept = area_hectares(&res.geometry) / area_hectares(&current);
        assert!((kept - 0.8).abs() < 1e-6, "kept {kept}");
    }

    #[test]
    fn fully_covered_is_irreconcilable() {
        let current = poly(vec![[1.0, 1.0], [3.0, 1.0], [3.0, 3.0], [1.0, 3.0]]);
        let prior = poly(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]);
        let priors = [PriorSection {
            date: day("2025-04-03"),
            geometry: prior,
        }];
        match resolve_overlaps(&current, &priors, tolerance()) {
            Err(GeomError::IrreconcilableOverlap { prior_date, .. }) => {
                assert_eq!(prior_date, day("2025-04-03"));
            }
            other => panic!("expected irreconcilable overlap, got {other:?}"),
        }
    }

    #[test]
    fn reduced_shape_carries_into_later_priors() {
        // First prior removes the left half; the remainder then overlaps the
        // second prior by more than tolerance and is reduced again.
        let current = poly(vec![[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0]]);
        let left = poly(vec![[0.0, 0.0], [5.0, 0.0], [5.0, 10.0], [0.0, 10.0]]);
        let top_right = poly(vec![[5.0, 8.0], [10.0, 8.0], [10.0, 10.0], [5.0, 10.0]]);
        let priors = [
            PriorSection {
                date: day("2025-04-01"),
                geometry: left,
            },
            PriorSection {
                date: day("2025-04-02"),
                geometry: top_right,
            },
        ];
        let res = resolve_overlaps(&current, &priors, tolerance()).unwrap();
        assert!(res.adjusted);
        // 100 - 50 (left) - 10 (top right strip of the remainder) = 40.
        let kept = area_hectares(&res.geometry) / area_hectares(&current);
        assert!((kept - 0.4).abs() < 1e-6, "kept {kept}");
    }
}
