//! crates/gz_geom/src/normalize.rs
//! Canonicalizes untrusted input geometry into one closed simple polygon.
//!
//! Tolerated imprecision (auto-closing an open ring, one Feature envelope,
//! dropping interior rings) is repaired silently; anything structurally
//! unrecognizable is a hard error.

use gz_core::geometry::{position_is_finite, Polygon, Position, RawGeometry, Ring};

use crate::measure::area_hectares;
use crate::GeomError;

/// Resolves raw geometry into a validated polygon.
///
/// - Bare polygon: first ring is the outer boundary, later rings (holes)
///   are dropped.
/// - Feature envelope: unwrapped exactly one level; a Feature inside a
///   Feature is `UnsupportedShape`.
/// - MultiPolygon: the largest member by area is selected.
pub fn normalize(raw: &RawGeometry) -> Result<Polygon, GeomError> {
    match raw {
        RawGeometry::Polygon { coordinates } => {
            let outer = coordinates
                .first()
                .ok_or(GeomError::InvalidGeometry("polygon has no rings"))?;
            ring_from_coords(outer)
        }
        RawGeometry::Feature { geometry } => match geometry.as_ref() {
            RawGeometry::Feature { .. } => {
                Err(GeomError::UnsupportedShape("feature nested inside feature"))
            }
            inner => normalize(inner),
        },
        RawGeometry::MultiPolygon { coordinates } => {
            let mut best: Option<(Polygon, f64)> = None;
            for member in coordinates {
                let outer = match member.first() {
                    Some(outer) => outer,
                    None => continue,
                };
                let candidate = ring_from_coords(outer)?;
                let a = area_hectares(&candidate);
                if best.as_ref().map_or(true, |(_, best_a)| a > *best_a) {
                    best = Some((candidate, a));
                }
            }
            best.map(|(p, _)| p)
                .ok_or(GeomError::InvalidGeometry("multipolygon has no members"))
        }
    }
}

fn ring_from_coords(coords: &[Position]) -> Result<Polygon, GeomError> {
    if coords.iter().any(|p| !position_is_finite(p)) {
        return Err(GeomError::InvalidGeometry("non-finite coordinate"));
    }
    // Open rings are closed by appending the first position; a closed ring
    // with fewer than 4 entries (or an open one with fewer than 3) fails.
    let ring = Ring::close(coords.to_vec())?;
    Ok(Polygon::new(ring))
}

// === Tests ===

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn square_coords() -> Vec<Position> {
        vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]
    }

    #[test]
    fn open_ring_is_closed_silently() {
        let raw = RawGeometry::Polygon {
            coordinates: vec![square_coords()],
        };
        let poly = normalize(&raw).unwrap();
        assert_eq!(poly.exterior().positions().len(), 5);
        assert_eq!(
            poly.exterior().positions().first(),
            poly.exterior().positions().last()
        );
    }

    #[test]
    fn short_ring_rejected() {
        let raw = RawGeometry::Polygon {
            coordinates: vec![vec![[0.0, 0.0], [1.0, 1.0]]],
        };
        assert!(matches!(
            normalize(&raw),
            Err(GeomError::InvalidGeometry(_))
        ));
    }

    #[test]
    fn one_feature_level_unwrapped() {
        let raw = RawGeometry::Feature {
            geometry: Box::new(RawGeometry::Polygon {
                coordinates: vec![square_coords()],
            }),
        };
        assert!(normalize(&raw).is_ok());

        let nested = RawGeometry::Feature {
            geometry: Box::new(raw),
        };
        assert!(matches!(
            normalize(&nested),
            Err(GeomError::UnsupportedShape(_))
        ));
    }

    #[test]
    fn holes_are_dropped() {
        let hole = vec![[0.25, 0.25], [0.75, 0.25], [0.75, 0.75], [0.25, 0.75]];
        let raw = RawGeometry::Polygon {
            coordinates: vec![square_coords(), hole],
        };
        let poly = normalize(&raw).unwrap();
        assert_eq!(poly.exterior().distinct_positions().len(), 4);
    }

    #[test]
    fn largest_multipolygon_member_wins() {
        let small = vec![[10.0, 10.0], [10.1, 10.0], [10.1, 10.1], [10.0, 10.1]];
        let raw = RawGeometry::MultiPolygon {
            coordinates: vec![vec![small], vec![square_coords()]],
        };
        let poly = normalize(&raw).unwrap();
        assert_eq!(poly.exterior().distinct_positions()[0], [0.0, 0.0]);
    }

    #[test]
    fn non_finite_coordinate_rejected() {
        let mut coords = square_coords();
        coords[1] = [f64::INFINITY, 0.0];
        let raw = RawGeometry::Polygon {
            coordinates: vec![coords],
        };
        assert!(matches!(
            normalize(&raw),
            Err(GeomError::InvalidGeometry(_))
        ));
    }

    proptest! {
        /// Any finite ring of 3+ distinct points normalizes to a closed ring
        /// whose distinct vertices are exactly the input.
        #[test]
        fn normalized_rings_are_closed(
            pts in proptest::collection::vec((-180.0f64..180.0, -90.0f64..90.0), 3..32)
        ) {
            let coords: Vec<Position> = pts.iter().map(|&(x, y)| [x, y]).collect();
            prop_assume!(coords.first() != coords.last());
            let raw = RawGeometry::Polygon { coordinates: vec![coords.clone()] };
            let poly = normalize(&raw).unwrap();
            let ring = poly.exterior();
            prop_assert_eq!(ring.positions().first(), ring.positions().last());
            prop_assert_eq!(ring.distinct_positions(), &coords[..]);
        }
    }
}
