//! crates/gz_core/src/geometry.rs
//! Planar geometry primitives shared by the engine.
//!
//! Coordinates are `[lon, lat]` pairs in degrees (GeoJSON axis order). A
//! `Ring` is validated on construction: at least four positions, first ==
//! last, every coordinate finite. `Polygon` keeps a single outer ring; any
//! interior rings present in raw input are dropped during normalization.

use crate::errors::CoreError;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single `[lon, lat]` coordinate pair.
pub type Position = [f64; 2];

#[inline]
pub fn position_is_finite(p: &Position) -> bool {
    p[0].is_finite() && p[1].is_finite()
}

/// A closed linear ring. Invariants (checked by [`Ring::closed`]):
/// - at least 4 positions (triangle plus the closing duplicate),
/// - first position equals last,
/// - all coordinates finite.
#[derive(Clone, Debug, PartialEq)]
pub struct Ring(Vec<Position>);

impl Ring {
    /// Validates and wraps an already-closed coordinate list.
    pub fn closed(positions: Vec<Position>) -> Result<Self, CoreError> {
        if positions.len() < 4 {
            return Err(CoreError::InvalidRing("fewer than 4 positions"));
        }
        if positions.iter().any(|p| !position_is_finite(p)) {
            return Err(CoreError::InvalidRing("non-finite coordinate"));
        }
        if positions.first() != positions.last() {
            return Err(CoreError::InvalidRing("ring not closed"));
        }
        Ok(Ring(positions))
    }

    /// Closes an open coordinate list by appending the first position, then
    /// validates. A list that is already closed passes through unchanged.
    pub fn close(mut positions: Vec<Position>) -> Result<Self, CoreError> {
        if positions.len() < 3 {
            return Err(CoreError::InvalidRing("fewer than 3 distinct positions"));
        }
        if positions.first() != positions.last() {
            let first = positions[0];
            positions.push(first);
        }
        Ring::closed(positions)
    }

    /// All positions including the closing duplicate.
    #[inline]
    pub fn positions(&self) -> &[Position] {
        &self.0
    }

    /// Positions excluding the closing duplicate.
    #[inline]
    pub fn distinct_positions(&self) -> &[Position] {
        &self.0[..self.0.len() - 1]
    }

    #[inline]
    pub fn into_positions(self) -> Vec<Position> {
        self.0
    }
}

/// A simple polygon: one validated outer ring, no holes.
#[derive(Clone, Debug, PartialEq)]
pub struct Polygon {
    exterior: Ring,
}

impl Polygon {
    #[inline]
    pub fn new(exterior: Ring) -> Self {
        Polygon { exterior }
    }

    #[inline]
    pub fn exterior(&self) -> &Ring {
        &self.exterior
    }

    #[inline]
    pub fn into_exterior(self) -> Ring {
        self.exterior
    }
}

#[cfg(feature = "serde")]
mod polygon_wire {
    //! GeoJSON-shaped wire form: `{"type":"Polygon","coordinates":[[...]]}`.

    use super::{Polygon, Position, Ring};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    #[derive(Serialize, Deserialize)]
    struct PolygonWire {
        #[serde(rename = "type")]
        kind: String,
        coordinates: Vec<Vec<Position>>,
    }

    impl Serialize for Polygon {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            PolygonWire {
                kind: "Polygon".to_owned(),
                coordinates: vec![self.exterior().positions().to_vec()],
            }
            .serialize(serializer)
        }
    }

    impl<'de> Deserialize<'de> for Polygon {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let wire = PolygonWire::deserialize(deserializer)?;
            if wire.kind != "Polygon" {
                return Err(D::Error::custom("geometry type must be \"Polygon\""));
            }
            let outer = wire
                .coordinates
                .into_iter()
                .next()
                .ok_or_else(|| D::Error::custom("polygon has no rings"))?;
            let ring = Ring::closed(outer).map_err(D::Error::custom)?;
            Ok(Polygon::new(ring))
        }
    }
}

/// Untrusted geometry as received from callers. One level of `Feature`
/// wrapping is unwrapped during normalization; anything deeper is rejected.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type"))]
pub enum RawGeometry {
    /// `{"type":"Polygon","coordinates":[[...],...]}` — first ring is the
    /// outer boundary; later rings (holes) are discarded.
    Polygon { coordinates: Vec<Vec<Position>> },
    /// `{"type":"Feature","geometry":{...}}` — unwrapped one level.
    Feature { geometry: Box<RawGeometry> },
    /// `{"type":"MultiPolygon","coordinates":[...]}` — the largest member
    /// polygon is selected during normalization.
    MultiPolygon {
        coordinates: Vec<Vec<Vec<Position>>>,
    },
}

impl RawGeometry {
    /// Wraps a validated polygon back into raw form (used by tests and by
    /// snapshot import).
    pub fn from_polygon(polygon: &Polygon) -> Self {
        RawGeometry::Polygon {
            coordinates: vec![polygon.exterior().positions().to_vec()],
        }
    }
}

// === Tests ===

#[cfg(test)]
mod tests {
    use super::*;

    fn square_open() -> Vec<Position> {
        vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]
    }

    #[test]
    fn ring_closure() {
        let open = square_open();
        let ring = Ring::close(open.clone()).unwrap();
        assert_eq!(ring.positions().len(), 5);
        assert_eq!(ring.positions().first(), ring.positions().last());
        assert_eq!(ring.distinct_positions().len(), 4);

        // already-closed input passes through
        let closed = ring.positions().to_vec();
        let again = Ring::closed(closed).unwrap();
        assert_eq!(again, ring);
    }

    #[test]
    fn ring_rejects_bad_input() {
        // too few positions before auto-close
        assert!(Ring::close(vec![[0.0, 0.0], [1.0, 0.0]]).is_err());
        // closed shape with fewer than 4 entries
        assert!(Ring::closed(vec![[0.0, 0.0], [1.0, 0.0], [0.0, 0.0]]).is_err());
        // non-finite coordinate
        let mut pts = square_open();
        pts[2] = [f64::NAN, 1.0];
        assert!(Ring::close(pts).is_err());
        // not closed
        assert!(Ring::closed(square_open()).is_err());
    }

    #[test]
    fn raw_from_polygon_round_trip() {
        let poly = Polygon::new(Ring::close(square_open()).unwrap());
        match RawGeometry::from_polygon(&poly) {
            RawGeometry::Polygon { coordinates } => {
                assert_eq!(coordinates.len(), 1);
                assert_eq!(coordinates[0].len(), 5);
            }
            _ => panic!("expected polygon variant"),
        }
    }
}
