//! crates/gz_geom/src/measure.rs
//! Measurement helpers: hectares, bounding boxes, vertex centroids, and
//! conversions between core rings and `geo` types.

use geo::{Area as _, LineString, MultiPolygon};

use gz_core::geometry::{position_is_finite, Polygon, Position, Ring};

use crate::GeomError;

/// Planar degree scale used across the system (both axes).
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Square degrees → hectares at the scale above.
const SQ_DEG_TO_HECTARES: f64 = METERS_PER_DEGREE * METERS_PER_DEGREE / 10_000.0;

/// Shoelace area of the ring in hectares.
pub fn area_hectares(polygon: &Polygon) -> f64 {
    let pts = polygon.exterior().positions();
    let n = pts.len() - 1; // closing duplicate excluded
    let mut twice_area = 0.0;
    for i in 0..n {
        let [x1, y1] = pts[i];
        let [x2, y2] = pts[i + 1];
        twice_area += x1 * y2 - x2 * y1;
    }
    (twice_area.abs() / 2.0) * SQ_DEG_TO_HECTARES
}

/// Hectares of a `geo` polygon (exterior minus holes, as `geo` computes it).
pub fn geo_area_hectares(polygon: &geo::Polygon<f64>) -> f64 {
    polygon.unsigned_area() * SQ_DEG_TO_HECTARES
}

/// Axis-aligned bounding box over ring coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn of(polygon: &Polygon) -> Self {
        let mut bbox = BBox {
            min_x: f64::INFINITY,
            min_y: f64::INFINITY,
            max_x: f64::NEG_INFINITY,
            max_y: f64::NEG_INFINITY,
        };
        for &[x, y] in polygon.exterior().positions() {
            bbox.min_x = bbox.min_x.min(x);
            bbox.min_y = bbox.min_y.min(y);
            bbox.max_x = bbox.max_x.max(x);
            bbox.max_y = bbox.max_y.max(y);
        }
        bbox
    }

    /// True when the boxes share any area (touching edges count).
    pub fn intersects(&self, other: &BBox) -> bool {
        self.min_x <= other.max_x
            && other.min_x <= self.max_x
            && self.min_y <= other.max_y
            && other.min_y <= self.max_y
    }

    /// Clamps a position into this box.
    pub fn clamp(&self, p: Position) -> Position {
        [
            p[0].clamp(self.min_x, self.max_x),
            p[1].clamp(self.min_y, self.max_y),
        ]
    }
}

/// Arithmetic mean of the ring's distinct vertices (closing duplicate
/// excluded), falling back to the first vertex if the mean is non-finite.
pub fn vertex_centroid(polygon: &Polygon) -> Position {
    let pts = polygon.exterior().distinct_positions();
    let n = pts.len() as f64;
    let mean = [
        pts.iter().map(|p| p[0]).sum::<f64>() / n,
        pts.iter().map(|p| p[1]).sum::<f64>() / n,
    ];
    if position_is_finite(&mean) {
        mean
    } else {
        pts[0]
    }
}

/// The largest member of a multipolygon by area, if any member is non-empty.
pub fn largest_polygon(mp: &MultiPolygon<f64>) -> Option<&geo::Polygon<f64>> {
    let mut best: Option<(&geo::Polygon<f64>, f64)> = None;
    for candidate in mp.iter() {
        let a = candidate.unsigned_area();
        if a > 0.0 && best.map_or(true, |(_, best_a)| a > best_a) {
            best = Some((candidate, a));
        }
    }
    best.map(|(p, _)| p)
}

/// Core polygon → `geo` polygon (no holes by construction).
pub fn to_geo(polygon: &Polygon) -> geo::Polygon<f64> {
    let coords: Vec<(f64, f64)> = polygon
        .exterior()
        .positions()
        .iter()
        .map(|&[x, y]| (x, y))
        .collect();
    geo::Polygon::new(LineString::from(coords), vec![])
}

/// `geo` polygon → core polygon. Interior rings produced by boolean ops are
/// dropped; the single-ring model keeps only the exterior.
pub fn from_geo(polygon: &geo::Polygon<f64>) -> Result<Polygon, GeomError> {
    let positions: Vec<Position> = polygon.exterior().0.iter().map(|c| [c.x, c.y]).collect();
    let ring = Ring::close(positions)?;
    Ok(Polygon::new(ring))
}

// === Tests ===

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_square() -> Polygon {
        Polygon::new(
            Ring::close(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]]).unwrap(),
        )
    }

    #[test]
    fn square_degree_in_hectares() {
        // 111,320 m per degree on both axes → 1 deg² = 111320² m² = 1,239,374.2 ha
        let ha = area_hectares(&unit_square());
        assert!((ha - 1_239_374.24).abs() < 1.0, "got {ha}");
    }

    #[test]
    fn geo_round_trip_area_matches() {
        let poly = unit_square();
        let geo_poly = to_geo(&poly);
        assert!((geo_area_hectares(&geo_poly) - area_hectares(&poly)).abs() < 1e-6);
        let back = from_geo(&geo_poly).unwrap();
        assert!((area_hectares(&back) - area_hectares(&poly)).abs() < 1e-9);
    }

    #[test]
    fn bbox_intersection_and_clamp() {
        let a = BBox::of(&unit_square());
        let shifted = Polygon::new(
            Ring::close(vec![[0.5, 0.5], [1.5, 0.5], [1.5, 1.5], [0.5, 1.5]]).unwrap(),
        );
        let b = BBox::of(&shifted);
        assert!(a.intersects(&b));
        assert_eq!(a.clamp([2.0, -1.0]), [1.0, 0.0]);

        let far = Polygon::new(
            Ring::close(vec![[5.0, 5.0], [6.0, 5.0], [6.0, 6.0], [5.0, 6.0]]).unwrap(),
        );
        assert!(!a.intersects(&BBox::of(&far)));
    }

    #[test]
    fn centroid_is_vertex_mean() {
        let c = vertex_centroid(&unit_square());
        assert_eq!(c, [0.5, 0.5]);
    }
}
