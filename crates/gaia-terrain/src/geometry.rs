//! Planar geometry helpers: rectangles, segment distances, convex polygon
//! clipping and point-in-polygon tests.

use glam::DVec2;
use serde::{Deserialize, Serialize};

/// Points closer than this are merged when cleaning clipped polygons.
const MERGE_EPSILON: f64 = 1e-9;

/// Axis-aligned rectangle.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Rectangle of the given size centred on the origin.
    pub fn centered(width: f64, height: f64) -> Self {
        let half = DVec2::new(width, height) * 0.5;
        Self::new(-half, half)
    }

    /// Grows the rectangle by `margin` on every side.
    pub fn expanded(&self, margin: f64) -> Self {
        Self::new(self.min - DVec2::splat(margin), self.max + DVec2::splat(margin))
    }

    pub fn size(&self) -> DVec2 {
        self.max - self.min
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Corners in counter-clockwise order.
    pub fn corners(&self) -> [DVec2; 4] {
        [
            self.min,
            DVec2::new(self.max.x, self.min.y),
            self.max,
            DVec2::new(self.min.x, self.max.y),
        ]
    }
}

/// Euclidean distance from `p` to the segment `a`–`b`.
///
/// A zero-length segment degrades to the distance to `a`.
pub fn point_segment_distance(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let length_sq = ab.length_squared();
    if length_sq == 0.0 {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / length_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

/// A polygon vertex tagged with the label of the edge that starts at it.
///
/// Cells use the label to remember which neighboring seed produced each edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LabeledVertex {
    pub point: DVec2,
    pub edge_label: Option<usize>,
}

/// Clips a convex polygon to the half-plane `{ x : (x - origin) · normal <= 0 }`.
///
/// Edges created along the clip line get `clip_label`; surviving parts of
/// existing edges keep their label.
pub fn clip_half_plane(
    polygon: &[LabeledVertex],
    origin: DVec2,
    normal: DVec2,
    clip_label: usize,
) -> Vec<LabeledVertex> {
    let side = |p: DVec2| (p - origin).dot(normal);
    let mut out = Vec::with_capacity(polygon.len() + 1);

    for (i, current) in polygon.iter().enumerate() {
        let next = polygon[(i + 1) % polygon.len()];
        let d_current = side(current.point);
        let d_next = side(next.point);
        let current_inside = d_current <= 0.0;
        let next_inside = d_next <= 0.0;

        match (current_inside, next_inside) {
            (true, true) => out.push(*current),
            (true, false) => {
                out.push(*current);
                out.push(LabeledVertex {
                    point: intersect(current.point, next.point, d_current, d_next),
                    edge_label: Some(clip_label),
                });
            }
            (false, true) => out.push(LabeledVertex {
                point: intersect(current.point, next.point, d_current, d_next),
                edge_label: current.edge_label,
            }),
            (false, false) => {}
        }
    }

    dedup_ring(out)
}

fn intersect(a: DVec2, b: DVec2, da: f64, db: f64) -> DVec2 {
    let t = da / (da - db);
    a + (b - a) * t
}

/// Drops vertices that start a zero-length edge. Collapsed rings become empty.
fn dedup_ring(ring: Vec<LabeledVertex>) -> Vec<LabeledVertex> {
    let n = ring.len();
    let mut cleaned: Vec<LabeledVertex> = Vec::with_capacity(n);
    for i in 0..n {
        let next = ring[(i + 1) % n].point;
        if ring[i].point.distance(next) > MERGE_EPSILON {
            cleaned.push(ring[i]);
        }
    }
    if cleaned.len() < 3 {
        cleaned.clear();
    }
    cleaned
}

/// Even-odd ray casting test.
pub fn polygon_contains(polygon: &[DVec2], p: DVec2) -> bool {
    let mut inside = false;
    let n = polygon.len();
    let mut j = n.wrapping_sub(1);
    for i in 0..n {
        let (pi, pj) = (polygon[i], polygon[j]);
        if (pi.y > p.y) != (pj.y > p.y) {
            let x_cross = (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x;
            if p.x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// Signed area (positive for counter-clockwise rings).
pub fn polygon_area(polygon: &[DVec2]) -> f64 {
    let n = polygon.len();
    let twice: f64 = (0..n)
        .map(|i| {
            let (a, b) = (polygon[i], polygon[(i + 1) % n]);
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<LabeledVertex> {
        Bounds::centered(2.0, 2.0)
            .corners()
            .into_iter()
            .map(|point| LabeledVertex {
                point,
                edge_label: None,
            })
            .collect()
    }

    #[test]
    fn test_segment_distance_projection() {
        let d = point_segment_distance(DVec2::new(0.5, 1.0), DVec2::ZERO, DVec2::X);
        assert!((d - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_segment_distance_clamps_to_endpoint() {
        let d = point_segment_distance(DVec2::new(4.0, 4.0), DVec2::ZERO, DVec2::new(1.0, 0.0));
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_length_segment_uses_point_distance() {
        let a = DVec2::new(1.0, 1.0);
        let d = point_segment_distance(DVec2::new(4.0, 5.0), a, a);
        assert!(d.is_finite());
        assert!((d - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_clip_halves_square_and_labels_cut() {
        let clipped = clip_half_plane(&square(), DVec2::ZERO, DVec2::X, 7);
        let points: Vec<DVec2> = clipped.iter().map(|v| v.point).collect();
        assert!((polygon_area(&points) - 2.0).abs() < 1e-12);
        let cut_edges = clipped.iter().filter(|v| v.edge_label == Some(7)).count();
        assert_eq!(cut_edges, 1, "exactly one edge lies on the clip line");
        assert!(points.iter().all(|p| p.x <= 1e-12));
    }

    #[test]
    fn test_clip_outside_everything_collapses() {
        let clipped = clip_half_plane(&square(), DVec2::new(-5.0, 0.0), DVec2::X, 0);
        assert!(clipped.is_empty());
    }

    #[test]
    fn test_clip_on_corner_produces_no_sliver() {
        // Line through the (1, 1) corner only touches the square.
        let clipped = clip_half_plane(&square(), DVec2::new(1.0, 1.0), DVec2::new(1.0, 1.0), 3);
        assert_eq!(clipped.len(), 4);
        assert!(clipped.iter().all(|v| v.edge_label.is_none()));
    }

    #[test]
    fn test_polygon_contains() {
        let ring: Vec<DVec2> = Bounds::centered(2.0, 2.0).corners().to_vec();
        assert!(polygon_contains(&ring, DVec2::new(0.2, -0.3)));
        assert!(!polygon_contains(&ring, DVec2::new(1.5, 0.0)));
        assert!(!polygon_contains(&[], DVec2::ZERO));
    }

    #[test]
    fn test_bounds_expand() {
        let b = Bounds::centered(10.0, 4.0).expanded(1.0);
        assert_eq!(b.size(), DVec2::new(12.0, 6.0));
        assert!(b.contains(DVec2::new(-5.5, 2.5)));
    }
}
