//! Delaunay triangulation of planar point sets.
//!
//! Bowyer-Watson incremental insertion against a super-triangle. Degenerate
//! inputs (fewer than three points, or all points collinear) produce no
//! triangles; callers fall back to plain threshold adjacency.

use rustc_hash::{FxHashMap, FxHashSet};

#[inline]
fn ordered(a: usize, b: usize) -> (usize, usize) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

fn bounds(points: &[(f64, f64)]) -> (f64, f64, f64, f64) {
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;
    for &(x, y) in points {
        min_x = min_x.min(x);
        max_x = max_x.max(x);
        min_y = min_y.min(y);
        max_y = max_y.max(y);
    }
    (min_x, max_x, min_y, max_y)
}

/// Strict circumcircle containment, normalized for triangle orientation.
/// Co-circular points count as outside, which keeps grid inputs stable.
fn in_circumcircle(a: (f64, f64), b: (f64, f64), c: (f64, f64), p: (f64, f64)) -> bool {
    let ax = a.0 - p.0;
    let ay = a.1 - p.1;
    let bx = b.0 - p.0;
    let by = b.1 - p.1;
    let cx = c.0 - p.0;
    let cy = c.1 - p.1;

    let det = (ax * ax + ay * ay) * (bx * cy - cx * by)
        - (bx * bx + by * by) * (ax * cy - cx * ay)
        + (cx * cx + cy * cy) * (ax * by - bx * ay);

    let orientation = (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0);
    if orientation > 0.0 {
        det > 0.0
    } else if orientation < 0.0 {
        det < 0.0
    } else {
        false
    }
}

/// Unique Delaunay edges as ordered index pairs, sorted.
pub(crate) fn delaunay_edges(points: &[(f64, f64)]) -> Vec<(usize, usize)> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }

    // Input points plus a super-triangle generously enclosing them.
    let (min_x, max_x, min_y, max_y) = bounds(points);
    let span = (max_x - min_x).max(max_y - min_y).max(1.0);
    let cx = (min_x + max_x) / 2.0;
    let cy = (min_y + max_y) / 2.0;

    let mut verts: Vec<(f64, f64)> = points.to_vec();
    verts.push((cx - 20.0 * span, cy - 10.0 * span));
    verts.push((cx + 20.0 * span, cy - 10.0 * span));
    verts.push((cx, cy + 20.0 * span));

    let mut triangles: Vec<[usize; 3]> = vec![[n, n + 1, n + 2]];

    for p in 0..n {
        let point = verts[p];
        let (bad, good): (Vec<[usize; 3]>, Vec<[usize; 3]>) = triangles
            .drain(..)
            .partition(|t| in_circumcircle(verts[t[0]], verts[t[1]], verts[t[2]], point));
        triangles = good;

        // Cavity boundary: edges belonging to exactly one bad triangle.
        let mut edge_counts: FxHashMap<(usize, usize), usize> = FxHashMap::default();
        for t in &bad {
            for edge in [
                ordered(t[0], t[1]),
                ordered(t[1], t[2]),
                ordered(t[2], t[0]),
            ] {
                *edge_counts.entry(edge).or_insert(0) += 1;
            }
        }
        for ((a, b), count) in edge_counts {
            if count == 1 {
                triangles.push([a, b, p]);
            }
        }
    }

    // Drop triangles still touching the super-triangle, dedupe edges.
    let mut edges: FxHashSet<(usize, usize)> = FxHashSet::default();
    for t in &triangles {
        if t[0] >= n || t[1] >= n || t[2] >= n {
            continue;
        }
        edges.insert(ordered(t[0], t[1]));
        edges.insert(ordered(t[1], t[2]));
        edges.insert(ordered(t[2], t[0]));
    }
    let mut out: Vec<(usize, usize)> = edges.into_iter().collect();
    out.sort_unstable();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn triangle_yields_its_three_edges() {
        let edges = delaunay_edges(&[(0.0, 0.0), (2.0, 0.0), (1.0, 2.0)]);
        assert_eq!(edges, vec![(0, 1), (0, 2), (1, 2)]);
    }

    #[test]
    fn square_yields_sides_plus_one_diagonal() {
        let edges = delaunay_edges(&[(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]);
        assert_eq!(edges.len(), 5);
        for side in [(0, 1), (1, 2), (2, 3), (0, 3)] {
            assert!(edges.contains(&side), "missing side {side:?}");
        }
    }

    #[test]
    fn grid_triangulation_has_expected_edge_count() {
        let mut points = Vec::new();
        for y in 0..3 {
            for x in 0..3 {
                points.push((x as f64, y as f64));
            }
        }
        let edges = delaunay_edges(&points);
        // 12 unit edges + one diagonal per cell.
        assert_eq!(edges.len(), 16);
        for y in 0..3usize {
            for x in 0..2usize {
                let a = y * 3 + x;
                assert!(edges.contains(&(a, a + 1)), "missing horizontal at {a}");
            }
        }
        for y in 0..2usize {
            for x in 0..3usize {
                let a = y * 3 + x;
                assert!(edges.contains(&(a, a + 3)), "missing vertical at {a}");
            }
        }
    }

    #[test]
    fn collinear_points_yield_no_edges() {
        let edges = delaunay_edges(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0)]);
        assert!(edges.is_empty());
    }

    #[test]
    fn fewer_than_three_points_yield_no_edges() {
        assert!(delaunay_edges(&[]).is_empty());
        assert!(delaunay_edges(&[(0.0, 0.0), (1.0, 1.0)]).is_empty());
    }

    #[test]
    fn edge_indices_stay_in_range() {
        let points: Vec<(f64, f64)> = (0..20)
            .map(|i| {
                let a = i as f64 * 0.7;
                (a.cos() * (1.0 + i as f64 * 0.3), a.sin() * (1.0 + i as f64 * 0.2))
            })
            .collect();
        for (a, b) in delaunay_edges(&points) {
            assert!(a < b);
            assert!(b < points.len());
        }
    }
}
