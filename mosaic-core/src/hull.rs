//! Graham-scan convex hull.

use std::cmp::Ordering;

use crate::Position;

/// `(b - a) x (c - a)`; positive when `a -> b -> c` turns left (y up).
#[inline]
fn cross(a: &Position, b: &Position, c: &Position) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

/// Convex hull of a point set.
///
/// Pivot is the lowest-y point (lowest x among ties); the rest are ordered by
/// polar angle around it, compared exactly with cross products and, for
/// collinear points, by distance. Points making a non-left turn are popped,
/// so collinear points never appear as vertices. Duplicates are ignored.
///
/// Inputs with fewer than 3 distinct points come back unchanged (deduplicated).
/// A fully collinear input yields its two extreme points.
pub fn convex_hull(points: &[Position]) -> Vec<Position> {
    let mut pts: Vec<Position> = points.to_vec();
    pts.sort_by(|a, b| {
        a.y.partial_cmp(&b.y)
            .unwrap_or(Ordering::Equal)
            .then(a.x.partial_cmp(&b.x).unwrap_or(Ordering::Equal))
    });
    pts.dedup();
    if pts.len() < 3 {
        return pts;
    }

    // Sorted by (y, x), so the pivot is first
    let start = pts[0];
    let mut rest = pts.split_off(1);
    rest.sort_by(|a, b| {
        let turn = cross(&start, a, b);
        if turn > 0.0 {
            Ordering::Less
        } else if turn < 0.0 {
            Ordering::Greater
        } else {
            start
                .dist_sq(a)
                .partial_cmp(&start.dist_sq(b))
                .unwrap_or(Ordering::Equal)
        }
    });

    // Walk the farthest-angle ray from far to near so its inner points are
    // popped when the hull closes back to the pivot.
    let last = rest[rest.len() - 1];
    let tail = rest
        .iter()
        .rev()
        .take_while(|p| cross(&start, &last, p) == 0.0)
        .count();
    if tail < rest.len() {
        let n = rest.len();
        rest[n - tail..].reverse();
    }

    let mut hull = vec![start, rest[0]];
    for p in &rest[1..] {
        while hull.len() >= 2 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], p) <= 0.0 {
            hull.pop();
        }
        hull.push(*p);
    }
    while hull.len() >= 3 && cross(&hull[hull.len() - 2], &hull[hull.len() - 1], &start) <= 0.0 {
        hull.pop();
    }

    hull
}
