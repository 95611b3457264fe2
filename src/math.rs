//! 2D geometric helpers over glam's `Vec2`.
//!
//! Pure functions only; the vector type itself is glam's. Rotation by an
//! angle is `Vec2::from_angle(theta).rotate(v)` and the scalar cross
//! product is `Vec2::perp_dot`, so this module holds just the pieces glam
//! does not ship.

use glam::Vec2;

use crate::constants::{COLLINEARITY_EPSILON, SEGMENT_EPSILON};

/// Normalize `v`, mapping the zero vector to the +x unit vector.
///
/// Collision normals must always be usable directions, so degenerate
/// geometry (coincident centers, zero-length edges) falls back to (1, 0)
/// instead of producing NaN.
pub fn safe_normalize(v: Vec2) -> Vec2 {
    let len_sq = v.length_squared();
    if len_sq > 0.0 {
        v / len_sq.sqrt()
    } else {
        Vec2::X
    }
}

/// Outward normal of the directed edge `a -> b` of a counterclockwise
/// polygon: the normalized edge direction rotated by -90 degrees.
pub fn edge_normal(a: Vec2, b: Vec2) -> Vec2 {
    let d = safe_normalize(b - a);
    Vec2::new(d.y, -d.x)
}

/// Point on the infinite line through `a` and `b` closest to `p`.
///
/// A degenerate line (`a == b`) yields `a`.
pub fn closest_point_on_line(p: Vec2, a: Vec2, b: Vec2) -> Vec2 {
    let d = b - a;
    let len_sq = d.length_squared();
    if len_sq <= 0.0 {
        return a;
    }
    a + d * ((p - a).dot(d) / len_sq)
}

/// Turn direction of the triple `(p, q, r)`.
///
/// Returns 0 when the points are collinear within an absolute tolerance,
/// 1 for a counterclockwise turn, -1 for a clockwise turn.
pub fn orientation(p: Vec2, q: Vec2, r: Vec2) -> i32 {
    let cross = (q - p).perp_dot(r - q);
    if cross.abs() < COLLINEARITY_EPSILON {
        0
    } else if cross > 0.0 {
        1
    } else {
        -1
    }
}

/// Whether `p` lies on the segment `a..b`, assuming the three points are
/// already collinear (see [`orientation`]). Coordinates are compared with
/// a small tolerance.
pub fn on_segment(p: Vec2, a: Vec2, b: Vec2) -> bool {
    p.x <= a.x.max(b.x) + SEGMENT_EPSILON
        && p.x >= a.x.min(b.x) - SEGMENT_EPSILON
        && p.y <= a.y.max(b.y) + SEGMENT_EPSILON
        && p.y >= a.y.min(b.y) - SEGMENT_EPSILON
}
