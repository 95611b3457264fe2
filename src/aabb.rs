//! Axis-aligned bounding boxes for the broad phase.
//!
//! Pure functions over a plain data structure, no methods.

use glam::Vec2;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec2,
    pub max: Vec2,
}

/// Create a new AABB from min/max corners.
pub fn create_aabb(min: Vec2, max: Vec2) -> Aabb {
    Aabb { min, max }
}

/// Create an AABB from a center point and half extents.
pub fn aabb_from_center_half_extents(center: Vec2, half_extents: Vec2) -> Aabb {
    Aabb {
        min: center - half_extents,
        max: center + half_extents,
    }
}

/// Tightest AABB containing every point in `points`.
///
/// An empty slice collapses to a zero-size box at the origin.
pub fn aabb_from_points(points: &[Vec2]) -> Aabb {
    let Some(first) = points.first() else {
        return Aabb {
            min: Vec2::ZERO,
            max: Vec2::ZERO,
        };
    };
    let mut min = *first;
    let mut max = *first;
    for p in &points[1..] {
        min = min.min(*p);
        max = max.max(*p);
    }
    Aabb { min, max }
}

/// Get the center point of an AABB.
pub fn aabb_center(aabb: &Aabb) -> Vec2 {
    (aabb.min + aabb.max) * 0.5
}

/// Get the half extents of an AABB.
pub fn aabb_half_extents(aabb: &Aabb) -> Vec2 {
    (aabb.max - aabb.min) * 0.5
}

/// Test whether two AABBs overlap (shared edges count).
pub fn aabb_overlaps(a: &Aabb, b: &Aabb) -> bool {
    a.min.x <= b.max.x && a.max.x >= b.min.x && a.min.y <= b.max.y && a.max.y >= b.min.y
}

/// Create a translated copy of an AABB.
pub fn aabb_translated(aabb: &Aabb, offset: Vec2) -> Aabb {
    Aabb {
        min: aabb.min + offset,
        max: aabb.max + offset,
    }
}

/// Inclusive range of integer grid cells covered by an AABB, expanded by
/// `margin` cells on every side.
pub fn aabb_cell_range(aabb: &Aabb, cell_size: f32, margin: i32) -> ((i32, i32), (i32, i32)) {
    let min_x = (aabb.min.x / cell_size).floor() as i32 - margin;
    let min_y = (aabb.min.y / cell_size).floor() as i32 - margin;
    let max_x = (aabb.max.x / cell_size).floor() as i32 + margin;
    let max_y = (aabb.max.y / cell_size).floor() as i32 + margin;
    ((min_x, min_y), (max_x, max_y))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_center_half_extents() {
        let aabb = aabb_from_center_half_extents(Vec2::new(1.0, 2.0), Vec2::new(0.5, 1.5));
        assert_eq!(aabb.min, Vec2::new(0.5, 0.5));
        assert_eq!(aabb.max, Vec2::new(1.5, 3.5));
        assert_eq!(aabb_center(&aabb), Vec2::new(1.0, 2.0));
        assert_eq!(aabb_half_extents(&aabb), Vec2::new(0.5, 1.5));
    }

    #[test]
    fn test_from_points_scans_all_vertices() {
        let aabb = aabb_from_points(&[
            Vec2::new(1.0, -2.0),
            Vec2::new(-3.0, 0.5),
            Vec2::new(2.0, 4.0),
        ]);
        assert_eq!(aabb.min, Vec2::new(-3.0, -2.0));
        assert_eq!(aabb.max, Vec2::new(2.0, 4.0));
    }

    #[test]
    fn test_overlap() {
        let a = create_aabb(Vec2::new(0.0, 0.0), Vec2::new(2.0, 2.0));
        let b = create_aabb(Vec2::new(1.0, 1.0), Vec2::new(3.0, 3.0));
        let c = create_aabb(Vec2::new(2.5, 0.0), Vec2::new(4.0, 1.0));
        assert!(aabb_overlaps(&a, &b));
        assert!(!aabb_overlaps(&a, &c));

        // Shared edge still overlaps.
        let d = create_aabb(Vec2::new(2.0, 0.0), Vec2::new(3.0, 1.0));
        assert!(aabb_overlaps(&a, &d));
    }

    #[test]
    fn test_translated() {
        let a = create_aabb(Vec2::ZERO, Vec2::ONE);
        let t = aabb_translated(&a, Vec2::new(-1.0, 2.0));
        assert_eq!(t.min, Vec2::new(-1.0, 2.0));
        assert_eq!(t.max, Vec2::new(0.0, 3.0));
    }

    #[test]
    fn test_cell_range_floors_negative_coordinates() {
        let aabb = create_aabb(Vec2::new(-0.5, -0.5), Vec2::new(0.5, 0.5));
        let ((x0, y0), (x1, y1)) = aabb_cell_range(&aabb, 1.0, 0);
        assert_eq!((x0, y0), (-1, -1));
        assert_eq!((x1, y1), (0, 0));

        let ((x0, y0), (x1, y1)) = aabb_cell_range(&aabb, 1.0, 1);
        assert_eq!((x0, y0), (-2, -2));
        assert_eq!((x1, y1), (1, 1));
    }
}
