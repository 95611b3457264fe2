//! Collision shapes and the separating-axis queries over them.
//!
//! A closed variant of world-space geometry. Every pairing the narrow
//! phase can see is matched exhaustively here; there is no open dispatch
//! and no fallthrough case.

use glam::Vec2;

use crate::aabb::{aabb_from_center_half_extents, aabb_from_points, Aabb};
use crate::constants::NO_CONTACT_DEPTH;
use crate::math::{edge_normal, safe_normalize};

/// Circle in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleShape {
    pub center: Vec2,
    pub radius: f32,
}

/// Convex polygon in world space, counterclockwise winding.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonShape {
    vertices: Vec<Vec2>,
    aabb: Aabb,
}

impl PolygonShape {
    /// Build a polygon, scanning the vertices once to cache the AABB.
    pub fn new(vertices: Vec<Vec2>) -> Self {
        let aabb = aabb_from_points(&vertices);
        Self { vertices, aabb }
    }

    pub fn vertices(&self) -> &[Vec2] {
        &self.vertices
    }
}

/// World-space collision shape.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Circle(CircleShape),
    Polygon(PolygonShape),
}

/// Axis along which a reference shape penetrates another shape the least.
#[derive(Debug, Clone, Copy)]
pub struct PenetrationAxis {
    /// Unit direction out of the reference shape toward the other one.
    pub normal: Vec2,
    /// Signed separation along the normal; negative when overlapping.
    pub penetration: f32,
    /// The other shape's deepest point against this axis.
    pub vertex: Vec2,
}

/// Axis that always loses reference selection and never reports contact.
fn no_contact_axis(normal: Vec2, vertex: Vec2) -> PenetrationAxis {
    PenetrationAxis {
        normal,
        penetration: NO_CONTACT_DEPTH,
        vertex,
    }
}

impl Shape {
    /// Bounding box; cached for polygons, derived for circles.
    pub fn aabb(&self) -> Aabb {
        match self {
            Shape::Circle(c) => {
                aabb_from_center_half_extents(c.center, Vec2::splat(c.radius))
            }
            Shape::Polygon(p) => p.aabb,
        }
    }

    /// Support function: the farthest point along `direction`.
    ///
    /// `direction` is assumed normalized for circles. Polygon ties resolve
    /// to the first vertex encountered.
    pub fn extreme_point(&self, direction: Vec2) -> Vec2 {
        match self {
            Shape::Circle(c) => c.center + direction * c.radius,
            Shape::Polygon(p) => {
                let mut best = match p.vertices.first() {
                    Some(v) => *v,
                    None => return Vec2::ZERO,
                };
                let mut best_projection = best.dot(direction);
                for v in &p.vertices[1..] {
                    let projection = v.dot(direction);
                    if projection > best_projection {
                        best = *v;
                        best_projection = projection;
                    }
                }
                best
            }
        }
    }

    /// The axis along which `self` penetrates `other` the least, with
    /// `self` as the reference shape.
    pub fn least_penetration_axis(&self, other: &Shape) -> PenetrationAxis {
        match (self, other) {
            (Shape::Circle(a), Shape::Circle(b)) => circle_circle_axis(a, b),
            (Shape::Polygon(a), _) => polygon_reference_axis(a, other),
            (Shape::Circle(a), Shape::Polygon(b)) => circle_polygon_axis(a, b),
        }
    }

    /// Area and second moment of area about the origin.
    ///
    /// Feeds default inertia: for a shape of mass `m`, the default moment
    /// of inertia is `m * moment / area`.
    pub fn area_moment(&self) -> (f32, f32) {
        match self {
            Shape::Circle(c) => {
                let area = std::f32::consts::PI * c.radius * c.radius;
                let moment = area * (0.5 * c.radius * c.radius + c.center.length_squared());
                (area, moment)
            }
            Shape::Polygon(p) => {
                let vs = &p.vertices;
                let mut area = 0.0;
                let mut moment = 0.0;
                for i in 0..vs.len() {
                    let a = vs[i];
                    let b = vs[(i + 1) % vs.len()];
                    let cross = a.perp_dot(b);
                    area += cross * 0.5;
                    moment += cross * (a.dot(a) + a.dot(b) + b.dot(b)) / 12.0;
                }
                (area, moment)
            }
        }
    }
}

fn circle_circle_axis(a: &CircleShape, b: &CircleShape) -> PenetrationAxis {
    let normal = safe_normalize(b.center - a.center);
    let penetration = a.center.distance(b.center) - (a.radius + b.radius);
    PenetrationAxis {
        normal,
        penetration,
        vertex: b.center - normal * b.radius,
    }
}

/// SAT core loop: every edge of the reference polygon proposes its outward
/// normal, the other shape answers with its extreme point against it, and
/// the edge with the largest signed distance wins.
fn polygon_reference_axis(poly: &PolygonShape, other: &Shape) -> PenetrationAxis {
    let vs = &poly.vertices;
    let mut best = no_contact_axis(Vec2::X, Vec2::ZERO);
    for i in 0..vs.len() {
        let origin = vs[i];
        let normal = edge_normal(origin, vs[(i + 1) % vs.len()]);
        let support = other.extreme_point(-normal);
        let distance = normal.dot(support - origin);
        if distance > best.penetration {
            best = PenetrationAxis {
                normal,
                penetration: distance,
                vertex: support,
            };
        }
    }
    best
}

/// Circle-as-reference axis against a polygon: only meaningful when the
/// circle center sits in the closest vertex's Voronoi region. Everywhere
/// else the polygon's own edges separate better, so the no-contact
/// sentinel defers to the polygon-as-reference axis.
fn circle_polygon_axis(circle: &CircleShape, poly: &PolygonShape) -> PenetrationAxis {
    let vs = &poly.vertices;
    let Some(mut closest) = vs.first().copied() else {
        return no_contact_axis(Vec2::X, Vec2::ZERO);
    };
    let mut closest_index = 0;
    for (i, v) in vs.iter().enumerate().skip(1) {
        if v.distance_squared(circle.center) < closest.distance_squared(circle.center) {
            closest = *v;
            closest_index = i;
        }
    }

    let prev = vs[(closest_index + vs.len() - 1) % vs.len()];
    let next = vs[(closest_index + 1) % vs.len()];
    let to_center = circle.center - closest;
    let normal = safe_normalize(closest - circle.center);

    let in_vertex_region =
        to_center.dot(prev - closest) <= 0.0 && to_center.dot(next - closest) <= 0.0;
    if !in_vertex_region {
        return no_contact_axis(normal, closest);
    }

    PenetrationAxis {
        normal,
        penetration: to_center.length() - circle.radius,
        vertex: closest,
    }
}
