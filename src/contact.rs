//! Pairwise intersection resolution.
//!
//! One deepest-penetration contact point per pair per resolve. The body
//! whose least-penetration axis is shallower becomes the reference body
//! (its edge is used), the other the incident body (its vertex is used);
//! that choice is a tie-break, not a physical distinction.

use glam::Vec2;

use crate::aabb::aabb_overlaps;
use crate::body_data::{Body, BodyId};
use crate::body_operations::{apply_impulses, effective_mass, solve_position, solve_velocity};
use crate::constants::{CONTACT_POSITION_CORRECTION, PENETRATION_SLOP};

/// Unordered body pair, stored smaller identifier first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContactPair {
    pub body_a: BodyId,
    pub body_b: BodyId,
}

impl ContactPair {
    pub fn new(a: BodyId, b: BodyId) -> Self {
        if a < b {
            Self { body_a: a, body_b: b }
        } else {
            Self { body_a: b, body_b: a }
        }
    }

    pub fn contains(&self, id: BodyId) -> bool {
        self.body_a == id || self.body_b == id
    }
}

/// Outcome of resolving one candidate pair.
#[derive(Debug, Clone, Copy)]
pub struct Manifold {
    /// Body whose edge carried the contact.
    pub reference: BodyId,
    /// Body whose vertex carried the contact.
    pub incident: BodyId,
    /// Whether any positional correction was applied.
    pub moved: bool,
    /// Whether a velocity response occurred (a true collision).
    pub collided: bool,
    /// Magnitude of the applied normal impulse.
    pub normal_impulse: f32,
    /// Magnitude of the applied friction impulse.
    pub tangent_impulse: f32,
    /// Contact normal, out of the reference body toward the incident one.
    pub normal: Vec2,
    /// Friction direction, opposing the incident body's tangential motion.
    pub tangent: Vec2,
}

impl Manifold {
    fn rejected(reference: BodyId, incident: BodyId) -> Self {
        Self {
            reference,
            incident,
            moved: false,
            collided: false,
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
            normal: Vec2::ZERO,
            tangent: Vec2::ZERO,
        }
    }
}

/// Minimum of the two restitution coefficients.
fn combined_restitution(a: f32, b: f32) -> f32 {
    a.min(b)
}

/// Euclidean combination of two friction coefficients.
fn combined_friction(a: f32, b: f32) -> f32 {
    (a * a + b * b).sqrt()
}

/// Detect and resolve the contact between two bodies.
///
/// Positional correction uses the full penetration depth immediately;
/// the velocity response follows only when the contact points are not
/// already separating. Static bodies absorb their share of both as exact
/// no-ops.
pub fn resolve_contact(a_id: BodyId, a: &mut Body, b_id: BodyId, b: &mut Body) -> Manifold {
    let shape_a = a.world_shape();
    let shape_b = b.world_shape();

    if !aabb_overlaps(&shape_a.aabb(), &shape_b.aabb()) {
        return Manifold::rejected(a_id, b_id);
    }

    let axis_a = shape_a.least_penetration_axis(&shape_b);
    let axis_b = shape_b.least_penetration_axis(&shape_a);

    // The shallower (less negative) penetration picks the reference body.
    let (reference, incident, ref_id, inc_id, axis) = if axis_a.penetration > axis_b.penetration {
        (a, b, a_id, b_id, axis_a)
    } else {
        (b, a, b_id, a_id, axis_b)
    };

    if axis.penetration > PENETRATION_SLOP {
        return Manifold::rejected(ref_id, inc_id);
    }

    let normal = axis.normal;
    // Incident vertex pushed back onto the reference face.
    let contact = axis.vertex - normal * axis.penetration;
    let r_ref = contact - reference.position;
    let r_inc = contact - incident.position;

    let moved = solve_position(
        reference,
        incident,
        r_ref,
        r_inc,
        normal,
        -axis.penetration * CONTACT_POSITION_CORRECTION,
    );

    let vn = (incident.velocity_at(r_inc) - reference.velocity_at(r_ref)).dot(normal);
    if vn > 0.0 {
        // Already separating: the overlap was corrected, nothing to bounce.
        return Manifold {
            reference: ref_id,
            incident: inc_id,
            moved,
            collided: false,
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
            normal,
            tangent: normal.perp(),
        };
    }

    let restitution = combined_restitution(reference.restitution, incident.restitution);
    let normal_impulse =
        solve_velocity(reference, incident, r_ref, r_inc, normal, -(1.0 + restitution) * vn);

    // Friction acts against whatever tangential motion the normal impulse
    // left behind.
    let relative = incident.velocity_at(r_inc) - reference.velocity_at(r_ref);
    let tangent_velocity = relative - normal * relative.dot(normal);
    let tangent_speed = tangent_velocity.length();
    let (tangent, tangent_impulse) = if tangent_speed > f32::EPSILON {
        let tangent = -tangent_velocity / tangent_speed;
        let em = effective_mass(reference, incident, r_ref, r_inc, tangent);
        let unclamped = if em > 0.0 { tangent_speed / em } else { 0.0 };
        let static_bound =
            combined_friction(reference.static_friction, incident.static_friction) * normal_impulse;
        // Coulomb's law: stick below the static bound, slide at the
        // kinetic one above it.
        let impulse = if unclamped <= static_bound {
            unclamped
        } else {
            combined_friction(reference.kinetic_friction, incident.kinetic_friction)
                * normal_impulse
        };
        apply_impulses(reference, incident, r_ref, r_inc, tangent * impulse);
        (tangent, impulse)
    } else {
        (normal.perp(), 0.0)
    };

    log::trace!(
        "[Contact] {}-{} resolved: penetration {:.4}, jn {:.4}, jt {:.4}",
        ref_id,
        inc_id,
        axis.penetration,
        normal_impulse,
        tangent_impulse
    );

    Manifold {
        reference: ref_id,
        incident: inc_id,
        moved,
        collided: true,
        normal_impulse,
        tangent_impulse,
        normal,
        tangent,
    }
}
