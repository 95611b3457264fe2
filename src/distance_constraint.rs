//! Distance constraints between body pairs.
//!
//! A rod of fixed rest length between two anchor points, solved with the
//! same effective-mass primitives as contact resolution: a partial
//! positional correction of the length error, then a velocity impulse
//! with a Baumgarte bias on the remaining error.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::body_data::{Body, BodyId};
use crate::body_operations::{solve_position, solve_velocity};
use crate::constants::{
    CONSTRAINT_BAUMGARTE_BIAS, CONSTRAINT_POSITION_CORRECTION, CONSTRAINT_SLOP,
};
use crate::math::safe_normalize;

/// Identifier assigned by the world on insertion.
pub type ConstraintId = u32;

/// Already-resolved construction parameters for a distance constraint.
///
/// Anchors are offsets in each body's local frame at attach time. A
/// missing rest length defaults to the inter-anchor distance when the
/// constraint is added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintDef {
    pub body_a: BodyId,
    pub body_b: BodyId,
    #[serde(default)]
    pub anchor_a: Vec2,
    #[serde(default)]
    pub anchor_b: Vec2,
    #[serde(default)]
    pub rest_length: Option<f32>,
}

/// A distance constraint owned by the world.
///
/// Holds back-references to its two bodies by identifier only; the bodies
/// do not know about it.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceConstraint {
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub anchor_a: Vec2,
    pub anchor_b: Vec2,
    pub rest_length: f32,
}

/// World-space anchor of a local offset under a body's current placement.
pub fn world_anchor(body: &Body, anchor: Vec2) -> Vec2 {
    body.position + Vec2::from_angle(body.angle).rotate(anchor)
}

/// Solve one constraint once against its two bodies.
///
/// Returns whether either body changed. A length error within the slop is
/// left alone; coincident anchors fall back to the +x normal instead of
/// producing NaN.
pub fn solve_distance_constraint(
    constraint: &DistanceConstraint,
    a: &mut Body,
    b: &mut Body,
) -> bool {
    let ra = Vec2::from_angle(a.angle).rotate(constraint.anchor_a);
    let rb = Vec2::from_angle(b.angle).rotate(constraint.anchor_b);
    let delta = (b.position + rb) - (a.position + ra);
    let error = constraint.rest_length - delta.length();
    if error.abs() < CONSTRAINT_SLOP {
        return false;
    }

    let normal = safe_normalize(delta);
    let moved = solve_position(a, b, ra, rb, normal, error * CONSTRAINT_POSITION_CORRECTION);

    let vn = (b.velocity_at(rb) - a.velocity_at(ra)).dot(normal);
    let impulse = solve_velocity(
        a,
        b,
        ra,
        rb,
        normal,
        error * CONSTRAINT_BAUMGARTE_BIAS - vn,
    );

    moved || impulse != 0.0
}
