//! Kinematic and solver primitives as free functions over bodies.
//!
//! Every function takes the bodies it touches as explicit parameters;
//! there is no hidden solver state. Static bodies absorb every call as an
//! exact no-op.

use glam::Vec2;

use crate::body_data::Body;

/// Apply an impulse at offset `r` from the body center.
pub fn apply_impulse(body: &mut Body, impulse: Vec2, r: Vec2) {
    if body.is_static() {
        return;
    }
    body.velocity += impulse * body.inv_mass();
    body.angular_velocity += r.perp_dot(impulse) * body.inv_inertia();
}

/// Apply a pure angular impulse.
pub fn apply_angular_impulse(body: &mut Body, angular_impulse: f32) {
    if body.is_static() {
        return;
    }
    body.angular_velocity += angular_impulse * body.inv_inertia();
}

/// Positional analogue of an impulse: displace placement directly, scaled
/// by inverse mass and inverse inertia.
pub fn apply_mass_displacement(body: &mut Body, displacement: Vec2, r: Vec2) {
    if body.is_static() {
        return;
    }
    body.position += displacement * body.inv_mass();
    body.angle += r.perp_dot(displacement) * body.inv_inertia();
}

/// Semi-implicit Euler placement advance.
pub fn integrate(body: &mut Body, dt: f32) {
    if body.is_static() {
        return;
    }
    body.position += body.velocity * dt;
    body.angle += body.angular_velocity * dt;
}

/// Combined inverse-mass term of two bodies along direction `n`, for
/// application points at offsets `ra`, `rb` from the respective centers:
///
/// `1/mA + 1/mB + (n x rA)^2 / IA + (n x rB)^2 / IB`
///
/// Inverses are exactly zero for static bodies, so a static partner only
/// ever stiffens the pair.
pub fn effective_mass(a: &Body, b: &Body, ra: Vec2, rb: Vec2, n: Vec2) -> f32 {
    let ra_n = ra.perp_dot(n);
    let rb_n = rb.perp_dot(n);
    a.inv_mass()
        + b.inv_mass()
        + ra_n * ra_n * a.inv_inertia()
        + rb_n * rb_n * b.inv_inertia()
}

/// Change the separation of the two application points along `n` by
/// `dlength`, distributed by inverse effective mass.
///
/// Returns whether any displacement was applied; a vanishing effective
/// mass (two static bodies) is a no-op.
pub fn solve_position(
    a: &mut Body,
    b: &mut Body,
    ra: Vec2,
    rb: Vec2,
    n: Vec2,
    dlength: f32,
) -> bool {
    let em = effective_mass(a, b, ra, rb, n);
    if em <= 0.0 {
        return false;
    }
    let lambda = dlength / em;
    apply_mass_displacement(a, n * -lambda, ra);
    apply_mass_displacement(b, n * lambda, rb);
    true
}

/// Solve and apply the impulse changing the relative velocity of the two
/// application points along `n` by `dvel`. Returns the impulse scalar.
pub fn solve_velocity(
    a: &mut Body,
    b: &mut Body,
    ra: Vec2,
    rb: Vec2,
    n: Vec2,
    dvel: f32,
) -> f32 {
    let em = effective_mass(a, b, ra, rb, n);
    if em <= 0.0 {
        return 0.0;
    }
    let impulse = dvel / em;
    apply_impulses(a, b, ra, rb, n * impulse);
    impulse
}

/// Equal and opposite impulse application: `a` receives the negated
/// impulse at `ra`, `b` the impulse at `rb`.
pub fn apply_impulses(a: &mut Body, b: &mut Body, ra: Vec2, rb: Vec2, impulse: Vec2) {
    apply_impulse(a, -impulse, ra);
    apply_impulse(b, impulse, rb);
}
