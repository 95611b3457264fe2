//! Solver tunables shared across the crate.
//!
//! Everything here is dimensionless or in world units; the solver modules
//! reference these by name instead of scattering magic numbers.

/// Absolute tolerance below which a cross product counts as collinear.
pub const COLLINEARITY_EPSILON: f32 = 0.001;

/// Per-coordinate tolerance for the point-on-segment test.
pub const SEGMENT_EPSILON: f32 = 0.001;

/// Contact penetration shallower than this (less negative) is ignored.
pub const PENETRATION_SLOP: f32 = -0.03;

/// Constraint length error smaller than this is ignored.
pub const CONSTRAINT_SLOP: f32 = 0.03;

/// Fraction of the contact penetration corrected positionally per resolve.
pub const CONTACT_POSITION_CORRECTION: f32 = 1.0;

/// Fraction of the constraint length error corrected positionally per solve.
pub const CONSTRAINT_POSITION_CORRECTION: f32 = 0.4;

/// Baumgarte velocity-bias factor on the remaining constraint error.
pub const CONSTRAINT_BAUMGARTE_BIAS: f32 = 10.0;

/// Hard cap on relaxation passes per step, converged or not.
pub const MAX_RELAXATION_PASSES: usize = 10;

/// Cell radius of the broad-phase neighborhood scan (1 = 3x3 cells).
pub const BROADPHASE_NEIGHBORHOOD: i32 = 1;

/// Cell margin added around a static body's AABB when registering it.
pub const STATIC_CELL_MARGIN: i32 = 1;

/// Penetration value that forces an axis to lose reference selection.
///
/// Finite on purpose: static-body arithmetic must not depend on platform
/// infinity behavior.
pub const NO_CONTACT_DEPTH: f32 = -1.0e9;

/// Encoded mass standing in for a static body; JSON cannot hold infinity.
pub const STATIC_MASS_SENTINEL: f32 = -1.0;
