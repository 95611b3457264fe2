//! Ember Physics - a 2D rigid-body simulation core.
//!
//! Broad-phase spatial hashing, a separating-axis narrow phase between
//! circles and convex polygons, and a sequential-impulse solver that
//! resolves interpenetration, contact velocity, friction, and distance
//! constraints over discrete time steps.
//!
//! The [`World`] owns every body and constraint and hands out integer
//! identifiers; [`World::step`] runs the whole pipeline synchronously.
//! Rendering is out of scope - an external renderer consumes only the
//! interpolated placement query ([`World::placement_at`]).

// Constants module
pub mod constants;

// Math and geometry
pub mod aabb;
pub mod math;
pub mod shape;
pub mod spatial_hash;

// Bodies and solvers
pub mod body_data;
pub mod body_operations;
pub mod contact;
pub mod distance_constraint;

// World orchestration and the boundary codec
pub mod error;
pub mod persistence;
pub mod world;

pub use aabb::Aabb;
pub use body_data::{Body, BodyDef, BodyId, BodyMass, BodyShape, Placement};
pub use contact::{ContactPair, Manifold};
pub use distance_constraint::{ConstraintDef, ConstraintId, DistanceConstraint};
pub use error::{PhysicsError, PhysicsResult};
pub use persistence::{decode_world, encode_world};
pub use shape::{CircleShape, PenetrationAxis, PolygonShape, Shape};
pub use spatial_hash::SpatialHash;
pub use world::{World, WorldDef};
