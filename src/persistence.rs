//! Textual round-trip encoding of world state.
//!
//! A boundary collaborator only: the simulation core never reads these
//! records. Shape kinds travel as string tags here, and static mass is
//! written as a reserved sentinel because JSON cannot hold infinity; both
//! decode back to the closed in-memory variants, and anything else is an
//! explicit decode failure rather than a silent default.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::body_data::{Body, BodyDef, BodyId, BodyMass, BodyShape};
use crate::constants::STATIC_MASS_SENTINEL;
use crate::distance_constraint::{ConstraintId, DistanceConstraint};
use crate::error::{PhysicsError, PhysicsResult};
use crate::world::{World, WorldDef};

/// Format version stamped into every envelope.
pub const FORMAT_VERSION: u32 = 1;

const KIND_CIRCLE: &str = "circle";
const KIND_POLYGON: &str = "polygon";

/// Canonical per-body field list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BodyRecord {
    pub id: BodyId,
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vertices: Option<Vec<Vec2>>,
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    /// Mass, or [`STATIC_MASS_SENTINEL`] for a static body.
    pub mass: f32,
    pub inertia: f32,
    pub static_friction: f32,
    pub kinetic_friction: f32,
    pub restitution: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstraintRecord {
    pub id: ConstraintId,
    pub body_a: BodyId,
    pub body_b: BodyId,
    pub anchor_a: Vec2,
    pub anchor_b: Vec2,
    pub rest_length: f32,
}

/// Versioned world envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldRecord {
    pub version: u32,
    pub gravity: f32,
    pub cell_size: f32,
    pub time: f32,
    pub bodies: Vec<BodyRecord>,
    pub constraints: Vec<ConstraintRecord>,
}

fn encode_body(id: BodyId, body: &Body) -> BodyRecord {
    let (kind, radius, vertices) = match body.shape() {
        BodyShape::Circle { radius } => (KIND_CIRCLE, Some(*radius), None),
        BodyShape::Polygon { vertices } => (KIND_POLYGON, None, Some(vertices.clone())),
    };
    let mass = match body.mass() {
        BodyMass::Static => STATIC_MASS_SENTINEL,
        BodyMass::Dynamic(mass) => mass,
    };
    BodyRecord {
        id,
        kind: kind.to_string(),
        radius,
        vertices,
        position: body.position,
        velocity: body.velocity,
        angle: body.angle,
        angular_velocity: body.angular_velocity,
        mass,
        inertia: body.inertia(),
        static_friction: body.static_friction,
        kinetic_friction: body.kinetic_friction,
        restitution: body.restitution,
    }
}

fn decode_body(record: &BodyRecord) -> PhysicsResult<Body> {
    let shape = match record.kind.as_str() {
        KIND_CIRCLE => BodyShape::Circle {
            radius: record.radius.ok_or_else(|| PhysicsError::InvalidBody {
                reason: format!("circle body {} is missing a radius", record.id),
            })?,
        },
        KIND_POLYGON => BodyShape::Polygon {
            vertices: record
                .vertices
                .clone()
                .ok_or_else(|| PhysicsError::InvalidBody {
                    reason: format!("polygon body {} is missing vertices", record.id),
                })?,
        },
        other => {
            return Err(PhysicsError::UnsupportedShapeKind {
                kind: other.to_string(),
            })
        }
    };

    let (mass, inertia) = if record.mass == STATIC_MASS_SENTINEL {
        (BodyMass::Static, None)
    } else if record.mass > 0.0 {
        (BodyMass::Dynamic(record.mass), Some(record.inertia))
    } else {
        return Err(PhysicsError::InvalidBody {
            reason: format!(
                "body {} mass {} is neither positive nor the static sentinel",
                record.id, record.mass
            ),
        });
    };

    Body::new(BodyDef {
        position: record.position,
        velocity: record.velocity,
        angle: record.angle,
        angular_velocity: record.angular_velocity,
        mass,
        inertia,
        static_friction: record.static_friction,
        kinetic_friction: record.kinetic_friction,
        restitution: record.restitution,
        shape,
    })
}

/// Serialize a world to its textual form.
pub fn encode_world(world: &World) -> PhysicsResult<String> {
    let mut bodies: Vec<BodyRecord> = world
        .bodies()
        .map(|(id, body)| encode_body(id, body))
        .collect();
    bodies.sort_unstable_by_key(|record| record.id);

    let mut constraints: Vec<ConstraintRecord> = world
        .constraints()
        .map(|(id, c)| ConstraintRecord {
            id,
            body_a: c.body_a,
            body_b: c.body_b,
            anchor_a: c.anchor_a,
            anchor_b: c.anchor_b,
            rest_length: c.rest_length,
        })
        .collect();
    constraints.sort_unstable_by_key(|record| record.id);

    let record = WorldRecord {
        version: FORMAT_VERSION,
        gravity: world.gravity(),
        cell_size: world.cell_size(),
        time: world.time(),
        bodies,
        constraints,
    };
    Ok(serde_json::to_string_pretty(&record)?)
}

/// Restore a stepping world from its textual form.
pub fn decode_world(text: &str) -> PhysicsResult<World> {
    let record: WorldRecord = serde_json::from_str(text)?;
    if record.version != FORMAT_VERSION {
        return Err(PhysicsError::InvalidWorld {
            reason: format!(
                "unsupported format version {} (expected {FORMAT_VERSION})",
                record.version
            ),
        });
    }

    let mut world = World::new(WorldDef {
        gravity: record.gravity,
        cell_size: record.cell_size,
        initial_time: record.time,
    })?;

    for body_record in &record.bodies {
        let body = decode_body(body_record)?;
        world.restore_body(body_record.id, body)?;
    }

    for c in &record.constraints {
        if !(c.rest_length.is_finite() && c.rest_length >= 0.0) {
            return Err(PhysicsError::InvalidConstraint {
                reason: format!(
                    "constraint {} rest length {} is not finite and non-negative",
                    c.id, c.rest_length
                ),
            });
        }
        world.restore_constraint(
            c.id,
            DistanceConstraint {
                body_a: c.body_a,
                body_b: c.body_b,
                anchor_a: c.anchor_a,
                anchor_b: c.anchor_b,
                rest_length: c.rest_length,
            },
        )?;
    }

    log::debug!(
        "[Persistence] decoded world: {} bodies, {} constraints, t = {}",
        record.bodies.len(),
        record.constraints.len(),
        record.time
    );
    Ok(world)
}
