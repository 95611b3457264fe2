//! Rigid-body state and construction.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{PhysicsError, PhysicsResult};
use crate::shape::{CircleShape, PolygonShape, Shape};

/// Identifier assigned by the world on insertion.
pub type BodyId = u32;

/// Local-frame collision geometry of a body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BodyShape {
    Circle { radius: f32 },
    /// Convex polygon around the body origin, counterclockwise winding.
    Polygon { vertices: Vec<Vec2> },
}

impl BodyShape {
    /// Axis-aligned rectangle of the given width and length centered on
    /// the body origin.
    pub fn rectangle(width: f32, length: f32) -> Self {
        let hw = width * 0.5;
        let hl = length * 0.5;
        BodyShape::Polygon {
            vertices: vec![
                Vec2::new(-hw, -hl),
                Vec2::new(hw, -hl),
                Vec2::new(hw, hl),
                Vec2::new(-hw, hl),
            ],
        }
    }
}

/// Explicit static/dynamic marker.
///
/// A static body's inverse mass and inverse inertia are stored as exactly
/// zero; no formula in the crate depends on infinity arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum BodyMass {
    Static,
    Dynamic(f32),
}

/// Position and angle at some instant.
///
/// [`Body::placement_at`] is the one contract an external renderer
/// depends on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    pub position: Vec2,
    pub angle: f32,
}

/// Already-resolved construction parameters for a body.
///
/// Option parsing and defaulting happen outside the core; this record is
/// what arrives after that. Field defaults follow the reference material's
/// fixture defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyDef {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    pub mass: BodyMass,
    /// Moment of inertia; derived from the shape's mass distribution when
    /// omitted.
    pub inertia: Option<f32>,
    pub static_friction: f32,
    pub kinetic_friction: f32,
    pub restitution: f32,
    pub shape: BodyShape,
}

impl Default for BodyDef {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            velocity: Vec2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            mass: BodyMass::Dynamic(1.0),
            inertia: None,
            static_friction: 0.2,
            kinetic_friction: 0.1,
            restitution: 0.3,
            shape: BodyShape::Circle { radius: 1.0 },
        }
    }
}

/// A rigid body. Owned exclusively by the world; everything else refers to
/// it by [`BodyId`].
#[derive(Debug, Clone)]
pub struct Body {
    pub position: Vec2,
    pub velocity: Vec2,
    pub angle: f32,
    pub angular_velocity: f32,
    mass: BodyMass,
    inv_mass: f32,
    inertia: f32,
    inv_inertia: f32,
    pub static_friction: f32,
    pub kinetic_friction: f32,
    pub restitution: f32,
    shape: BodyShape,
}

impl Body {
    /// Validate a definition and build the body, caching inverse mass and
    /// inverse inertia.
    pub fn new(def: BodyDef) -> PhysicsResult<Self> {
        validate_shape(&def.shape)?;

        let finite = def.position.is_finite()
            && def.velocity.is_finite()
            && def.angle.is_finite()
            && def.angular_velocity.is_finite();
        if !finite {
            return Err(PhysicsError::InvalidBody {
                reason: "non-finite kinematic state".to_string(),
            });
        }

        let (inv_mass, inertia, inv_inertia) = match def.mass {
            BodyMass::Static => (0.0, 0.0, 0.0),
            BodyMass::Dynamic(mass) => {
                if !(mass.is_finite() && mass > 0.0) {
                    return Err(PhysicsError::InvalidBody {
                        reason: format!("dynamic mass must be positive and finite, got {mass}"),
                    });
                }
                let inertia = match def.inertia {
                    Some(inertia) if inertia.is_finite() && inertia > 0.0 => inertia,
                    Some(inertia) => {
                        return Err(PhysicsError::InvalidBody {
                            reason: format!("inertia must be positive and finite, got {inertia}"),
                        })
                    }
                    None => default_inertia(&def.shape, mass),
                };
                (1.0 / mass, inertia, 1.0 / inertia)
            }
        };

        Ok(Self {
            position: def.position,
            velocity: def.velocity,
            angle: def.angle,
            angular_velocity: def.angular_velocity,
            mass: def.mass,
            inv_mass,
            inertia,
            inv_inertia,
            static_friction: def.static_friction,
            kinetic_friction: def.kinetic_friction,
            restitution: def.restitution,
            shape: def.shape,
        })
    }

    pub fn is_static(&self) -> bool {
        matches!(self.mass, BodyMass::Static)
    }

    pub fn mass(&self) -> BodyMass {
        self.mass
    }

    pub fn inv_mass(&self) -> f32 {
        self.inv_mass
    }

    pub fn inertia(&self) -> f32 {
        self.inertia
    }

    pub fn inv_inertia(&self) -> f32 {
        self.inv_inertia
    }

    pub fn shape(&self) -> &BodyShape {
        &self.shape
    }

    pub fn placement(&self) -> Placement {
        Placement {
            position: self.position,
            angle: self.angle,
        }
    }

    /// Predicted placement `offset` seconds ahead of the current state.
    /// Does not mutate the body.
    pub fn placement_at(&self, offset: f32) -> Placement {
        Placement {
            position: self.position + self.velocity * offset,
            angle: self.angle + self.angular_velocity * offset,
        }
    }

    /// Velocity of the body point at offset `r` from the center.
    pub fn velocity_at(&self, r: Vec2) -> Vec2 {
        self.velocity + self.angular_velocity * r.perp()
    }

    /// World-space collision shape for the current placement.
    pub fn world_shape(&self) -> Shape {
        match &self.shape {
            BodyShape::Circle { radius } => Shape::Circle(CircleShape {
                center: self.position,
                radius: *radius,
            }),
            BodyShape::Polygon { vertices } => {
                let rotation = Vec2::from_angle(self.angle);
                Shape::Polygon(PolygonShape::new(
                    vertices
                        .iter()
                        .map(|v| self.position + rotation.rotate(*v))
                        .collect(),
                ))
            }
        }
    }
}

fn validate_shape(shape: &BodyShape) -> PhysicsResult<()> {
    match shape {
        BodyShape::Circle { radius } => {
            if !(radius.is_finite() && *radius > 0.0) {
                return Err(PhysicsError::InvalidBody {
                    reason: format!("circle radius must be positive and finite, got {radius}"),
                });
            }
        }
        BodyShape::Polygon { vertices } => {
            if vertices.len() < 3 {
                return Err(PhysicsError::InvalidBody {
                    reason: format!("polygon needs at least 3 vertices, got {}", vertices.len()),
                });
            }
            if vertices.iter().any(|v| !v.is_finite()) {
                return Err(PhysicsError::InvalidBody {
                    reason: "polygon vertex is not finite".to_string(),
                });
            }
            // Positive signed area doubles as the counterclockwise-winding
            // check and rejects degenerate (collinear) vertex lists.
            let (area, _) = Shape::Polygon(PolygonShape::new(vertices.clone())).area_moment();
            if area <= 0.0 {
                return Err(PhysicsError::InvalidBody {
                    reason: "polygon must be counterclockwise with positive area".to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Default moment of inertia of a shape carrying mass `mass`, from its
/// area and second moment of area.
fn default_inertia(shape: &BodyShape, mass: f32) -> f32 {
    let local = match shape {
        BodyShape::Circle { radius } => Shape::Circle(CircleShape {
            center: Vec2::ZERO,
            radius: *radius,
        }),
        BodyShape::Polygon { vertices } => Shape::Polygon(PolygonShape::new(vertices.clone())),
    };
    let (area, moment) = local.area_moment();
    mass * (moment / area)
}
