//! World ownership and the step state machine.
//!
//! The world exclusively owns every body and constraint; everything else
//! refers to them by identifier. A step runs to completion synchronously:
//! gravity, integration, a dynamic-grid rebuild, then the bounded
//! contact/constraint relaxation loop. Identifiers that vanish between
//! steps are skipped, never an error.

use glam::Vec2;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::aabb::aabb_cell_range;
use crate::body_data::{Body, BodyDef, BodyId, BodyMass, Placement};
use crate::body_operations::{apply_impulse, integrate};
use crate::constants::{BROADPHASE_NEIGHBORHOOD, MAX_RELAXATION_PASSES, STATIC_CELL_MARGIN};
use crate::contact::{resolve_contact, ContactPair, Manifold};
use crate::distance_constraint::{
    solve_distance_constraint, world_anchor, ConstraintDef, ConstraintId, DistanceConstraint,
};
use crate::error::{PhysicsError, PhysicsResult};
use crate::spatial_hash::{cell_of, Cell, SpatialHash};

/// Already-resolved world construction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldDef {
    /// Gravity magnitude along +y.
    pub gravity: f32,
    /// Broad-phase grid cell size, world units.
    pub cell_size: f32,
    /// Accumulated simulation time to start from.
    pub initial_time: f32,
}

impl Default for WorldDef {
    fn default() -> Self {
        Self {
            gravity: 0.0,
            cell_size: 10.0,
            initial_time: 0.0,
        }
    }
}

/// Candidate-pair veto consulted before the resolver runs.
pub type ContactFilter = Box<dyn Fn(ContactPair) -> bool>;
/// Callback invoked once per true collision per relaxation pass.
pub type ContactListener = Box<dyn FnMut(&Manifold)>;

/// The simulation world.
pub struct World {
    dynamic_bodies: FxHashMap<BodyId, Body>,
    static_bodies: FxHashMap<BodyId, Body>,
    dynamic_grid: SpatialHash,
    static_grid: SpatialHash,
    /// Cell range each static body was registered into, so removal clears
    /// exactly the same membership.
    static_cells: FxHashMap<BodyId, (Cell, Cell)>,
    constraints: FxHashMap<ConstraintId, DistanceConstraint>,
    gravity: f32,
    cell_size: f32,
    time: f32,
    next_body_id: BodyId,
    next_constraint_id: ConstraintId,
    contact_filter: Option<ContactFilter>,
    contact_listeners: Vec<ContactListener>,
}

impl std::fmt::Debug for World {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("World")
            .field("dynamic_bodies", &self.dynamic_bodies)
            .field("static_bodies", &self.static_bodies)
            .field("dynamic_grid", &self.dynamic_grid)
            .field("static_grid", &self.static_grid)
            .field("static_cells", &self.static_cells)
            .field("constraints", &self.constraints)
            .field("gravity", &self.gravity)
            .field("cell_size", &self.cell_size)
            .field("time", &self.time)
            .field("next_body_id", &self.next_body_id)
            .field("next_constraint_id", &self.next_constraint_id)
            .field("contact_filter", &self.contact_filter.as_ref().map(|_| "..."))
            .field("contact_listeners", &self.contact_listeners.len())
            .finish()
    }
}

impl World {
    pub fn new(def: WorldDef) -> PhysicsResult<Self> {
        if !(def.cell_size.is_finite() && def.cell_size > 0.0) {
            return Err(PhysicsError::InvalidWorld {
                reason: format!("cell size must be positive and finite, got {}", def.cell_size),
            });
        }
        if !(def.gravity.is_finite() && def.initial_time.is_finite()) {
            return Err(PhysicsError::InvalidWorld {
                reason: "gravity and initial time must be finite".to_string(),
            });
        }
        Ok(Self {
            dynamic_bodies: FxHashMap::default(),
            static_bodies: FxHashMap::default(),
            dynamic_grid: SpatialHash::new(),
            static_grid: SpatialHash::new(),
            static_cells: FxHashMap::default(),
            constraints: FxHashMap::default(),
            gravity: def.gravity,
            cell_size: def.cell_size,
            time: def.initial_time,
            next_body_id: 0,
            next_constraint_id: 0,
            contact_filter: None,
            contact_listeners: Vec::new(),
        })
    }

    pub fn gravity(&self) -> f32 {
        self.gravity
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Accumulated simulation time.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn body(&self, id: BodyId) -> Option<&Body> {
        self.dynamic_bodies
            .get(&id)
            .or_else(|| self.static_bodies.get(&id))
    }

    /// All bodies with their identifiers, static and dynamic alike.
    pub fn bodies(&self) -> impl Iterator<Item = (BodyId, &Body)> {
        self.dynamic_bodies
            .iter()
            .chain(self.static_bodies.iter())
            .map(|(id, body)| (*id, body))
    }

    pub fn body_count(&self) -> usize {
        self.dynamic_bodies.len() + self.static_bodies.len()
    }

    pub fn constraint(&self, id: ConstraintId) -> Option<&DistanceConstraint> {
        self.constraints.get(&id)
    }

    pub fn constraints(&self) -> impl Iterator<Item = (ConstraintId, &DistanceConstraint)> {
        self.constraints.iter().map(|(id, c)| (*id, c))
    }

    /// Predicted placement of a body at an intra-step time offset, for an
    /// external renderer. Does not mutate anything.
    pub fn placement_at(&self, id: BodyId, offset: f32) -> Option<Placement> {
        self.body(id).map(|body| body.placement_at(offset))
    }

    /// Validate a definition and insert the body, returning its new
    /// identifier.
    pub fn add_body(&mut self, def: BodyDef) -> PhysicsResult<BodyId> {
        let body = Body::new(def)?;
        let id = self.next_body_id;
        self.next_body_id += 1;
        log::debug!(
            "[World] add body {id} ({})",
            if body.is_static() { "static" } else { "dynamic" }
        );
        self.insert_body(id, body);
        Ok(id)
    }

    /// Remove a body. Unknown identifiers are a no-op; constraints that
    /// reference the body simply stop solving.
    pub fn remove_body(&mut self, id: BodyId) -> bool {
        if let Some(body) = self.dynamic_bodies.remove(&id) {
            let (x, y) = cell_of(body.position, self.cell_size);
            self.dynamic_grid.remove(x, y, id);
            log::debug!("[World] removed dynamic body {id}");
            true
        } else if self.static_bodies.remove(&id).is_some() {
            self.clear_static_cells(id);
            log::debug!("[World] removed static body {id}");
            true
        } else {
            false
        }
    }

    /// Teleport a body to a new placement, keeping grid membership in
    /// sync. Static bodies are re-registered over their new footprint.
    pub fn move_body(&mut self, id: BodyId, position: Vec2, angle: f32) -> PhysicsResult<()> {
        if let Some(body) = self.dynamic_bodies.get_mut(&id) {
            let (x, y) = cell_of(body.position, self.cell_size);
            self.dynamic_grid.remove(x, y, id);
            body.position = position;
            body.angle = angle;
            let (x, y) = cell_of(position, self.cell_size);
            self.dynamic_grid.insert(x, y, id);
            return Ok(());
        }
        if let Some(body) = self.static_bodies.get_mut(&id) {
            body.position = position;
            body.angle = angle;
            let range = aabb_cell_range(
                &body.world_shape().aabb(),
                self.cell_size,
                STATIC_CELL_MARGIN,
            );
            self.clear_static_cells(id);
            self.fill_static_cells(id, range);
            return Ok(());
        }
        Err(PhysicsError::MissingBody { id })
    }

    /// Validate a definition and insert the constraint. Both endpoints
    /// must exist; a missing rest length defaults to the inter-anchor
    /// distance right now.
    pub fn add_constraint(&mut self, def: ConstraintDef) -> PhysicsResult<ConstraintId> {
        if def.body_a == def.body_b {
            return Err(PhysicsError::InvalidConstraint {
                reason: format!("cannot constrain body {} to itself", def.body_a),
            });
        }
        let a = self
            .body(def.body_a)
            .ok_or(PhysicsError::MissingBody { id: def.body_a })?;
        let b = self
            .body(def.body_b)
            .ok_or(PhysicsError::MissingBody { id: def.body_b })?;

        let rest_length = match def.rest_length {
            Some(length) if length.is_finite() && length >= 0.0 => length,
            Some(length) => {
                return Err(PhysicsError::InvalidConstraint {
                    reason: format!("rest length must be finite and non-negative, got {length}"),
                })
            }
            None => world_anchor(a, def.anchor_a).distance(world_anchor(b, def.anchor_b)),
        };

        let id = self.next_constraint_id;
        self.next_constraint_id += 1;
        self.constraints.insert(
            id,
            DistanceConstraint {
                body_a: def.body_a,
                body_b: def.body_b,
                anchor_a: def.anchor_a,
                anchor_b: def.anchor_b,
                rest_length,
            },
        );
        log::debug!(
            "[World] add constraint {id} between {} and {}, rest length {rest_length}",
            def.body_a,
            def.body_b
        );
        Ok(id)
    }

    pub fn remove_constraint(&mut self, id: ConstraintId) -> bool {
        self.constraints.remove(&id).is_some()
    }

    /// Install a candidate-pair veto; pairs it rejects never reach the
    /// resolver. The default accepts everything.
    pub fn set_contact_filter(&mut self, filter: impl Fn(ContactPair) -> bool + 'static) {
        self.contact_filter = Some(Box::new(filter));
    }

    pub fn clear_contact_filter(&mut self) {
        self.contact_filter = None;
    }

    /// Register a callback invoked once per true collision per relaxation
    /// pass. Listeners receive the manifold only; they cannot reach back
    /// into the world.
    pub fn add_contact_listener(&mut self, listener: impl FnMut(&Manifold) + 'static) {
        self.contact_listeners.push(Box::new(listener));
    }

    /// Advance the simulation by `dt` seconds.
    pub fn step(&mut self, dt: f32) {
        self.time += dt;

        // Gravity as an impulse: the mass cancels in the velocity update,
        // so every dynamic body gains the same velocity increment.
        for body in self.dynamic_bodies.values_mut() {
            let BodyMass::Dynamic(mass) = body.mass() else {
                continue;
            };
            apply_impulse(body, Vec2::new(0.0, dt * mass * self.gravity), Vec2::ZERO);
        }

        for body in self.dynamic_bodies.values_mut() {
            integrate(body, dt);
        }

        self.rebuild_dynamic_grid();

        // Relaxation: seed with every dynamic body, re-queue whatever a
        // constraint or contact moves, stop when nothing moved or the pass
        // cap is hit.
        let mut working: Vec<BodyId> = self.dynamic_bodies.keys().copied().collect();
        working.sort_unstable();

        for pass in 0..MAX_RELAXATION_PASSES {
            if working.is_empty() {
                break;
            }
            log::trace!(
                "[World] relaxation pass {} over {} bodies",
                pass + 1,
                working.len()
            );

            let mut moved: FxHashSet<BodyId> = FxHashSet::default();

            let mut constraint_ids: Vec<ConstraintId> = self.constraints.keys().copied().collect();
            constraint_ids.sort_unstable();
            for id in constraint_ids {
                self.relax_constraint(id, &mut moved);
            }

            let mut tested: FxHashSet<ContactPair> = FxHashSet::default();
            for &id in &working {
                let Some(body) = self.dynamic_bodies.get(&id) else {
                    continue;
                };
                let cell = cell_of(body.position, self.cell_size);
                for other in self.gather_candidates(cell, id) {
                    let pair = ContactPair::new(id, other);
                    if !tested.insert(pair) {
                        continue;
                    }
                    if let Some(filter) = &self.contact_filter {
                        if !filter(pair) {
                            continue;
                        }
                    }
                    let Some(manifold) = self.resolve_pair(id, other) else {
                        continue;
                    };
                    if manifold.moved {
                        if self.dynamic_bodies.contains_key(&id) {
                            moved.insert(id);
                        }
                        if self.dynamic_bodies.contains_key(&other) {
                            moved.insert(other);
                        }
                    }
                    if manifold.collided {
                        for listener in &mut self.contact_listeners {
                            listener(&manifold);
                        }
                    }
                }
            }

            working = moved.into_iter().collect();
            working.sort_unstable();
        }
    }

    fn insert_body(&mut self, id: BodyId, body: Body) {
        if body.is_static() {
            let range = aabb_cell_range(
                &body.world_shape().aabb(),
                self.cell_size,
                STATIC_CELL_MARGIN,
            );
            self.fill_static_cells(id, range);
            self.static_bodies.insert(id, body);
        } else {
            let (x, y) = cell_of(body.position, self.cell_size);
            self.dynamic_grid.insert(x, y, id);
            self.dynamic_bodies.insert(id, body);
        }
    }

    fn fill_static_cells(&mut self, id: BodyId, range: (Cell, Cell)) {
        let ((min_x, min_y), (max_x, max_y)) = range;
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                self.static_grid.insert(x, y, id);
            }
        }
        self.static_cells.insert(id, range);
    }

    fn clear_static_cells(&mut self, id: BodyId) {
        let Some(((min_x, min_y), (max_x, max_y))) = self.static_cells.remove(&id) else {
            return;
        };
        for x in min_x..=max_x {
            for y in min_y..=max_y {
                self.static_grid.remove(x, y, id);
            }
        }
    }

    fn rebuild_dynamic_grid(&mut self) {
        self.dynamic_grid.clear();
        for (id, body) in &self.dynamic_bodies {
            let (x, y) = cell_of(body.position, self.cell_size);
            self.dynamic_grid.insert(x, y, *id);
        }
    }

    /// Candidate partners from the neighborhood around `cell`, dynamic and
    /// static grids alike, sorted and deduplicated.
    fn gather_candidates(&self, cell: Cell, exclude: BodyId) -> Vec<BodyId> {
        let (cx, cy) = cell;
        let mut out = Vec::new();
        for dx in -BROADPHASE_NEIGHBORHOOD..=BROADPHASE_NEIGHBORHOOD {
            for dy in -BROADPHASE_NEIGHBORHOOD..=BROADPHASE_NEIGHBORHOOD {
                if let Some(members) = self.dynamic_grid.get(cx + dx, cy + dy) {
                    out.extend(members.iter().copied());
                }
                if let Some(members) = self.static_grid.get(cx + dx, cy + dy) {
                    out.extend(members.iter().copied());
                }
            }
        }
        out.sort_unstable();
        out.dedup();
        out.retain(|&other| other != exclude);
        out
    }

    /// Resolve one candidate pair. The first body is taken out of the
    /// dynamic map for the duration so both sides can be borrowed
    /// mutably; either identifier having vanished is a benign skip.
    fn resolve_pair(&mut self, id: BodyId, other: BodyId) -> Option<Manifold> {
        let mut body = self.dynamic_bodies.remove(&id)?;
        let manifold = if let Some(other_body) = self.dynamic_bodies.get_mut(&other) {
            Some(resolve_contact(id, &mut body, other, other_body))
        } else if let Some(other_body) = self.static_bodies.get_mut(&other) {
            Some(resolve_contact(id, &mut body, other, other_body))
        } else {
            None
        };
        self.dynamic_bodies.insert(id, body);
        manifold
    }

    /// Solve one constraint, queueing any dynamic body it moved. Missing
    /// endpoints are benign skips.
    fn relax_constraint(&mut self, id: ConstraintId, moved: &mut FxHashSet<BodyId>) {
        let Some(constraint) = self.constraints.get(&id).cloned() else {
            return;
        };
        let (mut a, a_dynamic) = if let Some(body) = self.dynamic_bodies.remove(&constraint.body_a)
        {
            (body, true)
        } else if let Some(body) = self.static_bodies.remove(&constraint.body_a) {
            (body, false)
        } else {
            return;
        };

        let changed = if let Some(b) = self.dynamic_bodies.get_mut(&constraint.body_b) {
            solve_distance_constraint(&constraint, &mut a, b)
        } else if let Some(b) = self.static_bodies.get_mut(&constraint.body_b) {
            solve_distance_constraint(&constraint, &mut a, b)
        } else {
            false
        };

        if a_dynamic {
            self.dynamic_bodies.insert(constraint.body_a, a);
        } else {
            self.static_bodies.insert(constraint.body_a, a);
        }

        if changed {
            if self.dynamic_bodies.contains_key(&constraint.body_a) {
                moved.insert(constraint.body_a);
            }
            if self.dynamic_bodies.contains_key(&constraint.body_b) {
                moved.insert(constraint.body_b);
            }
        }
    }

    /// Reinsert a body under a decoded identifier. Used by the boundary
    /// codec only.
    pub(crate) fn restore_body(&mut self, id: BodyId, body: Body) -> PhysicsResult<()> {
        if self.dynamic_bodies.contains_key(&id) || self.static_bodies.contains_key(&id) {
            return Err(PhysicsError::InvalidWorld {
                reason: format!("duplicate body id {id}"),
            });
        }
        self.insert_body(id, body);
        self.next_body_id = self.next_body_id.max(id + 1);
        Ok(())
    }

    /// Reinsert a constraint under a decoded identifier. Used by the
    /// boundary codec only.
    pub(crate) fn restore_constraint(
        &mut self,
        id: ConstraintId,
        constraint: DistanceConstraint,
    ) -> PhysicsResult<()> {
        for endpoint in [constraint.body_a, constraint.body_b] {
            if self.body(endpoint).is_none() {
                return Err(PhysicsError::MissingBody { id: endpoint });
            }
        }
        if self.constraints.contains_key(&id) {
            return Err(PhysicsError::InvalidWorld {
                reason: format!("duplicate constraint id {id}"),
            });
        }
        self.constraints.insert(id, constraint);
        self.next_constraint_id = self.next_constraint_id.max(id + 1);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body_data::BodyShape;
    use crate::constants::CONSTRAINT_SLOP;
    use rand::{Rng, SeedableRng};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn world() -> World {
        World::new(WorldDef {
            gravity: 0.0,
            cell_size: 10.0,
            initial_time: 0.0,
        })
        .expect("valid world def")
    }

    fn circle_def(position: Vec2, radius: f32) -> BodyDef {
        BodyDef {
            position,
            restitution: 0.0,
            shape: BodyShape::Circle { radius },
            ..BodyDef::default()
        }
    }

    fn static_rect_def(position: Vec2, width: f32, length: f32) -> BodyDef {
        BodyDef {
            position,
            mass: BodyMass::Static,
            restitution: 0.0,
            shape: BodyShape::rectangle(width, length),
            ..BodyDef::default()
        }
    }

    /// Shared convergence assertion used for both contact and constraint
    /// scenarios.
    fn assert_settles(world: &mut World, steps: usize, check: impl Fn(&World) -> bool) {
        for _ in 0..steps {
            world.step(1.0 / 60.0);
        }
        assert!(check(world), "world failed to settle within {steps} steps");
    }

    #[test]
    fn test_invalid_world_defs_are_rejected() {
        assert!(World::new(WorldDef {
            cell_size: 0.0,
            ..WorldDef::default()
        })
        .is_err());
        assert!(World::new(WorldDef {
            cell_size: f32::NAN,
            ..WorldDef::default()
        })
        .is_err());
    }

    #[test]
    fn test_pure_integration_path_is_exact() {
        let mut w = world();
        let mut def = circle_def(Vec2::new(0.0, 0.0), 1.0);
        def.velocity = Vec2::new(3.0, -2.0);
        def.angular_velocity = 0.7;
        let id = w.add_body(def).expect("valid");

        let dt = 0.5;
        w.step(dt);

        let body = w.body(id).expect("present");
        // No gravity, no contacts: integration alone, bit-exact.
        assert_eq!(body.position, Vec2::new(3.0, -2.0) * dt);
        assert_eq!(body.angle, 0.7 * dt);
        assert_eq!(body.velocity, Vec2::new(3.0, -2.0));
    }

    #[test]
    fn test_gravity_increment_is_mass_independent() {
        let mut w = World::new(WorldDef {
            gravity: 10.0,
            ..WorldDef::default()
        })
        .expect("valid");
        let light = w.add_body(circle_def(Vec2::ZERO, 1.0)).expect("valid");
        let heavy = w
            .add_body(BodyDef {
                mass: BodyMass::Dynamic(100.0),
                ..circle_def(Vec2::new(50.0, 0.0), 1.0)
            })
            .expect("valid");

        w.step(0.1);

        let dv_light = w.body(light).expect("present").velocity.y;
        let dv_heavy = w.body(heavy).expect("present").velocity.y;
        assert!((dv_light - 1.0).abs() < 1e-6);
        assert!((dv_heavy - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_static_body_is_immune_across_steps() {
        let mut w = World::new(WorldDef {
            gravity: 100.0,
            ..WorldDef::default()
        })
        .expect("valid");
        // Floor below a falling ball, gravity pulling +y.
        let floor = w
            .add_body(static_rect_def(Vec2::new(0.0, 3.0), 20.0, 2.0))
            .expect("valid");
        let ball = w.add_body(circle_def(Vec2::ZERO, 0.5)).expect("valid");

        for _ in 0..120 {
            w.step(1.0 / 60.0);
        }

        let floor_body = w.body(floor).expect("present");
        assert_eq!(floor_body.position, Vec2::new(0.0, 3.0));
        assert_eq!(floor_body.velocity, Vec2::ZERO);
        assert_eq!(floor_body.angle, 0.0);

        // The ball rests on the floor's upper face at y = 2.
        let ball_body = w.body(ball).expect("present");
        assert!(ball_body.position.y <= 1.5 + 0.1);
        assert!(ball_body.position.x.abs() < 0.1);
    }

    #[test]
    fn test_relaxation_loop_caps_at_ten_passes() {
        let mut w = world();
        // Two wall slabs sharing the x = 0 plane; a circle wedged across
        // both ping-pongs between them and never converges.
        w.add_body(static_rect_def(Vec2::new(-2.0, 0.0), 4.0, 8.0))
            .expect("valid");
        w.add_body(static_rect_def(Vec2::new(2.0, 0.0), 4.0, 8.0))
            .expect("valid");
        w.add_body(circle_def(Vec2::ZERO, 1.0)).expect("valid");

        let collisions = Rc::new(RefCell::new(0usize));
        let seen = Rc::clone(&collisions);
        w.add_contact_listener(move |_| {
            *seen.borrow_mut() += 1;
        });

        w.step(1.0 / 60.0);

        // Every pass re-resolves both wall pairs; the cap bounds the step.
        assert_eq!(*collisions.borrow(), 2 * MAX_RELAXATION_PASSES);
    }

    #[test]
    fn test_distance_constraint_converges_over_steps() {
        let mut w = world();
        let a = w.add_body(circle_def(Vec2::ZERO, 0.1)).expect("valid");
        let b = w
            .add_body(circle_def(Vec2::new(3.0, 0.0), 0.1))
            .expect("valid");
        w.add_constraint(ConstraintDef {
            body_a: a,
            body_b: b,
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            rest_length: Some(2.5),
        })
        .expect("valid");

        assert_settles(&mut w, 120, |w| {
            let pa = w.body(a).expect("present").position;
            let pb = w.body(b).expect("present").position;
            (pa.distance(pb) - 2.5).abs() <= CONSTRAINT_SLOP + 0.02
        });
    }

    #[test]
    fn test_contact_settles_under_the_same_harness() {
        // The contact path measured with the same settle assertion as the
        // constraint path above.
        let mut w = world();
        let a = w.add_body(circle_def(Vec2::ZERO, 1.0)).expect("valid");
        let b = w
            .add_body(circle_def(Vec2::new(1.5, 0.0), 1.0))
            .expect("valid");

        assert_settles(&mut w, 10, |w| {
            let pa = w.body(a).expect("present").position;
            let pb = w.body(b).expect("present").position;
            pa.distance(pb) >= 2.0 - 0.05
        });
    }

    #[test]
    fn test_boundary_straddling_static_is_found() {
        // Dynamic body in cell (0, 0), static neighbor centered across the
        // boundary in cell (1, 0); the neighborhood scan must still pair
        // them.
        let mut w = World::new(WorldDef {
            cell_size: 5.0,
            ..WorldDef::default()
        })
        .expect("valid");
        let ball = w
            .add_body(circle_def(Vec2::new(4.5, 0.0), 1.0))
            .expect("valid");
        let block = w
            .add_body(static_rect_def(Vec2::new(5.6, 0.0), 1.0, 4.0))
            .expect("valid");

        w.step(1.0 / 60.0);

        let ball_body = w.body(ball).expect("present");
        let block_body = w.body(block).expect("present");
        assert_eq!(block_body.position, Vec2::new(5.6, 0.0));
        // Pushed left of the block's face at x = 5.1.
        assert!(ball_body.position.x <= 5.1 - 1.0 + 0.05);
    }

    #[test]
    fn test_removed_body_is_a_benign_skip() {
        let mut w = world();
        let a = w.add_body(circle_def(Vec2::ZERO, 1.0)).expect("valid");
        let b = w
            .add_body(circle_def(Vec2::new(1.5, 0.0), 1.0))
            .expect("valid");
        w.add_constraint(ConstraintDef {
            body_a: a,
            body_b: b,
            anchor_a: Vec2::ZERO,
            anchor_b: Vec2::ZERO,
            rest_length: Some(5.0),
        })
        .expect("valid");

        assert!(w.remove_body(b));
        assert!(!w.remove_body(b));

        // The dangling constraint and the stale pair are skipped, not
        // errors.
        w.step(1.0 / 60.0);
        assert!(w.body(a).is_some());
        assert!(w.body(b).is_none());
    }

    #[test]
    fn test_contact_filter_vetoes_pairs() {
        let mut w = world();
        let a = w.add_body(circle_def(Vec2::ZERO, 1.0)).expect("valid");
        let b = w
            .add_body(circle_def(Vec2::new(1.5, 0.0), 1.0))
            .expect("valid");
        w.set_contact_filter(|_| false);

        let collisions = Rc::new(RefCell::new(0usize));
        let seen = Rc::clone(&collisions);
        w.add_contact_listener(move |_| {
            *seen.borrow_mut() += 1;
        });

        w.step(1.0 / 60.0);

        // Overlap left unresolved: the filter vetoed the pair.
        assert_eq!(w.body(a).expect("present").position, Vec2::ZERO);
        assert_eq!(
            w.body(b).expect("present").position,
            Vec2::new(1.5, 0.0)
        );
        assert_eq!(*collisions.borrow(), 0);
    }

    #[test]
    fn test_contact_listener_receives_the_manifold() {
        let mut w = world();
        let a = w.add_body(circle_def(Vec2::ZERO, 1.0)).expect("valid");
        let b = w
            .add_body(circle_def(Vec2::new(1.9, 0.0), 1.0))
            .expect("valid");

        let manifolds = Rc::new(RefCell::new(Vec::new()));
        let seen = Rc::clone(&manifolds);
        w.add_contact_listener(move |m| {
            seen.borrow_mut().push(*m);
        });

        w.step(1.0 / 60.0);

        let manifolds = manifolds.borrow();
        assert!(!manifolds.is_empty());
        let m = &manifolds[0];
        assert!(m.collided);
        assert!(ContactPair::new(m.reference, m.incident) == ContactPair::new(a, b));
        assert!((m.normal.length() - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_placement_query_and_time() {
        let mut w = world();
        let mut def = circle_def(Vec2::new(1.0, 1.0), 1.0);
        def.velocity = Vec2::new(2.0, 0.0);
        let id = w.add_body(def).expect("valid");

        w.step(0.25);
        assert!((w.time() - 0.25).abs() < 1e-6);

        let placement = w.placement_at(id, 0.5).expect("present");
        let body = w.body(id).expect("present");
        assert_eq!(placement.position, body.position + Vec2::new(1.0, 0.0));
        assert!(w.placement_at(999, 0.5).is_none());
    }

    #[test]
    fn test_default_rest_length_is_attach_distance() {
        let mut w = world();
        let a = w.add_body(circle_def(Vec2::ZERO, 0.1)).expect("valid");
        let b = w
            .add_body(circle_def(Vec2::new(4.0, 3.0), 0.1))
            .expect("valid");
        let cid = w
            .add_constraint(ConstraintDef {
                body_a: a,
                body_b: b,
                anchor_a: Vec2::ZERO,
                anchor_b: Vec2::ZERO,
                rest_length: None,
            })
            .expect("valid");

        let constraint = w.constraint(cid).expect("present");
        assert!((constraint.rest_length - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_constraint_endpoints_must_exist() {
        let mut w = world();
        let a = w.add_body(circle_def(Vec2::ZERO, 0.1)).expect("valid");
        let err = w
            .add_constraint(ConstraintDef {
                body_a: a,
                body_b: 42,
                anchor_a: Vec2::ZERO,
                anchor_b: Vec2::ZERO,
                rest_length: None,
            })
            .unwrap_err();
        assert!(matches!(err, PhysicsError::MissingBody { id: 42 }));

        let err = w
            .add_constraint(ConstraintDef {
                body_a: a,
                body_b: a,
                anchor_a: Vec2::ZERO,
                anchor_b: Vec2::ZERO,
                rest_length: None,
            })
            .unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidConstraint { .. }));
    }

    #[test]
    fn test_move_body_reregisters_a_static() {
        let mut w = world();
        let ball = w.add_body(circle_def(Vec2::ZERO, 1.0)).expect("valid");
        let block = w
            .add_body(static_rect_def(Vec2::new(100.0, 0.0), 2.0, 2.0))
            .expect("valid");

        w.step(1.0 / 60.0);
        assert_eq!(w.body(ball).expect("present").position, Vec2::ZERO);

        // Drop the block onto the ball; the moved footprint must collide.
        w.move_body(block, Vec2::new(1.5, 0.0), 0.0).expect("present");
        w.step(1.0 / 60.0);

        let ball_body = w.body(ball).expect("present");
        assert!(ball_body.position.x < -0.1);
        assert!(matches!(
            w.move_body(999, Vec2::ZERO, 0.0),
            Err(PhysicsError::MissingBody { id: 999 })
        ));
    }

    #[test]
    fn test_random_pile_stays_finite() {
        let _ = env_logger::builder().is_test(true).try_init();
        let mut w = World::new(WorldDef {
            gravity: 10.0,
            cell_size: 5.0,
            initial_time: 0.0,
        })
        .expect("valid");
        w.add_body(static_rect_def(Vec2::new(0.0, 20.0), 60.0, 4.0))
            .expect("valid");

        let mut rng = rand::rngs::StdRng::seed_from_u64(7);
        for _ in 0..30 {
            let mut def = circle_def(
                Vec2::new(rng.gen_range(-20.0..20.0), rng.gen_range(-10.0..10.0)),
                rng.gen_range(0.3..1.2),
            );
            def.velocity = Vec2::new(rng.gen_range(-3.0..3.0), rng.gen_range(-3.0..3.0));
            def.restitution = rng.gen_range(0.0..0.5);
            w.add_body(def).expect("valid");
        }

        for _ in 0..60 {
            w.step(1.0 / 60.0);
        }

        assert!((w.time() - 1.0).abs() < 1e-4);
        for (_, body) in w.bodies() {
            assert!(body.position.is_finite());
            assert!(body.velocity.is_finite());
            assert!(body.angle.is_finite());
        }
    }
}
