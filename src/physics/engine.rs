//! Fixed timestep physics engine
//!
//! Owns every body, advances them in fixed-size steps and runs the collision
//! pipeline at the end of each step:
//! broad phase -> narrow phase -> notification -> resolution.

use slotmap::SlotMap;

use super::body::{BodyConfig, BodyKey, RigidBody, Shape, Transform};
use super::collision::{Manifold, check_collision, resolve_collision};
use super::spatial_hash::SpatialHash;
use crate::Vector2;
use crate::config::EngineConfig;

/// A collision recorded during the latest `update` or `step` call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CollisionEvent {
    pub a: BodyKey,
    pub b: BodyKey,
    pub id_a: u32,
    pub id_b: u32,
    pub manifold: Manifold,
    /// Relative velocity of B w.r.t. A along the normal, before resolution.
    /// Negative means approaching; its magnitude is the impact speed.
    pub normal_speed: f32,
}

/// What a collision observer sees for one colliding pair
///
/// Bodies are shared borrows with pre-impact velocities. Removal requests take
/// effect right after notification, and the pair is then left unresolved.
pub struct CollisionContext<'a, M> {
    pub key_a: BodyKey,
    pub key_b: BodyKey,
    pub a: &'a RigidBody<M>,
    pub b: &'a RigidBody<M>,
    pub manifold: &'a Manifold,
    removals: &'a mut Vec<BodyKey>,
}

impl<M> CollisionContext<'_, M> {
    /// Remove a body from the engine once notification for this pair finishes
    pub fn remove(&mut self, key: BodyKey) {
        if !self.removals.contains(&key) {
            self.removals.push(key);
        }
    }

    /// Pre-impact approach speed along the normal (positive when closing)
    pub fn impact_speed(&self) -> f32 {
        let p = self.manifold.contact_point;
        let relative = self.b.point_velocity(p) - self.a.point_velocity(p);
        (-relative.dot(self.manifold.normal)).max(0.0)
    }
}

type CollisionCallback<M> = Box<dyn FnMut(&mut CollisionContext<'_, M>)>;

/// The simulation
pub struct PhysicsEngine<M = ()> {
    bodies: SlotMap<BodyKey, RigidBody<M>>,
    spatial_hash: SpatialHash,
    observers: Vec<CollisionCallback<M>>,
    events: Vec<CollisionEvent>,
    pending_removals: Vec<BodyKey>,
    gravity: Vector2,
    fixed_dt: f32,
    max_substeps: u32,
    accumulator: f32,
    next_id: u32,
    step_count: u64,
}

impl<M> Default for PhysicsEngine<M> {
    fn default() -> Self {
        Self::with_config(EngineConfig::default())
    }
}

impl<M> PhysicsEngine<M> {
    pub fn new(gravity: Vector2, fixed_delta_time: f32) -> Self {
        Self::with_config(EngineConfig::new(gravity, fixed_delta_time))
    }

    pub fn with_config(config: EngineConfig) -> Self {
        log::debug!(
            "Physics engine: gravity {:?}, dt {:.5}s, max {} substeps, cell {}",
            config.gravity,
            config.fixed_delta_time,
            config.max_substeps,
            config.cell_size
        );
        Self {
            bodies: SlotMap::with_key(),
            spatial_hash: SpatialHash::new(config.cell_size),
            observers: Vec::new(),
            events: Vec::new(),
            pending_removals: Vec::new(),
            gravity: config.gravity,
            fixed_dt: config.fixed_delta_time,
            max_substeps: config.max_substeps,
            accumulator: 0.0,
            next_id: 1,
            step_count: 0,
        }
    }

    // ====== Body management ======

    /// Build a body and add it, returning its handle
    pub fn add_body(&mut self, shape: Shape, position: Vector2, config: BodyConfig<M>) -> BodyKey {
        self.insert_body(RigidBody::new(shape, position, config))
    }

    /// Add a caller-built body. Its id is (re)assigned here.
    pub fn insert_body(&mut self, mut body: RigidBody<M>) -> BodyKey {
        body.id = self.next_id;
        self.next_id += 1;
        log::debug!("Added body {} ({:?}, label {:?})", body.id, body.shape, body.label);
        self.bodies.insert(body)
    }

    /// Remove a body. Its handle never resolves again.
    pub fn remove_body(&mut self, key: BodyKey) -> Option<RigidBody<M>> {
        let body = self.bodies.remove(key)?;
        log::debug!("Removed body {}", body.id);
        Some(body)
    }

    /// Drop all bodies and queued events, reset the accumulator
    ///
    /// Observers stay registered and ids keep increasing.
    pub fn clear(&mut self) {
        log::debug!("Clearing {} bodies", self.bodies.len());
        self.bodies.clear();
        self.events.clear();
        self.pending_removals.clear();
        self.spatial_hash.clear();
        self.accumulator = 0.0;
    }

    pub fn body(&self, key: BodyKey) -> Option<&RigidBody<M>> {
        self.bodies.get(key)
    }

    pub fn body_mut(&mut self, key: BodyKey) -> Option<&mut RigidBody<M>> {
        self.bodies.get_mut(key)
    }

    pub fn contains(&self, key: BodyKey) -> bool {
        self.bodies.contains_key(key)
    }

    pub fn bodies(&self) -> impl Iterator<Item = (BodyKey, &RigidBody<M>)> {
        self.bodies.iter()
    }

    pub fn body_count(&self) -> usize {
        self.bodies.len()
    }

    // ====== Observers ======

    /// Register a collision observer. Observers run in registration order.
    pub fn on_collision<F>(&mut self, callback: F)
    where
        F: FnMut(&mut CollisionContext<'_, M>) + 'static,
    {
        self.observers.push(Box::new(callback));
    }

    /// Take the collisions recorded by the latest `update` or `step` call
    ///
    /// The queue is reset at the start of every `update` and `step`, so it
    /// never holds more than one call's worth of events. Undrained events are
    /// dropped.
    pub fn drain_collision_events(&mut self) -> Vec<CollisionEvent> {
        std::mem::take(&mut self.events)
    }

    // ====== Parameters ======

    pub fn gravity(&self) -> Vector2 {
        self.gravity
    }

    pub fn set_gravity(&mut self, gravity: Vector2) {
        self.gravity = gravity;
    }

    pub fn fixed_delta_time(&self) -> f32 {
        self.fixed_dt
    }

    pub fn max_substeps(&self) -> u32 {
        self.max_substeps
    }

    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }

    /// Fraction of a step left in the accumulator
    pub fn alpha(&self) -> f32 {
        self.accumulator / self.fixed_dt
    }

    /// Total fixed steps executed
    pub fn step_count(&self) -> u64 {
        self.step_count
    }

    /// Render transform between the last two steps
    pub fn interpolated_transform(&self, key: BodyKey, alpha: f32) -> Option<Transform> {
        self.bodies.get(key).map(|b| b.interpolated_transform(alpha))
    }

    // ====== Simulation ======

    /// Feed elapsed wall-clock time and run as many fixed steps as it covers
    ///
    /// At most `max_substeps` steps run per call; whole steps still buffered
    /// after that are discarded. Returns the interpolation alpha in `[0, 1)`.
    /// Collision events from every substep of this call are queued.
    pub fn update(&mut self, frame_dt: f32) -> f32 {
        self.events.clear();
        self.accumulator += frame_dt.max(0.0);

        let mut substeps = 0;
        while self.accumulator >= self.fixed_dt && substeps < self.max_substeps {
            self.advance(self.fixed_dt);
            self.accumulator -= self.fixed_dt;
            substeps += 1;
        }

        if self.accumulator >= self.fixed_dt {
            let dropped = (self.accumulator / self.fixed_dt).floor();
            log::warn!(
                "Substep ceiling ({}) hit, dropping {} buffered steps",
                self.max_substeps,
                dropped
            );
            self.accumulator %= self.fixed_dt;
        }

        self.alpha()
    }

    /// Advance exactly one step of `dt` seconds
    pub fn step(&mut self, dt: f32) {
        self.events.clear();
        self.advance(dt);
    }

    fn advance(&mut self, dt: f32) {
        let gravity = self.gravity;
        for body in self.bodies.values_mut() {
            body.snapshot();
            body.integrate(gravity, dt);
        }

        self.handle_collisions();
        self.step_count += 1;
    }

    fn handle_collisions(&mut self) {
        let bodies = &self.bodies;
        let pairs = self
            .spatial_hash
            .potential_pairs(bodies.iter(), |key| bodies.get(key));
        log::trace!("Step {}: {} candidate pairs", self.step_count, pairs.len());

        for (key_a, key_b) in pairs {
            // Either body may have been removed by an earlier observer
            let (Some(a), Some(b)) = (self.bodies.get(key_a), self.bodies.get(key_b)) else {
                continue;
            };
            let Some(manifold) = check_collision(a, b) else {
                continue;
            };

            let contact = manifold.contact_point;
            let normal_speed =
                (b.point_velocity(contact) - a.point_velocity(contact)).dot(manifold.normal);
            self.events.push(CollisionEvent {
                a: key_a,
                b: key_b,
                id_a: a.id,
                id_b: b.id,
                manifold,
                normal_speed,
            });

            let mut ctx = CollisionContext {
                key_a,
                key_b,
                a,
                b,
                manifold: &manifold,
                removals: &mut self.pending_removals,
            };
            for observer in &mut self.observers {
                observer(&mut ctx);
            }

            if !self.pending_removals.is_empty() && self.apply_removals(key_a, key_b) {
                continue;
            }

            if let Some([a, b]) = self.bodies.get_disjoint_mut([key_a, key_b]) {
                resolve_collision(a, b, &manifold);
            }
        }
    }

    /// Remove bodies requested by observers; true if the current pair lost a member
    fn apply_removals(&mut self, key_a: BodyKey, key_b: BodyKey) -> bool {
        let mut pair_hit = false;
        for key in std::mem::take(&mut self.pending_removals) {
            pair_hit |= key == key_a || key == key_b;
            if let Some(body) = self.bodies.remove(key) {
                log::debug!("Removed body {} during collision notification", body.id);
            }
        }
        pair_hit
    }
}
