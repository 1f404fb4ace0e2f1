//! Rigid body state and mass properties
//!
//! A body is either a circle or an axis-aligned rectangle. Mass comes from the
//! config or from `density × area`; inertia is always derived from mass and shape.

use serde::{Deserialize, Serialize};

use crate::consts::*;
use crate::{Vector2, cross, cross_scalar};

slotmap::new_key_type! {
    /// Generation-checked handle to a body owned by the engine
    pub struct BodyKey;
}

/// Collision shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Shape {
    Circle { radius: f32 },
    /// Axis-aligned rectangle centered on the body position
    Rectangle { width: f32, height: f32 },
}

impl Shape {
    pub fn circle(radius: f32) -> Self {
        Shape::Circle { radius }
    }

    pub fn rectangle(width: f32, height: f32) -> Self {
        Shape::Rectangle { width, height }
    }

    pub fn area(&self) -> f32 {
        match *self {
            Shape::Circle { radius } => std::f32::consts::PI * radius * radius,
            Shape::Rectangle { width, height } => width * height,
        }
    }

    /// Moment of inertia about the centroid for the given mass
    pub fn inertia(&self, mass: f32) -> f32 {
        match *self {
            Shape::Circle { radius } => 0.5 * mass * radius * radius,
            Shape::Rectangle { width, height } => mass * (width * width + height * height) / 12.0,
        }
    }

    /// Half extents of the bounding box
    pub fn half_extents(&self) -> Vector2 {
        match *self {
            Shape::Circle { radius } => Vector2::splat(radius),
            Shape::Rectangle { width, height } => Vector2::new(width / 2.0, height / 2.0),
        }
    }
}

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Aabb {
    pub min: Vector2,
    pub max: Vector2,
}

impl Aabb {
    pub fn from_center(center: Vector2, half_extents: Vector2) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    pub fn contains(&self, point: Vector2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Closest point inside the box to `point`
    #[inline]
    pub fn closest_point(&self, point: Vector2) -> Vector2 {
        point.clamp(self.min, self.max)
    }
}

/// Position and angle, as handed to a renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vector2,
    pub angle: f32,
}

/// Construction options for a body
///
/// Unset `mass` means `density × area`; unset `density` means [`DEFAULT_DENSITY`].
/// Values are not validated: non-positive mass or dimensions are undefined behavior.
#[derive(Debug, Clone)]
pub struct BodyConfig<M = ()> {
    pub mass: Option<f32>,
    pub density: Option<f32>,
    pub restitution: f32,
    pub friction: f32,
    /// Per-step multiplicative velocity damping ("air friction")
    pub linear_drag: f32,
    pub is_static: bool,
    pub is_sensor: bool,
    pub label: String,
    pub metadata: M,
    /// Bodies sharing the same negative group never collide
    pub collision_group: i32,
}

impl<M: Default> Default for BodyConfig<M> {
    fn default() -> Self {
        Self::with_metadata(M::default())
    }
}

impl<M> BodyConfig<M> {
    pub fn with_metadata(metadata: M) -> Self {
        Self {
            mass: None,
            density: None,
            restitution: DEFAULT_RESTITUTION,
            friction: DEFAULT_FRICTION,
            linear_drag: DEFAULT_LINEAR_DRAG,
            is_static: false,
            is_sensor: false,
            label: String::new(),
            metadata,
            collision_group: 0,
        }
    }

    pub fn mass(mut self, mass: f32) -> Self {
        self.mass = Some(mass);
        self
    }

    pub fn density(mut self, density: f32) -> Self {
        self.density = Some(density);
        self
    }

    pub fn restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    pub fn friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn linear_drag(mut self, linear_drag: f32) -> Self {
        self.linear_drag = linear_drag;
        self
    }

    pub fn fixed(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn sensor(mut self) -> Self {
        self.is_sensor = true;
        self
    }

    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn collision_group(mut self, group: i32) -> Self {
        self.collision_group = group;
        self
    }
}

/// A simulated body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RigidBody<M = ()> {
    pub(crate) id: u32,
    pub shape: Shape,

    pub position: Vector2,
    pub velocity: Vector2,
    pub angle: f32,
    pub angular_velocity: f32,

    pub(crate) mass: f32,
    pub(crate) inv_mass: f32,
    pub(crate) inertia: f32,
    pub(crate) inv_inertia: f32,

    pub restitution: f32,
    pub friction: f32,
    pub linear_drag: f32,

    pub(crate) is_static: bool,
    pub is_sensor: bool,
    pub label: String,
    /// Caller-owned payload, never read by the physics
    pub metadata: M,
    pub collision_group: i32,

    /// Transform at the start of the last step (interpolation source)
    pub(crate) previous_position: Vector2,
    pub(crate) previous_angle: f32,
}

impl<M> RigidBody<M> {
    /// Build a body. The id stays 0 until the engine assigns one.
    pub fn new(shape: Shape, position: Vector2, config: BodyConfig<M>) -> Self {
        let mass = config
            .mass
            .unwrap_or_else(|| config.density.unwrap_or(DEFAULT_DENSITY) * shape.area());
        let inertia = shape.inertia(mass);

        let (inv_mass, inv_inertia) = if config.is_static {
            (0.0, 0.0)
        } else {
            (1.0 / mass, 1.0 / inertia)
        };

        Self {
            id: 0,
            shape,
            position,
            velocity: Vector2::ZERO,
            angle: 0.0,
            angular_velocity: 0.0,
            mass,
            inv_mass,
            inertia,
            inv_inertia,
            restitution: config.restitution,
            friction: config.friction,
            linear_drag: config.linear_drag,
            is_static: config.is_static,
            is_sensor: config.is_sensor,
            label: config.label,
            metadata: config.metadata,
            collision_group: config.collision_group,
            previous_position: position,
            previous_angle: 0.0,
        }
    }

    /// Engine-assigned id, strictly increasing in insertion order
    pub fn id(&self) -> u32 {
        self.id
    }

    pub fn mass(&self) -> f32 {
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

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn area(&self) -> f32 {
        self.shape.area()
    }

    /// Add `force / mass` to velocity as an instantaneous contribution
    pub fn apply_force(&mut self, force: Vector2) {
        if self.is_static {
            return;
        }
        self.velocity += force * self.inv_mass;
    }

    /// Apply an impulse, optionally at a world-space contact point (adds spin)
    pub fn apply_impulse(&mut self, impulse: Vector2, contact_point: Option<Vector2>) {
        if self.is_static {
            return;
        }
        self.velocity += impulse * self.inv_mass;

        if let Some(point) = contact_point {
            let torque = cross(point - self.position, impulse);
            self.angular_velocity += torque * self.inv_inertia;
        }
    }

    /// Velocity of the material point at `point`, including rotation
    pub fn point_velocity(&self, point: Vector2) -> Vector2 {
        if self.is_static {
            return Vector2::ZERO;
        }
        self.velocity + cross_scalar(self.angular_velocity, point - self.position)
    }

    /// Point test. Rectangles ignore their angle.
    pub fn contains_point(&self, point: Vector2) -> bool {
        match self.shape {
            Shape::Circle { radius } => (point - self.position).length_squared() <= radius * radius,
            Shape::Rectangle { .. } => self.aabb().contains(point),
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_center(self.position, self.shape.half_extents())
    }

    /// Whether the broad phase should ever pair these two bodies
    pub fn can_collide_with<N>(&self, other: &RigidBody<N>) -> bool {
        if self.is_static && other.is_static {
            return false;
        }
        !(self.collision_group < 0 && self.collision_group == other.collision_group)
    }

    pub fn set_velocity(&mut self, velocity: Vector2) {
        if !self.is_static {
            self.velocity = velocity;
        }
    }

    /// Teleport without interpolating across the jump
    pub fn set_position(&mut self, position: Vector2) {
        self.position = position;
        self.previous_position = position;
    }

    pub(crate) fn snapshot(&mut self) {
        self.previous_position = self.position;
        self.previous_angle = self.angle;
    }

    /// Semi-implicit Euler: velocity first, then position from the new velocity
    pub(crate) fn integrate(&mut self, gravity: Vector2, dt: f32) {
        if self.is_static {
            return;
        }
        self.velocity += gravity * dt;
        let damping = 1.0 - self.linear_drag;
        self.velocity *= damping;
        self.angular_velocity *= damping;

        self.position += self.velocity * dt;
        self.angle += self.angular_velocity * dt;
    }

    pub fn previous_transform(&self) -> Transform {
        Transform {
            position: self.previous_position,
            angle: self.previous_angle,
        }
    }

    pub fn transform(&self) -> Transform {
        Transform {
            position: self.position,
            angle: self.angle,
        }
    }

    pub fn interpolated_position(&self, alpha: f32) -> Vector2 {
        self.previous_position.lerp(self.position, alpha)
    }

    pub fn interpolated_angle(&self, alpha: f32) -> f32 {
        self.previous_angle + (self.angle - self.previous_angle) * alpha
    }

    pub fn interpolated_transform(&self, alpha: f32) -> Transform {
        Transform {
            position: self.interpolated_position(alpha),
            angle: self.interpolated_angle(alpha),
        }
    }
}
