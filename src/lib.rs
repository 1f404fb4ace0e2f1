//! Plinko Physics - A deterministic 2D rigid-body engine
//!
//! Core modules:
//! - `physics`: Bodies, broad phase, narrow phase, impulse solver and the fixed-step engine
//! - `config`: Data-driven engine configuration (JSON)
//! - `error`: Errors for the fallible configuration surface
//!
//! Rendering, audio and scoring live outside this crate. They read interpolated
//! transforms and collision notifications from [`PhysicsEngine`].

pub mod config;
pub mod error;
pub mod physics;

pub use config::EngineConfig;
pub use error::ConfigError;
pub use physics::{
    Aabb, BodyConfig, BodyKey, CollisionContext, CollisionEvent, Manifold, PhysicsEngine,
    RigidBody, Shape, SpatialHash, Transform, check_collision, resolve_collision,
};

/// 2D vector value type used throughout the engine.
///
/// `Copy`, immutable by convention: every operation returns a new value.
/// `normalize_or_zero` is the normalization used by the solver (zero in, zero out)
/// and `perp` is the 90° counter-clockwise rotation `(-y, x)`.
pub type Vector2 = glam::Vec2;

/// Engine configuration constants
pub mod consts {
    /// Default fixed simulation timestep (60 Hz)
    pub const FIXED_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per `update` call to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 5;
    /// Default downward gravity (units/s², +y is down)
    pub const GRAVITY_Y: f32 = 980.0;

    /// Broad-phase grid cell size, close to typical body size
    pub const CELL_SIZE: f32 = 50.0;

    /// Material defaults
    pub const DEFAULT_DENSITY: f32 = 0.001;
    pub const DEFAULT_RESTITUTION: f32 = 0.5;
    pub const DEFAULT_FRICTION: f32 = 0.1;
    pub const DEFAULT_LINEAR_DRAG: f32 = 0.0;
}

/// Distance between two points
#[inline]
pub fn distance(a: Vector2, b: Vector2) -> f32 {
    (b - a).length()
}

/// 2D cross product (z component of the 3D cross product)
#[inline]
pub fn cross(a: Vector2, b: Vector2) -> f32 {
    a.x * b.y - a.y * b.x
}

/// Cross product of a scalar angular velocity with a vector: ω × r
#[inline]
pub fn cross_scalar(w: f32, r: Vector2) -> Vector2 {
    Vector2::new(-w * r.y, w * r.x)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vector_basics() {
        let a = Vector2::new(3.0, 4.0);
        let b = Vector2::new(1.0, -2.0);

        assert_eq!(a + b, Vector2::new(4.0, 2.0));
        assert_eq!(a - b, Vector2::new(2.0, 6.0));
        assert_eq!(a * 2.0, Vector2::new(6.0, 8.0));
        assert!((a.dot(b) - (-5.0)).abs() < 1e-6);
        assert!((a.length() - 5.0).abs() < 1e-6);
        assert!((a.length_squared() - 25.0).abs() < 1e-6);
        assert!((distance(a, b) - (4.0f32 + 36.0).sqrt()).abs() < 1e-5);
    }

    #[test]
    fn test_normalize_zero_is_zero() {
        assert_eq!(Vector2::ZERO.normalize_or_zero(), Vector2::ZERO);
        let n = Vector2::new(0.0, -7.0).normalize_or_zero();
        assert!((n - Vector2::new(0.0, -1.0)).length() < 1e-6);
    }

    #[test]
    fn test_perp_and_cross() {
        let v = Vector2::new(1.0, 0.0);
        assert_eq!(v.perp(), Vector2::new(0.0, 1.0));
        assert!((cross(Vector2::X, Vector2::Y) - 1.0).abs() < 1e-6);
        assert!((cross(Vector2::Y, Vector2::X) + 1.0).abs() < 1e-6);

        // Spinning counter-clockwise, a point on +x moves toward +y
        let v = cross_scalar(2.0, Vector2::new(3.0, 0.0));
        assert!((v - Vector2::new(0.0, 6.0)).length() < 1e-6);
    }
}
