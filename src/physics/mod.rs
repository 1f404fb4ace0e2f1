//! Deterministic physics module
//!
//! Everything that moves bodies lives here. This module must stay deterministic:
//! - Fixed timestep only
//! - Stable pair order (by body id)
//! - No rendering, audio or platform dependencies

pub mod body;
pub mod collision;
pub mod engine;
pub mod spatial_hash;

pub use body::{Aabb, BodyConfig, BodyKey, RigidBody, Shape, Transform};
pub use collision::{Manifold, check_collision, resolve_collision};
pub use engine::{CollisionContext, CollisionEvent, PhysicsEngine};
pub use spatial_hash::SpatialHash;
