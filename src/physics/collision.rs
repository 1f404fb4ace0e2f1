//! Narrow phase and impulse resolution
//!
//! Contact normals always point from body A toward body B. Resolution pushes the
//! pair apart by inverse-mass share, then applies a restitution impulse and a
//! Coulomb-clamped friction impulse at the contact point.

use serde::{Deserialize, Serialize};

use super::body::{RigidBody, Shape};
use crate::Vector2;

/// Normal used when two circle centers coincide
const DEFAULT_CIRCLE_NORMAL: Vector2 = Vector2::X;
/// Rectangle-to-circle normal used when the circle center is inside the bounds
const DEFAULT_RECT_NORMAL: Vector2 = Vector2::NEG_Y;

/// Contact details for an overlapping pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Manifold {
    /// Unit normal from A toward B
    pub normal: Vector2,
    /// Overlap depth along the normal
    pub penetration: f32,
    /// World-space contact point
    pub contact_point: Vector2,
}

impl Manifold {
    fn flipped(self) -> Self {
        Self {
            normal: -self.normal,
            ..self
        }
    }
}

/// Exact overlap test between two bodies
///
/// Circle/circle and circle/rectangle are supported; any other pairing reports
/// no collision. Rectangles are tested by their axis-aligned bounds.
pub fn check_collision<M, N>(a: &RigidBody<M>, b: &RigidBody<N>) -> Option<Manifold> {
    match (a.shape, b.shape) {
        (Shape::Circle { radius: ra }, Shape::Circle { radius: rb }) => {
            circle_circle(a.position, ra, b.position, rb)
        }
        (Shape::Circle { radius }, Shape::Rectangle { .. }) => {
            // Computed rectangle -> circle, so flip to keep A -> B
            circle_rect(a.position, radius, b).map(Manifold::flipped)
        }
        (Shape::Rectangle { .. }, Shape::Circle { radius }) => circle_rect(b.position, radius, a),
        _ => None,
    }
}

fn circle_circle(pa: Vector2, ra: f32, pb: Vector2, rb: f32) -> Option<Manifold> {
    let delta = pb - pa;
    let dist_sq = delta.length_squared();
    let radii = ra + rb;

    if dist_sq >= radii * radii {
        return None;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > f32::EPSILON {
        delta / dist
    } else {
        DEFAULT_CIRCLE_NORMAL
    };

    Some(Manifold {
        normal,
        penetration: radii - dist,
        contact_point: pa + normal * ra,
    })
}

/// Circle against a rectangle's bounds; the normal points rectangle -> circle
fn circle_rect<M>(center: Vector2, radius: f32, rect: &RigidBody<M>) -> Option<Manifold> {
    let closest = rect.aabb().closest_point(center);
    let delta = center - closest;
    let dist_sq = delta.length_squared();

    if dist_sq >= radius * radius {
        return None;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > f32::EPSILON {
        delta / dist
    } else {
        DEFAULT_RECT_NORMAL
    };

    Some(Manifold {
        normal,
        penetration: radius - dist,
        contact_point: closest,
    })
}

/// Resolve a detected collision in place
///
/// Sensors are never resolved. Pairs already separating along the normal only
/// get positional correction.
pub fn resolve_collision<M, N>(a: &mut RigidBody<M>, b: &mut RigidBody<N>, manifold: &Manifold) {
    if a.is_sensor || b.is_sensor {
        return;
    }

    let inv_mass_sum = a.inv_mass() + b.inv_mass();
    if inv_mass_sum <= 0.0 {
        return;
    }

    let normal = manifold.normal;
    let contact = manifold.contact_point;

    // Positional correction: heavier body moves less, no slop
    if manifold.penetration > 0.0 {
        let correction = normal * (manifold.penetration / inv_mass_sum);
        if !a.is_static() {
            a.position -= correction * a.inv_mass();
        }
        if !b.is_static() {
            b.position += correction * b.inv_mass();
        }
    }

    let relative = b.point_velocity(contact) - a.point_velocity(contact);
    let normal_speed = relative.dot(normal);
    if normal_speed >= 0.0 {
        return;
    }

    let restitution = a.restitution.min(b.restitution);
    let j = -(1.0 + restitution) * normal_speed / inv_mass_sum;
    let impulse = normal * j;
    a.apply_impulse(-impulse, Some(contact));
    b.apply_impulse(impulse, Some(contact));

    // Friction against the post-impulse tangential velocity
    let tangent = normal.perp();
    let relative = b.point_velocity(contact) - a.point_velocity(contact);
    let tangent_speed = relative.dot(tangent);

    let mu = (a.friction + b.friction) * 0.5;
    let max_friction = (mu * j).max(0.0);
    let jt = (-tangent_speed / inv_mass_sum).clamp(-max_friction, max_friction);

    let friction_impulse = tangent * jt;
    a.apply_impulse(-friction_impulse, Some(contact));
    b.apply_impulse(friction_impulse, Some(contact));
}
