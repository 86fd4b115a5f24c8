//! Impulse-based contact resolution.
//!
//! One pipeline with two independent stages: a normal-impulse stage and a
//! Coulomb friction stage. [`ResolverMode`] selects which stages run, from a
//! purely linear bounce up to the full rotation-and-friction solver used by
//! the world.

use crate::collision::manifold::CollisionManifold;
use crate::math::vec2::Vec2;
use crate::objects::rigid_body::RigidBody;

/// Tangential velocities below this threshold produce no friction impulse.
const FRICTION_VELOCITY_EPSILON: f64 = 0.05;

/// Escalation levels of the impulse pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolverMode {
    /// A single normal impulse through the centers of mass; no angular terms.
    Linear,
    /// Per-contact normal impulses with lever arms and torque updates.
    Rotation,
    /// Normal impulses followed by a friction pass clamped per contact.
    RotationFriction,
}

/// Applies velocity-correcting impulses for one colliding pair. Static bodies
/// are never mutated.
pub fn resolve(
    a: &mut RigidBody,
    b: &mut RigidBody,
    manifold: &CollisionManifold,
    mode: ResolverMode,
) {
    match mode {
        ResolverMode::Linear => resolve_linear(a, b, manifold),
        ResolverMode::Rotation => {
            normal_impulse_stage(a, b, manifold);
        }
        ResolverMode::RotationFriction => {
            let normal_magnitudes = normal_impulse_stage(a, b, manifold);
            friction_stage(a, b, manifold, &normal_magnitudes);
        }
    }
}

/// Combined coefficient for a pair: the arithmetic mean.
fn combine(a: f64, b: f64) -> f64 {
    (a + b) / 2.0
}

fn resolve_linear(a: &mut RigidBody, b: &mut RigidBody, manifold: &CollisionManifold) {
    let restitution = combine(a.restitution(), b.restitution());
    let relative_velocity = b.velocity() - a.velocity();
    let contact_velocity = relative_velocity.dot(manifold.normal);

    // Bodies already separating; adding an impulse would inject energy.
    if contact_velocity > 0.0 {
        return;
    }

    let inv_mass_sum = a.inv_mass() + b.inv_mass();
    if inv_mass_sum == 0.0 {
        return;
    }

    let j = -(1.0 + restitution) * contact_velocity / inv_mass_sum;
    apply_impulse(a, b, manifold.normal * j, Vec2::ZERO, Vec2::ZERO);
}

/// Computes and applies the normal impulses for every contact point, each
/// carrying `1/contact_count` of the pair's impulse budget. Returns the
/// per-contact impulse magnitudes for the friction stage.
fn normal_impulse_stage(
    a: &mut RigidBody,
    b: &mut RigidBody,
    manifold: &CollisionManifold,
) -> [f64; 2] {
    let restitution = combine(a.restitution(), b.restitution());
    let contact_count = manifold.contact_count();

    let mut magnitudes = [0.0; 2];
    let mut impulses = [Vec2::ZERO; 2];
    let mut levers = [(Vec2::ZERO, Vec2::ZERO); 2];

    // All impulses are computed against the pre-impulse velocities, then
    // applied in a second pass.
    for (i, contact) in manifold.contacts().enumerate() {
        let ra = contact - a.position();
        let rb = contact - b.position();
        levers[i] = (ra, rb);

        let ra_perp = ra.perpendicular();
        let rb_perp = rb.perpendicular();
        let relative_velocity = (b.velocity() + rb_perp * b.angular_velocity())
            - (a.velocity() + ra_perp * a.angular_velocity());
        let contact_velocity = relative_velocity.dot(manifold.normal);
        if contact_velocity > 0.0 {
            continue;
        }

        let ra_perp_n = ra_perp.dot(manifold.normal);
        let rb_perp_n = rb_perp.dot(manifold.normal);
        let denom = a.inv_mass()
            + b.inv_mass()
            + ra_perp_n * ra_perp_n * a.inv_inertia()
            + rb_perp_n * rb_perp_n * b.inv_inertia();
        let j = -(1.0 + restitution) * contact_velocity / denom / contact_count as f64;

        magnitudes[i] = j;
        impulses[i] = manifold.normal * j;
    }

    for i in 0..contact_count {
        let (ra, rb) = levers[i];
        apply_impulse(a, b, impulses[i], ra, rb);
    }

    magnitudes
}

/// Recomputes the post-normal-impulse tangential velocities and applies
/// friction impulses, clamped against each contact's normal magnitude:
/// within the static-friction cone the tangential impulse is used as-is,
/// beyond it the contact slides with dynamic friction.
fn friction_stage(
    a: &mut RigidBody,
    b: &mut RigidBody,
    manifold: &CollisionManifold,
    normal_magnitudes: &[f64; 2],
) {
    let static_friction = combine(a.static_friction(), b.static_friction());
    let dynamic_friction = combine(a.dynamic_friction(), b.dynamic_friction());
    let contact_count = manifold.contact_count();

    let mut impulses = [Vec2::ZERO; 2];
    let mut levers = [(Vec2::ZERO, Vec2::ZERO); 2];

    for (i, contact) in manifold.contacts().enumerate() {
        let ra = contact - a.position();
        let rb = contact - b.position();
        levers[i] = (ra, rb);

        let ra_perp = ra.perpendicular();
        let rb_perp = rb.perpendicular();
        let relative_velocity = (b.velocity() + rb_perp * b.angular_velocity())
            - (a.velocity() + ra_perp * a.angular_velocity());

        let tangent =
            relative_velocity - manifold.normal * relative_velocity.dot(manifold.normal);
        if tangent.magnitude() < FRICTION_VELOCITY_EPSILON {
            continue;
        }
        let tangent = tangent.normalize();

        let ra_perp_t = ra_perp.dot(tangent);
        let rb_perp_t = rb_perp.dot(tangent);
        let denom = a.inv_mass()
            + b.inv_mass()
            + ra_perp_t * ra_perp_t * a.inv_inertia()
            + rb_perp_t * rb_perp_t * b.inv_inertia();
        let jt = -relative_velocity.dot(tangent) / denom / contact_count as f64;

        let j = normal_magnitudes[i];
        impulses[i] = if jt.abs() <= j * static_friction {
            tangent * jt
        } else {
            tangent * (-j * dynamic_friction)
        };
    }

    for i in 0..contact_count {
        let (ra, rb) = levers[i];
        apply_impulse(a, b, impulses[i], ra, rb);
    }
}

/// Applies an impulse pair symmetrically: subtracted from A, added to B, with
/// the torque from the lever-arm cross product. Static bodies are skipped.
fn apply_impulse(a: &mut RigidBody, b: &mut RigidBody, impulse: Vec2, ra: Vec2, rb: Vec2) {
    if !a.is_static() {
        a.set_velocity(a.velocity() - impulse * a.inv_mass());
        a.set_angular_velocity(a.angular_velocity() - ra.cross(impulse) * a.inv_inertia());
    }
    if !b.is_static() {
        b.set_velocity(b.velocity() + impulse * b.inv_mass());
        b.set_angular_velocity(b.angular_velocity() + rb.cross(impulse) * b.inv_inertia());
    }
}
