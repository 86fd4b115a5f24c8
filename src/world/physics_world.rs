use log::trace;

use crate::collision::{detection, resolver, CollisionManifold, ResolverMode};
use crate::constraints::Spring;
use crate::error::StepError;
use crate::math::vec2::Vec2;
use crate::objects::rigid_body::RigidBody;

/// World units are pixels; 20 pixels correspond to one meter.
const PIXELS_PER_METER: f64 = 20.0;

/// Owns the simulated bodies and springs and drives the per-step pipeline:
/// apply forces, integrate, broad-phase AABB culling, narrow-phase collision
/// and impulse resolution.
pub struct PhysicsWorld {
    bodies: Vec<RigidBody>,
    springs: Vec<Spring>,
    pub gravity: Vec2,
    // Scratch buffer of AABB-overlapping index pairs, reused across sub-steps.
    contact_pairs: Vec<(usize, usize)>,
}

impl PhysicsWorld {
    /// Quadratic drag coefficient applied to linear and angular velocity.
    const AIR_RESISTANCE: f64 = 0.0005;
    const MIN_SUB_ITERATIONS: u32 = 1;
    const MAX_SUB_ITERATIONS: u32 = 64;

    /// Creates an empty world with downward gravity (y grows downward).
    pub fn new() -> Self {
        Self {
            bodies: Vec::new(),
            springs: Vec::new(),
            gravity: Vec2::new(0.0, 9.81 * PIXELS_PER_METER),
            contact_pairs: Vec::new(),
        }
    }

    /// Adds a rigid body and returns its index. Insertion order is simulation
    /// order.
    pub fn add_body(&mut self, body: RigidBody) -> usize {
        let index = self.bodies.len();
        self.bodies.push(body);
        index
    }

    pub fn add_spring(&mut self, spring: Spring) {
        self.springs.push(spring);
    }

    pub fn bodies(&self) -> &[RigidBody] {
        &self.bodies
    }

    pub fn body(&self, index: usize) -> &RigidBody {
        &self.bodies[index]
    }

    pub fn body_mut(&mut self, index: usize) -> &mut RigidBody {
        &mut self.bodies[index]
    }

    pub fn springs(&self) -> &[Spring] {
        &self.springs
    }

    /// Advances the simulation by `dt` seconds, subdivided into
    /// `sub_iterations` equal sub-steps for solver stability.
    ///
    /// Fails without touching any body if `sub_iterations` is outside
    /// `[1, 64]`.
    pub fn step(&mut self, dt: f64, sub_iterations: u32) -> Result<(), StepError> {
        if !(Self::MIN_SUB_ITERATIONS..=Self::MAX_SUB_ITERATIONS).contains(&sub_iterations) {
            return Err(StepError::SubIterationsOutOfRange(sub_iterations));
        }

        let sub_dt = dt / sub_iterations as f64;
        for _ in 0..sub_iterations {
            self.contact_pairs.clear();
            self.broad_phase(sub_dt);
            self.narrow_phase();
        }
        Ok(())
    }

    /// Applies forces, integrates every body and collects AABB-overlapping
    /// candidate pairs in index order.
    fn broad_phase(&mut self, dt: f64) {
        for body in self.bodies.iter_mut() {
            if body.is_static() {
                continue;
            }
            let gravity_force = self.gravity * body.mass();
            body.apply_force(gravity_force);

            let velocity = body.velocity();
            if velocity != Vec2::ZERO {
                let drag = -velocity.normalize()
                    * (Self::AIR_RESISTANCE * velocity.magnitude_squared());
                body.apply_force(drag);
            }
            let omega = body.angular_velocity();
            body.set_angular_velocity(omega * (1.0 - Self::AIR_RESISTANCE * omega * omega * dt));
        }

        for spring in &self.springs {
            spring.apply_tension(&mut self.bodies);
        }

        for i in 0..self.bodies.len() {
            self.bodies[i].integrate(dt);

            for j in (i + 1)..self.bodies.len() {
                let (a, b) = (&self.bodies[i], &self.bodies[j]);
                if a.is_static() && b.is_static() {
                    continue;
                }
                if !a.aabb().overlaps(&b.aabb()) {
                    continue;
                }
                self.contact_pairs.push((i, j));
            }
        }
        trace!("broad phase kept {} candidate pairs", self.contact_pairs.len());
    }

    /// Runs the exact intersection test on every candidate pair, separates
    /// the overlapping ones and resolves them with rotation and friction.
    fn narrow_phase(&mut self) {
        let pairs = std::mem::take(&mut self.contact_pairs);
        let mut resolved = 0;

        for &(i, j) in &pairs {
            let (a, b) = body_pair_mut(&mut self.bodies, i, j);
            if let Some((normal, depth)) = detection::collide(a, b) {
                separate_bodies(a, b, normal, depth);

                let (contact1, contact2) = detection::contact_points(a, b);
                let manifold = CollisionManifold {
                    body_a: i,
                    body_b: j,
                    normal,
                    depth,
                    contact1,
                    contact2,
                };
                resolver::resolve(a, b, &manifold, ResolverMode::RotationFriction);
                resolved += 1;
            }
        }

        if resolved > 0 {
            trace!("narrow phase resolved {} contacts", resolved);
        }
        self.contact_pairs = pairs;
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Pushes an overlapping pair apart along the collision normal before any
/// impulse runs: a static body never moves, a dynamic body takes the full
/// depth against a static partner, two dynamic bodies split it evenly.
fn separate_bodies(a: &mut RigidBody, b: &mut RigidBody, normal: Vec2, depth: f64) {
    if a.is_static() {
        b.translate(normal * depth);
    } else if b.is_static() {
        a.translate(-(normal * depth));
    } else {
        a.translate(-(normal * (depth / 2.0)));
        b.translate(normal * (depth / 2.0));
    }
}

/// Mutable references to two distinct bodies, `idx_a < idx_b`.
fn body_pair_mut(
    bodies: &mut [RigidBody],
    idx_a: usize,
    idx_b: usize,
) -> (&mut RigidBody, &mut RigidBody) {
    debug_assert!(idx_a < idx_b);
    let (head, tail) = bodies.split_at_mut(idx_b);
    (&mut head[idx_a], &mut tail[0])
}
