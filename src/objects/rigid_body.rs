use std::cell::OnceCell;

use crate::collision::AABB;
use crate::error::ConstructionError;
use crate::math::vec2::Vec2;
use crate::shapes::Shape;

const DEFAULT_STATIC_FRICTION: f64 = 0.5;
const DEFAULT_DYNAMIC_FRICTION: f64 = 0.4;

/// A simulated body: a [`Shape`] plus mutable physical state.
///
/// All fields are private so the class invariants (`mass > 0`,
/// `restitution >= 0`, inertia in sync with mass and shape) hold across every
/// mutation. World-space vertices and the AABB are derived lazily from the
/// pose and cached until the position or rotation changes.
#[derive(Debug, Clone)]
pub struct RigidBody {
    position: Vec2,
    velocity: Vec2,
    /// Orientation in degrees.
    rotation: f64,
    /// Angular velocity in radians per second.
    angular_velocity: f64,
    force: Vec2,
    mass: f64,
    restitution: f64,
    static_friction: f64,
    dynamic_friction: f64,
    rotational_inertia: f64,
    is_static: bool,
    shape: Shape,
    vertex_cache: OnceCell<Vec<Vec2>>,
    aabb_cache: OnceCell<AABB>,
}

impl RigidBody {
    /// Creates a body at `position`. Fails if `mass <= 0` or
    /// `restitution < 0`; shape dimensions are validated by the [`Shape`]
    /// constructors.
    pub fn new(
        position: Vec2,
        mass: f64,
        restitution: f64,
        shape: Shape,
        is_static: bool,
    ) -> Result<Self, ConstructionError> {
        if mass <= 0.0 {
            return Err(ConstructionError::NonPositiveMass(mass));
        }
        if restitution < 0.0 {
            return Err(ConstructionError::NegativeRestitution(restitution));
        }

        Ok(Self {
            position,
            velocity: Vec2::ZERO,
            rotation: 0.0,
            angular_velocity: 0.0,
            force: Vec2::ZERO,
            mass,
            restitution,
            static_friction: DEFAULT_STATIC_FRICTION,
            dynamic_friction: DEFAULT_DYNAMIC_FRICTION,
            rotational_inertia: shape.rotational_inertia(mass),
            is_static,
            shape,
            vertex_cache: OnceCell::new(),
            aabb_cache: OnceCell::new(),
        })
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Orientation in degrees.
    pub fn rotation(&self) -> f64 {
        self.rotation
    }

    /// Angular velocity in radians per second.
    pub fn angular_velocity(&self) -> f64 {
        self.angular_velocity
    }

    pub fn force(&self) -> Vec2 {
        self.force
    }

    pub fn mass(&self) -> f64 {
        self.mass
    }

    pub fn restitution(&self) -> f64 {
        self.restitution
    }

    pub fn static_friction(&self) -> f64 {
        self.static_friction
    }

    pub fn dynamic_friction(&self) -> f64 {
        self.dynamic_friction
    }

    pub fn rotational_inertia(&self) -> f64 {
        self.rotational_inertia
    }

    pub fn is_static(&self) -> bool {
        self.is_static
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    /// Inverse mass, zero for static bodies.
    pub fn inv_mass(&self) -> f64 {
        if self.is_static {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    /// Inverse rotational inertia, zero for static bodies.
    pub fn inv_inertia(&self) -> f64 {
        if self.is_static {
            0.0
        } else {
            1.0 / self.rotational_inertia
        }
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.invalidate_pose_caches();
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.set_position(self.position + delta);
    }

    pub fn set_rotation(&mut self, rotation: f64) {
        self.rotation = rotation;
        self.invalidate_pose_caches();
    }

    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: f64) {
        self.angular_velocity = angular_velocity;
    }

    /// Fails if `mass <= 0`; on success the rotational inertia is recomputed
    /// immediately.
    pub fn set_mass(&mut self, mass: f64) -> Result<(), ConstructionError> {
        if mass <= 0.0 {
            return Err(ConstructionError::NonPositiveMass(mass));
        }
        self.mass = mass;
        self.rotational_inertia = self.shape.rotational_inertia(mass);
        Ok(())
    }

    /// Fails if `restitution < 0`.
    pub fn set_restitution(&mut self, restitution: f64) -> Result<(), ConstructionError> {
        if restitution < 0.0 {
            return Err(ConstructionError::NegativeRestitution(restitution));
        }
        self.restitution = restitution;
        Ok(())
    }

    pub fn set_static_friction(&mut self, coefficient: f64) {
        self.static_friction = coefficient;
    }

    pub fn set_dynamic_friction(&mut self, coefficient: f64) {
        self.dynamic_friction = coefficient;
    }

    /// Swaps the shape; the rotational inertia is recomputed immediately and
    /// the cached geometry is discarded.
    pub fn set_shape(&mut self, shape: Shape) {
        self.shape = shape;
        self.rotational_inertia = shape.rotational_inertia(self.mass);
        self.invalidate_pose_caches();
    }

    /// Accumulates a force to be consumed by the next [`integrate`] call.
    ///
    /// [`integrate`]: Self::integrate
    pub fn apply_force(&mut self, force: Vec2) {
        self.force += force;
    }

    /// Advances the body by `dt` seconds with semi-implicit Euler and clears
    /// the accumulated force. Static bodies are left untouched.
    pub fn integrate(&mut self, dt: f64) {
        if self.is_static {
            return;
        }

        let acceleration = self.force / self.mass;
        self.velocity += acceleration * dt;
        self.set_position(self.position + self.velocity * dt);
        // Rotation is tracked in degrees while angular velocity is rad/s.
        self.set_rotation(self.rotation + self.angular_velocity.to_degrees() * dt);
        self.force = Vec2::ZERO;
    }

    /// World-space vertices for polygonal shapes: the local reference
    /// vertices rotated by the current rotation and translated by the
    /// position. `None` for circles. Computed once per pose and cached.
    pub fn vertices(&self) -> Option<&[Vec2]> {
        if self.shape.is_circle() {
            return None;
        }
        let verts = self.vertex_cache.get_or_init(|| {
            let angle = self.rotation.to_radians();
            self.shape
                .local_vertices()
                .unwrap_or_default()
                .into_iter()
                .map(|v| self.position + v.rotate(angle))
                .collect()
        });
        Some(verts.as_slice())
    }

    /// The world-space bounding box, cached until the pose changes.
    pub fn aabb(&self) -> AABB {
        *self.aabb_cache.get_or_init(|| match self.shape {
            Shape::Circle { radius } => {
                let extent = Vec2::new(radius, radius);
                AABB::new(self.position - extent, self.position + extent)
            }
            _ => AABB::from_points(self.vertices().unwrap_or(&[]))
                .unwrap_or(AABB::new(self.position, self.position)),
        })
    }

    fn invalidate_pose_caches(&mut self) {
        self.vertex_cache.take();
        self.aabb_cache.take();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn circle_body(radius: f64) -> RigidBody {
        RigidBody::new(
            Vec2::ZERO,
            1.0,
            0.5,
            Shape::circle(radius).unwrap(),
            false,
        )
        .unwrap()
    }

    fn box_body(width: f64, height: f64) -> RigidBody {
        RigidBody::new(
            Vec2::ZERO,
            1.0,
            0.5,
            Shape::rect(width, height).unwrap(),
            false,
        )
        .unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_mass_and_restitution() {
        let shape = Shape::circle(1.0).unwrap();
        assert_eq!(
            RigidBody::new(Vec2::ZERO, 0.0, 0.5, shape, false).unwrap_err(),
            ConstructionError::NonPositiveMass(0.0)
        );
        assert_eq!(
            RigidBody::new(Vec2::ZERO, -2.0, 0.5, shape, false).unwrap_err(),
            ConstructionError::NonPositiveMass(-2.0)
        );
        assert_eq!(
            RigidBody::new(Vec2::ZERO, 1.0, -0.1, shape, false).unwrap_err(),
            ConstructionError::NegativeRestitution(-0.1)
        );
    }

    #[test]
    fn test_new_defaults() {
        let body = circle_body(2.0);
        assert_eq!(body.velocity(), Vec2::ZERO);
        assert_eq!(body.rotation(), 0.0);
        assert_eq!(body.angular_velocity(), 0.0);
        assert_eq!(body.force(), Vec2::ZERO);
        assert_eq!(body.static_friction(), 0.5);
        assert_eq!(body.dynamic_friction(), 0.4);
        assert_relative_eq!(body.rotational_inertia(), 0.5 * 1.0 * 4.0);
    }

    #[test]
    fn test_invariants_hold_after_mutation_attempts() {
        let mut body = circle_body(1.0);
        for candidate in [-10.0, -1.0, 0.0, 0.5, 3.0] {
            let _ = body.set_mass(candidate);
            assert!(body.mass() > 0.0);
        }
        for candidate in [-5.0, -0.01, 0.0, 0.25, 2.0] {
            let _ = body.set_restitution(candidate);
            assert!(body.restitution() >= 0.0);
        }
        assert_eq!(body.mass(), 3.0);
        assert_eq!(body.restitution(), 2.0);
    }

    #[test]
    fn test_set_mass_recomputes_inertia_immediately() {
        let mut body = circle_body(2.0);
        body.set_mass(10.0).unwrap();
        assert_relative_eq!(body.rotational_inertia(), 0.5 * 10.0 * 4.0);
    }

    #[test]
    fn test_set_shape_recomputes_inertia_and_drops_cached_geometry() {
        let mut body = box_body(10.0, 10.0);
        let before = body.vertices().unwrap().to_vec();
        body.set_shape(Shape::rect(20.0, 20.0).unwrap());
        assert_relative_eq!(body.rotational_inertia(), (400.0 + 400.0) / 12.0);
        let after = body.vertices().unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_inverse_mass_and_inertia_for_static_bodies() {
        let shape = Shape::rect(10.0, 10.0).unwrap();
        let fixed = RigidBody::new(Vec2::ZERO, 5.0, 0.5, shape, true).unwrap();
        assert_eq!(fixed.inv_mass(), 0.0);
        assert_eq!(fixed.inv_inertia(), 0.0);
        let moving = RigidBody::new(Vec2::ZERO, 5.0, 0.5, shape, false).unwrap();
        assert_relative_eq!(moving.inv_mass(), 0.2);
        assert_relative_eq!(moving.inv_inertia(), 1.0 / moving.rotational_inertia());
    }

    #[test]
    fn test_apply_force_accumulates() {
        let mut body = circle_body(1.0);
        body.apply_force(Vec2::new(10.0, 0.0));
        body.apply_force(Vec2::new(0.0, 5.0));
        assert_eq!(body.force(), Vec2::new(10.0, 5.0));
    }

    #[test]
    fn test_integrate_applies_force_and_clears_it() {
        let mut body = box_body(2.0, 2.0);
        body.set_mass(2.0).unwrap();
        body.apply_force(Vec2::new(10.0, 0.0));
        body.integrate(0.1);
        // a = F/m = (5, 0); v = a*dt = (0.5, 0); p = v*dt = (0.05, 0)
        assert_relative_eq!(body.velocity().x, 0.5);
        assert_relative_eq!(body.position().x, 0.05);
        assert_eq!(body.force(), Vec2::ZERO);
    }

    #[test]
    fn test_integrate_advances_rotation_in_degrees() {
        let mut body = circle_body(1.0);
        body.set_angular_velocity(std::f64::consts::PI); // half a turn per second
        body.integrate(1.0);
        assert_relative_eq!(body.rotation(), 180.0, epsilon = 1e-9);
    }

    #[test]
    fn test_integrate_leaves_static_bodies_alone() {
        let shape = Shape::circle(1.0).unwrap();
        let mut body = RigidBody::new(Vec2::new(3.0, 4.0), 1.0, 0.5, shape, true).unwrap();
        body.apply_force(Vec2::new(100.0, 100.0));
        body.integrate(0.5);
        assert_eq!(body.position(), Vec2::new(3.0, 4.0));
        assert_eq!(body.velocity(), Vec2::ZERO);
    }

    #[test]
    fn test_vertices_none_for_circles() {
        assert!(circle_body(1.0).vertices().is_none());
    }

    #[test]
    fn test_vertices_follow_pose() {
        let mut body = box_body(10.0, 10.0);
        body.set_position(Vec2::new(100.0, 50.0));
        let verts = body.vertices().unwrap();
        assert_eq!(verts[0], Vec2::new(95.0, 45.0));
        assert_eq!(verts[2], Vec2::new(105.0, 55.0));

        body.set_rotation(90.0);
        let rotated = body.vertices().unwrap();
        // (-5, -5) rotated a quarter turn becomes (5, -5).
        assert_relative_eq!(rotated[0].x, 105.0, epsilon = 1e-9);
        assert_relative_eq!(rotated[0].y, 45.0, epsilon = 1e-9);
    }

    #[test]
    fn test_vertex_cache_is_idempotent_between_mutations() {
        let body = box_body(10.0, 10.0);
        let first = body.vertices().unwrap().as_ptr();
        let second = body.vertices().unwrap().as_ptr();
        assert_eq!(first, second);
    }

    #[test]
    fn test_aabb_circle_and_caching() {
        let mut body = circle_body(5.0);
        body.set_position(Vec2::new(10.0, -10.0));
        let aabb = body.aabb();
        assert_eq!(aabb.min, Vec2::new(5.0, -15.0));
        assert_eq!(aabb.max, Vec2::new(15.0, -5.0));
        assert_eq!(body.aabb(), aabb);

        body.set_position(Vec2::new(0.0, 0.0));
        let moved = body.aabb();
        assert_eq!(moved.min, Vec2::new(-5.0, -5.0));
        assert_eq!(moved.max, Vec2::new(5.0, 5.0));
    }

    #[test]
    fn test_aabb_tracks_rotated_polygon() {
        let mut body = box_body(40.0, 20.0);
        let flat = body.aabb();
        assert_eq!(flat.min, Vec2::new(-20.0, -10.0));
        assert_eq!(flat.max, Vec2::new(20.0, 10.0));

        body.set_rotation(90.0);
        let upright = body.aabb();
        assert_relative_eq!(upright.min.x, -10.0, epsilon = 1e-9);
        assert_relative_eq!(upright.min.y, -20.0, epsilon = 1e-9);
        assert_relative_eq!(upright.max.x, 10.0, epsilon = 1e-9);
        assert_relative_eq!(upright.max.y, 20.0, epsilon = 1e-9);
    }
}
