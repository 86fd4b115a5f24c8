use crate::math::vec2::Vec2;
use crate::objects::rigid_body::RigidBody;

/// A Hooke's-law spring linking two bodies by index.
///
/// Each step the spring applies a force pair proportional to how far the
/// current length deviates from the rest length. Springs do not take part in
/// collision resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Spring {
    pub body_a: usize,
    pub body_b: usize,
    pub rest_length: f64,
    pub stiffness: f64,
}

impl Spring {
    pub const DEFAULT_STIFFNESS: f64 = 50_000.0;

    pub fn new(body_a: usize, body_b: usize, rest_length: f64) -> Self {
        Self {
            body_a,
            body_b,
            rest_length,
            stiffness: Self::DEFAULT_STIFFNESS,
        }
    }

    pub fn with_stiffness(mut self, stiffness: f64) -> Self {
        self.stiffness = stiffness;
        self
    }

    /// Accumulates the spring force onto the linked bodies. A static endpoint
    /// absorbs nothing; the full force goes to the dynamic side.
    pub fn apply_tension(&self, bodies: &mut [RigidBody]) {
        let (Some(a), Some(b)) = (bodies.get(self.body_a), bodies.get(self.body_b)) else {
            return;
        };

        let rope = b.position() - a.position();
        if rope.magnitude_squared() < 1e-12 {
            return;
        }
        // F = direction * (rest - length) * k
        let tension = rope.normalize() * ((self.rest_length - rope.magnitude()) * self.stiffness);

        match (a.is_static(), b.is_static()) {
            (false, false) => {
                bodies[self.body_a].apply_force(-tension / 2.0);
                bodies[self.body_b].apply_force(tension / 2.0);
            }
            (false, true) => bodies[self.body_a].apply_force(-tension),
            (true, false) => bodies[self.body_b].apply_force(tension),
            (true, true) => {}
        }
    }
}
