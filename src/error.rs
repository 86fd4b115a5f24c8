use thiserror::Error;

/// Errors raised while constructing or mutating shapes and bodies.
///
/// A failed construction or mutation leaves the target untouched.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ConstructionError {
    #[error("mass must be greater than zero (got {0})")]
    NonPositiveMass(f64),

    #[error("restitution must be zero or greater (got {0})")]
    NegativeRestitution(f64),

    #[error("{name} must be greater than zero (got {value})")]
    NonPositiveDimension { name: &'static str, value: f64 },
}

/// Errors raised by [`PhysicsWorld::step`](crate::world::PhysicsWorld::step).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StepError {
    #[error("sub_iterations must be between 1 and 64 (got {0})")]
    SubIterationsOutOfRange(u32),
}
