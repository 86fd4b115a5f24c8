//! An impulse-based 2D rigid-body physics engine.
//!
//! Bodies carry a [`Shape`] (circle, box, triangle or pentagon) and are
//! advanced by a [`PhysicsWorld`] that integrates forces, culls candidate
//! pairs by bounding box, detects true overlap with the separating axis
//! theorem and resolves contacts with rotation-aware, friction-clamped
//! impulses.

pub mod collision;
pub mod constraints;
pub mod error;
pub mod math;
pub mod objects;
pub mod shapes;
pub mod world;

// Re-export key types for easier use
pub use collision::{CollisionManifold, ResolverMode, AABB};
pub use constraints::Spring;
pub use error::{ConstructionError, StepError};
pub use math::vec2::Vec2;
pub use objects::rigid_body::RigidBody;
pub use shapes::Shape;
pub use world::PhysicsWorld;
