//! Rein Impulse
//!
//! Rigid body collision core: GJK/EPA on convex vertex hulls with
//! single-impulse contact resolution.
//!
//! # Architecture
//!
//! The library is organized into layers:
//!
//! 1. **physics::transform / collider / rigid_body** - Per-entity state and hull generation
//! 2. **physics::broadphase** - AABB overlap pairs
//! 3. **physics::gjk / epa / narrowphase** - Intersection test and contact recovery
//! 4. **physics::solver** - Impulse resolution
//! 5. **physics** - `PhysicsWorld` arena and fixed-step loop
//! 6. **ecs** - hecs integration (feature = "ecs")

pub mod physics;

#[cfg(feature = "ecs")]
pub mod ecs;

// Re-export commonly used types
pub use physics::collider::{Collider, ColliderShape, Material, PhysicsAabb};
pub use physics::contact::{Contact, ContactEvent, MaterialBlend, Response};
pub use physics::narrowphase::{detect_collision, intersects, NarrowphaseConfig};
pub use physics::rigid_body::{Body, RigidBody};
pub use physics::transform::Transform;
pub use physics::{
    EntityHandle, PhysicsConfig, PhysicsError, PhysicsWorld, Result, Stage, TickStats,
};

#[cfg(feature = "ecs")]
pub use ecs::prelude::*;

// Re-export glam for convenience
pub use glam;
