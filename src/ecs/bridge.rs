//! Bridge between hecs entities and the physics world.
//!
//! The hecs world owns the authoritative [`Transform`] between steps. Call
//! [`push_transforms`] before stepping and [`pull_transforms`] after.

use anyhow::{bail, Context};

use crate::physics::collider::Collider;
use crate::physics::rigid_body::Body;
use crate::physics::transform::Transform;
use crate::physics::{EntityHandle, PhysicsWorld};

/// Component linking a hecs entity to its physics entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PhysicsHandle(pub EntityHandle);

/// Spawn an entity in both worlds.
///
/// The hecs entity gets the transform and a [`PhysicsHandle`].
pub fn spawn_physics_entity(
    world: &mut hecs::World,
    physics: &mut PhysicsWorld,
    transform: Transform,
    body: impl Into<Body>,
    collider: Option<Collider>,
) -> anyhow::Result<hecs::Entity> {
    if !(transform.position.is_finite()
        && transform.rotation.is_finite()
        && transform.scale.is_finite())
    {
        bail!("cannot spawn a physics entity with a non-finite transform: {transform:?}");
    }

    let handle = physics.spawn(transform, body, collider);
    Ok(world.spawn((transform, PhysicsHandle(handle))))
}

/// Remove an entity from both worlds.
pub fn despawn_physics_entity(
    world: &mut hecs::World,
    physics: &mut PhysicsWorld,
    entity: hecs::Entity,
) -> anyhow::Result<()> {
    let handle = world
        .get::<&PhysicsHandle>(entity)
        .map(|h| h.0)
        .context("entity has no physics handle")?;
    world.despawn(entity).context("despawning hecs entity")?;
    if !physics.despawn(handle) {
        bail!("stale physics handle {handle:?}");
    }
    Ok(())
}

/// Copy hecs transforms into the physics world. Returns the number of
/// entities synced; stale handles are skipped.
pub fn push_transforms(world: &hecs::World, physics: &mut PhysicsWorld) -> usize {
    let mut synced = 0;
    for (_entity, (transform, handle)) in world.query::<(&Transform, &PhysicsHandle)>().iter() {
        if let Some(target) = physics.transform_mut(handle.0) {
            *target = *transform;
            synced += 1;
        }
    }
    synced
}

/// Copy physics transforms back into hecs. Returns the number of entities
/// synced; stale handles are skipped.
pub fn pull_transforms(world: &mut hecs::World, physics: &PhysicsWorld) -> usize {
    let mut synced = 0;
    for (_entity, (transform, handle)) in world.query_mut::<(&mut Transform, &PhysicsHandle)>() {
        if let Some(source) = physics.transform(handle.0) {
            *transform = *source;
            synced += 1;
        }
    }
    synced
}
