//! Shared setup helpers for rein-impulse benchmarks.
//!
//! ## Running
//!
//! All groups (criterion):
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench physics
//!
//! Filter by group:
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench physics -- broadphase
//!   cargo bench --manifest-path benchmarks/Cargo.toml --bench physics -- narrowphase

use glam::Vec3;
use rein::physics::broadphase::BruteForceBroadphase;
use rein::physics::collider::{Collider, ColliderShape, Material};
use rein::physics::contact::Contact;
use rein::physics::rigid_body::{Body, RigidBody};
use rein::physics::transform::Transform;
use rein::physics::{PhysicsConfig, PhysicsWorld};

fn zero_gravity() -> PhysicsConfig {
    PhysicsConfig {
        gravity: Vec3::ZERO,
        ..PhysicsConfig::default()
    }
}

fn grid_position(i: usize, cols: usize, spacing: f32) -> Vec3 {
    Vec3::new((i % cols) as f32 * spacing, 0.0, (i / cols) as f32 * spacing)
}

// ---------------------------------------------------------------------------
// Basic scenes
// ---------------------------------------------------------------------------

/// `n` dynamic unit boxes (half extent 1) on a grid so neighbors overlap.
pub fn setup_box_world(n: usize) -> anyhow::Result<PhysicsWorld> {
    let mut world = PhysicsWorld::new(zero_gravity());
    let cols = (n as f32).sqrt().ceil() as usize;

    for i in 0..n {
        world.spawn(
            Transform::from_position(grid_position(i, cols, 1.5)),
            RigidBody::cuboid(1.0, Vec3::ONE)?,
            Some(Collider::cuboid(Vec3::ONE)?),
        );
    }
    Ok(world)
}

/// Mixed scene: dynamic spheres alternating with static boxes.
pub fn setup_mixed_world(n: usize) -> anyhow::Result<PhysicsWorld> {
    let mut world = PhysicsWorld::new(zero_gravity());
    let cols = (n as f32).sqrt().ceil() as usize;

    for i in 0..n {
        let transform = Transform::from_position(grid_position(i, cols, 1.5));
        if i % 2 == 0 {
            world.spawn(
                transform,
                RigidBody::sphere(1.0, 1.0)?,
                Some(Collider::sphere(1.0)?),
            );
        } else {
            world.spawn(transform, Body::Static, Some(Collider::cuboid(Vec3::ONE)?));
        }
    }
    Ok(world)
}

/// Widely spaced bodies: no AABB overlaps.
pub fn setup_sparse_world(n: usize) -> anyhow::Result<PhysicsWorld> {
    let mut world = PhysicsWorld::new(zero_gravity());
    let cols = (n as f32).sqrt().ceil() as usize;

    for i in 0..n {
        world.spawn(
            Transform::from_position(grid_position(i, cols, 10.0)),
            RigidBody::sphere(1.0, 0.5)?,
            Some(Collider::sphere(0.5)?),
        );
    }
    Ok(world)
}

/// Boxes dropped from staggered heights onto a static ground slab.
pub fn setup_falling_scene(n: usize) -> anyhow::Result<PhysicsWorld> {
    let mut world = PhysicsWorld::new(PhysicsConfig::default());
    let half = Vec3::splat(0.5);
    let extent = (n as f32).sqrt().ceil() * 1.5 + 2.0;

    world.spawn(
        Transform::from_position(Vec3::new(0.0, -0.5, 0.0)),
        Body::Static,
        Some(Collider::cuboid(Vec3::new(extent, 0.5, extent))?),
    );

    let cols = (n as f32).sqrt().ceil() as usize;
    for i in 0..n {
        let lift = 0.6 + (i % 3) as f32 * 0.2;
        let position = grid_position(i, cols, 1.2) + Vec3::new(0.0, lift, 0.0);
        world.spawn(
            Transform::from_position(position),
            RigidBody::cuboid(1.0, half)?,
            Some(Collider::cuboid(half)?.with_material(Material::new(0.2, 0.5, 0.5)?)),
        );
    }
    Ok(world)
}

/// Snapshot the world's collider AABBs into a broadphase, the way a tick
/// does after refreshing geometry.
pub fn fill_broadphase(world: &PhysicsWorld) -> BruteForceBroadphase {
    let mut broadphase = BruteForceBroadphase::new();
    for handle in world.handles() {
        let (Some(collider), Some(body)) = (world.collider(handle), world.body(handle)) else {
            continue;
        };
        broadphase.insert(handle.index(), *collider.world_aabb(), body.is_dynamic());
    }
    broadphase
}

// ---------------------------------------------------------------------------
// Narrowphase
// ---------------------------------------------------------------------------

/// Two colliders with their world geometry refreshed.
pub fn collider_pair(
    shape_a: ColliderShape,
    transform_a: Transform,
    shape_b: ColliderShape,
    transform_b: Transform,
) -> anyhow::Result<(Collider, Collider)> {
    let mut a = Collider::new(shape_a)?;
    let mut b = Collider::new(shape_b)?;
    a.refresh(&transform_a);
    b.refresh(&transform_b);
    Ok((a, b))
}

// ---------------------------------------------------------------------------
// Solver
// ---------------------------------------------------------------------------

/// `n` head-on body pairs with their contacts, for the impulse resolver.
pub fn setup_contacts(n: usize) -> anyhow::Result<Vec<(RigidBody, RigidBody, Contact)>> {
    let mut pairs = Vec::with_capacity(n);
    for i in 0..n {
        let offset = Vec3::new(0.0, i as f32 * 3.0, 0.0);
        let mut a = RigidBody::cuboid(1.0, Vec3::ONE)?.with_velocity(Vec3::new(1.0, 0.0, 0.0));
        let mut b = RigidBody::cuboid(2.0, Vec3::ONE)?.with_velocity(Vec3::new(-1.0, 0.0, 0.0));
        a.update_world_center_of_mass(&Transform::from_position(offset));
        b.update_world_center_of_mass(&Transform::from_position(offset + Vec3::new(1.9, 0.0, 0.0)));
        let contact = Contact {
            distance: 0.1,
            point: offset + Vec3::new(1.0, -1.0, -1.0),
            normal: Vec3::X,
        };
        pairs.push((a, b, contact));
    }
    Ok(pairs)
}

// ---------------------------------------------------------------------------
// hecs bridge
// ---------------------------------------------------------------------------

/// Falling scene mirrored into a hecs world.
pub fn setup_bridged_scene(n: usize) -> anyhow::Result<(hecs::World, PhysicsWorld)> {
    let mut world = hecs::World::new();
    let mut physics = PhysicsWorld::new(PhysicsConfig::default());
    let half = Vec3::splat(0.5);

    rein::spawn_physics_entity(
        &mut world,
        &mut physics,
        Transform::from_position(Vec3::new(0.0, -0.5, 0.0)),
        Body::Static,
        Some(Collider::cuboid(Vec3::new(100.0, 0.5, 100.0))?),
    )?;

    let cols = (n as f32).sqrt().ceil() as usize;
    for i in 0..n {
        rein::spawn_physics_entity(
            &mut world,
            &mut physics,
            Transform::from_position(grid_position(i, cols, 1.2) + Vec3::new(0.0, 2.0, 0.0)),
            RigidBody::cuboid(1.0, half)?,
            Some(Collider::cuboid(half)?),
        )?;
    }
    Ok((world, physics))
}
