//! Impulse-based rigid body simulation on convex vertex hulls.
//!
//! # Architecture
//!
//! Each tick runs to completion in this order:
//!
//! 1. Integrate dynamic bodies (gravity, position, Euler rotation)
//! 2. Refresh collider world geometry and world centers of mass
//! 3. Broadphase collision detection (AABB overlap)
//! 4. Narrowphase collision detection (GJK, then EPA)
//! 5. Resolve each contact with a single impulse, immediately
//!
//! Velocity writes from step 5 are visible to every later pair of the same
//! tick, so resolution order is arena order.

pub mod broadphase;
pub mod collider;
pub mod contact;
pub mod epa;
pub mod error;
pub mod gjk;
pub mod narrowphase;
pub mod rigid_body;
pub mod solver;
pub mod transform;

use glam::Vec3;
use tracing::{debug, trace, warn};

use self::broadphase::BruteForceBroadphase;
use self::collider::Collider;
use self::contact::{ContactEvent, MaterialBlend};
use self::narrowphase::{detect_collision, NarrowphaseConfig};
use self::rigid_body::{Body, RigidBody};
use self::solver::resolve_pair;
use self::transform::Transform;

pub use self::error::{PhysicsError, Result, Stage};

/// Configuration for the physics simulation.
#[derive(Debug, Clone)]
pub struct PhysicsConfig {
    /// Gravity vector. Default: (0, -9.8, 0).
    pub gravity: Vec3,
    /// Fixed timestep for [`PhysicsWorld::step`] in seconds. Default: 1/60.
    pub fixed_timestep: f64,
    /// Maximum number of ticks per [`PhysicsWorld::step`] call. Default: 4.
    pub max_substeps: u32,
    /// Support points GJK may add before giving up on a pair. Default: 64.
    pub gjk_max_iterations: usize,
    /// Polytope expansions EPA may run before giving up on a pair. Default: 512.
    pub epa_max_iterations: usize,
    /// EPA convergence tolerance. Default: 1e-5.
    pub epa_tolerance: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        let narrowphase = NarrowphaseConfig::default();
        Self {
            gravity: Vec3::new(0.0, -9.8, 0.0),
            fixed_timestep: 1.0 / 60.0,
            max_substeps: 4,
            gjk_max_iterations: narrowphase.gjk_max_iterations,
            epa_max_iterations: narrowphase.epa_max_iterations,
            epa_tolerance: narrowphase.epa_tolerance,
        }
    }
}

impl PhysicsConfig {
    pub fn narrowphase(&self) -> NarrowphaseConfig {
        NarrowphaseConfig {
            gjk_max_iterations: self.gjk_max_iterations,
            epa_max_iterations: self.epa_max_iterations,
            epa_tolerance: self.epa_tolerance,
        }
    }
}

/// Generational handle to an entity of a [`PhysicsWorld`].
///
/// A handle goes stale when its entity is despawned; the slot may be reused
/// under a new generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityHandle {
    index: u32,
    generation: u32,
}

impl EntityHandle {
    #[inline]
    pub fn index(&self) -> usize {
        self.index as usize
    }

    #[inline]
    pub fn generation(&self) -> u32 {
        self.generation
    }
}

/// Counters for the last tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickStats {
    /// Pairs that reached the AABB test (static-static pairs excluded).
    pub candidate_pairs: usize,
    /// Pairs whose AABBs overlapped and went through GJK.
    pub narrowphase_tests: usize,
    /// Contacts detected and handed to the resolver.
    pub contacts: usize,
    /// Pairs dropped because GJK, EPA or the resolver failed.
    pub skipped_pairs: usize,
}

#[derive(Debug)]
struct Entry {
    transform: Transform,
    body: Body,
    collider: Option<Collider>,
}

#[derive(Debug)]
struct Slot {
    generation: u32,
    entry: Option<Entry>,
}

/// The physics world: an arena of entities with a fixed-step loop.
pub struct PhysicsWorld {
    config: PhysicsConfig,
    accumulator: f64,
    slots: Vec<Slot>,
    free: Vec<u32>,
    broadphase: BruteForceBroadphase,
    contacts: Vec<ContactEvent>,
    last_stats: TickStats,
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(PhysicsConfig::default())
    }
}

impl PhysicsWorld {
    /// Create a new physics world with the given configuration.
    pub fn new(config: PhysicsConfig) -> Self {
        Self {
            config,
            accumulator: 0.0,
            slots: Vec::new(),
            free: Vec::new(),
            broadphase: BruteForceBroadphase::new(),
            contacts: Vec::new(),
            last_stats: TickStats::default(),
        }
    }

    pub fn config(&self) -> &PhysicsConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut PhysicsConfig {
        &mut self.config
    }

    /// Add an entity. Its collider geometry and world center of mass are
    /// computed from `transform` right away.
    pub fn spawn(
        &mut self,
        transform: Transform,
        body: impl Into<Body>,
        collider: Option<Collider>,
    ) -> EntityHandle {
        let mut entry = Entry {
            transform,
            body: body.into(),
            collider,
        };
        refresh_entry(&mut entry);

        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.entry = Some(entry);
                EntityHandle {
                    index,
                    generation: slot.generation,
                }
            }
            None => {
                let index = self.slots.len() as u32;
                self.slots.push(Slot {
                    generation: 0,
                    entry: Some(entry),
                });
                EntityHandle {
                    index,
                    generation: 0,
                }
            }
        }
    }

    /// Remove an entity. Returns false for a stale handle.
    pub fn despawn(&mut self, handle: EntityHandle) -> bool {
        let Some(slot) = self.slots.get_mut(handle.index()) else {
            return false;
        };
        if slot.generation != handle.generation || slot.entry.is_none() {
            return false;
        }
        slot.entry = None;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);
        true
    }

    pub fn contains(&self, handle: EntityHandle) -> bool {
        self.entry(handle).is_some()
    }

    /// Number of live entities.
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Live handles in arena order.
    pub fn handles(&self) -> impl Iterator<Item = EntityHandle> + '_ {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            slot.entry.as_ref().map(|_| EntityHandle {
                index: index as u32,
                generation: slot.generation,
            })
        })
    }

    fn entry(&self, handle: EntityHandle) -> Option<&Entry> {
        let slot = self.slots.get(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    fn entry_mut(&mut self, handle: EntityHandle) -> Option<&mut Entry> {
        let slot = self.slots.get_mut(handle.index())?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    pub fn transform(&self, handle: EntityHandle) -> Option<&Transform> {
        self.entry(handle).map(|e| &e.transform)
    }

    /// Mutable transform. Collider geometry catches up on the next tick.
    pub fn transform_mut(&mut self, handle: EntityHandle) -> Option<&mut Transform> {
        self.entry_mut(handle).map(|e| &mut e.transform)
    }

    pub fn body(&self, handle: EntityHandle) -> Option<&Body> {
        self.entry(handle).map(|e| &e.body)
    }

    pub fn body_mut(&mut self, handle: EntityHandle) -> Option<&mut Body> {
        self.entry_mut(handle).map(|e| &mut e.body)
    }

    pub fn rigid_body(&self, handle: EntityHandle) -> Option<&RigidBody> {
        self.body(handle)?.as_rigid_body()
    }

    pub fn rigid_body_mut(&mut self, handle: EntityHandle) -> Option<&mut RigidBody> {
        self.body_mut(handle)?.as_rigid_body_mut()
    }

    pub fn collider(&self, handle: EntityHandle) -> Option<&Collider> {
        self.entry(handle)?.collider.as_ref()
    }

    pub fn collider_mut(&mut self, handle: EntityHandle) -> Option<&mut Collider> {
        self.entry_mut(handle)?.collider.as_mut()
    }

    /// Contacts detected during the last tick, in resolution order.
    pub fn contacts(&self) -> &[ContactEvent] {
        &self.contacts
    }

    pub fn last_stats(&self) -> TickStats {
        self.last_stats
    }

    /// Step the physics simulation forward by `delta_time` seconds.
    ///
    /// Uses a fixed timestep accumulator to ensure deterministic simulation.
    /// Returns the number of ticks run.
    pub fn step(&mut self, delta_time: f64) -> u32 {
        self.accumulator += delta_time;

        let mut substeps = 0u32;
        while self.accumulator >= self.config.fixed_timestep && substeps < self.config.max_substeps
        {
            self.tick(self.config.fixed_timestep as f32);
            self.accumulator -= self.config.fixed_timestep;
            substeps += 1;
        }

        // Clamp accumulator to avoid spiral of death
        if self.accumulator > self.config.fixed_timestep * self.config.max_substeps as f64 {
            self.accumulator = 0.0;
        }
        substeps
    }

    /// Run exactly one tick of `dt` seconds.
    pub fn tick(&mut self, dt: f32) -> TickStats {
        let gravity = self.config.gravity;
        let narrowphase = self.config.narrowphase();
        let mut stats = TickStats::default();
        self.contacts.clear();

        // 1. Integrate
        for entry in self.slots.iter_mut().filter_map(|s| s.entry.as_mut()) {
            rigid_body::integrate(&mut entry.body, &mut entry.transform, gravity, dt);
        }

        // 2. Refresh world geometry
        self.broadphase.clear();
        for (index, slot) in self.slots.iter_mut().enumerate() {
            let Some(entry) = slot.entry.as_mut() else {
                continue;
            };
            refresh_entry(entry);
            if let Some(collider) = &entry.collider {
                self.broadphase
                    .insert(index, *collider.world_aabb(), entry.body.is_dynamic());
            }
        }

        // 3-5. Broadphase, narrowphase, resolution
        let broadphase = std::mem::take(&mut self.broadphase);
        let candidate_pairs = broadphase.for_each_pair(|a, b| {
            stats.narrowphase_tests += 1;
            handle_pair(
                &mut self.slots,
                &mut self.contacts,
                a,
                b,
                &narrowphase,
                &mut stats,
            );
        });
        self.broadphase = broadphase;
        stats.candidate_pairs = candidate_pairs;

        debug!(
            "Physics tick: {} candidate pairs, {} narrowphase tests, {} contacts, {} skipped",
            stats.candidate_pairs, stats.narrowphase_tests, stats.contacts, stats.skipped_pairs
        );

        self.last_stats = stats;
        stats
    }
}

fn refresh_entry(entry: &mut Entry) {
    if let Some(rb) = entry.body.as_rigid_body_mut() {
        rb.update_world_center_of_mass(&entry.transform);
    }
    if let Some(collider) = entry.collider.as_mut() {
        collider.refresh(&entry.transform);
    }
}

/// Detect and resolve one broadphase pair. `a` precedes `b` in the arena.
fn handle_pair(
    slots: &mut [Slot],
    contacts: &mut Vec<ContactEvent>,
    a: usize,
    b: usize,
    config: &NarrowphaseConfig,
    stats: &mut TickStats,
) {
    if a >= b || b >= slots.len() {
        return;
    }
    let (head, tail) = slots.split_at_mut(b);
    let (slot_a, slot_b) = (&mut head[a], &mut tail[0]);
    let entity_a = EntityHandle {
        index: a as u32,
        generation: slot_a.generation,
    };
    let entity_b = EntityHandle {
        index: b as u32,
        generation: slot_b.generation,
    };
    let (Some(entry_a), Some(entry_b)) = (slot_a.entry.as_mut(), slot_b.entry.as_mut()) else {
        return;
    };
    let (Some(collider_a), Some(collider_b)) = (&entry_a.collider, &entry_b.collider) else {
        return;
    };

    let contact = match detect_collision(collider_a, collider_b, config) {
        Ok(Some(contact)) => contact,
        Ok(None) => return,
        Err(e) => {
            warn!("Skipping pair {:?} / {:?}: {}", entity_a, entity_b, e);
            stats.skipped_pairs += 1;
            return;
        }
    };

    let material = MaterialBlend::average(&collider_a.material, &collider_b.material);
    match resolve_pair(&mut entry_a.body, &mut entry_b.body, &contact, &material) {
        Ok(response) => {
            trace!(
                "Contact {:?} / {:?}: depth {}, normal {}, {:?}",
                entity_a,
                entity_b,
                contact.distance,
                contact.normal,
                response
            );
            stats.contacts += 1;
            contacts.push(ContactEvent {
                entity_a,
                entity_b,
                contact,
                material,
                response,
            });
        }
        Err(e) => {
            warn!("Skipping pair {:?} / {:?}: {}", entity_a, entity_b, e);
            stats.skipped_pairs += 1;
        }
    }
}
