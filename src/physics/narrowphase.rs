//! Narrowphase collision detection on convex vertex hulls.
//!
//! [`intersects`] runs GJK to decide overlap and, when the hulls overlap,
//! EPA to recover the contact. Both stages share the support mapping and
//! [`Simplex`] defined here.

use glam::Vec3;

use super::collider::Collider;
use super::contact::Contact;
use super::epa::penetration;
use super::error::{PhysicsError, Result};
use super::gjk::{gjk, GjkOutcome};

/// Iteration bounds and tolerance shared by GJK and EPA.
///
/// EPA adds one polytope vertex per iteration, so deeply overlapping round
/// hulls (the 114-vertex sphere, nearly concentric) need a few hundred.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NarrowphaseConfig {
    pub gjk_max_iterations: usize,
    pub epa_max_iterations: usize,
    pub epa_tolerance: f32,
}

impl Default for NarrowphaseConfig {
    fn default() -> Self {
        Self {
            gjk_max_iterations: 64,
            epa_max_iterations: 512,
            epa_tolerance: 1e-5,
        }
    }
}

/// A point of the Minkowski difference `A - B` together with the hull A
/// vertex it came from. The A vertex is needed to place the contact point
/// in world space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SupportPoint {
    pub point: Vec3,
    pub on_a: Vec3,
}

/// Vertex of `vertices` with the largest projection onto `direction`.
///
/// Ties keep the first vertex found.
#[inline]
pub fn furthest_point(vertices: &[Vec3], direction: Vec3) -> Option<Vec3> {
    let (first, rest) = vertices.split_first()?;
    let mut best = *first;
    let mut best_dot = best.dot(direction);
    for v in rest {
        let d = v.dot(direction);
        if d > best_dot {
            best_dot = d;
            best = *v;
        }
    }
    Some(best)
}

/// Minkowski difference support function.
#[inline]
pub fn support(hull_a: &[Vec3], hull_b: &[Vec3], direction: Vec3) -> Result<SupportPoint> {
    let a = furthest_point(hull_a, direction)
        .ok_or(PhysicsError::DegenerateGeometry("empty vertex set"))?;
    let b = furthest_point(hull_b, -direction)
        .ok_or(PhysicsError::DegenerateGeometry("empty vertex set"))?;
    Ok(SupportPoint {
        point: a - b,
        on_a: a,
    })
}

/// A simplex used by the GJK algorithm (1 to 4 support points, in insertion
/// order).
#[derive(Debug, Clone, Copy, Default)]
pub struct Simplex {
    points: [SupportPoint; 4],
    len: usize,
}

impl Simplex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a support point.
    ///
    /// # Panics
    ///
    /// Panics if the simplex already holds four points.
    #[inline]
    pub fn push(&mut self, point: SupportPoint) {
        assert!(self.len < 4, "simplex holds at most four points");
        self.points[self.len] = point;
        self.len += 1;
    }

    /// Remove the point at `index`, keeping the order of the others.
    #[inline]
    pub fn remove(&mut self, index: usize) {
        assert!(index < self.len, "simplex index out of range");
        self.points.copy_within(index + 1..self.len, index);
        self.len -= 1;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Minkowski point at `index`.
    #[inline]
    pub fn point(&self, index: usize) -> Vec3 {
        self.as_slice()[index].point
    }

    #[inline]
    pub fn as_slice(&self) -> &[SupportPoint] {
        &self.points[..self.len]
    }
}

/// Test two convex hulls for overlap and recover the contact.
///
/// `initial_direction` seeds the GJK search; the world passes
/// `centroid_a - centroid_b`. A zero direction falls back to +X, unless one
/// of the hulls spans no volume: the contact normal is then undefined and
/// the test fails with [`PhysicsError::DegenerateGeometry`].
pub fn intersects(
    hull_a: &[Vec3],
    hull_b: &[Vec3],
    initial_direction: Vec3,
    zero_volume: bool,
    config: &NarrowphaseConfig,
) -> Result<Option<Contact>> {
    let mut direction = initial_direction;
    if direction.length_squared() < 1e-12 {
        if zero_volume {
            return Err(PhysicsError::DegenerateGeometry(
                "coincident centroids with a zero-volume hull",
            ));
        }
        direction = Vec3::X;
    }

    match gjk(hull_a, hull_b, direction, config.gjk_max_iterations)? {
        GjkOutcome::Separated => Ok(None),
        GjkOutcome::Intersecting(simplex) => {
            let contact = penetration(
                hull_a,
                hull_b,
                &simplex,
                config.epa_max_iterations,
                config.epa_tolerance,
            )?;
            if !contact.is_well_formed() {
                return Err(PhysicsError::DegenerateGeometry("non-finite contact"));
            }
            Ok(Some(contact))
        }
    }
}

/// Detect a collision between two colliders using their current world
/// geometry.
pub fn detect_collision(
    collider_a: &Collider,
    collider_b: &Collider,
    config: &NarrowphaseConfig,
) -> Result<Option<Contact>> {
    intersects(
        collider_a.world_vertices(),
        collider_b.world_vertices(),
        collider_a.world_centroid() - collider_b.world_centroid(),
        collider_a.is_zero_volume() || collider_b.is_zero_volume(),
        config,
    )
}
