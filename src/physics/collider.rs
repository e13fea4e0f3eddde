//! Collider shapes and the per-tick support geometry (world vertices, AABB,
//! centroid) consumed by the broadphase and the narrowphase.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use super::error::{PhysicsError, Result};
use super::transform::Transform;

/// Segments around the axis of round shapes.
const ROUND_SEGMENTS: usize = 16;
/// Latitude rings of the sphere hull, poles excluded. Kept odd so the
/// equator carries a ring.
const SPHERE_RINGS: usize = 7;
/// Relative tolerance for the zero-volume test.
const FLATNESS_TOLERANCE: f32 = 1e-5;

/// Axis-aligned bounding box for broadphase collision detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhysicsAabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl PhysicsAabb {
    /// Smallest box containing every point, or `None` for an empty set.
    pub fn from_points(points: &[Vec3]) -> Option<Self> {
        let first = *points.first()?;
        let (min, max) = points[1..]
            .iter()
            .fold((first, first), |(min, max), p| (min.min(*p), max.max(*p)));
        Some(Self { min, max })
    }

    /// Test whether two AABBs overlap. Touching boxes overlap.
    #[inline]
    pub fn overlaps(&self, other: &PhysicsAabb) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }
}

/// Surface response coefficients, each in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Material {
    pub bounciness: f32,
    pub static_friction: f32,
    pub dynamic_friction: f32,
}

impl Material {
    pub fn new(bounciness: f32, static_friction: f32, dynamic_friction: f32) -> Result<Self> {
        for (name, value) in [
            ("bounciness", bounciness),
            ("static friction", static_friction),
            ("dynamic friction", dynamic_friction),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(PhysicsError::InvalidBodyState(format!(
                    "{name} must be in [0, 1], got {value}"
                )));
            }
        }
        Ok(Self {
            bounciness,
            static_friction,
            dynamic_friction,
        })
    }

    /// Perfectly elastic, frictionless.
    pub const ELASTIC: Material = Material {
        bounciness: 1.0,
        static_friction: 0.0,
        dynamic_friction: 0.0,
    };
}

impl Default for Material {
    fn default() -> Self {
        Self {
            bounciness: 0.3,
            static_friction: 0.5,
            dynamic_friction: 0.5,
        }
    }
}

/// Collider shape. Every variant is approximated by a convex vertex hull.
#[derive(Debug, Clone, PartialEq)]
pub enum ColliderShape {
    Cuboid { half_extents: Vec3 },
    Sphere { radius: f32 },
    /// Apex at `+half_height` on Y, base disc at `-half_height`.
    Cone { radius: f32, half_height: f32 },
    /// Axis along Y.
    Cylinder { radius: f32, half_height: f32 },
    ConvexHull { points: Vec<Vec3> },
}

impl ColliderShape {
    /// Check that every dimension of a primitive is positive and finite.
    /// Explicit hulls are checked on their points in [`Collider::new`].
    pub fn validate(&self) -> Result<()> {
        match self {
            ColliderShape::Cuboid { half_extents } => {
                if half_extents.is_finite() && half_extents.min_element() > 0.0 {
                    Ok(())
                } else {
                    Err(PhysicsError::InvalidBodyState(format!(
                        "half extents must be positive and finite, got {half_extents}"
                    )))
                }
            }
            ColliderShape::Sphere { radius } => validate_dimension("radius", *radius),
            ColliderShape::Cone {
                radius,
                half_height,
            }
            | ColliderShape::Cylinder {
                radius,
                half_height,
            } => {
                validate_dimension("radius", *radius)?;
                validate_dimension("half height", *half_height)
            }
            ColliderShape::ConvexHull { .. } => Ok(()),
        }
    }

    /// Local-space hull vertices.
    ///
    /// Vertex order is stable; the support function breaks ties by the
    /// first vertex in this order.
    pub fn hull_vertices(&self) -> Vec<Vec3> {
        match self {
            ColliderShape::Cuboid { half_extents: h } => vec![
                Vec3::new(-h.x, -h.y, -h.z),
                Vec3::new(h.x, -h.y, -h.z),
                Vec3::new(h.x, h.y, -h.z),
                Vec3::new(-h.x, h.y, -h.z),
                Vec3::new(-h.x, -h.y, h.z),
                Vec3::new(h.x, -h.y, h.z),
                Vec3::new(h.x, h.y, h.z),
                Vec3::new(-h.x, h.y, h.z),
            ],
            ColliderShape::Sphere { radius } => {
                let mut points = Vec::with_capacity(SPHERE_RINGS * ROUND_SEGMENTS + 2);
                points.push(Vec3::new(0.0, *radius, 0.0));
                for ring in 1..=SPHERE_RINGS {
                    let theta = PI * ring as f32 / (SPHERE_RINGS + 1) as f32;
                    let y = theta.cos() * radius;
                    ring_points(&mut points, theta.sin() * radius, y);
                }
                points.push(Vec3::new(0.0, -*radius, 0.0));
                points
            }
            ColliderShape::Cone {
                radius,
                half_height,
            } => {
                let mut points = Vec::with_capacity(ROUND_SEGMENTS + 1);
                points.push(Vec3::new(0.0, *half_height, 0.0));
                ring_points(&mut points, *radius, -*half_height);
                points
            }
            ColliderShape::Cylinder {
                radius,
                half_height,
            } => {
                let mut points = Vec::with_capacity(ROUND_SEGMENTS * 2);
                ring_points(&mut points, *radius, *half_height);
                ring_points(&mut points, *radius, -*half_height);
                points
            }
            ColliderShape::ConvexHull { points } => points.clone(),
        }
    }
}

fn validate_dimension(name: &str, value: f32) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(PhysicsError::InvalidBodyState(format!(
            "{name} must be positive and finite, got {value}"
        )))
    }
}

fn ring_points(out: &mut Vec<Vec3>, radius: f32, y: f32) {
    for segment in 0..ROUND_SEGMENTS {
        let phi = TAU * segment as f32 / ROUND_SEGMENTS as f32;
        out.push(Vec3::new(phi.cos() * radius, y, phi.sin() * radius));
    }
}

/// Collision geometry component.
///
/// Holds the local hull and the world-space support geometry derived from
/// it. [`Collider::refresh`] recomputes the world data from a transform; the
/// collision stages only read it.
#[derive(Debug, Clone)]
pub struct Collider {
    shape: ColliderShape,
    local_vertices: Vec<Vec3>,
    world_vertices: Vec<Vec3>,
    world_aabb: PhysicsAabb,
    world_centroid: Vec3,
    zero_volume: bool,
    pub material: Material,
}

impl Collider {
    /// Build a collider. Fails on a non-positive primitive dimension or an
    /// empty or non-finite hull.
    pub fn new(shape: ColliderShape) -> Result<Self> {
        shape.validate()?;
        let local_vertices = shape.hull_vertices();
        if local_vertices.iter().any(|v| !v.is_finite()) {
            return Err(PhysicsError::DegenerateGeometry("non-finite hull vertex"));
        }
        let world_aabb = PhysicsAabb::from_points(&local_vertices)
            .ok_or(PhysicsError::DegenerateGeometry("empty vertex set"))?;

        let mut collider = Self {
            shape,
            world_vertices: local_vertices.clone(),
            local_vertices,
            world_aabb,
            world_centroid: Vec3::ZERO,
            zero_volume: false,
            material: Material::default(),
        };
        collider.update_derived();
        Ok(collider)
    }

    pub fn cuboid(half_extents: Vec3) -> Result<Self> {
        Self::new(ColliderShape::Cuboid { half_extents })
    }

    pub fn sphere(radius: f32) -> Result<Self> {
        Self::new(ColliderShape::Sphere { radius })
    }

    pub fn with_material(mut self, material: Material) -> Self {
        self.material = material;
        self
    }

    pub fn shape(&self) -> &ColliderShape {
        &self.shape
    }

    pub fn local_vertices(&self) -> &[Vec3] {
        &self.local_vertices
    }

    pub fn world_vertices(&self) -> &[Vec3] {
        &self.world_vertices
    }

    pub fn world_aabb(&self) -> &PhysicsAabb {
        &self.world_aabb
    }

    /// Mean of the world vertices.
    pub fn world_centroid(&self) -> Vec3 {
        self.world_centroid
    }

    /// True when the world hull is a point, a segment, or a flat polygon.
    pub fn is_zero_volume(&self) -> bool {
        self.zero_volume
    }

    /// Recompute world vertices, AABB and centroid from `transform`.
    pub fn refresh(&mut self, transform: &Transform) {
        let rotation = transform.quat();
        for (world, local) in self.world_vertices.iter_mut().zip(&self.local_vertices) {
            *world = transform.position + rotation * (*local * transform.scale);
        }
        self.update_derived();
    }

    fn update_derived(&mut self) {
        if let Some(aabb) = PhysicsAabb::from_points(&self.world_vertices) {
            self.world_aabb = aabb;
        }
        let sum: Vec3 = self.world_vertices.iter().copied().sum();
        self.world_centroid = sum / self.world_vertices.len() as f32;
        self.zero_volume = spans_zero_volume(&self.world_vertices);
    }
}

/// Whether `points` fail to span a tetrahedron.
fn spans_zero_volume(points: &[Vec3]) -> bool {
    let Some(&origin) = points.first() else {
        return true;
    };
    let far = farthest_by(points, |p| (p - origin).length_squared());
    let axis = far - origin;
    let scale = axis.length();
    if scale <= FLATNESS_TOLERANCE {
        return true;
    }

    let off_axis = farthest_by(points, |p| (p - origin).cross(axis).length_squared());
    let normal = axis.cross(off_axis - origin);
    if normal.length() <= FLATNESS_TOLERANCE * scale * scale {
        return true;
    }
    let normal = normal.normalize();
    points
        .iter()
        .all(|p| normal.dot(*p - origin).abs() <= FLATNESS_TOLERANCE * scale)
}

fn farthest_by(points: &[Vec3], key: impl Fn(Vec3) -> f32) -> Vec3 {
    points
        .iter()
        .copied()
        .max_by(|a, b| key(*a).total_cmp(&key(*b)))
        .unwrap_or(Vec3::ZERO)
}
