//! Rigid body state and explicit Euler integration.

use glam::Vec3;

use super::error::{PhysicsError, Result};
use super::transform::Transform;

/// Dynamic rigid body state.
///
/// Mass and inertia are validated on construction and through the setters,
/// so the solver can divide by them without checks.
#[derive(Debug, Clone, PartialEq)]
pub struct RigidBody {
    mass: f32,
    /// Diagonal principal moments of inertia.
    inertia_tensor: Vec3,
    pub velocity: Vec3,
    pub angular_velocity: Vec3,
    pub use_gravity: bool,
    /// Center of mass offset in local space.
    center_of_mass: Vec3,
    world_center_of_mass: Vec3,
}

impl RigidBody {
    /// Create a body with explicit mass and principal moments of inertia.
    pub fn new(mass: f32, inertia_tensor: Vec3) -> Result<Self> {
        validate_mass(mass)?;
        validate_inertia(inertia_tensor)?;
        Ok(Self {
            mass,
            inertia_tensor,
            velocity: Vec3::ZERO,
            angular_velocity: Vec3::ZERO,
            use_gravity: true,
            center_of_mass: Vec3::ZERO,
            world_center_of_mass: Vec3::ZERO,
        })
    }

    /// Create a dynamic body whose inertia is `mass` on every axis
    /// (unit sphere approximation).
    pub fn new_dynamic(mass: f32) -> Result<Self> {
        Self::new(mass, Vec3::splat(mass))
    }

    /// Solid cuboid with the given half extents.
    pub fn cuboid(mass: f32, half_extents: Vec3) -> Result<Self> {
        let h2 = half_extents * half_extents;
        let inertia = Vec3::new(h2.y + h2.z, h2.x + h2.z, h2.x + h2.y) * (mass / 3.0);
        Self::new(mass, inertia)
    }

    /// Solid sphere of the given radius.
    pub fn sphere(mass: f32, radius: f32) -> Result<Self> {
        Self::new(mass, Vec3::splat(0.4 * mass * radius * radius))
    }

    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    pub fn with_angular_velocity(mut self, angular_velocity: Vec3) -> Self {
        self.angular_velocity = angular_velocity;
        self
    }

    pub fn with_gravity(mut self, use_gravity: bool) -> Self {
        self.use_gravity = use_gravity;
        self
    }

    pub fn with_center_of_mass(mut self, center_of_mass: Vec3) -> Self {
        self.center_of_mass = center_of_mass;
        self
    }

    #[inline]
    pub fn mass(&self) -> f32 {
        self.mass
    }

    #[inline]
    pub fn inv_mass(&self) -> f32 {
        1.0 / self.mass
    }

    pub fn set_mass(&mut self, mass: f32) -> Result<()> {
        validate_mass(mass)?;
        self.mass = mass;
        Ok(())
    }

    #[inline]
    pub fn inertia_tensor(&self) -> Vec3 {
        self.inertia_tensor
    }

    /// Component-wise inverse of the diagonal inertia tensor.
    #[inline]
    pub fn inverse_inertia(&self) -> Vec3 {
        self.inertia_tensor.recip()
    }

    pub fn set_inertia_tensor(&mut self, inertia_tensor: Vec3) -> Result<()> {
        validate_inertia(inertia_tensor)?;
        self.inertia_tensor = inertia_tensor;
        Ok(())
    }

    #[inline]
    pub fn center_of_mass(&self) -> Vec3 {
        self.center_of_mass
    }

    #[inline]
    pub fn world_center_of_mass(&self) -> Vec3 {
        self.world_center_of_mass
    }

    /// Recompute the world center of mass from the owning transform.
    pub fn update_world_center_of_mass(&mut self, transform: &Transform) {
        self.world_center_of_mass = transform.transform_point(self.center_of_mass);
    }

    /// Velocity of the material point at world position `point`.
    #[inline]
    pub fn point_velocity(&self, point: Vec3) -> Vec3 {
        self.velocity + self.angular_velocity.cross(point - self.world_center_of_mass)
    }

    /// Linear momentum.
    #[inline]
    pub fn momentum(&self) -> Vec3 {
        self.velocity * self.mass
    }
}

fn validate_mass(mass: f32) -> Result<()> {
    if mass.is_finite() && mass > 0.0 {
        Ok(())
    } else {
        Err(PhysicsError::InvalidBodyState(format!(
            "mass must be positive and finite, got {mass}"
        )))
    }
}

fn validate_inertia(inertia: Vec3) -> Result<()> {
    if inertia.is_finite() && inertia.min_element() > 0.0 {
        Ok(())
    } else {
        Err(PhysicsError::InvalidBodyState(format!(
            "inertia tensor components must be positive and finite, got {inertia}"
        )))
    }
}

/// Physical behavior of an entity.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Moved by gravity, its own velocity, and contact impulses.
    Dynamic(RigidBody),
    /// Immovable. Has no velocity to modify.
    Static,
}

impl Body {
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Body::Dynamic(_))
    }

    pub fn as_rigid_body(&self) -> Option<&RigidBody> {
        match self {
            Body::Dynamic(rb) => Some(rb),
            Body::Static => None,
        }
    }

    pub fn as_rigid_body_mut(&mut self) -> Option<&mut RigidBody> {
        match self {
            Body::Dynamic(rb) => Some(rb),
            Body::Static => None,
        }
    }
}

impl From<RigidBody> for Body {
    fn from(rb: RigidBody) -> Self {
        Body::Dynamic(rb)
    }
}

/// Apply gravity to the body's velocity: v += g * dt.
#[inline]
pub fn apply_gravity(rb: &mut RigidBody, gravity: Vec3, dt: f32) {
    if rb.use_gravity {
        rb.velocity += gravity * dt;
    }
}

/// Integrate position and Euler rotation: p += v * dt, r += omega * dt.
///
/// Each Euler component is advanced independently. This drifts for large
/// rotations.
#[inline]
pub fn integrate_position(rb: &RigidBody, transform: &mut Transform, dt: f32) {
    transform.position += rb.velocity * dt;
    transform.rotation += rb.angular_velocity * dt;
}

/// Advance one body by `dt`. Static bodies are left untouched.
pub fn integrate(body: &mut Body, transform: &mut Transform, gravity: Vec3, dt: f32) {
    if let Body::Dynamic(rb) = body {
        apply_gravity(rb, gravity, dt);
        integrate_position(rb, transform, dt);
    }
}
