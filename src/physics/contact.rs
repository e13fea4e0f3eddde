//! Contact data structures for collision response.

use glam::Vec3;

use super::collider::Material;
use super::EntityHandle;

/// Information about a single contact between two hulls.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Penetration depth.
    pub distance: f32,
    /// Contact point in world space, on the surface of hull A.
    pub point: Vec3,
    /// Unit contact normal (from hull A to hull B).
    pub normal: Vec3,
}

impl Contact {
    /// Whether every component is finite and the normal has unit length.
    pub fn is_well_formed(&self) -> bool {
        self.distance.is_finite()
            && self.distance >= 0.0
            && self.point.is_finite()
            && self.normal.is_finite()
            && self.normal.is_normalized()
    }
}

/// Averaged surface coefficients of a colliding pair.
///
/// Friction is carried for consumers of contact events; the impulse
/// resolver only uses `bounciness`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MaterialBlend {
    pub bounciness: f32,
    pub static_friction: f32,
    pub dynamic_friction: f32,
}

impl MaterialBlend {
    pub fn average(a: &Material, b: &Material) -> Self {
        Self {
            bounciness: (a.bounciness + b.bounciness) * 0.5,
            static_friction: (a.static_friction + b.static_friction) * 0.5,
            dynamic_friction: (a.dynamic_friction + b.dynamic_friction) * 0.5,
        }
    }
}

/// What the impulse resolver did with a contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Both bodies dynamic, equal and opposite impulses applied.
    Resolved,
    /// One dynamic body reflected off a static one.
    Reflected,
    /// Bodies were already separating along the normal.
    Separating,
    /// Neither body is dynamic.
    Ignored,
}

/// A contact detected during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactEvent {
    pub entity_a: EntityHandle,
    pub entity_b: EntityHandle,
    pub contact: Contact,
    pub material: MaterialBlend,
    pub response: Response,
}
