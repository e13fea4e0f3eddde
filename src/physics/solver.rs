//! Single-contact impulse resolution.
//!
//! One impulse per contact along the contact normal, with restitution from
//! the blended material. Velocities are written only when every result is
//! finite.

use glam::Vec3;

use super::contact::{Contact, MaterialBlend, Response};
use super::error::{PhysicsError, Result};
use super::rigid_body::{Body, RigidBody};

/// Resolve a contact between two dynamic bodies.
///
/// `contact.normal` points from A to B. Equal and opposite impulses are
/// applied at `contact.point`. A contact whose bodies are already separating
/// or at rest along the normal gets no impulse and returns
/// [`Response::Separating`].
pub fn resolve_collision(
    rb_a: &mut RigidBody,
    rb_b: &mut RigidBody,
    contact: &Contact,
    bounciness: f32,
) -> Result<Response> {
    let normal = contact.normal;
    let r_a = contact.point - rb_a.world_center_of_mass();
    let r_b = contact.point - rb_b.world_center_of_mass();

    let relative_velocity = rb_b.point_velocity(contact.point) - rb_a.point_velocity(contact.point);
    let contact_velocity = relative_velocity.dot(normal);
    if contact_velocity >= 0.0 {
        return Ok(Response::Separating);
    }

    let inv_inertia_a = rb_a.inverse_inertia();
    let inv_inertia_b = rb_b.inverse_inertia();
    let r_a_cross_n = r_a.cross(normal);
    let r_b_cross_n = r_b.cross(normal);

    let angular =
        (inv_inertia_a * r_a_cross_n).cross(r_a) + (inv_inertia_b * r_b_cross_n).cross(r_b);
    let denominator = rb_a.inv_mass() + rb_b.inv_mass() + normal.dot(angular);
    if !(denominator > 0.0) {
        return Err(PhysicsError::DegenerateGeometry("non-positive effective mass"));
    }

    let j = -(1.0 + bounciness) * contact_velocity / denominator;

    let velocity_a = rb_a.velocity - normal * (j * rb_a.inv_mass());
    let velocity_b = rb_b.velocity + normal * (j * rb_b.inv_mass());
    let angular_a = rb_a.angular_velocity - inv_inertia_a * (r_a_cross_n * j);
    let angular_b = rb_b.angular_velocity + inv_inertia_b * (r_b_cross_n * j);

    if !(velocity_a.is_finite()
        && velocity_b.is_finite()
        && angular_a.is_finite()
        && angular_b.is_finite())
    {
        return Err(PhysicsError::DegenerateGeometry("non-finite impulse"));
    }

    rb_a.velocity = velocity_a;
    rb_b.velocity = velocity_b;
    rb_a.angular_velocity = angular_a;
    rb_b.angular_velocity = angular_b;
    Ok(Response::Resolved)
}

/// Reflect a dynamic body off an immovable one.
///
/// `normal` must point from the static body into `rb`. As with
/// [`resolve_collision`], a separating contact returns
/// [`Response::Separating`] without an impulse.
pub fn reflect_collision(
    rb: &mut RigidBody,
    normal: Vec3,
    point: Vec3,
    bounciness: f32,
) -> Result<Response> {
    let r = point - rb.world_center_of_mass();
    let contact_velocity = rb.point_velocity(point).dot(normal);
    if contact_velocity >= 0.0 {
        return Ok(Response::Separating);
    }

    let inv_inertia = rb.inverse_inertia();
    let r_cross_n = r.cross(normal);
    let denominator = rb.inv_mass() + normal.dot((inv_inertia * r_cross_n).cross(r));
    if !(denominator > 0.0) {
        return Err(PhysicsError::DegenerateGeometry("non-positive effective mass"));
    }

    let j = -(1.0 + bounciness) * contact_velocity / denominator;
    let velocity = rb.velocity + normal * (j * rb.inv_mass());
    let angular_velocity = rb.angular_velocity + inv_inertia * (r_cross_n * j);

    if !(velocity.is_finite() && angular_velocity.is_finite()) {
        return Err(PhysicsError::DegenerateGeometry("non-finite impulse"));
    }

    rb.velocity = velocity;
    rb.angular_velocity = angular_velocity;
    Ok(Response::Reflected)
}

/// Dispatch a contact on the body kinds of the pair.
pub fn resolve_pair(
    body_a: &mut Body,
    body_b: &mut Body,
    contact: &Contact,
    material: &MaterialBlend,
) -> Result<Response> {
    let e = material.bounciness;
    match (body_a, body_b) {
        (Body::Dynamic(a), Body::Dynamic(b)) => resolve_collision(a, b, contact, e),
        // Normal points A -> B, i.e. from the moving body into the static one.
        (Body::Dynamic(a), Body::Static) => reflect_collision(a, -contact.normal, contact.point, e),
        (Body::Static, Body::Dynamic(b)) => reflect_collision(b, contact.normal, contact.point, e),
        (Body::Static, Body::Static) => Ok(Response::Ignored),
    }
}
