//! GJK intersection test on convex vertex hulls.
//!
//! The simplex grows from a line to a tetrahedron. Every normal is sign
//! corrected against the vector to the origin (or to the opposite vertex)
//! after it is built, never trusted from operand order.

use glam::Vec3;

use super::error::{PhysicsError, Result, Stage};
use super::narrowphase::{support, Simplex};

/// Squared-length threshold below which two support points coincide.
const COINCIDENT_EPSILON: f32 = 1e-12;
/// Relative threshold for a vanishing cross product.
const PARALLEL_EPSILON: f32 = 1e-12;
/// Relative height below which a tetrahedron is considered flat.
const FLAT_EPSILON: f32 = 1e-6;

/// Result of a GJK query.
#[derive(Debug, Clone)]
pub enum GjkOutcome {
    /// The origin cannot be enclosed: the hulls do not overlap.
    Separated,
    /// The tetrahedron encloses the origin.
    Intersecting(Simplex),
}

/// GJK intersection test.
///
/// `direction` seeds the search and must be non-zero. Fails with
/// [`PhysicsError::NonConvergence`] after `max_iterations` support points.
pub fn gjk(
    hull_a: &[Vec3],
    hull_b: &[Vec3],
    direction: Vec3,
    max_iterations: usize,
) -> Result<GjkOutcome> {
    let mut direction = direction;
    let mut simplex = Simplex::new();

    simplex.push(support(hull_a, hull_b, direction)?);
    direction = -direction;

    for _ in 0..max_iterations {
        let new_point = support(hull_a, hull_b, direction)?;
        simplex.push(new_point);

        if new_point.point.dot(direction) <= 0.0 {
            return Ok(GjkOutcome::Separated);
        }

        if evaluate_and_change_dir(&mut simplex, &mut direction)? {
            return Ok(GjkOutcome::Intersecting(simplex));
        }
    }

    Err(PhysicsError::NonConvergence {
        stage: Stage::Gjk,
        iterations: max_iterations,
    })
}

/// Inspect the simplex and pick the next search direction.
/// Returns true if the simplex encloses the origin.
pub fn evaluate_and_change_dir(simplex: &mut Simplex, direction: &mut Vec3) -> Result<bool> {
    match simplex.len() {
        2 => evaluate_line(simplex, direction),
        3 => evaluate_triangle(simplex, direction),
        4 => evaluate_tetrahedron(simplex, direction),
        _ => Ok(false),
    }
}

fn evaluate_line(simplex: &Simplex, direction: &mut Vec3) -> Result<bool> {
    let a = simplex.point(0);
    let b = simplex.point(1);
    let ab = b - a;
    let a0 = -a;

    let ab_len_sq = ab.length_squared();
    if ab_len_sq < COINCIDENT_EPSILON {
        return Err(PhysicsError::DegenerateGeometry("coincident support points"));
    }

    let perpendicular = ab.cross(a0).cross(ab);
    if perpendicular.length_squared() <= PARALLEL_EPSILON * ab_len_sq * ab_len_sq {
        // Origin on the line: any direction orthogonal to it will do.
        *direction = (ab / ab_len_sq.sqrt()).any_orthonormal_vector();
    } else {
        *direction = perpendicular;
    }
    Ok(false)
}

fn evaluate_triangle(simplex: &Simplex, direction: &mut Vec3) -> Result<bool> {
    let a = simplex.point(0);
    let ab = simplex.point(1) - a;
    let ac = simplex.point(2) - a;

    let normal = ab.cross(ac);
    if normal.length_squared() <= PARALLEL_EPSILON * ab.length_squared() * ac.length_squared() {
        return Err(PhysicsError::DegenerateGeometry("collinear triangle simplex"));
    }

    let a0 = -a;
    *direction = if a0.dot(normal) < 0.0 { -normal } else { normal };
    Ok(false)
}

/// Faces of the tetrahedron in test order, each with its opposite vertex.
const TETRAHEDRON_FACES: [([usize; 3], usize); 4] = [
    ([0, 1, 2], 3),
    ([0, 1, 3], 2),
    ([0, 2, 3], 1),
    ([1, 2, 3], 0),
];

fn evaluate_tetrahedron(simplex: &mut Simplex, direction: &mut Vec3) -> Result<bool> {
    for ([i, j, k], opposite) in TETRAHEDRON_FACES {
        let p = simplex.point(i);
        let mut normal = (simplex.point(j) - p)
            .cross(simplex.point(k) - p)
            .normalize_or_zero();
        if normal == Vec3::ZERO {
            return Err(PhysicsError::DegenerateGeometry("zero-area tetrahedron face"));
        }

        let to_opposite = simplex.point(opposite) - p;
        let height = to_opposite.dot(normal);
        if height.abs() <= FLAT_EPSILON * to_opposite.length() {
            return Err(PhysicsError::DegenerateGeometry("flat tetrahedron simplex"));
        }
        if height > 0.0 {
            normal = -normal;
        }

        if (-p).dot(normal) > 0.0 {
            simplex.remove(opposite);
            *direction = normal;
            return Ok(false);
        }
    }

    // Origin is inside the tetrahedron
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collider::{Collider, ColliderShape};
    use crate::physics::narrowphase::SupportPoint;
    use crate::physics::transform::Transform;

    fn hull(shape: ColliderShape, position: Vec3) -> Vec<Vec3> {
        let mut collider = Collider::new(shape).unwrap();
        collider.refresh(&Transform::from_position(position));
        collider.world_vertices().to_vec()
    }

    fn cube(half: Vec3, position: Vec3) -> Vec<Vec3> {
        hull(ColliderShape::Cuboid { half_extents: half }, position)
    }

    fn point(p: Vec3) -> SupportPoint {
        SupportPoint {
            point: p,
            on_a: Vec3::ZERO,
        }
    }

    fn run(a: &[Vec3], b: &[Vec3], centroid_a: Vec3, centroid_b: Vec3) -> GjkOutcome {
        gjk(a, b, centroid_a - centroid_b, 64).unwrap()
    }

    fn overlaps(a: &[Vec3], b: &[Vec3], centroid_a: Vec3, centroid_b: Vec3) -> bool {
        matches!(run(a, b, centroid_a, centroid_b), GjkOutcome::Intersecting(_))
    }

    #[test]
    fn test_gjk_overlapping_boxes() {
        let cases = [
            Vec3::new(1.5, 0.0, 0.0),
            Vec3::new(0.0, -1.9, 0.0),
            Vec3::new(0.3, 0.4, 1.2),
            Vec3::new(-1.0, 1.0, -1.0),
        ];
        for offset in cases {
            let a = cube(Vec3::ONE, Vec3::ZERO);
            let b = cube(Vec3::ONE, offset);
            assert!(overlaps(&a, &b, Vec3::ZERO, offset), "offset {offset}");
        }
    }

    #[test]
    fn test_gjk_separated_boxes() {
        let cases = [
            Vec3::new(2.1, 0.0, 0.0),
            Vec3::new(0.0, 0.0, -2.5),
            Vec3::new(0.0, 2.01, 0.5),
            Vec3::new(3.0, 3.0, 3.0),
        ];
        for offset in cases {
            let a = cube(Vec3::ONE, Vec3::ZERO);
            let b = cube(Vec3::ONE, offset);
            assert!(!overlaps(&a, &b, Vec3::ZERO, offset), "offset {offset}");
        }
    }

    #[test]
    fn test_gjk_rotated_box_gap() {
        // A box rotated 45 degrees about Y reaches sqrt(2) along X, so at
        // x = 2.3 its leading edge pokes into the unit box.
        let mut rotated = Collider::cuboid(Vec3::ONE).unwrap();
        rotated.refresh(
            &Transform::from_position(Vec3::new(2.3, 0.0, 0.0))
                .with_rotation(Vec3::new(0.0, std::f32::consts::FRAC_PI_4, 0.0)),
        );
        let a = cube(Vec3::ONE, Vec3::ZERO);

        assert!(overlaps(&a, rotated.world_vertices(), Vec3::ZERO, rotated.world_centroid()));

        rotated.refresh(
            &Transform::from_position(Vec3::new(2.5, 0.0, 2.5))
                .with_rotation(Vec3::new(0.0, std::f32::consts::FRAC_PI_4, 0.0)),
        );
        assert!(!overlaps(&a, rotated.world_vertices(), Vec3::ZERO, rotated.world_centroid()));
    }

    #[test]
    fn test_gjk_spheres() {
        let a = hull(ColliderShape::Sphere { radius: 1.0 }, Vec3::ZERO);
        let near = Vec3::new(1.0, 0.5, 0.0);
        let b = hull(ColliderShape::Sphere { radius: 1.0 }, near);
        assert!(overlaps(&a, &b, Vec3::ZERO, near));

        let far = Vec3::new(5.0, 0.0, 0.0);
        let b = hull(ColliderShape::Sphere { radius: 1.0 }, far);
        assert!(!overlaps(&a, &b, Vec3::ZERO, far));
    }

    #[test]
    fn test_intersecting_simplex_is_tetrahedron() {
        let a = cube(Vec3::ONE, Vec3::ZERO);
        let b = cube(Vec3::ONE, Vec3::new(0.5, 0.5, 0.5));
        match run(&a, &b, Vec3::ZERO, Vec3::new(0.5, 0.5, 0.5)) {
            GjkOutcome::Intersecting(simplex) => assert_eq!(simplex.len(), 4),
            GjkOutcome::Separated => panic!("boxes overlap"),
        }
    }

    #[test]
    fn test_line_through_origin_picks_orthogonal_direction() {
        let mut simplex = Simplex::new();
        simplex.push(point(Vec3::new(-3.5, 0.0, 0.0)));
        simplex.push(point(Vec3::new(0.5, 0.0, 0.0)));
        let mut direction = Vec3::X;

        assert!(!evaluate_and_change_dir(&mut simplex, &mut direction).unwrap());
        assert!(direction.dot(Vec3::X).abs() < 1e-6);
        assert!(direction.is_normalized());
    }

    #[test]
    fn test_line_direction_points_at_origin() {
        let mut simplex = Simplex::new();
        simplex.push(point(Vec3::new(-1.0, 1.0, 0.0)));
        simplex.push(point(Vec3::new(1.0, 1.0, 0.0)));
        let mut direction = Vec3::ZERO;

        evaluate_and_change_dir(&mut simplex, &mut direction).unwrap();
        let direction = direction.normalize();
        assert!((direction - Vec3::NEG_Y).length() < 1e-6);
    }

    #[test]
    fn test_triangle_normal_faces_origin() {
        let mut simplex = Simplex::new();
        simplex.push(point(Vec3::new(0.0, 0.0, 1.0)));
        simplex.push(point(Vec3::new(1.0, 0.0, 1.0)));
        simplex.push(point(Vec3::new(0.0, 1.0, 1.0)));
        let mut direction = Vec3::ZERO;

        evaluate_and_change_dir(&mut simplex, &mut direction).unwrap();
        assert!(direction.z < 0.0);
        assert_eq!(simplex.len(), 3);
    }

    #[test]
    fn test_tetrahedron_drops_vertex_opposite_origin_face() {
        // Origin lies beyond face abd (the y = 1 side is away from it).
        let mut simplex = Simplex::new();
        simplex.push(point(Vec3::new(-1.0, 1.0, -1.0)));
        simplex.push(point(Vec3::new(1.0, 1.0, -1.0)));
        simplex.push(point(Vec3::new(0.0, 3.0, 0.0)));
        simplex.push(point(Vec3::new(0.0, 1.0, 1.0)));
        let mut direction = Vec3::ZERO;

        // Faces abc and abd are tested first; abd (y = 1 plane) faces the
        // origin, so c is dropped.
        let enclosing = evaluate_and_change_dir(&mut simplex, &mut direction).unwrap();
        assert!(!enclosing);
        assert_eq!(simplex.len(), 3);
        assert_eq!(simplex.point(2), Vec3::new(0.0, 1.0, 1.0));
        assert!((direction - Vec3::NEG_Y).length() < 1e-6);
    }

    #[test]
    fn test_tetrahedron_enclosing_origin() {
        let mut simplex = Simplex::new();
        simplex.push(point(Vec3::new(1.0, 1.0, 1.0)));
        simplex.push(point(Vec3::new(-1.0, -1.0, 1.0)));
        simplex.push(point(Vec3::new(-1.0, 1.0, -1.0)));
        simplex.push(point(Vec3::new(1.0, -1.0, -1.0)));
        let mut direction = Vec3::ZERO;

        assert!(evaluate_and_change_dir(&mut simplex, &mut direction).unwrap());
        assert_eq!(simplex.len(), 4);
    }

    #[test]
    fn test_flat_tetrahedron_is_degenerate() {
        let mut simplex = Simplex::new();
        simplex.push(point(Vec3::new(1.0, 0.0, 0.0)));
        simplex.push(point(Vec3::new(0.0, 1.0, 0.0)));
        simplex.push(point(Vec3::new(-1.0, 0.0, 0.0)));
        simplex.push(point(Vec3::new(0.0, -1.0, 0.0)));
        let mut direction = Vec3::ZERO;

        let result = evaluate_and_change_dir(&mut simplex, &mut direction);
        assert!(matches!(result, Err(PhysicsError::DegenerateGeometry(_))));
    }

    #[test]
    fn test_iteration_cap() {
        let a = cube(Vec3::ONE, Vec3::ZERO);
        let b = cube(Vec3::ONE, Vec3::new(0.5, 0.0, 0.0));
        let result = gjk(&a, &b, Vec3::new(-0.5, 0.0, 0.0), 1);
        assert!(matches!(
            result,
            Err(PhysicsError::NonConvergence {
                stage: Stage::Gjk,
                iterations: 1
            })
        ));
    }
}
