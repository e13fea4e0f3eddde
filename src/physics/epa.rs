//! Expanding polytope algorithm: penetration depth, normal and contact point
//! from a GJK tetrahedron that encloses the origin.
//!
//! Faces live in a slot arena with a free list. Removing a face leaves a
//! hole that the next insertion reuses, so expansion never shifts indices.
//! Vertices are append-only.

use glam::Vec3;

use super::contact::Contact;
use super::error::{PhysicsError, Result, Stage};
use super::narrowphase::{support, Simplex, SupportPoint};

/// Relative squared-area threshold for sliver faces.
const SLIVER_EPSILON: f32 = 1e-12;
/// Faces whose plane passes this close to the origin keep their winding.
const ORIENTATION_EPSILON: f32 = 1e-6;

/// Polytope face with its cached outward normal and distance to the origin.
#[derive(Debug, Clone, Copy)]
struct Face {
    indices: [usize; 3],
    normal: Vec3,
    distance: f32,
}

#[derive(Debug, Default)]
struct Polytope {
    vertices: Vec<SupportPoint>,
    faces: Vec<Option<Face>>,
    free: Vec<usize>,
    live: usize,
}

impl Polytope {
    /// Seed the polytope with the four faces of a tetrahedron, wound so each
    /// normal points away from the opposite vertex.
    fn from_simplex(simplex: &Simplex) -> Result<Self> {
        if simplex.len() != 4 {
            return Err(PhysicsError::DegenerateGeometry("EPA needs a tetrahedron simplex"));
        }

        let mut polytope = Self {
            vertices: simplex.as_slice().to_vec(),
            faces: Vec::with_capacity(16),
            free: Vec::new(),
            live: 0,
        };

        for ([i, j, k], opposite) in [
            ([0, 1, 2], 3),
            ([0, 1, 3], 2),
            ([0, 2, 3], 1),
            ([1, 2, 3], 0),
        ] {
            let p = polytope.vertices[i].point;
            let winding = (polytope.vertices[j].point - p).cross(polytope.vertices[k].point - p);
            let indices = if winding.dot(polytope.vertices[opposite].point - p) > 0.0 {
                [i, k, j]
            } else {
                [i, j, k]
            };
            let face = polytope
                .make_face(indices)
                .ok_or(PhysicsError::DegenerateGeometry("zero-area polytope face"))?;
            polytope.insert(face);
        }

        Ok(polytope)
    }

    /// Build a face from its winding. Returns `None` for a sliver.
    fn make_face(&self, indices: [usize; 3]) -> Option<Face> {
        let a = self.vertices[indices[0]].point;
        let ab = self.vertices[indices[1]].point - a;
        let ac = self.vertices[indices[2]].point - a;

        let cross = ab.cross(ac);
        let len_sq = cross.length_squared();
        if len_sq <= SLIVER_EPSILON * ab.length_squared() * ac.length_squared() {
            return None;
        }

        let mut normal = cross / len_sq.sqrt();
        let mut distance = normal.dot(a);
        if distance < -ORIENTATION_EPSILON {
            normal = -normal;
            distance = -distance;
        }

        Some(Face {
            indices,
            normal,
            distance,
        })
    }

    fn insert(&mut self, face: Face) {
        match self.free.pop() {
            Some(slot) => self.faces[slot] = Some(face),
            None => self.faces.push(Some(face)),
        }
        self.live += 1;
    }

    fn remove(&mut self, slot: usize) -> Option<Face> {
        let face = self.faces[slot].take()?;
        self.free.push(slot);
        self.live -= 1;
        Some(face)
    }

    /// Live face nearest the origin. Ties keep the lowest slot.
    fn closest_face(&self) -> Option<Face> {
        let mut best: Option<Face> = None;
        for face in self.faces.iter().flatten() {
            if best.map_or(true, |b| face.distance < b.distance) {
                best = Some(*face);
            }
        }
        best
    }

    /// Add `point` to the polytope: drop every face it can see and stitch
    /// the resulting hole to the new vertex.
    fn expand(&mut self, point: SupportPoint) -> Result<()> {
        let new_index = self.vertices.len();
        self.vertices.push(point);

        let mut horizon: Vec<(usize, usize)> = Vec::new();
        for slot in 0..self.faces.len() {
            let Some(face) = self.faces[slot] else {
                continue;
            };
            let on_face = self.vertices[face.indices[0]].point;
            if face.normal.dot(point.point - on_face) > 0.0 {
                self.remove(slot);
                let [a, b, c] = face.indices;
                toggle_edge(&mut horizon, a, b);
                toggle_edge(&mut horizon, b, c);
                toggle_edge(&mut horizon, c, a);
            }
        }

        for (e0, e1) in horizon {
            // Slivers along the horizon are dropped.
            if let Some(face) = self.make_face([e0, e1, new_index]) {
                self.insert(face);
            }
        }

        if self.live == 0 {
            return Err(PhysicsError::DegenerateGeometry("polytope has no faces"));
        }
        Ok(())
    }

    /// Point on hull A matching the origin's projection onto `face`.
    fn contact_point(&self, face: &Face, distance: f32) -> Result<Vec3> {
        let [ia, ib, ic] = face.indices;
        let (a, b, c) = (self.vertices[ia], self.vertices[ib], self.vertices[ic]);
        let p = face.normal * distance;

        let v0 = b.point - a.point;
        let v1 = c.point - a.point;
        let v2 = p - a.point;
        let d00 = v0.dot(v0);
        let d01 = v0.dot(v1);
        let d11 = v1.dot(v1);
        let d20 = v2.dot(v0);
        let d21 = v2.dot(v1);

        let denom = d00 * d11 - d01 * d01;
        if denom.abs() <= f32::EPSILON * d00 * d11 {
            return Err(PhysicsError::DegenerateGeometry("zero-area contact face"));
        }

        let v = (d11 * d20 - d01 * d21) / denom;
        let w = (d00 * d21 - d01 * d20) / denom;
        let u = 1.0 - v - w;

        Ok(a.on_a * u + b.on_a * v + c.on_a * w)
    }
}

/// Add the undirected edge `(a, b)`, or cancel it if it is already present.
/// The first insertion's direction is kept.
fn toggle_edge(edges: &mut Vec<(usize, usize)>, a: usize, b: usize) {
    if let Some(pos) = edges
        .iter()
        .position(|&(x, y)| (x == a && y == b) || (x == b && y == a))
    {
        edges.swap_remove(pos);
    } else {
        edges.push((a, b));
    }
}

/// Run EPA on a tetrahedron from GJK.
///
/// Converges when the support point along the closest face normal is less
/// than `tolerance` beyond that face. The depth is the support point's
/// projection onto the normal.
pub fn penetration(
    hull_a: &[Vec3],
    hull_b: &[Vec3],
    simplex: &Simplex,
    max_iterations: usize,
    tolerance: f32,
) -> Result<Contact> {
    let mut polytope = Polytope::from_simplex(simplex)?;

    for _ in 0..max_iterations {
        let face = polytope
            .closest_face()
            .ok_or(PhysicsError::DegenerateGeometry("polytope has no faces"))?;

        let candidate = support(hull_a, hull_b, face.normal)?;
        let distance = candidate.point.dot(face.normal);

        if distance - face.distance < tolerance {
            let distance = distance.max(0.0);
            let point = polytope.contact_point(&face, distance)?;
            return Ok(Contact {
                distance,
                point,
                normal: face.normal,
            });
        }

        polytope.expand(candidate)?;
    }

    Err(PhysicsError::NonConvergence {
        stage: Stage::Epa,
        iterations: max_iterations,
    })
}
