//! d20 base geometry: canonical icosahedron and antipodal face numbering.

use crate::error::DiceError;
use crate::{Point3, Real, Vector3, EPS};

/// A d20 has exactly twenty triangular faces.
pub const FACE_COUNT: usize = 20;

/// Standard d20 convention: opposite faces sum to 21.
pub const OPPOSITE_FACE_SUM: u8 = 21;

/// A discovered pair's normals must be at least this antiparallel, otherwise
/// the polyhedron is not a usable die shape.
const ANTIPODAL_DOT_MAX: Real = -0.9;

/// Unit-sphere icosahedron face table over the golden-ratio vertex set.
/// CCW viewed from outside.
const BASE_FACES: [[usize; 3]; FACE_COUNT] = [
    [0, 11, 5],
    [0, 5, 1],
    [0, 1, 7],
    [0, 7, 10],
    [0, 10, 11],
    [1, 5, 9],
    [5, 11, 4],
    [11, 10, 2],
    [10, 7, 6],
    [7, 1, 8],
    [3, 9, 4],
    [3, 4, 2],
    [3, 2, 6],
    [3, 6, 8],
    [3, 8, 9],
    [4, 9, 5],
    [2, 4, 11],
    [6, 2, 10],
    [8, 6, 7],
    [9, 8, 1],
];

fn base_vertices() -> [Point3<Real>; 12] {
    // golden-ratio rectangles, each vertex pushed onto the unit sphere
    let t = (1.0 + (5.0 as Real).sqrt()) / 2.0;
    let raw: [[Real; 3]; 12] = [
        [-1.0, t, 0.0],
        [1.0, t, 0.0],
        [-1.0, -t, 0.0],
        [1.0, -t, 0.0],
        [0.0, -1.0, t],
        [0.0, 1.0, t],
        [0.0, -1.0, -t],
        [0.0, 1.0, -t],
        [t, 0.0, -1.0],
        [t, 0.0, 1.0],
        [-t, 0.0, -1.0],
        [-t, 0.0, 1.0],
    ];
    raw.map(|[x, y, z]| Point3::from(Vector3::new(x, y, z).normalize()))
}

/// Numbered d20 mesh: non-indexed triangles (each face owns its three vertex
/// copies), outward unit normals, and the face value table.
///
/// Invariants held by construction: exactly 20 triangles, values are a
/// bijection onto 1..=20, and antipodal faces sum to 21.
#[derive(Clone, Debug)]
pub struct DieMesh {
    pub triangles: Vec<[Point3<Real>; 3]>,
    pub normals: Vec<Vector3<Real>>,
    pub values: Vec<u8>,
}

impl DieMesh {
    /// The canonical radius-1 icosahedron with standard numbering.
    pub fn standard() -> Result<Self, DiceError> {
        let verts = base_vertices();
        let triangles = BASE_FACES
            .iter()
            .map(|&[a, b, c]| [verts[a], verts[b], verts[c]])
            .collect();
        Self::from_triangles(triangles)
    }

    /// Build a die from caller-supplied triangle soup.
    ///
    /// Validates the face count, normal quality, and winding, then numbers
    /// the faces via [`pair_faces`]. Anything that would bias the die is a
    /// hard [`DiceError::InvalidGeometry`].
    pub fn from_triangles(triangles: Vec<[Point3<Real>; 3]>) -> Result<Self, DiceError> {
        if triangles.len() != FACE_COUNT {
            return Err(DiceError::geometry(format!(
                "expected {} triangles, got {}",
                FACE_COUNT,
                triangles.len()
            )));
        }

        let mut normals = Vec::with_capacity(FACE_COUNT);
        for (i, [a, b, c]) in triangles.iter().enumerate() {
            let n = (b - a).cross(&(c - a));
            if !n.iter().all(|x| x.is_finite()) || n.norm_squared() < 1e-12 {
                return Err(DiceError::geometry(format!("face {} is degenerate", i)));
            }
            normals.push(n.normalize());
        }

        // winding check: every normal must point away from the vertex centroid
        let mut centroid = Vector3::zeros();
        for t in &triangles {
            for p in t {
                centroid += p.coords;
            }
        }
        centroid /= (FACE_COUNT * 3) as Real;
        for (i, [a, b, c]) in triangles.iter().enumerate() {
            let center = (a.coords + b.coords + c.coords) / 3.0;
            if normals[i].dot(&(center - centroid)) <= EPS {
                return Err(DiceError::geometry(format!(
                    "face {} winds inward (normal not outward-facing)",
                    i
                )));
            }
        }

        let values = pair_faces(&normals)?;

        Ok(DieMesh {
            triangles,
            normals,
            values,
        })
    }

    /// All 60 owned vertices in face order (triangle i contributes 3i..3i+3).
    pub fn vertices(&self) -> impl Iterator<Item = Point3<Real>> + '_ {
        self.triangles.iter().flatten().copied()
    }
}

/// Greedy nearest-antipodal face numbering.
///
/// Walks faces in index order; each unpaired face is matched with the later
/// unpaired face whose normal dot product is most negative. Pair k (in
/// discovery order, 1-indexed) gets values k and 21-k, so ten pairs cover
/// 1..=20 exactly once. On a regular icosahedron each face has a single true
/// antipode, so the greedy choice is the correct one; a match that is not
/// convincingly antiparallel means the input is malformed and is rejected.
pub fn pair_faces(normals: &[Vector3<Real>]) -> Result<Vec<u8>, DiceError> {
    if normals.len() != FACE_COUNT {
        return Err(DiceError::geometry(format!(
            "expected {} face normals, got {}",
            FACE_COUNT,
            normals.len()
        )));
    }

    let mut values = vec![0u8; FACE_COUNT];
    let mut paired = [false; FACE_COUNT];
    let mut rank = 0u8;

    for i in 0..FACE_COUNT {
        if paired[i] {
            continue;
        }
        let mut best: Option<usize> = None;
        let mut best_dot = Real::MAX;
        for j in (i + 1)..FACE_COUNT {
            if paired[j] {
                continue;
            }
            let d = normals[i].dot(&normals[j]);
            if d < best_dot {
                best_dot = d;
                best = Some(j);
            }
        }
        // 20 faces always leave a partner for the lowest unpaired index
        let j = best.ok_or_else(|| {
            DiceError::geometry(format!("no partner left for face {}", i))
        })?;
        if best_dot > ANTIPODAL_DOT_MAX {
            return Err(DiceError::geometry(format!(
                "faces {} and {} are not antipodal (normal dot {:.3})",
                i, j, best_dot
            )));
        }
        rank += 1;
        values[i] = rank;
        values[j] = OPPOSITE_FACE_SUM - rank;
        paired[i] = true;
        paired[j] = true;
    }

    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn standard_mesh_has_twenty_unit_radius_triangles() {
        let mesh = DieMesh::standard().unwrap();
        assert_eq!(mesh.triangles.len(), FACE_COUNT);
        for p in mesh.vertices() {
            assert_relative_eq!(p.coords.norm(), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn values_are_a_bijection_onto_1_to_20() {
        let mesh = DieMesh::standard().unwrap();
        let mut seen = [false; FACE_COUNT];
        for &v in &mesh.values {
            assert!((1..=20).contains(&v));
            assert!(!seen[(v - 1) as usize], "value {} assigned twice", v);
            seen[(v - 1) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn antipodal_pairs_sum_to_21() {
        let mesh = DieMesh::standard().unwrap();
        for i in 0..FACE_COUNT {
            let partner_value = OPPOSITE_FACE_SUM - mesh.values[i];
            let j = mesh
                .values
                .iter()
                .position(|&v| v == partner_value)
                .unwrap();
            assert!(
                mesh.normals[i].dot(&mesh.normals[j]) < -0.999,
                "partner of face {} is not its geometric antipode",
                i
            );
            assert_eq!(mesh.values[i] + mesh.values[j], OPPOSITE_FACE_SUM);
        }
    }

    #[test]
    fn construction_is_deterministic() {
        let a = DieMesh::standard().unwrap();
        let b = DieMesh::standard().unwrap();
        assert_eq!(a.values, b.values);
        // the canonical table pins the exact assignment
        assert_eq!(
            a.values,
            vec![1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 17, 18, 19, 20, 16, 12, 11, 15, 14, 13]
        );
    }

    #[test]
    fn normals_are_outward_unit_vectors() {
        let mesh = DieMesh::standard().unwrap();
        for (i, n) in mesh.normals.iter().enumerate() {
            assert_relative_eq!(n.norm(), 1.0, epsilon = 1e-5);
            let [a, b, c] = mesh.triangles[i];
            let center = (a.coords + b.coords + c.coords) / 3.0;
            assert!(n.dot(&center) > 0.0, "face {} normal points inward", i);
        }
    }

    #[test]
    fn wrong_triangle_count_is_rejected() {
        let mesh = DieMesh::standard().unwrap();
        let mut triangles = mesh.triangles;
        triangles.pop();
        assert!(matches!(
            DieMesh::from_triangles(triangles),
            Err(DiceError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn degenerate_triangles_are_rejected() {
        let zero = Point3::new(0.0, 0.0, 0.0);
        let triangles = vec![[zero, zero, zero]; FACE_COUNT];
        assert!(matches!(
            DieMesh::from_triangles(triangles),
            Err(DiceError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn parallel_normals_cannot_be_paired() {
        let up = vec![Vector3::y(); FACE_COUNT];
        assert!(matches!(
            pair_faces(&up),
            Err(DiceError::InvalidGeometry { .. })
        ));
    }

    #[test]
    fn flipped_winding_is_rejected() {
        let mesh = DieMesh::standard().unwrap();
        let triangles = mesh
            .triangles
            .into_iter()
            .map(|[a, b, c]| [a, c, b])
            .collect();
        assert!(matches!(
            DieMesh::from_triangles(triangles),
            Err(DiceError::InvalidGeometry { .. })
        ));
    }
}
