//! Convex collision volume derived from the die mesh, plus mass properties.

use crate::error::DiceError;
use crate::geometry::DieMesh;
use crate::{Matrix3, Point3, Real, Vector3};

/// Contact volume over the mesh's 60 owned vertices.
///
/// Triangle i indexes vertices 3i..3i+3, so coincident duplicates remain and
/// the hull is geometrically the icosahedron. Derived read-only from the
/// mesh and rebuilt per roll; convexity of the input is assumed, not checked.
#[derive(Clone, Debug)]
pub struct CollisionShape {
    pub vertices: Vec<Point3<Real>>,
    pub faces: Vec<[usize; 3]>,
}

/// Volume, centroid, and inertia tensor (body frame, about the centroid)
/// for a shape carrying a given total mass.
#[derive(Clone, Debug)]
pub struct MassProperties {
    pub volume: Real,
    pub centroid: Point3<Real>,
    pub inertia: Matrix3<Real>,
}

impl CollisionShape {
    pub fn from_mesh(mesh: &DieMesh) -> Self {
        let vertices = mesh.vertices().collect();
        let faces = (0..mesh.triangles.len())
            .map(|i| [3 * i, 3 * i + 1, 3 * i + 2])
            .collect();
        CollisionShape { vertices, faces }
    }

    /// Integrate mass properties by fanning signed tetrahedra from the origin
    /// through every face. Exact for a closed mesh with outward winding.
    ///
    /// Per tetra (0, a, b, c) with s = a + b + c, the second moment is
    /// ∫ xᵢxⱼ dV = det/120 · (Σₚ pᵢpⱼ + sᵢsⱼ); the inertia about the origin
    /// is then tr(C)·Id − C, moved to the centroid by parallel axis.
    pub fn mass_properties(&self, mass: Real) -> Result<MassProperties, DiceError> {
        let mut vol_acc: Real = 0.0;
        let mut c_acc = Vector3::<Real>::zeros();
        let mut cov = Matrix3::zeros();

        for &[i0, i1, i2] in &self.faces {
            let v0 = self.vertices[i0].coords;
            let v1 = self.vertices[i1].coords;
            let v2 = self.vertices[i2].coords;

            let det = v0.dot(&v1.cross(&v2)); // 6 * signed tetra volume
            vol_acc += det / 6.0;
            c_acc += (v0 + v1 + v2) * (det / 24.0); // tetra centroid (incl. origin) * volume

            let s = v0 + v1 + v2;
            let mut c_tet = v0 * v0.transpose();
            c_tet += v1 * v1.transpose();
            c_tet += v2 * v2.transpose();
            c_tet += s * s.transpose();
            cov += c_tet * (det / 120.0);
        }

        if vol_acc <= 1e-9 {
            return Err(DiceError::geometry(
                "collision shape has zero or negative volume",
            ));
        }

        let centroid = Point3::from(c_acc / vol_acc);
        let density = mass / vol_acc;
        cov *= density;

        let inertia_origin = Matrix3::identity() * cov.trace() - cov;
        let c = centroid.coords;
        let inertia = inertia_origin
            - (Matrix3::identity() * c.dot(&c) - c * c.transpose()) * mass;

        Ok(MassProperties {
            volume: vol_acc,
            centroid,
            inertia,
        })
    }
}
