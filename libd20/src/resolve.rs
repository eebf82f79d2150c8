//! Face-up resolution: maps a final orientation to the rolled value.

use crate::geometry::DieMesh;
use crate::{Real, UnitQuaternion, Vector3};

/// Index of the face whose rotated outward normal points most upward.
///
/// Pure function of (mesh, orientation); ties break to the first index,
/// which is fine because exact ties are measure-zero for continuous
/// orientations.
pub fn face_up(mesh: &DieMesh, orientation: &UnitQuaternion<Real>) -> usize {
    let rot = orientation.to_rotation_matrix();
    let up = Vector3::y();
    let mut best = 0usize;
    let mut best_dot = Real::MIN;
    for (i, n) in mesh.normals.iter().enumerate() {
        let d = (rot * n).dot(&up);
        if d > best_dot {
            best_dot = d;
            best = i;
        }
    }
    best
}

/// Value shown by the upward face.
pub fn value_up(mesh: &DieMesh, orientation: &UnitQuaternion<Real>) -> u8 {
    mesh.values[face_up(mesh, orientation)]
}
