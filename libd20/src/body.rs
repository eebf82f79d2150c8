//! Rigid-body state and integration for a single die.

use crate::error::DiceError;
use crate::shape::CollisionShape;
use crate::{Matrix3, Point3, Quaternion, Real, UnitQuaternion, Vector3, EPS};

/// Contact response parameters, shared by the die and every boundary plane.
#[derive(Clone, Copy, Debug)]
pub struct ContactMaterial {
    pub restitution: Real,
    pub static_friction: Real,
    pub dynamic_friction: Real,
    /// Contact-driven angular damping; keeps a die from rolling forever.
    pub roll_resistance: Real,
    /// Closing speeds below this resolve inelastically, so a settling die
    /// stops micro-bouncing instead of chattering on the plane.
    pub bounce_threshold: Real,
}

impl Default for ContactMaterial {
    fn default() -> Self {
        Self {
            restitution: 0.35,
            static_friction: 0.45,
            dynamic_friction: 0.35,
            roll_resistance: 0.5,
            bounce_threshold: 1.0,
        }
    }
}

/// Mass, inverse mass, inverse inertia in body space, pose, velocities, and
/// the contact material. One body per roll; discarded after resolution.
#[derive(Clone, Debug)]
pub struct RigidBody {
    pub mass: Real,
    pub inv_mass: Real,
    pub inv_inertia_body: Matrix3<Real>,

    // state
    pub position: Point3<Real>,
    pub orientation: UnitQuaternion<Real>,
    pub velocity: Vector3<Real>,
    pub angular_velocity: Vector3<Real>,

    pub material: ContactMaterial,
}

impl RigidBody {
    /// Build a body for a collision shape carrying the given mass.
    ///
    /// Inertia comes from the shape's exact mass properties; a singular
    /// tensor means broken geometry and is reported, not worked around.
    pub fn new(
        shape: &CollisionShape,
        mass: Real,
        material: ContactMaterial,
    ) -> Result<Self, DiceError> {
        let props = shape.mass_properties(mass)?;
        let inv_inertia_body = props
            .inertia
            .try_inverse()
            .ok_or_else(|| DiceError::geometry("inertia tensor is singular"))?;

        Ok(Self {
            mass,
            inv_mass: 1.0 / mass.max(EPS),
            inv_inertia_body,
            position: Point3::origin(),
            orientation: UnitQuaternion::identity(),
            velocity: Vector3::zeros(),
            angular_velocity: Vector3::zeros(),
            material,
        })
    }

    /// Semi-implicit Euler: gravity into velocity, velocity into pose.
    pub fn integrate(&mut self, gravity: Vector3<Real>, dt: Real) {
        self.velocity += gravity * dt;
        self.position += self.velocity * dt;

        // quaternion derivative q' = 0.5 * ω_quat * q
        let w = self.angular_velocity;
        let q = self.orientation.quaternion();
        let dq = Quaternion::from_parts(0.0, w) * q * 0.5 * dt;
        let qnew = Quaternion::new(q.w + dq.w, q.i + dq.i, q.j + dq.j, q.k + dq.k);
        self.orientation = UnitQuaternion::new_normalize(qnew);
    }

    pub fn inv_inertia_world(&self) -> Matrix3<Real> {
        let rot = self.orientation.to_rotation_matrix();
        let r = rot.matrix();
        r * self.inv_inertia_body * r.transpose()
    }

    pub fn apply_impulse_at_point(&mut self, impulse: Vector3<Real>, contact_r: Vector3<Real>) {
        self.velocity += impulse * self.inv_mass;
        let inv_iw = self.inv_inertia_world();
        self.angular_velocity += inv_iw * contact_r.cross(&impulse);
    }

    /// Combined speed |v| + |ω| used by rest detection.
    pub fn speed(&self) -> Real {
        self.velocity.norm() + self.angular_velocity.norm()
    }

    /// World-space shape vertices at the current pose.
    pub fn vertices_world(&self, shape: &CollisionShape) -> Vec<Point3<Real>> {
        let r = self.orientation.to_rotation_matrix();
        shape
            .vertices
            .iter()
            .map(|p| self.position + r * p.coords)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::DieMesh;
    use approx::assert_relative_eq;

    fn test_body() -> RigidBody {
        let mesh = DieMesh::standard().unwrap();
        let shape = CollisionShape::from_mesh(&mesh);
        RigidBody::new(&shape, 1.0, ContactMaterial::default()).unwrap()
    }

    #[test]
    fn gravity_accelerates_downward() {
        let mut body = test_body();
        body.position = Point3::new(0.0, 10.0, 0.0);
        let g = Vector3::new(0.0, -9.82, 0.0);
        let dt = 1.0 / 60.0;
        body.integrate(g, dt);
        assert_relative_eq!(body.velocity.y, -9.82 * dt, epsilon = 1e-6);
        assert!(body.position.y < 10.0);
    }

    #[test]
    fn orientation_stays_unit_under_spin() {
        let mut body = test_body();
        body.angular_velocity = Vector3::new(5.0, 7.0, 3.0);
        for _ in 0..600 {
            body.integrate(Vector3::zeros(), 1.0 / 60.0);
        }
        assert_relative_eq!(body.orientation.quaternion().norm(), 1.0, epsilon = 1e-4);
    }

    #[test]
    fn central_impulse_is_purely_linear() {
        let mut body = test_body();
        body.apply_impulse_at_point(Vector3::new(2.0, 0.0, 0.0), Vector3::zeros());
        assert_relative_eq!(body.velocity.x, 2.0, epsilon = 1e-6);
        assert!(body.angular_velocity.norm() < 1e-6);
    }

    #[test]
    fn offset_impulse_adds_spin() {
        let mut body = test_body();
        body.apply_impulse_at_point(Vector3::new(0.0, 1.0, 0.0), Vector3::new(1.0, 0.0, 0.0));
        assert!(body.angular_velocity.norm() > 0.1);
    }

    #[test]
    fn inertia_of_d20_is_isotropic_in_world_frame() {
        let body = test_body();
        let iw = body.inv_inertia_world();
        // isotropic tensor is rotation-invariant
        assert_relative_eq!(iw[(0, 0)], iw[(1, 1)], epsilon = 1e-4);
        assert_relative_eq!(iw[(1, 1)], iw[(2, 2)], epsilon = 1e-4);
    }
}
