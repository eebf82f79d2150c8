//! Static play area and the per-step contact pipeline.

use crate::body::RigidBody;
use crate::shape::CollisionShape;
use crate::{Point3, Real, Vector3, EPS};

/// Baumgarte-style positional correction factor.
const CORRECTION_PERCENT: Real = 0.2;

/// Penetration allowance. Lift-out leaves the body at this depth so contact
/// stays persistent; evacuating fully re-injects energy and can sustain a
/// rocking cycle that never passes rest detection.
const SLOP: Real = 0.01;

/// Fixed-step simulation parameters.
#[derive(Clone, Copy, Debug)]
pub struct SimParams {
    pub gravity: Vector3<Real>,
    /// Fixed physics step.
    pub dt: Real,
    /// A single frame never advances more than this much simulated time.
    pub max_frame_dt: Real,
    /// Substep cap per frame at the fixed step size.
    pub max_substeps: usize,
    pub solver_iterations: usize,
}

impl Default for SimParams {
    fn default() -> Self {
        Self {
            gravity: Vector3::new(0.0, -9.82, 0.0),
            dt: 1.0 / 60.0,
            max_frame_dt: 1.0 / 30.0,
            max_substeps: 3,
            solver_iterations: 12,
        }
    }
}

/// Static half-space boundary. The playable side satisfies n·p >= offset.
#[derive(Clone, Copy, Debug)]
pub struct StaticPlane {
    pub normal: Vector3<Real>,
    pub offset: Real,
}

impl StaticPlane {
    /// Signed height of a point above the plane (negative = penetrating).
    pub fn height_of(&self, p: &Point3<Real>) -> Real {
        self.normal.dot(&p.coords) - self.offset
    }
}

/// Ground plane plus boundary walls. One world per in-flight die; nothing
/// persists across rolls.
#[derive(Clone, Debug)]
pub struct World {
    pub params: SimParams,
    pub planes: Vec<StaticPlane>,
}

impl World {
    /// The standard play area: ground at y = 0, walls at x = ±8 and z = ±6,
    /// all normals pointing into the play volume.
    pub fn standard() -> Self {
        Self::with_params(SimParams::default())
    }

    pub fn with_params(params: SimParams) -> Self {
        let planes = vec![
            StaticPlane {
                normal: Vector3::y(),
                offset: 0.0,
            },
            StaticPlane {
                normal: Vector3::new(-1.0, 0.0, 0.0),
                offset: -8.0,
            },
            StaticPlane {
                normal: Vector3::new(1.0, 0.0, 0.0),
                offset: -8.0,
            },
            StaticPlane {
                normal: Vector3::new(0.0, 0.0, -1.0),
                offset: -6.0,
            },
            StaticPlane {
                normal: Vector3::new(0.0, 0.0, 1.0),
                offset: -6.0,
            },
        ];
        Self { params, planes }
    }

    /// Advance one fixed step: integrate, iterate contact impulses against
    /// every plane, apply rolling resistance, then lift residual penetration
    /// back to slop depth.
    pub fn step(&self, body: &mut RigidBody, shape: &CollisionShape) {
        let dt = self.params.dt;
        body.integrate(self.params.gravity, dt);

        for _ in 0..self.params.solver_iterations {
            for plane in &self.planes {
                let contacts = detect_plane_contacts(body, shape, plane);
                for c in &contacts {
                    resolve_contact(body, c);
                    positional_correction(body, c);
                }
            }
        }

        // rolling resistance torque -> angular damping
        let inv_iw = body.inv_inertia_world();
        let tau = -body.angular_velocity * body.material.roll_resistance * body.mass;
        body.angular_velocity += inv_iw * tau * dt;

        // partial lift-out, plus normal-velocity kill when nearly at rest
        let verts = body.vertices_world(shape);
        for plane in &self.planes {
            let mut min_h = Real::INFINITY;
            for v in &verts {
                min_h = min_h.min(plane.height_of(v));
            }
            if min_h < -SLOP {
                body.position += plane.normal * (-min_h - SLOP);
                let vn = body.velocity.dot(&plane.normal);
                if vn.abs() < 0.1 {
                    body.velocity -= plane.normal * vn;
                }
            }
        }
    }
}

/// Single contact point condensed from one clipped face polygon.
#[derive(Clone, Debug)]
pub struct Contact {
    pub point_world: Point3<Real>,
    /// Mean penetration depth (positive).
    pub penetration: Real,
    /// Body-center-to-contact offset.
    pub r: Vector3<Real>,
    /// Plane normal, pointing into the play volume.
    pub normal: Vector3<Real>,
}

/// Clip each hull face against the plane and condense the submerged part of
/// each into a centroid contact with averaged penetration.
pub fn detect_plane_contacts(
    body: &RigidBody,
    shape: &CollisionShape,
    plane: &StaticPlane,
) -> Vec<Contact> {
    let mut contacts = Vec::new();
    let rot = body.orientation.to_rotation_matrix();

    for face in &shape.faces {
        let poly: Vec<Point3<Real>> = face
            .iter()
            .map(|&vi| body.position + rot * shape.vertices[vi].coords)
            .collect();

        if poly.iter().all(|p| plane.height_of(p) > 0.0) {
            continue;
        }

        let clipped = clip_to_penetrating_side(&poly, plane);
        if clipped.is_empty() {
            continue;
        }

        let mut centroid = Vector3::zeros();
        let mut pen = 0.0;
        for p in &clipped {
            centroid += p.coords;
            pen += -plane.height_of(p);
        }
        let inv = 1.0 / clipped.len() as Real;
        centroid *= inv;
        pen *= inv;

        contacts.push(Contact {
            point_world: Point3::from(centroid),
            penetration: pen.max(0.0),
            r: centroid - body.position.coords,
            normal: plane.normal,
        });
    }

    contacts
}

/// Sutherland-Hodgman clip keeping the half-space height_of(p) <= 0.
fn clip_to_penetrating_side(poly: &[Point3<Real>], plane: &StaticPlane) -> Vec<Point3<Real>> {
    let mut out = Vec::with_capacity(poly.len() + 1);
    for i in 0..poly.len() {
        let a = poly[i];
        let b = poly[(i + 1) % poly.len()];
        let ha = plane.height_of(&a);
        let hb = plane.height_of(&b);
        let a_in = ha <= 0.0;
        let b_in = hb <= 0.0;
        if a_in && b_in {
            out.push(b);
        } else if a_in {
            let t = ha / (ha - hb);
            out.push(a + (b - a) * t);
        } else if b_in {
            let t = ha / (ha - hb);
            out.push(a + (b - a) * t);
            out.push(b);
        }
    }
    out
}

/// Normal + Coulomb friction impulses for one contact against a static plane.
pub fn resolve_contact(body: &mut RigidBody, c: &Contact) {
    let n = c.normal;
    let v_rel = body.velocity + body.angular_velocity.cross(&c.r);
    let vn = v_rel.dot(&n);

    let inv_i = body.inv_inertia_world();
    let r_cross_n = c.r.cross(&n);
    let angular = (inv_i * r_cross_n).cross(&c.r).dot(&n);
    let denom = body.inv_mass + angular;

    let mut jn = 0.0;
    if vn < 0.0 {
        // below the bounce threshold the contact is inelastic
        let e = if -vn > body.material.bounce_threshold {
            body.material.restitution
        } else {
            0.0
        };
        jn = (-(1.0 + e) * vn / denom.max(EPS)).max(0.0);
        body.apply_impulse_at_point(n * jn, c.r);
    }

    // friction acts on the post-normal-impulse tangential velocity
    let v_rel = body.velocity + body.angular_velocity.cross(&c.r);
    let vt = v_rel - n * v_rel.dot(&n);
    let vt_len = vt.norm();
    if vt_len > EPS {
        let t = vt / vt_len;
        let r_cross_t = c.r.cross(&t);
        let ang_t = (inv_i * r_cross_t).cross(&c.r).dot(&t);
        let denom_t = body.inv_mass + ang_t;
        let jt = -v_rel.dot(&t) / denom_t.max(EPS);

        // Coulomb cone: static stick within mu_s * jn, dynamic slide beyond,
        // always opposing the slip direction
        let max_static = body.material.static_friction * jn;
        let jf = if jt.abs() <= max_static {
            jt
        } else {
            jt.signum() * body.material.dynamic_friction * jn
        };
        body.apply_impulse_at_point(t * jf, c.r);
    }
}

/// Positional push-out along the contact normal, leaving slop depth.
pub fn positional_correction(body: &mut RigidBody, c: &Contact) {
    let mag = (c.penetration - SLOP).max(0.0) * CORRECTION_PERCENT;
    if mag > 0.0 {
        body.position += c.normal * mag;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::ContactMaterial;
    use crate::geometry::DieMesh;

    fn die() -> (CollisionShape, RigidBody) {
        let mesh = DieMesh::standard().unwrap();
        let shape = CollisionShape::from_mesh(&mesh);
        let body = RigidBody::new(&shape, 1.0, ContactMaterial::default()).unwrap();
        (shape, body)
    }

    #[test]
    fn resting_penetration_produces_ground_contacts() {
        let (shape, mut body) = die();
        body.position = Point3::new(0.0, 0.7, 0.0); // inradius is ~0.79
        let ground = StaticPlane {
            normal: Vector3::y(),
            offset: 0.0,
        };
        let contacts = detect_plane_contacts(&body, &shape, &ground);
        assert!(!contacts.is_empty());
        for c in &contacts {
            assert!(c.penetration > 0.0);
            assert_eq!(c.normal, Vector3::y());
        }
    }

    #[test]
    fn airborne_body_has_no_contacts() {
        let (shape, mut body) = die();
        body.position = Point3::new(0.0, 5.0, 0.0);
        let ground = StaticPlane {
            normal: Vector3::y(),
            offset: 0.0,
        };
        assert!(detect_plane_contacts(&body, &shape, &ground).is_empty());
    }

    #[test]
    fn fast_drop_bounces_off_the_ground() {
        let world = World::standard();
        let (shape, mut body) = die();
        body.position = Point3::new(0.0, 3.0, 0.0);
        let mut bounced = false;
        for _ in 0..120 {
            world.step(&mut body, &shape);
            if body.velocity.y > 0.5 {
                bounced = true;
                break;
            }
        }
        assert!(bounced, "restitution should reflect a fast impact");
    }

    #[test]
    fn dropped_die_comes_to_rest_on_the_ground() {
        let world = World::standard();
        let (shape, mut body) = die();
        body.position = Point3::new(0.0, 3.0, 0.0);
        body.angular_velocity = Vector3::new(0.5, 1.0, 0.3);
        for _ in 0..600 {
            world.step(&mut body, &shape);
        }
        assert!(body.speed() < 0.2, "still moving: speed {}", body.speed());
        assert!(
            body.position.y > 0.6 && body.position.y < 1.0,
            "not resting at face height: y {}",
            body.position.y
        );
        // lift-out keeps residual penetration within slop
        let min_y = body
            .vertices_world(&shape)
            .iter()
            .map(|v| v.y)
            .fold(Real::INFINITY, Real::min);
        assert!(min_y > -0.02);
    }

    #[test]
    fn walls_keep_a_hard_throw_inside_the_play_area() {
        let world = World::standard();
        let (shape, mut body) = die();
        body.position = Point3::new(-6.0, 6.0, 0.0);
        body.velocity = Vector3::new(10.0, 0.0, 1.0);
        body.angular_velocity = Vector3::new(6.0, 6.0, 6.0);
        for _ in 0..900 {
            world.step(&mut body, &shape);
            assert!(body.position.x.abs() < 9.5);
            assert!(body.position.z.abs() < 7.5);
            assert!(body.position.y > -0.5);
        }
    }
}
