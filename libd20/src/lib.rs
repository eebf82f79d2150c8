//! libd20: Physically simulated d20 rolls (rigid body + face-up resolution).
//!
//! - Canonical unit icosahedron with opposite faces summing to 21
//! - Convex collision shape with exact tetrahedral mass properties
//! - Semi-implicit integration, impulse contact solver, Coulomb friction,
//!   rolling resistance, rest detection, and face-up determination
//! - Advantage/disadvantage orchestration over one or two staggered dice
//! - Seedable RNG so whole roll sequences can be replayed
//!
//! Public API:
//! - DieMesh::standard() -> numbered d20 geometry
//! - RollSession: one die's isolated world, stepped via advance(elapsed)
//! - Roller::request(mode) / advance(elapsed) -> frame-driven rolls
//! - Roller::roll(mode) -> RollResult (blocking convenience)
//!
//! Example (blocking):
//! let mut roller = Roller::with_seed(7);
//! let result = roller.roll(RollMode::Advantage)?;
//! result.chosen -> max of the two dice

pub use nalgebra::{Matrix3, Point3, Quaternion, UnitQuaternion, Vector3};

pub type Real = f32;

pub(crate) const EPS: Real = 1e-6;

mod body;
mod error;
mod geometry;
mod resolve;
mod roll;
mod session;
mod shape;
mod world;

pub use body::{ContactMaterial, RigidBody};
pub use error::DiceError;
pub use geometry::{DieMesh, FACE_COUNT, OPPOSITE_FACE_SUM, pair_faces};
pub use resolve::{face_up, value_up};
pub use roll::{RollMode, RollResult, Roller};
pub use session::{
    ImpactParams, RestDetector, RestParams, RollSession, SessionEvent, SessionStatus, ThrowParams,
};
pub use shape::{CollisionShape, MassProperties};
pub use world::{SimParams, StaticPlane, World};
