//! Per-roll simulation session: one die's isolated mesh/shape/world/body
//! arena, stepped by a frame driver until it rests and resolves.

use rand::Rng;
use tracing::{debug, warn};

use crate::body::{ContactMaterial, RigidBody};
use crate::error::DiceError;
use crate::geometry::DieMesh;
use crate::resolve;
use crate::shape::CollisionShape;
use crate::world::World;
use crate::{Point3, Real, Vector3};

/// Nominal die mass. Against static planes both impulses and rolling
/// resistance scale through it, so the dynamics are unchanged by its value.
const DIE_MASS: Real = 1.0;

/// Initial-throw randomization. The throw is the sole source of outcome
/// variability; everything downstream is deterministic.
#[derive(Clone, Copy, Debug)]
pub struct ThrowParams {
    pub spawn: Point3<Real>,
    pub forward_speed_min: Real,
    pub forward_speed_spread: Real,
    pub lateral_spread: Real,
    /// Per-component angular velocity bound (uniform in [0, spin_max)).
    pub spin_max: Real,
}

impl Default for ThrowParams {
    fn default() -> Self {
        Self {
            spawn: Point3::new(-6.0, 6.0, 0.0),
            forward_speed_min: 8.0,
            forward_speed_spread: 2.0,
            lateral_spread: 2.0,
            spin_max: 12.0,
        }
    }
}

impl ThrowParams {
    fn sample<R: Rng>(&self, rng: &mut R) -> (Vector3<Real>, Vector3<Real>) {
        let velocity = Vector3::new(
            self.forward_speed_min + rng.gen::<Real>() * self.forward_speed_spread,
            0.0,
            (rng.gen::<Real>() - 0.5) * self.lateral_spread,
        );
        let angular = Vector3::new(
            rng.gen::<Real>() * self.spin_max,
            rng.gen::<Real>() * self.spin_max,
            rng.gen::<Real>() * self.spin_max,
        );
        (velocity, angular)
    }
}

/// Rest-detection thresholds. Empirically tuned values; validate changes by
/// replaying seeded batches rather than reasoning from first principles.
#[derive(Clone, Copy, Debug)]
pub struct RestParams {
    /// Combined |v| + |ω| below this counts as a quiet step.
    pub speed_threshold: Real,
    /// Rest needs strictly more consecutive quiet steps than this.
    pub settle_steps: u32,
    /// Rest also needs the body below this height, so a slow apex mid-air
    /// is never mistaken for rest.
    pub max_height: Real,
    /// Simulated-time safety cutoff; reaching it forces resolution.
    pub max_sim_time: Real,
}

impl Default for RestParams {
    fn default() -> Self {
        Self {
            speed_threshold: 0.2,
            settle_steps: 10,
            max_height: 1.5,
            max_sim_time: 20.0,
        }
    }
}

/// First-ground-impact thresholds: near the ground and moving down fast.
#[derive(Clone, Copy, Debug)]
pub struct ImpactParams {
    pub max_height: Real,
    pub min_down_speed: Real,
}

impl Default for ImpactParams {
    fn default() -> Self {
        Self {
            max_height: 1.2,
            min_down_speed: 2.5,
        }
    }
}

/// Consecutive-quiet-step counter with a height gate.
#[derive(Clone, Debug)]
pub struct RestDetector {
    params: RestParams,
    quiet_steps: u32,
}

impl RestDetector {
    pub fn new(params: RestParams) -> Self {
        Self {
            params,
            quiet_steps: 0,
        }
    }

    /// Feed one step's combined speed and height; true once the body has
    /// stayed quiet long enough while near the ground.
    pub fn observe(&mut self, speed: Real, height: Real) -> bool {
        if speed < self.params.speed_threshold {
            self.quiet_steps += 1;
        } else {
            self.quiet_steps = 0;
        }
        self.quiet_steps > self.params.settle_steps && height < self.params.max_height
    }
}

/// Semantic roll events, consumed by audio/UI hooks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionEvent {
    /// The die was released with its initial throw.
    ThrowStarted,
    /// First hard contact with the ground. Fires at most once per roll.
    GroundImpact,
}

/// Session lifecycle as seen by the driver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionStatus {
    InFlight,
    Settled(u8),
}

/// One roll's arena: geometry, collision shape, world, and body allocated
/// together at throw time and released together when the session drops,
/// on every exit path including cancellation.
pub struct RollSession {
    mesh: DieMesh,
    shape: CollisionShape,
    world: World,
    body: RigidBody,
    rest_params: RestParams,
    rest: RestDetector,
    impact: ImpactParams,
    accumulator: Real,
    sim_time: Real,
    impact_signaled: bool,
    events: Vec<SessionEvent>,
    outcome: Option<u8>,
}

impl RollSession {
    /// Build a fresh die and throw it with default parameters.
    pub fn new<R: Rng>(rng: &mut R) -> Result<Self, DiceError> {
        Self::with_params(
            rng,
            ThrowParams::default(),
            RestParams::default(),
            ImpactParams::default(),
        )
    }

    pub fn with_params<R: Rng>(
        rng: &mut R,
        throw: ThrowParams,
        rest: RestParams,
        impact: ImpactParams,
    ) -> Result<Self, DiceError> {
        let mesh = DieMesh::standard()?;
        let shape = CollisionShape::from_mesh(&mesh);
        let world = World::standard();
        let mut body = RigidBody::new(&shape, DIE_MASS, ContactMaterial::default())?;

        body.position = throw.spawn;
        let (velocity, angular) = throw.sample(rng);
        body.velocity = velocity;
        body.angular_velocity = angular;
        debug!(?velocity, ?angular, "die thrown");

        Ok(Self {
            mesh,
            shape,
            world,
            body,
            rest_params: rest,
            rest: RestDetector::new(rest),
            impact,
            accumulator: 0.0,
            sim_time: 0.0,
            impact_signaled: false,
            events: vec![SessionEvent::ThrowStarted],
            outcome: None,
        })
    }

    /// Advance by wall-clock elapsed seconds, consuming fixed substeps.
    ///
    /// Elapsed time is clamped to the frame cap so a hitch never advances
    /// the simulation too far at once, and at most `max_substeps` fixed
    /// steps run per call.
    pub fn advance(&mut self, elapsed: Real) -> SessionStatus {
        if let Some(v) = self.outcome {
            return SessionStatus::Settled(v);
        }

        let params = self.world.params;
        self.accumulator += elapsed.clamp(0.0, params.max_frame_dt);

        let mut substeps = 0;
        while self.accumulator >= params.dt && substeps < params.max_substeps {
            self.accumulator -= params.dt;
            substeps += 1;
            self.step_once();
            if self.outcome.is_some() {
                break;
            }
        }

        match self.outcome {
            Some(v) => SessionStatus::Settled(v),
            None => SessionStatus::InFlight,
        }
    }

    fn step_once(&mut self) {
        self.world.step(&mut self.body, &self.shape);
        self.sim_time += self.world.params.dt;

        if !self.impact_signaled
            && self.body.position.y < self.impact.max_height
            && self.body.velocity.y <= -self.impact.min_down_speed
        {
            self.impact_signaled = true;
            self.events.push(SessionEvent::GroundImpact);
            debug!(speed = self.body.velocity.norm(), "ground impact");
        }

        if self.rest.observe(self.body.speed(), self.body.position.y) {
            let value = resolve::value_up(&self.mesh, &self.body.orientation);
            debug!(value, sim_time = self.sim_time, "die settled");
            self.outcome = Some(value);
        } else if self.sim_time >= self.rest_params.max_sim_time {
            // never hang a roll: resolve from the current orientation
            let value = resolve::value_up(&self.mesh, &self.body.orientation);
            warn!(
                value,
                sim_time = self.sim_time,
                speed = self.body.speed(),
                "rest never detected, forcing resolution"
            );
            self.outcome = Some(value);
        }
    }

    /// Current body pose, for renderers following the die.
    pub fn body(&self) -> &RigidBody {
        &self.body
    }

    pub fn mesh(&self) -> &DieMesh {
        &self.mesh
    }

    pub fn outcome(&self) -> Option<u8> {
        self.outcome
    }

    pub fn sim_time(&self) -> Real {
        self.sim_time
    }

    /// Take all pending events in emission order.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }
}
