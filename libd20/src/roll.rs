//! Roll orchestration: one or two staggered dice per request, combined
//! per the advantage mode.

use std::fmt;
use std::str::FromStr;

use rand::rngs::SmallRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::DiceError;
use crate::session::{
    ImpactParams, RestParams, RollSession, SessionEvent, SessionStatus, ThrowParams,
};
use crate::Real;

/// Advantage state for a d20 roll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RollMode {
    #[default]
    Normal,
    Advantage,
    Disadvantage,
}

impl RollMode {
    /// Dice simulated for this mode.
    pub fn die_count(&self) -> usize {
        match self {
            RollMode::Normal => 1,
            RollMode::Advantage | RollMode::Disadvantage => 2,
        }
    }

    /// Combine per-die values: max under advantage, min under disadvantage,
    /// pass-through otherwise. None only for an empty slice.
    pub fn combine(&self, rolls: &[u8]) -> Option<u8> {
        match self {
            RollMode::Normal => rolls.first().copied(),
            RollMode::Advantage => rolls.iter().copied().max(),
            RollMode::Disadvantage => rolls.iter().copied().min(),
        }
    }
}

impl fmt::Display for RollMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RollMode::Normal => "normal",
            RollMode::Advantage => "advantage",
            RollMode::Disadvantage => "disadvantage",
        };
        write!(f, "{}", s)
    }
}

impl FromStr for RollMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "normal" => Ok(RollMode::Normal),
            "advantage" | "adv" => Ok(RollMode::Advantage),
            "disadvantage" | "dis" => Ok(RollMode::Disadvantage),
            other => Err(format!(
                "unknown mode '{}': expected normal, advantage, or disadvantage",
                other
            )),
        }
    }
}

/// Outcome of a completed roll request. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RollResult {
    pub mode: RollMode,
    /// Per-die values in throw order (one or two entries).
    pub rolls: Vec<u8>,
    /// Mode-combined outcome.
    pub chosen: u8,
}

struct ActiveRoll {
    mode: RollMode,
    sessions: Vec<RollSession>,
    /// Sessions before this index have been launched; any later one waits
    /// on the stagger timer.
    started: usize,
    stagger_timer: Real,
}

/// Frame-driven roll orchestrator. At most one request is in flight; under
/// advantage or disadvantage the second die launches after a short stagger
/// so the flight paths read as two separate throws.
pub struct Roller {
    rng: SmallRng,
    /// Wall-clock pause between launching the first and second die.
    pub stagger_delay: Real,
    /// Session parameters applied to each die at launch.
    pub throw: ThrowParams,
    pub rest: RestParams,
    pub impact: ImpactParams,
    active: Option<ActiveRoll>,
    pending_events: Vec<(usize, SessionEvent)>,
}

impl Roller {
    /// Roller with OS-seeded randomness.
    pub fn new() -> Self {
        Self::with_rng(SmallRng::from_entropy())
    }

    /// Roller with a fixed seed, for reproducible roll sequences.
    pub fn with_seed(seed: u64) -> Self {
        Self::with_rng(SmallRng::seed_from_u64(seed))
    }

    fn with_rng(rng: SmallRng) -> Self {
        Self {
            rng,
            stagger_delay: 0.12,
            throw: ThrowParams::default(),
            rest: RestParams::default(),
            impact: ImpactParams::default(),
            active: None,
            pending_events: Vec::new(),
        }
    }

    /// Begin a roll. Rejected while another is in flight; the rejected
    /// request does not disturb the in-flight roll.
    pub fn request(&mut self, mode: RollMode) -> Result<(), DiceError> {
        if self.active.is_some() {
            return Err(DiceError::RollInFlight);
        }

        let mut sessions = Vec::with_capacity(mode.die_count());
        for _ in 0..mode.die_count() {
            sessions.push(RollSession::with_params(
                &mut self.rng,
                self.throw,
                self.rest,
                self.impact,
            )?);
        }
        info!(%mode, dice = sessions.len(), "roll requested");

        self.active = Some(ActiveRoll {
            mode,
            sessions,
            started: 1,
            stagger_timer: 0.0,
        });
        Ok(())
    }

    /// Step every launched die by `elapsed` wall-clock seconds, launching a
    /// staggered die when its delay expires. Returns the combined result on
    /// the frame the last die settles.
    pub fn advance(&mut self, elapsed: Real) -> Option<RollResult> {
        let done = {
            let active = self.active.as_mut()?;

            if active.started < active.sessions.len() {
                active.stagger_timer += elapsed;
                if active.stagger_timer >= self.stagger_delay {
                    active.started += 1;
                    debug!(die = active.started, "staggered die launched");
                }
            }

            let mut all_settled = active.started == active.sessions.len();
            for (i, session) in active.sessions[..active.started].iter_mut().enumerate() {
                let status = session.advance(elapsed);
                for event in session.drain_events() {
                    self.pending_events.push((i, event));
                }
                if !matches!(status, SessionStatus::Settled(_)) {
                    all_settled = false;
                }
            }
            all_settled
        };

        if !done {
            return None;
        }

        let active = self.active.take()?;
        let rolls: Vec<u8> = active.sessions.iter().filter_map(|s| s.outcome()).collect();
        let chosen = active.mode.combine(&rolls)?;
        let result = RollResult {
            mode: active.mode,
            rolls,
            chosen,
        };
        info!(mode = %result.mode, rolls = ?result.rolls, chosen = result.chosen, "roll resolved");
        Some(result)
    }

    /// Drive a request to completion at the fixed 60 Hz cadence.
    /// Termination is guaranteed by the per-session stall cutoff.
    pub fn roll(&mut self, mode: RollMode) -> Result<RollResult, DiceError> {
        self.request(mode)?;
        let frame = 1.0 / 60.0;
        loop {
            if let Some(result) = self.advance(frame) {
                return Ok(result);
            }
        }
    }

    /// Abandon the in-flight roll; its sessions (and their worlds) drop here.
    pub fn cancel(&mut self) {
        if let Some(active) = self.active.take() {
            debug!(dice = active.sessions.len(), "roll cancelled");
        }
    }

    pub fn is_rolling(&self) -> bool {
        self.active.is_some()
    }

    /// Launched sessions of the in-flight roll, for pose rendering.
    pub fn sessions(&self) -> &[RollSession] {
        match &self.active {
            Some(a) => &a.sessions[..a.started],
            None => &[],
        }
    }

    /// Take pending (die_index, event) pairs in emission order.
    pub fn drain_events(&mut self) -> Vec<(usize, SessionEvent)> {
        std::mem::take(&mut self.pending_events)
    }
}

impl Default for Roller {
    fn default() -> Self {
        Self::new()
    }
}
