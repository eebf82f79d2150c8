//! Error type shared across geometry construction and roll orchestration.

/// Errors surfaced by the public API.
///
/// Stalled simulations are not represented here: a session that exceeds its
/// maximum simulated time is resolved in place from its current orientation
/// rather than failing the roll.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiceError {
    /// The base polyhedron cannot produce a fair die. Returned instead of
    /// silently assigning biased face values.
    #[error("invalid die geometry: {reason}")]
    InvalidGeometry { reason: String },

    /// A roll was requested while another is still in flight. The in-flight
    /// roll is unaffected; callers may treat this as a no-op.
    #[error("a roll is already in flight")]
    RollInFlight,
}

impl DiceError {
    pub(crate) fn geometry(reason: impl Into<String>) -> Self {
        DiceError::InvalidGeometry {
            reason: reason.into(),
        }
    }
}
