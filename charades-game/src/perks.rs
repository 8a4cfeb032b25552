//! Hook points for the external perk layer.
//!
//! Perk selection and presentation live elsewhere; the engine only applies
//! the mechanical result of a perk to the active turn.
use serde::{Deserialize, Serialize};

use crate::state::{EngineError, GamePhase, TurnState};

/// Mechanical effect requested by a perk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PerkEffect {
    /// Adjust a team's score in the current round.
    ScoreDelta { team_index: usize, points: i64 },
    /// Add or remove seconds from the running turn clock.
    TimerDelta { seconds: i64 },
    /// Pass over the current term without scoring it.
    ForceSkip,
    /// Obscure the term display for the rest of the turn.
    Flicker { on: bool },
}

/// What applying a perk changed, for the driver to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerkOutcome {
    Applied,
    /// The forced skip moved play to `next`, or left nothing to show.
    Skipped { skipped: Option<usize>, next: Option<usize> },
    /// The turn clock now reads `remaining` seconds.
    ClockChanged { remaining: u32 },
}

impl PerkEffect {
    /// Score and skip effects need a live turn; clock and display effects may
    /// also land while the slot reward interstitial is up.
    #[must_use]
    pub const fn allowed_in(self, phase: GamePhase) -> bool {
        match self {
            Self::ScoreDelta { .. } | Self::ForceSkip => matches!(phase, GamePhase::Playing),
            Self::TimerDelta { .. } | Self::Flicker { .. } => {
                matches!(phase, GamePhase::Playing | GamePhase::SlotReward)
            }
        }
    }
}

/// Apply `effect` to the state. Timer deltas only touch the state's clock; the
/// session mirrors them onto the running timer.
///
/// # Errors
///
/// Returns `InvalidTransition` when the effect is not allowed in the current
/// phase; the state is left untouched.
pub fn apply_perk_effect(
    state: &mut TurnState,
    effect: PerkEffect,
) -> Result<PerkOutcome, EngineError> {
    if !effect.allowed_in(state.phase()) {
        return Err(EngineError::InvalidTransition {
            action: "apply a perk",
            phase: state.phase(),
        });
    }
    let outcome = match effect {
        PerkEffect::ScoreDelta { team_index, points } => {
            let round = state.current_round();
            state.add_score(team_index, points, round);
            PerkOutcome::Applied
        }
        PerkEffect::TimerDelta { seconds } => {
            let remaining = crate::numbers::apply_delta(state.turn_time_remaining(), seconds);
            state.set_turn_time_remaining(remaining);
            PerkOutcome::ClockChanged { remaining }
        }
        PerkEffect::ForceSkip => {
            let skipped = state.mark_current_term_as_seen();
            state.set_forced_skip(true);
            let next = state.next_term(skipped);
            PerkOutcome::Skipped { skipped, next }
        }
        PerkEffect::Flicker { on } => {
            state.set_flicker(on);
            PerkOutcome::Applied
        }
    };
    Ok(outcome)
}
