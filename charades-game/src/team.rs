//! Teams, per-round score buckets, and deferred penalties.
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::ROUND_COUNT;
use crate::numbers::{apply_delta, subtract_clamped, sum_buckets};
use crate::settings::GameMode;

/// Stable team identity. Assigned once at setup and never reused in a game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TeamId(pub u32);

impl fmt::Display for TeamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "team-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    round_scores: [u32; ROUND_COUNT],
    #[serde(default)]
    pending_round_penalties: [u32; ROUND_COUNT],
    #[serde(default = "default_relevant_rounds")]
    relevant_rounds: usize,
}

const fn default_relevant_rounds() -> usize {
    ROUND_COUNT
}

impl Team {
    #[must_use]
    pub fn new(id: TeamId, name: impl Into<String>, mode: GameMode) -> Self {
        Self {
            id,
            name: name.into(),
            round_scores: [0; ROUND_COUNT],
            pending_round_penalties: [0; ROUND_COUNT],
            relevant_rounds: mode.relevant_rounds(),
        }
    }

    /// Visible total: the sum of the round buckets relevant to the mode.
    #[must_use]
    pub fn score(&self) -> u32 {
        let rounds = self.relevant_rounds.min(ROUND_COUNT);
        sum_buckets(&self.round_scores[..rounds])
    }

    #[must_use]
    pub const fn round_scores(&self) -> &[u32; ROUND_COUNT] {
        &self.round_scores
    }

    #[must_use]
    pub const fn pending_round_penalties(&self) -> &[u32; ROUND_COUNT] {
        &self.pending_round_penalties
    }

    #[must_use]
    pub fn round_score(&self, round: usize) -> Option<u32> {
        self.round_scores.get(round).copied()
    }

    #[must_use]
    pub fn total_pending(&self) -> u32 {
        sum_buckets(&self.pending_round_penalties)
    }

    /// Add `points` (possibly negative) to `round`, flooring the bucket at 0.
    /// Returns `false` when `round` is out of range and nothing changed.
    pub fn add_score(&mut self, points: i64, round: usize) -> bool {
        let Some(bucket) = self.round_scores.get_mut(round) else {
            return false;
        };
        *bucket = apply_delta(*bucket, points);
        true
    }

    /// Subtract `points` now, or bank them for a later reveal when
    /// `reveal_at_end` is set. Returns `false` for an out-of-range round.
    pub fn apply_penalty(&mut self, points: u32, round: usize, reveal_at_end: bool) -> bool {
        if round >= ROUND_COUNT {
            return false;
        }
        if reveal_at_end {
            self.pending_round_penalties[round] =
                self.pending_round_penalties[round].saturating_add(points);
        } else {
            self.round_scores[round] = subtract_clamped(self.round_scores[round], points);
        }
        true
    }

    /// Fold pending penalties into the visible buckets for every round the
    /// mode scores, then zero those pending buckets.
    pub fn reveal_pending_penalties(&mut self, mode: GameMode) {
        let rounds = mode.relevant_rounds().min(ROUND_COUNT);
        for round in 0..rounds {
            let pending = std::mem::take(&mut self.pending_round_penalties[round]);
            self.round_scores[round] = subtract_clamped(self.round_scores[round], pending);
        }
    }

    /// Zero every bucket for a restart.
    pub fn reset_scores(&mut self) {
        self.round_scores = [0; ROUND_COUNT];
        self.pending_round_penalties = [0; ROUND_COUNT];
    }

    /// Re-derive which buckets count toward the score, e.g. after a snapshot
    /// was restored under `mode`.
    pub(crate) fn set_mode(&mut self, mode: GameMode) {
        self.relevant_rounds = mode.relevant_rounds();
    }
}
