//! Terms in the shared pool: start cards and team-owned penalty cards.
use serde::{Deserialize, Serialize};

use crate::constants::ROUND_COUNT;
use crate::team::TeamId;

/// A single guessable term.
///
/// Start cards (`assigned_team == None`) are playable by every team from the
/// start of a round. Penalty cards belong to one team and only surface once
/// that team has taken `available_from_team_turn` turns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Term {
    pub text: String,
    #[serde(default)]
    pub english_translation: Option<String>,
    #[serde(default)]
    completed_in_rounds: [bool; ROUND_COUNT],
    #[serde(default)]
    assigned_team: Option<TeamId>,
    #[serde(default)]
    available_from_team_turn: u32,
    #[serde(default)]
    issued_in_play: bool,
}

impl Term {
    /// Create a start card.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            english_translation: None,
            completed_in_rounds: [false; ROUND_COUNT],
            assigned_team: None,
            available_from_team_turn: 0,
            issued_in_play: false,
        }
    }

    #[must_use]
    pub fn with_translation(mut self, translation: impl Into<String>) -> Self {
        self.english_translation = Some(translation.into());
        self
    }

    /// Create a penalty card owned by `team`, selectable once the team's turn
    /// counter reaches `available_from_team_turn`.
    #[must_use]
    pub fn penalty(text: impl Into<String>, team: TeamId, available_from_team_turn: u32) -> Self {
        Self {
            assigned_team: Some(team),
            available_from_team_turn,
            ..Self::new(text)
        }
    }

    /// Penalty card created by a wrong guess during play rather than by setup.
    pub(crate) fn issued_penalty(
        text: impl Into<String>,
        team: TeamId,
        available_from_team_turn: u32,
    ) -> Self {
        Self {
            issued_in_play: true,
            ..Self::penalty(text, team, available_from_team_turn)
        }
    }

    #[must_use]
    pub const fn is_issued_in_play(&self) -> bool {
        self.issued_in_play
    }

    #[must_use]
    pub const fn assigned_team(&self) -> Option<TeamId> {
        self.assigned_team
    }

    #[must_use]
    pub const fn available_from_team_turn(&self) -> u32 {
        self.available_from_team_turn
    }

    #[must_use]
    pub const fn is_start_card(&self) -> bool {
        self.assigned_team.is_none()
    }

    #[must_use]
    pub fn is_owned_by(&self, team: TeamId) -> bool {
        self.assigned_team == Some(team)
    }

    #[must_use]
    pub const fn completed_in_rounds(&self) -> &[bool; ROUND_COUNT] {
        &self.completed_in_rounds
    }

    /// Whether the term has been guessed in `round`. Out-of-range rounds read
    /// as completed so they can never be selected.
    #[must_use]
    pub fn is_completed_in(&self, round: usize) -> bool {
        self.completed_in_rounds.get(round).copied().unwrap_or(true)
    }

    /// Retire the term for `round`. The flag is sticky until `reset`.
    pub fn mark_completed(&mut self, round: usize) {
        if let Some(flag) = self.completed_in_rounds.get_mut(round) {
            *flag = true;
        }
    }

    /// Pre-retire every round except `round`; used when issuing a penalty card
    /// that only matters for the round it was earned in.
    pub(crate) fn retire_all_rounds_except(&mut self, round: usize) {
        for (idx, flag) in self.completed_in_rounds.iter_mut().enumerate() {
            *flag = idx != round;
        }
    }

    /// Whether a team holding `team_turns` turns may play this term in `round`.
    ///
    /// A term owned by another team is never selectable, regardless of how
    /// many turns the querying team has taken.
    #[must_use]
    pub fn is_selectable(&self, round: usize, team: Option<TeamId>, team_turns: u32) -> bool {
        if self.is_completed_in(round) {
            return false;
        }
        match self.assigned_team {
            None => true,
            Some(owner) => {
                team == Some(owner) && team_turns >= self.available_from_team_turn
            }
        }
    }

    /// Clear every completion flag for a fresh game.
    pub fn reset(&mut self) {
        self.completed_in_rounds = [false; ROUND_COUNT];
    }
}
