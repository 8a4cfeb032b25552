use log::{debug, info, warn};
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use thiserror::Error;

use crate::constants::{SCAN_BOUND_FACTOR, SHUFFLE_DOMAIN};
use crate::seed::rng_for;
use crate::settings::{GameMode, RoundKind, Settings};
use crate::team::{Team, TeamId};
use crate::term::Term;

/// Lifecycle of a game.
///
/// `Setup -> Playing -> (RoundEnd <-> Playing) -> GameEnd`, with the
/// `SlotReward` interstitial entered from and returning to `Playing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    #[default]
    Setup,
    Playing,
    SlotReward,
    RoundEnd,
    GameEnd,
}

impl GamePhase {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Setup => "setup",
            Self::Playing => "playing",
            Self::SlotReward => "slot_reward",
            Self::RoundEnd => "round_end",
            Self::GameEnd => "game_end",
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by phase transitions.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum EngineError {
    #[error("a game needs at least one team before play can start")]
    NoTeams,
    #[error("cannot {action} during the {phase} phase")]
    InvalidTransition {
        action: &'static str,
        phase: GamePhase,
    },
}

/// The turn and round aggregate.
///
/// Owns the team list and the term pool exclusively. `current_term_index` is a
/// cursor rather than a pointer: every read resolves it to the nearest term the
/// active team may play, so completions elsewhere never invalidate it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "TurnStateRecord")]
pub struct TurnState {
    settings: Settings,
    teams: Vec<Team>,
    terms: Vec<Term>,
    phase: GamePhase,
    current_round: usize,
    current_team_index: usize,
    current_term_index: usize,
    round_starting_team_index: usize,
    seen_terms_in_current_turn: BTreeSet<usize>,
    seen_terms_in_current_round: BTreeSet<usize>,
    team_turn_counters: BTreeMap<TeamId, u32>,
    team_hit_streaks: BTreeMap<TeamId, u32>,
    turn_time_remaining: u32,
    forced_skip: bool,
    flicker: bool,
    seed: u64,
    shuffle_generation: u64,
}

/// Wire shape of [`TurnState`]. Restoring goes through it so team scoring is
/// re-derived from the stored settings rather than trusted from the snapshot.
#[derive(Deserialize)]
struct TurnStateRecord {
    settings: Settings,
    teams: Vec<Team>,
    terms: Vec<Term>,
    phase: GamePhase,
    current_round: usize,
    current_team_index: usize,
    current_term_index: usize,
    round_starting_team_index: usize,
    #[serde(default)]
    seen_terms_in_current_turn: BTreeSet<usize>,
    #[serde(default)]
    seen_terms_in_current_round: BTreeSet<usize>,
    #[serde(default)]
    team_turn_counters: BTreeMap<TeamId, u32>,
    #[serde(default)]
    team_hit_streaks: BTreeMap<TeamId, u32>,
    turn_time_remaining: u32,
    #[serde(default)]
    forced_skip: bool,
    #[serde(default)]
    flicker: bool,
    seed: u64,
    #[serde(default)]
    shuffle_generation: u64,
}

impl From<TurnStateRecord> for TurnState {
    fn from(record: TurnStateRecord) -> Self {
        let mut teams = record.teams;
        for team in &mut teams {
            team.set_mode(record.settings.mode);
        }
        Self {
            settings: record.settings,
            teams,
            terms: record.terms,
            phase: record.phase,
            current_round: record.current_round,
            current_team_index: record.current_team_index,
            current_term_index: record.current_term_index,
            round_starting_team_index: record.round_starting_team_index,
            seen_terms_in_current_turn: record.seen_terms_in_current_turn,
            seen_terms_in_current_round: record.seen_terms_in_current_round,
            team_turn_counters: record.team_turn_counters,
            team_hit_streaks: record.team_hit_streaks,
            turn_time_remaining: record.turn_time_remaining,
            forced_skip: record.forced_skip,
            flicker: record.flicker,
            seed: record.seed,
            shuffle_generation: record.shuffle_generation,
        }
    }
}

impl TurnState {
    /// Build a state in the `Setup` phase. Teams get ids in configuration order.
    #[must_use]
    pub fn new(settings: &Settings, terms: Vec<Term>, seed: u64) -> Self {
        let mode = settings.mode;
        let teams: Vec<Team> = settings
            .team_names
            .iter()
            .zip(0_u32..)
            .map(|(name, id)| Team::new(TeamId(id), name.trim(), mode))
            .collect();
        let team_turn_counters = teams.iter().map(|t| (t.id, 0)).collect();
        let team_hit_streaks = teams.iter().map(|t| (t.id, 0)).collect();
        Self {
            settings: settings.clone(),
            teams,
            terms,
            phase: GamePhase::Setup,
            current_round: mode.first_round(),
            current_team_index: 0,
            current_term_index: 0,
            round_starting_team_index: 0,
            seen_terms_in_current_turn: BTreeSet::new(),
            seen_terms_in_current_round: BTreeSet::new(),
            team_turn_counters,
            team_hit_streaks,
            turn_time_remaining: settings.turn_seconds,
            forced_skip: false,
            flicker: false,
            seed,
            shuffle_generation: 0,
        }
    }

    // Accessors ------------------------------------------------------------

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub const fn mode(&self) -> GameMode {
        self.settings.mode
    }

    #[must_use]
    pub const fn phase(&self) -> GamePhase {
        self.phase
    }

    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    #[must_use]
    pub const fn current_round(&self) -> usize {
        self.current_round
    }

    #[must_use]
    pub fn round_kind(&self) -> Option<RoundKind> {
        RoundKind::from_index(self.current_round)
    }

    #[must_use]
    pub const fn current_team_index(&self) -> usize {
        self.current_team_index
    }

    #[must_use]
    pub const fn current_term_index(&self) -> usize {
        self.current_term_index
    }

    #[must_use]
    pub const fn round_starting_team_index(&self) -> usize {
        self.round_starting_team_index
    }

    #[must_use]
    pub fn teams(&self) -> &[Team] {
        &self.teams
    }

    #[must_use]
    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    #[must_use]
    pub fn team(&self, id: TeamId) -> Option<&Team> {
        self.teams.iter().find(|t| t.id == id)
    }

    #[must_use]
    pub fn active_team(&self) -> Option<&Team> {
        self.teams.get(self.current_team_index)
    }

    #[must_use]
    pub fn active_team_id(&self) -> Option<TeamId> {
        self.active_team().map(|t| t.id)
    }

    #[must_use]
    pub const fn seen_terms_in_current_turn(&self) -> &BTreeSet<usize> {
        &self.seen_terms_in_current_turn
    }

    #[must_use]
    pub const fn seen_terms_in_current_round(&self) -> &BTreeSet<usize> {
        &self.seen_terms_in_current_round
    }

    /// Turns started by `team` so far this game.
    #[must_use]
    pub fn team_turns(&self, team: TeamId) -> u32 {
        self.team_turn_counters.get(&team).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn hit_streak(&self, team: TeamId) -> u32 {
        self.team_hit_streaks.get(&team).copied().unwrap_or(0)
    }

    #[must_use]
    pub const fn turn_time_remaining(&self) -> u32 {
        self.turn_time_remaining
    }

    #[must_use]
    pub const fn flicker(&self) -> bool {
        self.flicker
    }

    /// Whether a perk forced a skip during this turn.
    #[must_use]
    pub const fn forced_skip(&self) -> bool {
        self.forced_skip
    }

    /// Teams sharing the highest visible score.
    #[must_use]
    pub fn leaders(&self) -> Vec<&Team> {
        let Some(best) = self.teams.iter().map(Team::score).max() else {
            return Vec::new();
        };
        self.teams.iter().filter(|t| t.score() == best).collect()
    }

    // Selection ------------------------------------------------------------

    /// Whether the term at `index` is playable by `team` in the current round.
    #[must_use]
    pub fn is_selectable(&self, index: usize, team: Option<TeamId>) -> bool {
        let turns = team.map_or(0, |id| self.team_turns(id));
        self.terms
            .get(index)
            .is_some_and(|term| term.is_selectable(self.current_round, team, turns))
    }

    fn is_selectable_for_active(&self, index: usize) -> bool {
        self.is_selectable(index, self.active_team_id())
    }

    /// Every index the active team could play this round, seen or not.
    #[must_use]
    pub fn available_indices(&self) -> Vec<usize> {
        (0..self.terms.len())
            .filter(|&idx| self.is_selectable_for_active(idx))
            .collect()
    }

    #[must_use]
    pub fn remaining_terms_count(&self) -> usize {
        self.available_indices().len()
    }

    /// Resolve the cursor to the first playable index at or after it.
    #[must_use]
    pub fn resolve_current_index(&self) -> Option<usize> {
        let len = self.terms.len();
        (0..len)
            .map(|step| (self.current_term_index + step) % len)
            .find(|&idx| self.is_selectable_for_active(idx))
    }

    #[must_use]
    pub fn current_term(&self) -> Option<&Term> {
        self.resolve_current_index()
            .and_then(|idx| self.terms.get(idx))
    }

    /// Move the cursor to the next term the active team has not seen this turn.
    ///
    /// `avoiding` is passed over once when some other candidate exists, so a
    /// just-skipped term does not reappear immediately but is still returned
    /// when it is the only option left. Returns `None` without touching the
    /// cursor when the team has nothing left to see this turn.
    pub fn next_term(&mut self, avoiding: Option<usize>) -> Option<usize> {
        let candidates: Vec<usize> = self
            .available_indices()
            .into_iter()
            .filter(|idx| !self.seen_terms_in_current_turn.contains(idx))
            .collect();
        if candidates.is_empty() {
            debug!(
                "no unseen terms left for team index {} in round {}",
                self.current_team_index, self.current_round
            );
            return None;
        }

        let len = self.terms.len();
        let start = self
            .resolve_current_index()
            .unwrap_or(self.current_term_index % len);
        let may_avoid = avoiding.is_some_and(|avoid| candidates.iter().any(|&c| c != avoid));
        let mut avoided = false;

        for step in 1..=SCAN_BOUND_FACTOR * len {
            let idx = (start + step) % len;
            if !self.is_selectable_for_active(idx) || self.seen_terms_in_current_turn.contains(&idx)
            {
                continue;
            }
            if may_avoid && !avoided && avoiding == Some(idx) {
                avoided = true;
                continue;
            }
            debug!("cursor moved from {start} to {idx}");
            self.current_term_index = idx;
            return Some(idx);
        }
        None
    }

    /// Retire the current term for this round and record it as seen.
    pub fn mark_current_term_completed(&mut self) -> Option<usize> {
        let idx = self.resolve_current_index()?;
        let round = self.current_round;
        if let Some(term) = self.terms.get_mut(idx) {
            term.mark_completed(round);
        }
        self.record_seen(idx);
        Some(idx)
    }

    /// Record a pass on the current term without retiring it.
    pub fn mark_current_term_as_seen(&mut self) -> Option<usize> {
        let idx = self.resolve_current_index()?;
        self.record_seen(idx);
        Some(idx)
    }

    fn record_seen(&mut self, idx: usize) {
        self.current_term_index = idx;
        self.seen_terms_in_current_turn.insert(idx);
        self.seen_terms_in_current_round.insert(idx);
    }

    /// True once every uncompleted start card and every penalty card currently
    /// eligible for the active team has been shown this turn.
    #[must_use]
    pub fn has_team_seen_all_available_terms_for_turn(&self) -> bool {
        (0..self.terms.len())
            .filter(|&idx| self.is_selectable_for_active(idx))
            .all(|idx| self.seen_terms_in_current_turn.contains(&idx))
    }

    /// Like the per-turn check but also counts the active team's penalty cards
    /// that are not yet eligible. Diagnostic only; never ends a turn.
    #[must_use]
    pub fn has_team_seen_all_available_terms(&self) -> bool {
        let team = self.active_team_id();
        let round = self.current_round;
        self.terms
            .iter()
            .enumerate()
            .filter(|(_, term)| {
                !term.is_completed_in(round)
                    && (term.is_start_card() || team.is_some_and(|id| term.is_owned_by(id)))
            })
            .all(|(idx, _)| self.seen_terms_in_current_turn.contains(&idx))
    }

    /// Penalty cards `team` still has to clear this round, eligible or not.
    #[must_use]
    pub fn outstanding_penalty_cards(&self, team: TeamId) -> usize {
        let round = self.current_round;
        self.terms
            .iter()
            .filter(|term| term.is_owned_by(team) && !term.is_completed_in(round))
            .count()
    }

    /// A round is over once every start card is done and at least one team
    /// has no penalty cards left. Other teams' leftovers are dropped.
    #[must_use]
    pub fn all_terms_completed_for_current_round(&self) -> bool {
        let round = self.current_round;
        let start_cards_done = self
            .terms
            .iter()
            .filter(|term| term.is_start_card())
            .all(|term| term.is_completed_in(round));
        start_cards_done
            && self
                .teams
                .iter()
                .any(|team| self.outstanding_penalty_cards(team.id) == 0)
    }

    /// Append a penalty card for `team` that only counts in the current round
    /// and becomes playable after `delay` more turns of that team.
    pub fn issue_penalty_card(
        &mut self,
        text: impl Into<String>,
        team: TeamId,
        delay: u32,
    ) -> Option<usize> {
        if self.team(team).is_none() {
            warn!("ignoring penalty card for unknown {team}");
            return None;
        }
        let available_from = self.team_turns(team).saturating_add(delay);
        let mut card = Term::issued_penalty(text, team, available_from);
        card.retire_all_rounds_except(self.current_round);
        self.terms.push(card);
        let idx = self.terms.len() - 1;
        debug!("issued penalty card {idx} to {team}, playable from turn {available_from}");
        Some(idx)
    }

    // Turn and team rotation -----------------------------------------------

    /// Begin the active team's turn: fresh seen set, full clock, streak reset,
    /// and one more turn on the team's counter.
    pub fn start_new_turn(&mut self) {
        self.seen_terms_in_current_turn.clear();
        self.turn_time_remaining = self.settings.turn_seconds;
        self.forced_skip = false;
        self.flicker = false;
        if let Some(id) = self.active_team_id() {
            *self.team_turn_counters.entry(id).or_insert(0) += 1;
            self.team_hit_streaks.insert(id, 0);
            debug!("{id} starts turn {}", self.team_turns(id));
        }
    }

    /// Hand play to the next team. The term cursor carries over so teams keep
    /// working through the pool rather than restarting at the front.
    pub fn next_team(&mut self) {
        if self.teams.is_empty() {
            return;
        }
        self.current_team_index = (self.current_team_index + 1) % self.teams.len();
        self.turn_time_remaining = self.settings.turn_seconds;
        self.seen_terms_in_current_turn.clear();
        debug!("team index {} is up", self.current_team_index);
    }

    /// Count a correct guess toward the active team's streak.
    pub fn record_hit(&mut self) -> u32 {
        let Some(id) = self.active_team_id() else {
            return 0;
        };
        let streak = self.team_hit_streaks.entry(id).or_insert(0);
        *streak += 1;
        *streak
    }

    pub fn break_streak(&mut self) {
        if let Some(id) = self.active_team_id() {
            self.team_hit_streaks.insert(id, 0);
        }
    }

    // Clock ----------------------------------------------------------------

    /// Consume `elapsed` seconds; returns `true` when the clock hits zero.
    pub fn tick(&mut self, elapsed: u32) -> bool {
        self.turn_time_remaining = self.turn_time_remaining.saturating_sub(elapsed);
        self.turn_time_remaining == 0
    }

    pub fn time_out(&mut self) {
        self.turn_time_remaining = 0;
    }

    pub fn set_turn_time_remaining(&mut self, seconds: u32) {
        self.turn_time_remaining = seconds;
    }

    pub fn set_flicker(&mut self, on: bool) {
        self.flicker = on;
    }

    pub fn set_forced_skip(&mut self, on: bool) {
        self.forced_skip = on;
    }

    // Phase transitions ----------------------------------------------------

    /// `Setup -> Playing`. Refuses to start without teams.
    ///
    /// # Errors
    ///
    /// Returns `NoTeams` for an empty team list, or `InvalidTransition` when the
    /// game is not in `Setup`.
    pub fn start_game(&mut self) -> Result<GamePhase, EngineError> {
        if self.phase != GamePhase::Setup {
            return Err(self.invalid("start the game"));
        }
        if self.teams.is_empty() {
            return Err(EngineError::NoTeams);
        }
        self.current_round = self.mode().first_round();
        self.current_team_index = self.round_starting_team_index;
        self.turn_time_remaining = self.settings.turn_seconds;
        self.phase = GamePhase::Playing;
        info!(
            "game started: mode {}, {} teams, {} terms",
            self.mode(),
            self.teams.len(),
            self.terms.len()
        );
        Ok(self.phase)
    }

    /// `Playing -> RoundEnd`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` outside `Playing`.
    pub fn end_round(&mut self) -> Result<GamePhase, EngineError> {
        if self.phase != GamePhase::Playing {
            return Err(self.invalid("end the round"));
        }
        self.phase = GamePhase::RoundEnd;
        info!("round {} ended", self.current_round);
        Ok(self.phase)
    }

    /// `Playing -> SlotReward`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` outside `Playing`.
    pub fn enter_slot_reward(&mut self) -> Result<GamePhase, EngineError> {
        if self.phase != GamePhase::Playing {
            return Err(self.invalid("enter the slot reward"));
        }
        self.phase = GamePhase::SlotReward;
        Ok(self.phase)
    }

    /// `SlotReward -> Playing`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` outside `SlotReward`.
    pub fn resume_from_slot_reward(&mut self) -> Result<GamePhase, EngineError> {
        if self.phase != GamePhase::SlotReward {
            return Err(self.invalid("resume from the slot reward"));
        }
        self.phase = GamePhase::Playing;
        Ok(self.phase)
    }

    /// Advance to the next round the mode plays, or finish the game.
    ///
    /// Side effects on advancing: the starting team moves one seat past this
    /// round's starter, the cursor returns to 0, both seen sets and the clock
    /// reset, and the pool is reshuffled when the settings ask for it.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the game is `Playing` or `RoundEnd`.
    pub fn next_round(&mut self) -> Result<GamePhase, EngineError> {
        if !matches!(self.phase, GamePhase::Playing | GamePhase::RoundEnd) {
            return Err(self.invalid("advance the round"));
        }
        let Some(next) = self.mode().next_round_from(self.current_round + 1) else {
            self.phase = GamePhase::GameEnd;
            info!("game over after round {}", self.current_round);
            return Ok(self.phase);
        };

        self.current_round = next;
        if !self.teams.is_empty() {
            self.round_starting_team_index =
                (self.round_starting_team_index + 1) % self.teams.len();
        }
        self.current_team_index = self.round_starting_team_index;
        self.current_term_index = 0;
        self.seen_terms_in_current_turn.clear();
        self.seen_terms_in_current_round.clear();
        self.turn_time_remaining = self.settings.turn_seconds;
        if self.settings.reshuffle_each_round {
            self.reshuffle();
        }
        self.phase = GamePhase::Playing;
        info!(
            "round {next} ({}) begins with team index {}",
            RoundKind::from_index(next).map_or("unknown", RoundKind::key),
            self.current_team_index
        );
        Ok(self.phase)
    }

    /// Return to `Setup` for a rematch with the same teams and pool: flags,
    /// scores, counters and cursors reset; penalty cards issued in play are
    /// discarded.
    pub fn restart(&mut self) {
        self.terms.retain(|term| !term.is_issued_in_play());
        for term in &mut self.terms {
            term.reset();
        }
        for team in &mut self.teams {
            team.reset_scores();
        }
        for counter in self.team_turn_counters.values_mut() {
            *counter = 0;
        }
        for streak in self.team_hit_streaks.values_mut() {
            *streak = 0;
        }
        self.phase = GamePhase::Setup;
        self.current_round = self.mode().first_round();
        self.current_team_index = 0;
        self.current_term_index = 0;
        self.round_starting_team_index = 0;
        self.seen_terms_in_current_turn.clear();
        self.seen_terms_in_current_round.clear();
        self.turn_time_remaining = self.settings.turn_seconds;
        self.forced_skip = false;
        self.flicker = false;
        self.shuffle_generation = 0;
        info!("game reset to setup");
    }

    fn reshuffle(&mut self) {
        let mut rng = rng_for(self.seed, SHUFFLE_DOMAIN, self.shuffle_generation);
        self.terms.shuffle(&mut rng);
        self.shuffle_generation += 1;
        debug!("pool reshuffled (generation {})", self.shuffle_generation);
    }

    const fn invalid(&self, action: &'static str) -> EngineError {
        EngineError::InvalidTransition {
            action,
            phase: self.phase,
        }
    }

    // Scoring --------------------------------------------------------------

    /// Add `points` to a team's bucket for `round`. Out-of-range indices are
    /// ignored.
    pub fn add_score(&mut self, team_index: usize, points: i64, round: usize) {
        let applied = self
            .teams
            .get_mut(team_index)
            .is_some_and(|team| team.add_score(points, round));
        if !applied {
            warn!("ignored score of {points} for team index {team_index}, round {round}");
        }
    }

    /// Penalize a team now, or bank the penalty when `reveal_at_end` is set.
    /// Out-of-range indices are ignored.
    pub fn apply_penalty(
        &mut self,
        team_index: usize,
        points: u32,
        round: usize,
        reveal_at_end: bool,
    ) {
        let applied = self
            .teams
            .get_mut(team_index)
            .is_some_and(|team| team.apply_penalty(points, round, reveal_at_end));
        if !applied {
            warn!("ignored penalty of {points} for team index {team_index}, round {round}");
        }
    }

    /// Make every team's deferred penalties visible at once.
    pub fn reveal_pending_penalties(&mut self, mode: GameMode) {
        for team in &mut self.teams {
            team.reveal_pending_penalties(mode);
        }
        info!("pending penalties revealed for {mode} rounds");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(teams: &[&str], mode: GameMode) -> Settings {
        Settings::default()
            .with_teams(teams.iter().copied())
            .with_mode(mode)
    }

    fn pool(words: &[&str]) -> Vec<Term> {
        words.iter().map(|w| Term::new(*w)).collect()
    }

    fn playing(words: &[&str]) -> TurnState {
        let mut state = TurnState::new(&settings(&["A", "B"], GameMode::Classic), pool(words), 9);
        state.start_game().unwrap();
        state.start_new_turn();
        state
    }

    #[test]
    fn restored_scores_follow_the_stored_mode() {
        let mut state = playing(&["a", "b"]);
        state.add_score(0, 5, 0);
        let mut value = serde_json::to_value(&state).unwrap();
        let team = &mut value["teams"][0];
        team["round_scores"][3] = serde_json::json!(7);
        team["score"] = serde_json::json!(999);
        team.as_object_mut().unwrap().remove("relevant_rounds");

        let restored: TurnState = serde_json::from_value(value).unwrap();
        assert_eq!(restored.teams()[0].round_scores()[3], 7);
        assert_eq!(restored.teams()[0].score(), 5);
        assert_eq!(restored.leaders().len(), 1);
    }

    #[test]
    fn empty_team_list_cannot_start() {
        let mut state = TurnState::new(&settings(&[], GameMode::Classic), pool(&["a"]), 1);
        assert_eq!(state.start_game(), Err(EngineError::NoTeams));
        assert_eq!(state.phase(), GamePhase::Setup);
        assert!(state.active_team().is_none());
    }

    #[test]
    fn empty_pool_yields_no_term() {
        let mut state = playing(&[]);
        assert!(state.current_term().is_none());
        assert_eq!(state.next_term(None), None);
        assert_eq!(state.mark_current_term_completed(), None);
        assert!(state.has_team_seen_all_available_terms_for_turn());
        assert!(state.all_terms_completed_for_current_round());
    }

    #[test]
    fn cursor_resolves_past_completed_terms() {
        let mut state = playing(&["a", "b", "c"]);
        assert_eq!(state.resolve_current_index(), Some(0));
        state.mark_current_term_completed();
        assert_eq!(state.resolve_current_index(), Some(1));
        assert_eq!(state.current_term().map(|t| t.text.as_str()), Some("b"));
        assert_eq!(state.remaining_terms_count(), 2);
    }

    #[test]
    fn next_term_skips_seen_and_avoids_once() {
        let mut state = playing(&["a", "b", "c"]);
        let skipped = state.mark_current_term_as_seen().unwrap();
        assert_eq!(skipped, 0);
        // 1 is the natural next pick; asking to avoid it moves on to 2.
        assert_eq!(state.next_term(Some(1)), Some(2));
        state.mark_current_term_as_seen();
        assert_eq!(state.next_term(Some(1)), Some(1));
        state.mark_current_term_as_seen();
        assert_eq!(state.next_term(None), None);
        assert_eq!(state.current_term_index(), 1);
        assert!(state.has_team_seen_all_available_terms_for_turn());
    }

    #[test]
    fn avoided_term_is_returned_when_it_is_the_only_candidate() {
        let mut state = playing(&["solo"]);
        assert_eq!(state.next_term(Some(0)), Some(0));
    }

    #[test]
    fn next_team_keeps_cursor_and_clears_turn_seen() {
        let mut state = playing(&["a", "b", "c", "d"]);
        state.mark_current_term_completed();
        state.next_term(None);
        state.mark_current_term_as_seen();
        let cursor = state.current_term_index();
        state.next_team();
        assert_eq!(state.current_team_index(), 1);
        assert_eq!(state.current_term_index(), cursor);
        assert!(state.seen_terms_in_current_turn().is_empty());
        assert_eq!(state.seen_terms_in_current_round().len(), 2);
        state.next_team();
        assert_eq!(state.current_team_index(), 0);
    }

    #[test]
    fn start_new_turn_counts_turns_and_resets_clock() {
        let mut state = playing(&["a"]);
        let a = state.active_team_id().unwrap();
        assert_eq!(state.team_turns(a), 1);
        state.record_hit();
        state.tick(10);
        state.set_flicker(true);
        state.start_new_turn();
        assert_eq!(state.team_turns(a), 2);
        assert_eq!(state.hit_streak(a), 0);
        assert_eq!(state.turn_time_remaining(), state.settings().turn_seconds);
        assert!(!state.flicker());
    }

    #[test]
    fn tick_reports_timeout() {
        let mut state = playing(&["a"]);
        assert!(!state.tick(30));
        assert!(state.tick(45));
        assert_eq!(state.turn_time_remaining(), 0);
    }

    #[test]
    fn round_completion_needs_one_clear_team() {
        let mut state = playing(&["a"]);
        let b = TeamId(1);
        let a = TeamId(0);
        state.issue_penalty_card("x", a, 0);
        state.issue_penalty_card("y", b, 0);
        state.mark_current_term_completed();
        assert!(!state.all_terms_completed_for_current_round());
        // Team A clears its own penalty card; B still holds one.
        state.next_term(None);
        assert_eq!(state.current_term().map(|t| t.text.as_str()), Some("x"));
        state.mark_current_term_completed();
        assert_eq!(state.outstanding_penalty_cards(b), 1);
        assert!(state.all_terms_completed_for_current_round());
    }

    #[test]
    fn diagnostic_check_includes_ineligible_penalty_cards() {
        let mut state = playing(&["a"]);
        let a = state.active_team_id().unwrap();
        state.issue_penalty_card("later", a, 5);
        state.mark_current_term_as_seen();
        assert!(state.has_team_seen_all_available_terms_for_turn());
        assert!(!state.has_team_seen_all_available_terms());
    }

    #[test]
    fn phase_transitions_are_guarded() {
        let mut state = playing(&["a"]);
        assert!(matches!(
            state.start_game(),
            Err(EngineError::InvalidTransition { phase: GamePhase::Playing, .. })
        ));
        state.enter_slot_reward().unwrap();
        assert!(state.next_round().is_err());
        assert!(state.end_round().is_err());
        state.resume_from_slot_reward().unwrap();
        assert_eq!(state.end_round(), Ok(GamePhase::RoundEnd));
        assert_eq!(state.next_round(), Ok(GamePhase::Playing));
        assert_eq!(state.current_round(), 1);
    }

    #[test]
    fn next_round_rotates_start_team_and_resets_cursor() {
        let mut state = TurnState::new(
            &settings(&["A", "B", "C"], GameMode::Classic),
            pool(&["a", "b", "c"]),
            3,
        );
        state.start_game().unwrap();
        state.next_team();
        state.next_team();
        state.mark_current_term_completed();
        state.next_term(None);
        state.next_round().unwrap();
        assert_eq!(state.round_starting_team_index(), 1);
        assert_eq!(state.current_team_index(), 1);
        assert_eq!(state.current_term_index(), 0);
        assert!(state.seen_terms_in_current_round().is_empty());
        state.next_round().unwrap();
        assert_eq!(state.current_team_index(), 2);
        assert_eq!(state.next_round(), Ok(GamePhase::GameEnd));
        assert!(state.next_round().is_err());
    }

    #[test]
    fn quick_mode_skips_one_word_round() {
        let mut state = TurnState::new(&settings(&["A"], GameMode::Quick), pool(&["a"]), 3);
        state.start_game().unwrap();
        assert_eq!(state.round_kind(), Some(RoundKind::Describe));
        state.next_round().unwrap();
        assert_eq!(state.round_kind(), Some(RoundKind::Mime));
        assert_eq!(state.next_round(), Ok(GamePhase::GameEnd));
    }

    #[test]
    fn reshuffle_is_deterministic_per_seed() {
        let words: Vec<String> = (0..20).map(|i| format!("w{i}")).collect();
        let refs: Vec<&str> = words.iter().map(String::as_str).collect();
        let cfg = Settings {
            reshuffle_each_round: true,
            ..settings(&["A", "B"], GameMode::Classic)
        };
        let mut first = TurnState::new(&cfg, pool(&refs), 77);
        let mut second = TurnState::new(&cfg, pool(&refs), 77);
        first.start_game().unwrap();
        second.start_game().unwrap();
        first.next_round().unwrap();
        second.next_round().unwrap();
        assert_eq!(first.terms(), second.terms());
        let original: Vec<&str> = refs.clone();
        let shuffled: Vec<&str> = first.terms().iter().map(|t| t.text.as_str()).collect();
        assert_ne!(original, shuffled);
        let mut sorted = shuffled.clone();
        sorted.sort_unstable();
        let mut expected = original;
        expected.sort_unstable();
        assert_eq!(sorted, expected);
    }

    #[test]
    fn scoring_through_state_ignores_bad_indices() {
        let mut state = playing(&["a"]);
        state.add_score(0, 3, 0);
        state.add_score(9, 3, 0);
        state.apply_penalty(0, 1, 7, false);
        state.apply_penalty(1, 4, 0, true);
        assert_eq!(state.teams()[0].score(), 3);
        assert_eq!(state.teams()[1].pending_round_penalties()[0], 4);
        state.reveal_pending_penalties(GameMode::Classic);
        assert_eq!(state.teams()[1].pending_round_penalties()[0], 0);
        assert_eq!(state.leaders().len(), 1);
    }

    #[test]
    fn restart_drops_issued_cards_and_resets_progress() {
        let mut state = playing(&["a", "b"]);
        state.mark_current_term_completed();
        state.issue_penalty_card("a", TeamId(0), 1);
        state.add_score(0, 2, 0);
        state.next_round().unwrap();
        state.restart();
        assert_eq!(state.phase(), GamePhase::Setup);
        assert_eq!(state.terms().len(), 2);
        assert!(state.terms().iter().all(|t| !t.is_completed_in(0)));
        assert_eq!(state.teams()[0].score(), 0);
        assert_eq!(state.team_turns(TeamId(0)), 0);
        assert_eq!(state.current_round(), 0);
    }
}
