use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::perks::{PerkEffect, PerkOutcome, apply_perk_effect};
use crate::settings::Settings;
use crate::state::{EngineError, GamePhase, TurnState};
use crate::term::Term;
use crate::timer::{ManualTimer, TurnTimer};

/// How the active team fared on the term in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GuessOutcome {
    Correct,
    Skip,
    Wrong,
}

/// What the driver should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnSignal {
    /// Keep playing; `term` is the index now in play.
    Continue { term: usize },
    /// The hit streak earned a slot reward; enter the interstitial.
    SlotReward,
    /// Clock ran out or nothing is left to show this turn; rotate teams.
    TurnOver,
    /// Round completion criteria are met.
    RoundOver,
    GameOver,
    /// The game is not in a playing phase.
    Idle,
}

/// Session wrapper binding one turn state to one turn timer.
#[derive(Debug)]
pub struct GameSession<T: TurnTimer = ManualTimer> {
    state: TurnState,
    timer: T,
    timed_out: Arc<AtomicBool>,
}

impl GameSession<ManualTimer> {
    /// Fresh session in `Setup` with a manual timer.
    #[must_use]
    pub fn new(settings: &Settings, terms: Vec<Term>, seed: u64) -> Self {
        Self::with_timer(TurnState::new(settings, terms, seed), ManualTimer::new())
    }

    /// Let `seconds` pass on the manual clock.
    pub fn advance_clock(&mut self, seconds: u32) -> TurnSignal {
        self.timer.advance(seconds);
        self.poll_timer()
    }
}

impl<T: TurnTimer> GameSession<T> {
    /// Bind a state to a timer. If the state is mid-turn the timer is re-armed
    /// with the snapshot's remaining time (paused during a slot reward).
    pub fn with_timer(state: TurnState, timer: T) -> Self {
        let mut session = Self {
            state,
            timer,
            timed_out: Arc::new(AtomicBool::new(false)),
        };
        match session.state.phase() {
            GamePhase::Playing if session.state.turn_time_remaining() > 0 => {
                session.arm_timer(session.state.turn_time_remaining());
            }
            GamePhase::SlotReward if session.state.turn_time_remaining() > 0 => {
                session.arm_timer(session.state.turn_time_remaining());
                session.timer.pause();
            }
            _ => {}
        }
        session
    }

    /// Rebuild a session from a restored snapshot.
    pub fn from_state(state: TurnState, timer: T) -> Self {
        Self::with_timer(state, timer)
    }

    #[must_use]
    pub const fn state(&self) -> &TurnState {
        &self.state
    }

    #[must_use]
    pub const fn timer(&self) -> &T {
        &self.timer
    }

    #[must_use]
    pub fn into_state(self) -> TurnState {
        self.state
    }

    #[must_use]
    pub fn current_term(&self) -> Option<&Term> {
        self.state.current_term()
    }

    /// `Setup -> Playing` and open the first turn.
    ///
    /// # Errors
    ///
    /// Returns an error when the state refuses to start.
    pub fn begin(&mut self) -> Result<TurnSignal, EngineError> {
        self.state.start_game()?;
        Ok(self.open_turn())
    }

    /// Close the active turn and open the next team's.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` outside the `Playing` phase.
    pub fn end_turn(&mut self) -> Result<TurnSignal, EngineError> {
        self.ensure_playing("end the turn")?;
        self.timer.stop();
        self.state.next_team();
        Ok(self.open_turn())
    }

    /// Apply the active team's result on the term in play.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` outside the `Playing` phase.
    pub fn record(&mut self, outcome: GuessOutcome) -> Result<TurnSignal, EngineError> {
        self.ensure_playing("record a guess")?;
        let Some(current) = self.state.resolve_current_index() else {
            return Ok(self.signal());
        };
        let settings = self.state.settings().clone();
        let team_index = self.state.current_team_index();
        let round = self.state.current_round();
        debug!("term {current} answered {outcome:?} by team index {team_index}");

        match outcome {
            GuessOutcome::Correct => {
                self.state
                    .add_score(team_index, i64::from(settings.correct_points), round);
                let streak = self.state.record_hit();
                self.state.mark_current_term_completed();
                self.state.next_term(None);
                let signal = self.signal();
                let reward_due = settings
                    .slot_reward_streak
                    .is_some_and(|every| every > 0 && streak % every == 0);
                if reward_due && matches!(signal, TurnSignal::Continue { .. }) {
                    return Ok(TurnSignal::SlotReward);
                }
                return Ok(signal);
            }
            GuessOutcome::Skip => {
                if settings.skip_penalty > 0 {
                    self.state.apply_penalty(
                        team_index,
                        settings.skip_penalty,
                        round,
                        settings.defers_penalties(),
                    );
                }
                self.state.break_streak();
                self.state.mark_current_term_as_seen();
            }
            GuessOutcome::Wrong => {
                if settings.wrong_penalty > 0 {
                    self.state.apply_penalty(
                        team_index,
                        settings.wrong_penalty,
                        round,
                        settings.defers_penalties(),
                    );
                }
                self.state.break_streak();
                match (settings.penalty_card_delay, self.state.active_team_id()) {
                    (Some(delay), Some(team)) => {
                        let text = self.state.terms()[current].text.clone();
                        self.state.mark_current_term_completed();
                        self.state.issue_penalty_card(text, team, delay);
                    }
                    _ => {
                        self.state.mark_current_term_as_seen();
                    }
                }
            }
        }
        self.state.next_term(Some(current));
        Ok(self.signal())
    }

    /// Check the timer for a timeout delivered since the last call.
    pub fn poll_timer(&mut self) -> TurnSignal {
        if self.state.phase() != GamePhase::Playing {
            return self.signal();
        }
        self.state.set_turn_time_remaining(self.timer.remaining());
        if self.timed_out.swap(false, Ordering::SeqCst) {
            self.state.time_out();
            self.timer.stop();
            info!("turn timed out");
        }
        self.signal()
    }

    /// Explicit timeout from the host, regardless of the timer's reading.
    pub fn time_out(&mut self) -> TurnSignal {
        if self.state.phase() != GamePhase::Playing {
            return self.signal();
        }
        self.timer.stop();
        self.timed_out.store(false, Ordering::SeqCst);
        self.state.time_out();
        self.signal()
    }

    /// `Playing -> RoundEnd`, stopping the clock.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` outside `Playing`.
    pub fn finish_round(&mut self) -> Result<GamePhase, EngineError> {
        self.timer.stop();
        self.state.end_round()
    }

    /// Move to the next round and open its first turn, or finish the game.
    /// Deferred penalties of a hardcore game are revealed when it ends.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` unless the game is `Playing` or `RoundEnd`.
    pub fn start_next_round(&mut self) -> Result<TurnSignal, EngineError> {
        self.timer.stop();
        match self.state.next_round()? {
            GamePhase::GameEnd => {
                if self.state.settings().defers_penalties() {
                    let mode = self.state.mode();
                    self.state.reveal_pending_penalties(mode);
                }
                Ok(TurnSignal::GameOver)
            }
            _ => Ok(self.open_turn()),
        }
    }

    /// Pause the clock and show the reward interstitial.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` outside `Playing`.
    pub fn enter_slot_reward(&mut self) -> Result<GamePhase, EngineError> {
        let phase = self.state.enter_slot_reward()?;
        self.timer.pause();
        Ok(phase)
    }

    /// Leave the interstitial and resume the clock.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` outside `SlotReward`.
    pub fn resume_from_slot_reward(&mut self) -> Result<TurnSignal, EngineError> {
        self.state.resume_from_slot_reward()?;
        self.timer.resume();
        Ok(self.signal())
    }

    /// Apply a perk, mirroring clock changes onto the running timer.
    ///
    /// # Errors
    ///
    /// Returns `InvalidTransition` when the effect is not allowed in the
    /// current phase. Nothing changes in that case.
    pub fn apply_perk(&mut self, effect: PerkEffect) -> Result<PerkOutcome, EngineError> {
        let outcome = apply_perk_effect(&mut self.state, effect)?;
        if let PerkEffect::TimerDelta { seconds } = effect {
            self.timer.adjust(seconds);
        }
        Ok(outcome)
    }

    /// Back to `Setup` for a rematch.
    pub fn restart(&mut self) {
        self.timer.stop();
        self.timed_out.store(false, Ordering::SeqCst);
        self.state.restart();
    }

    /// Derive the driver signal from the current state.
    #[must_use]
    pub fn signal(&self) -> TurnSignal {
        match self.state.phase() {
            GamePhase::GameEnd => return TurnSignal::GameOver,
            GamePhase::Playing => {}
            _ => return TurnSignal::Idle,
        }
        if self.state.all_terms_completed_for_current_round() {
            return TurnSignal::RoundOver;
        }
        if self.state.turn_time_remaining() == 0
            || self.state.has_team_seen_all_available_terms_for_turn()
        {
            return TurnSignal::TurnOver;
        }
        self.state
            .resolve_current_index()
            .map_or(TurnSignal::TurnOver, |term| TurnSignal::Continue { term })
    }

    fn ensure_playing(&self, action: &'static str) -> Result<(), EngineError> {
        if self.state.phase() == GamePhase::Playing {
            Ok(())
        } else {
            Err(EngineError::InvalidTransition {
                action,
                phase: self.state.phase(),
            })
        }
    }

    fn open_turn(&mut self) -> TurnSignal {
        self.state.start_new_turn();
        self.arm_timer(self.state.settings().turn_seconds);
        self.signal()
    }

    fn arm_timer(&mut self, seconds: u32) {
        self.timed_out.store(false, Ordering::SeqCst);
        let flag = Arc::clone(&self.timed_out);
        self.timer.start(
            seconds,
            Box::new(move || {
                flag.store(true, Ordering::SeqCst);
            }),
        );
        self.state.set_turn_time_remaining(seconds);
    }
}
