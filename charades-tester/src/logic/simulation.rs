use std::sync::Arc;

use anyhow::Result;
use charades_game::{
    CategoryCatalog, EngineError, GameEngine, GameMode, GuessOutcome, PerkEffect, RoundKind,
    Settings, TurnSignal, TurnState,
};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;
use thiserror::Error;

/// Salt mixed into the game seed so the guesser's dice never mirror the pool
/// shuffle.
const GUESSER_SALT: u64 = 0x4755_4553_5345_5221;
const DEFAULT_MAX_STEPS: usize = 20_000;

/// How the simulated team answers and how long it takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuesserProfile {
    pub correct_percent: u32,
    pub skip_percent: u32,
    /// Chance per step that a perk fires instead of an answer.
    pub perk_percent: u32,
    pub min_seconds: u32,
    pub max_seconds: u32,
}

impl Default for GuesserProfile {
    fn default() -> Self {
        Self {
            correct_percent: 70,
            skip_percent: 20,
            perk_percent: 0,
            min_seconds: 2,
            max_seconds: 12,
        }
    }
}

impl GuesserProfile {
    #[must_use]
    pub const fn with_rates(mut self, correct_percent: u32, skip_percent: u32) -> Self {
        self.correct_percent = correct_percent;
        self.skip_percent = skip_percent;
        self
    }

    #[must_use]
    pub const fn with_perks(mut self, perk_percent: u32) -> Self {
        self.perk_percent = perk_percent;
        self
    }

    fn pick(&self, rng: &mut ChaCha20Rng) -> GuessOutcome {
        let roll = rng.gen_range(0..100);
        if roll < self.correct_percent {
            GuessOutcome::Correct
        } else if roll < self.correct_percent + self.skip_percent {
            GuessOutcome::Skip
        } else {
            GuessOutcome::Wrong
        }
    }

    fn think_time(&self, rng: &mut ChaCha20Rng) -> u32 {
        rng.gen_range(self.min_seconds..=self.max_seconds.max(self.min_seconds))
    }
}

/// Assertion hook run after a simulation completes.
type SimulationExpectationFn =
    Arc<dyn Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static>;

#[derive(Clone)]
pub struct SimulationExpectation(SimulationExpectationFn);

impl std::fmt::Debug for SimulationExpectation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SimulationExpectation")
    }
}

impl SimulationExpectation {
    pub fn check(&self, summary: &SimulationSummary) -> Result<()> {
        (self.0)(summary)
    }
}

impl<F> From<F> for SimulationExpectation
where
    F: Fn(&SimulationSummary) -> Result<()> + Send + Sync + 'static,
{
    fn from(f: F) -> Self {
        Self(Arc::new(f))
    }
}

/// Settings, guesser and checks for one simulated game.
#[derive(Debug, Clone)]
pub struct SimulationPlan {
    pub settings: Settings,
    pub profile: GuesserProfile,
    pub max_steps: usize,
    pub expectations: Vec<SimulationExpectation>,
}

impl SimulationPlan {
    #[must_use]
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            profile: GuesserProfile::default(),
            max_steps: DEFAULT_MAX_STEPS,
            expectations: Vec::new(),
        }
    }

    #[must_use]
    pub const fn with_profile(mut self, profile: GuesserProfile) -> Self {
        self.profile = profile;
        self
    }

    #[must_use]
    pub const fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    #[must_use]
    pub fn with_expectation(mut self, expectation: impl Into<SimulationExpectation>) -> Self {
        self.expectations.push(expectation.into());
        self
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub correct: usize,
    pub skipped: usize,
    pub wrong: usize,
}

#[derive(Debug, Clone)]
pub struct SimulationSummary {
    pub seed: u64,
    pub mode: GameMode,
    pub steps: usize,
    pub turns: usize,
    pub outcomes: OutcomeCounts,
    pub penalty_cards_issued: usize,
    pub slot_rewards: usize,
    pub perks_applied: usize,
    pub rounds_played: Vec<RoundKind>,
    pub final_state: TurnState,
    pub game_ended: bool,
}

impl SimulationSummary {
    pub fn leader_names(&self) -> Vec<&str> {
        self.final_state
            .leaders()
            .into_iter()
            .map(|team| team.name.as_str())
            .collect()
    }
}

/// Failures detected while a game is still running.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("engine rejected a transition at step {step}: {source}")]
    Engine {
        step: usize,
        #[source]
        source: EngineError,
    },
    #[error("invariant broken at step {step}: {message}")]
    Invariant { step: usize, message: String },
    #[error("session went idle at step {step}")]
    Stalled { step: usize },
}

/// Headless runner that plays whole games against the bundled catalog.
pub struct Simulator {
    engine: GameEngine<CategoryCatalog>,
}

impl Simulator {
    pub fn try_new() -> Result<Self> {
        Ok(Self {
            engine: GameEngine::with_bundled_catalog()?,
        })
    }

    /// Play one game to completion or until the plan's step limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be created, the engine refuses a
    /// transition, or an invariant check fails.
    pub fn run_plan(&self, plan: &SimulationPlan, seed: u64) -> Result<SimulationSummary> {
        let mut session = self.engine.create_session(&plan.settings, seed)?;
        let mut rng = ChaCha20Rng::seed_from_u64(seed ^ GUESSER_SALT);
        let mut outcomes = OutcomeCounts::default();
        let (mut turns, mut cards, mut rewards, mut perks) = (0, 0, 0, 0);
        let mut rounds_played: Vec<RoundKind> = Vec::new();

        let engine_err = |step: usize| move |source: EngineError| SimulationError::Engine { step, source };
        let mut signal = session.begin().map_err(engine_err(0))?;
        rounds_played.extend(session.state().round_kind());

        for step in 0..plan.max_steps {
            check_invariants(session.state(), signal, step)?;
            signal = match signal {
                TurnSignal::Continue { .. } => {
                    if plan.profile.perk_percent > 0
                        && rng.gen_range(0..100) < plan.profile.perk_percent
                    {
                        let effect = random_perk(&mut rng, session.state().teams().len());
                        log::debug!("step {step}: perk {effect:?}");
                        session.apply_perk(effect).map_err(engine_err(step))?;
                        perks += 1;
                        session.signal()
                    } else {
                        let outcome = plan.profile.pick(&mut rng);
                        match outcome {
                            GuessOutcome::Correct => outcomes.correct += 1,
                            GuessOutcome::Skip => outcomes.skipped += 1,
                            GuessOutcome::Wrong => outcomes.wrong += 1,
                        }
                        let pool_before = session.state().terms().len();
                        let next = session.record(outcome).map_err(engine_err(step))?;
                        cards += session.state().terms().len() - pool_before;
                        if matches!(next, TurnSignal::Continue { .. }) {
                            session.advance_clock(plan.profile.think_time(&mut rng))
                        } else {
                            next
                        }
                    }
                }
                TurnSignal::SlotReward => {
                    rewards += 1;
                    session.enter_slot_reward().map_err(engine_err(step))?;
                    session.resume_from_slot_reward().map_err(engine_err(step))?
                }
                TurnSignal::TurnOver => {
                    turns += 1;
                    session.end_turn().map_err(engine_err(step))?
                }
                TurnSignal::RoundOver => {
                    session.finish_round().map_err(engine_err(step))?;
                    let next = session.start_next_round().map_err(engine_err(step))?;
                    if next != TurnSignal::GameOver {
                        rounds_played.extend(session.state().round_kind());
                    }
                    next
                }
                TurnSignal::GameOver => {
                    return Ok(SimulationSummary {
                        seed,
                        mode: plan.settings.mode,
                        steps: step,
                        turns,
                        outcomes,
                        penalty_cards_issued: cards,
                        slot_rewards: rewards,
                        perks_applied: perks,
                        rounds_played,
                        final_state: session.into_state(),
                        game_ended: true,
                    });
                }
                TurnSignal::Idle => return Err(SimulationError::Stalled { step }.into()),
            };
        }

        log::warn!("seed {seed}: step limit {} reached", plan.max_steps);
        Ok(SimulationSummary {
            seed,
            mode: plan.settings.mode,
            steps: plan.max_steps,
            turns,
            outcomes,
            penalty_cards_issued: cards,
            slot_rewards: rewards,
            perks_applied: perks,
            rounds_played,
            final_state: session.into_state(),
            game_ended: false,
        })
    }
}

fn random_perk(rng: &mut ChaCha20Rng, team_count: usize) -> PerkEffect {
    match rng.gen_range(0..4) {
        0 => PerkEffect::ScoreDelta {
            team_index: rng.gen_range(0..team_count.max(1)),
            points: rng.gen_range(-2..=2),
        },
        1 => PerkEffect::TimerDelta {
            seconds: rng.gen_range(-10..=10),
        },
        2 => PerkEffect::ForceSkip,
        _ => PerkEffect::Flicker {
            on: rng.gen_range(0..2) == 1,
        },
    }
}

fn check_invariants(
    state: &TurnState,
    signal: TurnSignal,
    step: usize,
) -> Result<(), SimulationError> {
    let fail = |message: String| Err(SimulationError::Invariant { step, message });

    if state.current_team_index() >= state.teams().len() {
        return fail(format!(
            "team index {} out of {} teams",
            state.current_team_index(),
            state.teams().len()
        ));
    }
    if !state.mode().is_round_available(state.current_round()) {
        return fail(format!(
            "round {} is not played in {} mode",
            state.current_round(),
            state.mode()
        ));
    }
    let relevant = state.mode().relevant_rounds();
    for team in state.teams() {
        let buckets: u32 = team.round_scores().iter().take(relevant).sum();
        if team.score() != buckets {
            return fail(format!(
                "{} shows {} but its buckets sum to {buckets}",
                team.name,
                team.score()
            ));
        }
    }
    match signal {
        TurnSignal::Continue { term } if !state.is_selectable(term, state.active_team_id()) => {
            fail(format!("term {term} offered but not playable"))
        }
        TurnSignal::RoundOver if !state.all_terms_completed_for_current_round() => {
            fail("round reported over with work left".to_string())
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_profile_finishes_a_classic_game() {
        let simulator = Simulator::try_new().unwrap();
        let plan = SimulationPlan::new(Settings {
            word_count: 12,
            ..Settings::default()
        });
        let summary = simulator.run_plan(&plan, 1337).unwrap();
        assert!(summary.game_ended);
        assert_eq!(summary.rounds_played.len(), 3);
        assert!(summary.outcomes.correct >= 36);
        assert!(!summary.leader_names().is_empty());
    }

    #[test]
    fn same_seed_same_game() {
        let simulator = Simulator::try_new().unwrap();
        let plan = SimulationPlan::new(Settings {
            word_count: 10,
            penalty_card_delay: Some(1),
            ..Settings::default()
        })
        .with_profile(GuesserProfile::default().with_perks(10));
        let a = simulator.run_plan(&plan, 5).unwrap();
        let b = simulator.run_plan(&plan, 5).unwrap();
        assert_eq!(a.final_state, b.final_state);
        assert_eq!(a.outcomes, b.outcomes);
    }

    #[test]
    fn step_limit_halts_without_error() {
        let simulator = Simulator::try_new().unwrap();
        let plan = SimulationPlan::new(Settings::default()).with_max_steps(5);
        let summary = simulator.run_plan(&plan, 9).unwrap();
        assert!(!summary.game_ended);
        assert_eq!(summary.steps, 5);
    }

    #[test]
    fn profile_rolls_cover_every_outcome() {
        let profile = GuesserProfile::default().with_rates(34, 33);
        let mut rng = ChaCha20Rng::seed_from_u64(3);
        let picks: Vec<GuessOutcome> = (0..300).map(|_| profile.pick(&mut rng)).collect();
        for outcome in [GuessOutcome::Correct, GuessOutcome::Skip, GuessOutcome::Wrong] {
            assert!(picks.contains(&outcome));
        }
    }
}
