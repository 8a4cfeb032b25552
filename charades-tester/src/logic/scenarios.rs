use anyhow::{Result, ensure};
use charades_game::{GameMode, RoundKind, Settings};

use crate::logic::simulation::{GuesserProfile, SimulationPlan, SimulationSummary, Simulator};

/// A named simulation plan.
#[derive(Debug, Clone)]
pub struct TestScenario {
    pub name: String,
    pub plan: SimulationPlan,
}

impl TestScenario {
    #[must_use]
    pub fn simulation(name: impl Into<String>, plan: SimulationPlan) -> Self {
        Self {
            name: name.into(),
            plan,
        }
    }
}

const SCENARIOS: &[(&str, &str)] = &[
    ("smoke", "Smoke Test - classic game with default settings"),
    ("penalty-cards", "Wrong answers become delayed penalty cards"),
    ("hardcore-reveal", "Hardcore penalties stay hidden until the end"),
    ("drawing-rounds", "Drawing mode plays all four rounds"),
    ("quick-mode", "Quick mode skips the one-word round"),
    ("reshuffle", "Reshuffled rounds replay deterministically"),
    ("slot-reward", "Hit streaks trigger the slot reward interstitial"),
    ("perk-chaos", "Random perks never break engine invariants"),
    ("single-team", "One team plays every turn"),
];

pub fn list_scenarios() -> Vec<(&'static str, &'static str)> {
    SCENARIOS.to_vec()
}

pub fn scenario_keys() -> Vec<String> {
    SCENARIOS.iter().map(|(key, _)| (*key).to_string()).collect()
}

pub fn get_scenario(name: &str) -> Option<TestScenario> {
    let scenario = match name.to_lowercase().as_str() {
        "smoke" => TestScenario::simulation("Smoke Test", smoke_plan()),
        "penalty-cards" | "penalty" => TestScenario::simulation("Penalty Cards", penalty_plan()),
        "hardcore-reveal" | "hardcore" => {
            TestScenario::simulation("Hardcore Reveal", hardcore_plan())
        }
        "drawing-rounds" | "drawing" => TestScenario::simulation(
            "Drawing Rounds",
            rounds_plan(GameMode::Drawing, RoundKind::ALL.to_vec()),
        ),
        "quick-mode" | "quick" => TestScenario::simulation(
            "Quick Mode",
            rounds_plan(GameMode::Quick, vec![RoundKind::Describe, RoundKind::Mime]),
        ),
        "reshuffle" => TestScenario::simulation("Deterministic Reshuffle", reshuffle_plan()),
        "slot-reward" | "slot" => TestScenario::simulation("Slot Reward", slot_reward_plan()),
        "perk-chaos" | "perks" => TestScenario::simulation("Perk Chaos", perk_plan()),
        "single-team" => TestScenario::simulation("Single Team", single_team_plan()),
        _ => return None,
    };
    Some(scenario)
}

fn expect_finished(summary: &SimulationSummary) -> Result<()> {
    ensure!(
        summary.game_ended,
        "game did not finish within {} steps",
        summary.steps
    );
    Ok(())
}

fn expect_round_count(expected: usize) -> impl Fn(&SimulationSummary) -> Result<()> {
    move |summary| {
        ensure!(
            summary.rounds_played.len() == expected,
            "expected {expected} rounds, played {:?}",
            summary.rounds_played
        );
        Ok(())
    }
}

fn smoke_plan() -> SimulationPlan {
    SimulationPlan::new(Settings {
        word_count: 20,
        ..Settings::default()
    })
    .with_expectation(expect_finished)
    .with_expectation(expect_round_count(3))
}

fn penalty_plan() -> SimulationPlan {
    let settings = Settings {
        word_count: 15,
        penalty_card_delay: Some(1),
        ..Settings::default()
    }
    .with_teams(["Red", "Blue", "Green"]);
    SimulationPlan::new(settings)
        .with_profile(GuesserProfile::default().with_rates(55, 15))
        .with_expectation(expect_finished)
        .with_expectation(|summary: &SimulationSummary| {
            ensure!(
                summary.penalty_cards_issued == summary.outcomes.wrong,
                "{} wrong answers issued {} cards",
                summary.outcomes.wrong,
                summary.penalty_cards_issued
            );
            ensure!(summary.penalty_cards_issued > 0, "no penalty cards issued");
            Ok(())
        })
}

fn hardcore_plan() -> SimulationPlan {
    let settings = Settings {
        word_count: 15,
        hardcore: true,
        wrong_penalty: 2,
        skip_penalty: 1,
        ..Settings::default()
    };
    SimulationPlan::new(settings)
        .with_profile(GuesserProfile::default().with_rates(60, 20))
        .with_expectation(expect_finished)
        .with_expectation(|summary: &SimulationSummary| {
            for team in summary.final_state.teams() {
                ensure!(
                    team.total_pending() == 0,
                    "{} still has {} pending penalty points",
                    team.name,
                    team.total_pending()
                );
            }
            Ok(())
        })
}

fn rounds_plan(mode: GameMode, expected: Vec<RoundKind>) -> SimulationPlan {
    let settings = Settings {
        word_count: 10,
        ..Settings::default()
    }
    .with_mode(mode);
    SimulationPlan::new(settings)
        .with_expectation(expect_finished)
        .with_expectation(move |summary: &SimulationSummary| {
            ensure!(
                summary.rounds_played == expected,
                "expected rounds {expected:?}, played {:?}",
                summary.rounds_played
            );
            Ok(())
        })
}

fn reshuffle_plan() -> SimulationPlan {
    let settings = Settings {
        word_count: 12,
        reshuffle_each_round: true,
        ..Settings::default()
    }
    .with_mode(GameMode::Drawing);
    let base = SimulationPlan::new(settings);
    let replay_plan = base.clone();
    base.with_expectation(expect_finished)
        .with_expectation(move |summary: &SimulationSummary| -> Result<()> {
            let replay = Simulator::try_new()?.run_plan(&replay_plan, summary.seed)?;
            ensure!(
                replay.final_state == summary.final_state,
                "replay of seed {} diverged",
                summary.seed
            );
            Ok(())
        })
}

fn slot_reward_plan() -> SimulationPlan {
    let settings = Settings {
        word_count: 20,
        slot_reward_streak: Some(3),
        ..Settings::default()
    };
    SimulationPlan::new(settings)
        .with_profile(GuesserProfile::default().with_rates(85, 10))
        .with_expectation(expect_finished)
        .with_expectation(|summary: &SimulationSummary| {
            ensure!(summary.slot_rewards > 0, "no slot reward in a hot game");
            Ok(())
        })
}

fn perk_plan() -> SimulationPlan {
    let settings = Settings {
        word_count: 12,
        penalty_card_delay: Some(0),
        ..Settings::default()
    };
    SimulationPlan::new(settings)
        .with_profile(GuesserProfile::default().with_perks(15))
        .with_expectation(expect_finished)
        .with_expectation(|summary: &SimulationSummary| {
            ensure!(summary.perks_applied > 0, "no perks fired");
            Ok(())
        })
}

fn single_team_plan() -> SimulationPlan {
    let settings = Settings {
        word_count: 8,
        penalty_card_delay: Some(2),
        ..Settings::default()
    }
    .with_teams(["Solo"]);
    SimulationPlan::new(settings)
        .with_expectation(expect_finished)
        .with_expectation(expect_round_count(3))
        .with_expectation(|summary: &SimulationSummary| {
            ensure!(
                summary.final_state.current_team_index() == 0,
                "single team lost the turn"
            );
            Ok(())
        })
}
