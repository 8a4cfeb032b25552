use charades_game::{
    GameEngine, GameMode, GamePhase, GameSession, GuessOutcome, RoundKind, Settings, Team, TeamId,
    Term, TurnSignal, TurnState,
};

const STEP_LIMIT: usize = 10_000;

fn settings(mode: GameMode, word_count: usize) -> Settings {
    Settings {
        word_count,
        ..Settings::default()
    }
    .with_mode(mode)
}

fn new_session(settings: &Settings, seed: u64) -> GameSession {
    GameEngine::with_bundled_catalog()
        .unwrap()
        .create_session(settings, seed)
        .unwrap()
}

/// Drive a session to the end, answering with `script` in rotation and
/// letting `tick` seconds pass per answer. Returns the round kinds played.
fn play_out(session: &mut GameSession, script: &[GuessOutcome], tick: u32) -> Vec<RoundKind> {
    let mut kinds = Vec::new();
    let mut signal = session.begin().unwrap();
    kinds.extend(session.state().round_kind());
    let mut answers = script.iter().cycle();

    for _ in 0..STEP_LIMIT {
        signal = match signal {
            TurnSignal::Continue { .. } => {
                let outcome = *answers.next().unwrap();
                match session.record(outcome).unwrap() {
                    TurnSignal::Continue { .. } => session.advance_clock(tick),
                    other => other,
                }
            }
            TurnSignal::SlotReward => {
                session.enter_slot_reward().unwrap();
                session.resume_from_slot_reward().unwrap()
            }
            TurnSignal::TurnOver => session.end_turn().unwrap(),
            TurnSignal::RoundOver => {
                session.finish_round().unwrap();
                let next = session.start_next_round().unwrap();
                kinds.extend(session.state().round_kind().filter(|_| next != TurnSignal::GameOver));
                next
            }
            TurnSignal::GameOver => return kinds,
            TurnSignal::Idle => panic!("session went idle mid-game"),
        };
    }
    panic!("game did not finish within {STEP_LIMIT} steps");
}

fn total_score(teams: &[Team]) -> u32 {
    teams.iter().map(Team::score).sum()
}

#[test]
fn classic_game_plays_three_rounds_and_awards_every_term() {
    let settings = settings(GameMode::Classic, 10);
    let mut session = new_session(&settings, 42);
    let kinds = play_out(&mut session, &[GuessOutcome::Correct], 7);

    assert_eq!(
        kinds,
        vec![RoundKind::Describe, RoundKind::OneWord, RoundKind::Mime]
    );
    let state = session.state();
    assert_eq!(state.phase(), GamePhase::GameEnd);
    assert_eq!(total_score(state.teams()), 30);
    assert!(state.teams().iter().all(|t| t.round_scores()[3] == 0));
    assert!(!state.leaders().is_empty());
}

#[test]
fn drawing_and_quick_modes_follow_their_round_lists() {
    let mut drawing = new_session(&settings(GameMode::Drawing, 6), 3);
    assert_eq!(
        play_out(&mut drawing, &[GuessOutcome::Correct], 5),
        RoundKind::ALL.to_vec()
    );
    assert_eq!(total_score(drawing.state().teams()), 24);

    let mut quick = new_session(&settings(GameMode::Quick, 6), 3);
    assert_eq!(
        play_out(&mut quick, &[GuessOutcome::Correct], 5),
        vec![RoundKind::Describe, RoundKind::Mime]
    );
    assert_eq!(total_score(quick.state().teams()), 12);
}

#[test]
fn mixed_answers_with_penalty_cards_still_finish() {
    let settings = Settings {
        penalty_card_delay: Some(1),
        slot_reward_streak: Some(3),
        reshuffle_each_round: true,
        ..settings(GameMode::Classic, 12)
    }
    .with_teams(["Owls", "Foxes", "Moles"]);
    let script = [
        GuessOutcome::Correct,
        GuessOutcome::Skip,
        GuessOutcome::Correct,
        GuessOutcome::Wrong,
        GuessOutcome::Correct,
        GuessOutcome::Correct,
    ];
    let mut session = new_session(&settings, 77);
    let kinds = play_out(&mut session, &script, 9);
    assert_eq!(kinds.len(), 3);

    let state = session.state();
    assert_eq!(state.phase(), GamePhase::GameEnd);
    assert!(state.terms().len() > 12, "wrong answers should have issued cards");
    for team in state.teams() {
        let buckets: u32 = team.round_scores().iter().take(3).sum();
        assert_eq!(team.score(), buckets);
    }
}

#[test]
fn same_seed_replays_identically() {
    let settings = Settings {
        reshuffle_each_round: true,
        ..settings(GameMode::Drawing, 8)
    };
    let script = [GuessOutcome::Correct, GuessOutcome::Skip, GuessOutcome::Wrong];
    let mut first = new_session(&settings, 9001);
    let mut second = new_session(&settings, 9001);
    play_out(&mut first, &script, 11);
    play_out(&mut second, &script, 11);
    assert_eq!(first.state(), second.state());
}

#[test]
fn penalty_card_waits_for_its_owner_threshold() {
    let mut terms: Vec<Term> = ["a", "b", "c"].into_iter().map(Term::new).collect();
    terms.push(Term::penalty("d", TeamId(1), 2));
    let mut state = TurnState::new(&Settings::default(), terms, 1);
    let (a, b) = (TeamId(0), TeamId(1));
    state.start_game().unwrap();

    state.start_new_turn();
    assert!(!state.is_selectable(3, Some(a)));
    assert!(!state.available_indices().contains(&3));
    while state.next_term(None).is_some() {
        assert_ne!(state.current_term_index(), 3);
        state.mark_current_term_as_seen();
    }

    state.next_team();
    state.start_new_turn();
    assert_eq!(state.team_turns(b), 1);
    assert!(!state.is_selectable(3, Some(b)));

    state.next_team();
    state.start_new_turn();
    assert!(!state.is_selectable(3, Some(a)));

    state.next_team();
    state.start_new_turn();
    assert_eq!(state.team_turns(b), 2);
    assert!(state.is_selectable(3, Some(b)));
    assert!(!state.is_selectable(3, Some(a)));
    assert!(state.available_indices().contains(&3));
}

#[test]
fn deferred_penalties_reveal_together() {
    let settings = Settings::default().with_mode(GameMode::Classic);
    let mut state = TurnState::new(&settings, vec![Term::new("a")], 1);
    state.add_score(0, 15, 0);
    state.add_score(0, 30, 1);
    state.apply_penalty(0, 10, 0, true);
    state.apply_penalty(0, 10, 0, true);
    state.apply_penalty(0, 10, 1, true);
    state.apply_penalty(0, 10, 1, true);
    assert_eq!(state.teams()[0].score(), 45);

    state.reveal_pending_penalties(GameMode::Classic);
    let team = &state.teams()[0];
    assert_eq!(team.round_scores()[0], 0);
    assert_eq!(team.round_scores()[1], 10);
    assert_eq!(team.pending_round_penalties(), &[0; 4]);
    assert_eq!(team.score(), 10);
}

#[test]
fn drawing_mode_ends_after_the_draw_round() {
    let settings = Settings::default().with_mode(GameMode::Drawing);
    let mut state = TurnState::new(&settings, vec![Term::new("a")], 1);
    state.start_game().unwrap();
    state.next_round().unwrap();
    state.next_round().unwrap();
    assert_eq!(state.current_round(), 2);

    assert_eq!(state.next_round().unwrap(), GamePhase::Playing);
    assert_eq!(state.current_round(), 3);
    assert_eq!(state.round_kind(), Some(RoundKind::Draw));

    state.end_round().unwrap();
    assert_eq!(state.next_round().unwrap(), GamePhase::GameEnd);
    assert!(state.next_round().is_err());
}
