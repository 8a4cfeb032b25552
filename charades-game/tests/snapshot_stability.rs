use std::hash::Hasher;

use charades_game::{
    GameEngine, GameMode, GameSession, GuessOutcome, ManualTimer, Settings, TurnSignal, TurnState,
};
use twox_hash::XxHash64;

fn snapshot_hash(bytes: &[u8]) -> u64 {
    let mut hasher = XxHash64::with_seed(0);
    hasher.write(bytes);
    hasher.finish()
}

fn settings() -> Settings {
    Settings {
        word_count: 15,
        penalty_card_delay: Some(2),
        slot_reward_streak: Some(2),
        reshuffle_each_round: true,
        hardcore: true,
        ..Settings::default()
    }
    .with_mode(GameMode::Drawing)
    .with_teams(["North", "South", "East"])
}

/// Apply `steps` scripted driver actions, returning the last signal.
fn drive(session: &mut GameSession, mut signal: TurnSignal, steps: usize) -> TurnSignal {
    let script = [
        GuessOutcome::Correct,
        GuessOutcome::Wrong,
        GuessOutcome::Correct,
        GuessOutcome::Skip,
    ];
    for step in 0..steps {
        signal = match signal {
            TurnSignal::Continue { .. } => {
                let signal = session.record(script[step % script.len()]).unwrap();
                if matches!(signal, TurnSignal::Continue { .. }) {
                    session.advance_clock(13)
                } else {
                    signal
                }
            }
            TurnSignal::SlotReward => {
                session.enter_slot_reward().unwrap();
                session.resume_from_slot_reward().unwrap()
            }
            TurnSignal::TurnOver => session.end_turn().unwrap(),
            TurnSignal::RoundOver => {
                session.finish_round().unwrap();
                session.start_next_round().unwrap()
            }
            TurnSignal::GameOver | TurnSignal::Idle => return signal,
        };
    }
    signal
}

fn started() -> (GameSession, TurnSignal) {
    let mut session = GameEngine::with_bundled_catalog()
        .unwrap()
        .create_session(&settings(), 0x5EED)
        .unwrap();
    let signal = session.begin().unwrap();
    (session, signal)
}

#[test]
fn serialized_state_is_canonical() {
    let (mut session, signal) = started();
    drive(&mut session, signal, 40);

    let json = serde_json::to_string(session.state()).unwrap();
    let restored: TurnState = serde_json::from_str(&json).unwrap();
    let rejson = serde_json::to_string(&restored).unwrap();

    assert_eq!(&restored, session.state());
    assert_eq!(snapshot_hash(json.as_bytes()), snapshot_hash(rejson.as_bytes()));
}

#[test]
fn resumed_snapshot_continues_identically() {
    let (mut live, signal) = started();
    let signal = drive(&mut live, signal, 55);

    let json = serde_json::to_string(live.state()).unwrap();
    let snapshot: TurnState = serde_json::from_str(&json).unwrap();
    let mut resumed = GameSession::from_state(snapshot, ManualTimer::new());
    assert_eq!(resumed.signal(), live.signal());

    let live_end = drive(&mut live, signal, 400);
    let resumed_end = drive(&mut resumed, signal, 400);
    assert_eq!(live_end, resumed_end);

    let live_hash = snapshot_hash(serde_json::to_string(live.state()).unwrap().as_bytes());
    let resumed_hash = snapshot_hash(serde_json::to_string(resumed.state()).unwrap().as_bytes());
    assert_eq!(live_hash, resumed_hash);
}

#[test]
fn different_seeds_diverge() {
    let engine = GameEngine::with_bundled_catalog().unwrap();
    let a = engine.create_state(&settings(), 1).unwrap();
    let b = engine.create_state(&settings(), 2).unwrap();
    let hash = |state: &TurnState| {
        let texts: Vec<&str> = state.terms().iter().map(|t| t.text.as_str()).collect();
        snapshot_hash(texts.join("|").as_bytes())
    };
    assert_ne!(hash(&a), hash(&b));
}
