//! Full battles on the bundled content driven by the auto player.

use combat_content::ContentFactory;
use combat_core::StyleKind;
use runtime::{AutoPlayer, BattleEvent, BattleSession, play_turn};

const TURN_CAP: u32 = 60;

fn run(style: StyleKind, enemy: &str, seed: u64) -> (Vec<BattleEvent>, BattleSession) {
    let factory = ContentFactory::bundled();
    let mut session = BattleSession::builder()
        .tables(factory.load_tables().unwrap())
        .combat_config(factory.load_config().unwrap())
        .style(style)
        .player("hero")
        .enemy(enemy)
        .seed(seed)
        .build()
        .unwrap();

    let mut player = AutoPlayer::default();
    while !session.is_over() && session.turn() <= TURN_CAP {
        play_turn(&mut session, &mut player, 16).unwrap();
    }
    if !session.is_over() {
        session.abort();
    }
    (session.drain_events(), session)
}

#[test]
fn same_seed_replays_identically() {
    for style in [StyleKind::TypePp, StyleKind::ApCombo] {
        let (first, _) = run(style, "warlock", 99);
        let (second, _) = run(style, "warlock", 99);
        assert_eq!(first, second, "{style} diverged");
    }
}

#[test]
fn every_battle_reaches_an_end() {
    for style in [StyleKind::TypePp, StyleKind::ApCombo] {
        for enemy in ["slime", "warlock", "golem"] {
            for seed in 0..4 {
                let (events, session) = run(style, enemy, seed);
                assert!(session.is_over());
                assert!(matches!(events.first(), Some(BattleEvent::BattleStarted { .. })));
                assert!(matches!(events.last(), Some(BattleEvent::BattleEnded { .. })));
                assert!(session.summons().all().is_empty());
            }
        }
    }
}
