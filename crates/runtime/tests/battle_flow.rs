//! End-to-end round loop tests against hand-built content.

use combat_core::qte::CENTER;
use combat_core::{
    BattleStore, BreakCondition, CombatConfig, Combatant, ContentTables, DiceExpr, Element,
    IntentDef, IntentKind, IntentPayload, PlayerAction, QteKind, QteModifiers, QtePhase, Side,
    SkillDef, SkillEffect, StatusKind, StyleKind, SummonDef, SummonFlags, Zone,
};
use runtime::{
    BattleEvent, BattlePhase, BattleResult, BattleSession, SessionError, StoreConfig, TurnReport,
};

fn skill(id: &str, pp: Option<u32>, timed: bool, effect: SkillEffect) -> SkillDef {
    SkillDef {
        id: id.into(),
        name: id.into(),
        element: Element::Electric,
        accuracy: None,
        pp,
        ap_cost: 2,
        heavy: false,
        timed,
        sfx: None,
        effect,
    }
}

fn intent(id: &str, prep_turns: u32, payload: IntentPayload) -> IntentDef {
    IntentDef {
        id: id.into(),
        name: id.into(),
        kind: IntentKind::BigAttack,
        prep_turns,
        cooldown: 10,
        min_turn: 0,
        hp_threshold: None,
        chance: 1.0,
        break_condition: BreakCondition::Statuses(vec![StatusKind::Stun]),
        payload,
        telegraph_text: format!("{id} gathers power..."),
        execute_text: None,
    }
}

fn tables() -> ContentTables {
    let mut tables = ContentTables::new();
    let damage = |power| SkillEffect::Damage {
        power,
        dice: DiceExpr::dice(1, 6, 0),
        hits: 1,
        rider: None,
    };
    for def in [
        skill("spark", Some(1), true, damage(40)),
        skill("slam", None, false, damage(30)),
        skill(
            "daze",
            None,
            false,
            SkillEffect::Status {
                status: StatusKind::Stun,
                stacks: 1,
                chance: 1.0,
            },
        ),
        skill(
            "call_wisp",
            None,
            false,
            SkillEffect::Summon {
                summon: "wisp".into(),
            },
        ),
    ] {
        tables.insert_skill(def).unwrap();
    }

    tables
        .insert_summon(SummonDef {
            id: "wisp".into(),
            name: "Wisp".into(),
            max_hp: 10,
            ac: 10,
            damage: DiceExpr::dice(1, 4, 0),
            damage_type: Element::Normal,
            attack_bonus: 0,
            duration: 4,
            flags: SummonFlags::CAN_ATTACK,
            heal_amount: DiceExpr::flat(0),
            protect_chance: 0.0,
            moves: Vec::new(),
        })
        .unwrap();

    tables
        .insert_intent(intent(
            "smash",
            2,
            IntentPayload::Skill {
                skill: "slam".into(),
                multiplier: 2.0,
            },
        ))
        .unwrap();
    tables
        .insert_intent(intent(
            "rally",
            1,
            IntentPayload::Summon {
                summon: "wisp".into(),
            },
        ))
        .unwrap();

    let mut hero = Combatant::new("hero", "Hero", 200);
    hero.speed = 255;
    hero.moves = vec!["spark".into(), "daze".into(), "call_wisp".into()];
    tables.insert_combatant(hero).unwrap();

    let mut dummy = Combatant::new("dummy", "Dummy", 500);
    dummy.ac = 30;
    dummy.speed = 1;
    tables.insert_combatant(dummy).unwrap();

    let mut ogre = Combatant::new("ogre", "Ogre", 500);
    ogre.moves = vec!["slam".into()];
    ogre.intents = vec!["smash".into()];
    tables.insert_combatant(ogre).unwrap();

    let mut shaman = Combatant::new("shaman", "Shaman", 500);
    shaman.intents = vec!["rally".into()];
    tables.insert_combatant(shaman).unwrap();

    let mut knight = Combatant::new("knight", "Knight", 200);
    knight.ac = 30;
    knight.speed = 255;
    knight.moves = vec!["spark".into()];
    tables.insert_combatant(knight).unwrap();

    let mut pushover = Combatant::new("pushover", "Pushover", 1);
    pushover.ac = 30;
    tables.insert_combatant(pushover).unwrap();

    tables.validate().unwrap();
    tables
}

fn quiet_config(style: StyleKind) -> CombatConfig {
    let mut config = CombatConfig::default().with_style(style);
    config.battle.player_qte = false;
    config.battle.enemy_qte = false;
    config
}

fn session(config: CombatConfig, enemy: &str) -> BattleSession {
    BattleSession::builder()
        .tables(tables())
        .combat_config(config)
        .player("hero")
        .enemy(enemy)
        .seed(42)
        .build()
        .unwrap()
}

/// Every landed hit staggers and every d20 shows 15, which hits AC 10 but not AC 30.
fn staggering_session(player: &str, enemy: &str) -> BattleSession {
    let mut session = BattleSession::builder()
        .tables(tables())
        .combat_config(quiet_config(StyleKind::ApCombo))
        .store_config(StoreConfig {
            stagger_threshold: 1,
            ..StoreConfig::default()
        })
        .player(player)
        .enemy(enemy)
        .seed(42)
        .build()
        .unwrap();
    session.set_forced_roll_callback(Some(Box::new(|_| Some(15))));
    session
}

fn finish_qte(session: &mut BattleSession) -> TurnReport {
    for _ in 0..10_000 {
        if let Some(report) = session.advance(1) {
            return report;
        }
    }
    panic!("timing challenge never completed");
}

fn has_event(session: &BattleSession, pred: impl Fn(&BattleEvent) -> bool) -> bool {
    session.events().events().iter().any(pred)
}

#[test]
fn exhausted_pp_refuses_without_advancing() {
    let mut session = session(quiet_config(StyleKind::TypePp), "dummy");

    let first = session.submit(PlayerAction::Skill("spark".into())).unwrap();
    assert!(first.player.unwrap().success);
    assert_eq!(session.turn(), 2);

    let second = session.submit(PlayerAction::Skill("spark".into())).unwrap();
    let refused = second.player.unwrap();
    assert!(!refused.success);
    assert_eq!(refused.reason_code(), Some("no_pp"));
    assert!(second.enemy.is_none());
    assert_eq!(session.turn(), 2);
    assert_eq!(session.phase(), BattlePhase::PlayerTurn);
}

#[test]
fn attack_without_ap_is_refused() {
    let mut config = quiet_config(StyleKind::ApCombo);
    config.ap_combo.ap_start = 1;
    config.ap_combo.attack_cost = 2;
    let mut session = session(config, "dummy");
    let enemy_hp = session.view().enemy.hp;

    let report = session.submit(PlayerAction::Attack).unwrap();
    assert_eq!(report.player.unwrap().reason_code(), Some("no_ap"));
    assert_eq!(session.view().enemy.hp, enemy_hp);
    assert_eq!(session.turn(), 1);
}

#[test]
fn timed_skill_waits_for_the_challenge() {
    let mut config = quiet_config(StyleKind::TypePp);
    config.battle.player_qte = true;
    let mut session = session(config, "dummy");

    let report = session.submit(PlayerAction::Skill("spark".into())).unwrap();
    assert_eq!(report.pending_qte, Some(QteKind::Skill));
    assert!(report.player.is_none());
    assert_eq!(session.phase(), BattlePhase::AwaitingQte(Side::Player));
    assert_eq!(
        session.submit(PlayerAction::Attack).unwrap_err(),
        SessionError::QteBusy
    );

    let done = finish_qte(&mut session);
    assert!(done.qte[0].timed_out);
    assert_eq!(done.qte[0].zone, Zone::Bad);
    assert!(done.player.unwrap().success);
    assert_eq!(session.phase(), BattlePhase::PlayerTurn);
}

#[test]
fn centered_confirm_grades_perfect() {
    let mut config = quiet_config(StyleKind::TypePp);
    config.battle.player_qte = true;
    let mut session = session(config, "dummy");
    session.submit(PlayerAction::Skill("spark".into())).unwrap();

    let mut confirmed = false;
    for _ in 0..10_000 {
        let view = session.qte_view().unwrap();
        if view.phase == QtePhase::Running
            && (view.marker - CENTER).abs() <= view.thresholds.perfect * 0.5
        {
            confirmed = session.confirm();
            break;
        }
        assert!(session.advance(1).is_none());
    }
    assert!(confirmed);

    let report = finish_qte(&mut session);
    assert_eq!(report.qte[0].zone, Zone::Perfect);
    match &report.qte[0].modifiers {
        QteModifiers::Skill(m) => {
            assert!(m.advantage);
            assert_eq!(m.bonus_damage, 0.25);
        }
        other => panic!("unexpected modifiers {other:?}"),
    }
}

#[test]
fn fleeing_ends_the_battle() {
    let mut session = session(quiet_config(StyleKind::TypePp), "dummy");
    let report = session.submit(PlayerAction::Flee).unwrap();
    assert_eq!(report.result, Some(BattleResult::Fled));
    assert_eq!(
        session.submit(PlayerAction::Attack).unwrap_err(),
        SessionError::BattleOver
    );
}

#[test]
fn victory_dismisses_summons() {
    let mut session = session(quiet_config(StyleKind::TypePp), "pushover");
    session.submit(PlayerAction::Skill("call_wisp".into())).unwrap();
    assert!(has_event(&session, |e| matches!(
        e,
        BattleEvent::SummonSpawned { side: Side::Player, .. }
    )));

    if !session.is_over() {
        session.submit(PlayerAction::Attack).unwrap();
    }
    assert_eq!(session.result(), Some(BattleResult::Victory));
    assert!(session.summons().all().is_empty());
    assert!(has_event(&session, |e| matches!(
        e,
        BattleEvent::BattleEnded {
            result: BattleResult::Victory,
            ..
        }
    )));
}

#[test]
fn summons_expire_after_their_duration() {
    let mut session = session(quiet_config(StyleKind::TypePp), "dummy");
    session.submit(PlayerAction::Skill("call_wisp".into())).unwrap();
    session.pass().unwrap();
    session.pass().unwrap();
    assert_eq!(session.summons().active_by_side(Side::Player).count(), 1);

    session.pass().unwrap();
    assert_eq!(session.summons().active_by_side(Side::Player).count(), 0);
    assert!(has_event(&session, |e| matches!(
        e,
        BattleEvent::SummonDismissed { reason, .. } if reason == "expired"
    )));
}

#[test]
fn telegraphed_intent_executes_after_preparation() {
    let mut session = session(quiet_config(StyleKind::TypePp), "ogre");

    session.pass().unwrap();
    assert!(has_event(&session, |e| matches!(
        e,
        BattleEvent::IntentTelegraphed { turns: 2, .. }
    )));
    assert!(session.intents().active().is_some());

    session.pass().unwrap();
    assert!(!has_event(&session, |e| matches!(
        e,
        BattleEvent::IntentExecuted { .. }
    )));

    session.pass().unwrap();
    assert!(has_event(&session, |e| matches!(
        e,
        BattleEvent::IntentExecuted { name } if name == "smash"
    )));
    assert!(session.intents().active().is_none());
}

#[test]
fn stun_breaks_a_telegraphed_intent() {
    let mut session = session(quiet_config(StyleKind::TypePp), "ogre");
    session.pass().unwrap();

    let report = session.submit(PlayerAction::Skill("daze".into())).unwrap();
    assert!(report.messages.iter().any(|m| m == "smash was interrupted!"));
    assert!(has_event(&session, |e| matches!(
        e,
        BattleEvent::IntentBroken { name } if name == "smash"
    )));
    assert!(session.intents().active().is_none());
}

#[test]
fn summon_intent_calls_for_the_enemy() {
    let mut session = session(quiet_config(StyleKind::TypePp), "shaman");
    session.pass().unwrap();
    assert_eq!(session.summons().active_by_side(Side::Enemy).count(), 0);

    session.pass().unwrap();
    assert_eq!(session.summons().active_by_side(Side::Enemy).count(), 1);
    assert!(has_event(&session, |e| matches!(
        e,
        BattleEvent::SummonSpawned { side: Side::Enemy, .. }
    )));
}

#[test]
fn defensive_challenge_suspends_the_enemy_turn() {
    let mut config = quiet_config(StyleKind::TypePp);
    config.battle.enemy_qte = true;
    let mut session = session(config, "dummy");

    let report = session.pass().unwrap();
    assert_eq!(report.pending_qte, Some(QteKind::Defend));
    assert_eq!(session.phase(), BattlePhase::AwaitingQte(Side::Enemy));

    let done = finish_qte(&mut session);
    assert!(done.enemy.is_some());
    assert_eq!(session.turn(), 2);
    assert_eq!(session.phase(), BattlePhase::PlayerTurn);
}

#[test]
fn abort_is_idempotent() {
    let mut session = session(quiet_config(StyleKind::ApCombo), "dummy");
    assert_eq!(session.abort().result, Some(BattleResult::Aborted));
    assert_eq!(session.abort().result, None);
    assert_eq!(session.result(), Some(BattleResult::Aborted));
}

#[test]
fn staggered_player_loses_their_next_action() {
    let mut session = staggering_session("hero", "dummy");

    session.pass().unwrap();
    assert_eq!(session.turn(), 2);
    assert!(!session.store().can_act(Side::Player));

    let report = session.submit(PlayerAction::Attack).unwrap();
    assert_eq!(report.player.as_ref().unwrap().reason_code(), Some("cannot_act"));
    assert!(!report.was_refused());
    assert!(report.enemy.is_some());
    assert_eq!(session.turn(), 3);
    assert_eq!(session.phase(), BattlePhase::PlayerTurn);
}

#[test]
fn stagger_stun_breaks_a_telegraphed_intent() {
    let mut session = staggering_session("knight", "ogre");
    session.pass().unwrap();
    assert!(session.intents().is_telegraphing());
    assert!(session.store().can_act(Side::Player));

    let report = session.submit(PlayerAction::Attack).unwrap();
    let outcome = report.player.as_ref().unwrap();
    assert!(outcome.success);
    assert!(
        outcome
            .statuses
            .iter()
            .any(|s| s.target == Side::Enemy && s.kind == StatusKind::Stun)
    );
    assert!(report.messages.iter().any(|m| m == "smash was interrupted!"));
    assert!(has_event(&session, |e| matches!(
        e,
        BattleEvent::IntentBroken { name } if name == "smash"
    )));
    assert!(session.intents().active().is_none());
}
