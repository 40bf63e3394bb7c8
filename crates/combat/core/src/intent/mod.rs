//! Telegraphed enemy abilities.
//!
//! An enemy holds at most one intent at a time:
//!
//! ```text
//! none ──generate──► telegraphing ──tick to 0──► ready ──clear──► none
//!                          │
//!                          └──status matches break condition──► broken ──► none
//! ```
//!
//! Both execution ([`IntentSystem::clear`]) and interruption
//! ([`IntentSystem::break_intent`]) record the ability in a bounded history so
//! its cooldown applies either way.
mod types;

pub use types::{
    BreakCondition, BrokenIntent, Intent, IntentDecision, IntentDef, IntentKind, IntentPayload,
    IntentRecord, IntentState, IntentView, ReactiveAction,
};

use std::collections::VecDeque;

use crate::config::IntentConfig;
use crate::env::{Combatant, ContentTables, RandomSource, SkillDef};
use crate::util::ai::{find_heal_move, pick_weighted_move};
use crate::util::status::StatusKind;

/// Intent slot and cooldown history for one battle.
#[derive(Clone, Debug)]
pub struct IntentSystem {
    config: IntentConfig,
    active: Option<Intent>,
    history: VecDeque<IntentRecord>,
}

impl IntentSystem {
    pub fn new(config: IntentConfig) -> Self {
        let history = VecDeque::with_capacity(config.history_capacity);
        Self {
            config,
            active: None,
            history,
        }
    }

    pub fn reset(&mut self) {
        self.active = None;
        self.history.clear();
    }

    pub fn active(&self) -> Option<&Intent> {
        self.active.as_ref()
    }

    pub fn history(&self) -> impl Iterator<Item = &IntentRecord> {
        self.history.iter()
    }

    pub fn view(&self) -> Option<IntentView> {
        self.active.as_ref().map(Intent::view)
    }

    /// Turn of the most recent recorded use of `intent_id` by `enemy_id`.
    pub fn last_used(&self, intent_id: &str, enemy_id: &str) -> Option<u32> {
        self.history
            .iter()
            .rev()
            .find(|r| r.intent_id == intent_id && r.enemy_id == enemy_id)
            .map(|r| r.turn)
    }

    // ========================================================================
    // Triggering
    // ========================================================================

    /// Decide the enemy's intent for this turn.
    ///
    /// No-op while an intent is in flight. Otherwise the enemy's intent
    /// definitions are tried in declaration order and the first one whose
    /// gates all pass starts telegraphing. Enemies with no definitions fall
    /// back to a reactive heal/defend/move choice.
    pub fn generate(
        &mut self,
        enemy: &Combatant,
        player: &Combatant,
        turn: u32,
        tables: &ContentTables,
        rng: &mut dyn RandomSource,
    ) -> IntentDecision {
        if self.active.is_some() {
            return IntentDecision::AlreadyTelegraphing;
        }

        let defs = tables.intents_of(enemy);
        if defs.is_empty() {
            return IntentDecision::Reactive(self.reactive_action(enemy, player, tables, rng));
        }

        for def in defs {
            if !self.gates_pass(def, enemy, turn) {
                continue;
            }
            if !rng.chance(def.chance as f64) {
                continue;
            }

            let intent = Intent::from_def(def, &enemy.id, turn);
            tracing::debug!(
                "{} telegraphs {} ({} turns) on turn {}",
                enemy.name,
                intent.name,
                intent.prep_turns,
                turn
            );
            self.active = Some(intent.clone());
            return IntentDecision::Triggered(intent);
        }

        IntentDecision::NoTrigger
    }

    /// Deterministic gates: cooldown, minimum turn, HP threshold.
    fn gates_pass(&self, def: &IntentDef, enemy: &Combatant, turn: u32) -> bool {
        if let Some(last) = self.last_used(&def.id, &enemy.id)
            && turn.saturating_sub(last) < def.cooldown
        {
            return false;
        }
        if turn < def.min_turn {
            return false;
        }
        if let Some(threshold) = def.hp_threshold
            && enemy.hp_fraction() > threshold
        {
            return false;
        }
        true
    }

    fn reactive_action(
        &self,
        enemy: &Combatant,
        player: &Combatant,
        tables: &ContentTables,
        rng: &mut dyn RandomSource,
    ) -> ReactiveAction {
        let hp = enemy.hp_fraction();

        if hp < self.config.reactive_heal_threshold
            && let Some(heal) = find_heal_move(tables.moves_of(enemy))
        {
            return ReactiveAction::Heal {
                skill: heal.id.clone(),
            };
        }

        if hp < self.config.reactive_defend_threshold
            && rng.chance(self.config.reactive_defend_chance as f64)
        {
            return ReactiveAction::Defend;
        }

        if rng.chance(self.config.reactive_move_chance as f64)
            && let Some(skill) =
                pick_weighted_move(rng, tables, &enemy.moves, &player.elements, |s| {
                    s.effect.is_damaging()
                })
        {
            return ReactiveAction::UseMove {
                skill: skill.id.clone(),
            };
        }

        ReactiveAction::BasicAttack
    }

    // ========================================================================
    // Countdown and resolution
    // ========================================================================

    /// Count down one enemy turn. Returns true once the intent is ready to execute.
    pub fn tick(&mut self) -> bool {
        let Some(intent) = self.active.as_mut() else {
            return false;
        };
        if intent.state == IntentState::Telegraphing {
            intent.turns_remaining = intent.turns_remaining.saturating_sub(1);
            if intent.turns_remaining == 0 {
                intent.state = IntentState::Ready;
                tracing::debug!("Intent {} is ready", intent.name);
            }
        }
        intent.state == IntentState::Ready
    }

    pub fn is_ready(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|i| i.state == IntentState::Ready)
    }

    /// The skill the active intent will use, if its payload has one.
    pub fn get_skill<'a>(&self, tables: &'a ContentTables) -> Option<&'a SkillDef> {
        match &self.active.as_ref()?.payload {
            IntentPayload::Skill { skill, .. } | IntentPayload::MultiHit { skill, .. } => {
                tables.skill(skill)
            }
            IntentPayload::Summon { .. } => None,
        }
    }

    /// Release the slot after execution, recording the use.
    pub fn clear(&mut self, turn: u32) -> Option<Intent> {
        let intent = self.active.take()?;
        self.record(&intent, turn);
        Some(intent)
    }

    pub fn can_break(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|i| i.break_condition.can_break())
    }

    pub fn is_telegraphing(&self) -> bool {
        self.active
            .as_ref()
            .is_some_and(|i| i.state == IntentState::Telegraphing)
    }

    /// Whether applying `status` to the enemy would interrupt the active intent.
    ///
    /// Only a telegraphing intent can be interrupted; a ready one always fires.
    pub fn would_break(&self, status: StatusKind) -> bool {
        self.active.as_ref().is_some_and(|i| {
            i.state == IntentState::Telegraphing && i.break_condition.matches(status)
        })
    }

    /// Interrupt the telegraphing intent. It still counts as used for its cooldown.
    pub fn break_intent(&mut self, turn: u32) -> Option<BrokenIntent> {
        if !self.is_telegraphing() {
            return None;
        }
        let intent = self.active.take()?;
        self.record(&intent, turn);
        let message = format!("{} was interrupted!", intent.name);
        tracing::debug!("Intent {} broken on turn {}", intent.name, turn);
        Some(BrokenIntent {
            intent,
            message,
            fallback: ReactiveAction::BasicAttack,
        })
    }

    fn record(&mut self, intent: &Intent, turn: u32) {
        if self.config.history_capacity == 0 {
            return;
        }
        while self.history.len() >= self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(IntentRecord {
            intent_id: intent.def_id.clone(),
            enemy_id: intent.enemy_id.clone(),
            turn,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{SequenceRng, SkillEffect};
    use crate::util::dice::DiceExpr;

    fn slam() -> SkillDef {
        SkillDef {
            id: "slam".into(),
            name: "Slam".into(),
            element: Default::default(),
            accuracy: None,
            pp: None,
            ap_cost: 2,
            heavy: true,
            timed: false,
            sfx: None,
            effect: SkillEffect::Damage {
                power: 90,
                dice: DiceExpr::dice(3, 8, 0),
                hits: 1,
                rider: None,
            },
        }
    }

    fn crushing_blow() -> IntentDef {
        IntentDef {
            id: "crushing_blow".into(),
            name: "Crushing Blow".into(),
            kind: IntentKind::BigAttack,
            prep_turns: 2,
            cooldown: 4,
            min_turn: 0,
            hp_threshold: None,
            chance: 1.0,
            break_condition: BreakCondition::Statuses(vec![StatusKind::Stun]),
            payload: IntentPayload::Skill {
                skill: "slam".into(),
                multiplier: 2.0,
            },
            telegraph_text: "The ogre raises its club...".into(),
            execute_text: None,
        }
    }

    fn ogre() -> Combatant {
        let mut ogre = Combatant::new("ogre", "Ogre", 60);
        ogre.moves = vec!["slam".into()];
        ogre.intents = vec!["crushing_blow".into()];
        ogre
    }

    fn tables() -> ContentTables {
        ContentTables::new()
            .with_skill(slam())
            .with_intent(crushing_blow())
    }

    fn system() -> IntentSystem {
        IntentSystem::new(IntentConfig::default())
    }

    #[test]
    fn telegraph_counts_down_to_ready() {
        let mut intents = system();
        let hero = Combatant::new("hero", "Hero", 40);
        let mut rng = SequenceRng::constant(0.0);

        let decision = intents.generate(&ogre(), &hero, 1, &tables(), &mut rng);
        assert!(matches!(decision, IntentDecision::Triggered(_)));
        assert_eq!(
            intents.generate(&ogre(), &hero, 2, &tables(), &mut rng),
            IntentDecision::AlreadyTelegraphing
        );

        assert!(!intents.tick());
        assert!(intents.tick());
        assert!(intents.is_ready());
        assert_eq!(intents.get_skill(&tables()).map(|s| s.id.as_str()), Some("slam"));

        let done = intents.clear(3).unwrap();
        assert_eq!(done.def_id, "crushing_blow");
        assert!(intents.active().is_none());
        assert_eq!(intents.last_used("crushing_blow", "ogre"), Some(3));
    }

    #[test]
    fn cooldown_blocks_retrigger() {
        let mut intents = system();
        let hero = Combatant::new("hero", "Hero", 40);
        let mut rng = SequenceRng::constant(0.0);

        intents.generate(&ogre(), &hero, 1, &tables(), &mut rng);
        intents.clear(1);

        for turn in 2..5 {
            assert_eq!(
                intents.generate(&ogre(), &hero, turn, &tables(), &mut rng),
                IntentDecision::NoTrigger
            );
        }
        assert!(matches!(
            intents.generate(&ogre(), &hero, 5, &tables(), &mut rng),
            IntentDecision::Triggered(_)
        ));
    }

    #[test]
    fn matching_status_breaks_and_records() {
        let mut intents = system();
        let hero = Combatant::new("hero", "Hero", 40);
        intents.generate(&ogre(), &hero, 1, &tables(), &mut SequenceRng::constant(0.0));

        assert!(intents.can_break());
        assert!(!intents.would_break(StatusKind::Poison));
        assert!(intents.would_break(StatusKind::Stun));

        let broken = intents.break_intent(2).unwrap();
        assert_eq!(broken.fallback, ReactiveAction::BasicAttack);
        assert!(broken.message.contains("interrupted"));
        assert!(intents.active().is_none());
        assert_eq!(intents.last_used("crushing_blow", "ogre"), Some(2));
    }

    #[test]
    fn ready_intent_cannot_be_broken() {
        let mut intents = system();
        let hero = Combatant::new("hero", "Hero", 40);
        intents.generate(&ogre(), &hero, 1, &tables(), &mut SequenceRng::constant(0.0));
        intents.tick();
        assert!(intents.tick());
        assert!(!intents.is_telegraphing());

        assert!(!intents.would_break(StatusKind::Stun));
        assert!(intents.break_intent(3).is_none());
        assert!(intents.is_ready());
        assert_eq!(intents.last_used("crushing_blow", "ogre"), None);
    }

    #[test]
    fn hp_threshold_and_min_turn_gate() {
        let mut def = crushing_blow();
        def.hp_threshold = Some(0.5);
        def.min_turn = 3;
        let tables = ContentTables::new().with_skill(slam()).with_intent(def);
        let hero = Combatant::new("hero", "Hero", 40);
        let mut rng = SequenceRng::constant(0.0);
        let mut intents = system();

        let mut hurt = ogre();
        hurt.hp = 20;
        assert_eq!(
            intents.generate(&hurt, &hero, 2, &tables, &mut rng),
            IntentDecision::NoTrigger
        );
        assert_eq!(
            intents.generate(&ogre(), &hero, 3, &tables, &mut rng),
            IntentDecision::NoTrigger
        );
        assert!(matches!(
            intents.generate(&hurt, &hero, 3, &tables, &mut rng),
            IntentDecision::Triggered(_)
        ));
    }

    #[test]
    fn enemies_without_intents_act_reactively() {
        let mut intents = system();
        let hero = Combatant::new("hero", "Hero", 40);
        let mut grunt = Combatant::new("grunt", "Grunt", 30);
        grunt.moves = vec!["slam".into()];

        // 0.0 passes every chance roll: the move roll wins at full HP.
        let decision = intents.generate(&grunt, &hero, 1, &tables(), &mut SequenceRng::constant(0.0));
        assert_eq!(
            decision,
            IntentDecision::Reactive(ReactiveAction::UseMove {
                skill: "slam".into()
            })
        );

        // 0.99 fails every roll.
        let decision = intents.generate(&grunt, &hero, 1, &tables(), &mut SequenceRng::constant(0.99));
        assert_eq!(decision, IntentDecision::Reactive(ReactiveAction::BasicAttack));
    }

    #[test]
    fn history_is_bounded() {
        let mut intents = IntentSystem::new(IntentConfig {
            history_capacity: 2,
            ..IntentConfig::default()
        });
        let hero = Combatant::new("hero", "Hero", 40);
        let mut def = crushing_blow();
        def.cooldown = 0;
        let tables = ContentTables::new().with_skill(slam()).with_intent(def);

        for turn in 0..5 {
            intents.generate(&ogre(), &hero, turn, &tables, &mut SequenceRng::constant(0.0));
            intents.clear(turn);
        }
        assert_eq!(intents.history().count(), 2);
        assert_eq!(intents.history().next().map(|r| r.turn), Some(3));
    }
}
