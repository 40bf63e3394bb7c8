//! Type-effectiveness style with per-move power points.
//!
//! Damage follows the classic monster-battler formula:
//!
//! ```text
//! base   = floor(power × attack / defense / 2) + 2
//! damage = base × random(0.85..1.0) × type × STAB × terrain × crit
//! ```
//!
//! Attacks only miss when the skill declares an accuracy and the roll fails.

use std::collections::HashMap;

use super::{
    ActionOutcome, AttackOptions, AttackResult, BattleContext, BattleStyle, PlayerAction,
    StyleKind, deliver_attack, ensure_can_act, player_skill_def, resolve_support,
};
use crate::config::TypePpConfig;
use crate::env::{ContentTables, DamageMeta, DamageSource, Side, SkillDef, SkillEffect};
use crate::error::ActionFailure;
use crate::qte::{Difficulty, QteKind, QteModifiers, QteRequest};
use crate::util::ai::pick_weighted_move;
use crate::util::element::{Effectiveness, effectiveness};
use crate::util::status::{StatusKind, StatusModifiers};

#[derive(Clone, Debug)]
pub struct TypePpStyle {
    config: TypePpConfig,
    /// Remaining PP for player moves, filled lazily from the skill definition.
    pp: HashMap<String, u32>,
    flee_attempts: u32,
}

impl TypePpStyle {
    pub fn new(config: TypePpConfig) -> Self {
        Self {
            config,
            pp: HashMap::new(),
            flee_attempts: 0,
        }
    }

    pub fn config(&self) -> &TypePpConfig {
        &self.config
    }

    /// PP left for a player move. `None` for unknown or unlimited moves.
    pub fn remaining_pp(&self, tables: &ContentTables, skill_id: &str) -> Option<u32> {
        let max = tables.skill(skill_id)?.pp?;
        Some(self.pp.get(skill_id).copied().unwrap_or(max))
    }

    fn basic_attack(&self, basic_damage: crate::util::dice::DiceExpr) -> SkillDef {
        SkillDef::basic_attack(self.config.basic_attack_power, basic_damage, 0)
    }

    fn limit_break_skill(&self, ctx: &BattleContext<'_>) -> SkillDef {
        let player = ctx.store.player();
        let mut skill = self.basic_attack(player.basic_damage);
        skill.id = "limit_break".to_string();
        skill.name = "Limit Break".to_string();
        skill.element = player.primary_element();
        skill.sfx = Some("limit_break".to_string());
        skill.effect = SkillEffect::Damage {
            power: self.config.limit_break_power,
            dice: player.basic_damage,
            hits: 1,
            rider: None,
        };
        skill
    }

    /// Accuracy check for skills that declare one.
    fn accuracy_roll(
        &self,
        ctx: &mut BattleContext<'_>,
        accuracy: u32,
        options: &AttackOptions,
        attacker_mods: &StatusModifiers,
    ) -> bool {
        let steps =
            options.offense.hit_bonus + attacker_mods.accuracy_bonus - ctx.store.terrain_accuracy_penalty();
        let chance = ((accuracy as f64 + steps as f64 * 5.0) / 100.0).clamp(0.0, 1.0);

        let first = ctx.rng.chance(chance);
        if options.offense.advantage && !first {
            return ctx.rng.chance(chance);
        }
        if options.offense.disadvantage && first {
            return ctx.rng.chance(chance);
        }
        first
    }

    /// Run every hit of a damaging skill and deliver it.
    fn attack_with(
        &mut self,
        ctx: &mut BattleContext<'_>,
        attacker: Side,
        skill: &SkillDef,
        options: &AttackOptions,
        source: DamageSource,
    ) -> ActionOutcome {
        let mut outcome = ActionOutcome::ok();
        let hits = match &skill.effect {
            SkillEffect::Damage { hits, .. } => (*hits).max(1),
            _ => 1,
        };
        let defender = attacker.opponent();

        for _ in 0..hits {
            if !ctx.store.combatant(defender).is_alive() {
                break;
            }
            let mut result = self.resolve_attack(ctx, attacker, skill, options);
            let dealt = deliver_attack(ctx, attacker, skill, &mut result, source.clone(), &mut outcome);

            if attacker == Side::Enemy && result.hit && options.defense.counter_attack {
                let counter = ((dealt as f32 * self.config.counter_ratio) as u32).max(1);
                let meta = DamageMeta::new(DamageSource::Counter, skill.element);
                let countered = ctx.store.damage(Side::Enemy, counter, &meta);
                outcome.messages.push(format!(
                    "{} counters for {} damage!",
                    ctx.store.player().name,
                    countered
                ));
            }
            outcome.attack = Some(result);
        }
        outcome
    }

    fn use_player_skill(
        &mut self,
        ctx: &mut BattleContext<'_>,
        skill_id: &str,
        qte: Option<&QteModifiers>,
    ) -> Result<ActionOutcome, ActionFailure> {
        ensure_can_act(ctx, Side::Player)?;
        let skill = player_skill_def(ctx.tables, &*ctx.store, skill_id)?;

        let spent = match skill.pp {
            Some(max) => {
                let remaining = self.pp.entry(skill.id.clone()).or_insert(max);
                if *remaining == 0 {
                    return Err(ActionFailure::NoPp(skill.name.clone()));
                }
                *remaining -= 1;
                true
            }
            None => false,
        };

        if skill.effect.is_damaging() {
            let options = AttackOptions::offensive(qte);
            return Ok(self.attack_with(
                ctx,
                Side::Player,
                skill,
                &options,
                DamageSource::Skill(skill.id.clone()),
            ));
        }

        let mut outcome = ActionOutcome::ok();
        if let Err(failure) = resolve_support(ctx, Side::Player, skill, &mut outcome) {
            if spent && let Some(remaining) = self.pp.get_mut(&skill.id) {
                *remaining += 1;
            }
            return Err(failure);
        }
        Ok(outcome)
    }
}

impl BattleStyle for TypePpStyle {
    fn kind(&self) -> StyleKind {
        StyleKind::TypePp
    }

    fn reset(&mut self) {
        self.pp.clear();
        self.flee_attempts = 0;
    }

    fn resolve_attack(
        &mut self,
        ctx: &mut BattleContext<'_>,
        attacker: Side,
        skill: &SkillDef,
        options: &AttackOptions,
    ) -> AttackResult {
        if options.defense.evaded {
            return AttackResult::evaded();
        }
        let SkillEffect::Damage { power, .. } = &skill.effect else {
            return AttackResult::miss();
        };

        let attacker_c = ctx.store.combatant(attacker).clone();
        let defender_c = ctx.store.combatant(attacker.opponent()).clone();
        let attacker_mods = StatusModifiers::aggregate(&attacker_c.statuses);
        let defender_mods = StatusModifiers::aggregate(&defender_c.statuses);

        if let Some(accuracy) = skill.accuracy
            && !self.accuracy_roll(ctx, accuracy, options, &attacker_mods)
        {
            return AttackResult::miss();
        }

        let attack = attacker_c.attack as f32 * attacker_mods.attack_multiplier;
        let defense = (defender_c.defense as f32 * defender_mods.defense_multiplier).max(1.0);
        let base = (*power as f32 * attack / defense / 2.0).floor() + 2.0;

        let floor = self.config.random_floor.clamp(0.0, 1.0);
        let random = floor + ctx.rng.next_f64() as f32 * (1.0 - floor);

        let type_multiplier = if defender_c.elements.is_empty() {
            1.0
        } else {
            effectiveness(skill.element, &defender_c.elements)
        };
        let stab = attacker_c.elements.contains(&skill.element);
        let stab_multiplier = if stab { self.config.same_type_bonus } else { 1.0 };
        let terrain = ctx.store.terrain_multiplier(skill.element);

        let crit_chance = (self.config.crit_base_chance * attacker_c.crit_ratio
            + attacker_mods.crit_bonus
            + options.offense.crit_bonus)
            .min(self.config.crit_chance_cap);
        let critical = options.offense.auto_crit || ctx.rng.chance(crit_chance as f64);
        let crit_multiplier = if critical { self.config.crit_multiplier } else { 1.0 };

        let raw = base
            * random
            * type_multiplier
            * stab_multiplier
            * terrain
            * crit_multiplier
            * options.offense.damage_multiplier
            * options.defense.damage_multiplier
            * options.power_multiplier
            * defender_mods.damage_taken_multiplier;

        let damage = if type_multiplier <= 0.0 {
            0
        } else {
            (raw.floor() as u32).max(1)
        };

        AttackResult {
            hit: true,
            damage,
            critical,
            effectiveness: Effectiveness::from_multiplier(type_multiplier),
            stab,
            ..AttackResult::miss()
        }
    }

    fn player_attack(
        &mut self,
        ctx: &mut BattleContext<'_>,
        qte: Option<&QteModifiers>,
    ) -> ActionOutcome {
        if let Err(failure) = ensure_can_act(ctx, Side::Player) {
            return ActionOutcome::failure(failure);
        }
        let skill = self.basic_attack(ctx.store.player().basic_damage);
        let options = AttackOptions::offensive(qte);
        self.attack_with(ctx, Side::Player, &skill, &options, DamageSource::Attack)
    }

    fn player_skill(
        &mut self,
        ctx: &mut BattleContext<'_>,
        skill_id: &str,
        qte: Option<&QteModifiers>,
    ) -> ActionOutcome {
        self.use_player_skill(ctx, skill_id, qte).into()
    }

    fn player_defend(&mut self, ctx: &mut BattleContext<'_>) -> ActionOutcome {
        if let Err(failure) = ensure_can_act(ctx, Side::Player) {
            return ActionOutcome::failure(failure);
        }
        let mut outcome = ActionOutcome::ok()
            .with_message(format!("{} braces for impact.", ctx.store.player().name));
        super::apply_status(ctx, Side::Player, StatusKind::Shield, 1, &mut outcome);
        outcome
    }

    fn player_flee(&mut self, ctx: &mut BattleContext<'_>) -> ActionOutcome {
        if let Err(failure) = ensure_can_act(ctx, Side::Player) {
            return ActionOutcome::failure(failure);
        }
        self.flee_attempts += 1;

        let player_speed = ctx.store.player().speed as f64;
        let enemy_speed = (ctx.store.enemy().speed as f64).max(1.0);
        let odds = (player_speed * 128.0 / enemy_speed + 30.0 * self.flee_attempts as f64) / 256.0;

        let mut outcome = ActionOutcome::ok();
        if ctx.rng.chance(odds) {
            outcome.fled = true;
            outcome.messages.push("Got away safely!".to_string());
        } else {
            outcome.messages.push("Can't escape!".to_string());
        }
        outcome
    }

    fn player_limit_break(
        &mut self,
        ctx: &mut BattleContext<'_>,
        qte: Option<&QteModifiers>,
    ) -> ActionOutcome {
        if let Err(failure) = ensure_can_act(ctx, Side::Player) {
            return ActionOutcome::failure(failure);
        }
        if !ctx.store.is_limit_ready() {
            return ActionOutcome::failure(ActionFailure::LimitNotReady);
        }
        ctx.store.use_limit_charge();

        let skill = self.limit_break_skill(ctx);
        let options = AttackOptions::offensive(qte);
        let mut outcome = ActionOutcome::ok()
            .with_message(format!("{} unleashes a Limit Break!", ctx.store.player().name));
        let strike = self.attack_with(ctx, Side::Player, &skill, &options, DamageSource::LimitBreak);
        outcome.absorb(strike);
        outcome
    }

    fn select_enemy_move(&mut self, ctx: &mut BattleContext<'_>) -> SkillDef {
        let enemy = ctx.store.enemy();
        let player = ctx.store.player();
        pick_weighted_move(&mut *ctx.rng, ctx.tables, &enemy.moves, &player.elements, |_| true)
            .cloned()
            .unwrap_or_else(|| self.basic_attack(enemy.basic_damage))
    }

    fn enemy_turn(
        &mut self,
        ctx: &mut BattleContext<'_>,
        qte: Option<&QteModifiers>,
    ) -> ActionOutcome {
        let skill = self.select_enemy_move(ctx);
        self.enemy_skill(ctx, &skill, 1.0, qte)
    }

    fn enemy_skill(
        &mut self,
        ctx: &mut BattleContext<'_>,
        skill: &SkillDef,
        power_multiplier: f32,
        qte: Option<&QteModifiers>,
    ) -> ActionOutcome {
        if let Err(failure) = ensure_can_act(ctx, Side::Enemy) {
            return ActionOutcome::ok().with_message(failure.to_string());
        }

        if skill.effect.is_damaging() {
            let options = AttackOptions::defensive(qte).with_power_multiplier(power_multiplier);
            let source = if skill.id == crate::env::BASIC_ATTACK_ID {
                DamageSource::Attack
            } else {
                DamageSource::Skill(skill.id.clone())
            };
            return self.attack_with(ctx, Side::Enemy, skill, &options, source);
        }

        let mut outcome = ActionOutcome::ok();
        if let Err(failure) = resolve_support(ctx, Side::Enemy, skill, &mut outcome) {
            outcome.messages.push(failure.to_string());
        }
        outcome
    }

    fn on_turn_start(&mut self, _ctx: &mut BattleContext<'_>) -> Vec<String> {
        Vec::new()
    }

    fn player_qte(&self, action: &PlayerAction, tables: &ContentTables) -> Option<QteRequest> {
        match action {
            PlayerAction::Skill(id) => tables
                .skill(id)
                .filter(|s| s.timed && s.effect.is_damaging())
                .map(|s| QteRequest::new(QteKind::Skill, Difficulty::default()).with_label(s.name.clone())),
            PlayerAction::LimitBreak => {
                Some(QteRequest::new(QteKind::Skill, Difficulty::default()).with_label("Limit Break"))
            }
            PlayerAction::Attack | PlayerAction::Defend | PlayerAction::Flee => None,
        }
    }

    fn enemy_qte(&self) -> Option<QteKind> {
        Some(QteKind::Defend)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::SequenceRng;
    use crate::qte::{QteEngine, Zone};
    use crate::style::testing::{TestStore, summons, tables};
    use crate::util::element::Element;
    use crate::util::status::StatusEffect;

    fn style() -> TypePpStyle {
        TypePpStyle::new(TypePpConfig::default())
    }

    #[test]
    fn damage_follows_formula() {
        let mut store = TestStore::new();
        let mut rng = SequenceRng::constant(0.99);
        let tables = tables();
        let mut summons = summons();
        let mut ctx = BattleContext::new(&mut store, &mut rng, &tables, &mut summons);

        let outcome = style().player_skill(&mut ctx, "ember", None);
        let attack = outcome.attack.unwrap();
        // floor(40*10/10/2)+2 = 22; ×0.9985 ×2 (fire→grass) ×1.5 (same type)
        assert_eq!(attack.damage, 65);
        assert!(attack.stab);
        assert_eq!(attack.effectiveness, Effectiveness::SuperEffective);
        assert!(!attack.critical);
        assert_eq!(store.enemy.hp, 35);
    }

    #[test]
    fn immune_defender_takes_nothing() {
        let mut store = TestStore::new();
        store.enemy.elements = vec![Element::Ghost];
        let mut rng = SequenceRng::constant(0.99);
        let tables = tables();
        let mut summons = summons();
        let mut ctx = BattleContext::new(&mut store, &mut rng, &tables, &mut summons);

        let outcome = style().player_attack(&mut ctx, None);
        assert_eq!(outcome.attack.unwrap().damage, 0);
        assert!(outcome.messages.iter().any(|m| m.contains("no effect")));
    }

    #[test]
    fn pp_runs_out() {
        let mut store = TestStore::new();
        store.enemy.max_hp = 500;
        store.enemy.hp = 500;
        let mut rng = SequenceRng::constant(0.99);
        let tables = tables();
        let mut summons = summons();
        let mut ctx = BattleContext::new(&mut store, &mut rng, &tables, &mut summons);
        let mut style = style();

        assert!(style.player_skill(&mut ctx, "ember", None).success);
        assert_eq!(style.remaining_pp(&tables, "ember"), Some(0));

        let second = style.player_skill(&mut ctx, "ember", None);
        assert!(!second.success);
        assert_eq!(second.reason_code(), Some("no_pp"));
    }

    #[test]
    fn unknown_and_unlearned_skills_are_rejected() {
        let mut store = TestStore::new();
        let mut rng = SequenceRng::constant(0.5);
        let tables = tables();
        let mut summons = summons();
        let mut ctx = BattleContext::new(&mut store, &mut rng, &tables, &mut summons);
        let mut style = style();

        assert_eq!(
            style.player_skill(&mut ctx, "meteor", None).reason_code(),
            Some("unknown_skill")
        );
        assert_eq!(
            style.player_skill(&mut ctx, "tackle", None).reason_code(),
            Some("not_in_moveset")
        );
    }

    #[test]
    fn heal_skill_skips_damage() {
        let mut store = TestStore::new();
        store.player.hp = 50;
        let mut rng = SequenceRng::constant(0.5);
        let tables = tables();
        let mut summons = summons();
        let mut ctx = BattleContext::new(&mut store, &mut rng, &tables, &mut summons);

        let outcome = style().player_skill(&mut ctx, "mend", None);
        assert_eq!(outcome.healed, Some(10));
        assert!(outcome.attack.is_none());
        assert_eq!(store.player.hp, 60);
        assert_eq!(store.enemy.hp, 100);
    }

    #[test]
    fn failed_summon_refunds_pp() {
        let mut store = TestStore::new();
        let mut rng = SequenceRng::constant(0.5);
        let tables = tables();
        let mut summons = summons();
        let mut ctx = BattleContext::new(&mut store, &mut rng, &tables, &mut summons);
        let mut style = style();

        let first = style.player_skill(&mut ctx, "call_wolf", None);
        assert!(first.summoned.is_some());
        assert_eq!(style.remaining_pp(&tables, "call_wolf"), Some(1));

        let second = style.player_skill(&mut ctx, "call_wolf", None);
        assert_eq!(second.reason_code(), Some("max_summons"));
        assert_eq!(style.remaining_pp(&tables, "call_wolf"), Some(1));
    }

    #[test]
    fn limit_break_needs_charge() {
        let mut store = TestStore::new();
        let mut rng = SequenceRng::constant(0.99);
        let tables = tables();
        let mut summons = summons();
        let mut style = style();

        {
            let mut ctx = BattleContext::new(&mut store, &mut rng, &tables, &mut summons);
            let outcome = style.player_limit_break(&mut ctx, None);
            assert_eq!(outcome.reason_code(), Some("limit_not_ready"));
        }

        store.limit_ready = true;
        let mut ctx = BattleContext::new(&mut store, &mut rng, &tables, &mut summons);
        let outcome = style.player_limit_break(&mut ctx, None);
        assert!(outcome.success);
        assert!(outcome.total_damage.unwrap() > 0);
        assert!(!store.limit_ready);
    }

    #[test]
    fn perfect_defend_reduces_and_counters() {
        let mut store = TestStore::new();
        let mut rng = SequenceRng::constant(0.99);
        let tables = tables();
        let mut summons = summons();
        let mut ctx = BattleContext::new(&mut store, &mut rng, &tables, &mut summons);

        let defend = QteEngine::modifiers_for(QteKind::Defend, Zone::Perfect);
        let tackle = tables.skill("tackle").unwrap().clone();
        let outcome = style().enemy_skill(&mut ctx, &tackle, 1.0, Some(&defend));

        assert!(outcome.messages.iter().any(|m| m.contains("counters")));
        assert!(store.player.hp > 90);
        assert!(store.enemy.hp < 100);
    }

    #[test]
    fn stunned_player_cannot_act() {
        let mut store = TestStore::new();
        store.player.statuses.push(StatusEffect::new(StatusKind::Stun, 1, 1));
        let mut rng = SequenceRng::constant(0.5);
        let tables = tables();
        let mut summons = summons();
        let mut ctx = BattleContext::new(&mut store, &mut rng, &tables, &mut summons);

        let outcome = style().player_attack(&mut ctx, None);
        assert_eq!(outcome.reason_code(), Some("cannot_act"));
        assert_eq!(store.enemy.hp, 100);
    }
}
