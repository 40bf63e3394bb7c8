//! Action-point style with combo, momentum and guard.
//!
//! # Economy
//!
//! - **AP**: every action spends from a per-side pool, refilled by `ap_regen`
//!   at each round start and capped at `ap_max`.
//! - **Combo**: consecutive landed player hits raise a counter (capped) that
//!   scales damage by `1 + combo × combo_bonus_per_level`. A miss, a limit
//!   break or `combo_decay_turns` rounds without a landed hit reset it.
//! - **Momentum**: fills on player hits, decays each round. A full gauge
//!   unlocks a free multi-hit limit break.
//! - **Guard**: defending halves incoming damage and raises a guard-hit
//!   counter. Heavy attacks break guard once the counter reaches the
//!   threshold, letting full damage through.
//!
//! Hits are resolved with a d20 against armor class.

use super::{
    ActionOutcome, AttackOptions, AttackResult, BattleContext, BattleStyle, ForcedRoll,
    PlayerAction, StyleKind, deliver_attack, ensure_can_act, player_skill_def,
    resolve_support,
};
use crate::config::ApComboConfig;
use crate::env::{BASIC_ATTACK_ID, ContentTables, DamageSource, Side, SkillDef, SkillEffect};
use crate::error::ActionFailure;
use crate::qte::{Difficulty, MAX_CHAIN_HITS, QteKind, QteModifiers, QteRequest};
use crate::util::ai::pick_weighted_move;
use crate::util::element::{Effectiveness, effectiveness};
use crate::util::status::StatusModifiers;

/// One value per side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct PerSide<T> {
    player: T,
    enemy: T,
}

impl<T> PerSide<T> {
    fn get(&self, side: Side) -> &T {
        match side {
            Side::Player => &self.player,
            Side::Enemy => &self.enemy,
        }
    }

    fn get_mut(&mut self, side: Side) -> &mut T {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }
}

pub struct ApComboStyle {
    config: ApComboConfig,
    ap: PerSide<u32>,
    guarding: PerSide<bool>,
    guard_hits: PerSide<u32>,
    combo: u32,
    /// Rounds since the player last landed a hit.
    idle_rounds: u32,
    landed_this_round: bool,
    momentum: u32,
    forced_roll: Option<ForcedRoll>,
}

impl core::fmt::Debug for ApComboStyle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ApComboStyle")
            .field("ap", &self.ap)
            .field("guarding", &self.guarding)
            .field("guard_hits", &self.guard_hits)
            .field("combo", &self.combo)
            .field("momentum", &self.momentum)
            .finish_non_exhaustive()
    }
}

impl ApComboStyle {
    pub fn new(config: ApComboConfig) -> Self {
        let start = config.ap_start.min(config.ap_max);
        Self {
            config,
            ap: PerSide {
                player: start,
                enemy: start,
            },
            guarding: PerSide::default(),
            guard_hits: PerSide::default(),
            combo: 0,
            idle_rounds: 0,
            landed_this_round: false,
            momentum: 0,
            forced_roll: None,
        }
    }

    pub fn config(&self) -> &ApComboConfig {
        &self.config
    }

    pub fn ap(&self, side: Side) -> u32 {
        *self.ap.get(side)
    }

    /// Overwrite a side's AP, clamped to the max.
    pub fn set_ap(&mut self, side: Side, value: u32) {
        *self.ap.get_mut(side) = value.min(self.config.ap_max);
    }

    pub fn combo(&self) -> u32 {
        self.combo
    }

    pub fn momentum(&self) -> u32 {
        self.momentum
    }

    pub fn is_guarding(&self, side: Side) -> bool {
        *self.guarding.get(side)
    }

    pub fn guard_hits(&self, side: Side) -> u32 {
        *self.guard_hits.get(side)
    }

    pub fn limit_ready(&self) -> bool {
        self.momentum >= self.config.momentum_max
    }

    pub fn combo_multiplier(&self) -> f32 {
        1.0 + self.combo as f32 * self.config.combo_bonus_per_level
    }

    // ===== resources =====

    fn spend(&mut self, side: Side, cost: u32) -> Result<(), ActionFailure> {
        let have = *self.ap.get(side);
        if have < cost {
            return Err(ActionFailure::NoAp { have, need: cost });
        }
        *self.ap.get_mut(side) = have - cost;
        Ok(())
    }

    fn gain(&mut self, side: Side, amount: u32) {
        let ap = self.ap.get_mut(side);
        *ap = (*ap + amount).min(self.config.ap_max);
    }

    fn raise_guard(&mut self, side: Side) {
        *self.guarding.get_mut(side) = true;
        *self.guard_hits.get_mut(side) += 1;
        // Bonus lands after the cost and is then clamped to the max.
        self.gain(side, self.config.defend_bonus);
    }

    fn reset_combo(&mut self) {
        self.combo = 0;
        self.idle_rounds = 0;
    }

    fn roll_d20(&mut self, ctx: &mut BattleContext<'_>) -> u32 {
        if let Some(callback) = self.forced_roll.as_mut()
            && let Some(face) = callback(20)
        {
            return face.clamp(1, 20);
        }
        ctx.rng.roll_d20()
    }

    fn basic_attack(&self, ctx: &BattleContext<'_>, side: Side) -> SkillDef {
        SkillDef::basic_attack(
            0,
            ctx.store.combatant(side).basic_damage,
            self.config.attack_cost,
        )
    }

    /// AP cost of a skill; the basic attack costs `attack_cost`.
    fn cost_of(&self, skill: &SkillDef) -> u32 {
        if skill.id == BASIC_ATTACK_ID {
            self.config.attack_cost
        } else {
            skill.ap_cost
        }
    }

    // ===== resolution =====

    fn attack_with(
        &mut self,
        ctx: &mut BattleContext<'_>,
        attacker: Side,
        skill: &SkillDef,
        options: &AttackOptions,
        source: DamageSource,
    ) -> ActionOutcome {
        let mut outcome = ActionOutcome::ok();
        let defender = attacker.opponent();
        let hits = match &skill.effect {
            SkillEffect::Damage { hits, .. } => (*hits).max(1),
            _ => 1,
        };

        if options.defense.defend_ends && *self.guarding.get(defender) {
            *self.guarding.get_mut(defender) = false;
            outcome
                .messages
                .push(format!("{}'s guard slips!", ctx.store.combatant(defender).name));
        }

        for _ in 0..hits {
            if !ctx.store.combatant(defender).is_alive() {
                break;
            }
            let mut result = self.resolve_attack(ctx, attacker, skill, options);
            deliver_attack(ctx, attacker, skill, &mut result, source.clone(), &mut outcome);
            if result.hit && result.combo > 1 && attacker == Side::Player {
                outcome.messages.push(format!("{} hit combo!", result.combo));
            }
            outcome.attack = Some(result);
        }

        if attacker == Side::Enemy
            && options.defense.counter_attack
            && ctx.store.enemy().is_alive()
            && ctx.store.player().is_alive()
        {
            let counter = SkillDef {
                id: "counter".to_string(),
                name: "Counter".to_string(),
                ..self.basic_attack(ctx, Side::Player)
            };
            let mut result = AttackResult {
                hit: true,
                damage: counter_damage(ctx, &counter),
                ..AttackResult::miss()
            };
            deliver_attack(
                ctx,
                Side::Player,
                &counter,
                &mut result,
                DamageSource::Counter,
                &mut outcome,
            );
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
        let cost = self.cost_of(skill);
        self.spend(Side::Player, cost)?;

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
            self.gain(Side::Player, cost);
            return Err(failure);
        }
        Ok(outcome)
    }
}

/// Roll the counter's dice once.
fn counter_damage(ctx: &mut BattleContext<'_>, counter: &SkillDef) -> u32 {
    match &counter.effect {
        SkillEffect::Damage { dice, .. } => dice.roll_amount(&mut *ctx.rng).max(1),
        _ => 1,
    }
}

impl BattleStyle for ApComboStyle {
    fn kind(&self) -> StyleKind {
        StyleKind::ApCombo
    }

    fn reset(&mut self) {
        let forced_roll = self.forced_roll.take();
        *self = Self::new(self.config.clone());
        self.forced_roll = forced_roll;
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
        let SkillEffect::Damage { dice, .. } = &skill.effect else {
            return AttackResult::miss();
        };
        let defender = attacker.opponent();

        let attacker_c = ctx.store.combatant(attacker).clone();
        let defender_c = ctx.store.combatant(defender).clone();
        let attacker_mods = StatusModifiers::aggregate(&attacker_c.statuses);
        let defender_mods = StatusModifiers::aggregate(&defender_c.statuses);

        let mut roll = self.roll_d20(ctx);
        if options.offense.advantage {
            roll = roll.max(self.roll_d20(ctx));
        } else if options.offense.disadvantage {
            roll = roll.min(self.roll_d20(ctx));
        }

        let total = roll as i32
            + attacker_c.attack_bonus
            + attacker_mods.accuracy_bonus
            + options.offense.hit_bonus
            - ctx.store.terrain_accuracy_penalty();
        let armor = defender_c.ac + defender_mods.ac_bonus;

        let mut critical = roll >= self.config.crit_face || (options.offense.auto_crit && roll > 1);
        let hit = critical || (roll > 1 && total >= armor);

        if !hit {
            if attacker == Side::Player {
                self.reset_combo();
            }
            return AttackResult {
                roll: Some(roll),
                combo: self.combo,
                ..AttackResult::miss()
            };
        }

        if !critical && options.offense.crit_bonus > 0.0 {
            critical = ctx.rng.chance(options.offense.crit_bonus as f64);
        }

        let type_multiplier = if defender_c.elements.is_empty() {
            1.0
        } else {
            effectiveness(skill.element, &defender_c.elements)
        };
        let terrain = ctx.store.terrain_multiplier(skill.element);
        let combo_multiplier = if attacker == Side::Player {
            self.combo_multiplier()
        } else {
            1.0
        };
        let crit_multiplier = if critical { self.config.crit_multiplier } else { 1.0 };

        let mut raw = dice.roll_amount(&mut *ctx.rng).max(1) as f32
            * attacker_mods.attack_multiplier
            * defender_mods.damage_taken_multiplier
            * type_multiplier
            * terrain
            * combo_multiplier
            * crit_multiplier
            * options.offense.damage_multiplier
            * options.defense.damage_multiplier
            * options.power_multiplier;

        let mut stagger = self.config.hit_stagger + options.offense.stagger_bonus;
        let mut guarded = false;
        let mut guard_broken = false;
        if *self.guarding.get(defender) {
            let breaks = skill.heavy
                && (*self.guard_hits.get(defender) >= self.config.guard_break_threshold
                    || options.offense.force_guard_break);
            if breaks {
                guard_broken = true;
                *self.guarding.get_mut(defender) = false;
                *self.guard_hits.get_mut(defender) = 0;
                stagger += self.config.guard_break_stagger;
            } else {
                guarded = true;
                raw *= self.config.guard_reduction;
                *self.guard_hits.get_mut(defender) += 1;
            }
        }

        let damage = if type_multiplier <= 0.0 {
            0
        } else {
            (raw.floor() as u32).max(1)
        };

        if attacker == Side::Player {
            self.combo = (self.combo + 1).min(self.config.combo_max);
            self.landed_this_round = true;
            self.idle_rounds = 0;
            self.momentum = (self.momentum + self.config.momentum_per_hit).min(self.config.momentum_max);
        }

        AttackResult {
            hit: true,
            damage,
            critical,
            effectiveness: Effectiveness::from_multiplier(type_multiplier),
            guarded,
            guard_broken,
            combo: self.combo,
            roll: Some(roll),
            stagger,
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
        if let Err(failure) = self.spend(Side::Player, self.config.attack_cost) {
            return ActionOutcome::failure(failure);
        }
        let skill = self.basic_attack(ctx, Side::Player);
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
        if let Err(failure) = self.spend(Side::Player, self.config.defend_cost) {
            return ActionOutcome::failure(failure);
        }
        self.raise_guard(Side::Player);
        ActionOutcome::ok().with_message(format!(
            "{} raises their guard. (AP {})",
            ctx.store.player().name,
            self.ap.player
        ))
    }

    fn player_flee(&mut self, ctx: &mut BattleContext<'_>) -> ActionOutcome {
        if let Err(failure) = ensure_can_act(ctx, Side::Player) {
            return ActionOutcome::failure(failure);
        }
        if let Err(failure) = self.spend(Side::Player, self.config.flee_cost) {
            return ActionOutcome::failure(failure);
        }

        let momentum_ratio = if self.config.momentum_max == 0 {
            0.0
        } else {
            self.momentum as f64 / self.config.momentum_max as f64
        };
        let chance =
            self.config.flee_base as f64 + self.config.flee_momentum_weight as f64 * momentum_ratio;

        let mut outcome = ActionOutcome::ok();
        if ctx.rng.chance(chance) {
            outcome.fled = true;
            outcome.messages.push("You slip away!".to_string());
        } else {
            outcome.messages.push("You couldn't get away!".to_string());
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
        if !self.limit_ready() {
            return ActionOutcome::failure(ActionFailure::LimitNotReady);
        }

        let hits = self.config.limit_break_hits.max(1) as usize;
        let per_hit: Vec<f32> = match qte {
            Some(QteModifiers::Chain(chain)) => chain
                .hit_multipliers()
                .chain(core::iter::repeat(1.0))
                .take(hits)
                .collect(),
            Some(other) => vec![other.offense().damage_multiplier; hits],
            None => vec![1.0; hits],
        };

        let combo_multiplier = self.combo_multiplier();
        let mut skill = self.basic_attack(ctx, Side::Player);
        skill.id = "limit_break".to_string();
        skill.name = "Limit Break".to_string();
        skill.element = ctx.store.player().primary_element();
        skill.sfx = Some("limit_break".to_string());

        let mut outcome = ActionOutcome::ok().with_message(format!(
            "{} unleashes a {}-hit Limit Break!",
            ctx.store.player().name,
            hits
        ));

        for multiplier in per_hit {
            if !ctx.store.enemy().is_alive() {
                break;
            }
            let rolled = self.config.limit_break_dice.roll_amount(&mut *ctx.rng).max(1) as f32;
            let mut result = if multiplier <= 0.0 {
                AttackResult::miss()
            } else {
                AttackResult {
                    hit: true,
                    damage: ((rolled * combo_multiplier * multiplier).floor() as u32).max(1),
                    combo: self.combo,
                    stagger: self.config.hit_stagger,
                    ..AttackResult::miss()
                }
            };
            deliver_attack(
                ctx,
                Side::Player,
                &skill,
                &mut result,
                DamageSource::LimitBreak,
                &mut outcome,
            );
            outcome.attack = Some(result);
        }

        self.combo = 0;
        self.momentum = 0;
        self.idle_rounds = 0;
        outcome
    }

    fn select_enemy_move(&mut self, ctx: &mut BattleContext<'_>) -> SkillDef {
        let budget = self.ap.enemy;
        let enemy = ctx.store.enemy();
        let player = ctx.store.player();
        pick_weighted_move(
            &mut *ctx.rng,
            ctx.tables,
            &enemy.moves,
            &player.elements,
            |s| s.ap_cost <= budget,
        )
        .cloned()
        .unwrap_or_else(|| SkillDef::basic_attack(0, enemy.basic_damage, self.config.attack_cost))
    }

    fn enemy_turn(
        &mut self,
        ctx: &mut BattleContext<'_>,
        qte: Option<&QteModifiers>,
    ) -> ActionOutcome {
        // The enemy's own guard lasts until its next turn.
        self.guarding.enemy = false;

        if let Err(failure) = ensure_can_act(ctx, Side::Enemy) {
            return ActionOutcome::ok().with_message(failure.to_string());
        }

        let enemy_name = ctx.store.enemy().name.clone();
        if self.ap.enemy < self.config.attack_cost {
            if self.spend(Side::Enemy, self.config.defend_cost).is_ok() {
                self.raise_guard(Side::Enemy);
                return ActionOutcome::ok().with_message(format!("{enemy_name} raises its guard."));
            }
            return ActionOutcome::ok().with_message(format!("{enemy_name} gathers its strength."));
        }

        let skill = self.select_enemy_move(ctx);
        let cost = self.cost_of(&skill);
        if let Err(failure) = self.spend(Side::Enemy, cost) {
            return ActionOutcome::ok().with_message(failure.to_string());
        }
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
            let source = if skill.id == BASIC_ATTACK_ID {
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
        let mut messages = Vec::new();

        self.gain(Side::Player, self.config.ap_regen);
        self.gain(Side::Enemy, self.config.ap_regen);
        self.guarding.player = false;

        if self.landed_this_round {
            self.idle_rounds = 0;
        } else {
            self.idle_rounds += 1;
        }
        self.landed_this_round = false;
        if self.combo > 0 && self.idle_rounds >= self.config.combo_decay_turns {
            messages.push(format!("Your {}-hit combo fades.", self.combo));
            self.reset_combo();
        }

        self.momentum = self.momentum.saturating_sub(self.config.momentum_decay);
        messages
    }

    fn player_qte(&self, action: &PlayerAction, tables: &ContentTables) -> Option<QteRequest> {
        let request = |kind| QteRequest::new(kind, Difficulty::default());
        match action {
            PlayerAction::Attack => Some(request(QteKind::Accuracy)),
            PlayerAction::Skill(id) => {
                let skill = tables.skill(id)?;
                if !skill.effect.is_damaging() {
                    None
                } else if skill.heavy && self.guarding.enemy {
                    Some(request(QteKind::GuardBreak).with_label(skill.name.clone()))
                } else if skill.timed {
                    Some(request(QteKind::Skill).with_label(skill.name.clone()))
                } else {
                    None
                }
            }
            PlayerAction::LimitBreak => {
                let hits = self.config.limit_break_hits.clamp(1, MAX_CHAIN_HITS as u32);
                Some(QteRequest::chain_combo(hits, Difficulty::default()).with_label("Limit Break"))
            }
            PlayerAction::Defend | PlayerAction::Flee => None,
        }
    }

    fn enemy_qte(&self) -> Option<QteKind> {
        if self.guarding.player {
            Some(QteKind::Parry)
        } else {
            Some(QteKind::Dodge)
        }
    }

    fn set_forced_roll_callback(&mut self, callback: Option<ForcedRoll>) {
        self.forced_roll = callback;
    }
}
