//! Battle styles - interchangeable rule sets behind one action contract.
//!
//! # Module Structure
//!
//! - `outcome`: result types every action returns (`ActionOutcome`, `AttackResult`)
//! - `type_pp`: type-effectiveness damage with per-move power points
//! - `ap_combo`: action points, combo/momentum and guard economy
//!
//! A battle picks one style at start through [`StyleKind`] and drives every
//! action through the [`BattleStyle`] trait. Styles keep only their own
//! economy (PP map, AP pools, combo counters); combatant HP, statuses and
//! stagger always go through the [`BattleStore`].
mod ap_combo;
mod outcome;
mod type_pp;

pub use ap_combo::ApComboStyle;
pub use outcome::{ActionOutcome, AppliedStatus, AttackOptions, AttackResult};
pub use type_pp::TypePpStyle;

use crate::config::CombatConfig;
use crate::env::{
    BattleStore, ContentTables, DamageMeta, DamageSource, RandomSource, Side, SkillDef,
    SkillEffect,
};
use crate::error::ActionFailure;
use crate::qte::{QteKind, QteModifiers, QteRequest};
use crate::summon::{SummonManager, SummonOverrides};
use crate::util::status::StatusKind;

/// Which rule set a battle runs under.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StyleKind {
    /// Type-effectiveness damage, per-move power points.
    #[default]
    TypePp,
    /// Action points, combo/momentum, guard and guard break.
    ApCombo,
}

impl StyleKind {
    /// Construct the style with its section of the config.
    pub fn build(self, config: &CombatConfig) -> Box<dyn BattleStyle> {
        match self {
            Self::TypePp => Box::new(TypePpStyle::new(config.type_pp.clone())),
            Self::ApCombo => Box::new(ApComboStyle::new(config.ap_combo.clone())),
        }
    }
}

/// Player action request routed through the active style.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlayerAction {
    Attack,
    Skill(String),
    Defend,
    Flee,
    LimitBreak,
}

/// Hook for scripting d20 faces in tests. Receives the die size.
pub type ForcedRoll = Box<dyn FnMut(u32) -> Option<u32>>;

/// Collaborators a style needs for one action.
pub struct BattleContext<'a> {
    pub store: &'a mut dyn BattleStore,
    pub rng: &'a mut dyn RandomSource,
    pub tables: &'a ContentTables,
    pub summons: &'a mut SummonManager,
}

impl<'a> BattleContext<'a> {
    pub fn new(
        store: &'a mut dyn BattleStore,
        rng: &'a mut dyn RandomSource,
        tables: &'a ContentTables,
        summons: &'a mut SummonManager,
    ) -> Self {
        Self {
            store,
            rng,
            tables,
            summons,
        }
    }
}

/// The action contract every rule set implements.
///
/// `qte` arguments carry the graded modifiers of a timing challenge the
/// caller already ran (see [`BattleStyle::player_qte`]); `None` means no
/// challenge and neutral modifiers.
pub trait BattleStyle {
    fn kind(&self) -> StyleKind;

    /// Clear all per-battle economy state.
    fn reset(&mut self);

    /// Roll hit and damage for one use of `skill` by `attacker`.
    ///
    /// Updates the style's own economy (combo, guard counters) but never
    /// touches the store; [`deliver_attack`] applies the result.
    fn resolve_attack(
        &mut self,
        ctx: &mut BattleContext<'_>,
        attacker: Side,
        skill: &SkillDef,
        options: &AttackOptions,
    ) -> AttackResult;

    fn player_attack(
        &mut self,
        ctx: &mut BattleContext<'_>,
        qte: Option<&QteModifiers>,
    ) -> ActionOutcome;

    fn player_skill(
        &mut self,
        ctx: &mut BattleContext<'_>,
        skill_id: &str,
        qte: Option<&QteModifiers>,
    ) -> ActionOutcome;

    fn player_defend(&mut self, ctx: &mut BattleContext<'_>) -> ActionOutcome;

    fn player_flee(&mut self, ctx: &mut BattleContext<'_>) -> ActionOutcome;

    fn player_limit_break(
        &mut self,
        ctx: &mut BattleContext<'_>,
        qte: Option<&QteModifiers>,
    ) -> ActionOutcome;

    /// Choose the enemy's move for a normal turn.
    fn select_enemy_move(&mut self, ctx: &mut BattleContext<'_>) -> SkillDef;

    /// A normal enemy turn. `qte` holds the player's defensive timing result.
    fn enemy_turn(
        &mut self,
        ctx: &mut BattleContext<'_>,
        qte: Option<&QteModifiers>,
    ) -> ActionOutcome;

    /// The enemy uses a specific skill, e.g. when an intent executes.
    fn enemy_skill(
        &mut self,
        ctx: &mut BattleContext<'_>,
        skill: &SkillDef,
        power_multiplier: f32,
        qte: Option<&QteModifiers>,
    ) -> ActionOutcome;

    /// Per-round upkeep (regeneration, decay). Returns log lines.
    fn on_turn_start(&mut self, ctx: &mut BattleContext<'_>) -> Vec<String>;

    /// Timing challenge to run before `action`, if any.
    fn player_qte(&self, action: &PlayerAction, tables: &ContentTables) -> Option<QteRequest>;

    /// Defensive timing challenge to offer before an enemy attack, if any.
    fn enemy_qte(&self) -> Option<QteKind>;

    /// Install a die-face override. Styles that roll no dice ignore it.
    fn set_forced_roll_callback(&mut self, _callback: Option<ForcedRoll>) {}

    /// Route a [`PlayerAction`] to the matching method.
    fn perform(
        &mut self,
        ctx: &mut BattleContext<'_>,
        action: &PlayerAction,
        qte: Option<&QteModifiers>,
    ) -> ActionOutcome {
        match action {
            PlayerAction::Attack => self.player_attack(ctx, qte),
            PlayerAction::Skill(id) => self.player_skill(ctx, id, qte),
            PlayerAction::Defend => self.player_defend(ctx),
            PlayerAction::Flee => self.player_flee(ctx),
            PlayerAction::LimitBreak => self.player_limit_break(ctx, qte),
        }
    }
}

// ============================================================================
// Shared resolution helpers
// ============================================================================

/// Refuse the action when the actor is stunned, asleep or frozen.
pub(crate) fn ensure_can_act(ctx: &BattleContext<'_>, side: Side) -> Result<(), ActionFailure> {
    if ctx.store.can_act(side) {
        return Ok(());
    }
    let name = &ctx.store.combatant(side).name;
    Err(ActionFailure::CannotAct(
        ctx.store.cannot_act_message(side, name),
    ))
}

/// Look up a skill the player wants to use and check they know it.
pub(crate) fn player_skill_def<'t>(
    tables: &'t ContentTables,
    store: &dyn BattleStore,
    skill_id: &str,
) -> Result<&'t SkillDef, ActionFailure> {
    let skill = tables
        .skill(skill_id)
        .ok_or_else(|| ActionFailure::UnknownSkill(skill_id.to_string()))?;
    if !store.player().moves.iter().any(|id| id == skill_id) {
        return Err(ActionFailure::NotInMoveset(skill.name.clone()));
    }
    Ok(skill)
}

/// Apply a resolved attack through the store.
///
/// Handles summon interception, stagger, the skill's status rider and the
/// feedback lines. Returns the damage actually dealt.
pub fn deliver_attack(
    ctx: &mut BattleContext<'_>,
    attacker: Side,
    skill: &SkillDef,
    result: &mut AttackResult,
    source: DamageSource,
    outcome: &mut ActionOutcome,
) -> u32 {
    let defender = attacker.opponent();
    let attacker_name = ctx.store.combatant(attacker).name.clone();

    if !result.hit {
        let line = if result.evaded {
            format!(
                "{} evades {}'s {}!",
                ctx.store.combatant(defender).name,
                attacker_name,
                skill.name
            )
        } else {
            format!("{}'s {} misses!", attacker_name, skill.name)
        };
        outcome.messages.push(line);
        return 0;
    }

    if let Some(sfx) = &skill.sfx {
        ctx.store.play_sfx(sfx);
    }

    let defender_combatant = ctx.store.combatant(defender);
    let defender_id = defender_combatant.id.clone();
    let defender_name = defender_combatant.name.clone();
    let defender_ratio = defender_combatant.hp_fraction();

    let intercept = ctx
        .summons
        .check_intercept(&defender_id, defender_ratio, &mut *ctx.rng);

    let intercepted = intercept.and_then(|uid| {
        ctx.summons
            .take_damage(uid, result.damage)
            .map(|hit| (uid, hit))
    });

    let dealt = match intercepted {
        Some((uid, hit)) => {
            result.intercepted_by = Some(uid);
            let protector = hit
                .killed
                .as_ref()
                .map(|d| d.summon.name.clone())
                .or_else(|| ctx.summons.get(uid).map(|s| s.name.clone()))
                .unwrap_or_default();
            outcome.messages.push(format!(
                "{} leaps in front of {} and takes {} damage!",
                protector, defender_name, hit.dealt
            ));
            if let Some(killed) = hit.killed {
                outcome.messages.push(killed.message);
            }
            hit.dealt
        }
        None => {
            let meta = DamageMeta::new(source, skill.element).with_critical(result.critical);
            let dealt = ctx.store.damage(defender, result.damage, &meta);
            outcome.messages.push(format!(
                "{}'s {} hits {} for {} damage!",
                attacker_name, skill.name, defender_name, dealt
            ));
            if result.stagger > 0 {
                let stagger = ctx.store.add_stagger(defender, result.stagger);
                if stagger.applied {
                    outcome.messages.push(stagger.message);
                    outcome.statuses.push(AppliedStatus {
                        target: defender,
                        kind: StatusKind::Stun,
                        stacks: 1,
                    });
                }
            }
            dealt
        }
    };

    if result.critical {
        outcome.messages.push("A critical hit!".to_string());
    }
    if let Some(line) = result.effectiveness.message() {
        outcome.messages.push(line.to_string());
    }
    if result.guard_broken {
        outcome.messages.push(format!("{}'s guard is broken!", defender_name));
    } else if result.guarded {
        outcome.messages.push(format!("{} blocks part of the blow.", defender_name));
    }

    if result.intercepted_by.is_none()
        && let SkillEffect::Damage {
            rider: Some(rider), ..
        } = &skill.effect
        && ctx.store.should_apply_status(rider.chance)
    {
        let application = apply_status(ctx, defender, rider.status, rider.stacks, outcome);
        result.status = Some(application);
    }

    outcome.add_damage(dealt);
    dealt
}

/// Apply a status through the store, recording it on the outcome when it lands.
pub fn apply_status(
    ctx: &mut BattleContext<'_>,
    target: Side,
    kind: StatusKind,
    stacks: u32,
    outcome: &mut ActionOutcome,
) -> crate::env::StatusApplication {
    let application = ctx.store.apply_status(target, kind, stacks);
    if !application.message.is_empty() {
        outcome.messages.push(application.message.clone());
    }
    if application.applied {
        outcome.statuses.push(AppliedStatus {
            target,
            kind,
            stacks,
        });
    }
    application
}

/// Resolve a non-damaging skill effect for `user`.
///
/// # Errors
///
/// Summon skills fail with `unknown_summon` / `max_summons` without changing
/// any state; callers refund whatever resource they already spent.
pub(crate) fn resolve_support(
    ctx: &mut BattleContext<'_>,
    user: Side,
    skill: &SkillDef,
    outcome: &mut ActionOutcome,
) -> Result<(), ActionFailure> {
    let user_name = ctx.store.combatant(user).name.clone();
    match &skill.effect {
        SkillEffect::Damage { .. } => {}
        SkillEffect::Heal { amount } => {
            let amount = amount.roll_amount(&mut *ctx.rng);
            let healed = ctx.store.heal(user, amount, &skill.id);
            outcome
                .messages
                .push(format!("{} uses {} and recovers {} HP.", user_name, skill.name, healed));
            outcome.add_healed(healed);
        }
        SkillEffect::Buff { status, stacks } => {
            outcome.messages.push(format!("{} uses {}!", user_name, skill.name));
            apply_status(ctx, user, *status, *stacks, outcome);
        }
        SkillEffect::Status {
            status,
            stacks,
            chance,
        } => {
            outcome.messages.push(format!("{} uses {}!", user_name, skill.name));
            if ctx.store.should_apply_status(*chance) {
                apply_status(ctx, user.opponent(), *status, *stacks, outcome);
            } else {
                outcome.messages.push("But it failed!".to_string());
            }
        }
        SkillEffect::Summon { summon } => {
            let summoner_id = ctx.store.combatant(user).id.clone();
            let report = ctx.summons.spawn(
                ctx.tables,
                summon,
                &summoner_id,
                user,
                SummonOverrides::default(),
            )?;
            outcome
                .messages
                .push(format!("{} uses {}! {}", user_name, skill.name, report.message));
            outcome.summoned = Some(report.summon.uid);
        }
    }
    if let Some(sfx) = &skill.sfx {
        ctx.store.play_sfx(sfx);
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory store and fixtures shared by the style tests.

    use super::*;
    use crate::config::SummonConfig;
    use crate::env::{Combatant, StatusApplication};
    use crate::summon::{SummonDef, SummonFlags};
    use crate::util::dice::DiceExpr;
    use crate::util::element::Element;
    use crate::util::status::StatusEffect;

    #[derive(Default)]
    pub struct TestStore {
        pub player: Combatant,
        pub enemy: Combatant,
        pub stagger: [u32; 2],
        pub limit_ready: bool,
        pub sfx: Vec<String>,
    }

    impl TestStore {
        pub fn new() -> Self {
            let mut player = Combatant::new("hero", "Hero", 100);
            player.moves = vec!["ember".into(), "mend".into(), "call_wolf".into()];
            player.elements = vec![Element::Fire];
            player.attack_bonus = 4;
            let mut enemy = Combatant::new("slime", "Slime", 100);
            enemy.elements = vec![Element::Grass];
            enemy.moves = vec!["tackle".into()];
            Self {
                player,
                enemy,
                ..Self::default()
            }
        }

        fn side(&mut self, side: Side) -> &mut Combatant {
            match side {
                Side::Player => &mut self.player,
                Side::Enemy => &mut self.enemy,
            }
        }
    }

    impl BattleStore for TestStore {
        fn player(&self) -> &Combatant {
            &self.player
        }
        fn enemy(&self) -> &Combatant {
            &self.enemy
        }
        fn damage_player(&mut self, amount: u32, _meta: &DamageMeta) -> u32 {
            let dealt = amount.min(self.player.hp);
            self.player.hp -= dealt;
            dealt
        }
        fn damage_enemy(&mut self, amount: u32, _meta: &DamageMeta) -> u32 {
            let dealt = amount.min(self.enemy.hp);
            self.enemy.hp -= dealt;
            dealt
        }
        fn heal_player(&mut self, amount: u32, _source: &str) -> u32 {
            let healed = amount.min(self.player.max_hp - self.player.hp);
            self.player.hp += healed;
            healed
        }
        fn heal_enemy(&mut self, amount: u32, _source: &str) -> u32 {
            let healed = amount.min(self.enemy.max_hp - self.enemy.hp);
            self.enemy.hp += healed;
            healed
        }
        fn apply_status(&mut self, target: Side, kind: StatusKind, stacks: u32) -> StatusApplication {
            let combatant = self.side(target);
            combatant.statuses.push(StatusEffect::new(kind, stacks, 3));
            StatusApplication {
                applied: true,
                message: format!("{} is affected by {}.", combatant.name, kind),
            }
        }
        fn should_apply_status(&mut self, chance: f32) -> bool {
            chance >= 0.5
        }
        fn add_stagger(&mut self, target: Side, amount: u32) -> StatusApplication {
            self.stagger[target as usize] += amount;
            StatusApplication {
                applied: false,
                message: String::new(),
            }
        }
        fn can_act(&self, target: Side) -> bool {
            !crate::util::status::has_action_denial(&self.combatant(target).statuses)
        }
        fn cannot_act_message(&self, _target: Side, name: &str) -> String {
            format!("{name} cannot move!")
        }
        fn terrain(&self) -> Option<&str> {
            None
        }
        fn terrain_multiplier(&self, _element: Element) -> f32 {
            1.0
        }
        fn terrain_accuracy_penalty(&self) -> i32 {
            0
        }
        fn is_limit_ready(&self) -> bool {
            self.limit_ready
        }
        fn use_limit_charge(&mut self) {
            self.limit_ready = false;
        }
        fn play_sfx(&mut self, id: &str) {
            self.sfx.push(id.to_string());
        }
    }

    pub fn tables() -> ContentTables {
        ContentTables::new()
            .with_skill(SkillDef {
                id: "ember".into(),
                name: "Ember".into(),
                element: Element::Fire,
                accuracy: None,
                pp: Some(1),
                ap_cost: 3,
                heavy: false,
                timed: true,
                sfx: None,
                effect: SkillEffect::Damage {
                    power: 40,
                    dice: DiceExpr::dice(2, 6, 0),
                    hits: 1,
                    rider: None,
                },
            })
            .with_skill(SkillDef {
                id: "mend".into(),
                name: "Mend".into(),
                element: Element::Light,
                accuracy: None,
                pp: Some(5),
                ap_cost: 2,
                heavy: false,
                timed: false,
                sfx: None,
                effect: SkillEffect::Heal {
                    amount: DiceExpr::flat(10),
                },
            })
            .with_skill(SkillDef {
                id: "tackle".into(),
                name: "Tackle".into(),
                element: Element::Normal,
                accuracy: None,
                pp: None,
                ap_cost: 2,
                heavy: true,
                timed: false,
                sfx: None,
                effect: SkillEffect::Damage {
                    power: 40,
                    dice: DiceExpr::dice(1, 8, 0),
                    hits: 1,
                    rider: None,
                },
            })
            .with_skill(SkillDef {
                id: "call_wolf".into(),
                name: "Call Wolf".into(),
                element: Element::Normal,
                accuracy: None,
                pp: Some(2),
                ap_cost: 3,
                heavy: false,
                timed: false,
                sfx: None,
                effect: SkillEffect::Summon {
                    summon: "wolf".into(),
                },
            })
            .with_summon(SummonDef {
                id: "wolf".into(),
                name: "Wolf".into(),
                max_hp: 15,
                ac: 11,
                damage: DiceExpr::dice(1, 4, 1),
                damage_type: Element::Normal,
                attack_bonus: 2,
                duration: 3,
                flags: SummonFlags::CAN_ATTACK,
                heal_amount: DiceExpr::flat(0),
                protect_chance: 0.0,
                moves: Vec::new(),
            })
    }

    pub fn summons() -> SummonManager {
        SummonManager::new(SummonConfig::default())
    }
}
