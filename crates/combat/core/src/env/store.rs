//! Battle state store interface.
//!
//! The store owns every piece of shared combat state: HP, mana, AC, status
//! lists, stagger, terrain and limit-break charge. Rules code reads combatant
//! snapshots and mutates state exclusively through [`BattleStore`] calls.

use crate::util::dice::DiceExpr;
use crate::util::element::Element;
use crate::util::status::{StatusEffect, StatusKind};

/// Which side of the battle an entity fights on.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Side {
    Player,
    Enemy,
}

impl Side {
    pub const fn opponent(&self) -> Self {
        match self {
            Self::Player => Self::Enemy,
            Self::Enemy => Self::Player,
        }
    }
}

/// Snapshot of one combatant as the store exposes it.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct Combatant {
    pub id: String,
    pub name: String,
    pub hp: u32,
    pub max_hp: u32,
    pub mana: u32,
    pub max_mana: u32,
    /// Armor class for d20 hit checks.
    pub ac: i32,
    /// Added to d20 attack rolls.
    pub attack_bonus: i32,
    /// Attack stat for power-based damage formulas.
    pub attack: u32,
    /// Defense stat for power-based damage formulas.
    pub defense: u32,
    pub speed: u32,
    /// Scales the base critical-hit chance (1.0 = unmodified).
    pub crit_ratio: f32,
    pub elements: Vec<Element>,
    pub statuses: Vec<StatusEffect>,
    /// Skill ids this combatant can use.
    pub moves: Vec<String>,
    /// Dice rolled by a basic attack in dice-based styles.
    pub basic_damage: DiceExpr,
    /// Intent ids this combatant may telegraph (enemies only).
    pub intents: Vec<String>,
}

impl Default for Combatant {
    fn default() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            hp: 1,
            max_hp: 1,
            mana: 0,
            max_mana: 0,
            ac: 10,
            attack_bonus: 0,
            attack: 10,
            defense: 10,
            speed: 10,
            crit_ratio: 1.0,
            elements: Vec::new(),
            statuses: Vec::new(),
            moves: Vec::new(),
            basic_damage: DiceExpr::dice(1, 6, 0),
            intents: Vec::new(),
        }
    }
}

impl Combatant {
    pub fn new(id: impl Into<String>, name: impl Into<String>, max_hp: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            hp: max_hp,
            max_hp,
            ..Self::default()
        }
    }

    /// Current HP as a fraction of max HP in `[0, 1]`.
    pub fn hp_fraction(&self) -> f32 {
        if self.max_hp == 0 {
            return 0.0;
        }
        self.hp as f32 / self.max_hp as f32
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }

    pub fn has_status(&self, kind: StatusKind) -> bool {
        self.statuses.iter().any(|s| s.kind == kind && s.stacks > 0)
    }

    pub fn primary_element(&self) -> Element {
        self.elements.first().copied().unwrap_or_default()
    }
}

/// What caused a damage event, for logs and UI.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DamageSource {
    Attack,
    Skill(String),
    LimitBreak,
    Counter,
    Summon(String),
    Intent(String),
}

/// Metadata attached to every damage call.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DamageMeta {
    pub source: DamageSource,
    pub element: Element,
    pub critical: bool,
}

impl DamageMeta {
    pub fn new(source: DamageSource, element: Element) -> Self {
        Self {
            source,
            element,
            critical: false,
        }
    }

    #[must_use]
    pub fn with_critical(mut self, critical: bool) -> Self {
        self.critical = critical;
        self
    }
}

/// Result of a status application request.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusApplication {
    pub applied: bool,
    pub message: String,
}

/// Host-provided battle state store.
///
/// Implementations own all shared combat state. Damage and heal calls return
/// the amount actually applied after the store's own clamping.
pub trait BattleStore {
    fn player(&self) -> &Combatant;
    fn enemy(&self) -> &Combatant;

    fn damage_player(&mut self, amount: u32, meta: &DamageMeta) -> u32;
    fn damage_enemy(&mut self, amount: u32, meta: &DamageMeta) -> u32;
    fn heal_player(&mut self, amount: u32, source: &str) -> u32;
    fn heal_enemy(&mut self, amount: u32, source: &str) -> u32;

    fn apply_status(&mut self, target: Side, kind: StatusKind, stacks: u32) -> StatusApplication;
    /// Roll whether a status with the given chance lands.
    fn should_apply_status(&mut self, chance: f32) -> bool;
    /// Build up stagger on `target`.
    ///
    /// When the meter overflows the store stuns the target and reports it
    /// like any other status application; otherwise `applied` is false.
    fn add_stagger(&mut self, target: Side, amount: u32) -> StatusApplication;

    fn can_act(&self, target: Side) -> bool;
    fn cannot_act_message(&self, target: Side, name: &str) -> String;

    fn terrain(&self) -> Option<&str>;
    fn terrain_multiplier(&self, element: Element) -> f32;
    fn terrain_accuracy_penalty(&self) -> i32;

    fn is_limit_ready(&self) -> bool;
    fn use_limit_charge(&mut self);

    fn play_sfx(&mut self, id: &str);

    // ===== side-dispatching conveniences =====

    fn combatant(&self, side: Side) -> &Combatant {
        match side {
            Side::Player => self.player(),
            Side::Enemy => self.enemy(),
        }
    }

    fn damage(&mut self, side: Side, amount: u32, meta: &DamageMeta) -> u32 {
        match side {
            Side::Player => self.damage_player(amount, meta),
            Side::Enemy => self.damage_enemy(amount, meta),
        }
    }

    fn heal(&mut self, side: Side, amount: u32, source: &str) -> u32 {
        match side {
            Side::Player => self.heal_player(amount, source),
            Side::Enemy => self.heal_enemy(amount, source),
        }
    }
}
