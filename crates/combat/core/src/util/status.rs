//! Status effects and aggregation of their combat modifiers.
//!
//! The battle store owns status lists; this module only reads them to derive
//! the multipliers the battle styles apply while resolving an action.

/// Kind of status effect a combatant can carry.
#[derive(
    Clone,
    Copy,
    Debug,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum StatusKind {
    // damage over time
    Poison,
    Burn,
    Bleed,
    // action denial
    Stun,
    Sleep,
    Freeze,
    Paralyze,
    // debuffs
    Weaken,
    Vulnerable,
    Blind,
    Confuse,
    // buffs
    Strength,
    Shield,
    Haste,
    Regen,
    Focus,
}

impl StatusKind {
    /// Status effects that stop the bearer from acting.
    pub const fn prevents_action(&self) -> bool {
        matches!(self, Self::Stun | Self::Sleep | Self::Freeze)
    }

    pub const fn is_buff(&self) -> bool {
        matches!(
            self,
            Self::Strength | Self::Shield | Self::Haste | Self::Regen | Self::Focus
        )
    }
}

/// One status entry as the battle store reports it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusEffect {
    pub kind: StatusKind,
    pub stacks: u32,
    pub turns_remaining: u32,
}

impl StatusEffect {
    pub const fn new(kind: StatusKind, stacks: u32, turns_remaining: u32) -> Self {
        Self {
            kind,
            stacks,
            turns_remaining,
        }
    }
}

/// Aggregated effect of every status on a combatant.
///
/// Multipliers start at `1.0`; flat bonuses start at `0`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatusModifiers {
    /// Multiplies outgoing damage.
    pub attack_multiplier: f32,
    /// Multiplies the defense stat used in damage formulas.
    pub defense_multiplier: f32,
    /// Multiplies incoming damage after all other steps.
    pub damage_taken_multiplier: f32,
    /// Added to attack rolls.
    pub accuracy_bonus: i32,
    /// Added to armor class.
    pub ac_bonus: i32,
    /// Added to critical-hit chance.
    pub crit_bonus: f32,
}

impl Default for StatusModifiers {
    fn default() -> Self {
        Self {
            attack_multiplier: 1.0,
            defense_multiplier: 1.0,
            damage_taken_multiplier: 1.0,
            accuracy_bonus: 0,
            ac_bonus: 0,
            crit_bonus: 0.0,
        }
    }
}

impl StatusModifiers {
    // Per-stack tuning
    const WEAKEN_PER_STACK: f32 = 0.10;
    const STRENGTH_PER_STACK: f32 = 0.10;
    const VULNERABLE_PER_STACK: f32 = 0.25;
    const SHIELD_REDUCTION: f32 = 0.5;
    const SHIELD_AC_PER_STACK: i32 = 2;
    const BLIND_ACCURACY_PER_STACK: i32 = 3;
    const FOCUS_CRIT_PER_STACK: f32 = 0.05;
    const FLOOR: f32 = 0.1;

    /// Fold every status into one modifier set.
    pub fn aggregate(statuses: &[StatusEffect]) -> Self {
        let mut mods = Self::default();
        for status in statuses.iter().filter(|s| s.stacks > 0) {
            let stacks = status.stacks;
            match status.kind {
                StatusKind::Weaken => {
                    mods.attack_multiplier -= Self::WEAKEN_PER_STACK * stacks as f32;
                }
                StatusKind::Strength => {
                    mods.attack_multiplier += Self::STRENGTH_PER_STACK * stacks as f32;
                }
                StatusKind::Vulnerable => {
                    mods.damage_taken_multiplier += Self::VULNERABLE_PER_STACK * stacks as f32;
                    mods.defense_multiplier -= Self::WEAKEN_PER_STACK * stacks as f32;
                }
                StatusKind::Shield => {
                    mods.damage_taken_multiplier *= Self::SHIELD_REDUCTION;
                    mods.ac_bonus += Self::SHIELD_AC_PER_STACK * stacks as i32;
                }
                StatusKind::Blind => {
                    mods.accuracy_bonus -= Self::BLIND_ACCURACY_PER_STACK * stacks as i32;
                }
                StatusKind::Confuse => {
                    mods.accuracy_bonus -= 2;
                }
                StatusKind::Focus => {
                    mods.crit_bonus += Self::FOCUS_CRIT_PER_STACK * stacks as f32;
                    mods.accuracy_bonus += 1;
                }
                StatusKind::Freeze | StatusKind::Paralyze => {
                    mods.ac_bonus -= 2;
                }
                _ => {}
            }
        }
        mods.attack_multiplier = mods.attack_multiplier.max(Self::FLOOR);
        mods.defense_multiplier = mods.defense_multiplier.max(Self::FLOOR);
        mods.damage_taken_multiplier = mods.damage_taken_multiplier.max(0.0);
        mods
    }
}

/// Whether any status in the list prevents acting.
pub fn has_action_denial(statuses: &[StatusEffect]) -> bool {
    statuses
        .iter()
        .any(|s| s.stacks > 0 && s.kind.prevents_action())
}
