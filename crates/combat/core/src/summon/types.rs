//! Summon definitions and live summon entities.

use bitflags::bitflags;

use crate::config::SummonConfig;
use crate::env::Side;
use crate::error::{ActionFailure, CombatError, ErrorSeverity};
use crate::util::dice::DiceExpr;
use crate::util::element::Element;

bitflags! {
    /// What a summon may do on its turn.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    #[cfg_attr(feature = "serde", serde(transparent))]
    pub struct SummonFlags: u8 {
        const CAN_ATTACK = 0b0000_0001;
        const CAN_HEAL = 0b0000_0010;
        /// May intercept attacks aimed at its summoner.
        const CAN_PROTECT = 0b0000_0100;
    }
}

impl Default for SummonFlags {
    fn default() -> Self {
        Self::CAN_ATTACK
    }
}

/// Instance id of a live summon, unique within one manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummonUid(pub u32);

impl core::fmt::Display for SummonUid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "summon#{}", self.0)
    }
}

/// One attack a summon can pick.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummonMove {
    pub name: String,
    pub damage: DiceExpr,
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage_type: Element,
}

/// Static summon definition from the content tables.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummonDef {
    pub id: String,
    pub name: String,
    pub max_hp: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub ac: i32,
    pub damage: DiceExpr,
    #[cfg_attr(feature = "serde", serde(default))]
    pub damage_type: Element,
    #[cfg_attr(feature = "serde", serde(default))]
    pub attack_bonus: i32,
    /// Owning-side turns the summon stays before expiring.
    pub duration: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub flags: SummonFlags,
    #[cfg_attr(feature = "serde", serde(default))]
    pub heal_amount: DiceExpr,
    /// Chance to intercept a hit when its summoner is low.
    #[cfg_attr(feature = "serde", serde(default))]
    pub protect_chance: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub moves: Vec<SummonMove>,
}

/// Caller-supplied adjustments applied on top of a definition at spawn time.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SummonOverrides {
    pub name: Option<String>,
    pub max_hp: Option<u32>,
    pub duration: Option<u32>,
    pub attack_bonus: Option<i32>,
    pub damage: Option<DiceExpr>,
}

/// A live summon.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Summon {
    pub uid: SummonUid,
    pub type_id: String,
    pub name: String,
    pub side: Side,
    pub summoner_id: String,

    pub hp: u32,
    pub max_hp: u32,
    pub ac: i32,
    pub damage: DiceExpr,
    pub damage_type: Element,
    pub attack_bonus: i32,

    pub turns_remaining: u32,
    pub max_duration: u32,

    pub flags: SummonFlags,
    pub heal_amount: DiceExpr,
    pub protect_chance: f32,
    pub moves: Vec<SummonMove>,
}

impl Summon {
    /// Materialize a summon from its definition merged with overrides.
    pub fn from_def(
        uid: SummonUid,
        def: &SummonDef,
        summoner_id: &str,
        side: Side,
        overrides: SummonOverrides,
    ) -> Self {
        let max_hp = overrides.max_hp.unwrap_or(def.max_hp).max(1);
        let duration = overrides.duration.unwrap_or(def.duration).max(1);
        Self {
            uid,
            type_id: def.id.clone(),
            name: overrides.name.unwrap_or_else(|| def.name.clone()),
            side,
            summoner_id: summoner_id.to_string(),
            hp: max_hp,
            max_hp,
            ac: def.ac,
            damage: overrides.damage.unwrap_or(def.damage),
            damage_type: def.damage_type,
            attack_bonus: overrides.attack_bonus.unwrap_or(def.attack_bonus),
            turns_remaining: duration,
            max_duration: duration,
            flags: def.flags,
            heal_amount: def.heal_amount,
            protect_chance: def.protect_chance,
            moves: def.moves.clone(),
        }
    }

    pub fn can_attack(&self) -> bool {
        self.flags.contains(SummonFlags::CAN_ATTACK)
    }

    pub fn can_heal(&self) -> bool {
        self.flags.contains(SummonFlags::CAN_HEAL)
    }

    pub fn can_protect(&self) -> bool {
        self.flags.contains(SummonFlags::CAN_PROTECT)
    }

    pub fn hp_ratio(&self) -> f32 {
        if self.max_hp == 0 {
            return 0.0;
        }
        self.hp as f32 / self.max_hp as f32
    }

    pub fn is_low_hp(&self, config: &SummonConfig) -> bool {
        self.hp_ratio() <= config.low_hp_ratio
    }

    pub fn is_expiring(&self, config: &SummonConfig) -> bool {
        self.turns_remaining <= config.expiry_warning_turns
    }

    pub fn view(&self, config: &SummonConfig) -> SummonView {
        SummonView {
            uid: self.uid,
            name: self.name.clone(),
            side: self.side,
            hp: self.hp,
            max_hp: self.max_hp,
            hp_ratio: self.hp_ratio(),
            is_low_hp: self.is_low_hp(config),
            turns_remaining: self.turns_remaining,
            max_duration: self.max_duration,
            is_expiring_warning: self.is_expiring(config),
        }
    }
}

/// Display data for one summon.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SummonView {
    pub uid: SummonUid,
    pub name: String,
    pub side: Side,
    pub hp: u32,
    pub max_hp: u32,
    pub hp_ratio: f32,
    pub is_low_hp: bool,
    pub turns_remaining: u32,
    pub max_duration: u32,
    pub is_expiring_warning: bool,
}

/// Why a summon left the field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum DismissReason {
    Killed,
    Expired,
    Dismissed,
    /// Cleared at battle end.
    BattleEnd,
}

/// Record of a summon leaving the field.
#[derive(Clone, Debug, PartialEq)]
pub struct Dismissal {
    pub summon: Summon,
    pub reason: DismissReason,
    pub message: String,
}

/// Successful spawn.
#[derive(Clone, Debug, PartialEq)]
pub struct SpawnReport {
    pub summon: Summon,
    pub message: String,
}

/// Result of damaging a summon.
#[derive(Clone, Debug, PartialEq)]
pub struct SummonDamage {
    /// Damage actually removed (clamped to remaining HP).
    pub dealt: u32,
    pub hp: u32,
    pub is_low_hp: bool,
    /// Present when this hit killed the summon.
    pub killed: Option<Dismissal>,
}

/// One action a summon takes during its side's turn.
///
/// The manager never applies these; the caller resolves them through the
/// battle store.
#[derive(Clone, Debug, PartialEq)]
pub enum SummonAction {
    Attack {
        uid: SummonUid,
        summoner_id: String,
        name: String,
        move_name: String,
        damage: DiceExpr,
        damage_type: Element,
        attack_bonus: i32,
        target: String,
    },
    Heal {
        uid: SummonUid,
        summoner_id: String,
        name: String,
        amount: u32,
    },
    Guard {
        uid: SummonUid,
        name: String,
    },
}

/// Everything that happened during one side's summon turn.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SummonTurn {
    pub actions: Vec<SummonAction>,
    pub messages: Vec<String>,
    pub expired: Vec<Dismissal>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SummonError {
    #[error("unknown summon '{0}'")]
    UnknownSummon(String),

    #[error("{summoner} already has {cap} active summon(s)")]
    MaxSummons { summoner: String, cap: usize },
}

impl CombatError for SummonError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::UnknownSummon(_) => ErrorSeverity::Validation,
            Self::MaxSummons { .. } => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSummon(_) => "unknown_summon",
            Self::MaxSummons { .. } => "max_summons",
        }
    }
}

impl From<SummonError> for ActionFailure {
    fn from(err: SummonError) -> Self {
        match err {
            SummonError::UnknownSummon(id) => ActionFailure::UnknownSummon(id),
            SummonError::MaxSummons { .. } => ActionFailure::MaxSummons,
        }
    }
}
