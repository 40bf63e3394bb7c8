//! Combat configuration constants and tunable parameters.
//!
//! Every subsystem reads its tuning from one [`CombatConfig`] chosen at
//! battle start. All sections implement `Default`, and with the `serde`
//! feature every field may be omitted from a config file.

use crate::qte::{Difficulty, MarkerMotion, QteRuleset};
use crate::style::StyleKind;
use crate::util::dice::DiceExpr;

/// Top-level configuration for one battle.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CombatConfig {
    pub battle: BattleConfig,
    pub qte: QteConfig,
    pub summon: SummonConfig,
    pub intent: IntentConfig,
    pub type_pp: TypePpConfig,
    pub ap_combo: ApComboConfig,
}

impl CombatConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_style(mut self, style: StyleKind) -> Self {
        self.battle.style = style;
        self
    }

    #[must_use]
    pub fn with_ruleset(mut self, ruleset: QteRuleset) -> Self {
        self.qte.ruleset = ruleset;
        self
    }
}

/// Battle-flow switches.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct BattleConfig {
    pub style: StyleKind,
    /// Ask the player for timing input on actions that support it.
    pub player_qte: bool,
    /// Wrap enemy attacks in a defend/dodge challenge.
    pub enemy_qte: bool,
    pub qte_difficulty: Difficulty,
}

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            style: StyleKind::TypePp,
            player_qte: true,
            enemy_qte: true,
            qte_difficulty: Difficulty::Normal,
        }
    }
}

/// Per-difficulty scaling of zone width and marker speed.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DifficultyScale {
    /// Multiplies every zone threshold.
    pub zone: f32,
    /// Multiplies marker speed.
    pub speed: f32,
}

/// Zone thresholds for the legacy ruleset, expressed relative to the success band.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct LegacyZones {
    /// Distance from center covered by the success band.
    pub success_width: f32,
    /// Perfect band as a fraction of the success band.
    pub perfect_ratio: f32,
    /// Partial band as a multiple of the success band.
    pub partial_ratio: f32,
}

impl Default for LegacyZones {
    fn default() -> Self {
        Self {
            success_width: 20.0,
            perfect_ratio: 0.25,
            partial_ratio: 2.0,
        }
    }
}

/// Absolute distance ladder for the finalized ruleset.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ZoneLadder {
    pub perfect: f32,
    pub good: f32,
    pub normal: f32,
}

impl Default for ZoneLadder {
    fn default() -> Self {
        Self {
            perfect: 5.0,
            good: 15.0,
            normal: 30.0,
        }
    }
}

/// Chain-combo tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ChainConfig {
    /// Added to the speed multiplier for each subsequent hit.
    pub speed_step: f32,
    /// Pause between two sub-challenges.
    pub hit_gap_ms: u32,
    /// Landed ratio needed for a good aggregate (a perfect aggregate needs every hit).
    pub good_ratio: f32,
    /// Landed ratio needed for a normal aggregate.
    pub normal_ratio: f32,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            speed_step: 0.15,
            hit_gap_ms: 250,
            good_ratio: 0.75,
            normal_ratio: 0.4,
        }
    }
}

/// QTE engine tuning.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct QteConfig {
    pub ruleset: QteRuleset,
    pub motion: MarkerMotion,
    /// Delay between start and the marker starting to move.
    pub start_delay_ms: u32,
    /// Time the result stays on screen before the callback fires.
    pub result_delay_ms: u32,
    /// Running time after which the challenge resolves as the worst tier.
    pub timeout_ms: u32,
    /// Time for one full 0 → 100 → 0 sweep at speed 1.
    pub base_period_ms: u32,
    /// Relative phase-speed swing of the oscillating-speed motion.
    pub oscillation_amplitude: f32,
    /// Frequency of the phase-speed swing.
    pub oscillation_hz: f32,
    pub easy: DifficultyScale,
    pub normal: DifficultyScale,
    pub hard: DifficultyScale,
    pub legacy: LegacyZones,
    pub ladder: ZoneLadder,
    /// Zone scale applied while a parry challenge runs.
    pub parry_shrink: f32,
    /// Zone scale applied while a guard-break challenge runs.
    pub guard_break_shrink: f32,
    pub chain: ChainConfig,
}

impl Default for QteConfig {
    fn default() -> Self {
        Self {
            ruleset: QteRuleset::Finalized,
            motion: MarkerMotion::Sinusoidal,
            start_delay_ms: 500,
            result_delay_ms: 800,
            timeout_ms: 3000,
            base_period_ms: 1600,
            oscillation_amplitude: 0.5,
            oscillation_hz: 1.5,
            easy: DifficultyScale {
                zone: 1.4,
                speed: 0.75,
            },
            normal: DifficultyScale {
                zone: 1.0,
                speed: 1.0,
            },
            hard: DifficultyScale {
                zone: 0.7,
                speed: 1.35,
            },
            legacy: LegacyZones::default(),
            ladder: ZoneLadder::default(),
            parry_shrink: 0.6,
            guard_break_shrink: 0.75,
            chain: ChainConfig::default(),
        }
    }
}

impl QteConfig {
    pub fn scale(&self, difficulty: Difficulty) -> DifficultyScale {
        match difficulty {
            Difficulty::Easy => self.easy,
            Difficulty::Normal => self.normal,
            Difficulty::Hard => self.hard,
        }
    }
}

/// Summon subsystem tuning.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SummonConfig {
    pub max_per_summoner: usize,
    /// HP fraction at or below which a summon is flagged low.
    pub low_hp_ratio: f32,
    /// Remaining turns at or below which a summon is flagged as expiring.
    pub expiry_warning_turns: u32,
    /// Master HP fraction at or below which protecting summons may intercept.
    pub intercept_hp_threshold: f32,
}

impl Default for SummonConfig {
    fn default() -> Self {
        Self {
            max_per_summoner: 1,
            low_hp_ratio: 0.3,
            expiry_warning_turns: 1,
            intercept_hp_threshold: 0.5,
        }
    }
}

/// Intent subsystem tuning.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IntentConfig {
    /// Number of history records kept for cooldown checks.
    pub history_capacity: usize,
    /// Reactive AI heals below this HP fraction when it has a heal move.
    pub reactive_heal_threshold: f32,
    /// Reactive AI may defend below this HP fraction.
    pub reactive_defend_threshold: f32,
    pub reactive_defend_chance: f32,
    /// Chance to use a move instead of a basic attack.
    pub reactive_move_chance: f32,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self {
            history_capacity: 16,
            reactive_heal_threshold: 0.3,
            reactive_defend_threshold: 0.5,
            reactive_defend_chance: 0.25,
            reactive_move_chance: 0.6,
        }
    }
}

/// Type-effectiveness / PP style tuning.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TypePpConfig {
    pub basic_attack_power: u32,
    /// Lower bound of the random damage factor (upper bound is 1.0).
    pub random_floor: f32,
    pub same_type_bonus: f32,
    pub crit_base_chance: f32,
    pub crit_chance_cap: f32,
    pub crit_multiplier: f32,
    pub limit_break_power: u32,
    /// Fraction of basic-attack damage dealt by a perfect-defend counter.
    pub counter_ratio: f32,
}

impl Default for TypePpConfig {
    fn default() -> Self {
        Self {
            basic_attack_power: 40,
            random_floor: 0.85,
            same_type_bonus: 1.5,
            crit_base_chance: 1.0 / 16.0,
            crit_chance_cap: 0.5,
            crit_multiplier: 1.5,
            limit_break_power: 150,
            counter_ratio: 0.5,
        }
    }
}

/// Action-point / combo / guard style tuning.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ApComboConfig {
    pub ap_max: u32,
    pub ap_start: u32,
    pub ap_regen: u32,
    pub attack_cost: u32,
    pub defend_cost: u32,
    /// Extra AP granted by defending. Added first, then clamped to `ap_max`.
    pub defend_bonus: u32,
    pub flee_cost: u32,
    pub combo_max: u32,
    pub combo_bonus_per_level: f32,
    /// Rounds without a landed hit before the combo resets.
    pub combo_decay_turns: u32,
    pub momentum_max: u32,
    pub momentum_per_hit: u32,
    pub momentum_decay: u32,
    /// Incoming damage multiplier while guarding.
    pub guard_reduction: f32,
    /// Guard-hit count at which a heavy attack breaks guard.
    pub guard_break_threshold: u32,
    pub guard_break_stagger: u32,
    pub hit_stagger: u32,
    pub limit_break_hits: u32,
    pub limit_break_dice: DiceExpr,
    pub flee_base: f32,
    pub flee_momentum_weight: f32,
    /// Natural d20 roll that scores a critical (weak-point) hit.
    pub crit_face: u32,
    pub crit_multiplier: f32,
}

impl Default for ApComboConfig {
    fn default() -> Self {
        Self {
            ap_max: 6,
            ap_start: 3,
            ap_regen: 2,
            attack_cost: 2,
            defend_cost: 1,
            defend_bonus: 1,
            flee_cost: 2,
            combo_max: 5,
            combo_bonus_per_level: 0.1,
            combo_decay_turns: 2,
            momentum_max: 100,
            momentum_per_hit: 20,
            momentum_decay: 10,
            guard_reduction: 0.5,
            guard_break_threshold: 2,
            guard_break_stagger: 25,
            hit_stagger: 5,
            limit_break_hits: 5,
            limit_break_dice: DiceExpr::dice(1, 8, 2),
            flee_base: 0.3,
            flee_momentum_weight: 0.5,
            crit_face: 20,
            crit_multiplier: 2.0,
        }
    }
}
