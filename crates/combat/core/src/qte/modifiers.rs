//! Modifier tables: what each tier does to the pending action.
//!
//! Offensive kinds (accuracy, skill, guard break, chain combo) improve the
//! player's attack; defensive kinds (dodge, defend, parry) soften an incoming
//! one. Battle styles consume [`QteModifiers`] without knowing which
//! challenge produced it.

use arrayvec::ArrayVec;

use super::zone::Zone;

/// Longest chain combo the engine will run.
pub const MAX_CHAIN_HITS: usize = 8;

/// Legacy accuracy challenge result.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AccuracyModifiers {
    pub hit_bonus: i32,
    pub damage_multiplier: f32,
    pub auto_crit: bool,
}

/// Legacy dodge challenge result.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DodgeModifiers {
    pub damage_multiplier: f32,
    pub dodged: bool,
}

/// Skill challenge result.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillModifiers {
    pub advantage: bool,
    pub disadvantage: bool,
    /// Fractional damage bonus; negative values reduce damage.
    pub bonus_damage: f32,
    pub crit_bonus: f32,
}

/// Defend challenge result.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DefendModifiers {
    /// Fraction of incoming damage removed.
    pub damage_reduction: f32,
    pub counter_attack: bool,
    /// The defensive stance drops after this hit.
    pub defend_ends: bool,
}

/// Parry challenge result.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParryModifiers {
    pub parried: bool,
    pub riposte: bool,
    pub damage_multiplier: f32,
}

/// Guard-break challenge result.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GuardBreakModifiers {
    pub broken: bool,
    pub stagger_bonus: u32,
    pub damage_multiplier: f32,
}

/// Chain-combo challenge result.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ChainModifiers {
    pub hits: ArrayVec<Zone, MAX_CHAIN_HITS>,
    pub landed: u32,
    pub aggregate: Zone,
}

impl ChainModifiers {
    /// Fraction of hits that landed.
    pub fn landed_ratio(&self) -> f32 {
        if self.hits.is_empty() {
            return 0.0;
        }
        self.landed as f32 / self.hits.len() as f32
    }

    /// Damage multiplier for each individual hit.
    pub fn hit_multipliers(&self) -> impl Iterator<Item = f32> + '_ {
        self.hits.iter().map(|zone| match zone {
            Zone::Perfect => 1.25,
            Zone::Good => 1.0,
            Zone::Normal => 0.75,
            Zone::Bad => 0.0,
        })
    }
}

/// Modifiers delivered with a completed challenge.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum QteModifiers {
    Accuracy(AccuracyModifiers),
    Dodge(DodgeModifiers),
    Skill(SkillModifiers),
    Defend(DefendModifiers),
    Parry(ParryModifiers),
    GuardBreak(GuardBreakModifiers),
    Chain(ChainModifiers),
}

pub fn accuracy_modifiers(zone: Zone) -> AccuracyModifiers {
    match zone {
        Zone::Perfect => AccuracyModifiers {
            hit_bonus: 5,
            damage_multiplier: 1.5,
            auto_crit: true,
        },
        Zone::Good => AccuracyModifiers {
            hit_bonus: 2,
            damage_multiplier: 1.0,
            auto_crit: false,
        },
        Zone::Normal => AccuracyModifiers {
            hit_bonus: 0,
            damage_multiplier: 0.75,
            auto_crit: false,
        },
        Zone::Bad => AccuracyModifiers {
            hit_bonus: -5,
            damage_multiplier: 0.5,
            auto_crit: false,
        },
    }
}

pub fn dodge_modifiers(zone: Zone) -> DodgeModifiers {
    match zone {
        Zone::Perfect => DodgeModifiers {
            damage_multiplier: 0.0,
            dodged: true,
        },
        Zone::Good => DodgeModifiers {
            damage_multiplier: 0.5,
            dodged: false,
        },
        Zone::Normal => DodgeModifiers {
            damage_multiplier: 0.75,
            dodged: false,
        },
        Zone::Bad => DodgeModifiers {
            damage_multiplier: 1.0,
            dodged: false,
        },
    }
}

pub fn skill_modifiers(zone: Zone) -> SkillModifiers {
    match zone {
        Zone::Perfect => SkillModifiers {
            advantage: true,
            disadvantage: false,
            bonus_damage: 0.25,
            crit_bonus: 0.1,
        },
        Zone::Good => SkillModifiers {
            advantage: true,
            disadvantage: false,
            bonus_damage: 0.10,
            crit_bonus: 0.0,
        },
        Zone::Normal => SkillModifiers {
            advantage: false,
            disadvantage: false,
            bonus_damage: 0.0,
            crit_bonus: 0.0,
        },
        Zone::Bad => SkillModifiers {
            advantage: false,
            disadvantage: true,
            bonus_damage: -0.10,
            crit_bonus: 0.0,
        },
    }
}

pub fn defend_modifiers(zone: Zone) -> DefendModifiers {
    match zone {
        Zone::Perfect => DefendModifiers {
            damage_reduction: 0.75,
            counter_attack: true,
            defend_ends: false,
        },
        Zone::Good => DefendModifiers {
            damage_reduction: 0.5,
            counter_attack: false,
            defend_ends: false,
        },
        Zone::Normal => DefendModifiers {
            damage_reduction: 0.25,
            counter_attack: false,
            defend_ends: false,
        },
        Zone::Bad => DefendModifiers {
            damage_reduction: 0.0,
            counter_attack: false,
            defend_ends: true,
        },
    }
}

pub fn parry_modifiers(zone: Zone) -> ParryModifiers {
    match zone {
        Zone::Perfect => ParryModifiers {
            parried: true,
            riposte: true,
            damage_multiplier: 0.0,
        },
        Zone::Good => ParryModifiers {
            parried: true,
            riposte: false,
            damage_multiplier: 0.0,
        },
        Zone::Normal => ParryModifiers {
            parried: false,
            riposte: false,
            damage_multiplier: 0.5,
        },
        Zone::Bad => ParryModifiers {
            parried: false,
            riposte: false,
            damage_multiplier: 1.0,
        },
    }
}

pub fn guard_break_modifiers(zone: Zone) -> GuardBreakModifiers {
    match zone {
        Zone::Perfect => GuardBreakModifiers {
            broken: true,
            stagger_bonus: 30,
            damage_multiplier: 1.5,
        },
        Zone::Good => GuardBreakModifiers {
            broken: true,
            stagger_bonus: 15,
            damage_multiplier: 1.25,
        },
        Zone::Normal => GuardBreakModifiers {
            broken: false,
            stagger_bonus: 0,
            damage_multiplier: 1.0,
        },
        Zone::Bad => GuardBreakModifiers {
            broken: false,
            stagger_bonus: 0,
            damage_multiplier: 0.75,
        },
    }
}

// ============================================================================
// Style-facing projections
// ============================================================================

/// Offensive adjustments a style applies to the player's attack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OffenseAdjust {
    pub advantage: bool,
    pub disadvantage: bool,
    pub hit_bonus: i32,
    pub damage_multiplier: f32,
    pub crit_bonus: f32,
    pub auto_crit: bool,
    pub force_guard_break: bool,
    pub stagger_bonus: u32,
}

impl Default for OffenseAdjust {
    fn default() -> Self {
        Self {
            advantage: false,
            disadvantage: false,
            hit_bonus: 0,
            damage_multiplier: 1.0,
            crit_bonus: 0.0,
            auto_crit: false,
            force_guard_break: false,
            stagger_bonus: 0,
        }
    }
}

/// Defensive adjustments a style applies to an incoming attack.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DefenseAdjust {
    pub damage_multiplier: f32,
    pub evaded: bool,
    pub counter_attack: bool,
    pub defend_ends: bool,
}

impl Default for DefenseAdjust {
    fn default() -> Self {
        Self {
            damage_multiplier: 1.0,
            evaded: false,
            counter_attack: false,
            defend_ends: false,
        }
    }
}

impl QteModifiers {
    /// Offensive reading; defensive kinds yield neutral values.
    pub fn offense(&self) -> OffenseAdjust {
        let mut adjust = OffenseAdjust::default();
        match self {
            Self::Accuracy(m) => {
                adjust.hit_bonus = m.hit_bonus;
                adjust.damage_multiplier = m.damage_multiplier;
                adjust.auto_crit = m.auto_crit;
            }
            Self::Skill(m) => {
                adjust.advantage = m.advantage;
                adjust.disadvantage = m.disadvantage;
                adjust.damage_multiplier = 1.0 + m.bonus_damage;
                adjust.crit_bonus = m.crit_bonus;
            }
            Self::GuardBreak(m) => {
                adjust.damage_multiplier = m.damage_multiplier;
                adjust.force_guard_break = m.broken;
                adjust.stagger_bonus = m.stagger_bonus;
            }
            Self::Chain(m) => {
                let total: f32 = m.hit_multipliers().sum();
                adjust.damage_multiplier = if m.hits.is_empty() {
                    1.0
                } else {
                    total / m.hits.len() as f32
                };
                adjust.auto_crit = m.aggregate == Zone::Perfect;
            }
            Self::Dodge(_) | Self::Defend(_) | Self::Parry(_) => {}
        }
        adjust
    }

    /// Defensive reading; offensive kinds yield neutral values.
    pub fn defense(&self) -> DefenseAdjust {
        let mut adjust = DefenseAdjust::default();
        match self {
            Self::Dodge(m) => {
                adjust.damage_multiplier = m.damage_multiplier;
                adjust.evaded = m.dodged;
            }
            Self::Defend(m) => {
                adjust.damage_multiplier = 1.0 - m.damage_reduction;
                adjust.counter_attack = m.counter_attack;
                adjust.defend_ends = m.defend_ends;
            }
            Self::Parry(m) => {
                adjust.damage_multiplier = m.damage_multiplier;
                adjust.evaded = m.parried;
                adjust.counter_attack = m.riposte;
            }
            Self::Accuracy(_) | Self::Skill(_) | Self::GuardBreak(_) | Self::Chain(_) => {}
        }
        adjust
    }
}
