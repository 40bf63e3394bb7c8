//! Read-only content tables: skills, summons, intents, terrain and combatant templates.
//!
//! Tables are built once per battle (usually by `combat-content` loaders) and
//! validated with [`ContentTables::validate`] so rules code never has to probe
//! for missing fields at combat time.

use std::collections::HashMap;

use crate::env::store::Combatant;
use crate::error::{CombatError, ErrorSeverity};
use crate::intent::{IntentDef, IntentPayload};
use crate::summon::SummonDef;
use crate::util::dice::DiceExpr;
use crate::util::element::Element;
use crate::util::status::StatusKind;

/// Id of the implicit basic attack every combatant knows.
pub const BASIC_ATTACK_ID: &str = "basic_attack";

/// Status effect that rides along with a damaging skill.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StatusRider {
    pub status: StatusKind,
    #[cfg_attr(feature = "serde", serde(default = "one"))]
    pub stacks: u32,
    /// Probability in `[0, 1]`.
    pub chance: f32,
}

#[cfg(feature = "serde")]
fn one() -> u32 {
    1
}

/// What a skill does when used.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SkillEffect {
    /// Deals damage. `power` feeds power-based formulas, `dice` feeds dice-based ones.
    Damage {
        power: u32,
        dice: DiceExpr,
        #[cfg_attr(feature = "serde", serde(default = "one"))]
        hits: u32,
        #[cfg_attr(feature = "serde", serde(default))]
        rider: Option<StatusRider>,
    },
    /// Restores HP to the user.
    Heal { amount: DiceExpr },
    /// Applies a status to the user.
    Buff { status: StatusKind, stacks: u32 },
    /// Applies a status to the opponent.
    Status {
        status: StatusKind,
        stacks: u32,
        chance: f32,
    },
    /// Calls a summon onto the user's side.
    Summon { summon: String },
}

impl SkillEffect {
    pub const fn is_damaging(&self) -> bool {
        matches!(self, Self::Damage { .. })
    }
}

/// Skill (move) definition.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SkillDef {
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub element: Element,
    /// Hit chance in percent. `None` never misses.
    #[cfg_attr(feature = "serde", serde(default))]
    pub accuracy: Option<u32>,
    /// Power points available per battle in PP-based styles. `None` is unlimited.
    #[cfg_attr(feature = "serde", serde(default))]
    pub pp: Option<u32>,
    /// Action point cost in AP-based styles.
    #[cfg_attr(feature = "serde", serde(default))]
    pub ap_cost: u32,
    /// Heavy attacks can break guard.
    #[cfg_attr(feature = "serde", serde(default))]
    pub heavy: bool,
    /// Requests a timing challenge before resolving.
    #[cfg_attr(feature = "serde", serde(default))]
    pub timed: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub sfx: Option<String>,
    pub effect: SkillEffect,
}

impl SkillDef {
    /// The implicit basic attack.
    pub fn basic_attack(power: u32, dice: DiceExpr, ap_cost: u32) -> Self {
        Self {
            id: BASIC_ATTACK_ID.to_string(),
            name: "Attack".to_string(),
            element: Element::Normal,
            accuracy: None,
            pp: None,
            ap_cost,
            heavy: false,
            timed: false,
            sfx: Some("hit".to_string()),
            effect: SkillEffect::Damage {
                power,
                dice,
                hits: 1,
                rider: None,
            },
        }
    }
}

/// Terrain definition: element multipliers and an accuracy penalty.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TerrainDef {
    pub id: String,
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub multipliers: Vec<(Element, f32)>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub accuracy_penalty: i32,
}

impl TerrainDef {
    pub fn multiplier(&self, element: Element) -> f32 {
        self.multipliers
            .iter()
            .find(|(e, _)| *e == element)
            .map(|(_, m)| *m)
            .unwrap_or(1.0)
    }
}

/// Cross-reference problems found by [`ContentTables::validate`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum TablesError {
    #[error("{owner} references unknown skill '{skill}'")]
    UnknownSkill { owner: String, skill: String },

    #[error("{owner} references unknown summon '{summon}'")]
    UnknownSummon { owner: String, summon: String },

    #[error("{owner} references unknown intent '{intent}'")]
    UnknownIntent { owner: String, intent: String },

    #[error("duplicate id '{0}'")]
    Duplicate(String),
}

impl CombatError for TablesError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownSkill { .. } => "TABLES_UNKNOWN_SKILL",
            Self::UnknownSummon { .. } => "TABLES_UNKNOWN_SUMMON",
            Self::UnknownIntent { .. } => "TABLES_UNKNOWN_INTENT",
            Self::Duplicate(_) => "TABLES_DUPLICATE",
        }
    }
}

/// All static content a battle reads.
#[derive(Clone, Debug, Default)]
pub struct ContentTables {
    skills: HashMap<String, SkillDef>,
    summons: HashMap<String, SummonDef>,
    intents: HashMap<String, IntentDef>,
    terrains: HashMap<String, TerrainDef>,
    combatants: HashMap<String, Combatant>,
}

impl ContentTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_skill(&mut self, skill: SkillDef) -> Result<(), TablesError> {
        insert_unique(&mut self.skills, skill.id.clone(), skill)
    }

    pub fn insert_summon(&mut self, summon: SummonDef) -> Result<(), TablesError> {
        insert_unique(&mut self.summons, summon.id.clone(), summon)
    }

    pub fn insert_intent(&mut self, intent: IntentDef) -> Result<(), TablesError> {
        insert_unique(&mut self.intents, intent.id.clone(), intent)
    }

    pub fn insert_terrain(&mut self, terrain: TerrainDef) -> Result<(), TablesError> {
        insert_unique(&mut self.terrains, terrain.id.clone(), terrain)
    }

    pub fn insert_combatant(&mut self, combatant: Combatant) -> Result<(), TablesError> {
        insert_unique(&mut self.combatants, combatant.id.clone(), combatant)
    }

    /// Builder-style skill insertion that overwrites duplicates. Handy in tests.
    #[must_use]
    pub fn with_skill(mut self, skill: SkillDef) -> Self {
        self.skills.insert(skill.id.clone(), skill);
        self
    }

    #[must_use]
    pub fn with_summon(mut self, summon: SummonDef) -> Self {
        self.summons.insert(summon.id.clone(), summon);
        self
    }

    #[must_use]
    pub fn with_intent(mut self, intent: IntentDef) -> Self {
        self.intents.insert(intent.id.clone(), intent);
        self
    }

    pub fn skill(&self, id: &str) -> Option<&SkillDef> {
        self.skills.get(id)
    }

    pub fn summon(&self, id: &str) -> Option<&SummonDef> {
        self.summons.get(id)
    }

    pub fn intent(&self, id: &str) -> Option<&IntentDef> {
        self.intents.get(id)
    }

    pub fn terrain(&self, id: &str) -> Option<&TerrainDef> {
        self.terrains.get(id)
    }

    pub fn combatant(&self, id: &str) -> Option<&Combatant> {
        self.combatants.get(id)
    }

    pub fn skill_count(&self) -> usize {
        self.skills.len()
    }

    /// Resolve the skills a combatant knows, skipping ids without definitions.
    pub fn moves_of<'a>(&'a self, combatant: &'a Combatant) -> impl Iterator<Item = &'a SkillDef> {
        combatant.moves.iter().filter_map(|id| self.skills.get(id))
    }

    /// Resolve the intent definitions a combatant may telegraph, in declaration order.
    pub fn intents_of(&self, combatant: &Combatant) -> Vec<&IntentDef> {
        combatant
            .intents
            .iter()
            .filter_map(|id| self.intents.get(id))
            .collect()
    }

    /// Check every cross-reference between tables.
    pub fn validate(&self) -> Result<(), TablesError> {
        for combatant in self.combatants.values() {
            for skill in &combatant.moves {
                if !self.skills.contains_key(skill) {
                    return Err(TablesError::UnknownSkill {
                        owner: combatant.id.clone(),
                        skill: skill.clone(),
                    });
                }
            }
            for intent in &combatant.intents {
                if !self.intents.contains_key(intent) {
                    return Err(TablesError::UnknownIntent {
                        owner: combatant.id.clone(),
                        intent: intent.clone(),
                    });
                }
            }
        }

        for skill in self.skills.values() {
            if let SkillEffect::Summon { summon } = &skill.effect
                && !self.summons.contains_key(summon)
            {
                return Err(TablesError::UnknownSummon {
                    owner: skill.id.clone(),
                    summon: summon.clone(),
                });
            }
        }

        for intent in self.intents.values() {
            match &intent.payload {
                IntentPayload::Skill { skill, .. } | IntentPayload::MultiHit { skill, .. } => {
                    if !self.skills.contains_key(skill) {
                        return Err(TablesError::UnknownSkill {
                            owner: intent.id.clone(),
                            skill: skill.clone(),
                        });
                    }
                }
                IntentPayload::Summon { summon, .. } => {
                    if !self.summons.contains_key(summon) {
                        return Err(TablesError::UnknownSummon {
                            owner: intent.id.clone(),
                            summon: summon.clone(),
                        });
                    }
                }
            }
        }

        Ok(())
    }
}

fn insert_unique<T>(map: &mut HashMap<String, T>, id: String, value: T) -> Result<(), TablesError> {
    if map.contains_key(&id) {
        return Err(TablesError::Duplicate(id));
    }
    map.insert(id, value);
    Ok(())
}
