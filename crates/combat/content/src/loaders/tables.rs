//! Catalog loaders for skills, summons, intents, terrain and combatants.

use std::path::Path;

use combat_core::{Combatant, ContentTables, IntentDef, SkillDef, SummonDef, TerrainDef};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::loaders::{LoadResult, read_file};

/// Skill catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCatalog {
    pub skills: Vec<SkillDef>,
}

/// Summon catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummonCatalog {
    pub summons: Vec<SummonDef>,
}

/// Intent catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntentCatalog {
    pub intents: Vec<IntentDef>,
}

/// Terrain catalog structure for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerrainCatalog {
    pub terrains: Vec<TerrainDef>,
}

/// Combatant profiles (players and enemies) for RON files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatantCatalog {
    pub combatants: Vec<Combatant>,
}

/// Loader that fills [`ContentTables`] from RON catalogs.
pub struct TablesLoader;

impl TablesLoader {
    pub fn load_skills(path: &Path) -> LoadResult<Vec<SkillDef>> {
        load_catalog::<SkillCatalog>(path, "skill").map(|c| c.skills)
    }

    pub fn load_summons(path: &Path) -> LoadResult<Vec<SummonDef>> {
        load_catalog::<SummonCatalog>(path, "summon").map(|c| c.summons)
    }

    pub fn load_intents(path: &Path) -> LoadResult<Vec<IntentDef>> {
        load_catalog::<IntentCatalog>(path, "intent").map(|c| c.intents)
    }

    pub fn load_terrains(path: &Path) -> LoadResult<Vec<TerrainDef>> {
        load_catalog::<TerrainCatalog>(path, "terrain").map(|c| c.terrains)
    }

    pub fn load_combatants(path: &Path) -> LoadResult<Vec<Combatant>> {
        load_catalog::<CombatantCatalog>(path, "combatant").map(|c| c.combatants)
    }

    /// Parse a catalog from a RON string.
    pub fn parse<T: DeserializeOwned>(content: &str, what: &str) -> LoadResult<T> {
        ron::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse {} catalog RON: {}", what, e))
    }

    /// Assemble tables from parsed catalogs and check every cross-reference.
    ///
    /// Duplicate ids and dangling references (a move that names no skill, an
    /// intent that names no summon, ...) are load errors.
    pub fn assemble(
        skills: Vec<SkillDef>,
        summons: Vec<SummonDef>,
        intents: Vec<IntentDef>,
        terrains: Vec<TerrainDef>,
        combatants: Vec<Combatant>,
    ) -> LoadResult<ContentTables> {
        let mut tables = ContentTables::new();
        for skill in skills {
            tables
                .insert_skill(skill)
                .map_err(|e| anyhow::anyhow!("Invalid skill catalog: {}", e))?;
        }
        for summon in summons {
            tables
                .insert_summon(summon)
                .map_err(|e| anyhow::anyhow!("Invalid summon catalog: {}", e))?;
        }
        for intent in intents {
            tables
                .insert_intent(intent)
                .map_err(|e| anyhow::anyhow!("Invalid intent catalog: {}", e))?;
        }
        for terrain in terrains {
            tables
                .insert_terrain(terrain)
                .map_err(|e| anyhow::anyhow!("Invalid terrain catalog: {}", e))?;
        }
        for combatant in combatants {
            tables
                .insert_combatant(combatant)
                .map_err(|e| anyhow::anyhow!("Invalid combatant catalog: {}", e))?;
        }

        tables
            .validate()
            .map_err(|e| anyhow::anyhow!("Content validation failed: {}", e))?;

        tracing::debug!(skills = tables.skill_count(), "content tables assembled");
        Ok(tables)
    }
}

fn load_catalog<T: DeserializeOwned>(path: &Path, what: &str) -> LoadResult<T> {
    let content = read_file(path)?;
    TablesLoader::parse(&content, what).map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
}
