//! Content factory for building battle tables from a data directory.

use std::path::{Path, PathBuf};

use combat_core::{CombatConfig, ContentTables};

use crate::loaders::{ConfigLoader, LoadResult, TablesLoader};

/// Content factory that loads all combat content from a data directory.
///
/// # Directory Structure
///
/// ```text
/// data_dir/
/// ├── config.toml      (optional)
/// ├── skills.ron
/// ├── summons.ron
/// ├── intents.ron
/// ├── terrain.ron
/// └── combatants.ron
/// ```
pub struct ContentFactory {
    data_dir: PathBuf,
}

impl ContentFactory {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Factory over the sample data shipped with this crate.
    pub fn bundled() -> Self {
        Self::new(Path::new(env!("CARGO_MANIFEST_DIR")).join("data"))
    }

    /// Load combat configuration from `config.toml`, or defaults when the file is absent.
    pub fn load_config(&self) -> LoadResult<CombatConfig> {
        let path = self.data_dir.join("config.toml");
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(CombatConfig::default());
        }
        ConfigLoader::load(&path)
    }

    /// Load and validate every catalog.
    pub fn load_tables(&self) -> LoadResult<ContentTables> {
        let skills = TablesLoader::load_skills(&self.data_dir.join("skills.ron"))?;
        let summons = TablesLoader::load_summons(&self.data_dir.join("summons.ron"))?;
        let intents = TablesLoader::load_intents(&self.data_dir.join("intents.ron"))?;
        let terrains = TablesLoader::load_terrains(&self.data_dir.join("terrain.ron"))?;
        let combatants = TablesLoader::load_combatants(&self.data_dir.join("combatants.ron"))?;
        TablesLoader::assemble(skills, summons, intents, terrains, combatants)
    }

    /// Returns the data directory path.
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{IntentPayload, SummonFlags};

    #[test]
    fn bundled_content_is_consistent() {
        let factory = ContentFactory::bundled();
        let tables = factory.load_tables().unwrap();

        let hero = tables.combatant("hero").unwrap();
        assert!(tables.moves_of(hero).count() >= 3);

        let warlock = tables.combatant("warlock").unwrap();
        let intents = tables.intents_of(warlock);
        assert!(
            intents
                .iter()
                .any(|i| matches!(i.payload, IntentPayload::Summon { .. }))
        );

        let guardian = tables.summon("stone_guardian").unwrap();
        assert!(guardian.flags.contains(SummonFlags::CAN_PROTECT));
        assert!(tables.terrain("volcano").is_some());
    }

    #[test]
    fn bundled_config_parses() {
        let config = ContentFactory::bundled().load_config().unwrap();
        assert_eq!(config.summon.max_per_summoner, 1);
    }

    #[test]
    fn missing_config_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = ContentFactory::new(dir.path()).load_config().unwrap();
        assert_eq!(config, CombatConfig::default());
    }

    #[test]
    fn missing_catalog_names_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ContentFactory::new(dir.path()).load_tables().unwrap_err();
        assert!(err.to_string().contains("skills.ron"));
    }
}
