//! Content loaders for reading combat data from files.
//!
//! Catalogs are RON, configuration is TOML. Each loader offers a `load`
//! (from a path) and a `parse` (from a string) entry point so tests can feed
//! inline data.

pub mod config;
pub mod factory;
pub mod tables;

pub use config::ConfigLoader;
pub use factory::ContentFactory;
pub use tables::{
    CombatantCatalog, IntentCatalog, SkillCatalog, SummonCatalog, TablesLoader, TerrainCatalog,
};

use std::path::Path;

/// Common result type for loaders.
pub type LoadResult<T> = anyhow::Result<T>;

/// Helper function to read file contents.
pub(crate) fn read_file(path: &Path) -> LoadResult<String> {
    std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Failed to read file {}: {}", path.display(), e))
}
