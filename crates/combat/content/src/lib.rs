//! Data-driven combat content and loaders.
//!
//! This crate turns RON/TOML data files into the read-only tables and
//! configuration a battle needs:
//! - Skill catalogs (RON)
//! - Summon catalogs (RON)
//! - Intent (telegraph) catalogs (RON)
//! - Terrain definitions (RON)
//! - Combatant profiles: stats, movesets and intent lists (RON)
//! - Combat configuration (TOML)
//!
//! Every catalog is deserialized straight into `combat-core` types and the
//! assembled [`ContentTables`](combat_core::ContentTables) are validated once,
//! at load time, so rules code never probes for missing references.

#[cfg(feature = "loaders")]
pub mod loaders;

#[cfg(feature = "loaders")]
pub use loaders::{ConfigLoader, ContentFactory, LoadResult, TablesLoader};
