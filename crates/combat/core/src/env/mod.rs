//! Host-provided collaborators.
//!
//! The rules in this crate never own battle state. Everything they need from
//! the outside world is injected through the traits and tables in this module:
//!
//! - [`BattleStore`]: shared combat state (HP, statuses, stagger, terrain)
//! - [`RandomSource`]: every random draw
//! - [`ContentTables`]: read-only skill/summon/intent/terrain definitions
mod rng;
mod store;
mod tables;

pub use rng::{PcgRng, RandomSource, SequenceRng};
pub use store::{BattleStore, Combatant, DamageMeta, DamageSource, Side, StatusApplication};
pub use tables::{
    BASIC_ATTACK_ID, ContentTables, SkillDef, SkillEffect, StatusRider, TablesError, TerrainDef,
};
