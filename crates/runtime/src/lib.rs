//! Runtime orchestration for turn-based battles.
//!
//! This crate wires the combat rules from `combat-core` to concrete state and
//! content: an in-memory [`MemoryStore`], a seeded random source, and the
//! [`BattleSession`] round loop that sequences player actions, timing
//! challenges, summons and enemy intents.
//!
//! Modules are organized by responsibility:
//! - [`session`] hosts the orchestrator and its turn reports
//! - [`builder`] assembles a session from content tables
//! - [`store`] owns combatant state behind the `BattleStore` trait
//! - [`events`] records every transition for hosts to replay
//! - [`provider`] sources player decisions (input, scripts, auto-play)
pub mod builder;
pub mod error;
pub mod events;
pub mod provider;
pub mod session;
pub mod store;

pub use builder::{BattleSessionBuilder, SessionConfig};
pub use error::{Result, SessionError};
pub use events::{BattleEvent, BattleResult, EventLog};
pub use provider::{ActionProvider, AutoPlayer, play_turn};
pub use session::{BattlePhase, BattleSession, BattleView, TurnReport};
pub use store::{MemoryStore, StoreConfig};
