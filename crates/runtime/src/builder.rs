//! Builder for [`BattleSession`].

use combat_core::{CombatConfig, Combatant, ContentTables, StyleKind, TablesError};

use crate::error::{Result, SessionError};
use crate::session::BattleSession;
use crate::store::{MemoryStore, StoreConfig};

/// Mixed into the session seed so store rolls and rules rolls diverge.
const STORE_SEED_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Rules and store tuning for one session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionConfig {
    pub combat: CombatConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone)]
enum Participant {
    Id(String),
    Custom(Combatant),
}

/// Builder for [`BattleSession`] with flexible configuration.
#[derive(Debug, Default)]
pub struct BattleSessionBuilder {
    config: SessionConfig,
    tables: Option<ContentTables>,
    player: Option<Participant>,
    enemy: Option<Participant>,
    terrain: Option<String>,
    seed: Option<u64>,
}

impl BattleSession {
    pub fn builder() -> BattleSessionBuilder {
        BattleSessionBuilder::default()
    }
}

impl BattleSessionBuilder {
    pub fn config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn combat_config(mut self, config: CombatConfig) -> Self {
        self.config.combat = config;
        self
    }

    pub fn store_config(mut self, config: StoreConfig) -> Self {
        self.config.store = config;
        self
    }

    /// Override the configured battle style.
    pub fn style(mut self, style: StyleKind) -> Self {
        self.config.combat.battle.style = style;
        self
    }

    /// Set the required content tables.
    pub fn tables(mut self, tables: ContentTables) -> Self {
        self.tables = Some(tables);
        self
    }

    /// Player profile by id in the content tables.
    pub fn player(mut self, id: impl Into<String>) -> Self {
        self.player = Some(Participant::Id(id.into()));
        self
    }

    /// Enemy profile by id in the content tables.
    pub fn enemy(mut self, id: impl Into<String>) -> Self {
        self.enemy = Some(Participant::Id(id.into()));
        self
    }

    /// Player built outside the tables. Its moves must still exist there.
    pub fn player_combatant(mut self, combatant: Combatant) -> Self {
        self.player = Some(Participant::Custom(combatant));
        self
    }

    pub fn enemy_combatant(mut self, combatant: Combatant) -> Self {
        self.enemy = Some(Participant::Custom(combatant));
        self
    }

    pub fn terrain(mut self, id: impl Into<String>) -> Self {
        self.terrain = Some(id.into());
        self
    }

    /// Seed for every random draw. A random seed is used when unset.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Build the session.
    ///
    /// # Errors
    ///
    /// Fails when the tables, player or enemy are missing, when an id does
    /// not resolve, or when a custom combatant names an unknown skill.
    pub fn build(self) -> Result<BattleSession> {
        let tables = self.tables.ok_or(SessionError::Missing("content tables"))?;
        let player = resolve(&tables, self.player.ok_or(SessionError::Missing("player"))?)?;
        let enemy = resolve(&tables, self.enemy.ok_or(SessionError::Missing("enemy"))?)?;

        let terrain = match self.terrain {
            Some(id) => Some(
                tables
                    .terrain(&id)
                    .cloned()
                    .ok_or(SessionError::UnknownTerrain(id))?,
            ),
            None => None,
        };

        let seed = self.seed.unwrap_or_else(rand::random);
        let store = MemoryStore::new(player, enemy, seed ^ STORE_SEED_SALT)
            .with_config(self.config.store)
            .with_terrain(terrain);

        Ok(BattleSession::new(self.config.combat, tables, store, seed))
    }
}

fn resolve(tables: &ContentTables, participant: Participant) -> Result<Combatant> {
    let mut combatant = match participant {
        Participant::Id(id) => tables
            .combatant(&id)
            .cloned()
            .ok_or(SessionError::UnknownCombatant(id))?,
        Participant::Custom(combatant) => {
            if let Some(missing) = combatant.moves.iter().find(|m| tables.skill(m).is_none()) {
                return Err(TablesError::UnknownSkill {
                    owner: combatant.id.clone(),
                    skill: missing.clone(),
                }
                .into());
            }
            combatant
        }
    };
    combatant.hp = combatant.hp.min(combatant.max_hp);
    Ok(combatant)
}
