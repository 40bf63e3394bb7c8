//! Simulator configuration from the process environment.

use std::env;
use std::path::PathBuf;

use combat_core::StyleKind;

/// Settings for one simulated battle.
#[derive(Clone, Debug, PartialEq)]
pub struct SimConfig {
    /// Content directory; the bundled sample data when unset.
    pub data_dir: Option<PathBuf>,
    /// Random seed; a fresh seed per run when unset.
    pub seed: Option<u64>,
    /// Overrides the style from `config.toml`.
    pub style: Option<StyleKind>,
    pub player: String,
    pub enemy: String,
    pub terrain: Option<String>,
    /// Auto-confirm once the marker is this close to center. Negative never confirms.
    pub qte_tolerance: f32,
    /// Clock step used to drive timing challenges.
    pub tick_ms: u32,
    /// The battle is aborted after this many rounds.
    pub turn_cap: u32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            seed: None,
            style: None,
            player: "hero".to_string(),
            enemy: "warlock".to_string(),
            terrain: None,
            qte_tolerance: 4.0,
            tick_ms: 16,
            turn_cap: 50,
        }
    }
}

impl SimConfig {
    /// Construct configuration from process environment variables.
    ///
    /// Environment variables:
    /// - `SIM_DATA_DIR` - Content directory (default: bundled data)
    /// - `SIM_SEED` - Random seed (default: random)
    /// - `SIM_STYLE` - `type_pp` or `ap_combo` (default: from config.toml)
    /// - `SIM_PLAYER` - Player combatant id (default: hero)
    /// - `SIM_ENEMY` - Enemy combatant id (default: warlock)
    /// - `SIM_TERRAIN` - Terrain id (default: none)
    /// - `SIM_QTE_TOLERANCE` - Auto-confirm distance from center (default: 4.0)
    /// - `SIM_TICK_MS` - Timing challenge clock step (default: 16)
    /// - `SIM_TURN_CAP` - Rounds before the battle is aborted (default: 50)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(dir) = read_env::<PathBuf>("SIM_DATA_DIR") {
            config.data_dir = Some(dir);
        }
        if let Some(seed) = read_env::<u64>("SIM_SEED") {
            config.seed = Some(seed);
        }
        if let Some(style) = read_env::<StyleKind>("SIM_STYLE") {
            config.style = Some(style);
        }
        if let Some(player) = read_env::<String>("SIM_PLAYER") {
            config.player = player;
        }
        if let Some(enemy) = read_env::<String>("SIM_ENEMY") {
            config.enemy = enemy;
        }
        if let Some(terrain) = read_env::<String>("SIM_TERRAIN") {
            config.terrain = Some(terrain);
        }
        if let Some(tolerance) = read_env::<f32>("SIM_QTE_TOLERANCE") {
            config.qte_tolerance = tolerance;
        }
        if let Some(tick) = read_env::<u32>("SIM_TICK_MS") {
            config.tick_ms = tick.max(1);
        }
        if let Some(cap) = read_env::<u32>("SIM_TURN_CAP") {
            config.turn_cap = cap.max(1);
        }

        config
    }
}

fn read_env<T>(key: &str) -> Option<T>
where
    T: std::str::FromStr,
{
    env::var(key).ok()?.parse().ok()
}
