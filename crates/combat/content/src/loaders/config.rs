//! Combat configuration loader.

use std::path::Path;

use combat_core::CombatConfig;

use crate::loaders::{LoadResult, read_file};

/// Loader for combat configuration from TOML files.
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load config data from a TOML file.
    ///
    /// Every section and field is optional; omitted values keep their defaults.
    pub fn load(path: &Path) -> LoadResult<CombatConfig> {
        let content = read_file(path)?;
        Self::parse(&content)
            .map_err(|e| anyhow::anyhow!("{} ({})", e, path.display()))
    }

    /// Parse config data from a TOML string.
    pub fn parse(content: &str) -> LoadResult<CombatConfig> {
        let config: CombatConfig = toml::from_str(content)
            .map_err(|e| anyhow::anyhow!("Failed to parse config TOML: {}", e))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_core::{QteRuleset, StyleKind};

    #[test]
    fn empty_document_is_default() {
        let config = ConfigLoader::parse("").unwrap();
        assert_eq!(config, CombatConfig::default());
    }

    #[test]
    fn sections_override_only_named_fields() {
        let config = ConfigLoader::parse(
            r#"
            [battle]
            style = "ap_combo"

            [qte]
            ruleset = "legacy"
            timeout_ms = 2000

            [ap_combo]
            ap_max = 8
            limit_break_dice = "2d6+1"
            "#,
        )
        .unwrap();

        assert_eq!(config.battle.style, StyleKind::ApCombo);
        assert_eq!(config.qte.ruleset, QteRuleset::Legacy);
        assert_eq!(config.qte.timeout_ms, 2000);
        assert_eq!(config.qte.start_delay_ms, 500);
        assert_eq!(config.ap_combo.ap_max, 8);
        assert_eq!(config.ap_combo.ap_regen, 2);
        assert_eq!(
            config.ap_combo.limit_break_dice,
            combat_core::DiceExpr::dice(2, 6, 1)
        );
    }

    #[test]
    fn malformed_dice_is_rejected() {
        let err = ConfigLoader::parse("[ap_combo]\nlimit_break_dice = \"2x6\"\n").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config TOML"));
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::load(&dir.path().join("missing.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }
}
