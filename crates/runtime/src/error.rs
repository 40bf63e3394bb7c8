//! Errors surfaced by the battle session API.
//!
//! Gameplay refusals (no AP, no PP, unknown skill, ...) are not errors here:
//! they come back as failed [`ActionOutcome`](combat_core::ActionOutcome)s
//! inside a turn report. `SessionError` covers misuse of the session itself.
use combat_core::{CombatError, ErrorSeverity, QteError, TablesError};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("the battle is already over")]
    BattleOver,

    #[error("a timing challenge is in progress")]
    QteBusy,

    #[error("failed to start timing challenge")]
    Qte(#[from] QteError),

    #[error("no combatant named '{0}' in the content tables")]
    UnknownCombatant(String),

    #[error("no terrain named '{0}' in the content tables")]
    UnknownTerrain(String),

    #[error("missing {0}: set it on the builder")]
    Missing(&'static str),

    #[error(transparent)]
    Tables(#[from] TablesError),
}

impl CombatError for SessionError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::BattleOver | Self::QteBusy => ErrorSeverity::Recoverable,
            Self::Qte(e) => e.severity(),
            Self::UnknownCombatant(_) | Self::UnknownTerrain(_) | Self::Missing(_) => {
                ErrorSeverity::Validation
            }
            Self::Tables(e) => e.severity(),
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::BattleOver => "battle_over",
            Self::QteBusy => "qte_active",
            Self::Qte(e) => e.error_code(),
            Self::UnknownCombatant(_) => "unknown_combatant",
            Self::UnknownTerrain(_) => "unknown_terrain",
            Self::Missing(_) => "missing_component",
            Self::Tables(e) => e.error_code(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wraps_qte_errors_with_their_code() {
        let err = SessionError::from(QteError::AlreadyActive);
        assert_eq!(err.error_code(), QteError::AlreadyActive.error_code());
        assert_eq!(SessionError::QteBusy.severity(), ErrorSeverity::Recoverable);
        assert_eq!(
            SessionError::Missing("player").to_string(),
            "missing player: set it on the builder"
        );
    }
}
