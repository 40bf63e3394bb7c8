//! Common error infrastructure for combat-core.
//!
//! This module provides shared types and traits used across all error types in combat-core.
//! Subsystem-specific errors (e.g., `QteError`, `SummonError`) are defined in their
//! respective modules alongside the operations they guard.
//!
//! # Failure Taxonomy
//!
//! - **Configuration**: unknown skill/summon ids. Rejected without mutating state.
//! - **Resource exhaustion**: insufficient AP/PP, summon cap. Expected gameplay outcomes.
//! - **Concurrency guard**: starting a QTE while one is active. Logged and refused.
//!
//! Nothing in this crate is fatal; a missing collaborator is a construction-time
//! concern for the host.

/// Severity level of an error, used for categorization and recovery strategies.
///
/// Errors are classified by their recoverability and expected handling:
/// - **Recoverable**: Expected gameplay outcomes; the player can pick another action
/// - **Validation**: Invalid input or content reference, should not retry without changes
/// - **Internal**: Unexpected state inconsistencies that require investigation
/// - **Fatal**: Unrecoverable errors (never produced by this crate)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ErrorSeverity {
    /// Recoverable error - can retry with an alternative action.
    ///
    /// Examples: not enough AP, move out of PP, summon cap reached
    Recoverable,

    /// Validation error - invalid input, should not retry without changes.
    ///
    /// Examples: unknown skill id, malformed dice expression
    Validation,

    /// Internal error - unexpected state inconsistency.
    Internal,

    /// Fatal error - cannot continue.
    Fatal,
}

impl ErrorSeverity {
    /// Returns a human-readable description of this severity level.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Recoverable => "recoverable",
            Self::Validation => "validation",
            Self::Internal => "internal",
            Self::Fatal => "fatal",
        }
    }

    /// Returns true if this error is potentially recoverable.
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Recoverable)
    }

    /// Returns true if this error indicates an internal bug.
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::Internal | Self::Fatal)
    }
}

/// Common trait for all combat-core errors.
///
/// # Implementation Guidelines
///
/// - All error enums should implement this trait
/// - Use `#[derive(thiserror::Error)]` for Display/Error impl
/// - Classify severity based on recoverability, not impact
pub trait CombatError: core::fmt::Display + core::fmt::Debug {
    /// Returns the severity level of this error.
    fn severity(&self) -> ErrorSeverity;

    /// Returns a stable string identifier for this error variant.
    ///
    /// These are the `reason` codes hosts match on.
    fn error_code(&self) -> &'static str {
        core::any::type_name::<Self>()
    }
}

/// Tagged reason an action was refused.
///
/// Every variant leaves battle state untouched; any resource spent
/// speculatively has already been refunded when one of these is returned.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ActionFailure {
    /// Not enough action points for the requested action.
    #[error("Not enough AP ({have}/{need})")]
    NoAp { have: u32, need: u32 },

    /// The move has no power points left.
    #[error("{0} has no PP left")]
    NoPp(String),

    /// Skill id has no definition in the content tables.
    #[error("Unknown skill: {0}")]
    UnknownSkill(String),

    /// Skill exists but the actor does not know it.
    #[error("{0} is not in the moveset")]
    NotInMoveset(String),

    /// Summon type id has no definition in the content tables.
    #[error("Unknown summon: {0}")]
    UnknownSummon(String),

    /// The summoner already has the maximum number of active summons.
    #[error("Too many active summons")]
    MaxSummons,

    /// The actor is prevented from acting (stun, sleep, freeze).
    #[error("{0}")]
    CannotAct(String),

    /// Limit break is not charged yet.
    #[error("Limit break is not ready")]
    LimitNotReady,

    /// A QTE is already running.
    #[error("A timing challenge is already active")]
    QteActive,

    /// The battle has already ended.
    #[error("The battle is over")]
    BattleOver,
}

impl CombatError for ActionFailure {
    fn severity(&self) -> ErrorSeverity {
        use ActionFailure::*;
        match self {
            UnknownSkill(_) | NotInMoveset(_) | UnknownSummon(_) => ErrorSeverity::Validation,
            NoAp { .. } | NoPp(_) | MaxSummons | LimitNotReady => ErrorSeverity::Recoverable,
            CannotAct(_) | QteActive | BattleOver => ErrorSeverity::Recoverable,
        }
    }

    fn error_code(&self) -> &'static str {
        use ActionFailure::*;
        match self {
            NoAp { .. } => "no_ap",
            NoPp(_) => "no_pp",
            UnknownSkill(_) => "unknown_skill",
            NotInMoveset(_) => "not_in_moveset",
            UnknownSummon(_) => "unknown_summon",
            MaxSummons => "max_summons",
            CannotAct(_) => "cannot_act",
            LimitNotReady => "limit_not_ready",
            QteActive => "qte_active",
            BattleOver => "battle_over",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_codes_are_stable() {
        assert_eq!(ActionFailure::NoAp { have: 1, need: 2 }.error_code(), "no_ap");
        assert_eq!(ActionFailure::NoPp("Ember".into()).error_code(), "no_pp");
        assert_eq!(ActionFailure::MaxSummons.error_code(), "max_summons");
    }

    #[test]
    fn configuration_errors_are_validation() {
        assert_eq!(
            ActionFailure::UnknownSkill("nope".into()).severity(),
            ErrorSeverity::Validation
        );
        assert!(ActionFailure::NoAp { have: 0, need: 2 }.severity().is_recoverable());
    }
}
