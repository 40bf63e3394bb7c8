//! Result types returned by every battle style action.

use crate::env::{Side, StatusApplication};
use crate::error::{ActionFailure, CombatError};
use crate::qte::{DefenseAdjust, OffenseAdjust, QteModifiers};
use crate::summon::SummonUid;
use crate::util::element::Effectiveness;
use crate::util::status::StatusKind;

/// Modifiers feeding one attack resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AttackOptions {
    /// From the attacker's timing challenge.
    pub offense: OffenseAdjust,
    /// From the defender's timing challenge.
    pub defense: DefenseAdjust,
    /// Extra scaling, e.g. an empowered intent.
    pub power_multiplier: f32,
}

impl Default for AttackOptions {
    fn default() -> Self {
        Self {
            offense: OffenseAdjust::default(),
            defense: DefenseAdjust::default(),
            power_multiplier: 1.0,
        }
    }
}

impl AttackOptions {
    /// Options for a player attack graded by an offensive challenge.
    pub fn offensive(qte: Option<&QteModifiers>) -> Self {
        Self {
            offense: qte.map(QteModifiers::offense).unwrap_or_default(),
            ..Self::default()
        }
    }

    /// Options for an enemy attack the player answered with a defensive challenge.
    pub fn defensive(qte: Option<&QteModifiers>) -> Self {
        Self {
            defense: qte.map(QteModifiers::defense).unwrap_or_default(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_power_multiplier(mut self, multiplier: f32) -> Self {
        self.power_multiplier = multiplier;
        self
    }
}

/// Everything the caller needs to render one attack.
#[derive(Clone, Debug, PartialEq)]
pub struct AttackResult {
    pub hit: bool,
    /// Damage rolled before the store's own clamping.
    pub damage: u32,
    pub critical: bool,
    pub effectiveness: Effectiveness,
    /// Same-type bonus applied.
    pub stab: bool,
    /// Dodged or parried by the defender's timing.
    pub evaded: bool,
    pub guarded: bool,
    pub guard_broken: bool,
    /// Combo level after this attack.
    pub combo: u32,
    /// Natural d20 face, for dice-based styles.
    pub roll: Option<u32>,
    pub stagger: u32,
    pub intercepted_by: Option<SummonUid>,
    pub status: Option<StatusApplication>,
}

impl AttackResult {
    pub fn miss() -> Self {
        Self {
            hit: false,
            damage: 0,
            critical: false,
            effectiveness: Effectiveness::Normal,
            stab: false,
            evaded: false,
            guarded: false,
            guard_broken: false,
            combo: 0,
            roll: None,
            stagger: 0,
            intercepted_by: None,
            status: None,
        }
    }

    pub fn evaded() -> Self {
        Self {
            evaded: true,
            ..Self::miss()
        }
    }
}

/// A status that landed during an action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AppliedStatus {
    pub target: Side,
    pub kind: StatusKind,
    pub stacks: u32,
}

/// Result of one style action.
///
/// Failed actions carry a `reason` and leave every piece of state as it was.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActionOutcome {
    pub success: bool,
    pub reason: Option<ActionFailure>,
    pub messages: Vec<String>,
    /// Last attack resolved by the action.
    pub attack: Option<AttackResult>,
    pub healed: Option<u32>,
    pub total_damage: Option<u32>,
    pub fled: bool,
    pub statuses: Vec<AppliedStatus>,
    pub summoned: Option<SummonUid>,
}

impl ActionOutcome {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failure(reason: ActionFailure) -> Self {
        Self {
            success: false,
            messages: vec![reason.to_string()],
            reason: Some(reason),
            ..Self::default()
        }
    }

    /// Stable snake_case code of the failure, if any.
    pub fn reason_code(&self) -> Option<&'static str> {
        self.reason.as_ref().map(CombatError::error_code)
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.messages.push(message.into());
        self
    }

    pub fn add_damage(&mut self, amount: u32) {
        *self.total_damage.get_or_insert(0) += amount;
    }

    pub fn add_healed(&mut self, amount: u32) {
        *self.healed.get_or_insert(0) += amount;
    }

    /// Fold another outcome's effects into this one.
    pub fn absorb(&mut self, other: ActionOutcome) {
        self.messages.extend(other.messages);
        if let Some(damage) = other.total_damage {
            self.add_damage(damage);
        }
        if let Some(healed) = other.healed {
            self.add_healed(healed);
        }
        if other.attack.is_some() {
            self.attack = other.attack;
        }
        self.statuses.extend(other.statuses);
        self.fled |= other.fled;
        self.summoned = self.summoned.or(other.summoned);
    }
}

impl From<Result<ActionOutcome, ActionFailure>> for ActionOutcome {
    fn from(result: Result<ActionOutcome, ActionFailure>) -> Self {
        result.unwrap_or_else(ActionOutcome::failure)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_carries_code_and_message() {
        let outcome = ActionOutcome::failure(ActionFailure::NoAp { have: 1, need: 2 });
        assert!(!outcome.success);
        assert_eq!(outcome.reason_code(), Some("no_ap"));
        assert_eq!(outcome.messages, vec!["Not enough AP (1/2)".to_string()]);
    }

    #[test]
    fn absorb_accumulates_totals() {
        let mut outcome = ActionOutcome::ok();
        outcome.add_damage(5);
        let mut other = ActionOutcome::ok();
        other.add_damage(7);
        other.add_healed(3);
        outcome.absorb(other);
        assert_eq!(outcome.total_damage, Some(12));
        assert_eq!(outcome.healed, Some(3));
    }
}
