//! Intent definitions, the live telegraph, and display data.

use crate::util::status::StatusKind;

/// Category of telegraphed ability.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::EnumString, strum::AsRefStr,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum IntentKind {
    Summon,
    BigAttack,
    MultiHit,
}

impl IntentKind {
    pub const fn icon(&self) -> &'static str {
        match self {
            Self::Summon => "✦",
            Self::BigAttack => "⚠",
            Self::MultiHit => "⚔",
        }
    }

    /// Hint shown to the player while the intent is telegraphing.
    pub const fn counter_hint(&self) -> &'static str {
        match self {
            Self::Summon => "Interrupt it with a status effect before the call completes.",
            Self::BigAttack => "Defend or break its focus with a status effect.",
            Self::MultiHit => "Brace for several hits; a well-timed defend softens each one.",
        }
    }
}

/// Which status effects applied to the enemy abort a telegraph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum BreakCondition {
    #[default]
    AnyStatus,
    Statuses(Vec<StatusKind>),
    Never,
}

impl BreakCondition {
    pub fn can_break(&self) -> bool {
        match self {
            Self::AnyStatus => true,
            Self::Statuses(kinds) => !kinds.is_empty(),
            Self::Never => false,
        }
    }

    pub fn matches(&self, status: StatusKind) -> bool {
        match self {
            Self::AnyStatus => true,
            Self::Statuses(kinds) => kinds.contains(&status),
            Self::Never => false,
        }
    }
}

/// What the intent does once it executes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum IntentPayload {
    /// One empowered use of a skill.
    Skill {
        skill: String,
        #[cfg_attr(feature = "serde", serde(default = "unit_multiplier"))]
        multiplier: f32,
    },
    /// Call a summon for the enemy.
    Summon { summon: String },
    /// Several consecutive uses of a skill.
    MultiHit { skill: String, hits: u32 },
}

#[cfg(feature = "serde")]
fn unit_multiplier() -> f32 {
    1.0
}

#[cfg(feature = "serde")]
fn always() -> f32 {
    1.0
}

/// Static definition of a telegraphed ability.
///
/// Gating conditions are evaluated in order by
/// [`IntentSystem::generate`](super::IntentSystem::generate): cooldown,
/// minimum turn, HP threshold, then the `chance` roll.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntentDef {
    pub id: String,
    pub name: String,
    pub kind: IntentKind,
    /// Enemy turns between the telegraph and execution.
    pub prep_turns: u32,
    /// Turns that must pass after the last use before triggering again.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cooldown: u32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub min_turn: u32,
    /// Only triggers at or below this HP fraction.
    #[cfg_attr(feature = "serde", serde(default))]
    pub hp_threshold: Option<f32>,
    #[cfg_attr(feature = "serde", serde(default = "always"))]
    pub chance: f32,
    #[cfg_attr(feature = "serde", serde(default))]
    pub break_condition: BreakCondition,
    pub payload: IntentPayload,
    pub telegraph_text: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub execute_text: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum IntentState {
    Telegraphing,
    Ready,
}

/// The single active telegraph.
#[derive(Clone, Debug, PartialEq)]
pub struct Intent {
    pub def_id: String,
    pub name: String,
    pub kind: IntentKind,
    pub enemy_id: String,
    pub state: IntentState,
    pub turns_remaining: u32,
    pub prep_turns: u32,
    pub started_turn: u32,
    pub break_condition: BreakCondition,
    pub payload: IntentPayload,
    pub telegraph_text: String,
    pub execute_text: Option<String>,
}

impl Intent {
    pub(super) fn from_def(def: &IntentDef, enemy_id: &str, turn: u32) -> Self {
        let prep_turns = def.prep_turns.max(1);
        Self {
            def_id: def.id.clone(),
            name: def.name.clone(),
            kind: def.kind,
            enemy_id: enemy_id.to_string(),
            state: IntentState::Telegraphing,
            turns_remaining: prep_turns,
            prep_turns,
            started_turn: turn,
            break_condition: def.break_condition.clone(),
            payload: def.payload.clone(),
            telegraph_text: def.telegraph_text.clone(),
            execute_text: def.execute_text.clone(),
        }
    }

    pub fn view(&self) -> IntentView {
        IntentView {
            name: self.name.clone(),
            kind: self.kind,
            icon: self.kind.icon(),
            state: self.state,
            turns_remaining: self.turns_remaining,
            prep_turns: self.prep_turns,
            can_break: self.break_condition.can_break(),
            counter_hint: self.kind.counter_hint(),
            telegraph_text: self.telegraph_text.clone(),
        }
    }
}

/// Display data for the telegraph banner.
#[derive(Clone, Debug, PartialEq)]
pub struct IntentView {
    pub name: String,
    pub kind: IntentKind,
    pub icon: &'static str,
    pub state: IntentState,
    pub turns_remaining: u32,
    pub prep_turns: u32,
    pub can_break: bool,
    pub counter_hint: &'static str,
    pub telegraph_text: String,
}

/// One consumed intent, kept for cooldown lookups.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntentRecord {
    pub intent_id: String,
    pub enemy_id: String,
    pub turn: u32,
}

/// Move choice for enemies without telegraph definitions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReactiveAction {
    Heal { skill: String },
    Defend,
    UseMove { skill: String },
    BasicAttack,
}

/// Result of [`IntentSystem::generate`](super::IntentSystem::generate).
#[derive(Clone, Debug, PartialEq)]
pub enum IntentDecision {
    /// An intent is already in flight; nothing changed.
    AlreadyTelegraphing,
    /// A new intent started telegraphing. The enemy still acts normally this turn.
    Triggered(Intent),
    /// Definitions exist but none passed its gates.
    NoTrigger,
    /// No definitions configured; legacy reactive choice.
    Reactive(ReactiveAction),
}

/// An interrupted intent.
#[derive(Clone, Debug, PartialEq)]
pub struct BrokenIntent {
    pub intent: Intent,
    pub message: String,
    /// What the enemy does instead this turn.
    pub fallback: ReactiveAction,
}
