//! Session data types: what a challenge is, and where it stands.

use arrayvec::ArrayVec;

use super::modifiers::{MAX_CHAIN_HITS, QteModifiers};
use super::zone::{Zone, ZoneThresholds};
use crate::error::{CombatError, ErrorSeverity};

/// Kind of timing challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case")]
pub enum QteKind {
    Accuracy,
    Dodge,
    Skill,
    Defend,
    Parry,
    GuardBreak,
    ChainCombo,
}

impl QteKind {
    /// Kinds that run with temporarily narrowed zones.
    pub const fn shrinks_zones(&self) -> bool {
        matches!(self, Self::Parry | Self::GuardBreak)
    }

    pub const fn is_defensive(&self) -> bool {
        matches!(self, Self::Dodge | Self::Defend | Self::Parry)
    }
}

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Difficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

/// How the marker travels along the bar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MarkerMotion {
    /// Constant phase speed; position follows a cosine from 0 to 100 and back.
    #[default]
    Sinusoidal,
    /// Phase speed itself oscillates, making the marker surge and stall.
    OscillatingSpeed,
}

/// Phase of the active session.
///
/// Phases only ever advance `Waiting → Running → (Input | Timeout) → Result → Idle`.
/// Chain combos loop `Running → Waiting` between sub-challenges.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum QtePhase {
    #[default]
    Idle,
    Waiting,
    Running,
    Input,
    Timeout,
    Result,
}

/// Parameters for starting a challenge.
#[derive(Clone, Debug, PartialEq)]
pub struct QteRequest {
    pub kind: QteKind,
    pub difficulty: Difficulty,
    /// Sub-challenges for chain combos; ignored for other kinds.
    pub hits: u32,
    /// Text shown above the bar.
    pub label: Option<String>,
}

impl QteRequest {
    pub fn new(kind: QteKind, difficulty: Difficulty) -> Self {
        Self {
            kind,
            difficulty,
            hits: 1,
            label: None,
        }
    }

    pub fn chain_combo(hits: u32, difficulty: Difficulty) -> Self {
        Self {
            hits,
            ..Self::new(QteKind::ChainCombo, difficulty)
        }
    }

    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

/// Completed challenge, delivered to the callback and returned from `advance`.
#[derive(Clone, Debug, PartialEq)]
pub struct QteOutcome {
    pub kind: QteKind,
    pub zone: Zone,
    /// Tier name under the active ruleset.
    pub tier: &'static str,
    /// Frozen marker position (last sub-challenge for chains).
    pub position: f32,
    pub timed_out: bool,
    pub modifiers: QteModifiers,
}

/// Completion callback.
pub type QteCallback = Box<dyn FnOnce(&QteOutcome)>;

/// Display snapshot for the UI layer.
#[derive(Clone, Debug, PartialEq)]
pub struct QteView {
    pub kind: QteKind,
    pub phase: QtePhase,
    pub marker: f32,
    pub thresholds: ZoneThresholds,
    pub zone: Option<Zone>,
    pub label: Option<String>,
    /// `(current hit, total hits)` for chain combos, 1-based.
    pub chain_progress: Option<(usize, usize)>,
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum QteError {
    #[error("a timing challenge is already active")]
    AlreadyActive,

    #[error("chain combo needs at least one hit")]
    NoHits,

    #[error("chain combo of {0} hits exceeds the supported maximum")]
    ChainTooLong(u32),
}

impl CombatError for QteError {
    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::AlreadyActive => ErrorSeverity::Recoverable,
            Self::NoHits | Self::ChainTooLong(_) => ErrorSeverity::Validation,
        }
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::AlreadyActive => "QTE_ALREADY_ACTIVE",
            Self::NoHits => "QTE_NO_HITS",
            Self::ChainTooLong(_) => "QTE_CHAIN_TOO_LONG",
        }
    }
}

/// Chain-combo bookkeeping.
#[derive(Clone, Debug, Default)]
pub(super) struct ChainProgress {
    pub total: usize,
    pub results: ArrayVec<Zone, MAX_CHAIN_HITS>,
}

/// Internal state of the single active session.
pub(super) struct Session {
    pub request: QteRequest,
    pub phase: QtePhase,
    /// Time spent in the current phase.
    pub phase_ms: u32,
    /// How long the current waiting phase lasts.
    pub wait_ms: u32,
    pub marker: f32,
    pub angle: f64,
    pub speed: f32,
    pub zone: Option<Zone>,
    pub timed_out: bool,
    pub chain: Option<ChainProgress>,
    pub callback: Option<QteCallback>,
    /// Thresholds in force before a shrinking kind narrowed them.
    pub saved_thresholds: Option<ZoneThresholds>,
}
