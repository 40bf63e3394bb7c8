//! Turn-based combat rules shared by every battle host.
//!
//! `combat-core` defines the timing-challenge engine, the two interchangeable
//! battle styles, the summon subsystem and the enemy intent (telegraph)
//! subsystem. It never owns combatant state: hosts inject a
//! [`BattleStore`], a [`RandomSource`] and read-only [`ContentTables`], and
//! drive time through [`QteEngine::advance`].
pub mod config;
pub mod env;
pub mod error;
pub mod intent;
pub mod qte;
pub mod style;
pub mod summon;
pub mod util;

pub use config::{
    ApComboConfig, BattleConfig, CombatConfig, IntentConfig, QteConfig, SummonConfig,
    TypePpConfig,
};
pub use env::{
    BASIC_ATTACK_ID, BattleStore, Combatant, ContentTables, DamageMeta, DamageSource, PcgRng,
    RandomSource, SequenceRng, Side, SkillDef, SkillEffect, StatusApplication, StatusRider,
    TablesError, TerrainDef,
};
pub use error::{ActionFailure, CombatError, ErrorSeverity};
pub use intent::{
    BreakCondition, BrokenIntent, Intent, IntentDecision, IntentDef, IntentKind, IntentPayload,
    IntentRecord, IntentState, IntentSystem, IntentView, ReactiveAction,
};
pub use qte::{
    Difficulty, MarkerMotion, QteEngine, QteError, QteKind, QteModifiers, QteOutcome, QtePhase,
    QteRequest, QteRuleset, QteView, Zone,
};
pub use style::{
    ActionOutcome, ApComboStyle, AppliedStatus, AttackOptions, AttackResult, BattleContext,
    BattleStyle, ForcedRoll, PlayerAction, StyleKind, TypePpStyle,
};
pub use summon::{
    DismissReason, Dismissal, SpawnReport, Summon, SummonAction, SummonDef, SummonError,
    SummonFlags, SummonManager, SummonOverrides, SummonTurn, SummonUid, SummonView,
};
pub use util::{DiceExpr, Effectiveness, Element, StatusEffect, StatusKind};
