//! Battle events recorded by a session.
//!
//! Every state transition the orchestrator drives is appended to an
//! [`EventLog`]. Hosts drain it after each call to animate, narrate or
//! persist the battle; the log never influences rules.

use combat_core::{IntentKind, QteKind, Side, StyleKind, SummonUid, Zone};
use serde::{Deserialize, Serialize};

/// How a battle ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BattleResult {
    Victory,
    Defeat,
    Fled,
    /// Ended by the host (scene change, turn cap).
    Aborted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BattleEvent {
    BattleStarted {
        style: StyleKind,
        player: String,
        enemy: String,
    },
    RoundStarted {
        turn: u32,
    },
    QteStarted {
        kind: QteKind,
        side: Side,
    },
    QteResolved {
        kind: QteKind,
        zone: Zone,
        timed_out: bool,
    },
    ActionResolved {
        side: Side,
        success: bool,
        reason: Option<String>,
        damage: Option<u32>,
        healed: Option<u32>,
    },
    IntentTelegraphed {
        name: String,
        kind: IntentKind,
        turns: u32,
    },
    IntentExecuted {
        name: String,
    },
    IntentBroken {
        name: String,
    },
    SummonSpawned {
        uid: SummonUid,
        name: String,
        side: Side,
    },
    SummonDismissed {
        uid: SummonUid,
        name: String,
        reason: String,
    },
    BattleEnded {
        result: BattleResult,
        turn: u32,
    },
}

/// Append-only event buffer.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    events: Vec<BattleEvent>,
}

impl EventLog {
    pub fn push(&mut self, event: BattleEvent) {
        tracing::trace!(?event, "battle event");
        self.events.push(event);
    }

    pub fn events(&self) -> &[BattleEvent] {
        &self.events
    }

    /// Take every buffered event, oldest first.
    pub fn drain(&mut self) -> Vec<BattleEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
