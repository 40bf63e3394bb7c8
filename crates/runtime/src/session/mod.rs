//! Battle orchestration.
//!
//! [`BattleSession`] owns every collaborator of one battle and drives the
//! round loop:
//!
//! 1. the player's action, optionally behind an offensive timing challenge
//! 2. the player's summons
//! 3. the enemy's action: intent countdown or execution, a reactive choice, or
//!    a plain style turn, optionally behind a defensive timing challenge
//! 4. the enemy's summons
//! 5. round upkeep (style regeneration, status ticks)
//!
//! Timing challenges suspend the loop. The host keeps calling
//! [`BattleSession::advance`] (and [`BattleSession::confirm`] on input) until
//! it returns a [`TurnReport`], then resumes at the next player turn.
mod enemy;
mod summons;

use combat_core::{
    ActionFailure, ActionOutcome, BattleContext, BattleStore, BattleStyle, CombatConfig,
    Combatant, ContentTables, DismissReason, ForcedRoll, IntentSystem, IntentView, PcgRng,
    PlayerAction, QteEngine, QteKind, QteOutcome, QteView, Side, StyleKind, SummonManager,
    SummonView,
};

use crate::error::{Result, SessionError};
use crate::events::{BattleEvent, BattleResult, EventLog};
use crate::store::MemoryStore;

use enemy::EnemyPlan;

/// Where the round loop is waiting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BattlePhase {
    PlayerTurn,
    /// A timing challenge is running for the given side's action.
    AwaitingQte(Side),
    Over(BattleResult),
}

#[derive(Clone, Debug, PartialEq)]
enum Phase {
    PlayerTurn,
    PlayerQte(PlayerAction),
    EnemyQte(EnemyPlan),
    Over(BattleResult),
}

/// Everything that happened between two host calls.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TurnReport {
    pub messages: Vec<String>,
    pub player: Option<ActionOutcome>,
    pub enemy: Option<ActionOutcome>,
    /// Challenges that completed during this call.
    pub qte: Vec<QteOutcome>,
    /// A challenge that started and is waiting for input.
    pub pending_qte: Option<QteKind>,
    pub result: Option<BattleResult>,
}

impl TurnReport {
    pub fn is_waiting(&self) -> bool {
        self.pending_qte.is_some()
    }

    /// True when the player's action was refused and the turn is still theirs.
    ///
    /// A player who cannot act (stunned, asleep, frozen) loses the turn
    /// instead, so that failure does not count as a refusal.
    pub fn was_refused(&self) -> bool {
        self.player
            .as_ref()
            .is_some_and(|o| !o.success && !lost_turn(o))
    }
}

fn lost_turn(outcome: &ActionOutcome) -> bool {
    matches!(outcome.reason, Some(ActionFailure::CannotAct(_)))
}

/// Read-only snapshot for rendering and action providers.
#[derive(Clone, Debug, PartialEq)]
pub struct BattleView {
    pub turn: u32,
    pub style: StyleKind,
    pub phase: BattlePhase,
    pub player: Combatant,
    pub enemy: Combatant,
    pub player_summons: Vec<SummonView>,
    pub enemy_summons: Vec<SummonView>,
    pub intent: Option<IntentView>,
    pub qte: Option<QteView>,
    pub limit_gauge: u32,
    pub limit_ready: bool,
    pub terrain: Option<String>,
}

/// One battle between a player and an enemy.
pub struct BattleSession {
    config: CombatConfig,
    tables: ContentTables,
    store: MemoryStore,
    rng: PcgRng,
    style: Box<dyn BattleStyle>,
    summons: SummonManager,
    intents: IntentSystem,
    qte: QteEngine,
    turn: u32,
    phase: Phase,
    events: EventLog,
}

impl std::fmt::Debug for BattleSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BattleSession")
            .field("style", &self.style.kind())
            .field("turn", &self.turn)
            .field("phase", &self.phase)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl BattleSession {
    pub(crate) fn new(
        config: CombatConfig,
        tables: ContentTables,
        store: MemoryStore,
        seed: u64,
    ) -> Self {
        let style = config.battle.style.build(&config);
        let summons = SummonManager::new(config.summon.clone());
        let intents = IntentSystem::new(config.intent.clone());
        let qte = QteEngine::new(config.qte.clone());

        let mut events = EventLog::default();
        events.push(BattleEvent::BattleStarted {
            style: style.kind(),
            player: store.player().name.clone(),
            enemy: store.enemy().name.clone(),
        });
        events.push(BattleEvent::RoundStarted { turn: 1 });
        tracing::info!(
            style = %style.kind(),
            player = %store.player().name,
            enemy = %store.enemy().name,
            seed,
            "battle started"
        );

        Self {
            config,
            tables,
            store,
            rng: PcgRng::new(seed),
            style,
            summons,
            intents,
            qte,
            turn: 1,
            phase: Phase::PlayerTurn,
            events,
        }
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn tables(&self) -> &ContentTables {
        &self.tables
    }

    pub fn store(&self) -> &MemoryStore {
        &self.store
    }

    /// Direct state access for hosts that script battles (tutorials, tests).
    pub fn store_mut(&mut self) -> &mut MemoryStore {
        &mut self.store
    }

    pub fn style(&self) -> &dyn BattleStyle {
        self.style.as_ref()
    }

    pub fn summons(&self) -> &SummonManager {
        &self.summons
    }

    pub fn intents(&self) -> &IntentSystem {
        &self.intents
    }

    pub fn turn(&self) -> u32 {
        self.turn
    }

    pub fn phase(&self) -> BattlePhase {
        match &self.phase {
            Phase::PlayerTurn => BattlePhase::PlayerTurn,
            Phase::PlayerQte(_) => BattlePhase::AwaitingQte(Side::Player),
            Phase::EnemyQte(_) => BattlePhase::AwaitingQte(Side::Enemy),
            Phase::Over(result) => BattlePhase::Over(*result),
        }
    }

    pub fn result(&self) -> Option<BattleResult> {
        match self.phase {
            Phase::Over(result) => Some(result),
            _ => None,
        }
    }

    pub fn is_over(&self) -> bool {
        self.result().is_some()
    }

    pub fn qte_view(&self) -> Option<QteView> {
        self.qte.view()
    }

    pub fn events(&self) -> &EventLog {
        &self.events
    }

    pub fn drain_events(&mut self) -> Vec<BattleEvent> {
        self.events.drain()
    }

    /// Script d20 faces for the active style.
    pub fn set_forced_roll_callback(&mut self, callback: Option<ForcedRoll>) {
        self.style.set_forced_roll_callback(callback);
    }

    pub fn view(&self) -> BattleView {
        BattleView {
            turn: self.turn,
            style: self.style.kind(),
            phase: self.phase(),
            player: self.store.player().clone(),
            enemy: self.store.enemy().clone(),
            player_summons: self.summons.views(Side::Player),
            enemy_summons: self.summons.views(Side::Enemy),
            intent: self.intents.view(),
            qte: self.qte.view(),
            limit_gauge: self.store.limit_gauge(),
            limit_ready: self.store.is_limit_ready(),
            terrain: self.store.terrain().map(str::to_string),
        }
    }

    // ========================================================================
    // Player input
    // ========================================================================

    /// Submit the player's action for this turn.
    ///
    /// When the style asks for a timing challenge (and player challenges are
    /// enabled) the challenge starts and the report comes back waiting; the
    /// action resolves once [`advance`](Self::advance) completes it. A refused
    /// action leaves the turn with the player, except when the player cannot
    /// act at all: then the turn is lost and the enemy moves.
    ///
    /// # Errors
    ///
    /// [`SessionError::BattleOver`] after the battle ended and
    /// [`SessionError::QteBusy`] while a challenge is running.
    pub fn submit(&mut self, action: PlayerAction) -> Result<TurnReport> {
        self.ensure_player_turn()?;

        if self.config.battle.player_qte
            && self.store.can_act(Side::Player)
            && let Some(mut request) = self.style.player_qte(&action, &self.tables)
        {
            request.difficulty = self.config.battle.qte_difficulty;
            let kind = request.kind;
            self.qte.start(request)?;
            self.events.push(BattleEvent::QteStarted {
                kind,
                side: Side::Player,
            });
            tracing::debug!(?action, %kind, "player action waits on timing");
            self.phase = Phase::PlayerQte(action);
            return Ok(TurnReport {
                pending_qte: Some(kind),
                ..TurnReport::default()
            });
        }

        let mut report = TurnReport::default();
        self.resolve_player(action, None, &mut report);
        Ok(report)
    }

    /// Give up the player's action. Summons and the enemy still act.
    pub fn pass(&mut self) -> Result<TurnReport> {
        self.ensure_player_turn()?;
        let mut report = TurnReport::default();
        report
            .messages
            .push(format!("{} bides their time.", self.store.player().name));
        self.after_player_action(false, &mut report);
        Ok(report)
    }

    /// Confirm input for the running challenge. Returns whether it was accepted.
    pub fn confirm(&mut self) -> bool {
        self.qte.handle_input()
    }

    /// Advance the running challenge by `dt_ms`.
    ///
    /// Returns the report of the suspended action once the challenge completes.
    pub fn advance(&mut self, dt_ms: u32) -> Option<TurnReport> {
        let outcome = self.qte.advance(dt_ms)?;
        self.events.push(BattleEvent::QteResolved {
            kind: outcome.kind,
            zone: outcome.zone,
            timed_out: outcome.timed_out,
        });

        let mut report = TurnReport {
            qte: vec![outcome.clone()],
            ..TurnReport::default()
        };
        match std::mem::replace(&mut self.phase, Phase::PlayerTurn) {
            Phase::PlayerQte(action) => self.resolve_player(action, Some(&outcome), &mut report),
            Phase::EnemyQte(plan) => self.finish_enemy_turn(plan, Some(&outcome), &mut report),
            other => {
                tracing::warn!(kind = %outcome.kind, "timing challenge completed with no pending action");
                self.phase = other;
            }
        }
        Some(report)
    }

    /// End the battle from outside the rules (scene change, turn cap).
    pub fn abort(&mut self) -> TurnReport {
        let mut report = TurnReport::default();
        if !self.is_over() {
            self.finish(BattleResult::Aborted, &mut report);
        }
        report
    }

    fn ensure_player_turn(&self) -> Result<()> {
        match self.phase {
            Phase::PlayerTurn => Ok(()),
            Phase::PlayerQte(_) | Phase::EnemyQte(_) => Err(SessionError::QteBusy),
            Phase::Over(_) => Err(SessionError::BattleOver),
        }
    }

    // ========================================================================
    // Round loop
    // ========================================================================

    fn split(&mut self) -> (&mut dyn BattleStyle, BattleContext<'_>) {
        (
            self.style.as_mut(),
            BattleContext::new(
                &mut self.store,
                &mut self.rng,
                &self.tables,
                &mut self.summons,
            ),
        )
    }

    fn resolve_player(
        &mut self,
        action: PlayerAction,
        qte: Option<&QteOutcome>,
        report: &mut TurnReport,
    ) {
        let modifiers = qte.map(|o| &o.modifiers);
        let outcome = {
            let (style, mut ctx) = self.split();
            style.perform(&mut ctx, &action, modifiers)
        };
        tracing::debug!(?action, success = outcome.success, "player action resolved");

        self.record_action(Side::Player, &outcome);
        report.messages.extend(outcome.messages.iter().cloned());
        report.player = Some(outcome.clone());

        if !outcome.success {
            self.phase = Phase::PlayerTurn;
            if lost_turn(&outcome) {
                self.after_player_action(false, report);
            }
            return;
        }
        if let Some(uid) = outcome.summoned
            && let Some(summon) = self.summons.get(uid)
        {
            self.events.push(BattleEvent::SummonSpawned {
                uid,
                name: summon.name.clone(),
                side: Side::Player,
            });
        }
        if outcome.fled {
            self.finish(BattleResult::Fled, report);
            return;
        }

        let interrupted = self.check_intent_break(&outcome, report);
        self.after_player_action(interrupted, report);
    }

    /// A status landing on the enemy may interrupt its telegraphed intent.
    fn check_intent_break(&mut self, outcome: &ActionOutcome, report: &mut TurnReport) -> bool {
        let breaks = outcome
            .statuses
            .iter()
            .filter(|s| s.target == Side::Enemy)
            .any(|s| self.intents.would_break(s.kind));
        if !breaks {
            return false;
        }
        let Some(broken) = self.intents.break_intent(self.turn) else {
            return false;
        };
        report.messages.push(broken.message);
        self.events.push(BattleEvent::IntentBroken {
            name: broken.intent.name,
        });
        true
    }

    fn after_player_action(&mut self, interrupted: bool, report: &mut TurnReport) {
        if self.check_end(report) {
            return;
        }
        self.run_summons(Side::Player, report);
        if self.check_end(report) {
            return;
        }
        self.begin_enemy_turn(interrupted, report);
    }

    fn start_round(&mut self, report: &mut TurnReport) {
        self.turn += 1;
        let upkeep = {
            let (style, mut ctx) = self.split();
            style.on_turn_start(&mut ctx)
        };
        report.messages.extend(upkeep);
        for side in [Side::Player, Side::Enemy] {
            let lines = self.store.tick_statuses(side);
            report.messages.extend(lines);
        }
        self.events.push(BattleEvent::RoundStarted { turn: self.turn });
        tracing::debug!(turn = self.turn, "round started");

        if !self.check_end(report) {
            self.phase = Phase::PlayerTurn;
        }
    }

    fn record_action(&mut self, side: Side, outcome: &ActionOutcome) {
        self.events.push(BattleEvent::ActionResolved {
            side,
            success: outcome.success,
            reason: outcome.reason_code().map(str::to_string),
            damage: outcome.total_damage,
            healed: outcome.healed,
        });
    }

    /// End the battle when either combatant is down.
    fn check_end(&mut self, report: &mut TurnReport) -> bool {
        if self.is_over() {
            return true;
        }
        let result = if !self.store.enemy().is_alive() {
            BattleResult::Victory
        } else if !self.store.player().is_alive() {
            BattleResult::Defeat
        } else {
            return false;
        };
        self.finish(result, report);
        true
    }

    fn finish(&mut self, result: BattleResult, report: &mut TurnReport) {
        self.qte.cancel();
        for side in [Side::Player, Side::Enemy] {
            for dismissal in self.summons.dismiss_side(side, DismissReason::BattleEnd) {
                self.events.push(BattleEvent::SummonDismissed {
                    uid: dismissal.summon.uid,
                    name: dismissal.summon.name,
                    reason: dismissal.reason.to_string(),
                });
            }
        }
        self.intents.reset();

        match result {
            BattleResult::Victory => report
                .messages
                .push(format!("{} is defeated!", self.store.enemy().name)),
            BattleResult::Defeat => report
                .messages
                .push(format!("{} has fallen...", self.store.player().name)),
            BattleResult::Fled | BattleResult::Aborted => {}
        }

        self.phase = Phase::Over(result);
        report.result = Some(result);
        self.events.push(BattleEvent::BattleEnded {
            result,
            turn: self.turn,
        });
        tracing::info!(?result, turn = self.turn, "battle ended");
    }
}
