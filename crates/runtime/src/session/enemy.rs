//! Enemy half of the round: intents, reactive choices and style turns.

use combat_core::{
    ActionOutcome, AppliedStatus, BattleStore, IntentDecision, IntentPayload, QteOutcome,
    QteRequest, ReactiveAction, Side, SkillDef, StatusKind, StyleKind, SummonOverrides,
};

use super::{BattleSession, Phase, TurnReport};
use crate::events::BattleEvent;

/// What the enemy will do once any defensive challenge resolves.
#[derive(Clone, Debug, PartialEq)]
pub(super) enum EnemyPlan {
    /// The style picks and pays for the move.
    StyleTurn,
    Skill {
        skill: SkillDef,
        multiplier: f32,
        hits: u32,
        from_intent: bool,
    },
    Summon {
        summon: String,
        from_intent: bool,
    },
    Defend,
}

impl EnemyPlan {
    fn is_offensive(&self) -> bool {
        match self {
            Self::StyleTurn => true,
            Self::Skill { skill, .. } => skill.effect.is_damaging(),
            Self::Summon { .. } | Self::Defend => false,
        }
    }

    fn from_intent(&self) -> bool {
        matches!(
            self,
            Self::Skill {
                from_intent: true,
                ..
            } | Self::Summon {
                from_intent: true,
                ..
            }
        )
    }
}

impl BattleSession {
    /// Plan the enemy's action and either run it or suspend on a defensive challenge.
    ///
    /// `interrupted` means the player just broke a telegraphed intent; the
    /// enemy falls back to a basic attack.
    pub(super) fn begin_enemy_turn(&mut self, interrupted: bool, report: &mut TurnReport) {
        let plan = if interrupted {
            self.reactive_plan(ReactiveAction::BasicAttack)
        } else {
            self.plan_enemy(report)
        };

        if self.config.battle.enemy_qte
            && plan.is_offensive()
            && self.store.can_act(Side::Enemy)
            && let Some(kind) = self.style.enemy_qte()
        {
            let label = match &plan {
                EnemyPlan::Skill { skill, .. } => skill.name.clone(),
                _ => format!("{} attacks", self.store.enemy().name),
            };
            let request =
                QteRequest::new(kind, self.config.battle.qte_difficulty).with_label(label);
            match self.qte.start(request) {
                Ok(()) => {
                    self.events.push(BattleEvent::QteStarted {
                        kind,
                        side: Side::Enemy,
                    });
                    report.pending_qte = Some(kind);
                    self.phase = Phase::EnemyQte(plan);
                    return;
                }
                Err(e) => tracing::warn!(error = %e, "defensive challenge unavailable"),
            }
        }

        self.finish_enemy_turn(plan, None, report);
    }

    fn plan_enemy(&mut self, report: &mut TurnReport) -> EnemyPlan {
        if self.intents.active().is_some() {
            if self.intents.tick() {
                return self.intent_plan();
            }
            if let Some(intent) = self.intents.active() {
                report.messages.push(format!(
                    "{} is preparing {}... ({} turn(s))",
                    self.store.enemy().name,
                    intent.name,
                    intent.turns_remaining
                ));
            }
            return EnemyPlan::StyleTurn;
        }

        let enemy = self.store.enemy().clone();
        let player = self.store.player().clone();
        match self
            .intents
            .generate(&enemy, &player, self.turn, &self.tables, &mut self.rng)
        {
            IntentDecision::Triggered(intent) => {
                report.messages.push(intent.telegraph_text.clone());
                self.events.push(BattleEvent::IntentTelegraphed {
                    name: intent.name,
                    kind: intent.kind,
                    turns: intent.turns_remaining,
                });
                EnemyPlan::StyleTurn
            }
            IntentDecision::Reactive(action) => self.reactive_plan(action),
            IntentDecision::NoTrigger | IntentDecision::AlreadyTelegraphing => EnemyPlan::StyleTurn,
        }
    }

    fn intent_plan(&mut self) -> EnemyPlan {
        let Some(payload) = self.intents.active().map(|i| i.payload.clone()) else {
            return EnemyPlan::StyleTurn;
        };
        let (skill_id, multiplier, hits) = match payload {
            IntentPayload::Summon { summon } => {
                return EnemyPlan::Summon {
                    summon,
                    from_intent: true,
                };
            }
            IntentPayload::Skill { skill, multiplier } => (skill, multiplier, 1),
            IntentPayload::MultiHit { skill, hits } => (skill, 1.0, hits),
        };

        match self.tables.skill(&skill_id) {
            Some(skill) => EnemyPlan::Skill {
                skill: skill.clone(),
                multiplier,
                hits,
                from_intent: true,
            },
            None => {
                tracing::warn!(skill = %skill_id, "intent names a missing skill, dropping it");
                self.intents.clear(self.turn);
                EnemyPlan::StyleTurn
            }
        }
    }

    /// Map a reactive choice onto the active style.
    ///
    /// AP-based styles keep their own move selection and AP economy, so only
    /// heal and defend choices bypass them.
    fn reactive_plan(&self, action: ReactiveAction) -> EnemyPlan {
        let direct = |skill: &SkillDef| EnemyPlan::Skill {
            skill: skill.clone(),
            multiplier: 1.0,
            hits: 1,
            from_intent: false,
        };

        match (action, self.style.kind()) {
            (ReactiveAction::Defend, _) => EnemyPlan::Defend,
            (ReactiveAction::Heal { skill }, _) => self
                .tables
                .skill(&skill)
                .map_or(EnemyPlan::StyleTurn, direct),
            (ReactiveAction::UseMove { skill }, StyleKind::TypePp) => self
                .tables
                .skill(&skill)
                .map_or(EnemyPlan::StyleTurn, direct),
            (ReactiveAction::BasicAttack, StyleKind::TypePp) => {
                let basic = SkillDef::basic_attack(
                    self.config.type_pp.basic_attack_power,
                    self.store.enemy().basic_damage,
                    0,
                );
                direct(&basic)
            }
            (ReactiveAction::UseMove { .. } | ReactiveAction::BasicAttack, StyleKind::ApCombo) => {
                EnemyPlan::StyleTurn
            }
        }
    }

    pub(super) fn finish_enemy_turn(
        &mut self,
        plan: EnemyPlan,
        qte: Option<&QteOutcome>,
        report: &mut TurnReport,
    ) {
        // A ready intent waits out stuns instead of being spent.
        let outcome = if plan.from_intent() && !self.store.can_act(Side::Enemy) {
            let name = self.store.enemy().name.clone();
            ActionOutcome::ok().with_message(self.store.cannot_act_message(Side::Enemy, &name))
        } else {
            self.execute_plan(plan, qte, report)
        };

        self.record_action(Side::Enemy, &outcome);
        if let Some(uid) = outcome.summoned
            && let Some(summon) = self.summons.get(uid)
        {
            self.events.push(BattleEvent::SummonSpawned {
                uid,
                name: summon.name.clone(),
                side: Side::Enemy,
            });
        }
        report.messages.extend(outcome.messages.iter().cloned());
        report.enemy = Some(outcome);

        if self.check_end(report) {
            return;
        }
        self.run_summons(Side::Enemy, report);
        if self.check_end(report) {
            return;
        }
        self.start_round(report);
    }

    fn execute_plan(
        &mut self,
        plan: EnemyPlan,
        qte: Option<&QteOutcome>,
        report: &mut TurnReport,
    ) -> ActionOutcome {
        let modifiers = qte.map(|o| &o.modifiers);
        match plan {
            EnemyPlan::StyleTurn => {
                let (style, mut ctx) = self.split();
                style.enemy_turn(&mut ctx, modifiers)
            }
            EnemyPlan::Skill {
                skill,
                multiplier,
                hits,
                from_intent,
            } => {
                if from_intent {
                    self.announce_intent(report);
                }
                let mut total = ActionOutcome::ok();
                for _ in 0..hits.max(1) {
                    if !self.store.player().is_alive() {
                        break;
                    }
                    let (style, mut ctx) = self.split();
                    let strike = style.enemy_skill(&mut ctx, &skill, multiplier, modifiers);
                    total.absorb(strike);
                }
                total
            }
            EnemyPlan::Summon {
                summon,
                from_intent,
            } => {
                if from_intent {
                    self.announce_intent(report);
                }
                self.enemy_summon(&summon)
            }
            EnemyPlan::Defend => {
                let name = self.store.enemy().name.clone();
                let mut outcome = ActionOutcome::ok().with_message(format!("{name} braces itself."));
                let applied = self.store.apply_status(Side::Enemy, StatusKind::Shield, 1);
                if applied.applied {
                    outcome.statuses.push(AppliedStatus {
                        target: Side::Enemy,
                        kind: StatusKind::Shield,
                        stacks: 1,
                    });
                }
                outcome
            }
        }
    }

    /// Release the intent slot and narrate its execution.
    fn announce_intent(&mut self, report: &mut TurnReport) {
        let Some(intent) = self.intents.clear(self.turn) else {
            return;
        };
        let line = intent
            .execute_text
            .clone()
            .unwrap_or_else(|| format!("{} unleashes {}!", self.store.enemy().name, intent.name));
        report.messages.push(line);
        self.events.push(BattleEvent::IntentExecuted { name: intent.name });
    }

    fn enemy_summon(&mut self, summon: &str) -> ActionOutcome {
        let summoner = self.store.enemy().id.clone();
        match self.summons.spawn(
            &self.tables,
            summon,
            &summoner,
            Side::Enemy,
            SummonOverrides::default(),
        ) {
            Ok(spawned) => {
                let mut outcome = ActionOutcome::ok().with_message(spawned.message);
                outcome.summoned = Some(spawned.summon.uid);
                outcome
            }
            Err(e) => {
                tracing::debug!(error = %e, "enemy summon refused");
                ActionOutcome::ok().with_message(format!(
                    "{} calls for aid, but nothing answers.",
                    self.store.enemy().name
                ))
            }
        }
    }
}
