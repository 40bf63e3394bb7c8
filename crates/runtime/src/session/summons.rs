//! Resolving summon actions against the store.

use combat_core::util::StatusModifiers;
use combat_core::{
    BattleStore, DamageMeta, DamageSource, DiceExpr, Element, RandomSource, Side, SummonAction,
};

use super::{BattleSession, TurnReport};
use crate::events::BattleEvent;

impl BattleSession {
    /// Run the summon turn for `side` and apply what its summons did.
    pub(super) fn run_summons(&mut self, side: Side, report: &mut TurnReport) {
        if !self.summons.has_active(side) {
            return;
        }

        let target = self.store.combatant(side.opponent()).clone();
        let turn = self.summons.process_turn(side, &target, &mut self.rng);
        report.messages.extend(turn.messages);
        for dismissal in turn.expired {
            self.events.push(BattleEvent::SummonDismissed {
                uid: dismissal.summon.uid,
                name: dismissal.summon.name,
                reason: dismissal.reason.to_string(),
            });
        }

        for action in turn.actions {
            if !self.store.player().is_alive() || !self.store.enemy().is_alive() {
                break;
            }
            match action {
                SummonAction::Attack {
                    name,
                    move_name,
                    damage,
                    damage_type,
                    attack_bonus,
                    ..
                } => {
                    let strike = SummonStrike {
                        name: &name,
                        move_name: &move_name,
                        damage,
                        element: damage_type,
                        attack_bonus,
                    };
                    let line = self.summon_attack(side.opponent(), &strike);
                    report.messages.push(line);
                }
                SummonAction::Heal { name, amount, .. } => {
                    let healed = self.store.heal(side, amount, &name);
                    if healed > 0 {
                        report.messages.push(format!(
                            "{} recovers {} HP.",
                            self.store.combatant(side).name,
                            healed
                        ));
                    }
                }
                SummonAction::Guard { .. } => {}
            }
        }
    }

    /// d20 against the target's armor class; a natural 20 doubles damage.
    fn summon_attack(&mut self, target: Side, strike: &SummonStrike<'_>) -> String {
        let defender = self.store.combatant(target);
        let defender_name = defender.name.clone();
        let defender_elements = defender.elements.clone();
        let ac = defender.ac + StatusModifiers::aggregate(&defender.statuses).ac_bonus;

        let roll = self.rng.roll_d20();
        let total = roll as i32 + strike.attack_bonus - self.store.terrain_accuracy_penalty();
        let critical = roll == 20;
        if roll == 1 || (!critical && total < ac) {
            tracing::trace!(roll, total, ac, "summon attack missed");
            return format!("{}'s {} misses {}.", strike.name, strike.move_name, defender_name);
        }

        let multiplier = combat_core::util::effectiveness(strike.element, &defender_elements)
            * self.store.terrain_multiplier(strike.element);
        let rolled = strike.damage.roll_amount(&mut self.rng) as f32;
        let mut amount = (rolled * multiplier).round() as u32;
        if critical {
            amount *= 2;
        }
        if multiplier > 0.0 {
            amount = amount.max(1);
        }

        let meta = DamageMeta::new(DamageSource::Summon(strike.name.to_string()), strike.element)
            .with_critical(critical);
        let dealt = self.store.damage(target, amount, &meta);
        if critical {
            format!("Critical! {} takes {} damage.", defender_name, dealt)
        } else {
            format!("{} takes {} damage.", defender_name, dealt)
        }
    }
}

struct SummonStrike<'a> {
    name: &'a str,
    move_name: &'a str,
    damage: DiceExpr,
    element: Element,
    attack_bonus: i32,
}
