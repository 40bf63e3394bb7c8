//! Abstraction for sourcing player decisions.
//!
//! Hosts plug in [`ActionProvider`] implementations so a battle can run with
//! human input, scripted fixtures or the built-in [`AutoPlayer`].
use combat_core::qte::CENTER;
use combat_core::util::effectiveness;
use combat_core::{ContentTables, PlayerAction, QtePhase, QteView, SkillEffect};

use crate::error::Result;
use crate::session::{BattlePhase, BattleSession, BattleView, TurnReport};

pub trait ActionProvider {
    /// Pick the next action. `refused` lists actions already refused this
    /// turn; `None` passes the turn.
    fn choose(
        &mut self,
        view: &BattleView,
        tables: &ContentTables,
        refused: &[PlayerAction],
    ) -> Option<PlayerAction>;

    /// Whether to confirm at this point of a running challenge.
    fn confirm(&mut self, qte: &QteView) -> bool;
}

/// Greedy player: limit break when ready, heal when low, keep a summon out,
/// otherwise the most effective damaging move.
#[derive(Debug, Clone)]
pub struct AutoPlayer {
    /// Confirm once the marker is this close to the center. Negative never confirms.
    pub tolerance: f32,
    /// Heal below this HP fraction.
    pub heal_below: f32,
}

impl Default for AutoPlayer {
    fn default() -> Self {
        Self {
            tolerance: 4.0,
            heal_below: 0.35,
        }
    }
}

impl AutoPlayer {
    pub fn new(tolerance: f32) -> Self {
        Self {
            tolerance,
            ..Self::default()
        }
    }
}

impl ActionProvider for AutoPlayer {
    fn choose(
        &mut self,
        view: &BattleView,
        tables: &ContentTables,
        refused: &[PlayerAction],
    ) -> Option<PlayerAction> {
        let open = |action: &PlayerAction| !refused.contains(action);
        let moves: Vec<_> = tables.moves_of(&view.player).collect();

        if view.limit_ready && open(&PlayerAction::LimitBreak) {
            return Some(PlayerAction::LimitBreak);
        }

        if view.player.hp_fraction() < self.heal_below
            && let Some(heal) = moves
                .iter()
                .find(|s| matches!(s.effect, SkillEffect::Heal { .. }))
            && open(&PlayerAction::Skill(heal.id.clone()))
        {
            return Some(PlayerAction::Skill(heal.id.clone()));
        }

        if view.player_summons.is_empty()
            && let Some(summon) = moves
                .iter()
                .find(|s| matches!(s.effect, SkillEffect::Summon { .. }))
            && open(&PlayerAction::Skill(summon.id.clone()))
        {
            return Some(PlayerAction::Skill(summon.id.clone()));
        }

        let best = moves
            .iter()
            .filter(|s| s.effect.is_damaging())
            .map(|s| (s, effectiveness(s.element, &view.enemy.elements)))
            .filter(|(s, m)| *m > 0.0 && open(&PlayerAction::Skill(s.id.clone())))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((skill, _)) = best {
            return Some(PlayerAction::Skill(skill.id.clone()));
        }

        [PlayerAction::Attack, PlayerAction::Defend]
            .into_iter()
            .find(|a| open(a))
    }

    fn confirm(&mut self, qte: &QteView) -> bool {
        self.tolerance >= 0.0
            && qte.phase == QtePhase::Running
            && (qte.marker - CENTER).abs() <= self.tolerance
    }
}

/// Play one full player turn: choose, resolve any timing challenges in
/// `tick_ms` steps, and retry refused actions with a fresh choice.
///
/// Returns every report produced, in order.
///
/// # Errors
///
/// Propagates session misuse (for example calling this after the battle ended).
pub fn play_turn(
    session: &mut BattleSession,
    provider: &mut dyn ActionProvider,
    tick_ms: u32,
) -> Result<Vec<TurnReport>> {
    let tick_ms = tick_ms.max(1);
    let mut reports = Vec::new();
    let mut refused = Vec::new();

    loop {
        let view = session.view();
        let report = match provider.choose(&view, session.tables(), &refused) {
            Some(action) if !refused.contains(&action) => {
                let report = session.submit(action.clone())?;
                if report.was_refused() {
                    refused.push(action);
                }
                report
            }
            _ => session.pass()?,
        };
        reports.push(report);

        while let BattlePhase::AwaitingQte(_) = session.phase() {
            if let Some(qte) = session.qte_view()
                && provider.confirm(&qte)
            {
                session.confirm();
            }
            if let Some(report) = session.advance(tick_ms) {
                reports.push(report);
            }
        }

        if session.phase() != BattlePhase::PlayerTurn
            || !reports.last().is_some_and(TurnReport::was_refused)
        {
            return Ok(reports);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use combat_content::ContentFactory;

    fn view_for(hp: u32) -> (BattleView, ContentTables) {
        let tables = ContentFactory::bundled().load_tables().unwrap();
        let mut session = BattleSession::builder()
            .tables(tables.clone())
            .player("hero")
            .enemy("slime")
            .seed(3)
            .build()
            .unwrap();
        session.store_mut().combatant_mut(combat_core::Side::Player).hp = hp;
        (session.view(), tables)
    }

    #[test]
    fn prefers_super_effective_moves() {
        let (view, tables) = view_for(60);
        let mut player = AutoPlayer::default();
        // hero opens with a summon, then picks fire against the grass slime
        let first = player.choose(&view, &tables, &[]).unwrap();
        assert_eq!(first, PlayerAction::Skill("call_guardian".into()));
        let next = player.choose(&view, &tables, &[first]).unwrap();
        assert_eq!(next, PlayerAction::Skill("ember".into()));
    }

    #[test]
    fn heals_when_low() {
        let (view, tables) = view_for(10);
        let action = AutoPlayer::default().choose(&view, &tables, &[]);
        assert_eq!(action, Some(PlayerAction::Skill("mend".into())));
    }

    #[test]
    fn negative_tolerance_never_confirms() {
        let mut player = AutoPlayer::new(-1.0);
        let view = QteView {
            kind: combat_core::QteKind::Skill,
            phase: QtePhase::Running,
            marker: CENTER,
            thresholds: combat_core::qte::ZoneThresholds {
                perfect: 5.0,
                good: 15.0,
                normal: 30.0,
            },
            zone: None,
            label: None,
            chain_progress: None,
        };
        assert!(!player.confirm(&view));
        assert!(AutoPlayer::default().confirm(&view));
    }
}
