//! Temporary combatants called onto either side of a battle.
//!
//! [`SummonManager`] owns every live [`Summon`] for one battle. It decides what
//! each summon does on its side's turn but never touches combatant HP itself:
//! attack and heal actions are reported back as [`SummonAction`]s for the
//! caller to resolve through the [`BattleStore`](crate::env::BattleStore).
//!
//! Lifecycle:
//!
//! ```text
//! spawn ──► active ──┬─ take_damage to 0 ─► Killed
//!                    ├─ process_turn to 0 ─► Expired
//!                    └─ dismiss ───────────► Dismissed / BattleEnd
//! ```
mod types;

pub use types::{
    DismissReason, Dismissal, SpawnReport, Summon, SummonAction, SummonDamage, SummonDef,
    SummonError, SummonFlags, SummonMove, SummonOverrides, SummonTurn, SummonUid, SummonView,
};

use crate::config::SummonConfig;
use crate::env::{Combatant, ContentTables, RandomSource, Side};

/// Live summons for one battle.
#[derive(Clone, Debug)]
pub struct SummonManager {
    config: SummonConfig,
    active: Vec<Summon>,
    next_uid: u32,
}

impl SummonManager {
    pub fn new(config: SummonConfig) -> Self {
        Self {
            config,
            active: Vec::new(),
            next_uid: 1,
        }
    }

    pub fn config(&self) -> &SummonConfig {
        &self.config
    }

    /// Drop every summon without emitting dismissals. Uids keep counting up.
    pub fn reset(&mut self) {
        self.active.clear();
    }

    // ========================================================================
    // Spawning and dismissal
    // ========================================================================

    /// Call a summon of `type_id` for `summoner_id`.
    ///
    /// # Errors
    ///
    /// - [`SummonError::UnknownSummon`] when the tables have no such definition
    /// - [`SummonError::MaxSummons`] when the summoner is already at the cap
    ///
    /// Neither error changes any state.
    pub fn spawn(
        &mut self,
        tables: &ContentTables,
        type_id: &str,
        summoner_id: &str,
        side: Side,
        overrides: SummonOverrides,
    ) -> Result<SpawnReport, SummonError> {
        let def = tables
            .summon(type_id)
            .ok_or_else(|| SummonError::UnknownSummon(type_id.to_string()))?;

        let cap = self.config.max_per_summoner;
        if self.by_summoner(summoner_id).count() >= cap {
            return Err(SummonError::MaxSummons {
                summoner: summoner_id.to_string(),
                cap,
            });
        }

        let uid = SummonUid(self.next_uid);
        self.next_uid += 1;

        let summon = Summon::from_def(uid, def, summoner_id, side, overrides);
        let message = format!(
            "{} appears! ({} HP, {} turns)",
            summon.name, summon.max_hp, summon.turns_remaining
        );
        tracing::debug!(
            "Spawned {} ({}) for {} on {:?} side",
            summon.name,
            uid,
            summoner_id,
            side
        );

        self.active.push(summon.clone());
        Ok(SpawnReport { summon, message })
    }

    /// Remove a summon. Returns `None` if the uid is not active.
    pub fn dismiss(&mut self, uid: SummonUid, reason: DismissReason) -> Option<Dismissal> {
        let index = self.active.iter().position(|s| s.uid == uid)?;
        let summon = self.active.remove(index);
        let message = match reason {
            DismissReason::Killed => format!("{} is defeated!", summon.name),
            DismissReason::Expired => format!("{} fades away.", summon.name),
            DismissReason::Dismissed | DismissReason::BattleEnd => {
                format!("{} departs.", summon.name)
            }
        };
        tracing::debug!("Dismissed {} ({}): {}", summon.name, uid, reason);
        Some(Dismissal {
            summon,
            reason,
            message,
        })
    }

    /// Dismiss everything on a side, e.g. when its summoner falls.
    pub fn dismiss_side(&mut self, side: Side, reason: DismissReason) -> Vec<Dismissal> {
        let uids: Vec<_> = self.active_by_side(side).map(|s| s.uid).collect();
        uids.into_iter()
            .filter_map(|uid| self.dismiss(uid, reason))
            .collect()
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn get(&self, uid: SummonUid) -> Option<&Summon> {
        self.active.iter().find(|s| s.uid == uid)
    }

    pub fn all(&self) -> &[Summon] {
        &self.active
    }

    pub fn active_by_side(&self, side: Side) -> impl Iterator<Item = &Summon> {
        self.active.iter().filter(move |s| s.side == side)
    }

    pub fn by_summoner<'a>(&'a self, summoner_id: &'a str) -> impl Iterator<Item = &'a Summon> {
        self.active
            .iter()
            .filter(move |s| s.summoner_id == summoner_id)
    }

    pub fn has_active(&self, side: Side) -> bool {
        self.active_by_side(side).next().is_some()
    }

    pub fn views(&self, side: Side) -> Vec<SummonView> {
        self.active_by_side(side)
            .map(|s| s.view(&self.config))
            .collect()
    }

    // ========================================================================
    // HP
    // ========================================================================

    /// Damage a summon, clamped to its remaining HP.
    ///
    /// A summon that reaches 0 HP is dismissed as [`DismissReason::Killed`]
    /// inside this call, so a later call for the same uid returns `None`.
    pub fn take_damage(&mut self, uid: SummonUid, amount: u32) -> Option<SummonDamage> {
        let summon = self.active.iter_mut().find(|s| s.uid == uid)?;

        let dealt = amount.min(summon.hp);
        summon.hp -= dealt;
        let hp = summon.hp;
        let is_low_hp = summon.is_low_hp(&self.config);

        let killed = if hp == 0 {
            self.dismiss(uid, DismissReason::Killed)
        } else {
            None
        };

        Some(SummonDamage {
            dealt,
            hp,
            is_low_hp,
            killed,
        })
    }

    /// Restore HP up to the summon's max. Returns the amount actually healed.
    pub fn heal(&mut self, uid: SummonUid, amount: u32) -> Option<u32> {
        let summon = self.active.iter_mut().find(|s| s.uid == uid)?;
        let healed = amount.min(summon.max_hp - summon.hp);
        summon.hp += healed;
        Some(healed)
    }

    // ========================================================================
    // Turn processing
    // ========================================================================

    /// Pick a protecting summon to take a hit aimed at `summoner_id`.
    ///
    /// Only considered when `master_hp_ratio` is at or below the configured
    /// threshold. Each protect-capable summon rolls its own chance in spawn
    /// order and the first success is returned.
    pub fn check_intercept(
        &self,
        summoner_id: &str,
        master_hp_ratio: f32,
        rng: &mut dyn RandomSource,
    ) -> Option<SummonUid> {
        if master_hp_ratio > self.config.intercept_hp_threshold {
            return None;
        }

        self.by_summoner(summoner_id)
            .filter(|s| s.can_protect() && s.hp > 0)
            .find(|s| rng.chance(s.protect_chance as f64))
            .map(|s| s.uid)
    }

    /// Run one turn for every summon on `side`.
    ///
    /// Each summon's countdown drops by one first; summons reaching zero are
    /// dismissed as expired and take no action. Survivors act exactly once:
    /// healers report a heal for their summoner, attackers report an attack
    /// on `target`, protect-only summons stand guard.
    pub fn process_turn(
        &mut self,
        side: Side,
        target: &Combatant,
        rng: &mut dyn RandomSource,
    ) -> SummonTurn {
        let mut turn = SummonTurn::default();
        let uids: Vec<_> = self.active_by_side(side).map(|s| s.uid).collect();

        for uid in uids {
            let Some(summon) = self.active.iter_mut().find(|s| s.uid == uid) else {
                continue;
            };
            summon.turns_remaining = summon.turns_remaining.saturating_sub(1);

            if summon.turns_remaining == 0 {
                if let Some(dismissal) = self.dismiss(uid, DismissReason::Expired) {
                    turn.messages.push(dismissal.message.clone());
                    turn.expired.push(dismissal);
                }
                continue;
            }

            let summon = &*summon;
            let action = if summon.can_heal() {
                let amount = summon.heal_amount.roll_amount(rng);
                turn.messages
                    .push(format!("{} tends to its summoner.", summon.name));
                SummonAction::Heal {
                    uid,
                    summoner_id: summon.summoner_id.clone(),
                    name: summon.name.clone(),
                    amount,
                }
            } else if summon.can_attack() && target.is_alive() {
                let (move_name, damage, damage_type) = if summon.moves.is_empty() {
                    ("Attack".to_string(), summon.damage, summon.damage_type)
                } else {
                    let pick = &summon.moves[rng.pick_index(summon.moves.len())];
                    (pick.name.clone(), pick.damage, pick.damage_type)
                };
                turn.messages.push(format!(
                    "{} uses {} on {}!",
                    summon.name, move_name, target.name
                ));
                SummonAction::Attack {
                    uid,
                    summoner_id: summon.summoner_id.clone(),
                    name: summon.name.clone(),
                    move_name,
                    damage,
                    damage_type,
                    attack_bonus: summon.attack_bonus,
                    target: target.name.clone(),
                }
            } else {
                turn.messages.push(format!("{} stands guard.", summon.name));
                SummonAction::Guard {
                    uid,
                    name: summon.name.clone(),
                }
            };

            turn.actions.push(action);
        }

        turn
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::SequenceRng;
    use crate::util::dice::DiceExpr;
    use crate::util::element::Element;
    use proptest::prelude::*;

    fn wolf() -> SummonDef {
        SummonDef {
            id: "spirit_wolf".into(),
            name: "Spirit Wolf".into(),
            max_hp: 20,
            ac: 12,
            damage: DiceExpr::dice(1, 6, 2),
            damage_type: Element::Normal,
            attack_bonus: 3,
            duration: 4,
            flags: SummonFlags::CAN_ATTACK | SummonFlags::CAN_PROTECT,
            heal_amount: DiceExpr::flat(0),
            protect_chance: 1.0,
            moves: Vec::new(),
        }
    }

    fn sprite() -> SummonDef {
        SummonDef {
            id: "sprite".into(),
            name: "Healing Sprite".into(),
            max_hp: 10,
            flags: SummonFlags::CAN_HEAL,
            heal_amount: DiceExpr::flat(6),
            moves: Vec::new(),
            ..wolf()
        }
    }

    fn tables() -> ContentTables {
        ContentTables::new().with_summon(wolf()).with_summon(sprite())
    }

    fn spawn_wolf(manager: &mut SummonManager) -> SummonUid {
        manager
            .spawn(&tables(), "spirit_wolf", "hero", Side::Player, SummonOverrides::default())
            .unwrap()
            .summon
            .uid
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut manager = SummonManager::new(SummonConfig::default());
        let err = manager
            .spawn(&tables(), "dragon", "hero", Side::Player, SummonOverrides::default())
            .unwrap_err();
        assert_eq!(err, SummonError::UnknownSummon("dragon".into()));
        assert!(manager.all().is_empty());
    }

    #[test]
    fn cap_is_per_summoner() {
        let mut manager = SummonManager::new(SummonConfig::default());
        spawn_wolf(&mut manager);

        let err = manager
            .spawn(&tables(), "sprite", "hero", Side::Player, SummonOverrides::default())
            .unwrap_err();
        assert!(matches!(err, SummonError::MaxSummons { cap: 1, .. }));

        manager
            .spawn(&tables(), "spirit_wolf", "shaman", Side::Enemy, SummonOverrides::default())
            .unwrap();
        assert_eq!(manager.all().len(), 2);
    }

    #[test]
    fn overrides_replace_definition_fields() {
        let mut manager = SummonManager::new(SummonConfig::default());
        let report = manager
            .spawn(
                &tables(),
                "spirit_wolf",
                "hero",
                Side::Player,
                SummonOverrides {
                    name: Some("Fenrir".into()),
                    duration: Some(2),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(report.summon.name, "Fenrir");
        assert_eq!(report.summon.max_duration, 2);
        assert_eq!(report.summon.max_hp, 20);
    }

    #[test]
    fn expires_on_the_last_turn_not_before() {
        let mut manager = SummonManager::new(SummonConfig::default());
        let uid = spawn_wolf(&mut manager);
        let target = Combatant::new("slime", "Slime", 30);
        let mut rng = SequenceRng::constant(0.5);

        for expected in (1..4).rev() {
            let turn = manager.process_turn(Side::Player, &target, &mut rng);
            assert!(turn.expired.is_empty());
            assert_eq!(turn.actions.len(), 1);
            assert_eq!(manager.get(uid).unwrap().turns_remaining, expected);
        }

        let turn = manager.process_turn(Side::Player, &target, &mut rng);
        assert_eq!(turn.expired.len(), 1);
        assert_eq!(turn.expired[0].reason, DismissReason::Expired);
        assert!(turn.actions.is_empty());
        assert_eq!(manager.active_by_side(Side::Player).count(), 0);
    }

    #[test]
    fn healer_reports_heal_without_applying() {
        let mut manager = SummonManager::new(SummonConfig::default());
        manager
            .spawn(&tables(), "sprite", "hero", Side::Player, SummonOverrides::default())
            .unwrap();
        let target = Combatant::new("slime", "Slime", 30);

        let turn = manager.process_turn(Side::Player, &target, &mut SequenceRng::constant(0.0));
        assert!(matches!(
            turn.actions.as_slice(),
            [SummonAction::Heal { amount: 6, .. }]
        ));
    }

    #[test]
    fn other_side_is_untouched() {
        let mut manager = SummonManager::new(SummonConfig::default());
        let uid = spawn_wolf(&mut manager);
        let target = Combatant::new("hero", "Hero", 30);

        let turn = manager.process_turn(Side::Enemy, &target, &mut SequenceRng::constant(0.0));
        assert!(turn.actions.is_empty());
        assert_eq!(manager.get(uid).unwrap().turns_remaining, 4);
    }

    #[test]
    fn lethal_damage_kills_exactly_once() {
        let mut manager = SummonManager::new(SummonConfig::default());
        let uid = spawn_wolf(&mut manager);

        let hit = manager.take_damage(uid, 15).unwrap();
        assert_eq!(hit.hp, 5);
        assert!(hit.is_low_hp);
        assert!(hit.killed.is_none());

        let hit = manager.take_damage(uid, 99).unwrap();
        assert_eq!(hit.dealt, 5);
        assert_eq!(hit.killed.unwrap().reason, DismissReason::Killed);
        assert!(manager.take_damage(uid, 1).is_none());
    }

    #[test]
    fn heal_caps_at_max() {
        let mut manager = SummonManager::new(SummonConfig::default());
        let uid = spawn_wolf(&mut manager);
        manager.take_damage(uid, 4);
        assert_eq!(manager.heal(uid, 10), Some(4));
        assert_eq!(manager.get(uid).unwrap().hp, 20);
    }

    #[test]
    fn intercept_only_at_or_below_threshold() {
        let mut manager = SummonManager::new(SummonConfig::default());
        let uid = spawn_wolf(&mut manager);
        let mut rng = SequenceRng::constant(0.0);

        assert_eq!(manager.check_intercept("hero", 0.51, &mut rng), None);
        assert_eq!(manager.check_intercept("hero", 0.5, &mut rng), Some(uid));
        assert_eq!(manager.check_intercept("someone_else", 0.1, &mut rng), None);
    }

    proptest! {
        #[test]
        fn damage_never_underflows(hits in proptest::collection::vec(0u32..40, 1..10)) {
            let mut manager = SummonManager::new(SummonConfig::default());
            let uid = spawn_wolf(&mut manager);
            let mut kills = 0;
            for amount in hits {
                if let Some(hit) = manager.take_damage(uid, amount) {
                    prop_assert!(hit.hp <= 20);
                    if hit.killed.is_some() {
                        kills += 1;
                    }
                }
            }
            prop_assert!(kills <= 1);
            prop_assert_eq!(kills == 1, manager.get(uid).is_none());
        }

        #[test]
        fn no_intercept_above_threshold(ratio in 0.5001f32..=1.0, roll in 0.0f64..1.0) {
            let mut manager = SummonManager::new(SummonConfig::default());
            spawn_wolf(&mut manager);
            let mut rng = SequenceRng::constant(roll);
            prop_assert_eq!(manager.check_intercept("hero", ratio, &mut rng), None);
        }
    }
}
