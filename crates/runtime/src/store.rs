//! In-memory battle state store.
//!
//! [`MemoryStore`] owns both combatants, stagger meters, the limit-break
//! gauge and the active terrain. It is the only place combatant state is
//! mutated; rules code reaches it through the [`BattleStore`] trait.

use combat_core::util::has_action_denial;
use combat_core::{
    BattleStore, Combatant, DamageMeta, DamageSource, Element, PcgRng, RandomSource, Side,
    StatusApplication, StatusEffect, StatusKind, TerrainDef,
};

/// Tuning for the store's own rules (stagger, limit gauge, status upkeep).
#[derive(Clone, Debug, PartialEq)]
pub struct StoreConfig {
    /// Stagger at which a combatant is stunned for a turn.
    pub stagger_threshold: u32,
    /// Limit gauge needed for a limit break.
    pub limit_max: u32,
    /// Turns a freshly applied status lasts.
    pub status_turns: u32,
    pub max_stacks: u32,
    /// Damage per stack dealt by poison, burn and bleed at round start.
    pub dot_per_stack: u32,
    /// HP restored per regen stack at round start.
    pub regen_per_stack: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            stagger_threshold: 100,
            limit_max: 100,
            status_turns: 3,
            max_stacks: 5,
            dot_per_stack: 3,
            regen_per_stack: 4,
        }
    }
}

/// Battle state for one player and one enemy.
#[derive(Clone, Debug)]
pub struct MemoryStore {
    config: StoreConfig,
    player: Combatant,
    enemy: Combatant,
    stagger: [u32; 2],
    limit_gauge: u32,
    terrain: Option<TerrainDef>,
    /// Drives status-application rolls only; rules rolls use the session's source.
    rng: PcgRng,
    sfx: Vec<String>,
}

const fn slot(side: Side) -> usize {
    match side {
        Side::Player => 0,
        Side::Enemy => 1,
    }
}

impl MemoryStore {
    pub fn new(player: Combatant, enemy: Combatant, seed: u64) -> Self {
        Self {
            config: StoreConfig::default(),
            player,
            enemy,
            stagger: [0; 2],
            limit_gauge: 0,
            terrain: None,
            rng: PcgRng::new(seed),
            sfx: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn with_terrain(mut self, terrain: Option<TerrainDef>) -> Self {
        self.terrain = terrain;
        self
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn combatant_mut(&mut self, side: Side) -> &mut Combatant {
        match side {
            Side::Player => &mut self.player,
            Side::Enemy => &mut self.enemy,
        }
    }

    pub fn stagger(&self, side: Side) -> u32 {
        self.stagger[slot(side)]
    }

    pub fn limit_gauge(&self) -> u32 {
        self.limit_gauge
    }

    /// Fill the limit gauge directly (scripted charges, tests).
    pub fn charge_limit(&mut self, amount: u32) {
        self.limit_gauge = (self.limit_gauge + amount).min(self.config.limit_max);
    }

    pub fn terrain_def(&self) -> Option<&TerrainDef> {
        self.terrain.as_ref()
    }

    /// Sound effects requested so far, oldest first.
    pub fn sfx(&self) -> &[String] {
        &self.sfx
    }

    /// Round-start status upkeep for one side.
    ///
    /// Damage-over-time and regen resolve first, then every status loses a
    /// turn and expired ones are removed.
    pub fn tick_statuses(&mut self, side: Side) -> Vec<String> {
        let config = self.config.clone();
        let combatant = self.combatant_mut(side);
        let mut messages = Vec::new();
        if !combatant.is_alive() {
            return messages;
        }

        for status in combatant.statuses.clone() {
            match status.kind {
                StatusKind::Poison | StatusKind::Burn | StatusKind::Bleed => {
                    let dealt = (status.stacks * config.dot_per_stack).min(combatant.hp);
                    combatant.hp -= dealt;
                    messages.push(format!(
                        "{} takes {} damage from {}.",
                        combatant.name, dealt, status.kind
                    ));
                }
                StatusKind::Regen => {
                    let healed = (status.stacks * config.regen_per_stack)
                        .min(combatant.max_hp - combatant.hp);
                    combatant.hp += healed;
                    messages.push(format!("{} regenerates {} HP.", combatant.name, healed));
                }
                _ => {}
            }
        }

        let name = combatant.name.clone();
        combatant.statuses.retain_mut(|status| {
            status.turns_remaining = status.turns_remaining.saturating_sub(1);
            if status.turns_remaining == 0 {
                messages.push(format!("{}'s {} wore off.", name, status.kind));
                return false;
            }
            true
        });
        messages
    }

    fn take_damage(&mut self, side: Side, amount: u32, meta: &DamageMeta) -> u32 {
        let combatant = self.combatant_mut(side);
        let dealt = amount.min(combatant.hp);
        combatant.hp -= dealt;
        tracing::debug!(
            side = %side,
            dealt,
            hp = combatant.hp,
            source = ?meta.source,
            critical = meta.critical,
            "damage applied"
        );

        // The gauge fills from damage the player takes and, at half rate, deals.
        let charge = match (side, &meta.source) {
            (_, DamageSource::LimitBreak) => 0,
            (Side::Player, _) => dealt,
            (Side::Enemy, _) => dealt / 2,
        };
        self.charge_limit(charge);
        dealt
    }

    fn restore(&mut self, side: Side, amount: u32, source: &str) -> u32 {
        let combatant = self.combatant_mut(side);
        if !combatant.is_alive() {
            return 0;
        }
        let healed = amount.min(combatant.max_hp - combatant.hp);
        combatant.hp += healed;
        tracing::debug!(side = %side, healed, source, "heal applied");
        healed
    }
}

impl BattleStore for MemoryStore {
    fn player(&self) -> &Combatant {
        &self.player
    }

    fn enemy(&self) -> &Combatant {
        &self.enemy
    }

    fn damage_player(&mut self, amount: u32, meta: &DamageMeta) -> u32 {
        self.take_damage(Side::Player, amount, meta)
    }

    fn damage_enemy(&mut self, amount: u32, meta: &DamageMeta) -> u32 {
        self.take_damage(Side::Enemy, amount, meta)
    }

    fn heal_player(&mut self, amount: u32, source: &str) -> u32 {
        self.restore(Side::Player, amount, source)
    }

    fn heal_enemy(&mut self, amount: u32, source: &str) -> u32 {
        self.restore(Side::Enemy, amount, source)
    }

    fn apply_status(&mut self, target: Side, kind: StatusKind, stacks: u32) -> StatusApplication {
        let turns = self.config.status_turns;
        let max_stacks = self.config.max_stacks;
        let combatant = self.combatant_mut(target);

        if !combatant.is_alive() || stacks == 0 {
            return StatusApplication {
                applied: false,
                message: String::new(),
            };
        }

        let message = match combatant.statuses.iter_mut().find(|s| s.kind == kind) {
            Some(existing) => {
                existing.stacks = (existing.stacks + stacks).min(max_stacks);
                existing.turns_remaining = existing.turns_remaining.max(turns);
                format!("{}'s {} intensifies! (x{})", combatant.name, kind, existing.stacks)
            }
            None => {
                combatant
                    .statuses
                    .push(StatusEffect::new(kind, stacks.min(max_stacks), turns));
                if kind.is_buff() {
                    format!("{} gains {}!", combatant.name, kind)
                } else {
                    format!("{} is afflicted with {}!", combatant.name, kind)
                }
            }
        };

        StatusApplication {
            applied: true,
            message,
        }
    }

    fn should_apply_status(&mut self, chance: f32) -> bool {
        self.rng.chance(chance as f64)
    }

    fn add_stagger(&mut self, target: Side, amount: u32) -> StatusApplication {
        let threshold = self.config.stagger_threshold;
        let meter = &mut self.stagger[slot(target)];
        *meter += amount;
        if threshold == 0 || *meter < threshold {
            return StatusApplication {
                applied: false,
                message: String::new(),
            };
        }
        *meter = 0;

        // The player is staggered on the enemy's turn and round upkeep ticks
        // before they act again, so their stun has to outlast one tick.
        let turns = match target {
            Side::Player => 2,
            Side::Enemy => 1,
        };
        let combatant = self.combatant_mut(target);
        tracing::debug!(side = %target, "{} is staggered", combatant.name);
        match combatant
            .statuses
            .iter_mut()
            .find(|s| s.kind == StatusKind::Stun)
        {
            Some(stun) => stun.turns_remaining = stun.turns_remaining.max(turns),
            None => combatant
                .statuses
                .push(StatusEffect::new(StatusKind::Stun, 1, turns)),
        }
        StatusApplication {
            applied: true,
            message: format!("{} is staggered!", combatant.name),
        }
    }

    fn can_act(&self, target: Side) -> bool {
        !has_action_denial(&self.combatant(target).statuses)
    }

    fn cannot_act_message(&self, target: Side, name: &str) -> String {
        let denial = self
            .combatant(target)
            .statuses
            .iter()
            .find(|s| s.stacks > 0 && s.kind.prevents_action())
            .map(|s| s.kind);
        match denial {
            Some(StatusKind::Sleep) => format!("{name} is fast asleep!"),
            Some(StatusKind::Freeze) => format!("{name} is frozen solid!"),
            _ => format!("{name} is stunned and cannot act!"),
        }
    }

    fn terrain(&self) -> Option<&str> {
        self.terrain.as_ref().map(|t| t.id.as_str())
    }

    fn terrain_multiplier(&self, element: Element) -> f32 {
        self.terrain
            .as_ref()
            .map_or(1.0, |t| t.multiplier(element))
    }

    fn terrain_accuracy_penalty(&self) -> i32 {
        self.terrain.as_ref().map_or(0, |t| t.accuracy_penalty)
    }

    fn is_limit_ready(&self) -> bool {
        self.limit_gauge >= self.config.limit_max
    }

    fn use_limit_charge(&mut self) {
        self.limit_gauge = 0;
    }

    fn play_sfx(&mut self, id: &str) {
        tracing::trace!(sfx = id, "play sfx");
        self.sfx.push(id.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> MemoryStore {
        MemoryStore::new(
            Combatant::new("hero", "Hero", 50),
            Combatant::new("slime", "Slime", 30),
            7,
        )
    }

    fn hit() -> DamageMeta {
        DamageMeta::new(DamageSource::Attack, Element::Normal)
    }

    #[test]
    fn damage_clamps_and_charges_limit() {
        let mut store = store();
        assert_eq!(store.damage_player(80, &hit()), 50);
        assert_eq!(store.player().hp, 0);
        assert_eq!(store.limit_gauge(), 50);

        assert_eq!(store.damage_enemy(10, &hit()), 10);
        assert_eq!(store.limit_gauge(), 55);
    }

    #[test]
    fn heal_caps_at_max_and_skips_the_fallen() {
        let mut store = store();
        store.damage_enemy(10, &hit());
        assert_eq!(store.heal_enemy(25, "mend"), 10);

        store.damage_player(50, &hit());
        assert_eq!(store.heal_player(10, "mend"), 0);
    }

    #[test]
    fn reapplying_a_status_stacks_it() {
        let mut store = store();
        let first = store.apply_status(Side::Enemy, StatusKind::Poison, 2);
        assert!(first.applied);
        assert!(first.message.contains("afflicted"));
        store.apply_status(Side::Enemy, StatusKind::Poison, 9);
        let poison = store.enemy().statuses[0];
        assert_eq!(poison.stacks, 5);
        assert_eq!(store.enemy().statuses.len(), 1);
    }

    #[test]
    fn stagger_threshold_stuns_once() {
        let mut store = store();
        assert!(!store.add_stagger(Side::Enemy, 60).applied);
        assert!(store.can_act(Side::Enemy));
        let stagger = store.add_stagger(Side::Enemy, 60);
        assert!(stagger.applied);
        assert!(stagger.message.contains("staggered"));
        assert!(!store.can_act(Side::Enemy));
        assert_eq!(store.stagger(Side::Enemy), 0);
        assert!(
            store
                .cannot_act_message(Side::Enemy, "Slime")
                .contains("stunned")
        );
    }

    #[test]
    fn staggered_player_stays_stunned_through_upkeep() {
        let mut store = store();
        assert!(store.add_stagger(Side::Player, 1000).applied);
        assert!(!store.can_act(Side::Player));

        store.tick_statuses(Side::Player);
        assert!(!store.can_act(Side::Player));

        store.tick_statuses(Side::Player);
        assert!(store.can_act(Side::Player));
    }

    #[test]
    fn staggered_enemy_recovers_at_upkeep() {
        let mut store = store();
        store.add_stagger(Side::Enemy, 1000);
        assert!(!store.can_act(Side::Enemy));
        store.tick_statuses(Side::Enemy);
        assert!(store.can_act(Side::Enemy));
    }

    #[test]
    fn statuses_tick_down_and_expire() {
        let mut store = store();
        store.apply_status(Side::Player, StatusKind::Burn, 1);
        let mut burned = 0;
        for _ in 0..3 {
            let messages = store.tick_statuses(Side::Player);
            burned += messages.iter().filter(|m| m.contains("burn")).count();
        }
        assert_eq!(store.player().hp, 50 - 9);
        assert!(store.player().statuses.is_empty());
        assert!(burned >= 3);
    }

    #[test]
    fn terrain_scales_elements() {
        let store = store().with_terrain(Some(TerrainDef {
            id: "volcano".into(),
            name: "Volcano".into(),
            multipliers: vec![(Element::Fire, 1.5)],
            accuracy_penalty: 2,
        }));
        assert_eq!(store.terrain(), Some("volcano"));
        assert_eq!(store.terrain_multiplier(Element::Fire), 1.5);
        assert_eq!(store.terrain_multiplier(Element::Water), 1.0);
        assert_eq!(store.terrain_accuracy_penalty(), 2);
    }

    #[test]
    fn limit_charge_is_consumed() {
        let mut store = store();
        store.charge_limit(500);
        assert!(store.is_limit_ready());
        store.use_limit_charge();
        assert!(!store.is_limit_ready());
    }

    proptest::proptest! {
        #[test]
        fn hp_stays_within_bounds(ops in proptest::collection::vec((0u32..80, proptest::bool::ANY), 0..40)) {
            let mut store = store();
            for (amount, heal) in ops {
                if heal {
                    store.heal(Side::Player, amount, "potion");
                } else {
                    let dealt = store.damage(Side::Player, amount, &hit());
                    proptest::prop_assert!(dealt <= amount);
                }
                let player = store.player();
                proptest::prop_assert!(player.hp <= player.max_hp);
                proptest::prop_assert!(store.limit_gauge() <= store.config().limit_max);
            }
        }
    }
}
