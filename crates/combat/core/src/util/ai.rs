//! Move-selection helpers shared by battle styles and the intent system.

use crate::env::{ContentTables, RandomSource, SkillDef, SkillEffect};
use crate::util::element::effectiveness;

/// Pick one item with probability proportional to its weight.
///
/// Non-positive weights are never chosen. Returns `None` when nothing has
/// positive weight.
pub fn weighted_choice<'a, T>(rng: &mut dyn RandomSource, options: &'a [(T, f32)]) -> Option<&'a T> {
    let total: f32 = options.iter().map(|(_, w)| w.max(0.0)).sum();
    if total <= 0.0 {
        return None;
    }
    let mut target = rng.next_f64() as f32 * total;
    for (item, weight) in options {
        let weight = weight.max(0.0);
        if weight <= 0.0 {
            continue;
        }
        if target < weight {
            return Some(item);
        }
        target -= weight;
    }
    options.iter().rev().find(|(_, w)| *w > 0.0).map(|(item, _)| item)
}

/// First healing skill among the given moves.
pub fn find_heal_move<'a>(moves: impl IntoIterator<Item = &'a SkillDef>) -> Option<&'a SkillDef> {
    moves
        .into_iter()
        .find(|skill| matches!(skill.effect, SkillEffect::Heal { .. }))
}

/// Weight a damaging move by how well it matches up against the defender.
///
/// Immune matchups get zero weight, super-effective ones are favoured.
pub fn matchup_weight(skill: &SkillDef, defender_elements: &[crate::util::element::Element]) -> f32 {
    match &skill.effect {
        SkillEffect::Damage { power, .. } => {
            let multiplier = effectiveness(skill.element, defender_elements);
            multiplier * (*power).max(1) as f32
        }
        // Non-damaging moves keep a small constant weight so they still show up.
        _ => 20.0,
    }
}

/// Choose a move id from a moveset, weighted by matchup against the defender.
///
/// `usable` filters out moves the caller cannot pay for. Returns `None` when
/// no move qualifies.
pub fn pick_weighted_move<'a>(
    rng: &mut dyn RandomSource,
    tables: &'a ContentTables,
    move_ids: &[String],
    defender_elements: &[crate::util::element::Element],
    mut usable: impl FnMut(&SkillDef) -> bool,
) -> Option<&'a SkillDef> {
    let options: Vec<(&SkillDef, f32)> = move_ids
        .iter()
        .filter_map(|id| tables.skill(id))
        .filter(|skill| usable(skill))
        .map(|skill| (skill, matchup_weight(skill, defender_elements)))
        .collect();
    weighted_choice(rng, &options).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::SequenceRng;
    use crate::util::dice::DiceExpr;
    use crate::util::element::Element;

    fn damage(id: &str, element: Element, power: u32) -> SkillDef {
        SkillDef {
            id: id.into(),
            name: id.into(),
            element,
            accuracy: None,
            pp: None,
            ap_cost: 2,
            heavy: false,
            timed: false,
            sfx: None,
            effect: SkillEffect::Damage {
                power,
                dice: DiceExpr::dice(1, 6, 0),
                hits: 1,
                rider: None,
            },
        }
    }

    #[test]
    fn weighted_choice_respects_bands() {
        let options = [("a", 1.0), ("b", 3.0)];
        assert_eq!(weighted_choice(&mut SequenceRng::constant(0.1), &options), Some(&"a"));
        assert_eq!(weighted_choice(&mut SequenceRng::constant(0.5), &options), Some(&"b"));
    }

    #[test]
    fn zero_weights_are_skipped() {
        let options = [("immune", 0.0), ("ok", 1.0)];
        assert_eq!(weighted_choice(&mut SequenceRng::constant(0.0), &options), Some(&"ok"));
        let none: [(&str, f32); 1] = [("x", 0.0)];
        assert_eq!(weighted_choice(&mut SequenceRng::constant(0.0), &none), None);
    }

    #[test]
    fn immune_moves_are_never_picked() {
        let tables = ContentTables::new()
            .with_skill(damage("shock", Element::Electric, 90))
            .with_skill(damage("splash", Element::Water, 40));
        let moves = vec!["shock".to_string(), "splash".to_string()];
        for roll in [0.0, 0.3, 0.6, 0.99] {
            let pick = pick_weighted_move(
                &mut SequenceRng::constant(roll),
                &tables,
                &moves,
                &[Element::Earth],
                |_| true,
            );
            assert_eq!(pick.map(|s| s.id.as_str()), Some("splash"));
        }
    }
}
