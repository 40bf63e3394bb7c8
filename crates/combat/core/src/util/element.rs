//! Elemental types and the type-effectiveness chart.

/// Elemental type of a move, summon attack or combatant.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
    strum::EnumIter,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum Element {
    #[default]
    Normal,
    Fire,
    Water,
    Grass,
    Electric,
    Ice,
    Earth,
    Wind,
    Poison,
    Psychic,
    Ghost,
    Light,
    Dark,
}

/// Coarse effectiveness band used for feedback text.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[strum(serialize_all = "snake_case")]
pub enum Effectiveness {
    Immune,
    NotVeryEffective,
    Normal,
    SuperEffective,
}

impl Effectiveness {
    pub fn from_multiplier(multiplier: f32) -> Self {
        if multiplier <= 0.0 {
            Self::Immune
        } else if multiplier < 1.0 {
            Self::NotVeryEffective
        } else if multiplier > 1.0 {
            Self::SuperEffective
        } else {
            Self::Normal
        }
    }

    /// Battle-log line for this band, if it deserves one.
    pub fn message(&self) -> Option<&'static str> {
        match self {
            Self::Immune => Some("It had no effect..."),
            Self::NotVeryEffective => Some("It's not very effective..."),
            Self::SuperEffective => Some("It's super effective!"),
            Self::Normal => None,
        }
    }
}

/// Multiplier for a single attacking element against a single defending element.
///
/// Values are one of `0`, `0.5`, `1` or `2`.
pub fn matchup(attack: Element, defend: Element) -> f32 {
    use Element::*;
    match (attack, defend) {
        (Normal, Ghost) | (Ghost, Normal) => 0.0,
        (Electric, Earth) => 0.0,
        (Earth, Wind) => 0.0,
        (Poison, Light) => 0.0,

        (Fire, Grass) | (Fire, Ice) => 2.0,
        (Water, Fire) | (Water, Earth) => 2.0,
        (Grass, Water) | (Grass, Earth) => 2.0,
        (Electric, Water) | (Electric, Wind) => 2.0,
        (Ice, Grass) | (Ice, Wind) | (Ice, Earth) => 2.0,
        (Earth, Fire) | (Earth, Electric) | (Earth, Poison) => 2.0,
        (Wind, Grass) => 2.0,
        (Poison, Grass) => 2.0,
        (Psychic, Poison) => 2.0,
        (Ghost, Psychic) | (Ghost, Ghost) => 2.0,
        (Light, Dark) | (Light, Ghost) => 2.0,
        (Dark, Psychic) | (Dark, Light) => 2.0,

        (Fire, Fire) | (Fire, Water) => 0.5,
        (Water, Water) | (Water, Grass) => 0.5,
        (Grass, Fire) | (Grass, Grass) | (Grass, Wind) | (Grass, Poison) => 0.5,
        (Electric, Electric) | (Electric, Grass) => 0.5,
        (Ice, Fire) | (Ice, Ice) | (Ice, Water) => 0.5,
        (Earth, Grass) => 0.5,
        (Wind, Electric) | (Wind, Earth) => 0.5,
        (Poison, Poison) | (Poison, Earth) | (Poison, Ghost) => 0.5,
        (Psychic, Psychic) | (Psychic, Light) => 0.5,
        (Ghost, Dark) => 0.5,
        (Light, Light) | (Light, Fire) => 0.5,
        (Dark, Dark) => 0.5,

        _ => 1.0,
    }
}

/// Combined multiplier against a defender with one or more types.
///
/// An untyped defender takes neutral damage.
pub fn effectiveness(attack: Element, defender_types: &[Element]) -> f32 {
    defender_types
        .iter()
        .fold(1.0, |acc, &defend| acc * matchup(attack, defend))
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn chart_only_uses_canonical_multipliers() {
        for attack in Element::iter() {
            for defend in Element::iter() {
                let m = matchup(attack, defend);
                assert!([0.0, 0.5, 1.0, 2.0].contains(&m), "{attack} vs {defend} = {m}");
            }
        }
    }

    #[test]
    fn dual_types_multiply() {
        assert_eq!(effectiveness(Element::Ice, &[Element::Grass, Element::Wind]), 4.0);
        assert_eq!(effectiveness(Element::Electric, &[Element::Water, Element::Earth]), 0.0);
        assert_eq!(effectiveness(Element::Fire, &[]), 1.0);
    }

    #[test]
    fn parses_from_content_strings() {
        assert_eq!("FIRE".parse::<Element>(), Ok(Element::Fire));
        assert_eq!(
            Effectiveness::from_multiplier(2.0),
            Effectiveness::SuperEffective
        );
    }
}
