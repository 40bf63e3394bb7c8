//! Dice expressions (`NdM±K` or a flat integer).
//!
//! Every damage and heal amount in content tables is a [`DiceExpr`]. Expressions
//! are parsed once, when content is loaded, and rolled through a
//! [`RandomSource`](crate::env::RandomSource) so tests can force exact results.

use core::fmt;
use core::str::FromStr;

use crate::env::RandomSource;
use crate::error::{CombatError, ErrorSeverity};

/// Upper bounds that keep malformed content from producing absurd rolls.
const MAX_DICE: u32 = 100;
const MAX_SIDES: u32 = 1000;

/// Errors produced while parsing a dice string.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DiceError {
    #[error("empty dice expression")]
    Empty,

    #[error("malformed dice expression '{0}'")]
    Malformed(String),

    #[error("dice expression '{0}' is out of range")]
    OutOfRange(String),
}

impl CombatError for DiceError {
    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Validation
    }

    fn error_code(&self) -> &'static str {
        match self {
            Self::Empty => "DICE_EMPTY",
            Self::Malformed(_) => "DICE_MALFORMED",
            Self::OutOfRange(_) => "DICE_OUT_OF_RANGE",
        }
    }
}

/// A parsed dice expression.
///
/// # Syntax
///
/// ```text
/// 7        flat value
/// d6       one six-sided die
/// 2d6      two six-sided dice
/// 2d6+3    plus a flat modifier
/// 1d4-1    minus a flat modifier
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(try_from = "String", into = "String")
)]
pub enum DiceExpr {
    Flat(i32),
    Roll { count: u32, sides: u32, modifier: i32 },
}

impl DiceExpr {
    pub const fn flat(value: i32) -> Self {
        Self::Flat(value)
    }

    pub const fn dice(count: u32, sides: u32, modifier: i32) -> Self {
        Self::Roll {
            count,
            sides,
            modifier,
        }
    }

    /// Roll the expression. The result may be negative for expressions like `1d2-3`.
    pub fn roll(&self, rng: &mut dyn RandomSource) -> i32 {
        match *self {
            Self::Flat(value) => value,
            Self::Roll {
                count,
                sides,
                modifier,
            } => {
                let total: i32 = (0..count).map(|_| rng.roll_die(sides) as i32).sum();
                total + modifier
            }
        }
    }

    /// Roll and clamp at zero, the form damage and healing use.
    pub fn roll_amount(&self, rng: &mut dyn RandomSource) -> u32 {
        self.roll(rng).max(0) as u32
    }

    pub fn min(&self) -> i32 {
        match *self {
            Self::Flat(value) => value,
            Self::Roll {
                count, modifier, ..
            } => count as i32 + modifier,
        }
    }

    pub fn max(&self) -> i32 {
        match *self {
            Self::Flat(value) => value,
            Self::Roll {
                count,
                sides,
                modifier,
            } => (count * sides) as i32 + modifier,
        }
    }

    pub fn average(&self) -> f32 {
        (self.min() + self.max()) as f32 / 2.0
    }
}

impl Default for DiceExpr {
    fn default() -> Self {
        Self::Flat(0)
    }
}

impl FromStr for DiceExpr {
    type Err = DiceError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let text: String = raw.chars().filter(|c| !c.is_whitespace()).collect();
        if text.is_empty() {
            return Err(DiceError::Empty);
        }
        let malformed = || DiceError::Malformed(raw.to_string());

        let lower = text.to_ascii_lowercase();
        let Some(d_pos) = lower.find('d') else {
            return lower.parse::<i32>().map(Self::Flat).map_err(|_| malformed());
        };

        let count = match &lower[..d_pos] {
            "" => 1,
            digits => digits.parse::<u32>().map_err(|_| malformed())?,
        };

        let rest = &lower[d_pos + 1..];
        let (sides_part, modifier) = match rest.find(['+', '-']) {
            Some(sign_pos) => {
                let modifier = rest[sign_pos..].parse::<i32>().map_err(|_| malformed())?;
                (&rest[..sign_pos], modifier)
            }
            None => (rest, 0),
        };
        let sides = sides_part.parse::<u32>().map_err(|_| malformed())?;

        if count == 0 || sides == 0 || count > MAX_DICE || sides > MAX_SIDES {
            return Err(DiceError::OutOfRange(raw.to_string()));
        }

        Ok(Self::Roll {
            count,
            sides,
            modifier,
        })
    }
}

impl TryFrom<String> for DiceExpr {
    type Error = DiceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DiceExpr> for String {
    fn from(value: DiceExpr) -> Self {
        value.to_string()
    }
}

impl fmt::Display for DiceExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Flat(value) => write!(f, "{value}"),
            Self::Roll {
                count,
                sides,
                modifier,
            } => {
                write!(f, "{count}d{sides}")?;
                match modifier {
                    0 => Ok(()),
                    m if m > 0 => write!(f, "+{m}"),
                    m => write!(f, "{m}"),
                }
            }
        }
    }
}

/// Roll a dice string directly. Unparseable strings roll as zero.
///
/// Content is validated at load time, so this is only a convenience for
/// ad-hoc host code.
pub fn roll_str(expr: &str, rng: &mut dyn RandomSource) -> i32 {
    match expr.parse::<DiceExpr>() {
        Ok(dice) => dice.roll(rng),
        Err(err) => {
            tracing::warn!("cannot roll '{}': {}", expr, err);
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::{PcgRng, SequenceRng};
    use proptest::prelude::*;

    #[test]
    fn parses_all_forms() {
        assert_eq!("7".parse::<DiceExpr>(), Ok(DiceExpr::Flat(7)));
        assert_eq!("-2".parse::<DiceExpr>(), Ok(DiceExpr::Flat(-2)));
        assert_eq!("d6".parse::<DiceExpr>(), Ok(DiceExpr::dice(1, 6, 0)));
        assert_eq!("2d6+3".parse::<DiceExpr>(), Ok(DiceExpr::dice(2, 6, 3)));
        assert_eq!(" 1D4 - 1 ".parse::<DiceExpr>(), Ok(DiceExpr::dice(1, 4, -1)));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!("".parse::<DiceExpr>(), Err(DiceError::Empty));
        assert!(matches!("2x6".parse::<DiceExpr>(), Err(DiceError::Malformed(_))));
        assert!(matches!("2d".parse::<DiceExpr>(), Err(DiceError::Malformed(_))));
        assert!(matches!("0d6".parse::<DiceExpr>(), Err(DiceError::OutOfRange(_))));
    }

    #[test]
    fn display_matches_input_syntax() {
        assert_eq!(DiceExpr::dice(2, 6, 3).to_string(), "2d6+3");
        assert_eq!(DiceExpr::dice(1, 4, -1).to_string(), "1d4-1");
        assert_eq!(DiceExpr::Flat(5).to_string(), "5");
    }

    #[test]
    fn forced_rolls_are_exact() {
        let mut rng = SequenceRng::new(vec![SequenceRng::face(6, 6), SequenceRng::face(2, 6)]);
        assert_eq!(DiceExpr::dice(2, 6, 1).roll(&mut rng), 9);
    }

    #[test]
    fn roll_amount_never_negative() {
        let mut rng = SequenceRng::constant(0.0);
        assert_eq!(DiceExpr::dice(1, 2, -5).roll_amount(&mut rng), 0);
    }

    proptest! {
        #[test]
        fn rolls_stay_within_bounds(count in 1u32..10, sides in 1u32..20, modifier in -5i32..5, seed: u64) {
            let dice = DiceExpr::dice(count, sides, modifier);
            let mut rng = PcgRng::new(seed);
            let value = dice.roll(&mut rng);
            prop_assert!(value >= dice.min() && value <= dice.max());
        }
    }
}
