//! Timing zones and the thresholds that map marker distance to a tier.
//!
//! The marker travels along `[0, 100]`; the target is the center (50). A
//! tier is chosen from the absolute distance to the center against nested
//! bands, narrowest first:
//!
//! ```text
//! distance <= perfect  → Perfect
//! distance <= good     → Good     (legacy: "success")
//! distance <= normal   → Normal   (legacy: "partial")
//! otherwise            → Bad      (legacy: "miss")
//! ```
//!
//! Boundaries are inclusive on the inner edge.

use crate::config::QteConfig;

/// Center of the timing bar.
pub const CENTER: f32 = 50.0;

/// Which modifier tables and zone semantics a battle uses.
///
/// Chosen once in configuration; never switched mid-battle.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::EnumString,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum QteRuleset {
    /// Bands derived from the success width by ratio; tiers named perfect/success/partial/miss.
    Legacy,
    /// Absolute distance ladder; tiers named perfect/good/normal/bad.
    #[default]
    Finalized,
}

/// Graded timing outcome, best first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Zone {
    Perfect,
    Good,
    Normal,
    Bad,
}

impl Zone {
    pub const ALL: [Zone; 4] = [Zone::Perfect, Zone::Good, Zone::Normal, Zone::Bad];

    /// 0 for perfect up to 3 for bad.
    pub const fn strictness(&self) -> u8 {
        match self {
            Self::Perfect => 0,
            Self::Good => 1,
            Self::Normal => 2,
            Self::Bad => 3,
        }
    }

    /// Whether the input counts as a landed hit.
    pub const fn landed(&self) -> bool {
        !matches!(self, Self::Bad)
    }

    /// Tier name under the given ruleset.
    pub const fn label(&self, ruleset: QteRuleset) -> &'static str {
        match (ruleset, self) {
            (_, Self::Perfect) => "perfect",
            (QteRuleset::Legacy, Self::Good) => "success",
            (QteRuleset::Legacy, Self::Normal) => "partial",
            (QteRuleset::Legacy, Self::Bad) => "miss",
            (QteRuleset::Finalized, Self::Good) => "good",
            (QteRuleset::Finalized, Self::Normal) => "normal",
            (QteRuleset::Finalized, Self::Bad) => "bad",
        }
    }
}

/// Nested distance thresholds. Invariant: `perfect < good < normal`.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ZoneThresholds {
    pub perfect: f32,
    pub good: f32,
    pub normal: f32,
}

impl ZoneThresholds {
    /// Thresholds for a ruleset, before difficulty scaling.
    pub fn for_ruleset(config: &QteConfig, ruleset: QteRuleset) -> Self {
        match ruleset {
            QteRuleset::Legacy => {
                let success = config.legacy.success_width;
                Self::ordered(
                    success * config.legacy.perfect_ratio,
                    success,
                    success * config.legacy.partial_ratio,
                )
            }
            QteRuleset::Finalized => Self::ordered(
                config.ladder.perfect,
                config.ladder.good,
                config.ladder.normal,
            ),
        }
    }

    /// Build thresholds, forcing each band to be strictly wider than the previous.
    pub fn ordered(perfect: f32, good: f32, normal: f32) -> Self {
        let perfect = perfect.max(0.0);
        let good = good.max(perfect + f32::EPSILON * 100.0);
        let normal = normal.max(good + f32::EPSILON * 100.0);
        Self {
            perfect,
            good,
            normal,
        }
    }

    /// Scale every band, keeping the nesting.
    #[must_use]
    pub fn scaled(&self, factor: f32) -> Self {
        let factor = factor.max(0.0);
        Self::ordered(
            self.perfect * factor,
            self.good * factor,
            self.normal * factor,
        )
    }

    pub fn zone_for_distance(&self, distance: f32) -> Zone {
        let distance = distance.abs();
        if distance <= self.perfect {
            Zone::Perfect
        } else if distance <= self.good {
            Zone::Good
        } else if distance <= self.normal {
            Zone::Normal
        } else {
            Zone::Bad
        }
    }

    /// Tier for a marker position on the `[0, 100]` bar.
    pub fn zone_for_position(&self, position: f32) -> Zone {
        self.zone_for_distance(position.clamp(0.0, 100.0) - CENTER)
    }

    /// `(start, end)` bar coordinates of each band for drawing.
    pub fn bands(&self) -> [(Zone, f32, f32); 3] {
        let band = |half: f32| ((CENTER - half).max(0.0), (CENTER + half).min(100.0));
        let (ps, pe) = band(self.perfect);
        let (gs, ge) = band(self.good);
        let (ns, ne) = band(self.normal);
        [
            (Zone::Perfect, ps, pe),
            (Zone::Good, gs, ge),
            (Zone::Normal, ns, ne),
        ]
    }
}
