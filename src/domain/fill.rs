//! Staged position fills.
//!
//! A position is built up in quarter steps of its target dollars. The
//! initial step comes from the entry-quality tier; later steps are taken
//! one at a time when an [`AddOnTrigger`] fires.

use crate::domain::quality::Rating;
use crate::domain::trend::MomentumState;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum FillLevel {
    Zero,
    Quarter,
    Half,
    ThreeQuarters,
    Full,
}

impl FillLevel {
    pub fn pct(self) -> u32 {
        match self {
            FillLevel::Zero => 0,
            FillLevel::Quarter => 25,
            FillLevel::Half => 50,
            FillLevel::ThreeQuarters => 75,
            FillLevel::Full => 100,
        }
    }

    pub fn fraction(self) -> f64 {
        self.pct() as f64 / 100.0
    }

    pub fn from_pct(pct: u32) -> Option<Self> {
        match pct {
            0 => Some(FillLevel::Zero),
            25 => Some(FillLevel::Quarter),
            50 => Some(FillLevel::Half),
            75 => Some(FillLevel::ThreeQuarters),
            100 => Some(FillLevel::Full),
            _ => None,
        }
    }

    /// Next tier up; `Full` stays `Full`.
    pub fn next(self) -> Self {
        match self {
            FillLevel::Zero => FillLevel::Quarter,
            FillLevel::Quarter => FillLevel::Half,
            FillLevel::Half => FillLevel::ThreeQuarters,
            FillLevel::ThreeQuarters | FillLevel::Full => FillLevel::Full,
        }
    }

    pub fn is_full(self) -> bool {
        self == FillLevel::Full
    }
}

impl fmt::Display for FillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}%", self.pct())
    }
}

/// Initial fill per entry-quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FillTiers {
    pub excellent: FillLevel,
    pub good: FillLevel,
    pub ok: FillLevel,
    pub caution: FillLevel,
}

impl Default for FillTiers {
    fn default() -> Self {
        FillTiers {
            excellent: FillLevel::Full,
            good: FillLevel::ThreeQuarters,
            ok: FillLevel::Half,
            caution: FillLevel::Half,
        }
    }
}

impl FillTiers {
    pub fn for_rating(&self, rating: Rating) -> FillLevel {
        match rating {
            Rating::Excellent => self.excellent,
            Rating::Good => self.good,
            Rating::Ok => self.ok,
            _ => self.caution,
        }
    }
}

/// Per-ticker price band used to scale the opening fill.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PriceTarget {
    pub low: f64,
    pub high: f64,
}

/// Opening fill: the tier's level, one step up below `low`, a quarter above `high`.
pub fn initial_fill(
    rating: Rating,
    price: f64,
    target: Option<&PriceTarget>,
    tiers: &FillTiers,
) -> FillLevel {
    let base = tiers.for_rating(rating);
    match target {
        Some(t) if price > t.high => FillLevel::Quarter,
        Some(t) if price < t.low => base.next(),
        _ => base,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum AddOnTrigger {
    /// Momentum moved from P2 or N1 last week to P1 this week.
    MomentumConfirmed,
    /// Entered at OK or worse, now rated GOOD or better while P1.
    QualityUpgraded,
}

impl fmt::Display for AddOnTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddOnTrigger::MomentumConfirmed => write!(f, "momentum-confirmed"),
            AddOnTrigger::QualityUpgraded => write!(f, "quality-upgraded"),
        }
    }
}

pub fn detect_add_on(
    previous: Option<MomentumState>,
    current: MomentumState,
    entry_rating: Rating,
    current_rating: Option<Rating>,
) -> Option<AddOnTrigger> {
    if current != MomentumState::P1 {
        return None;
    }
    if matches!(previous, Some(MomentumState::P2) | Some(MomentumState::N1)) {
        return Some(AddOnTrigger::MomentumConfirmed);
    }
    let entered_weak = matches!(entry_rating, Rating::Ok | Rating::Caution);
    let now_strong = current_rating.is_some_and(|r| r.is_accessible());
    if entered_weak && now_strong {
        return Some(AddOnTrigger::QualityUpgraded);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_step_in_quarters() {
        assert_eq!(FillLevel::Zero.next(), FillLevel::Quarter);
        assert_eq!(FillLevel::Half.next(), FillLevel::ThreeQuarters);
        assert_eq!(FillLevel::Full.next(), FillLevel::Full);
        assert_eq!(FillLevel::from_pct(75), Some(FillLevel::ThreeQuarters));
        assert_eq!(FillLevel::from_pct(60), None);
    }

    #[test]
    fn default_tiers() {
        let tiers = FillTiers::default();
        assert_eq!(tiers.for_rating(Rating::Excellent), FillLevel::Full);
        assert_eq!(tiers.for_rating(Rating::Good), FillLevel::ThreeQuarters);
        assert_eq!(tiers.for_rating(Rating::Ok), FillLevel::Half);
        assert_eq!(tiers.for_rating(Rating::Caution), FillLevel::Half);
    }

    #[test]
    fn price_target_adjusts_opening_fill() {
        let tiers = FillTiers::default();
        let target = PriceTarget {
            low: 140.0,
            high: 160.0,
        };
        assert_eq!(
            initial_fill(Rating::Good, 150.0, Some(&target), &tiers),
            FillLevel::ThreeQuarters
        );
        assert_eq!(
            initial_fill(Rating::Good, 135.0, Some(&target), &tiers),
            FillLevel::Full
        );
        assert_eq!(
            initial_fill(Rating::Excellent, 165.0, Some(&target), &tiers),
            FillLevel::Quarter
        );
        assert_eq!(initial_fill(Rating::Ok, 165.0, None, &tiers), FillLevel::Half);
    }

    #[test]
    fn momentum_confirmation_trigger() {
        let trigger = detect_add_on(
            Some(MomentumState::P2),
            MomentumState::P1,
            Rating::Excellent,
            None,
        );
        assert_eq!(trigger, Some(AddOnTrigger::MomentumConfirmed));
        assert_eq!(
            detect_add_on(
                Some(MomentumState::P1),
                MomentumState::P1,
                Rating::Excellent,
                Some(Rating::Excellent)
            ),
            None
        );
    }

    #[test]
    fn quality_upgrade_trigger() {
        assert_eq!(
            detect_add_on(
                Some(MomentumState::P1),
                MomentumState::P1,
                Rating::Ok,
                Some(Rating::Good)
            ),
            Some(AddOnTrigger::QualityUpgraded)
        );
        assert_eq!(
            detect_add_on(
                Some(MomentumState::P2),
                MomentumState::P2,
                Rating::Caution,
                Some(Rating::Excellent)
            ),
            None
        );
    }
}
