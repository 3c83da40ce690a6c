//! Support/resistance quality scoring.
//!
//! A level is scored by an ordered pipeline of rules over the security's
//! indicator snapshot:
//!
//! 1. extension (terminal: EXTENDED for buys, MISSED for sells)
//! 2. moving-average confluence
//! 3. volume backing
//! 4. base table lookup from (confluence, backing)
//! 5. RSI boost
//! 6. Bollinger boost
//! 7. boost application, clamped to CAUTION..=EXCELLENT
//!
//! Every rule contributes a factor string, in pipeline order.

use crate::domain::snapshot::IndicatorSnapshot;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct QualityConfig {
    pub extended_threshold_pct: f64,
    pub ma_tolerance_pct: f64,
    pub volume_tolerance_pct: f64,
    pub band_proximity_pct: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        QualityConfig {
            extended_threshold_pct: 10.0,
            ma_tolerance_pct: 1.0,
            volume_tolerance_pct: 1.5,
            band_proximity_pct: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Rating {
    Excellent,
    Good,
    Ok,
    Caution,
    Extended,
    Missed,
    NotApplicable,
}

impl Rating {
    /// Position on the CAUTION (0) to EXCELLENT (3) ladder; `None` off the ladder.
    pub fn tier(self) -> Option<u8> {
        match self {
            Rating::Caution => Some(0),
            Rating::Ok => Some(1),
            Rating::Good => Some(2),
            Rating::Excellent => Some(3),
            Rating::Extended | Rating::Missed | Rating::NotApplicable => None,
        }
    }

    pub fn from_tier(tier: u8) -> Rating {
        match tier {
            0 => Rating::Caution,
            1 => Rating::Ok,
            2 => Rating::Good,
            _ => Rating::Excellent,
        }
    }

    /// EXCELLENT or GOOD.
    pub fn is_accessible(self) -> bool {
        matches!(self, Rating::Excellent | Rating::Good)
    }

    pub fn label(self) -> &'static str {
        match self {
            Rating::Excellent => "EXCELLENT",
            Rating::Good => "GOOD",
            Rating::Ok => "OK",
            Rating::Caution => "CAUTION",
            Rating::Extended => "EXTENDED",
            Rating::Missed => "MISSED",
            Rating::NotApplicable => "N/A",
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum VolumeBacking {
    Strong,
    Moderate,
    Weak,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RuleOutcome {
    pub delta: i32,
    pub factor: String,
}

impl RuleOutcome {
    fn note(factor: String) -> Self {
        RuleOutcome { delta: 0, factor }
    }
}

/// A candidate price level and where it came from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Level {
    pub source: &'static str,
    pub price: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityRating {
    pub level_price: f64,
    pub level_source: &'static str,
    pub side: Side,
    pub rating: Rating,
    pub base_rating: Rating,
    pub boost: i32,
    pub factors: Vec<String>,
}

pub fn extension_rule(
    price: f64,
    side: Side,
    snapshot: &IndicatorSnapshot,
    config: &QualityConfig,
) -> (bool, RuleOutcome) {
    let threshold = config.extended_threshold_pct;
    let beyond = |reference: f64| -> bool {
        if reference <= 0.0 {
            return false;
        }
        let distance = (price - reference) / reference * 100.0;
        match side {
            Side::Buy => distance > threshold,
            Side::Sell => distance < -threshold,
        }
    };
    let boundary = match side {
        Side::Buy => snapshot.profile.value_area_high,
        Side::Sell => snapshot.profile.value_area_low,
    };
    let extended = snapshot.ma_values().all(|ma| beyond(ma)) && beyond(boundary);

    let factor = match (extended, side) {
        (true, Side::Buy) => format!("price >{}% above all MAs and VAH", threshold),
        (true, Side::Sell) => format!("price >{}% below all MAs and VAL", threshold),
        (false, _) => format!("within {}% of MAs/value area", threshold),
    };
    (extended, RuleOutcome::note(factor))
}

pub fn ma_confluence_rule(
    level: f64,
    side: Side,
    snapshot: &IndicatorSnapshot,
    config: &QualityConfig,
) -> (usize, RuleOutcome) {
    let tolerance = config.ma_tolerance_pct / 100.0;
    let count = snapshot
        .ma_values()
        .filter(|&ma| match side {
            Side::Buy => ma <= level * (1.0 + tolerance),
            Side::Sell => ma >= level * (1.0 - tolerance),
        })
        .count();
    let factor = format!(
        "MA confluence {}/{}",
        count,
        snapshot.moving_averages.len()
    );
    (count, RuleOutcome::note(factor))
}

pub fn volume_backing_rule(
    level: f64,
    snapshot: &IndicatorSnapshot,
    config: &QualityConfig,
) -> (VolumeBacking, RuleOutcome) {
    let profile = &snapshot.profile;
    let tolerance = config.volume_tolerance_pct;
    let (backing, factor) = if profile.is_near_poc(level, tolerance) {
        (VolumeBacking::Strong, "volume STRONG (near POC)")
    } else if profile.is_near_hvn(level, tolerance) {
        (VolumeBacking::Strong, "volume STRONG (near HVN)")
    } else if profile.in_value_area(level) {
        (VolumeBacking::Moderate, "volume MODERATE (inside value area)")
    } else {
        (VolumeBacking::Weak, "volume WEAK")
    };
    (backing, RuleOutcome::note(factor.to_string()))
}

pub fn base_rating(confluence: usize, backing: VolumeBacking) -> Rating {
    use VolumeBacking::*;
    match (confluence.min(3), backing) {
        (3, Strong) => Rating::Excellent,
        (3, Moderate) => Rating::Good,
        (3, Weak) => Rating::Ok,
        (2, Strong | Moderate) => Rating::Good,
        (2, Weak) => Rating::Ok,
        (1, Strong | Moderate) => Rating::Ok,
        (1, Weak) => Rating::Caution,
        _ => Rating::Caution,
    }
}

pub fn rsi_rule(rsi: f64, side: Side) -> RuleOutcome {
    let delta = match side {
        Side::Buy if rsi < 30.0 => 2,
        Side::Buy if rsi < 40.0 => 1,
        Side::Buy if rsi > 70.0 => -1,
        Side::Sell if rsi > 70.0 => 2,
        Side::Sell if rsi > 60.0 => 1,
        Side::Sell if rsi < 30.0 => -1,
        _ => 0,
    };
    RuleOutcome {
        delta,
        factor: format!("RSI {:.1} ({:+})", rsi, delta),
    }
}

pub fn bollinger_rule(
    level: f64,
    side: Side,
    snapshot: &IndicatorSnapshot,
    config: &QualityConfig,
) -> RuleOutcome {
    let (band, name) = match side {
        Side::Buy => (snapshot.bollinger.lower, "lower"),
        Side::Sell => (snapshot.bollinger.upper, "upper"),
    };
    let at_or_beyond = match side {
        Side::Buy => level <= band,
        Side::Sell => level >= band,
    };
    let near = band > 0.0 && ((level - band) / band).abs() * 100.0 <= config.band_proximity_pct;

    let (delta, factor) = if at_or_beyond {
        (2, format!("at/beyond {} Bollinger band (+2)", name))
    } else if near {
        (
            1,
            format!(
                "within {}% of {} Bollinger band (+1)",
                config.band_proximity_pct, name
            ),
        )
    } else {
        (0, format!("away from {} Bollinger band (+0)", name))
    };
    RuleOutcome { delta, factor }
}

/// Move a base rating along the tier ladder by the total boost.
///
/// EXTENDED, MISSED and N/A are returned unchanged.
pub fn apply_boost(base: Rating, boost: i32) -> Rating {
    let Some(tier) = base.tier() else {
        return base;
    };
    let tier = tier as i32;
    let moved = match boost {
        b if b >= 3 => tier + 2,
        2 => tier + 1,
        1 if base == Rating::Caution => tier + 1,
        b if b <= -1 => tier - 1,
        _ => tier,
    };
    Rating::from_tier(moved.clamp(0, 3) as u8)
}

/// Run the full pipeline for one level.
pub fn rate_level(
    level: Level,
    side: Side,
    snapshot: &IndicatorSnapshot,
    config: &QualityConfig,
) -> QualityRating {
    let price = snapshot.close;
    let wrong_side = match side {
        Side::Buy => level.price > price,
        Side::Sell => level.price < price,
    };
    if level.price <= 0.0 || wrong_side {
        return QualityRating {
            level_price: level.price,
            level_source: level.source,
            side,
            rating: Rating::NotApplicable,
            base_rating: Rating::NotApplicable,
            boost: 0,
            factors: vec![format!("{} on wrong side of price", level.source)],
        };
    }

    let mut factors = Vec::with_capacity(6);

    let (extended, outcome) = extension_rule(price, side, snapshot, config);
    factors.push(outcome.factor);
    if extended {
        let forced = match side {
            Side::Buy => Rating::Extended,
            Side::Sell => Rating::Missed,
        };
        return QualityRating {
            level_price: level.price,
            level_source: level.source,
            side,
            rating: forced,
            base_rating: forced,
            boost: 0,
            factors,
        };
    }

    let (confluence, outcome) = ma_confluence_rule(level.price, side, snapshot, config);
    factors.push(outcome.factor);
    let (backing, outcome) = volume_backing_rule(level.price, snapshot, config);
    factors.push(outcome.factor);

    let base = base_rating(confluence, backing);
    factors.push(format!("base {}", base));

    let mut boost = 0;
    for outcome in [
        rsi_rule(snapshot.rsi, side),
        bollinger_rule(level.price, side, snapshot, config),
    ] {
        boost += outcome.delta;
        factors.push(outcome.factor);
    }

    let rating = apply_boost(base, boost);
    factors.push(format!("boost {:+}: {} -> {}", boost, base, rating));

    QualityRating {
        level_price: level.price,
        level_source: level.source,
        side,
        rating,
        base_rating: base,
        boost,
        factors,
    }
}

/// Pivot and volume-profile levels on the snapshot.
pub fn candidate_levels(snapshot: &IndicatorSnapshot) -> Vec<Level> {
    let pivots = &snapshot.pivots;
    let profile = &snapshot.profile;
    let mut levels = vec![Level {
        source: "P",
        price: pivots.pivot,
    }];
    levels.extend(
        pivots
            .supports()
            .into_iter()
            .chain(pivots.resistances())
            .map(|(source, price)| Level { source, price }),
    );
    levels.push(Level {
        source: "POC",
        price: profile.poc,
    });
    levels.push(Level {
        source: "VAH",
        price: profile.value_area_high,
    });
    levels.push(Level {
        source: "VAL",
        price: profile.value_area_low,
    });
    levels.extend(profile.hvns.iter().map(|&price| Level {
        source: "HVN",
        price,
    }));
    levels
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelRatings {
    /// Rated supports, nearest (highest) first.
    pub supports: Vec<QualityRating>,
    /// Rated resistances, nearest (lowest) first.
    pub resistances: Vec<QualityRating>,
}

/// Rate every candidate level as a buy support and as a sell resistance,
/// dropping the N/A side of each.
pub fn rate_levels(snapshot: &IndicatorSnapshot, config: &QualityConfig) -> LevelRatings {
    let levels = candidate_levels(snapshot);
    let rate_side = |side: Side| -> Vec<QualityRating> {
        levels
            .iter()
            .map(|&level| rate_level(level, side, snapshot, config))
            .filter(|r| r.rating != Rating::NotApplicable)
            .collect()
    };

    let mut supports = rate_side(Side::Buy);
    supports.sort_by(|a, b| {
        b.level_price
            .total_cmp(&a.level_price)
            .then_with(|| a.level_source.cmp(b.level_source))
    });
    let mut resistances = rate_side(Side::Sell);
    resistances.sort_by(|a, b| {
        a.level_price
            .total_cmp(&b.level_price)
            .then_with(|| a.level_source.cmp(b.level_source))
    });

    LevelRatings {
        supports,
        resistances,
    }
}
