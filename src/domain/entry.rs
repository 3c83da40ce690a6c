//! Entry-quality evaluation and candidate ranking.
//!
//! Supports within the stop range decide the entry tier and flag; the ATR
//! stop and nearest resistance give the volatility-adjusted reward:risk; a
//! 0-100 score and letter grade drive the final ranking.

use crate::domain::fill::PriceTarget;
use crate::domain::quality::{LevelRatings, QualityConfig, QualityRating, Rating};
use crate::domain::snapshot::IndicatorSnapshot;
use serde::Serialize;
use std::cmp::Ordering;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct EntryConfig {
    pub max_stop_distance_pct: f64,
    pub min_risk_floor_pct: f64,
    pub atr_stop_multiple: f64,
}

impl Default for EntryConfig {
    fn default() -> Self {
        EntryConfig {
            max_stop_distance_pct: 8.0,
            min_risk_floor_pct: 2.0,
            atr_stop_multiple: 2.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EntryFlag {
    SafeEntry,
    Ideal,
    Acceptable,
    Thin,
    Extended,
    Wait,
}

impl fmt::Display for EntryFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntryFlag::SafeEntry => "SAFE_ENTRY",
            EntryFlag::Ideal => "IDEAL",
            EntryFlag::Acceptable => "ACCEPTABLE",
            EntryFlag::Thin => "THIN",
            EntryFlag::Extended => "EXTENDED",
            EntryFlag::Wait => "WAIT",
        };
        f.write_str(s)
    }
}

/// Letter grade; declaration order is best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: f64) -> Grade {
        if score >= 80.0 {
            Grade::A
        } else if score >= 65.0 {
            Grade::B
        } else if score >= 50.0 {
            Grade::C
        } else if score >= 35.0 {
            Grade::D
        } else {
            Grade::F
        }
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RewardRisk {
    pub stop: f64,
    pub target: Option<f64>,
    pub reward_pct: f64,
    pub risk_pct: f64,
    pub ratio: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntryEvaluation {
    pub ticker: String,
    pub price: f64,
    pub rating: Rating,
    pub entry_flag: EntryFlag,
    pub nearest_support: Option<f64>,
    pub reward_risk: RewardRisk,
    pub quality_score: f64,
    pub grade: Grade,
}

impl EntryEvaluation {
    pub fn reward_risk_ratio(&self) -> f64 {
        self.reward_risk.ratio
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedCandidate {
    pub rank: usize,
    #[serde(flatten)]
    pub evaluation: EntryEvaluation,
}

/// Stop at the ATR multiple below price, never further than the max-stop distance.
pub fn stop_price(price: f64, atr: Option<f64>, config: &EntryConfig) -> f64 {
    let max_stop = price * (1.0 - config.max_stop_distance_pct / 100.0);
    match atr.filter(|a| *a > 0.0) {
        Some(atr) => (price - config.atr_stop_multiple * atr).max(max_stop),
        None => max_stop,
    }
}

pub fn vol_reward_risk(
    price: f64,
    atr: Option<f64>,
    target: Option<f64>,
    config: &EntryConfig,
) -> RewardRisk {
    let stop = stop_price(price, atr, config);
    let risk_pct = ((price - stop) / price * 100.0).max(config.min_risk_floor_pct);
    let reward_pct = target
        .map(|t| ((t - price) / price * 100.0).max(0.0))
        .unwrap_or(0.0);
    let ratio = if target.is_some() {
        reward_pct / risk_pct
    } else {
        0.0
    };
    RewardRisk {
        stop,
        target,
        reward_pct,
        risk_pct,
        ratio,
    }
}

fn in_stop_range(support: &QualityRating, price: f64, config: &EntryConfig) -> bool {
    let floor = price * (1.0 - config.max_stop_distance_pct / 100.0);
    support.level_price >= floor && support.level_price <= price
}

/// Tier and flag from the rated supports.
pub fn classify_entry(
    price: f64,
    supports: &[QualityRating],
    entry: &EntryConfig,
    quality: &QualityConfig,
) -> (Rating, EntryFlag) {
    let in_range: Vec<&QualityRating> = supports
        .iter()
        .filter(|s| in_stop_range(s, price, entry))
        .collect();
    let accessible = in_range.iter().filter(|s| s.rating.is_accessible()).count();

    if accessible >= 2 {
        return (Rating::Excellent, EntryFlag::SafeEntry);
    }
    if accessible == 1 {
        return (Rating::Good, EntryFlag::Ideal);
    }
    if in_range.iter().any(|s| s.rating == Rating::Ok) {
        return (Rating::Ok, EntryFlag::Acceptable);
    }

    let all_extended =
        !supports.is_empty() && supports.iter().all(|s| s.rating == Rating::Extended);
    let nearest_far = supports
        .iter()
        .map(|s| s.level_price)
        .reduce(f64::max)
        .is_some_and(|nearest| (price - nearest) / price * 100.0 > quality.extended_threshold_pct);

    let flag = if all_extended || nearest_far {
        EntryFlag::Extended
    } else if supports.iter().any(|s| !in_stop_range(s, price, entry)) {
        EntryFlag::Thin
    } else {
        EntryFlag::Wait
    };
    (Rating::Caution, flag)
}

fn support_points(rating: Rating) -> f64 {
    match rating {
        Rating::Excellent => 30.0,
        Rating::Good => 22.0,
        Rating::Ok => 12.0,
        Rating::Caution => 4.0,
        _ => 0.0,
    }
}

/// 0-100 composite of support, proximity, reward, ratio, RSI and band position.
pub fn quality_score(
    rating: Rating,
    nearest_support: Option<f64>,
    reward_risk: &RewardRisk,
    snapshot: &IndicatorSnapshot,
    config: &EntryConfig,
) -> f64 {
    let price = snapshot.close;

    let proximity = nearest_support
        .map(|level| {
            let distance = (price - level) / price * 100.0;
            20.0 * (1.0 - distance / config.max_stop_distance_pct)
        })
        .unwrap_or(0.0)
        .clamp(0.0, 20.0);
    let reward = 15.0 * (reward_risk.reward_pct / 20.0).min(1.0);
    let ratio = 15.0 * (reward_risk.ratio / 3.0).min(1.0);
    let rsi = (10.0 * (70.0 - snapshot.rsi) / 40.0).clamp(0.0, 10.0);

    let bands = &snapshot.bollinger;
    let width = bands.upper - bands.lower;
    let band_position = if width > 0.0 {
        let percent_b = (price - bands.lower) / width;
        (10.0 * (1.0 - percent_b)).clamp(0.0, 10.0)
    } else {
        5.0
    };

    support_points(rating) + proximity + reward + ratio + rsi + band_position
}

/// Evaluate one security's entry from its snapshot and rated levels.
pub fn evaluate_entry(
    snapshot: &IndicatorSnapshot,
    levels: &LevelRatings,
    price_target: Option<&PriceTarget>,
    entry: &EntryConfig,
    quality: &QualityConfig,
) -> EntryEvaluation {
    let price = snapshot.close;
    let (rating, entry_flag) = classify_entry(price, &levels.supports, entry, quality);

    // supports are nearest first
    let nearest_support = levels
        .supports
        .iter()
        .filter(|s| in_stop_range(s, price, entry))
        .find(|s| s.rating.is_accessible())
        .or_else(|| {
            levels
                .supports
                .iter()
                .find(|s| in_stop_range(s, price, entry))
        })
        .map(|s| s.level_price);

    let target = levels
        .resistances
        .iter()
        .find(|r| r.level_price > price)
        .map(|r| r.level_price)
        .or(price_target.map(|t| t.high));

    let reward_risk = vol_reward_risk(price, Some(snapshot.atr), target, entry);
    let quality_score = quality_score(rating, nearest_support, &reward_risk, snapshot, entry);

    EntryEvaluation {
        ticker: snapshot.code.clone(),
        price,
        rating,
        entry_flag,
        nearest_support,
        reward_risk,
        quality_score,
        grade: Grade::from_score(quality_score),
    }
}

fn rank_order(a: &EntryEvaluation, b: &EntryEvaluation) -> Ordering {
    a.grade
        .cmp(&b.grade)
        .then_with(|| b.reward_risk.ratio.total_cmp(&a.reward_risk.ratio))
        .then_with(|| a.ticker.cmp(&b.ticker))
}

/// Grade, then reward:risk descending, then ticker; ranks start at 1.
pub fn rank_candidates(mut evaluations: Vec<EntryEvaluation>) -> Vec<RankedCandidate> {
    evaluations.sort_by(rank_order);
    evaluations
        .into_iter()
        .enumerate()
        .map(|(i, evaluation)| RankedCandidate {
            rank: i + 1,
            evaluation,
        })
        .collect()
}
