//! Trend state classification.
//!
//! Two independent classifiers:
//! - Dual-timeframe composite: weekly and daily bars are each classified as
//!   BULL / NEUTRAL / BEAR from a stack of four smoothed HL2 averages, and the
//!   pair is mapped onto one of eight composite signals.
//! - Single-timeframe momentum: P1 / P2 / N1 / N2 from the close relative to
//!   its 200-day average and its four-week rate of change.
//!
//! Short histories classify as [`Classified::Unavailable`]; no classifier
//! ever falls back to a neutral state.

use crate::domain::indicator::roc::rate_of_change;
use crate::domain::indicator::sma::latest_sma;
use crate::domain::indicator::smma::calculate_smma;
use crate::domain::indicator::PriceSource;
use crate::domain::ohlcv::OhlcvBar;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct TrendConfig {
    /// SMMA periods of HL2 as (v1, m1, m2, v2), strictly increasing.
    pub smma_periods: [usize; 4],
    pub momentum_ma_period: usize,
    /// Lookback in weekly bars for the momentum rate of change.
    pub momentum_roc_weeks: usize,
    pub roc_threshold_pct: f64,
    pub extension_threshold_pct: f64,
    pub n1_floor_pct: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        TrendConfig {
            smma_periods: [5, 10, 20, 40],
            momentum_ma_period: 200,
            momentum_roc_weeks: 4,
            roc_threshold_pct: 5.0,
            extension_threshold_pct: 10.0,
            n1_floor_pct: -5.0,
        }
    }
}

/// Result of a classifier: a state, or an explicit lack of one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Classified<S> {
    State(S),
    Unavailable { bars: usize, required: usize },
}

impl<S: Copy> Classified<S> {
    pub fn state(&self) -> Option<S> {
        match self {
            Classified::State(s) => Some(*s),
            Classified::Unavailable { .. } => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Classified::State(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Direction {
    Bull,
    Neutral,
    Bear,
}

impl Direction {
    pub const ALL: [Direction; 3] = [Direction::Bull, Direction::Neutral, Direction::Bear];
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Bull => write!(f, "BULL"),
            Direction::Neutral => write!(f, "NEUTRAL"),
            Direction::Bear => write!(f, "BEAR"),
        }
    }
}

/// Latest values of the four smoothed averages.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SmmaStack {
    pub v1: f64,
    pub m1: f64,
    pub m2: f64,
    pub v2: f64,
}

impl SmmaStack {
    pub fn direction(&self) -> Direction {
        if self.v1 > self.m1 && self.v1 > self.v2 && self.m2 > self.v2 {
            Direction::Bull
        } else if self.v1 < self.v2 {
            Direction::Bear
        } else {
            Direction::Neutral
        }
    }
}

pub fn smma_stack(bars: &[OhlcvBar], periods: [usize; 4]) -> Option<SmmaStack> {
    let latest = |period: usize| {
        calculate_smma(bars, period, PriceSource::Hl2)
            .ok()
            .and_then(|s| s.latest_simple())
    };
    Some(SmmaStack {
        v1: latest(periods[0])?,
        m1: latest(periods[1])?,
        m2: latest(periods[2])?,
        v2: latest(periods[3])?,
    })
}

/// Classify one timeframe's bars.
pub fn classify_timeframe(bars: &[OhlcvBar], config: &TrendConfig) -> Classified<Direction> {
    let required = config.smma_periods.iter().copied().max().unwrap_or(0);
    match smma_stack(bars, config.smma_periods) {
        Some(stack) if bars.len() >= required => Classified::State(stack.direction()),
        _ => Classified::Unavailable {
            bars: bars.len(),
            required,
        },
    }
}

/// Combined weekly/daily signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CompositeSignal {
    FullHoldAdd,
    HoldNoAdd,
    HoldTighten,
    EarlyEntry,
    NeutralWait,
    Reduce,
    CounterTrendTrim,
    FullDefend,
}

impl CompositeSignal {
    /// Total over every (weekly, daily) pair.
    pub fn from_pair(weekly: Direction, daily: Direction) -> Self {
        use Direction::*;
        match (weekly, daily) {
            (Bull, Bull) => CompositeSignal::FullHoldAdd,
            (Bull, Neutral) => CompositeSignal::HoldNoAdd,
            (Bull, Bear) => CompositeSignal::HoldTighten,
            (Neutral, Bull) => CompositeSignal::EarlyEntry,
            (Neutral, Neutral) => CompositeSignal::NeutralWait,
            (Neutral, Bear) => CompositeSignal::Reduce,
            (Bear, Bull) | (Bear, Neutral) => CompositeSignal::CounterTrendTrim,
            (Bear, Bear) => CompositeSignal::FullDefend,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            CompositeSignal::FullHoldAdd => "full-hold-add",
            CompositeSignal::HoldNoAdd => "hold-no-add",
            CompositeSignal::HoldTighten => "hold-tighten",
            CompositeSignal::EarlyEntry => "early-entry",
            CompositeSignal::NeutralWait => "neutral-wait",
            CompositeSignal::Reduce => "reduce",
            CompositeSignal::CounterTrendTrim => "counter-trend-trim",
            CompositeSignal::FullDefend => "full-defend",
        }
    }
}

impl fmt::Display for CompositeSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn classify_composite(
    weekly: &[OhlcvBar],
    daily: &[OhlcvBar],
    config: &TrendConfig,
) -> Classified<CompositeSignal> {
    match (
        classify_timeframe(weekly, config),
        classify_timeframe(daily, config),
    ) {
        (Classified::State(w), Classified::State(d)) => {
            Classified::State(CompositeSignal::from_pair(w, d))
        }
        (Classified::Unavailable { bars, required }, _)
        | (_, Classified::Unavailable { bars, required }) => {
            Classified::Unavailable { bars, required }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MomentumState {
    P1,
    P2,
    N1,
    N2,
}

impl MomentumState {
    pub fn is_buy_eligible(&self) -> bool {
        matches!(self, MomentumState::P1)
    }

    pub fn must_exit(&self) -> bool {
        matches!(self, MomentumState::N2)
    }
}

impl fmt::Display for MomentumState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            MomentumState::P1 => "P1",
            MomentumState::P2 => "P2",
            MomentumState::N1 => "N1",
            MomentumState::N2 => "N2",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MomentumInputs {
    pub close: f64,
    pub moving_average: f64,
    pub close_n_ago: f64,
}

impl MomentumInputs {
    pub fn distance_pct(&self) -> f64 {
        if self.moving_average == 0.0 {
            0.0
        } else {
            (self.close - self.moving_average) / self.moving_average * 100.0
        }
    }

    pub fn roc_pct(&self) -> f64 {
        rate_of_change(self.close_n_ago, self.close)
    }
}

pub fn momentum_state(inputs: &MomentumInputs, config: &TrendConfig) -> MomentumState {
    let distance = inputs.distance_pct();
    if inputs.close > inputs.moving_average {
        if inputs.roc_pct() > config.roc_threshold_pct
            || distance > config.extension_threshold_pct
        {
            MomentumState::P1
        } else {
            MomentumState::P2
        }
    } else if inputs.close < inputs.moving_average && distance > config.n1_floor_pct {
        MomentumState::N1
    } else {
        MomentumState::N2
    }
}

/// Gather momentum inputs: the average from daily bars, the lookback close from weekly bars.
pub fn momentum_inputs(
    daily: &[OhlcvBar],
    weekly: &[OhlcvBar],
    config: &TrendConfig,
) -> Classified<MomentumInputs> {
    let weekly_needed = config.momentum_roc_weeks + 1;
    let moving_average = match latest_sma(daily, config.momentum_ma_period) {
        Ok(v) => v,
        Err(_) => {
            return Classified::Unavailable {
                bars: daily.len(),
                required: config.momentum_ma_period,
            };
        }
    };
    if weekly.len() < weekly_needed {
        return Classified::Unavailable {
            bars: weekly.len(),
            required: weekly_needed,
        };
    }
    let close = daily[daily.len() - 1].close;
    let close_n_ago = weekly[weekly.len() - 1 - config.momentum_roc_weeks].close;
    Classified::State(MomentumInputs {
        close,
        moving_average,
        close_n_ago,
    })
}

pub fn classify_momentum(
    daily: &[OhlcvBar],
    weekly: &[OhlcvBar],
    config: &TrendConfig,
) -> Classified<MomentumState> {
    match momentum_inputs(daily, weekly, config) {
        Classified::State(inputs) => Classified::State(momentum_state(&inputs, config)),
        Classified::Unavailable { bars, required } => Classified::Unavailable { bars, required },
    }
}
