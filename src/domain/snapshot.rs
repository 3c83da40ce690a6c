//! Point-in-time indicator snapshot for one security.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::atr::{DEFAULT_ATR_PERIOD, calculate_atr};
use crate::domain::indicator::bollinger::{
    BollingerBands, DEFAULT_BOLLINGER_MULT_X100, DEFAULT_BOLLINGER_PERIOD, latest_bollinger,
};
use crate::domain::indicator::pivot::{PivotLevels, pivot_levels};
use crate::domain::indicator::rsi::{DEFAULT_RSI_PERIOD, calculate_rsi};
use crate::domain::indicator::sma::latest_sma;
use crate::domain::indicator::volume_profile::{
    DEFAULT_PROFILE_BINS, DEFAULT_PROFILE_LOOKBACK, VolumeProfile, volume_profile,
};
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorConfig {
    pub ma_periods: Vec<usize>,
    pub rsi_period: usize,
    pub bollinger_period: usize,
    pub bollinger_mult_x100: u32,
    pub atr_period: usize,
    pub profile_lookback: usize,
    pub profile_bins: usize,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        IndicatorConfig {
            ma_periods: vec![50, 100, 200],
            rsi_period: DEFAULT_RSI_PERIOD,
            bollinger_period: DEFAULT_BOLLINGER_PERIOD,
            bollinger_mult_x100: DEFAULT_BOLLINGER_MULT_X100,
            atr_period: DEFAULT_ATR_PERIOD,
            profile_lookback: DEFAULT_PROFILE_LOOKBACK,
            profile_bins: DEFAULT_PROFILE_BINS,
        }
    }
}

impl IndicatorConfig {
    /// Daily bars needed before every indicator on the snapshot is defined.
    pub fn longest_period(&self) -> usize {
        self.ma_periods
            .iter()
            .copied()
            .chain([
                self.rsi_period + 1,
                self.bollinger_period,
                self.atr_period,
                self.profile_lookback,
            ])
            .max()
            .unwrap_or(0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub code: String,
    pub date: NaiveDate,
    pub close: f64,
    /// Keyed by period.
    pub moving_averages: BTreeMap<usize, f64>,
    pub rsi: f64,
    pub bollinger: BollingerBands,
    pub atr: f64,
    pub pivots: PivotLevels,
    pub profile: VolumeProfile,
}

impl IndicatorSnapshot {
    pub fn ma_values(&self) -> impl Iterator<Item = f64> + '_ {
        self.moving_averages.values().copied()
    }
}

/// Build the snapshot as of the last daily bar.
///
/// `weekly` must only hold weeks closed on or before that bar; the last one
/// supplies the pivot levels.
pub fn build_snapshot(
    daily: &[OhlcvBar],
    weekly: &[OhlcvBar],
    config: &IndicatorConfig,
) -> Result<IndicatorSnapshot, IndicatorError> {
    if daily.len() < config.longest_period() {
        return Err(IndicatorError::InsufficientData {
            have: daily.len(),
            need: config.longest_period(),
        });
    }
    let last = &daily[daily.len() - 1];

    let mut moving_averages = BTreeMap::new();
    for &period in &config.ma_periods {
        moving_averages.insert(period, latest_sma(daily, period)?);
    }

    let rsi = calculate_rsi(daily, config.rsi_period)?
        .latest_simple()
        .ok_or(IndicatorError::InsufficientData {
            have: daily.len(),
            need: config.rsi_period + 1,
        })?;
    let atr = calculate_atr(daily, config.atr_period)?
        .latest_simple()
        .ok_or(IndicatorError::InsufficientData {
            have: daily.len(),
            need: config.atr_period,
        })?;

    Ok(IndicatorSnapshot {
        code: last.code.clone(),
        date: last.date,
        close: last.close,
        moving_averages,
        rsi,
        bollinger: latest_bollinger(daily, config.bollinger_period, config.bollinger_mult_x100)?,
        atr,
        pivots: pivot_levels(weekly)?,
        profile: volume_profile(daily, config.profile_lookback, config.profile_bins)?,
    })
}
