//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters (serves as HashMap key)
//! - `IndicatorSeries`: A time series of indicator values
//!
//! Every `calculate_*` function is pure and fails with
//! [`IndicatorError::InsufficientData`] when the input is shorter than the
//! indicator's lookback.

pub mod atr;
pub mod bollinger;
pub mod pivot;
pub mod roc;
pub mod rsi;
pub mod sma;
pub mod smma;
pub mod volume_profile;

use crate::domain::error::IndicatorError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub date: NaiveDate,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Bollinger {
        upper: f64,
        middle: f64,
        lower: f64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PriceSource {
    Close,
    Hl2,
}

impl PriceSource {
    pub fn extract(self, bar: &OhlcvBar) -> f64 {
        match self {
            PriceSource::Close => bar.close,
            PriceSource::Hl2 => bar.hl2(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Smma { period: usize, source: PriceSource },
    Rsi(usize),
    Atr(usize),
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    /// Last valid point, if any.
    pub fn latest(&self) -> Option<&IndicatorPoint> {
        self.values.iter().rev().find(|p| p.valid)
    }

    /// Value of the last valid point for single-valued indicators.
    pub fn latest_simple(&self) -> Option<f64> {
        match self.latest()?.value {
            IndicatorValue::Simple(v) => Some(v),
            _ => None,
        }
    }
}

/// Fail with `InsufficientData` unless `bars` has at least `need` entries.
pub fn require_bars(bars: &[OhlcvBar], need: usize) -> Result<(), IndicatorError> {
    if need == 0 {
        return Err(IndicatorError::InvalidParameter {
            reason: "period must be at least 1".to_string(),
        });
    }
    if bars.len() < need {
        return Err(IndicatorError::InsufficientData {
            have: bars.len(),
            need,
        });
    }
    Ok(())
}

pub(crate) fn invalid_point(date: NaiveDate) -> IndicatorPoint {
    IndicatorPoint {
        date,
        valid: false,
        value: IndicatorValue::Simple(0.0),
    }
}

pub(crate) fn simple_point(date: NaiveDate, value: f64) -> IndicatorPoint {
    IndicatorPoint {
        date,
        valid: true,
        value: IndicatorValue::Simple(value),
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Smma { period, source } => match source {
                PriceSource::Close => write!(f, "SMMA({})", period),
                PriceSource::Hl2 => write!(f, "SMMA({},HL2)", period),
            },
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}
