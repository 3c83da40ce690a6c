//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! Default parameters: period=20, multiplier=2.0
//! Warmup: first (period-1) bars are invalid.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::{
    IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue, require_bars,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_BOLLINGER_PERIOD: usize = 20;
pub const DEFAULT_BOLLINGER_MULT_X100: u32 = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerBands {
    pub upper: f64,
    pub middle: f64,
    pub lower: f64,
}

pub fn calculate_bollinger(
    bars: &[OhlcvBar],
    period: usize,
    stddev_mult_x100: u32,
) -> Result<IndicatorSeries, IndicatorError> {
    require_bars(bars, period)?;

    let mut values = Vec::with_capacity(bars.len());
    let warmup = period - 1;
    let mult = stddev_mult_x100 as f64 / 100.0;

    for i in 0..bars.len() {
        let date = bars[i].date;
        let valid = i >= warmup;

        let bands = if valid {
            band_values(&bars[i + 1 - period..=i], mult)
        } else {
            BollingerBands {
                upper: 0.0,
                middle: 0.0,
                lower: 0.0,
            }
        };

        values.push(IndicatorPoint {
            date,
            valid,
            value: IndicatorValue::Bollinger {
                upper: bands.upper,
                middle: bands.middle,
                lower: bands.lower,
            },
        });
    }

    Ok(IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period,
            stddev_mult_x100,
        },
        values,
    })
}

/// Bands over the last `period` bars.
pub fn latest_bollinger(
    bars: &[OhlcvBar],
    period: usize,
    stddev_mult_x100: u32,
) -> Result<BollingerBands, IndicatorError> {
    let series = calculate_bollinger(bars, period, stddev_mult_x100)?;
    match series.latest().map(|p| p.value) {
        Some(IndicatorValue::Bollinger {
            upper,
            middle,
            lower,
        }) => Ok(BollingerBands {
            upper,
            middle,
            lower,
        }),
        _ => Err(IndicatorError::InsufficientData {
            have: bars.len(),
            need: period,
        }),
    }
}

fn band_values(window: &[OhlcvBar], mult: f64) -> BollingerBands {
    let n = window.len() as f64;
    let middle: f64 = window.iter().map(|b| b.close).sum::<f64>() / n;

    let variance: f64 = window
        .iter()
        .map(|b| {
            let diff = b.close - middle;
            diff * diff
        })
        .sum::<f64>()
        / n;

    let stddev = variance.sqrt();
    BollingerBands {
        upper: middle + mult * stddev,
        middle,
        lower: middle - mult * stddev,
    }
}
