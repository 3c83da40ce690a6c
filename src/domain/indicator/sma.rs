//! Simple Moving Average.
//!
//! Rolling mean of closes over `period` bars.
//! Warmup: first (period-1) bars are invalid.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::{
    IndicatorSeries, IndicatorType, invalid_point, require_bars, simple_point,
};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_sma(bars: &[OhlcvBar], period: usize) -> Result<IndicatorSeries, IndicatorError> {
    require_bars(bars, period)?;

    let mut values = Vec::with_capacity(bars.len());
    let mut sum = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        sum += bar.close;
        if i >= period {
            sum -= bars[i - period].close;
        }
        if i + 1 < period {
            values.push(invalid_point(bar.date));
        } else {
            values.push(simple_point(bar.date, sum / period as f64));
        }
    }

    Ok(IndicatorSeries {
        indicator_type: IndicatorType::Sma(period),
        values,
    })
}

/// Mean of the last `period` closes.
pub fn latest_sma(bars: &[OhlcvBar], period: usize) -> Result<f64, IndicatorError> {
    calculate_sma(bars, period)?
        .latest_simple()
        .ok_or(IndicatorError::InsufficientData {
            have: bars.len(),
            need: period,
        })
}
