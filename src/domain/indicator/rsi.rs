//! RSI (Relative Strength Index) indicator implementation.
//!
//! Uses Wilder's smoothing for average gain/loss calculation:
//! - First average: simple mean of gains/losses over first n changes
//! - Subsequent: avg = (prev_avg * (n-1) + current) / n
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0: RSI = 100
//!
//! Warmup: first n bars are invalid (need n price changes to compute initial average),
//! so at least n+1 bars are required.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::{
    IndicatorSeries, IndicatorType, invalid_point, require_bars, simple_point,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_RSI_PERIOD: usize = 14;

pub fn calculate_rsi(bars: &[OhlcvBar], period: usize) -> Result<IndicatorSeries, IndicatorError> {
    require_bars(bars, period.max(1) + 1)?;
    if period == 0 {
        return Err(IndicatorError::InvalidParameter {
            reason: "RSI period must be at least 1".to_string(),
        });
    }

    let mut values = Vec::with_capacity(bars.len());
    values.push(invalid_point(bars[0].date));

    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;
    let mut seed_gain = 0.0;
    let mut seed_loss = 0.0;
    let n = period as f64;

    for i in 1..bars.len() {
        let change = bars[i].close - bars[i - 1].close;
        let gain = if change > 0.0 { change } else { 0.0 };
        let loss = if change < 0.0 { -change } else { 0.0 };

        if i < period {
            seed_gain += gain;
            seed_loss += loss;
            values.push(invalid_point(bars[i].date));
            continue;
        }

        if i == period {
            avg_gain = (seed_gain + gain) / n;
            avg_loss = (seed_loss + loss) / n;
        } else {
            avg_gain = (avg_gain * (n - 1.0) + gain) / n;
            avg_loss = (avg_loss * (n - 1.0) + loss) / n;
        }

        let rsi = if avg_loss == 0.0 {
            100.0
        } else {
            100.0 - (100.0 / (1.0 + avg_gain / avg_loss))
        };
        values.push(simple_point(bars[i].date, rsi));
    }

    Ok(IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    })
}
