//! Average True Range with Wilder smoothing.
//!
//! Seed is the mean of the first n true ranges (the first bar uses high - low),
//! then ATR[i] = (ATR[i-1] * (n-1) + TR[i]) / n.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::{
    IndicatorSeries, IndicatorType, invalid_point, require_bars, simple_point,
};
use crate::domain::ohlcv::OhlcvBar;

pub const DEFAULT_ATR_PERIOD: usize = 14;

pub fn calculate_atr(bars: &[OhlcvBar], period: usize) -> Result<IndicatorSeries, IndicatorError> {
    require_bars(bars, period)?;

    let tr_values: Vec<f64> = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect();

    let mut values = Vec::with_capacity(bars.len());
    let mut atr = 0.0;

    for i in 0..bars.len() {
        if i < period - 1 {
            values.push(invalid_point(bars[i].date));
        } else if i == period - 1 {
            atr = tr_values[0..=i].iter().sum::<f64>() / period as f64;
            values.push(simple_point(bars[i].date, atr));
        } else {
            atr = (atr * (period - 1) as f64 + tr_values[i]) / period as f64;
            values.push(simple_point(bars[i].date, atr));
        }
    }

    Ok(IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    })
}
