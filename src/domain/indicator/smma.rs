//! Smoothed Moving Average (Wilder / RMA).
//!
//! Seed with the SMA of the first n values, then
//! SMMA[i] = (SMMA[i-1] * (n-1) + x[i]) / n.
//! Warmup: first (n-1) bars are invalid.

use crate::domain::error::IndicatorError;
use crate::domain::indicator::{
    IndicatorSeries, IndicatorType, PriceSource, invalid_point, require_bars, simple_point,
};
use crate::domain::ohlcv::OhlcvBar;

pub fn calculate_smma(
    bars: &[OhlcvBar],
    period: usize,
    source: PriceSource,
) -> Result<IndicatorSeries, IndicatorError> {
    require_bars(bars, period)?;

    let mut values = Vec::with_capacity(bars.len());
    let n = period as f64;
    let mut sum = 0.0;
    let mut smma = 0.0;

    for (i, bar) in bars.iter().enumerate() {
        let x = source.extract(bar);
        if i < period - 1 {
            sum += x;
            values.push(invalid_point(bar.date));
        } else if i == period - 1 {
            sum += x;
            smma = sum / n;
            values.push(simple_point(bar.date, smma));
        } else {
            smma = (smma * (n - 1.0) + x) / n;
            values.push(simple_point(bar.date, smma));
        }
    }

    Ok(IndicatorSeries {
        indicator_type: IndicatorType::Smma { period, source },
        values,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::indicator::test_bars::{closes, hlcv};

    #[test]
    fn smma_seed_and_recursion() {
        let series = calculate_smma(&closes(&[2.0, 4.0, 6.0, 12.0]), 3, PriceSource::Close).unwrap();
        assert!(!series.values[1].valid);
        // seed = 4, next = (4*2 + 12)/3
        let values: Vec<f64> = series
            .values
            .iter()
            .filter(|p| p.valid)
            .filter_map(|p| match p.value {
                crate::domain::indicator::IndicatorValue::Simple(v) => Some(v),
                _ => None,
            })
            .collect();
        assert_eq!(values.len(), 2);
        assert!((values[0] - 4.0).abs() < 1e-12);
        assert!((values[1] - 20.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn smma_uses_hl2() {
        let bars = hlcv(&[(12.0, 8.0, 8.0, 1), (14.0, 10.0, 10.0, 1)]);
        let series = calculate_smma(&bars, 2, PriceSource::Hl2).unwrap();
        assert_eq!(series.latest_simple(), Some(11.0));
    }

    #[test]
    fn smma_insufficient_data() {
        assert!(calculate_smma(&closes(&[1.0]), 2, PriceSource::Close).is_err());
    }
}
