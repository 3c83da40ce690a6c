//! Classic floor-trader pivot levels.
//!
//! Computed from the high, low and close of the most recently completed
//! period (the last bar of the slice passed in):
//!
//! ```text
//! P  = (H + L + C) / 3
//! R1 = 2P - L        S1 = 2P - H
//! R2 = P + (H - L)   S2 = P - (H - L)
//! R3 = H + 2(P - L)  S3 = L - 2(H - P)
//! ```

use crate::domain::error::IndicatorError;
use crate::domain::indicator::require_bars;
use crate::domain::ohlcv::OhlcvBar;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PivotLevels {
    pub pivot: f64,
    pub r1: f64,
    pub r2: f64,
    pub r3: f64,
    pub s1: f64,
    pub s2: f64,
    pub s3: f64,
}

impl PivotLevels {
    pub fn from_hlc(high: f64, low: f64, close: f64) -> Self {
        let pivot = (high + low + close) / 3.0;
        let range = high - low;
        PivotLevels {
            pivot,
            r1: 2.0 * pivot - low,
            r2: pivot + range,
            r3: high + 2.0 * (pivot - low),
            s1: 2.0 * pivot - high,
            s2: pivot - range,
            s3: low - 2.0 * (high - pivot),
        }
    }

    /// Supports nearest first: S1, S2, S3.
    pub fn supports(&self) -> [(&'static str, f64); 3] {
        [("S1", self.s1), ("S2", self.s2), ("S3", self.s3)]
    }

    /// Resistances nearest first: R1, R2, R3.
    pub fn resistances(&self) -> [(&'static str, f64); 3] {
        [("R1", self.r1), ("R2", self.r2), ("R3", self.r3)]
    }
}

/// Pivot levels from the last bar of `bars`.
pub fn pivot_levels(bars: &[OhlcvBar]) -> Result<PivotLevels, IndicatorError> {
    require_bars(bars, 1)?;
    let last = &bars[bars.len() - 1];
    Ok(PivotLevels::from_hlc(last.high, last.low, last.close))
}
