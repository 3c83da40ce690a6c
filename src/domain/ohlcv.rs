//! OHLCV bar representation and weekly aggregation.

use chrono::{Datelike, IsoWeek, NaiveDate};

#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub code: String,
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: i64,
}

impl OhlcvBar {
    /// (high + low) / 2
    pub fn hl2(&self) -> f64 {
        (self.high + self.low) / 2.0
    }

    /// max(high - low, |high - prev_close|, |low - prev_close|)
    pub fn true_range(&self, prev_close: f64) -> f64 {
        let hl = self.high - self.low;
        let hc = (self.high - prev_close).abs();
        let lc = (self.low - prev_close).abs();
        hl.max(hc).max(lc)
    }
}

/// Sort by date and drop repeated dates, keeping the first bar seen for each.
pub fn normalize_series(mut bars: Vec<OhlcvBar>) -> Vec<OhlcvBar> {
    bars.sort_by_key(|b| b.date);
    bars.dedup_by_key(|b| b.date);
    bars
}

/// Aggregate daily bars into ISO-week bars.
///
/// Each weekly bar is dated on the last trading day present in that week.
/// Input must be sorted ascending by date.
pub fn resample_weekly(daily: &[OhlcvBar]) -> Vec<OhlcvBar> {
    let mut weeks: Vec<OhlcvBar> = Vec::new();
    let mut current_week: Option<IsoWeek> = None;

    for bar in daily {
        let week = bar.date.iso_week();
        match weeks.last_mut() {
            Some(agg) if current_week == Some(week) => {
                agg.date = bar.date;
                agg.high = agg.high.max(bar.high);
                agg.low = agg.low.min(bar.low);
                agg.close = bar.close;
                agg.volume += bar.volume;
            }
            _ => {
                current_week = Some(week);
                weeks.push(bar.clone());
            }
        }
    }

    weeks
}
