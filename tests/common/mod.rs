#![allow(dead_code)]

use chrono::{Datelike, Duration, NaiveDate, Weekday};
use std::cell::Cell;
use std::collections::BTreeMap;
use trendfolio::domain::error::TrendfolioError;
use trendfolio::domain::metrics::Metrics;
pub use trendfolio::domain::ohlcv::OhlcvBar;
use trendfolio::domain::scanner::ScanReport;
use trendfolio::domain::simulator::SimulationResult;
use trendfolio::ports::data_port::DataPort;
use trendfolio::ports::report_port::ReportPort;

pub struct MockDataPort {
    pub data: BTreeMap<String, Vec<OhlcvBar>>,
    pub errors: BTreeMap<String, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }

    pub fn with_bars(mut self, code: &str, bars: Vec<OhlcvBar>) -> Self {
        self.data.insert(code.to_string(), bars);
        self
    }

    pub fn with_error(mut self, code: &str, reason: &str) -> Self {
        self.errors.insert(code.to_string(), reason.to_string());
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, TrendfolioError> {
        if let Some(reason) = self.errors.get(code) {
            return Err(TrendfolioError::Data {
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(code)
            .map(|bars| {
                bars.iter()
                    .filter(|b| start_date.is_none_or(|s| b.date >= s))
                    .filter(|b| end_date.is_none_or(|e| b.date <= e))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self) -> Result<Vec<String>, TrendfolioError> {
        Ok(self.data.keys().cloned().collect())
    }
}

/// Counts writes without touching the filesystem.
#[derive(Default)]
pub struct RecordingReportPort {
    pub backtests: Cell<usize>,
    pub scans: Cell<usize>,
}

impl ReportPort for RecordingReportPort {
    fn write_backtest(
        &self,
        _result: &SimulationResult,
        _metrics: &Metrics,
    ) -> Result<(), TrendfolioError> {
        self.backtests.set(self.backtests.get() + 1);
        Ok(())
    }

    fn write_scan(&self, _report: &ScanReport) -> Result<(), TrendfolioError> {
        self.scans.set(self.scans.get() + 1);
        Ok(())
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// `n` weekday bars from Monday 2022-01-03, closes given by `price(i)`.
pub fn trading_days(code: &str, n: usize, price: impl Fn(usize) -> f64) -> Vec<OhlcvBar> {
    let mut day = date(2022, 1, 3);
    let mut bars = Vec::with_capacity(n);
    while bars.len() < n {
        if !matches!(day.weekday(), Weekday::Sat | Weekday::Sun) {
            let i = bars.len();
            let close = price(i);
            bars.push(OhlcvBar {
                code: code.to_string(),
                date: day,
                open: close * 0.998,
                high: close * 1.01,
                low: close * 0.99,
                close,
                volume: 100_000 + (i % 5) as i64 * 10_000,
            });
        }
        day += Duration::days(1);
    }
    bars
}

/// Steady climb of `step` per day from `start`.
pub fn uptrend(code: &str, n: usize, start: f64, step: f64) -> Vec<OhlcvBar> {
    trading_days(code, n, |i| start + step * i as f64)
}

/// Climbs for `rise` days, then falls 2% a day for `fall` days.
pub fn rise_then_crash(code: &str, rise: usize, fall: usize) -> Vec<OhlcvBar> {
    let peak = 100.0 + 0.5 * (rise - 1) as f64;
    trading_days(code, rise + fall, |i| {
        if i < rise {
            100.0 + 0.5 * i as f64
        } else {
            peak * 0.98_f64.powi((i + 1 - rise) as i32)
        }
    })
}
