//! Per-security bar history and the weekly evaluation calendar.

use crate::domain::ohlcv::{OhlcvBar, normalize_series, resample_weekly};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeSet;

#[derive(Debug, Clone)]
pub struct SecurityData {
    pub ticker: String,
    pub daily: Vec<OhlcvBar>,
    pub weekly: Vec<OhlcvBar>,
}

/// Bars visible at one evaluation date.
#[derive(Debug, Clone, Copy)]
pub struct PointInTime<'a> {
    pub daily: &'a [OhlcvBar],
    pub weekly: &'a [OhlcvBar],
}

impl SecurityData {
    pub fn new(ticker: String, daily: Vec<OhlcvBar>) -> Self {
        let daily = normalize_series(daily);
        let weekly = resample_weekly(&daily);
        Self {
            ticker,
            daily,
            weekly,
        }
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.daily.last().map(|b| b.date)
    }

    /// Bars dated on or before `date`.
    ///
    /// A weekly bar is visible once its last trading day is; a week still in
    /// progress at `date` is left out.
    pub fn at(&self, date: NaiveDate) -> PointInTime<'_> {
        let d = self.daily.partition_point(|b| b.date <= date);
        let w = self.weekly.partition_point(|b| b.date <= date);
        PointInTime {
            daily: &self.daily[..d],
            weekly: &self.weekly[..w],
        }
    }
}

/// Last trading day of every ISO week seen across the universe, within `[start, end]`.
pub fn evaluation_dates(
    securities: &[SecurityData],
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Vec<NaiveDate> {
    let all_dates: BTreeSet<NaiveDate> = securities
        .iter()
        .flat_map(|s| s.daily.iter().map(|bar| bar.date))
        .collect();

    let mut week_ends: Vec<NaiveDate> = Vec::new();
    for date in all_dates {
        match week_ends.last_mut() {
            Some(last) if last.iso_week() == date.iso_week() => *last = date,
            _ => week_ends.push(date),
        }
    }

    week_ends
        .into_iter()
        .filter(|d| start.is_none_or(|s| *d >= s) && end.is_none_or(|e| *d <= e))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bar(code: &str, date: &str, close: f64) -> OhlcvBar {
        OhlcvBar {
            code: code.to_string(),
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            open: close - 1.0,
            high: close + 1.0,
            low: close - 2.0,
            close,
            volume: 1000,
        }
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn new_sorts_and_resamples() {
        let data = SecurityData::new(
            "AAPL".into(),
            vec![
                make_bar("AAPL", "2024-01-09", 102.0),
                make_bar("AAPL", "2024-01-02", 100.0),
                make_bar("AAPL", "2024-01-05", 101.0),
            ],
        );
        assert_eq!(data.daily[0].date, date("2024-01-02"));
        assert_eq!(data.weekly.len(), 2);
        assert_eq!(data.weekly[0].date, date("2024-01-05"));
    }

    #[test]
    fn point_in_time_hides_future_bars() {
        let data = SecurityData::new(
            "AAPL".into(),
            vec![
                make_bar("AAPL", "2024-01-04", 100.0),
                make_bar("AAPL", "2024-01-05", 101.0),
                make_bar("AAPL", "2024-01-08", 102.0),
                make_bar("AAPL", "2024-01-10", 103.0),
                make_bar("AAPL", "2024-01-12", 104.0),
            ],
        );

        let view = data.at(date("2024-01-10"));
        assert_eq!(view.daily.len(), 4);
        assert_eq!(view.daily.last().map(|b| b.close), Some(103.0));
        // the week ending 2024-01-12 is not closed yet
        assert_eq!(view.weekly.len(), 1);

        let friday = data.at(date("2024-01-12"));
        assert_eq!(friday.weekly.len(), 2);
        assert!((friday.weekly[1].close - 104.0).abs() < f64::EPSILON);
    }

    #[test]
    fn evaluation_dates_are_week_ends() {
        let aapl = SecurityData::new(
            "AAPL".into(),
            vec![
                make_bar("AAPL", "2024-01-02", 100.0),
                make_bar("AAPL", "2024-01-04", 101.0),
                make_bar("AAPL", "2024-01-09", 102.0),
            ],
        );
        let msft = SecurityData::new(
            "MSFT".into(),
            vec![
                make_bar("MSFT", "2024-01-05", 50.0),
                make_bar("MSFT", "2024-01-11", 51.0),
            ],
        );

        let dates = evaluation_dates(&[aapl, msft], None, None);
        assert_eq!(dates, vec![date("2024-01-05"), date("2024-01-11")]);
    }

    #[test]
    fn evaluation_dates_respect_range() {
        let aapl = SecurityData::new(
            "AAPL".into(),
            vec![
                make_bar("AAPL", "2024-01-05", 100.0),
                make_bar("AAPL", "2024-01-12", 101.0),
                make_bar("AAPL", "2024-01-19", 102.0),
            ],
        );
        let dates = evaluation_dates(&[aapl], Some(date("2024-01-08")), Some(date("2024-01-15")));
        assert_eq!(dates, vec![date("2024-01-12")]);
    }

    #[test]
    fn empty_universe_has_no_dates() {
        assert!(evaluation_dates(&[], None, None).is_empty());
    }
}
