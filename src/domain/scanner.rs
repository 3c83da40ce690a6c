//! Snapshot pipeline: classifies every security at every evaluation date,
//! and the live scan over each security's latest bar.

use crate::domain::config::SimulationConfig;
use crate::domain::entry::{EntryEvaluation, evaluate_entry, rank_candidates};
use crate::domain::quality::rate_levels;
use crate::domain::security_data::SecurityData;
use crate::domain::simulator::{SecuritySnapshot, WeeklySnapshot};
use crate::domain::snapshot::build_snapshot;
use crate::domain::trend::{Classified, classify_composite, classify_momentum};
use crate::domain::universe::SkipRecord;
use chrono::{Datelike, NaiveDate};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

/// Classify `data` as of `date`.
///
/// Returns `None` when the security has no bar in the week ending at `date`.
/// A missing indicator snapshot is kept as the `evaluation` error; momentum
/// and composite are still classified.
pub fn snapshot_security(
    data: &SecurityData,
    date: NaiveDate,
    config: &SimulationConfig,
) -> Option<SecuritySnapshot> {
    let view = data.at(date);
    let last = view.daily.last()?;
    if last.date.iso_week() != date.iso_week() {
        return None;
    }

    let composite = classify_composite(view.weekly, view.daily, &config.trend);
    let momentum = classify_momentum(view.daily, view.weekly, &config.trend);
    let evaluation = match build_snapshot(view.daily, view.weekly, &config.indicators) {
        Ok(snapshot) => {
            let levels = rate_levels(&snapshot, &config.quality);
            Ok(evaluate_entry(
                &snapshot,
                &levels,
                config.price_target(&data.ticker),
                &config.entry,
                &config.quality,
            ))
        }
        Err(e) => {
            tracing::trace!(ticker = %data.ticker, %date, error = %e, "no indicator snapshot");
            Err(e)
        }
    };

    Some(SecuritySnapshot {
        ticker: data.ticker.clone(),
        date: last.date,
        close: last.close,
        composite,
        momentum,
        evaluation,
    })
}

/// One [`WeeklySnapshot`] per date, securities processed in parallel.
pub fn build_weekly_snapshots(
    securities: &[SecurityData],
    dates: &[NaiveDate],
    config: &SimulationConfig,
) -> Vec<WeeklySnapshot> {
    let per_security: Vec<Vec<Option<SecuritySnapshot>>> = securities
        .par_iter()
        .map(|data| {
            dates
                .iter()
                .map(|&date| snapshot_security(data, date, config))
                .collect()
        })
        .collect();

    let mut weeks: Vec<WeeklySnapshot> = dates
        .iter()
        .map(|&date| WeeklySnapshot {
            date,
            securities: BTreeMap::new(),
        })
        .collect();
    for row in per_security {
        for (week, snapshot) in weeks.iter_mut().zip(row) {
            if let Some(s) = snapshot {
                week.securities.insert(s.ticker.clone(), s);
            }
        }
    }
    weeks
}

/// One line of scan output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanRow {
    pub rank: Option<usize>,
    pub ticker: String,
    pub date: NaiveDate,
    pub close: f64,
    pub composite: Option<String>,
    pub momentum: Option<String>,
    pub rating: Option<String>,
    pub entry_flag: Option<String>,
    pub reward_risk: Option<f64>,
    pub quality_score: Option<f64>,
    pub grade: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScanReport {
    pub rows: Vec<ScanRow>,
    pub skipped: Vec<SkipRecord>,
}

impl ScanReport {
    pub fn ranked(&self) -> impl Iterator<Item = &ScanRow> {
        self.rows.iter().filter(|r| r.rank.is_some())
    }
}

fn label<S: fmt::Display + Copy>(classified: &Classified<S>) -> Option<String> {
    classified.state().map(|s| s.to_string())
}

fn scan_row(snapshot: &SecuritySnapshot, rank: Option<usize>, evaluation: Option<&EntryEvaluation>) -> ScanRow {
    ScanRow {
        rank,
        ticker: snapshot.ticker.clone(),
        date: snapshot.date,
        close: snapshot.close,
        composite: label(&snapshot.composite),
        momentum: label(&snapshot.momentum),
        rating: evaluation.map(|e| e.rating.to_string()),
        entry_flag: evaluation.map(|e| e.entry_flag.to_string()),
        reward_risk: evaluation.map(|e| e.reward_risk_ratio()),
        quality_score: evaluation.map(|e| e.quality_score),
        grade: evaluation.map(|e| e.grade.to_string()),
    }
}

/// Classify every security at its own latest bar and rank the evaluated ones.
///
/// Ranked rows come first in rank order; unevaluated securities follow by ticker.
pub fn scan(securities: &[SecurityData], config: &SimulationConfig) -> ScanReport {
    let snapshots: Vec<SecuritySnapshot> = securities
        .par_iter()
        .filter_map(|data| {
            let date = data.last_date()?;
            snapshot_security(data, date, config)
        })
        .collect();
    let by_ticker: BTreeMap<&str, &SecuritySnapshot> =
        snapshots.iter().map(|s| (s.ticker.as_str(), s)).collect();

    let mut skipped = Vec::new();
    for snapshot in by_ticker.values() {
        let reason = match (&snapshot.momentum, &snapshot.evaluation) {
            (Classified::Unavailable { bars, required }, _) => {
                format!("momentum unavailable: have {} bars, need {}", bars, required)
            }
            (Classified::State(_), Err(e)) => format!("indicator snapshot unavailable: {}", e),
            (Classified::State(_), Ok(_)) => continue,
        };
        skipped.push(SkipRecord::new(Some(snapshot.date), &snapshot.ticker, reason));
    }

    let ranked = rank_candidates(
        by_ticker
            .values()
            .filter_map(|s| s.evaluation.clone().ok())
            .collect(),
    );

    let mut rows: Vec<ScanRow> = ranked
        .iter()
        .filter_map(|c| {
            let snapshot = by_ticker.get(c.evaluation.ticker.as_str())?;
            Some(scan_row(snapshot, Some(c.rank), Some(&c.evaluation)))
        })
        .collect();
    rows.extend(
        by_ticker
            .values()
            .filter(|s| s.evaluation.is_err())
            .map(|s| scan_row(s, None, None)),
    );

    tracing::info!(
        securities = by_ticker.len(),
        ranked = ranked.len(),
        "scan complete"
    );
    ScanReport { rows, skipped }
}
