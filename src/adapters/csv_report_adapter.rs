//! CSV/JSON report adapter.
//!
//! Writes into one output directory:
//! - `trades.csv`, `equity.csv`, `skipped.csv` and `summary.json` for a backtest
//! - `scan.csv` and `skipped.csv` for a scan
//!
//! Every CSV carries its header even when it has no rows.

use crate::domain::error::TrendfolioError;
use crate::domain::metrics::Metrics;
use crate::domain::scanner::ScanReport;
use crate::domain::simulator::SimulationResult;
use crate::ports::report_port::ReportPort;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const TRADES_HEADER: [&str; 8] = [
    "ticker",
    "side",
    "date",
    "price",
    "shares",
    "realized_pl",
    "realized_pl_pct",
    "reason",
];
const EQUITY_HEADER: [&str; 4] = ["date", "cash", "holdings_value", "total_value"];
const SKIPPED_HEADER: [&str; 3] = ["date", "ticker", "reason"];
const SCAN_HEADER: [&str; 11] = [
    "rank",
    "ticker",
    "date",
    "close",
    "composite",
    "momentum",
    "rating",
    "entry_flag",
    "reward_risk",
    "quality_score",
    "grade",
];

pub struct CsvReportAdapter {
    output_dir: PathBuf,
}

fn report_err(path: &Path, e: impl std::fmt::Display) -> TrendfolioError {
    TrendfolioError::Report {
        reason: format!("{}: {}", path.display(), e),
    }
}

impl CsvReportAdapter {
    pub fn new(output_dir: PathBuf) -> Self {
        Self { output_dir }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    fn prepare(&self) -> Result<(), TrendfolioError> {
        fs::create_dir_all(&self.output_dir).map_err(|e| report_err(&self.output_dir, e))
    }

    fn write_csv<T: Serialize>(
        &self,
        name: &str,
        header: &[&str],
        rows: &[T],
    ) -> Result<(), TrendfolioError> {
        let path = self.output_dir.join(name);
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&path)
            .map_err(|e| report_err(&path, e))?;
        wtr.write_record(header).map_err(|e| report_err(&path, e))?;
        for row in rows {
            wtr.serialize(row).map_err(|e| report_err(&path, e))?;
        }
        wtr.flush().map_err(|e| report_err(&path, e))
    }
}

impl ReportPort for CsvReportAdapter {
    fn write_backtest(
        &self,
        result: &SimulationResult,
        metrics: &Metrics,
    ) -> Result<(), TrendfolioError> {
        self.prepare()?;
        self.write_csv("trades.csv", &TRADES_HEADER, &result.trades)?;
        self.write_csv("equity.csv", &EQUITY_HEADER, &result.equity)?;
        self.write_csv("skipped.csv", &SKIPPED_HEADER, &result.skipped)?;

        let path = self.output_dir.join("summary.json");
        let json = serde_json::to_string_pretty(metrics).map_err(|e| report_err(&path, e))?;
        fs::write(&path, json).map_err(|e| report_err(&path, e))?;

        tracing::info!(dir = %self.output_dir.display(), "backtest report written");
        Ok(())
    }

    fn write_scan(&self, report: &ScanReport) -> Result<(), TrendfolioError> {
        self.prepare()?;
        self.write_csv("scan.csv", &SCAN_HEADER, &report.rows)?;
        self.write_csv("skipped.csv", &SKIPPED_HEADER, &report.skipped)?;
        tracing::info!(dir = %self.output_dir.display(), "scan report written");
        Ok(())
    }
}
