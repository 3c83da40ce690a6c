//! Report output port trait.

use crate::domain::error::TrendfolioError;
use crate::domain::metrics::Metrics;
use crate::domain::scanner::ScanReport;
use crate::domain::simulator::SimulationResult;

/// Port for writing simulation and scan results.
pub trait ReportPort {
    /// Trade ledger, equity curve, skip log and summary metrics.
    fn write_backtest(
        &self,
        result: &SimulationResult,
        metrics: &Metrics,
    ) -> Result<(), TrendfolioError>;

    fn write_scan(&self, report: &ScanReport) -> Result<(), TrendfolioError>;
}
