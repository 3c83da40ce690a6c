//! Performance metrics over a trade ledger and weekly equity series.
//!
//! Every metric is `None` when the ledger is empty; trade statistics are also
//! `None` until at least one position has been sold.

use super::portfolio::EquityPoint;
use super::position::{Trade, TradeSide};
use serde::Serialize;

const WEEKS_PER_YEAR: f64 = 52.0;
const DAYS_PER_YEAR: f64 = 365.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metrics {
    pub starting_equity: f64,
    pub final_equity: f64,
    pub trade_count: usize,
    pub closed_trade_count: usize,
    pub total_return: Option<f64>,
    pub cagr: Option<f64>,
    pub max_drawdown: Option<f64>,
    pub sharpe_ratio: Option<f64>,
    pub sortino_ratio: Option<f64>,
    pub win_rate: Option<f64>,
    /// Mean realized P/L percent of winning sells.
    pub avg_win_pct: Option<f64>,
    /// Mean realized P/L percent of losing sells (negative).
    pub avg_loss_pct: Option<f64>,
    pub profit_factor: Option<f64>,
}

impl Metrics {
    pub fn compute(
        trades: &[Trade],
        equity: &[EquityPoint],
        starting_equity: f64,
        risk_free_rate: f64,
    ) -> Self {
        let final_equity = equity
            .last()
            .map(|p| p.total_value)
            .unwrap_or(starting_equity);
        let closed: Vec<&Trade> = trades
            .iter()
            .filter(|t| t.side == TradeSide::Sell && t.realized_pl.is_some())
            .collect();

        let mut metrics = Metrics {
            starting_equity,
            final_equity,
            trade_count: trades.len(),
            closed_trade_count: closed.len(),
            total_return: None,
            cagr: None,
            max_drawdown: None,
            sharpe_ratio: None,
            sortino_ratio: None,
            win_rate: None,
            avg_win_pct: None,
            avg_loss_pct: None,
            profit_factor: None,
        };
        if trades.is_empty() || starting_equity <= 0.0 {
            return metrics;
        }

        metrics.total_return = Some(final_equity / starting_equity - 1.0);
        metrics.cagr = compute_cagr(equity, starting_equity, final_equity);
        metrics.max_drawdown = Some(compute_drawdown(equity, starting_equity));
        let (sharpe, sortino) = compute_risk_adjusted(equity, risk_free_rate / WEEKS_PER_YEAR);
        metrics.sharpe_ratio = sharpe;
        metrics.sortino_ratio = sortino;

        if closed.is_empty() {
            return metrics;
        }

        let pl = |t: &&Trade| t.realized_pl.unwrap_or(0.0);
        let pl_pct = |t: &&Trade| t.realized_pl_pct.unwrap_or(0.0);
        let winners: Vec<&Trade> = closed.iter().copied().filter(|t| pl(t) > 0.0).collect();
        let losers: Vec<&Trade> = closed.iter().copied().filter(|t| pl(t) < 0.0).collect();

        metrics.win_rate = Some(winners.len() as f64 / closed.len() as f64);
        metrics.avg_win_pct = mean(winners.iter().map(pl_pct));
        metrics.avg_loss_pct = mean(losers.iter().map(pl_pct));

        let gross_win: f64 = winners.iter().map(pl).sum();
        let gross_loss: f64 = losers.iter().map(|t| pl(t).abs()).sum();
        metrics.profit_factor = (gross_loss > 0.0).then(|| gross_win / gross_loss);

        metrics
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, n) = values.fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}

fn compute_cagr(equity: &[EquityPoint], starting: f64, final_equity: f64) -> Option<f64> {
    let (first, last) = (equity.first()?, equity.last()?);
    let days = (last.date - first.date).num_days();
    if days <= 0 || final_equity <= 0.0 {
        return None;
    }
    Some((final_equity / starting).powf(DAYS_PER_YEAR / days as f64) - 1.0)
}

/// Largest peak-to-trough fall as a fraction of the peak.
fn compute_drawdown(equity: &[EquityPoint], starting: f64) -> f64 {
    let mut peak = starting;
    let mut max_dd = 0.0_f64;
    for point in equity {
        if point.total_value > peak {
            peak = point.total_value;
        } else if peak > 0.0 {
            max_dd = max_dd.max((peak - point.total_value) / peak);
        }
    }
    max_dd
}

fn compute_risk_adjusted(equity: &[EquityPoint], weekly_rf: f64) -> (Option<f64>, Option<f64>) {
    let returns: Vec<f64> = equity
        .windows(2)
        .filter(|w| w[0].total_value > 0.0)
        .map(|w| w[1].total_value / w[0].total_value - 1.0)
        .collect();
    if returns.len() < 2 {
        return (None, None);
    }

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;
    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    let excess_return = mean - weekly_rf;

    let sharpe = (stddev > 0.0).then(|| excess_return / stddev * WEEKS_PER_YEAR.sqrt());

    let downside_variance: f64 = returns
        .iter()
        .filter(|&&r| r < weekly_rf)
        .map(|&r| (r - weekly_rf).powi(2))
        .sum::<f64>()
        / n;
    let downside = downside_variance.sqrt();
    let sortino = (downside > 0.0).then(|| excess_return / downside * WEEKS_PER_YEAR.sqrt());

    (sharpe, sortino)
}
