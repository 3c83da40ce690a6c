//! Portfolio state and equity tracking.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::position::Position;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub cash: f64,
    pub holdings_value: f64,
    pub total_value: f64,
}

/// Cash plus open positions, keyed by ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct PortfolioState {
    pub cash: f64,
    pub positions: BTreeMap<String, Position>,
    pub as_of_date: Option<NaiveDate>,
}

impl PortfolioState {
    pub fn new(starting_cash: f64) -> Self {
        PortfolioState {
            cash: starting_cash,
            positions: BTreeMap::new(),
            as_of_date: None,
        }
    }

    pub fn get_position(&self, ticker: &str) -> Option<&Position> {
        self.positions.get(ticker)
    }

    pub fn has_position(&self, ticker: &str) -> bool {
        self.positions.contains_key(ticker)
    }

    pub fn open_count(&self) -> usize {
        self.positions.len()
    }

    /// Holdings at `prices`; a ticker without a price is valued at its average cost.
    pub fn holdings_value(&self, prices: &BTreeMap<String, f64>) -> f64 {
        self.positions
            .values()
            .map(|pos| {
                let price = prices.get(&pos.ticker).copied().unwrap_or(pos.avg_cost);
                pos.market_value(price)
            })
            .sum()
    }

    pub fn total_equity(&self, prices: &BTreeMap<String, f64>) -> f64 {
        self.cash + self.holdings_value(prices)
    }

    pub fn equity_point(&self, date: NaiveDate, prices: &BTreeMap<String, f64>) -> EquityPoint {
        let holdings_value = self.holdings_value(prices);
        EquityPoint {
            date,
            cash: self.cash,
            holdings_value,
            total_value: self.cash + holdings_value,
        }
    }
}
