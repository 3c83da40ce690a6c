//! Open positions and the trade ledger.

use crate::domain::fill::FillLevel;
use crate::domain::quality::Rating;
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PositionStatus {
    Open,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub ticker: String,
    pub entry_date: NaiveDate,
    /// Running weighted-average cost of the shares held.
    pub avg_cost: f64,
    pub shares: u64,
    pub fill: FillLevel,
    pub target_allocation_pct: f64,
    pub target_dollars: f64,
    /// Entry-quality tier when the position was opened.
    pub entry_rating: Rating,
    pub status: PositionStatus,
}

/// Realized result of selling part or all of a position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Realized {
    pub pl: f64,
    pub pl_pct: f64,
}

impl Position {
    pub fn market_value(&self, price: f64) -> f64 {
        self.shares as f64 * price
    }

    pub fn cost_basis(&self) -> f64 {
        self.shares as f64 * self.avg_cost
    }

    /// Buy more shares, folding them into the weighted-average cost.
    pub fn add(&mut self, shares: u64, price: f64) {
        if shares == 0 {
            return;
        }
        let total = self.shares + shares;
        self.avg_cost = (self.cost_basis() + shares as f64 * price) / total as f64;
        self.shares = total;
        self.status = PositionStatus::Open;
    }

    /// Sell up to `shares` at `price`. The average cost of what remains is unchanged.
    pub fn reduce(&mut self, shares: u64, price: f64) -> Realized {
        let sold = shares.min(self.shares);
        let pl = sold as f64 * (price - self.avg_cost);
        let pl_pct = if self.avg_cost > 0.0 {
            (price - self.avg_cost) / self.avg_cost * 100.0
        } else {
            0.0
        };
        self.shares -= sold;
        if self.shares == 0 {
            self.status = PositionStatus::Closed;
        }
        Realized { pl, pl_pct }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TradeSide {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TradeReason {
    NewEntry,
    AddOn,
    Exit,
}

impl fmt::Display for TradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TradeReason::NewEntry => write!(f, "NewEntry"),
            TradeReason::AddOn => write!(f, "AddOn"),
            TradeReason::Exit => write!(f, "Exit"),
        }
    }
}

/// One ledger row. Realized fields are set on SELLs only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trade {
    pub ticker: String,
    pub side: TradeSide,
    pub date: NaiveDate,
    pub price: f64,
    pub shares: u64,
    pub realized_pl: Option<f64>,
    pub realized_pl_pct: Option<f64>,
    pub reason: TradeReason,
}

impl Trade {
    pub fn buy(ticker: &str, date: NaiveDate, price: f64, shares: u64, reason: TradeReason) -> Self {
        Trade {
            ticker: ticker.to_string(),
            side: TradeSide::Buy,
            date,
            price,
            shares,
            realized_pl: None,
            realized_pl_pct: None,
            reason,
        }
    }

    pub fn sell(ticker: &str, date: NaiveDate, price: f64, shares: u64, realized: Realized) -> Self {
        Trade {
            ticker: ticker.to_string(),
            side: TradeSide::Sell,
            date,
            price,
            shares,
            realized_pl: Some(realized.pl),
            realized_pl_pct: Some(realized.pl_pct),
            reason: TradeReason::Exit,
        }
    }
}
