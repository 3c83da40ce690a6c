//! Order execution against the portfolio.
//!
//! Fills happen at the evaluation close times a fixed slippage multiplier,
//! in whole shares, never spending more cash than the portfolio holds.

use chrono::NaiveDate;

use super::fill::FillLevel;
use super::portfolio::PortfolioState;
use super::position::{Position, PositionStatus, Trade, TradeReason};
use super::quality::Rating;

/// Multiplicative slippage applied to the reference close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlippageModel {
    pub buy_multiplier: f64,
    pub sell_multiplier: f64,
}

impl Default for SlippageModel {
    fn default() -> Self {
        SlippageModel {
            buy_multiplier: 1.015,
            sell_multiplier: 0.99,
        }
    }
}

impl SlippageModel {
    pub fn buy_price(&self, close: f64) -> f64 {
        close * self.buy_multiplier
    }

    pub fn sell_price(&self, close: f64) -> f64 {
        close * self.sell_multiplier
    }
}

/// Whole shares buyable with `budget`, truncated to what `cash` affords.
pub fn affordable_shares(budget: f64, execution_price: f64, cash: f64) -> u64 {
    if execution_price <= 0.0 || budget <= 0.0 || cash <= 0.0 {
        return 0;
    }
    let wanted = (budget / execution_price).floor();
    let affordable = (cash / execution_price).floor();
    let mut shares = wanted.min(affordable).max(0.0) as u64;
    // the rounded quotient can overshoot cash by an ulp
    while shares > 0 && shares as f64 * execution_price > cash {
        shares -= 1;
    }
    shares
}

/// Parameters for opening a new position.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryOrder {
    pub ticker: String,
    pub date: NaiveDate,
    pub close: f64,
    pub target_allocation_pct: f64,
    pub target_dollars: f64,
    pub fill: FillLevel,
    pub entry_rating: Rating,
}

/// Open a position at `order.fill` of its target dollars.
///
/// Returns `None` when the order rounds to zero shares.
pub fn open_position(
    portfolio: &mut PortfolioState,
    order: &EntryOrder,
    slippage: &SlippageModel,
) -> Option<Trade> {
    if portfolio.has_position(&order.ticker) {
        return None;
    }
    let execution_price = slippage.buy_price(order.close);
    let budget = order.target_dollars * order.fill.fraction();
    let shares = affordable_shares(budget, execution_price, portfolio.cash);
    if shares == 0 {
        return None;
    }

    portfolio.cash -= shares as f64 * execution_price;
    portfolio.positions.insert(
        order.ticker.clone(),
        Position {
            ticker: order.ticker.clone(),
            entry_date: order.date,
            avg_cost: execution_price,
            shares,
            fill: order.fill,
            target_allocation_pct: order.target_allocation_pct,
            target_dollars: order.target_dollars,
            entry_rating: order.entry_rating,
            status: PositionStatus::Open,
        },
    );

    Some(Trade::buy(
        &order.ticker,
        order.date,
        execution_price,
        shares,
        TradeReason::NewEntry,
    ))
}

/// Buy the difference between the current fill and `new_fill`.
pub fn add_to_position(
    portfolio: &mut PortfolioState,
    ticker: &str,
    date: NaiveDate,
    close: f64,
    new_fill: FillLevel,
    slippage: &SlippageModel,
) -> Option<Trade> {
    let cash = portfolio.cash;
    let position = portfolio.positions.get_mut(ticker)?;
    if new_fill <= position.fill {
        return None;
    }

    let execution_price = slippage.buy_price(close);
    let budget = position.target_dollars * (new_fill.fraction() - position.fill.fraction());
    let shares = affordable_shares(budget, execution_price, cash);
    if shares == 0 {
        return None;
    }

    position.add(shares, execution_price);
    position.fill = new_fill;
    portfolio.cash -= shares as f64 * execution_price;

    Some(Trade::buy(
        ticker,
        date,
        execution_price,
        shares,
        TradeReason::AddOn,
    ))
}

/// Sell the whole position and remove it from the portfolio.
pub fn exit_position(
    portfolio: &mut PortfolioState,
    ticker: &str,
    date: NaiveDate,
    close: f64,
    slippage: &SlippageModel,
) -> Option<Trade> {
    let mut position = portfolio.positions.remove(ticker)?;
    let execution_price = slippage.sell_price(close);
    let shares = position.shares;
    let realized = position.reduce(shares, execution_price);
    portfolio.cash += shares as f64 * execution_price;

    Some(Trade::sell(ticker, date, execution_price, shares, realized))
}
