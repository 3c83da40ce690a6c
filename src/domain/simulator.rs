//! Weekly portfolio simulation.
//!
//! Each step evaluates one week-end snapshot and runs, in order: the exit
//! pass, the add-on pass, the new-entry pass, then records equity. Orders
//! are dated the following Monday and filled at the week-end close times
//! the slippage multiplier.

use crate::domain::config::SimulationConfig;
use crate::domain::entry::{EntryEvaluation, rank_candidates};
use crate::domain::error::IndicatorError;
use crate::domain::execution::{EntryOrder, add_to_position, exit_position, open_position};
use crate::domain::fill::{detect_add_on, initial_fill};
use crate::domain::portfolio::{EquityPoint, PortfolioState};
use crate::domain::position::Trade;
use crate::domain::trend::{Classified, CompositeSignal, MomentumState};
use crate::domain::universe::SkipRecord;
use chrono::{Datelike, Duration, NaiveDate};
use std::collections::BTreeMap;

/// One security's classification at an evaluation date.
#[derive(Debug, Clone, PartialEq)]
pub struct SecuritySnapshot {
    pub ticker: String,
    pub date: NaiveDate,
    pub close: f64,
    pub composite: Classified<CompositeSignal>,
    pub momentum: Classified<MomentumState>,
    /// Why the indicator snapshot could not be built, when it could not.
    pub evaluation: Result<EntryEvaluation, IndicatorError>,
}

/// Every security visible at one week-end, keyed by ticker.
#[derive(Debug, Clone, PartialEq)]
pub struct WeeklySnapshot {
    pub date: NaiveDate,
    pub securities: BTreeMap<String, SecuritySnapshot>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationResult {
    pub trades: Vec<Trade>,
    pub equity: Vec<EquityPoint>,
    pub skipped: Vec<SkipRecord>,
    pub final_state: PortfolioState,
}

/// Monday following `date`.
pub fn execution_date(date: NaiveDate) -> NaiveDate {
    date + Duration::days(8 - date.weekday().number_from_monday() as i64)
}

pub struct Simulator<'a> {
    config: &'a SimulationConfig,
    state: PortfolioState,
    last_prices: BTreeMap<String, f64>,
    prev_momentum: BTreeMap<String, MomentumState>,
    trades: Vec<Trade>,
    equity: Vec<EquityPoint>,
    skipped: Vec<SkipRecord>,
}

impl<'a> Simulator<'a> {
    pub fn new(config: &'a SimulationConfig) -> Self {
        Self::with_state(config, PortfolioState::new(config.starting_cash))
    }

    pub fn with_state(config: &'a SimulationConfig, state: PortfolioState) -> Self {
        Simulator {
            config,
            state,
            last_prices: BTreeMap::new(),
            prev_momentum: BTreeMap::new(),
            trades: Vec::new(),
            equity: Vec::new(),
            skipped: Vec::new(),
        }
    }

    pub fn state(&self) -> &PortfolioState {
        &self.state
    }

    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn equity(&self) -> &[EquityPoint] {
        &self.equity
    }

    pub fn step(&mut self, week: &WeeklySnapshot) {
        let exec_date = execution_date(week.date);
        for (ticker, security) in &week.securities {
            self.last_prices.insert(ticker.clone(), security.close);
        }

        let momentum = self.available_momentum(week);
        self.record_unevaluated(week, &momentum);

        self.exit_pass(week, &momentum, exec_date);
        let equity_after_exits = self.state.total_equity(&self.last_prices);
        self.add_on_pass(week, &momentum, exec_date);
        self.entry_pass(week, &momentum, equity_after_exits, exec_date);

        self.prev_momentum = momentum;
        self.state.as_of_date = Some(week.date);
        let point = self.state.equity_point(week.date, &self.last_prices);
        tracing::debug!(
            date = %week.date,
            cash = point.cash,
            total = point.total_value,
            open = self.state.open_count(),
            "week closed"
        );
        self.equity.push(point);
    }

    pub fn finish(self) -> SimulationResult {
        SimulationResult {
            trades: self.trades,
            equity: self.equity,
            skipped: self.skipped,
            final_state: self.state,
        }
    }

    fn available_momentum(&mut self, week: &WeeklySnapshot) -> BTreeMap<String, MomentumState> {
        let mut states = BTreeMap::new();
        for (ticker, security) in &week.securities {
            match security.momentum {
                Classified::State(state) => {
                    states.insert(ticker.clone(), state);
                }
                Classified::Unavailable { bars, required } => {
                    self.skipped.push(SkipRecord::new(
                        Some(week.date),
                        ticker,
                        format!("momentum unavailable: have {} bars, need {}", bars, required),
                    ));
                }
            }
        }
        states
    }

    /// Classified securities without an entry evaluation sit out the entry pass.
    fn record_unevaluated(&mut self, week: &WeeklySnapshot, momentum: &BTreeMap<String, MomentumState>) {
        for (ticker, security) in &week.securities {
            if let (Err(e), true) = (&security.evaluation, momentum.contains_key(ticker)) {
                self.skipped.push(SkipRecord::new(
                    Some(week.date),
                    ticker,
                    format!("indicator snapshot unavailable: {}", e),
                ));
            }
        }
    }

    fn record(&mut self, trade: Trade) {
        tracing::debug!(
            ticker = %trade.ticker,
            side = ?trade.side,
            reason = %trade.reason,
            shares = trade.shares,
            price = trade.price,
            "trade"
        );
        self.trades.push(trade);
    }

    fn exit_pass(
        &mut self,
        week: &WeeklySnapshot,
        momentum: &BTreeMap<String, MomentumState>,
        date: NaiveDate,
    ) {
        let held: Vec<String> = self.state.positions.keys().cloned().collect();
        for ticker in held {
            let (Some(security), Some(state)) = (week.securities.get(&ticker), momentum.get(&ticker))
            else {
                continue;
            };
            if !state.must_exit() {
                continue;
            }
            if let Some(trade) =
                exit_position(&mut self.state, &ticker, date, security.close, &self.config.slippage)
            {
                self.record(trade);
            }
        }
    }

    fn add_on_pass(
        &mut self,
        week: &WeeklySnapshot,
        momentum: &BTreeMap<String, MomentumState>,
        date: NaiveDate,
    ) {
        let add_ons: Vec<_> = self
            .state
            .positions
            .values()
            .filter(|p| !p.fill.is_full())
            .filter_map(|p| {
                let security = week.securities.get(&p.ticker)?;
                let current = *momentum.get(&p.ticker)?;
                let trigger = detect_add_on(
                    self.prev_momentum.get(&p.ticker).copied(),
                    current,
                    p.entry_rating,
                    security.evaluation.as_ref().ok().map(|e| e.rating),
                )?;
                Some((p.ticker.clone(), p.fill.next(), security.close, trigger))
            })
            .collect();

        for (ticker, new_fill, close, trigger) in add_ons {
            tracing::debug!(ticker = %ticker, %trigger, fill = %new_fill, "add-on");
            match add_to_position(
                &mut self.state,
                &ticker,
                date,
                close,
                new_fill,
                &self.config.slippage,
            ) {
                Some(trade) => self.record(trade),
                None => self.skipped.push(SkipRecord::new(
                    Some(week.date),
                    &ticker,
                    "add-on rounds to zero shares",
                )),
            }
        }
    }

    fn entry_pass(
        &mut self,
        week: &WeeklySnapshot,
        momentum: &BTreeMap<String, MomentumState>,
        equity: f64,
        date: NaiveDate,
    ) {
        let mut slots = self
            .config
            .max_positions
            .saturating_sub(self.state.open_count());
        if slots == 0 {
            return;
        }

        let candidates: Vec<EntryEvaluation> = week
            .securities
            .values()
            .filter(|s| !self.state.has_position(&s.ticker))
            .filter(|s| momentum.get(&s.ticker).is_some_and(|m| m.is_buy_eligible()))
            .filter_map(|s| s.evaluation.clone().ok())
            .collect();

        for candidate in rank_candidates(candidates) {
            if slots == 0 {
                break;
            }
            let (ticker, rating) = (candidate.evaluation.ticker, candidate.evaluation.rating);
            let Some(security) = week.securities.get(&ticker) else {
                continue;
            };
            let allocation = self.config.allocation_pct(&ticker);
            let order = EntryOrder {
                ticker: ticker.clone(),
                date,
                close: security.close,
                target_allocation_pct: allocation,
                target_dollars: equity * allocation / 100.0,
                fill: initial_fill(
                    rating,
                    security.close,
                    self.config.price_target(&ticker),
                    &self.config.fill_tiers,
                ),
                entry_rating: rating,
            };
            match open_position(&mut self.state, &order, &self.config.slippage) {
                Some(trade) => {
                    self.record(trade);
                    slots -= 1;
                }
                None => self.skipped.push(SkipRecord::new(
                    Some(week.date),
                    &ticker,
                    "entry rounds to zero shares",
                )),
            }
        }
    }
}

/// Run every week in order from the configured starting cash.
pub fn run_simulation(weeks: &[WeeklySnapshot], config: &SimulationConfig) -> SimulationResult {
    let mut simulator = Simulator::new(config);
    for week in weeks {
        simulator.step(week);
    }
    let result = simulator.finish();
    tracing::info!(
        weeks = weeks.len(),
        trades = result.trades.len(),
        open = result.final_state.open_count(),
        "simulation complete"
    );
    result
}
