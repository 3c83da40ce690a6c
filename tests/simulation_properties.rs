//! Property tests for simulator invariants.
//!
//! Over random weekly closes and momentum states:
//! 1. Accounting closure: total = cash + holdings, cash never negative
//! 2. Position limit: open positions never exceed `max_positions`
//! 3. Ledger consistency: held shares equal buys minus sells
//! 4. N2 exit: a position seeing N2 is gone by the end of that week

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use std::collections::BTreeMap;
use trendfolio::domain::config::SimulationConfig;
use trendfolio::domain::entry::{EntryEvaluation, EntryFlag, Grade, RewardRisk};
use trendfolio::domain::error::IndicatorError;
use trendfolio::domain::position::TradeSide;
use trendfolio::domain::quality::Rating;
use trendfolio::domain::simulator::{SecuritySnapshot, Simulator, WeeklySnapshot};
use trendfolio::domain::trend::{Classified, CompositeSignal, MomentumState};

const TICKERS: [&str; 4] = ["AAA", "BBB", "CCC", "DDD"];

#[derive(Debug, Clone)]
struct Cell {
    close: f64,
    momentum: MomentumState,
    rating: Option<Rating>,
}

// ── Strategies ───────────────────────────────────────────────────────

fn arb_momentum() -> impl Strategy<Value = MomentumState> {
    prop_oneof![
        3 => Just(MomentumState::P1),
        1 => Just(MomentumState::P2),
        1 => Just(MomentumState::N1),
        1 => Just(MomentumState::N2),
    ]
}

fn arb_rating() -> impl Strategy<Value = Option<Rating>> {
    prop_oneof![
        Just(None),
        Just(Some(Rating::Excellent)),
        Just(Some(Rating::Good)),
        Just(Some(Rating::Ok)),
        Just(Some(Rating::Caution)),
    ]
}

fn arb_cell() -> impl Strategy<Value = Option<Cell>> {
    // roughly one in eight weeks a security has no bar
    prop_oneof![
        1 => Just(None),
        7 => (5.0..800.0_f64, arb_momentum(), arb_rating()).prop_map(|(close, momentum, rating)| {
            Some(Cell {
                close: (close * 100.0).round() / 100.0,
                momentum,
                rating,
            })
        }),
    ]
}

fn arb_weeks() -> impl Strategy<Value = Vec<Vec<Option<Cell>>>> {
    prop::collection::vec(prop::collection::vec(arb_cell(), TICKERS.len()), 1..30)
}

// ── Fixtures ─────────────────────────────────────────────────────────

fn friday(n: usize) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 5).unwrap() + Duration::weeks(n as i64)
}

fn evaluation(ticker: &str, close: f64, rating: Rating) -> EntryEvaluation {
    EntryEvaluation {
        ticker: ticker.to_string(),
        price: close,
        rating,
        entry_flag: EntryFlag::Acceptable,
        nearest_support: Some(close * 0.95),
        reward_risk: RewardRisk {
            stop: close * 0.92,
            target: Some(close * 1.2),
            reward_pct: 20.0,
            risk_pct: 8.0,
            ratio: 2.5,
        },
        quality_score: 60.0,
        grade: Grade::B,
    }
}

fn build_weeks(raw: &[Vec<Option<Cell>>]) -> Vec<WeeklySnapshot> {
    raw.iter()
        .enumerate()
        .map(|(n, row)| {
            let date = friday(n);
            let securities = TICKERS
                .iter()
                .zip(row)
                .filter_map(|(ticker, cell)| {
                    let cell = cell.as_ref()?;
                    Some((
                        ticker.to_string(),
                        SecuritySnapshot {
                            ticker: ticker.to_string(),
                            date,
                            close: cell.close,
                            composite: Classified::State(CompositeSignal::NeutralWait),
                            momentum: Classified::State(cell.momentum),
                            evaluation: cell
                                .rating
                                .map(|r| evaluation(ticker, cell.close, r))
                                .ok_or(IndicatorError::NoVolume),
                        },
                    ))
                })
                .collect();
            WeeklySnapshot { date, securities }
        })
        .collect()
}

fn config() -> SimulationConfig {
    SimulationConfig {
        max_positions: 2,
        default_position_pct: 30.0,
        ..SimulationConfig::default()
    }
}

// ── Properties ───────────────────────────────────────────────────────

proptest! {
    #[test]
    fn accounting_closes_after_every_step(raw in arb_weeks()) {
        let config = config();
        let weeks = build_weeks(&raw);
        let mut sim = Simulator::new(&config);

        for week in &weeks {
            sim.step(week);
            let point = sim.equity().last().unwrap();
            prop_assert!(point.cash >= -1e-9);
            prop_assert!((point.total_value - point.cash - point.holdings_value).abs() < 1e-6);
            prop_assert!(sim.state().open_count() <= config.max_positions);
        }
    }

    #[test]
    fn held_shares_match_the_ledger(raw in arb_weeks()) {
        let config = config();
        let mut sim = Simulator::new(&config);
        for week in &build_weeks(&raw) {
            sim.step(week);
        }
        let result = sim.finish();

        let mut net: BTreeMap<&str, i64> = BTreeMap::new();
        for trade in &result.trades {
            let signed = match trade.side {
                TradeSide::Buy => trade.shares as i64,
                TradeSide::Sell => -(trade.shares as i64),
            };
            *net.entry(trade.ticker.as_str()).or_default() += signed;
        }
        for ticker in TICKERS {
            let held = result
                .final_state
                .get_position(ticker)
                .map_or(0, |p| p.shares as i64);
            prop_assert_eq!(net.get(ticker).copied().unwrap_or(0), held);
        }
    }

    #[test]
    fn n2_leaves_no_position(raw in arb_weeks()) {
        let config = config();
        let weeks = build_weeks(&raw);
        let mut sim = Simulator::new(&config);

        for week in &weeks {
            sim.step(week);
            for (ticker, security) in &week.securities {
                if security.momentum.state() == Some(MomentumState::N2) {
                    prop_assert!(!sim.state().has_position(ticker));
                }
            }
        }
    }
}
