//! Ticker universe: parses the configured list and loads each security,
//! skipping the ones without enough history.

use crate::domain::error::TrendfolioError;
use crate::domain::security_data::SecurityData;
use crate::ports::data_port::DataPort;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone)]
pub struct Universe {
    pub securities: Vec<SecurityData>,
}

impl Universe {
    pub fn count(&self) -> usize {
        self.securities.len()
    }

    pub fn tickers(&self) -> impl Iterator<Item = &str> {
        self.securities.iter().map(|s| s.ticker.as_str())
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum UniverseError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateCode(String),
}

pub fn parse_codes(input: &str) -> Result<Vec<String>, UniverseError> {
    let mut codes = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(UniverseError::EmptyToken);
        }
        let code = trimmed.to_uppercase();
        if !seen.insert(code.clone()) {
            return Err(UniverseError::DuplicateCode(code));
        }
        codes.push(code);
    }

    Ok(codes)
}

#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    NoData { detail: String },
    InsufficientBars { bars: usize, minimum: usize },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NoData { detail } => write!(f, "no data ({})", detail),
            SkipReason::InsufficientBars { bars, minimum } => {
                write!(f, "only {} bars, minimum {} required", bars, minimum)
            }
        }
    }
}

/// One line of the skip log. `date` is `None` for whole-run exclusions.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkipRecord {
    pub date: Option<NaiveDate>,
    pub ticker: String,
    pub reason: String,
}

impl SkipRecord {
    pub fn new(date: Option<NaiveDate>, ticker: &str, reason: impl Into<String>) -> Self {
        SkipRecord {
            date,
            ticker: ticker.to_string(),
            reason: reason.into(),
        }
    }
}

pub struct UniverseValidationResult {
    pub universe: Universe,
    pub skipped: Vec<SkipRecord>,
}

/// Load every ticker's bars up to `end_date`.
///
/// Warmup history before the evaluation window is kept, so no start bound is
/// applied here. Fails only when no ticker survives.
pub fn validate_universe(
    data_port: &dyn DataPort,
    tickers: &[String],
    end_date: Option<NaiveDate>,
    minimum_bars: usize,
) -> Result<UniverseValidationResult, TrendfolioError> {
    let mut securities = Vec::new();
    let mut skipped = Vec::new();

    for ticker in tickers {
        let reason = match data_port.fetch_ohlcv(ticker, None, end_date) {
            Err(e) => SkipReason::NoData {
                detail: e.to_string(),
            },
            Ok(bars) if bars.is_empty() => SkipReason::NoData {
                detail: "no bars in range".to_string(),
            },
            Ok(bars) if bars.len() < minimum_bars => SkipReason::InsufficientBars {
                bars: bars.len(),
                minimum: minimum_bars,
            },
            Ok(bars) => {
                tracing::debug!(ticker = %ticker, bars = bars.len(), "loaded");
                securities.push(SecurityData::new(ticker.clone(), bars));
                continue;
            }
        };
        tracing::warn!(ticker = %ticker, %reason, "skipping security");
        skipped.push(SkipRecord::new(None, ticker, reason.to_string()));
    }

    if securities.is_empty() {
        return Err(TrendfolioError::InsufficientData {
            code: "all".to_string(),
            bars: 0,
            minimum: minimum_bars,
        });
    }

    if !skipped.is_empty() {
        tracing::info!(
            loaded = securities.len(),
            requested = tickers.len(),
            "universe reduced"
        );
    }

    Ok(UniverseValidationResult {
        universe: Universe { securities },
        skipped,
    })
}
