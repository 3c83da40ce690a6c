//! Simulation configuration: built from a [`ConfigPort`], validated once,
//! then passed by reference to every component.

use crate::domain::entry::EntryConfig;
use crate::domain::error::TrendfolioError;
use crate::domain::execution::SlippageModel;
use crate::domain::fill::{FillLevel, FillTiers, PriceTarget};
use crate::domain::quality::QualityConfig;
use crate::domain::snapshot::IndicatorConfig;
use crate::domain::trend::TrendConfig;
use crate::domain::universe::parse_codes;
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationConfig {
    pub starting_cash: f64,
    pub default_position_pct: f64,
    pub max_positions: usize,
    /// Per-ticker allocation percent overriding `default_position_pct`.
    pub allocations: BTreeMap<String, f64>,
    pub price_targets: BTreeMap<String, PriceTarget>,
    pub slippage: SlippageModel,
    pub risk_free_rate: f64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub tickers: Vec<String>,
    pub fill_tiers: FillTiers,
    pub indicators: IndicatorConfig,
    pub trend: TrendConfig,
    pub quality: QualityConfig,
    pub entry: EntryConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            starting_cash: 100_000.0,
            default_position_pct: 10.0,
            max_positions: 8,
            allocations: BTreeMap::new(),
            price_targets: BTreeMap::new(),
            slippage: SlippageModel::default(),
            risk_free_rate: 0.04,
            start_date: None,
            end_date: None,
            tickers: Vec::new(),
            fill_tiers: FillTiers::default(),
            indicators: IndicatorConfig::default(),
            trend: TrendConfig::default(),
            quality: QualityConfig::default(),
            entry: EntryConfig::default(),
        }
    }
}

impl SimulationConfig {
    pub fn allocation_pct(&self, ticker: &str) -> f64 {
        self.allocations
            .get(ticker)
            .copied()
            .unwrap_or(self.default_position_pct)
    }

    pub fn price_target(&self, ticker: &str) -> Option<&PriceTarget> {
        self.price_targets.get(ticker)
    }

    /// Daily bars a security needs before it can be classified at all.
    pub fn minimum_bars(&self) -> usize {
        self.indicators
            .longest_period()
            .max(self.trend.momentum_ma_period)
            .max(self.trend.smma_periods.iter().copied().max().unwrap_or(0))
    }

    pub fn validate(&self) -> Result<(), TrendfolioError> {
        if self.starting_cash <= 0.0 {
            return Err(TrendfolioError::invalid_config(
                "starting_cash",
                "must be positive",
            ));
        }
        check_pct("default_position_pct", self.default_position_pct)?;
        if self.max_positions < 1 {
            return Err(TrendfolioError::invalid_config(
                "max_positions",
                "must be at least 1",
            ));
        }

        for (ticker, pct) in &self.allocations {
            check_pct(&format!("allocations.{}", ticker), *pct)?;
        }
        let total: f64 = self.allocations.values().sum();
        if total > 100.0 + 1e-9 {
            return Err(TrendfolioError::invalid_config(
                "allocations",
                format!("allocations sum to {}%, more than 100%", total),
            ));
        }

        for (ticker, target) in &self.price_targets {
            if target.low <= 0.0 || target.low > target.high {
                return Err(TrendfolioError::invalid_config(
                    &format!("price_targets.{}", ticker),
                    "expected 0 < low <= high",
                ));
            }
        }

        if self.slippage.buy_multiplier < 1.0 {
            return Err(TrendfolioError::invalid_config(
                "buy_slippage_multiplier",
                "must be at least 1",
            ));
        }
        if self.slippage.sell_multiplier <= 0.0 || self.slippage.sell_multiplier > 1.0 {
            return Err(TrendfolioError::invalid_config(
                "sell_slippage_multiplier",
                "must be in (0, 1]",
            ));
        }
        if self.risk_free_rate < 0.0 || self.risk_free_rate >= 1.0 {
            return Err(TrendfolioError::invalid_config(
                "risk_free_rate",
                "must be between 0 and 1",
            ));
        }
        check_open_pct("max_stop_distance_pct", self.entry.max_stop_distance_pct)?;
        check_open_pct("min_risk_floor_pct", self.entry.min_risk_floor_pct)?;
        if self.entry.atr_stop_multiple <= 0.0 {
            return Err(TrendfolioError::invalid_config(
                "atr_stop_multiple",
                "must be positive",
            ));
        }

        let tiers = [
            ("fill_tiers.excellent", self.fill_tiers.excellent),
            ("fill_tiers.good", self.fill_tiers.good),
            ("fill_tiers.ok", self.fill_tiers.ok),
            ("fill_tiers.caution", self.fill_tiers.caution),
        ];
        for (key, level) in tiers {
            if level == FillLevel::Zero {
                return Err(TrendfolioError::invalid_config(
                    key,
                    "must be one of 25, 50, 75, 100",
                ));
            }
        }

        if self.indicators.ma_periods.is_empty() || self.indicators.ma_periods.contains(&0) {
            return Err(TrendfolioError::invalid_config(
                "ma_periods",
                "must list at least one positive period",
            ));
        }
        let periods = [
            ("rsi_period", self.indicators.rsi_period),
            ("bollinger_period", self.indicators.bollinger_period),
            ("atr_period", self.indicators.atr_period),
            ("profile_lookback", self.indicators.profile_lookback),
            ("profile_bins", self.indicators.profile_bins),
            ("momentum_ma_period", self.trend.momentum_ma_period),
            ("momentum_roc_weeks", self.trend.momentum_roc_weeks),
        ];
        for (key, value) in periods {
            if value == 0 {
                return Err(TrendfolioError::invalid_config(key, "must be positive"));
            }
        }
        let smma = self.trend.smma_periods;
        if smma[0] == 0 || !smma.windows(2).all(|w| w[0] < w[1]) {
            return Err(TrendfolioError::invalid_config(
                "smma_periods",
                "expected four strictly increasing positive periods",
            ));
        }

        if let (Some(start), Some(end)) = (self.start_date, self.end_date) {
            if start >= end {
                return Err(TrendfolioError::invalid_config(
                    "start_date",
                    "start_date must be before end_date",
                ));
            }
        }
        Ok(())
    }
}

fn check_pct(key: &str, value: f64) -> Result<(), TrendfolioError> {
    if value > 0.0 && value <= 100.0 {
        Ok(())
    } else {
        Err(TrendfolioError::invalid_config(key, "must be in (0, 100]"))
    }
}

fn check_open_pct(key: &str, value: f64) -> Result<(), TrendfolioError> {
    if value > 0.0 && value < 100.0 {
        Ok(())
    } else {
        Err(TrendfolioError::invalid_config(key, "must be in (0, 100)"))
    }
}

fn parse_value<T: FromStr>(section: &str, key: &str, raw: &str) -> Result<T, TrendfolioError> {
    if raw.trim().is_empty() {
        return Err(TrendfolioError::invalid_config(
            &format!("{}.{}", section, key),
            "empty value",
        ));
    }
    raw.trim().parse::<T>().map_err(|_| {
        TrendfolioError::invalid_config(
            &format!("{}.{}", section, key),
            format!("cannot parse '{}'", raw.trim()),
        )
    })
}

/// Typed lookup with a default for absent keys; empty or malformed values are errors.
fn read<T: FromStr>(
    port: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: T,
) -> Result<T, TrendfolioError> {
    match port.get_string(section, key) {
        Some(raw) => parse_value(section, key, &raw),
        None => Ok(default),
    }
}

fn read_list(
    port: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<Option<Vec<usize>>, TrendfolioError> {
    match port.get_string(section, key) {
        Some(raw) => raw
            .split(',')
            .map(|part| parse_value(section, key, part))
            .collect::<Result<Vec<usize>, _>>()
            .map(Some),
        None => Ok(None),
    }
}

fn read_date(
    port: &dyn ConfigPort,
    key: &str,
) -> Result<Option<NaiveDate>, TrendfolioError> {
    match port.get_string("portfolio", key) {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map(Some)
            .map_err(|_| {
                TrendfolioError::invalid_config(
                    key,
                    format!("invalid {} format, expected YYYY-MM-DD", key),
                )
            }),
        None => Ok(None),
    }
}

fn read_fill(
    port: &dyn ConfigPort,
    key: &str,
    default: FillLevel,
) -> Result<FillLevel, TrendfolioError> {
    let pct: u32 = read(port, "fill_tiers", key, default.pct())?;
    FillLevel::from_pct(pct).ok_or_else(|| {
        TrendfolioError::invalid_config(
            &format!("fill_tiers.{}", key),
            format!("{} is not one of 25, 50, 75, 100", pct),
        )
    })
}

fn parse_price_target(ticker: &str, raw: &str) -> Result<PriceTarget, TrendfolioError> {
    let parts: Vec<&str> = raw.split(',').collect();
    if parts.len() != 2 {
        return Err(TrendfolioError::invalid_config(
            &format!("price_targets.{}", ticker),
            "expected 'low, high'",
        ));
    }
    Ok(PriceTarget {
        low: parse_value("price_targets", ticker, parts[0])?,
        high: parse_value("price_targets", ticker, parts[1])?,
    })
}

/// Read every section into a [`SimulationConfig`] and validate it.
pub fn build_simulation_config(port: &dyn ConfigPort) -> Result<SimulationConfig, TrendfolioError> {
    let d = SimulationConfig::default();

    let tickers = match port.get_string("portfolio", "tickers") {
        Some(raw) => parse_codes(&raw)
            .map_err(|e| TrendfolioError::invalid_config("tickers", e.to_string()))?,
        None => Vec::new(),
    };

    let mut allocations = BTreeMap::new();
    for (ticker, raw) in port.get_section("allocations") {
        let pct: f64 = parse_value("allocations", &ticker, &raw)?;
        allocations.insert(ticker.to_uppercase(), pct);
    }

    let mut price_targets = BTreeMap::new();
    for (ticker, raw) in port.get_section("price_targets") {
        let target = parse_price_target(&ticker, &raw)?;
        price_targets.insert(ticker.to_uppercase(), target);
    }

    let fill_tiers = FillTiers {
        excellent: read_fill(port, "excellent", d.fill_tiers.excellent)?,
        good: read_fill(port, "good", d.fill_tiers.good)?,
        ok: read_fill(port, "ok", d.fill_tiers.ok)?,
        caution: read_fill(port, "caution", d.fill_tiers.caution)?,
    };

    let di = &d.indicators;
    let bollinger_stddev: f64 = read(
        port,
        "indicators",
        "bollinger_stddev",
        di.bollinger_mult_x100 as f64 / 100.0,
    )?;
    if bollinger_stddev <= 0.0 {
        return Err(TrendfolioError::invalid_config(
            "bollinger_stddev",
            "must be positive",
        ));
    }
    let indicators = IndicatorConfig {
        ma_periods: read_list(port, "indicators", "ma_periods")?
            .unwrap_or_else(|| di.ma_periods.clone()),
        rsi_period: read(port, "indicators", "rsi_period", di.rsi_period)?,
        bollinger_period: read(port, "indicators", "bollinger_period", di.bollinger_period)?,
        bollinger_mult_x100: (bollinger_stddev * 100.0).round() as u32,
        atr_period: read(port, "indicators", "atr_period", di.atr_period)?,
        profile_lookback: read(port, "indicators", "profile_lookback", di.profile_lookback)?,
        profile_bins: read(port, "indicators", "profile_bins", di.profile_bins)?,
    };

    let dt = &d.trend;
    let smma_periods = match read_list(port, "trend", "smma_periods")? {
        Some(list) => <[usize; 4]>::try_from(list.as_slice()).map_err(|_| {
            TrendfolioError::invalid_config("smma_periods", "expected exactly four periods")
        })?,
        None => dt.smma_periods,
    };
    let trend = TrendConfig {
        smma_periods,
        momentum_ma_period: read(port, "trend", "momentum_ma_period", dt.momentum_ma_period)?,
        momentum_roc_weeks: read(port, "trend", "momentum_roc_weeks", dt.momentum_roc_weeks)?,
        roc_threshold_pct: read(port, "trend", "roc_threshold_pct", dt.roc_threshold_pct)?,
        extension_threshold_pct: read(
            port,
            "trend",
            "extension_threshold_pct",
            dt.extension_threshold_pct,
        )?,
        n1_floor_pct: read(port, "trend", "n1_floor_pct", dt.n1_floor_pct)?,
    };

    let dq = &d.quality;
    let quality = QualityConfig {
        extended_threshold_pct: read(
            port,
            "quality",
            "extended_threshold_pct",
            dq.extended_threshold_pct,
        )?,
        ma_tolerance_pct: read(port, "quality", "ma_tolerance_pct", dq.ma_tolerance_pct)?,
        volume_tolerance_pct: read(
            port,
            "quality",
            "volume_tolerance_pct",
            dq.volume_tolerance_pct,
        )?,
        band_proximity_pct: read(port, "quality", "band_proximity_pct", dq.band_proximity_pct)?,
    };

    let de = &d.entry;
    let entry = EntryConfig {
        max_stop_distance_pct: read(
            port,
            "portfolio",
            "max_stop_distance_pct",
            de.max_stop_distance_pct,
        )?,
        min_risk_floor_pct: read(port, "portfolio", "min_risk_floor_pct", de.min_risk_floor_pct)?,
        atr_stop_multiple: read(port, "quality", "atr_stop_multiple", de.atr_stop_multiple)?,
    };

    let config = SimulationConfig {
        starting_cash: read(port, "portfolio", "starting_cash", d.starting_cash)?,
        default_position_pct: read(
            port,
            "portfolio",
            "default_position_pct",
            d.default_position_pct,
        )?,
        max_positions: read(port, "portfolio", "max_positions", d.max_positions)?,
        allocations,
        price_targets,
        slippage: SlippageModel {
            buy_multiplier: read(
                port,
                "portfolio",
                "buy_slippage_multiplier",
                d.slippage.buy_multiplier,
            )?,
            sell_multiplier: read(
                port,
                "portfolio",
                "sell_slippage_multiplier",
                d.slippage.sell_multiplier,
            )?,
        },
        risk_free_rate: read(port, "portfolio", "risk_free_rate", d.risk_free_rate)?,
        start_date: read_date(port, "start_date")?,
        end_date: read_date(port, "end_date")?,
        tickers,
        fill_tiers,
        indicators,
        trend,
        quality,
        entry,
    };

    config.validate()?;
    Ok(config)
}
