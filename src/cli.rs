//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::domain::config::{SimulationConfig, build_simulation_config};
use crate::domain::error::TrendfolioError;
use crate::domain::metrics::Metrics;
use crate::domain::scanner::{ScanReport, build_weekly_snapshots, scan};
use crate::domain::security_data::evaluation_dates;
use crate::domain::simulator::{SimulationResult, run_simulation};
use crate::domain::universe::{parse_codes, validate_universe};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_OUTPUT_DIR: &str = "out";

#[derive(Parser, Debug)]
#[command(
    name = "trendfolio",
    about = "Trend/quality classifier and weekly portfolio simulator"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run the weekly portfolio simulation
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory of <TICKER>.csv files
        #[arg(short, long)]
        data: Option<PathBuf>,
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Comma-separated tickers replacing [portfolio] tickers
        #[arg(long)]
        tickers: Option<String>,
        /// Load and validate everything without simulating
        #[arg(long)]
        dry_run: bool,
    },
    /// Classify and rank every security at its latest bar
    Scan {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        data: Option<PathBuf>,
        /// Also write scan.csv into this directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        tickers: Option<String>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List tickers that have a data file
    ListSymbols {
        #[arg(short, long)]
        data: PathBuf,
    },
}

/// Install the stderr `fmt` subscriber; `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Backtest {
            config,
            data,
            output,
            tickers,
            dry_run,
        } => run_backtest(&config, data, output, tickers.as_deref(), dry_run),
        Command::Scan {
            config,
            data,
            output,
            tickers,
        } => run_scan(&config, data, output, tickers.as_deref()),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { data } => run_list_symbols(data),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TrendfolioError> {
    FileConfigAdapter::from_file(path).map_err(|e| TrendfolioError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

/// Build and validate the simulation config, applying a ticker override.
pub fn load_simulation_config(
    adapter: &dyn ConfigPort,
    tickers_override: Option<&str>,
) -> Result<SimulationConfig, TrendfolioError> {
    let mut config = build_simulation_config(adapter)?;
    if let Some(raw) = tickers_override {
        config.tickers =
            parse_codes(raw).map_err(|e| TrendfolioError::invalid_config("tickers", e.to_string()))?;
    }
    Ok(config)
}

fn resolve_dir(arg: Option<PathBuf>, adapter: &dyn ConfigPort, section: &str, key: &str, default: &str) -> PathBuf {
    arg.or_else(|| adapter.get_string(section, key).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(default))
}

/// Configured tickers, or every symbol the data port knows when none are configured.
pub fn resolve_tickers(
    config: &SimulationConfig,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, TrendfolioError> {
    let tickers = if config.tickers.is_empty() {
        data_port.list_symbols()?
    } else {
        config.tickers.clone()
    };
    if tickers.is_empty() {
        return Err(TrendfolioError::invalid_config(
            "tickers",
            "no tickers configured and none found in the data directory",
        ));
    }
    Ok(tickers)
}

/// Load, snapshot, simulate, measure and report.
pub fn run_backtest_pipeline(
    data_port: &dyn DataPort,
    report_port: &dyn ReportPort,
    config: &SimulationConfig,
) -> Result<(SimulationResult, Metrics), TrendfolioError> {
    let tickers = resolve_tickers(config, data_port)?;
    eprintln!("Loading {} tickers...", tickers.len());
    let validation = validate_universe(data_port, &tickers, config.end_date, config.minimum_bars())?;
    let securities = &validation.universe.securities;

    let dates = evaluation_dates(securities, config.start_date, config.end_date);
    let (Some(first), Some(last)) = (dates.first(), dates.last()) else {
        return Err(TrendfolioError::Data {
            reason: "no evaluation weeks in the configured date range".to_string(),
        });
    };
    eprintln!(
        "Running simulation: {} securities, {} weeks, {} to {}",
        securities.len(),
        dates.len(),
        first,
        last
    );

    let weeks = build_weekly_snapshots(securities, &dates, config);
    let mut result = run_simulation(&weeks, config);
    let mut skipped = validation.skipped;
    skipped.append(&mut result.skipped);
    result.skipped = skipped;

    let metrics = Metrics::compute(
        &result.trades,
        &result.equity,
        config.starting_cash,
        config.risk_free_rate,
    );
    report_port.write_backtest(&result, &metrics)?;
    Ok((result, metrics))
}

/// Load the universe and classify each security at its latest bar.
pub fn run_scan_pipeline(
    data_port: &dyn DataPort,
    config: &SimulationConfig,
) -> Result<ScanReport, TrendfolioError> {
    let tickers = resolve_tickers(config, data_port)?;
    let validation = validate_universe(data_port, &tickers, config.end_date, config.minimum_bars())?;
    let mut report = scan(&validation.universe.securities, config);
    let mut skipped = validation.skipped;
    skipped.append(&mut report.skipped);
    report.skipped = skipped;
    Ok(report)
}

fn fmt_pct(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}%", v * 100.0))
}

fn fmt_num(value: Option<f64>) -> String {
    value.map_or_else(|| "N/A".to_string(), |v| format!("{:.2}", v))
}

fn print_summary(metrics: &Metrics) {
    eprintln!("\n=== Results ===");
    eprintln!("Final Equity:     {:.2}", metrics.final_equity);
    eprintln!("Total Return:     {}", fmt_pct(metrics.total_return));
    eprintln!("CAGR:             {}", fmt_pct(metrics.cagr));
    eprintln!("Max Drawdown:     {}", fmt_pct(metrics.max_drawdown));
    eprintln!("Sharpe Ratio:     {}", fmt_num(metrics.sharpe_ratio));
    eprintln!("Sortino Ratio:    {}", fmt_num(metrics.sortino_ratio));
    eprintln!(
        "Trades:           {} ({} closed)",
        metrics.trade_count, metrics.closed_trade_count
    );
    eprintln!("Win Rate:         {}", fmt_pct(metrics.win_rate));
    eprintln!(
        "Avg Win / Loss:   {} / {}",
        metrics
            .avg_win_pct
            .map_or_else(|| "N/A".to_string(), |v| format!("{:.2}%", v)),
        metrics
            .avg_loss_pct
            .map_or_else(|| "N/A".to_string(), |v| format!("{:.2}%", v)),
    );
    eprintln!("Profit Factor:    {}", fmt_num(metrics.profit_factor));
}

fn run_backtest(
    config_path: &Path,
    data: Option<PathBuf>,
    output: Option<PathBuf>,
    tickers: Option<&str>,
    dry_run: bool,
) -> Result<(), TrendfolioError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    let config = load_simulation_config(&adapter, tickers)?;
    let data_port = CsvAdapter::new(resolve_dir(data, &adapter, "data", "directory", DEFAULT_DATA_DIR));

    if dry_run {
        let tickers = resolve_tickers(&config, &data_port)?;
        let validation =
            validate_universe(&data_port, &tickers, config.end_date, config.minimum_bars())?;
        let weeks = evaluation_dates(
            &validation.universe.securities,
            config.start_date,
            config.end_date,
        );
        eprintln!(
            "Dry run OK: {} of {} tickers loaded, {} evaluation weeks",
            validation.universe.count(),
            tickers.len(),
            weeks.len()
        );
        return Ok(());
    }

    let report_port = CsvReportAdapter::new(resolve_dir(
        output,
        &adapter,
        "report",
        "output_dir",
        DEFAULT_OUTPUT_DIR,
    ));
    let (_, metrics) = run_backtest_pipeline(&data_port, &report_port, &config)?;
    print_summary(&metrics);
    eprintln!("\nReport written to: {}", report_port.output_dir().display());
    Ok(())
}

fn run_scan(
    config_path: &Path,
    data: Option<PathBuf>,
    output: Option<PathBuf>,
    tickers: Option<&str>,
) -> Result<(), TrendfolioError> {
    let adapter = load_config(config_path)?;
    let config = load_simulation_config(&adapter, tickers)?;
    let data_port = CsvAdapter::new(resolve_dir(data, &adapter, "data", "directory", DEFAULT_DATA_DIR));
    let report = run_scan_pipeline(&data_port, &config)?;

    println!(
        "{:>4}  {:<8} {:>10} {:<18} {:<4} {:<9} {:<10} {:>6} {:>6} {:<5}",
        "RANK", "TICKER", "CLOSE", "COMPOSITE", "MOM", "RATING", "FLAG", "R:R", "SCORE", "GRADE"
    );
    for row in &report.rows {
        let or_dash = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        println!(
            "{:>4}  {:<8} {:>10.2} {:<18} {:<4} {:<9} {:<10} {:>6} {:>6} {:<5}",
            row.rank.map_or_else(|| "-".to_string(), |r| r.to_string()),
            row.ticker,
            row.close,
            or_dash(&row.composite),
            or_dash(&row.momentum),
            or_dash(&row.rating),
            or_dash(&row.entry_flag),
            row.reward_risk.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v)),
            row.quality_score.map_or_else(|| "-".to_string(), |v| format!("{:.1}", v)),
            or_dash(&row.grade),
        );
    }
    for skip in &report.skipped {
        eprintln!("skipped {}: {}", skip.ticker, skip.reason);
    }

    if let Some(dir) = output {
        let report_port = CsvReportAdapter::new(dir);
        report_port.write_scan(&report)?;
        eprintln!("Scan written to: {}", report_port.output_dir().display());
    }
    Ok(())
}

fn run_validate(config_path: &Path) -> Result<(), TrendfolioError> {
    let adapter = load_config(config_path)?;
    let config = load_simulation_config(&adapter, None)?;
    eprintln!("Configuration is valid: {}", config_path.display());
    eprintln!("  Starting cash:  {:.2}", config.starting_cash);
    eprintln!("  Max positions:  {}", config.max_positions);
    eprintln!(
        "  Tickers:        {}",
        if config.tickers.is_empty() {
            "(all in data directory)".to_string()
        } else {
            config.tickers.join(",")
        }
    );
    eprintln!("  Minimum bars:   {}", config.minimum_bars());
    Ok(())
}

fn run_list_symbols(data: PathBuf) -> Result<(), TrendfolioError> {
    let adapter = CsvAdapter::new(data);
    for symbol in adapter.list_symbols()? {
        println!("{}", symbol);
    }
    Ok(())
}
