//! CLI integration tests: real INI files and CSV data on disk.

mod common;

use common::*;
use std::fs;
use std::io::Write;
use std::path::Path;
use trendfolio::adapters::csv_adapter::CsvAdapter;
use trendfolio::adapters::csv_report_adapter::CsvReportAdapter;
use trendfolio::cli::{self, Cli, Command};
use trendfolio::domain::error::TrendfolioError;
use trendfolio::domain::fill::FillLevel;
use trendfolio::ports::data_port::DataPort;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn write_csv(dir: &Path, bars: &[OhlcvBar]) {
    let code = &bars[0].code;
    let mut out = String::from("date,open,high,low,close,volume\n");
    for b in bars {
        out.push_str(&format!(
            "{},{},{},{},{},{}\n",
            b.date, b.open, b.high, b.low, b.close, b.volume
        ));
    }
    fs::write(dir.join(format!("{}.csv", code)), out).unwrap();
}

const FULL_INI: &str = r#"
[portfolio]
starting_cash = 250000
default_position_pct = 8
max_positions = 5
risk_free_rate = 0.03
buy_slippage_multiplier = 1.01
sell_slippage_multiplier = 0.99
start_date = 2022-06-01
end_date = 2023-06-30
tickers = AAPL, MSFT

[allocations]
AAPL = 20
msft = 15

[price_targets]
AAPL = 150, 220

[fill_tiers]
excellent = 100
good = 75
ok = 50
caution = 25

[indicators]
ma_periods = 10,20,50,200
rsi_period = 14
bollinger_period = 20
bollinger_stddev = 2.5
atr_period = 14

[trend]
smma_periods = 5,10,20,40
momentum_ma_period = 200
roc_threshold_pct = 4

[quality]
extended_threshold_pct = 12

[data]
directory = bars

[report]
output_dir = results
"#;

mod config_loading {
    use super::*;

    #[test]
    fn every_section_is_read() {
        let file = write_temp_ini(FULL_INI);
        let adapter = cli::load_config(file.path()).unwrap();
        let config = cli::load_simulation_config(&adapter, None).unwrap();

        assert_eq!(config.starting_cash, 250_000.0);
        assert_eq!(config.default_position_pct, 8.0);
        assert_eq!(config.max_positions, 5);
        assert_eq!(config.risk_free_rate, 0.03);
        assert_eq!(config.slippage.buy_multiplier, 1.01);
        assert_eq!(config.slippage.sell_multiplier, 0.99);
        assert_eq!(config.start_date, Some(date(2022, 6, 1)));
        assert_eq!(config.end_date, Some(date(2023, 6, 30)));
        assert_eq!(config.tickers, vec!["AAPL", "MSFT"]);

        assert_eq!(config.allocation_pct("AAPL"), 20.0);
        assert_eq!(config.allocation_pct("MSFT"), 15.0);
        assert_eq!(config.allocation_pct("NVDA"), 8.0);
        let target = config.price_target("AAPL").unwrap();
        assert_eq!((target.low, target.high), (150.0, 220.0));
        assert!(config.price_target("MSFT").is_none());

        assert_eq!(config.fill_tiers.good, FillLevel::ThreeQuarters);
        assert_eq!(config.fill_tiers.caution, FillLevel::Quarter);
        assert_eq!(config.indicators.ma_periods, vec![10, 20, 50, 200]);
        assert_eq!(config.indicators.bollinger_mult_x100, 250);
        assert_eq!(config.trend.smma_periods, [5, 10, 20, 40]);
        assert_eq!(config.trend.roc_threshold_pct, 4.0);
        assert_eq!(config.quality.extended_threshold_pct, 12.0);
    }

    #[test]
    fn ticker_override_replaces_configured_list() {
        let file = write_temp_ini(FULL_INI);
        let adapter = cli::load_config(file.path()).unwrap();
        let config = cli::load_simulation_config(&adapter, Some("nvda,tsla")).unwrap();
        assert_eq!(config.tickers, vec!["NVDA", "TSLA"]);
    }

    #[test]
    fn empty_file_gives_defaults() {
        let file = write_temp_ini("");
        let adapter = cli::load_config(file.path()).unwrap();
        let config = cli::load_simulation_config(&adapter, None).unwrap();
        assert_eq!(config, trendfolio::domain::config::SimulationConfig::default());
    }

    #[test]
    fn bad_fill_tier_is_rejected() {
        let file = write_temp_ini("[fill_tiers]\ngood = 60\n");
        let adapter = cli::load_config(file.path()).unwrap();
        let err = cli::load_simulation_config(&adapter, None).unwrap_err();
        match err {
            TrendfolioError::InvalidConfiguration { key, .. } => {
                assert_eq!(key, "fill_tiers.good")
            }
            other => panic!("expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn malformed_date_is_rejected() {
        let file = write_temp_ini("[portfolio]\nstart_date = 01/06/2022\n");
        let adapter = cli::load_config(file.path()).unwrap();
        assert!(matches!(
            cli::load_simulation_config(&adapter, None),
            Err(TrendfolioError::InvalidConfiguration { .. })
        ));
    }

    #[test]
    fn empty_and_valueless_entries_are_rejected() {
        let file = write_temp_ini("[portfolio]\nstarting_cash =\n");
        let adapter = cli::load_config(file.path()).unwrap();
        match cli::load_simulation_config(&adapter, None).unwrap_err() {
            TrendfolioError::InvalidConfiguration { key, .. } => {
                assert_eq!(key, "portfolio.starting_cash")
            }
            other => panic!("expected InvalidConfiguration, got {:?}", other),
        }

        let file = write_temp_ini("[allocations]\nAAPL\nMSFT = 12\n");
        let adapter = cli::load_config(file.path()).unwrap();
        match cli::load_simulation_config(&adapter, None).unwrap_err() {
            TrendfolioError::InvalidConfiguration { key, .. } => {
                assert_eq!(key, "allocations.aapl")
            }
            other => panic!("expected InvalidConfiguration, got {:?}", other),
        }
    }

    #[test]
    fn duplicate_ticker_override_is_rejected() {
        let file = write_temp_ini(FULL_INI);
        let adapter = cli::load_config(file.path()).unwrap();
        assert!(cli::load_simulation_config(&adapter, Some("AAPL,AAPL")).is_err());
    }
}

mod pipeline_on_disk {
    use super::*;

    fn data_dir() -> tempfile::TempDir {
        let dir = tempfile::TempDir::new().unwrap();
        write_csv(dir.path(), &uptrend("AAPL", 320, 100.0, 0.5));
        write_csv(dir.path(), &rise_then_crash("CRSH", 260, 60));
        dir
    }

    #[test]
    fn csv_data_to_csv_reports() {
        let data = data_dir();
        let out = tempfile::TempDir::new().unwrap();
        let file = write_temp_ini("[portfolio]\nstarting_cash = 50000\nmax_positions = 2\n");
        let adapter = cli::load_config(file.path()).unwrap();
        let config = cli::load_simulation_config(&adapter, None).unwrap();

        let data_port = CsvAdapter::new(data.path().to_path_buf());
        let report_port = CsvReportAdapter::new(out.path().join("run"));
        let (result, metrics) =
            cli::run_backtest_pipeline(&data_port, &report_port, &config).unwrap();

        assert_eq!(metrics.starting_equity, 50_000.0);
        assert_eq!(result.equity.len(), 64);
        for name in ["trades.csv", "equity.csv", "skipped.csv", "summary.json"] {
            assert!(out.path().join("run").join(name).exists(), "{} missing", name);
        }
        let equity = fs::read_to_string(out.path().join("run/equity.csv")).unwrap();
        assert_eq!(equity.lines().count(), 65);
        assert!(equity.starts_with("date,cash,holdings_value,total_value\n"));
    }

    #[test]
    fn list_symbols_reads_the_data_directory() {
        let data = data_dir();
        let port = CsvAdapter::new(data.path().to_path_buf());
        assert_eq!(port.list_symbols().unwrap(), vec!["AAPL", "CRSH"]);
    }

    #[test]
    fn scan_writes_scan_csv() {
        let data = data_dir();
        let out = tempfile::TempDir::new().unwrap();
        let config = trendfolio::domain::config::SimulationConfig::default();
        let data_port = CsvAdapter::new(data.path().to_path_buf());

        let report = cli::run_scan_pipeline(&data_port, &config).unwrap();
        assert_eq!(report.rows.len(), 2);

        let report_port = CsvReportAdapter::new(out.path().to_path_buf());
        trendfolio::ports::report_port::ReportPort::write_scan(&report_port, &report).unwrap();
        let scan = fs::read_to_string(out.path().join("scan.csv")).unwrap();
        assert_eq!(scan.lines().count(), 3);
    }

    #[test]
    fn run_writes_reports_to_the_configured_directory() {
        let data = data_dir();
        let out = tempfile::TempDir::new().unwrap();
        let ini = format!(
            "[portfolio]\ntickers = AAPL\n\n[data]\ndirectory = {}\n\n[report]\noutput_dir = {}\n",
            data.path().display(),
            out.path().join("configured").display()
        );
        let file = write_temp_ini(&ini);

        let _ = cli::run(Cli {
            command: Command::Backtest {
                config: file.path().to_path_buf(),
                data: None,
                output: None,
                tickers: None,
                dry_run: false,
            },
        });
        assert!(out.path().join("configured/summary.json").exists());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let data = data_dir();
        let out = tempfile::TempDir::new().unwrap();
        let file = write_temp_ini("[portfolio]\ntickers = AAPL\n");

        let _ = cli::run(Cli {
            command: Command::Backtest {
                config: file.path().to_path_buf(),
                data: Some(data.path().to_path_buf()),
                output: Some(out.path().join("dry")),
                tickers: None,
                dry_run: true,
            },
        });
        assert!(!out.path().join("dry").exists());
    }
}
