//! CLI definition and dispatch.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::http_signal_adapter::HttpSignalAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::domain::backtest::run_backtest;
use crate::domain::config_validation::build_risk_config;
use crate::domain::error::SigtraderError;
use crate::ports::data_port::DataPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "sigtrader", about = "Signal-gated trading backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over CSV candle data
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Directory of per-symbol candle CSV files
        #[arg(short, long)]
        data: PathBuf,
        #[arg(long)]
        symbol: String,
        /// Start of the range, YYYY-MM-DD or "YYYY-MM-DD HH:MM:SS"
        #[arg(long)]
        start: Option<String>,
        /// End of the range, same formats as --start
        #[arg(long)]
        end: Option<String>,
        /// Write the full JSON report here
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a risk configuration without running anything
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List symbols available in a data directory
    ListSymbols {
        #[arg(short, long)]
        data: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            data,
            symbol,
            start,
            end,
            output,
        } => run_backtest_command(
            &config,
            &data,
            &symbol,
            start.as_deref(),
            end.as_deref(),
            output.as_deref(),
        ),
        Command::Validate { config } => run_validate(&config),
        Command::ListSymbols { data } => run_list_symbols(&data),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = SigtraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn run_backtest_command(
    config_path: &PathBuf,
    data_path: &std::path::Path,
    symbol: &str,
    start: Option<&str>,
    end: Option<&str>,
    output_path: Option<&std::path::Path>,
) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let risk_config = match build_risk_config(&adapter) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let range_start = match parse_time_arg(start, "start", NaiveDateTime::MIN) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    let range_end = match parse_time_arg(end, "end", NaiveDateTime::MAX) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let data_port = CsvAdapter::new(data_path.to_path_buf());
    let candles = match data_port.fetch_candles(symbol, range_start, range_end) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    if candles.is_empty() {
        let err = SigtraderError::NoData {
            symbol: symbol.to_string(),
        };
        eprintln!("error: {err}");
        return (&err).into();
    }
    eprintln!(
        "Backtesting {} over {} candles ({} to {})",
        symbol,
        candles.len(),
        candles[0].timestamp,
        candles[candles.len() - 1].timestamp
    );

    let mut signal_port = match HttpSignalAdapter::from_config(&adapter) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let report = match run_backtest(symbol, &candles, &mut signal_port, &risk_config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\n=== Backtest Results ===");
    eprintln!("Initial balance:      {:.2}", report.initial_balance);
    eprintln!("Final balance:        {:.2}", report.final_balance);
    eprintln!("Final position value: {:.2}", report.final_position_value);
    eprintln!("Total return:         {:.2}%", report.return_pct);
    eprintln!("Max drawdown:         {:.2}%", report.max_drawdown_pct);
    eprintln!("Trades:               {}", report.trade_count);
    eprintln!("Win rate:             {:.1}%", report.win_rate * 100.0);

    if let Some(path) = output_path {
        if let Err(e) = JsonReportAdapter.write(&report, path) {
            eprintln!("error: {e}");
            return (&e).into();
        }
        eprintln!("Report written to {}", path.display());
    }

    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    match build_risk_config(&adapter) {
        Ok(_) => {
            eprintln!("{}: configuration is valid", config_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn run_list_symbols(data_path: &std::path::Path) -> ExitCode {
    let data_port = CsvAdapter::new(data_path.to_path_buf());
    match data_port.list_symbols() {
        Ok(symbols) => {
            for symbol in symbols {
                println!("{symbol}");
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

fn parse_time_arg(
    value: Option<&str>,
    field: &str,
    default: NaiveDateTime,
) -> Result<NaiveDateTime, SigtraderError> {
    let Some(s) = value else {
        return Ok(default);
    };
    if let Ok(t) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(t);
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Ok(d.and_time(NaiveTime::MIN));
    }
    Err(SigtraderError::ConfigInvalid {
        section: "cli".to_string(),
        key: field.to_string(),
        reason: format!("invalid time '{s}', expected YYYY-MM-DD or YYYY-MM-DD HH:MM:SS"),
    })
}
