//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::csv_report_adapter::CsvReportAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::log_notify_adapter::LogNotifyAdapter;
use crate::domain::backtest::{Backtest, BacktestConfig, BacktestResult, PairStrategy};
use crate::domain::config_validation::{
    parse_pair, validate_backtest_config, validate_data_config, validate_strategy_config,
};
use crate::domain::curve::Degree;
use crate::domain::decision::{DecisionTable, parse_arm, parse_gate};
use crate::domain::error::PairtraderError;
use crate::domain::market::{PairRow, PairSymbols, RegimeStates};
use crate::domain::metrics::ActionValues;
use crate::domain::signal::{Anchor, SizingPolicy};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use crate::ports::notify_port::NotifyPort;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "pairtrader", about = "Correlated-pair trading backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay the full history and write the results table
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        dry_run: bool,
    },
    /// Append the latest price and report the recommended action
    Live {
        #[arg(short, long)]
        config: PathBuf,
        /// Read the pair's live prices from stdin instead of a price source
        #[arg(long)]
        manual_price: bool,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            dry_run,
        } => {
            if dry_run {
                run_validate(&config)
            } else {
                run_backtest(&config, output.as_ref())
            }
        }
        Command::Live {
            config,
            manual_price,
        } => run_live(&config, manual_price),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = PairtraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn validate_all(adapter: &FileConfigAdapter) -> Result<(), ExitCode> {
    for check in [
        validate_backtest_config(adapter),
        validate_strategy_config(adapter),
        validate_data_config(adapter),
    ] {
        if let Err(e) = check {
            eprintln!("error: {e}");
            return Err((&e).into());
        }
    }
    Ok(())
}

pub fn build_backtest_config(adapter: &dyn ConfigPort) -> BacktestConfig {
    BacktestConfig {
        initial_capital: adapter.get_double("backtest", "initial_capital", 0.0),
        tax_rate: adapter.get_double("backtest", "tax_rate", 0.001),
        transaction_fee: adapter.get_double("backtest", "transaction_fee", 0.001),
    }
}

pub fn build_strategy(
    adapter: &dyn ConfigPort,
) -> Result<(PairSymbols, PairStrategy), PairtraderError> {
    let pair_str = adapter.get_string("strategy", "pair").ok_or_else(|| {
        PairtraderError::ConfigMissing {
            section: "strategy".into(),
            key: "pair".into(),
        }
    })?;
    let (x, y) = parse_pair(&pair_str).ok_or_else(|| PairtraderError::ConfigInvalid {
        section: "strategy".into(),
        key: "pair".into(),
        reason: "pair must name exactly two distinct symbols".into(),
    })?;

    let anchor_str = adapter
        .get_string("strategy", "anchor")
        .unwrap_or_else(|| "weekly".to_string());
    let anchor = Anchor::parse(&anchor_str).ok_or_else(|| PairtraderError::ConfigInvalid {
        section: "strategy".into(),
        key: "anchor".into(),
        reason: "anchor must be weekly or monthly".into(),
    })?;

    let degree = Degree::from_int(adapter.get_int("strategy", "degree", 0)).ok_or_else(|| {
        PairtraderError::ConfigInvalid {
            section: "strategy".into(),
            key: "degree".into(),
            reason: "degree must be 1 or 2".into(),
        }
    })?;

    let mut table = DecisionTable::default_table();
    if let Some(s) = adapter.get_string("strategy", "over_pos") {
        table.over.when_pos = parse_arm(&s)?;
    }
    if let Some(s) = adapter.get_string("strategy", "over_neg") {
        table.over.otherwise = parse_arm(&s)?;
    }
    if let Some(s) = adapter.get_string("strategy", "under_pos") {
        table.under.when_pos = parse_arm(&s)?;
    }
    if let Some(s) = adapter.get_string("strategy", "under_neg") {
        table.under.otherwise = parse_arm(&s)?;
    }
    if let Some(s) = adapter.get_string("strategy", "over_gate") {
        table.over.gate = Some(parse_gate(&s)?);
    }
    if let Some(s) = adapter.get_string("strategy", "under_gate") {
        table.under.gate = Some(parse_gate(&s)?);
    }

    let strategy = PairStrategy {
        anchor,
        degree,
        multiplier: adapter.get_double("strategy", "multiplier", 0.0),
        table,
        sizing: SizingPolicy::DeviationScaled {
            max_dev: adapter.get_double("strategy", "max_dev", 0.0),
            max_portion: adapter.get_double("strategy", "max_portion", 0.0),
        },
    };

    Ok((PairSymbols { x, y }, strategy))
}

fn build_data_port(adapter: &dyn ConfigPort) -> CsvAdapter {
    let dir = adapter
        .get_string("data", "dir")
        .unwrap_or_else(|| "data".to_string());
    let warmup = adapter.get_int("data", "warmup_rows", 0).max(0) as usize;
    CsvAdapter::new(PathBuf::from(dir), warmup)
}

/// Load, validate, fetch and replay. Shared by backtest and live modes.
fn prepare_run(
    config_path: &PathBuf,
) -> Result<(FileConfigAdapter, PairSymbols, Backtest, Vec<(f64, f64)>, Vec<PairRow>), ExitCode> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    validate_all(&adapter)?;

    let bt_config = build_backtest_config(&adapter);
    let (pair, strategy) = match build_strategy(&adapter) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return Err((&e).into());
        }
    };

    let data_port = build_data_port(&adapter);
    eprintln!("Loading pair {} from CSV data", pair.label());

    let fit_samples = match data_port.fetch_fit_samples(&pair, strategy.anchor) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return Err((&e).into());
        }
    };
    let rows = match data_port.fetch_pair_rows(&pair) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return Err((&e).into());
        }
    };
    eprintln!(
        "  {} rows, {} fit samples",
        rows.len(),
        fit_samples.len()
    );

    let backtest = Backtest::new(bt_config, strategy);
    Ok((adapter, pair, backtest, fit_samples, rows))
}

fn run_backtest(config_path: &PathBuf, output_path: Option<&PathBuf>) -> ExitCode {
    let (_, pair, backtest, fit_samples, rows) = match prepare_run(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };

    let result = match backtest.run(&fit_samples, &rows) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    print_summary(&result);

    let output = output_path
        .cloned()
        .unwrap_or_else(|| PathBuf::from(format!("{}.csv", pair.label())));
    let report = CsvReportAdapter;
    match report.write(&result, &output.display().to_string()) {
        Ok(()) => {
            eprintln!("Results written to: {}", output.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to write results: {e}");
            (&e).into()
        }
    }
}

fn run_live(config_path: &PathBuf, manual_price: bool) -> ExitCode {
    let (adapter, pair, backtest, fit_samples, mut rows) = match prepare_run(config_path) {
        Ok(v) => v,
        Err(code) => return code,
    };

    let notifier = build_notifier(&adapter, &pair);

    let live = if manual_price {
        read_manual_prices(&pair)
    } else {
        fetch_live_prices(&build_data_port(&adapter), &pair)
    };
    let (date, price_x, price_y) = match live {
        Ok(v) => v,
        Err(e) => {
            let message = format!("No live price obtained for {}: {}", pair.label(), e);
            eprintln!("error: {message}");
            notify(&notifier, &message);
            return (&e).into();
        }
    };

    rows.push(PairRow {
        date,
        open_x: price_x,
        close_x: price_x,
        open_y: price_y,
        close_y: price_y,
        states: RegimeStates::default(),
    });

    let result = match backtest.run(&fit_samples, &rows) {
        Ok(r) => r,
        Err(e) => {
            let message = format!("Live run aborted for {}: {}", pair.label(), e);
            eprintln!("error: {message}");
            notify(&notifier, &message);
            return (&e).into();
        }
    };

    let Some(last) = result.last_record() else {
        eprintln!("error: no rows to decide on");
        return ExitCode::from(5);
    };
    let message = format!(
        "Price: {}; Recommended action: {}, Sizing: {:.4} \
         (BUY sizing is % of remaining cash, SELL sizing is % of shares held)",
        last.close,
        last.action.label(),
        last.sizing,
    );
    eprintln!("{message}");
    eprintln!(
        "Historical annual returns: {:.4}",
        result.summary.annualized_returns
    );
    notify(&notifier, &message);
    notify(
        &notifier,
        &format!(
            "Historical annual returns: {:.4}",
            result.summary.annualized_returns
        ),
    );

    ExitCode::SUCCESS
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };
    if let Err(code) = validate_all(&adapter) {
        return code;
    }

    let (pair, strategy) = match build_strategy(&adapter) {
        Ok(v) => v,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("Config validated successfully");
    eprintln!("  pair:       {} -> {}", pair.x, pair.y);
    eprintln!("  anchor:     {:?}", strategy.anchor);
    eprintln!("  degree:     {:?}", strategy.degree);
    eprintln!("  multiplier: {}", strategy.multiplier);
    ExitCode::SUCCESS
}

fn build_notifier(adapter: &dyn ConfigPort, pair: &PairSymbols) -> LogNotifyAdapter {
    let path = adapter
        .get_string("notify", "log")
        .unwrap_or_else(|| format!("{}.log", pair.label()));
    LogNotifyAdapter::new(PathBuf::from(path))
}

fn notify(notifier: &LogNotifyAdapter, message: &str) {
    if let Err(e) = notifier.send(message) {
        eprintln!("warning: notification not delivered: {e}");
    }
}

fn read_manual_prices(
    pair: &PairSymbols,
) -> Result<(NaiveDate, f64, f64), PairtraderError> {
    let date = chrono::Local::now().date_naive();
    let price_x = prompt_price(&pair.x)?;
    let price_y = prompt_price(&pair.y)?;
    Ok((date, price_x, price_y))
}

fn prompt_price(symbol: &str) -> Result<f64, PairtraderError> {
    eprint!("{symbol} price: ");
    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    line.trim()
        .parse()
        .map_err(|_| PairtraderError::MissingExternalData {
            reason: format!("unparseable manual price for {symbol}: `{}`", line.trim()),
        })
}

fn fetch_live_prices(
    port: &dyn DataPort,
    pair: &PairSymbols,
) -> Result<(NaiveDate, f64, f64), PairtraderError> {
    let quote_x = port.fetch_live_quote(&pair.x)?;
    let quote_y = port.fetch_live_quote(&pair.y)?;
    Ok((quote_y.date, quote_x.price, quote_y.price))
}

fn print_summary(result: &BacktestResult) {
    eprintln!("total_returns: {:.4}", result.summary.total_returns);
    eprintln!(
        "annualized_returns: {:.4}",
        result.summary.annualized_returns
    );
    eprintln!(
        "action_values: {}",
        format_action_values(&result.summary.action_values)
    );
}

fn format_action_values(values: &ActionValues) -> String {
    let mut parts = Vec::new();
    if let Some(v) = values.buy {
        parts.push(format!("BUY {:.4}", v));
    }
    if let Some(v) = values.sell {
        parts.push(format!("SELL {:.4}", v));
    }
    if let Some(v) = values.hold {
        parts.push(format!("HOLD {:.4}", v));
    }
    if parts.is_empty() {
        "none".to_string()
    } else {
        parts.join(", ")
    }
}
