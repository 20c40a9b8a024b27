//! CLI definition and dispatch.

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::svg_chart::{format_equity_chart, format_score_chart};
use crate::domain::backtest::{self as backtest_engine, BacktestResult};
use crate::domain::config::{build_backtest_config, build_trend_config, TrendConfig};
use crate::domain::config_validation::{
    validate_backtest_config, validate_data_dir, validate_trend_config,
};
use crate::domain::error::TrendError;
use crate::domain::pipeline::IndicatorPipeline;
use crate::domain::score::{score_history, Score, ScoreAggregator};
use crate::domain::timeline::build_unified_timeline;
use crate::domain::universe::{load_universe, parse_symbols};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

pub const DEFAULT_HISTORY_DAYS: usize = 30;
const DEFAULT_LOG_FILTER: &str = "trendscore=info";

#[derive(Parser, Debug)]
#[command(name = "trendscore", about = "Composite trend scoring and position decisions")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the recent score history of one symbol as CSV
    Score {
        #[arg(short, long)]
        config: PathBuf,
        #[arg(short, long)]
        symbol: String,
        #[arg(short, long, default_value_t = DEFAULT_HISTORY_DAYS)]
        days: usize,
        /// Also draw the score history as an SVG chart at this path
        #[arg(long)]
        svg: Option<PathBuf>,
    },
    /// Run the daily evaluation loop over CSV data with a simulated portfolio
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Comma-separated symbols, overriding [backtest] symbols
        #[arg(long)]
        symbols: Option<String>,
        /// Also draw the equity curve as an SVG chart at this path
        #[arg(long)]
        svg: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

/// Install the stderr tracing subscriber. `RUST_LOG` overrides the default filter.
pub fn init_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

pub fn run(cli: Cli) -> ExitCode {
    let result = match cli.command {
        Command::Score {
            config,
            symbol,
            days,
            svg,
        } => run_score(&config, &symbol, days, svg.as_deref()),
        Command::Backtest {
            config,
            symbols,
            svg,
        } => run_backtest(&config, symbols.as_deref(), svg.as_deref()),
        Command::Validate { config } => run_validate(&config),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            (&e).into()
        }
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, TrendError> {
    FileConfigAdapter::from_file(path).map_err(|e| TrendError::ConfigParse {
        file: path.display().to_string(),
        reason: e.to_string(),
    })
}

fn load_trend_config(adapter: &dyn ConfigPort) -> Result<TrendConfig, TrendError> {
    validate_trend_config(adapter)?;
    build_trend_config(adapter)
}

fn data_port(adapter: &dyn ConfigPort) -> Result<CsvAdapter, TrendError> {
    validate_data_dir(adapter)?;
    let dir = adapter
        .get_string("backtest", "data_dir")
        .unwrap_or_default();
    Ok(CsvAdapter::new(dir.trim()))
}

fn run_score(
    config_path: &Path,
    symbol: &str,
    days: usize,
    svg_path: Option<&Path>,
) -> Result<(), TrendError> {
    let adapter = load_config(config_path)?;
    let trend = load_trend_config(&adapter)?;
    let data = data_port(&adapter)?;

    let symbol = symbol.trim().to_uppercase();
    let series = data.fetch_bars(&symbol, NaiveDate::MIN, NaiveDate::MAX)?;
    if series.is_empty() {
        return Err(TrendError::NoData { symbol });
    }

    let pipeline = IndicatorPipeline::new(trend.indicators);
    let aggregator = ScoreAggregator::new(trend.score)?;
    let scores = score_history(&pipeline, &aggregator, &series, days);
    if scores.is_empty() {
        // Surface the real reason: the latest bar cannot be scored either.
        aggregator.score(&pipeline.compute(&series))?;
    }

    let stdout = std::io::stdout();
    write_scores_csv(stdout.lock(), &scores)?;
    eprintln!("{}: {} scores over the last {} bars", symbol, scores.len(), days);

    if let Some(path) = svg_path {
        fs::write(path, format_score_chart(&symbol, &scores))?;
        eprintln!("Score chart written to {}", path.display());
    }
    Ok(())
}

/// Write scores as CSV with a `date,score,macd_signal,mfi_signal,obv_signal` header.
pub fn write_scores_csv<W: Write>(writer: W, scores: &[Score]) -> Result<(), TrendError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(["date", "score", "macd_signal", "mfi_signal", "obv_signal"])
        .map_err(std::io::Error::other)?;
    for s in scores {
        wtr.write_record([
            s.date.format("%Y-%m-%d").to_string(),
            format!("{:.6}", s.value),
            format!("{:.6}", s.macd_signal),
            format!("{:.6}", s.mfi_signal),
            format!("{:.6}", s.obv_signal),
        ])
        .map_err(std::io::Error::other)?;
    }
    wtr.flush()?;
    Ok(())
}

fn run_backtest(
    config_path: &Path,
    symbols_override: Option<&str>,
    svg_path: Option<&Path>,
) -> Result<(), TrendError> {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = load_config(config_path)?;
    let trend = load_trend_config(&adapter)?;
    validate_backtest_config(&adapter)?;
    let bt_config = build_backtest_config(&adapter)?;
    let data = data_port(&adapter)?;

    let symbols = resolve_symbols(symbols_override, &adapter, &data)?;
    let universe = load_universe(&data, &symbols, bt_config.start_date, bt_config.end_date)?;
    if !universe.skipped.is_empty() {
        eprintln!(
            "Backtesting {} of {} symbols",
            universe.series.len(),
            symbols.len()
        );
    }

    let timeline = build_unified_timeline(&universe.series);
    eprintln!(
        "Running backtest: {} symbols, {} dates, policy {}",
        universe.series.len(),
        timeline.len(),
        trend.decision.policy,
    );

    let result = backtest_engine::run_backtest(&universe.series, &timeline, &trend, &bt_config)?;
    print_summary(&result);

    if let Some(path) = svg_path {
        fs::write(
            path,
            format_equity_chart(&result.equity_curve, result.initial_capital),
        )?;
        eprintln!("Equity chart written to {}", path.display());
    }
    Ok(())
}

fn print_summary(result: &BacktestResult) {
    eprintln!("\n=== Decisions ===");
    for (label, count) in result.action_counts() {
        eprintln!("  {label:<14}{count}");
    }
    eprintln!("\n=== Result ===");
    eprintln!("Fills:            {}", result.fills.len());
    eprintln!("Open Positions:   {}", result.open_positions);
    eprintln!("Initial Capital:  {:.2}", result.initial_capital);
    eprintln!("Final Equity:     {:.2}", result.final_equity);
    eprintln!("Total Return:     {:.2}%", result.total_return() * 100.0);
}

fn run_validate(config_path: &Path) -> Result<(), TrendError> {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = load_config(config_path)?;
    let trend = load_trend_config(&adapter)?;

    eprintln!(
        "  indicators: MACD({}, {}, {}), MFI({})",
        trend.indicators.fast, trend.indicators.slow, trend.indicators.signal,
        trend.indicators.mfi_period
    );
    eprintln!(
        "  score:      weights {:.2}/{:.2}/{:.2}, std window {}, OBV slope window {}",
        trend.score.weights.macd,
        trend.score.weights.mfi,
        trend.score.weights.obv,
        trend.score.macd_std_window,
        trend.score.obv_slope_window
    );
    eprintln!(
        "  decision:   {} policy, max weight {:.2}, cash reserve {:.2}",
        trend.decision.policy, trend.decision.max_weight, trend.decision.cash_reserve
    );

    if adapter.has_key("backtest", "data_dir") {
        validate_backtest_config(&adapter)?;
        eprintln!("  backtest:   ok");
    }

    eprintln!("\nConfiguration is valid.");
    Ok(())
}

/// Symbols from the override, else `[backtest] symbols`, else every CSV in the data dir.
pub fn resolve_symbols(
    symbols_override: Option<&str>,
    config: &dyn ConfigPort,
    data_port: &dyn DataPort,
) -> Result<Vec<String>, TrendError> {
    let configured = symbols_override
        .map(str::to_string)
        .or_else(|| config.get_string("backtest", "symbols"));

    let symbols = match configured {
        Some(list) => parse_symbols(&list)
            .map_err(|e| TrendError::config_invalid("backtest", "symbols", e.to_string()))?,
        None => data_port.list_symbols()?,
    };

    if symbols.is_empty() {
        return Err(TrendError::ConfigMissing {
            section: "backtest".to_string(),
            key: "symbols".to_string(),
        });
    }
    Ok(symbols)
}
