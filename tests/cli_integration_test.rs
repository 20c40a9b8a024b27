//! CLI integration tests.
//!
//! Tests cover:
//! - Argument parsing and defaults
//! - `validate` against good and bad INI files on disk
//! - `score` and `backtest` over CSV fixtures in a temp directory
//! - Exit-code mapping for config, data and history failures

mod common;

use clap::Parser;
use common::*;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use tempfile::TempDir;
use trendscore::adapters::csv_adapter::CsvAdapter;
use trendscore::cli::{self, Cli, Command};
use trendscore::domain::backtest::run_backtest;
use trendscore::domain::config::{build_backtest_config, build_trend_config};
use trendscore::domain::decision::Action;
use trendscore::domain::timeline::build_unified_timeline;
use trendscore::domain::universe::load_universe;
use trendscore::adapters::file_config_adapter::FileConfigAdapter;

fn write_temp_ini(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn data_dir_with(series: &[BarSeries]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for s in series {
        write_csv(dir.path(), s);
    }
    dir
}

fn ini_for(data_dir: &Path, extra: &str) -> String {
    format!(
        "[backtest]\ndata_dir = {}\ninitial_capital = 100000\nlookback_bars = 60\n{extra}",
        data_dir.display()
    )
}

fn run_args(args: &[&str]) -> ExitCode {
    cli::run(Cli::try_parse_from(args).unwrap())
}

fn chart_points(svg: &str) -> usize {
    let start = svg.find("points=\"").unwrap() + "points=\"".len();
    let end = start + svg[start..].find('"').unwrap();
    svg[start..end].split_whitespace().count()
}

mod parsing {
    use super::*;

    #[test]
    fn score_days_defaults_to_thirty() {
        let cli = Cli::try_parse_from(["trendscore", "score", "-c", "x.ini", "-s", "AAPL"]).unwrap();
        match cli.command {
            Command::Score { days, symbol, .. } => {
                assert_eq!(days, cli::DEFAULT_HISTORY_DAYS);
                assert_eq!(symbol, "AAPL");
            }
            other => panic!("expected score, got {other:?}"),
        }
    }

    #[test]
    fn backtest_accepts_symbol_override() {
        let cli = Cli::try_parse_from([
            "trendscore",
            "backtest",
            "--config",
            "x.ini",
            "--symbols",
            "AAPL,MSFT",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::Backtest { symbols: Some(ref s), .. } if s == "AAPL,MSFT"
        ));
    }

    #[test]
    fn config_is_required() {
        assert!(Cli::try_parse_from(["trendscore", "validate"]).is_err());
    }
}

mod validate_command {
    use super::*;

    #[test]
    fn valid_config_succeeds() {
        let file = write_temp_ini(
            "[score]\nweight_macd = 0.5\nweight_mfi = 0.25\nweight_obv = 0.25\n\n[decision]\npolicy = simple\n",
        );
        let path = file.path().to_str().unwrap();
        assert_eq!(run_args(&["trendscore", "validate", "-c", path]), ExitCode::SUCCESS);
    }

    #[test]
    fn bad_weights_exit_with_config_code() {
        let file = write_temp_ini("[score]\nweight_macd = 0.6\n");
        let path = file.path().to_str().unwrap();
        assert_eq!(run_args(&["trendscore", "validate", "-c", path]), ExitCode::from(2));
    }

    #[test]
    fn missing_file_exits_with_config_code() {
        assert_eq!(
            run_args(&["trendscore", "validate", "-c", "/nonexistent/trendscore.ini"]),
            ExitCode::from(2)
        );
    }

    #[test]
    fn lookback_shorter_than_warmup_is_rejected() {
        let file = write_temp_ini("[backtest]\ndata_dir = /tmp\nlookback_bars = 20\n");
        let path = file.path().to_str().unwrap();
        assert_eq!(run_args(&["trendscore", "validate", "-c", path]), ExitCode::from(2));
    }

    #[test]
    fn backtest_section_is_checked_when_present() {
        let file = write_temp_ini("[backtest]\ndata_dir = /tmp\nlookback_bars = soon\n");
        let path = file.path().to_str().unwrap();
        assert_eq!(run_args(&["trendscore", "validate", "-c", path]), ExitCode::from(2));
    }
}

mod score_command {
    use super::*;

    #[test]
    fn scores_symbol_from_csv() {
        let data = data_dir_with(&[rising_series("AAPL", 70)]);
        let ini = write_temp_ini(&ini_for(data.path(), ""));
        let path = ini.path().to_str().unwrap();

        let exit = run_args(&["trendscore", "score", "-c", path, "-s", "aapl", "-d", "10"]);
        assert_eq!(exit, ExitCode::SUCCESS);
    }

    #[test]
    fn svg_chart_has_one_point_per_score() {
        let data = data_dir_with(&[rising_series("AAPL", 70)]);
        let ini = write_temp_ini(&ini_for(data.path(), ""));
        let path = ini.path().to_str().unwrap();
        let chart = data.path().join("aapl.svg");

        let exit = run_args(&[
            "trendscore",
            "score",
            "-c",
            path,
            "-s",
            "AAPL",
            "-d",
            "10",
            "--svg",
            chart.to_str().unwrap(),
        ]);
        assert_eq!(exit, ExitCode::SUCCESS);

        let svg = std::fs::read_to_string(&chart).unwrap();
        assert!(svg.contains(r#"<line class="baseline" x1="40.0" y1="120.0" x2="560.0" y2="120.0""#));
        assert_eq!(chart_points(&svg), 10);
    }

    #[test]
    fn unknown_symbol_is_a_data_error() {
        let data = data_dir_with(&[rising_series("AAPL", 70)]);
        let ini = write_temp_ini(&ini_for(data.path(), ""));
        let path = ini.path().to_str().unwrap();

        let exit = run_args(&["trendscore", "score", "-c", path, "-s", "ZZZ"]);
        assert_eq!(exit, ExitCode::from(3));
    }

    #[test]
    fn short_history_exits_with_history_code() {
        let data = data_dir_with(&[rising_series("NEW", 20)]);
        let ini = write_temp_ini(&ini_for(data.path(), ""));
        let path = ini.path().to_str().unwrap();

        let exit = run_args(&["trendscore", "score", "-c", path, "-s", "NEW"]);
        assert_eq!(exit, ExitCode::from(5));
    }

    #[test]
    fn missing_data_dir_is_a_config_error() {
        let ini = write_temp_ini("[decision]\npolicy = simple\n");
        let path = ini.path().to_str().unwrap();

        let exit = run_args(&["trendscore", "score", "-c", path, "-s", "AAPL"]);
        assert_eq!(exit, ExitCode::from(2));
    }
}

mod backtest_command {
    use super::*;

    #[test]
    fn backtest_over_csv_directory_succeeds() {
        let data = data_dir_with(&[rising_series("AAPL", 80), falling_series("AMD", 80)]);
        let ini = write_temp_ini(&ini_for(data.path(), "symbols = AAPL,AMD\n"));
        let path = ini.path().to_str().unwrap();

        assert_eq!(run_args(&["trendscore", "backtest", "-c", path]), ExitCode::SUCCESS);
    }

    #[test]
    fn backtest_discovers_symbols_without_list() {
        let data = data_dir_with(&[rising_series("AAPL", 80)]);
        let ini = write_temp_ini(&ini_for(data.path(), ""));
        let path = ini.path().to_str().unwrap();

        assert_eq!(run_args(&["trendscore", "backtest", "-c", path]), ExitCode::SUCCESS);
    }

    #[test]
    fn lower_case_csv_files_are_discovered_and_fetched() {
        let data = data_dir_with(&[rising_series("aapl", 80)]);
        let ini = write_temp_ini(&ini_for(data.path(), ""));
        let path = ini.path().to_str().unwrap();

        assert_eq!(run_args(&["trendscore", "backtest", "-c", path]), ExitCode::SUCCESS);
        assert_eq!(
            run_args(&["trendscore", "backtest", "-c", path, "--symbols", "aapl"]),
            ExitCode::SUCCESS
        );
    }

    #[test]
    fn short_lookback_is_a_config_error() {
        let data = data_dir_with(&[rising_series("AAPL", 80)]);
        let ini = write_temp_ini(&format!(
            "[backtest]\ndata_dir = {}\nlookback_bars = 30\n",
            data.path().display()
        ));
        let path = ini.path().to_str().unwrap();

        assert_eq!(run_args(&["trendscore", "backtest", "-c", path]), ExitCode::from(2));
    }

    #[test]
    fn backtest_writes_equity_chart() {
        let data = data_dir_with(&[rising_series("AAPL", 80)]);
        let ini = write_temp_ini(&ini_for(data.path(), ""));
        let path = ini.path().to_str().unwrap();
        let chart = data.path().join("equity.svg");

        let exit = run_args(&[
            "trendscore",
            "backtest",
            "-c",
            path,
            "--svg",
            chart.to_str().unwrap(),
        ]);
        assert_eq!(exit, ExitCode::SUCCESS);

        let svg = std::fs::read_to_string(&chart).unwrap();
        assert!(svg.contains("Equity curve"));
        assert_eq!(chart_points(&svg), 80);
    }

    #[test]
    fn backtest_with_no_loadable_symbol_fails() {
        let data = data_dir_with(&[rising_series("AAPL", 80)]);
        let ini = write_temp_ini(&ini_for(data.path(), ""));
        let path = ini.path().to_str().unwrap();

        let exit = run_args(&["trendscore", "backtest", "-c", path, "--symbols", "ZZZ"]);
        assert_eq!(exit, ExitCode::from(5));
    }

    #[test]
    fn csv_round_trip_through_library_pipeline() {
        let data = data_dir_with(&[rising_series("AAPL", 75), rising_series("MSFT", 75)]);
        let config = FileConfigAdapter::from_string(&ini_for(
            data.path(),
            "start_date = 2024-01-01\nend_date = 2024-12-31\n",
        ))
        .unwrap();

        let trend = build_trend_config(&config).unwrap();
        let bt = build_backtest_config(&config).unwrap();
        let port = CsvAdapter::new(data.path());
        let symbols = vec!["AAPL".to_string(), "MSFT".to_string()];

        let universe = load_universe(&port, &symbols, bt.start_date, bt.end_date).unwrap();
        let timeline = build_unified_timeline(&universe.series);
        let result = run_backtest(&universe.series, &timeline, &trend, &bt).unwrap();

        assert_eq!(result.equity_curve.len(), 75);
        let first_live = &result.passes[59];
        assert_eq!(first_live.decisions.len(), 2);
        assert!(first_live
            .decisions
            .iter()
            .all(|d| matches!(d.action, Action::Enter { target_weight } if (target_weight - 0.05).abs() < 1e-12)));
        assert!(result.final_equity > 0.0);
    }
}
