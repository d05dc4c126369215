//! CLI definition and dispatch.

use chrono::{NaiveDateTime, NaiveTime};
use clap::{Parser, Subcommand};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::{parse_timestamp, CsvBarSource};
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::json_report_adapter::JsonReportAdapter;
use crate::adapters::news_csv_adapter::CsvNewsFeed;
use crate::domain::backtest::{self as backtest_engine, BacktestConfig};
use crate::domain::bar::PriceSource;
use crate::domain::config_validation::{
    parse_compute, parse_date, parse_position_sizes, parse_symbols, validate_all,
};
use crate::domain::engine::StrategyEngine;
use crate::domain::error::TraderError;
use crate::domain::execution::ExecutionConfig;
use crate::domain::indicator::keltner::KeltnerParams;
use crate::domain::indicator::{
    bollinger::BollingerParams, calculate_all, macd::MacdParams, supertrend::SupertrendParams,
    IndicatorParams, MaMethod,
};
use crate::domain::live::DEFAULT_MAGIC_NUMBER;
use crate::domain::market::{build_unified_timeline, SymbolData};
use crate::domain::metrics::TradeStatistics;
use crate::domain::news::{watches, NewsBlackout, DEFAULT_REFRESH_DAYS};
use crate::domain::risk::{ProgressiveLotsConfig, RiskLimits};
use crate::domain::strategy::{
    Aggressiveness, StrategyConfig, TrailingConfig, DEFAULT_MIN_CONFIRMATION_BARS,
    DEFAULT_NEWS_MINUTES_BEFORE, DEFAULT_WARMUP_BARS,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::BarSource;
use crate::ports::news_port::NewsFeed;
use crate::ports::report_port::ReportPort;

#[derive(Parser, Debug)]
#[command(name = "hybridtrader", about = "Hybrid FX/gold strategy backtester")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Run a backtest over CSV bar files
    Backtest {
        #[arg(short, long)]
        config: PathBuf,
        /// Report directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        #[arg(long)]
        data_dir: Option<PathBuf>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
    /// List upcoming high-impact news events
    News {
        /// Calendar CSV; overrides `[live] news_calendar` from `--config`
        #[arg(long)]
        calendar: Option<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        symbol: Option<String>,
        /// Reference time, `YYYY-MM-DD HH:MM:SS`; defaults to now
        #[arg(long)]
        at: Option<String>,
        #[arg(long, default_value_t = 24)]
        hours: i64,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Backtest {
            config,
            output,
            symbol,
            data_dir,
        } => run_backtest(&config, output.as_ref(), symbol.as_deref(), data_dir.as_ref()),
        Command::Validate { config } => run_validate(&config),
        Command::News {
            calendar,
            config,
            symbol,
            at,
            hours,
        } => run_news(
            calendar.as_ref(),
            config.as_ref(),
            symbol.as_deref(),
            at.as_deref(),
            hours,
        ),
    }
}

pub fn load_config(path: &PathBuf) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|e| {
        let err = TraderError::ConfigParse {
            file: path.display().to_string(),
            reason: e.to_string(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

/// Bar-loading settings shared by every symbol in a run.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketDataConfig {
    pub timeframe: String,
    pub confirmation_timeframe: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub primary: IndicatorParams,
    pub confirmation: IndicatorParams,
}

/// Settings only a live session reads.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveSettings {
    pub magic_number: u64,
    pub news_calendar: Option<PathBuf>,
    pub news_refresh_days: i64,
}

fn run_backtest(
    config_path: &PathBuf,
    output_path: Option<&PathBuf>,
    symbol_override: Option<&str>,
    data_dir_override: Option<&PathBuf>,
) -> ExitCode {
    // Stage 1: Load config
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    // Stage 2: Validate
    if let Err(e) = validate_all(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    // Stage 3: Build configs
    let built = build_strategy_config(&adapter).and_then(|strategy| {
        let market = build_market_data_config(&adapter)?;
        let bt_config = build_backtest_config(&adapter)?;
        Ok((strategy, market, bt_config))
    });
    let (strategy, market, bt_config) = match built {
        Ok(c) => c,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };
    eprintln!("Strategy: {}", strategy.aggressiveness);

    // Stage 4: Resolve symbols and data directory
    let symbols = resolve_symbols(symbol_override, &adapter);
    if symbols.is_empty() {
        eprintln!("error: no symbols configured");
        return ExitCode::from(2);
    }

    let data_dir = data_dir_override.cloned().unwrap_or_else(|| {
        PathBuf::from(
            adapter
                .get_string("backtesting", "data_dir")
                .unwrap_or_else(|| "data".to_string()),
        )
    });
    eprintln!("Reading bars from {}", data_dir.display());

    let source = CsvBarSource::new(data_dir);
    let output = output_path
        .cloned()
        .unwrap_or_else(|| PathBuf::from("report"));

    run_backtest_pipeline(
        &source,
        &JsonReportAdapter::new(),
        strategy,
        &market,
        &bt_config,
        &symbols,
        &output,
    )
}

pub fn build_strategy_config(config: &dyn ConfigPort) -> Result<StrategyConfig, TraderError> {
    let level = config.get_int("strategy", "aggressiveness", 2);
    let aggressiveness =
        Aggressiveness::from_level(level).ok_or_else(|| TraderError::ConfigInvalid {
            section: "strategy".into(),
            key: "aggressiveness".into(),
            reason: format!("unknown level {level}"),
        })?;

    let position_sizes = match config.get_string("trading", "position_sizes") {
        Some(s) => parse_position_sizes(&s).map_err(|reason| TraderError::ConfigInvalid {
            section: "trading".into(),
            key: "position_sizes".into(),
            reason,
        })?,
        None => Default::default(),
    };

    Ok(StrategyConfig {
        aggressiveness,
        trailing: TrailingConfig {
            activation_r: config.get_double("strategy", "trailing_activation", 0.8),
            distance_atr: config.get_double("strategy", "trailing_distance", 1.0),
        },
        warmup_bars: config.get_usize("strategy", "warmup_bars", DEFAULT_WARMUP_BARS)?,
        min_confirmation_bars: config.get_usize(
            "strategy",
            "min_confirmation_bars",
            DEFAULT_MIN_CONFIRMATION_BARS,
        )?,
        news_minutes_before: config.get_int(
            "strategy",
            "news_minutes_before",
            DEFAULT_NEWS_MINUTES_BEFORE,
        ),
        risk: RiskLimits {
            max_daily_loss: config.get_double("risk", "max_daily_loss", 1000.0),
            max_drawdown: config.get_double("risk", "max_drawdown", 0.20),
            max_positions: config.get_usize("risk", "max_positions", 3)?,
        },
        progressive: ProgressiveLotsConfig {
            enabled: config.get_bool("progressive_lots", "enabled", false),
            profit_threshold: config.get_double("progressive_lots", "profit_threshold", 0.20),
            lot_increase: config.get_double("progressive_lots", "lot_increase", 0.05),
            frequency_days: config.get_int("progressive_lots", "frequency_days", 7),
        },
        position_sizes,
        initial_capital: config.get_double("backtesting", "initial_capital", 10_000.0),
        execution: ExecutionConfig {
            commission: config.get_double("backtesting", "commission", 0.0),
            slippage: config.get_double("backtesting", "slippage", 0.0),
        },
    })
}

/// Read one indicator section over `defaults`. `compute` restricts the
/// suite; absent keys keep the default value.
pub fn build_indicator_params(
    config: &dyn ConfigPort,
    section: &str,
    defaults: IndicatorParams,
) -> Result<IndicatorParams, TraderError> {
    let invalid = |key: &str, reason: String| TraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    };

    let keltner_default = defaults.keltner.unwrap_or_default();
    let ma_method = match config.get_string(section, "keltner_ma_method") {
        Some(s) => MaMethod::parse(&s)
            .ok_or_else(|| invalid("keltner_ma_method", format!("unknown method '{s}'")))?,
        None => keltner_default.ma_method,
    };
    let price = match config.get_string(section, "keltner_price") {
        Some(s) => PriceSource::parse(&s)
            .ok_or_else(|| invalid("keltner_price", format!("unknown price '{s}'")))?,
        None => keltner_default.price,
    };
    let bollinger_default = defaults.bollinger.unwrap_or_default();
    let macd_default = defaults.macd.unwrap_or_default();
    let supertrend_default = defaults.supertrend.unwrap_or_default();

    let params = IndicatorParams {
        zigzag_depth: Some(config.get_usize(
            section,
            "zigzag_depth",
            defaults.zigzag_depth.unwrap_or(0),
        )?),
        keltner: Some(KeltnerParams {
            ma_period: config.get_usize(section, "keltner_ma_period", keltner_default.ma_period)?,
            atr_period: config.get_usize(
                section,
                "keltner_atr_period",
                keltner_default.atr_period,
            )?,
            atr_multiple: config.get_double(
                section,
                "keltner_atr_multiple",
                keltner_default.atr_multiple,
            ),
            ma_method,
            price,
        }),
        bollinger: Some(BollingerParams {
            length: config.get_usize(section, "bollinger_length", bollinger_default.length)?,
            deviation: config.get_double(
                section,
                "bollinger_deviation",
                bollinger_default.deviation,
            ),
        }),
        rsi_period: Some(config.get_usize(
            section,
            "rsi_period",
            defaults.rsi_period.unwrap_or(0),
        )?),
        macd: Some(MacdParams {
            fast: config.get_usize(section, "macd_fast", macd_default.fast)?,
            slow: config.get_usize(section, "macd_slow", macd_default.slow)?,
            signal: config.get_usize(section, "macd_signal", macd_default.signal)?,
        }),
        supertrend: Some(SupertrendParams {
            period: config.get_usize(
                section,
                "supertrend_period",
                supertrend_default.period,
            )?,
            multiplier: config.get_double(
                section,
                "supertrend_multiplier",
                supertrend_default.multiplier,
            ),
        }),
        cci_period: Some(config.get_usize(
            section,
            "cci_period",
            defaults.cci_period.unwrap_or(0),
        )?),
        atr_period: Some(config.get_usize(
            section,
            "atr_period",
            defaults.atr_period.unwrap_or(0),
        )?),
    };

    match config.get_string(section, "compute") {
        Some(list) => {
            let kinds = parse_compute(&list).map_err(|reason| invalid("compute", reason))?;
            Ok(params.restrict_to(&kinds))
        }
        None => Ok(params),
    }
}

pub fn build_market_data_config(config: &dyn ConfigPort) -> Result<MarketDataConfig, TraderError> {
    let start = match config.get_string("backtesting", "start_date") {
        Some(s) => parse_date(&s, "backtesting", "start_date")?.and_time(NaiveTime::MIN),
        None => NaiveDateTime::MIN,
    };
    let end = match config.get_string("backtesting", "end_date") {
        Some(s) => {
            let date = parse_date(&s, "backtesting", "end_date")?;
            date.and_hms_opt(23, 59, 59).unwrap_or(date.and_time(NaiveTime::MIN))
        }
        None => NaiveDateTime::MAX,
    };

    Ok(MarketDataConfig {
        timeframe: config
            .get_string("trading", "timeframe")
            .unwrap_or_else(|| "1m".to_string()),
        confirmation_timeframe: config
            .get_string("trading", "confirmation_timeframe")
            .unwrap_or_else(|| "5m".to_string()),
        start,
        end,
        primary: build_indicator_params(config, "indicators", IndicatorParams::default())?,
        confirmation: build_indicator_params(
            config,
            "confirmation_indicators",
            IndicatorParams::confirmation(),
        )?,
    })
}

pub fn build_backtest_config(config: &dyn ConfigPort) -> Result<BacktestConfig, TraderError> {
    let annualization_factor = match config.get_string("backtesting", "annualization_factor") {
        Some(raw) => Some(raw.trim().parse::<f64>().map_err(|_| {
            TraderError::ConfigInvalid {
                section: "backtesting".into(),
                key: "annualization_factor".into(),
                reason: format!("'{raw}' is not a number"),
            }
        })?),
        None => None,
    };
    Ok(BacktestConfig {
        close_at_end: config.get_bool("backtesting", "close_at_end", true),
        annualization_factor,
    })
}

pub fn build_live_settings(config: &dyn ConfigPort) -> LiveSettings {
    LiveSettings {
        magic_number: u64::try_from(config.get_int("live", "magic_number", DEFAULT_MAGIC_NUMBER as i64))
            .unwrap_or(DEFAULT_MAGIC_NUMBER),
        news_calendar: config
            .get_string("live", "news_calendar")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from),
        news_refresh_days: config.get_int("live", "news_refresh_days", DEFAULT_REFRESH_DAYS),
    }
}

pub fn resolve_symbols(symbol_override: Option<&str>, config: &dyn ConfigPort) -> Vec<String> {
    if let Some(s) = symbol_override {
        return parse_symbols(s);
    }
    config
        .get_string("trading", "symbols")
        .map(|s| parse_symbols(&s))
        .unwrap_or_default()
}

/// Fetch both timeframes for `symbol` and compute their indicator frames.
pub fn load_symbol_data(
    source: &dyn BarSource,
    symbol: &str,
    market: &MarketDataConfig,
    strategy: &StrategyConfig,
) -> Result<SymbolData, TraderError> {
    let primary = source.get_historical(symbol, &market.timeframe, market.start, market.end)?;
    let minimum = strategy.warmup_bars + 1;
    if primary.len() < minimum {
        return Err(TraderError::InsufficientData {
            symbol: symbol.to_string(),
            timeframe: market.timeframe.clone(),
            bars: primary.len(),
            minimum,
        });
    }

    let confirmation = source.get_historical(
        symbol,
        &market.confirmation_timeframe,
        market.start,
        market.end,
    )?;
    // Counted on the primary timeline, as the engine sees it after resampling.
    let aligned = confirmation.first().map_or(0, |first| {
        primary
            .iter()
            .filter(|b| b.timestamp >= first.timestamp)
            .count()
    });
    if aligned < strategy.min_confirmation_bars {
        return Err(TraderError::InsufficientData {
            symbol: symbol.to_string(),
            timeframe: market.confirmation_timeframe.clone(),
            bars: aligned,
            minimum: strategy.min_confirmation_bars,
        });
    }

    Ok(SymbolData::new(
        symbol.to_string(),
        calculate_all(primary, &market.primary),
        calculate_all(confirmation, &market.confirmation),
    ))
}

pub fn run_backtest_pipeline(
    source: &dyn BarSource,
    report: &dyn ReportPort,
    strategy: StrategyConfig,
    market: &MarketDataConfig,
    bt_config: &BacktestConfig,
    symbols: &[String],
    output_path: &Path,
) -> ExitCode {
    // Stage 5: Fetch bars and compute indicators
    let mut symbol_data: Vec<SymbolData> = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        match load_symbol_data(source, symbol, market, &strategy) {
            Ok(sd) => {
                eprintln!("  {}: {} bars", symbol, sd.bar_count());
                symbol_data.push(sd);
            }
            Err(
                e @ (TraderError::DataUnavailable { .. } | TraderError::InsufficientData { .. }),
            ) => {
                eprintln!("warning: skipping {} ({})", symbol, e);
            }
            Err(e) => {
                eprintln!("error: {e}");
                return (&e).into();
            }
        }
    }

    if symbol_data.is_empty() {
        eprintln!("error: no symbols with usable data to backtest");
        return ExitCode::from(5);
    }

    // Stage 6: Build timeline and run backtest
    let timeline = build_unified_timeline(&symbol_data);
    if let (Some(first), Some(last)) = (timeline.first(), timeline.last()) {
        eprintln!(
            "Running backtest: {} symbols, {} to {}",
            symbol_data.len(),
            first,
            last
        );
    }
    eprintln!("  Processing: {} timestamps", timeline.len());

    let mut engine = StrategyEngine::new(strategy, NewsBlackout::inert());
    let result = backtest_engine::run_backtest(&symbol_data, &timeline, &mut engine, bt_config);

    // Stage 7: Print console summary to stderr
    let stats = &result.summary.trades;
    let perf = &result.summary.performance;
    eprintln!("\n=== Aggregate Results ===");
    eprintln!("Final Equity:     {:.2}", perf.final_equity);
    eprintln!("Total Return:     {:.2}%", perf.total_return * 100.0);
    eprintln!("Sharpe Ratio:     {:.2}", perf.sharpe_ratio);
    eprintln!("Sortino Ratio:    {:.2}", perf.sortino_ratio);
    eprintln!("Max Drawdown:     -{:.1}%", perf.max_drawdown * 100.0);
    eprintln!("Total Trades:     {}", stats.total_trades);
    eprintln!("Win Rate:         {:.1}%", stats.win_rate * 100.0);
    eprintln!("Profit Factor:    {:.2}", stats.profit_factor);
    eprintln!("Avg R:            {:.2}", stats.avg_r_multiple);
    eprintln!("Trades/Day:       {:.2}", perf.trades_per_day);

    let traded: BTreeSet<&str> = result.trades.iter().map(|t| t.symbol.as_str()).collect();
    if !traded.is_empty() {
        eprintln!("\n=== Per-Symbol Summary ===");
        for symbol in traded {
            let trades: Vec<_> = result
                .trades
                .iter()
                .filter(|t| t.symbol == symbol)
                .cloned()
                .collect();
            let s = TradeStatistics::compute(&trades);
            let pnl_sign = if s.total_pnl >= 0.0 { "+" } else { "" };
            eprintln!(
                "  {}:  {} trades, {:.1}% win rate, {}${:.2}",
                symbol,
                s.total_trades,
                s.win_rate * 100.0,
                pnl_sign,
                s.total_pnl,
            );
        }
    }

    // Stage 8: Write reports
    match report.write(&result, &output_path.to_string_lossy()) {
        Ok(()) => {
            eprintln!("\nReport written to: {}", output_path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to write report: {e}");
            (&e).into()
        }
    }
}

fn run_validate(config_path: &PathBuf) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    if let Err(e) = validate_all(&adapter) {
        eprintln!("error: {e}");
        return (&e).into();
    }

    let strategy = match build_strategy_config(&adapter) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    eprintln!("\nSymbols:        {}", resolve_symbols(None, &adapter).join(", "));
    eprintln!("Aggressiveness: {}", strategy.aggressiveness);
    eprintln!(
        "Trailing:       {:.2}R activation, {:.2} ATR distance",
        strategy.trailing.activation_r, strategy.trailing.distance_atr
    );
    eprintln!(
        "Risk:           daily loss {:.2}, drawdown {:.1}%, max {} positions",
        strategy.risk.max_daily_loss,
        strategy.risk.max_drawdown * 100.0,
        strategy.risk.max_positions
    );
    for (symbol, lots) in &strategy.position_sizes {
        eprintln!("  {symbol}: {lots} lots");
    }

    let live = build_live_settings(&adapter);
    eprintln!("\nMagic number:   {}", live.magic_number);
    match &live.news_calendar {
        Some(path) => eprintln!(
            "News calendar:  {} (refresh every {} days)",
            path.display(),
            live.news_refresh_days
        ),
        None => eprintln!("News calendar:  none"),
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}

/// Calendar from `--calendar`, else from the config's `[live]` section.
fn resolve_calendar(
    calendar: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
) -> Result<PathBuf, ExitCode> {
    if let Some(path) = calendar {
        return Ok(path.clone());
    }
    let Some(config_path) = config_path else {
        eprintln!("error: pass --calendar or a --config with [live] news_calendar");
        return Err(ExitCode::from(2));
    };
    let adapter = load_config(config_path)?;
    build_live_settings(&adapter).news_calendar.ok_or_else(|| {
        let err = TraderError::ConfigMissing {
            section: "live".into(),
            key: "news_calendar".into(),
        };
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn run_news(
    calendar: Option<&PathBuf>,
    config_path: Option<&PathBuf>,
    symbol: Option<&str>,
    at: Option<&str>,
    hours: i64,
) -> ExitCode {
    let calendar = match resolve_calendar(calendar, config_path) {
        Ok(path) => path,
        Err(code) => return code,
    };

    let now = match at {
        Some(raw) => match parse_timestamp(raw) {
            Some(ts) => ts,
            None => {
                eprintln!("error: invalid --at timestamp '{raw}', expected YYYY-MM-DD HH:MM:SS");
                return ExitCode::from(2);
            }
        },
        None => chrono::Local::now().naive_local(),
    };

    let events = match CsvNewsFeed::new(calendar).fetch() {
        Ok(events) => events,
        Err(e) => {
            eprintln!("error: {e}");
            return (&e).into();
        }
    };

    let symbol = symbol.map(|s| s.trim().to_uppercase());
    let upcoming: Vec<_> = NewsBlackout::from_events(events)
        .upcoming(now, hours)
        .into_iter()
        .filter(|e| symbol.as_deref().is_none_or(|s| watches(s, &e.country)))
        .collect();

    if upcoming.is_empty() {
        eprintln!("No high-impact events in the next {hours}h from {now}");
    } else {
        for event in &upcoming {
            println!("{}  {:<4} {}", event.datetime, event.country, event.title);
        }
        eprintln!("{} events", upcoming.len());
    }
    ExitCode::SUCCESS
}
