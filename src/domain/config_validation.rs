//! Configuration validation.
//!
//! Validates all config fields before a backtest or live session starts.
//! The parsing helpers here are shared with the CLI config builders so that a
//! value accepted by validation is read back the same way.

use crate::domain::bar::PriceSource;
use crate::domain::error::TraderError;
use crate::domain::indicator::{IndicatorKind, MaMethod};
use crate::domain::strategy::{DEFAULT_WARMUP_BARS, MIN_WARMUP_BARS};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub const INDICATOR_SECTIONS: [&str; 2] = ["indicators", "confirmation_indicators"];

pub fn validate_all(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_trading_config(config)?;
    validate_strategy_config(config)?;
    validate_risk_config(config)?;
    validate_backtest_config(config)?;
    for section in INDICATOR_SECTIONS {
        validate_indicator_config(config, section)?;
    }
    Ok(())
}

pub fn validate_trading_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_symbols(config)?;
    validate_position_sizes(config)?;
    validate_leverage(config)?;
    Ok(())
}

pub fn validate_strategy_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_aggressiveness(config)?;
    validate_positive(config, "strategy", "trailing_activation", 0.8)?;
    validate_positive(config, "strategy", "trailing_distance", 1.0)?;
    validate_min_int(
        config,
        "strategy",
        "warmup_bars",
        DEFAULT_WARMUP_BARS as i64,
        MIN_WARMUP_BARS as i64,
    )?;
    validate_min_int(config, "strategy", "min_confirmation_bars", 20, 0)?;
    validate_progressive_lots(config)?;
    Ok(())
}

pub fn validate_risk_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_positive(config, "risk", "max_daily_loss", 1000.0)?;
    validate_max_drawdown(config)?;
    validate_min_int(config, "risk", "max_positions", 3, 1)?;
    Ok(())
}

pub fn validate_backtest_config(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_positive(config, "backtesting", "initial_capital", 10_000.0)?;
    validate_non_negative(config, "backtesting", "commission")?;
    validate_non_negative(config, "backtesting", "slippage")?;
    validate_annualization_factor(config)?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_indicator_config(config: &dyn ConfigPort, section: &str) -> Result<(), TraderError> {
    if let Some(compute) = config.get_string(section, "compute") {
        parse_compute(&compute).map_err(|reason| invalid(section, "compute", reason))?;
    }
    if let Some(method) = config.get_string(section, "keltner_ma_method") {
        if MaMethod::parse(&method).is_none() {
            return Err(invalid(
                section,
                "keltner_ma_method",
                format!("unknown moving average method '{}'", method.trim()),
            ));
        }
    }
    if let Some(price) = config.get_string(section, "keltner_price") {
        if PriceSource::parse(&price).is_none() {
            return Err(invalid(
                section,
                "keltner_price",
                format!("unknown price source '{}'", price.trim()),
            ));
        }
    }
    for key in [
        "zigzag_depth",
        "keltner_ma_period",
        "keltner_atr_period",
        "bollinger_length",
        "rsi_period",
        "macd_fast",
        "macd_slow",
        "macd_signal",
        "supertrend_period",
        "cci_period",
        "atr_period",
    ] {
        validate_min_int(config, section, key, 1, 1)?;
    }
    for key in [
        "keltner_atr_multiple",
        "bollinger_deviation",
        "supertrend_multiplier",
    ] {
        validate_positive(config, section, key, 1.0)?;
    }
    let fast = config.get_int(section, "macd_fast", 12);
    let slow = config.get_int(section, "macd_slow", 26);
    if fast >= slow {
        return Err(invalid(
            section,
            "macd_fast",
            "macd_fast must be below macd_slow".to_string(),
        ));
    }
    Ok(())
}

/// Comma separated symbol list, upper-cased, empties dropped.
pub fn parse_symbols(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_uppercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// `SYMBOL:lots, SYMBOL:lots` into a map. Lots must be positive.
pub fn parse_position_sizes(value: &str) -> Result<BTreeMap<String, f64>, String> {
    let mut sizes = BTreeMap::new();
    for entry in value.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((symbol, lots)) = entry.split_once(':') else {
            return Err(format!("expected SYMBOL:lots, got '{entry}'"));
        };
        let symbol = symbol.trim().to_uppercase();
        if symbol.is_empty() {
            return Err(format!("missing symbol in '{entry}'"));
        }
        let lots: f64 = lots
            .trim()
            .parse()
            .map_err(|_| format!("invalid lot size in '{entry}'"))?;
        if !(lots > 0.0) {
            return Err(format!("lot size for {symbol} must be positive"));
        }
        sizes.insert(symbol, lots);
    }
    Ok(sizes)
}

/// Comma separated indicator names. Unknown names are an error.
pub fn parse_compute(value: &str) -> Result<Vec<IndicatorKind>, String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|name| IndicatorKind::parse(name).ok_or_else(|| format!("unknown indicator '{name}'")))
        .collect()
}

pub fn parse_date(value: &str, section: &str, key: &str) -> Result<NaiveDate, TraderError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| {
        invalid(
            section,
            key,
            format!("invalid {key} format, expected YYYY-MM-DD"),
        )
    })
}

fn invalid(section: &str, key: &str, reason: String) -> TraderError {
    TraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason,
    }
}

fn validate_symbols(config: &dyn ConfigPort) -> Result<(), TraderError> {
    match config.get_string("trading", "symbols") {
        None => Err(TraderError::ConfigMissing {
            section: "trading".to_string(),
            key: "symbols".to_string(),
        }),
        Some(s) if parse_symbols(&s).is_empty() => Err(invalid(
            "trading",
            "symbols",
            "symbols must list at least one symbol".to_string(),
        )),
        Some(_) => Ok(()),
    }
}

fn validate_position_sizes(config: &dyn ConfigPort) -> Result<(), TraderError> {
    if let Some(value) = config.get_string("trading", "position_sizes") {
        parse_position_sizes(&value).map_err(|reason| invalid("trading", "position_sizes", reason))?;
    }
    Ok(())
}

fn validate_leverage(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let value = config.get_int("trading", "leverage", 100);
    if value < 1 {
        return Err(invalid(
            "trading",
            "leverage",
            "leverage must be at least 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_aggressiveness(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let value = config.get_int("strategy", "aggressiveness", 2);
    if !(1..=3).contains(&value) {
        return Err(invalid(
            "strategy",
            "aggressiveness",
            "aggressiveness must be 1, 2 or 3".to_string(),
        ));
    }
    Ok(())
}

fn validate_progressive_lots(config: &dyn ConfigPort) -> Result<(), TraderError> {
    validate_positive(config, "progressive_lots", "profit_threshold", 0.20)?;
    validate_positive(config, "progressive_lots", "lot_increase", 0.05)?;
    validate_min_int(config, "progressive_lots", "frequency_days", 7, 1)?;
    Ok(())
}

fn validate_max_drawdown(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let value = config.get_double("risk", "max_drawdown", 0.20);
    if value <= 0.0 || value >= 1.0 {
        return Err(invalid(
            "risk",
            "max_drawdown",
            "max_drawdown must be between 0 and 1".to_string(),
        ));
    }
    Ok(())
}

fn validate_annualization_factor(config: &dyn ConfigPort) -> Result<(), TraderError> {
    if config.get_string("backtesting", "annualization_factor").is_none() {
        return Ok(());
    }
    let value = config.get_double("backtesting", "annualization_factor", 0.0);
    if value <= 0.0 {
        return Err(invalid(
            "backtesting",
            "annualization_factor",
            "annualization_factor must be positive".to_string(),
        ));
    }
    Ok(())
}

fn validate_dates(config: &dyn ConfigPort) -> Result<(), TraderError> {
    let start = config
        .get_string("backtesting", "start_date")
        .map(|s| parse_date(&s, "backtesting", "start_date"))
        .transpose()?;
    let end = config
        .get_string("backtesting", "end_date")
        .map(|s| parse_date(&s, "backtesting", "end_date"))
        .transpose()?;
    if let (Some(start), Some(end)) = (start, end) {
        if start >= end {
            return Err(invalid(
                "backtesting",
                "start_date",
                "start_date must be before end_date".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_positive(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: f64,
) -> Result<(), TraderError> {
    let value = config.get_double(section, key, default);
    if !(value > 0.0) {
        return Err(invalid(section, key, format!("{key} must be positive")));
    }
    Ok(())
}

fn validate_non_negative(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), TraderError> {
    let value = config.get_double(section, key, 0.0);
    if value < 0.0 {
        return Err(invalid(section, key, format!("{key} must be non-negative")));
    }
    Ok(())
}

fn validate_min_int(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
    default: i64,
    minimum: i64,
) -> Result<(), TraderError> {
    let value = config.get_int(section, key, default);
    if value < minimum {
        return Err(invalid(section, key, format!("{key} must be at least {minimum}")));
    }
    Ok(())
}
