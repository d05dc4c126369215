//! Technical indicator implementations.
//!
//! This module provides types for representing indicator values and series:
//! - `IndicatorPoint`: A single point in an indicator time series
//! - `IndicatorValue`: Enum for different indicator output shapes
//! - `IndicatorType`: Enum for indicator identity + parameters
//! - `IndicatorKind`: Parameterless identity, used as the frame column key
//! - `IndicatorSeries`: A time series of indicator values
//!
//! Every series is aligned with its input bars. A point at index `i` is a
//! function of bars `[0, i]` only; points whose window is incomplete or whose
//! computation degenerates (zero variance, zero deviation) carry
//! `valid == false` and must be skipped by consumers.

pub mod atr;
pub mod bollinger;
pub mod cci;
pub mod ema;
pub mod frame;
pub mod keltner;
pub mod macd;
pub mod rsi;
pub mod stddev;
pub mod supertrend;
pub mod zigzag;

pub use atr::calculate_atr;
pub use bollinger::calculate_bollinger;
pub use cci::calculate_cci;
pub use ema::calculate_ema;
pub use frame::{calculate_all, Column, IndicatorFrame};
pub use keltner::calculate_keltner;
pub use macd::calculate_macd;
pub use rsi::calculate_rsi;
pub use supertrend::calculate_supertrend;
pub use zigzag::calculate_zigzag;

use chrono::NaiveDateTime;
use std::fmt;

use crate::domain::bar::PriceSource;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: IndicatorValue,
}

impl IndicatorPoint {
    pub fn invalid(timestamp: NaiveDateTime, value: IndicatorValue) -> Self {
        Self {
            timestamp,
            valid: false,
            value,
        }
    }

    /// The scalar value, if the point is valid and carries one.
    pub fn simple(&self) -> Option<f64> {
        match (self.valid, &self.value) {
            (true, IndicatorValue::Simple(v)) => Some(*v),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Rsi {
        value: f64,
        /// Sign of the bar-over-bar RSI change.
        crossover: i8,
    },
    Macd {
        line: f64,
        signal: f64,
        histogram: f64,
        crossover: i8,
    },
    Bands {
        upper: f64,
        middle: f64,
        lower: f64,
    },
    Supertrend {
        line: f64,
        direction: i8,
    },
    Trend(i8),
}

/// Moving-average flavour for the Keltner middle line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MaMethod {
    Sma,
    Ema,
}

impl MaMethod {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "sma" | "0" => Some(MaMethod::Sma),
            "ema" | "1" => Some(MaMethod::Ema),
            _ => None,
        }
    }
}

impl fmt::Display for MaMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaMethod::Sma => write!(f, "SMA"),
            MaMethod::Ema => write!(f, "EMA"),
        }
    }
}

impl fmt::Display for PriceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PriceSource::Open => "open",
            PriceSource::High => "high",
            PriceSource::Low => "low",
            PriceSource::Close => "close",
            PriceSource::Median => "median",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Ema(usize),
    Atr(usize),
    Rsi(usize),
    Cci(usize),
    ZigZag(usize),
    Macd {
        fast: usize,
        slow: usize,
        signal: usize,
    },
    Keltner {
        ma_period: usize,
        atr_period: usize,
        atr_mult_x100: u32,
        ma_method: MaMethod,
        price: PriceSource,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
    Supertrend {
        period: usize,
        mult_x100: u32,
    },
}

impl IndicatorType {
    pub fn kind(&self) -> Option<IndicatorKind> {
        match self {
            IndicatorType::Ema(_) => None,
            IndicatorType::Atr(_) => Some(IndicatorKind::Atr),
            IndicatorType::Rsi(_) => Some(IndicatorKind::Rsi),
            IndicatorType::Cci(_) => Some(IndicatorKind::Cci),
            IndicatorType::ZigZag(_) => Some(IndicatorKind::ZigZag),
            IndicatorType::Macd { .. } => Some(IndicatorKind::Macd),
            IndicatorType::Keltner { .. } => Some(IndicatorKind::Keltner),
            IndicatorType::Bollinger { .. } => Some(IndicatorKind::Bollinger),
            IndicatorType::Supertrend { .. } => Some(IndicatorKind::Supertrend),
        }
    }
}

/// Scale a float parameter into the integer form used inside `IndicatorType`.
pub fn to_x100(value: f64) -> u32 {
    (value * 100.0).round().max(0.0) as u32
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Ema(period) => write!(f, "EMA({})", period),
            IndicatorType::Atr(period) => write!(f, "ATR({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::Cci(period) => write!(f, "CCI({})", period),
            IndicatorType::ZigZag(depth) => write!(f, "ZIGZAG({})", depth),
            IndicatorType::Macd { fast, slow, signal } => {
                write!(f, "MACD({},{},{})", fast, slow, signal)
            }
            IndicatorType::Keltner {
                ma_period,
                atr_period,
                atr_mult_x100,
                ma_method,
                price,
            } => {
                let mult = *atr_mult_x100 as f64 / 100.0;
                write!(
                    f,
                    "KELTNER({},{},{},{},{})",
                    ma_period, atr_period, mult, ma_method, price
                )
            }
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
            IndicatorType::Supertrend { period, mult_x100 } => {
                let mult = *mult_x100 as f64 / 100.0;
                write!(f, "SUPERTREND({},{})", period, mult)
            }
        }
    }
}

/// Column identity inside an indicator frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum IndicatorKind {
    ZigZag,
    Keltner,
    Bollinger,
    Rsi,
    Macd,
    Supertrend,
    Cci,
    Atr,
}

impl IndicatorKind {
    pub const ALL: [IndicatorKind; 8] = [
        IndicatorKind::ZigZag,
        IndicatorKind::Keltner,
        IndicatorKind::Bollinger,
        IndicatorKind::Rsi,
        IndicatorKind::Macd,
        IndicatorKind::Supertrend,
        IndicatorKind::Cci,
        IndicatorKind::Atr,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "zigzag" => Some(IndicatorKind::ZigZag),
            "keltner" => Some(IndicatorKind::Keltner),
            "bollinger" => Some(IndicatorKind::Bollinger),
            "rsi" => Some(IndicatorKind::Rsi),
            "macd" => Some(IndicatorKind::Macd),
            "supertrend" => Some(IndicatorKind::Supertrend),
            "cci" => Some(IndicatorKind::Cci),
            "atr" => Some(IndicatorKind::Atr),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn empty(indicator_type: IndicatorType) -> Self {
        Self {
            indicator_type,
            values: Vec::new(),
        }
    }

    pub fn get(&self, index: usize) -> Option<&IndicatorPoint> {
        self.values.get(index).filter(|p| p.valid)
    }
}

/// Simple rolling mean; `None` until the window is full.
pub fn rolling_mean(input: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; input.len()];
    if period == 0 {
        return out;
    }
    let mut sum = 0.0;
    for i in 0..input.len() {
        sum += input[i];
        if i >= period {
            sum -= input[i - period];
        }
        if i + 1 >= period {
            out[i] = Some(sum / period as f64);
        }
    }
    out
}

/// Rolling mean over an input that may itself contain undefined entries.
/// A window containing any undefined entry is undefined.
pub fn rolling_mean_opt(input: &[Option<f64>], period: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; input.len()];
    if period == 0 {
        return out;
    }
    for i in (period - 1)..input.len() {
        let window = &input[i + 1 - period..=i];
        if window.iter().all(Option::is_some) {
            let sum: f64 = window.iter().flatten().sum();
            out[i] = Some(sum / period as f64);
        }
    }
    out
}

/// Per-bar parameters for every indicator in the suite. `None` skips it.
#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub zigzag_depth: Option<usize>,
    pub keltner: Option<keltner::KeltnerParams>,
    pub bollinger: Option<bollinger::BollingerParams>,
    pub rsi_period: Option<usize>,
    pub macd: Option<macd::MacdParams>,
    pub supertrend: Option<supertrend::SupertrendParams>,
    pub cci_period: Option<usize>,
    pub atr_period: Option<usize>,
}

pub const DEFAULT_ZIGZAG_DEPTH: usize = 35;
pub const DEFAULT_CONFIRMATION_ZIGZAG_DEPTH: usize = 12;
pub const DEFAULT_RSI_PERIOD: usize = 14;
pub const DEFAULT_CCI_PERIOD: usize = 20;
pub const DEFAULT_ATR_PERIOD: usize = 14;

impl Default for IndicatorParams {
    fn default() -> Self {
        Self {
            zigzag_depth: Some(DEFAULT_ZIGZAG_DEPTH),
            keltner: Some(keltner::KeltnerParams::default()),
            bollinger: Some(bollinger::BollingerParams::default()),
            rsi_period: Some(DEFAULT_RSI_PERIOD),
            macd: Some(macd::MacdParams::default()),
            supertrend: Some(supertrend::SupertrendParams::default()),
            cci_period: Some(DEFAULT_CCI_PERIOD),
            atr_period: Some(DEFAULT_ATR_PERIOD),
        }
    }
}

impl IndicatorParams {
    /// Defaults for the confirmation timeframe: a shorter ZigZag depth.
    pub fn confirmation() -> Self {
        Self {
            zigzag_depth: Some(DEFAULT_CONFIRMATION_ZIGZAG_DEPTH),
            ..Self::default()
        }
    }

    /// Keep only the listed indicators.
    pub fn restrict_to(mut self, kinds: &[IndicatorKind]) -> Self {
        let keep = |k: IndicatorKind| kinds.contains(&k);
        if !keep(IndicatorKind::ZigZag) {
            self.zigzag_depth = None;
        }
        if !keep(IndicatorKind::Keltner) {
            self.keltner = None;
        }
        if !keep(IndicatorKind::Bollinger) {
            self.bollinger = None;
        }
        if !keep(IndicatorKind::Rsi) {
            self.rsi_period = None;
        }
        if !keep(IndicatorKind::Macd) {
            self.macd = None;
        }
        if !keep(IndicatorKind::Supertrend) {
            self.supertrend = None;
        }
        if !keep(IndicatorKind::Cci) {
            self.cci_period = None;
        }
        if !keep(IndicatorKind::Atr) {
            self.atr_period = None;
        }
        self
    }
}
