//! Strategy configuration: aggressiveness, trailing and sizing parameters.

use std::collections::BTreeMap;
use std::fmt;

use crate::domain::execution::ExecutionConfig;
use crate::domain::risk::{ProgressiveLotsConfig, RiskLimits};

/// Entry filter strictness applied on top of the base breakout signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Aggressiveness {
    Conservative = 1,
    Moderate = 2,
    Aggressive = 3,
}

impl Aggressiveness {
    pub fn from_level(level: i64) -> Option<Self> {
        match level {
            1 => Some(Aggressiveness::Conservative),
            2 => Some(Aggressiveness::Moderate),
            3 => Some(Aggressiveness::Aggressive),
            _ => None,
        }
    }

    pub fn level(self) -> u8 {
        self as u8
    }

    /// Minimum |CCI| on the primary frame. Aggressive mode does not use CCI.
    pub fn cci_threshold(self) -> f64 {
        match self {
            Aggressiveness::Conservative => 50.0,
            Aggressiveness::Moderate => 20.0,
            Aggressiveness::Aggressive => 0.0,
        }
    }
}

impl Default for Aggressiveness {
    fn default() -> Self {
        Aggressiveness::Moderate
    }
}

impl fmt::Display for Aggressiveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Aggressiveness::Conservative => "conservative",
            Aggressiveness::Moderate => "moderate",
            Aggressiveness::Aggressive => "aggressive",
        };
        write!(f, "{} ({})", name, self.level())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailingConfig {
    /// Profit in R that arms the trail.
    pub activation_r: f64,
    /// Trail distance in ATR multiples.
    pub distance_atr: f64,
}

impl Default for TrailingConfig {
    fn default() -> Self {
        Self {
            activation_r: 0.8,
            distance_atr: 1.0,
        }
    }
}

pub const DEFAULT_WARMUP_BARS: usize = 50;
/// Slowest indicator seed on the primary frame.
pub const MIN_WARMUP_BARS: usize = 50;
pub const DEFAULT_MIN_CONFIRMATION_BARS: usize = 20;
pub const DEFAULT_NEWS_MINUTES_BEFORE: i64 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct StrategyConfig {
    pub aggressiveness: Aggressiveness,
    pub trailing: TrailingConfig,
    /// Primary bars required before the first signal.
    pub warmup_bars: usize,
    /// Confirmation bars required before the first signal.
    pub min_confirmation_bars: usize,
    pub news_minutes_before: i64,
    pub risk: RiskLimits,
    pub progressive: ProgressiveLotsConfig,
    /// Lots per symbol.
    pub position_sizes: BTreeMap<String, f64>,
    pub initial_capital: f64,
    pub execution: ExecutionConfig,
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            aggressiveness: Aggressiveness::default(),
            trailing: TrailingConfig::default(),
            warmup_bars: DEFAULT_WARMUP_BARS,
            min_confirmation_bars: DEFAULT_MIN_CONFIRMATION_BARS,
            news_minutes_before: DEFAULT_NEWS_MINUTES_BEFORE,
            risk: RiskLimits::default(),
            progressive: ProgressiveLotsConfig::default(),
            position_sizes: BTreeMap::new(),
            initial_capital: 10_000.0,
            execution: ExecutionConfig::default(),
        }
    }
}
