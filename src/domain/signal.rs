//! Entry signals.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Long,
    Short,
}

impl Direction {
    /// +1 for longs, -1 for shorts.
    pub fn sign(self) -> f64 {
        match self {
            Direction::Long => 1.0,
            Direction::Short => -1.0,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

/// A proposed entry. Transient: consumed when a position opens.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub stop_loss: f64,
    /// Ordered 1.5R, 2.5R, 4.0R targets.
    pub take_profit: [f64; 3],
    pub timestamp: NaiveDateTime,
    /// Advisory only; never gates entry.
    pub confidence: f64,
}

pub const TAKE_PROFIT_R: [f64; 3] = [1.5, 2.5, 4.0];

impl Signal {
    pub fn new(
        symbol: &str,
        direction: Direction,
        entry_price: f64,
        stop_loss: f64,
        timestamp: NaiveDateTime,
        confidence: f64,
    ) -> Self {
        let risk = (entry_price - stop_loss).abs();
        let take_profit = TAKE_PROFIT_R.map(|r| entry_price + direction.sign() * r * risk);
        Self {
            symbol: symbol.to_string(),
            direction,
            entry_price,
            stop_loss,
            take_profit,
            timestamp,
            confidence,
        }
    }

    pub fn risk(&self) -> f64 {
        (self.entry_price - self.stop_loss).abs()
    }
}
