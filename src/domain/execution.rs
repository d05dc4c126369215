//! Fill simulation: slippage, commission and contract sizing.
//!
//! Slippage is a fixed price offset that always works against the trader.
//! Commission is a fraction of notional (`size × contract × price`) charged
//! on each side.

use super::signal::Direction;

pub const GOLD_CONTRACT: f64 = 100.0;
pub const STANDARD_LOT: f64 = 100_000.0;

/// Configuration for fill costs.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ExecutionConfig {
    /// Fraction of notional per side.
    pub commission: f64,
    /// Price units.
    pub slippage: f64,
}

/// Units per lot: 100 oz for gold symbols, 100,000 otherwise.
pub fn contract_size(symbol: &str) -> f64 {
    if symbol.contains("XAU") {
        GOLD_CONTRACT
    } else {
        STANDARD_LOT
    }
}

/// Long entries pay up, short entries sell lower.
pub fn apply_entry_slippage(price: f64, direction: Direction, slippage: f64) -> f64 {
    price + direction.sign() * slippage
}

/// Long exits sell lower, short exits buy back higher.
pub fn apply_exit_slippage(price: f64, direction: Direction, slippage: f64) -> f64 {
    price - direction.sign() * slippage
}

pub fn calculate_commission(symbol: &str, size: f64, price: f64, config: &ExecutionConfig) -> f64 {
    config.commission * size * contract_size(symbol) * price
}

/// Gross USD PnL for a move from `entry` to `exit`.
pub fn gross_pnl(symbol: &str, direction: Direction, entry: f64, exit: f64, size: f64) -> f64 {
    (exit - entry) * direction.sign() * size * contract_size(symbol)
}
