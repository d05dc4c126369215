//! Open positions, the closed-trade ledger and equity points.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::position::{ClosedTrade, Position};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquityPoint {
    pub timestamp: NaiveDateTime,
    pub equity: f64,
}

/// At most one open position per symbol; the ledger is append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct Portfolio {
    pub initial_capital: f64,
    positions: BTreeMap<String, Position>,
    closed_trades: Vec<ClosedTrade>,
    realized_pnl: f64,
}

impl Portfolio {
    pub fn new(initial_capital: f64) -> Self {
        Portfolio {
            initial_capital,
            positions: BTreeMap::new(),
            closed_trades: Vec::new(),
            realized_pnl: 0.0,
        }
    }

    /// Insert a position unless the symbol already holds one.
    pub fn add_position(&mut self, position: Position) -> bool {
        if self.positions.contains_key(&position.symbol) {
            return false;
        }
        self.positions.insert(position.symbol.clone(), position);
        true
    }

    pub fn get_position(&self, symbol: &str) -> Option<&Position> {
        self.positions.get(symbol)
    }

    pub fn get_position_mut(&mut self, symbol: &str) -> Option<&mut Position> {
        self.positions.get_mut(symbol)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.positions.contains_key(symbol)
    }

    pub fn remove_position(&mut self, symbol: &str) -> Option<Position> {
        self.positions.remove(symbol)
    }

    pub fn position_count(&self) -> usize {
        self.positions.len()
    }

    pub fn positions(&self) -> impl Iterator<Item = &Position> {
        self.positions.values()
    }

    pub fn record_trade(&mut self, trade: ClosedTrade) {
        self.realized_pnl += trade.pnl;
        self.closed_trades.push(trade);
    }

    pub fn closed_trades(&self) -> &[ClosedTrade] {
        &self.closed_trades
    }

    pub fn realized_pnl(&self) -> f64 {
        self.realized_pnl
    }

    /// Settled equity: initial capital plus realized PnL.
    pub fn current_equity(&self) -> f64 {
        self.initial_capital + self.realized_pnl
    }
}
