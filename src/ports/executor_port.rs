//! Broker execution port (live mode only).

use crate::domain::error::TraderError;
use crate::domain::signal::Direction;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub symbol: String,
    pub direction: Direction,
    pub volume: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub comment: String,
}

/// A position as the broker reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrokerPosition {
    pub ticket: u64,
    pub symbol: String,
    pub direction: Direction,
    pub volume: f64,
    pub open_price: f64,
    pub stop_loss: f64,
    pub take_profit: f64,
    pub magic: u64,
    pub comment: String,
    pub profit: f64,
    pub open_time: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccountInfo {
    pub balance: f64,
    pub equity: f64,
    pub margin: f64,
    pub free_margin: f64,
    pub margin_level: f64,
    pub profit: f64,
}

/// Push interface to a broker.
///
/// `open` returns `Ok(None)` when the broker refuses the order; `close` and
/// `modify` return `Ok(false)` on refusal. `Err` is reserved for transport
/// failures.
pub trait OrderExecutor {
    fn connect(&mut self) -> Result<(), TraderError>;

    fn open(&mut self, request: &OrderRequest) -> Result<Option<u64>, TraderError>;

    fn close(&mut self, ticket: u64) -> Result<bool, TraderError>;

    fn modify(
        &mut self,
        ticket: u64,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    ) -> Result<bool, TraderError>;

    fn get_open_positions(&self, symbol: Option<&str>)
    -> Result<Vec<BrokerPosition>, TraderError>;

    fn get_account_info(&self) -> Result<AccountInfo, TraderError>;
}
