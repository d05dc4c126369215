//! Live session: the engine wired to a broker through [`OrderExecutor`].
//!
//! Broker state is authoritative. An exit closes the broker position first
//! and only then books the trade locally; an entry opens on the broker first
//! and only creates the local position when a ticket comes back. Only broker
//! positions carrying `magic_number` are treated as ours.

use log::{error, info, warn};

use crate::domain::engine::StrategyEngine;
use crate::domain::error::TraderError;
use crate::domain::market::MarketSnapshot;
use crate::domain::position::ClosedTrade;
use crate::ports::executor_port::{AccountInfo, BrokerPosition, OrderExecutor, OrderRequest};

pub const DEFAULT_MAGIC_NUMBER: u64 = 234_000;

/// What happened to a symbol on one bar.
#[derive(Debug, Clone, PartialEq)]
pub enum LiveEvent {
    Opened { ticket: u64 },
    Closed(ClosedTrade),
    StopModified { ticket: u64, stop_loss: f64 },
    Rejected { reason: String },
    Idle,
}

pub struct LiveSession<E: OrderExecutor> {
    executor: E,
    engine: StrategyEngine,
    magic_number: u64,
}

impl<E: OrderExecutor> LiveSession<E> {
    pub fn new(executor: E, engine: StrategyEngine, magic_number: u64) -> Self {
        Self {
            executor,
            engine,
            magic_number,
        }
    }

    /// Connect to the broker. Failure here is fatal for the session.
    pub fn start(&mut self) -> Result<(), TraderError> {
        self.executor.connect().map_err(|e| {
            error!("executor connection failed: {e}");
            match e {
                TraderError::ExecutorConnection { .. } => e,
                other => TraderError::ExecutorConnection {
                    reason: other.to_string(),
                },
            }
        })?;
        info!("live session started (magic {})", self.magic_number);
        Ok(())
    }

    pub fn engine(&self) -> &StrategyEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut StrategyEngine {
        &mut self.engine
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    pub fn account_info(&self) -> Result<AccountInfo, TraderError> {
        self.executor.get_account_info()
    }

    /// Broker positions opened by this engine.
    pub fn owned_positions(&self, symbol: Option<&str>) -> Result<Vec<BrokerPosition>, TraderError> {
        Ok(self
            .executor
            .get_open_positions(symbol)?
            .into_iter()
            .filter(|p| p.magic == self.magic_number)
            .collect())
    }

    /// Manage `symbol` at the latest bar: exits and stop updates for an open
    /// position, otherwise entry evaluation.
    pub fn on_bar(
        &mut self,
        symbol: &str,
        snap: &MarketSnapshot<'_>,
    ) -> Result<LiveEvent, TraderError> {
        if self.engine.has_position(symbol) {
            self.manage_position(symbol, snap)
        } else {
            self.try_entry(symbol, snap)
        }
    }

    fn manage_position(
        &mut self,
        symbol: &str,
        snap: &MarketSnapshot<'_>,
    ) -> Result<LiveEvent, TraderError> {
        let owned = self.owned_positions(Some(symbol))?;
        let ticket = self
            .engine
            .position(symbol)
            .and_then(|p| p.ticket)
            .or_else(|| owned.first().map(|p| p.ticket));

        let Some(exit) = self.engine.check_exit(symbol, snap) else {
            return self.sync_stop(symbol, &owned);
        };

        let Some(ticket) = ticket else {
            warn!("{symbol}: no broker position found for exit, keeping local state");
            return Ok(LiveEvent::Idle);
        };
        if !self.executor.close(ticket)? {
            let err = TraderError::ExecutionFailure {
                symbol: symbol.to_string(),
                reason: format!("close of ticket {ticket} refused"),
            };
            error!("{err}");
            return Ok(LiveEvent::Rejected {
                reason: err.to_string(),
            });
        }

        match self
            .engine
            .close_position(symbol, exit.price, snap.now(), exit.reason)
        {
            Some(trade) => Ok(LiveEvent::Closed(trade)),
            None => Ok(LiveEvent::Idle),
        }
    }

    fn sync_stop(
        &mut self,
        symbol: &str,
        owned: &[BrokerPosition],
    ) -> Result<LiveEvent, TraderError> {
        let Some(local) = self.engine.position(symbol) else {
            return Ok(LiveEvent::Idle);
        };
        if !local.trailing_active {
            return Ok(LiveEvent::Idle);
        }
        let stop_loss = local.stop_loss;
        let Some(broker) = owned
            .iter()
            .find(|p| Some(p.ticket) == local.ticket || p.symbol == symbol)
        else {
            return Ok(LiveEvent::Idle);
        };
        if broker.stop_loss == stop_loss {
            return Ok(LiveEvent::Idle);
        }

        let ticket = broker.ticket;
        if self.executor.modify(ticket, Some(stop_loss), None)? {
            info!("{symbol}: broker stop moved to {stop_loss:.5} (ticket {ticket})");
            Ok(LiveEvent::StopModified { ticket, stop_loss })
        } else {
            warn!("{symbol}: broker refused stop update on ticket {ticket}");
            Ok(LiveEvent::Idle)
        }
    }

    fn try_entry(
        &mut self,
        symbol: &str,
        snap: &MarketSnapshot<'_>,
    ) -> Result<LiveEvent, TraderError> {
        if self.engine.open_position_count() >= self.engine.config().risk.max_positions {
            return Ok(LiveEvent::Idle);
        }
        let Some(signal) = self.engine.generate_signal(symbol, snap) else {
            return Ok(LiveEvent::Idle);
        };

        let size = self.engine.entry_size(&signal);
        let request = OrderRequest {
            symbol: symbol.to_string(),
            direction: signal.direction,
            volume: size,
            stop_loss: signal.stop_loss,
            take_profit: signal.take_profit[0],
            comment: format!("hybrid_{}", signal.direction),
        };

        match self.executor.open(&request)? {
            Some(ticket) => {
                self.engine.open_position_with(&signal, size, Some(ticket));
                info!("{symbol}: broker filled ticket {ticket}");
                Ok(LiveEvent::Opened { ticket })
            }
            None => {
                let err = TraderError::ExecutionFailure {
                    symbol: symbol.to_string(),
                    reason: "open order refused".into(),
                };
                error!("{err}");
                Ok(LiveEvent::Rejected {
                    reason: err.to_string(),
                })
            }
        }
    }
}
