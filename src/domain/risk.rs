//! Portfolio risk gates and progressive lot sizing.
//!
//! `RiskState` latches `trading_enabled` off on a daily-loss or drawdown
//! breach. A daily-loss breach re-arms on the next calendar date; a drawdown
//! breach persists until [`RiskState::reset_drawdown_latch`]. The gates only
//! block new entries.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use log::{error, info};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RiskLimits {
    /// USD loss per calendar date that halts new entries.
    pub max_daily_loss: f64,
    /// Fraction of initial capital.
    pub max_drawdown: f64,
    pub max_positions: usize,
}

impl Default for RiskLimits {
    fn default() -> Self {
        Self {
            max_daily_loss: 1000.0,
            max_drawdown: 0.20,
            max_positions: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskState {
    pub initial_capital: f64,
    pub peak_capital: f64,
    pub daily_pnl: f64,
    pub current_day: Option<NaiveDate>,
    pub trading_enabled: bool,
    pub drawdown_breached: bool,
}

impl RiskState {
    pub fn new(initial_capital: f64) -> Self {
        Self {
            initial_capital,
            peak_capital: initial_capital,
            daily_pnl: 0.0,
            current_day: None,
            trading_enabled: true,
            drawdown_breached: false,
        }
    }

    /// Reset the daily accumulator when `date` starts a new day.
    pub fn roll_day(&mut self, date: NaiveDate) {
        if self.current_day == Some(date) {
            return;
        }
        self.current_day = Some(date);
        self.daily_pnl = 0.0;
        if !self.trading_enabled && !self.drawdown_breached {
            info!("new trading day {date}: re-enabling trading");
            self.trading_enabled = true;
        }
    }

    pub fn observe_equity(&mut self, equity: f64) {
        if equity > self.peak_capital {
            self.peak_capital = equity;
        }
    }

    /// Book a realized PnL against the day it happened on.
    pub fn record_pnl(&mut self, at: NaiveDateTime, pnl: f64, equity_after: f64) {
        self.roll_day(at.date());
        self.daily_pnl += pnl;
        self.observe_equity(equity_after);
    }

    /// Gate for new entries at `now` given current settled equity.
    pub fn check(&mut self, now: NaiveDateTime, equity: f64, limits: &RiskLimits) -> bool {
        self.roll_day(now.date());

        if self.drawdown_breached {
            return false;
        }

        if self.daily_pnl <= -limits.max_daily_loss {
            if self.trading_enabled {
                error!(
                    "daily max loss reached: {:.2} / -{:.2}, trading disabled for {}",
                    self.daily_pnl,
                    limits.max_daily_loss,
                    now.date()
                );
                self.trading_enabled = false;
            }
            return false;
        }

        self.observe_equity(equity);
        let drawdown = self.peak_capital - equity;
        if drawdown >= self.initial_capital * limits.max_drawdown {
            error!(
                "max drawdown reached: {:.2} from peak {:.2}, trading disabled",
                drawdown, self.peak_capital
            );
            self.drawdown_breached = true;
            self.trading_enabled = false;
            return false;
        }

        self.trading_enabled
    }

    pub fn reset_drawdown_latch(&mut self, equity: f64) {
        self.drawdown_breached = false;
        self.trading_enabled = true;
        self.peak_capital = self.peak_capital.max(equity);
        info!("drawdown latch reset at equity {:.2}", equity);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressiveLotsConfig {
    pub enabled: bool,
    pub profit_threshold: f64,
    pub lot_increase: f64,
    pub frequency_days: i64,
}

impl Default for ProgressiveLotsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            profit_threshold: 0.20,
            lot_increase: 0.05,
            frequency_days: 7,
        }
    }
}

pub const FALLBACK_LOT_SIZE: f64 = 0.1;

#[derive(Debug, Clone, PartialEq)]
pub struct ProgressiveSizing {
    pub base_position_sizes: BTreeMap<String, f64>,
    pub position_sizes: BTreeMap<String, f64>,
    pub monthly_start_capital: f64,
    pub current_month: Option<(i32, u32)>,
    pub last_lot_increase_time: Option<NaiveDateTime>,
    pub increases_this_month: u32,
}

impl ProgressiveSizing {
    pub fn new(position_sizes: BTreeMap<String, f64>, initial_capital: f64) -> Self {
        Self {
            base_position_sizes: position_sizes.clone(),
            position_sizes,
            monthly_start_capital: initial_capital,
            current_month: None,
            last_lot_increase_time: None,
            increases_this_month: 0,
        }
    }

    pub fn size_for(&self, symbol: &str) -> f64 {
        self.position_sizes
            .get(symbol)
            .copied()
            .unwrap_or(FALLBACK_LOT_SIZE)
    }

    /// Raise every symbol's size by `lot_increase` when the month's return
    /// clears the threshold and the last raise is at least `frequency_days`
    /// old. Returns true when sizes changed.
    pub fn update(
        &mut self,
        now: NaiveDateTime,
        equity: f64,
        config: &ProgressiveLotsConfig,
    ) -> bool {
        if !config.enabled {
            return false;
        }

        let month = (now.year(), now.month());
        match self.current_month {
            None => self.current_month = Some(month),
            Some(m) if m != month => {
                self.current_month = Some(month);
                self.monthly_start_capital = equity;
                self.increases_this_month = 0;
            }
            Some(_) => {}
        }

        if self.monthly_start_capital <= 0.0 {
            return false;
        }
        let monthly_profit = (equity - self.monthly_start_capital) / self.monthly_start_capital;
        if monthly_profit < config.profit_threshold {
            return false;
        }

        if let Some(last) = self.last_lot_increase_time {
            if (now - last).num_days() < config.frequency_days {
                return false;
            }
        }

        self.increases_this_month += 1;
        for (symbol, size) in self.position_sizes.iter_mut() {
            let old = *size;
            *size += config.lot_increase;
            info!(
                "progressive lot increase #{} this month: {symbol} {old:.2} -> {:.2} lots (monthly profit {:.1}%)",
                self.increases_this_month,
                *size,
                monthly_profit * 100.0
            );
        }
        self.last_lot_increase_time = Some(now);
        true
    }
}
