//! Hybrid breakout strategy engine.
//!
//! Owns every piece of mutable trading state: the portfolio, the risk
//! latches, progressive sizing and the news blackout. Callers drive it one
//! primary bar at a time through [`MarketSnapshot`]s; it assumes a single
//! caller.

use chrono::NaiveDateTime;
use log::{info, warn};

use crate::domain::execution::{
    apply_entry_slippage, apply_exit_slippage, calculate_commission, gross_pnl,
};
use crate::domain::indicator::Column;
use crate::domain::market::MarketSnapshot;
use crate::domain::metrics::TradeStatistics;
use crate::domain::news::NewsBlackout;
use crate::domain::portfolio::Portfolio;
use crate::domain::position::{ClosedTrade, ExitReason, Position};
use crate::domain::risk::{ProgressiveSizing, RiskState};
use crate::domain::signal::{Direction, Signal};
use crate::domain::strategy::{Aggressiveness, StrategyConfig};

/// CCI level both timeframes must clear for the top confidence bonus.
const STRONG_CCI: f64 = 100.0;

/// Outcome of a per-bar exit check: where and why to close.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExitDecision {
    pub price: f64,
    pub reason: ExitReason,
}

#[derive(Debug)]
pub struct StrategyEngine {
    config: StrategyConfig,
    portfolio: Portfolio,
    risk: RiskState,
    sizing: ProgressiveSizing,
    news: NewsBlackout,
}

impl StrategyEngine {
    pub fn new(config: StrategyConfig, news: NewsBlackout) -> Self {
        info!(
            "strategy engine: aggressiveness {}, cci threshold {}, trailing {:.2}R / {:.2} ATR, \
             capital {:.2}, progressive lots {}",
            config.aggressiveness,
            config.aggressiveness.cci_threshold(),
            config.trailing.activation_r,
            config.trailing.distance_atr,
            config.initial_capital,
            if config.progressive.enabled {
                "on"
            } else {
                "off"
            }
        );
        Self {
            portfolio: Portfolio::new(config.initial_capital),
            risk: RiskState::new(config.initial_capital),
            sizing: ProgressiveSizing::new(config.position_sizes.clone(), config.initial_capital),
            news,
            config,
        }
    }

    pub fn config(&self) -> &StrategyConfig {
        &self.config
    }

    pub fn portfolio(&self) -> &Portfolio {
        &self.portfolio
    }

    pub fn risk_state(&self) -> &RiskState {
        &self.risk
    }

    pub fn sizing(&self) -> &ProgressiveSizing {
        &self.sizing
    }

    pub fn news_mut(&mut self) -> &mut NewsBlackout {
        &mut self.news
    }

    pub fn position(&self, symbol: &str) -> Option<&Position> {
        self.portfolio.get_position(symbol)
    }

    pub fn has_position(&self, symbol: &str) -> bool {
        self.portfolio.has_position(symbol)
    }

    pub fn open_position_count(&self) -> usize {
        self.portfolio.position_count()
    }

    pub fn closed_trades(&self) -> &[ClosedTrade] {
        self.portfolio.closed_trades()
    }

    pub fn current_equity(&self) -> f64 {
        self.portfolio.current_equity()
    }

    pub fn statistics(&self) -> TradeStatistics {
        TradeStatistics::compute(self.portfolio.closed_trades())
    }

    /// Entry gate: rolls the trading day and applies the loss/drawdown latches.
    pub fn check_risk_limits(&mut self, now: NaiveDateTime) -> bool {
        let equity = self.portfolio.current_equity();
        self.risk.check(now, equity, &self.config.risk)
    }

    pub fn reset_drawdown_latch(&mut self) {
        let equity = self.portfolio.current_equity();
        self.risk.reset_drawdown_latch(equity);
    }

    pub fn update_progressive_lots(&mut self, now: NaiveDateTime) -> bool {
        let equity = self.portfolio.current_equity();
        self.sizing.update(now, equity, &self.config.progressive)
    }

    /// Evaluate the entry rule for `symbol` at the snapshot's bar.
    pub fn generate_signal(&mut self, symbol: &str, snap: &MarketSnapshot<'_>) -> Option<Signal> {
        if self.portfolio.has_position(symbol) {
            return None;
        }
        if !self.check_risk_limits(snap.now()) {
            return None;
        }
        if snap.primary_bars() < self.config.warmup_bars
            || snap.confirmation_bars() < self.config.min_confirmation_bars
        {
            return None;
        }

        let signal = evaluate_entry(symbol, snap, self.config.aggressiveness)?;
        info!(
            "{} signal: {} @ {:.5} | SL {:.5} | TP {:.5}/{:.5}/{:.5} | confidence {:.2} | level {}",
            signal.direction,
            symbol,
            signal.entry_price,
            signal.stop_loss,
            signal.take_profit[0],
            signal.take_profit[1],
            signal.take_profit[2],
            signal.confidence,
            self.config.aggressiveness.level()
        );
        Some(signal)
    }

    /// Lots for a new position: runs the progressive update first.
    pub fn entry_size(&mut self, signal: &Signal) -> f64 {
        self.update_progressive_lots(signal.timestamp);
        self.sizing.size_for(&signal.symbol)
    }

    pub fn open_position(&mut self, signal: &Signal) -> Option<&Position> {
        let size = self.entry_size(signal);
        self.open_position_with(signal, size, None)
    }

    /// Open at the signal's price plus entry slippage with an explicit size.
    pub fn open_position_with(
        &mut self,
        signal: &Signal,
        size: f64,
        ticket: Option<u64>,
    ) -> Option<&Position> {
        let entry = apply_entry_slippage(
            signal.entry_price,
            signal.direction,
            self.config.execution.slippage,
        );
        let position = Position::open(signal, entry, size, ticket);
        if !self.portfolio.add_position(position) {
            warn!("{} already has an open position, signal ignored", signal.symbol);
            return None;
        }
        info!(
            "opened {} {} {:.2} lots @ {:.5} (SL {:.5})",
            signal.direction, signal.symbol, size, entry, signal.stop_loss
        );
        self.portfolio.get_position(&signal.symbol)
    }

    /// Apply the exit rules in order; the first match wins.
    pub fn check_exit(&mut self, symbol: &str, snap: &MarketSnapshot<'_>) -> Option<ExitDecision> {
        if !self.portfolio.has_position(symbol) {
            return None;
        }
        let now = snap.now();
        let close = snap.primary(Column::Close)?;
        let atr = snap.primary(Column::Atr);

        if self
            .news
            .should_close(now, symbol, self.config.news_minutes_before)
        {
            warn!("closing {symbol} ahead of high-impact news");
            return Some(ExitDecision {
                price: close,
                reason: ExitReason::NewsEvent,
            });
        }

        let trailing = self.config.trailing;
        let position = self.portfolio.get_position_mut(symbol)?;
        if position.update_trailing(close, atr, trailing.activation_r, trailing.distance_atr) {
            info!(
                "trailing stop armed for {symbol} at {:.2}R, stop {:.5}",
                position.profit_r(close),
                position.stop_loss
            );
        }

        if position.trailing_hit(close) {
            return Some(ExitDecision {
                price: position.stop_loss,
                reason: ExitReason::TrailingStop,
            });
        }
        if position.hard_stop_hit(close) {
            return Some(ExitDecision {
                price: position.initial_stop_loss,
                reason: ExitReason::StopLoss,
            });
        }
        position
            .take_profit_hit(close)
            .map(|tp| ExitDecision {
                price: tp,
                reason: ExitReason::TakeProfit,
            })
    }

    /// Close `symbol` at `price` (before exit slippage) and book the trade.
    pub fn close_position(
        &mut self,
        symbol: &str,
        price: f64,
        time: NaiveDateTime,
        reason: ExitReason,
    ) -> Option<ClosedTrade> {
        let position = self.portfolio.remove_position(symbol)?;
        let execution = self.config.execution;

        let exit_price = apply_exit_slippage(price, position.direction, execution.slippage);
        let gross = gross_pnl(
            symbol,
            position.direction,
            position.entry_price,
            exit_price,
            position.size,
        );
        let commission = calculate_commission(symbol, position.size, position.entry_price, &execution)
            + calculate_commission(symbol, position.size, exit_price, &execution);
        let pnl = gross - commission;

        let risk = position.risk();
        let r_multiple = if risk > 0.0 {
            position.favourable_move(exit_price) / risk
        } else {
            0.0
        };

        let trade = ClosedTrade {
            symbol: position.symbol,
            direction: position.direction,
            size: position.size,
            entry_price: position.entry_price,
            exit_price,
            entry_time: position.entry_time,
            exit_time: time,
            initial_stop_loss: position.initial_stop_loss,
            pnl,
            commission,
            r_multiple,
            reason,
        };
        self.portfolio.record_trade(trade.clone());
        let equity = self.portfolio.current_equity();
        self.risk.record_pnl(time, pnl, equity);

        info!(
            "closed {} {} @ {:.5} | PnL {:.2} ({:.2}R) | reason {} | daily PnL {:.2}",
            trade.direction,
            trade.symbol,
            exit_price,
            pnl,
            r_multiple,
            reason,
            self.risk.daily_pnl
        );
        Some(trade)
    }
}

/// Base breakout plus the aggressiveness filter, evaluated at one bar.
/// Any undefined input needed by the rule yields no signal.
pub fn evaluate_entry(
    symbol: &str,
    snap: &MarketSnapshot<'_>,
    aggressiveness: Aggressiveness,
) -> Option<Signal> {
    let close = snap.primary(Column::Close)?;
    let kc_upper = snap.primary(Column::KcUpper)?;
    let kc_lower = snap.primary(Column::KcLower)?;
    let bb_upper = snap.primary(Column::BbUpper)?;
    let bb_lower = snap.primary(Column::BbLower)?;
    let crossover = snap.primary(Column::MacdCrossover)?;

    let direction = if close > kc_upper && close > bb_upper && crossover > 0.0 {
        Direction::Long
    } else if close < kc_lower && close < bb_lower && crossover < 0.0 {
        Direction::Short
    } else {
        return None;
    };

    if !passes_filter(snap, aggressiveness, direction)? {
        return None;
    }

    let stop_loss = match direction {
        Direction::Long => kc_lower.min(bb_lower),
        Direction::Short => kc_upper.max(bb_upper),
    };
    if (close - stop_loss) * direction.sign() <= 0.0 {
        return None;
    }

    let confidence = confidence(
        snap.primary(Column::Cci),
        snap.confirm(Column::Cci),
        direction,
    );
    Some(Signal::new(
        symbol,
        direction,
        close,
        stop_loss,
        snap.now(),
        confidence,
    ))
}

fn passes_filter(
    snap: &MarketSnapshot<'_>,
    aggressiveness: Aggressiveness,
    direction: Direction,
) -> Option<bool> {
    let sign = direction.sign();
    let threshold = aggressiveness.cci_threshold();
    let ok = match aggressiveness {
        Aggressiveness::Conservative => {
            let cci = snap.primary(Column::Cci)?;
            let macd_5m = snap.confirm(Column::Macd)?;
            let signal_5m = snap.confirm(Column::MacdSignal)?;
            let cci_5m = snap.confirm(Column::Cci)?;
            cci * sign > threshold && (macd_5m - signal_5m) * sign > 0.0 && cci_5m * sign > 0.0
        }
        Aggressiveness::Moderate => {
            let cci = snap.primary(Column::Cci)?;
            let macd_5m = snap.confirm(Column::Macd)?;
            let signal_5m = snap.confirm(Column::MacdSignal)?;
            cci * sign > threshold && (macd_5m - signal_5m) * sign > 0.0
        }
        Aggressiveness::Aggressive => {
            let macd = snap.primary(Column::Macd)?;
            let signal = snap.primary(Column::MacdSignal)?;
            (macd - signal) * sign > 0.0
        }
    };
    Some(ok)
}

/// 0.5 base, +0.3 when both CCIs are beyond ±100 with the trade, otherwise
/// +0.2 when both share its sign.
pub fn confidence(cci_1m: Option<f64>, cci_5m: Option<f64>, direction: Direction) -> f64 {
    let mut confidence: f64 = 0.5;
    if let (Some(a), Some(b)) = (cci_1m, cci_5m) {
        let (a, b) = (a * direction.sign(), b * direction.sign());
        if a > STRONG_CCI && b > STRONG_CCI {
            confidence += 0.3;
        } else if a > 0.0 && b > 0.0 {
            confidence += 0.2;
        }
    }
    confidence.min(1.0)
}
