//! Backtest driver: the per-bar event loop.
//!
//! At every timestamp of the unified timeline, symbols are visited in
//! lexical order: all exits resolve first, then entries are evaluated while
//! the open-position count stays below `max_positions`. One equity point is
//! appended per processed timestamp.

use chrono::NaiveDateTime;
use log::{debug, info};
use serde::Serialize;

use crate::domain::engine::StrategyEngine;
use crate::domain::indicator::Column;
use crate::domain::market::SymbolData;
use crate::domain::metrics::{PerformanceMetrics, Summary, TradeStatistics};
use crate::domain::portfolio::EquityPoint;
use crate::domain::position::{ClosedTrade, ExitReason};

#[derive(Debug, Clone, PartialEq)]
pub struct BacktestConfig {
    /// Liquidate positions still open after the last bar.
    pub close_at_end: bool,
    /// Sharpe/Sortino scaling; derived from bar density when `None`.
    pub annualization_factor: Option<f64>,
}

impl Default for BacktestConfig {
    fn default() -> Self {
        Self {
            close_at_end: true,
            annualization_factor: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestResult {
    pub initial_capital: f64,
    pub trades: Vec<ClosedTrade>,
    pub equity_curve: Vec<EquityPoint>,
    pub summary: Summary,
}

pub fn run_backtest(
    symbols: &[SymbolData],
    timeline: &[NaiveDateTime],
    engine: &mut StrategyEngine,
    config: &BacktestConfig,
) -> BacktestResult {
    let mut ordered: Vec<&SymbolData> = symbols.iter().collect();
    ordered.sort_by(|a, b| a.symbol.cmp(&b.symbol));

    let warmup = engine.config().warmup_bars;
    let max_positions = engine.config().risk.max_positions;
    let mut equity_curve: Vec<EquityPoint> = Vec::with_capacity(timeline.len());

    info!(
        "backtest: {} symbols, {} timestamps",
        ordered.len(),
        timeline.len()
    );

    for &now in timeline {
        let active: Vec<(&SymbolData, usize)> = ordered
            .iter()
            .filter_map(|sd| sd.get_bar_index(now).map(|i| (*sd, i)))
            .filter(|&(_, i)| i >= warmup)
            .collect();
        if active.is_empty() {
            continue;
        }

        for &(sd, i) in &active {
            if !engine.has_position(&sd.symbol) {
                continue;
            }
            let Some(snap) = sd.snapshot(i) else {
                continue;
            };
            if let Some(exit) = engine.check_exit(&sd.symbol, &snap) {
                engine.close_position(&sd.symbol, exit.price, now, exit.reason);
            }
        }

        for &(sd, i) in &active {
            if engine.has_position(&sd.symbol) {
                continue;
            }
            if engine.open_position_count() >= max_positions {
                debug!("{now}: max positions reached, skipping {}", sd.symbol);
                continue;
            }
            let Some(snap) = sd.snapshot(i) else {
                continue;
            };
            if let Some(signal) = engine.generate_signal(&sd.symbol, &snap) {
                engine.open_position(&signal);
            }
        }

        equity_curve.push(EquityPoint {
            timestamp: now,
            equity: engine.current_equity(),
        });
    }

    if config.close_at_end {
        for sd in &ordered {
            if !engine.has_position(&sd.symbol) {
                continue;
            }
            let Some(last) = sd.bar_count().checked_sub(1) else {
                continue;
            };
            let (Some(close), Some(at)) = (
                sd.primary.value(Column::Close, last),
                sd.primary.timestamp(last),
            ) else {
                continue;
            };
            engine.close_position(&sd.symbol, close, at, ExitReason::EndOfBacktest);
        }
        if let Some(point) = equity_curve.last_mut() {
            point.equity = engine.current_equity();
        }
    }

    let trades = engine.closed_trades().to_vec();
    let initial_capital = engine.portfolio().initial_capital;
    let summary = Summary {
        trades: TradeStatistics::compute(&trades),
        performance: PerformanceMetrics::compute(
            &equity_curve,
            initial_capital,
            trades.len(),
            config.annualization_factor,
        ),
    };

    info!(
        "backtest complete: {} trades, final equity {:.2}",
        trades.len(),
        summary.performance.final_equity
    );

    BacktestResult {
        initial_capital,
        trades,
        equity_curve,
        summary,
    }
}
