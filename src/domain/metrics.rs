//! Trade statistics and equity-curve performance metrics.

use serde::{Deserialize, Serialize};

use super::portfolio::EquityPoint;
use super::position::ClosedTrade;

const TRADING_DAYS_PER_YEAR: f64 = 252.0;
const SECONDS_PER_DAY: f64 = 86_400.0;

/// Aggregates over the closed-trade ledger.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TradeStatistics {
    pub total_trades: usize,
    pub winning_trades: usize,
    pub losing_trades: usize,
    pub breakeven_trades: usize,
    pub win_rate: f64,
    pub total_pnl: f64,
    pub avg_win: f64,
    /// Mean losing PnL, negative.
    pub avg_loss: f64,
    pub largest_win: f64,
    /// Most negative PnL.
    pub largest_loss: f64,
    /// Σ wins / |Σ losses|; 0 when there are no losses.
    pub profit_factor: f64,
    pub avg_r_multiple: f64,
    pub avg_holding_minutes: f64,
}

impl TradeStatistics {
    pub fn compute(trades: &[ClosedTrade]) -> Self {
        if trades.is_empty() {
            return Self::default();
        }

        let mut winning_trades = 0usize;
        let mut losing_trades = 0usize;
        let mut breakeven_trades = 0usize;
        let mut total_wins = 0.0_f64;
        let mut total_losses = 0.0_f64;
        let mut largest_win = f64::NEG_INFINITY;
        let mut largest_loss = f64::INFINITY;
        let mut total_r = 0.0_f64;
        let mut total_minutes = 0i64;

        for trade in trades {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                winning_trades += 1;
                total_wins += pnl;
            } else if pnl < 0.0 {
                losing_trades += 1;
                total_losses += pnl;
            } else {
                breakeven_trades += 1;
            }
            largest_win = largest_win.max(pnl);
            largest_loss = largest_loss.min(pnl);
            total_r += trade.r_multiple;
            total_minutes += trade.holding_minutes();
        }

        let total_trades = trades.len();
        let n = total_trades as f64;

        let profit_factor = if total_losses < 0.0 {
            total_wins / total_losses.abs()
        } else {
            0.0
        };

        TradeStatistics {
            total_trades,
            winning_trades,
            losing_trades,
            breakeven_trades,
            win_rate: winning_trades as f64 / n,
            total_pnl: total_wins + total_losses,
            avg_win: if winning_trades > 0 {
                total_wins / winning_trades as f64
            } else {
                0.0
            },
            avg_loss: if losing_trades > 0 {
                total_losses / losing_trades as f64
            } else {
                0.0
            },
            largest_win,
            largest_loss,
            profit_factor,
            avg_r_multiple: total_r / n,
            avg_holding_minutes: total_minutes as f64 / n,
        }
    }
}

/// Equity-curve metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceMetrics {
    pub initial_capital: f64,
    pub final_equity: f64,
    pub total_return: f64,
    /// Largest peak-to-trough decline as a fraction of the running peak.
    pub max_drawdown: f64,
    pub sharpe_ratio: f64,
    pub sortino_ratio: f64,
    pub annualization_factor: f64,
    pub trades_per_day: f64,
    pub span_days: f64,
}

impl PerformanceMetrics {
    /// `annualization_factor` overrides the bars-per-day derivation when set.
    pub fn compute(
        equity_curve: &[EquityPoint],
        initial_capital: f64,
        total_trades: usize,
        annualization_factor: Option<f64>,
    ) -> Self {
        let final_equity = equity_curve
            .last()
            .map(|p| p.equity)
            .unwrap_or(initial_capital);

        let total_return = if initial_capital > 0.0 {
            (final_equity - initial_capital) / initial_capital
        } else {
            0.0
        };

        let span_days = match (equity_curve.first(), equity_curve.last()) {
            (Some(first), Some(last)) => {
                (last.timestamp - first.timestamp).num_seconds() as f64 / SECONDS_PER_DAY
            }
            _ => 0.0,
        };

        let factor = annualization_factor.unwrap_or_else(|| {
            let bars_per_day = equity_curve.len() as f64 / span_days.max(1.0);
            TRADING_DAYS_PER_YEAR * bars_per_day
        });

        let mut values = Vec::with_capacity(equity_curve.len() + 1);
        values.push(initial_capital);
        values.extend(equity_curve.iter().map(|p| p.equity));

        let (sharpe_ratio, sortino_ratio) = compute_risk_adjusted(&values, factor);

        let trades_per_day = if span_days > 0.0 {
            total_trades as f64 / span_days
        } else {
            0.0
        };

        PerformanceMetrics {
            initial_capital,
            final_equity,
            total_return,
            max_drawdown: compute_drawdown(&values),
            sharpe_ratio,
            sortino_ratio,
            annualization_factor: factor,
            trades_per_day,
            span_days,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub trades: TradeStatistics,
    pub performance: PerformanceMetrics,
}

fn compute_drawdown(equity: &[f64]) -> f64 {
    let Some(&first) = equity.first() else {
        return 0.0;
    };

    let mut peak = first;
    let mut max_dd = 0.0_f64;
    for &value in equity {
        if value > peak {
            peak = value;
        } else if peak > 0.0 {
            let dd = (peak - value) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }
    max_dd
}

fn compute_risk_adjusted(equity: &[f64], factor: f64) -> (f64, f64) {
    if equity.len() < 2 {
        return (0.0, 0.0);
    }

    let returns: Vec<f64> = equity
        .windows(2)
        .map(|w| {
            let prev = w[0];
            let curr = w[1];
            if prev > 0.0 {
                (curr - prev) / prev
            } else {
                0.0
            }
        })
        .collect();

    let n = returns.len() as f64;
    let mean: f64 = returns.iter().sum::<f64>() / n;

    let variance: f64 = returns.iter().map(|r| (r - mean).powi(2)).sum::<f64>() / n;
    let stddev = variance.sqrt();
    let scale = factor.max(0.0).sqrt();

    let sharpe = if stddev > 0.0 {
        mean / stddev * scale
    } else {
        0.0
    };

    let downside: f64 = returns
        .iter()
        .filter(|&&r| r < 0.0)
        .map(|r| r.powi(2))
        .sum::<f64>()
        / n;
    let downside_stddev = downside.sqrt();

    let sortino = if downside_stddev > 0.0 {
        mean / downside_stddev * scale
    } else {
        0.0
    };

    (sharpe, sortino)
}
