//! Property tests for trading invariants.
//!
//! Uses proptest to verify:
//! 1. Stop ratchet: an armed trailing stop only tightens
//! 2. Take-profit ladder: ordered with the trade and sized in R
//! 3. Peak capital never decreases
//! 4. Equity-curve metrics stay in range
//! 5. Backtest runs are deterministic and settle to the trade ledger

mod common;

use chrono::Duration;
use common::*;
use hybridtrader::domain::backtest::{run_backtest, BacktestConfig};
use hybridtrader::domain::engine::StrategyEngine;
use hybridtrader::domain::indicator::{calculate_all, IndicatorParams};
use hybridtrader::domain::market::{build_unified_timeline, SymbolData};
use hybridtrader::domain::metrics::PerformanceMetrics;
use hybridtrader::domain::news::NewsBlackout;
use hybridtrader::domain::portfolio::EquityPoint;
use hybridtrader::domain::position::Position;
use hybridtrader::domain::risk::{RiskLimits, RiskState};
use hybridtrader::domain::signal::{Direction, Signal};
use hybridtrader::domain::strategy::{Aggressiveness, StrategyConfig};
use proptest::prelude::*;

// ── Strategies (proptest) ────────────────────────────────────────────

fn arb_direction() -> impl Strategy<Value = Direction> {
    prop_oneof![Just(Direction::Long), Just(Direction::Short)]
}

fn arb_moves() -> impl Strategy<Value = Vec<(f64, f64)>> {
    prop::collection::vec((-8.0..8.0_f64, 0.1..3.0_f64), 1..60)
}

fn arb_pnls() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(-800.0..800.0_f64, 1..80)
}

// ── 1. Stop Ratchet ──────────────────────────────────────────────────

proptest! {
    /// Once armed, a long stop never falls and a short stop never rises.
    #[test]
    fn armed_stop_only_tightens(
        direction in arb_direction(),
        moves in arb_moves(),
        activation_r in 0.2..2.0_f64,
        distance_atr in 0.5..2.0_f64,
    ) {
        let stop = 2000.0 - direction.sign() * 5.0;
        let signal = Signal::new("XAUUSD", direction, 2000.0, stop, ts(0), 0.5);
        let mut position = Position::open(&signal, 2000.0, 0.3, None);

        let mut close = 2000.0;
        let mut previous: Option<f64> = None;
        for (step, atr) in moves {
            close += step;
            position.update_trailing(close, Some(atr), activation_r, distance_atr);
            if position.trailing_active {
                if let Some(prev) = previous {
                    match direction {
                        Direction::Long => prop_assert!(position.stop_loss >= prev),
                        Direction::Short => prop_assert!(position.stop_loss <= prev),
                    }
                }
                previous = Some(position.stop_loss);
            }
        }
        prop_assert_eq!(position.initial_stop_loss, stop);
    }
}

// ── 2. Take-Profit Ladder ────────────────────────────────────────────

proptest! {
    /// Targets sit at 1.5R, 2.5R and 4.0R in the trade's direction.
    #[test]
    fn take_profit_ladder_is_ordered(
        direction in arb_direction(),
        entry in 1.0..3000.0_f64,
        risk_frac in 0.0005..0.05_f64,
    ) {
        let risk = entry * risk_frac;
        let stop = entry - direction.sign() * risk;
        let signal = Signal::new("EURUSD", direction, entry, stop, ts(0), 0.5);

        prop_assert!((signal.risk() - risk).abs() < 1e-9 * entry.max(1.0));
        let tp = signal.take_profit;
        for pair in tp.windows(2) {
            prop_assert!((pair[1] - pair[0]) * direction.sign() > 0.0);
        }
        prop_assert!((tp[0] - entry) * direction.sign() > 0.0);
        let expected = entry + direction.sign() * 4.0 * signal.risk();
        prop_assert!((tp[2] - expected).abs() < 1e-6 * entry.max(1.0));
    }
}

// ── 3. Peak Capital ──────────────────────────────────────────────────

proptest! {
    /// Peak capital is monotonically non-decreasing and never below equity
    /// once that equity has been observed.
    #[test]
    fn peak_capital_never_decreases(pnls in arb_pnls()) {
        let limits = RiskLimits::default();
        let mut state = RiskState::new(10_000.0);
        let mut equity = 10_000.0;
        let mut peak = state.peak_capital;

        for (i, pnl) in pnls.into_iter().enumerate() {
            let at = ts(0) + Duration::hours(i as i64 * 7);
            equity += pnl;
            state.record_pnl(at, pnl, equity);
            state.check(at, equity, &limits);
            prop_assert!(state.peak_capital >= peak);
            prop_assert!(state.peak_capital >= equity);
            peak = state.peak_capital;
        }
    }
}

// ── 4. Metrics Ranges ────────────────────────────────────────────────

proptest! {
    /// Max drawdown is a fraction in [0, 1) for a positive equity curve.
    #[test]
    fn max_drawdown_is_a_fraction(
        values in prop::collection::vec(100.0..20_000.0_f64, 2..200),
    ) {
        let curve: Vec<EquityPoint> = values
            .iter()
            .enumerate()
            .map(|(i, &equity)| EquityPoint { timestamp: ts(i as i64), equity })
            .collect();
        let metrics = PerformanceMetrics::compute(&curve, 10_000.0, 0, Some(252.0));

        prop_assert!(metrics.max_drawdown >= 0.0);
        prop_assert!(metrics.max_drawdown < 1.0);
        prop_assert!(metrics.sharpe_ratio.is_finite());
        prop_assert!(metrics.sortino_ratio.is_finite());
        prop_assert_eq!(metrics.final_equity, *values.last().unwrap());
    }
}

// ── 5. Backtest Determinism ──────────────────────────────────────────

fn symbol(name: &str, closes: &[f64]) -> SymbolData {
    SymbolData::new(
        name.into(),
        calculate_all(make_bars(closes, 1), &IndicatorParams::default()),
        calculate_all(
            make_bars(&every_fifth(closes), 5),
            &IndicatorParams::confirmation(),
        ),
    )
}

fn closes(n: usize, amplitude: f64, freq: f64) -> Vec<f64> {
    (0..n)
        .map(|i| 2000.0 + (i as f64 * freq).sin() * amplitude + (i as f64 * 0.05).cos() * 2.0)
        .collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(12))]

    /// Two runs over the same data produce identical results, and settled
    /// equity equals initial capital plus realized PnL.
    #[test]
    fn backtest_is_deterministic(
        amplitude in 1.0..12.0_f64,
        freq in 0.05..0.4_f64,
        level in 1i64..=3,
    ) {
        let data = vec![symbol("XAUUSD", &closes(260, amplitude, freq))];
        let timeline = build_unified_timeline(&data);
        let run = || {
            let mut config = StrategyConfig {
                aggressiveness: Aggressiveness::from_level(level).unwrap(),
                ..StrategyConfig::default()
            };
            config.position_sizes.insert("XAUUSD".into(), 0.3);
            let mut engine = StrategyEngine::new(config, NewsBlackout::inert());
            run_backtest(&data, &timeline, &mut engine, &BacktestConfig::default())
        };

        let a = run();
        let b = run();
        prop_assert_eq!(&a, &b);

        let realized: f64 = a.trades.iter().map(|t| t.pnl).sum();
        let last = a.equity_curve.last().map_or(a.initial_capital, |p| p.equity);
        prop_assert!((last - (a.initial_capital + realized)).abs() < 1e-6);
        for trade in &a.trades {
            prop_assert!(trade.entry_time <= trade.exit_time);
        }
    }
}
