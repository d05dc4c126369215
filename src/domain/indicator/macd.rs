//! MACD (Moving Average Convergence Divergence) indicator.
//!
//! MACD Line = EMA(fast) - EMA(slow)
//! Signal Line = EMA(signal) of MACD Line
//! Histogram = MACD Line - Signal Line
//! Crossover = +1 when the line moves above the signal (line > signal at i,
//! line <= signal at i-1), -1 for the mirror case, else 0.
//!
//! EMAs are seeded with the first observation, so every bar is valid; the
//! crossover at bar 0 is 0.

use crate::domain::bar::Bar;
use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

pub const DEFAULT_FAST: usize = 12;
pub const DEFAULT_SLOW: usize = 26;
pub const DEFAULT_SIGNAL: usize = 9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MacdParams {
    pub fast: usize,
    pub slow: usize,
    pub signal: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast: DEFAULT_FAST,
            slow: DEFAULT_SLOW,
            signal: DEFAULT_SIGNAL,
        }
    }
}

pub fn calculate_macd(bars: &[Bar], params: MacdParams) -> IndicatorSeries {
    let MacdParams { fast, slow, signal } = params;
    let indicator_type = IndicatorType::Macd { fast, slow, signal };
    if bars.is_empty() || fast == 0 || slow == 0 || signal == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let ema_fast = ema_values(&closes, fast);
    let ema_slow = ema_values(&closes, slow);
    let macd_line: Vec<f64> = ema_fast
        .iter()
        .zip(&ema_slow)
        .map(|(f, s)| f - s)
        .collect();
    let signal_line = ema_values(&macd_line, signal);

    let mut values = Vec::with_capacity(bars.len());
    for (i, bar) in bars.iter().enumerate() {
        let line = macd_line[i];
        let sig = signal_line[i];
        let crossover = if i == 0 {
            0
        } else {
            let prev_line = macd_line[i - 1];
            let prev_sig = signal_line[i - 1];
            if line > sig && prev_line <= prev_sig {
                1
            } else if line < sig && prev_line >= prev_sig {
                -1
            } else {
                0
            }
        };

        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid: true,
            value: IndicatorValue::Macd {
                line,
                signal: sig,
                histogram: line - sig,
                crossover,
            },
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}
