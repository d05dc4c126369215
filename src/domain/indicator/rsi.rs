//! RSI (Relative Strength Index) indicator implementation.
//!
//! Average gain/loss are simple rolling means over `period` close-to-close
//! deltas, so the first valid index is `period` (warm-up `period + 1` bars).
//!
//! Formula: RSI = 100 - (100 / (1 + avg_gain / avg_loss))
//! If avg_loss == 0 and avg_gain > 0: RSI = 100. A flat window (both zero)
//! is degenerate and left invalid.
//!
//! The crossover field is the sign of RSI[i] - RSI[i-1], 0 when the previous
//! value is undefined.

use crate::domain::bar::Bar;
use crate::domain::indicator::{
    rolling_mean_opt, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};

pub fn calculate_rsi(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::empty(IndicatorType::Rsi(period));
    }

    let mut gains: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    let mut losses: Vec<Option<f64>> = Vec::with_capacity(bars.len());
    for i in 0..bars.len() {
        if i == 0 {
            gains.push(None);
            losses.push(None);
        } else {
            let change = bars[i].close - bars[i - 1].close;
            gains.push(Some(change.max(0.0)));
            losses.push(Some((-change).max(0.0)));
        }
    }

    let avg_gain = rolling_mean_opt(&gains, period);
    let avg_loss = rolling_mean_opt(&losses, period);

    let mut values = Vec::with_capacity(bars.len());
    let mut prev: Option<f64> = None;

    for (i, bar) in bars.iter().enumerate() {
        let rsi = match (avg_gain[i], avg_loss[i]) {
            (Some(g), Some(l)) if l > 0.0 => Some(100.0 - 100.0 / (1.0 + g / l)),
            (Some(g), Some(_)) if g > 0.0 => Some(100.0),
            _ => None,
        };

        let point = match rsi {
            Some(value) => {
                let crossover = match prev {
                    Some(p) if value > p => 1,
                    Some(p) if value < p => -1,
                    _ => 0,
                };
                IndicatorPoint {
                    timestamp: bar.timestamp,
                    valid: true,
                    value: IndicatorValue::Rsi { value, crossover },
                }
            }
            None => IndicatorPoint::invalid(
                bar.timestamp,
                IndicatorValue::Rsi {
                    value: 0.0,
                    crossover: 0,
                },
            ),
        };
        prev = rsi;
        values.push(point);
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Rsi(period),
        values,
    }
}
