//! Average True Range.
//!
//! TR[0] = high - low, TR[i] = max(H-L, |H-C[i-1]|, |L-C[i-1]|).
//! ATR = simple rolling mean of TR over `period`; first valid index is
//! `period - 1`.

use crate::domain::bar::Bar;
use crate::domain::indicator::{
    rolling_mean, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};

pub fn true_range_values(bars: &[Bar]) -> Vec<f64> {
    bars.iter()
        .enumerate()
        .map(|(i, bar)| {
            if i == 0 {
                bar.high - bar.low
            } else {
                bar.true_range(bars[i - 1].close)
            }
        })
        .collect()
}

/// Raw ATR values, `None` during warm-up.
pub fn atr_values(bars: &[Bar], period: usize) -> Vec<Option<f64>> {
    rolling_mean(&true_range_values(bars), period)
}

pub fn calculate_atr(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::empty(IndicatorType::Atr(period));
    }

    let values = atr_values(bars, period)
        .into_iter()
        .zip(bars)
        .map(|(atr, bar)| IndicatorPoint {
            timestamp: bar.timestamp,
            valid: atr.is_some(),
            value: IndicatorValue::Simple(atr.unwrap_or(0.0)),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Atr(period),
        values,
    }
}
