//! Commodity Channel Index.
//!
//! TP = (H+L+C)/3, CCI = (TP - SMA(TP)) / (0.015 × mean |TP - SMA(TP)|).
//! A window with zero mean deviation is degenerate and left invalid.

use crate::domain::bar::Bar;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

const LAMBERT: f64 = 0.015;

pub fn calculate_cci(bars: &[Bar], period: usize) -> IndicatorSeries {
    if period == 0 {
        return IndicatorSeries::empty(IndicatorType::Cci(period));
    }

    let tp: Vec<f64> = bars.iter().map(Bar::typical_price).collect();
    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        let cci = if i + 1 >= period {
            let window = &tp[i + 1 - period..=i];
            let sma = window.iter().sum::<f64>() / period as f64;
            let mean_dev = window.iter().map(|x| (x - sma).abs()).sum::<f64>() / period as f64;
            if mean_dev > 0.0 {
                Some((tp[i] - sma) / (LAMBERT * mean_dev))
            } else {
                None
            }
        } else {
            None
        };

        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid: cci.is_some(),
            value: IndicatorValue::Simple(cci.unwrap_or(0.0)),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::Cci(period),
        values,
    }
}
