//! Exponential Moving Average indicator.
//!
//! k = 2/(span+1), seeded with the first observation, then
//! EMA[i] = X[i]*k + EMA[i-1]*(1-k). Valid from the first bar.

use crate::domain::bar::Bar;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

/// Recursive EMA over raw values.
pub fn ema_values(input: &[f64], span: usize) -> Vec<f64> {
    if span == 0 || input.is_empty() {
        return Vec::new();
    }
    let k = 2.0 / (span as f64 + 1.0);
    let mut out = Vec::with_capacity(input.len());
    let mut ema = input[0];
    out.push(ema);
    for &x in &input[1..] {
        ema = x * k + ema * (1.0 - k);
        out.push(ema);
    }
    out
}

pub fn calculate_ema(bars: &[Bar], span: usize) -> IndicatorSeries {
    if span == 0 || bars.is_empty() {
        return IndicatorSeries::empty(IndicatorType::Ema(span));
    }

    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let values = ema_values(&closes, span)
        .into_iter()
        .zip(bars)
        .map(|(v, bar)| IndicatorPoint {
            timestamp: bar.timestamp,
            valid: true,
            value: IndicatorValue::Simple(v),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(span),
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(prices: &[f64]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        prices
            .iter()
            .enumerate()
            .map(|(i, &close)| Bar {
                timestamp: start + chrono::Duration::minutes(i as i64),
                open: close,
                high: close,
                low: close,
                close,
                volume: 1000.0,
            })
            .collect()
    }

    #[test]
    fn ema_valid_from_first_bar() {
        let series = calculate_ema(&make_bars(&[10.0, 20.0, 30.0]), 3);
        assert!(series.values.iter().all(|p| p.valid));
        assert_eq!(series.values[0].simple(), Some(10.0));
    }

    #[test]
    fn ema_recursive_calculation() {
        let series = calculate_ema(&make_bars(&[10.0, 20.0, 30.0]), 3);
        let k = 0.5;
        let e1 = 20.0 * k + 10.0 * (1.0 - k);
        let e2 = 30.0 * k + e1 * (1.0 - k);
        assert!((series.values[1].simple().unwrap() - e1).abs() < f64::EPSILON);
        assert!((series.values[2].simple().unwrap() - e2).abs() < f64::EPSILON);
    }

    #[test]
    fn ema_span_1_tracks_input() {
        let out = ema_values(&[10.0, 20.0, 30.0], 1);
        assert_eq!(out, vec![10.0, 20.0, 30.0]);
    }

    #[test]
    fn ema_equal_prices() {
        let out = ema_values(&[100.0; 5], 3);
        assert!(out.iter().all(|v| (v - 100.0).abs() < f64::EPSILON));
    }

    #[test]
    fn ema_indicator_type() {
        let series = calculate_ema(&make_bars(&[10.0]), 5);
        assert_eq!(series.indicator_type, IndicatorType::Ema(5));
    }

    #[test]
    fn ema_empty_or_zero_span() {
        assert!(calculate_ema(&[], 3).values.is_empty());
        assert!(calculate_ema(&make_bars(&[1.0, 2.0]), 0).values.is_empty());
    }
}
