//! SuperTrend.
//!
//! Raw bands are hl2 ± multiplier × ATR(period). The upper band only tightens
//! while the previous close sat at or below it; the lower band mirrors that.
//! At the first bar with a defined ATR the direction is up iff close > upper.
//! An uptrend flips down when close < lower, a downtrend flips up when
//! close > upper. The line is the lower band in an uptrend, else the upper.

use crate::domain::bar::Bar;
use crate::domain::indicator::atr::atr_values;
use crate::domain::indicator::{
    to_x100, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SupertrendParams {
    pub period: usize,
    pub multiplier: f64,
}

impl Default for SupertrendParams {
    fn default() -> Self {
        Self {
            period: 10,
            multiplier: 3.0,
        }
    }
}

pub fn calculate_supertrend(bars: &[Bar], params: SupertrendParams) -> IndicatorSeries {
    let indicator_type = IndicatorType::Supertrend {
        period: params.period,
        mult_x100: to_x100(params.multiplier),
    };
    if params.period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let atr = atr_values(bars, params.period);
    let mut values = Vec::with_capacity(bars.len());
    // (upper, lower, trending_up) of the previous valid bar
    let mut state: Option<(f64, f64, bool)> = None;

    for (i, bar) in bars.iter().enumerate() {
        let Some(a) = atr[i] else {
            values.push(IndicatorPoint::invalid(
                bar.timestamp,
                IndicatorValue::Supertrend {
                    line: 0.0,
                    direction: 0,
                },
            ));
            continue;
        };

        let hl2 = bar.median_price();
        let raw_upper = hl2 + params.multiplier * a;
        let raw_lower = hl2 - params.multiplier * a;

        let (upper, lower, trending_up) = match state {
            None => (raw_upper, raw_lower, bar.close > raw_upper),
            Some((prev_upper, prev_lower, prev_up)) => {
                let prev_close = bars[i - 1].close;
                let upper = if prev_close <= prev_upper {
                    raw_upper.min(prev_upper)
                } else {
                    raw_upper
                };
                let lower = if prev_close >= prev_lower {
                    raw_lower.max(prev_lower)
                } else {
                    raw_lower
                };
                let up = if prev_up && bar.close < lower {
                    false
                } else if !prev_up && bar.close > upper {
                    true
                } else {
                    prev_up
                };
                (upper, lower, up)
            }
        };
        state = Some((upper, lower, trending_up));

        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid: true,
            value: IndicatorValue::Supertrend {
                line: if trending_up { lower } else { upper },
                direction: if trending_up { 1 } else { -1 },
            },
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn make_bars(data: &[(f64, f64, f64)]) -> Vec<Bar> {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        data.iter()
            .enumerate()
            .map(|(i, &(high, low, close))| Bar {
                timestamp: start + chrono::Duration::minutes(i as i64),
                open: close,
                high,
                low,
                close,
                volume: 0.0,
            })
            .collect()
    }

    fn parts(p: &IndicatorPoint) -> (f64, i8) {
        match p.value {
            IndicatorValue::Supertrend { line, direction } => (line, direction),
            _ => panic!("expected Supertrend"),
        }
    }

    #[test]
    fn supertrend_starts_down_inside_bands() {
        let bars = make_bars(&[(11.0, 9.0, 10.0), (11.0, 9.0, 10.0)]);
        let series = calculate_supertrend(
            &bars,
            SupertrendParams {
                period: 1,
                multiplier: 1.0,
            },
        );
        let (line, dir) = parts(&series.values[0]);
        assert_eq!(dir, -1);
        // hl2 10 + 1 × TR 2
        assert!((line - 12.0).abs() < f64::EPSILON);
    }

    #[test]
    fn supertrend_upper_band_ratchets_down() {
        let bars = make_bars(&[(11.0, 9.0, 10.0), (10.5, 9.5, 10.0)]);
        let series = calculate_supertrend(
            &bars,
            SupertrendParams {
                period: 1,
                multiplier: 1.0,
            },
        );
        let (line, dir) = parts(&series.values[1]);
        assert_eq!(dir, -1);
        // raw upper 10 + 1 = 11 < 12
        assert!((line - 11.0).abs() < f64::EPSILON);
    }

    #[test]
    fn supertrend_flips_up_on_breakout() {
        let bars = make_bars(&[(11.0, 9.0, 10.0), (20.0, 19.0, 20.0)]);
        let series = calculate_supertrend(
            &bars,
            SupertrendParams {
                period: 1,
                multiplier: 1.0,
            },
        );
        let (line, dir) = parts(&series.values[1]);
        assert_eq!(dir, 1);
        // close 20 > upper; line follows the lower band
        assert!(line < 20.0);
    }

    #[test]
    fn supertrend_holds_up_inside_bands() {
        let bars = make_bars(&[(11.0, 9.0, 10.0), (20.0, 19.0, 20.0), (16.0, 14.0, 15.0)]);
        let series = calculate_supertrend(
            &bars,
            SupertrendParams {
                period: 1,
                multiplier: 1.0,
            },
        );
        // close 15 is below the upper band 21 but above the lower band 9.5
        let (line, dir) = parts(&series.values[2]);
        assert_eq!(dir, 1);
        assert!((line - 9.5).abs() < 1e-12);
    }

    #[test]
    fn supertrend_warmup_invalid() {
        let bars = make_bars(&[(11.0, 9.0, 10.0); 4]);
        let series = calculate_supertrend(
            &bars,
            SupertrendParams {
                period: 3,
                multiplier: 3.0,
            },
        );
        assert!(!series.values[0].valid);
        assert!(!series.values[1].valid);
        assert!(series.values[2].valid);
    }
}
