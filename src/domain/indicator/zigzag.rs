//! ZigZag swing trend label.
//!
//! At bar i (i >= depth) the swing high/low are taken over the inclusive
//! window `[i - depth, i]`. A bar whose high equals the swing high is a
//! candidate high pivot; it registers when the last pivot was a low (or there
//! is none) and the high exceeds the last pivot price, setting trend = -1.
//! Low pivots mirror this with trend = +1. When a bar is both the swing high
//! and the swing low, only the high branch is evaluated. The label
//! propagates between pivots. Bars before `depth` are invalid.

use crate::domain::bar::Bar;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};

#[derive(Debug, Clone, Copy, PartialEq)]
enum Pivot {
    High(f64),
    Low(f64),
}

pub fn calculate_zigzag(bars: &[Bar], depth: usize) -> IndicatorSeries {
    let mut values = Vec::with_capacity(bars.len());
    let mut last_pivot: Option<Pivot> = None;
    let mut trend: i8 = 0;

    for (i, bar) in bars.iter().enumerate() {
        if i < depth {
            values.push(IndicatorPoint::invalid(
                bar.timestamp,
                IndicatorValue::Trend(0),
            ));
            continue;
        }

        let window = &bars[i - depth..=i];
        let swing_high = window.iter().map(|b| b.high).fold(f64::MIN, f64::max);
        let swing_low = window.iter().map(|b| b.low).fold(f64::MAX, f64::min);

        if bar.high == swing_high {
            let register = match last_pivot {
                None => true,
                Some(Pivot::Low(price)) => bar.high > price,
                Some(Pivot::High(_)) => false,
            };
            if register {
                last_pivot = Some(Pivot::High(bar.high));
                trend = -1;
            }
        } else if bar.low == swing_low {
            let register = match last_pivot {
                None => true,
                Some(Pivot::High(price)) => bar.low < price,
                Some(Pivot::Low(_)) => false,
            };
            if register {
                last_pivot = Some(Pivot::Low(bar.low));
                trend = 1;
            }
        }

        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid: true,
            value: IndicatorValue::Trend(trend),
        });
    }

    IndicatorSeries {
        indicator_type: IndicatorType::ZigZag(depth),
        values,
    }
}
