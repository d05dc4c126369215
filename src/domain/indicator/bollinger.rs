//! Bollinger Bands indicator.
//!
//! - Middle: Simple Moving Average (SMA) of close over `length` periods
//! - Upper: Middle + (deviation × StdDev)
//! - Lower: Middle - (deviation × StdDev)
//!
//! StdDev is the sample standard deviation (divides by N-1).
//!
//! Default parameters: length=34, deviation=1.0
//! Warmup: first (length-1) bars are invalid.

use crate::domain::bar::Bar;
use crate::domain::indicator::stddev::rolling_sample_stddev;
use crate::domain::indicator::{
    rolling_mean, to_x100, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};

pub const DEFAULT_LENGTH: usize = 34;
pub const DEFAULT_DEVIATION: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BollingerParams {
    pub length: usize,
    pub deviation: f64,
}

impl Default for BollingerParams {
    fn default() -> Self {
        Self {
            length: DEFAULT_LENGTH,
            deviation: DEFAULT_DEVIATION,
        }
    }
}

pub fn calculate_bollinger(bars: &[Bar], params: BollingerParams) -> IndicatorSeries {
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let means = rolling_mean(&closes, params.length);
    let stddevs = rolling_sample_stddev(&closes, params.length);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match (means[i], stddevs[i]) {
            (Some(middle), Some(sd)) => IndicatorPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: IndicatorValue::Bands {
                    upper: middle + params.deviation * sd,
                    middle,
                    lower: middle - params.deviation * sd,
                },
            },
            _ => IndicatorPoint::invalid(
                bar.timestamp,
                IndicatorValue::Bands {
                    upper: 0.0,
                    middle: 0.0,
                    lower: 0.0,
                },
            ),
        })
        .collect();

    IndicatorSeries {
        indicator_type: IndicatorType::Bollinger {
            period: params.length,
            stddev_mult_x100: to_x100(params.deviation),
        },
        values,
    }
}
