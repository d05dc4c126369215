//! Keltner Channel.
//!
//! Middle = MA(price, ma_period) with MA either SMA or EMA.
//! Upper/Lower = Middle ± atr_multiple × ATR(atr_period).
//! A bar is valid once both the middle line and the ATR are defined.

use crate::domain::bar::{Bar, PriceSource};
use crate::domain::indicator::atr::atr_values;
use crate::domain::indicator::ema::ema_values;
use crate::domain::indicator::{
    rolling_mean, to_x100, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
    MaMethod,
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KeltnerParams {
    pub ma_period: usize,
    pub atr_period: usize,
    pub atr_multiple: f64,
    pub ma_method: MaMethod,
    pub price: PriceSource,
}

impl Default for KeltnerParams {
    fn default() -> Self {
        Self {
            ma_period: 20,
            atr_period: 10,
            atr_multiple: 0.5,
            ma_method: MaMethod::Ema,
            price: PriceSource::Close,
        }
    }
}

pub fn calculate_keltner(bars: &[Bar], params: KeltnerParams) -> IndicatorSeries {
    let indicator_type = IndicatorType::Keltner {
        ma_period: params.ma_period,
        atr_period: params.atr_period,
        atr_mult_x100: to_x100(params.atr_multiple),
        ma_method: params.ma_method,
        price: params.price,
    };
    if params.ma_period == 0 || params.atr_period == 0 {
        return IndicatorSeries::empty(indicator_type);
    }

    let prices: Vec<f64> = bars.iter().map(|b| params.price.of(b)).collect();
    let middle: Vec<Option<f64>> = match params.ma_method {
        MaMethod::Ema => ema_values(&prices, params.ma_period)
            .into_iter()
            .map(Some)
            .collect(),
        MaMethod::Sma => rolling_mean(&prices, params.ma_period),
    };
    let atr = atr_values(bars, params.atr_period);

    let values = bars
        .iter()
        .enumerate()
        .map(|(i, bar)| match (middle[i], atr[i]) {
            (Some(mid), Some(a)) => IndicatorPoint {
                timestamp: bar.timestamp,
                valid: true,
                value: IndicatorValue::Bands {
                    upper: mid + params.atr_multiple * a,
                    middle: mid,
                    lower: mid - params.atr_multiple * a,
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
        indicator_type,
        values,
    }
}
