//! Indicator frame: a bar stream with aligned indicator columns.
//!
//! Columns are keyed by [`IndicatorKind`]; each holds an `IndicatorSeries`
//! of the same length as the bars. Lookups return `None` for undefined
//! points so consumers never read warm-up or degenerate values.

use chrono::NaiveDateTime;
use std::collections::HashMap;

use crate::domain::bar::Bar;
use crate::domain::indicator::{
    calculate_atr, calculate_bollinger, calculate_cci, calculate_keltner, calculate_macd,
    calculate_rsi, calculate_supertrend, calculate_zigzag, IndicatorKind, IndicatorParams,
    IndicatorSeries, IndicatorValue,
};

/// A scalar field readable from a frame row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    Open,
    High,
    Low,
    Close,
    Atr,
    KcUpper,
    KcMiddle,
    KcLower,
    BbUpper,
    BbMiddle,
    BbLower,
    Rsi,
    RsiCrossover,
    Macd,
    MacdSignal,
    MacdHistogram,
    MacdCrossover,
    Supertrend,
    SupertrendDirection,
    Cci,
    ZigZag,
}

impl Column {
    fn kind(self) -> Option<IndicatorKind> {
        match self {
            Column::Open | Column::High | Column::Low | Column::Close => None,
            Column::Atr => Some(IndicatorKind::Atr),
            Column::KcUpper | Column::KcMiddle | Column::KcLower => Some(IndicatorKind::Keltner),
            Column::BbUpper | Column::BbMiddle | Column::BbLower => {
                Some(IndicatorKind::Bollinger)
            }
            Column::Rsi | Column::RsiCrossover => Some(IndicatorKind::Rsi),
            Column::Macd | Column::MacdSignal | Column::MacdHistogram | Column::MacdCrossover => {
                Some(IndicatorKind::Macd)
            }
            Column::Supertrend | Column::SupertrendDirection => Some(IndicatorKind::Supertrend),
            Column::Cci => Some(IndicatorKind::Cci),
            Column::ZigZag => Some(IndicatorKind::ZigZag),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IndicatorFrame {
    pub bars: Vec<Bar>,
    pub indicators: HashMap<IndicatorKind, IndicatorSeries>,
}

impl IndicatorFrame {
    pub fn new(bars: Vec<Bar>) -> Self {
        Self {
            bars,
            indicators: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn timestamp(&self, index: usize) -> Option<NaiveDateTime> {
        self.bars.get(index).map(|b| b.timestamp)
    }

    pub fn insert(&mut self, series: IndicatorSeries) {
        if let Some(kind) = series.indicator_type.kind() {
            self.indicators.insert(kind, series);
        }
    }

    pub fn has(&self, kind: IndicatorKind) -> bool {
        self.indicators.contains_key(&kind)
    }

    /// Value of `column` at `index`, `None` when absent or undefined.
    pub fn value(&self, column: Column, index: usize) -> Option<f64> {
        let Some(kind) = column.kind() else {
            let bar = self.bars.get(index)?;
            return Some(match column {
                Column::Open => bar.open,
                Column::High => bar.high,
                Column::Low => bar.low,
                _ => bar.close,
            });
        };

        let point = self.indicators.get(&kind)?.get(index)?;
        extract_field(&point.value, column)
    }

    /// For every instant of `timeline`, the index of the last bar at or
    /// before it. Never looks forward.
    pub fn align_to(&self, timeline: &[NaiveDateTime]) -> Vec<Option<usize>> {
        let mut out = Vec::with_capacity(timeline.len());
        let mut j = 0usize;
        let mut last: Option<usize> = None;
        for &t in timeline {
            while j < self.bars.len() && self.bars[j].timestamp <= t {
                last = Some(j);
                j += 1;
            }
            out.push(last);
        }
        out
    }
}

fn extract_field(value: &IndicatorValue, column: Column) -> Option<f64> {
    let v = match (value, column) {
        (IndicatorValue::Simple(v), Column::Atr | Column::Cci) => *v,
        (IndicatorValue::Rsi { value, .. }, Column::Rsi) => *value,
        (IndicatorValue::Rsi { crossover, .. }, Column::RsiCrossover) => *crossover as f64,
        (IndicatorValue::Macd { line, .. }, Column::Macd) => *line,
        (IndicatorValue::Macd { signal, .. }, Column::MacdSignal) => *signal,
        (IndicatorValue::Macd { histogram, .. }, Column::MacdHistogram) => *histogram,
        (IndicatorValue::Macd { crossover, .. }, Column::MacdCrossover) => *crossover as f64,
        (IndicatorValue::Bands { upper, .. }, Column::KcUpper | Column::BbUpper) => *upper,
        (IndicatorValue::Bands { middle, .. }, Column::KcMiddle | Column::BbMiddle) => *middle,
        (IndicatorValue::Bands { lower, .. }, Column::KcLower | Column::BbLower) => *lower,
        (IndicatorValue::Supertrend { line, .. }, Column::Supertrend) => *line,
        (IndicatorValue::Supertrend { direction, .. }, Column::SupertrendDirection) => {
            *direction as f64
        }
        (IndicatorValue::Trend(t), Column::ZigZag) => *t as f64,
        _ => return None,
    };
    Some(v)
}

/// Compute every configured indicator over `bars`.
pub fn calculate_all(bars: Vec<Bar>, params: &IndicatorParams) -> IndicatorFrame {
    let mut frame = IndicatorFrame::new(bars);
    let bars = &frame.bars;

    let mut computed: Vec<IndicatorSeries> = Vec::new();
    if let Some(depth) = params.zigzag_depth {
        computed.push(calculate_zigzag(bars, depth));
    }
    if let Some(kc) = params.keltner {
        computed.push(calculate_keltner(bars, kc));
    }
    if let Some(bb) = params.bollinger {
        computed.push(calculate_bollinger(bars, bb));
    }
    if let Some(period) = params.rsi_period {
        computed.push(calculate_rsi(bars, period));
    }
    if let Some(macd) = params.macd {
        computed.push(calculate_macd(bars, macd));
    }
    if let Some(st) = params.supertrend {
        computed.push(calculate_supertrend(bars, st));
    }
    if let Some(period) = params.cci_period {
        computed.push(calculate_cci(bars, period));
    }
    if let Some(period) = params.atr_period {
        computed.push(calculate_atr(bars, period));
    }

    for series in computed {
        frame.insert(series);
    }
    frame
}
