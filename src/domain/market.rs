//! Per-symbol market data and the unified timeline.
//!
//! A [`SymbolData`] pairs the primary indicator frame with the confirmation
//! frame, resampled onto the primary timestamps by previous-value
//! propagation. A [`MarketSnapshot`] is the view the strategy sees at one
//! primary bar: nothing after that bar is reachable through it.

use crate::domain::indicator::{Column, IndicatorFrame};
use chrono::NaiveDateTime;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone)]
pub struct SymbolData {
    pub symbol: String,
    pub primary: IndicatorFrame,
    pub confirmation: IndicatorFrame,
    /// For each primary bar, the last confirmation bar at or before it.
    pub confirmation_index: Vec<Option<usize>>,
    pub time_index: HashMap<NaiveDateTime, usize>,
}

impl SymbolData {
    pub fn new(symbol: String, primary: IndicatorFrame, confirmation: IndicatorFrame) -> Self {
        let timestamps: Vec<NaiveDateTime> = primary.bars.iter().map(|b| b.timestamp).collect();
        let confirmation_index = confirmation.align_to(&timestamps);
        let time_index = timestamps
            .iter()
            .enumerate()
            .map(|(i, &ts)| (ts, i))
            .collect();
        Self {
            symbol,
            primary,
            confirmation,
            confirmation_index,
            time_index,
        }
    }

    pub fn bar_count(&self) -> usize {
        self.primary.len()
    }

    pub fn get_bar_index(&self, timestamp: NaiveDateTime) -> Option<usize> {
        self.time_index.get(&timestamp).copied()
    }

    pub fn snapshot(&self, index: usize) -> Option<MarketSnapshot<'_>> {
        if index >= self.primary.len() {
            return None;
        }
        Some(MarketSnapshot {
            primary: &self.primary,
            index,
            confirmation: &self.confirmation,
            confirmation_index: self.confirmation_index.get(index).copied().flatten(),
        })
    }
}

/// Read-only view of both frames at one primary bar.
#[derive(Debug, Clone, Copy)]
pub struct MarketSnapshot<'a> {
    primary: &'a IndicatorFrame,
    index: usize,
    confirmation: &'a IndicatorFrame,
    confirmation_index: Option<usize>,
}

impl<'a> MarketSnapshot<'a> {
    /// Snapshot at `index`, locating the matching confirmation bar by time.
    pub fn at(
        primary: &'a IndicatorFrame,
        index: usize,
        confirmation: &'a IndicatorFrame,
    ) -> Option<Self> {
        let now = primary.timestamp(index)?;
        let after = confirmation.bars.partition_point(|b| b.timestamp <= now);
        Some(Self {
            primary,
            index,
            confirmation,
            confirmation_index: after.checked_sub(1),
        })
    }

    /// Snapshot at the last primary bar.
    pub fn latest(primary: &'a IndicatorFrame, confirmation: &'a IndicatorFrame) -> Option<Self> {
        let last = primary.len().checked_sub(1)?;
        Self::at(primary, last, confirmation)
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn now(&self) -> NaiveDateTime {
        self.primary.bars[self.index].timestamp
    }

    pub fn primary(&self, column: Column) -> Option<f64> {
        self.primary.value(column, self.index)
    }

    pub fn confirm(&self, column: Column) -> Option<f64> {
        self.confirmation_index
            .and_then(|j| self.confirmation.value(column, j))
    }

    /// Primary bars visible at this instant.
    pub fn primary_bars(&self) -> usize {
        self.index + 1
    }

    /// Confirmation rows visible at this instant after resampling onto the
    /// primary timeline: primary bars from the first one with an aligned
    /// confirmation bar up to and including the current bar.
    pub fn confirmation_bars(&self) -> usize {
        let (Some(_), Some(first)) = (self.confirmation_index, self.confirmation.bars.first())
        else {
            return 0;
        };
        let start = self
            .primary
            .bars
            .partition_point(|b| b.timestamp < first.timestamp);
        (self.index + 1).saturating_sub(start)
    }
}

/// Every distinct primary timestamp across symbols, ascending.
pub fn build_unified_timeline(symbols: &[SymbolData]) -> Vec<NaiveDateTime> {
    let unique: BTreeSet<NaiveDateTime> = symbols
        .iter()
        .flat_map(|sd| sd.primary.bars.iter().map(|bar| bar.timestamp))
        .collect();
    unique.into_iter().collect()
}
