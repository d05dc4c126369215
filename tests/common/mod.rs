#![allow(dead_code)]

use chrono::{Duration, NaiveDate, NaiveDateTime};
pub use hybridtrader::domain::bar::Bar;
use hybridtrader::domain::bar::PriceSource;
use hybridtrader::domain::error::TraderError;
use hybridtrader::domain::indicator::{
    IndicatorFrame, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue, MaMethod,
};
use hybridtrader::domain::news::NewsEvent;
use hybridtrader::domain::signal::Direction;
use hybridtrader::ports::data_port::BarSource;
use hybridtrader::ports::executor_port::{AccountInfo, BrokerPosition, OrderExecutor, OrderRequest};
use hybridtrader::ports::news_port::NewsFeed;
use std::cell::Cell;
use std::collections::HashMap;
use std::rc::Rc;

pub fn base_time() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 4)
        .unwrap()
        .and_hms_opt(8, 0, 0)
        .unwrap()
}

pub fn ts(minute: i64) -> NaiveDateTime {
    base_time() + Duration::minutes(minute)
}

// ---------------------------------------------------------------------------
// Bar sources
// ---------------------------------------------------------------------------

pub struct MockBarSource {
    pub data: HashMap<(String, String), Vec<Bar>>,
    pub errors: HashMap<String, String>,
}

impl MockBarSource {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_bars(mut self, symbol: &str, timeframe: &str, bars: Vec<Bar>) -> Self {
        self.data
            .insert((symbol.to_string(), timeframe.to_string()), bars);
        self
    }

    pub fn with_error(mut self, symbol: &str, reason: &str) -> Self {
        self.errors.insert(symbol.to_string(), reason.to_string());
        self
    }
}

impl BarSource for MockBarSource {
    fn get_historical(
        &self,
        symbol: &str,
        timeframe: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, TraderError> {
        if let Some(reason) = self.errors.get(symbol) {
            return Err(TraderError::DataUnavailable {
                symbol: symbol.to_string(),
                timeframe: timeframe.to_string(),
                reason: reason.clone(),
            });
        }
        Ok(self
            .data
            .get(&(symbol.to_string(), timeframe.to_string()))
            .map(|bars| {
                bars.iter()
                    .filter(|b| b.timestamp >= start && b.timestamp <= end)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }
}

/// Bars with the given closes, `step` minutes apart, high/low ±0.2.
pub fn make_bars(closes: &[f64], step: i64) -> Vec<Bar> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &c)| Bar {
            timestamp: ts(i as i64 * step),
            open: c,
            high: c + 0.2,
            low: c - 0.2,
            close: c,
            volume: 10.0,
        })
        .collect()
}

/// Deterministic oscillating gold-like closes.
pub fn wave(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 2000.0 + (i as f64 * 0.21).sin() * 6.0 + (i as f64 * 0.05).cos() * 3.0)
        .collect()
}

/// Every fifth close, for a matching 5-minute series.
pub fn every_fifth(closes: &[f64]) -> Vec<f64> {
    closes.iter().step_by(5).copied().collect()
}

// ---------------------------------------------------------------------------
// Hand-built indicator frames
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub struct Row {
    pub close: f64,
    pub kc: (f64, f64),
    pub bb: (f64, f64),
    /// line, signal, crossover
    pub macd: (f64, f64, i8),
    pub cci: f64,
    pub atr: f64,
}

pub fn quiet(close: f64) -> Row {
    Row {
        close,
        kc: (close + 1.0, close - 1.0),
        bb: (close + 1.0, close - 1.0),
        macd: (0.0, 0.0, 0),
        cci: 0.0,
        atr: 1.0,
    }
}

/// Frame whose indicator columns are exactly the given rows.
pub fn frame(rows: &[Row], step: i64) -> IndicatorFrame {
    let bars: Vec<Bar> = rows
        .iter()
        .enumerate()
        .map(|(i, r)| Bar {
            timestamp: ts(i as i64 * step),
            open: r.close,
            high: r.close,
            low: r.close,
            close: r.close,
            volume: 1.0,
        })
        .collect();

    let series = |ty: IndicatorType, f: fn(&Row) -> IndicatorValue| IndicatorSeries {
        indicator_type: ty,
        values: rows
            .iter()
            .zip(&bars)
            .map(|(r, b)| IndicatorPoint {
                timestamp: b.timestamp,
                valid: true,
                value: f(r),
            })
            .collect(),
    };

    let mut frame = IndicatorFrame::new(bars.clone());
    frame.insert(series(
        IndicatorType::Keltner {
            ma_period: 20,
            atr_period: 10,
            atr_mult_x100: 50,
            ma_method: MaMethod::Ema,
            price: PriceSource::Close,
        },
        |r| IndicatorValue::Bands {
            upper: r.kc.0,
            middle: (r.kc.0 + r.kc.1) / 2.0,
            lower: r.kc.1,
        },
    ));
    frame.insert(series(
        IndicatorType::Bollinger {
            period: 34,
            stddev_mult_x100: 100,
        },
        |r| IndicatorValue::Bands {
            upper: r.bb.0,
            middle: (r.bb.0 + r.bb.1) / 2.0,
            lower: r.bb.1,
        },
    ));
    frame.insert(series(
        IndicatorType::Macd {
            fast: 12,
            slow: 26,
            signal: 9,
        },
        |r| IndicatorValue::Macd {
            line: r.macd.0,
            signal: r.macd.1,
            histogram: r.macd.0 - r.macd.1,
            crossover: r.macd.2,
        },
    ));
    frame.insert(series(IndicatorType::Cci(20), |r| {
        IndicatorValue::Simple(r.cci)
    }));
    frame.insert(series(IndicatorType::Atr(14), |r| {
        IndicatorValue::Simple(r.atr)
    }));
    frame
}

/// `n` quiet rows at `close`, ATR `atr`.
pub fn flat_rows(n: usize, close: f64, atr: f64) -> Vec<Row> {
    (0..n).map(|_| Row { atr, ..quiet(close) }).collect()
}

/// Quiet rows whose last bar is `last`.
pub fn rows_ending_with(n: usize, last: Row) -> Vec<Row> {
    let mut rows = vec![quiet(last.close); n - 1];
    rows.push(last);
    rows
}

// ---------------------------------------------------------------------------
// Broker
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct MockExecutor {
    pub fail_connect: bool,
    pub refuse_open: bool,
    pub refuse_close: bool,
    pub connected: bool,
    pub next_ticket: u64,
    pub magic: u64,
    pub positions: Vec<BrokerPosition>,
    pub opened: Vec<OrderRequest>,
    pub closed: Vec<u64>,
    pub modified: Vec<(u64, Option<f64>, Option<f64>)>,
}

impl MockExecutor {
    pub fn new(magic: u64) -> Self {
        Self {
            next_ticket: 1000,
            magic,
            ..Self::default()
        }
    }

    /// A position held by someone else on the same account.
    pub fn with_foreign_position(mut self, symbol: &str, magic: u64) -> Self {
        self.positions.push(BrokerPosition {
            ticket: 1,
            symbol: symbol.to_string(),
            direction: Direction::Long,
            volume: 1.0,
            open_price: 1.0,
            stop_loss: 0.0,
            take_profit: 0.0,
            magic,
            comment: "manual".into(),
            profit: 0.0,
            open_time: base_time(),
        });
        self
    }
}

impl OrderExecutor for MockExecutor {
    fn connect(&mut self) -> Result<(), TraderError> {
        if self.fail_connect {
            return Err(TraderError::ExecutorConnection {
                reason: "terminal not running".into(),
            });
        }
        self.connected = true;
        Ok(())
    }

    fn open(&mut self, request: &OrderRequest) -> Result<Option<u64>, TraderError> {
        self.opened.push(request.clone());
        if self.refuse_open {
            return Ok(None);
        }
        self.next_ticket += 1;
        let ticket = self.next_ticket;
        self.positions.push(BrokerPosition {
            ticket,
            symbol: request.symbol.clone(),
            direction: request.direction,
            volume: request.volume,
            open_price: 0.0,
            stop_loss: request.stop_loss,
            take_profit: request.take_profit,
            magic: self.magic,
            comment: request.comment.clone(),
            profit: 0.0,
            open_time: base_time(),
        });
        Ok(Some(ticket))
    }

    fn close(&mut self, ticket: u64) -> Result<bool, TraderError> {
        if self.refuse_close {
            return Ok(false);
        }
        self.closed.push(ticket);
        self.positions.retain(|p| p.ticket != ticket);
        Ok(true)
    }

    fn modify(
        &mut self,
        ticket: u64,
        stop_loss: Option<f64>,
        take_profit: Option<f64>,
    ) -> Result<bool, TraderError> {
        self.modified.push((ticket, stop_loss, take_profit));
        match self.positions.iter_mut().find(|p| p.ticket == ticket) {
            Some(p) => {
                if let Some(sl) = stop_loss {
                    p.stop_loss = sl;
                }
                if let Some(tp) = take_profit {
                    p.take_profit = tp;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn get_open_positions(&self, symbol: Option<&str>) -> Result<Vec<BrokerPosition>, TraderError> {
        Ok(self
            .positions
            .iter()
            .filter(|p| symbol.is_none_or(|s| p.symbol == s))
            .cloned()
            .collect())
    }

    fn get_account_info(&self) -> Result<AccountInfo, TraderError> {
        Ok(AccountInfo {
            balance: 10_000.0,
            equity: 10_000.0,
            margin: 0.0,
            free_margin: 10_000.0,
            margin_level: 0.0,
            profit: 0.0,
        })
    }
}

// ---------------------------------------------------------------------------
// News
// ---------------------------------------------------------------------------

pub struct MockNewsFeed {
    pub events: Vec<NewsEvent>,
    pub fail: bool,
    pub calls: Rc<Cell<usize>>,
}

impl MockNewsFeed {
    pub fn new(events: Vec<NewsEvent>) -> Self {
        Self {
            events,
            fail: false,
            calls: Rc::new(Cell::new(0)),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new(Vec::new())
        }
    }
}

impl NewsFeed for MockNewsFeed {
    fn fetch(&self) -> Result<Vec<NewsEvent>, TraderError> {
        self.calls.set(self.calls.get() + 1);
        if self.fail {
            return Err(TraderError::NewsFeedUnavailable {
                reason: "calendar offline".into(),
            });
        }
        Ok(self.events.clone())
    }
}

/// `ExitCode` has no `PartialEq` on every toolchain; compare its debug form.
pub fn code_of(code: std::process::ExitCode) -> String {
    format!("{code:?}")
}
