//! Position tracking and the closed-trade record.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::signal::{Direction, Signal, TAKE_PROFIT_R};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    pub symbol: String,
    pub direction: Direction,
    pub entry_price: f64,
    pub entry_time: NaiveDateTime,
    pub size: f64,
    /// Frozen at entry.
    pub initial_stop_loss: f64,
    /// Ratchets in the trade's favour once `trailing_active`.
    pub stop_loss: f64,
    pub take_profit: [f64; 3],
    pub trailing_active: bool,
    pub highest_price: f64,
    pub lowest_price: f64,
    /// Broker ticket in live mode.
    pub ticket: Option<u64>,
}

impl Position {
    /// Build a position from a signal filled at `entry_price`. The target
    /// ladder is re-based on the fill so R stays `|entry - initial stop|`.
    pub fn open(signal: &Signal, entry_price: f64, size: f64, ticket: Option<u64>) -> Self {
        let risk = (entry_price - signal.stop_loss).abs();
        let sign = signal.direction.sign();
        Position {
            symbol: signal.symbol.clone(),
            direction: signal.direction,
            entry_price,
            entry_time: signal.timestamp,
            size,
            initial_stop_loss: signal.stop_loss,
            stop_loss: signal.stop_loss,
            take_profit: TAKE_PROFIT_R.map(|r| entry_price + sign * r * risk),
            trailing_active: false,
            highest_price: entry_price,
            lowest_price: entry_price,
            ticket,
        }
    }

    pub fn is_long(&self) -> bool {
        self.direction == Direction::Long
    }

    /// R: distance from entry to the initial stop.
    pub fn risk(&self) -> f64 {
        (self.entry_price - self.initial_stop_loss).abs()
    }

    /// Signed price move in the position's favour.
    pub fn favourable_move(&self, price: f64) -> f64 {
        (price - self.entry_price) * self.direction.sign()
    }

    pub fn profit_r(&self, price: f64) -> f64 {
        let risk = self.risk();
        if risk > 0.0 {
            self.favourable_move(price) / risk
        } else {
            0.0
        }
    }

    /// Track the extreme, arm the trail at `activation_r`, and ratchet the stop
    /// to `extreme ∓ distance_atr × atr` while armed. Returns true on the bar
    /// the trail arms.
    pub fn update_trailing(
        &mut self,
        close: f64,
        atr: Option<f64>,
        activation_r: f64,
        distance_atr: f64,
    ) -> bool {
        if self.is_long() {
            self.highest_price = self.highest_price.max(close);
        } else {
            self.lowest_price = self.lowest_price.min(close);
        }

        let mut armed_now = false;
        if !self.trailing_active && self.profit_r(close) >= activation_r {
            self.trailing_active = true;
            armed_now = true;
        }

        if self.trailing_active {
            if let Some(atr) = atr {
                if self.is_long() {
                    let candidate = self.highest_price - distance_atr * atr;
                    if candidate > self.stop_loss {
                        self.stop_loss = candidate;
                    }
                } else {
                    let candidate = self.lowest_price + distance_atr * atr;
                    if candidate < self.stop_loss {
                        self.stop_loss = candidate;
                    }
                }
            }
        }
        armed_now
    }

    pub fn trailing_hit(&self, close: f64) -> bool {
        self.trailing_active
            && if self.is_long() {
                close <= self.stop_loss
            } else {
                close >= self.stop_loss
            }
    }

    pub fn hard_stop_hit(&self, close: f64) -> bool {
        if self.is_long() {
            close <= self.initial_stop_loss
        } else {
            close >= self.initial_stop_loss
        }
    }

    /// First take-profit level crossed by `close`, scanning 1.5R → 4.0R.
    pub fn take_profit_hit(&self, close: f64) -> Option<f64> {
        self.take_profit.iter().copied().find(|&tp| {
            if self.is_long() {
                close >= tp
            } else {
                close <= tp
            }
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExitReason {
    NewsEvent,
    TrailingStop,
    StopLoss,
    TakeProfit,
    EndOfBacktest,
}

impl fmt::Display for ExitReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ExitReason::NewsEvent => "news_event",
            ExitReason::TrailingStop => "trailing_stop",
            ExitReason::StopLoss => "stop_loss",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::EndOfBacktest => "end_of_backtest",
        };
        write!(f, "{}", s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClosedTrade {
    pub symbol: String,
    pub direction: Direction,
    pub size: f64,
    pub entry_price: f64,
    pub exit_price: f64,
    pub entry_time: NaiveDateTime,
    pub exit_time: NaiveDateTime,
    pub initial_stop_loss: f64,
    /// Net of commission.
    pub pnl: f64,
    pub commission: f64,
    pub r_multiple: f64,
    pub reason: ExitReason,
}

impl ClosedTrade {
    pub fn holding_minutes(&self) -> i64 {
        (self.exit_time - self.entry_time).num_minutes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn t(minute: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(10, minute, 0)
            .unwrap()
    }

    fn long_gold() -> Position {
        let signal = Signal::new("XAUUSD", Direction::Long, 2000.0, 1995.0, t(0), 0.5);
        Position::open(&signal, 2000.0, 0.3, None)
    }

    fn short_euro() -> Position {
        let signal = Signal::new("EURUSD", Direction::Short, 1.1000, 1.1010, t(0), 0.5);
        Position::open(&signal, 1.1000, 1.0, None)
    }

    #[test]
    fn open_copies_stop_and_extremes() {
        let pos = long_gold();
        assert_eq!(pos.initial_stop_loss, 1995.0);
        assert_eq!(pos.stop_loss, 1995.0);
        assert_eq!(pos.highest_price, 2000.0);
        assert!(!pos.trailing_active);
        assert!((pos.risk() - 5.0).abs() < f64::EPSILON);
    }

    #[test]
    fn slipped_fill_rebases_take_profit() {
        let signal = Signal::new("XAUUSD", Direction::Long, 2000.0, 1995.0, t(0), 0.5);
        let pos = Position::open(&signal, 2000.5, 0.3, None);
        assert!((pos.risk() - 5.5).abs() < 1e-12);
        assert!((pos.take_profit[0] - 2008.75).abs() < 1e-9);
        assert!((pos.take_profit[1] - 2014.25).abs() < 1e-9);
        assert!((pos.take_profit[2] - 2022.5).abs() < 1e-9);

        let signal = Signal::new("EURUSD", Direction::Short, 1.1000, 1.1010, t(0), 0.5);
        let pos = Position::open(&signal, 1.0998, 1.0, None);
        assert!((pos.take_profit[0] - (1.0998 - 1.5 * 0.0012)).abs() < 1e-12);
    }

    #[test]
    fn trailing_arms_at_threshold_and_ratchets() {
        let mut pos = long_gold();
        assert!(!pos.update_trailing(2003.0, Some(1.0), 0.8, 1.0));
        assert!(!pos.trailing_active);

        assert!(pos.update_trailing(2004.0, Some(1.0), 0.8, 1.0));
        assert!(pos.trailing_active);
        assert!((pos.stop_loss - 2003.0).abs() < f64::EPSILON);

        // retrace: extreme stays, stop does not loosen
        assert!(!pos.update_trailing(2003.0, Some(1.0), 0.8, 1.0));
        assert!((pos.stop_loss - 2003.0).abs() < f64::EPSILON);
        assert!(pos.trailing_hit(2003.0));
    }

    #[test]
    fn trailing_keeps_ratcheting_below_activation() {
        let mut pos = long_gold();
        pos.update_trailing(2004.0, Some(1.0), 0.8, 1.0);
        pos.update_trailing(2006.0, Some(1.0), 0.8, 1.0);
        assert!((pos.stop_loss - 2005.0).abs() < f64::EPSILON);
        // wider ATR would loosen; stop holds
        pos.update_trailing(2001.0, Some(3.0), 0.8, 1.0);
        assert!((pos.stop_loss - 2005.0).abs() < f64::EPSILON);
        assert!(pos.trailing_active);
    }

    #[test]
    fn short_trailing_mirrors() {
        let mut pos = short_euro();
        pos.update_trailing(1.0990, Some(0.0002), 0.8, 1.0);
        assert!(pos.trailing_active);
        assert!((pos.lowest_price - 1.0990).abs() < 1e-12);
        assert!((pos.stop_loss - 1.0992).abs() < 1e-12);
        assert!(pos.trailing_hit(1.0993));
        assert!(!pos.trailing_hit(1.0991));
    }

    #[test]
    fn trailing_without_atr_only_arms() {
        let mut pos = long_gold();
        pos.update_trailing(2010.0, None, 0.8, 1.0);
        assert!(pos.trailing_active);
        assert_eq!(pos.stop_loss, 1995.0);
    }

    #[test]
    fn hard_stop_uses_initial_level() {
        let mut pos = long_gold();
        pos.stop_loss = 2003.0;
        assert!(pos.hard_stop_hit(1995.0));
        assert!(!pos.hard_stop_hit(1995.5));
    }

    #[test]
    fn take_profit_scans_in_order() {
        let pos = long_gold();
        assert_eq!(pos.take_profit_hit(2007.0), None);
        assert_eq!(pos.take_profit_hit(2007.5), Some(2007.5));
        assert_eq!(pos.take_profit_hit(2030.0), Some(2007.5));

        let short = short_euro();
        assert!(short.take_profit_hit(1.0980).is_some());
        assert!(short.take_profit_hit(1.0990).is_none());
    }

    #[test]
    fn exit_reason_display_matches_serde() {
        assert_eq!(ExitReason::NewsEvent.to_string(), "news_event");
        assert_eq!(
            serde_json::to_string(&ExitReason::EndOfBacktest).unwrap(),
            "\"end_of_backtest\""
        );
    }
}
