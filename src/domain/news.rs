//! High-impact news blackout.
//!
//! In backtest mode the blackout is inert: calendars only publish current
//! and upcoming events, so historical bars have nothing to match against.
//! In live mode events are pulled from a [`NewsFeed`] and refreshed lazily,
//! at most once per `refresh_interval` measured against the query time.

use chrono::{DateTime, Duration, NaiveDateTime, TimeZone};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::ports::news_port::NewsFeed;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Impact {
    High,
    Medium,
    Low,
}

impl Impact {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" => Some(Impact::High),
            "medium" => Some(Impact::Medium),
            "low" => Some(Impact::Low),
            _ => None,
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Impact::High => "High",
            Impact::Medium => "Medium",
            Impact::Low => "Low",
        };
        write!(f, "{}", s)
    }
}

/// A scheduled calendar event. `datetime` is naive, in the feed's zone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsEvent {
    pub country: String,
    pub title: String,
    pub datetime: NaiveDateTime,
    pub impact: Impact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsMode {
    Backtest,
    Live,
}

pub const DEFAULT_REFRESH_DAYS: i64 = 7;

/// Countries and currencies whose events move `symbol`.
pub fn watch_set(symbol: &str) -> &'static [&'static str] {
    match symbol {
        "EURUSD" => &["EUR", "USD", "Germany", "United States"],
        "GBPUSD" => &["GBP", "USD", "United Kingdom", "United States"],
        "USDJPY" => &["USD", "JPY", "United States", "Japan"],
        "AUDUSD" => &["AUD", "USD", "Australia", "United States"],
        "USDCAD" => &["USD", "CAD", "United States", "Canada"],
        "XAUUSD" | "XAGUSD" => &["USD", "United States"],
        _ => &["USD", "United States"],
    }
}

/// Whether `country` is in `symbol`'s watch-set, ignoring ASCII case.
pub fn watches(symbol: &str, country: &str) -> bool {
    watch_set(symbol)
        .iter()
        .any(|w| w.eq_ignore_ascii_case(country.trim()))
}

pub struct NewsBlackout {
    mode: NewsMode,
    feed: Option<Box<dyn NewsFeed>>,
    events: Vec<NewsEvent>,
    last_refresh: Option<NaiveDateTime>,
    refresh_interval: Duration,
}

impl fmt::Debug for NewsBlackout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewsBlackout")
            .field("mode", &self.mode)
            .field("has_feed", &self.feed.is_some())
            .field("events", &self.events.len())
            .field("last_refresh", &self.last_refresh)
            .finish()
    }
}

impl NewsBlackout {
    /// Backtest blackout: never closes anything.
    pub fn inert() -> Self {
        Self {
            mode: NewsMode::Backtest,
            feed: None,
            events: Vec::new(),
            last_refresh: None,
            refresh_interval: Duration::days(DEFAULT_REFRESH_DAYS),
        }
    }

    /// Live blackout backed by a feed.
    pub fn live(feed: Box<dyn NewsFeed>) -> Self {
        Self {
            mode: NewsMode::Live,
            feed: Some(feed),
            ..Self::inert()
        }
    }

    /// Live blackout over a fixed event list.
    pub fn from_events(events: Vec<NewsEvent>) -> Self {
        Self {
            mode: NewsMode::Live,
            events,
            ..Self::inert()
        }
    }

    pub fn with_refresh_days(mut self, days: i64) -> Self {
        self.refresh_interval = Duration::days(days);
        self
    }

    pub fn mode(&self) -> NewsMode {
        self.mode
    }

    pub fn events(&self) -> &[NewsEvent] {
        &self.events
    }

    fn refresh_if_due(&mut self, now: NaiveDateTime) {
        let Some(feed) = self.feed.as_ref() else {
            return;
        };
        let due = match self.last_refresh {
            None => true,
            Some(last) => now - last >= self.refresh_interval,
        };
        if !due {
            return;
        }
        match feed.fetch() {
            Ok(events) => {
                info!("news calendar refreshed: {} events", events.len());
                self.events = events;
            }
            Err(e) => {
                warn!("news feed unavailable, blackout inert until next refresh: {e}");
                self.events.clear();
            }
        }
        self.last_refresh = Some(now);
    }

    /// True when a High-impact event for `symbol`'s watch-set falls within
    /// `(now, now + minutes_before]`.
    pub fn should_close(&mut self, now: NaiveDateTime, symbol: &str, minutes_before: i64) -> bool {
        if self.mode == NewsMode::Backtest {
            return false;
        }
        self.refresh_if_due(now);

        let horizon = Duration::minutes(minutes_before);
        let hit = self.events.iter().find(|e| {
            let ahead = e.datetime - now;
            e.impact == Impact::High
                && ahead > Duration::zero()
                && ahead <= horizon
                && watches(symbol, &e.country)
        });

        match hit {
            Some(event) => {
                warn!(
                    "high-impact news in {}s for {}: {} - {}",
                    (event.datetime - now).num_seconds(),
                    symbol,
                    event.country,
                    event.title
                );
                true
            }
            None => false,
        }
    }

    /// Zone-carrying variant: the zone is stripped so the wall-clock time is
    /// compared against the feed's naive event times.
    pub fn should_close_zoned<Tz: TimeZone>(
        &mut self,
        now: &DateTime<Tz>,
        symbol: &str,
        minutes_before: i64,
    ) -> bool {
        self.should_close(now.naive_local(), symbol, minutes_before)
    }

    /// High-impact events in `[now, now + hours_ahead]`, soonest first.
    pub fn upcoming(&mut self, now: NaiveDateTime, hours_ahead: i64) -> Vec<NewsEvent> {
        self.refresh_if_due(now);
        let end = now + Duration::hours(hours_ahead);
        let mut out: Vec<NewsEvent> = self
            .events
            .iter()
            .filter(|e| e.impact == Impact::High && e.datetime >= now && e.datetime <= end)
            .cloned()
            .collect();
        out.sort_by_key(|e| e.datetime);
        out
    }
}

impl Default for NewsBlackout {
    fn default() -> Self {
        Self::inert()
    }
}
