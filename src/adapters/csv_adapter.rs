//! CSV file bar source.
//!
//! One file per symbol and timeframe: `<base>/<SYMBOL>_<timeframe>.csv` with
//! header `timestamp,open,high,low,close,volume`.

use crate::domain::bar::Bar;
use crate::domain::error::TraderError;
use crate::ports::data_port::BarSource;
use chrono::NaiveDateTime;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Deserialize)]
struct BarRow {
    timestamp: String,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volume: f64,
}

pub struct CsvBarSource {
    base_path: PathBuf,
}

impl CsvBarSource {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, symbol: &str, timeframe: &str) -> PathBuf {
        self.base_path.join(format!("{}_{}.csv", symbol, timeframe))
    }
}

/// Parse `YYYY-MM-DD HH:MM:SS`, also accepting the ISO `T` separator.
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    let value = value.trim();
    NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S"))
        .ok()
}

impl BarSource for CsvBarSource {
    fn get_historical(
        &self,
        symbol: &str,
        timeframe: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, TraderError> {
        let unavailable = |reason: String| TraderError::DataUnavailable {
            symbol: symbol.to_string(),
            timeframe: timeframe.to_string(),
            reason,
        };

        let path = self.csv_path(symbol, timeframe);
        let content = fs::read_to_string(&path)
            .map_err(|e| unavailable(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for (line, result) in rdr.deserialize::<BarRow>().enumerate() {
            let row = result.map_err(|e| unavailable(format!("CSV parse error: {}", e)))?;
            let timestamp = parse_timestamp(&row.timestamp).ok_or_else(|| {
                unavailable(format!(
                    "invalid timestamp '{}' on row {}",
                    row.timestamp,
                    line + 1
                ))
            })?;

            if timestamp < start || timestamp > end {
                continue;
            }

            bars.push(Bar {
                timestamp,
                open: row.open,
                high: row.high,
                low: row.low,
                close: row.close,
                volume: row.volume,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        if let Some(pair) = bars.windows(2).find(|w| w[0].timestamp == w[1].timestamp) {
            return Err(unavailable(format!(
                "duplicate timestamp {}",
                pair[0].timestamp
            )));
        }
        Ok(bars)
    }
}
