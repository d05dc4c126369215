//! JSON/CSV report adapter implementing ReportPort.
//!
//! Writes three files into the output directory: `trades.json` (the closed
//! trade ledger), `summary.json` (statistics and performance metrics) and
//! `equity.csv` (one row per processed timestamp).

use std::fs;
use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TraderError;
use crate::ports::report_port::ReportPort;
use log::info;

pub const TRADES_FILE: &str = "trades.json";
pub const SUMMARY_FILE: &str = "summary.json";
pub const EQUITY_FILE: &str = "equity.csv";

#[derive(Debug, Default)]
pub struct JsonReportAdapter;

impl JsonReportAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl ReportPort for JsonReportAdapter {
    fn write(&self, result: &BacktestResult, output_path: &str) -> Result<(), TraderError> {
        let dir = Path::new(output_path);
        fs::create_dir_all(dir)?;

        let trades = serde_json::to_string_pretty(&result.trades)?;
        fs::write(dir.join(TRADES_FILE), trades)?;

        let summary = serde_json::to_string_pretty(&result.summary)?;
        fs::write(dir.join(SUMMARY_FILE), summary)?;

        let mut wtr = csv::Writer::from_path(dir.join(EQUITY_FILE)).map_err(std::io::Error::other)?;
        for point in &result.equity_curve {
            wtr.serialize(point).map_err(std::io::Error::other)?;
        }
        wtr.flush()?;

        info!(
            "report written to {} ({} trades, {} equity points)",
            dir.display(),
            result.trades.len(),
            result.equity_curve.len()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::metrics::{PerformanceMetrics, Summary, TradeStatistics};
    use crate::domain::portfolio::EquityPoint;
    use crate::domain::position::{ClosedTrade, ExitReason};
    use crate::domain::signal::Direction;
    use chrono::{NaiveDate, NaiveDateTime};
    use tempfile::tempdir;

    fn ts(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn sample_result() -> BacktestResult {
        let trades = vec![ClosedTrade {
            symbol: "XAUUSD".into(),
            direction: Direction::Long,
            size: 0.3,
            entry_price: 2000.0,
            exit_price: 2003.0,
            entry_time: ts(9, 0),
            exit_time: ts(9, 30),
            initial_stop_loss: 1995.0,
            pnl: 90.0,
            commission: 0.0,
            r_multiple: 0.6,
            reason: ExitReason::TrailingStop,
        }];
        let equity_curve = vec![
            EquityPoint {
                timestamp: ts(9, 0),
                equity: 10_000.0,
            },
            EquityPoint {
                timestamp: ts(9, 30),
                equity: 10_090.0,
            },
        ];
        let summary = Summary {
            trades: TradeStatistics::compute(&trades),
            performance: PerformanceMetrics::compute(&equity_curve, 10_000.0, 1, Some(252.0)),
        };
        BacktestResult {
            initial_capital: 10_000.0,
            trades,
            equity_curve,
            summary,
        }
    }

    #[test]
    fn write_creates_all_files() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("run");
        let result = sample_result();

        JsonReportAdapter::new()
            .write(&result, out.to_str().unwrap())
            .unwrap();

        assert!(out.join(TRADES_FILE).exists());
        assert!(out.join(SUMMARY_FILE).exists());
        assert!(out.join(EQUITY_FILE).exists());
    }

    #[test]
    fn trades_and_summary_read_back() {
        let dir = tempdir().unwrap();
        let result = sample_result();
        JsonReportAdapter::new()
            .write(&result, dir.path().to_str().unwrap())
            .unwrap();

        let trades: Vec<ClosedTrade> =
            serde_json::from_str(&fs::read_to_string(dir.path().join(TRADES_FILE)).unwrap())
                .unwrap();
        assert_eq!(trades, result.trades);

        let raw = fs::read_to_string(dir.path().join(TRADES_FILE)).unwrap();
        assert!(raw.contains("\"trailing_stop\""));
        assert!(raw.contains("\"long\""));

        let summary: Summary =
            serde_json::from_str(&fs::read_to_string(dir.path().join(SUMMARY_FILE)).unwrap())
                .unwrap();
        assert_eq!(summary.trades.total_trades, 1);
        assert_eq!(summary.trades.winning_trades, 1);
    }

    #[test]
    fn equity_csv_has_header_and_rows() {
        let dir = tempdir().unwrap();
        JsonReportAdapter::new()
            .write(&sample_result(), dir.path().to_str().unwrap())
            .unwrap();

        let content = fs::read_to_string(dir.path().join(EQUITY_FILE)).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "timestamp,equity");
        assert!(lines[2].ends_with(",10090.0"));
    }
}
