//! Economic calendar read from a CSV file.
//!
//! Header `country,title,datetime,impact`. Rows that fail to parse are
//! skipped with a warning; only a missing or unreadable file is an error.

use crate::adapters::csv_adapter::parse_timestamp;
use crate::domain::error::TraderError;
use crate::domain::news::{Impact, NewsEvent};
use crate::ports::news_port::NewsFeed;
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;

pub struct CsvNewsFeed {
    path: PathBuf,
}

impl CsvNewsFeed {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl NewsFeed for CsvNewsFeed {
    fn fetch(&self) -> Result<Vec<NewsEvent>, TraderError> {
        let content =
            fs::read_to_string(&self.path).map_err(|e| TraderError::NewsFeedUnavailable {
                reason: format!("failed to read {}: {}", self.path.display(), e),
            })?;

        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(content.as_bytes());
        let mut events = Vec::new();
        let mut skipped = 0usize;

        for record in rdr.records() {
            let Ok(record) = record else {
                skipped += 1;
                continue;
            };
            let parsed = (|| {
                let country = record.get(0).filter(|s| !s.is_empty())?;
                let title = record.get(1)?;
                let datetime = parse_timestamp(record.get(2)?)?;
                let impact = Impact::parse(record.get(3)?)?;
                Some(NewsEvent {
                    country: country.to_string(),
                    title: title.to_string(),
                    datetime,
                    impact,
                })
            })();
            match parsed {
                Some(event) => events.push(event),
                None => skipped += 1,
            }
        }

        if skipped > 0 {
            warn!(
                "{}: skipped {} unparsable calendar rows",
                self.path.display(),
                skipped
            );
        }
        debug!("{}: {} calendar events", self.path.display(), events.len());
        events.sort_by_key(|e| e.datetime);
        Ok(events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::news::NewsBlackout;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn write_calendar(content: &str) -> (TempDir, PathBuf) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("calendar.csv");
        fs::write(&path, content).unwrap();
        (dir, path)
    }

    #[test]
    fn fetch_reads_events_and_skips_bad_rows() {
        let (_dir, path) = write_calendar(
            "country,title,datetime,impact\n\
             USD,Non-Farm Payrolls,2024-03-08 13:30:00,High\n\
             EUR,ECB Press Conference,2024-03-07 13:45:00,high\n\
             USD,Broken Row,not a date,High\n\
             JPY,Unknown Impact,2024-03-08 00:50:00,Severe\n\
             gbp,Retail Sales,2024-03-08 07:00:00,Medium\n",
        );
        let events = CsvNewsFeed::new(path).fetch().unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].title, "ECB Press Conference");
        assert_eq!(events[0].impact, Impact::High);
        assert_eq!(events[1].country, "gbp");
        assert_eq!(events[1].impact, Impact::Medium);
        assert_eq!(
            events[2].datetime,
            NaiveDate::from_ymd_opt(2024, 3, 8)
                .unwrap()
                .and_hms_opt(13, 30, 0)
                .unwrap()
        );
    }

    #[test]
    fn country_names_reach_the_blackout() {
        let (_dir, path) = write_calendar(
            "country,title,datetime,impact\n\
             United States,NFP,2024-03-04 08:00:30,High\n",
        );
        let events = CsvNewsFeed::new(path).fetch().unwrap();
        assert_eq!(events[0].country, "United States");

        let now = NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap();
        let mut blackout = NewsBlackout::from_events(events);
        assert!(blackout.should_close(now, "XAUUSD", 1));
    }

    #[test]
    fn empty_calendar_is_ok() {
        let (_dir, path) = write_calendar("country,title,datetime,impact\n");
        assert!(CsvNewsFeed::new(path).fetch().unwrap().is_empty());
    }

    #[test]
    fn missing_file_is_feed_failure() {
        let feed = CsvNewsFeed::new(PathBuf::from("/nonexistent/calendar.csv"));
        assert!(matches!(
            feed.fetch(),
            Err(TraderError::NewsFeedUnavailable { .. })
        ));
    }
}
