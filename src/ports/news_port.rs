//! Economic calendar port.

use crate::domain::error::TraderError;
use crate::domain::news::NewsEvent;

/// Pull interface for scheduled news events.
pub trait NewsFeed {
    fn fetch(&self) -> Result<Vec<NewsEvent>, TraderError>;
}
