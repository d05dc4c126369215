//! Historical bar source port.

use crate::domain::bar::Bar;
use crate::domain::error::TraderError;
use chrono::NaiveDateTime;

/// Pull interface for historical bars.
///
/// Implementations return bars ordered by timestamp within `[start, end]`.
/// An empty result is legal; duplicate timestamps are an error.
pub trait BarSource {
    fn get_historical(
        &self,
        symbol: &str,
        timeframe: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, TraderError>;
}
