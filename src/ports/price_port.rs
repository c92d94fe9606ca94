//! Price data access port.

use crate::domain::error::SigtraderError;
use crate::domain::series::{RawTable, TimeSeries};
use chrono::NaiveDate;

pub trait PriceSource {
    /// Clean price series for `symbol` between `start` and `end` (both
    /// inclusive, `None` meaning "latest available") plus the provider rows
    /// on the same dates.
    ///
    /// Fails with [`SigtraderError::NoData`] when nothing usable is found.
    fn load_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: Option<NaiveDate>,
        adjust: bool,
    ) -> Result<(TimeSeries, RawTable), SigtraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError>;

    /// First date, last date and row count stored for `symbol`.
    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SigtraderError>;
}

/// True when `date` lies inside the inclusive request window.
pub fn in_window(date: NaiveDate, start: NaiveDate, end: Option<NaiveDate>) -> bool {
    date >= start && end.is_none_or(|e| date <= e)
}
