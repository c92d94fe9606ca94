//! In-memory price source.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price::clean_bars;
use crate::domain::series::{RawTable, TimeSeries};
use crate::ports::price_port::{PriceSource, in_window};
use chrono::NaiveDate;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct MemoryPriceSource {
    data: BTreeMap<String, Vec<OhlcvBar>>,
}

impl MemoryPriceSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bars(mut self, symbol: &str, bars: Vec<OhlcvBar>) -> Self {
        self.insert(symbol, bars);
        self
    }

    /// Bars with open = high = low = close and no adjusted close.
    pub fn with_closes(self, symbol: &str, closes: &[(NaiveDate, f64)]) -> Self {
        let bars = closes
            .iter()
            .map(|&(date, close)| OhlcvBar {
                date,
                open: close,
                high: close,
                low: close,
                close,
                adj_close: None,
                volume: 0,
            })
            .collect();
        self.with_bars(symbol, bars)
    }

    pub fn insert(&mut self, symbol: &str, bars: Vec<OhlcvBar>) {
        self.data.insert(symbol.to_string(), bars);
    }
}

impl PriceSource for MemoryPriceSource {
    fn load_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: Option<NaiveDate>,
        adjust: bool,
    ) -> Result<(TimeSeries, RawTable), SigtraderError> {
        let bars = self
            .data
            .get(symbol)
            .map(|bars| {
                bars.iter()
                    .filter(|b| in_window(b.date, start, end))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        clean_bars(symbol, bars, adjust)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        Ok(self.data.keys().cloned().collect())
    }

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SigtraderError> {
        let Some(bars) = self.data.get(symbol) else {
            return Ok(None);
        };
        let min = bars.iter().map(|b| b.date).min();
        let max = bars.iter().map(|b| b.date).max();
        Ok(min.zip(max).map(|(min, max)| (min, max, bars.len())))
    }
}
