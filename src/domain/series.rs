//! Date-indexed series and the raw data table.
//!
//! A [`TimeSeries`] always holds exactly one value per date. Price series and
//! every engine-derived series additionally have strictly increasing dates;
//! strategy output is not trusted to and gets realigned by the engine.

use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    dates: Vec<NaiveDate>,
    values: Vec<f64>,
}

impl TimeSeries {
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (NaiveDate, f64)>,
    {
        let (dates, values) = points.into_iter().unzip();
        Self { dates, values }
    }

    /// Builds a series over `index`. Callers guarantee `values.len() == index.len()`.
    pub(crate) fn on_index(index: &[NaiveDate], values: Vec<f64>) -> Self {
        debug_assert_eq!(index.len(), values.len());
        Self {
            dates: index.to_vec(),
            values,
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn first(&self) -> Option<(NaiveDate, f64)> {
        Some((*self.dates.first()?, *self.values.first()?))
    }

    pub fn last(&self) -> Option<(NaiveDate, f64)> {
        Some((*self.dates.last()?, *self.values.last()?))
    }

    pub fn iter(&self) -> impl Iterator<Item = (NaiveDate, f64)> + '_ {
        self.dates.iter().copied().zip(self.values.iter().copied())
    }

    /// Same dates, values transformed pointwise.
    pub fn map_values<F>(&self, f: F) -> Self
    where
        F: Fn(f64) -> f64,
    {
        Self {
            dates: self.dates.clone(),
            values: self.values.iter().map(|&v| f(v)).collect(),
        }
    }

    pub fn is_strictly_increasing(&self) -> bool {
        self.dates.windows(2).all(|w| w[0] < w[1])
    }
}

/// Full provider rows aligned one-to-one with the price series.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    pub symbol: String,
    pub bars: Vec<OhlcvBar>,
}

impl RawTable {
    pub fn new(symbol: impl Into<String>, bars: Vec<OhlcvBar>) -> Self {
        Self {
            symbol: symbol.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn dates(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.bars.iter().map(|b| b.date)
    }

    pub fn column<F>(&self, f: F) -> Vec<f64>
    where
        F: Fn(&OhlcvBar) -> f64,
    {
        self.bars.iter().map(f).collect()
    }
}
