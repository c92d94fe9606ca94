//! OHLCV bar representation.

use chrono::NaiveDate;

/// One row of provider data. Price cells the provider left empty are `NaN`.
#[derive(Debug, Clone, PartialEq)]
pub struct OhlcvBar {
    pub date: NaiveDate,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: Option<f64>,
    pub volume: i64,
}

impl OhlcvBar {
    /// Close used for the price series. With `adjusted` set, a bar without an
    /// adjusted close is a gap; it never borrows the raw close.
    pub fn price(&self, adjusted: bool) -> f64 {
        if adjusted {
            self.adj_close.unwrap_or(f64::NAN)
        } else {
            self.close
        }
    }

    /// A bar is usable when its chosen close is a finite, strictly positive number.
    pub fn has_valid_price(&self, adjusted: bool) -> bool {
        let p = self.price(adjusted);
        p.is_finite() && p > 0.0
    }
}
