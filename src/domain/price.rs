//! Turning provider rows into a clean price series.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::series::{RawTable, TimeSeries};
use tracing::debug;

/// Drop gaps and non-positive prices, sort by date, keep the last usable row
/// for a repeated date, then split into the price series and the table
/// re-aligned to the same dates.
///
/// With `adjust` set the whole series uses adjusted closes as soon as any
/// row carries one; rows without an adjusted close are then gaps. Only a
/// source with no adjusted closes at all falls back to the raw close.
///
/// Returns [`SigtraderError::NoData`] when no usable row remains.
pub fn clean_bars(
    symbol: &str,
    mut bars: Vec<OhlcvBar>,
    adjust: bool,
) -> Result<(TimeSeries, RawTable), SigtraderError> {
    let received = bars.len();
    let adjusted = uses_adjusted(&bars, adjust);

    bars.retain(|b| b.has_valid_price(adjusted));

    // Stable sort keeps provider order among equal dates, so the last one wins below.
    bars.sort_by_key(|b| b.date);
    let mut deduped: Vec<OhlcvBar> = Vec::with_capacity(bars.len());
    for bar in bars {
        match deduped.last_mut() {
            Some(prev) if prev.date == bar.date => *prev = bar,
            _ => deduped.push(bar),
        }
    }

    if deduped.is_empty() {
        return Err(SigtraderError::NoData {
            symbol: symbol.to_string(),
        });
    }

    let dropped = received - deduped.len();
    if dropped > 0 {
        debug!(symbol, dropped, adjusted, "dropped unusable price rows");
    }

    let prices = TimeSeries::from_points(deduped.iter().map(|b| (b.date, b.price(adjusted))));
    Ok((prices, RawTable::new(symbol, deduped)))
}

fn uses_adjusted(bars: &[OhlcvBar], adjust: bool) -> bool {
    adjust && bars.iter().any(|b| b.adj_close.is_some())
}
