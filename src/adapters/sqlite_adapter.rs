//! SQLite price adapter.

use crate::domain::error::SigtraderError;
use crate::domain::ohlcv::OhlcvBar;
use crate::domain::price::clean_bars;
use crate::domain::series::{RawTable, TimeSeries};
use crate::ports::config_port::ConfigPort;
use crate::ports::price_port::PriceSource;
use chrono::NaiveDate;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use tracing::debug;

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn query_err(e: rusqlite::Error) -> SigtraderError {
    SigtraderError::DatabaseQuery {
        reason: e.to_string(),
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, SigtraderError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| SigtraderError::Database {
        reason: format!("invalid stored date {value}: {e}"),
    })
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SigtraderError> {
        let db_path =
            config
                .get_string("data", "path")
                .ok_or_else(|| SigtraderError::ConfigMissing {
                    section: "data".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("data", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool =
            Pool::builder()
                .max_size(pool_size)
                .build(manager)
                .map_err(|e: r2d2::Error| SigtraderError::Database {
                    reason: e.to_string(),
                })?;

        debug!(path = %db_path, pool_size, "opened sqlite price store");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, SigtraderError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| SigtraderError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, SigtraderError> {
        self.pool
            .get()
            .map_err(|e: r2d2::Error| SigtraderError::Database {
                reason: e.to_string(),
            })
    }

    pub fn initialize_schema(&self) -> Result<(), SigtraderError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS ohlcv (
                    symbol TEXT NOT NULL,
                    date TEXT NOT NULL,
                    open REAL,
                    high REAL,
                    low REAL,
                    close REAL,
                    adj_close REAL,
                    volume INTEGER NOT NULL DEFAULT 0,
                    PRIMARY KEY (symbol, date)
                );
                CREATE INDEX IF NOT EXISTS idx_ohlcv_date ON ohlcv(date);",
            )
            .map_err(query_err)
    }

    pub fn insert_bars(&self, symbol: &str, bars: &[OhlcvBar]) -> Result<(), SigtraderError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        for bar in bars {
            // NaN has no SQL representation; store gaps as NULL.
            let finite = |v: f64| v.is_finite().then_some(v);
            tx.execute(
                "INSERT OR REPLACE INTO ohlcv (symbol, date, open, high, low, close, adj_close, volume)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    symbol,
                    bar.date.format(DATE_FORMAT).to_string(),
                    finite(bar.open),
                    finite(bar.high),
                    finite(bar.low),
                    finite(bar.close),
                    bar.adj_close.and_then(finite),
                    bar.volume
                ],
            )
            .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)
    }
}

impl PriceSource for SqliteAdapter {
    fn load_prices(
        &self,
        symbol: &str,
        start: NaiveDate,
        end: Option<NaiveDate>,
        adjust: bool,
    ) -> Result<(TimeSeries, RawTable), SigtraderError> {
        let conn = self.conn()?;

        let start_str = start.format(DATE_FORMAT).to_string();
        // ISO dates compare lexically; "9999-12-31" stands in for an open end.
        let end_str = end
            .map(|e| e.format(DATE_FORMAT).to_string())
            .unwrap_or_else(|| "9999-12-31".to_string());

        let query = "SELECT date, open, high, low, close, adj_close, volume
                     FROM ohlcv
                     WHERE symbol = ?1 AND date >= ?2 AND date <= ?3
                     ORDER BY date ASC";

        let mut stmt = conn.prepare(query).map_err(query_err)?;

        let rows = stmt
            .query_map(params![symbol, start_str, end_str], |row| {
                let date_str: String = row.get(0)?;
                let date = NaiveDate::parse_from_str(&date_str, DATE_FORMAT).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        date_str.len(),
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?;
                let price = |i: usize| -> rusqlite::Result<f64> {
                    Ok(row.get::<_, Option<f64>>(i)?.unwrap_or(f64::NAN))
                };
                Ok(OhlcvBar {
                    date,
                    open: price(1)?,
                    high: price(2)?,
                    low: price(3)?,
                    close: price(4)?,
                    adj_close: row.get(5)?,
                    volume: row.get(6)?,
                })
            })
            .map_err(query_err)?;

        let mut bars = Vec::new();
        for row in rows {
            bars.push(row.map_err(query_err)?);
        }

        clean_bars(symbol, bars, adjust)
    }

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM ohlcv ORDER BY symbol")
            .map_err(query_err)?;

        let rows = stmt.query_map([], |row| row.get(0)).map_err(query_err)?;

        let mut symbols = Vec::new();
        for row in rows {
            symbols.push(row.map_err(query_err)?);
        }

        Ok(symbols)
    }

    fn data_range(
        &self,
        symbol: &str,
    ) -> Result<Option<(NaiveDate, NaiveDate, usize)>, SigtraderError> {
        let conn = self.conn()?;

        let query = "SELECT MIN(date), MAX(date), COUNT(*) FROM ohlcv WHERE symbol = ?1";

        let result: (Option<String>, Option<String>, i64) = conn
            .query_row(query, params![symbol], |row| {
                Ok((row.get(0)?, row.get(1)?, row.get(2)?))
            })
            .map_err(query_err)?;

        match result {
            (Some(min_str), Some(max_str), count) if count > 0 => Ok(Some((
                parse_date(&min_str)?,
                parse_date(&max_str)?,
                count as usize,
            ))),
            _ => Ok(None),
        }
    }
}
