//! Data access port trait.
//!
//! Implementations return bars for one security in ascending date order.
//! Missing trading days are simply absent.

use crate::domain::error::ChartError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    fn fetch_ohlcv(
        &self,
        code: &str,
        exchange: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, ChartError>;

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, ChartError>;
}
