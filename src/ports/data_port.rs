//! Data access port trait.

use crate::domain::error::TrendfolioError;
use crate::domain::ohlcv::OhlcvBar;
use chrono::NaiveDate;

pub trait DataPort {
    /// Daily bars for `code`, ascending, with both bounds inclusive when given.
    fn fetch_ohlcv(
        &self,
        code: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<OhlcvBar>, TrendfolioError>;

    fn list_symbols(&self) -> Result<Vec<String>, TrendfolioError>;
}
