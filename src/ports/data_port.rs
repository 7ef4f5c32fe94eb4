//! Market data access port trait.

use crate::domain::candle::Candle;
use crate::domain::error::SigtraderError;
use chrono::NaiveDateTime;

pub trait DataPort {
    /// Fetch candles for one symbol, timestamp ascending, within the range.
    fn fetch_candles(
        &self,
        symbol: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Candle>, SigtraderError>;

    fn list_symbols(&self) -> Result<Vec<String>, SigtraderError>;
}
