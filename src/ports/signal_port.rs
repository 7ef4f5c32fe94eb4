//! External signal source port trait.

use crate::domain::candle::MarketSnapshot;
use crate::domain::error::SignalError;

/// Market context handed to the signal collaborator for one bar.
#[derive(Debug, Clone, PartialEq)]
pub struct SignalContext<'a> {
    pub symbol: &'a str,
    pub snapshot: &'a MarketSnapshot,
    /// Currently held size in asset units.
    pub position: f64,
    /// Mean entry price of the open position, if any.
    pub entry_price: Option<f64>,
}

/// One bounded-latency call per bar. Implementations must enforce their own
/// hard timeout; the pipeline maps any error to a HOLD for that bar only.
pub trait SignalPort {
    fn get_signal(&mut self, context: &SignalContext<'_>) -> Result<String, SignalError>;
}
