//! Candle representation and per-bar market snapshots.

use chrono::NaiveDateTime;
use std::collections::VecDeque;

/// Number of bars in the lookback window used for the percentage change,
/// the high/low range, and the rolling change history.
pub const LOOKBACK_BARS: usize = 24;

/// One OHLCV sample. Immutable once produced by the data source; sequences
/// must be ordered by timestamp ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct Candle {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

impl Candle {
    /// A candle with a zero, negative, or non-finite price cannot be priced
    /// against; such candles are skipped by the simulator.
    pub fn is_valid(&self) -> bool {
        let prices = [self.open, self.high, self.low, self.close];
        prices.iter().all(|p| p.is_finite() && *p > 0.0) && self.volume >= 0.0
    }
}

/// Derived per-bar view consumed by the decision pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub price: f64,
    pub volume: f64,
    /// Percentage change of the close versus the close `LOOKBACK_BARS` ago
    /// (or the oldest close seen when fewer bars exist).
    pub change_pct: f64,
    /// (window high - window low) / window low, in percent.
    pub range_pct: f64,
    /// Per-bar close-to-close percentage changes, oldest first, bounded at
    /// `LOOKBACK_BARS` samples.
    pub recent_changes: Vec<f64>,
}

/// Rolling state that turns a candle stream into [`MarketSnapshot`]s.
///
/// Owned by one simulation run; skipped candles must simply not be pushed,
/// which leaves every window untouched.
#[derive(Debug, Clone)]
pub struct SnapshotBuilder {
    lookback: usize,
    closes: VecDeque<f64>,
    highs: VecDeque<f64>,
    lows: VecDeque<f64>,
    changes: VecDeque<f64>,
}

impl SnapshotBuilder {
    pub fn new(lookback: usize) -> Self {
        SnapshotBuilder {
            lookback,
            // One extra close so the front is the close `lookback` bars ago.
            closes: VecDeque::with_capacity(lookback + 1),
            highs: VecDeque::with_capacity(lookback + 1),
            lows: VecDeque::with_capacity(lookback + 1),
            changes: VecDeque::with_capacity(lookback),
        }
    }

    /// Fold the next candle into the rolling windows and return its snapshot.
    pub fn push(&mut self, candle: &Candle) -> MarketSnapshot {
        if let Some(&last_close) = self.closes.back() {
            let change = (candle.close - last_close) / last_close * 100.0;
            if self.changes.len() == self.lookback {
                self.changes.pop_front();
            }
            self.changes.push_back(change);
        }

        if self.closes.len() == self.lookback + 1 {
            self.closes.pop_front();
            self.highs.pop_front();
            self.lows.pop_front();
        }
        self.closes.push_back(candle.close);
        self.highs.push_back(candle.high);
        self.lows.push_back(candle.low);

        let reference_close = self.closes.front().copied().unwrap_or(candle.close);
        let change_pct = (candle.close - reference_close) / reference_close * 100.0;

        let window_high = self.highs.iter().cloned().fold(f64::MIN, f64::max);
        let window_low = self.lows.iter().cloned().fold(f64::MAX, f64::min);
        let range_pct = (window_high - window_low) / window_low * 100.0;

        MarketSnapshot {
            price: candle.close,
            volume: candle.volume,
            change_pct,
            range_pct,
            recent_changes: self.changes.iter().cloned().collect(),
        }
    }
}
