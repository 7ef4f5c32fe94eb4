//! Per-symbol position ledger with FIFO lot accounting.

use crate::domain::error::SigtraderError;
use chrono::NaiveDateTime;
use std::collections::VecDeque;

/// Sub-dust tolerance for float lot arithmetic.
const SIZE_EPSILON: f64 = 1e-9;

/// One lot within a position. Entries are immutable once created; they are
/// only ever fully or partially consumed by sells.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub size: f64,
    pub price: f64,
    pub timestamp: NaiveDateTime,
}

/// What a sell consumed, for realized-PnL accounting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SellReceipt {
    /// FIFO cost of the consumed lots (sum of consumed size × entry price).
    pub cost_basis: f64,
}

/// Open entries for one symbol, oldest first, plus the position-lifetime
/// state the exit evaluator needs (high-water mark, opening time, ladder
/// bookkeeping). Mutated only by confirmed executions.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionLedger {
    entries: VecDeque<Entry>,
    net_size: f64,
    mean_price: f64,
    highest_price_since_entry: f64,
    opened_at: Option<NaiveDateTime>,
    /// Total size bought since the position was opened; the take-profit
    /// ladder sizes rungs against this, not the shrinking net size.
    lifetime_size: f64,
    rungs_fired: Vec<bool>,
}

impl PositionLedger {
    pub fn new(rung_count: usize) -> Self {
        PositionLedger {
            entries: VecDeque::new(),
            net_size: 0.0,
            mean_price: 0.0,
            highest_price_since_entry: 0.0,
            opened_at: None,
            lifetime_size: 0.0,
            rungs_fired: vec![false; rung_count],
        }
    }

    pub fn net_size(&self) -> f64 {
        self.net_size
    }

    /// Cost-weighted average price of the remaining entries; 0.0 when flat.
    pub fn mean_price(&self) -> f64 {
        self.mean_price
    }

    pub fn highest_price_since_entry(&self) -> f64 {
        self.highest_price_since_entry
    }

    pub fn opened_at(&self) -> Option<NaiveDateTime> {
        self.opened_at
    }

    pub fn lifetime_size(&self) -> f64 {
        self.lifetime_size
    }

    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.entries.iter()
    }

    pub fn is_open(&self) -> bool {
        self.net_size > 0.0
    }

    pub fn rung_fired(&self, index: usize) -> bool {
        self.rungs_fired.get(index).copied().unwrap_or(false)
    }

    pub fn mark_rung_fired(&mut self, index: usize) {
        if let Some(flag) = self.rungs_fired.get_mut(index) {
            *flag = true;
        }
    }

    /// Append a new lot and refresh the derived state.
    pub fn record_buy(&mut self, size: f64, price: f64, timestamp: NaiveDateTime) {
        if self.entries.is_empty() {
            self.opened_at = Some(timestamp);
            self.lifetime_size = 0.0;
        }
        self.entries.push_back(Entry {
            size,
            price,
            timestamp,
        });
        self.lifetime_size += size;
        self.highest_price_since_entry = self.highest_price_since_entry.max(price);
        self.recompute();
        self.check_invariant();
    }

    /// Consume lots oldest-first. Refuses to oversell: the sizing stage must
    /// clamp before calling, so an oversell here is a logic bug.
    pub fn record_sell(&mut self, size: f64) -> Result<SellReceipt, SigtraderError> {
        if size > self.net_size + SIZE_EPSILON {
            return Err(SigtraderError::InsufficientPosition {
                requested: size,
                held: self.net_size,
            });
        }

        let mut remaining = size;
        let mut cost_basis = 0.0;
        while remaining > SIZE_EPSILON {
            let entry = match self.entries.front_mut() {
                Some(e) => e,
                None => break,
            };
            if entry.size <= remaining + SIZE_EPSILON {
                remaining -= entry.size;
                cost_basis += entry.size * entry.price;
                self.entries.pop_front();
            } else {
                entry.size -= remaining;
                cost_basis += remaining * entry.price;
                remaining = 0.0;
            }
        }

        self.recompute();
        if self.entries.is_empty() {
            self.close_out();
        }
        self.check_invariant();

        Ok(SellReceipt { cost_basis })
    }

    /// Raise the high-water mark; called every bar regardless of trades.
    pub fn update_mark(&mut self, current_price: f64) {
        if self.net_size > 0.0 {
            self.highest_price_since_entry = self.highest_price_since_entry.max(current_price);
        }
    }

    fn recompute(&mut self) {
        self.net_size = self.entries.iter().map(|e| e.size).sum();
        self.mean_price = if self.net_size > 0.0 {
            let cost: f64 = self.entries.iter().map(|e| e.size * e.price).sum();
            cost / self.net_size
        } else {
            0.0
        };
    }

    fn close_out(&mut self) {
        self.net_size = 0.0;
        self.mean_price = 0.0;
        self.highest_price_since_entry = 0.0;
        self.opened_at = None;
        self.lifetime_size = 0.0;
        self.rungs_fired.iter_mut().for_each(|f| *f = false);
    }

    fn check_invariant(&self) {
        debug_assert!(self.net_size >= 0.0, "net size went negative");
        let entry_sum: f64 = self.entries.iter().map(|e| e.size).sum();
        debug_assert!(
            (self.net_size - entry_sum).abs() < SIZE_EPSILON,
            "net size {} diverged from entry sum {}",
            self.net_size,
            entry_sum
        );
    }
}
