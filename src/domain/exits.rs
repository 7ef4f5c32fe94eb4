//! Forced-exit evaluation: stop-loss, time exit, take-profit ladder.
//!
//! Runs every bar a position is open, independent of any new signal.
//! Priority: stop-loss, then time exit, then the lowest unfired ladder rung.
//! At most one forced exit is emitted per bar.

use crate::domain::decision::DecisionReason;
use crate::domain::ledger::PositionLedger;
use crate::domain::risk::RiskConfig;
use chrono::NaiveDateTime;

/// A sell the engine must execute regardless of the signal path.
#[derive(Debug, Clone, PartialEq)]
pub struct ForcedExit {
    pub size: f64,
    pub reason: DecisionReason,
    pub rationale: String,
}

/// Evaluate the exit rules against the current bar.
///
/// Marks a take-profit rung as fired when it emits one, so each rung fires
/// at most once per position lifetime; the flags reset when the ledger
/// closes out.
pub fn evaluate(
    ledger: &mut PositionLedger,
    price: f64,
    now: NaiveDateTime,
    config: &RiskConfig,
) -> Option<ForcedExit> {
    if !ledger.is_open() {
        return None;
    }

    let mean = ledger.mean_price();
    let net = ledger.net_size();
    let highest = ledger.highest_price_since_entry();

    // Stop-loss: trailing once the high-water profit reached the activation
    // threshold, the fixed initial stop before that. Armed is sticky because
    // the high-water mark never falls.
    let rules = &config.stop_loss;
    let high_water_profit_pct = (highest - mean) / mean * 100.0;
    let stop_price = if high_water_profit_pct >= rules.activation_pct {
        highest * (1.0 - rules.trailing_pct / 100.0)
    } else {
        mean * (1.0 - rules.initial_pct / 100.0)
    };
    if price <= stop_price {
        return Some(ForcedExit {
            size: net,
            reason: DecisionReason::StopLoss,
            rationale: format!(
                "price {price:.4} breached stop {stop_price:.4} (mean entry {mean:.4})"
            ),
        });
    }

    // Time exit.
    if let (Some(period), Some(opened_at)) = (config.max_holding_period, ledger.opened_at()) {
        if now - opened_at >= period {
            return Some(ForcedExit {
                size: net,
                reason: DecisionReason::TimeExit,
                rationale: format!("held since {opened_at}, limit {period} reached"),
            });
        }
    }

    // Take-profit ladder: lowest unfired rung first; one rung per bar.
    let profit_pct = (price - mean) / mean * 100.0;
    for (index, rung) in config.take_profit.iter().enumerate() {
        if ledger.rung_fired(index) || profit_pct < rung.target_pct {
            continue;
        }
        // Size against the lifetime entry size so laddering does not
        // compound, then clamp to what is still held.
        let size = (rung.fraction * ledger.lifetime_size()).min(net);
        if size <= 0.0 {
            continue;
        }
        ledger.mark_rung_fired(index);
        return Some(ForcedExit {
            size,
            reason: DecisionReason::TakeProfit { rung: index },
            rationale: format!(
                "profit {profit_pct:.2}% reached rung {} target {:.2}%",
                index, rung.target_pct
            ),
        });
    }

    None
}
