//! Per-bar decision pipeline.
//!
//! Stages, in order: gate check, external signal, size and risk limits,
//! forced-exit override. Always terminates with exactly one [`Decision`];
//! the external signal is called at most once per bar and never retried.

use crate::domain::candle::MarketSnapshot;
use crate::domain::decision::{Action, Decision, DecisionReason};
use crate::domain::exits;
use crate::domain::gate;
use crate::domain::ledger::PositionLedger;
use crate::domain::risk::RiskConfig;
use crate::domain::signal::parse_signal;
use crate::domain::sizing;
use crate::domain::volatility::volatility_ratio;
use crate::ports::signal_port::{SignalContext, SignalPort};
use chrono::NaiveDateTime;

/// Produce the decision for one bar.
///
/// The exit evaluator runs regardless of the gate outcome: a forced exit
/// replaces any HOLD or BUY candidate. It yields only to a signal-driven
/// SELL that already closes at least as much as the forced exit would.
pub fn decide(
    symbol: &str,
    snapshot: &MarketSnapshot,
    ledger: &mut PositionLedger,
    balance: f64,
    now: NaiveDateTime,
    signal_port: &mut dyn SignalPort,
    config: &RiskConfig,
) -> Decision {
    let candidate = signal_candidate(symbol, snapshot, ledger, balance, signal_port, config);

    match exits::evaluate(ledger, snapshot.price, now, config) {
        Some(exit) => {
            let closes_position =
                candidate.action == Action::Sell && candidate.size >= ledger.net_size();
            if closes_position {
                candidate
            } else {
                Decision {
                    action: Action::Sell,
                    size: exit.size,
                    confidence: 100,
                    reason: exit.reason,
                    rationale: exit.rationale,
                }
            }
        }
        None => candidate,
    }
}

fn signal_candidate(
    symbol: &str,
    snapshot: &MarketSnapshot,
    ledger: &PositionLedger,
    balance: f64,
    signal_port: &mut dyn SignalPort,
    config: &RiskConfig,
) -> Decision {
    let volatility = volatility_ratio(&snapshot.recent_changes);
    let gate = gate::check(snapshot.change_pct, volatility, config);
    if !gate.act {
        return Decision::hold(
            DecisionReason::BelowThreshold {
                current: gate.current,
                required: gate.required,
            },
            format!(
                "price change ({:.3}%) below dynamic threshold ({:.3}%)",
                gate.current, gate.required
            ),
        );
    }

    let context = SignalContext {
        symbol,
        snapshot,
        position: ledger.net_size(),
        entry_price: ledger.is_open().then(|| ledger.mean_price()),
    };
    let raw = match signal_port.get_signal(&context) {
        Ok(text) => text,
        Err(err) => {
            return Decision::hold(DecisionReason::SignalUnavailable, err.to_string());
        }
    };

    let parsed = parse_signal(&raw);
    let outcome = sizing::apply_risk_limits(
        parsed.action,
        parsed.size,
        parsed.confidence,
        balance,
        ledger.net_size(),
        snapshot.price,
        config,
    );

    match outcome.demotion {
        Some(reason @ DecisionReason::BelowConfidence { confidence, minimum }) => Decision::hold(
            reason,
            format!("confidence ({confidence}%) below minimum threshold ({minimum}%)"),
        ),
        Some(reason @ DecisionReason::NoPositionToSell) => {
            Decision::hold(reason, "cannot sell: no current position")
        }
        Some(reason) => Decision::hold(reason, parsed.reasoning),
        None => Decision {
            action: outcome.action,
            size: outcome.size,
            confidence: parsed.confidence,
            reason: DecisionReason::Signal,
            rationale: parsed.reasoning,
        },
    }
}
