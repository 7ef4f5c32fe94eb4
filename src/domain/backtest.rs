//! Backtest simulator: replays candles through the decision pipeline.
//!
//! Fill conventions: signal-driven trades fill at the next candle's open;
//! forced exits fill at the triggering candle's open. A proportional fee is
//! charged on every fill. Buys that the balance cannot cover are skipped
//! with a warning.

use crate::domain::candle::{Candle, SnapshotBuilder, LOOKBACK_BARS};
use crate::domain::decision::{Action, DecisionReason};
use crate::domain::error::SigtraderError;
use crate::domain::ledger::PositionLedger;
use crate::domain::pipeline;
use crate::domain::risk::RiskConfig;
use crate::ports::signal_port::SignalPort;
use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;

/// Immutable record of one executed fill.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Fill {
    pub timestamp: NaiveDateTime,
    pub symbol: String,
    pub action: Action,
    pub size: f64,
    pub price: f64,
    pub fee: f64,
    /// Net proceeds minus the FIFO cost basis of the consumed lots; 0.0 for
    /// buys.
    pub realized_pnl: f64,
    pub resulting_balance: f64,
    pub resulting_net_size: f64,
    pub reason: DecisionReason,
    pub rationale: String,
}

/// Mutable state of one simulation run. Owns one ledger per symbol; never
/// shared across runs.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub balance: f64,
    pub ledgers: HashMap<String, PositionLedger>,
    pub trades: Vec<Fill>,
    pub peak_value: f64,
    pub max_drawdown: f64,
}

impl SimulationState {
    pub fn new(initial_balance: f64) -> Self {
        SimulationState {
            balance: initial_balance,
            ledgers: HashMap::new(),
            trades: Vec::new(),
            peak_value: initial_balance,
            max_drawdown: 0.0,
        }
    }
}

/// Final result of a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BacktestReport {
    pub initial_balance: f64,
    /// Remaining cash.
    pub final_balance: f64,
    /// Open position marked at the last valid close.
    pub final_position_value: f64,
    pub return_pct: f64,
    pub max_drawdown_pct: f64,
    pub trade_count: usize,
    /// Fraction of closing trades with positive realized profit.
    pub win_rate: f64,
    pub trades: Vec<Fill>,
}

/// Replay `candles` for one symbol and assemble the report.
///
/// Deterministic: the only inputs are the candles, the configuration, and
/// the signal source's replies. Errors out only on internal invariant
/// violations; signal failures and bad candles degrade per bar.
pub fn run_backtest(
    symbol: &str,
    candles: &[Candle],
    signal_port: &mut dyn SignalPort,
    config: &RiskConfig,
) -> Result<BacktestReport, SigtraderError> {
    let mut state = SimulationState::new(config.initial_balance);
    let mut builder = SnapshotBuilder::new(LOOKBACK_BARS);
    let mut last_close = 0.0;

    let SimulationState {
        balance,
        ledgers,
        trades,
        peak_value,
        max_drawdown,
    } = &mut state;
    let ledger = ledgers
        .entry(symbol.to_string())
        .or_insert_with(|| PositionLedger::new(config.take_profit.len()));

    for (index, candle) in candles.iter().enumerate() {
        if !candle.is_valid() {
            eprintln!(
                "warning: skipping candle at {} (missing or non-positive price)",
                candle.timestamp
            );
            continue;
        }
        last_close = candle.close;

        let snapshot = builder.push(candle);
        ledger.update_mark(candle.close);

        let decision = pipeline::decide(
            symbol,
            &snapshot,
            ledger,
            *balance,
            candle.timestamp,
            signal_port,
            config,
        );

        if decision.action != Action::Hold {
            let fill_price = if decision.reason.is_forced_exit() {
                Some(candle.open)
            } else {
                match candles.get(index + 1) {
                    Some(next) if next.is_valid() => Some(next.open),
                    _ => {
                        eprintln!(
                            "warning: no next candle to fill {} signal at {}",
                            decision.action, candle.timestamp
                        );
                        None
                    }
                }
            };

            if let Some(price) = fill_price {
                let notional = price * decision.size;
                let fee = notional * config.trading_fee_pct / 100.0;

                match decision.action {
                    Action::Buy => {
                        let cost = notional + fee;
                        if cost > *balance {
                            eprintln!(
                                "warning: insufficient balance for BUY at {} (needed {:.2}, have {:.2})",
                                candle.timestamp, cost, *balance
                            );
                        } else {
                            *balance -= cost;
                            ledger.record_buy(decision.size, price, candle.timestamp);
                            trades.push(Fill {
                                timestamp: candle.timestamp,
                                symbol: symbol.to_string(),
                                action: Action::Buy,
                                size: decision.size,
                                price,
                                fee,
                                realized_pnl: 0.0,
                                resulting_balance: *balance,
                                resulting_net_size: ledger.net_size(),
                                reason: decision.reason,
                                rationale: decision.rationale.clone(),
                            });
                        }
                    }
                    Action::Sell => {
                        let receipt = ledger.record_sell(decision.size)?;
                        let proceeds = notional - fee;
                        *balance += proceeds;
                        trades.push(Fill {
                            timestamp: candle.timestamp,
                            symbol: symbol.to_string(),
                            action: Action::Sell,
                            size: decision.size,
                            price,
                            fee,
                            realized_pnl: proceeds - receipt.cost_basis,
                            resulting_balance: *balance,
                            resulting_net_size: ledger.net_size(),
                            reason: decision.reason,
                            rationale: decision.rationale.clone(),
                        });
                    }
                    Action::Hold => unreachable!(),
                }
            }
        }

        let value = *balance + ledger.net_size() * candle.close;
        if value > *peak_value {
            *peak_value = value;
        } else if *peak_value > 0.0 {
            let drawdown = (*peak_value - value) / *peak_value;
            if drawdown > *max_drawdown {
                *max_drawdown = drawdown;
            }
        }
    }

    let final_position_value = ledger.net_size() * last_close;
    let final_total = *balance + final_position_value;
    let return_pct = if config.initial_balance > 0.0 {
        (final_total - config.initial_balance) / config.initial_balance * 100.0
    } else {
        0.0
    };

    let closing: Vec<&Fill> = trades.iter().filter(|f| f.action == Action::Sell).collect();
    let win_rate = if closing.is_empty() {
        0.0
    } else {
        closing.iter().filter(|f| f.realized_pnl > 0.0).count() as f64 / closing.len() as f64
    };

    Ok(BacktestReport {
        initial_balance: config.initial_balance,
        final_balance: state.balance,
        final_position_value,
        return_pct,
        max_drawdown_pct: state.max_drawdown * 100.0,
        trade_count: state.trades.len(),
        win_rate,
        trades: state.trades,
    })
}
