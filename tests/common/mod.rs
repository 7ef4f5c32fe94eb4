#![allow(dead_code)]

use chrono::{NaiveDate, NaiveDateTime};
use sigtrader::domain::candle::Candle;
use sigtrader::domain::error::SignalError;
use sigtrader::domain::risk::{RiskConfig, SizeUnit, StopLossRules, TakeProfitRung};
use sigtrader::ports::signal_port::{SignalContext, SignalPort};
use std::collections::HashMap;

pub fn ts(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

pub fn candle(hour: u32, open: f64, close: f64) -> Candle {
    Candle {
        timestamp: ts(hour),
        open,
        high: open.max(close),
        low: open.min(close),
        close,
        volume: 1000.0,
    }
}

/// Candles where each bar opens at the previous close.
pub fn candles_from_closes(closes: &[f64]) -> Vec<Candle> {
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| {
            let open = if i == 0 { close } else { closes[i - 1] };
            candle(i as u32, open, close)
        })
        .collect()
}

/// Risk configuration with the gate held open so scripted signals drive the
/// run deterministically.
pub fn open_gate_config() -> RiskConfig {
    RiskConfig {
        base_threshold: 0.0,
        volatility_multiplier: 1.0,
        min_threshold: 0.0,
        max_threshold: 0.0,
        size_unit: SizeUnit::AssetUnits,
        min_position_size: 0.1,
        max_position_size: 50.0,
        risk_per_trade: 0.5,
        kelly_fraction: 1.0,
        stop_loss: StopLossRules {
            initial_pct: 8.0,
            trailing_pct: 3.0,
            // High activation keeps the initial stop in charge unless a test
            // opts in to trailing behavior.
            activation_pct: 100.0,
        },
        take_profit: vec![],
        max_holding_period: None,
        min_confidence: 60,
        trading_fee_pct: 0.1,
        initial_balance: 10_000.0,
    }
}

pub fn two_rung_ladder() -> Vec<TakeProfitRung> {
    vec![
        TakeProfitRung {
            target_pct: 2.0,
            fraction: 0.5,
        },
        TakeProfitRung {
            target_pct: 5.0,
            fraction: 1.0,
        },
    ]
}

/// Scripted signal source keyed by call index; unscripted calls HOLD.
pub struct ScriptedSignal {
    replies: HashMap<usize, Result<String, SignalError>>,
    pub calls: usize,
}

impl ScriptedSignal {
    pub fn new() -> Self {
        ScriptedSignal {
            replies: HashMap::new(),
            calls: 0,
        }
    }

    pub fn buy_at(mut self, call: usize, size: f64, confidence: u8) -> Self {
        self.replies.insert(
            call,
            Ok(format!(
                "Action: BUY\nAmount: {size}\nConfidence: {confidence}\nReasoning: scripted buy"
            )),
        );
        self
    }

    pub fn sell_at(mut self, call: usize, size: f64, confidence: u8) -> Self {
        self.replies.insert(
            call,
            Ok(format!(
                "Action: SELL\nAmount: {size}\nConfidence: {confidence}\nReasoning: scripted sell"
            )),
        );
        self
    }

    pub fn error_at(mut self, call: usize, error: SignalError) -> Self {
        self.replies.insert(call, Err(error));
        self
    }
}

impl SignalPort for ScriptedSignal {
    fn get_signal(&mut self, _context: &SignalContext<'_>) -> Result<String, SignalError> {
        let call = self.calls;
        self.calls += 1;
        self.replies.get(&call).cloned().unwrap_or_else(|| {
            Ok("Action: HOLD\nAmount: 0\nConfidence: 90\nReasoning: nothing scripted".to_string())
        })
    }
}
