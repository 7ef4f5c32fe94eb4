//! Decision value types emitted by the pipeline.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Action {
    Buy,
    Sell,
    Hold,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Action::Buy => write!(f, "BUY"),
            Action::Sell => write!(f, "SELL"),
            Action::Hold => write!(f, "HOLD"),
        }
    }
}

/// Machine-readable cause of a decision, stable across releases for
/// downstream analysis of trade logs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case", tag = "code")]
pub enum DecisionReason {
    /// The external signal drove this decision.
    Signal,
    /// Gate rejected: the move was too small for current volatility.
    BelowThreshold { current: f64, required: f64 },
    /// Signal confidence under the configured floor.
    BelowConfidence { confidence: u8, minimum: u8 },
    /// A sell was requested with nothing held.
    NoPositionToSell,
    /// The external signal source failed for this bar.
    SignalUnavailable,
    /// Forced exits.
    StopLoss,
    TimeExit,
    TakeProfit { rung: usize },
}

impl DecisionReason {
    /// Forced exits take precedence over signal-driven decisions.
    pub fn is_forced_exit(&self) -> bool {
        matches!(
            self,
            DecisionReason::StopLoss | DecisionReason::TimeExit | DecisionReason::TakeProfit { .. }
        )
    }
}

/// One decision per bar: what to do, how much, and why.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Decision {
    pub action: Action,
    /// Non-negative; zero whenever `action` is HOLD.
    pub size: f64,
    /// 0–100.
    pub confidence: u8,
    pub reason: DecisionReason,
    /// Free text: the collaborator's reasoning, or a description of the
    /// gate/risk rejection or forced exit.
    pub rationale: String,
}

impl Decision {
    pub fn hold(reason: DecisionReason, rationale: impl Into<String>) -> Self {
        Decision {
            action: Action::Hold,
            size: 0.0,
            confidence: 0,
            reason,
            rationale: rationale.into(),
        }
    }
}
