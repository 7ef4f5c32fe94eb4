//! Decision gate: is the current move significant enough to act on?

use crate::domain::risk::RiskConfig;

/// Outcome of the gate check. `current` and `required` are kept for
/// diagnostics and for the below-threshold HOLD rationale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GateCheck {
    pub act: bool,
    pub current: f64,
    pub required: f64,
}

/// Compare the absolute percentage change against the volatility-scaled
/// threshold. Pure: identical inputs always produce identical output.
pub fn check(change_pct: f64, volatility: f64, config: &RiskConfig) -> GateCheck {
    let raw = config.base_threshold * config.volatility_multiplier * volatility;
    let required = raw.clamp(config.min_threshold, config.max_threshold);

    GateCheck {
        act: change_pct.abs() >= required,
        current: change_pct,
        required,
    }
}
