//! Risk-aware position sizing.
//!
//! Takes the raw action/size/confidence proposed by the signal source and
//! produces the bounded size the simulator is allowed to fill, demoting to
//! HOLD where the trade cannot be taken at all.

use crate::domain::decision::{Action, DecisionReason};
use crate::domain::risk::{RiskConfig, SizeUnit};

/// Stop distance assumed when translating the per-trade risk budget into a
/// position size. The realized stop distance is only known once the exit
/// evaluator assigns one, so the risk cap uses this fixed fraction.
pub const ASSUMED_STOP_DISTANCE: f64 = 0.05;

/// Result of the sizing stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingOutcome {
    pub action: Action,
    /// Asset units; 0.0 whenever `action` is HOLD.
    pub size: f64,
    /// Set when the proposed trade was demoted to HOLD for a reportable
    /// cause (confidence floor, selling with nothing held).
    pub demotion: Option<DecisionReason>,
}

impl SizingOutcome {
    fn hold(demotion: Option<DecisionReason>) -> Self {
        SizingOutcome {
            action: Action::Hold,
            size: 0.0,
            demotion,
        }
    }
}

/// Apply the confidence floor, allocation caps, and sell clamp.
///
/// `requested_size` is denominated per `config.size_unit`; the returned size
/// is always in asset units. Every cap is applied in quote terms first and
/// converted at `price`, so the unit selection affects each bound the same
/// way.
pub fn apply_risk_limits(
    action: Action,
    requested_size: f64,
    confidence: u8,
    balance: f64,
    net_size: f64,
    price: f64,
    config: &RiskConfig,
) -> SizingOutcome {
    if action == Action::Hold {
        return SizingOutcome::hold(None);
    }

    if confidence < config.min_confidence {
        return SizingOutcome::hold(Some(DecisionReason::BelowConfidence {
            confidence,
            minimum: config.min_confidence,
        }));
    }

    if action == Action::Sell && net_size <= 0.0 {
        return SizingOutcome::hold(Some(DecisionReason::NoPositionToSell));
    }

    let (requested_units, min_units, max_units, base_allocation) = match config.size_unit {
        SizeUnit::AssetUnits => (
            requested_size,
            config.min_position_size,
            config.max_position_size,
            config.max_position_size * price,
        ),
        SizeUnit::BalanceFraction => (
            balance * requested_size / price,
            balance * config.min_position_size / price,
            balance * config.max_position_size / price,
            balance * config.max_position_size,
        ),
    };

    let kelly_units = base_allocation * config.kelly_fraction / price;
    let risk_cap_units = balance * config.risk_per_trade / ASSUMED_STOP_DISTANCE / price;

    let mut size = kelly_units
        .min(risk_cap_units)
        .min(max_units)
        .min(requested_units);

    if !size.is_finite() || size <= 0.0 {
        return SizingOutcome::hold(None);
    }

    if size < min_units {
        size = min_units;
    }

    if action == Action::Sell {
        size = size.min(net_size);
    }

    SizingOutcome {
        action,
        size,
        demotion: None,
    }
}
