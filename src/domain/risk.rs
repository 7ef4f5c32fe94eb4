//! Risk configuration: thresholds, sizing limits, and exit rules.
//!
//! Loaded once per run by `config_validation`, then immutable. The engine
//! never widens or "repairs" out-of-range values at runtime; bad values must
//! fail at load time.

use chrono::Duration;

/// How position sizes are denominated throughout the sizing calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeUnit {
    /// Sizes are units of the traded asset.
    AssetUnits,
    /// Sizes are fractions of the current cash balance, converted to asset
    /// units at the current price.
    BalanceFraction,
}

/// Stop-loss rules: a fixed initial stop that hands over to a trailing stop
/// once the position has been profitable enough.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StopLossRules {
    /// Percent below the mean entry price before activation.
    pub initial_pct: f64,
    /// Percent below the high-water mark after activation.
    pub trailing_pct: f64,
    /// High-water profit (percent over mean entry) that arms the trail.
    pub activation_pct: f64,
}

/// One rung of the take-profit ladder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TakeProfitRung {
    /// Unrealized profit (percent over mean entry) at which the rung fires.
    pub target_pct: f64,
    /// Fraction of the position's lifetime entry size to close.
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskConfig {
    // Decision gate
    pub base_threshold: f64,
    pub volatility_multiplier: f64,
    pub min_threshold: f64,
    pub max_threshold: f64,

    // Sizing
    pub size_unit: SizeUnit,
    pub min_position_size: f64,
    pub max_position_size: f64,
    /// Fraction of balance risked per trade.
    pub risk_per_trade: f64,
    pub kelly_fraction: f64,

    // Exits
    pub stop_loss: StopLossRules,
    pub take_profit: Vec<TakeProfitRung>,
    pub max_holding_period: Option<Duration>,

    // Trading params
    pub min_confidence: u8,
    /// Proportional fee per fill, in percent of notional.
    pub trading_fee_pct: f64,
    pub initial_balance: f64,
}

impl Default for RiskConfig {
    fn default() -> Self {
        RiskConfig {
            base_threshold: 0.5,
            volatility_multiplier: 1.0,
            min_threshold: 0.2,
            max_threshold: 5.0,
            size_unit: SizeUnit::AssetUnits,
            min_position_size: 0.1,
            max_position_size: 1.0,
            risk_per_trade: 0.02,
            kelly_fraction: 0.5,
            stop_loss: StopLossRules {
                initial_pct: 8.0,
                trailing_pct: 3.0,
                activation_pct: 5.0,
            },
            take_profit: vec![
                TakeProfitRung {
                    target_pct: 2.0,
                    fraction: 0.5,
                },
                TakeProfitRung {
                    target_pct: 5.0,
                    fraction: 1.0,
                },
            ],
            max_holding_period: None,
            min_confidence: 60,
            trading_fee_pct: 0.1,
            initial_balance: 10_000.0,
        }
    }
}
