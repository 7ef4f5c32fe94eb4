//! Risk configuration loading and validation.
//!
//! Builds a [`RiskConfig`] from a [`ConfigPort`] and validates every field
//! eagerly. Out-of-range values are errors, never silently clamped: a risk
//! limit that loads differently from what the operator wrote is worse than
//! a refusal to start.

use crate::domain::error::SigtraderError;
use crate::domain::risk::{RiskConfig, SizeUnit, StopLossRules, TakeProfitRung};
use crate::ports::config_port::ConfigPort;
use chrono::Duration;

pub fn build_risk_config(config: &dyn ConfigPort) -> Result<RiskConfig, SigtraderError> {
    let base_threshold = required_double(config, "price_change_threshold", "base")?;
    let volatility_multiplier =
        config.get_double("price_change_threshold", "volatility_multiplier", 1.0);
    let min_threshold = required_double(config, "price_change_threshold", "min_threshold")?;
    let max_threshold = required_double(config, "price_change_threshold", "max_threshold")?;

    let size_unit = parse_size_unit(config)?;
    let min_position_size = required_double(config, "position_sizing", "min_position_size")?;
    let max_position_size = required_double(config, "position_sizing", "max_position_size")?;
    let risk_per_trade = required_double(config, "position_sizing", "risk_per_trade")?;
    let kelly_fraction = required_double(config, "position_sizing", "kelly_fraction")?;

    let stop_loss = StopLossRules {
        initial_pct: required_double(config, "stop_loss", "initial_pct")?,
        trailing_pct: required_double(config, "stop_loss", "trailing_pct")?,
        activation_pct: required_double(config, "stop_loss", "activation_pct")?,
    };

    let take_profit = parse_take_profit(config)?;
    let max_holding_period = parse_max_holding(config)?;

    let min_confidence = required_double(config, "trading_params", "min_confidence")?;
    let trading_fee_pct = config.get_double("trading_params", "trading_fee_pct", 0.1);
    let initial_balance = required_double(config, "trading_params", "initial_balance")?;

    let risk_config = RiskConfig {
        base_threshold,
        volatility_multiplier,
        min_threshold,
        max_threshold,
        size_unit,
        min_position_size,
        max_position_size,
        risk_per_trade,
        kelly_fraction,
        stop_loss,
        take_profit,
        max_holding_period,
        min_confidence: min_confidence as u8,
        trading_fee_pct,
        initial_balance,
    };

    validate(&risk_config, min_confidence)?;
    Ok(risk_config)
}

fn validate(config: &RiskConfig, raw_min_confidence: f64) -> Result<(), SigtraderError> {
    if config.base_threshold <= 0.0 {
        return Err(invalid("price_change_threshold", "base", "must be positive"));
    }
    if config.volatility_multiplier <= 0.0 {
        return Err(invalid(
            "price_change_threshold",
            "volatility_multiplier",
            "must be positive",
        ));
    }
    if config.min_threshold <= 0.0 || config.min_threshold > config.max_threshold {
        return Err(invalid(
            "price_change_threshold",
            "min_threshold",
            "must be positive and no greater than max_threshold",
        ));
    }

    if config.min_position_size <= 0.0 || config.min_position_size > config.max_position_size {
        return Err(invalid(
            "position_sizing",
            "min_position_size",
            "must be positive and no greater than max_position_size",
        ));
    }
    if config.size_unit == SizeUnit::BalanceFraction && config.max_position_size > 1.0 {
        return Err(invalid(
            "position_sizing",
            "max_position_size",
            "must be at most 1 when size_unit is fraction",
        ));
    }
    if config.risk_per_trade <= 0.0 || config.risk_per_trade >= 1.0 {
        return Err(invalid(
            "position_sizing",
            "risk_per_trade",
            "must be between 0 and 1",
        ));
    }
    if config.kelly_fraction <= 0.0 || config.kelly_fraction > 1.0 {
        return Err(invalid(
            "position_sizing",
            "kelly_fraction",
            "must be between 0 and 1",
        ));
    }

    let stop = &config.stop_loss;
    if stop.initial_pct <= 0.0 || stop.initial_pct >= 100.0 {
        return Err(invalid("stop_loss", "initial_pct", "must be between 0 and 100"));
    }
    if stop.trailing_pct <= 0.0 || stop.trailing_pct > stop.initial_pct {
        return Err(invalid(
            "stop_loss",
            "trailing_pct",
            "must be positive and no greater than initial_pct",
        ));
    }
    if stop.activation_pct < 0.0 {
        return Err(invalid("stop_loss", "activation_pct", "must be non-negative"));
    }

    let mut previous_target = 0.0;
    for rung in &config.take_profit {
        if rung.target_pct <= previous_target {
            return Err(invalid(
                "take_profit",
                "levels",
                "targets must be positive and strictly ascending",
            ));
        }
        if rung.fraction <= 0.0 || rung.fraction > 1.0 {
            return Err(invalid(
                "take_profit",
                "levels",
                "fractions must be between 0 and 1",
            ));
        }
        previous_target = rung.target_pct;
    }

    if !(0.0..=100.0).contains(&raw_min_confidence) {
        return Err(invalid(
            "trading_params",
            "min_confidence",
            "must be between 0 and 100",
        ));
    }
    if config.trading_fee_pct < 0.0 {
        return Err(invalid(
            "trading_params",
            "trading_fee_pct",
            "must be non-negative",
        ));
    }
    if config.initial_balance <= 0.0 {
        return Err(invalid(
            "trading_params",
            "initial_balance",
            "must be positive",
        ));
    }

    Ok(())
}

fn parse_size_unit(config: &dyn ConfigPort) -> Result<SizeUnit, SigtraderError> {
    match config.get_string("position_sizing", "size_unit") {
        None => Ok(SizeUnit::AssetUnits),
        Some(s) => match s.trim().to_ascii_lowercase().as_str() {
            "asset" => Ok(SizeUnit::AssetUnits),
            "fraction" => Ok(SizeUnit::BalanceFraction),
            other => Err(invalid(
                "position_sizing",
                "size_unit",
                &format!("unknown unit '{other}' (expected asset or fraction)"),
            )),
        },
    }
}

/// `levels = target:fraction, target:fraction, ...` — e.g. `2:0.5, 5:1.0`.
fn parse_take_profit(config: &dyn ConfigPort) -> Result<Vec<TakeProfitRung>, SigtraderError> {
    let raw = match config.get_string("take_profit", "levels") {
        None => return Ok(Vec::new()),
        Some(s) if s.trim().is_empty() => return Ok(Vec::new()),
        Some(s) => s,
    };

    let mut rungs = Vec::new();
    for token in raw.split(',') {
        let pair = token.trim();
        let (target, fraction) = pair.split_once(':').ok_or_else(|| {
            invalid(
                "take_profit",
                "levels",
                &format!("expected target:fraction, got '{pair}'"),
            )
        })?;
        let target_pct: f64 = target.trim().parse().map_err(|_| {
            invalid(
                "take_profit",
                "levels",
                &format!("invalid target '{}'", target.trim()),
            )
        })?;
        let fraction: f64 = fraction.trim().parse().map_err(|_| {
            invalid(
                "take_profit",
                "levels",
                &format!("invalid fraction '{}'", fraction.trim()),
            )
        })?;
        rungs.push(TakeProfitRung {
            target_pct,
            fraction,
        });
    }
    Ok(rungs)
}

fn parse_max_holding(config: &dyn ConfigPort) -> Result<Option<Duration>, SigtraderError> {
    match config.get_string("time_exit", "max_holding_hours") {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => {
            let hours: i64 = s.trim().parse().map_err(|_| {
                invalid("time_exit", "max_holding_hours", "must be a whole number of hours")
            })?;
            if hours <= 0 {
                return Err(invalid("time_exit", "max_holding_hours", "must be positive"));
            }
            Ok(Some(Duration::hours(hours)))
        }
    }
}

fn required_double(
    config: &dyn ConfigPort,
    section: &str,
    key: &str,
) -> Result<f64, SigtraderError> {
    match config.get_string(section, key) {
        None => Err(SigtraderError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
        Some(s) => s.trim().parse().map_err(|_| {
            invalid(section, key, &format!("invalid number '{}'", s.trim()))
        }),
    }
}

fn invalid(section: &str, key: &str, reason: &str) -> SigtraderError {
    SigtraderError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
