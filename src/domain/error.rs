//! Domain error types.

/// Top-level error type for sigtrader.
///
/// Configuration errors are fatal before a run starts; `InsufficientPosition`
/// is fatal mid-run because the sizing stage must have clamped every sell
/// before it reaches the ledger.
#[derive(Debug, thiserror::Error)]
pub enum SigtraderError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("data error: {reason}")]
    Data { reason: String },

    #[error("no candle data for {symbol}")]
    NoData { symbol: String },

    #[error("sell of {requested} exceeds held position {held}")]
    InsufficientPosition { requested: f64, held: f64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&SigtraderError> for std::process::ExitCode {
    fn from(err: &SigtraderError) -> Self {
        let code: u8 = match err {
            SigtraderError::Io(_) => 1,
            SigtraderError::ConfigParse { .. }
            | SigtraderError::ConfigMissing { .. }
            | SigtraderError::ConfigInvalid { .. } => 2,
            SigtraderError::Data { .. } | SigtraderError::NoData { .. } => 3,
            SigtraderError::InsufficientPosition { .. } => 4,
        };
        std::process::ExitCode::from(code)
    }
}

/// Failure of the external signal collaborator.
///
/// Never fatal: the decision pipeline maps these to a HOLD for the current
/// bar and the simulation continues.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SignalError {
    #[error("signal request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("signal transport error: {reason}")]
    Transport { reason: String },

    #[error("signal unavailable: {reason}")]
    Unavailable { reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process::ExitCode;

    #[test]
    fn config_errors_share_exit_code() {
        let missing = SigtraderError::ConfigMissing {
            section: "stop_loss".into(),
            key: "initial_pct".into(),
        };
        let invalid = SigtraderError::ConfigInvalid {
            section: "stop_loss".into(),
            key: "initial_pct".into(),
            reason: "must be positive".into(),
        };
        assert_eq!(ExitCode::from(&missing), ExitCode::from(2));
        assert_eq!(ExitCode::from(&invalid), ExitCode::from(2));
    }

    #[test]
    fn insufficient_position_message_carries_sizes() {
        let err = SigtraderError::InsufficientPosition {
            requested: 12.0,
            held: 10.0,
        };
        let msg = err.to_string();
        assert!(msg.contains("12"));
        assert!(msg.contains("10"));
    }

    #[test]
    fn signal_error_display() {
        let err = SignalError::Timeout { seconds: 30 };
        assert!(err.to_string().contains("30"));
    }
}
