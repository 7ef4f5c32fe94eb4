//! HTTP signal adapter for an OpenAI-compatible chat-completions endpoint.
//!
//! Renders the market context into a prompt, posts it with a hard request
//! timeout, and returns the raw reply text. All failures map to
//! [`SignalError`] so the pipeline can degrade to HOLD for the bar.

use crate::domain::error::{SigtraderError, SignalError};
use crate::ports::config_port::ConfigPort;
use crate::ports::signal_port::{SignalContext, SignalPort};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug)]
pub struct HttpSignalAdapter {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    timeout_secs: u64,
}

impl HttpSignalAdapter {
    pub fn new(endpoint: String, model: String, timeout_secs: u64) -> Result<Self, SigtraderError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SigtraderError::Data {
                reason: format!("failed to build HTTP client: {e}"),
            })?;
        Ok(Self {
            client,
            endpoint,
            model,
            timeout_secs,
        })
    }

    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, SigtraderError> {
        let endpoint =
            config
                .get_string("signal", "endpoint")
                .ok_or_else(|| SigtraderError::ConfigMissing {
                    section: "signal".into(),
                    key: "endpoint".into(),
                })?;
        let model = config
            .get_string("signal", "model")
            .unwrap_or_else(|| "local".to_string());
        let timeout_secs =
            config.get_int("signal", "timeout_secs", DEFAULT_TIMEOUT_SECS as i64) as u64;
        Self::new(endpoint, model, timeout_secs)
    }

    fn render_prompt(context: &SignalContext<'_>) -> String {
        let snap = context.snapshot;
        let entry = match context.entry_price {
            Some(price) => format!("{price:.4}"),
            None => "none".to_string(),
        };
        let position_note = if context.position <= 0.0 {
            "\nNOTE: no position is held; SELL is not valid, only BUY or HOLD.\n"
        } else {
            ""
        };
        format!(
            "You are evaluating {symbol}.\n\
             Price: {price:.4}\n\
             Volume: {volume:.2}\n\
             24h change: {change:+.3}%\n\
             24h high/low range: {range:.3}%\n\
             Current position: {position:.4}\n\
             Entry price: {entry}\n{position_note}\
             Reply with exactly these lines:\n\
             Action: BUY, SELL, or HOLD\n\
             Amount: <size>\n\
             Confidence: <0-100>\n\
             Reasoning: <one or two sentences>",
            symbol = context.symbol,
            price = snap.price,
            volume = snap.volume,
            change = snap.change_pct,
            range = snap.range_pct,
            position = context.position,
        )
    }
}

impl SignalPort for HttpSignalAdapter {
    fn get_signal(&mut self, context: &SignalContext<'_>) -> Result<String, SignalError> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {
                    "role": "system",
                    "content": "You are a cryptocurrency trading assistant."
                },
                {
                    "role": "user",
                    "content": Self::render_prompt(context)
                }
            ],
        });

        let response = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .map_err(|e| {
                if e.is_timeout() {
                    SignalError::Timeout {
                        seconds: self.timeout_secs,
                    }
                } else {
                    SignalError::Transport {
                        reason: e.to_string(),
                    }
                }
            })?;

        if !response.status().is_success() {
            return Err(SignalError::Transport {
                reason: format!("endpoint returned {}", response.status()),
            });
        }

        let payload: serde_json::Value = response.json().map_err(|e| SignalError::Unavailable {
            reason: format!("unreadable response body: {e}"),
        })?;

        payload["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| SignalError::Unavailable {
                reason: "response carried no message content".to_string(),
            })
    }
}
