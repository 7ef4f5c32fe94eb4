//! Parsing of the external collaborator's free-text reply.
//!
//! Pure string matching: no state, no I/O. Anything that cannot be parsed
//! falls back to a harmless HOLD component rather than an error, because a
//! malformed reply is an expected condition, not a bug.

use crate::domain::decision::Action;

/// Structured form of the collaborator's reply.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedSignal {
    pub action: Action,
    /// Requested size, denominated per the run's size unit.
    pub size: f64,
    /// 0–100.
    pub confidence: u8,
    pub reasoning: String,
}

impl Default for ParsedSignal {
    fn default() -> Self {
        ParsedSignal {
            action: Action::Hold,
            size: 0.0,
            confidence: 0,
            reasoning: "No reasoning provided".to_string(),
        }
    }
}

/// Extract `Action:` / `Amount:` / `Confidence:` / `Reasoning:` lines.
///
/// Reasoning continues across subsequent non-empty lines until another field
/// starts. Missing or malformed fields keep their defaults (HOLD, 0, 0).
pub fn parse_signal(text: &str) -> ParsedSignal {
    let mut signal = ParsedSignal::default();
    let mut reasoning_lines: Vec<String> = Vec::new();
    let mut in_reasoning = false;

    for raw_line in text.lines() {
        let line = raw_line.trim();
        if let Some(value) = field_value(line, "Action:") {
            in_reasoning = false;
            signal.action = match value.to_ascii_uppercase().as_str() {
                "BUY" => Action::Buy,
                "SELL" => Action::Sell,
                _ => Action::Hold,
            };
        } else if let Some(value) = field_value(line, "Amount:") {
            in_reasoning = false;
            signal.size = value.parse::<f64>().unwrap_or(0.0);
        } else if let Some(value) = field_value(line, "Confidence:") {
            in_reasoning = false;
            let numeric = value.trim_end_matches('%').trim();
            let parsed = numeric.parse::<f64>().unwrap_or(0.0);
            signal.confidence = parsed.clamp(0.0, 100.0).round() as u8;
        } else if let Some(value) = field_value(line, "Reasoning:") {
            in_reasoning = true;
            if !value.is_empty() {
                reasoning_lines.push(value.to_string());
            }
        } else if in_reasoning && !line.is_empty() {
            reasoning_lines.push(line.to_string());
        }
    }

    if !reasoning_lines.is_empty() {
        signal.reasoning = reasoning_lines.join(" ");
    }

    signal
}

fn field_value<'a>(line: &'a str, field: &str) -> Option<&'a str> {
    let head = line.get(..field.len())?;
    if head.eq_ignore_ascii_case(field) {
        Some(line[field.len()..].trim())
    } else {
        None
    }
}
