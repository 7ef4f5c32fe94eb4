//! Volatility estimation from recent percentage changes.
//!
//! The ratio of dispersion to mean magnitude scales the decision gate's
//! threshold: choppy markets demand a larger move before acting.

/// Population standard deviation of the window divided by the mean of its
/// absolute values.
///
/// Returns 1.0 when fewer than two samples exist (dispersion is undefined)
/// or when the mean magnitude is zero (nothing to scale by).
pub fn volatility_ratio(changes: &[f64]) -> f64 {
    if changes.len() < 2 {
        return 1.0;
    }

    let n = changes.len() as f64;
    let mean_abs = changes.iter().map(|c| c.abs()).sum::<f64>() / n;
    if mean_abs == 0.0 {
        return 1.0;
    }

    let mean = changes.iter().sum::<f64>() / n;
    let variance = changes.iter().map(|c| (c - mean).powi(2)).sum::<f64>() / n;

    variance.sqrt() / mean_abs
}
