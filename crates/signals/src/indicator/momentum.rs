//! Relative Strength Index (Wilder).
//!
//! ```text
//! avg_gain_0 = mean(gains[1..=W])              avg_loss_0 = mean(losses[1..=W])
//! avg_gain_t = (avg_gain_{t-1} * (W-1) + gain_t) / W   (same for losses)
//! RSI        = 100 - 100 / (1 + avg_gain / avg_loss)
//! ```
//!
//! A zero average loss reads 100 (this includes a flat window); a zero
//! average gain against a positive loss reads 0.

use divergence_core::{AnalysisError, IndicatorSeries, PriceSeries, Result};

/// Computes the RSI of a validated price series.
///
/// # Errors
/// See [`rsi_values`].
pub fn relative_strength_index(series: &PriceSeries, window: usize) -> Result<IndicatorSeries> {
    rsi_values(series.closes(), window)
}

/// Computes the RSI over raw closing prices.
///
/// Index `i` is defined once `i >= window`, i.e. after `window` price changes.
///
/// # Errors
/// - [`AnalysisError::InvalidParameter`] if `window` is zero
/// - [`AnalysisError::InsufficientData`] if no position is defined
///
/// # Examples
/// ```
/// use divergence_signals::rsi_values;
///
/// let rsi = rsi_values(&[1.0, 2.0, 3.0, 2.0], 2).unwrap();
/// assert_eq!(rsi.get(1), None);
/// assert_eq!(rsi.get(2), Some(100.0));
/// assert!((rsi.get(3).unwrap() - 50.0).abs() < 1e-9);
/// ```
pub fn rsi_values(closes: &[f64], window: usize) -> Result<IndicatorSeries> {
    if window == 0 {
        return Err(AnalysisError::invalid_parameter(
            "oscillator window must be at least 1",
        ));
    }

    let n = closes.len();
    if n <= window {
        return Err(AnalysisError::InsufficientData {
            required: window + 1,
            actual: n,
        });
    }

    let w = window as f64;
    let mut values = vec![None; n];

    let (gain_sum, loss_sum) = closes[..=window]
        .windows(2)
        .map(|pair| split_change(pair[1] - pair[0]))
        .fold((0.0, 0.0), |(g, l), (gain, loss)| (g + gain, l + loss));
    let mut avg_gain = gain_sum / w;
    let mut avg_loss = loss_sum / w;
    values[window] = Some(rsi_from_averages(avg_gain, avg_loss));

    for i in (window + 1)..n {
        let (gain, loss) = split_change(closes[i] - closes[i - 1]);
        avg_gain = (avg_gain * (w - 1.0) + gain) / w;
        avg_loss = (avg_loss * (w - 1.0) + loss) / w;
        values[i] = Some(rsi_from_averages(avg_gain, avg_loss));
    }

    tracing::debug!(
        "RSI({}) computed: {} defined of {} positions",
        window,
        n - window,
        n
    );

    Ok(IndicatorSeries::new(values))
}

/// Splits a price change into (gain, loss), both non-negative.
#[inline]
fn split_change(change: f64) -> (f64, f64) {
    if change > 0.0 {
        (change, 0.0)
    } else {
        (0.0, -change)
    }
}

#[inline]
fn rsi_from_averages(avg_gain: f64, avg_loss: f64) -> f64 {
    if avg_loss == 0.0 {
        return 100.0;
    }
    if avg_gain == 0.0 {
        return 0.0;
    }
    let rs = avg_gain / avg_loss;
    (100.0 - 100.0 / (1.0 + rs)).clamp(0.0, 100.0)
}
