//! Price/RSI divergence detector.
//!
//! Scans the aligned price and oscillator series with a trailing window:
//! - Bullish divergence: price makes a new trailing low, oscillator stays above its trailing low
//! - Bearish divergence: price makes a new trailing high, oscillator stays below its trailing high
//!
//! Trailing windows cover `[i - lookback, i)` and exclude the current index.
//! Both conditions are evaluated independently rather than as exclusive
//! alternatives. Positions touching an undefined oscillator value are skipped.

use divergence_core::{
    AnalysisError, DivergenceEvent, DivergenceEvents, IndicatorSeries, PipelineConfig, Result,
};
use serde::{Deserialize, Serialize};

/// Configuration for divergence detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivergenceConfig {
    /// Length of the trailing comparison window
    pub lookback: usize,
    /// First index scanned; must exceed `lookback`
    pub start_offset: usize,
}

impl Default for DivergenceConfig {
    fn default() -> Self {
        Self::from(&PipelineConfig::default())
    }
}

impl From<&PipelineConfig> for DivergenceConfig {
    fn from(config: &PipelineConfig) -> Self {
        Self {
            lookback: config.divergence_lookback,
            start_offset: config.divergence_start_offset,
        }
    }
}

impl DivergenceConfig {
    /// # Errors
    /// Returns [`AnalysisError::InvalidParameter`] if `lookback` is zero or
    /// `start_offset <= lookback`.
    pub fn validate(&self) -> Result<()> {
        if self.lookback == 0 {
            return Err(AnalysisError::invalid_parameter(
                "divergence lookback must be at least 1",
            ));
        }
        if self.start_offset <= self.lookback {
            return Err(AnalysisError::invalid_parameter(format!(
                "divergence start offset ({}) must exceed lookback ({})",
                self.start_offset, self.lookback
            )));
        }
        Ok(())
    }
}

/// Scans the whole series and returns divergence events in index order.
///
/// # Arguments
/// * `closes` - Closing prices (chronological order)
/// * `indicator` - Oscillator aligned with `closes`
/// * `config` - Lookback and start offset
///
/// # Errors
/// Returns an error if the configuration is invalid or the series are not
/// the same length.
///
/// # Examples
/// ```
/// use divergence_core::IndicatorSeries;
/// use divergence_signals::{detect_divergences, DivergenceConfig};
///
/// let closes = [10.0, 11.0, 12.0, 9.0];
/// let rsi = IndicatorSeries::new(vec![Some(50.0), Some(40.0), Some(45.0), Some(42.0)]);
/// let config = DivergenceConfig { lookback: 2, start_offset: 3 };
///
/// let events = detect_divergences(&closes, &rsi, &config).unwrap();
/// assert_eq!(events.bullish_indices(), vec![3]);
/// ```
pub fn detect_divergences(
    closes: &[f64],
    indicator: &IndicatorSeries,
    config: &DivergenceConfig,
) -> Result<DivergenceEvents> {
    config.validate()?;

    if closes.len() != indicator.len() {
        return Err(AnalysisError::LengthMismatch {
            prices: closes.len(),
            indicator: indicator.len(),
        });
    }

    let values = indicator.values();
    let mut events = Vec::new();

    for index in config.start_offset..closes.len() {
        if detect_bullish_divergence(closes, values, index, config.lookback) {
            events.push(DivergenceEvent::bullish(index));
        }
        if detect_bearish_divergence(closes, values, index, config.lookback) {
            events.push(DivergenceEvent::bearish(index));
        }
    }

    tracing::debug!(
        "Divergence scan over {} positions (lookback {}, start {}): {} events",
        closes.len().saturating_sub(config.start_offset),
        config.lookback,
        config.start_offset,
        events.len()
    );

    Ok(DivergenceEvents::new(events))
}

/// Detects bullish divergence at `index`: price below its trailing low while
/// the oscillator is above its own trailing low.
///
/// Returns false when the window does not fit or any oscillator value
/// involved is undefined.
#[must_use]
pub fn detect_bullish_divergence(
    closes: &[f64],
    indicator: &[Option<f64>],
    index: usize,
    lookback: usize,
) -> bool {
    let Some(window) = trailing_window(closes, indicator, index, lookback) else {
        return false;
    };

    window.price_now < window.price_low && window.indicator_now > window.indicator_low
}

/// Detects bearish divergence at `index`: price above its trailing high while
/// the oscillator is below its own trailing high.
///
/// Returns false when the window does not fit or any oscillator value
/// involved is undefined.
#[must_use]
pub fn detect_bearish_divergence(
    closes: &[f64],
    indicator: &[Option<f64>],
    index: usize,
    lookback: usize,
) -> bool {
    let Some(window) = trailing_window(closes, indicator, index, lookback) else {
        return false;
    };

    window.price_now > window.price_high && window.indicator_now < window.indicator_high
}

/// Current values and trailing extremes around one index.
#[derive(Debug, Clone, Copy)]
struct TrailingWindow {
    price_now: f64,
    price_low: f64,
    price_high: f64,
    indicator_now: f64,
    indicator_low: f64,
    indicator_high: f64,
}

fn trailing_window(
    closes: &[f64],
    indicator: &[Option<f64>],
    index: usize,
    lookback: usize,
) -> Option<TrailingWindow> {
    if lookback == 0 || index < lookback || index >= closes.len() || index >= indicator.len() {
        return None;
    }

    let start = index - lookback;
    let price_now = closes[index];
    let indicator_now = indicator[index]?;

    let (price_low, price_high) = closes[start..index]
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &p| {
            (lo.min(p), hi.max(p))
        });

    // Any undefined value in the window aborts the fold.
    let (indicator_low, indicator_high) = indicator[start..index].iter().try_fold(
        (f64::INFINITY, f64::NEG_INFINITY),
        |(lo, hi), v| v.map(|v| (lo.min(v), hi.max(v))),
    )?;

    Some(TrailingWindow {
        price_now,
        price_low,
        price_high,
        indicator_now,
        indicator_low,
        indicator_high,
    })
}
