//! Bollinger bands.
//!
//! Middle = SMA(W), upper/lower = middle ± K · sample standard deviation of
//! the same W closes. Index `i` is defined once a full window ends at `i`.

use divergence_core::{AnalysisError, BandSeries, IndicatorSeries, PriceSeries, Result};

/// Computes Bollinger bands for a validated price series.
///
/// # Errors
/// See [`band_values`].
pub fn bollinger_bands(series: &PriceSeries, window: usize, multiplier: f64) -> Result<BandSeries> {
    band_values(series.closes(), window, multiplier)
}

/// Computes Bollinger bands over raw closing prices.
///
/// Every failure is reported as [`AnalysisError::BandComputationFailed`],
/// which callers treat as "bands unavailable".
///
/// # Errors
/// Fails if `window < 2` (the sample deviation needs two points), if
/// `multiplier` is not a positive finite number, if there are fewer than
/// `window` closes, or if a band value is not finite.
pub fn band_values(closes: &[f64], window: usize, multiplier: f64) -> Result<BandSeries> {
    if window < 2 {
        return Err(AnalysisError::band_failed(format!(
            "window must be at least 2 for a sample deviation, got {window}"
        )));
    }
    if !multiplier.is_finite() || multiplier <= 0.0 {
        return Err(AnalysisError::band_failed(format!(
            "standard deviation multiplier must be positive, got {multiplier}"
        )));
    }
    if closes.len() < window {
        return Err(AnalysisError::band_failed(format!(
            "need at least {window} closes, got {}",
            closes.len()
        )));
    }

    let n = closes.len();
    let mut middle = vec![None; n];
    let mut upper = vec![None; n];
    let mut lower = vec![None; n];

    for (start, slice) in closes.windows(window).enumerate() {
        let end = start + window - 1;
        let (mean, std_dev) = mean_and_sample_std(slice);
        let width = multiplier * std_dev;

        if !mean.is_finite() || !width.is_finite() {
            return Err(AnalysisError::band_failed(format!(
                "non-finite band value at index {end}"
            )));
        }

        middle[end] = Some(mean);
        upper[end] = Some(mean + width);
        lower[end] = Some(mean - width);
    }

    Ok(BandSeries {
        middle: IndicatorSeries::new(middle),
        upper: IndicatorSeries::new(upper),
        lower: IndicatorSeries::new(lower),
    })
}

/// Mean and sample (n - 1) standard deviation. `values` must hold two or more points.
fn mean_and_sample_std(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    (mean, (sum_sq / (n - 1.0)).sqrt())
}
