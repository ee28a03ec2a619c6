//! End-to-end analysis: validation, RSI, Bollinger bands, divergence scan.
//!
//! Validation and RSI failures halt the run. A band failure is logged and
//! the report is returned without the overlay.

use crate::generator::divergence::{detect_divergences, DivergenceConfig};
use crate::indicator::{bollinger_bands, relative_strength_index};
use crate::report::AnalysisReport;
use divergence_core::{validate_series, CandidateSeries, PipelineConfig, PriceSeries, Result};

/// Validates a candidate series and runs the pipeline on it.
///
/// # Errors
/// Returns the validation error, or any fatal error from [`run_pipeline`].
pub fn analyze(candidate: CandidateSeries, config: &PipelineConfig) -> Result<AnalysisReport> {
    let series = validate_series(candidate)?;
    run_pipeline(series, config)
}

/// Runs the indicator and divergence stages on a validated series.
///
/// # Errors
/// - [`divergence_core::AnalysisError::InvalidParameter`] for an invalid configuration
/// - [`divergence_core::AnalysisError::InsufficientData`] if the RSI has no defined value
pub fn run_pipeline(series: PriceSeries, config: &PipelineConfig) -> Result<AnalysisReport> {
    config.validate()?;

    tracing::info!(
        "Analyzing {} observations (RSI {}, bands {}x{}, lookback {}, start {})",
        series.len(),
        config.oscillator_window,
        config.band_window,
        config.band_std_dev_multiplier,
        config.divergence_lookback,
        config.divergence_start_offset
    );

    let oscillator = relative_strength_index(&series, config.oscillator_window)?;

    let (bands, band_warning) = match bollinger_bands(
        &series,
        config.band_window,
        config.band_std_dev_multiplier,
    ) {
        Ok(bands) => (Some(bands), None),
        Err(e) if !e.is_fatal() => {
            tracing::warn!("Continuing without Bollinger bands: {}", e);
            (None, Some(e.to_string()))
        }
        Err(e) => return Err(e),
    };

    if series.len() < config.min_observations_for_divergence() {
        tracing::info!(
            "Series has {} observations, divergences need at least {}",
            series.len(),
            config.min_observations_for_divergence()
        );
    }

    let divergences = detect_divergences(
        series.closes(),
        &oscillator,
        &DivergenceConfig::from(config),
    )?;

    tracing::info!(
        "Detected {} bullish and {} bearish divergences",
        divergences.bullish_indices().len(),
        divergences.bearish_indices().len()
    );

    Ok(AnalysisReport {
        config: *config,
        series,
        oscillator,
        bands,
        band_warning,
        divergences,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use divergence_core::AnalysisError;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap()
    }

    fn daily(closes: Vec<f64>) -> PriceSeries {
        PriceSeries::with_interval(start(), Duration::days(1), closes).unwrap()
    }

    /// 29 choppy closes, a crash to 90, a rebound to 95, then nine steady
    /// declines ending at a new 10-day low of 89.6. The RSI bottomed on the
    /// crash day, so the final low is not confirmed.
    fn crash_rebound_decline() -> Vec<f64> {
        let mut closes: Vec<f64> = (0..29)
            .map(|i| if i % 2 == 1 { 101.0 } else { 99.0 })
            .collect();
        closes.push(90.0);
        closes.push(95.0);
        closes.extend((1..=9).map(|k| 95.0 - 0.6 * k as f64));
        closes
    }

    // ============================================
    // Scenario Tests
    // ============================================

    #[test]
    fn test_unconfirmed_new_low_yields_single_bullish_event() {
        let closes = crash_rebound_decline();
        assert_eq!(closes.len(), 40);

        let report = run_pipeline(daily(closes), &PipelineConfig::default()).unwrap();

        let rsi_now = report.oscillator.get(39).unwrap();
        let rsi_low = (29..39)
            .map(|i| report.oscillator.get(i).unwrap())
            .fold(f64::INFINITY, f64::min);
        assert!(rsi_now > rsi_low);

        assert_eq!(report.divergences.bullish_indices(), vec![39]);
        assert!(report.divergences.bearish_indices().is_empty());
    }

    #[test]
    fn test_constant_series() {
        let report = run_pipeline(daily(vec![50.0; 50]), &PipelineConfig::default()).unwrap();

        assert_eq!(report.oscillator.defined().count(), 36);
        assert!(report
            .oscillator
            .defined()
            .all(|(_, v)| (v - 100.0).abs() < f64::EPSILON));
        assert!(report.divergences.is_empty());
    }

    #[test]
    fn test_short_series_halts_with_insufficient_data() {
        let err = run_pipeline(
            daily(vec![10.0, 10.5, 10.2, 10.8, 11.0]),
            &PipelineConfig::default(),
        )
        .unwrap_err();

        assert_eq!(
            err,
            AnalysisError::InsufficientData {
                required: 15,
                actual: 5
            }
        );
    }

    #[test]
    fn test_series_below_start_offset_has_no_events() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 - i as f64 * 0.5).collect();
        let report = run_pipeline(daily(closes), &PipelineConfig::default()).unwrap();
        assert!(report.divergences.is_empty());
        assert!(report.bands.is_some());
    }

    // ============================================
    // Error Policy Tests
    // ============================================

    #[test]
    fn test_band_failure_is_recovered() {
        // 16 closes: enough for RSI(14), too few for a 20-close band
        let closes: Vec<f64> = (0..16).map(|i| 100.0 + (i % 3) as f64).collect();
        let report = run_pipeline(daily(closes), &PipelineConfig::default()).unwrap();

        assert!(report.bands.is_none());
        assert!(report
            .band_warning
            .as_deref()
            .is_some_and(|w| w.contains("band computation failed")));
        assert_eq!(report.oscillator.len(), 16);
    }

    #[test]
    fn test_invalid_band_parameters_are_recovered() {
        let config = PipelineConfig {
            band_window: 1,
            ..PipelineConfig::default()
        };
        let report = run_pipeline(daily(crash_rebound_decline()), &config).unwrap();
        assert!(report.bands.is_none());
        assert_eq!(report.divergences.bullish_indices(), vec![39]);
    }

    #[test]
    fn test_invalid_divergence_parameters_are_fatal() {
        let config = PipelineConfig {
            divergence_lookback: 10,
            divergence_start_offset: 8,
            ..PipelineConfig::default()
        };
        let err = run_pipeline(daily(crash_rebound_decline()), &config).unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidParameter { .. }));
    }

    #[test]
    fn test_analyze_propagates_validation_errors() {
        let timestamps = vec![start(), start() + Duration::days(1)];

        let err = analyze(
            CandidateSeries::without_close(timestamps.clone()),
            &PipelineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, AnalysisError::MissingCloseField);

        let err = analyze(
            CandidateSeries::new(timestamps, vec![None, None]),
            &PipelineConfig::default(),
        )
        .unwrap_err();
        assert_eq!(err, AnalysisError::AllValuesUndefined { count: 2 });

        let err = analyze(CandidateSeries::default(), &PipelineConfig::default()).unwrap_err();
        assert_eq!(err, AnalysisError::EmptySeries);
    }

    // ============================================
    // Property Tests
    // ============================================

    #[test]
    fn test_pipeline_is_idempotent() {
        let closes: Vec<f64> = (0..120)
            .map(|i| 100.0 + (i as f64 * 0.3).sin() * 6.0 + (i as f64 * 0.07).cos() * 3.0)
            .collect();
        let config = PipelineConfig::default();

        let first = run_pipeline(daily(closes.clone()), &config).unwrap();
        let second = run_pipeline(daily(closes), &config).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_outputs_aligned_and_bounded() {
        let closes: Vec<f64> = (0..150)
            .map(|i| 50.0 + (i as f64 * 0.21).sin() * 9.0 + i as f64 * 0.02)
            .collect();
        let config = PipelineConfig::default();
        let report = run_pipeline(daily(closes.clone()), &config).unwrap();

        assert_eq!(report.oscillator.len(), closes.len());
        let bands = report.bands.as_ref().unwrap();
        assert_eq!(bands.len(), closes.len());

        for (_, v) in report.oscillator.defined() {
            assert!((0.0..=100.0).contains(&v));
        }
        for (i, middle) in bands.middle.defined() {
            let mean = closes[i + 1 - config.band_window..=i].iter().sum::<f64>()
                / config.band_window as f64;
            assert!((middle - mean).abs() < 1e-9);
            let up = bands.upper.get(i).unwrap() - middle;
            let down = middle - bands.lower.get(i).unwrap();
            assert!((up - down).abs() < 1e-9);
        }
        assert!(report
            .divergences
            .iter()
            .all(|e| e.index >= config.divergence_start_offset));
    }
}
