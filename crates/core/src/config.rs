use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_OSCILLATOR_WINDOW: usize = 14;
pub const DEFAULT_BAND_WINDOW: usize = 20;
pub const DEFAULT_BAND_STD_DEV_MULTIPLIER: f64 = 2.0;
pub const DEFAULT_DIVERGENCE_LOOKBACK: usize = 10;
pub const DEFAULT_DIVERGENCE_START_OFFSET: usize = 30;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub analysis: PipelineConfig,
    pub report: ReportConfig,
}

/// Parameters of the indicator and divergence pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// RSI smoothing window
    pub oscillator_window: usize,
    /// Bollinger moving-average window
    pub band_window: usize,
    /// Bollinger standard-deviation multiplier
    pub band_std_dev_multiplier: f64,
    /// Trailing window length for divergence comparisons
    pub divergence_lookback: usize,
    /// First index scanned for divergences
    pub divergence_start_offset: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            oscillator_window: DEFAULT_OSCILLATOR_WINDOW,
            band_window: DEFAULT_BAND_WINDOW,
            band_std_dev_multiplier: DEFAULT_BAND_STD_DEV_MULTIPLIER,
            divergence_lookback: DEFAULT_DIVERGENCE_LOOKBACK,
            divergence_start_offset: DEFAULT_DIVERGENCE_START_OFFSET,
        }
    }
}

impl PipelineConfig {
    /// Checks the parameters the fatal stages depend on.
    ///
    /// Band parameters are checked by the band computation itself, whose
    /// failure only removes the overlay.
    ///
    /// # Errors
    /// Returns [`AnalysisError::InvalidParameter`] naming the first violated constraint.
    pub fn validate(&self) -> Result<()> {
        if self.oscillator_window < 1 {
            return Err(AnalysisError::invalid_parameter(
                "oscillator_window must be at least 1",
            ));
        }
        if self.divergence_lookback < 1 {
            return Err(AnalysisError::invalid_parameter(
                "divergence_lookback must be at least 1",
            ));
        }
        if self.divergence_start_offset <= self.divergence_lookback {
            return Err(AnalysisError::invalid_parameter(format!(
                "divergence_start_offset ({}) must exceed divergence_lookback ({})",
                self.divergence_start_offset, self.divergence_lookback
            )));
        }
        Ok(())
    }

    /// Minimum series length for any divergence to be possible.
    #[must_use]
    pub const fn min_observations_for_divergence(&self) -> usize {
        self.divergence_start_offset + 1
    }
}

/// Output settings for rendered reports.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub format: ReportFormat,
    /// RSI level considered overbought
    pub overbought: f64,
    /// RSI level considered oversold
    pub oversold: f64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            format: ReportFormat::Csv,
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for ReportFormat {
    type Err = AnalysisError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::Json),
            _ => Err(AnalysisError::invalid_parameter(format!(
                "unknown report format '{s}', expected csv or json"
            ))),
        }
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Csv => write!(f, "csv"),
            Self::Json => write!(f, "json"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_configuration() {
        let config = PipelineConfig::default();
        assert_eq!(config.oscillator_window, 14);
        assert_eq!(config.band_window, 20);
        assert!((config.band_std_dev_multiplier - 2.0).abs() < f64::EPSILON);
        assert_eq!(config.divergence_lookback, 10);
        assert_eq!(config.divergence_start_offset, 30);
        assert_eq!(config.min_observations_for_divergence(), 31);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_oscillator_window_rejected() {
        let config = PipelineConfig {
            oscillator_window: 0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_lookback_rejected() {
        let config = PipelineConfig {
            divergence_lookback: 0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_start_offset_must_exceed_lookback() {
        let config = PipelineConfig {
            divergence_lookback: 10,
            divergence_start_offset: 10,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_err());

        let config = PipelineConfig {
            divergence_start_offset: 11,
            ..config
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_band_parameters_not_checked_here() {
        let config = PipelineConfig {
            band_window: 0,
            band_std_dev_multiplier: -1.0,
            ..PipelineConfig::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_report_format_parse() {
        assert_eq!("CSV".parse::<ReportFormat>().unwrap(), ReportFormat::Csv);
        assert_eq!("json".parse::<ReportFormat>().unwrap(), ReportFormat::Json);
        assert!("xml".parse::<ReportFormat>().is_err());
    }

    #[test]
    fn test_partial_section_keeps_defaults() {
        let config: AppConfig = serde_json::from_str(r#"{"analysis": {"divergence_lookback": 5}}"#).unwrap();
        assert_eq!(config.analysis.divergence_lookback, 5);
        assert_eq!(config.analysis.oscillator_window, 14);
        assert_eq!(config.report, ReportConfig::default());
    }
}
