//! Pipeline output and the row/summary views used by renderers.

use chrono::{DateTime, Utc};
use divergence_core::{
    BandSeries, DivergenceEvents, DivergenceKind, IndicatorSeries, PipelineConfig, PriceSeries,
};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Everything one pipeline run produces, together with its input.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisReport {
    pub config: PipelineConfig,
    pub series: PriceSeries,
    pub oscillator: IndicatorSeries,
    /// `None` when band computation failed
    pub bands: Option<BandSeries>,
    /// Why the bands are missing, if they are
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band_warning: Option<String>,
    pub divergences: DivergenceEvents,
}

/// Divergence marker for a single row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DivergenceMarker {
    Bullish,
    Bearish,
    Both,
}

impl DivergenceMarker {
    fn with(current: Option<Self>, kind: DivergenceKind) -> Self {
        match (current, kind) {
            (None, DivergenceKind::Bullish) => Self::Bullish,
            (None, DivergenceKind::Bearish) => Self::Bearish,
            (Some(existing), kind) if existing == Self::from(kind) => existing,
            (Some(_), _) => Self::Both,
        }
    }
}

impl From<DivergenceKind> for DivergenceMarker {
    fn from(kind: DivergenceKind) -> Self {
        match kind {
            DivergenceKind::Bullish => Self::Bullish,
            DivergenceKind::Bearish => Self::Bearish,
        }
    }
}

impl fmt::Display for DivergenceMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bullish => write!(f, "bullish"),
            Self::Bearish => write!(f, "bearish"),
            Self::Both => write!(f, "both"),
        }
    }
}

/// One aligned row of the report.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportRow {
    pub index: usize,
    pub timestamp: DateTime<Utc>,
    pub close: f64,
    pub rsi: Option<f64>,
    pub bb_middle: Option<f64>,
    pub bb_upper: Option<f64>,
    pub bb_lower: Option<f64>,
    pub divergence: Option<DivergenceMarker>,
}

/// RSI reading relative to the overbought/oversold levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RsiZone {
    Overbought,
    Oversold,
    Neutral,
}

impl RsiZone {
    /// Classifies an RSI value; levels are inclusive.
    #[must_use]
    pub fn classify(rsi: f64, overbought: f64, oversold: f64) -> Self {
        if rsi >= overbought {
            Self::Overbought
        } else if rsi <= oversold {
            Self::Oversold
        } else {
            Self::Neutral
        }
    }
}

impl fmt::Display for RsiZone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Overbought => write!(f, "overbought"),
            Self::Oversold => write!(f, "oversold"),
            Self::Neutral => write!(f, "neutral"),
        }
    }
}

/// Headline numbers of a report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReportSummary {
    pub observations: usize,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
    pub last_close: Option<f64>,
    pub rsi_defined: usize,
    pub last_rsi: Option<f64>,
    pub last_zone: Option<RsiZone>,
    pub overbought_count: usize,
    pub oversold_count: usize,
    pub bullish_count: usize,
    pub bearish_count: usize,
    pub bands_available: bool,
}

impl AnalysisReport {
    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    /// Per-index divergence markers.
    #[must_use]
    pub fn markers(&self) -> Vec<Option<DivergenceMarker>> {
        let mut markers = vec![None; self.len()];
        for event in &self.divergences {
            if let Some(slot) = markers.get_mut(event.index) {
                *slot = Some(DivergenceMarker::with(*slot, event.kind));
            }
        }
        markers
    }

    /// Aligned rows, one per observation.
    #[must_use]
    pub fn rows(&self) -> Vec<ReportRow> {
        let markers = self.markers();

        self.series
            .timestamps()
            .iter()
            .zip(self.series.closes())
            .enumerate()
            .map(|(i, (&timestamp, &close))| {
                let (bb_middle, bb_upper, bb_lower) = match &self.bands {
                    Some(bands) => (bands.middle.get(i), bands.upper.get(i), bands.lower.get(i)),
                    None => (None, None, None),
                };
                ReportRow {
                    index: i,
                    timestamp,
                    close,
                    rsi: self.oscillator.get(i),
                    bb_middle,
                    bb_upper,
                    bb_lower,
                    divergence: markers[i],
                }
            })
            .collect()
    }

    /// Summarises the report against the given RSI levels.
    #[must_use]
    pub fn summary(&self, overbought: f64, oversold: f64) -> ReportSummary {
        let zones: Vec<RsiZone> = self
            .oscillator
            .defined()
            .map(|(_, v)| RsiZone::classify(v, overbought, oversold))
            .collect();
        let last_rsi = self.oscillator.last_defined();
        let span = self.series.span();

        ReportSummary {
            observations: self.len(),
            first_timestamp: span.map(|(first, _)| first),
            last_timestamp: span.map(|(_, last)| last),
            last_close: self.series.closes().last().copied(),
            rsi_defined: zones.len(),
            last_rsi,
            last_zone: last_rsi.map(|v| RsiZone::classify(v, overbought, oversold)),
            overbought_count: zones.iter().filter(|z| **z == RsiZone::Overbought).count(),
            oversold_count: zones.iter().filter(|z| **z == RsiZone::Oversold).count(),
            bullish_count: self.divergences.bullish_indices().len(),
            bearish_count: self.divergences.bearish_indices().len(),
            bands_available: self.bands.is_some(),
        }
    }
}
