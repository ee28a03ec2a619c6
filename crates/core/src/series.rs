//! Time-series data model shared by the indicator and divergence stages.
//!
//! All series are index-aligned with the [`PriceSeries`] they were computed
//! from. Warm-up positions are `None` rather than NaN so that consumers must
//! handle them explicitly.

use crate::error::{AnalysisError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unvalidated input as read from a data source.
///
/// The close column is optional because a source may not carry one, and
/// individual cells may be missing or non-finite.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CandidateSeries {
    /// Observation timestamps, in source order
    pub timestamps: Vec<DateTime<Utc>>,
    /// Closing prices, `None` when the source has no close field
    pub closes: Option<Vec<Option<f64>>>,
}

impl CandidateSeries {
    /// Creates a candidate with a close column.
    #[must_use]
    pub fn new(timestamps: Vec<DateTime<Utc>>, closes: Vec<Option<f64>>) -> Self {
        Self {
            timestamps,
            closes: Some(closes),
        }
    }

    /// Creates a candidate whose source carries no close field.
    #[must_use]
    pub fn without_close(timestamps: Vec<DateTime<Utc>>) -> Self {
        Self {
            timestamps,
            closes: None,
        }
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Keeps rows with `start <= timestamp < end`.
    ///
    /// Either bound may be omitted. A candidate whose close column does not
    /// match its timestamps is returned unchanged so that validation reports
    /// the mismatch.
    #[must_use]
    pub fn within(self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> Self {
        if self
            .closes
            .as_ref()
            .is_some_and(|closes| closes.len() != self.timestamps.len())
        {
            return self;
        }

        let keep = |ts: &DateTime<Utc>| {
            start.map_or(true, |s| *ts >= s) && end.map_or(true, |e| *ts < e)
        };
        let mask: Vec<bool> = self.timestamps.iter().map(keep).collect();

        let timestamps = self
            .timestamps
            .into_iter()
            .zip(&mask)
            .filter_map(|(ts, &k)| k.then_some(ts))
            .collect();
        let closes = self.closes.map(|closes| {
            closes
                .into_iter()
                .zip(&mask)
                .filter_map(|(c, &k)| k.then_some(c))
                .collect()
        });

        Self { timestamps, closes }
    }
}

/// A validated series of closing prices.
///
/// Invariants: non-empty, timestamps strictly increasing, every close finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceSeries {
    timestamps: Vec<DateTime<Utc>>,
    closes: Vec<f64>,
}

impl PriceSeries {
    /// Builds a price series, checking its invariants.
    ///
    /// # Errors
    /// Returns an error if the series is empty, the columns differ in length,
    /// a close is non-finite, or timestamps are not strictly increasing.
    pub fn new(timestamps: Vec<DateTime<Utc>>, closes: Vec<f64>) -> Result<Self> {
        if timestamps.is_empty() {
            return Err(AnalysisError::EmptySeries);
        }
        if timestamps.len() != closes.len() {
            return Err(AnalysisError::ColumnLengthMismatch {
                timestamps: timestamps.len(),
                closes: closes.len(),
            });
        }
        if closes.iter().all(|c| !c.is_finite()) {
            return Err(AnalysisError::AllValuesUndefined {
                count: closes.len(),
            });
        }
        if let Some(index) = closes.iter().position(|c| !c.is_finite()) {
            return Err(AnalysisError::invalid_parameter(format!(
                "close at row {index} is not finite"
            )));
        }
        if let Some(index) = first_unordered(&timestamps) {
            return Err(AnalysisError::UnorderedTimestamps { index });
        }

        Ok(Self { timestamps, closes })
    }

    /// Builds a series with evenly spaced timestamps starting at `start`.
    ///
    /// # Errors
    /// Same as [`PriceSeries::new`]; also fails if `interval` is not positive.
    ///
    /// # Examples
    /// ```
    /// use chrono::{Duration, TimeZone, Utc};
    /// use divergence_core::PriceSeries;
    ///
    /// let start = Utc.with_ymd_and_hms(2023, 1, 2, 0, 0, 0).unwrap();
    /// let series = PriceSeries::with_interval(start, Duration::days(1), vec![1.0, 2.0]).unwrap();
    /// assert_eq!(series.len(), 2);
    /// ```
    pub fn with_interval(start: DateTime<Utc>, interval: Duration, closes: Vec<f64>) -> Result<Self> {
        if interval <= Duration::zero() {
            return Err(AnalysisError::invalid_parameter("interval must be positive"));
        }
        let timestamps = (0..closes.len())
            .map(|i| nth_timestamp(start, interval, i))
            .collect::<Result<Vec<_>>>()?;
        Self::new(timestamps, closes)
    }

    /// Number of observations.
    #[must_use]
    pub fn len(&self) -> usize {
        self.closes.len()
    }

    /// Always false for a validated series; provided for API symmetry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.closes.is_empty()
    }

    #[must_use]
    pub fn closes(&self) -> &[f64] {
        &self.closes
    }

    #[must_use]
    pub fn timestamps(&self) -> &[DateTime<Utc>] {
        &self.timestamps
    }

    /// First and last timestamp.
    #[must_use]
    pub fn span(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        Some((*self.timestamps.first()?, *self.timestamps.last()?))
    }
}

/// `start + interval * index`, failing instead of wrapping on overflow.
fn nth_timestamp(start: DateTime<Utc>, interval: Duration, index: usize) -> Result<DateTime<Utc>> {
    let steps = i32::try_from(index).map_err(|_| {
        AnalysisError::invalid_parameter(format!("series index {index} exceeds the interval range"))
    })?;
    start
        .checked_add_signed(interval * steps)
        .ok_or_else(|| {
            AnalysisError::invalid_parameter(format!("timestamp at index {index} is out of range"))
        })
}

fn first_unordered(timestamps: &[DateTime<Utc>]) -> Option<usize> {
    timestamps
        .windows(2)
        .position(|pair| pair[1] <= pair[0])
        .map(|i| i + 1)
}

/// Indicator values aligned index-for-index with a price series.
///
/// `None` marks a warm-up position with insufficient history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IndicatorSeries(Vec<Option<f64>>);

impl IndicatorSeries {
    #[must_use]
    pub fn new(values: Vec<Option<f64>>) -> Self {
        Self(values)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Value at `index`, `None` when out of range or undefined.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<f64> {
        self.0.get(index).copied().flatten()
    }

    #[must_use]
    pub fn values(&self) -> &[Option<f64>] {
        &self.0
    }

    /// Iterates over `(index, value)` for defined positions.
    pub fn defined(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.0
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.map(|v| (i, v)))
    }

    #[must_use]
    pub fn first_defined_index(&self) -> Option<usize> {
        self.0.iter().position(Option::is_some)
    }

    /// Last defined value.
    #[must_use]
    pub fn last_defined(&self) -> Option<f64> {
        self.0.iter().rev().find_map(|v| *v)
    }
}

/// Middle, upper and lower volatility bands.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandSeries {
    pub middle: IndicatorSeries,
    pub upper: IndicatorSeries,
    pub lower: IndicatorSeries,
}

impl BandSeries {
    #[must_use]
    pub fn len(&self) -> usize {
        self.middle.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.middle.is_empty()
    }
}

/// Direction of a divergence between price and oscillator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DivergenceKind {
    /// Price new trailing low, oscillator above its trailing low
    Bullish,
    /// Price new trailing high, oscillator below its trailing high
    Bearish,
}

impl fmt::Display for DivergenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bullish => write!(f, "bullish"),
            Self::Bearish => write!(f, "bearish"),
        }
    }
}

/// A divergence detected at a position of the price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DivergenceEvent {
    pub index: usize,
    pub kind: DivergenceKind,
}

impl DivergenceEvent {
    #[must_use]
    pub const fn bullish(index: usize) -> Self {
        Self {
            index,
            kind: DivergenceKind::Bullish,
        }
    }

    #[must_use]
    pub const fn bearish(index: usize) -> Self {
        Self {
            index,
            kind: DivergenceKind::Bearish,
        }
    }
}

/// Divergence events in ascending index order.
///
/// If an index carries both kinds, the bullish event comes first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DivergenceEvents(Vec<DivergenceEvent>);

impl DivergenceEvents {
    #[must_use]
    pub fn new(events: Vec<DivergenceEvent>) -> Self {
        Self(events)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DivergenceEvent> {
        self.0.iter()
    }

    #[must_use]
    pub fn as_slice(&self) -> &[DivergenceEvent] {
        &self.0
    }

    /// Indices of events of the given kind, ascending.
    #[must_use]
    pub fn indices(&self, kind: DivergenceKind) -> Vec<usize> {
        self.0
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.index)
            .collect()
    }

    #[must_use]
    pub fn bullish_indices(&self) -> Vec<usize> {
        self.indices(DivergenceKind::Bullish)
    }

    #[must_use]
    pub fn bearish_indices(&self) -> Vec<usize> {
        self.indices(DivergenceKind::Bearish)
    }
}

impl<'a> IntoIterator for &'a DivergenceEvents {
    type Item = &'a DivergenceEvent;
    type IntoIter = std::slice::Iter<'a, DivergenceEvent>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
