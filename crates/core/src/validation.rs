//! Well-formedness checks applied to a candidate series before analysis.
//!
//! The checks run in a fixed order so that the reported error matches the
//! first problem a reader would notice: no rows, then no close field, then
//! no usable close values, then ordering.

use crate::error::{AnalysisError, Result};
use crate::series::{CandidateSeries, PriceSeries};

/// Validates a candidate series and converts it into a [`PriceSeries`].
///
/// Rows whose close is missing or non-finite are dropped as long as at least
/// one defined close remains.
///
/// # Errors
/// - [`AnalysisError::EmptySeries`] if there are no rows
/// - [`AnalysisError::MissingCloseField`] if the close column is absent
/// - [`AnalysisError::ColumnLengthMismatch`] if the columns differ in length
/// - [`AnalysisError::AllValuesUndefined`] if no close is defined
/// - [`AnalysisError::UnorderedTimestamps`] if timestamps are not strictly increasing
///
/// # Examples
/// ```
/// use chrono::{TimeZone, Utc};
/// use divergence_core::{validate_series, CandidateSeries};
///
/// let ts = vec![
///     Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
///     Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap(),
/// ];
/// let series = validate_series(CandidateSeries::new(ts, vec![Some(10.0), None])).unwrap();
/// assert_eq!(series.closes(), &[10.0]);
/// ```
pub fn validate_series(candidate: CandidateSeries) -> Result<PriceSeries> {
    let CandidateSeries { timestamps, closes } = candidate;

    if timestamps.is_empty() {
        return Err(AnalysisError::EmptySeries);
    }

    let closes = closes.ok_or(AnalysisError::MissingCloseField)?;

    if closes.len() != timestamps.len() {
        return Err(AnalysisError::ColumnLengthMismatch {
            timestamps: timestamps.len(),
            closes: closes.len(),
        });
    }

    let rows = timestamps.len();
    let defined = closes
        .iter()
        .filter(|c| c.is_some_and(f64::is_finite))
        .count();
    if defined == 0 {
        return Err(AnalysisError::AllValuesUndefined { count: rows });
    }

    if let Some(index) = timestamps
        .windows(2)
        .position(|pair| pair[1] <= pair[0])
        .map(|i| i + 1)
    {
        return Err(AnalysisError::UnorderedTimestamps { index });
    }

    if defined < rows {
        tracing::warn!(
            "Dropping {} of {} rows with undefined close",
            rows - defined,
            rows
        );
    }

    let (timestamps, closes): (Vec<_>, Vec<_>) = timestamps
        .into_iter()
        .zip(closes)
        .filter_map(|(ts, close)| close.filter(|c| c.is_finite()).map(|c| (ts, c)))
        .unzip();

    tracing::debug!("Validated price series with {} observations", closes.len());

    PriceSeries::new(timestamps, closes)
}
