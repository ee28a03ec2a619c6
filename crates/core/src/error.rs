//! Error types for the divergence analysis pipeline.
//!
//! Validation and oscillator failures are fatal to a run. Band failures are
//! recoverable: the pipeline continues without the band overlay.

use thiserror::Error;

/// Errors raised while validating a price series or computing indicators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// The candidate series has no observations.
    #[error("price series is empty")]
    EmptySeries,

    /// The candidate series carries no closing-price field.
    #[error("price series has no close field")]
    MissingCloseField,

    /// Every closing price in the candidate series is missing or non-finite.
    #[error("all {count} close values are undefined")]
    AllValuesUndefined {
        /// Number of rows inspected.
        count: usize,
    },

    /// Timestamps are not strictly increasing.
    #[error("timestamps must be strictly increasing (violated at row {index})")]
    UnorderedTimestamps {
        /// Row at which the ordering breaks.
        index: usize,
    },

    /// Timestamp and close columns differ in length.
    #[error("column length mismatch: {timestamps} timestamps, {closes} closes")]
    ColumnLengthMismatch {
        /// Number of timestamps.
        timestamps: usize,
        /// Number of close cells.
        closes: usize,
    },

    /// The oscillator produced no defined value.
    #[error("insufficient data: oscillator needs at least {required} observations, got {actual}")]
    InsufficientData {
        /// Minimum number of observations for one defined value.
        required: usize,
        /// Observations available.
        actual: usize,
    },

    /// Volatility bands could not be computed.
    #[error("band computation failed: {reason}")]
    BandComputationFailed {
        /// Why the bands are unavailable.
        reason: String,
    },

    /// Price and indicator series are not aligned.
    #[error("series length mismatch: {prices} prices, {indicator} indicator values")]
    LengthMismatch {
        /// Number of prices.
        prices: usize,
        /// Number of indicator values.
        indicator: usize,
    },

    /// A configuration parameter is out of range.
    #[error("invalid parameter: {reason}")]
    InvalidParameter {
        /// Which constraint was violated.
        reason: String,
    },
}

impl AnalysisError {
    /// Creates a band computation failure.
    pub fn band_failed(reason: impl Into<String>) -> Self {
        Self::BandComputationFailed {
            reason: reason.into(),
        }
    }

    /// Creates an invalid parameter error.
    pub fn invalid_parameter(reason: impl Into<String>) -> Self {
        Self::InvalidParameter {
            reason: reason.into(),
        }
    }

    /// Returns true if this error must halt the pipeline.
    ///
    /// Only band failures are recovered locally.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::BandComputationFailed { .. })
    }
}

/// Result alias for analysis operations.
pub type Result<T> = std::result::Result<T, AnalysisError>;
