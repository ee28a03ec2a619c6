pub mod generator;
pub mod indicator;
pub mod pipeline;
pub mod report;

// Re-export indicators for convenience
pub use indicator::{band_values, bollinger_bands, relative_strength_index, rsi_values};

// Re-export signal generators for convenience
pub use generator::{
    detect_bearish_divergence, detect_bullish_divergence, detect_divergences, DivergenceConfig,
};

// Re-export pipeline
pub use pipeline::{analyze, run_pipeline};
pub use report::{AnalysisReport, DivergenceMarker, ReportRow, ReportSummary, RsiZone};
