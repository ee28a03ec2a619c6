//! Core data model, error taxonomy, configuration and series validation for
//! RSI divergence analysis.

pub mod config;
pub mod config_loader;
pub mod error;
pub mod series;
pub mod validation;

pub use config::{AppConfig, PipelineConfig, ReportConfig, ReportFormat};
pub use config_loader::ConfigLoader;
pub use error::{AnalysisError, Result};
pub use series::{
    BandSeries, CandidateSeries, DivergenceEvent, DivergenceEvents, DivergenceKind,
    IndicatorSeries, PriceSeries,
};
pub use validation::validate_series;
