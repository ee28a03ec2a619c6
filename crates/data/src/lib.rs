//! File input and output for divergence analysis.
//!
//! This crate provides:
//! - CSV loading of close-price series
//! - CSV and JSON rendering of analysis reports

pub mod csv_source;
pub mod report_writer;

// Re-export commonly used types
pub use csv_source::{parse_timestamp, CsvPriceSource};
pub use report_writer::ReportWriter;
