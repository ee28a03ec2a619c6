//! CLI commands for RSI divergence analysis.

pub mod analyze;
pub mod show_config;

pub use analyze::{run_analyze, AnalyzeArgs};
pub use show_config::{run_show_config, ShowConfigArgs};
