//! Signal generators for price/indicator analysis.
//!
//! Each generator is a pure function over aligned series:
//! - Divergence: price extremes not confirmed by the oscillator

pub mod divergence;

pub use divergence::{
    detect_bearish_divergence, detect_bullish_divergence, detect_divergences, DivergenceConfig,
};
