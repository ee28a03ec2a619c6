//! Indicators computed over a whole price series.
//!
//! Outputs are index-aligned with the input; warm-up positions are `None`.

pub mod bands;
pub mod momentum;

pub use bands::{band_values, bollinger_bands};
pub use momentum::{relative_strength_index, rsi_values};
