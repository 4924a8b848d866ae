//! Utility functions shared by the model and regression layers.

pub mod optimization;
pub mod stats;

pub use optimization::{nelder_mead, NelderMeadConfig, NelderMeadResult};
pub use stats::{mean, quantile_normal};
