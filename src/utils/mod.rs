//! Numeric helpers shared by the detectors.

pub mod stats;

pub use stats::{argmin, diff, max_value, mean, median, std_dev, variance};
