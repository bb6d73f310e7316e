//! Core data structures for binned count series.

mod time_series;

pub use time_series::BinnedSeries;
